//! Translation of the generated Cython source into C++.

use std::io;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::builder::fingerprint::TranslateFingerprint;
use crate::builder::toolchain::{CommandSpec, CompilerEnv};
use crate::core::extension::{ExtensionSpec, GENERATED_SOURCE};
use crate::util::config::Config;
use crate::util::diagnostic::{suggestions, ToolError};
use crate::util::fs::ensure_dir;
use crate::util::process::{find_executable, ProcessBuilder};

/// Outcome of a translation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Translation {
    /// The translator ran and wrote this file.
    Translated(PathBuf),
    /// The previous output is up to date.
    Fresh(PathBuf),
}

impl Translation {
    pub fn output(&self) -> &Path {
        match self {
            Translation::Translated(path) | Translation::Fresh(path) => path,
        }
    }
}

/// Source-to-native translator (`cython`).
#[derive(Debug, Clone)]
pub struct Translator {
    program: String,
    extra_args: Vec<String>,
}

impl Translator {
    pub fn new(program: impl Into<String>, extra_args: Vec<String>) -> Self {
        Translator {
            program: program.into(),
            extra_args,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.translator_program(), config.translator.args.clone())
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Resolve the translator on the search path.
    ///
    /// A missing translator is fatal; there is no silent fallback to the
    /// pre-translated source.
    pub fn locate(&self) -> Result<PathBuf, ToolError> {
        find_executable(&self.program).ok_or_else(|| ToolError::Missing {
            tool: self.program.clone(),
            hint: Some(format!(
                "{}\n{}",
                suggestions::TRANSLATOR_MISSING,
                suggestions::USE_PREGENERATED
            )),
        })
    }

    /// Translator arguments, excluding the program itself.
    pub fn args(&self, ext: &ExtensionSpec, source: &Path, output: &Path) -> Vec<String> {
        let mut args = vec!["--cplus".to_string(), "-3".to_string()];
        args.extend(self.extra_args.iter().cloned());
        args.extend(ext.include_dirs.iter().map(|dir| format!("-I{}", dir)));
        args.push("-o".to_string());
        args.push(output.display().to_string());
        args.push(source.display().to_string());
        args
    }

    /// Translate the extension's generated source into `out_dir`.
    pub fn translate(
        &self,
        ext: &ExtensionSpec,
        root: &Path,
        out_dir: &Path,
        env: &CompilerEnv,
    ) -> Result<Translation> {
        if !ext.source_mode.needs_translation() {
            bail!("`{}` is built from pre-translated sources", ext.name);
        }

        let translator = self.locate()?;

        let source = root.join(GENERATED_SOURCE);
        if !source.exists() {
            bail!("generated source not found: {}", source.display());
        }

        let output = ext.native_source(root, out_dir);
        let args = self.args(ext, &source, &output);

        let fingerprint_path = out_dir.join(".fingerprints").join("translate.json");
        let fingerprint = TranslateFingerprint::compute(&source, &output, &translator, &args)?;
        let previous = TranslateFingerprint::load(&fingerprint_path);
        if fingerprint.is_fresh(previous.as_ref()) {
            tracing::debug!("{} is up to date", output.display());
            return Ok(Translation::Fresh(output));
        }

        if let Some(parent) = output.parent() {
            ensure_dir(parent)?;
        }

        let spec = CommandSpec::new(&translator)
            .args(args)
            .compiler_env(env);
        let cmd = ProcessBuilder::from_spec(&spec).cwd(root);

        let result = cmd.output().map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => anyhow::Error::new(ToolError::missing(
                self.program.clone(),
                suggestions::TRANSLATOR_MISSING,
            )),
            _ => anyhow::Error::new(e)
                .context(format!("failed to run `{}`", translator.display())),
        })?;

        if !result.status.success() {
            return Err(ToolError::Failed {
                command: cmd.display_command(),
                exit_code: result.status.code(),
                stderr: String::from_utf8_lossy(&result.stderr).into_owned(),
            }
            .into());
        }

        fingerprint
            .save(&fingerprint_path)
            .context("failed to record translation fingerprint")?;

        tracing::info!("translated {} -> {}", source.display(), output.display());
        Ok(Translation::Translated(output))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::descriptor::SourceMode;
    use crate::test_support::extension_fixture;
    use tempfile::TempDir;

    #[test]
    fn test_translator_args() {
        let ext = extension_fixture(SourceMode::Generated);
        let translator = Translator::new("cython", vec!["--fast-fail".to_string()]);

        let args = translator.args(
            &ext,
            Path::new("nest/pynestkernel.pyx"),
            Path::new("build/src/nest/pynestkernel.cpp"),
        );
        assert_eq!(
            args,
            vec![
                "--cplus",
                "-3",
                "--fast-fail",
                "-I/opt/nest/include/nest",
                "-I/usr/include",
                "-o",
                "build/src/nest/pynestkernel.cpp",
                "nest/pynestkernel.pyx",
            ]
        );
    }

    #[test]
    fn test_missing_translator_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let ext = extension_fixture(SourceMode::Generated);
        let translator = Translator::new("nestkit-no-such-cython", Vec::new());

        let err = translator
            .translate(&ext, tmp.path(), &tmp.path().join("build"), &CompilerEnv::same("g++"))
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ToolError>(),
            Some(ToolError::Missing { tool, .. }) if tool == "nestkit-no-such-cython"
        ));
    }

    #[test]
    fn test_pregenerated_mode_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let ext = extension_fixture(SourceMode::Pregenerated);
        let translator = Translator::new("cython", Vec::new());

        assert!(translator
            .translate(&ext, tmp.path(), tmp.path(), &CompilerEnv::same("g++"))
            .is_err());
    }

    #[cfg(unix)]
    mod with_fake_cython {
        use super::*;
        use crate::test_support::write_script;

        /// A translator that copies its last argument to the `-o` target
        /// and records the exported compiler.
        const FAKE_CYTHON: &str = r#"
out=""
prev=""
for a in "$@"; do
  if [ "$prev" = "-o" ]; then out="$a"; fi
  prev="$a"
  src="$a"
done
cp "$src" "$out"
echo "$CXX" >> "$(dirname "$0")/runs.log"
"#;

        fn project(tmp: &TempDir) -> PathBuf {
            let root = tmp.path().join("pynest");
            std::fs::create_dir_all(root.join("nest")).unwrap();
            std::fs::write(root.join(GENERATED_SOURCE), "# cython source\n").unwrap();
            root
        }

        #[test]
        fn test_translate_then_fresh() {
            let tmp = TempDir::new().unwrap();
            let root = project(&tmp);
            let script = write_script(tmp.path(), "cython", FAKE_CYTHON);
            let out_dir = root.join("build");
            let ext = extension_fixture(SourceMode::Generated);
            let translator = Translator::new(script.to_string_lossy(), Vec::new());
            let env = CompilerEnv::same("/usr/bin/g++");

            let first = translator.translate(&ext, &root, &out_dir, &env).unwrap();
            let expected = out_dir.join("src/nest/pynestkernel.cpp");
            assert_eq!(first, Translation::Translated(expected.clone()));
            assert_eq!(std::fs::read_to_string(&expected).unwrap(), "# cython source\n");

            let second = translator.translate(&ext, &root, &out_dir, &env).unwrap();
            assert_eq!(second, Translation::Fresh(expected));

            let log = std::fs::read_to_string(tmp.path().join("runs.log")).unwrap();
            assert_eq!(log, "/usr/bin/g++\n");
        }

        #[test]
        fn test_translator_failure_reports_stderr() {
            let tmp = TempDir::new().unwrap();
            let root = project(&tmp);
            let script = write_script(tmp.path(), "cython", "echo 'syntax error' >&2; exit 1");
            let ext = extension_fixture(SourceMode::Generated);
            let translator = Translator::new(script.to_string_lossy(), Vec::new());

            let err = translator
                .translate(&ext, &root, &root.join("build"), &CompilerEnv::same("g++"))
                .unwrap_err();
            match err.downcast_ref::<ToolError>() {
                Some(ToolError::Failed { stderr, exit_code, .. }) => {
                    assert_eq!(stderr.trim(), "syntax error");
                    assert_eq!(*exit_code, Some(1));
                }
                other => panic!("expected ToolError::Failed, got {:?}", other),
            }
        }
    }
}
