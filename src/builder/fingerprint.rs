//! Translation fingerprints.
//!
//! A fingerprint captures every input to a translation step so the translator
//! can be skipped when nothing has changed.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::util::fs::write_string;

/// Hex digest of the Cython source.
fn source_digest(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("failed to read {} for fingerprinting", path.display()))?;
    Ok(hex::encode(Sha256::digest(&bytes)))
}

/// Hex digest of the translator and its arguments.
///
/// Each part is NUL-terminated, so `["-I/a", "-I/b"]` and `["-I/a-I/b"]`
/// differ.
fn inputs_digest(translator: &Path, args: &[String]) -> String {
    let mut hasher = Sha256::new();
    let program = translator.display().to_string();
    for part in std::iter::once(program.as_str()).chain(args.iter().map(String::as_str)) {
        hasher.update(part.as_bytes());
        hasher.update([0u8]);
    }
    hex::encode(hasher.finalize())
}

/// Fingerprint for a single translation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslateFingerprint {
    /// Source file hash
    pub source_hash: String,

    /// Hash over translator path, arguments and include directories
    pub inputs_hash: String,

    /// Translated output
    pub output: PathBuf,
}

impl TranslateFingerprint {
    /// Compute the fingerprint of a translation.
    pub fn compute(
        source: &Path,
        output: &Path,
        translator: &Path,
        args: &[String],
    ) -> Result<Self> {
        Ok(TranslateFingerprint {
            source_hash: source_digest(source)?,
            inputs_hash: inputs_digest(translator, args),
            output: output.to_path_buf(),
        })
    }

    /// Load a stored fingerprint, `None` if missing or unreadable.
    pub fn load(path: &Path) -> Option<Self> {
        let contents = std::fs::read_to_string(path).ok()?;
        match serde_json::from_str(&contents) {
            Ok(fp) => Some(fp),
            Err(e) => {
                tracing::debug!("ignoring corrupt fingerprint {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Store the fingerprint.
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents =
            serde_json::to_string_pretty(self).context("failed to serialize fingerprint")?;
        write_string(path, &contents)
    }

    /// Whether `previous` describes the same translation and its output still exists.
    pub fn is_fresh(&self, previous: Option<&TranslateFingerprint>) -> bool {
        previous == Some(self) && self.output.exists()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup(tmp: &TempDir) -> (PathBuf, PathBuf) {
        let source = tmp.path().join("pynestkernel.pyx");
        let output = tmp.path().join("pynestkernel.cpp");
        std::fs::write(&source, "cdef class NESTEngine: pass\n").unwrap();
        (source, output)
    }

    #[test]
    fn test_roundtrip_and_freshness() {
        let tmp = TempDir::new().unwrap();
        let (source, output) = setup(&tmp);
        let args = vec!["-I/opt/nest/include".to_string()];

        let fp = TranslateFingerprint::compute(&source, &output, Path::new("cython"), &args).unwrap();
        let stored = tmp.path().join(".fingerprints").join("translate.json");
        fp.save(&stored).unwrap();

        let loaded = TranslateFingerprint::load(&stored);
        assert_eq!(loaded.as_ref(), Some(&fp));

        // Output missing: not fresh.
        assert!(!fp.is_fresh(loaded.as_ref()));

        std::fs::write(&output, "// translated").unwrap();
        assert!(fp.is_fresh(loaded.as_ref()));
    }

    #[test]
    fn test_source_change_invalidates() {
        let tmp = TempDir::new().unwrap();
        let (source, output) = setup(&tmp);
        std::fs::write(&output, "// translated").unwrap();

        let before = TranslateFingerprint::compute(&source, &output, Path::new("cython"), &[]).unwrap();
        std::fs::write(&source, "cdef class Changed: pass\n").unwrap();
        let after = TranslateFingerprint::compute(&source, &output, Path::new("cython"), &[]).unwrap();

        assert!(!after.is_fresh(Some(&before)));
    }

    #[test]
    fn test_include_change_invalidates() {
        let tmp = TempDir::new().unwrap();
        let (source, output) = setup(&tmp);
        std::fs::write(&output, "// translated").unwrap();

        let a = TranslateFingerprint::compute(&source, &output, Path::new("cython"), &["-I/a".to_string()]).unwrap();
        let b = TranslateFingerprint::compute(&source, &output, Path::new("cython"), &["-I/b".to_string()]).unwrap();

        assert!(!b.is_fresh(Some(&a)));
    }

    #[test]
    fn test_source_digest() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("pynestkernel.pyx");
        std::fs::write(&path, "hello").unwrap();

        assert_eq!(
            source_digest(&path).unwrap(),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
        assert!(source_digest(&tmp.path().join("missing.pyx")).is_err());
    }

    #[test]
    fn test_inputs_digest_keeps_arguments_apart() {
        let cython = Path::new("/usr/bin/cython");
        let split = inputs_digest(cython, &["-I/usr/a".to_string(), "-I/usr/b".to_string()]);
        let merged = inputs_digest(cython, &["-I/usr/a-I/usr/b".to_string()]);
        assert_ne!(split, merged);

        let moved = inputs_digest(Path::new("/usr/bin/cython-I/usr/a"), &["-I/usr/b".to_string()]);
        assert_ne!(split, moved);
    }

    #[test]
    fn test_corrupt_fingerprint_is_ignored() {
        let tmp = TempDir::new().unwrap();
        let stored = tmp.path().join("translate.json");
        std::fs::write(&stored, "not json").unwrap();

        assert!(TranslateFingerprint::load(&stored).is_none());
    }
}
