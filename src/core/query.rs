//! Configuration provider queries.
//!
//! A configuration provider is an executable such as `nest-config` or
//! `python3-config` that answers `--<kind>` with a single line of text on
//! stdout. Every query is one synchronous child process; there are no
//! retries and no timeout.

use std::io;

use crate::util::diagnostic::{self, Diagnostic, QueryError};
use crate::util::process::ProcessBuilder;

/// Raw outcome of running the provider once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryResult {
    /// Exit code, `None` if the child was killed by a signal
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl QueryResult {
    /// A successful result with the given stdout.
    pub fn success(stdout: impl Into<String>) -> Self {
        QueryResult {
            exit_code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// A failed result.
    pub fn failure(exit_code: i32, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        QueryResult {
            exit_code: Some(exit_code),
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }

    /// Zero exit status and nothing written to stderr.
    pub fn is_success(&self) -> bool {
        self.exit_code == Some(0) && self.stderr.is_empty()
    }
}

/// Something that can answer configuration queries.
pub trait ConfigProvider {
    /// Name of the provider, for messages.
    fn program(&self) -> &str;

    /// Run the provider for a single facet.
    ///
    /// Only failures to start the provider are errors here; a provider that
    /// ran and complained is reported through the returned [`QueryResult`].
    fn run(&self, kind: &str) -> Result<QueryResult, QueryError>;
}

/// Provider backed by an external executable.
#[derive(Debug, Clone)]
pub struct CommandProvider {
    program: String,
}

impl CommandProvider {
    pub fn new(program: impl Into<String>) -> Self {
        CommandProvider {
            program: program.into(),
        }
    }
}

impl ConfigProvider for CommandProvider {
    fn program(&self) -> &str {
        &self.program
    }

    fn run(&self, kind: &str) -> Result<QueryResult, QueryError> {
        let output = ProcessBuilder::new(&self.program)
            .arg(format!("--{}", kind))
            .output()
            .map_err(|source| match source.kind() {
                io::ErrorKind::NotFound => QueryError::ProviderNotFound {
                    program: self.program.clone(),
                },
                _ => QueryError::Spawn {
                    program: self.program.clone(),
                    source,
                },
            })?;

        Ok(QueryResult {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Typed front end over a [`ConfigProvider`].
pub struct ConfigQuery {
    provider: Box<dyn ConfigProvider>,
    /// Suggestions shown when the provider is missing
    hints: Vec<String>,
    color: bool,
}

impl ConfigQuery {
    pub fn new(provider: Box<dyn ConfigProvider>) -> Self {
        ConfigQuery {
            provider,
            hints: Vec::new(),
            color: diagnostic::stderr_color(),
        }
    }

    /// Replace the generic install suggestion for a missing provider.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hints.push(hint.into());
        self
    }

    /// Allow or suppress colored hints. Color is never forced on a non-terminal.
    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color && diagnostic::stderr_color();
        self
    }

    /// Query an external executable.
    pub fn command(program: impl Into<String>) -> Self {
        Self::new(Box::new(CommandProvider::new(program)))
    }

    /// Name of the underlying provider.
    pub fn program(&self) -> &str {
        self.provider.program()
    }

    /// Query one facet and return its trimmed text.
    ///
    /// Fails if the provider exits non-zero or writes anything to stderr. A
    /// provider that cannot be found prints a hint to stderr before the error
    /// is returned.
    pub fn query(&self, kind: &str) -> Result<String, QueryError> {
        if kind.is_empty() {
            return Err(QueryError::EmptyKind);
        }

        tracing::debug!("querying `{} --{}`", self.program(), kind);

        let result = match self.provider.run(kind) {
            Ok(result) => result,
            Err(err @ QueryError::ProviderNotFound { .. }) => {
                diagnostic::emit(&self.not_found_hint(), self.color);
                return Err(err);
            }
            Err(err) => return Err(err),
        };

        if !result.is_success() {
            return Err(QueryError::Failed {
                program: self.program().to_string(),
                kind: kind.to_string(),
                exit_code: result.exit_code,
                stdout: result.stdout,
                stderr: result.stderr,
            });
        }

        Ok(result.stdout.trim().to_string())
    }

    fn not_found_hint(&self) -> Diagnostic {
        let hint = Diagnostic::note(format!(
            "`{}` could not be found on the search path",
            self.program()
        ));
        if self.hints.is_empty() {
            return hint.with_suggestion(format!(
                "Make sure `{}` is installed and in the PATH",
                self.program()
            ));
        }
        self.hints
            .iter()
            .fold(hint, |hint, text| hint.with_suggestion(text.clone()))
    }
}

impl std::fmt::Debug for ConfigQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigQuery")
            .field("program", &self.program())
            .finish()
    }
}
