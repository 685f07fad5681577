//! User-friendly diagnostic messages.
//!
//! Every fatal error names the failing tool or query, shows what it
//! printed, and suggests a fix.

use std::fmt;
use std::io::{self, IsTerminal};

use miette::Diagnostic as MietteDiagnostic;
use thiserror::Error;

/// Common suggestion messages for consistent error handling.
pub mod suggestions {
    /// The configuration provider could not be located.
    pub const PROVIDER_NOT_FOUND: &str =
        "Make sure NEST is installed and `nest-config` is in the PATH";

    /// The provider can be pointed at explicitly.
    pub const PROVIDER_OVERRIDE: &str =
        "Pass `--provider <path>` or set NESTKIT_PROVIDER to the nest-config executable";

    /// The Cython translator is missing.
    pub const TRANSLATOR_MISSING: &str = "Installing PyNEST requires Cython >= 0.19.2";

    /// Pregenerated sources avoid the translator.
    pub const USE_PREGENERATED: &str =
        "Build from the pre-translated nest/pynestkernel.cpp with `--no-cythonize`";

    /// More output is available.
    pub const RUN_VERBOSE: &str = "Run again with `--verbose` for more details";
}

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Note,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Note => write!(f, "note"),
        }
    }
}

/// A diagnostic message with optional suggestions.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// Primary message
    pub message: String,
    /// Severity level
    pub severity: Severity,
    /// Additional context lines
    pub context: Vec<String>,
    /// Suggested fixes
    pub suggestions: Vec<String>,
}

impl Diagnostic {
    fn with_severity(message: impl Into<String>, severity: Severity) -> Self {
        Diagnostic {
            message: message.into(),
            severity,
            context: Vec::new(),
            suggestions: Vec::new(),
        }
    }

    /// Create a new error diagnostic.
    pub fn error(message: impl Into<String>) -> Self {
        Self::with_severity(message, Severity::Error)
    }

    /// Create a new note.
    pub fn note(message: impl Into<String>) -> Self {
        Self::with_severity(message, Severity::Note)
    }

    /// Add context to the diagnostic.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context.push(context.into());
        self
    }

    /// Add a suggestion for fixing the issue.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    /// Format the diagnostic for terminal output.
    pub fn format(&self, color: bool) -> String {
        let mut output = String::new();

        let severity_str = if color {
            match self.severity {
                Severity::Error => "\x1b[1;31merror\x1b[0m",
                Severity::Note => "\x1b[1;36mnote\x1b[0m",
            }
        } else {
            match self.severity {
                Severity::Error => "error",
                Severity::Note => "note",
            }
        };

        output.push_str(&format!("{}: {}\n", severity_str, self.message));

        for ctx in &self.context {
            output.push_str(&format!("  | {}\n", ctx));
        }

        if !self.suggestions.is_empty() {
            let help_prefix = if color {
                "\x1b[1;32mhelp\x1b[0m"
            } else {
                "help"
            };
            output.push_str(&format!("{}: consider:\n", help_prefix));
            for (i, suggestion) in self.suggestions.iter().enumerate() {
                output.push_str(&format!("  {}. {}\n", i + 1, suggestion));
            }
        }

        output
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format(false))
    }
}

/// Failure of a configuration provider query.
#[derive(Debug, Error, MietteDiagnostic)]
pub enum QueryError {
    /// The provider ran but reported an error.
    #[error(
        "querying `{program} --{kind}` failed (exit code {})\n  stdout={stdout}\n  stderr={stderr}",
        display_code(.exit_code)
    )]
    #[diagnostic(code(nestkit::query::failed))]
    Failed {
        program: String,
        kind: String,
        exit_code: Option<i32>,
        stdout: String,
        stderr: String,
    },

    /// The provider executable is not on the search path.
    #[error("configuration provider `{program}` was not found")]
    #[diagnostic(
        code(nestkit::query::provider_not_found),
        help("Make sure `{program}` is installed and in the PATH")
    )]
    ProviderNotFound { program: String },

    /// The provider could not be started for another reason.
    #[error("failed to run configuration provider `{program}`")]
    #[diagnostic(code(nestkit::query::spawn))]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    /// A query was issued without a facet name.
    #[error("configuration query kind must not be empty")]
    #[diagnostic(code(nestkit::query::empty_kind))]
    EmptyKind,
}

/// Failure caused by a required external tool.
#[derive(Debug, Error, MietteDiagnostic)]
pub enum ToolError {
    /// The tool is not installed or not on the search path.
    #[error("required tool `{tool}` was not found")]
    #[diagnostic(code(nestkit::tool::missing))]
    Missing {
        tool: String,
        #[help]
        hint: Option<String>,
    },

    /// The tool ran and failed.
    #[error("`{command}` failed with exit code {exit_code:?}\n{stderr}")]
    #[diagnostic(code(nestkit::tool::failed))]
    Failed {
        command: String,
        exit_code: Option<i32>,
        stderr: String,
    },
}

impl ToolError {
    /// A missing tool with an installation hint.
    pub fn missing(tool: impl Into<String>, hint: impl Into<String>) -> Self {
        ToolError::Missing {
            tool: tool.into(),
            hint: Some(hint.into()),
        }
    }
}

fn display_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => code.to_string(),
        None => "none".to_string(),
    }
}

/// Whether stderr output should be colored.
pub fn stderr_color() -> bool {
    io::stderr().is_terminal()
}

/// Print a diagnostic to stderr.
pub fn emit(diagnostic: &Diagnostic, color: bool) {
    eprint!("{}", diagnostic.format(color));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_formatting() {
        let diag = Diagnostic::error("configuration provider `nest-config` was not found")
            .with_context("searched PATH for nest-config")
            .with_suggestion(suggestions::PROVIDER_NOT_FOUND)
            .with_suggestion(suggestions::PROVIDER_OVERRIDE);

        let output = diag.format(false);
        assert!(output.starts_with("error: configuration provider"));
        assert!(output.contains("searched PATH"));
        assert!(output.contains("help: consider:"));
        assert!(output.contains("1. Make sure NEST is installed"));
        assert!(output.contains("2. Pass `--provider <path>`"));
    }

    #[test]
    fn test_query_failed_message_carries_streams() {
        let err = QueryError::Failed {
            program: "nest-config".to_string(),
            kind: "libs".to_string(),
            exit_code: Some(2),
            stdout: "partial".to_string(),
            stderr: "boom".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("nest-config --libs"));
        assert!(msg.contains("exit code 2"));
        assert!(msg.contains("stdout=partial"));
        assert!(msg.contains("stderr=boom"));
    }

    #[test]
    fn test_tool_missing_has_help() {
        let err = ToolError::missing("cython", suggestions::TRANSLATOR_MISSING);
        let help = MietteDiagnostic::help(&err).map(|h| h.to_string());
        assert_eq!(help.as_deref(), Some(suggestions::TRANSLATOR_MISSING));
    }
}
