//! CLI definitions using clap.

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

/// nestkit - build and package the PyNEST extension against an installed NEST
#[derive(Parser)]
#[command(name = "nestkit")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// NEST configuration provider to query instead of `nest-config`
    #[arg(long, global = true, env = "NESTKIT_PROVIDER", value_name = "PATH")]
    pub provider: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print one facet reported by the configuration provider
    Query(QueryArgs),

    /// Show the build descriptor and derived compiler flags
    Plan(PlanArgs),

    /// Translate and compile the extension module
    Build(BuildArgs),

    /// Run the Python packaging tool with the assembled plan
    Package(PackageArgs),

    /// Check the environment for required tools
    Doctor(DoctorArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args)]
pub struct QueryArgs {
    /// Facet to query, e.g. `libs` for `nest-config --libs`
    pub kind: String,
}

#[derive(Args)]
pub struct PlanArgs {
    /// Use the pre-translated C++ source instead of running Cython
    #[arg(long = "no-cythonize")]
    pub no_cythonize: bool,

    /// Print the full plan as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct BuildArgs {
    /// Use the pre-translated C++ source instead of running Cython
    #[arg(long = "no-cythonize")]
    pub no_cythonize: bool,
}

#[derive(Args)]
pub struct PackageArgs {
    /// Arguments forwarded to the packaging tool
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}

#[derive(Args)]
pub struct DoctorArgs {}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Split the command line at the `package` subcommand.
///
/// Returns the arguments clap should parse and, for `package`, the raw
/// arguments after it. Global flags like `-v` and `--help` written after
/// `package` belong to the packaging tool, so clap never sees them.
pub fn split_package_args(argv: Vec<String>) -> (Vec<String>, Option<Vec<String>>) {
    let mut i = 1;
    while i < argv.len() {
        match argv[i].as_str() {
            "--provider" => i += 2,
            "package" => {
                let mut head = argv;
                let tail = head.split_off(i + 1);
                return (head, Some(tail));
            }
            flag if flag.starts_with('-') => i += 1,
            _ => break,
        }
    }
    (argv, None)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_package_keeps_trailing_flags() {
        let (head, tail) = split_package_args(argv(&[
            "nestkit", "-v", "package", "-v", "--help", "--no-color", "install",
        ]));
        assert_eq!(head, argv(&["nestkit", "-v", "package"]));
        assert_eq!(tail, Some(argv(&["-v", "--help", "--no-color", "install"])));

        let cli = Cli::parse_from(head);
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Package(ref args) if args.args.is_empty()));
    }

    #[test]
    fn test_provider_value_is_not_a_subcommand() {
        let (head, tail) = split_package_args(argv(&[
            "nestkit", "--provider", "package", "package", "--provider", "x",
        ]));
        assert_eq!(head, argv(&["nestkit", "--provider", "package", "package"]));
        assert_eq!(tail, Some(argv(&["--provider", "x"])));
    }

    #[test]
    fn test_other_commands_are_untouched() {
        let raw = argv(&["nestkit", "query", "package"]);
        assert_eq!(split_package_args(raw.clone()), (raw, None));

        let raw = argv(&["nestkit", "--help"]);
        assert_eq!(split_package_args(raw.clone()), (raw, None));
    }
}
