//! The driver's command-line surface: one input file and three things it
//! can be asked to do with it, in the same clap-derive shape as the
//! teacher's `faxt::Cli` but scoped to Calir's print/verify/interpret
//! operations instead of a subcommand tree.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// What to do with the parsed, verified module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EmitMode {
    /// Print the canonical re-serialization of the module.
    Ir,
    /// Run the verifier and print its diagnostics (exit code signals pass/fail).
    Verify,
    /// Run the verifier, then interpret `--entry` and print its result.
    Run,
}

/// Parse, verify, and (optionally) interpret one `.cal` text file.
#[derive(Parser, Debug)]
#[command(name = "calir")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Parse, verify, and interpret Calir IR text files", long_about = None)]
pub struct Config {
    /// Path to a `.cal` IR text file.
    pub input: PathBuf,

    /// What to do with the module once it's parsed.
    #[arg(long, value_enum, default_value_t = EmitMode::Ir)]
    pub emit: EmitMode,

    /// Function to interpret, required for `--emit=run`.
    #[arg(long)]
    pub entry: Option<String>,

    /// Enable debug-level logging (`RUST_LOG` still takes precedence if set).
    #[arg(short, long)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_emit_ir() {
        let config = Config::parse_from(["calir", "module.cal"]);
        assert_eq!(config.emit, EmitMode::Ir);
        assert_eq!(config.entry, None);
        assert!(!config.verbose);
    }

    #[test]
    fn parses_run_with_entry_and_verbose() {
        let config = Config::parse_from(["calir", "-v", "--emit", "run", "--entry", "main", "module.cal"]);
        assert_eq!(config.emit, EmitMode::Run);
        assert_eq!(config.entry, Some("main".to_string()));
        assert!(config.verbose);
        assert_eq!(config.input, PathBuf::from("module.cal"));
    }
}
