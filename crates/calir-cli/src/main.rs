//! The `calir` binary: a thin driver wiring `calir-text`'s parser,
//! `calir-verify`'s verifier, and `calir-interp`'s interpreter together
//! behind one command line, in the same `clap` + `anyhow` + `env_logger`
//! shape `faxt`/`faxc-drv` use at their own driver boundaries.

mod config;
mod error;

use std::fmt::Write as _;
use std::fs;

use anyhow::{Context as _, Result};
use clap::Parser;

use calir_ir::context::Context;
use calir_ir::layout::DataLayout;
use calir_ir::printer::print_module;
use calir_interp::Interpreter;

use config::{Config, EmitMode};
use error::CliError;

fn main() -> Result<()> {
    let config = Config::parse();
    init_logging(config.verbose);
    run(&config)
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();
}

fn run(config: &Config) -> Result<()> {
    let source = fs::read_to_string(&config.input)
        .with_context(|| format!("reading {}", config.input.display()))?;

    let ctx = Context::new();
    let module = calir_text::parse_module(&ctx, &source)
        .with_context(|| format!("parsing {}", config.input.display()))?;
    log::debug!("parsed module \"{}\" ({} function(s))", module.name, module.functions().len());

    match config.emit {
        EmitMode::Ir => {
            let mut out = String::new();
            print_module(&mut out, module).expect("writing to a String never fails");
            print!("{out}");
        }
        EmitMode::Verify => {
            verify_or_report(module)?;
            println!("ok");
        }
        EmitMode::Run => {
            verify_or_report(module)?;
            let entry_name = config.entry.as_deref().ok_or(CliError::MissingEntry)?;
            let function = module
                .find_function(entry_name)
                .ok_or_else(|| CliError::EntryNotFound { name: entry_name.to_string() })?;

            let interp = Interpreter::new(DataLayout::host());
            interp.load_globals(module)?;
            match interp.run(function, &[])? {
                Some(value) => println!("{value:?}"),
                None => log::info!("@{entry_name} returned void"),
            }
        }
    }
    Ok(())
}

fn verify_or_report(module: &calir_ir::Module<'_>) -> Result<()> {
    calir_verify::verify(module).map_err(|errors| {
        let mut message = String::new();
        for e in &errors {
            let _ = writeln!(message, "{e}");
        }
        CliError::VerificationFailed(message.trim_end().to_string()).into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_or_report_passes_a_well_formed_module() {
        let ctx = Context::new();
        let module = calir_text::parse_module(&ctx, r#"module = "m""#).unwrap();
        assert!(verify_or_report(module).is_ok());
    }
}
