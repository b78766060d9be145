//! Top-level entry point: parses arguments, builds a configuration, and
//! drives the disassembly pipeline.

use clap::Parser;

use crate::command::Cli;
use crate::config::DisasmConfig;
use crate::disasm::{print_block, print_instruction, run_blocks, run_linear};
use crate::error::Result;
use crate::version_info::print_extension_catalog;

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    run_with(&cli)
}

pub fn run_with(cli: &Cli) -> Result<()> {
    if cli.wants_extension_listing() {
        print_extension_catalog();
        return Ok(());
    }

    let config = DisasmConfig::from_cli(cli)?;

    if config.blocks {
        for block in run_blocks(&config)? {
            print_block(&block, config.detailed);
        }
    } else {
        for rendered in run_linear(&config)? {
            print_instruction(&rendered, config.detailed);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser as _;

    #[test]
    fn list_extensions_bypasses_disassembly() {
        let cli = Cli::try_parse_from(["etca-dis", "--list-extensions"]).unwrap();
        assert!(run_with(&cli).is_ok());
    }

    #[test]
    fn run_with_surfaces_truncated_input_as_an_error() {
        let cli = Cli::try_parse_from(["etca-dis", "--hex", "10"]).unwrap();
        assert!(run_with(&cli).is_err());
    }
}
