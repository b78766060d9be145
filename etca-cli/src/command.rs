use std::path::PathBuf;

use clap::Parser;

use crate::error::{CliError, Result};

/// etca-dis - disassembles raw ETCa machine code.
#[derive(Parser, Debug)]
#[command(
    name = "etca-dis",
    about = "Disassembles raw ETCa machine code",
    version = clap::crate_version!(),
    author = clap::crate_authors!()
)]
pub struct Cli {
    /// Path to a raw binary file containing ETCa machine code.
    #[arg(help = "Raw binary file to disassemble")]
    pub input_file: Option<PathBuf>,

    /// Inline hexadecimal machine code, used instead of `input_file`.
    #[arg(
        long = "hex",
        help = "Hexadecimal machine code to disassemble (alternative to a file)"
    )]
    pub hex_code: Option<String>,

    /// Starting address in hexadecimal notation (defaults to zero when omitted).
    #[arg(
        short = 'a',
        long = "address",
        help = "Start address in hex format (default: 0)"
    )]
    pub address: Option<String>,

    /// Follow control flow and print basic blocks instead of a linear scan.
    #[arg(
        short = 'b',
        long = "blocks",
        help = "Reconstruct basic blocks by following control flow instead of a linear scan"
    )]
    pub blocks: bool,

    /// Print each instruction's required extensions alongside its rendering.
    #[arg(
        short = 'd',
        long = "detailed",
        help = "Show required extensions for each instruction"
    )]
    pub detailed: bool,

    /// List the catalog of ETCa extensions this build recognizes and exit.
    #[arg(long = "list-extensions", help = "List recognized ETCa extensions and exit")]
    pub list_extensions: bool,
}

impl Cli {
    /// Whether this invocation should just print the extension catalog.
    pub fn wants_extension_listing(&self) -> bool {
        self.list_extensions
    }

    /// Validates the raw CLI arguments and returns a processed configuration.
    pub fn validate(&self) -> Result<ValidatedConfig> {
        if self.input_file.is_none() && self.hex_code.is_none() {
            return Err(CliError::MissingArgument(
                "either an input file or --hex must be provided".to_string(),
            ));
        }
        if self.input_file.is_some() && self.hex_code.is_some() {
            return Err(CliError::validation(
                "input",
                "an input file and --hex are mutually exclusive",
            ));
        }

        let address = self.validate_address()?;

        Ok(ValidatedConfig {
            input_file: self.input_file.clone(),
            hex_code: self.hex_code.clone(),
            address,
            blocks: self.blocks,
            detailed: self.detailed,
        })
    }

    fn validate_address(&self) -> Result<u64> {
        match &self.address {
            Some(addr) => {
                let clean = addr.trim().trim_start_matches("0x").trim_start_matches("0X");
                if clean.is_empty() {
                    return Err(CliError::validation("address", "empty address provided"));
                }
                u64::from_str_radix(clean, 16)
                    .map_err(|_| CliError::validation("address", "invalid hexadecimal address"))
            }
            None => Ok(0),
        }
    }
}

/// Validated and processed command-line configuration.
#[derive(Debug, Clone)]
pub struct ValidatedConfig {
    pub input_file: Option<PathBuf>,
    pub hex_code: Option<String>,
    pub address: u64,
    pub blocks: bool,
    pub detailed: bool,
}
