use crate::command::{Cli, ValidatedConfig};
use crate::error::{CliError, Result};

/// Fully validated configuration derived from CLI arguments: the raw bytes to
/// disassemble, the starting address, and the requested output mode.
#[derive(Debug, Clone)]
pub struct DisasmConfig {
    pub bytes: Vec<u8>,
    pub start_address: u64,
    pub blocks: bool,
    pub detailed: bool,
}

impl DisasmConfig {
    /// Builds a configuration from CLI input, reading the input file or
    /// decoding the inline hex string as appropriate.
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let validated = cli.validate()?;
        Self::from_validated(validated)
    }

    pub fn from_validated(validated: ValidatedConfig) -> Result<Self> {
        let bytes = match (&validated.input_file, &validated.hex_code) {
            (Some(path), None) => std::fs::read(path)?,
            (None, Some(hex_code)) => {
                let clean = hex_code.trim().trim_start_matches("0x").trim_start_matches("0X");
                hex::decode(clean)
                    .map_err(|e| CliError::validation("hex_code", format!("invalid hex: {e}")))?
            }
            _ => {
                return Err(CliError::MissingArgument(
                    "either an input file or --hex must be provided".to_string(),
                ));
            }
        };

        Ok(DisasmConfig {
            bytes,
            start_address: validated.address,
            blocks: validated.blocks,
            detailed: validated.detailed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser as _;

    #[test]
    fn from_cli_decodes_inline_hex() {
        let cli = Cli::try_parse_from(["etca-dis", "--hex", "10000100"]).unwrap();
        let config = DisasmConfig::from_cli(&cli).unwrap();
        assert_eq!(config.bytes, vec![0x10, 0x00, 0x01, 0x00]);
        assert_eq!(config.start_address, 0);
    }

    #[test]
    fn from_cli_rejects_odd_length_hex() {
        let cli = Cli::try_parse_from(["etca-dis", "--hex", "100"]).unwrap();
        assert!(DisasmConfig::from_cli(&cli).is_err());
    }
}
