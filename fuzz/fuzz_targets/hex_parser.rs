#![no_main]

use libfuzzer_sys::fuzz_target;

use etca_cli::command::ValidatedConfig;
use etca_cli::DisasmConfig;

fuzz_target!(|hex_code: String| {
    let validated = ValidatedConfig {
        input_file: None,
        hex_code: Some(hex_code),
        address: 0,
        blocks: false,
        detailed: false,
    };
    let _ = DisasmConfig::from_validated(validated);
});
