//! Version and extension-catalog banners for the `--version` and
//! `--list-extensions` flags.

use etca_core::prelude::all_extensions;

/// Print the version banner.
pub fn print_version_info() {
    println!("etca-dis v{}", clap::crate_version!());
    println!("ETCa bit-pattern disassembler");
}

/// Print every extension this build's catalog recognizes, one per line.
pub fn print_extension_catalog() {
    println!("Recognized extensions:");
    for ext in all_extensions() {
        println!("  {ext}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_catalog_is_nonempty() {
        assert!(!all_extensions().is_empty());
    }

    #[test]
    fn version_banner_does_not_panic() {
        print_version_info();
        print_extension_catalog();
    }
}
