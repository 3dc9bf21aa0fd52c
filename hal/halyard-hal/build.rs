//! Build script for halyard-hal
//!
//! Reads the number of enabled UART channels from `HALYARD_UART_CHANNELS`
//! and emits it as a constant, so the dispatch registry and the descriptor
//! table are sized at compile time.

use std::env;
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

/// Highest channel count any supported part provides (USART1..UART5)
const MAX_CHANNELS: usize = 5;

fn main() {
    println!("cargo:rerun-if-env-changed=HALYARD_UART_CHANNELS");
    println!("cargo:rerun-if-changed=build.rs");

    let enabled = match env::var("HALYARD_UART_CHANNELS") {
        Ok(raw) => parse_channel_count(&raw),
        Err(_) => MAX_CHANNELS,
    };

    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let mut f = File::create(out_dir.join("uart_channels.rs")).unwrap();
    writeln!(f, "/// Number of UART channels enabled by the build configuration").unwrap();
    writeln!(f, "pub const ENABLED_CHANNELS: usize = {};", enabled).unwrap();
}

/// Validate the configured channel count, failing the build on bad input
fn parse_channel_count(raw: &str) -> usize {
    let count: usize = match raw.trim().parse() {
        Ok(count) => count,
        Err(_) => panic!("HALYARD_UART_CHANNELS must be a number, got {:?}", raw),
    };

    if count == 0 || count > MAX_CHANNELS {
        panic!(
            "HALYARD_UART_CHANNELS must be between 1 and {}, got {}",
            MAX_CHANNELS, count
        );
    }

    count
}
