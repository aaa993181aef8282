//! Configuration module for the scanners.

pub mod binance;
pub mod scanner;
pub mod settings;

mod debug; // Private: callers use crate::config::DEBUG_FLAGS
pub use debug::DEBUG_FLAGS;

// Re-export commonly used items
pub use binance::{BINANCE, BinanceApiConfig};
pub use scanner::SCANNER;
pub use settings::ScanSettings;
