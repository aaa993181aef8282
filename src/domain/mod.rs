// Domain types and value objects
pub mod bar;
pub mod session;
pub mod symbol_interval;

// Re-export commonly used types
pub use bar::Bar;
pub use session::SessionHours;
pub use symbol_interval::SymbolInterval;
