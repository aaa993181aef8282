// Market data: the source abstraction, concrete adapters, batched loads and screening
pub mod binance;
pub mod history;
pub mod memory;
pub mod source;
pub mod universe;

// Re-export commonly used types
pub use binance::BinanceSource;
pub use history::{HistoryWindow, fetch_histories};
pub use memory::InMemorySource;
pub use source::{BarUpdate, MarketDataSource, StreamEvent};
pub use universe::discover_symbols;
