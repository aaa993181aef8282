// Scan orchestration: one-shot and polled scans, the live stream loop
pub mod live;
pub mod messages;
pub mod poll;
pub mod schedule;
pub mod state;
pub mod worker;

// Re-export key components
pub use live::{LiveSummary, run_live};
pub use poll::{ScanOutcome, run_poll_loop, run_scan_cycle};
pub use schedule::ScanSchedule;
pub use state::SymbolState;
