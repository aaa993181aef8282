//! Debugging feature flags.
//!
//! Toggle individual diagnostics here; keep them `false` by default so the
//! scanners stay quiet. Every flag is additionally gated by
//! `cfg(debug_assertions)` at the call site.

pub struct DebugFlags {
    /// Emit verbose logging for kline stream connections and bar updates.
    pub print_stream_updates: bool,
    /// Emit per-batch progress while fetching history.
    pub print_fetch_progress: bool,
    /// Emit the stats behind every breakout decision, fired or not.
    pub print_breakout_stats: bool,
    /// If non-empty, dump the newest indicator rows for this symbol on every evaluation.
    /// Example: "BTCUSDT". Use "" to disable.
    pub print_rows_for_symbol: &'static str,
    /// Emit the rendered report instead of only the page count.
    pub print_report_pages: bool,
    /// Emit shutdown messages.
    pub print_shutdown: bool,
}

pub const DEBUG_FLAGS: DebugFlags = DebugFlags {
    print_stream_updates: false,
    print_fetch_progress: false,
    print_breakout_stats: false,
    print_rows_for_symbol: "",
    print_report_pages: false,
    print_shutdown: true,
};
