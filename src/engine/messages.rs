use crate::domain::Bar;
use crate::models::{Series, Signal};

/// Work for one symbol's task. Each task is the only writer of its Series.
#[derive(Debug, Clone)]
pub enum SymbolCommand {
    /// Replace the whole buffer (historical reload after a (re)connect)
    Reload(Series),
    /// A closed bar from the live stream
    Bar(Bar),
}

/// A signal ready for delivery
#[derive(Debug, Clone)]
pub struct Alert {
    pub signal: Signal,
    // Rendered chat message
    pub text: String,
}
