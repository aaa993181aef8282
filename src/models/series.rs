use serde::{Deserialize, Serialize};

use crate::domain::{Bar, SessionHours, SymbolInterval};

// ============================================================================
// Series: ordered bars for one symbol at one interval
// ============================================================================

/// What happened to a bar offered to `Series::push`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    Appended,
    /// Same open time as the newest bar: the newest bar was overwritten
    Replaced,
    /// Older than the newest bar: ignored
    Stale,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Series {
    pub symbol_interval: SymbolInterval,
    bars: Vec<Bar>,
}

impl Series {
    pub fn new(symbol_interval: SymbolInterval) -> Self {
        Self {
            symbol_interval,
            bars: Vec::new(),
        }
    }

    /// Build from bars in any order. Sorted by open time; for duplicate open
    /// times the later entry in `bars` wins.
    pub fn from_bars(symbol_interval: SymbolInterval, bars: Vec<Bar>) -> Self {
        let mut series = Self::new(symbol_interval);
        series.rebuild(bars);
        series
    }

    /// Wholesale replacement (historical reload).
    pub fn rebuild(&mut self, mut bars: Vec<Bar>) {
        // Stable sort keeps input order among equal timestamps
        bars.sort_by_key(|b| b.open_time_ms);
        let mut deduped: Vec<Bar> = Vec::with_capacity(bars.len());
        for bar in bars {
            match deduped.last_mut() {
                Some(last) if last.open_time_ms == bar.open_time_ms => *last = bar,
                _ => deduped.push(bar),
            }
        }
        self.bars = deduped;
    }

    /// Live update path. Only newer bars extend the series.
    pub fn push(&mut self, bar: Bar) -> PushOutcome {
        match self.bars.last_mut() {
            Some(last) if bar.open_time_ms < last.open_time_ms => PushOutcome::Stale,
            Some(last) if bar.open_time_ms == last.open_time_ms => {
                *last = bar;
                PushOutcome::Replaced
            }
            _ => {
                self.bars.push(bar);
                PushOutcome::Appended
            }
        }
    }

    /// Drop the oldest bars so at most `max_len` remain.
    pub fn cap_len(&mut self, max_len: usize) {
        if self.bars.len() > max_len {
            let excess = self.bars.len() - max_len;
            self.bars.drain(..excess);
        }
    }

    /// Keep only bars whose open time falls inside the session.
    pub fn retain_session(&mut self, session: &SessionHours) {
        self.bars.retain(|b| session.contains(b.open_time_ms));
    }

    pub fn symbol(&self) -> &str {
        self.symbol_interval.symbol()
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn last(&self) -> Option<&Bar> {
        self.bars.last()
    }

    pub fn last_open_time_ms(&self) -> Option<i64> {
        self.bars.last().map(|b| b.open_time_ms)
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }
}
