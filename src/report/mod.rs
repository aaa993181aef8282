//! Plain-text reports for chat: GitHub-markdown tables, paged, wrapped in code blocks.

use prettytable::format::{Alignment, FormatBuilder, LinePosition, LineSeparator, TableFormat};
use prettytable::{Cell, Row, Table};

use crate::models::{IndicatorRow, Signal};
use crate::utils::format::{optional, with_thousands};
use crate::utils::time_utils::bar_time_label;

/// `| a | b |` rows with a `|---|---|` line under the header.
fn github_format() -> TableFormat {
    FormatBuilder::new()
        .column_separator('|')
        .borders('|')
        .separators(&[LinePosition::Title], LineSeparator::new('-', '|', '|', '|'))
        .padding(1, 1)
        .build()
}

fn header(names: &[&str]) -> Row {
    Row::new(names.iter().map(|n| Cell::new(n)).collect())
}

fn text(value: &str) -> Cell {
    Cell::new(value)
}

fn number(value: String) -> Cell {
    Cell::new_align(&value, Alignment::RIGHT)
}

/// Optional columns of the signal table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportColumns {
    pub percent_change: bool,
    pub rsi: bool,
    pub rsi_tag: bool,
}

impl ReportColumns {
    /// Show an optional column when any signal carries the value.
    pub fn for_signals(signals: &[Signal]) -> Self {
        let rsi = signals.iter().any(|s| s.metrics.rsi.is_some());
        Self {
            percent_change: signals.iter().any(|s| s.metrics.percent_change.is_some()),
            rsi,
            rsi_tag: rsi,
        }
    }

    pub fn headers(&self) -> Vec<&'static str> {
        let mut names = vec!["symbol", "dir", "price_change"];
        if self.percent_change {
            names.push("perc_change");
        }
        names.push("volume");
        if self.rsi {
            names.push("rsi");
        }
        if self.rsi_tag {
            names.push("rsi_tag");
        }
        names
    }
}

/// Consecutive pages of at most `page_size` items, order kept.
pub fn paginate<T>(items: &[T], page_size: usize) -> Vec<&[T]> {
    items.chunks(page_size.max(1)).collect()
}

pub fn signal_table(signals: &[Signal], columns: ReportColumns) -> Table {
    let mut table = Table::new();
    table.set_format(github_format());
    table.set_titles(header(&columns.headers()));

    for signal in signals {
        let m = &signal.metrics;
        let mut cells = vec![
            text(&signal.symbol),
            text(&signal.direction.to_string()),
            number(with_thousands(m.price_change, 2)),
        ];
        if columns.percent_change {
            cells.push(number(optional(m.percent_change, 2)));
        }
        cells.push(number(with_thousands(m.volume, 0)));
        if columns.rsi {
            cells.push(number(optional(m.rsi, 2)));
        }
        if columns.rsi_tag {
            cells.push(text(&signal.rsi_tag().to_string()));
        }
        table.add_row(Row::new(cells));
    }
    table
}

/// One page: title line, then the table.
pub fn render_page(title: &str, signals: &[Signal], columns: ReportColumns) -> String {
    format!("{}:\n{}", title, signal_table(signals, columns))
}

/// Chat code block, so the table keeps its alignment.
pub fn wrap_code_block(text: &str) -> String {
    format!("```\n{}\n```", text.trim_end())
}

/// Every page of `signals`, ready to send. Empty when there is nothing to report.
pub fn render_report(title: &str, signals: &[Signal], page_size: usize) -> Vec<String> {
    let columns = ReportColumns::for_signals(signals);
    let pages = paginate(signals, page_size);
    let page_count = pages.len();

    pages
        .into_iter()
        .enumerate()
        .map(|(i, page)| {
            let page_title = if page_count > 1 {
                format!("{} ({}/{})", title, i + 1, page_count)
            } else {
                title.to_string()
            };
            wrap_code_block(&render_page(&page_title, page, columns))
        })
        .collect()
}

/// The newest `count` rows of one symbol with their Heiken-Ashi candles.
pub fn recent_bars_table(rows: &[IndicatorRow], count: usize) -> Table {
    let mut table = Table::new();
    table.set_format(github_format());
    table.set_titles(header(&[
        "time",
        "close",
        "volume",
        "price_change",
        "perc_change",
        "bar_size",
        "ha_open",
        "ha_high",
        "ha_low",
        "ha_close",
    ]));

    let start = rows.len().saturating_sub(count);
    for row in &rows[start..] {
        let ha = &row.heiken_ashi;
        table.add_row(Row::new(vec![
            text(&bar_time_label(row.open_time_ms())),
            number(with_thousands(row.bar.close, 2)),
            number(with_thousands(row.bar.volume, 0)),
            number(optional(row.price_change, 2)),
            number(optional(row.percent_change, 2)),
            number(with_thousands(row.bar_size, 2)),
            number(with_thousands(ha.open, 2)),
            number(with_thousands(ha.high, 2)),
            number(with_thousands(ha.low, 2)),
            number(with_thousands(ha.close, 2)),
        ]));
    }
    table
}

/// Live breakout alert: one symbol's recent bars under the alert title.
pub fn render_recent_bars(title: &str, symbol: &str, rows: &[IndicatorRow], count: usize) -> String {
    wrap_code_block(&format!(
        "{}: {}\n{}",
        title,
        symbol,
        recent_bars_table(rows, count)
    ))
}
