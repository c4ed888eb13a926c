//! Plain-text tables for terminal output.

use colored::Colorize;

/// Rows a listing shows before it is cut off.
pub const MAX_ROWS: usize = 10;

const GAP: &str = "  ";

/// A titled table, rendered with columns padded to their widest cell.
#[derive(Debug, Clone)]
pub struct Table {
    title: String,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    limit: Option<(usize, &'static str)>,
}

impl Table {
    pub fn new(title: impl Into<String>, headers: &[&str]) -> Self {
        Self {
            title: title.into(),
            headers: headers.iter().map(ToString::to_string).collect(),
            rows: Vec::new(),
            limit: None,
        }
    }

    /// Show at most [`MAX_ROWS`] rows, with a footer naming the total in `noun`.
    #[must_use]
    pub const fn limited(mut self, noun: &'static str) -> Self {
        self.limit = Some((MAX_ROWS, noun));
        self
    }

    pub fn row(&mut self, cells: Vec<String>) {
        self.rows.push(cells);
    }

    pub fn render(&self) -> String {
        let shown = self
            .limit
            .map_or(self.rows.len(), |(limit, _)| limit.min(self.rows.len()));
        let rows = &self.rows[..shown];

        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.chars().count());
            }
        }

        let mut out = String::new();
        out.push_str(&self.title.as_str().bold().to_string());
        out.push('\n');

        let header = pad_row(&self.headers, &widths);
        out.push_str(&header.as_str().cyan().bold().to_string());
        out.push('\n');
        out.push_str(&"-".repeat(header.chars().count()));
        out.push('\n');

        if rows.is_empty() {
            out.push_str(&"(none)".dimmed().to_string());
            out.push('\n');
        }
        for row in rows {
            out.push_str(&pad_row(row, &widths));
            out.push('\n');
        }

        if let Some((_, noun)) = self.limit {
            if self.rows.len() > shown {
                let footer = format!("Showing first {shown} of {} {noun}", self.rows.len());
                out.push_str(&footer.yellow().to_string());
                out.push('\n');
            }
        }
        out
    }

    pub fn print(&self) {
        print!("{}", self.render());
    }
}

fn pad_row(cells: &[String], widths: &[usize]) -> String {
    widths
        .iter()
        .enumerate()
        .map(|(i, &width)| {
            let cell = cells.get(i).map_or("", String::as_str);
            format!("{cell:<width$}")
        })
        .collect::<Vec<_>>()
        .join(GAP)
        .trim_end()
        .to_string()
}

/// `value` cut to `max` characters, with `...` when shortened.
pub fn short(value: &str, max: usize) -> String {
    if value.chars().count() <= max {
        value.to_string()
    } else {
        let head: String = value.chars().take(max).collect();
        format!("{head}...")
    }
}

/// Satoshi amount with thousands separators.
pub fn sats(amount: u64) -> String {
    let digits = amount.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Display `value`, or `N/A` when absent.
pub fn or_na<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| "N/A".to_string(), |v| v.to_string())
}
