//! Fixed 12 x 32 year grid: one row per month, column 0 holds the month
//! label and columns 1..=31 hold day-of-month slots.

use chrono::{Datelike, NaiveDate, Weekday};

pub const CELL_WIDTH: f64 = 50.0;
pub const CELL_HEIGHT: f64 = 75.0;
pub const CELL_PADDING: f64 = 5.0;
pub const COLUMNS: u32 = 32;
pub const ROWS: u32 = 12;

/// Overall canvas size in user units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Canvas {
    pub width: f64,
    pub height: f64,
}

impl Canvas {
    pub fn for_header(header_height: f64) -> Self {
        Self {
            width: COLUMNS as f64 * CELL_WIDTH,
            height: ROWS as f64 * CELL_HEIGHT + header_height,
        }
    }

    /// Pixel size used for rasterization
    pub fn pixel_size(&self) -> (u32, u32) {
        (self.width.ceil().max(1.0) as u32, self.height.ceil().max(1.0) as u32)
    }
}

/// Top-left corner of a cell. Rows start one unit above the header edge so
/// the outer border stroke sits on the first row's top line.
pub fn cell_origin(row: u32, column: u32, header_height: f64) -> (f64, f64) {
    (
        column as f64 * CELL_WIDTH,
        row as f64 * CELL_HEIGHT + header_height - 1.0,
    )
}

/// A real calendar day placed in the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayCell {
    pub date: NaiveDate,
    pub is_weekend: bool,
    /// Number of weekend days earlier in the same month. For a weekend cell
    /// this is its 0-based position among the month's weekend days.
    pub weekend_index: usize,
}

impl DayCell {
    pub fn weekday(&self) -> Weekday {
        self.date.weekday()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellKind {
    MonthLabel,
    Day(DayCell),
    /// Column past the end of the month (e.g. April 31st)
    Blank,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub row: u32,
    pub column: u32,
    pub kind: CellKind,
}

pub fn is_weekend(weekday: Weekday) -> bool {
    matches!(weekday, Weekday::Sat | Weekday::Sun)
}

pub fn days_in_month(year: i32, month0: u32) -> u32 {
    (28..=31)
        .rev()
        .find(|&d| NaiveDate::from_ymd_opt(year, month0 + 1, d).is_some())
        .unwrap_or(0)
}

/// Visit all 384 grid positions in row-major order.
pub fn for_each_cell<F>(year: i32, mut visit: F)
where
    F: FnMut(Cell),
{
    for row in 0..ROWS {
        let mut weekends_seen = 0usize;
        for column in 0..COLUMNS {
            let kind = if column == 0 {
                CellKind::MonthLabel
            } else {
                match NaiveDate::from_ymd_opt(year, row + 1, column) {
                    Some(date) => {
                        let weekend = is_weekend(date.weekday());
                        let cell = DayCell {
                            date,
                            is_weekend: weekend,
                            weekend_index: weekends_seen,
                        };
                        if weekend {
                            weekends_seen += 1;
                        }
                        CellKind::Day(cell)
                    }
                    None => CellKind::Blank,
                }
            };
            visit(Cell { row, column, kind });
        }
    }
}

/// Collect every cell of `year`; handy for inspection and tests.
pub fn cells(year: i32) -> Vec<Cell> {
    let mut out = Vec::with_capacity((ROWS * COLUMNS) as usize);
    for_each_cell(year, |c| out.push(c));
    out
}
