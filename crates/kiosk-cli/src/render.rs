//! Plain-text rendering of the locker grid.
//!
//! ```text
//! deposit lockers, updated 2026-10-19 09:41:07 UTC
//!   [ 1 .] ( 2 #) [ 3 .] > 4 .< ( 5 o)
//!   ...
//!   . available  # occupied  o open  ( ) disabled  > < selected
//! ```

use std::fmt::Write as _;

use kiosk_core::LockerStatus;
use kiosk_state::{GridView, LockerCell};

/// Buttons per row, matching the physical bank.
pub const COLUMNS: usize = 5;

const LEGEND: &str = ". available  # occupied  o open  ( ) disabled  > < selected";

fn status_mark(status: LockerStatus) -> char {
    match status {
        LockerStatus::Available => '.',
        LockerStatus::Occupied => '#',
        LockerStatus::Open => 'o',
    }
}

/// One button, six characters wide.
pub fn render_cell(cell: &LockerCell) -> String {
    let (open, close) = if cell.selected {
        ('>', '<')
    } else if cell.enabled {
        ('[', ']')
    } else {
        ('(', ')')
    };
    format!("{open}{:>2} {}{close}", cell.id.get(), status_mark(cell.status))
}

/// The whole grid with a header line and a legend.
pub fn render_grid(grid: &GridView) -> String {
    let mut out = match grid.updated_at {
        Some(at) => format!("{} lockers, updated {}\n", grid.flow, at.format("%Y-%m-%d %H:%M:%S UTC")),
        None => format!("{} lockers, no status received yet\n", grid.flow),
    };
    for row in grid.cells.chunks(COLUMNS) {
        let cells: Vec<String> = row.iter().map(render_cell).collect();
        let _ = writeln!(out, "  {}", cells.join(" "));
    }
    out.push_str("  ");
    out.push_str(LEGEND);
    out
}
