//! Bordered text table for terminal output.
//!
//! All formatting lives here so the aggregation code stays free of
//! presentation concerns and the rendered output can be asserted in tests.

use crate::data::{PUBLICATION_DATE_FORMAT, REQUEST_DATE_FORMAT};
use crate::domain::Extreme;
use crate::report::ReportRow;
use crate::window::LookbackWindow;

const COLUMNS: usize = 5;

#[derive(Debug, Clone, Copy)]
enum Align {
    Left,
    Right,
}

const ALIGN: [Align; COLUMNS] = [Align::Right, Align::Left, Align::Left, Align::Left, Align::Right];

/// Render the report table.
///
/// Body rows are each followed by a separator; the last row is the footer.
/// With no rows only the header is drawn.
pub fn render_table(rows: &[ReportRow], window: &LookbackWindow) -> String {
    let header = header_cells(window);
    let cells: Vec<[String; COLUMNS]> = rows.iter().map(row_cells).collect();

    let mut widths = [0usize; COLUMNS];
    for line in std::iter::once(&header).chain(cells.iter()) {
        for (w, cell) in widths.iter_mut().zip(line) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let border = border_line(&widths);
    let mut out = String::new();
    push_line(&mut out, &border);
    push_line(&mut out, &cells_line(&header, &widths));
    push_line(&mut out, &border);

    if let Some((footer, body)) = cells.split_last() {
        for line in body {
            push_line(&mut out, &cells_line(line, &widths));
            push_line(&mut out, &border);
        }
        push_line(&mut out, &cells_line(footer, &widths));
        push_line(&mut out, &border);
    }

    out
}

fn header_cells(window: &LookbackWindow) -> [String; COLUMNS] {
    [
        "#".to_string(),
        "Currency".to_string(),
        "Min (date)".to_string(),
        "Max (date)".to_string(),
        format!(
            "AVG ({} - {})",
            window.start.format(REQUEST_DATE_FORMAT),
            window.end.format(REQUEST_DATE_FORMAT)
        ),
    ]
}

fn row_cells(row: &ReportRow) -> [String; COLUMNS] {
    [
        row.index.to_string(),
        row.code.clone(),
        fmt_extreme(&row.min),
        fmt_extreme(&row.max),
        fmt_value(row.average),
    ]
}

/// Shortest round-trip representation, e.g. `91.5` or `89`.
fn fmt_value(v: f64) -> String {
    format!("{v}")
}

fn fmt_extreme(e: &Extreme) -> String {
    format!("{} ({})", fmt_value(e.value), e.date.format(PUBLICATION_DATE_FORMAT))
}

fn border_line(widths: &[usize; COLUMNS]) -> String {
    let mut line = String::from("+");
    for w in widths {
        line.push_str(&"-".repeat(w + 2));
        line.push('+');
    }
    line
}

fn cells_line(cells: &[String; COLUMNS], widths: &[usize; COLUMNS]) -> String {
    let mut line = String::from("|");
    for ((cell, &w), align) in cells.iter().zip(widths).zip(ALIGN) {
        let padded = match align {
            Align::Left => format!(" {cell:<w$} "),
            Align::Right => format!(" {cell:>w$} "),
        };
        line.push_str(&padded);
        line.push('|');
    }
    line
}

fn push_line(out: &mut String, line: &str) {
    out.push_str(line);
    out.push('\n');
}
