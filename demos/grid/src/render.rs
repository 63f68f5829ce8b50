use fanout_core::ResultSet;
use fanout_exec::Product;
use fanout_model::{FailureKind, Outcome};

const CELL_WIDTH: usize = 16;

/// Text cell for one outcome; the rejected representation depends on the failure kind only.
pub fn cell(outcome: &Outcome<Product>) -> String {
    let text = match outcome {
        Outcome::Fulfilled { value, .. } => format!("{} {}", value.id, value.price),
        Outcome::Rejected { kind, .. } => match kind {
            FailureKind::Throttled => "429 too many".to_string(),
            FailureKind::Generic => "request failed".to_string(),
            FailureKind::Cancelled => "cancelled".to_string(),
        },
    };
    format!("[{text:^width$}]", width = CELL_WIDTH - 2)
}

/// Placeholder shown for tasks without a usable result.
pub fn skeleton() -> String {
    format!("[{:^width$}]", "...", width = CELL_WIDTH - 2)
}

pub fn grid(results: &ResultSet<Product>, columns: usize) -> String {
    layout(results.iter().map(cell), columns)
}

pub fn skeleton_grid(count: usize, columns: usize) -> String {
    layout((0..count).map(|_| skeleton()), columns)
}

pub fn products_grid(products: &[Product], columns: usize) -> String {
    layout(
        products
            .iter()
            .map(|p| format!("[{:^width$}]", format!("{} {}", p.id, p.price), width = CELL_WIDTH - 2)),
        columns,
    )
}

fn layout(cells: impl Iterator<Item = String>, columns: usize) -> String {
    let columns = columns.max(1);
    let cells: Vec<String> = cells.collect();
    cells
        .chunks(columns)
        .map(|row| row.join(" "))
        .collect::<Vec<_>>()
        .join("\n")
}
