use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color as TableColor, ContentArrangement, Table};

/// Table and cell creation helpers
pub fn create_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

pub fn cyan_header(labels: &[&str]) -> Vec<Cell> {
    labels
        .iter()
        .map(|label| Cell::new(*label).fg(TableColor::Cyan))
        .collect()
}

/// Colors a summed failure count against the mean across jobs.
pub fn color_coded_failures_cell(failures: usize, mean: usize) -> Cell {
    let text = failures.to_string();
    if failures > mean.saturating_mul(2) {
        Cell::new(text).fg(TableColor::Red)
    } else if failures > mean {
        Cell::new(text).fg(TableColor::Yellow)
    } else {
        Cell::new(text).fg(TableColor::Green)
    }
}

/// Green when nothing was lost, yellow otherwise.
pub fn count_cell(count: usize, lost: bool) -> Cell {
    let cell = Cell::new(count);
    if lost && count > 0 {
        cell.fg(TableColor::Yellow)
    } else {
        cell.fg(TableColor::Green)
    }
}
