//! Table formatting for search results and index statistics.

use crate::types::SearchResult;
use crate::vector::IndexStats;
use comfy_table::{
    Attribute, Cell, CellAlignment, Color, Table, modifiers::UTF8_ROUND_CORNERS,
    presets::UTF8_FULL,
};

/// Builder for creating formatted tables.
pub struct TableBuilder {
    table: Table,
}

impl Default for TableBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TableBuilder {
    /// Create a new table builder.
    pub fn new() -> Self {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.apply_modifier(UTF8_ROUND_CORNERS);
        Self { table }
    }

    /// Set the table headers.
    pub fn set_headers(mut self, headers: Vec<&str>) -> Self {
        let header_cells: Vec<Cell> = headers
            .into_iter()
            .map(|h| Cell::new(h).add_attribute(Attribute::Bold))
            .collect();
        self.table.set_header(header_cells);
        self
    }

    /// Add a row to the table.
    pub fn add_row(mut self, row: Vec<String>) -> Self {
        self.table.add_row(row);
        self
    }

    /// Build and return the formatted table.
    pub fn build(self) -> String {
        self.table.to_string()
    }
}

/// Ranked results, best first, with the score colored by strength.
pub fn create_results_table(results: &[SearchResult]) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.apply_modifier(UTF8_ROUND_CORNERS);

    table.set_header(vec![
        Cell::new("#").add_attribute(Attribute::Bold),
        Cell::new("Score").add_attribute(Attribute::Bold),
        Cell::new("Platform").add_attribute(Attribute::Bold),
        Cell::new("Title").add_attribute(Attribute::Bold),
        Cell::new("Id").add_attribute(Attribute::Bold),
    ]);

    for (rank, result) in results.iter().enumerate() {
        // A lexical title/summary hit alone is worth 50
        let color = if result.relevance_score >= 50.0 {
            Color::Green
        } else if result.relevance_score >= 20.0 {
            Color::Yellow
        } else {
            Color::Grey
        };

        table.add_row(vec![
            Cell::new(rank + 1).set_alignment(CellAlignment::Right),
            Cell::new(format!("{:.1}", result.relevance_score))
                .fg(color)
                .set_alignment(CellAlignment::Right),
            Cell::new(result.platform),
            Cell::new(&result.title),
            Cell::new(&result.id),
        ]);
    }

    table.to_string()
}

/// Key/value view of an index generation.
pub fn create_stats_table(stats: &IndexStats, items: usize) -> String {
    TableBuilder::new()
        .set_headers(vec!["Metric", "Value"])
        .add_row(vec!["Items".to_string(), items.to_string()])
        .add_row(vec!["Indexed vectors".to_string(), stats.vectors.to_string()])
        .add_row(vec!["Index kind".to_string(), stats.kind.to_string()])
        .add_row(vec!["Dimension".to_string(), stats.dimension.to_string()])
        .add_row(vec!["Trained".to_string(), stats.trained.to_string()])
        .add_row(vec!["Generation".to_string(), stats.generation.to_string()])
        .build()
}
