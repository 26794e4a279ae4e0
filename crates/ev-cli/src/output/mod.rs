use std::fmt::Write as _;

use ev_core::{Checklist, ChecklistItem, ChecklistReport};
use serde::Serialize;

use crate::cli::OutputFormat;
use crate::ui;

pub mod table;

use table::{Column, TableOptions};

/// A response that can also be shown as a table.
pub trait Tabular {
    fn columns(&self) -> Vec<Column>;

    fn rows(&self) -> Vec<Vec<String>>;

    /// Text printed below the table.
    fn footer(&self) -> Option<String> {
        None
    }
}

/// Render a response to a string in the requested format.
pub fn render<T: Serialize + Tabular>(value: &T, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(value)?),
        OutputFormat::Table => {
            let prefs = ui::prefs();
            let options = TableOptions {
                max_width: prefs.term_width,
                color: prefs.table_color,
            };
            Ok(render_tabular(value, options))
        }
    }
}

/// Print a response in the requested format.
pub fn output<T: Serialize + Tabular>(value: &T, format: OutputFormat) -> anyhow::Result<()> {
    let rendered = render(value, format)?;
    println!("{rendered}");
    Ok(())
}

fn render_tabular<T: Tabular>(value: &T, options: TableOptions) -> String {
    let mut rendered = table::render_table(&value.columns(), &value.rows(), options);
    if let Some(footer) = value.footer() {
        rendered.push_str("\n\n");
        rendered.push_str(&footer);
    }
    rendered
}

fn item_row(item: &ChecklistItem) -> Vec<String> {
    vec![
        item.id().to_string(),
        item.status().to_string(),
        item.confidence()
            .map_or_else(|| "-".to_string(), |c| format!("{c:.2}")),
        item.requirement().to_string(),
        item.reason().to_string(),
        item.references().to_string(),
    ]
}

fn item_columns() -> Vec<Column> {
    vec![
        Column::right("id"),
        Column::left("status"),
        Column::right("confidence"),
        Column::wrapping("requirement"),
        Column::wrapping("reason"),
        Column::wrapping("references"),
    ]
}

impl Tabular for ChecklistReport {
    fn columns(&self) -> Vec<Column> {
        item_columns()
    }

    fn rows(&self) -> Vec<Vec<String>> {
        self.checklist.iter().map(item_row).collect()
    }

    fn footer(&self) -> Option<String> {
        let s = &self.summary;
        let mut footer = format!(
            "{} items: {} compliant, {} non-compliant, {} ambiguous",
            s.total, s.compliant, s.non_compliant, s.ambiguous
        );
        if s.failed > 0 {
            let _ = write!(footer, " ({} failed to evaluate)", s.failed);
        }
        for skipped in &self.skipped_documents {
            let _ = write!(
                footer,
                "\nskipped {}: {}",
                skipped.path.display(),
                skipped.reason
            );
        }
        Some(footer)
    }
}

impl Tabular for Checklist {
    fn columns(&self) -> Vec<Column> {
        vec![Column::right("id"), Column::wrapping("requirement")]
    }

    fn rows(&self) -> Vec<Vec<String>> {
        self.iter()
            .map(|item| vec![item.id().to_string(), item.requirement().to_string()])
            .collect()
    }
}
