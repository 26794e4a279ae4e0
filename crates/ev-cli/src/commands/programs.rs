use ev_pipeline::{ComplianceProgram, ProgramCatalog};
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::output::output;
use crate::output::table::Column;
use crate::output::Tabular;

#[derive(Debug, Serialize)]
pub struct ProgramRow {
    pub name: String,
    pub code: Option<String>,
    pub description: String,
    /// Non-blank lines in the starter checklist.
    pub requirements: usize,
}

impl From<&ComplianceProgram> for ProgramRow {
    fn from(program: &ComplianceProgram) -> Self {
        Self {
            name: program.name.clone(),
            code: program.short_code().map(str::to_string),
            description: program.description.clone(),
            requirements: program
                .checklist
                .lines()
                .filter(|line| !line.trim().is_empty())
                .count(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(transparent)]
pub struct ProgramList(Vec<ProgramRow>);

impl Tabular for ProgramList {
    fn columns(&self) -> Vec<Column> {
        vec![
            Column::left("code"),
            Column::wrapping("name"),
            Column::right("requirements"),
            Column::wrapping("description"),
        ]
    }

    fn rows(&self) -> Vec<Vec<String>> {
        self.0
            .iter()
            .map(|row| {
                vec![
                    row.code.clone().unwrap_or_else(|| "-".into()),
                    row.name.clone(),
                    row.requirements.to_string(),
                    row.description.clone(),
                ]
            })
            .collect()
    }
}

/// Handle `evd programs`.
pub fn handle(catalog: &ProgramCatalog, flags: &GlobalFlags) -> anyhow::Result<()> {
    let list = ProgramList(catalog.iter().map(ProgramRow::from).collect());
    output(&list, flags.format)
}
