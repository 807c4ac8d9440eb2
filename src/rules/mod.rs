pub mod types;

pub use types::{CellTrigger, CellValue, RuleCatalog, RulesFile, SheetPolicy, TriggerGroup};

use crate::error::{Result, SheetSentryError};
use std::collections::HashMap;
use std::path::Path;

/// Rules used when no rules file is configured. Mirrors the production
/// sheet this tool was written for.
const DEFAULT_RULES: &str = include_str!("default_rules.json");

/// Per-row accessor over cell values, keyed by column id ("A", "H", ...).
/// Unknown columns yield an empty cell, never an error.
pub trait RowCells {
    fn cell(&self, column: &str) -> CellValue;
}

impl RowCells for HashMap<String, CellValue> {
    fn cell(&self, column: &str) -> CellValue {
        self.get(column).cloned().unwrap_or_default()
    }
}

impl CellTrigger {
    /// Pure and total: empty or missing cell data is "not triggered",
    /// never an error.
    pub fn is_triggered(&self, cell: &CellValue) -> bool {
        match self {
            CellTrigger::Text { pattern } => text_match(pattern, &cell.text),
            CellTrigger::StyledText {
                pattern,
                background,
            } => cell.fill.as_deref() == Some(background.as_str()) && text_match(pattern, &cell.text),
        }
    }
}

/// NB: the containment direction is pattern-contains-cell-text, not the
/// reverse. A pattern of "5-6" therefore also accepts a bare "5" or "6",
/// and the 5-6 grade group relies on exactly that. Do not flip it.
fn text_match(pattern: &str, text: &str) -> bool {
    !text.is_empty() && pattern.to_lowercase().contains(&text.to_lowercase())
}

impl TriggerGroup {
    /// Satisfied iff every column entry has at least one triggered trigger.
    pub fn is_satisfied(&self, row: &impl RowCells) -> bool {
        self.columns.iter().all(|(column, triggers)| {
            let cell = row.cell(column);
            triggers.iter().any(|t| t.is_triggered(&cell))
        })
    }
}

impl RuleCatalog {
    /// The full per-row decision: true iff any group is satisfied.
    pub fn matches(&self, row: &impl RowCells) -> bool {
        self.groups.iter().any(|g| g.is_satisfied(row))
    }

    /// Load a rules document from `path`, or the embedded defaults when no
    /// path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                if !path.exists() {
                    return Err(SheetSentryError::FileNotFound(path.display().to_string()));
                }
                let content = std::fs::read_to_string(path)?;
                Self::from_json(&content)
            }
            None => Self::from_json(DEFAULT_RULES),
        }
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let file: RulesFile = serde_json::from_str(content)
            .map_err(|e| SheetSentryError::InvalidRules(e.to_string()))?;
        file.resolve()
    }
}

impl RulesFile {
    /// Validate the document and resolve set references into an immutable
    /// catalog.
    pub fn resolve(self) -> Result<RuleCatalog> {
        validate_column(&self.sheet.label_column, "sheet.label_column")?;
        validate_column(&self.sheet.skip_column, "sheet.skip_column")?;
        if self.sheet.worksheet.is_empty() {
            return Err(invalid("sheet.worksheet must not be empty"));
        }

        for (name, triggers) in &self.triggers {
            if triggers.is_empty() {
                return Err(invalid(&format!("trigger set \"{}\" is empty", name)));
            }
        }
        if self.groups.is_empty() {
            return Err(invalid("at least one group is required"));
        }

        let mut groups = Vec::with_capacity(self.groups.len());
        for (index, group) in self.groups.iter().enumerate() {
            if group.is_empty() {
                return Err(invalid(&format!("group #{} has no columns", index + 1)));
            }

            let mut columns = std::collections::BTreeMap::new();
            for (column, set_name) in group {
                validate_column(column, &format!("group #{}", index + 1))?;
                let triggers = self.triggers.get(set_name).ok_or_else(|| {
                    invalid(&format!(
                        "group #{} column {} references unknown trigger set \"{}\"",
                        index + 1,
                        column,
                        set_name
                    ))
                })?;
                columns.insert(column.clone(), triggers.clone());
            }
            groups.push(TriggerGroup { columns });
        }

        Ok(RuleCatalog {
            policy: self.sheet,
            groups,
        })
    }
}

/// Column ids are 1-3 ASCII uppercase letters ("A".."XFD").
fn validate_column(column: &str, context: &str) -> Result<()> {
    let ok = !column.is_empty()
        && column.len() <= 3
        && column.bytes().all(|b| b.is_ascii_uppercase());
    if ok {
        Ok(())
    } else {
        Err(invalid(&format!(
            "{}: \"{}\" is not a column id",
            context, column
        )))
    }
}

fn invalid(message: &str) -> SheetSentryError {
    SheetSentryError::InvalidRules(message.to_string())
}
