use serde::Deserialize;
use std::collections::BTreeMap;

/// One spreadsheet cell as the trigger engine sees it: rendered text plus
/// the background fill as an opaque ARGB string (e.g. "FF00FF00").
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CellValue {
    pub text: String,
    pub fill: Option<String>,
}

impl CellValue {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            fill: None,
        }
    }

    pub fn styled(text: impl Into<String>, fill: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            fill: Some(fill.into()),
        }
    }
}

/// A predicate over a single cell.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CellTrigger {
    /// Text-only match.
    Text { pattern: String },
    /// Text match that additionally requires an exact background fill.
    StyledText { pattern: String, background: String },
}

/// Column id → alternative triggers. Every column entry must have at least
/// one triggered trigger for the group to be satisfied.
#[derive(Debug, Clone)]
pub struct TriggerGroup {
    pub columns: BTreeMap<String, Vec<CellTrigger>>,
}

/// Which worksheet to scan and which columns carry the row-level policy:
/// `skip_column` marks rows already taken by a worker, `label_column` is
/// the text printed when a row matches.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SheetPolicy {
    pub worksheet: String,
    pub label_column: String,
    pub skip_column: String,
}

/// The full immutable rule configuration: alternative trigger groups plus
/// the sheet policy. A row matches if any single group is satisfied.
#[derive(Debug, Clone)]
pub struct RuleCatalog {
    pub policy: SheetPolicy,
    pub groups: Vec<TriggerGroup>,
}

/// On-disk shape of a rules document: named trigger sets, and groups that
/// reference the sets per column. Resolved into a [`RuleCatalog`] after
/// validation.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RulesFile {
    pub sheet: SheetPolicy,
    pub triggers: BTreeMap<String, Vec<CellTrigger>>,
    pub groups: Vec<BTreeMap<String, String>>,
}
