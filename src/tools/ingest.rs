//! Bulk import of block-format plans keyed by date

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde_json::Value;

use super::{SavedPlan, ToolError, Tools};
use crate::plan::transform_value;

/// Read a `{date: block_plan}` file; dates come back sorted.
pub fn read_plan_file(path: &Path) -> Result<BTreeMap<String, Value>> {
    let text = std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("{} is not a JSON object of dated plans", path.display()))
}

/// Transform and store every plan in date order. One bad date does not stop
/// the rest.
pub fn ingest_block_plans(tools: &Tools, plans: &BTreeMap<String, Value>) -> Vec<(String, Result<SavedPlan, ToolError>)> {
    plans
        .iter()
        .map(|(date, block_plan)| {
            let saved = serde_json::to_value(transform_value(block_plan))
                .map_err(|e| ToolError::Storage(e.into()))
                .and_then(|plan| tools.set_workout_plan(date, &plan));
            (date.clone(), saved)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use serde_json::json;

    #[test]
    fn test_ingest_sorted_and_isolated_failures() {
        let tools = Tools::new(Database::open_in_memory().unwrap(), 100);
        let plans: BTreeMap<String, Value> = serde_json::from_value(json!({
            "2026-02-04": {"theme": "Upper", "blocks": []},
            "not-a-date": {"theme": "Broken"},
            "2026-02-02": {"theme": "Lower", "blocks": [
                {"block_type": "strength", "exercises": [{"name": "Squat", "sets": 3, "reps": 5}]}
            ]}
        }))
        .unwrap();

        let results = ingest_block_plans(&tools, &plans);
        let dates: Vec<_> = results.iter().map(|(d, _)| d.as_str()).collect();
        assert_eq!(dates, ["2026-02-02", "2026-02-04", "not-a-date"]);
        assert!(results[0].1.is_ok());
        assert!(results[1].1.is_ok());
        assert!(results[2].1.is_err());

        let stored = tools.get_workout_plan("2026-02-01", "2026-02-28").unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].plan["exercises"][0]["name"], "Squat");
    }

    #[test]
    fn test_read_plan_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, br#"{"2026-02-02": {"theme": "Legs"}}"#).unwrap();
        let plans = read_plan_file(file.path()).unwrap();
        assert_eq!(plans["2026-02-02"]["theme"], "Legs");

        std::io::Write::write_all(&mut file, b"garbage").unwrap();
        assert!(read_plan_file(file.path()).is_err());
    }
}
