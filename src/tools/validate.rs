//! Input validation for the tool façade

use std::collections::HashSet;

use chrono::NaiveDate;
use serde_json::Value;

use super::ToolError;
use crate::plan::ExerciseType;

const REQUIRED_PLAN_FIELDS: [&str; 2] = ["day_name", "exercises"];
const REQUIRED_EXERCISE_FIELDS: [&str; 3] = ["id", "name", "type"];

/// Parse a `YYYY-MM-DD` date.
pub fn parse_date(date: &str) -> Result<NaiveDate, ToolError> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| ToolError::InvalidArgument(format!("Invalid date format: {}. Use YYYY-MM-DD", date)))
}

pub fn require_object(plan: &Value) -> Result<(), ToolError> {
    if plan.is_object() {
        Ok(())
    } else {
        Err(ToolError::InvalidArgument("Plan must be a dictionary".to_string()))
    }
}

/// Check one flat-format exercise; `index` is its position for messages.
pub fn check_exercise(index: usize, exercise: &Value) -> Result<(), ToolError> {
    let invalid = |msg: String| Err(ToolError::InvalidArgument(msg));

    if !exercise.is_object() {
        return invalid(format!("Exercise {} must be an object", index));
    }
    for field in REQUIRED_EXERCISE_FIELDS {
        if exercise.get(field).is_none() {
            return invalid(format!("Exercise {} missing '{}' field", index, field));
        }
    }

    let kind = &exercise["type"];
    if kind.as_str().and_then(ExerciseType::parse).is_none() {
        let allowed: Vec<_> = ExerciseType::ALL.iter().map(|t| t.as_str()).collect();
        let shown = kind.as_str().map(str::to_string).unwrap_or_else(|| kind.to_string());
        return invalid(format!(
            "Exercise {} has invalid type: {}. Must be one of: {:?}",
            index, shown, allowed
        ));
    }
    Ok(())
}

/// Check a flat-format plan. Fields beyond the required ones are not
/// inspected; the plan is stored exactly as given.
pub fn validate_plan(plan: &Value) -> Result<(), ToolError> {
    require_object(plan)?;
    for field in REQUIRED_PLAN_FIELDS {
        if plan.get(field).is_none() {
            return Err(ToolError::InvalidArgument(format!("Plan missing required field: {}", field)));
        }
    }

    let exercises = plan["exercises"]
        .as_array()
        .ok_or_else(|| ToolError::InvalidArgument("Plan exercises must be a list".to_string()))?;
    let mut seen = HashSet::new();
    for (i, exercise) in exercises.iter().enumerate() {
        check_exercise(i, exercise)?;
        let id = exercise["id"].to_string();
        if !seen.insert(id) {
            let id = exercise["id"].as_str().map(str::to_string).unwrap_or_else(|| exercise["id"].to_string());
            return Err(ToolError::InvalidArgument(format!("Duplicate exercise id: {}", id)));
        }
    }

    Ok(())
}
