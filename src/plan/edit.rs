//! Partial plan updates
//!
//! Edits work on the stored JSON object, so planner-written fields of any
//! shape survive untouched. Every edit takes the plan by reference and
//! returns a new one. Exercise edits are applied to the flat `exercises`
//! list and to the owning block's list; an exercise appended without
//! `after_id` goes to the end of the last block.

use serde_json::{Map, Value};
use thiserror::Error;

use super::model::ExerciseType;

/// A stored plan: a JSON object with an `exercises` list
pub type PlanObject = Map<String, Value>;

const REQUIRED_EXERCISE_FIELDS: [&str; 3] = ["id", "name", "type"];

#[derive(Debug, Error)]
pub enum EditError {
    #[error("Duplicate exercise id: {0}")]
    DuplicateId(String),

    #[error("Exercise not found: {0}")]
    UnknownExercise(String),

    #[error("Exercise needs a string 'id'")]
    MissingId,

    #[error("Exercise id cannot be changed (tried {from} -> {to})")]
    IdChanged { from: String, to: String },

    #[error("Exercise {id} is invalid after update: {reason}")]
    InvalidExercise { id: String, reason: String },

    #[error("Plan exercises must be a list")]
    MalformedPlan,
}

/// Plan-level fields a planner may replace
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataUpdate {
    pub day_name: Option<String>,
    pub location: Option<String>,
    pub phase: Option<String>,
    pub total_duration_min: Option<u32>,
}

impl MetadataUpdate {
    pub fn is_empty(&self) -> bool {
        self == &MetadataUpdate::default()
    }
}

fn exercise_id(exercise: &Value) -> Option<&str> {
    exercise.get("id").and_then(Value::as_str)
}

fn position(list: &[Value], id: &str) -> Option<usize> {
    list.iter().position(|e| exercise_id(e) == Some(id))
}

fn flat(plan: &PlanObject) -> Result<&Vec<Value>, EditError> {
    plan.get("exercises").and_then(Value::as_array).ok_or(EditError::MalformedPlan)
}

fn flat_mut(plan: &mut PlanObject) -> Result<&mut Vec<Value>, EditError> {
    plan.get_mut("exercises")
        .and_then(Value::as_array_mut)
        .ok_or(EditError::MalformedPlan)
}

/// Per-block exercise lists, in block order
fn block_lists_mut(plan: &mut PlanObject) -> Vec<&mut Vec<Value>> {
    match plan.get_mut("blocks") {
        Some(Value::Array(blocks)) => blocks
            .iter_mut()
            .filter_map(|b| b.get_mut("exercises").and_then(Value::as_array_mut))
            .collect(),
        _ => Vec::new(),
    }
}

/// Insert `exercise` at the end, or right after `after_id`.
pub fn add_exercise(plan: &PlanObject, exercise: Value, after_id: Option<&str>) -> Result<PlanObject, EditError> {
    let id = exercise_id(&exercise).ok_or(EditError::MissingId)?.to_string();
    if position(flat(plan)?, &id).is_some() {
        return Err(EditError::DuplicateId(id));
    }

    let mut next = plan.clone();
    match after_id {
        None => {
            if let Some(last) = block_lists_mut(&mut next).pop() {
                last.push(exercise.clone());
            }
            flat_mut(&mut next)?.push(exercise);
        }
        Some(after) => {
            let pos = position(flat(&next)?, after).ok_or_else(|| EditError::UnknownExercise(after.to_string()))?;
            for list in block_lists_mut(&mut next) {
                if let Some(in_block) = position(list, after) {
                    list.insert(in_block + 1, exercise.clone());
                    break;
                }
            }
            flat_mut(&mut next)?.insert(pos + 1, exercise);
        }
    }
    Ok(next)
}

pub fn remove_exercise(plan: &PlanObject, id: &str) -> Result<PlanObject, EditError> {
    let pos = position(flat(plan)?, id).ok_or_else(|| EditError::UnknownExercise(id.to_string()))?;

    let mut next = plan.clone();
    flat_mut(&mut next)?.remove(pos);
    for list in block_lists_mut(&mut next) {
        list.retain(|e| exercise_id(e) != Some(id));
    }
    Ok(next)
}

/// Merge `fields` into the exercise `id`; a `null` field clears it.
pub fn update_exercise(plan: &PlanObject, id: &str, fields: &Map<String, Value>) -> Result<PlanObject, EditError> {
    let list = flat(plan)?;
    let current = position(list, id)
        .map(|pos| &list[pos])
        .ok_or_else(|| EditError::UnknownExercise(id.to_string()))?;

    if let Some(new_id) = fields.get("id") {
        if new_id.as_str() != Some(id) {
            return Err(EditError::IdChanged {
                from: id.to_string(),
                to: new_id
                    .as_str()
                    .map(str::to_string)
                    .unwrap_or_else(|| new_id.to_string()),
            });
        }
    }

    let invalid = |reason: String| EditError::InvalidExercise { id: id.to_string(), reason };
    let mut merged = current.as_object().cloned().unwrap_or_default();
    for (key, value) in fields {
        if value.is_null() {
            merged.remove(key);
        } else {
            merged.insert(key.clone(), value.clone());
        }
    }
    for field in REQUIRED_EXERCISE_FIELDS {
        if !merged.contains_key(field) {
            return Err(invalid(format!("missing '{}'", field)));
        }
    }
    let kind = &merged["type"];
    if kind.as_str().and_then(ExerciseType::parse).is_none() {
        return Err(invalid(format!("unknown type {}", kind)));
    }

    let updated = Value::Object(merged);
    let mut next = plan.clone();
    replace_in(flat_mut(&mut next)?, id, &updated);
    for list in block_lists_mut(&mut next) {
        replace_in(list, id, &updated);
    }
    Ok(next)
}

fn replace_in(list: &mut [Value], id: &str, updated: &Value) {
    for slot in list.iter_mut().filter(|e| exercise_id(e) == Some(id)) {
        *slot = updated.clone();
    }
}

pub fn update_metadata(plan: &PlanObject, update: &MetadataUpdate) -> PlanObject {
    let mut next = plan.clone();
    if let Some(day_name) = &update.day_name {
        next.insert("day_name".into(), Value::from(day_name.as_str()));
    }
    if let Some(location) = &update.location {
        next.insert("location".into(), Value::from(location.as_str()));
    }
    if let Some(phase) = &update.phase {
        next.insert("phase".into(), Value::from(phase.as_str()));
    }
    if let Some(minutes) = update.total_duration_min {
        next.insert("total_duration_min".into(), Value::from(minutes));
    }
    next
}
