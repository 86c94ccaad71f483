//! Tool façade - the planning agent's view of plans and logs
//!
//! Every tool validates its arguments, talks to the [`Database`] and returns
//! JSON. Plans are writable, logs are read-only here (they come from the
//! sync API).

pub mod guide;
pub mod ingest;
pub mod stdio;
pub mod validate;

use std::collections::BTreeMap;

use chrono::{Duration, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, info};

use crate::config::Config;
use crate::db::{Database, Record, Table};
use crate::plan::edit::{self, EditError, MetadataUpdate, PlanObject};
use crate::plan::transform_value;
use validate::{check_exercise, parse_date, require_object, validate_plan};

/// Writer tag stored with plans saved through the tools
pub const MODIFIED_BY: &str = "mcp";
pub const MAX_SUMMARY_DAYS: u32 = 365;
const RECENT_PLANS_IN_SUMMARY: usize = 7;
const DEFAULT_SCHEDULE_WEEKS: i64 = 6;

/// Tool name and one-line description
pub const TOOLS: &[(&str, &str)] = &[
    ("get_workout_plan", "Workout plans scheduled between start_date and end_date (YYYY-MM-DD)"),
    ("get_workout_logs", "Completed workout logs between start_date and end_date (read-only)"),
    ("set_workout_plan", "Create or replace the plan for a date from the flat exercise format"),
    ("set_block_plan", "Create or replace the plan for a date from the block format"),
    ("add_exercise", "Add one exercise to a date's plan, optionally after another exercise"),
    ("remove_exercise", "Remove one exercise from a date's plan"),
    ("update_exercise", "Change fields of one exercise in a date's plan (null clears a field)"),
    ("update_plan_metadata", "Change day_name, location, phase or total_duration_min of a plan"),
    ("get_workout_summary", "Planned vs completed workouts over the last N days (max 365)"),
    ("list_scheduled_dates", "Dates with a plan (defaults: today through six weeks ahead)"),
];

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("{0}")]
    InvalidArgument(String),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("No workout plan found for {0}")]
    PlanNotFound(String),

    #[error("Stored plan for {date} cannot be edited: {reason}")]
    CorruptPlan { date: String, reason: String },

    #[error(transparent)]
    Edit(#[from] EditError),

    #[error("Database error: {0:#}")]
    Storage(#[from] anyhow::Error),
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct DatedPlan {
    pub date: String,
    pub last_modified: String,
    pub plan: Value,
}

#[derive(Debug, Serialize)]
pub struct DatedLog {
    pub date: String,
    pub last_modified: String,
    pub log: Value,
}

#[derive(Debug, Serialize)]
pub struct SavedPlan {
    pub success: bool,
    pub date: String,
    pub last_modified: String,
    pub plan: Value,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct WorkoutSummary {
    pub analysis_period_days: u32,
    pub planned_workouts: i64,
    pub completed_workouts: i64,
    pub completion_rate_percent: f64,
    pub exercise_types_in_recent_plans: BTreeMap<String, usize>,
    pub recent_plan_dates: Vec<String>,
}

// ---------------------------------------------------------------------------
// Arguments
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct DateRangeArgs {
    start_date: String,
    end_date: String,
}

#[derive(Debug, Deserialize)]
struct SetPlanArgs {
    date: String,
    plan: Value,
}

#[derive(Debug, Deserialize)]
struct AddExerciseArgs {
    date: String,
    exercise: Value,
    #[serde(default)]
    after_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RemoveExerciseArgs {
    date: String,
    exercise_id: String,
}

#[derive(Debug, Deserialize)]
struct UpdateExerciseArgs {
    date: String,
    exercise_id: String,
    fields: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct UpdateMetadataArgs {
    date: String,
    day_name: Option<String>,
    location: Option<String>,
    phase: Option<String>,
    total_duration_min: Option<u32>,
}

fn default_days() -> u32 {
    30
}

#[derive(Debug, Deserialize)]
struct SummaryArgs {
    #[serde(default = "default_days")]
    days: u32,
}

#[derive(Debug, Default, Deserialize)]
struct ScheduleArgs {
    start_date: Option<String>,
    end_date: Option<String>,
}

fn parse_args<T: DeserializeOwned>(tool: &str, args: Value) -> Result<T, ToolError> {
    let args = if args.is_null() { Value::Object(Map::new()) } else { args };
    serde_json::from_value(args)
        .map_err(|e| ToolError::InvalidArgument(format!("Invalid arguments for {}: {}", tool, e)))
}

fn to_json<T: Serialize>(value: T) -> Result<Value, ToolError> {
    serde_json::to_value(value).map_err(|e| ToolError::Storage(e.into()))
}

// ---------------------------------------------------------------------------
// Tools
// ---------------------------------------------------------------------------

pub struct Tools {
    db: Database,
    max_rows: usize,
}

impl Tools {
    pub fn new(db: Database, max_rows: usize) -> Self {
        Self { db, max_rows }
    }

    /// Open the configured database; it must already exist.
    pub fn open(config: &Config) -> anyhow::Result<Self> {
        config.validate()?;
        let db = Database::open(&config.db_path_str())?;
        Ok(Self::new(db, config.max_rows))
    }

    /// Dispatch a tool call by name
    pub fn call(&self, name: &str, args: Value) -> Result<Value, ToolError> {
        debug!(tool = name, "tool call");
        match name {
            "get_workout_plan" => {
                let a: DateRangeArgs = parse_args(name, args)?;
                to_json(self.get_workout_plan(&a.start_date, &a.end_date)?)
            }
            "get_workout_logs" => {
                let a: DateRangeArgs = parse_args(name, args)?;
                to_json(self.get_workout_logs(&a.start_date, &a.end_date)?)
            }
            "set_workout_plan" => {
                let a: SetPlanArgs = parse_args(name, args)?;
                to_json(self.set_workout_plan(&a.date, &a.plan)?)
            }
            "set_block_plan" => {
                let a: SetPlanArgs = parse_args(name, args)?;
                to_json(self.set_block_plan(&a.date, &a.plan)?)
            }
            "add_exercise" => {
                let a: AddExerciseArgs = parse_args(name, args)?;
                to_json(self.add_exercise(&a.date, &a.exercise, a.after_id.as_deref())?)
            }
            "remove_exercise" => {
                let a: RemoveExerciseArgs = parse_args(name, args)?;
                to_json(self.remove_exercise(&a.date, &a.exercise_id)?)
            }
            "update_exercise" => {
                let a: UpdateExerciseArgs = parse_args(name, args)?;
                to_json(self.update_exercise(&a.date, &a.exercise_id, &a.fields)?)
            }
            "update_plan_metadata" => {
                let a: UpdateMetadataArgs = parse_args(name, args)?;
                let update = MetadataUpdate {
                    day_name: a.day_name,
                    location: a.location,
                    phase: a.phase,
                    total_duration_min: a.total_duration_min,
                };
                to_json(self.update_plan_metadata(&a.date, &update)?)
            }
            "get_workout_summary" => {
                let a: SummaryArgs = parse_args(name, args)?;
                to_json(self.get_workout_summary(a.days)?)
            }
            "list_scheduled_dates" => {
                let a: ScheduleArgs = parse_args(name, args)?;
                to_json(self.list_scheduled_dates(a.start_date.as_deref(), a.end_date.as_deref())?)
            }
            other => Err(ToolError::UnknownTool(other.to_string())),
        }
    }

    pub fn get_workout_plan(&self, start_date: &str, end_date: &str) -> Result<Vec<DatedPlan>, ToolError> {
        parse_date(start_date)?;
        parse_date(end_date)?;
        let rows = self.db.between(Table::Plans, start_date, end_date, self.max_rows)?;
        Ok(rows
            .into_iter()
            .map(|r| DatedPlan { date: r.date, last_modified: r.last_modified, plan: r.payload })
            .collect())
    }

    pub fn get_workout_logs(&self, start_date: &str, end_date: &str) -> Result<Vec<DatedLog>, ToolError> {
        parse_date(start_date)?;
        parse_date(end_date)?;
        let rows = self.db.between(Table::Logs, start_date, end_date, self.max_rows)?;
        Ok(rows
            .into_iter()
            .map(|r| DatedLog { date: r.date, last_modified: r.last_modified, log: r.payload })
            .collect())
    }

    /// Store a flat-format plan, exactly as given, after validating it
    pub fn set_workout_plan(&self, date: &str, plan: &Value) -> Result<SavedPlan, ToolError> {
        parse_date(date)?;
        validate_plan(plan)?;
        let message = format!("Workout plan for {} saved successfully", date);
        self.save(date, plan.clone(), message)
    }

    /// Transform a block-format plan and store the result
    pub fn set_block_plan(&self, date: &str, block_plan: &Value) -> Result<SavedPlan, ToolError> {
        parse_date(date)?;
        require_object(block_plan)?;
        let plan = transform_value(block_plan);
        let message = format!(
            "Workout plan for {} saved successfully ({} exercises from {} blocks)",
            date,
            plan.exercises.len(),
            plan.blocks.len()
        );
        self.save(date, to_json(&plan)?, message)
    }

    pub fn add_exercise(&self, date: &str, exercise: &Value, after_id: Option<&str>) -> Result<SavedPlan, ToolError> {
        parse_date(date)?;
        check_exercise(0, exercise)?;
        let plan = edit::add_exercise(&self.load_plan(date)?, exercise.clone(), after_id)?;
        let id = exercise.get("id").and_then(Value::as_str).unwrap_or_default();
        self.save(date, Value::Object(plan), format!("Exercise {} added to plan for {}", id, date))
    }

    pub fn remove_exercise(&self, date: &str, exercise_id: &str) -> Result<SavedPlan, ToolError> {
        parse_date(date)?;
        let plan = edit::remove_exercise(&self.load_plan(date)?, exercise_id)?;
        self.save(date, Value::Object(plan), format!("Exercise {} removed from plan for {}", exercise_id, date))
    }

    pub fn update_exercise(&self, date: &str, exercise_id: &str, fields: &Map<String, Value>) -> Result<SavedPlan, ToolError> {
        parse_date(date)?;
        if fields.is_empty() {
            return Err(ToolError::InvalidArgument("No fields to update".to_string()));
        }
        let plan = edit::update_exercise(&self.load_plan(date)?, exercise_id, fields)?;
        self.save(date, Value::Object(plan), format!("Exercise {} updated in plan for {}", exercise_id, date))
    }

    pub fn update_plan_metadata(&self, date: &str, update: &MetadataUpdate) -> Result<SavedPlan, ToolError> {
        parse_date(date)?;
        if update.is_empty() {
            return Err(ToolError::InvalidArgument("No plan fields to update".to_string()));
        }
        let plan = edit::update_metadata(&self.load_plan(date)?, update);
        self.save(date, Value::Object(plan), format!("Plan metadata for {} updated", date))
    }

    pub fn get_workout_summary(&self, days: u32) -> Result<WorkoutSummary, ToolError> {
        self.summary_as_of(days, Local::now().date_naive())
    }

    /// Summary of the `days` days ending on `today`
    pub fn summary_as_of(&self, days: u32, today: NaiveDate) -> Result<WorkoutSummary, ToolError> {
        if days > MAX_SUMMARY_DAYS {
            return Err(ToolError::InvalidArgument(format!("Days cannot exceed {}", MAX_SUMMARY_DAYS)));
        }
        let start = (today - Duration::days(days.into())).to_string();
        let end = today.to_string();

        let planned = self.db.count_between(Table::Plans, &start, &end)?;
        let completed = self.db.count_between(Table::Logs, &start, &end)?;
        let recent = self.db.recent_between(Table::Plans, &start, &end, RECENT_PLANS_IN_SUMMARY)?;

        let completion_rate_percent = if planned > 0 {
            (completed as f64 / planned as f64 * 1000.0).round() / 10.0
        } else {
            0.0
        };

        Ok(WorkoutSummary {
            analysis_period_days: days,
            planned_workouts: planned,
            completed_workouts: completed,
            completion_rate_percent,
            exercise_types_in_recent_plans: count_exercise_types(&recent),
            recent_plan_dates: recent.into_iter().map(|r| r.date).collect(),
        })
    }

    pub fn list_scheduled_dates(&self, start_date: Option<&str>, end_date: Option<&str>) -> Result<Vec<String>, ToolError> {
        self.scheduled_dates_as_of(start_date, end_date, Local::now().date_naive())
    }

    pub fn scheduled_dates_as_of(
        &self,
        start_date: Option<&str>,
        end_date: Option<&str>,
        today: NaiveDate,
    ) -> Result<Vec<String>, ToolError> {
        let start = match start_date {
            Some(date) => parse_date(date)?,
            None => today,
        };
        let end = match end_date {
            Some(date) => parse_date(date)?,
            None => today + Duration::weeks(DEFAULT_SCHEDULE_WEEKS),
        };
        Ok(self.db.dates_between(Table::Plans, &start.to_string(), &end.to_string())?)
    }

    /// Load the stored plan for `date` for editing
    fn load_plan(&self, date: &str) -> Result<PlanObject, ToolError> {
        let record = self
            .db
            .get(Table::Plans, date)?
            .ok_or_else(|| ToolError::PlanNotFound(date.to_string()))?;
        let corrupt = |reason: &str| ToolError::CorruptPlan {
            date: date.to_string(),
            reason: reason.to_string(),
        };
        match record.payload {
            Value::Object(plan) if plan.get("exercises").is_some_and(Value::is_array) => Ok(plan),
            Value::Object(_) => Err(corrupt("exercises is not a list")),
            _ => Err(corrupt("plan is not an object")),
        }
    }

    fn save(&self, date: &str, payload: Value, message: String) -> Result<SavedPlan, ToolError> {
        let last_modified = self.db.put(Table::Plans, date, &payload, MODIFIED_BY)?;
        let exercises = payload.get("exercises").and_then(Value::as_array).map_or(0, Vec::len);
        info!(date, exercises, "plan saved");
        Ok(SavedPlan {
            success: true,
            date: date.to_string(),
            last_modified,
            plan: payload,
            message,
        })
    }
}

/// Exercise type histogram over stored plans, read straight from the JSON
fn count_exercise_types(plans: &[Record]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for record in plans {
        let exercises = record.payload.get("exercises").and_then(Value::as_array);
        for exercise in exercises.into_iter().flatten() {
            let kind = exercise.get("type").and_then(Value::as_str).unwrap_or("unknown");
            *counts.entry(kind.to_string()).or_insert(0) += 1;
        }
    }
    counts
}
