//! Canonical plan model - what clients and the planner read

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// Display type of a trackable exercise
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseType {
    Strength,
    Circuit,
    Duration,
    Interval,
    Checklist,
    WeightedTime,
}

impl ExerciseType {
    pub const ALL: [ExerciseType; 6] = [
        ExerciseType::Strength,
        ExerciseType::Duration,
        ExerciseType::Checklist,
        ExerciseType::WeightedTime,
        ExerciseType::Interval,
        ExerciseType::Circuit,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExerciseType::Strength => "strength",
            ExerciseType::Circuit => "circuit",
            ExerciseType::Duration => "duration",
            ExerciseType::Interval => "interval",
            ExerciseType::Checklist => "checklist",
            ExerciseType::WeightedTime => "weighted_time",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == raw)
    }
}

impl std::fmt::Display for ExerciseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn is_false(b: &bool) -> bool {
    !*b
}

/// One flat, trackable unit of a plan
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Exercise {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ExerciseType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_sets: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_reps: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_duration_min: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guidance_note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub hide_weight: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub show_time: bool,
    /// Planner-supplied keys this model does not know about
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Exercise {
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: ExerciseType) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            target_sets: None,
            target_reps: None,
            target_duration_min: None,
            guidance_note: None,
            items: None,
            hide_weight: false,
            show_time: false,
            extra: Map::new(),
        }
    }
}

/// Per-block view of a transformed plan
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlanBlock {
    pub block_index: usize,
    pub block_type: String,
    pub title: String,
    pub duration_min: Number,
    pub rest_guidance: String,
    pub exercises: Vec<Exercise>,
}

/// Full per-date workout in canonical form
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Plan {
    pub day_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_duration_min: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub blocks: Vec<PlanBlock>,
    pub exercises: Vec<Exercise>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_optional_flags_omitted_when_false() {
        let ex = Exercise::new("strength_1_1", "Squat", ExerciseType::Strength);
        let value = serde_json::to_value(&ex).unwrap();
        assert_eq!(value, json!({"id": "strength_1_1", "name": "Squat", "type": "strength"}));
    }

    #[test]
    fn test_unknown_keys_survive_round_trip() {
        let raw = json!({
            "day_name": "Conditioning",
            "exercises": [{
                "id": "hiit_1", "name": "Bike Intervals", "type": "interval",
                "rounds": 4, "work_duration_sec": 30
            }],
            "notes": "deload week"
        });
        let plan: Plan = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(plan.exercises[0].kind, ExerciseType::Interval);
        assert_eq!(plan.exercises[0].extra["rounds"], json!(4));
        assert_eq!(serde_json::to_value(&plan).unwrap(), raw);
    }

    #[test]
    fn test_exercise_type_parse() {
        assert_eq!(ExerciseType::parse("weighted_time"), Some(ExerciseType::WeightedTime));
        assert_eq!(ExerciseType::parse("yoga"), None);
    }
}
