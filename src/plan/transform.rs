//! Plan transformer - block-format plan to canonical plan

use serde_json::{Map, Value};

use super::block::BlockPlan;
use super::model::{Plan, PlanBlock};
use super::normalize::normalize_block;

pub const DEFAULT_DAY_NAME: &str = "Workout";
pub const DEFAULT_LOCATION: &str = "Home";
pub const DEFAULT_PHASE: &str = "Foundation";
pub const DEFAULT_TOTAL_DURATION_MIN: u32 = 60;

/// Build the canonical plan from a parsed block plan.
///
/// Each block's exercises appear twice: in its [`PlanBlock`] and, in the
/// same order, in the flat `exercises` list. The two are independent copies.
pub fn transform_block_plan(input: &BlockPlan) -> Plan {
    let mut blocks = Vec::with_capacity(input.blocks.len());
    let mut exercises = Vec::new();

    for (block_index, block) in input.blocks.iter().enumerate() {
        let block_exercises = normalize_block(block, block_index);
        exercises.extend(block_exercises.iter().cloned());
        blocks.push(PlanBlock {
            block_index,
            block_type: block.block_type.as_str().to_string(),
            title: block.title().to_string(),
            duration_min: block.duration_min(),
            rest_guidance: block.rest_guidance().to_string(),
            exercises: block_exercises,
        });
    }

    Plan {
        day_name: input.theme.clone().unwrap_or_else(|| DEFAULT_DAY_NAME.to_string()),
        location: Some(input.location.clone().unwrap_or_else(|| DEFAULT_LOCATION.to_string())),
        phase: Some(input.phase.clone().unwrap_or_else(|| DEFAULT_PHASE.to_string())),
        total_duration_min: Some(
            input
                .total_duration_min
                .filter(|m| *m > 0)
                .unwrap_or(DEFAULT_TOTAL_DURATION_MIN),
        ),
        blocks,
        exercises,
        extra: Map::new(),
    }
}

/// Transform raw block-format JSON; never fails.
pub fn transform_value(raw: &Value) -> Plan {
    transform_block_plan(&BlockPlan::from_value(raw))
}
