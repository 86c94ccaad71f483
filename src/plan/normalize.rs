//! Exercise normalizer - one authored block to canonical exercises
//!
//! Pure and total: every block maps to zero or more exercises, missing
//! fields fall back to defaults, nothing here returns an error.

use std::sync::LazyLock;

use regex::Regex;

use super::block::{Block, BlockType, Reps, SubExercise};
use super::model::{Exercise, ExerciseType};

/// Reps written as a duration ("30 sec", "45 seconds", "20 SEC/side")
static SECONDS_UNIT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:^|[^a-z])sec(?:ond)?s?(?:[^a-z]|$)").expect("seconds pattern is valid")
});

/// Name fragments of exercises done without external load
const UNWEIGHTED_KEYWORDS: &[&str] = &[
    "push-up",
    "pushup",
    "push up",
    "band",
    "banded",
    "bodyweight",
    "jump",
    "plank",
    "dead hang",
    "wall sit",
    "glute bridge",
];

const WARMUP_FALLBACK_NAME: &str = "Warmup";
const CARDIO_FALLBACK_NAME: &str = "Zone 2 Cardio";
const INTERVAL_NAME: &str = "VO2 Max Intervals";

/// Convert one block (at `block_index` within its plan) into exercises
pub fn normalize_block(block: &Block, block_index: usize) -> Vec<Exercise> {
    match (&block.block_type, block.exercises.as_deref()) {
        (BlockType::Warmup, Some(items)) => vec![warmup_checklist(block, block_index, items)],
        (_, Some(items)) => items
            .iter()
            .enumerate()
            .map(|(i, item)| expand_item(block, block_index, i, item))
            .collect(),
        (_, None) if !block.instructions.is_empty() => {
            vec![instruction_exercise(block, block_index)]
        }
        _ => Vec::new(),
    }
}

/// Whole warmup collapses into a single checklist
fn warmup_checklist(block: &Block, block_index: usize, items: &[SubExercise]) -> Exercise {
    let name = match block.title() {
        "" => WARMUP_FALLBACK_NAME,
        title => title,
    };
    let mut exercise = Exercise::new(
        format!("{}_{}", block.block_type.as_str(), block_index),
        name,
        ExerciseType::Checklist,
    );
    exercise.items = Some(items.iter().map(checklist_item).collect());
    exercise
}

fn checklist_item(item: &SubExercise) -> String {
    match &item.reps {
        Some(Reps::Count(n)) => format!("{} x{}", item.name(), n),
        Some(Reps::Text(text)) => format!("{} {}", item.name(), text),
        Some(Reps::Decimal(_)) | None => item.name().to_string(),
    }
}

fn expand_item(block: &Block, block_index: usize, i: usize, item: &SubExercise) -> Exercise {
    let mut exercise = Exercise::new(
        format!("{}_{}_{}", block.block_type.as_str(), block_index, i + 1),
        item.name(),
        exercise_type_for(&block.block_type),
    );
    exercise.target_sets = item.sets.or(item.rounds).or(block.rounds);
    exercise.target_reps = item.reps.as_ref().map(Reps::to_string);
    exercise.show_time = item.reps.as_ref().is_some_and(shows_time);
    exercise.hide_weight = hides_weight(item);
    exercise.guidance_note = guidance_note(block, item);
    exercise
}

fn exercise_type_for(block_type: &BlockType) -> ExerciseType {
    match block_type {
        BlockType::Circuit | BlockType::Power => ExerciseType::Circuit,
        BlockType::Strength | BlockType::Accessory => ExerciseType::Strength,
        // unrecognised or odd block types are tracked as plain strength work
        BlockType::Warmup | BlockType::Cardio | BlockType::Other(_) | BlockType::Missing => {
            ExerciseType::Strength
        }
    }
}

/// Whether the client should show a timer instead of a rep counter
pub fn shows_time(reps: &Reps) -> bool {
    match reps {
        Reps::Text(text) => SECONDS_UNIT.is_match(text),
        Reps::Count(_) | Reps::Decimal(_) => false,
    }
}

/// Equipment, when given, decides; otherwise guess from the name.
fn hides_weight(item: &SubExercise) -> bool {
    match &item.equipment {
        Some(equipment) => equipment.is_unweighted(),
        None => is_bodyweight_or_band(item.name()),
    }
}

/// Name-based guess for bodyweight and band exercises
pub fn is_bodyweight_or_band(name: &str) -> bool {
    let name = name.to_lowercase();
    UNWEIGHTED_KEYWORDS.iter().any(|kw| name.contains(kw))
}

fn guidance_note(block: &Block, item: &SubExercise) -> Option<String> {
    let mut parts = Vec::new();
    if let Some(tempo) = &item.tempo {
        parts.push(format!("Tempo {}", tempo));
    }
    if let Some(load_guide) = &item.load_guide {
        parts.push(load_guide.clone());
    }
    if let Some(notes) = &item.notes {
        parts.push(notes.clone());
    }
    // circuit and power rest is per round, not per exercise
    if block.block_type == BlockType::Strength && !block.rest_guidance().is_empty() {
        parts.push(block.rest_guidance().to_string());
    }

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(". "))
    }
}

/// Cardio-style block described only by instructions
fn instruction_exercise(block: &Block, block_index: usize) -> Exercise {
    let joined = block.instructions.join(" ");
    // case-sensitive, unlike the seconds check on reps
    let (kind, name) = if joined.contains("VO2") || joined.contains("HARD") {
        (ExerciseType::Interval, INTERVAL_NAME)
    } else {
        let name = match block.title() {
            "" => CARDIO_FALLBACK_NAME,
            title => title,
        };
        (ExerciseType::Duration, name)
    };

    let mut exercise = Exercise::new(
        format!("{}_{}_1", block.block_type.as_str(), block_index),
        name,
        kind,
    );
    exercise.target_duration_min = Some(block.duration_min());
    exercise.guidance_note = Some(block.instructions.join(" | "));
    exercise
}
