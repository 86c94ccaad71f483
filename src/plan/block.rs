//! Block-format plan input
//!
//! Coach-authored plans arrive as loosely structured JSON. Every field is
//! parsed leniently here, once, so the normalizer only ever sees typed,
//! defaulted values: a malformed field becomes "absent" instead of failing
//! the whole plan.

use serde::{Deserialize, Deserializer};
use serde_json::{Number, Value};

/// Set count used when `sets` is given but is not a number (e.g. "3-4").
pub const DEFAULT_SETS: u32 = 3;

/// Kind of workout segment
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum BlockType {
    Warmup,
    Strength,
    Accessory,
    Circuit,
    Power,
    Cardio,
    /// Anything else, kept verbatim for exercise ids
    Other(String),
    #[default]
    Missing,
}

impl BlockType {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "warmup" => BlockType::Warmup,
            "strength" => BlockType::Strength,
            "accessory" => BlockType::Accessory,
            "circuit" => BlockType::Circuit,
            "power" => BlockType::Power,
            "cardio" => BlockType::Cardio,
            "" => BlockType::Missing,
            other => BlockType::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            BlockType::Warmup => "warmup",
            BlockType::Strength => "strength",
            BlockType::Accessory => "accessory",
            BlockType::Circuit => "circuit",
            BlockType::Power => "power",
            BlockType::Cardio => "cardio",
            BlockType::Other(raw) => raw,
            BlockType::Missing => "",
        }
    }
}

/// Equipment hint on a sub-exercise
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Equipment {
    Bodyweight,
    Band,
    Kettlebell,
    Dumbbell,
    Barbell,
    Machine,
    Other(String),
}

impl Equipment {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "bodyweight" => Equipment::Bodyweight,
            "band" => Equipment::Band,
            "kettlebell" => Equipment::Kettlebell,
            "dumbbell" => Equipment::Dumbbell,
            "barbell" => Equipment::Barbell,
            "machine" => Equipment::Machine,
            other => Equipment::Other(other.to_string()),
        }
    }

    /// Whether logging a weight makes no sense for this equipment
    pub fn is_unweighted(&self) -> bool {
        matches!(self, Equipment::Bodyweight | Equipment::Band)
    }
}

/// Prescribed repetitions: a count or a free-form description ("30 sec/side")
#[derive(Debug, Clone, PartialEq)]
pub enum Reps {
    Count(i64),
    Text(String),
    /// Non-integer number, kept as written ("2.5")
    Decimal(String),
}

impl std::fmt::Display for Reps {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Reps::Count(n) => write!(f, "{}", n),
            Reps::Text(s) | Reps::Decimal(s) => f.write_str(s),
        }
    }
}

/// Whole plan in block format
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BlockPlan {
    #[serde(default, deserialize_with = "lenient_text")]
    pub phase: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub theme: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub total_duration_min: Option<u32>,
    #[serde(default, deserialize_with = "lenient_blocks")]
    pub blocks: Vec<Block>,
}

impl BlockPlan {
    /// Parse any JSON value; non-objects yield an empty plan.
    pub fn from_value(value: &Value) -> Self {
        Self::deserialize(value).unwrap_or_default()
    }
}

/// One authored workout segment
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Block {
    #[serde(default, deserialize_with = "lenient_block_type")]
    pub block_type: BlockType,
    #[serde(default, deserialize_with = "lenient_text")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub rest_guidance: Option<String>,
    #[serde(default, deserialize_with = "lenient_minutes")]
    pub duration_min: Option<Number>,
    #[serde(default, deserialize_with = "lenient_rounds")]
    pub rounds: Option<u32>,
    /// `Some` whenever the block carries an `exercises` list, even an empty one
    #[serde(default, deserialize_with = "lenient_sub_exercises")]
    pub exercises: Option<Vec<SubExercise>>,
    #[serde(default, deserialize_with = "lenient_instructions")]
    pub instructions: Vec<String>,
}

impl Block {
    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or_default()
    }

    pub fn rest_guidance(&self) -> &str {
        self.rest_guidance.as_deref().unwrap_or_default()
    }

    /// Block length as written, `0` when absent
    pub fn duration_min(&self) -> Number {
        self.duration_min.clone().unwrap_or_else(|| Number::from(0))
    }
}

/// Exercise entry nested in a block
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubExercise {
    #[serde(default, deserialize_with = "lenient_text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_sets")]
    pub sets: Option<u32>,
    #[serde(default, deserialize_with = "lenient_reps")]
    pub reps: Option<Reps>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub tempo: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub load_guide: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub notes: Option<String>,
    #[serde(default, deserialize_with = "lenient_equipment")]
    pub equipment: Option<Equipment>,
    #[serde(default, deserialize_with = "lenient_rounds")]
    pub rounds: Option<u32>,
}

impl SubExercise {
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or("Unknown")
    }
}

// Lenient field parsers. Each one accepts any JSON value and maps whatever
// does not fit to `None` (or empty), never to an error.

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

fn text_of(value: Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn lenient_text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(text_of(Value::deserialize(d)?))
}

fn lenient_count<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u32>, D::Error> {
    let value = Value::deserialize(d)?;
    Ok(match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
            .and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

/// Any number is kept as written, fractional or negative included.
fn lenient_minutes<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Number>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::Number(n) => Some(n),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

/// Integer sets are taken as-is; any other truthy value means the default.
fn lenient_sets<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u32>, D::Error> {
    let value = Value::deserialize(d)?;
    if !is_truthy(&value) {
        return Ok(None);
    }
    let exact = value.as_u64().and_then(|n| u32::try_from(n).ok());
    Ok(Some(exact.unwrap_or(DEFAULT_SETS)))
}

/// Accepts `4` or a string starting with a number (`"4 rounds"`).
fn lenient_rounds<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u32>, D::Error> {
    let value = Value::deserialize(d)?;
    let rounds = match value {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => {
            let digits: String = s.trim().chars().take_while(|c| c.is_ascii_digit()).collect();
            digits.parse().ok()
        }
        _ => None,
    };
    Ok(rounds.filter(|r| *r > 0))
}

fn lenient_reps<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Reps>, D::Error> {
    let value = Value::deserialize(d)?;
    Ok(match value {
        Value::Number(n) => match n.as_i64() {
            Some(0) => None,
            Some(count) => Some(Reps::Count(count)),
            None => n
                .as_f64()
                .filter(|f| *f != 0.0)
                .map(|_| Reps::Decimal(n.to_string())),
        },
        Value::String(s) if !s.is_empty() => Some(Reps::Text(s)),
        _ => None,
    })
}

fn lenient_block_type<'de, D: Deserializer<'de>>(d: D) -> Result<BlockType, D::Error> {
    Ok(text_of(Value::deserialize(d)?)
        .map(|raw| BlockType::parse(&raw))
        .unwrap_or_default())
}

fn lenient_equipment<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Equipment>, D::Error> {
    Ok(text_of(Value::deserialize(d)?)
        .filter(|raw| !raw.trim().is_empty())
        .map(|raw| Equipment::parse(&raw)))
}

fn lenient_instructions<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    })
}

fn lenient_sub_exercises<'de, D: Deserializer<'de>>(
    d: D,
) -> Result<Option<Vec<SubExercise>>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::Array(items) => Some(
            items
                .iter()
                .map(|item| SubExercise::deserialize(item).unwrap_or_default())
                .collect(),
        ),
        _ => None,
    })
}

fn lenient_blocks<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<Block>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::Array(items) => items
            .iter()
            .map(|item| Block::deserialize(item).unwrap_or_default())
            .collect(),
        _ => Vec::new(),
    })
}
