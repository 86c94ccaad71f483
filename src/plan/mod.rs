//! Plan module - block plan normalization and the canonical plan model
//!
//! - [`block`]: lenient block-format input
//! - [`normalize`]: one block to canonical exercises
//! - [`transform`]: whole block plan to canonical [`Plan`]
//! - [`edit`]: pure partial updates of a stored plan

pub mod block;
pub mod edit;
pub mod model;
pub mod normalize;
pub mod transform;

pub use block::BlockPlan;
pub use edit::{EditError, MetadataUpdate, PlanObject};
pub use model::{Exercise, ExerciseType, Plan, PlanBlock};
pub use transform::{transform_block_plan, transform_value};
