//! coach - workout plan storage, block plan transformation and client sync
//!
//! A planner writes plans through the [`tools`] façade, the workout client
//! pulls plans and pushes logs through the [`server`] sync API.

pub mod config;
pub mod db;
pub mod plan;
pub mod server;
pub mod tools;

pub use config::Config;
pub use db::Database;
pub use plan::{Plan, transform_block_plan};
pub use tools::Tools;
