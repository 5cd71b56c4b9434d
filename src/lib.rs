//! Prosperous Universe production expansion planner
//!
//! Given a snapshot of the game catalog, market and company state, the
//! planner works out how to reach a target daily production rate of one
//! material: what to build, on which planets, with what housing and permits,
//! and what it all costs.

pub mod allocation;
pub mod category;
pub mod config;
pub mod db;
pub mod error;
pub mod housing;
pub mod import;
pub mod logging;
pub mod market;
pub mod models;
pub mod planet;
pub mod planner;
pub mod production;
pub mod recipe_name;
pub mod resolver;
pub mod trace;

#[cfg(test)]
mod test_fixtures;

pub use config::PlannerConfig;
pub use error::{PlannerError, Result};
pub use housing::OptimizationGoal;
pub use models::{Recommendation, SimulationState};
pub use planner::Planner;
