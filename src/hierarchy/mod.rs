//! Agent hierarchy: tier ranks, spawn permissions, and reporting-chain
//! validation.

mod chain;
mod tier;

pub use chain::{validate_reporting_chains, AgentNode};
pub use tier::{can_spawn, AgentTier};
