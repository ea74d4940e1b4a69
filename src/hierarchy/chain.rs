//! Reporting-chain validation, run once at configuration load.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use super::AgentTier;
use crate::error::{KernelError, Result};

/// A single agent entry from configuration. Tier and parent are optional for
/// legacy configurations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentNode {
    pub id: String,
    #[serde(default)]
    pub tier: Option<AgentTier>,
    #[serde(default)]
    pub reports_to: Option<String>,
}

impl AgentNode {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            tier: None,
            reports_to: None,
        }
    }

    pub fn with_tier(mut self, tier: AgentTier) -> Self {
        self.tier = Some(tier);
        self
    }

    pub fn with_reports_to(mut self, parent: impl Into<String>) -> Self {
        self.reports_to = Some(parent.into());
        self
    }
}

/// Validates every agent's `reports_to` chain: no self-references, no
/// dangling parents, no cycles, and where both child and parent declare
/// tiers the parent must be a legal ancestor. Any violation is fatal to
/// configuration load.
pub fn validate_reporting_chains(agents: &[AgentNode]) -> Result<()> {
    let by_id: HashMap<&str, &AgentNode> =
        agents.iter().map(|a| (a.id.as_str(), a)).collect();

    for agent in agents {
        let Some(parent_id) = agent.reports_to.as_deref() else {
            continue;
        };

        if parent_id == agent.id {
            return Err(KernelError::ConfigIntegrity(format!(
                "Agent '{}' reports to itself",
                agent.id
            )));
        }

        let parent = by_id.get(parent_id).ok_or_else(|| {
            KernelError::ConfigIntegrity(format!(
                "Agent '{}' reports to unknown agent '{}'",
                agent.id, parent_id
            ))
        })?;

        if let (Some(child_tier), Some(parent_tier)) = (agent.tier, parent.tier) {
            if !child_tier.allowed_parents().contains(&parent_tier) {
                return Err(KernelError::ConfigIntegrity(format!(
                    "Agent '{}' ({}) cannot report to '{}' ({})",
                    agent.id, child_tier, parent.id, parent_tier
                )));
            }
        }

        // Walk to a root, failing on any revisit.
        let mut visited = HashSet::new();
        visited.insert(agent.id.as_str());
        let mut current = parent_id;
        loop {
            if !visited.insert(current) {
                return Err(KernelError::ConfigIntegrity(format!(
                    "Circular reporting chain involving '{}' and '{}'",
                    agent.id, current
                )));
            }
            let node = by_id.get(current).ok_or_else(|| {
                KernelError::ConfigIntegrity(format!(
                    "Reporting chain of '{}' references unknown agent '{}'",
                    agent.id, current
                ))
            })?;
            match node.reports_to.as_deref() {
                Some(next) => current = next,
                None => break,
            }
        }
    }

    Ok(())
}
