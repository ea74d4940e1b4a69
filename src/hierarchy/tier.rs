use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Rank in the agent hierarchy, ordered from root to leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AgentTier {
    GeneralManager,
    Operations,
    Manager,
    TeamLead,
    Teammate,
}

impl AgentTier {
    pub const ALL: [AgentTier; 5] = [
        AgentTier::GeneralManager,
        AgentTier::Operations,
        AgentTier::Manager,
        AgentTier::TeamLead,
        AgentTier::Teammate,
    ];

    /// Tiers this tier is allowed to spawn. Authority descends exactly one
    /// rank; operations and teammate are leaves.
    pub fn spawnable(&self) -> &'static [AgentTier] {
        use AgentTier::*;
        match self {
            GeneralManager => &[Operations, Manager],
            Manager => &[TeamLead],
            TeamLead => &[Teammate],
            Operations | Teammate => &[],
        }
    }

    /// Tiers allowed to appear as this tier's `reports_to` parent.
    pub fn allowed_parents(&self) -> &'static [AgentTier] {
        use AgentTier::*;
        match self {
            GeneralManager => &[],
            Operations | Manager => &[GeneralManager],
            TeamLead => &[Manager],
            Teammate => &[TeamLead],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GeneralManager => "general-manager",
            Self::Operations => "operations",
            Self::Manager => "manager",
            Self::TeamLead => "team-lead",
            Self::Teammate => "teammate",
        }
    }
}

impl fmt::Display for AgentTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AgentTier {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "general-manager" => Ok(Self::GeneralManager),
            "operations" => Ok(Self::Operations),
            "manager" => Ok(Self::Manager),
            "team-lead" => Ok(Self::TeamLead),
            "teammate" => Ok(Self::Teammate),
            other => Err(format!("Unknown agent tier: {}", other)),
        }
    }
}

/// Whether `requester` may spawn `target`. A missing tier on either side is
/// permitted for legacy configurations that predate tiers.
pub fn can_spawn(requester: Option<AgentTier>, target: Option<AgentTier>) -> bool {
    match (requester, target) {
        (Some(req), Some(tgt)) => req.spawnable().contains(&tgt),
        _ => true,
    }
}
