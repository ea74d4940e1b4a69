//! Memory access control: a pure permission matrix over tier and scope.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::hierarchy::AgentTier;

/// Where a memory document lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MemoryScope {
    Company,
    ProjectShared,
    Team,
}

impl fmt::Display for MemoryScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Company => "company",
            Self::ProjectShared => "project-shared",
            Self::Team => "team",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryAccess {
    Read,
    Write,
    None,
}

impl MemoryAccess {
    pub fn can_read(&self) -> bool {
        matches!(self, Self::Read | Self::Write)
    }

    pub fn can_write(&self) -> bool {
        matches!(self, Self::Write)
    }
}

/// Permission for `tier` on `scope`. `is_own_team` only matters for the
/// team scope. Never stored; computed per call. A legacy agent with no
/// tier may read everything and write nothing.
pub fn access(tier: Option<AgentTier>, scope: MemoryScope, is_own_team: bool) -> MemoryAccess {
    use AgentTier::*;
    use MemoryAccess::*;

    let Some(tier) = tier else {
        return Read;
    };

    match scope {
        MemoryScope::Company => match tier {
            GeneralManager | Operations => Write,
            Manager => Read,
            TeamLead | Teammate => None,
        },
        MemoryScope::ProjectShared => match tier {
            Operations => Read,
            GeneralManager | Manager | TeamLead | Teammate => Write,
        },
        MemoryScope::Team => match tier {
            GeneralManager | Operations | Manager => Read,
            TeamLead | Teammate => {
                if is_own_team {
                    Write
                } else {
                    None
                }
            }
        },
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryOp {
    Read,
    Write,
}

/// Boundary result for a memory operation: a structured status, never an
/// error, so callers can adapt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryDecision {
    pub allowed: bool,
    #[serde(default)]
    pub reason: Option<String>,
}

impl MemoryDecision {
    fn allowed() -> Self {
        Self {
            allowed: true,
            reason: None,
        }
    }

    fn denied(reason: String) -> Self {
        Self {
            allowed: false,
            reason: Some(reason),
        }
    }
}

/// Evaluate one operation against the matrix.
pub fn check(
    tier: Option<AgentTier>,
    scope: MemoryScope,
    op: MemoryOp,
    is_own_team: bool,
) -> MemoryDecision {
    let granted = access(tier, scope, is_own_team);
    let ok = match op {
        MemoryOp::Read => granted.can_read(),
        MemoryOp::Write => granted.can_write(),
    };
    if ok {
        MemoryDecision::allowed()
    } else {
        let tier_name = tier.map(|t| t.to_string()).unwrap_or_else(|| "untiered".into());
        let team = match (scope, is_own_team) {
            (MemoryScope::Team, true) => " (own team)",
            (MemoryScope::Team, false) => " (other team)",
            _ => "",
        };
        MemoryDecision::denied(format!(
            "{} may not {} {} memory{}",
            tier_name,
            match op {
                MemoryOp::Read => "read",
                MemoryOp::Write => "write",
            },
            scope,
            team
        ))
    }
}
