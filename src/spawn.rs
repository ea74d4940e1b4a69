//! Spawn authorization: tier legality first, then containment. Forbidden
//! outcomes are structured values so callers can adapt, never errors.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::KernelConfig;
use crate::containment::{is_contained, RolePath};
use crate::hierarchy::{can_spawn, AgentTier};
use crate::layout::WorkspaceLayout;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpawnRequest {
    pub requester_id: String,
    #[serde(default)]
    pub requester_tier: Option<AgentTier>,
    #[serde(default)]
    pub target_tier: Option<AgentTier>,
    pub target_role: String,
    /// Manager whose hierarchy directory contains the target role.
    pub manager_id: String,
    /// Required when the target is a teammate.
    #[serde(default)]
    pub lead_role: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "violation", rename_all = "kebab-case")]
pub enum SpawnViolation {
    Hierarchy {
        requester_tier: AgentTier,
        target_tier: AgentTier,
    },
    Containment {
        expected_dir: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "kebab-case")]
pub enum SpawnDecision {
    Accepted,
    Forbidden(SpawnViolation),
}

impl SpawnDecision {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }
}

/// Authorize a spawn request against the configuration snapshot and the
/// workspace's hierarchy directories. Side-effect-free.
///
/// Tiers fall back to the configuration's declared tiers when the request
/// leaves them unset; agents unknown to both stay untiered (legacy).
pub async fn authorize_spawn(
    config: &KernelConfig,
    layout: &WorkspaceLayout,
    request: &SpawnRequest,
) -> SpawnDecision {
    let requester_tier = request
        .requester_tier
        .or_else(|| config.tier_of(&request.requester_id));
    let target_tier = request.target_tier;

    // can_spawn only denies when both tiers are known.
    if let (Some(requester_tier), Some(target_tier)) = (requester_tier, target_tier) {
        if !can_spawn(Some(requester_tier), Some(target_tier)) {
            debug!(
                requester = %request.requester_id,
                requester_tier = %requester_tier,
                target_tier = %target_tier,
                "Spawn forbidden by hierarchy"
            );
            return SpawnDecision::Forbidden(SpawnViolation::Hierarchy {
                requester_tier,
                target_tier,
            });
        }
    }

    if let Some(tier) = target_tier {
        if let Some(role_path) = RolePath::for_spawn(
            tier,
            &request.manager_id,
            request.lead_role.as_deref(),
            &request.target_role,
        ) {
            if !is_contained(layout, &role_path).await {
                let expected_dir = role_path.expected_dir(layout);
                debug!(
                    requester = %request.requester_id,
                    role = %request.target_role,
                    expected_dir = %expected_dir.display(),
                    "Spawn forbidden by containment"
                );
                return SpawnDecision::Forbidden(SpawnViolation::Containment {
                    expected_dir: expected_dir.display().to_string(),
                });
            }
        }
    }

    debug!(
        requester = %request.requester_id,
        role = %request.target_role,
        "Spawn accepted"
    );
    SpawnDecision::Accepted
}
