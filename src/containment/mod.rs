//! Containment: a structural allow-list on top of tier legality. A role is
//! only spawnable if its directory exists inside the spawner's hierarchy.

use std::path::PathBuf;

use tokio::fs;

use crate::hierarchy::AgentTier;
use crate::layout::WorkspaceLayout;

/// The role path a spawn request resolves to. Only team-leads and teammates
/// live inside a manager's hierarchy directory; upper tiers are not subject
/// to containment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RolePath {
    TeamLead {
        manager_id: String,
        role: String,
    },
    Teammate {
        manager_id: String,
        lead_role: String,
        role: String,
    },
}

impl RolePath {
    /// Role path for a spawn target, when containment applies to its tier.
    pub fn for_spawn(
        target_tier: AgentTier,
        manager_id: &str,
        lead_role: Option<&str>,
        role: &str,
    ) -> Option<RolePath> {
        match target_tier {
            AgentTier::TeamLead => Some(RolePath::TeamLead {
                manager_id: manager_id.to_string(),
                role: role.to_string(),
            }),
            AgentTier::Teammate => Some(RolePath::Teammate {
                manager_id: manager_id.to_string(),
                lead_role: lead_role.unwrap_or_default().to_string(),
                role: role.to_string(),
            }),
            _ => None,
        }
    }

    /// The directory that must exist for this role to be spawnable.
    pub fn expected_dir(&self, layout: &WorkspaceLayout) -> PathBuf {
        match self {
            RolePath::TeamLead { manager_id, role } => layout.team_lead_dir(manager_id, role),
            RolePath::Teammate {
                manager_id,
                lead_role,
                role,
            } => layout.teammate_dir(manager_id, lead_role, role),
        }
    }
}

/// Whether the role's containment directory exists. Side-effect-free; a
/// legal tier pair with no folder is still forbidden.
pub async fn is_contained(layout: &WorkspaceLayout, path: &RolePath) -> bool {
    let dir = path.expected_dir(layout);
    fs::metadata(&dir)
        .await
        .map(|meta| meta.is_dir())
        .unwrap_or(false)
}
