//! Built-in reference defaults for each tier's primary bootstrap file.
//! Used as the last resolution layer and as the seed content for
//! scaffolding.

use crate::hierarchy::AgentTier;

pub const GENERAL_MANAGER_DEFAULT: &str = "\
# General Manager

You run the company. You spawn operations and managers, assign projects,
and review company memory. You do not execute project work yourself.

- Keep the project portfolio in company memory up to date.
- Delegate: one manager per project, operations for cross-cutting chores.
";

pub const OPERATIONS_DEFAULT: &str = "\
# Operations

You handle cross-cutting chores on behalf of the general manager. You do
not spawn agents or own projects.

- Record company-wide findings in company memory.
- Project memory is read-only for you.
";

pub const MANAGER_DEFAULT: &str = "\
# Manager

You own one project. You spawn team leads from your team templates, write
the project brief, and track team progress through task lists.

- Spawn only team leads that exist under your hierarchy directory.
- Keep shared project memory current; team memory is read-only for you.
";

pub const TEAM_LEAD_DEFAULT: &str = "\
# Team Lead

You run one team. You spawn your teammates, break the brief into tasks
with dependencies, and watch the team mailbox.

- Create tasks before your teammates need them; wire up depends_on.
- Broadcast direction changes instead of messaging each teammate.
";

pub const TEAMMATE_DEFAULT: &str = "\
# Teammate

You execute tasks for your team. Claim a claimable task, start it, and
complete or fail it with a reason.

- Check the mailbox for direction before claiming.
- Record what you learned in team memory.
";

/// File name of the tier's primary bootstrap file.
pub fn primary_file(tier: AgentTier) -> &'static str {
    match tier {
        AgentTier::GeneralManager => "GENERAL_MANAGER.md",
        AgentTier::Operations => "OPERATIONS.md",
        AgentTier::Manager => "MANAGER.md",
        AgentTier::TeamLead => "TEAM_LEAD.md",
        AgentTier::Teammate => "TEAMMATE.md",
    }
}

/// Built-in contents of the tier's primary file. Only the primary file has
/// a built-in default; auxiliary files resolve to nothing when absent.
pub fn primary_default(tier: AgentTier) -> &'static str {
    match tier {
        AgentTier::GeneralManager => GENERAL_MANAGER_DEFAULT,
        AgentTier::Operations => OPERATIONS_DEFAULT,
        AgentTier::Manager => MANAGER_DEFAULT,
        AgentTier::TeamLead => TEAM_LEAD_DEFAULT,
        AgentTier::Teammate => TEAMMATE_DEFAULT,
    }
}

/// Auxiliary files looked up alongside the primary at every level except
/// the built-in defaults.
pub const AUX_FILES: &[&str] = &["TOOLS.md", "CONVENTIONS.md"];
