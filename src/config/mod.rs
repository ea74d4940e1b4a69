//! Immutable configuration snapshot passed into every kernel call.
//!
//! Validation runs once at load; kernel operations never re-check the
//! reporting graph or template references.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{KernelError, Result};
use crate::hierarchy::{validate_reporting_chains, AgentNode, AgentTier};

/// How teammates pick up work by default for teams built from a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskClaiming {
    #[default]
    SelfClaim,
    Assigned,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TemplateDefaults {
    #[serde(default)]
    pub task_claiming: TaskClaiming,
}

/// One member slot in a team template. `persona_dir` points at an override
/// directory for bootstrap files (absolute, or relative to the workspace
/// root).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberSpec {
    pub role: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub persona_dir: Option<PathBuf>,
}

impl MemberSpec {
    pub fn new(role: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            name: None,
            model: None,
            persona_dir: None,
        }
    }

    pub fn with_persona_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.persona_dir = Some(dir.into());
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamTemplate {
    pub id: String,
    pub team_name: String,
    pub team_lead: MemberSpec,
    /// Teammate roles in spawn order.
    #[serde(default)]
    pub teammates: Vec<MemberSpec>,
    #[serde(default)]
    pub defaults: TemplateDefaults,
}

/// Validated, immutable snapshot of the agent organization.
#[derive(Debug)]
pub struct KernelConfig {
    workspace_root: PathBuf,
    agents: Vec<AgentNode>,
    templates: HashMap<String, TeamTemplate>,
    /// Template ids each manager may instantiate.
    template_sets: HashMap<String, Vec<String>>,
    agent_ids: HashSet<String>,
    tiers: HashMap<String, AgentTier>,
}

impl KernelConfig {
    pub fn new(
        workspace_root: impl Into<PathBuf>,
        agents: Vec<AgentNode>,
        templates: Vec<TeamTemplate>,
        template_sets: HashMap<String, Vec<String>>,
    ) -> Result<Self> {
        validate_reporting_chains(&agents)?;

        let template_map: HashMap<String, TeamTemplate> = templates
            .into_iter()
            .map(|t| (t.id.clone(), t))
            .collect();

        let agent_ids: HashSet<String> = agents.iter().map(|a| a.id.clone()).collect();

        for (manager_id, ids) in &template_sets {
            if !agent_ids.contains(manager_id) {
                return Err(KernelError::ConfigIntegrity(format!(
                    "Template set declared for unknown agent '{}'",
                    manager_id
                )));
            }
            for template_id in ids {
                if !template_map.contains_key(template_id) {
                    return Err(KernelError::ConfigIntegrity(format!(
                        "Agent '{}' references unknown team template '{}'",
                        manager_id, template_id
                    )));
                }
            }
        }

        let tiers = agents
            .iter()
            .filter_map(|a| a.tier.map(|t| (a.id.clone(), t)))
            .collect();

        Ok(Self {
            workspace_root: workspace_root.into(),
            agents,
            templates: template_map,
            template_sets,
            agent_ids,
            tiers,
        })
    }

    #[inline]
    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    #[inline]
    pub fn agents(&self) -> &[AgentNode] {
        &self.agents
    }

    #[inline]
    pub fn has_agent(&self, id: &str) -> bool {
        self.agent_ids.contains(id)
    }

    /// Declared tier for an agent id, if any. Legacy agents have none.
    #[inline]
    pub fn tier_of(&self, id: &str) -> Option<AgentTier> {
        self.tiers.get(id).copied()
    }

    pub fn template(&self, id: &str) -> Result<&TeamTemplate> {
        self.templates
            .get(id)
            .ok_or_else(|| KernelError::TemplateNotFound(id.to_string()))
    }

    /// Template ids a manager may instantiate. Empty for agents with no
    /// declared set.
    pub fn templates_for(&self, manager_id: &str) -> &[String] {
        self.template_sets
            .get(manager_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}
