//! Layered bootstrap-file resolution and write-once scaffolding.
//!
//! Each file resolves with first-match-wins precedence: the role's nested
//! hierarchy directory, then a persona override directory, then workspace
//! root shared files, then (primary file only) the built-in defaults.
//! Missing files at any level are skipped, never an error.

mod defaults;

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::debug;

use crate::config::TeamTemplate;
use crate::error::Result;
use crate::hierarchy::AgentTier;
use crate::layout::WorkspaceLayout;

pub use defaults::{primary_default, primary_file, AUX_FILES};

/// Where a resolved file came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootstrapSource {
    Hierarchy,
    Persona,
    Shared,
    Builtin,
}

#[derive(Debug, Clone)]
pub struct BootstrapFile {
    pub name: String,
    pub source: BootstrapSource,
    /// Absent for built-in defaults.
    pub path: Option<PathBuf>,
    pub contents: String,
}

/// A role to resolve bootstrap files for.
#[derive(Debug, Clone)]
pub struct BootstrapQuery {
    pub tier: AgentTier,
    pub manager_id: String,
    pub lead_role: Option<String>,
    pub mate_role: Option<String>,
    /// Persona override directory from the member template, absolute or
    /// relative to the workspace root.
    pub persona_dir: Option<PathBuf>,
}

impl BootstrapQuery {
    pub fn for_manager(manager_id: impl Into<String>) -> Self {
        Self {
            tier: AgentTier::Manager,
            manager_id: manager_id.into(),
            lead_role: None,
            mate_role: None,
            persona_dir: None,
        }
    }

    pub fn for_team_lead(manager_id: impl Into<String>, lead_role: impl Into<String>) -> Self {
        Self {
            tier: AgentTier::TeamLead,
            manager_id: manager_id.into(),
            lead_role: Some(lead_role.into()),
            mate_role: None,
            persona_dir: None,
        }
    }

    pub fn for_teammate(
        manager_id: impl Into<String>,
        lead_role: impl Into<String>,
        mate_role: impl Into<String>,
    ) -> Self {
        Self {
            tier: AgentTier::Teammate,
            manager_id: manager_id.into(),
            lead_role: Some(lead_role.into()),
            mate_role: Some(mate_role.into()),
            persona_dir: None,
        }
    }

    pub fn with_persona_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.persona_dir = Some(dir.into());
        self
    }

    /// Query for a template member by role, carrying the member's persona
    /// override directory. `None` when the role is not in the template.
    pub fn for_template_member(
        manager_id: &str,
        template: &TeamTemplate,
        role: &str,
    ) -> Option<Self> {
        if template.team_lead.role == role {
            let mut query = Self::for_team_lead(manager_id, role);
            query.persona_dir = template.team_lead.persona_dir.clone();
            return Some(query);
        }
        template.teammates.iter().find(|m| m.role == role).map(|mate| {
            let mut query = Self::for_teammate(manager_id, &template.team_lead.role, role);
            query.persona_dir = mate.persona_dir.clone();
            query
        })
    }

    fn hierarchy_dir(&self, layout: &WorkspaceLayout) -> PathBuf {
        match self.tier {
            AgentTier::Teammate => layout.teammate_dir(
                &self.manager_id,
                self.lead_role.as_deref().unwrap_or_default(),
                self.mate_role.as_deref().unwrap_or_default(),
            ),
            AgentTier::TeamLead => layout.team_lead_dir(
                &self.manager_id,
                self.lead_role.as_deref().unwrap_or_default(),
            ),
            _ => layout.manager_dir(&self.manager_id),
        }
    }
}

pub struct BootstrapResolver {
    layout: WorkspaceLayout,
}

impl BootstrapResolver {
    pub fn new(layout: WorkspaceLayout) -> Self {
        Self { layout }
    }

    /// Resolve every bootstrap file for the role: the tier's primary file
    /// plus the auxiliary set. Reads are read-only and independent.
    pub async fn resolve(&self, query: &BootstrapQuery) -> Result<Vec<BootstrapFile>> {
        let mut files = Vec::new();

        let primary = primary_file(query.tier);
        match self.resolve_file(query, primary).await {
            Some(file) => files.push(file),
            None => files.push(BootstrapFile {
                name: primary.to_string(),
                source: BootstrapSource::Builtin,
                path: None,
                contents: primary_default(query.tier).to_string(),
            }),
        }

        for name in AUX_FILES {
            if let Some(file) = self.resolve_file(query, name).await {
                files.push(file);
            }
        }

        Ok(files)
    }

    /// First-match-wins lookup across the on-disk layers.
    async fn resolve_file(&self, query: &BootstrapQuery, name: &str) -> Option<BootstrapFile> {
        let hierarchy = query.hierarchy_dir(&self.layout).join(name);
        if let Some(file) = read_optional(&hierarchy, name, BootstrapSource::Hierarchy).await {
            return Some(file);
        }

        if let Some(persona_dir) = &query.persona_dir {
            let dir = if persona_dir.is_absolute() {
                persona_dir.clone()
            } else {
                self.layout.root().join(persona_dir)
            };
            if let Some(file) = read_optional(&dir.join(name), name, BootstrapSource::Persona).await
            {
                return Some(file);
            }
        }

        let shared = self.layout.root().join(name);
        read_optional(&shared, name, BootstrapSource::Shared).await
    }

    /// Materialize hierarchy directories and primary files for every role
    /// in a template, seeding from the built-in defaults. Existing files
    /// are never overwritten, so repeated scaffolds are idempotent.
    pub async fn scaffold_team(
        &self,
        manager_id: &str,
        template: &TeamTemplate,
    ) -> Result<Vec<PathBuf>> {
        let mut created = Vec::new();

        let lead_dir = self
            .layout
            .team_lead_dir(manager_id, &template.team_lead.role);
        self.seed_role(&lead_dir, AgentTier::TeamLead, &mut created)
            .await?;

        for mate in &template.teammates {
            let mate_dir =
                self.layout
                    .teammate_dir(manager_id, &template.team_lead.role, &mate.role);
            self.seed_role(&mate_dir, AgentTier::Teammate, &mut created)
                .await?;
        }

        debug!(
            manager_id,
            template = %template.id,
            created = created.len(),
            "Team scaffolded"
        );
        Ok(created)
    }

    async fn seed_role(
        &self,
        dir: &Path,
        tier: AgentTier,
        created: &mut Vec<PathBuf>,
    ) -> Result<()> {
        fs::create_dir_all(dir).await?;
        let path = dir.join(primary_file(tier));
        if fs::try_exists(&path).await? {
            return Ok(());
        }
        fs::write(&path, primary_default(tier)).await?;
        created.push(path);
        Ok(())
    }
}

async fn read_optional(path: &Path, name: &str, source: BootstrapSource) -> Option<BootstrapFile> {
    match fs::read_to_string(path).await {
        Ok(contents) => Some(BootstrapFile {
            name: name.to_string(),
            source,
            path: Some(path.to_path_buf()),
            contents,
        }),
        Err(_) => None,
    }
}
