//! Orchestration facade: the boundary tool-call and CLI collaborators hit.
//! Owns the configuration snapshot, the workspace layout, and per-project
//! runtime state (task engines, team locks).

use std::sync::Arc;

use dashmap::DashMap;

use crate::bootstrap::{BootstrapFile, BootstrapQuery, BootstrapResolver};
use crate::config::KernelConfig;
use crate::error::Result;
use crate::hierarchy::AgentTier;
use crate::layout::{ProjectLayout, WorkspaceLayout};
use crate::mailbox::Mailbox;
use crate::memory::{self, MemoryDecision, MemoryOp, MemoryScope};
use crate::project::{Project, ProjectStatus, ProjectStore};
use crate::spawn::{authorize_spawn, SpawnDecision, SpawnRequest};
use crate::sync::TeamLocks;
use crate::tasks::{FsTaskRepository, TaskEngine};

struct ProjectRuntime {
    layout: ProjectLayout,
    locks: Arc<TeamLocks>,
    engine: TaskEngine,
}

pub struct Kernel {
    config: KernelConfig,
    workspace: WorkspaceLayout,
    bootstrap: BootstrapResolver,
    projects: ProjectStore,
    runtimes: DashMap<String, Arc<ProjectRuntime>>,
}

impl Kernel {
    /// `projects_root` is where project runtime directories live; the
    /// workspace root comes from the configuration snapshot.
    pub fn new(config: KernelConfig, projects_root: impl Into<std::path::PathBuf>) -> Self {
        let workspace = WorkspaceLayout::new(config.workspace_root());
        Self {
            bootstrap: BootstrapResolver::new(workspace.clone()),
            projects: ProjectStore::new(projects_root),
            runtimes: DashMap::new(),
            workspace,
            config,
        }
    }

    #[inline]
    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    #[inline]
    pub fn workspace(&self) -> &WorkspaceLayout {
        &self.workspace
    }

    fn runtime(&self, project_id: &str) -> Arc<ProjectRuntime> {
        self.runtimes
            .entry(project_id.to_string())
            .or_insert_with(|| {
                let layout = self.projects.layout(project_id);
                let locks = Arc::new(TeamLocks::new());
                let engine = TaskEngine::new(
                    Arc::new(FsTaskRepository::new(layout.clone())),
                    Arc::clone(&locks),
                );
                Arc::new(ProjectRuntime {
                    layout,
                    locks,
                    engine,
                })
            })
            .clone()
    }

    // --- Spawn -----------------------------------------------------------

    /// Authorize a spawn request. Forbidden outcomes are structured
    /// statuses, never errors.
    pub async fn authorize_spawn(&self, request: &SpawnRequest) -> SpawnDecision {
        authorize_spawn(&self.config, &self.workspace, request).await
    }

    // --- Bootstrap -------------------------------------------------------

    pub async fn resolve_bootstrap(&self, query: &BootstrapQuery) -> Result<Vec<BootstrapFile>> {
        self.bootstrap.resolve(query).await
    }

    /// Scaffold the hierarchy directories for one of a manager's team
    /// templates. Write-once; repeated calls fill gaps only.
    pub async fn scaffold_team(
        &self,
        manager_id: &str,
        template_id: &str,
    ) -> Result<Vec<std::path::PathBuf>> {
        let template = self.config.template(template_id)?;
        self.bootstrap.scaffold_team(manager_id, template).await
    }

    // --- Projects and teams ----------------------------------------------

    pub async fn create_project(&self, project_id: &str, brief: &str) -> Result<Project> {
        self.projects.create(project_id, brief).await?;
        self.projects.load(project_id).await
    }

    pub async fn project(&self, project_id: &str) -> Result<Project> {
        self.projects.load(project_id).await
    }

    pub async fn set_project_status(
        &self,
        project_id: &str,
        status: ProjectStatus,
    ) -> Result<Project> {
        self.projects.set_status(project_id, status).await
    }

    /// Initialize a team's task list under a project.
    pub async fn init_team(&self, project_id: &str, team_name: &str) -> Result<()> {
        self.runtime(project_id)
            .engine
            .init_team(project_id, team_name)
            .await
    }

    /// Task operations for one project, scoped by team inside the engine.
    pub fn tasks(&self, project_id: &str) -> TaskHandle {
        TaskHandle {
            runtime: self.runtime(project_id),
        }
    }

    pub fn mailbox(&self, project_id: &str, team_name: &str) -> Mailbox {
        let runtime = self.runtime(project_id);
        Mailbox::new(
            runtime.layout.clone(),
            team_name,
            Arc::clone(&runtime.locks),
        )
    }

    // --- Memory ----------------------------------------------------------

    /// Evaluate a memory operation for an agent. The tier comes from the
    /// configuration snapshot; unknown agents are treated as legacy
    /// untiered.
    pub fn check_memory(
        &self,
        agent_id: &str,
        scope: MemoryScope,
        op: MemoryOp,
        is_own_team: bool,
    ) -> MemoryDecision {
        self.check_memory_tier(self.config.tier_of(agent_id), scope, op, is_own_team)
    }

    pub fn check_memory_tier(
        &self,
        tier: Option<AgentTier>,
        scope: MemoryScope,
        op: MemoryOp,
        is_own_team: bool,
    ) -> MemoryDecision {
        memory::check(tier, scope, op, is_own_team)
    }
}

/// Borrowed view over one project's task engine.
pub struct TaskHandle {
    runtime: Arc<ProjectRuntime>,
}

impl std::ops::Deref for TaskHandle {
    type Target = TaskEngine;

    fn deref(&self) -> &TaskEngine {
        &self.runtime.engine
    }
}
