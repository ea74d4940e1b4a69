//! Persisted directory layout for workspaces and project runtime state.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;

/// Workspace-rooted layout: agent hierarchy directories and shared
/// bootstrap files.
#[derive(Debug, Clone)]
pub struct WorkspaceLayout {
    root: PathBuf,
}

impl WorkspaceLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[inline]
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn agents_dir(&self) -> PathBuf {
        self.root.join("agents")
    }

    pub fn manager_dir(&self, manager_id: &str) -> PathBuf {
        self.agents_dir().join(manager_id)
    }

    pub fn team_lead_dir(&self, manager_id: &str, lead_role: &str) -> PathBuf {
        self.manager_dir(manager_id)
            .join("teamleads")
            .join(lead_role)
    }

    pub fn teammate_dir(&self, manager_id: &str, lead_role: &str, mate_role: &str) -> PathBuf {
        self.team_lead_dir(manager_id, lead_role)
            .join("teammates")
            .join(mate_role)
    }
}

/// Layout under one project's runtime directory `<projectId>/`.
#[derive(Debug, Clone)]
pub struct ProjectLayout {
    root: PathBuf,
}

impl ProjectLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[inline]
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn project_md(&self) -> PathBuf {
        self.root.join("PROJECT.md")
    }

    pub fn status_md(&self) -> PathBuf {
        self.root.join("STATUS.md")
    }

    pub fn shared_dir(&self) -> PathBuf {
        self.root.join("shared")
    }

    pub fn brief_md(&self) -> PathBuf {
        self.shared_dir().join("brief.md")
    }

    pub fn teams_dir(&self) -> PathBuf {
        self.root.join("teams")
    }

    pub fn team_dir(&self, team_name: &str) -> PathBuf {
        self.teams_dir().join(team_name)
    }

    pub fn task_list_path(&self, team_name: &str) -> PathBuf {
        self.team_dir(team_name).join("task-list.json")
    }

    pub fn mailbox_messages_dir(&self, team_name: &str) -> PathBuf {
        self.team_dir(team_name).join("mailbox").join("messages")
    }

    pub fn mailbox_broadcasts_dir(&self, team_name: &str) -> PathBuf {
        self.team_dir(team_name).join("mailbox").join("broadcasts")
    }

    pub fn team_memory_dir(&self, team_name: &str) -> PathBuf {
        self.team_dir(team_name).join("memory")
    }

    pub fn team_memory_file(&self, team_name: &str) -> PathBuf {
        self.team_memory_dir(team_name).join("MEMORY.md")
    }

    pub fn team_daily_file(&self, team_name: &str, date: NaiveDate) -> PathBuf {
        self.team_memory_dir(team_name)
            .join("daily")
            .join(format!("{}.md", date.format("%Y-%m-%d")))
    }

    pub fn project_memory_dir(&self) -> PathBuf {
        self.root.join("memory")
    }

    pub fn project_memory_file(&self) -> PathBuf {
        self.project_memory_dir().join("MEMORY.md")
    }

    pub fn project_daily_file(&self, date: NaiveDate) -> PathBuf {
        self.project_memory_dir()
            .join("daily")
            .join(format!("{}.md", date.format("%Y-%m-%d")))
    }
}
