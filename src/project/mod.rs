//! Project runtime directories: skeleton creation, status changes, and the
//! `Created:`/`Status:` line scraping the kernel relies on. Everything
//! else inside the project directory is collaborator content.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::debug;

use crate::error::{KernelError, Result};
use crate::layout::ProjectLayout;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    #[default]
    Active,
    Completed,
    Archived,
}

impl ProjectStatus {
    pub fn allowed_transitions(&self) -> &'static [ProjectStatus] {
        use ProjectStatus::*;
        match self {
            Active => &[Completed, Archived],
            Completed => &[Active, Archived],
            Archived => &[],
        }
    }

    pub fn can_transition_to(&self, target: ProjectStatus) -> bool {
        self.allowed_transitions().contains(&target)
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Archived => "archived",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for ProjectStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "completed" => Ok(Self::Completed),
            "archived" => Ok(Self::Archived),
            other => Err(format!("Unknown project status: {}", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Project {
    pub project_id: String,
    pub status: ProjectStatus,
    pub created_at: Option<DateTime<Utc>>,
    /// From `shared/brief.md`; absent briefs degrade silently.
    pub brief: Option<String>,
    /// Team instance names, from the `teams/` directory.
    pub teams: Vec<String>,
}

pub struct ProjectStore {
    projects_root: PathBuf,
}

impl ProjectStore {
    pub fn new(projects_root: impl Into<PathBuf>) -> Self {
        Self {
            projects_root: projects_root.into(),
        }
    }

    pub fn layout(&self, project_id: &str) -> ProjectLayout {
        ProjectLayout::new(self.projects_root.join(project_id))
    }

    /// Create the project skeleton. Existing projects are left untouched.
    pub async fn create(&self, project_id: &str, brief: &str) -> Result<ProjectLayout> {
        let layout = self.layout(project_id);
        if fs::try_exists(layout.root()).await? {
            return Ok(layout);
        }

        let shared = layout.shared_dir();
        fs::create_dir_all(&shared).await?;
        fs::create_dir_all(shared.join("artifacts")).await?;
        fs::create_dir_all(layout.teams_dir()).await?;

        let created_at = Utc::now();
        let project_md = format!(
            "# Project: {}\n\nCreated: {}\n\nSee shared/brief.md for the brief.\n",
            project_id,
            created_at.to_rfc3339()
        );
        fs::write(layout.project_md(), project_md).await?;
        fs::write(
            layout.status_md(),
            format!("Status: {}\n", ProjectStatus::Active),
        )
        .await?;
        fs::write(layout.brief_md(), brief).await?;
        fs::write(shared.join("context.md"), "").await?;
        fs::write(shared.join("decisions.md"), "").await?;

        debug!(project_id, "Project created");
        Ok(layout)
    }

    pub async fn load(&self, project_id: &str) -> Result<Project> {
        let layout = self.layout(project_id);
        if !fs::try_exists(layout.root()).await? {
            return Err(KernelError::ProjectNotFound(project_id.to_string()));
        }

        // Only the Created: and Status: lines are meaningful to the
        // kernel; the rest of both files is free-form.
        let created_at = fs::read_to_string(layout.project_md())
            .await
            .ok()
            .and_then(|content| scrape_line(&content, "Created:"))
            .and_then(|raw| DateTime::parse_from_rfc3339(&raw).ok())
            .map(|dt| dt.with_timezone(&Utc));

        let status = fs::read_to_string(layout.status_md())
            .await
            .ok()
            .and_then(|content| scrape_line(&content, "Status:"))
            .and_then(|raw| raw.parse().ok())
            .unwrap_or_default();

        let brief = fs::read_to_string(layout.brief_md()).await.ok();

        let mut teams = Vec::new();
        if let Ok(mut entries) = fs::read_dir(layout.teams_dir()).await {
            while let Ok(Some(entry)) = entries.next_entry().await {
                if entry.path().is_dir() {
                    teams.push(entry.file_name().to_string_lossy().into_owned());
                }
            }
        }
        teams.sort();

        Ok(Project {
            project_id: project_id.to_string(),
            status,
            created_at,
            brief,
            teams,
        })
    }

    /// Change the project's status, rewriting only the `Status:` line.
    /// Projects are never deleted; archived is terminal.
    pub async fn set_status(&self, project_id: &str, status: ProjectStatus) -> Result<Project> {
        let project = self.load(project_id).await?;
        if !project.status.can_transition_to(status) {
            return Err(KernelError::InvalidProjectStatus {
                from: project.status.to_string(),
                to: status.to_string(),
            });
        }

        let layout = self.layout(project_id);
        let content = fs::read_to_string(layout.status_md())
            .await
            .unwrap_or_default();
        let rewritten = rewrite_status_line(&content, status);
        fs::write(layout.status_md(), rewritten).await?;

        debug!(project_id, status = %status, "Project status changed");
        self.load(project_id).await
    }
}

fn scrape_line(content: &str, prefix: &str) -> Option<String> {
    content
        .lines()
        .find_map(|line| line.strip_prefix(prefix))
        .map(|rest| rest.trim().to_string())
}

fn rewrite_status_line(content: &str, status: ProjectStatus) -> String {
    let mut lines: Vec<String> = content.lines().map(String::from).collect();
    let mut replaced = false;
    for line in &mut lines {
        if line.starts_with("Status:") {
            *line = format!("Status: {}", status);
            replaced = true;
            break;
        }
    }
    if !replaced {
        lines.insert(0, format!("Status: {}", status));
    }
    let mut out = lines.join("\n");
    out.push('\n');
    out
}
