//! Task-list persistence behind a repository seam so the state machine can
//! run against an in-memory backend in tests.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::fs;
use tracing::debug;

use super::TaskList;
use crate::error::{KernelError, Result};
use crate::layout::ProjectLayout;

#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Create an empty task list for the team if one does not exist yet.
    async fn init(&self, project_id: &str, team_name: &str) -> Result<()>;

    async fn exists(&self, team_name: &str) -> bool;

    /// Load the whole document. `TaskListNotFound` if the team was never
    /// initialized.
    async fn load(&self, team_name: &str) -> Result<TaskList>;

    /// Replace the whole document. Persistence failures are hard errors.
    async fn save(&self, list: &TaskList) -> Result<()>;
}

/// Whole-document JSON store at `<project>/teams/<team>/task-list.json`.
pub struct FsTaskRepository {
    layout: ProjectLayout,
}

impl FsTaskRepository {
    pub fn new(layout: ProjectLayout) -> Self {
        Self { layout }
    }

    fn path(&self, team_name: &str) -> PathBuf {
        self.layout.task_list_path(team_name)
    }

    async fn write_atomic(path: &Path, content: &str) -> Result<()> {
        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, content).await?;
        fs::rename(&tmp_path, path).await?;
        debug!(path = %path.display(), "Task list written");
        Ok(())
    }
}

#[async_trait]
impl TaskRepository for FsTaskRepository {
    async fn init(&self, project_id: &str, team_name: &str) -> Result<()> {
        let path = self.path(team_name);
        if fs::try_exists(&path).await? {
            return Ok(());
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let list = TaskList::new(project_id, team_name);
        let content = serde_json::to_string_pretty(&list)?;
        Self::write_atomic(&path, &content).await
    }

    async fn exists(&self, team_name: &str) -> bool {
        self.path(team_name).exists()
    }

    async fn load(&self, team_name: &str) -> Result<TaskList> {
        let path = self.path(team_name);
        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(KernelError::TaskListNotFound(team_name.to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        let list: TaskList = serde_json::from_str(&content)?;
        Ok(list)
    }

    async fn save(&self, list: &TaskList) -> Result<()> {
        let path = self.path(&list.team_name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let content = serde_json::to_string_pretty(list)?;
        Self::write_atomic(&path, &content).await
    }
}

/// Test backend keeping documents in a process-local map.
#[derive(Default)]
pub struct InMemoryTaskRepository {
    lists: Mutex<HashMap<String, TaskList>>,
}

impl InMemoryTaskRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TaskRepository for InMemoryTaskRepository {
    async fn init(&self, project_id: &str, team_name: &str) -> Result<()> {
        let mut lists = self.lists.lock();
        lists
            .entry(team_name.to_string())
            .or_insert_with(|| TaskList::new(project_id, team_name));
        Ok(())
    }

    async fn exists(&self, team_name: &str) -> bool {
        self.lists.lock().contains_key(team_name)
    }

    async fn load(&self, team_name: &str) -> Result<TaskList> {
        self.lists
            .lock()
            .get(team_name)
            .cloned()
            .ok_or_else(|| KernelError::TaskListNotFound(team_name.to_string()))
    }

    async fn save(&self, list: &TaskList) -> Result<()> {
        self.lists
            .lock()
            .insert(list.team_name.clone(), list.clone());
        Ok(())
    }
}
