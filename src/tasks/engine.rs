//! Task graph state machine with dependency-based unlocking.

use std::sync::Arc;

use chrono::Utc;
use tracing::debug;

use super::{Task, TaskList, TaskListStatus, TaskRepository, TaskStatus};
use crate::error::{DependencyState, KernelError, Result};
use crate::sync::TeamLocks;

/// Fields for a new task. Everything but the title is optional.
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub depends_on: Vec<u64>,
    pub assigned_to: Option<String>,
}

impl NewTask {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn depends_on(mut self, deps: Vec<u64>) -> Self {
        self.depends_on = deps;
        self
    }

    pub fn assigned_to(mut self, role: impl Into<String>) -> Self {
        self.assigned_to = Some(role.into());
        self
    }
}

/// Partial update applied through `update`, bypassing state-machine guards.
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub assigned_to: Option<String>,
    pub depends_on: Option<Vec<u64>>,
    pub failed_reason: Option<String>,
}

/// Result of completing a task: the completed task plus every pending task
/// it unlocked. Unlocked tasks are reported, not auto-claimed; claiming
/// stays an explicit actor action.
#[derive(Debug, Clone)]
pub struct CompleteOutcome {
    pub task: Task,
    pub unlocked: Vec<Task>,
    pub list_completed: bool,
}

pub struct TaskEngine {
    repo: Arc<dyn TaskRepository>,
    locks: Arc<TeamLocks>,
}

impl TaskEngine {
    pub fn new(repo: Arc<dyn TaskRepository>, locks: Arc<TeamLocks>) -> Self {
        Self { repo, locks }
    }

    /// Create the team's empty task list if it does not exist yet.
    pub async fn init_team(&self, project_id: &str, team_name: &str) -> Result<()> {
        let _guard = self.locks.acquire(team_name).await;
        self.repo.init(project_id, team_name).await
    }

    pub async fn create(&self, team_name: &str, new_task: NewTask) -> Result<Task> {
        let _guard = self.locks.acquire(team_name).await;
        let mut list = self.repo.load(team_name).await?;

        let mut task = Task::new(list.next_id(), new_task.title);
        if let Some(description) = new_task.description {
            task.description = description;
        }
        task.depends_on = new_task.depends_on;
        task.assigned_to = new_task.assigned_to;

        debug!(team = team_name, task_id = task.id, "Task created");
        list.tasks.push(task.clone());
        self.repo.save(&list).await?;
        Ok(task)
    }

    /// Claim a pending task for `role`. Every dependency must resolve to a
    /// completed task; a missing dependency id is permanently unmet.
    pub async fn claim(&self, team_name: &str, task_id: u64, role: &str) -> Result<Task> {
        let _guard = self.locks.acquire(team_name).await;
        let mut list = self.repo.load(team_name).await?;

        let task = get_task(&list, team_name, task_id)?;
        if task.status != TaskStatus::Pending {
            return Err(invalid_transition(task_id, task.status, TaskStatus::Pending));
        }

        let unmet: Vec<(u64, DependencyState)> = task
            .depends_on
            .iter()
            .copied()
            .filter_map(|dep| match list.task(dep) {
                Some(t) if t.status == TaskStatus::Completed => None,
                Some(t) => Some((dep, DependencyState::Unfinished(t.status))),
                None => Some((dep, DependencyState::Missing)),
            })
            .collect();
        if !unmet.is_empty() {
            return Err(KernelError::UnmetDependency { task_id, unmet });
        }

        let task = task_mut(&mut list, team_name, task_id)?;
        task.status = TaskStatus::Claimed;
        task.assigned_to = Some(role.to_string());
        task.claimed_at = Some(Utc::now());
        let claimed = task.clone();

        debug!(team = team_name, task_id, role, "Task claimed");
        self.repo.save(&list).await?;
        Ok(claimed)
    }

    pub async fn start(&self, team_name: &str, task_id: u64) -> Result<Task> {
        let _guard = self.locks.acquire(team_name).await;
        let mut list = self.repo.load(team_name).await?;

        let task = get_task(&list, team_name, task_id)?;
        if task.status != TaskStatus::Claimed {
            return Err(invalid_transition(task_id, task.status, TaskStatus::Claimed));
        }

        let task = task_mut(&mut list, team_name, task_id)?;
        task.status = TaskStatus::InProgress;
        let started = task.clone();

        debug!(team = team_name, task_id, "Task started");
        self.repo.save(&list).await?;
        Ok(started)
    }

    /// Complete a claimed or in-progress task, reporting the pending tasks
    /// whose last unmet dependency this completion satisfied.
    pub async fn complete(&self, team_name: &str, task_id: u64) -> Result<CompleteOutcome> {
        let _guard = self.locks.acquire(team_name).await;
        let mut list = self.repo.load(team_name).await?;

        let task = get_task(&list, team_name, task_id)?;
        if !matches!(task.status, TaskStatus::Claimed | TaskStatus::InProgress) {
            return Err(invalid_transition(task_id, task.status, TaskStatus::InProgress));
        }

        let task = task_mut(&mut list, team_name, task_id)?;
        task.status = TaskStatus::Completed;
        task.completed_at = Some(Utc::now());
        let completed = task.clone();

        let unlocked: Vec<Task> = list
            .tasks
            .iter()
            .filter(|t| {
                t.status == TaskStatus::Pending
                    && t.depends_on.contains(&task_id)
                    && list.unmet_dependencies(t).is_empty()
            })
            .cloned()
            .collect();

        let list_completed = list.all_terminal();
        if list_completed {
            list.status = TaskListStatus::Completed;
        }

        debug!(
            team = team_name,
            task_id,
            unlocked = unlocked.len(),
            list_completed,
            "Task completed"
        );
        self.repo.save(&list).await?;
        Ok(CompleteOutcome {
            task: completed,
            unlocked,
            list_completed,
        })
    }

    /// Fail a non-terminal task with a reason. Dependents stay pending and
    /// permanently unclaimable; there is no cascading failure.
    pub async fn fail(&self, team_name: &str, task_id: u64, reason: &str) -> Result<Task> {
        let _guard = self.locks.acquire(team_name).await;
        let mut list = self.repo.load(team_name).await?;

        let task = get_task(&list, team_name, task_id)?;
        if task.status.is_terminal() {
            return Err(invalid_transition(task_id, task.status, TaskStatus::InProgress));
        }

        let task = task_mut(&mut list, team_name, task_id)?;
        task.status = TaskStatus::Failed;
        task.failed_reason = Some(reason.to_string());
        let failed = task.clone();

        if list.all_terminal() {
            list.status = TaskListStatus::Completed;
        }

        debug!(team = team_name, task_id, reason, "Task failed");
        self.repo.save(&list).await?;
        Ok(failed)
    }

    /// Pending tasks with zero unmet dependencies, in list order.
    pub async fn list_claimable(&self, team_name: &str) -> Result<Vec<Task>> {
        let list = self.repo.load(team_name).await?;
        Ok(list.claimable().into_iter().cloned().collect())
    }

    pub async fn get(&self, team_name: &str, task_id: u64) -> Result<Task> {
        let list = self.repo.load(team_name).await?;
        get_task(&list, team_name, task_id).cloned()
    }

    pub async fn list(&self, team_name: &str) -> Result<TaskList> {
        self.repo.load(team_name).await
    }

    /// Direct field mutation, bypassing transition guards. Does not
    /// recompute unlocking.
    pub async fn update(&self, team_name: &str, task_id: u64, patch: TaskPatch) -> Result<Task> {
        let _guard = self.locks.acquire(team_name).await;
        let mut list = self.repo.load(team_name).await?;

        let task = list
            .task_mut(task_id)
            .ok_or_else(|| KernelError::TaskNotFound {
                team_name: team_name.to_string(),
                task_id,
            })?;

        if let Some(title) = patch.title {
            task.title = title;
        }
        if let Some(description) = patch.description {
            task.description = description;
        }
        if let Some(status) = patch.status {
            task.status = status;
        }
        if let Some(assigned_to) = patch.assigned_to {
            task.assigned_to = Some(assigned_to);
        }
        if let Some(depends_on) = patch.depends_on {
            task.depends_on = depends_on;
        }
        if let Some(failed_reason) = patch.failed_reason {
            task.failed_reason = Some(failed_reason);
        }
        let updated = task.clone();

        debug!(team = team_name, task_id, "Task updated directly");
        self.repo.save(&list).await?;
        Ok(updated)
    }
}

fn get_task<'a>(list: &'a TaskList, team_name: &str, task_id: u64) -> Result<&'a Task> {
    list.task(task_id).ok_or_else(|| KernelError::TaskNotFound {
        team_name: team_name.to_string(),
        task_id,
    })
}

fn task_mut<'a>(list: &'a mut TaskList, team_name: &str, task_id: u64) -> Result<&'a mut Task> {
    list.task_mut(task_id).ok_or_else(|| KernelError::TaskNotFound {
        team_name: team_name.to_string(),
        task_id,
    })
}

fn invalid_transition(task_id: u64, actual: TaskStatus, expected: TaskStatus) -> KernelError {
    KernelError::InvalidTransition {
        task_id,
        actual: actual.to_string(),
        expected: expected.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::InMemoryTaskRepository;

    fn engine() -> TaskEngine {
        TaskEngine::new(
            Arc::new(InMemoryTaskRepository::new()),
            Arc::new(TeamLocks::new()),
        )
    }

    async fn engine_with_team() -> TaskEngine {
        let engine = engine();
        engine.init_team("proj", "alpha").await.unwrap();
        engine
    }

    #[tokio::test]
    async fn test_create_requires_initialized_list() {
        let engine = engine();
        assert!(matches!(
            engine.create("alpha", NewTask::new("orphan")).await,
            Err(KernelError::TaskListNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_create_assigns_sequential_ids() {
        let engine = engine_with_team().await;
        let first = engine.create("alpha", NewTask::new("one")).await.unwrap();
        let second = engine.create("alpha", NewTask::new("two")).await.unwrap();
        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(first.status, TaskStatus::Pending);
    }

    #[tokio::test]
    async fn test_claim_lifecycle() {
        let engine = engine_with_team().await;
        engine.create("alpha", NewTask::new("work")).await.unwrap();

        let claimed = engine.claim("alpha", 1, "researcher").await.unwrap();
        assert_eq!(claimed.status, TaskStatus::Claimed);
        assert_eq!(claimed.assigned_to.as_deref(), Some("researcher"));
        assert!(claimed.claimed_at.is_some());

        // Double claim reports the current status.
        let err = engine.claim("alpha", 1, "writer").await.unwrap_err();
        assert!(matches!(
            err,
            KernelError::InvalidTransition { task_id: 1, .. }
        ));
    }

    #[tokio::test]
    async fn test_claim_blocked_by_unmet_dependency() {
        let engine = engine_with_team().await;
        engine.create("alpha", NewTask::new("base")).await.unwrap();
        engine
            .create("alpha", NewTask::new("next").depends_on(vec![1]))
            .await
            .unwrap();

        let err = engine.claim("alpha", 2, "researcher").await.unwrap_err();
        match err {
            KernelError::UnmetDependency { task_id, unmet } => {
                assert_eq!(task_id, 2);
                assert_eq!(
                    unmet,
                    vec![(1, DependencyState::Unfinished(TaskStatus::Pending))]
                );
            }
            other => panic!("expected UnmetDependency, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_claim_missing_dependency_is_permanently_unmet() {
        let engine = engine_with_team().await;
        engine
            .create("alpha", NewTask::new("broken").depends_on(vec![99]))
            .await
            .unwrap();

        let err = engine.claim("alpha", 1, "researcher").await.unwrap_err();
        match err {
            KernelError::UnmetDependency { unmet, .. } => {
                assert_eq!(unmet, vec![(99, DependencyState::Missing)]);
            }
            other => panic!("expected UnmetDependency, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_self_dependency_never_claimable() {
        let engine = engine_with_team().await;
        engine
            .create("alpha", NewTask::new("snake").depends_on(vec![1]))
            .await
            .unwrap();
        assert!(engine.claim("alpha", 1, "r").await.is_err());
        assert!(engine.list_claimable("alpha").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_start_requires_claimed() {
        let engine = engine_with_team().await;
        engine.create("alpha", NewTask::new("work")).await.unwrap();

        let err = engine.start("alpha", 1).await.unwrap_err();
        match err {
            KernelError::InvalidTransition { actual, expected, .. } => {
                assert_eq!(actual, "pending");
                assert_eq!(expected, "claimed");
            }
            other => panic!("expected InvalidTransition, got {:?}", other),
        }

        engine.claim("alpha", 1, "r").await.unwrap();
        let started = engine.start("alpha", 1).await.unwrap();
        assert_eq!(started.status, TaskStatus::InProgress);
    }

    #[tokio::test]
    async fn test_complete_from_claimed_without_start() {
        let engine = engine_with_team().await;
        engine.create("alpha", NewTask::new("quick")).await.unwrap();
        engine.claim("alpha", 1, "r").await.unwrap();

        let outcome = engine.complete("alpha", 1).await.unwrap();
        assert_eq!(outcome.task.status, TaskStatus::Completed);
        assert!(outcome.task.completed_at.is_some());
        assert!(outcome.list_completed);
    }

    #[tokio::test]
    async fn test_dependency_unlock_chain() {
        // Scenario: 1 <- 2 <- 3 (3 also depends on 1).
        let engine = engine_with_team().await;
        engine.create("alpha", NewTask::new("t1")).await.unwrap();
        engine
            .create("alpha", NewTask::new("t2").depends_on(vec![1]))
            .await
            .unwrap();
        engine
            .create("alpha", NewTask::new("t3").depends_on(vec![1, 2]))
            .await
            .unwrap();

        engine.claim("alpha", 1, "r").await.unwrap();
        let outcome = engine.complete("alpha", 1).await.unwrap();
        let unlocked: Vec<u64> = outcome.unlocked.iter().map(|t| t.id).collect();
        assert_eq!(unlocked, vec![2]);
        assert!(!outcome.list_completed);

        engine.claim("alpha", 2, "r").await.unwrap();
        let outcome = engine.complete("alpha", 2).await.unwrap();
        let unlocked: Vec<u64> = outcome.unlocked.iter().map(|t| t.id).collect();
        assert_eq!(unlocked, vec![3]);

        let claimable: Vec<u64> = engine
            .list_claimable("alpha")
            .await
            .unwrap()
            .iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(claimable, vec![3]);
    }

    #[tokio::test]
    async fn test_fail_records_reason_and_keeps_dependents_pending() {
        let engine = engine_with_team().await;
        engine.create("alpha", NewTask::new("base")).await.unwrap();
        engine
            .create("alpha", NewTask::new("dependent").depends_on(vec![1]))
            .await
            .unwrap();

        engine.claim("alpha", 1, "r").await.unwrap();
        let failed = engine.fail("alpha", 1, "upstream API down").await.unwrap();
        assert_eq!(failed.status, TaskStatus::Failed);
        assert_eq!(failed.failed_reason.as_deref(), Some("upstream API down"));

        // No cascade: dependent stays pending but can never be claimed.
        let dependent = engine.get("alpha", 2).await.unwrap();
        assert_eq!(dependent.status, TaskStatus::Pending);
        assert!(engine.claim("alpha", 2, "r").await.is_err());
    }

    #[tokio::test]
    async fn test_fail_allowed_from_pending_but_not_terminal() {
        let engine = engine_with_team().await;
        engine.create("alpha", NewTask::new("doomed")).await.unwrap();
        engine.fail("alpha", 1, "cancelled early").await.unwrap();
        assert!(engine.fail("alpha", 1, "again").await.is_err());
    }

    #[tokio::test]
    async fn test_list_flips_completed_when_all_terminal() {
        let engine = engine_with_team().await;
        engine.create("alpha", NewTask::new("a")).await.unwrap();
        engine.create("alpha", NewTask::new("b")).await.unwrap();

        engine.fail("alpha", 1, "nope").await.unwrap();
        assert_eq!(
            engine.list("alpha").await.unwrap().status,
            TaskListStatus::Active
        );

        engine.claim("alpha", 2, "r").await.unwrap();
        let outcome = engine.complete("alpha", 2).await.unwrap();
        assert!(outcome.list_completed);
        assert_eq!(
            engine.list("alpha").await.unwrap().status,
            TaskListStatus::Completed
        );
    }

    #[tokio::test]
    async fn test_update_bypasses_guards() {
        let engine = engine_with_team().await;
        engine.create("alpha", NewTask::new("raw")).await.unwrap();

        let updated = engine
            .update(
                "alpha",
                1,
                TaskPatch {
                    status: Some(TaskStatus::InProgress),
                    assigned_to: Some("editor".to_string()),
                    ..TaskPatch::default()
                },
            )
            .await
            .unwrap();

        // Pending -> InProgress is not a legal transition; update allows it.
        assert_eq!(updated.status, TaskStatus::InProgress);
        assert_eq!(updated.assigned_to.as_deref(), Some("editor"));
    }

    #[tokio::test]
    async fn test_missing_task_not_found() {
        let engine = engine_with_team().await;
        assert!(matches!(
            engine.get("alpha", 42).await,
            Err(KernelError::TaskNotFound { task_id: 42, .. })
        ));
    }
}
