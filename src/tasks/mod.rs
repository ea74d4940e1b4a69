//! Team task lists: CRUD, the claim lifecycle, and dependency unlocking.

mod engine;
mod model;
mod repo;

pub use engine::{CompleteOutcome, NewTask, TaskEngine, TaskPatch};
pub use model::{Task, TaskList, TaskListStatus, TaskStatus};
pub use repo::{FsTaskRepository, InMemoryTaskRepository, TaskRepository};
