pub mod bootstrap;
pub mod config;
pub mod containment;
pub mod error;
pub mod hierarchy;
pub mod kernel;
pub mod layout;
pub mod mailbox;
pub mod memory;
pub mod project;
pub mod spawn;
pub mod sync;
pub mod tasks;

pub use bootstrap::{BootstrapFile, BootstrapQuery, BootstrapResolver, BootstrapSource};
pub use config::{KernelConfig, MemberSpec, TaskClaiming, TeamTemplate, TemplateDefaults};
pub use error::{DependencyState, KernelError, Result};
pub use hierarchy::{can_spawn, AgentNode, AgentTier};
pub use kernel::Kernel;
pub use layout::{ProjectLayout, WorkspaceLayout};
pub use mailbox::{Mailbox, MailboxMessage, BROADCAST_RECIPIENT};
pub use memory::{access, MemoryAccess, MemoryDecision, MemoryOp, MemoryScope};
pub use project::{Project, ProjectStatus, ProjectStore};
pub use spawn::{SpawnDecision, SpawnRequest, SpawnViolation};
pub use tasks::{
    CompleteOutcome, NewTask, Task, TaskEngine, TaskList, TaskListStatus, TaskPatch, TaskStatus,
};
