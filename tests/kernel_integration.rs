//! End-to-end coordination flows through the kernel facade: spawn
//! authorization, dependency unlocking, mailboxes, and memory gating.

use std::collections::HashMap;
use std::sync::Arc;

use tempfile::TempDir;

use crew_kernel::hierarchy::validate_reporting_chains;
use crew_kernel::tasks::{FsTaskRepository, InMemoryTaskRepository, TaskRepository};
use crew_kernel::{
    can_spawn, AgentNode, AgentTier, Kernel, KernelConfig, KernelError, MemberSpec, MemoryAccess,
    MemoryOp, MemoryScope, NewTask, ProjectLayout, SpawnDecision, SpawnRequest, SpawnViolation,
    TaskEngine, TaskStatus, TeamTemplate, TemplateDefaults,
};

fn research_template() -> TeamTemplate {
    TeamTemplate {
        id: "research".to_string(),
        team_name: "research-team".to_string(),
        team_lead: MemberSpec::new("research-lead"),
        teammates: vec![MemberSpec::new("researcher"), MemberSpec::new("writer")],
        defaults: TemplateDefaults::default(),
    }
}

fn build_kernel(dir: &TempDir) -> Kernel {
    let agents = vec![
        AgentNode::new("gm").with_tier(AgentTier::GeneralManager),
        AgentNode::new("ops")
            .with_tier(AgentTier::Operations)
            .with_reports_to("gm"),
        AgentNode::new("mgr-1")
            .with_tier(AgentTier::Manager)
            .with_reports_to("gm"),
    ];
    let sets = HashMap::from([("mgr-1".to_string(), vec!["research".to_string()])]);
    let config = KernelConfig::new(
        dir.path().join("workspace"),
        agents,
        vec![research_template()],
        sets,
    )
    .unwrap();
    Kernel::new(config, dir.path().join("projects"))
}

#[tokio::test]
async fn scenario_dependency_unlock_chain() {
    // Tasks 1, 2<-[1], 3<-[1,2]: completing 1 unlocks 2, completing 2
    // unlocks 3.
    let dir = TempDir::new().unwrap();
    let kernel = build_kernel(&dir);
    kernel.create_project("proj-1", "brief").await.unwrap();
    kernel.init_team("proj-1", "research-team").await.unwrap();

    let tasks = kernel.tasks("proj-1");
    tasks
        .create("research-team", NewTask::new("one"))
        .await
        .unwrap();
    tasks
        .create("research-team", NewTask::new("two").depends_on(vec![1]))
        .await
        .unwrap();
    tasks
        .create("research-team", NewTask::new("three").depends_on(vec![1, 2]))
        .await
        .unwrap();

    let claimable: Vec<u64> = tasks
        .list_claimable("research-team")
        .await
        .unwrap()
        .iter()
        .map(|t| t.id)
        .collect();
    assert_eq!(claimable, vec![1]);

    tasks.claim("research-team", 1, "researcher").await.unwrap();
    let outcome = tasks.complete("research-team", 1).await.unwrap();
    let unlocked: Vec<u64> = outcome.unlocked.iter().map(|t| t.id).collect();
    assert_eq!(unlocked, vec![2]);

    tasks.claim("research-team", 2, "writer").await.unwrap();
    tasks.start("research-team", 2).await.unwrap();
    let outcome = tasks.complete("research-team", 2).await.unwrap();
    let unlocked: Vec<u64> = outcome.unlocked.iter().map(|t| t.id).collect();
    assert_eq!(unlocked, vec![3]);
}

#[tokio::test]
async fn scenario_broadcast_read_tracking() {
    let dir = TempDir::new().unwrap();
    let kernel = build_kernel(&dir);
    kernel.create_project("proj-1", "brief").await.unwrap();
    kernel.init_team("proj-1", "research-team").await.unwrap();

    let mailbox = kernel.mailbox("proj-1", "research-team");
    mailbox.broadcast("lead", "go").await.unwrap();

    // The sender never receives its own broadcast.
    assert!(mailbox.read_unread("lead").await.unwrap().is_empty());

    let unread = mailbox.read_unread("researcher").await.unwrap();
    assert_eq!(unread.len(), 1);
    assert_eq!(unread[0].body, "go");

    // Delivery marked it read; the second call is empty.
    assert!(mailbox.read_unread("researcher").await.unwrap().is_empty());
}

#[tokio::test]
async fn scenario_hierarchy_violation_beats_containment() {
    let dir = TempDir::new().unwrap();
    let kernel = build_kernel(&dir);
    kernel.scaffold_team("mgr-1", "research").await.unwrap();

    // Folders exist, but a team lead can never spawn a manager.
    let decision = kernel
        .authorize_spawn(&SpawnRequest {
            requester_id: "some-lead".to_string(),
            requester_tier: Some(AgentTier::TeamLead),
            target_tier: Some(AgentTier::Manager),
            target_role: "mgr-2".to_string(),
            manager_id: "mgr-1".to_string(),
            lead_role: None,
        })
        .await;

    assert_eq!(
        decision,
        SpawnDecision::Forbidden(SpawnViolation::Hierarchy {
            requester_tier: AgentTier::TeamLead,
            target_tier: AgentTier::Manager,
        })
    );
}

#[tokio::test]
async fn scenario_containment_violation_despite_legal_tiers() {
    let dir = TempDir::new().unwrap();
    let kernel = build_kernel(&dir);

    let decision = kernel
        .authorize_spawn(&SpawnRequest {
            requester_id: "mgr-1".to_string(),
            requester_tier: Some(AgentTier::Manager),
            target_tier: Some(AgentTier::TeamLead),
            target_role: "x".to_string(),
            manager_id: "mgr-1".to_string(),
            lead_role: None,
        })
        .await;

    match decision {
        SpawnDecision::Forbidden(SpawnViolation::Containment { expected_dir }) => {
            assert!(expected_dir.contains("mgr-1"));
            assert!(expected_dir.ends_with("teamleads/x"));
        }
        other => panic!("expected containment violation, got {:?}", other),
    }
}

#[tokio::test]
async fn scenario_circular_reporting_chain_fails_load() {
    let agents = vec![
        AgentNode::new("a").with_reports_to("b"),
        AgentNode::new("b").with_reports_to("a"),
    ];
    let err = validate_reporting_chains(&agents).unwrap_err();
    assert!(matches!(err, KernelError::ConfigIntegrity(_)));
    assert!(err.to_string().contains("Circular"));

    // The same agents can never form a config snapshot.
    assert!(KernelConfig::new("/tmp/ws", agents, vec![], HashMap::new()).is_err());
}

#[test]
fn no_tier_can_spawn_itself() {
    for tier in AgentTier::ALL {
        assert!(!can_spawn(Some(tier), Some(tier)));
    }
}

#[test]
fn memory_matrix_spot_checks() {
    assert_eq!(
        crew_kernel::access(Some(AgentTier::Operations), MemoryScope::ProjectShared, true),
        MemoryAccess::Read
    );
    assert_eq!(
        crew_kernel::access(Some(AgentTier::Teammate), MemoryScope::Team, false),
        MemoryAccess::None
    );
    assert_eq!(
        crew_kernel::access(Some(AgentTier::TeamLead), MemoryScope::Team, true),
        MemoryAccess::Write
    );
}

#[tokio::test]
async fn memory_checks_through_facade() {
    let dir = TempDir::new().unwrap();
    let kernel = build_kernel(&dir);

    assert!(
        kernel
            .check_memory("ops", MemoryScope::Company, MemoryOp::Write, false)
            .allowed
    );
    let denied = kernel.check_memory("ops", MemoryScope::ProjectShared, MemoryOp::Write, false);
    assert!(!denied.allowed);
    assert!(denied.reason.is_some());
}

#[tokio::test]
async fn scaffolding_twice_leaves_file_set_unchanged() {
    let dir = TempDir::new().unwrap();
    let kernel = build_kernel(&dir);

    let created = kernel.scaffold_team("mgr-1", "research").await.unwrap();
    assert_eq!(created.len(), 3);

    let again = kernel.scaffold_team("mgr-1", "research").await.unwrap();
    assert!(again.is_empty());
}

#[tokio::test]
async fn task_list_round_trips_through_disk() {
    let dir = TempDir::new().unwrap();
    let repo = FsTaskRepository::new(ProjectLayout::new(dir.path().join("proj")));
    repo.init("proj", "alpha").await.unwrap();

    let engine = TaskEngine::new(Arc::new(repo), Arc::new(crew_kernel::sync::TeamLocks::new()));
    engine
        .create("alpha", NewTask::new("a").depends_on(vec![]))
        .await
        .unwrap();
    engine
        .create("alpha", NewTask::new("b").depends_on(vec![1]))
        .await
        .unwrap();
    engine.claim("alpha", 1, "r").await.unwrap();

    let saved = engine.list("alpha").await.unwrap();
    let reread = FsTaskRepository::new(ProjectLayout::new(dir.path().join("proj")))
        .load("alpha")
        .await
        .unwrap();
    assert_eq!(saved, reread);
}

/// Exhaustive claim check over a synthetic graph: claim succeeds iff the
/// task is pending and every dependency id maps to a completed task,
/// including missing and self-referential ids.
#[tokio::test]
async fn claim_iff_pending_with_completed_dependencies() {
    let repo = Arc::new(InMemoryTaskRepository::new());
    let engine = TaskEngine::new(
        Arc::clone(&repo) as Arc<dyn TaskRepository>,
        Arc::new(crew_kernel::sync::TeamLocks::new()),
    );
    engine.init_team("proj", "alpha").await.unwrap();

    // 1: completed; 2: failed; 3: pending.
    engine.create("alpha", NewTask::new("done")).await.unwrap();
    engine.create("alpha", NewTask::new("failed")).await.unwrap();
    engine.create("alpha", NewTask::new("pending")).await.unwrap();
    engine.claim("alpha", 1, "r").await.unwrap();
    engine.complete("alpha", 1).await.unwrap();
    engine.claim("alpha", 2, "r").await.unwrap();
    engine.fail("alpha", 2, "broken").await.unwrap();

    let cases: Vec<(Vec<u64>, bool)> = vec![
        (vec![], true),
        (vec![1], true),
        (vec![2], false),        // failed dependency
        (vec![3], false),        // pending dependency
        (vec![1, 2], false),     // one bad dependency poisons the set
        (vec![99], false),       // missing id is permanently unmet
        (vec![1, 99], false),
    ];

    for (deps, expect_ok) in cases {
        let task = engine
            .create("alpha", NewTask::new("probe").depends_on(deps.clone()))
            .await
            .unwrap();
        let result = engine.claim("alpha", task.id, "prober").await;
        assert_eq!(
            result.is_ok(),
            expect_ok,
            "deps {:?} expected ok={}",
            deps,
            expect_ok
        );
        if let Err(err) = result {
            assert!(matches!(err, KernelError::UnmetDependency { .. }));
        }
    }

    // Self-referential dependency can never be claimed.
    let list = engine.list("alpha").await.unwrap();
    let self_id = list.next_id();
    let task = engine
        .create("alpha", NewTask::new("self").depends_on(vec![self_id]))
        .await
        .unwrap();
    assert_eq!(task.id, self_id);
    assert!(engine.claim("alpha", self_id, "r").await.is_err());

    // Claiming a non-pending task fails regardless of dependencies.
    let claimed = engine
        .create("alpha", NewTask::new("taken").depends_on(vec![1]))
        .await
        .unwrap();
    engine.claim("alpha", claimed.id, "r").await.unwrap();
    assert!(matches!(
        engine.claim("alpha", claimed.id, "other").await,
        Err(KernelError::InvalidTransition { .. })
    ));
}

#[tokio::test]
async fn failed_tasks_block_dependents_without_cascading() {
    let dir = TempDir::new().unwrap();
    let kernel = build_kernel(&dir);
    kernel.create_project("proj-1", "brief").await.unwrap();
    kernel.init_team("proj-1", "research-team").await.unwrap();

    let tasks = kernel.tasks("proj-1");
    tasks
        .create("research-team", NewTask::new("base"))
        .await
        .unwrap();
    tasks
        .create("research-team", NewTask::new("child").depends_on(vec![1]))
        .await
        .unwrap();

    tasks.fail("research-team", 1, "no data").await.unwrap();

    let child = tasks.get("research-team", 2).await.unwrap();
    assert_eq!(child.status, TaskStatus::Pending);
    assert!(tasks.list_claimable("research-team").await.unwrap().is_empty());
}
