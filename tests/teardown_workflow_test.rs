//! Destroy workflows: single assemblies, whole applications and artifact cleanup.

mod common;

use chrono::Utc;
use deployer_core::artifacts::LogStoreError;
use deployer_core::models::NewStackComponent;
use deployer_core::orchestration::{AppTeardown, DestroyOutcome};
use deployer_core::persistence::ComponentRepository;
use deployer_core::stack::{StackClientError, StackStatus};
use deployer_core::state_machine::AssemblyState;
use deployer_core::test_helpers::{descriptor, not_found, DeployerHarness, StackCall};
use tokio_test::assert_err;

async fn with_stack(harness: &DeployerHarness, assembly_id: i64, stack_id: &str) {
    harness
        .store
        .create_stack_component(NewStackComponent {
            assembly_id,
            name: format!("stack_for_{assembly_id}"),
            component_type: "orchestration_stack".to_string(),
            description: String::new(),
            resource_uri: format!("http://stacks.local/v1/stacks/{stack_id}"),
            stack_id: stack_id.to_string(),
        })
        .await
        .unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_assembly_without_stack_is_destroyed_directly() {
    let harness = DeployerHarness::new();
    let plan = harness.plan("shop");
    let assembly = harness.assembly(&plan, "shop", AssemblyState::Error);

    let outcome = harness
        .orchestrator
        .destroy_assembly(assembly.id)
        .await
        .unwrap();

    assert_eq!(outcome, DestroyOutcome::Destroyed);
    assert!(harness.stack.calls().is_empty());
    assert!(harness.store.assembly(assembly.id).is_none());
    assert_eq!(harness.logs.deleted(), vec![assembly.uuid.to_string()]);
}

#[tokio::test(start_paused = true)]
async fn test_stack_delete_waits_for_absence() {
    let harness = DeployerHarness::new();
    let plan = harness.plan("shop");
    let assembly = harness.assembly(&plan, "shop", AssemblyState::Ready);
    with_stack(&harness, assembly.id, "s1").await;

    let stack_name = assembly.stack_name();
    harness
        .stack
        .push_get(Ok(descriptor("s1", StackStatus::InProgress, &[])));
    harness
        .stack
        .push_get(Ok(descriptor("s1", StackStatus::InProgress, &[])));
    harness.stack.push_get(not_found(&stack_name));

    let outcome = harness
        .orchestrator
        .destroy_assembly(assembly.id)
        .await
        .unwrap();

    assert_eq!(outcome, DestroyOutcome::Destroyed);
    assert_eq!(
        harness.stack.calls(),
        vec![
            StackCall::Delete {
                stack_id: "s1".to_string()
            },
            StackCall::Get {
                id_or_name: stack_name.clone()
            },
            StackCall::Get {
                id_or_name: stack_name.clone()
            },
            StackCall::Get {
                id_or_name: stack_name
            },
        ]
    );
    assert!(harness.store.assembly(assembly.id).is_none());
    assert!(harness.store.stack_component(assembly.id).is_none());
}

#[tokio::test(start_paused = true)]
async fn test_stack_already_gone_counts_as_destroyed() {
    let harness = DeployerHarness::new();
    let plan = harness.plan("shop");
    let assembly = harness.assembly(&plan, "shop", AssemblyState::Ready);
    with_stack(&harness, assembly.id, "s1").await;

    harness
        .stack
        .set_delete_result(Err(StackClientError::not_found("s1")));

    let outcome = harness
        .orchestrator
        .destroy_assembly(assembly.id)
        .await
        .unwrap();

    assert_eq!(outcome, DestroyOutcome::Destroyed);
    assert_eq!(harness.stack.get_count(), 0);
    assert!(harness.store.assembly(assembly.id).is_none());
}

#[tokio::test(start_paused = true)]
async fn test_delete_rejection_retains_assembly() {
    let harness = DeployerHarness::new();
    let plan = harness.plan("shop");
    let assembly = harness.assembly(&plan, "shop", AssemblyState::Ready);
    with_stack(&harness, assembly.id, "s1").await;

    harness
        .stack
        .set_delete_result(Err(StackClientError::request_failed("backend unavailable")));

    let outcome = harness
        .orchestrator
        .destroy_assembly(assembly.id)
        .await
        .unwrap();

    assert_eq!(
        outcome,
        DestroyOutcome::Retained {
            status: AssemblyState::ErrorStackDeleteFailed
        }
    );
    assert_eq!(
        harness.status_of(assembly.id),
        Some(AssemblyState::ErrorStackDeleteFailed)
    );
    assert!(harness.store.stack_component(assembly.id).is_some());
    assert!(harness.logs.deleted().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_stack_that_never_disappears_retains_assembly() {
    let harness = DeployerHarness::new();
    let plan = harness.plan("shop");
    let assembly = harness.assembly(&plan, "shop", AssemblyState::Ready);
    with_stack(&harness, assembly.id, "s1").await;

    let outcome = harness
        .orchestrator
        .destroy_assembly(assembly.id)
        .await
        .unwrap();

    assert_eq!(
        outcome,
        DestroyOutcome::Retained {
            status: AssemblyState::ErrorStackDeleteFailed
        }
    );
    assert_eq!(
        harness.stack.get_count(),
        harness.config.deployer.max_attempts as usize
    );
    assert!(harness.store.assembly(assembly.id).is_some());
}

#[tokio::test(start_paused = true)]
async fn test_destroy_removes_deployment_unit_and_image() {
    let harness = DeployerHarness::new();
    let plan = harness.plan("shop");
    let image = harness
        .store
        .create_image("shop", Some("tenant-shop-du.tar".to_string()));
    let assembly = harness.store.create_assembly(
        plan.id,
        "shop",
        AssemblyState::Ready,
        Some(image.id),
        Utc::now(),
    );
    harness.objects.put("deployment_units", "shop-du.tar");

    let outcome = harness
        .orchestrator
        .destroy_assembly(assembly.id)
        .await
        .unwrap();

    assert_eq!(outcome, DestroyOutcome::Destroyed);
    assert!(!harness.objects.contains("deployment_units", "shop-du.tar"));
    assert_eq!(
        harness.objects.deleted(),
        vec![("deployment_units".to_string(), "shop-du.tar".to_string())]
    );
    assert!(harness.store.image(image.id).is_none());
    assert_eq!(harness.logs.deleted(), vec![assembly.uuid.to_string()]);
}

#[tokio::test(start_paused = true)]
async fn test_object_store_failure_keeps_image_but_destroys_record() {
    let harness = DeployerHarness::new();
    let plan = harness.plan("shop");
    let image = harness
        .store
        .create_image("shop", Some("tenant-shop-du.tar".to_string()));
    let assembly = harness.store.create_assembly(
        plan.id,
        "shop",
        AssemblyState::Ready,
        Some(image.id),
        Utc::now(),
    );
    harness.objects.fail_with("object store unavailable");

    let outcome = harness
        .orchestrator
        .destroy_assembly(assembly.id)
        .await
        .unwrap();

    assert_eq!(outcome, DestroyOutcome::Destroyed);
    assert!(harness.store.assembly(assembly.id).is_none());
    assert!(harness.store.image(image.id).is_some());
    assert!(harness.logs.deleted().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_log_authorization_failure_is_tolerated() {
    let harness = DeployerHarness::new();
    let plan = harness.plan("shop");
    let assembly = harness.assembly(&plan, "shop", AssemblyState::Ready);
    harness
        .logs
        .fail_with(LogStoreError::AuthorizationFailure("token expired".to_string()));

    let outcome = harness
        .orchestrator
        .destroy_assembly(assembly.id)
        .await
        .unwrap();

    assert_eq!(outcome, DestroyOutcome::Destroyed);
    assert!(harness.store.assembly(assembly.id).is_none());
}

#[tokio::test(start_paused = true)]
async fn test_destroy_unknown_assembly_is_an_error() {
    let harness = DeployerHarness::new();

    assert_err!(harness.orchestrator.destroy_assembly(404).await);
    assert!(harness.stack.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_destroy_app_tears_down_every_assembly_and_plan() {
    let harness = DeployerHarness::new();
    let plan = harness.plan("shop");
    let other_plan = harness.plan("blog");

    let plain = harness.assembly(&plan, "shop-v1", AssemblyState::Ready);
    let stuck = harness.assembly(&plan, "shop-v2", AssemblyState::Ready);
    let unrelated = harness.assembly(&other_plan, "blog", AssemblyState::Ready);
    with_stack(&harness, stuck.id, "stuck-stack").await;

    harness
        .stack
        .set_delete_result(Err(StackClientError::request_failed("backend unavailable")));

    let teardown = harness.orchestrator.destroy_app(plan.id).await.unwrap();

    assert_eq!(
        teardown,
        AppTeardown {
            destroyed: vec![plain.id],
            retained: vec![stuck.id],
        }
    );
    assert!(harness.store.plan(plan.id).is_none());
    assert!(harness.store.assembly(plain.id).is_none());
    assert_eq!(
        harness.status_of(stuck.id),
        Some(AssemblyState::ErrorStackDeleteFailed)
    );
    assert_eq!(harness.status_of(unrelated.id), Some(AssemblyState::Ready));
    assert!(harness.store.plan(other_plan.id).is_some());
}
