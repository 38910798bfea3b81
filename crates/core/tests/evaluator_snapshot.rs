//! Integration tests for evaluator construction from a repository.

mod support;

use flagbit_core::{EvaluationContext, FeatureBitEvaluator, FeatureBitRepository};
use flagbit_domain::FlagbitError;
use support::{definition, MockFeatureBitRepository};

#[tokio::test(flavor = "multi_thread")]
async fn snapshot_is_loaded_once_at_construction() {
    let mut on = definition(1, "on");
    on.on_off = true;
    let repo = MockFeatureBitRepository::new(vec![on, definition(2, "off")]);

    let evaluator = FeatureBitEvaluator::from_repository(&repo, EvaluationContext::default())
        .await
        .expect("snapshot loads");

    assert_eq!(evaluator.definitions().len(), 2);
    assert!(evaluator.is_enabled(1).expect("feature 1 exists"));
    assert!(!evaluator.is_enabled(2).expect("feature 2 exists"));

    // Definitions added after construction are invisible to the snapshot.
    let mut late = definition(0, "late");
    late.on_off = true;
    repo.add(late).await.expect("add succeeds");
    let err = evaluator.is_enabled(3).expect_err("snapshot does not refresh");
    assert!(matches!(err, FlagbitError::NotFound(_)));
}

#[tokio::test(flavor = "multi_thread")]
async fn dependency_chain_is_resolved_against_the_snapshot() {
    let mut parent = definition(1, "parent");
    parent.on_off = true;
    parent.dependencies = Some("child".into());
    let mut child = definition(2, "child");
    child.minimum_allowed_permission_level = 20;
    let repo = MockFeatureBitRepository::new(vec![parent, child]);

    let evaluator = FeatureBitEvaluator::from_repository(&repo, EvaluationContext::default())
        .await
        .expect("snapshot loads");

    assert!(!evaluator.is_enabled_with_permission(1, 10).expect("feature exists"));
    assert!(evaluator.is_enabled_with_permission(1, 20).expect("feature exists"));
}
