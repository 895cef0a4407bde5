//! Follow service integration tests, including registry coordination.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use tonic::Code;

use chirp_proto::RequestContext;
use chirp_proto::proto;
use chirp_test_utils::TestCluster;
use chirp_types::{AccountId, FollowId, Page, PairQuery};

#[tokio::test]
async fn test_follow_reserves_registry_key() {
    let cluster = TestCluster::start().await.unwrap();
    let follows = cluster.follow_client().await.unwrap();
    let registry = cluster.registry_client().await.unwrap();
    let ctx = RequestContext::new();

    let follow = follows
        .follow_account(&ctx, AccountId::new(1), AccountId::new(2))
        .await
        .unwrap();
    assert_eq!(follow.follower_id, 1);
    assert_eq!(follow.followee_id, 2);

    let pair = registry.find(&ctx, "follow", 1, 2).await.unwrap();
    assert_eq!(pair.created_at, follow.created_at);

    cluster.stop().await.unwrap();
}

#[tokio::test]
async fn test_double_follow_is_rejected_with_conflict() {
    let cluster = TestCluster::start().await.unwrap();
    let follows = cluster.follow_client().await.unwrap();
    let ctx = RequestContext::new();

    follows
        .follow_account(&ctx, AccountId::new(1), AccountId::new(2))
        .await
        .unwrap();
    let err = follows
        .follow_account(&ctx, AccountId::new(1), AccountId::new(2))
        .await
        .unwrap_err();

    assert_eq!(err.code(), Some(Code::AlreadyExists));
    assert!(err.conflicting_pair().is_some());

    // The reverse direction is a different key.
    follows
        .follow_account(&ctx, AccountId::new(2), AccountId::new(1))
        .await
        .unwrap();

    cluster.stop().await.unwrap();
}

#[tokio::test]
async fn test_delete_requires_ownership() {
    let cluster = TestCluster::start().await.unwrap();
    let follows = cluster.follow_client().await.unwrap();
    let ctx = RequestContext::new();

    let follow = follows
        .follow_account(&ctx, AccountId::new(1), AccountId::new(2))
        .await
        .unwrap();

    let err = follows
        .delete_follow(&ctx, AccountId::new(2), FollowId::new(follow.id))
        .await
        .unwrap_err();
    assert_eq!(err.code(), Some(Code::PermissionDenied));

    follows
        .delete_follow(&ctx, AccountId::new(1), FollowId::new(follow.id))
        .await
        .unwrap();

    cluster.stop().await.unwrap();
}

#[tokio::test]
async fn test_delete_releases_key_for_reuse() {
    let cluster = TestCluster::start().await.unwrap();
    let follows = cluster.follow_client().await.unwrap();
    let ctx = RequestContext::new();

    let first = follows
        .follow_account(&ctx, AccountId::new(1), AccountId::new(2))
        .await
        .unwrap();
    follows
        .delete_follow(&ctx, AccountId::new(1), FollowId::new(first.id))
        .await
        .unwrap();

    let checked = follows
        .check_follow(&ctx, AccountId::new(1), AccountId::new(2))
        .await
        .unwrap();
    assert!(!checked);
    assert_eq!(cluster.registry_store().len(), 0);

    let second = follows
        .follow_account(&ctx, AccountId::new(1), AccountId::new(2))
        .await
        .unwrap();
    assert_ne!(first.id, second.id);

    cluster.stop().await.unwrap();
}

#[tokio::test]
async fn test_delete_unknown_follow_is_not_found() {
    let cluster = TestCluster::start().await.unwrap();
    let follows = cluster.follow_client().await.unwrap();
    let ctx = RequestContext::new();

    let err = follows
        .delete_follow(&ctx, AccountId::new(1), FollowId::new(404))
        .await
        .unwrap_err();
    assert_eq!(err.code(), Some(Code::NotFound));

    cluster.stop().await.unwrap();
}

#[tokio::test]
async fn test_counts_and_check() {
    let cluster = TestCluster::start().await.unwrap();
    let follows = cluster.follow_client().await.unwrap();
    let ctx = RequestContext::new();

    follows.follow_account(&ctx, AccountId::new(1), AccountId::new(9)).await.unwrap();
    follows.follow_account(&ctx, AccountId::new(2), AccountId::new(9)).await.unwrap();
    follows.follow_account(&ctx, AccountId::new(1), AccountId::new(3)).await.unwrap();

    assert_eq!(follows.count_followers(&ctx, AccountId::new(9)).await.unwrap(), 2);
    assert_eq!(follows.count_followees(&ctx, AccountId::new(1)).await.unwrap(), 2);
    assert!(follows.check_follow(&ctx, AccountId::new(2), AccountId::new(9)).await.unwrap());
    assert!(!follows.check_follow(&ctx, AccountId::new(9), AccountId::new(2)).await.unwrap());

    cluster.stop().await.unwrap();
}

#[tokio::test]
async fn test_list_follows_is_newest_first() {
    let cluster = TestCluster::start().await.unwrap();
    let follows = cluster.follow_client().await.unwrap();
    let ctx = RequestContext::new();

    for followee in 2..=6 {
        follows
            .follow_account(&ctx, AccountId::new(1), AccountId::new(followee))
            .await
            .unwrap();
    }

    let listed = follows
        .list_follows(
            &ctx,
            proto::FollowQuery { follower_id: Some(1), followee_id: None },
            Page::ALL,
        )
        .await
        .unwrap();
    assert_eq!(listed.len(), 5);
    for window in listed.windows(2) {
        assert!(
            (window[0].created_at, window[0].id) > (window[1].created_at, window[1].id)
        );
    }

    let page = follows
        .list_follows(
            &ctx,
            proto::FollowQuery { follower_id: Some(1), followee_id: None },
            Page::new(2, 2),
        )
        .await
        .unwrap();
    assert_eq!(page.len(), 2);
    assert_eq!(page[0].id, listed[2].id);

    cluster.stop().await.unwrap();
}

#[tokio::test]
async fn test_failed_insert_compensates_registry() {
    let cluster = TestCluster::start().await.unwrap();
    let follows = cluster.follow_client().await.unwrap();
    let registry = cluster.registry_client().await.unwrap();
    let ctx = RequestContext::new();

    cluster.follow_table().fail_next_inserts(1);

    let err = follows
        .follow_account(&ctx, AccountId::new(1), AccountId::new(2))
        .await
        .unwrap_err();
    assert_eq!(err.code(), Some(Code::Internal));

    // Failure biases toward "missing": no row, and the key was released.
    assert!(cluster.follow_table().is_empty());
    assert_eq!(
        registry.count(&ctx, PairQuery::domain("follow")).await.unwrap(),
        0
    );

    // The key is usable again right away.
    follows
        .follow_account(&ctx, AccountId::new(1), AccountId::new(2))
        .await
        .unwrap();

    cluster.stop().await.unwrap();
}

#[tokio::test]
async fn test_concurrent_follows_exactly_one_wins() {
    let cluster = TestCluster::start().await.unwrap();
    let follows = cluster.follow_client().await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let follows = follows.clone();
        handles.push(tokio::spawn(async move {
            let ctx = RequestContext::new();
            follows.follow_account(&ctx, AccountId::new(5), AccountId::new(6)).await
        }));
    }

    let mut wins = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => wins += 1,
            Err(err) => assert_eq!(err.code(), Some(Code::AlreadyExists)),
        }
    }
    assert_eq!(wins, 1);
    assert_eq!(cluster.follow_table().len(), 1);
    assert_eq!(cluster.registry_store().len(), 1);

    cluster.stop().await.unwrap();
}
