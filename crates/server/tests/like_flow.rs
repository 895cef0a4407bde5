//! Like service integration tests.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use tonic::Code;

use chirp_proto::RequestContext;
use chirp_proto::proto;
use chirp_test_utils::TestCluster;
use chirp_types::{AccountId, LikeId, Page, PairQuery, PostId};

#[tokio::test]
async fn test_like_unlike_relike() {
    let cluster = TestCluster::start().await.unwrap();
    let likes = cluster.like_client().await.unwrap();
    let ctx = RequestContext::new();

    let like = likes.like_post(&ctx, AccountId::new(1), PostId::new(70)).await.unwrap();
    assert!(likes.check_like(&ctx, AccountId::new(1), PostId::new(70)).await.unwrap());

    let err = likes
        .like_post(&ctx, AccountId::new(1), PostId::new(70))
        .await
        .unwrap_err();
    assert_eq!(err.code(), Some(Code::AlreadyExists));

    likes
        .delete_like(&ctx, AccountId::new(1), LikeId::new(like.id))
        .await
        .unwrap();
    assert!(!likes.check_like(&ctx, AccountId::new(1), PostId::new(70)).await.unwrap());

    let again = likes.like_post(&ctx, AccountId::new(1), PostId::new(70)).await.unwrap();
    assert_ne!(again.id, like.id);

    cluster.stop().await.unwrap();
}

#[tokio::test]
async fn test_unlike_requires_owner() {
    let cluster = TestCluster::start().await.unwrap();
    let likes = cluster.like_client().await.unwrap();
    let ctx = RequestContext::new();

    let like = likes.like_post(&ctx, AccountId::new(1), PostId::new(70)).await.unwrap();
    let err = likes
        .delete_like(&ctx, AccountId::new(2), LikeId::new(like.id))
        .await
        .unwrap_err();
    assert_eq!(err.code(), Some(Code::PermissionDenied));

    cluster.stop().await.unwrap();
}

#[tokio::test]
async fn test_like_counts() {
    let cluster = TestCluster::start().await.unwrap();
    let likes = cluster.like_client().await.unwrap();
    let ctx = RequestContext::new();

    likes.like_post(&ctx, AccountId::new(1), PostId::new(70)).await.unwrap();
    likes.like_post(&ctx, AccountId::new(1), PostId::new(71)).await.unwrap();
    likes.like_post(&ctx, AccountId::new(2), PostId::new(70)).await.unwrap();

    assert_eq!(likes.count_likes_by_account(&ctx, AccountId::new(1)).await.unwrap(), 2);
    assert_eq!(likes.count_likes_of_post(&ctx, PostId::new(70)).await.unwrap(), 2);
    assert_eq!(likes.count_likes_of_post(&ctx, PostId::new(99)).await.unwrap(), 0);

    cluster.stop().await.unwrap();
}

#[tokio::test]
async fn test_list_likes_filters_and_pages() {
    let cluster = TestCluster::start().await.unwrap();
    let likes = cluster.like_client().await.unwrap();
    let ctx = RequestContext::new();

    for post in 1..=4 {
        likes.like_post(&ctx, AccountId::new(1), PostId::new(post)).await.unwrap();
    }
    likes.like_post(&ctx, AccountId::new(2), PostId::new(1)).await.unwrap();

    let mine = likes
        .list_likes(
            &ctx,
            proto::LikeQuery { account_id: Some(1), post_id: None },
            Page::ALL,
        )
        .await
        .unwrap();
    assert_eq!(mine.len(), 4);
    assert!(mine.iter().all(|l| l.account_id == 1));

    let window = likes
        .list_likes(
            &ctx,
            proto::LikeQuery { account_id: Some(1), post_id: None },
            Page::new(2, 1),
        )
        .await
        .unwrap();
    assert_eq!(window.len(), 2);
    assert_eq!(window[0].id, mine[1].id);

    cluster.stop().await.unwrap();
}

#[tokio::test]
async fn test_follow_and_like_domains_are_disjoint() {
    let cluster = TestCluster::start().await.unwrap();
    let follows = cluster.follow_client().await.unwrap();
    let likes = cluster.like_client().await.unwrap();
    let registry = cluster.registry_client().await.unwrap();
    let ctx = RequestContext::new();

    // Same numeric key in both domains; neither blocks the other.
    follows
        .follow_account(&ctx, chirp_types::AccountId::new(1), chirp_types::AccountId::new(2))
        .await
        .unwrap();
    likes.like_post(&ctx, AccountId::new(1), PostId::new(2)).await.unwrap();

    assert_eq!(registry.count(&ctx, PairQuery::domain("follow")).await.unwrap(), 1);
    assert_eq!(registry.count(&ctx, PairQuery::domain("like")).await.unwrap(), 1);

    cluster.stop().await.unwrap();
}

#[tokio::test]
async fn test_failed_like_insert_compensates_registry() {
    let cluster = TestCluster::start().await.unwrap();
    let likes = cluster.like_client().await.unwrap();
    let ctx = RequestContext::new();

    cluster.like_table().fail_next_inserts(1);

    let err = likes
        .like_post(&ctx, AccountId::new(1), PostId::new(70))
        .await
        .unwrap_err();
    assert_eq!(err.code(), Some(Code::Internal));
    assert!(cluster.like_table().is_empty());
    assert_eq!(cluster.registry_store().len(), 0);

    likes.like_post(&ctx, AccountId::new(1), PostId::new(70)).await.unwrap();

    cluster.stop().await.unwrap();
}
