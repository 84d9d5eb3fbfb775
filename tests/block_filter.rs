mod common;

use common::harness;
use matchmaking_core::domain::entities::{SendMessageCommand, UserSearchCriteria};

#[tokio::test]
async fn blocked_users_disappear_from_listings_until_unblocked() {
    let h = harness().await;
    let viewer = h.register("Viewer").await;
    let blocked = h.register("Blocked").await;
    let other = h.register("Other").await;
    let users = &h.state.user_service;
    let blocks = &h.state.block_filter;

    blocks.block_user(viewer.id, blocked.id).await.unwrap();

    let listed: Vec<_> = users
        .list_users(None, Some(viewer.id))
        .await
        .unwrap()
        .into_iter()
        .map(|user| user.id)
        .collect();
    assert!(!listed.contains(&blocked.id));
    assert!(listed.contains(&other.id));

    // 逆方向からも見えない
    let from_blocked: Vec<_> = users
        .search(&UserSearchCriteria::default(), Some(blocked.id))
        .await
        .unwrap()
        .into_iter()
        .map(|user| user.id)
        .collect();
    assert!(!from_blocked.contains(&viewer.id));

    let blocked_list = blocks.list_blocked_users(viewer.id).await.unwrap();
    assert_eq!(blocked_list.len(), 1);
    assert_eq!(blocked_list[0].id, blocked.id);

    blocks.unblock_user(viewer.id, blocked.id).await.unwrap();
    assert!(users
        .list_users(None, Some(viewer.id))
        .await
        .unwrap()
        .iter()
        .any(|user| user.id == blocked.id));
}

#[tokio::test]
async fn blocking_rules() {
    let h = harness().await;
    let a = h.register("A").await;
    let b = h.register("B").await;
    let blocks = &h.state.block_filter;

    assert_eq!(blocks.block_user(a.id, a.id).await.unwrap_err().code(), "VALIDATION");
    blocks.block_user(a.id, b.id).await.unwrap();
    assert_eq!(blocks.block_user(a.id, b.id).await.unwrap_err().code(), "CONFLICT");
    assert!(blocks.is_blocked_either_way(b.id, a.id).await.unwrap());
    assert!(!blocks.is_blocked(b.id, a.id).await.unwrap());

    blocks.unblock_user(a.id, b.id).await.unwrap();
    assert_eq!(blocks.unblock_user(a.id, b.id).await.unwrap_err().code(), "NOT_FOUND");
}

#[tokio::test]
async fn block_removes_favourite_and_hides_history() {
    let h = harness().await;
    let a = h.register("A").await;
    let b = h.register("B").await;
    let gold = h.plan("Gold", None, false).await;
    h.subscribe(&a, &gold).await;
    h.subscribe(&b, &gold).await;
    h.connect(&a, &b).await;
    h.state
        .chat_service
        .send_message(SendMessageCommand::new(a.id, b.id, "hi"))
        .await
        .unwrap();
    h.state.favourite_service.add_favourite(a.id, b.id).await.unwrap();

    h.state.block_filter.block_user(a.id, b.id).await.unwrap();

    assert!(h.state.favourite_service.get_favourites(a.id).await.unwrap().is_empty());
    assert_eq!(
        h.state
            .favourite_service
            .remove_favourite(a.id, b.id)
            .await
            .unwrap_err()
            .code(),
        "NOT_FOUND"
    );
    assert!(h.state.chat_service.get_messages_for_user(b.id).await.unwrap().is_empty());
    assert!(h
        .state
        .chat_request_service
        .get_all_requests_for_user(a.id)
        .await
        .unwrap()
        .is_empty());

    // 解除すれば履歴は元どおり見える
    h.state.block_filter.unblock_user(a.id, b.id).await.unwrap();
    let history = h.state.chat_service.get_messages_for_user(b.id).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].sender_id, a.id);
    let requests = h
        .state
        .chat_request_service
        .get_all_requests_for_user(a.id)
        .await
        .unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].receiver_id, b.id);
}
