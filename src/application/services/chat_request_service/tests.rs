use super::*;
use crate::application::ports::PushNotifier;
use crate::application::ports::repositories::{BlockRepository, NotificationRepository};
use crate::domain::entities::{
    Block, ChatRequestStatus, NewNotification, NewUser, Notification, Role, UserSearchCriteria,
};
use crate::domain::value_objects::NotificationId;
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use mockall::mock;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Semaphore, mpsc};

mock! {
    pub Requests {}

    #[async_trait]
    impl ChatRequestRepository for Requests {
        async fn create_request(&self, request: &NewChatRequest) -> Result<ChatRequest, AppError>;
        async fn get_request(&self, id: ChatRequestId) -> Result<Option<ChatRequest>, AppError>;
        async fn find_between(&self, a: UserId, b: UserId) -> Result<Option<ChatRequest>, AppError>;
        async fn exists_accepted_between(&self, a: UserId, b: UserId) -> Result<bool, AppError>;
        async fn accept_pending(
            &self,
            id: ChatRequestId,
            updated_at: DateTime<Utc>,
        ) -> Result<Option<ChatRequest>, AppError>;
        async fn delete_pending(
            &self,
            id: ChatRequestId,
            cleanups: &[NotificationCleanup],
        ) -> Result<bool, AppError>;
        async fn list_pending_for_receiver(&self, user_id: UserId) -> Result<Vec<ChatRequest>, AppError>;
        async fn list_for_user(&self, user_id: UserId) -> Result<Vec<ChatRequest>, AppError>;
    }
}

mock! {
    pub Users {}

    #[async_trait]
    impl UserRepository for Users {
        async fn create_user(&self, user: &NewUser, created_at: DateTime<Utc>) -> Result<User, AppError>;
        async fn get_user(&self, id: UserId) -> Result<Option<User>, AppError>;
        async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
        async fn list_users(&self, gender: Option<String>) -> Result<Vec<User>, AppError>;
        async fn search_users(&self, criteria: &UserSearchCriteria) -> Result<Vec<User>, AppError>;
        async fn update_fcm_token(&self, id: UserId, token: Option<String>) -> Result<bool, AppError>;
        async fn delete_user_cascade(&self, id: UserId) -> Result<bool, AppError>;
    }
}

mock! {
    pub Notifications {}

    #[async_trait]
    impl NotificationRepository for Notifications {
        async fn create_notification(&self, notification: &NewNotification) -> Result<Notification, AppError>;
        async fn list_for_recipient(&self, recipient_id: UserId, unread_only: bool) -> Result<Vec<Notification>, AppError>;
        async fn count_unread(&self, recipient_id: UserId) -> Result<u64, AppError>;
        async fn mark_read(&self, id: NotificationId, recipient_id: UserId) -> Result<bool, AppError>;
        async fn mark_all_read(&self, recipient_id: UserId) -> Result<u64, AppError>;
        async fn delete_notification(&self, id: NotificationId) -> Result<bool, AppError>;
    }
}

mock! {
    pub Blocks {}

    #[async_trait]
    impl BlockRepository for Blocks {
        async fn create_block(
            &self,
            blocker_id: UserId,
            blocked_id: UserId,
            created_at: DateTime<Utc>,
        ) -> Result<Block, AppError>;
        async fn delete_block(&self, blocker_id: UserId, blocked_id: UserId) -> Result<bool, AppError>;
        async fn is_blocked(&self, blocker_id: UserId, blocked_id: UserId) -> Result<bool, AppError>;
        async fn list_blocked(&self, blocker_id: UserId) -> Result<Vec<Block>, AppError>;
        async fn hidden_user_ids(&self, viewer: UserId) -> Result<HashSet<UserId>, AppError>;
    }
}

mock! {
    pub Dispatcher {}

    #[async_trait]
    impl RealtimeDispatcher for Dispatcher {
        async fn send(
            &self,
            target: UserId,
            topic: RealtimeTopic,
            payload: serde_json::Value,
        ) -> Result<(), AppError>;
    }
}

mock! {
    pub Push {}

    #[async_trait]
    impl PushNotifier for Push {
        async fn send(
            &self,
            device_token: &str,
            title: &str,
            body: &str,
            data: &HashMap<String, String>,
        ) -> Result<(), AppError>;
    }
}

/// `gate` に許可が入るまで送信を止め、送れた端末トークンを流す。
struct GatedPush {
    gate: Arc<Semaphore>,
    delivered: mpsc::UnboundedSender<String>,
}

#[async_trait]
impl PushNotifier for GatedPush {
    async fn send(
        &self,
        device_token: &str,
        _title: &str,
        _body: &str,
        _data: &HashMap<String, String>,
    ) -> Result<(), AppError> {
        let _permit = self
            .gate
            .acquire()
            .await
            .map_err(|err| AppError::Delivery(err.to_string()))?;
        let _ = self.delivered.send(device_token.to_string());
        Ok(())
    }
}

struct FixedClock(DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap()
}

fn user(id: i64, name: &str) -> User {
    User {
        id: UserId::new(id),
        name: name.to_string(),
        email: format!("{}@example.com", name.to_lowercase()),
        role: Role::User,
        gender: None,
        age: None,
        religion: None,
        city_town: None,
        fcm_token: Some(format!("token-{id}")),
        created_at: now(),
    }
}

fn request(status: ChatRequestStatus) -> ChatRequest {
    ChatRequest {
        id: ChatRequestId::new(10),
        sender_id: UserId::new(1),
        receiver_id: UserId::new(2),
        status,
        created_at: now(),
        updated_at: now(),
    }
}

fn users_with_alice_and_bob() -> MockUsers {
    let mut users = MockUsers::new();
    users.expect_get_user().returning(|id| {
        Ok(match id.as_i64() {
            1 => Some(user(1, "Alice")),
            2 => Some(user(2, "Bob")),
            _ => None,
        })
    });
    users
}

fn echo_notifications() -> MockNotifications {
    let mut notifications = MockNotifications::new();
    notifications
        .expect_create_notification()
        .returning(|new| {
            Ok(Notification {
                id: NotificationId::new(1),
                notification_type: new.notification_type,
                message: new.message.clone(),
                recipient_id: new.recipient_id,
                related_user_id: new.related_user_id,
                is_read: false,
                created_at: new.created_at,
            })
        });
    notifications
}

fn build_service(
    requests: MockRequests,
    users: MockUsers,
    notifications: MockNotifications,
    dispatcher: MockDispatcher,
    push: MockPush,
) -> ChatRequestService {
    build_service_with_push(requests, users, notifications, dispatcher, Arc::new(push))
}

fn build_service_with_push(
    requests: MockRequests,
    users: MockUsers,
    notifications: MockNotifications,
    dispatcher: MockDispatcher,
    push: Arc<dyn PushNotifier>,
) -> ChatRequestService {
    let users: Arc<dyn UserRepository> = Arc::new(users);
    let dispatcher: Arc<dyn RealtimeDispatcher> = Arc::new(dispatcher);
    let clock: Arc<dyn Clock> = Arc::new(FixedClock(now()));
    let notification_service = Arc::new(NotificationService::new(
        Arc::new(notifications),
        Arc::clone(&users),
        Arc::clone(&dispatcher),
        push,
        Arc::clone(&clock),
        "Matchmaking",
    ));
    let block_filter = Arc::new(BlockFilter::new(
        Arc::new(MockBlocks::new()),
        Arc::clone(&users),
        Arc::clone(&clock),
    ));
    ChatRequestService::new(
        Arc::new(requests),
        users,
        notification_service,
        block_filter,
        dispatcher,
        clock,
    )
}

#[tokio::test]
async fn send_request_to_self_is_rejected_before_any_lookup() {
    let service = build_service(
        MockRequests::new(),
        MockUsers::new(),
        MockNotifications::new(),
        MockDispatcher::new(),
        MockPush::new(),
    );

    let err = service
        .send_request(UserId::new(1), UserId::new(1))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "VALIDATION");
}

#[tokio::test]
async fn send_request_conflicts_when_pair_already_has_a_request() {
    let mut requests = MockRequests::new();
    requests
        .expect_find_between()
        .times(1)
        .returning(|_, _| Ok(Some(request(ChatRequestStatus::Pending))));
    requests.expect_create_request().never();

    let service = build_service(
        requests,
        users_with_alice_and_bob(),
        MockNotifications::new(),
        MockDispatcher::new(),
        MockPush::new(),
    );

    let err = service
        .send_request(UserId::new(2), UserId::new(1))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "CONFLICT");
}

#[tokio::test]
async fn accept_by_sender_is_forbidden() {
    let mut requests = MockRequests::new();
    requests
        .expect_get_request()
        .returning(|_| Ok(Some(request(ChatRequestStatus::Pending))));
    requests.expect_accept_pending().never();

    let service = build_service(
        requests,
        users_with_alice_and_bob(),
        MockNotifications::new(),
        MockDispatcher::new(),
        MockPush::new(),
    );

    let err = service
        .accept_request(ChatRequestId::new(10), UserId::new(1))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "FORBIDDEN");
}

#[tokio::test]
async fn accept_of_accepted_request_is_invalid_state() {
    let mut requests = MockRequests::new();
    requests
        .expect_get_request()
        .returning(|_| Ok(Some(request(ChatRequestStatus::Accepted))));
    requests.expect_accept_pending().never();

    let service = build_service(
        requests,
        users_with_alice_and_bob(),
        MockNotifications::new(),
        MockDispatcher::new(),
        MockPush::new(),
    );

    let err = service
        .accept_request(ChatRequestId::new(10), UserId::new(2))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "INVALID_STATE");
}

#[tokio::test]
async fn accept_losing_the_race_is_invalid_state() {
    let mut requests = MockRequests::new();
    requests
        .expect_get_request()
        .returning(|_| Ok(Some(request(ChatRequestStatus::Pending))));
    requests
        .expect_accept_pending()
        .times(1)
        .returning(|_, _| Ok(None));

    let service = build_service(
        requests,
        users_with_alice_and_bob(),
        MockNotifications::new(),
        MockDispatcher::new(),
        MockPush::new(),
    );

    let err = service
        .accept_request(ChatRequestId::new(10), UserId::new(2))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "INVALID_STATE");
}

#[tokio::test]
async fn accept_succeeds_when_delivery_fails() {
    let mut requests = MockRequests::new();
    requests
        .expect_get_request()
        .returning(|_| Ok(Some(request(ChatRequestStatus::Pending))));
    requests
        .expect_accept_pending()
        .times(1)
        .returning(|_, _| Ok(Some(request(ChatRequestStatus::Accepted))));

    let mut dispatcher = MockDispatcher::new();
    dispatcher
        .expect_send()
        .returning(|_, _, _| Err(AppError::Delivery("session closed".into())));

    let (pushed, mut push_rx) = mpsc::unbounded_channel();
    let mut push = MockPush::new();
    push.expect_send()
        .times(1)
        .withf(|token, title, _, data| {
            token == "token-1"
                && title == "It's a Match!"
                && data.get("type").map(String::as_str) == Some("REQUEST_ACCEPTED")
                && data.get("relatedUserId").map(String::as_str) == Some("2")
        })
        .returning(move |token, _, _, _| {
            let _ = pushed.send(token.to_string());
            Err(AppError::Delivery("device offline".into()))
        });

    let service = build_service(
        requests,
        users_with_alice_and_bob(),
        echo_notifications(),
        dispatcher,
        push,
    );

    let accepted = service
        .accept_request(ChatRequestId::new(10), UserId::new(2))
        .await
        .unwrap();
    assert_eq!(accepted.status, ChatRequestStatus::Accepted);

    // プッシュは裏で送られる
    let token = tokio::time::timeout(Duration::from_secs(1), push_rx.recv())
        .await
        .unwrap();
    assert_eq!(token.as_deref(), Some("token-1"));
}

#[tokio::test]
async fn send_request_does_not_wait_for_device_push() {
    let mut requests = MockRequests::new();
    requests.expect_find_between().returning(|_, _| Ok(None));
    requests
        .expect_create_request()
        .times(1)
        .returning(|_| Ok(request(ChatRequestStatus::Pending)));
    let mut dispatcher = MockDispatcher::new();
    dispatcher.expect_send().returning(|_, _, _| Ok(()));

    let gate = Arc::new(Semaphore::new(0));
    let (delivered, mut delivered_rx) = mpsc::unbounded_channel();
    let service = build_service_with_push(
        requests,
        users_with_alice_and_bob(),
        echo_notifications(),
        dispatcher,
        Arc::new(GatedPush {
            gate: Arc::clone(&gate),
            delivered,
        }),
    );

    let created = tokio::time::timeout(
        Duration::from_secs(1),
        service.send_request(UserId::new(1), UserId::new(2)),
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(created.status, ChatRequestStatus::Pending);
    assert!(delivered_rx.try_recv().is_err());

    gate.add_permits(2);
    let mut tokens = Vec::new();
    for _ in 0..2 {
        let token = tokio::time::timeout(Duration::from_secs(1), delivered_rx.recv())
            .await
            .unwrap()
            .unwrap();
        tokens.push(token);
    }
    tokens.sort();
    assert_eq!(tokens, ["token-1", "token-2"]);
}

#[tokio::test]
async fn reject_removes_receiver_notification_and_tells_sender() {
    let mut requests = MockRequests::new();
    requests
        .expect_get_request()
        .returning(|_| Ok(Some(request(ChatRequestStatus::Pending))));
    requests
        .expect_delete_pending()
        .times(1)
        .withf(|id, cleanups| {
            *id == ChatRequestId::new(10)
                && cleanups.len() == 1
                && cleanups[0]
                    == NotificationCleanup::request_received(UserId::new(2), UserId::new(1))
        })
        .returning(|_, _| Ok(true));

    let mut notifications = MockNotifications::new();
    notifications
        .expect_create_notification()
        .times(1)
        .withf(|new| {
            new.notification_type == NotificationType::RequestRejected
                && new.recipient_id == UserId::new(1)
                && new.message == "Bob rejected your chat request"
        })
        .returning(|new| {
            Ok(Notification {
                id: NotificationId::new(2),
                notification_type: new.notification_type,
                message: new.message.clone(),
                recipient_id: new.recipient_id,
                related_user_id: new.related_user_id,
                is_read: false,
                created_at: new.created_at,
            })
        });

    let mut dispatcher = MockDispatcher::new();
    dispatcher.expect_send().returning(|_, _, _| Ok(()));
    let (pushed, mut push_rx) = mpsc::unbounded_channel();
    let mut push = MockPush::new();
    push.expect_send()
        .times(1)
        .withf(|_, title, _, _| title == "Matchmaking")
        .returning(move |token, _, _, _| {
            let _ = pushed.send(token.to_string());
            Ok(())
        });

    let service = build_service(
        requests,
        users_with_alice_and_bob(),
        notifications,
        dispatcher,
        push,
    );

    service
        .reject_request(ChatRequestId::new(10), UserId::new(2))
        .await
        .unwrap();

    let token = tokio::time::timeout(Duration::from_secs(1), push_rx.recv())
        .await
        .unwrap();
    assert_eq!(token.as_deref(), Some("token-1"));
}

#[tokio::test]
async fn cancel_by_receiver_is_forbidden() {
    let mut requests = MockRequests::new();
    requests
        .expect_get_request()
        .returning(|_| Ok(Some(request(ChatRequestStatus::Pending))));
    requests.expect_delete_pending().never();

    let service = build_service(
        requests,
        users_with_alice_and_bob(),
        MockNotifications::new(),
        MockDispatcher::new(),
        MockPush::new(),
    );

    let err = service
        .cancel_request(ChatRequestId::new(10), UserId::new(2))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "FORBIDDEN");
}
