// users

pub(super) const INSERT_USER: &str = r#"
    INSERT INTO users (name, email, role, gender, age, religion, city_town, created_at)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
"#;

pub(super) const SELECT_USER_BY_ID: &str = r#"
    SELECT id, name, email, role, gender, age, religion, city_town, fcm_token, created_at
    FROM users
    WHERE id = ?1
"#;

pub(super) const SELECT_USER_BY_EMAIL: &str = r#"
    SELECT id, name, email, role, gender, age, religion, city_town, fcm_token, created_at
    FROM users
    WHERE email = ?1
"#;

pub(super) const SELECT_USERS: &str = r#"
    SELECT id, name, email, role, gender, age, religion, city_town, fcm_token, created_at
    FROM users
    WHERE (?1 IS NULL OR LOWER(gender) = LOWER(?1))
    ORDER BY id
"#;

pub(super) const SEARCH_USERS: &str = r#"
    SELECT id, name, email, role, gender, age, religion, city_town, fcm_token, created_at
    FROM users
    WHERE (?1 IS NULL OR age >= ?1)
      AND (?2 IS NULL OR age <= ?2)
      AND (?3 IS NULL OR LOWER(name) LIKE LOWER(?3) || '%')
      AND (?4 IS NULL OR LOWER(city_town) LIKE '%' || LOWER(?4) || '%')
      AND (?5 IS NULL OR LOWER(religion) LIKE '%' || LOWER(?5) || '%')
      AND (?6 IS NULL OR LOWER(gender) = LOWER(?6))
    ORDER BY id
"#;

pub(super) const UPDATE_USER_FCM_TOKEN: &str = r#"
    UPDATE users
    SET fcm_token = ?2
    WHERE id = ?1
"#;

pub(super) const EXISTS_USER: &str = r#"
    SELECT EXISTS(SELECT 1 FROM users WHERE id = ?1)
"#;

/// ユーザー削除時に、外部キーの依存順で消す関連行。
pub(super) const DELETE_USER_DEPENDENTS: [&str; 7] = [
    "DELETE FROM favourites WHERE user_id = ?1 OR favourited_user_id = ?1",
    "DELETE FROM blocks WHERE blocker_id = ?1 OR blocked_id = ?1",
    "DELETE FROM chat_requests WHERE sender_id = ?1 OR receiver_id = ?1",
    "DELETE FROM notifications WHERE recipient_id = ?1 OR related_user_id = ?1",
    "DELETE FROM messages WHERE sender_id = ?1 OR receiver_id = ?1",
    "DELETE FROM subscriptions WHERE user_id = ?1",
    "DELETE FROM photos WHERE user_id = ?1",
];

pub(super) const DELETE_USER: &str = r#"
    DELETE FROM users
    WHERE id = ?1
"#;

// plans

pub(super) const INSERT_PLAN: &str = r#"
    INSERT INTO plans (name, duration_months, price, is_published, is_addon, chat_limit)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6)
"#;

pub(super) const SELECT_PLAN_BY_ID: &str = r#"
    SELECT id, name, duration_months, price, is_published, is_addon, chat_limit
    FROM plans
    WHERE id = ?1
"#;

pub(super) const SELECT_PLANS: &str = r#"
    SELECT id, name, duration_months, price, is_published, is_addon, chat_limit
    FROM plans
    ORDER BY id
"#;

pub(super) const SELECT_PUBLISHED_PLANS: &str = r#"
    SELECT id, name, duration_months, price, is_published, is_addon, chat_limit
    FROM plans
    WHERE is_published = 1
    ORDER BY price, id
"#;

pub(super) const UPDATE_PLAN: &str = r#"
    UPDATE plans
    SET name = ?2,
        duration_months = ?3,
        price = ?4,
        is_published = ?5,
        is_addon = ?6,
        chat_limit = ?7
    WHERE id = ?1
"#;

pub(super) const EXISTS_SUBSCRIPTION_FOR_PLAN: &str = r#"
    SELECT EXISTS(SELECT 1 FROM subscriptions WHERE plan_id = ?1)
"#;

pub(super) const DELETE_PLAN: &str = r#"
    DELETE FROM plans
    WHERE id = ?1
"#;

// subscriptions

pub(super) const INSERT_SUBSCRIPTION: &str = r#"
    INSERT INTO subscriptions (
        user_id,
        plan_id,
        start_date,
        expiry_date,
        status,
        chat_limit,
        used_chat_slots,
        version
    ) VALUES (?1, ?2, ?3, ?4, 'ACTIVE', ?5, 0, 0)
"#;

pub(super) const SELECT_SUBSCRIPTION_BY_ID: &str = r#"
    SELECT id, user_id, plan_id, start_date, expiry_date, status,
           chat_limit, used_chat_slots, version
    FROM subscriptions
    WHERE id = ?1
"#;

pub(super) const SELECT_CURRENT_ACTIVE_SUBSCRIPTION: &str = r#"
    SELECT id, user_id, plan_id, start_date, expiry_date, status,
           chat_limit, used_chat_slots, version
    FROM subscriptions
    WHERE user_id = ?1
      AND status = 'ACTIVE'
      AND expiry_date > ?2
    ORDER BY expiry_date DESC, id DESC
    LIMIT 1
"#;

pub(super) const SELECT_SUBSCRIPTIONS_BY_USER: &str = r#"
    SELECT id, user_id, plan_id, start_date, expiry_date, status,
           chat_limit, used_chat_slots, version
    FROM subscriptions
    WHERE user_id = ?1
    ORDER BY expiry_date DESC, id DESC
"#;

pub(super) const SELECT_ALL_SUBSCRIPTIONS: &str = r#"
    SELECT id, user_id, plan_id, start_date, expiry_date, status,
           chat_limit, used_chat_slots, version
    FROM subscriptions
    ORDER BY id
"#;

pub(super) const UPDATE_SUBSCRIPTION_IF_VERSION: &str = r#"
    UPDATE subscriptions
    SET expiry_date = ?3,
        chat_limit = ?4,
        used_chat_slots = ?5,
        version = version + 1
    WHERE id = ?1
      AND version = ?2
      AND status = 'ACTIVE'
"#;

pub(super) const SELECT_EXPIRED_ACTIVE_SUBSCRIPTIONS: &str = r#"
    SELECT id, user_id, plan_id, start_date, expiry_date, status,
           chat_limit, used_chat_slots, version
    FROM subscriptions
    WHERE status = 'ACTIVE'
      AND expiry_date < ?1
    ORDER BY expiry_date, id
"#;

pub(super) const EXPIRE_SUBSCRIPTION_IF_VERSION: &str = r#"
    UPDATE subscriptions
    SET status = 'EXPIRED',
        version = version + 1
    WHERE id = ?1
      AND version = ?2
      AND status = 'ACTIVE'
      AND expiry_date < ?3
    RETURNING user_id
"#;

/// 失効処理の時点でまだ有効な加入が残っているか（再購入済みなら写真は削らない）。
pub(super) const EXISTS_CURRENT_SUBSCRIPTION_FOR_USER: &str = r#"
    SELECT EXISTS(
        SELECT 1 FROM subscriptions
        WHERE user_id = ?1 AND status = 'ACTIVE' AND expiry_date > ?2
    )
"#;

pub(super) const EXPIRE_ACTIVE_SUBSCRIPTIONS_FOR_USER: &str = r#"
    UPDATE subscriptions
    SET status = 'EXPIRED',
        version = version + 1
    WHERE user_id = ?1
      AND status = 'ACTIVE'
"#;

/// 新しい相手へのメッセージのために枠を 1 つ消費する。
/// 既に相手とのやり取りがある場合、枠が尽きている場合、加入が無効な場合は 0 行。
pub(super) const CONSUME_CHAT_SLOT: &str = r#"
    UPDATE subscriptions
    SET used_chat_slots = used_chat_slots + 1,
        version = version + 1
    WHERE id = ?1
      AND status = 'ACTIVE'
      AND expiry_date > ?2
      AND (chat_limit IS NULL OR used_chat_slots < chat_limit)
      AND NOT EXISTS (
          SELECT 1 FROM messages
          WHERE (sender_id = ?3 AND receiver_id = ?4)
             OR (sender_id = ?4 AND receiver_id = ?3)
      )
"#;

pub(super) const EXISTS_CURRENT_SUBSCRIPTION: &str = r#"
    SELECT EXISTS(
        SELECT 1 FROM subscriptions
        WHERE id = ?1 AND status = 'ACTIVE' AND expiry_date > ?2
    )
"#;

// chat requests

pub(super) const INSERT_CHAT_REQUEST: &str = r#"
    INSERT INTO chat_requests (sender_id, receiver_id, status, created_at, updated_at)
    VALUES (?1, ?2, 'PENDING', ?3, ?3)
"#;

pub(super) const SELECT_CHAT_REQUEST_BY_ID: &str = r#"
    SELECT id, sender_id, receiver_id, status, created_at, updated_at
    FROM chat_requests
    WHERE id = ?1
"#;

pub(super) const SELECT_CHAT_REQUEST_BETWEEN: &str = r#"
    SELECT id, sender_id, receiver_id, status, created_at, updated_at
    FROM chat_requests
    WHERE (sender_id = ?1 AND receiver_id = ?2)
       OR (sender_id = ?2 AND receiver_id = ?1)
    LIMIT 1
"#;

pub(super) const EXISTS_ACCEPTED_CHAT_REQUEST_BETWEEN: &str = r#"
    SELECT EXISTS(
        SELECT 1 FROM chat_requests
        WHERE status = 'ACCEPTED'
          AND ((sender_id = ?1 AND receiver_id = ?2)
            OR (sender_id = ?2 AND receiver_id = ?1))
    )
"#;

pub(super) const ACCEPT_PENDING_CHAT_REQUEST: &str = r#"
    UPDATE chat_requests
    SET status = 'ACCEPTED',
        updated_at = ?2
    WHERE id = ?1
      AND status = 'PENDING'
"#;

pub(super) const DELETE_PENDING_CHAT_REQUEST: &str = r#"
    DELETE FROM chat_requests
    WHERE id = ?1
      AND status = 'PENDING'
"#;

pub(super) const SELECT_PENDING_CHAT_REQUESTS_FOR_RECEIVER: &str = r#"
    SELECT id, sender_id, receiver_id, status, created_at, updated_at
    FROM chat_requests
    WHERE receiver_id = ?1
      AND status = 'PENDING'
    ORDER BY created_at DESC, id DESC
"#;

pub(super) const SELECT_CHAT_REQUESTS_FOR_USER: &str = r#"
    SELECT id, sender_id, receiver_id, status, created_at, updated_at
    FROM chat_requests
    WHERE sender_id = ?1 OR receiver_id = ?1
    ORDER BY created_at DESC, id DESC
"#;

// messages

pub(super) const INSERT_MESSAGE: &str = r#"
    INSERT INTO messages (sender_id, receiver_id, content, is_read, created_at)
    VALUES (?1, ?2, ?3, 0, ?4)
"#;

pub(super) const SELECT_MESSAGE_BY_ID: &str = r#"
    SELECT id, sender_id, receiver_id, content, is_read, created_at
    FROM messages
    WHERE id = ?1
"#;

pub(super) const SELECT_MESSAGES_FOR_USER: &str = r#"
    SELECT id, sender_id, receiver_id, content, is_read, created_at
    FROM messages
    WHERE sender_id = ?1 OR receiver_id = ?1
    ORDER BY created_at, id
"#;

pub(super) const SELECT_PARTNER_IDS: &str = r#"
    SELECT DISTINCT CASE WHEN sender_id = ?1 THEN receiver_id ELSE sender_id END AS partner_id
    FROM messages
    WHERE sender_id = ?1 OR receiver_id = ?1
    ORDER BY partner_id
"#;

pub(super) const EXISTS_MESSAGE_BETWEEN: &str = r#"
    SELECT EXISTS(
        SELECT 1 FROM messages
        WHERE (sender_id = ?1 AND receiver_id = ?2)
           OR (sender_id = ?2 AND receiver_id = ?1)
    )
"#;

pub(super) const MARK_MESSAGES_READ: &str = r#"
    UPDATE messages
    SET is_read = 1
    WHERE receiver_id = ?1
      AND sender_id = ?2
      AND is_read = 0
"#;

pub(super) const DELETE_MESSAGE: &str = r#"
    DELETE FROM messages
    WHERE id = ?1
"#;

// blocks

pub(super) const INSERT_BLOCK: &str = r#"
    INSERT INTO blocks (blocker_id, blocked_id, created_at)
    VALUES (?1, ?2, ?3)
"#;

pub(super) const DELETE_BLOCK: &str = r#"
    DELETE FROM blocks
    WHERE blocker_id = ?1 AND blocked_id = ?2
"#;

pub(super) const EXISTS_BLOCK: &str = r#"
    SELECT EXISTS(SELECT 1 FROM blocks WHERE blocker_id = ?1 AND blocked_id = ?2)
"#;

pub(super) const SELECT_BLOCKS_BY_BLOCKER: &str = r#"
    SELECT blocker_id, blocked_id, created_at
    FROM blocks
    WHERE blocker_id = ?1
    ORDER BY created_at DESC, id DESC
"#;

pub(super) const SELECT_HIDDEN_USER_IDS: &str = r#"
    SELECT blocked_id AS user_id FROM blocks WHERE blocker_id = ?1
    UNION
    SELECT blocker_id AS user_id FROM blocks WHERE blocked_id = ?1
"#;

// favourites

pub(super) const INSERT_FAVOURITE: &str = r#"
    INSERT INTO favourites (user_id, favourited_user_id, created_at)
    VALUES (?1, ?2, ?3)
"#;

pub(super) const DELETE_FAVOURITE: &str = r#"
    DELETE FROM favourites
    WHERE user_id = ?1 AND favourited_user_id = ?2
"#;

pub(super) const EXISTS_FAVOURITE: &str = r#"
    SELECT EXISTS(SELECT 1 FROM favourites WHERE user_id = ?1 AND favourited_user_id = ?2)
"#;

pub(super) const SELECT_FAVOURITES_BY_USER: &str = r#"
    SELECT user_id, favourited_user_id, created_at
    FROM favourites
    WHERE user_id = ?1
    ORDER BY created_at DESC, id DESC
"#;

// notifications

pub(super) const INSERT_NOTIFICATION: &str = r#"
    INSERT INTO notifications (
        notification_type,
        message,
        recipient_id,
        related_user_id,
        is_read,
        created_at
    ) VALUES (?1, ?2, ?3, ?4, 0, ?5)
"#;

pub(super) const SELECT_NOTIFICATIONS_FOR_RECIPIENT: &str = r#"
    SELECT id, notification_type, message, recipient_id, related_user_id, is_read, created_at
    FROM notifications
    WHERE recipient_id = ?1
      AND (?2 = 0 OR is_read = 0)
    ORDER BY created_at DESC, id DESC
"#;

pub(super) const COUNT_UNREAD_NOTIFICATIONS: &str = r#"
    SELECT COUNT(*)
    FROM notifications
    WHERE recipient_id = ?1 AND is_read = 0
"#;

pub(super) const MARK_NOTIFICATION_READ: &str = r#"
    UPDATE notifications
    SET is_read = 1
    WHERE id = ?1 AND recipient_id = ?2
"#;

pub(super) const MARK_ALL_NOTIFICATIONS_READ: &str = r#"
    UPDATE notifications
    SET is_read = 1
    WHERE recipient_id = ?1 AND is_read = 0
"#;

pub(super) const DELETE_NOTIFICATION: &str = r#"
    DELETE FROM notifications
    WHERE id = ?1
"#;

pub(super) const DELETE_LATEST_MATCHING_NOTIFICATION: &str = r#"
    DELETE FROM notifications
    WHERE id = (
        SELECT id FROM notifications
        WHERE recipient_id = ?1
          AND related_user_id = ?2
          AND notification_type = ?3
        ORDER BY created_at DESC, id DESC
        LIMIT 1
    )
"#;

// photos

pub(super) const INSERT_PHOTO: &str = r#"
    INSERT INTO photos (user_id, url, created_at)
    VALUES (?1, ?2, ?3)
"#;

pub(super) const SELECT_PHOTOS_BY_USER: &str = r#"
    SELECT id, user_id, url, created_at
    FROM photos
    WHERE user_id = ?1
    ORDER BY id
"#;

/// 古い順に ?2 枚を残して削除する。
pub(super) const TRIM_PHOTOS: &str = r#"
    DELETE FROM photos
    WHERE user_id = ?1
      AND id NOT IN (
          SELECT id FROM photos
          WHERE user_id = ?1
          ORDER BY id
          LIMIT ?2
      )
"#;
