use crate::domain::value_objects::{PhotoId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// ギャラリー写真。実体はオブジェクトストレージにあり、ここでは URL のみ保持する。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Photo {
    pub id: PhotoId,
    pub user_id: UserId,
    pub url: String,
    pub created_at: DateTime<Utc>,
}
