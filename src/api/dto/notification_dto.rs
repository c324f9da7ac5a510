//! Waitlist and notification DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::persistence::waitlist::NotificationRow;

/// Body of `POST /api/notifications/subscribe`.
#[derive(Debug, Clone, Default, Deserialize, utoipa::ToSchema)]
pub struct SubscribeRequest {
    #[serde(default, alias = "roomId", alias = "hotelId")]
    pub room_id: Option<String>,
    #[serde(default, alias = "checkIn")]
    pub check_in: Option<String>,
    #[serde(default, alias = "checkOut")]
    pub check_out: Option<String>,
    /// `main` (default) or `priority`.
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

/// Response of `POST /api/notifications/subscribe`.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct SubscribeResponse {
    /// Subscription id.
    pub id: Uuid,
    /// Group id, minted for priority subscriptions only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_id: Option<Uuid>,
    pub message: String,
}

/// Query of `GET /api/notifications`.
#[derive(Debug, Clone, Default, Deserialize, utoipa::IntoParams)]
pub struct NotificationListQuery {
    pub limit: Option<i64>,
}

/// One in-app notification.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct NotificationItem {
    pub id: Uuid,
    pub title: String,
    pub text: String,
    pub link: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "isRead")]
    pub is_read: bool,
    #[serde(rename = "groupId", skip_serializing_if = "Option::is_none")]
    pub group_id: Option<Uuid>,
}

impl From<NotificationRow> for NotificationItem {
    fn from(row: NotificationRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            text: row.body,
            link: row.link,
            created_at: row.created_at,
            is_read: row.is_read,
            group_id: row.group_id,
        }
    }
}

/// Response of `GET /api/notifications`.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct NotificationListResponse {
    pub items: Vec<NotificationItem>,
    #[serde(rename = "unreadCount")]
    pub unread_count: i64,
}

/// Response of `POST /api/notifications/read-all`.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct ReadAllResponse {
    pub message: String,
    pub updated: u64,
}
