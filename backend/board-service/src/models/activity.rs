use chrono::NaiveDateTime;
use serde::Serialize;
use std::fmt;
use uuid::Uuid;

use super::identity::Identity;
use crate::pagination::timestamp::serialize_timestamp;
use crate::pagination::{ActivityKey, Cursor, CursorError};

/// An activity stream: a board's, a thread's, or a subscription's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeedId {
    Board(Uuid),
    Thread(Uuid),
    /// Threads carrying posts in the categories a subscription follows.
    Subscription(Uuid),
}

impl FeedId {
    pub fn kind(&self) -> &'static str {
        match self {
            FeedId::Board(_) => "board",
            FeedId::Thread(_) => "thread",
            FeedId::Subscription(_) => "subscription",
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            FeedId::Board(id) | FeedId::Thread(id) | FeedId::Subscription(id) => *id,
        }
    }
}

impl fmt::Display for FeedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind(), self.id())
    }
}

/// Row shape shared by every activity store.
///
/// On a board feed `item_id` is the thread id and the row describes the
/// thread's starter post; on a thread feed `item_id` is the post id. A
/// subscription feed is keyed by thread like a board feed, but the row
/// describes the thread's newest post in a followed category.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct ActivityRow {
    pub item_id: Uuid,
    pub thread_id: Uuid,
    pub post_id: Uuid,
    pub parent_post_id: Option<Uuid>,
    pub content: String,
    pub created_at: NaiveDateTime,
    pub last_activity_at: NaiveDateTime,
    pub secret_identity: Option<String>,
    pub secret_avatar: Option<String>,
    pub username: String,
    pub user_avatar: Option<String>,
    pub is_self: bool,
    pub is_friend: bool,
    pub categories: Vec<String>,
    pub posts_count: i64,
    pub comments_count: i64,
}

impl ActivityRow {
    pub fn key(&self) -> ActivityKey {
        ActivityKey::new(self.last_activity_at, self.item_id)
    }
}

/// Client-facing activity entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityItem {
    pub id: Uuid,
    pub thread_id: Uuid,
    pub post_id: Uuid,
    pub parent_post_id: Option<Uuid>,
    pub content: String,
    #[serde(serialize_with = "serialize_timestamp")]
    pub created_at: NaiveDateTime,
    #[serde(serialize_with = "serialize_timestamp")]
    pub last_activity_at: NaiveDateTime,
    /// Always present; empty when the author has no identity in the thread.
    pub secret_identity: Identity,
    /// Real identity, only revealed to the author and the author's friends.
    pub user_identity: Option<Identity>,
    pub own: bool,
    pub friend: bool,
    pub categories: Vec<String>,
    pub posts_count: i64,
    pub comments_count: i64,
}

impl From<ActivityRow> for ActivityItem {
    fn from(row: ActivityRow) -> Self {
        let user_identity = if row.is_self || row.is_friend {
            Some(Identity::new(Some(row.username), row.user_avatar))
        } else {
            None
        };
        let secret_identity = Identity::new(row.secret_identity, row.secret_avatar);

        Self {
            id: row.item_id,
            thread_id: row.thread_id,
            post_id: row.post_id,
            parent_post_id: row.parent_post_id,
            content: row.content,
            created_at: row.created_at,
            last_activity_at: row.last_activity_at,
            secret_identity,
            user_identity,
            own: row.is_self,
            friend: row.is_friend,
            categories: row.categories,
            posts_count: row.posts_count,
            comments_count: row.comments_count,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub activity: Vec<ActivityItem>,
    pub cursor: Option<Cursor>,
}

#[derive(Debug, Serialize)]
pub struct CursorResponse {
    pub next: Option<String>,
}

/// Wire shape: `{"activity": [...], "cursor": {"next": "..." | null}}`.
#[derive(Debug, Serialize)]
pub struct ActivityResponse {
    pub activity: Vec<ActivityItem>,
    pub cursor: CursorResponse,
}

impl TryFrom<Page> for ActivityResponse {
    type Error = CursorError;

    fn try_from(page: Page) -> Result<Self, Self::Error> {
        let next = page.cursor.as_ref().map(Cursor::encode).transpose()?;

        Ok(Self {
            activity: page.activity,
            cursor: CursorResponse { next },
        })
    }
}
