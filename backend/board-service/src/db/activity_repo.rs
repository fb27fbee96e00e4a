use async_trait::async_trait;
use db_pool::acquire_with_metrics;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::debug;

use super::{ActivityStore, FeedQuery, StoreError};
use crate::models::{ActivityRow, FeedId};
use crate::pagination::TimestampPrecision;

const SERVICE_NAME: &str = "board-service";

/// Threads of a board, keyed by the newest post or comment anywhere in them.
const BOARD_ACTIVITY: &str = r#"
    SELECT
        threads.string_id AS item_id,
        threads.string_id AS thread_id,
        starter.string_id AS post_id,
        NULL::uuid AS parent_post_id,
        starter.content,
        starter.created AS created_at,
        GREATEST(
            (SELECT MAX(p.created) FROM posts AS p WHERE p.parent_thread = threads.id),
            (SELECT MAX(c.created) FROM comments AS c WHERE c.parent_thread = threads.id)
        ) AS last_activity_at,
        secret_identities.display_name AS secret_identity,
        secret_identities.avatar_reference_id AS secret_avatar,
        author.username,
        author.avatar_reference_id AS user_avatar,
        COALESCE(author.id = (SELECT id FROM viewer), FALSE) AS is_self,
        EXISTS(
            SELECT 1 FROM friends
            WHERE friends.user_id = (SELECT id FROM viewer) AND friends.friend_id = author.id
        ) AS is_friend,
        ARRAY(
            SELECT categories.category
            FROM post_categories
            JOIN categories ON categories.id = post_categories.category_id
            WHERE post_categories.post_id = starter.id
            ORDER BY categories.category
        ) AS categories,
        (SELECT COUNT(*) FROM posts AS p WHERE p.parent_thread = threads.id) AS posts_count,
        (SELECT COUNT(*) FROM comments AS c WHERE c.parent_thread = threads.id) AS comments_count
    FROM threads
    JOIN boards ON boards.id = threads.parent_board
    JOIN posts AS starter ON starter.parent_thread = threads.id AND starter.parent_post IS NULL
    JOIN users AS author ON author.id = starter.author
    LEFT JOIN user_thread_identities AS uti
        ON uti.thread_id = threads.id AND uti.user_id = author.id
    LEFT JOIN secret_identities ON secret_identities.id = uti.identity_id
    WHERE boards.string_id = "#;

/// Posts of a thread, keyed by the newer of the post and its newest comment.
const THREAD_ACTIVITY: &str = r#"
    SELECT
        posts.string_id AS item_id,
        threads.string_id AS thread_id,
        posts.string_id AS post_id,
        parent.string_id AS parent_post_id,
        posts.content,
        posts.created AS created_at,
        GREATEST(
            posts.created,
            (SELECT MAX(c.created) FROM comments AS c WHERE c.parent_post = posts.id)
        ) AS last_activity_at,
        secret_identities.display_name AS secret_identity,
        secret_identities.avatar_reference_id AS secret_avatar,
        author.username,
        author.avatar_reference_id AS user_avatar,
        COALESCE(author.id = (SELECT id FROM viewer), FALSE) AS is_self,
        EXISTS(
            SELECT 1 FROM friends
            WHERE friends.user_id = (SELECT id FROM viewer) AND friends.friend_id = author.id
        ) AS is_friend,
        ARRAY(
            SELECT categories.category
            FROM post_categories
            JOIN categories ON categories.id = post_categories.category_id
            WHERE post_categories.post_id = posts.id
            ORDER BY categories.category
        ) AS categories,
        (SELECT COUNT(*) FROM posts AS replies WHERE replies.parent_post = posts.id) AS posts_count,
        (SELECT COUNT(*) FROM comments AS c WHERE c.parent_post = posts.id) AS comments_count
    FROM posts
    JOIN threads ON threads.id = posts.parent_thread
    LEFT JOIN posts AS parent ON parent.id = posts.parent_post
    JOIN users AS author ON author.id = posts.author
    LEFT JOIN user_thread_identities AS uti
        ON uti.thread_id = threads.id AND uti.user_id = author.id
    LEFT JOIN secret_identities ON secret_identities.id = uti.identity_id
    WHERE threads.string_id = "#;

/// Threads followed by a subscription, keyed by their newest post in a
/// followed category. A subscription follows categories board-wide or on
/// single threads.
const SUBSCRIPTION_ACTIVITY: &str = r#"
    SELECT
        threads.string_id AS item_id,
        threads.string_id AS thread_id,
        latest.string_id AS post_id,
        parent.string_id AS parent_post_id,
        latest.content,
        latest.created AS created_at,
        latest.created AS last_activity_at,
        secret_identities.display_name AS secret_identity,
        secret_identities.avatar_reference_id AS secret_avatar,
        author.username,
        author.avatar_reference_id AS user_avatar,
        COALESCE(author.id = (SELECT id FROM viewer), FALSE) AS is_self,
        EXISTS(
            SELECT 1 FROM friends
            WHERE friends.user_id = (SELECT id FROM viewer) AND friends.friend_id = author.id
        ) AS is_friend,
        ARRAY(
            SELECT categories.category
            FROM post_categories
            JOIN categories ON categories.id = post_categories.category_id
            WHERE post_categories.post_id = latest.id
            ORDER BY categories.category
        ) AS categories,
        (SELECT COUNT(*) FROM posts AS p WHERE p.parent_thread = threads.id) AS posts_count,
        (SELECT COUNT(*) FROM comments AS c WHERE c.parent_thread = threads.id) AS comments_count
    FROM subscriptions
    JOIN threads
        ON threads.parent_board IN (
            SELECT bcs.board_id FROM board_category_subscriptions AS bcs
            WHERE bcs.subscription_id = subscriptions.id
        )
        OR threads.id IN (
            SELECT tcs.thread_id FROM thread_category_subscriptions AS tcs
            WHERE tcs.subscription_id = subscriptions.id
        )
    JOIN LATERAL (
        SELECT p.*
        FROM posts AS p
        WHERE p.parent_thread = threads.id
          AND EXISTS (
              SELECT 1
              FROM post_categories AS pc
              WHERE pc.post_id = p.id
                AND (
                    EXISTS (
                        SELECT 1 FROM board_category_subscriptions AS bcs
                        WHERE bcs.subscription_id = subscriptions.id
                          AND bcs.board_id = threads.parent_board
                          AND bcs.category_id = pc.category_id
                    )
                    OR EXISTS (
                        SELECT 1 FROM thread_category_subscriptions AS tcs
                        WHERE tcs.subscription_id = subscriptions.id
                          AND tcs.thread_id = threads.id
                          AND tcs.category_id = pc.category_id
                    )
                )
          )
        ORDER BY p.created DESC, p.string_id ASC
        LIMIT 1
    ) AS latest ON TRUE
    LEFT JOIN posts AS parent ON parent.id = latest.parent_post
    JOIN users AS author ON author.id = latest.author
    LEFT JOIN user_thread_identities AS uti
        ON uti.thread_id = threads.id AND uti.user_id = author.id
    LEFT JOIN secret_identities ON secret_identities.id = uti.identity_id
    WHERE subscriptions.string_id = "#;

/// PostgreSQL activity store.
///
/// Timestamps are `TIMESTAMP` columns, so rows arrive with microsecond
/// precision. The existence check and the page read share one read-only
/// snapshot.
#[derive(Clone)]
pub struct PgActivityStore {
    pool: PgPool,
}

impl PgActivityStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Build the page query for `query`.
pub(crate) fn build_activity_query(query: &FeedQuery) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::<Postgres>::new(
        "WITH viewer AS (SELECT id FROM users WHERE firebase_id = ",
    );
    builder.push_bind(query.viewer.clone());
    builder.push(") SELECT * FROM (");

    match query.feed {
        FeedId::Board(board_id) => {
            builder.push(BOARD_ACTIVITY);
            builder.push_bind(board_id);
        }
        FeedId::Thread(thread_id) => {
            builder.push(THREAD_ACTIVITY);
            builder.push_bind(thread_id);
        }
        FeedId::Subscription(subscription_id) => {
            builder.push(SUBSCRIPTION_ACTIVITY);
            builder.push_bind(subscription_id);
        }
    }
    builder.push(") AS activity WHERE TRUE");

    if let Some(boundary) = query.boundary {
        builder.push(" AND (activity.last_activity_at < ");
        builder.push_bind(boundary.before);
        if let Some(after_id) = boundary.after_id {
            builder.push(" OR (activity.last_activity_at = ");
            builder.push_bind(boundary.before);
            builder.push(" AND activity.item_id > ");
            builder.push_bind(after_id);
            builder.push(")");
        }
        builder.push(")");
    }

    if !query.categories.is_empty() {
        builder.push(
            " AND EXISTS (SELECT 1 FROM unnest(activity.categories) AS category WHERE lower(category) = ANY(",
        );
        builder.push_bind(query.categories.clone());
        builder.push("))");
    }

    builder.push(" ORDER BY activity.last_activity_at DESC, activity.item_id ASC LIMIT ");
    builder.push_bind(i64::from(query.limit));

    builder
}

fn exists_query(feed: FeedId) -> &'static str {
    match feed {
        FeedId::Board(_) => "SELECT EXISTS(SELECT 1 FROM boards WHERE string_id = $1)",
        FeedId::Thread(_) => "SELECT EXISTS(SELECT 1 FROM threads WHERE string_id = $1)",
        FeedId::Subscription(_) => {
            "SELECT EXISTS(SELECT 1 FROM subscriptions WHERE string_id = $1)"
        }
    }
}

#[async_trait]
impl ActivityStore for PgActivityStore {
    fn precision(&self) -> TimestampPrecision {
        TimestampPrecision::Microseconds
    }

    async fn fetch_activity(&self, query: &FeedQuery) -> Result<Option<Vec<ActivityRow>>, StoreError> {
        let mut conn = acquire_with_metrics(&self.pool, SERVICE_NAME).await?;
        let mut tx = sqlx::Connection::begin(&mut *conn).await?;

        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await?;

        let exists: bool = sqlx::query_scalar(exists_query(query.feed))
            .bind(query.feed.id())
            .fetch_one(&mut *tx)
            .await?;
        if !exists {
            tx.commit().await?;
            return Ok(None);
        }

        let rows = build_activity_query(query)
            .build_query_as::<ActivityRow>()
            .fetch_all(&mut *tx)
            .await?;
        tx.commit().await?;

        debug!(feed = %query.feed, rows = rows.len(), limit = query.limit, "activity rows fetched");
        Ok(Some(rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pagination::Boundary;
    use chrono::NaiveDate;
    use uuid::Uuid;

    fn boundary(after_id: Option<Uuid>) -> Boundary {
        Boundary {
            before: NaiveDate::from_ymd_opt(2020, 4, 15)
                .unwrap()
                .and_hms_opt(5, 42, 0)
                .unwrap(),
            after_id,
        }
    }

    #[test]
    fn test_first_page_has_no_boundary_predicate() {
        let query = FeedQuery::new(FeedId::Board(Uuid::nil()), 11);
        let builder = build_activity_query(&query);
        let sql = builder.sql();

        assert!(sql.contains("WHERE boards.string_id = $2"));
        assert!(!sql.contains("activity.last_activity_at <"));
        assert!(sql.ends_with(
            "ORDER BY activity.last_activity_at DESC, activity.item_id ASC LIMIT $3"
        ));
    }

    #[test]
    fn test_boundary_predicate_is_strict() {
        let query = FeedQuery::new(FeedId::Thread(Uuid::nil()), 6)
            .with_boundary(Some(boundary(None)));
        let builder = build_activity_query(&query);
        let sql = builder.sql();

        assert!(sql.contains("WHERE threads.string_id = $2"));
        assert!(sql.contains("AND (activity.last_activity_at < $3)"));
        assert!(!sql.contains("activity.item_id >"));
    }

    #[test]
    fn test_subscription_feed_binds_its_id() {
        let query = FeedQuery::new(FeedId::Subscription(Uuid::nil()), 5)
            .with_boundary(Some(boundary(None)));
        let builder = build_activity_query(&query);
        let sql = builder.sql();

        assert!(sql.contains("WHERE subscriptions.string_id = $2"));
        assert!(sql.contains("AND (activity.last_activity_at < $3)"));
        assert!(sql.ends_with("LIMIT $4"));
        assert!(exists_query(query.feed).contains("FROM subscriptions"));
    }

    #[test]
    fn test_tie_break_and_categories_are_anded() {
        let query = FeedQuery::new(FeedId::Board(Uuid::nil()), 11)
            .with_boundary(Some(boundary(Some(Uuid::from_u128(3)))))
            .with_categories(["odd"]);
        let builder = build_activity_query(&query);
        let sql = builder.sql();

        assert!(sql.contains(
            "AND (activity.last_activity_at < $3 OR (activity.last_activity_at = $4 AND activity.item_id > $5))"
        ));
        assert!(sql.contains("lower(category) = ANY($6)"));
        assert!(sql.ends_with("LIMIT $7"));
    }
}
