//! Shared fixtures for activity feed tests.
//!
//! The "long" board holds 26 single-post threads. Post N was made on
//! 2020-03-29 + N days at 05:42:00; post 21 is one microsecond late. Odd
//! posts carry the "odd" category, even posts "even".
#![allow(dead_code)]

use board_service::db::InMemoryActivityStore;
use board_service::models::{ActivityRow, FeedId, Page};
use board_service::pagination::PageSizePolicy;
use board_service::services::{ActivityRequest, ActivityService};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use std::sync::Arc;
use uuid::Uuid;

pub const LONG_BOARD: FeedId = FeedId::Board(Uuid::from_u128(0x6f0a_2c1b_42d4_4ab6_9b3e_1d2c_5a7e_0001));
pub const EMPTY_BOARD: FeedId = FeedId::Board(Uuid::from_u128(0x6f0a_2c1b_42d4_4ab6_9b3e_1d2c_5a7e_0002));
pub const LONG_POSTS: u32 = 26;

pub fn at(year: i32, month: u32, day: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .unwrap()
        .and_hms_opt(5, 42, 0)
        .unwrap()
}

pub fn long_post_time(n: u32) -> NaiveDateTime {
    let time = at(2020, 3, 29) + Duration::days(i64::from(n));
    if n == 21 {
        time + Duration::microseconds(1)
    } else {
        time
    }
}

pub fn long_post_content(n: u32) -> String {
    if n == 21 {
        r#"[{"insert":"Post 21 (with microseconds)!"}]"#.to_string()
    } else {
        format!(r#"[{{"insert":"Post {}!"}}]"#, n)
    }
}

pub fn row(id: u128, last_activity_at: NaiveDateTime, content: &str) -> ActivityRow {
    ActivityRow {
        item_id: Uuid::from_u128(id),
        thread_id: Uuid::from_u128(id),
        post_id: Uuid::from_u128(10_000 + id),
        parent_post_id: None,
        content: content.to_string(),
        created_at: last_activity_at,
        last_activity_at,
        secret_identity: Some("Old Time-y Anon".to_string()),
        secret_avatar: Some("anon.png".to_string()),
        username: "bobatan".to_string(),
        user_avatar: Some("bobatan.png".to_string()),
        is_self: false,
        is_friend: false,
        categories: Vec::new(),
        posts_count: 1,
        comments_count: 0,
    }
}

pub fn long_post(n: u32) -> ActivityRow {
    let mut post = row(u128::from(n), long_post_time(n), &long_post_content(n));
    post.categories = vec![if n % 2 == 1 { "odd" } else { "even" }.to_string()];
    post
}

pub async fn long_board_store() -> Arc<InMemoryActivityStore> {
    let store = Arc::new(InMemoryActivityStore::new());
    store.create_feed(EMPTY_BOARD).await;
    // Inserted oldest first so the store has to do the ordering.
    for n in 1..=LONG_POSTS {
        store.insert(LONG_BOARD, long_post(n)).await;
    }
    store
}

pub fn service(store: Arc<InMemoryActivityStore>) -> ActivityService {
    ActivityService::new(store, PageSizePolicy::default())
}

pub fn request(feed: FeedId, cursor: Option<String>) -> ActivityRequest {
    ActivityRequest {
        cursor,
        ..ActivityRequest::new(feed)
    }
}

pub fn contents(page: &Page) -> Vec<String> {
    page.activity.iter().map(|item| item.content.clone()).collect()
}

pub fn post_contents(posts: impl IntoIterator<Item = u32>) -> Vec<String> {
    posts.into_iter().map(long_post_content).collect()
}

/// Follow cursors until the feed is exhausted, returning every page.
pub async fn walk(service: &ActivityService, first: ActivityRequest) -> Vec<Page> {
    let mut pages = Vec::new();
    let mut request = first;

    loop {
        let page = service.get_activity(request.clone()).await.unwrap();
        let next = page.cursor.map(|c| c.encode().unwrap());
        pages.push(page);

        match next {
            Some(cursor) => {
                request.cursor = Some(cursor);
                request.page_size = None;
            }
            None => return pages,
        }
        assert!(pages.len() < 1_000, "pagination did not terminate");
    }
}
