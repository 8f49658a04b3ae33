//! Store-backed property tests — require a real PostgreSQL instance.
//!
//! Gated on `DATABASE_URL`: when it is unset each test returns early, so
//! the suite is a no-op in environments without a database. Migrations run
//! on connect and every test works with freshly created rows, so the suite
//! is safe to point at a shared development database.

use sqlx::PgPool;
use uuid::Uuid;
use vidtube_core::auth::{queries, tokens, TokenSecrets};
use vidtube_core::media::BlobRef;
use vidtube_core::models::{Identity, Video};
use vidtube_core::playlists as playlist_store;
use vidtube_core::toggle;
use vidtube_core::videos as video_store;
use vidtube_core::views::playlists::get_playlist;
use vidtube_core::views::videos::{get_video, list_videos, VideoFilter};
use vidtube_core::views::{PageRequest, SortDirection, SortField};
use vidtube_core::Error;

async fn connect() -> Option<PgPool> {
    let url = match std::env::var("DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            eprintln!("DATABASE_URL not set, skipping store-backed test");
            return None;
        }
    };
    let pool = PgPool::connect(&url).await.expect("connect to database");
    vidtube_api::migrate(&pool).await.expect("run migrations");
    Some(pool)
}

fn test_secrets() -> TokenSecrets {
    TokenSecrets {
        access: "store-test-access-secret".into(),
        refresh: "store-test-refresh-secret".into(),
    }
}

async fn new_identity(pool: &PgPool, tag: &str) -> Identity {
    let suffix = Uuid::new_v4().simple().to_string();
    queries::create_identity(
        pool,
        &format!("{tag}-{suffix}"),
        &format!("{tag}-{suffix}@example.com"),
        "Test Er",
        "not-a-real-hash",
        "http://localhost:9000/blobs/avatar",
        "avatar",
        None,
        None,
    )
    .await
    .expect("create identity")
}

fn blob(name: &str) -> BlobRef {
    BlobRef {
        url: format!("http://localhost:9000/blobs/{name}"),
        public_id: name.into(),
        duration_secs: Some(12.5),
    }
}

async fn new_video(pool: &PgPool, owner: Uuid, title: &str) -> Video {
    video_store::create_video(
        pool,
        owner,
        title,
        "a description",
        &blob("video"),
        &blob("thumb"),
        12.5,
    )
    .await
    .expect("create video")
}

#[tokio::test]
async fn refresh_rotation_is_single_use() {
    let Some(pool) = connect().await else { return };
    let secrets = test_secrets();
    let identity = new_identity(&pool, "rotator").await;

    let issued = tokens::issue_token_pair(&pool, &identity, &secrets)
        .await
        .expect("issue pair");

    // First presentation rotates.
    let (_, rotated) = tokens::rotate_refresh_token(&pool, &issued.refresh_token, &secrets)
        .await
        .expect("first rotation");
    assert_ne!(rotated.refresh_token, issued.refresh_token);

    // Replaying the consumed token fails and revokes the session.
    let replay = tokens::rotate_refresh_token(&pool, &issued.refresh_token, &secrets).await;
    assert!(matches!(replay, Err(Error::InvalidToken)));

    // The reuse cleared the stored digest, so even the latest token is dead.
    let after_revoke = tokens::rotate_refresh_token(&pool, &rotated.refresh_token, &secrets).await;
    assert!(matches!(after_revoke, Err(Error::InvalidToken)));
}

#[tokio::test]
async fn like_toggle_flips_between_states() {
    let Some(pool) = connect().await else { return };
    let identity = new_identity(&pool, "liker").await;
    let video = new_video(&pool, identity.id, "toggled video").await;

    let first = toggle::toggle_video_like(&pool, identity.id, video.id)
        .await
        .expect("first toggle");
    assert!(first.active);

    let second = toggle::toggle_video_like(&pool, identity.id, video.id)
        .await
        .expect("second toggle");
    assert!(!second.active);

    let third = toggle::toggle_video_like(&pool, identity.id, video.id)
        .await
        .expect("third toggle");
    assert!(third.active);

    let view = get_video(&pool, video.id, Some(identity.id))
        .await
        .expect("owner view");
    assert_eq!(view.like_count, 1);
    assert!(view.is_liked);
}

#[tokio::test]
async fn subscription_toggle_flips_and_rejects_self() {
    let Some(pool) = connect().await else { return };
    let subscriber = new_identity(&pool, "subscriber").await;
    let channel = new_identity(&pool, "channel").await;

    let on = toggle::toggle_subscription(&pool, subscriber.id, channel.id)
        .await
        .expect("subscribe");
    assert!(on.active);

    let off = toggle::toggle_subscription(&pool, subscriber.id, channel.id)
        .await
        .expect("unsubscribe");
    assert!(!off.active);

    let own = toggle::toggle_subscription(&pool, subscriber.id, subscriber.id).await;
    assert!(matches!(own, Err(Error::Validation(_))));
}

#[tokio::test]
async fn non_owner_mutation_is_permission_denied() {
    let Some(pool) = connect().await else { return };
    let owner = new_identity(&pool, "owner").await;
    let stranger = new_identity(&pool, "stranger").await;
    let video = new_video(&pool, owner.id, "guarded video").await;

    let update =
        video_store::update_video(&pool, video.id, stranger.id, "new title", "new desc", None)
            .await;
    assert!(matches!(update, Err(Error::PermissionDenied(_))));

    let delete = video_store::delete_video(&pool, video.id, stranger.id).await;
    assert!(matches!(delete, Err(Error::PermissionDenied(_))));

    let missing =
        video_store::update_video(&pool, Uuid::new_v4(), stranger.id, "t", "d", None).await;
    assert!(matches!(missing, Err(Error::NotFound(_))));

    let (updated, _) = video_store::update_video(&pool, video.id, owner.id, "new title", "d", None)
        .await
        .expect("owner update");
    assert_eq!(updated.title, "new title");
}

#[tokio::test]
async fn unpublished_videos_are_visible_only_to_their_owner() {
    let Some(pool) = connect().await else { return };
    let owner = new_identity(&pool, "creator").await;
    let stranger = new_identity(&pool, "viewer").await;
    let video = new_video(&pool, owner.id, "draft video").await;
    assert!(!video.is_published);

    assert!(matches!(
        get_video(&pool, video.id, None).await,
        Err(Error::NotFound(_))
    ));
    assert!(matches!(
        get_video(&pool, video.id, Some(stranger.id)).await,
        Err(Error::NotFound(_))
    ));
    let own = get_video(&pool, video.id, Some(owner.id))
        .await
        .expect("owner sees draft");
    assert_eq!(own.id, video.id);

    let public_filter = VideoFilter {
        owner: Some(owner.id),
        ..VideoFilter::default()
    };
    let listed = list_videos(
        &pool,
        &public_filter,
        SortField::CreatedAt,
        SortDirection::Desc,
        PageRequest::default(),
        None,
    )
    .await
    .expect("anonymous listing");
    assert_eq!(listed.total_items, 0);

    let now_published = video_store::toggle_publish(&pool, video.id, owner.id)
        .await
        .expect("publish");
    assert!(now_published);

    let listed = list_videos(
        &pool,
        &public_filter,
        SortField::CreatedAt,
        SortDirection::Desc,
        PageRequest::default(),
        None,
    )
    .await
    .expect("anonymous listing after publish");
    assert_eq!(listed.total_items, 1);
}

#[tokio::test]
async fn listing_pages_through_a_large_result_set() {
    let Some(pool) = connect().await else { return };
    let owner = new_identity(&pool, "prolific").await;
    for n in 0..25 {
        new_video(&pool, owner.id, &format!("video {n:02}")).await;
    }

    let filter = VideoFilter {
        owner: Some(owner.id),
        include_unpublished: true,
        ..VideoFilter::default()
    };
    let mut seen = std::collections::HashSet::new();
    for page in 1..=3 {
        let result = list_videos(
            &pool,
            &filter,
            SortField::CreatedAt,
            SortDirection::Desc,
            PageRequest { page, limit: 10 },
            Some(owner.id),
        )
        .await
        .expect("page");
        assert_eq!(result.total_items, 25);
        assert_eq!(result.total_pages, 3);
        assert_eq!(result.items.len(), if page < 3 { 10 } else { 5 });
        assert_eq!(result.has_next_page, page < 3);
        assert_eq!(result.has_prev_page, page > 1);
        for item in &result.items {
            assert!(seen.insert(item.id), "video repeated across pages");
        }
    }
    assert_eq!(seen.len(), 25);

    let past_the_end = list_videos(
        &pool,
        &filter,
        SortField::CreatedAt,
        SortDirection::Desc,
        PageRequest { page: 4, limit: 10 },
        Some(owner.id),
    )
    .await
    .expect("empty page");
    assert!(past_the_end.items.is_empty());
    assert!(!past_the_end.has_next_page);
}

#[tokio::test]
async fn playlist_order_is_stable_when_positions_tie() {
    let Some(pool) = connect().await else { return };
    let owner = new_identity(&pool, "curator").await;
    let playlist = playlist_store::create_playlist(&pool, owner.id, "mix", "a mix")
        .await
        .expect("create playlist");

    let mut ids = Vec::new();
    for n in 0..3 {
        let video = new_video(&pool, owner.id, &format!("track {n}")).await;
        playlist_store::add_video(&pool, playlist.id, video.id, owner.id)
            .await
            .expect("add video");
        ids.push(video.id);
    }

    let view = get_playlist(&pool, playlist.id, Some(owner.id))
        .await
        .expect("playlist view");
    let listed: Vec<Uuid> = view.videos.iter().map(|v| v.id).collect();
    assert_eq!(listed, ids, "entries follow insertion order");

    // Collapse every entry onto the same position, as concurrent adds can,
    // with add times running opposite to insertion order.
    for (n, id) in ids.iter().enumerate() {
        sqlx::query(
            "UPDATE playlist_videos SET position = 0, \
               added_at = now() - make_interval(mins => $3) \
             WHERE playlist_id = $1 AND video_id = $2",
        )
        .bind(playlist.id)
        .bind(id)
        .bind(n as i32)
        .execute(&pool)
        .await
        .expect("force tie");
    }

    let view = get_playlist(&pool, playlist.id, Some(owner.id))
        .await
        .expect("playlist view after tie");
    let listed: Vec<Uuid> = view.videos.iter().map(|v| v.id).collect();
    let expected: Vec<Uuid> = ids.iter().rev().copied().collect();
    assert_eq!(listed, expected, "tied positions order by add time");
}
