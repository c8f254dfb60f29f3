use chrono::{TimeZone, Utc};
use interfaces::{InMemoryStoryStore, NoopStoryActions, StoryActions, StoryId, StoryItem, UserId, UserSummary};

fn story(id: &str, owner: &str) -> StoryItem {
    StoryItem {
        id: StoryId::new(id),
        owner_id: UserId::new(owner),
        owner_display_name: owner.to_string(),
        owner_avatar_url: None,
        media_url: format!("https://cdn.example.com/{id}.jpg"),
        music_preview_url: None,
        music_label: None,
        created_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        viewers: Vec::new(),
        likers: Vec::new(),
    }
}

#[tokio::test]
async fn test_views_are_deduplicated_but_logged() {
    let store = InMemoryStoryStore::new(vec![story("a", "alice")]);
    store.register_user(UserSummary::new("bob", "Bob")).await;
    let a = StoryId::new("a");
    let bob = UserId::new("bob");

    store.mark_viewed(&a, &bob).await.unwrap();
    store.mark_viewed(&a, &bob).await.unwrap();

    let stored = store.get(&a).await.unwrap();
    assert_eq!(stored.viewers, vec![UserSummary::new("bob", "Bob")]);
    assert_eq!(store.view_log().await.len(), 2);
}

#[tokio::test]
async fn test_view_of_unknown_story_fails() {
    let store = InMemoryStoryStore::new(Vec::new());
    let result = store
        .mark_viewed(&StoryId::new("missing"), &UserId::new("bob"))
        .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_toggle_like_flips() {
    let store = InMemoryStoryStore::new(vec![story("a", "alice")]);
    let a = StoryId::new("a");
    let bob = UserId::new("bob");

    store.toggle_like(&a, &bob).await.unwrap();
    let liked = store.get(&a).await.unwrap();
    assert!(liked.is_liked_by(&bob));
    // Unregistered users fall back to their id as display name.
    assert_eq!(liked.likers[0].display_name, "bob");

    store.toggle_like(&a, &bob).await.unwrap();
    assert!(!store.get(&a).await.unwrap().is_liked_by(&bob));
}

#[tokio::test]
async fn test_failure_switches() {
    let store = InMemoryStoryStore::new(vec![story("a", "alice")]);
    let a = StoryId::new("a");
    let alice = UserId::new("alice");

    store.set_fail_likes(true);
    store.set_fail_deletes(true);
    assert!(store.toggle_like(&a, &alice).await.is_err());
    assert!(store.delete_story(&a, &alice).await.is_err());
    assert!(store.get(&a).await.unwrap().likers.is_empty());

    store.set_fail_deletes(false);
    store.delete_story(&a, &alice).await.unwrap();
    assert!(store.stories().await.is_empty());
}

#[tokio::test]
async fn test_only_owner_can_delete() {
    let store = InMemoryStoryStore::new(vec![story("a", "alice")]);
    let a = StoryId::new("a");

    assert!(store.delete_story(&a, &UserId::new("bob")).await.is_err());
    assert!(store.get(&a).await.is_some());
}

#[tokio::test]
async fn test_close_is_counted() {
    let store = InMemoryStoryStore::new(Vec::new());
    store.on_close();
    store.on_close();
    assert_eq!(store.close_count(), 2);

    // Nothing to observe, but every call must succeed.
    let noop = NoopStoryActions;
    let a = StoryId::new("a");
    let bob = UserId::new("bob");
    assert!(noop.mark_viewed(&a, &bob).await.is_ok());
    assert!(noop.toggle_like(&a, &bob).await.is_ok());
    assert!(noop.delete_story(&a, &bob).await.is_ok());
    noop.on_close();
}

#[test]
fn test_story_item_wire_format() {
    let raw = r#"{
        "id": "s1",
        "ownerId": "alice",
        "ownerDisplayName": "Alice",
        "mediaUrl": "https://cdn.example.com/s1.jpg",
        "musicPreviewUrl": "https://cdn.example.com/song.mp3",
        "createdAt": "2024-05-01T12:00:00Z",
        "likers": [{ "id": "bob", "displayName": "Bob" }]
    }"#;

    let item: StoryItem = serde_json::from_str(raw).unwrap();
    assert_eq!(item.id, StoryId::new("s1"));
    assert_eq!(item.owner_id.as_str(), "alice");
    assert_eq!(item.music_label, None);
    assert!(item.viewers.is_empty());
    assert!(item.is_liked_by(&UserId::new("bob")));

    let json = serde_json::to_value(&item).unwrap();
    assert_eq!(json["ownerId"], "alice");
    assert!(json.get("musicLabel").is_none());
}
