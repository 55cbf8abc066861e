//! End-to-end dispatcher scenarios over the in-memory store

mod helpers;

use helpers::*;
use nms_common::db::StoryStatus;
use nms_common::events::{MosEvent, Topic};

#[tokio::test]
async fn test_create_then_insert_then_resend_insert() {
    let mut gateway = Gateway::in_memory();

    let ack = gateway
        .send_ok("<mos><roCreate><roID>RO-1</roID><storySlug>x</storySlug></roCreate></mos>")
        .await;
    assert_eq!(ack.ro_id, "RO-1");
    assert!(ack.render().contains("<status>OK</status>"));

    let insert = "<mos><roStoryInsert><roID>RO-1</roID><storyID>S-1</storyID><storySlug>Breaking</storySlug></roStoryInsert></mos>";
    gateway.send_ok(insert).await;
    gateway.send_ok(insert).await;

    assert_eq!(gateway.story_order("RO-1").await, vec!["S-1"]);

    let rundown_id = gateway.rundown_id("RO-1").await.unwrap();
    let story = gateway
        .store
        .find_story(rundown_id, "S-1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(story.title, "Breaking");
    assert_eq!(story.client_id, CLIENT_ID);

    let events = gateway.drain_events();
    let actions: Vec<_> = events.iter().map(|n| n.event.action()).collect();
    assert_eq!(actions, vec!["RO_CREATE", "STORY_INSERT", "STORY_INSERT"]);
    assert_eq!(events[1].topic, Topic::Story);
    assert!(matches!(
        events[2].event,
        MosEvent::StoryInsert { created: false, .. }
    ));
}

#[tokio::test]
async fn test_fragment_inside_full_mos_header() {
    let gateway = Gateway::in_memory();
    let message = r#"<?xml version="1.0" encoding="UTF-8"?>
<mos>
  <mosID>aveed.mos</mosID>
  <ncsID>NCS01</ncsID>
  <messageID>1001</messageID>
  <roCreate>
    <roID>RO-7</roID>
    <roSlug>Evening News</roSlug>
    <mosExternalMetadata>
      <mosScope>PLAYLIST</mosScope>
    </mosExternalMetadata>
  </roCreate>
</mos>"#;

    gateway.send_ok(message).await;
    let rundown_id = gateway.rundown_id("RO-7").await.unwrap();
    let rundown = gateway
        .store
        .find_rundown(CLIENT_ID, "RO-7")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(rundown.id, rundown_id);
    assert_eq!(rundown.slug, "Evening News");
    assert_eq!(rundown.meta.as_deref(), Some("<mosScope>PLAYLIST</mosScope>"));
}

#[tokio::test]
async fn test_ro_create_resend_updates_one_rundown_in_place() {
    let mut gateway = Gateway::in_memory();
    gateway.send_ok(&ro_create("RO-1", "First")).await;
    let rundown_id = gateway.rundown_id("RO-1").await.unwrap();
    gateway.send_ok(&ro_create("RO-1", "Second")).await;

    let rundown = gateway
        .store
        .find_rundown(CLIENT_ID, "RO-1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(rundown.id, rundown_id);
    assert_eq!(rundown.slug, "Second");

    match gateway.drain_events().last().map(|n| &n.event) {
        Some(MosEvent::RoCreate { slug, created, .. }) => {
            assert_eq!(slug, "Second");
            assert!(!created);
        }
        other => panic!("expected RoCreate event, got {:?}", other),
    }
}

#[tokio::test]
async fn test_replace_unknown_rundown_creates_it() {
    let gateway = Gateway::in_memory();
    gateway
        .send_ok("<mos><roReplace><roID>RO-2</roID><roSlug>Late</roSlug></roReplace></mos>")
        .await;
    assert!(gateway.rundown_id("RO-2").await.is_some());
}

#[tokio::test]
async fn test_update_and_delete_unknown_are_ok_noops() {
    let mut gateway = Gateway::in_memory();

    let ack = gateway
        .send_ok("<mos><roUpdate><roID>RO-X</roID><roSlug>y</roSlug></roUpdate></mos>")
        .await;
    assert!(ack.message.starts_with("roUpdate processed"));
    gateway
        .send_ok("<mos><roDelete><roID>RO-X</roID></roDelete></mos>")
        .await;

    assert!(gateway.rundown_id("RO-X").await.is_none());
    let events = gateway.drain_events();
    assert!(matches!(events[0].event, MosEvent::RoUpdate { found: false, .. }));
    assert!(matches!(events[1].event, MosEvent::RoDelete { found: false, .. }));
}

#[tokio::test]
async fn test_delete_rundown_cascades_to_stories() {
    let gateway = Gateway::in_memory();
    seed(&gateway, "RO-1", &["A", "B"]).await;
    let rundown_id = gateway.rundown_id("RO-1").await.unwrap();

    gateway
        .send_ok("<mos><roDelete><roID>RO-1</roID></roDelete></mos>")
        .await;
    assert!(gateway.rundown_id("RO-1").await.is_none());
    assert!(gateway.store.list_stories(rundown_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_story_insert_unknown_rundown_is_error_ack() {
    let mut gateway = Gateway::in_memory();
    let ack = gateway.send(&story_insert("RO-404", "S-1", "x")).await.unwrap();

    assert!(!ack.is_ok());
    assert_eq!(ack.ro_id, "RO-404");
    assert!(ack.message.contains("RO-404"));
    assert!(gateway.rundown_id("RO-404").await.is_none());
    assert!(gateway.drain_events().is_empty());
}

#[tokio::test]
async fn test_story_replace_keeps_position() {
    let gateway = Gateway::in_memory();
    seed(&gateway, "RO-1", &["A", "B", "C"]).await;

    gateway
        .send_ok("<mos><roStoryReplace><roID>RO-1</roID><storyID>B</storyID><storySlug>B v2</storySlug></roStoryReplace></mos>")
        .await;

    assert_eq!(gateway.story_order("RO-1").await, vec!["A", "B", "C"]);
    let rundown_id = gateway.rundown_id("RO-1").await.unwrap();
    let story = gateway.store.find_story(rundown_id, "B").await.unwrap().unwrap();
    assert_eq!(story.title, "B v2");
}

#[tokio::test]
async fn test_story_delete_compacts() {
    let gateway = Gateway::in_memory();
    seed(&gateway, "RO-1", &["A", "B", "C"]).await;

    gateway
        .send_ok("<mos><roStoryDelete><roID>RO-1</roID><storyID>A</storyID></roStoryDelete></mos>")
        .await;

    let rundown_id = gateway.rundown_id("RO-1").await.unwrap();
    let positions: Vec<_> = gateway
        .store
        .list_stories(rundown_id)
        .await
        .unwrap()
        .into_iter()
        .map(|story| (story.external_id, story.position))
        .collect();
    assert_eq!(positions, vec![("B".to_string(), 0), ("C".to_string(), 1)]);
}

#[tokio::test]
async fn test_story_move_variants() {
    let gateway = Gateway::in_memory();
    seed(&gateway, "RO-1", &["A", "B", "C", "D"]).await;

    gateway.send_ok(&story_move("RO-1", "D", Some("A"), Some("B"))).await;
    assert_eq!(gateway.story_order("RO-1").await, vec!["A", "D", "B", "C"]);

    gateway.send_ok(&story_move("RO-1", "C", None, Some("A"))).await;
    assert_eq!(gateway.story_order("RO-1").await, vec!["C", "A", "D", "B"]);

    gateway.send_ok(&story_move("RO-1", "C", None, None)).await;
    assert_eq!(gateway.story_order("RO-1").await, vec!["A", "D", "B", "C"]);
}

#[tokio::test]
async fn test_story_move_missing_story_is_error_and_order_unchanged() {
    let gateway = Gateway::in_memory();
    seed(&gateway, "RO-1", &["A", "B"]).await;

    let ack = gateway.send(&story_move("RO-1", "Z", Some("A"), None)).await.unwrap();
    assert!(!ack.is_ok());
    assert_eq!(gateway.story_order("RO-1").await, vec!["A", "B"]);
}

#[tokio::test]
async fn test_story_swap_exchanges_exactly_two() {
    let gateway = Gateway::in_memory();
    seed(&gateway, "RO-1", &["A", "B", "C", "D"]).await;

    gateway.send_ok(&story_swap("RO-1", "A", "C")).await;
    assert_eq!(gateway.story_order("RO-1").await, vec!["C", "B", "A", "D"]);

    // Swapping a story with itself changes nothing
    gateway.send_ok(&story_swap("RO-1", "B", "B")).await;
    assert_eq!(gateway.story_order("RO-1").await, vec!["C", "B", "A", "D"]);
}

#[tokio::test]
async fn test_story_swap_across_rundowns_is_not_found() {
    let gateway = Gateway::in_memory();
    seed(&gateway, "RO-1", &["A", "B"]).await;
    seed(&gateway, "RO-2", &["X"]).await;

    let ack = gateway.send(&story_swap("RO-1", "A", "X")).await.unwrap();
    assert!(!ack.is_ok());
    assert_eq!(gateway.story_order("RO-1").await, vec!["A", "B"]);
    assert_eq!(gateway.story_order("RO-2").await, vec!["X"]);
}

#[tokio::test]
async fn test_story_status_known_unknown_and_cross_rundown() {
    let gateway = Gateway::in_memory();
    seed(&gateway, "RO-1", &["A"]).await;
    seed(&gateway, "RO-2", &["B"]).await;
    let rundown_id = gateway.rundown_id("RO-1").await.unwrap();

    gateway.send_ok(&story_status("RO-1", "A", " approved ")).await;
    let story = gateway.store.find_story(rundown_id, "A").await.unwrap().unwrap();
    assert_eq!(story.status, Some(StoryStatus::Approved));

    // Unknown value is tolerated and clears the status
    gateway.send_ok(&story_status("RO-1", "A", "ON-AIR-NOW")).await;
    let story = gateway.store.find_story(rundown_id, "A").await.unwrap().unwrap();
    assert_eq!(story.status, None);

    // Story of another rundown cannot be addressed through RO-1
    let ack = gateway.send(&story_status("RO-1", "B", "DRAFT")).await.unwrap();
    assert!(!ack.is_ok());
}

#[tokio::test]
async fn test_unrecognized_messages_get_no_ack() {
    let mut gateway = Gateway::in_memory();

    assert!(gateway.send("<mos><heartbeat/></mos>").await.is_none());
    assert!(gateway.send("<roCreate><roID>RO-1</roID></roCreate>").await.is_none());
    assert!(gateway.send("").await.is_none());
    assert!(gateway.rundown_id("RO-1").await.is_none());
    assert!(gateway.drain_events().is_empty());
}

#[tokio::test]
async fn test_empty_ro_id_is_error_ack() {
    let gateway = Gateway::in_memory();
    let ack = gateway
        .send("<mos><roStorySwap><storyID1>A</storyID1></roStorySwap></mos>")
        .await
        .unwrap();
    assert!(!ack.is_ok());
    assert_eq!(ack.ro_id, "");
}

#[tokio::test]
async fn test_insert_with_position_hint() {
    let gateway = Gateway::in_memory();
    seed(&gateway, "RO-1", &["A", "B"]).await;

    gateway
        .send_ok("<mos><roStoryInsert><roID>RO-1</roID><storyID>N</storyID><storySlug>New</storySlug><storyIDAfter>A</storyIDAfter></roStoryInsert></mos>")
        .await;
    assert_eq!(gateway.story_order("RO-1").await, vec!["N", "A", "B"]);
}

#[tokio::test]
async fn test_concurrent_inserts_on_one_rundown_keep_dense_order() {
    let gateway = std::sync::Arc::new(Gateway::in_memory());
    seed(&gateway, "RO-1", &[]).await;

    let mut tasks = Vec::new();
    for i in 0..20 {
        let gateway = std::sync::Arc::clone(&gateway);
        tasks.push(tokio::spawn(async move {
            gateway
                .send_ok(&story_insert("RO-1", &format!("S-{}", i), "x"))
                .await;
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    let rundown_id = gateway.rundown_id("RO-1").await.unwrap();
    let stories = gateway.store.list_stories(rundown_id).await.unwrap();
    assert_eq!(stories.len(), 20);
    for (index, story) in stories.iter().enumerate() {
        assert_eq!(story.position, index as i64);
    }
}

#[tokio::test]
async fn test_stray_unclosed_tag_does_not_hide_balanced_command() {
    let gateway = Gateway::in_memory();
    seed(&gateway, "RO-1", &["A", "B"]).await;

    let message = "<mos><roCreate>\
                   <roStoryDelete><roID>RO-1</roID><storyID>A</storyID></roStoryDelete>\
                   </mos>";
    let ack = gateway.send_ok(message).await;
    assert_eq!(ack.message, "roStoryDelete processed");
    assert_eq!(gateway.story_order("RO-1").await, vec!["B"]);
}
