use serde_json::json;
use silencer::{
    config::{PluginSettings, SettingsSlot},
    host::{Broadcast, MemoryHost},
    plugin::{CommandRouter, LIST_CHANGED_EVENT},
};

fn setup() -> (MemoryHost, CommandRouter<MemoryHost>) {
    let host = MemoryHost::new()
        .with_user("u-alice", "alice")
        .with_user("u-bob", "bob")
        .with_user("u-carol", "carol");
    let router = CommandRouter::new(host.clone(), SettingsSlot::default());
    (host, router)
}

fn stored(host: &MemoryHost, owner: &str) -> Vec<String> {
    serde_json::from_slice(&host.raw(&format!("{}-block-list", owner)).unwrap()).unwrap()
}

#[tokio::test]
async fn alice_silences_and_allows_bob() {
    let (host, router) = setup();
    router.activate().await.unwrap();

    let response = router.execute("u-alice", "/silencer @bob").await;
    assert_eq!(response.text, "@alice asked @bob to be quiet");
    assert_eq!(stored(&host, "u-alice"), vec!["bob"]);

    let response = router.execute("u-alice", "/silencer").await;
    assert_eq!(response.text, "###### Users you've silenced:\n@bob\n");

    let response = router.execute("u-alice", "/silencer @bob").await;
    assert_eq!(response.text, "@alice allowed @bob to speak");
    assert!(stored(&host, "u-alice").is_empty());

    let response = router.execute("u-alice", "/silencer clear").await;
    assert_eq!(response.text, "List cleared");
    assert!(stored(&host, "u-alice").is_empty());

    let response = router.execute("u-alice", "/silencer").await;
    assert_eq!(response.text, "###### You have no silenced users\n");
}

#[tokio::test]
async fn every_read_and_write_is_published_to_owner() {
    let (host, router) = setup();
    router.execute("u-alice", "/silencer @bob").await;
    let events = host.take_events();
    // toggle reads, then writes
    assert_eq!(events.len(), 2);
    assert!(events.iter().all(|event| event.name == LIST_CHANGED_EVENT));
    assert!(events.iter().all(|event| event.broadcast == Broadcast::user("u-alice")));
    assert_eq!(events[0].payload, json!({ "list": [] }));
    assert_eq!(events[1].payload, json!({ "list": ["bob"] }));

    router.execute("u-alice", "/silencer").await;
    let events = host.take_events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].payload, json!({ "list": ["bob"] }));
}

#[tokio::test]
async fn reload_disables_read_notifications() {
    let (host, router) = setup();
    router
        .settings()
        .replace(PluginSettings {
            notify_on_read: false,
            ..PluginSettings::default()
        })
        .unwrap();
    router.execute("u-alice", "/silencer").await;
    assert!(host.events().is_empty());
    router.execute("u-alice", "/silencer clear").await;
    assert_eq!(host.events().len(), 1);
}

#[tokio::test]
async fn lists_are_per_owner() {
    let (host, router) = setup();
    router.execute("u-alice", "/silencer @bob").await;
    router.execute("u-carol", "/silencer @alice").await;
    router.execute("u-carol", "/silencer @bob").await;
    assert_eq!(stored(&host, "u-alice"), vec!["bob"]);
    assert_eq!(stored(&host, "u-carol"), vec!["alice", "bob"]);
}

#[tokio::test]
async fn toggle_preserves_insertion_order() {
    let (host, router) = setup();
    router.execute("u-alice", "/silencer @bob").await;
    router.execute("u-alice", "/silencer @carol").await;
    router.execute("u-alice", "/silencer @alice").await;
    router.execute("u-alice", "/silencer @carol").await;
    assert_eq!(stored(&host, "u-alice"), vec!["bob", "alice"]);
}

#[tokio::test]
async fn deleted_user_can_not_be_toggled_off() {
    let (host, router) = setup();
    router.execute("u-alice", "/silencer @bob").await;
    host.remove_user("u-bob");

    let response = router.execute("u-alice", "/silencer").await;
    assert_eq!(response.text, "###### Users you've silenced:\n");

    let response = router.execute("u-alice", "/silencer @bob").await;
    assert_eq!(response.text, "Cannot get the other user");
    assert_eq!(stored(&host, "u-alice"), vec!["bob"]);
}

#[tokio::test]
async fn malformed_list_is_reported_not_repaired() {
    let (host, router) = setup();
    host.put_raw("u-alice-block-list", b"not json".to_vec());
    let response = router.execute("u-alice", "/silencer @bob").await;
    assert!(response.text.starts_with("Unable to read kv"));
    assert_eq!(host.raw("u-alice-block-list").unwrap(), b"not json".to_vec());

    let response = router.execute("u-alice", "/silencer clear").await;
    assert_eq!(response.text, "List cleared");
    assert!(stored(&host, "u-alice").is_empty());
}

#[tokio::test]
async fn failed_clear_is_reported() {
    let (host, router) = setup();
    host.fail_writes(true);
    let response = router.execute("u-alice", "/silencer clear").await;
    assert!(response.text.starts_with("Unable to save"));
    assert!(host.events().is_empty());
}

#[tokio::test]
async fn unknown_subcommand_is_echoed() {
    let (host, router) = setup();
    let response = router.execute("u-alice", "/silencer foo").await;
    assert_eq!(response.text, "Unknown command: foo");
    assert!(host.events().is_empty());
}
