//! Store behaviour against a fresh in-memory database per test

use nexus_core::tags::DEFAULT_TAGS;
use nexus_core::{ConnectionPatch, NewConnection, NewPerson, PersonPatch, Profile};
use nexus_db::{Store, StoreError};
use pretty_assertions::assert_eq;

async fn store() -> Store {
    Store::in_memory().await.unwrap()
}

fn new_person(username: &str, first: &str, last: &str) -> NewPerson {
    NewPerson {
        username: Some(username.to_string()),
        first_name: first.to_string(),
        last_name: last.to_string(),
        ..NewPerson::default()
    }
}

async fn pair(store: &Store) -> (i64, i64) {
    let ann = store
        .create_person(&new_person("annlee", "Ann", "Lee"), None)
        .await
        .unwrap();
    let bob = store
        .create_person(&new_person("bobray", "Bob", "Ray"), None)
        .await
        .unwrap();
    (ann.id, bob.id)
}

fn connection(user_id: i64, contact_id: i64) -> NewConnection {
    NewConnection {
        user_id,
        contact_id,
        relationship_description: Some("Friend".into()),
        note: Some("Met at the climbing gym".into()),
        tags: vec!["friend".into(), "sports".into()],
        what_they_are_working_on: Some("A bouldering app".into()),
    }
}

// ═══════════════════════════════════════════════════════════════════════
// People
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_create_person_defaults_tags() {
    let store = store().await;
    let mut new = new_person("annlee", "Ann", "Lee");
    new.profile.university = Some("CMU".into());
    let ann = store.create_person(&new, None).await.unwrap();

    assert_eq!(ann.username, "annlee");
    assert_eq!(ann.profile.university.as_deref(), Some("CMU"));
    assert_eq!(ann.recent_tags, DEFAULT_TAGS.map(String::from).to_vec());
    assert_eq!(store.get_person(ann.id).await.unwrap(), Some(ann.clone()));
    assert_eq!(
        store.get_person_by_username("annlee").await.unwrap().map(|p| p.id),
        Some(ann.id)
    );
    assert_eq!(store.get_person(ann.id + 1).await.unwrap(), None);
}

#[tokio::test]
async fn test_create_person_requires_username() {
    let store = store().await;
    let mut new = new_person("", "Ann", "Lee");
    new.username = None;
    let err = store.create_person(&new, None).await.unwrap_err();
    assert_eq!(err.to_string(), "Missing required field: username");
}

#[tokio::test]
async fn test_duplicate_username_conflicts() {
    let store = store().await;
    store
        .create_person(&new_person("annlee", "Ann", "Lee"), None)
        .await
        .unwrap();
    let err = store
        .create_person(&new_person("annlee", "Annie", "Lee"), None)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Conflict(_)), "{err:?}");
}

#[tokio::test]
async fn test_create_person_with_password_adds_login() {
    let store = store().await;
    let ann = store
        .create_person(&new_person("annlee", "Ann", "Lee"), Some("pw1"))
        .await
        .unwrap();
    assert_eq!(store.verify_login("annlee", "pw1").await.unwrap(), Some(ann.id));
    assert_eq!(store.verify_login("annlee", "nope").await.unwrap(), None);
    assert_eq!(store.verify_login("ghost", "pw1").await.unwrap(), None);

    let summary = store.summary().await.unwrap();
    assert_eq!(summary.logins.len(), 1);
    assert!(summary.logins[0].last_login.is_some());
}

#[tokio::test]
async fn test_list_people_sorted_by_name() {
    let store = store().await;
    for (u, f, l) in [("zed", "Zed", "Ade"), ("amy", "Amy", "Zhu"), ("amyb", "Amy", "Bell")] {
        store.create_person(&new_person(u, f, l), None).await.unwrap();
    }
    let names: Vec<String> = store
        .list_people()
        .await
        .unwrap()
        .iter()
        .map(|p| p.full_name())
        .collect();
    assert_eq!(names, vec!["Amy Bell", "Amy Zhu", "Zed Ade"]);
}

#[tokio::test]
async fn test_search_people_matches_fields_and_escapes_wildcards() {
    let store = store().await;
    let mut ann = new_person("annlee", "Ann", "Lee");
    ann.profile.location = Some("Pittsburgh".into());
    ann.profile.field_of_interest = Some("100% robotics".into());
    store.create_person(&ann, None).await.unwrap();
    let mut bob = new_person("bobray", "Bob", "Ray");
    bob.profile.high_school = Some("Lincoln High".into());
    store.create_person(&bob, None).await.unwrap();

    let hits = |v: Vec<nexus_core::Person>| v.into_iter().map(|p| p.username).collect::<Vec<_>>();
    assert_eq!(hits(store.search_people("pitts").await.unwrap()), vec!["annlee"]);
    assert_eq!(hits(store.search_people("LINCOLN").await.unwrap()), vec!["bobray"]);
    assert_eq!(hits(store.search_people("0%").await.unwrap()), vec!["annlee"]);
    assert_eq!(hits(store.search_people("%").await.unwrap()), vec!["annlee"]);
    assert!(store.search_people("_").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_create_contact_generates_unique_usernames() {
    let store = store().await;
    let first = store
        .create_contact("Jane", "Doe", &Profile::default())
        .await
        .unwrap();
    let second = store
        .create_contact("Jane", "Doe", &Profile::default())
        .await
        .unwrap();
    let third = store
        .create_contact("Jane", "Doe", &Profile::default())
        .await
        .unwrap();
    assert_eq!(first.username, "janedoe");
    assert_eq!(second.username, "janedoe2");
    assert_eq!(third.username, "janedoe3");
    assert_eq!(first.recent_tags.len(), DEFAULT_TAGS.len());
}

#[tokio::test]
async fn test_update_person_applies_present_fields_only() {
    let store = store().await;
    let mut new = new_person("annlee", "Ann", "Lee");
    new.profile.email = Some("ann@example.com".into());
    new.profile.location = Some("Pittsburgh".into());
    let ann = store.create_person(&new, None).await.unwrap();

    let patch: PersonPatch = serde_json::from_value(serde_json::json!({
        "job_title": "Engineer",
        "email": null,
        "recent_tags": "work, climbing"
    }))
    .unwrap();
    let updated = store.update_person(ann.id, &patch).await.unwrap().unwrap();

    assert_eq!(updated.profile.job_title.as_deref(), Some("Engineer"));
    assert_eq!(updated.profile.email, None);
    assert_eq!(updated.profile.location.as_deref(), Some("Pittsburgh"));
    assert_eq!(updated.recent_tags, vec!["work", "climbing"]);
    assert_eq!(updated.first_name, "Ann");
}

#[tokio::test]
async fn test_update_person_edge_cases() {
    let store = store().await;
    let (ann, _) = pair(&store).await;

    let empty = PersonPatch::default();
    assert!(matches!(
        store.update_person(ann, &empty).await,
        Err(StoreError::Invalid(_))
    ));

    let rename = PersonPatch {
        username: Some("bobray".into()),
        ..PersonPatch::default()
    };
    assert!(matches!(
        store.update_person(ann, &rename).await,
        Err(StoreError::Conflict(_))
    ));

    let title = PersonPatch {
        job_title: Some(Some("CTO".into())),
        ..PersonPatch::default()
    };
    assert_eq!(store.update_person(9999, &title).await.unwrap(), None);
}

#[tokio::test]
async fn test_remember_tags_puts_unseen_tags_in_front() {
    let store = store().await;
    let (ann, _) = pair(&store).await;

    let tags = vec!["climbing".to_string(), "work".to_string()];
    assert!(store.remember_tags(ann, &tags).await.unwrap());
    let recent = store.recent_tags(ann).await.unwrap().unwrap();
    assert_eq!(recent[..3].to_vec(), vec!["climbing", "friend", "work"]);
    assert_eq!(recent.iter().filter(|t| *t == "work").count(), 1);

    assert!(!store.remember_tags(9999, &tags).await.unwrap());
    assert_eq!(store.recent_tags(9999).await.unwrap(), None);
}

#[tokio::test]
async fn test_remember_tags_respects_cap() {
    let store = store().await.with_max_recent_tags(3);
    let (ann, _) = pair(&store).await;
    let tags: Vec<String> = ["a", "b"].map(String::from).to_vec();
    store.remember_tags(ann, &tags).await.unwrap();
    assert_eq!(
        store.recent_tags(ann).await.unwrap().unwrap(),
        vec!["a", "b", "friend"]
    );
}

#[tokio::test]
async fn test_written_tag_lists_are_capped_and_normalized() {
    let store = store().await.with_max_recent_tags(20);
    let mut new = new_person("annlee", "Ann", "Lee");
    new.recent_tags = Some(vec!["a".into(), "a".into(), " b ".into()]);
    let ann = store.create_person(&new, None).await.unwrap();
    assert_eq!(ann.recent_tags, vec!["a", "b"]);

    let many: Vec<String> = (0..30).map(|i| format!("t{i}")).collect();
    let patch: PersonPatch =
        serde_json::from_value(serde_json::json!({ "recent_tags": many })).unwrap();
    store.update_person(ann.id, &patch).await.unwrap().unwrap();
    let recent = store.recent_tags(ann.id).await.unwrap().unwrap();
    assert_eq!(recent.len(), 20);
    assert_eq!(recent.first().map(String::as_str), Some("t0"));
    assert_eq!(recent.last().map(String::as_str), Some("t19"));

    let mut long = new_person("bobray", "Bob", "Ray");
    long.recent_tags = Some(many);
    let bob = store.create_person(&long, None).await.unwrap();
    assert_eq!(bob.recent_tags.len(), 20);
}

#[tokio::test]
async fn test_create_contact_survives_huge_numeric_suffix() {
    let store = store().await;
    store
        .create_person(&new_person("annlee", "Ann", "Lee"), None)
        .await
        .unwrap();
    store
        .create_person(&new_person("annlee18446744073709551615", "Ann", "Lee"), None)
        .await
        .unwrap();

    let contact = store
        .create_contact("Ann", "Lee", &Profile::default())
        .await
        .unwrap();
    assert_eq!(contact.username, "annlee2");
}

// ═══════════════════════════════════════════════════════════════════════
// Connections
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_add_connection_creates_both_directions() {
    let store = store().await;
    let (ann, bob) = pair(&store).await;
    store.add_connection(&connection(ann, bob)).await.unwrap();

    let outgoing = store.list_connections(ann).await.unwrap();
    assert_eq!(outgoing.len(), 1);
    let c = &outgoing[0];
    assert_eq!(c.contact.id, bob);
    assert_eq!(c.relationship_description.as_deref(), Some("Friend"));
    assert_eq!(c.note.as_deref(), Some("Met at the climbing gym"));
    assert_eq!(c.tags, vec!["friend", "sports"]);
    assert!(c.last_viewed.is_some());

    let reverse = store.list_connections(bob).await.unwrap();
    assert_eq!(reverse.len(), 1);
    assert_eq!(reverse[0].contact.id, ann);
    assert_eq!(reverse[0].relationship_description.as_deref(), Some("Friend"));
    assert_eq!(reverse[0].note, None);
    assert!(reverse[0].tags.is_empty());
}

#[tokio::test]
async fn test_add_connection_rejections() {
    let store = store().await;
    let (ann, bob) = pair(&store).await;

    assert!(matches!(
        store.add_connection(&connection(ann, ann)).await,
        Err(StoreError::Invalid(_))
    ));
    assert!(matches!(
        store.add_connection(&connection(ann, 9999)).await,
        Err(StoreError::NotFound(_))
    ));

    store.add_connection(&connection(ann, bob)).await.unwrap();
    assert!(matches!(
        store.add_connection(&connection(ann, bob)).await,
        Err(StoreError::Conflict(_))
    ));
    // the reverse row already exists, so bob -> ann is a duplicate too
    assert!(matches!(
        store.add_connection(&connection(bob, ann)).await,
        Err(StoreError::Conflict(_))
    ));
}

#[tokio::test]
async fn test_update_connection_shares_description_only() {
    let store = store().await;
    let (ann, bob) = pair(&store).await;
    store.add_connection(&connection(ann, bob)).await.unwrap();

    let patch = ConnectionPatch {
        relationship_description: Some(Some("Climbing Partner".into())),
        note: Some(None),
        tags: Some(vec!["climbing".into()]),
        what_they_are_working_on: None,
    };
    assert!(store.update_connection(ann, bob, &patch).await.unwrap());

    let forward = &store.list_connections(ann).await.unwrap()[0];
    assert_eq!(forward.relationship_description.as_deref(), Some("Climbing Partner"));
    assert_eq!(forward.note, None);
    assert_eq!(forward.tags, vec!["climbing"]);
    assert_eq!(forward.what_they_are_working_on.as_deref(), Some("A bouldering app"));

    let reverse = &store.list_connections(bob).await.unwrap()[0];
    assert_eq!(reverse.relationship_description.as_deref(), Some("Climbing Partner"));
    assert!(reverse.tags.is_empty());

    assert!(!store.update_connection(ann, 9999, &patch).await.unwrap());
}

#[tokio::test]
async fn test_touch_and_remove_connection() {
    let store = store().await;
    let (ann, bob) = pair(&store).await;
    assert!(!store.touch_last_viewed(ann, bob).await.unwrap());

    store.add_connection(&connection(ann, bob)).await.unwrap();
    // the reverse row starts without a view time
    assert_eq!(store.list_connections(bob).await.unwrap()[0].last_viewed, None);
    assert!(store.touch_last_viewed(bob, ann).await.unwrap());
    assert!(store.list_connections(bob).await.unwrap()[0].last_viewed.is_some());

    assert_eq!(store.remove_connection(bob, ann).await.unwrap(), 2);
    assert!(store.list_connections(ann).await.unwrap().is_empty());
    assert_eq!(store.remove_connection(ann, bob).await.unwrap(), 0);
}

// ═══════════════════════════════════════════════════════════════════════
// Logins and maintenance
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_add_login_and_touch() {
    let store = store().await;
    let (ann, bob) = pair(&store).await;

    assert!(!store.touch_last_login(ann).await.unwrap());
    store.add_login(ann, "annlee", "secret").await.unwrap();
    assert!(store.touch_last_login(ann).await.unwrap());
    assert!(matches!(
        store.add_login(bob, "annlee", "secret").await,
        Err(StoreError::Conflict(_))
    ));
    assert!(matches!(
        store.add_login(9999, "ghost", "secret").await,
        Err(StoreError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_ensure_login_renames_and_replaces() {
    let store = store().await;
    let (ann, _) = pair(&store).await;
    store.add_login(ann, "annlee", "old").await.unwrap();

    store.ensure_login(ann, "ann", "new").await.unwrap();
    assert_eq!(store.get_person(ann).await.unwrap().unwrap().username, "ann");
    assert_eq!(store.verify_login("ann", "new").await.unwrap(), Some(ann));
    assert_eq!(store.verify_login("annlee", "old").await.unwrap(), None);

    assert!(matches!(
        store.ensure_login(ann, "bobray", "x").await,
        Err(StoreError::Conflict(_))
    ));
}

#[tokio::test]
async fn test_set_all_passwords() {
    let store = store().await;
    let (ann, bob) = pair(&store).await;
    store.add_login(ann, "annlee", "old").await.unwrap();

    assert_eq!(store.set_all_passwords("shared").await.unwrap(), 2);
    assert_eq!(store.verify_login("annlee", "shared").await.unwrap(), Some(ann));
    assert_eq!(store.verify_login("bobray", "shared").await.unwrap(), Some(bob));
}

#[tokio::test]
async fn test_clean_test_data_above_threshold() {
    let store = store().await;
    let (ann, bob) = pair(&store).await;
    let extra = store
        .create_person(&new_person("tmp", "Temp", "User"), Some("pw"))
        .await
        .unwrap();
    store.add_connection(&connection(ann, bob)).await.unwrap();
    store.add_connection(&connection(ann, extra.id)).await.unwrap();

    let report = store.clean_test_data(bob).await.unwrap();
    assert_eq!(report.people, 1);
    assert_eq!(report.logins, 1);
    assert_eq!(report.relationships, 2);

    let summary = store.summary().await.unwrap();
    assert_eq!(summary.people.len(), 2);
    assert_eq!(summary.relationships.len(), 2);
    assert_eq!(summary.relationships[0].user_name, "Ann Lee");
    assert!(summary.to_string().contains("Ann Lee -> Bob Ray: Friend"));
}

#[tokio::test]
async fn test_wipe_resets_ids() {
    let store = store().await;
    pair(&store).await;
    store.wipe().await.unwrap();
    assert!(store.list_people().await.unwrap().is_empty());

    let ann = store
        .create_person(&new_person("annlee", "Ann", "Lee"), None)
        .await
        .unwrap();
    assert_eq!(ann.id, 1);
    store.ping().await.unwrap();
}
