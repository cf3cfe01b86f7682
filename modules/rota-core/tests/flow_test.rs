//! Command-handler flows over the in-memory store.

use std::sync::Arc;

use futures::StreamExt;

use rota_common::RotaError;
use rota_core::{AddPersonBy, ChoreService, User, CHORE_UPDATES_CHANNEL};
use rota_store::{MemoryStore, Store};

async fn service_with_users(users: &[(&str, &str)]) -> (Arc<MemoryStore>, ChoreService, Vec<User>) {
    let store = Arc::new(MemoryStore::new());
    let service = ChoreService::new(store.clone());
    let mut created = Vec::new();
    for (email, name) in users {
        let user = User::new(email, name);
        service.users().save(&user).await.unwrap();
        created.push(user);
    }
    (store, service, created)
}

#[tokio::test]
async fn create_enrolls_owner_and_publishes() {
    let (store, service, users) =
        service_with_users(&[("alice@example.com", "Alice")]).await;
    let alice = &users[0];

    let mut sub = store.subscribe(CHORE_UPDATES_CHANNEL).await.unwrap();
    let chore = service.create_chore(alice, "dishes").await.unwrap();

    assert_eq!(chore.owner_id, alice.id);
    assert_eq!(chore.people.len(), 1);
    assert_eq!(chore.people[0].user_id.as_deref(), Some(alice.id.as_str()));

    let event: serde_json::Value =
        serde_json::from_slice(&sub.next().await.unwrap()).unwrap();
    assert_eq!(event["type"], "chore_created");
    assert_eq!(event["chore_id"], chore.id);

    // Owner's membership index tracks the new chore.
    let alice = service.users().get(&alice.id).await.unwrap().unwrap();
    assert_eq!(alice.chore_ids, vec![chore.id]);
}

#[tokio::test]
async fn join_syncs_share_list_and_membership_index() {
    let (store, service, users) = service_with_users(&[
        ("alice@example.com", "Alice"),
        ("bob@example.com", "Bob"),
    ])
    .await;
    let (alice, bob) = (&users[0], &users[1]);

    let chore = service.create_chore(alice, "dishes").await.unwrap();
    let mut sub = store.subscribe(CHORE_UPDATES_CHANNEL).await.unwrap();

    let chore = service.join_chore(bob, &chore.id).await.unwrap();
    assert!(chore.shared_with.contains(&bob.id));
    assert!(chore.person_for_user(&bob.id).is_some());

    let event: serde_json::Value =
        serde_json::from_slice(&sub.next().await.unwrap()).unwrap();
    assert_eq!(event["type"], "user_joined");
    assert_eq!(event["person"]["user_id"], bob.id);

    let bob = service.users().get(&bob.id).await.unwrap().unwrap();
    assert_eq!(bob.chore_ids, vec![chore.id.clone()]);

    // Joining twice is rejected.
    let err = service.join_chore(&users[1], &chore.id).await.unwrap_err();
    assert!(matches!(err, RotaError::InvalidState(_)));
}

#[tokio::test]
async fn add_person_by_email_resolves_the_account() {
    let (_store, service, users) = service_with_users(&[
        ("alice@example.com", "Alice"),
        ("bob@example.com", "Bob"),
    ])
    .await;
    let (alice, bob) = (&users[0], &users[1]);

    let chore = service.create_chore(alice, "dishes").await.unwrap();
    let chore = service
        .add_person(&alice.id, &chore.id, AddPersonBy::Email("Bob@Example.com".into()))
        .await
        .unwrap();

    let slot = chore.person_for_user(&bob.id).unwrap();
    assert_eq!(slot.name, "Bob");
    assert!(chore.shared_with.contains(&bob.id));

    let err = service
        .add_person(&alice.id, &chore.id, AddPersonBy::Email("nobody@example.com".into()))
        .await
        .unwrap_err();
    assert!(matches!(err, RotaError::NotFound(_)));
}

#[tokio::test]
async fn strangers_cannot_see_or_mutate() {
    let (_store, service, users) = service_with_users(&[
        ("alice@example.com", "Alice"),
        ("mallory@example.com", "Mallory"),
    ])
    .await;
    let (alice, mallory) = (&users[0], &users[1]);

    let chore = service.create_chore(alice, "dishes").await.unwrap();

    assert!(matches!(
        service.get_chore(&mallory.id, &chore.id).await.unwrap_err(),
        RotaError::Forbidden(_)
    ));
    assert!(matches!(
        service.advance(&mallory.id, &chore.id).await.unwrap_err(),
        RotaError::Forbidden(_)
    ));
    assert!(matches!(
        service.delete_chore(&mallory.id, &chore.id).await.unwrap_err(),
        RotaError::Forbidden(_)
    ));
    assert!(service.list_chores(&mallory.id).await.unwrap().is_empty());
    assert_eq!(service.list_chores(&alice.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn member_leaves_owner_removes_events_differ() {
    let (store, service, users) = service_with_users(&[
        ("alice@example.com", "Alice"),
        ("bob@example.com", "Bob"),
        ("carol@example.com", "Carol"),
    ])
    .await;
    let (alice, bob, carol) = (&users[0], &users[1], &users[2]);

    let chore = service.create_chore(alice, "dishes").await.unwrap();
    service.join_chore(bob, &chore.id).await.unwrap();
    let chore = service.join_chore(carol, &chore.id).await.unwrap();

    let mut sub = store.subscribe(CHORE_UPDATES_CHANNEL).await.unwrap();

    // Bob leaves on his own.
    let bob_slot = chore.person_for_user(&bob.id).unwrap().id.clone();
    let chore = service
        .remove_person(&bob.id, &chore.id, &bob_slot)
        .await
        .unwrap();
    assert!(!chore.shared_with.contains(&bob.id));
    let event: serde_json::Value =
        serde_json::from_slice(&sub.next().await.unwrap()).unwrap();
    assert_eq!(event["type"], "user_left");

    // The owner removes Carol.
    let carol_slot = chore.person_for_user(&carol.id).unwrap().id.clone();
    let chore = service
        .remove_person(&alice.id, &chore.id, &carol_slot)
        .await
        .unwrap();
    assert!(!chore.shared_with.contains(&carol.id));
    let event: serde_json::Value =
        serde_json::from_slice(&sub.next().await.unwrap()).unwrap();
    assert_eq!(event["type"], "user_removed");

    let carol = service.users().get(&carol.id).await.unwrap().unwrap();
    assert!(carol.chore_ids.is_empty());
}

#[tokio::test]
async fn owner_slot_is_immovable() {
    let (_store, service, users) = service_with_users(&[
        ("alice@example.com", "Alice"),
        ("bob@example.com", "Bob"),
    ])
    .await;
    let (alice, bob) = (&users[0], &users[1]);

    let chore = service.create_chore(alice, "dishes").await.unwrap();
    service.join_chore(bob, &chore.id).await.unwrap();
    let owner_slot = chore.person_for_user(&alice.id).unwrap().id.clone();

    for actor in [&alice.id, &bob.id] {
        let err = service
            .remove_person(actor, &chore.id, &owner_slot)
            .await
            .unwrap_err();
        assert!(matches!(err, RotaError::Forbidden(_)));
    }
}

#[tokio::test]
async fn delete_clears_membership_indexes_and_publishes() {
    let (store, service, users) = service_with_users(&[
        ("alice@example.com", "Alice"),
        ("bob@example.com", "Bob"),
    ])
    .await;
    let (alice, bob) = (&users[0], &users[1]);

    let chore = service.create_chore(alice, "dishes").await.unwrap();
    service.join_chore(bob, &chore.id).await.unwrap();

    let mut sub = store.subscribe(CHORE_UPDATES_CHANNEL).await.unwrap();
    service.delete_chore(&alice.id, &chore.id).await.unwrap();

    let event: serde_json::Value =
        serde_json::from_slice(&sub.next().await.unwrap()).unwrap();
    assert_eq!(event["type"], "chore_deleted");
    assert!(event.get("chore").is_none());

    assert!(matches!(
        service.get_chore(&alice.id, &chore.id).await.unwrap_err(),
        RotaError::NotFound(_)
    ));
    for user in [alice, bob] {
        let record = service.users().get(&user.id).await.unwrap().unwrap();
        assert!(record.chore_ids.is_empty());
    }
}

#[tokio::test]
async fn advance_publishes_new_current_person() {
    let (store, service, users) = service_with_users(&[
        ("alice@example.com", "Alice"),
        ("bob@example.com", "Bob"),
    ])
    .await;
    let (alice, bob) = (&users[0], &users[1]);

    let chore = service.create_chore(alice, "dishes").await.unwrap();
    service.join_chore(bob, &chore.id).await.unwrap();

    let mut sub = store.subscribe(CHORE_UPDATES_CHANNEL).await.unwrap();
    let chore = service.advance(&bob.id, &chore.id).await.unwrap();
    assert_eq!(chore.current_person_index, 1);

    let event: serde_json::Value =
        serde_json::from_slice(&sub.next().await.unwrap()).unwrap();
    assert_eq!(event["type"], "queue_advanced");
    assert_eq!(event["new_current_person"]["user_id"], bob.id);
}
