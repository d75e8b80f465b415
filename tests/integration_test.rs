//! Integration tests for the normalized cache's end-to-end workflows.
//!
//! Test coverage areas:
//! - Normalize-then-read round trips through the public `Store` façade
//! - Fragment handling against a live store
//! - Read-write transactions that write, then read back their own writes
//! - Subscriber notification across a realistic multi-field update

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use graphql_cache::{Store, Subscriber};
use graphql_cache_executor::{Field, GraphQLOperation, Selection};
use graphql_cache_types::{CacheKey, FieldValue, RecordSet, Scalar};

fn cache_key_for_object() -> Option<graphql_cache_executor::CacheKeyForObject> {
    Some(Arc::new(|obj: &serde_json::Value| obj.get("id").cloned()))
}

fn hero_payload() -> serde_json::Value {
    serde_json::json!({
        "hero": {
            "__typename": "Droid",
            "id": "2001",
            "name": "R2-D2",
            "primaryFunction": "Astromech",
        }
    })
}

mod normalize_and_read {
    use super::*;

    #[tokio::test]
    async fn writing_a_payload_then_reading_it_back_through_the_store_round_trips() {
        let store = Store::in_memory(cache_key_for_object());

        let operation = GraphQLOperation::query(vec![Selection::field(Field::object(
            "hero",
            vec![
                Selection::field(Field::scalar("__typename")),
                Selection::field(Field::scalar("name")),
            ],
        ))]);

        store
            .within_read_write_transaction(|txn| {
                let operation = operation.clone();
                let payload = hero_payload();
                async move { txn.write(payload, &operation).await }
            })
            .await
            .expect("write transaction should succeed");

        let result = store.load(&operation).await.expect("load should succeed");

        assert_eq!(result.data["hero"]["name"], serde_json::json!("R2-D2"));
        assert_eq!(result.data["hero"]["__typename"], serde_json::json!("Droid"));
        assert!(result.dependent_keys.contains(&CacheKey::query_root()));
        assert!(result.dependent_keys.contains(&CacheKey::new("2001")));
    }

    #[tokio::test]
    async fn a_fragment_on_a_non_matching_typename_reads_back_without_the_field() {
        let store = Store::in_memory(cache_key_for_object());

        let operation = GraphQLOperation::query(vec![Selection::field(Field::object(
            "hero",
            vec![
                Selection::field(Field::scalar("name")),
                Selection::fragment(
                    Some("Human"),
                    vec![Selection::field(Field::scalar("homePlanet"))],
                ),
            ],
        ))]);

        store
            .within_read_write_transaction(|txn| {
                let operation = operation.clone();
                let payload = hero_payload();
                async move { txn.write(payload, &operation).await }
            })
            .await
            .expect("write should succeed even though the payload never mentions homePlanet");

        let result = store.load(&operation).await.expect("read should succeed, not error");
        assert_eq!(result.data["hero"]["name"], serde_json::json!("R2-D2"));
        assert!(result.data["hero"].get("homePlanet").is_none());
    }
}

mod update_in_place {
    use super::*;

    #[tokio::test]
    async fn update_mutates_in_place_and_a_repeat_update_notifies_nothing_further() {
        let store = Store::in_memory(cache_key_for_object());
        let operation = GraphQLOperation::query(vec![Selection::field(Field::object(
            "hero",
            vec![Selection::field(Field::scalar("name"))],
        ))]);

        store
            .within_read_write_transaction(|txn| {
                let operation = operation.clone();
                let payload = hero_payload();
                async move { txn.write(payload, &operation).await }
            })
            .await
            .unwrap();

        struct Recorder {
            seen: Mutex<Vec<HashSet<String>>>,
        }
        impl Subscriber for Recorder {
            fn did_change_keys(
                &self,
                changed_keys: &HashSet<String>,
                _context_identifier: Option<&str>,
            ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
                self.seen.lock().unwrap().push(changed_keys.clone());
                Ok(())
            }
        }
        let recorder = Arc::new(Recorder { seen: Mutex::new(Vec::new()) });
        store.subscribe(recorder.clone()).await;

        store
            .within_read_write_transaction(|txn| {
                let operation = operation.clone();
                async move {
                    txn.update(&operation, |data| {
                        data["hero"]["name"] = serde_json::json!("C-3PO");
                    })
                    .await
                }
            })
            .await
            .unwrap();

        let result = store.load(&operation).await.unwrap();
        assert_eq!(result.data["hero"]["name"], serde_json::json!("C-3PO"));
        {
            let seen = recorder.seen.lock().unwrap();
            assert_eq!(seen.len(), 1);
            assert!(
                seen[0].contains("2001.name"),
                "update should re-normalize onto the hero's own record (2001), not a path key: {:?}",
                seen[0]
            );
        }

        store
            .within_read_write_transaction(|txn| {
                let operation = operation.clone();
                async move {
                    txn.update(&operation, |data| {
                        data["hero"]["name"] = serde_json::json!("C-3PO");
                    })
                    .await
                }
            })
            .await
            .unwrap();

        assert_eq!(
            recorder.seen.lock().unwrap().len(),
            1,
            "re-applying the same value should not produce a second notification"
        );
    }
}

mod batched_reads {
    use super::*;

    #[tokio::test]
    async fn a_list_of_friend_references_dereferences_through_one_read() {
        let store = Store::in_memory(cache_key_for_object());

        let mut records = RecordSet::new();
        records
            .record_mut(CacheKey::query_root())
            .set("hero", FieldValue::Reference(CacheKey::new("2001")));
        let friend_keys: Vec<CacheKey> = (0..5).map(|i| CacheKey::new(format!("friend-{i}"))).collect();
        records
            .record_mut(CacheKey::new("2001"))
            .set("name", FieldValue::Scalar(Scalar::String("R2-D2".to_string())));
        records.record_mut(CacheKey::new("2001")).set(
            "friends",
            FieldValue::List(friend_keys.iter().cloned().map(FieldValue::Reference).collect()),
        );
        for (i, key) in friend_keys.iter().enumerate() {
            records
                .record_mut(key.clone())
                .set("name", FieldValue::Scalar(Scalar::String(format!("Friend {i}"))));
        }
        store.publish(records, None).await.unwrap();

        let operation = GraphQLOperation::query(vec![Selection::field(Field::object(
            "hero",
            vec![Selection::field(Field::list_of_objects(
                "friends",
                vec![Selection::field(Field::scalar("name"))],
            ))],
        ))]);

        let result = store.load(&operation).await.unwrap();
        let friends = result.data["hero"]["friends"].as_array().unwrap();
        assert_eq!(friends.len(), 5);
        assert_eq!(friends[0]["name"], serde_json::json!("Friend 0"));
    }
}
