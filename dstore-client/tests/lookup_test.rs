//! Integration tests for lookups against the scripted transport

mod common;

use common::*;
use dstore_client::convert::key_to_proto;
use dstore_client::ClientError;
use dstore_core::{Key, Value};

#[tokio::test]
async fn test_get_multi_preserves_found_order_and_skips_missing() {
    let transport = MockTransport::new();
    let dataset = dataset(&transport);

    let k1 = Key::with_name("Task", "one");
    let k2 = Key::with_name("Task", "two");
    let k3 = Key::with_name("Task", "three");

    transport.reply(lookup_response(
        vec![
            entity_result(&k1, &[("done", Value::Boolean(true))]),
            entity_result(&k3, &[("done", Value::Boolean(false))]),
        ],
        vec![&k2],
        vec![],
    ));

    let found = dataset
        .get_multi(&[k1.clone(), k2.clone(), k3.clone()])
        .await
        .unwrap();

    assert_eq!(found.len(), 2);
    assert_eq!(found[0].key, k1);
    assert_eq!(found[1].key, k3);
    assert_eq!(found[0].get("done"), Some(&Value::Boolean(true)));

    let recorded = transport.recorded();
    assert_eq!(recorded.len(), 1);
    assert_eq!(
        lookup_keys(&recorded[0].request),
        vec![key_to_proto(&k1), key_to_proto(&k2), key_to_proto(&k3)]
    );
}

#[tokio::test]
async fn test_get_single_returns_option() {
    let transport = MockTransport::new();
    let dataset = dataset(&transport);
    let key = Key::with_id("Task", 5);

    transport.reply(lookup_response(
        vec![entity_result(&key, &[("title", Value::from("write"))])],
        vec![],
        vec![],
    ));
    let entity = dataset.get(&key).await.unwrap().unwrap();
    assert_eq!(entity.key, key);

    transport.reply(lookup_response(vec![], vec![&key], vec![]));
    assert!(dataset.get(&key).await.unwrap().is_none());
}

#[tokio::test]
async fn test_get_multi_of_one_is_still_a_vec() {
    let transport = MockTransport::new();
    let dataset = dataset(&transport);
    let key = Key::with_id("Task", 5);

    transport.reply(lookup_response(vec![entity_result(&key, &[])], vec![], vec![]));
    let found = dataset.get_multi(std::slice::from_ref(&key)).await.unwrap();
    assert_eq!(found.len(), 1);

    transport.reply(lookup_response(vec![], vec![&key], vec![]));
    let found = dataset.get_multi(std::slice::from_ref(&key)).await.unwrap();
    assert!(found.is_empty());
}

#[tokio::test]
async fn test_get_multi_with_no_keys_sends_nothing() {
    let transport = MockTransport::new();
    let dataset = dataset(&transport);
    assert!(dataset.get_multi(&[]).await.unwrap().is_empty());
    assert_eq!(transport.dispatch_count(), 0);
}

#[tokio::test]
async fn test_deferred_keys_resolved_in_one_round() {
    let transport = MockTransport::new();
    let dataset = dataset(&transport);

    let a = Key::with_name("Task", "a");
    let b = Key::with_name("Task", "b");

    transport.reply(lookup_response(vec![entity_result(&a, &[])], vec![], vec![&b]));
    transport.reply(lookup_response(vec![entity_result(&b, &[])], vec![], vec![]));

    let found = dataset.get_multi(&[a.clone(), b.clone()]).await.unwrap();
    assert_eq!(found.iter().map(|e| &e.key).collect::<Vec<_>>(), vec![&a, &b]);

    let recorded = transport.recorded();
    assert_eq!(recorded.len(), 2);
    assert_eq!(lookup_keys(&recorded[1].request), vec![key_to_proto(&b)]);
}

#[tokio::test]
async fn test_deferred_keys_resolved_over_three_rounds() {
    let transport = MockTransport::new();
    let dataset = dataset(&transport);

    let keys: Vec<Key> = (1..=4).map(|i| Key::with_id("Task", i)).collect();

    transport.reply(lookup_response(
        vec![entity_result(&keys[0], &[])],
        vec![],
        vec![&keys[1], &keys[2], &keys[3]],
    ));
    transport.reply(lookup_response(
        vec![entity_result(&keys[1], &[])],
        vec![],
        vec![&keys[2], &keys[3]],
    ));
    transport.reply(lookup_response(
        vec![entity_result(&keys[2], &[])],
        vec![],
        vec![&keys[3]],
    ));
    transport.reply(lookup_response(vec![], vec![&keys[3]], vec![]));

    let found = dataset.get_multi(&keys).await.unwrap();
    assert_eq!(found.len(), 3);
    assert_eq!(transport.dispatch_count(), 4);

    let recorded = transport.recorded();
    assert_eq!(lookup_keys(&recorded[3].request), vec![key_to_proto(&keys[3])]);
}

#[tokio::test]
async fn test_deferred_round_failure_discards_partial_results() {
    let transport = MockTransport::new();
    let dataset = dataset(&transport);

    let a = Key::with_name("Task", "a");
    let b = Key::with_name("Task", "b");

    transport.reply(lookup_response(vec![entity_result(&a, &[])], vec![], vec![&b]));
    transport.push(Reply::Status(503, "backend unavailable".to_string()));

    let err = dataset.get_multi(&[a, b]).await.unwrap_err();
    match err {
        ClientError::Status { status, message } => {
            assert_eq!(status, 503);
            assert_eq!(message, "backend unavailable");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_lookup_outside_transaction_has_no_read_options() {
    let transport = MockTransport::new();
    let dataset = dataset(&transport);
    let key = Key::with_id("Task", 1);

    transport.reply(lookup_response(vec![], vec![&key], vec![]));
    dataset.get(&key).await.unwrap();

    match &transport.recorded()[0].request {
        dstore_client::Request::Lookup(l) => assert!(l.read_options.is_none()),
        other => panic!("expected lookup, got {:?}", other.action()),
    }
}
