mod common;

use std::{
    sync::{Arc, Barrier, mpsc},
    thread,
    time::{Duration, Instant},
};

use common::{alert, prices};
use marketsentry::{
    models::{AssetClass, Direction},
    services::{
        evaluator::{TriggerEvaluator, apply_triggers, format_amount, plan_triggers, render_message},
        hub::NotificationHub,
        store::SharedMarketStore,
    },
};

fn setup() -> (Arc<SharedMarketStore>, NotificationHub, TriggerEvaluator) {
    let store = Arc::new(SharedMarketStore::new());
    let hub = NotificationHub::new(4);
    let evaluator = TriggerEvaluator::new(Arc::clone(&store), hub.clone());
    (store, hub, evaluator)
}

fn active_ids(store: &SharedMarketStore, user: &str) -> Vec<String> {
    store.user(user).unwrap().active_alerts.into_iter().map(|a| a.id).collect()
}

fn triggered_ids(store: &SharedMarketStore, user: &str) -> Vec<String> {
    store.user(user).unwrap().triggered_alerts.into_iter().map(|a| a.id).collect()
}

#[test]
fn format_amount_ranges() {
    assert_eq!(format_amount(20000.0), "20000.00");
    assert_eq!(format_amount(1.0), "1.00");
    assert_eq!(format_amount(1234.5678), "1234.57");
    assert_eq!(format_amount(0.5), "0.5");
    assert_eq!(format_amount(0.00012300), "0.000123");
    assert_eq!(format_amount(0.00000012), "0.00000012");
    assert_eq!(format_amount(0.0), "0.00");
}

#[test]
fn sub_unit_amount_rounding_to_one_keeps_two_decimals() {
    assert_eq!(format_amount(0.999999999), "1.00");
    assert_eq!(format_amount(-0.999999999), "-1.00");
    assert_eq!(format_amount(0.99999999), "0.99999999");
}

#[test]
fn format_amount_uses_scientific_below_eight_decimals() {
    let s = format_amount(0.00000003);
    assert_eq!(s, "3.00e-8");
    assert_eq!(format_amount(0.00000001), "1.00e-8");
    assert_eq!(format_amount(0.000000000123), "1.23e-10");
}

#[test]
fn message_names_symbol_direction_and_amount() {
    let above = alert("a1", AssetClass::Crypto, "bitcoin", 20000.0, Direction::Above);
    let below = alert("a2", AssetClass::Crypto, "pepe", 0.5, Direction::Below);

    assert_eq!(render_message(&above), "bitcoin went above $20000.00");
    assert!(render_message(&above).ends_with("above $20000.00"));
    assert_eq!(render_message(&below), "pepe went below $0.5");
}

#[test]
fn equality_never_triggers() {
    let (store, _hub, evaluator) = setup();
    store.add_alert("u", alert("up", AssetClass::Crypto, "bitcoin", 20000.0, Direction::Above));
    store.add_alert("u", alert("down", AssetClass::Crypto, "bitcoin", 20000.0, Direction::Below));
    store.replace_prices(vec![(AssetClass::Crypto, prices(&[("bitcoin", 20000.0)]))]);

    let report = evaluator.evaluate();

    assert_eq!(report.promoted(), 0);
    assert_eq!(active_ids(&store, "u"), vec!["up", "down"]);
}

#[test]
fn above_triggers_once_on_first_crossing() {
    let (store, _hub, evaluator) = setup();
    store.add_alert("u", alert("a1", AssetClass::Crypto, "bitcoin", 20000.0, Direction::Above));

    for (px, expected_triggered) in [(19000.0, 0), (20000.0, 0), (20000.01, 1), (25000.0, 1), (18000.0, 1)] {
        store.replace_prices(vec![(AssetClass::Crypto, prices(&[("bitcoin", px)]))]);
        evaluator.evaluate();
        let user = store.user("u").unwrap();
        assert_eq!(user.triggered_alerts.len(), expected_triggered, "price {px}");
        assert_eq!(user.notifications.len(), expected_triggered, "price {px}");
    }
}

#[test]
fn below_triggers_once_on_first_crossing() {
    let (store, _hub, evaluator) = setup();
    store.add_alert("u", alert("a1", AssetClass::Metal, "gold", 1900.0, Direction::Below));

    for (px, expected_triggered) in [(1950.0, 0), (1900.0, 0), (1899.5, 1), (1700.0, 1)] {
        store.replace_prices(vec![(AssetClass::Metal, prices(&[("gold", px)]))]);
        evaluator.evaluate();
        assert_eq!(store.user("u").unwrap().triggered_alerts.len(), expected_triggered, "price {px}");
    }
}

#[test]
fn missing_price_keeps_alert_active() {
    let (store, hub, evaluator) = setup();
    store.add_alert("u", alert("never", AssetClass::Stock, "ZZZZ", 1.0, Direction::Above));
    store.add_alert("u", alert("other", AssetClass::Metal, "gold", 1.0, Direction::Above));
    store.replace_prices(vec![(AssetClass::Stock, prices(&[("AAPL", 150.0)]))]);
    let mut sub = hub.subscribe("u");

    for _ in 0..3 {
        let report = evaluator.evaluate();
        assert_eq!(report.promoted(), 0);
    }

    assert_eq!(active_ids(&store, "u"), vec!["never", "other"]);
    assert!(store.user("u").unwrap().notifications.is_empty());
    assert_eq!(sub.try_recv(), None);
}

#[test]
fn promotion_moves_alert_and_appends_notification() {
    let (store, hub, evaluator) = setup();
    store.add_alert("u", alert("a1", AssetClass::Crypto, "bitcoin", 20000.0, Direction::Above));
    store.add_alert("u", alert("a2", AssetClass::Crypto, "ethereum", 5000.0, Direction::Above));
    store.add_alert("u", alert("a3", AssetClass::Crypto, "bitcoin", 100.0, Direction::Below));
    store.replace_prices(vec![(AssetClass::Crypto, prices(&[("bitcoin", 21000.0), ("ethereum", 1500.0)]))]);
    let mut sub = hub.subscribe("u");

    let report = evaluator.evaluate();

    assert_eq!(report.promoted(), 1);
    assert_eq!(active_ids(&store, "u"), vec!["a2", "a3"]);
    assert_eq!(triggered_ids(&store, "u"), vec!["a1"]);

    let notes = store.user("u").unwrap().notifications;
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].alert_id, "a1");
    assert_eq!(notes[0].message, "bitcoin went above $20000.00");

    assert!(sub.try_recv().is_some());
    assert!(sub.try_recv().is_none());
}

#[test]
fn triggered_order_follows_discovery_order() {
    let (store, _hub, evaluator) = setup();
    for (id, px) in [("a1", 10.0), ("keep", 1e9), ("a2", 20.0), ("a3", 30.0)] {
        store.add_alert("u", alert(id, AssetClass::Stock, "AAPL", px, Direction::Above));
    }
    store.replace_prices(vec![(AssetClass::Stock, prices(&[("AAPL", 150.0)]))]);

    evaluator.evaluate();

    assert_eq!(active_ids(&store, "u"), vec!["keep"]);
    assert_eq!(triggered_ids(&store, "u"), vec!["a1", "a2", "a3"]);
    let note_ids: Vec<String> = store.user("u").unwrap().notifications.into_iter().map(|n| n.alert_id).collect();
    assert_eq!(note_ids, vec!["a1", "a2", "a3"]);
}

#[test]
fn only_affected_users_are_signalled() {
    let (store, hub, evaluator) = setup();
    store.add_alert("alice", alert("a1", AssetClass::Crypto, "bitcoin", 20000.0, Direction::Above));
    store.add_alert("bob", alert("b1", AssetClass::Crypto, "bitcoin", 50000.0, Direction::Above));
    store.replace_prices(vec![(AssetClass::Crypto, prices(&[("bitcoin", 21000.0)]))]);
    let mut alice = hub.subscribe("alice");
    let mut bob = hub.subscribe("bob");

    let report = evaluator.evaluate();

    assert_eq!(report.promotions.len(), 1);
    assert_eq!(report.promotions[0].user_id, "alice");
    assert!(alice.try_recv().is_some());
    assert!(bob.try_recv().is_none());
}

#[test]
fn stale_plan_entries_are_ignored_at_commit() {
    let store = SharedMarketStore::new();
    store.add_alert("u", alert("a1", AssetClass::Crypto, "bitcoin", 10.0, Direction::Above));
    store.add_alert("u", alert("a2", AssetClass::Crypto, "bitcoin", 20.0, Direction::Above));
    store.replace_prices(vec![(AssetClass::Crypto, prices(&[("bitcoin", 100.0)]))]);

    let plan = store.read(|s| plan_triggers(s, 42));
    assert_eq!(plan.len(), 2);

    // removed between the read and write phases
    store.write(|s| s.user_mut("u").unwrap().active_alerts.retain(|a| a.id != "a1"));

    let promotions = store.write(|s| apply_triggers(s, plan));

    assert_eq!(promotions.len(), 1);
    assert_eq!(promotions[0].promoted, 1);

    let user = store.user("u").unwrap();
    assert!(user.active_alerts.is_empty());
    assert_eq!(triggered_ids(&store, "u"), vec!["a2"]);
    assert_eq!(user.notifications.len(), 1);
    assert_eq!(user.notifications[0].alert_id, "a2");
    assert_eq!(user.notifications[0].created_at, 42);
}

#[test]
fn applying_the_same_plan_twice_promotes_once() {
    let store = SharedMarketStore::new();
    store.add_alert("u", alert("a1", AssetClass::Crypto, "bitcoin", 10.0, Direction::Above));
    store.replace_prices(vec![(AssetClass::Crypto, prices(&[("bitcoin", 100.0)]))]);

    let plan = store.read(|s| plan_triggers(s, 1));
    let first = store.write(|s| apply_triggers(s, plan.clone()));
    let second = store.write(|s| apply_triggers(s, plan));

    assert_eq!(first.len(), 1);
    assert!(second.is_empty());
    assert_eq!(store.user("u").unwrap().notifications.len(), 1);
}

#[test]
fn plan_for_vanished_user_is_skipped() {
    let store = SharedMarketStore::new();
    store.add_alert("u", alert("a1", AssetClass::Crypto, "bitcoin", 10.0, Direction::Above));
    store.replace_prices(vec![(AssetClass::Crypto, prices(&[("bitcoin", 100.0)]))]);
    let plan = store.read(|s| plan_triggers(s, 1));

    let other = SharedMarketStore::new();
    let promotions = other.write(|s| apply_triggers(s, plan));

    assert!(promotions.is_empty());
    assert!(other.users().is_empty());
}

#[test]
fn quiet_cycle_does_not_wait_for_readers() {
    let (store, _hub, evaluator) = setup();
    store.add_alert("u", alert("a1", AssetClass::Crypto, "bitcoin", 50000.0, Direction::Above));
    store.replace_prices(vec![(AssetClass::Crypto, prices(&[("bitcoin", 21000.0)]))]);

    let started = Arc::new(Barrier::new(2));
    let (release_tx, release_rx) = mpsc::channel::<()>();

    let reader = {
        let store = Arc::clone(&store);
        let started = Arc::clone(&started);
        thread::spawn(move || {
            store.read(|_| {
                started.wait();
                let _ = release_rx.recv_timeout(Duration::from_secs(2));
            })
        })
    };

    started.wait();
    let begin = Instant::now();
    let report = evaluator.evaluate();
    let elapsed = begin.elapsed();

    let _ = release_tx.send(());
    reader.join().unwrap();

    assert_eq!(report.planned, 0);
    assert!(report.promotions.is_empty());
    assert!(elapsed < Duration::from_secs(1), "evaluate blocked for {elapsed:?}");
}
