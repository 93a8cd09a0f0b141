mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use proptest::prelude::*;
use uuid::Uuid;

use common::{order_at, RecordingSound, ScriptedStore, TONE};
use pharmacy_service::application::alert::AlertController;
use pharmacy_service::application::desk::{Desk, DeskError};
use pharmacy_service::domain::errors::DomainError;
use pharmacy_service::domain::order::{Order, OrderStatus};
use pharmacy_service::domain::ports::Collection;
use pharmacy_service::infrastructure::alert_sound::LoggingAlertSound;

struct Fixture {
    pharmacy: Uuid,
    store: Arc<ScriptedStore>,
    sound: Arc<RecordingSound>,
    desk: Desk,
    orders: Vec<Order>,
}

/// Desk for one pharmacy with `count` pending orders, newest first.
fn fixture(count: usize) -> Fixture {
    let pharmacy = Uuid::new_v4();
    let orders: Vec<Order> = (0..count).map(|i| order_at(pharmacy, i as i64)).collect();
    let store = Arc::new(ScriptedStore::with_orders(&orders));
    let sound = Arc::new(RecordingSound::default());
    let desk = Desk::new(
        pharmacy,
        store.clone(),
        AlertController::new(sound.clone(), TONE),
        15,
    );
    Fixture {
        pharmacy,
        store,
        sound,
        desk,
        orders,
    }
}

fn on_screen(desk: &Desk) -> Option<Uuid> {
    desk.session().map(|s| s.order.id)
}

fn ids(orders: &[Order]) -> Vec<Uuid> {
    orders.iter().map(|o| o.id).collect()
}

#[tokio::test]
async fn newest_order_is_announced_and_accepting_moves_to_the_next() {
    let mut f = fixture(3);
    let (a, b, c) = (f.orders[0].id, f.orders[1].id, f.orders[2].id);

    // Arrival order in the snapshot does not matter.
    f.desk
        .on_snapshot(Ok(vec![f.orders[2].clone(), f.orders[0].clone(), f.orders[1].clone()]));
    let session = f.desk.session().expect("session opened");
    assert_eq!(session.order.id, a);
    assert_eq!(session.seconds_left, 15);
    assert!(session.alert_playing);
    assert_eq!(session.alert_source, TONE);
    assert_eq!(f.sound.playing(), 1);

    let outcome = f.desk.accept(a).await.unwrap();
    assert_eq!(outcome.status, OrderStatus::Confirmed);
    assert!(outcome.mirrored);
    assert_eq!(outcome.next, Some(b));

    assert_eq!(ids(&f.desk.pending()), vec![b, c]);
    assert_eq!(on_screen(&f.desk), Some(b));
    assert_eq!(f.store.status(Collection::Pharmacy(f.pharmacy), a), Some(OrderStatus::Confirmed));
    assert_eq!(f.store.status(Collection::Global, a), Some(OrderStatus::Confirmed));
    // One loop for A, stopped; one for B, playing.
    assert_eq!(f.sound.started(), 2);
    assert_eq!(f.sound.playing(), 1);
}

#[tokio::test]
async fn reject_writes_rejected_to_both_collections() {
    let mut f = fixture(1);
    let a = f.orders[0].id;
    f.desk.on_snapshot(Ok(f.orders.clone()));

    let outcome = f.desk.reject(a).await.unwrap();

    assert_eq!(outcome.status, OrderStatus::Rejected);
    assert_eq!(outcome.next, None);
    assert_eq!(
        f.store.writes(),
        vec![
            (Collection::Pharmacy(f.pharmacy), a, OrderStatus::Rejected),
            (Collection::Global, a, OrderStatus::Rejected),
        ]
    );
    assert!(f.desk.session().is_none());
    assert_eq!(f.sound.playing(), 0);
}

#[test]
fn unanswered_notification_expires_without_touching_the_order() {
    let mut f = fixture(1);
    f.desk.on_snapshot(Ok(f.orders.clone()));

    for _ in 0..14 {
        f.desk.on_tick();
    }
    assert_eq!(f.desk.session().unwrap().seconds_left, 1);

    f.desk.on_tick();
    assert!(f.desk.session().is_none());
    assert!(f.store.writes().is_empty());
    assert_eq!(f.store.status(Collection::Global, f.orders[0].id), Some(OrderStatus::Pending));
    assert_eq!(f.sound.playing(), 0);
}

#[test]
fn expiry_moves_on_to_the_next_order() {
    let mut f = fixture(2);
    f.desk.on_snapshot(Ok(f.orders.clone()));

    for _ in 0..15 {
        f.desk.on_tick();
    }

    let session = f.desk.session().expect("next order announced");
    assert_eq!(session.order.id, f.orders[1].id);
    assert_eq!(session.seconds_left, 15);
    // The expired order is still pending and still queued.
    assert_eq!(f.desk.pending().len(), 2);
}

#[tokio::test]
async fn failed_global_write_still_confirms_the_order() {
    let mut f = fixture(1);
    let a = f.orders[0].id;
    f.store.fail_global.store(true, Ordering::SeqCst);
    f.desk.on_snapshot(Ok(f.orders.clone()));

    let outcome = f.desk.accept(a).await.unwrap();

    assert!(!outcome.mirrored);
    assert_eq!(f.store.status(Collection::Pharmacy(f.pharmacy), a), Some(OrderStatus::Confirmed));
    assert_eq!(f.store.status(Collection::Global, a), Some(OrderStatus::Pending));
    assert!(f.desk.session().is_none());
}

#[tokio::test]
async fn failed_primary_write_freezes_the_session_until_retried() {
    let mut f = fixture(2);
    let a = f.orders[0].id;
    f.store.fail_primary.store(true, Ordering::SeqCst);
    f.desk.on_snapshot(Ok(f.orders.clone()));

    let err = f.desk.accept(a).await.unwrap_err();
    assert!(matches!(
        err,
        DeskError::PrimaryWrite { order_id, source: DomainError::Internal(_) } if order_id == a
    ));

    let frozen = f.desk.session().expect("session kept");
    assert_eq!(frozen.order.id, a);
    assert!(frozen.halted);
    assert!(!frozen.alert_playing);
    for _ in 0..30 {
        f.desk.on_tick();
    }
    assert_eq!(on_screen(&f.desk), Some(a));
    assert!(f.store.writes().is_empty());

    f.store.fail_primary.store(false, Ordering::SeqCst);
    let outcome = f.desk.accept(a).await.unwrap();
    assert_eq!(outcome.next, Some(f.orders[1].id));
    assert_eq!(f.store.writes_for(a), 2);
}

#[tokio::test]
async fn decided_order_is_never_written_again_even_if_a_snapshot_lags() {
    let mut f = fixture(2);
    let (a, b) = (f.orders[0].id, f.orders[1].id);
    f.desk.on_snapshot(Ok(f.orders.clone()));
    f.desk.accept(a).await.unwrap();

    // The feed has not caught up yet and still lists A as pending.
    f.desk.on_snapshot(Ok(f.orders.clone()));
    assert_eq!(on_screen(&f.desk), Some(b));
    assert_eq!(ids(&f.desk.pending()), vec![b]);

    assert!(matches!(f.desk.accept(a).await, Err(DeskError::AlreadyDecided(id)) if id == a));
    assert!(matches!(f.desk.reject(a).await, Err(DeskError::AlreadyDecided(_))));
    assert_eq!(f.store.writes_for(a), 2);
}

#[tokio::test]
async fn lagging_snapshot_does_not_reannounce_the_last_decided_order() {
    let mut f = fixture(1);
    let a = f.orders[0].id;
    f.desk.on_snapshot(Ok(f.orders.clone()));
    f.desk.accept(a).await.unwrap();

    f.desk.on_snapshot(Ok(f.orders.clone()));

    assert!(f.desk.session().is_none());
    assert!(f.desk.pending().is_empty());
    assert_eq!(f.sound.started(), 1);
}

#[test]
fn dismiss_closes_without_writing_or_moving_on() {
    let mut f = fixture(2);
    let a = f.orders[0].id;
    f.desk.on_snapshot(Ok(f.orders.clone()));

    assert_eq!(f.desk.dismiss().unwrap(), a);
    assert!(f.desk.session().is_none());
    assert_eq!(f.desk.pending().len(), 2);
    assert_eq!(f.sound.playing(), 0);
    assert!(f.store.writes().is_empty());

    // The next push announces the head again.
    f.desk.on_snapshot(Ok(f.orders.clone()));
    assert_eq!(on_screen(&f.desk), Some(a));
}

#[test]
fn dismiss_with_nothing_on_screen_is_an_error() {
    let mut f = fixture(0);
    assert!(matches!(f.desk.dismiss(), Err(DeskError::NoActiveSession)));
}

#[test]
fn order_decided_elsewhere_closes_its_notification() {
    let mut f = fixture(2);
    f.desk.on_snapshot(Ok(f.orders.clone()));
    assert_eq!(on_screen(&f.desk), Some(f.orders[0].id));

    f.desk.on_snapshot(Ok(vec![f.orders[1].clone()]));

    assert_eq!(on_screen(&f.desk), Some(f.orders[1].id));
    assert_eq!(f.sound.playing(), 1);
}

#[test]
fn newer_arrival_waits_behind_the_open_notification() {
    let mut f = fixture(2);
    f.desk.on_snapshot(Ok(vec![f.orders[1].clone()]));
    assert_eq!(on_screen(&f.desk), Some(f.orders[1].id));

    f.desk.on_snapshot(Ok(f.orders.clone()));

    assert_eq!(on_screen(&f.desk), Some(f.orders[1].id));
    assert_eq!(f.desk.pending()[0].id, f.orders[0].id);
    assert_eq!(f.desk.sessions_opened(), 1);
}

#[tokio::test]
async fn only_the_order_on_screen_can_be_decided() {
    let mut f = fixture(2);
    assert!(matches!(
        f.desk.accept(f.orders[0].id).await,
        Err(DeskError::NoActiveSession)
    ));

    f.desk.on_snapshot(Ok(f.orders.clone()));
    let err = f.desk.accept(f.orders[1].id).await.unwrap_err();
    assert!(matches!(err, DeskError::NotPresented { active, .. } if active == f.orders[0].id));
    assert!(f.store.writes().is_empty());
}

#[test]
fn failed_feed_read_keeps_the_last_queue() {
    let mut f = fixture(2);
    f.desk.on_snapshot(Ok(f.orders.clone()));

    f.desk
        .on_snapshot(Err(DomainError::Internal("connection refused".to_string())));

    assert_eq!(f.desk.pending().len(), 2);
    assert_eq!(on_screen(&f.desk), Some(f.orders[0].id));
}

#[test]
fn notification_opens_even_when_the_alert_cannot_play() {
    let pharmacy = Uuid::new_v4();
    let order = order_at(pharmacy, 0);
    let store = Arc::new(ScriptedStore::with_orders(&[order.clone()]));
    let mut desk = Desk::new(
        pharmacy,
        store,
        AlertController::new(Arc::new(LoggingAlertSound), "file:///tone.mp3"),
        15,
    );

    desk.on_snapshot(Ok(vec![order.clone()]));

    let session = desk.session().expect("session opened");
    assert_eq!(session.order.id, order.id);
    assert!(!session.alert_playing);
}

#[derive(Debug, Clone)]
enum Event {
    Snapshot(Vec<bool>),
    Ticks(u8),
    Dismiss,
}

fn event() -> impl Strategy<Value = Event> {
    prop_oneof![
        proptest::collection::vec(any::<bool>(), 5).prop_map(Event::Snapshot),
        (1u8..20).prop_map(Event::Ticks),
        Just(Event::Dismiss),
    ]
}

proptest! {
    #[test]
    fn one_notification_and_one_alert_at_most(events in proptest::collection::vec(event(), 1..40)) {
        let mut f = fixture(5);
        for event in events {
            match event {
                Event::Snapshot(mask) => {
                    let snapshot: Vec<Order> = f
                        .orders
                        .iter()
                        .zip(mask)
                        .filter(|(_, keep)| *keep)
                        .map(|(o, _)| o.clone())
                        .collect();
                    f.desk.on_snapshot(Ok(snapshot));
                    // Anything queued gets announced.
                    prop_assert_eq!(f.desk.pending().is_empty(), f.desk.session().is_none());
                }
                Event::Ticks(n) => {
                    for _ in 0..n {
                        f.desk.on_tick();
                    }
                }
                Event::Dismiss => {
                    let _ = f.desk.dismiss();
                }
            }

            prop_assert!(f.sound.playing() <= 1);
            let playing = f.sound.playing() == 1;
            prop_assert_eq!(playing, f.desk.session().is_some());
            if let Some(session) = f.desk.session() {
                prop_assert!(f.desk.pending().iter().any(|o| o.id == session.order.id));
            }
        }
        prop_assert!(f.store.writes().is_empty());
    }
}
