//! End-to-end behaviour of the session gate on virtual time.

use std::time::Duration;

use gate_core::error::{GateError, Result};
use gate_core::session::{
    Clock, FileKvStore, GateState, KvStore, ManualClock, MemoryKvStore, SessionGate,
    SessionRecord, TimerQueue, SESSION_DURATION, SESSION_KEY,
};

const T0: i64 = 1_760_000_000_000;

fn minutes(n: u64) -> Duration {
    Duration::from_secs(n * 60)
}

fn ms(duration: Duration) -> i64 {
    duration.as_millis() as i64
}

fn store_with_record(raw: &str) -> MemoryKvStore {
    let mut store = MemoryKvStore::new();
    store.set(SESSION_KEY, raw).unwrap();
    store
}

fn record_json(start_time: i64, is_active: bool) -> String {
    serde_json::to_string(&SessionRecord {
        start_time,
        is_active,
    })
    .unwrap()
}

fn new_gate(
    store: MemoryKvStore,
) -> (
    SessionGate<MemoryKvStore, ManualClock, TimerQueue>,
    ManualClock,
    TimerQueue,
) {
    let clock = ManualClock::new(T0);
    let queue = TimerQueue::new();
    (
        SessionGate::new(store, clock.clone(), queue.clone()),
        clock,
        queue,
    )
}

/// Store whose every operation fails, as if storage were unavailable.
struct BrokenStore;

impl KvStore for BrokenStore {
    fn get(&self, _key: &str) -> Result<Option<String>> {
        Err(GateError::StorageUnavailable("disk gone".to_string()))
    }

    fn set(&mut self, _key: &str, _value: &str) -> Result<()> {
        Err(GateError::StorageUnavailable("disk gone".to_string()))
    }

    fn remove(&mut self, _key: &str) -> Result<()> {
        Err(GateError::StorageUnavailable("disk gone".to_string()))
    }
}

#[test]
fn scenario_a_no_record_stays_locked() {
    let (mut gate, _, queue) = new_gate(MemoryKvStore::new());
    assert_eq!(gate.check_session_on_init(), GateState::Locked);
    assert_eq!(gate.remaining_time(), Duration::ZERO);
    assert!(queue.is_empty());
}

#[test]
fn scenario_b_recent_record_resumes() {
    let (mut gate, _, queue) =
        new_gate(store_with_record(&record_json(T0 - ms(minutes(10)), true)));
    assert_eq!(gate.check_session_on_init(), GateState::Unlocked);
    assert_eq!(gate.remaining_time(), minutes(50));
    assert_eq!(queue.pending().len(), 1);
}

#[test]
fn scenario_c_old_record_is_cleared() {
    let (mut gate, _, queue) =
        new_gate(store_with_record(&record_json(T0 - ms(minutes(120)), true)));
    assert_eq!(gate.check_session_on_init(), GateState::Locked);
    assert!(!gate.store().contains(SESSION_KEY));
    assert!(queue.is_empty());
}

#[test]
fn scenario_d_end_shortly_after_start() {
    let (mut gate, clock, _) = new_gate(MemoryKvStore::new());
    gate.start_session().unwrap();
    clock.advance(Duration::from_millis(100));
    gate.end_session().unwrap();
    assert_eq!(gate.state(), GateState::Locked);
    assert!(!gate.store().contains(SESSION_KEY));
}

#[test]
fn malformed_records_fail_closed_and_are_cleared() {
    let malformed = [
        "",
        "not json",
        "{}",
        "null",
        "[1,2]",
        r#"{"startTime":"yesterday","isActive":true}"#,
        r#"{"startTime":1,"isActive":"yes"}"#,
        r#"{"isActive":true}"#,
    ];
    for raw in malformed {
        let (mut gate, _, queue) = new_gate(store_with_record(raw));
        assert_eq!(gate.check_session_on_init(), GateState::Locked, "record {raw:?}");
        assert!(!gate.store().contains(SESSION_KEY), "record {raw:?}");
        assert!(queue.is_empty(), "record {raw:?}");
        assert_eq!(gate.remaining_time(), Duration::ZERO);
    }
}

#[test]
fn record_exactly_one_duration_old_is_expired() {
    let (mut gate, _, _) =
        new_gate(store_with_record(&record_json(T0 - ms(SESSION_DURATION), true)));
    assert_eq!(gate.check_session_on_init(), GateState::Locked);
    assert!(!gate.store().contains(SESSION_KEY));

    let (mut gate, _, _) =
        new_gate(store_with_record(&record_json(T0 - ms(SESSION_DURATION) + 1, true)));
    assert_eq!(gate.check_session_on_init(), GateState::Unlocked);
    assert_eq!(gate.remaining_time(), Duration::from_millis(1));
}

#[test]
fn resumed_session_keeps_original_deadline() {
    let (mut first, clock, _) = new_gate(MemoryKvStore::new());
    first.start_session().unwrap();
    let store = first.store().clone();

    clock.advance(minutes(30));
    let queue = TimerQueue::new();
    let mut reloaded = SessionGate::new(store, clock.clone(), queue.clone());
    assert_eq!(reloaded.check_session_on_init(), GateState::Unlocked);
    assert_eq!(reloaded.remaining_time(), minutes(30));

    let pending = queue.pending();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].due_at_ms, T0 + ms(SESSION_DURATION));

    clock.advance(minutes(30));
    let fired = queue.take_due(clock.now_ms());
    assert_eq!(fired.len(), 1);
    assert!(reloaded.handle_expiry(fired[0]));
    assert_eq!(reloaded.state(), GateState::Locked);
}

#[test]
fn end_session_is_idempotent() {
    let (mut gate, _, _) = new_gate(MemoryKvStore::new());
    gate.end_session().unwrap();
    assert_eq!(gate.state(), GateState::Locked);
    gate.end_session().unwrap();
    assert_eq!(gate.state(), GateState::Locked);

    gate.start_session().unwrap();
    gate.end_session().unwrap();
    gate.end_session().unwrap();
    assert_eq!(gate.state(), GateState::Locked);
}

#[test]
fn stale_timer_from_replaced_session_is_ignored() {
    let (mut gate, clock, queue) = new_gate(MemoryKvStore::new());
    gate.start_session().unwrap();
    let first_timer = queue.pending()[0];

    clock.advance(Duration::from_secs(1));
    gate.start_session().unwrap();

    assert!(!gate.handle_expiry(first_timer));
    assert_eq!(gate.state(), GateState::Unlocked);
    let raw = gate.store().get(SESSION_KEY).unwrap().unwrap();
    let record: SessionRecord = serde_json::from_str(&raw).unwrap();
    assert_eq!(record.start_time, T0 + 1_000);
    assert_eq!(gate.remaining_time(), SESSION_DURATION);
}

#[test]
fn repeated_init_keeps_a_single_armed_timer() {
    let (mut gate, _, queue) = new_gate(store_with_record(&record_json(T0 - ms(minutes(5)), true)));
    gate.check_session_on_init();
    gate.check_session_on_init();
    assert_eq!(queue.pending().len(), 1);
    assert_eq!(gate.armed_timer(), queue.next());
}

#[test]
fn unavailable_storage_fails_closed() {
    let clock = ManualClock::new(T0);
    let mut gate = SessionGate::new(BrokenStore, clock, TimerQueue::new());
    assert_eq!(gate.check_session_on_init(), GateState::Locked);
    assert_eq!(gate.remaining_time(), Duration::ZERO);

    let err = gate.start_session().expect_err("write should fail");
    assert!(matches!(err, GateError::StorageUnavailable(_)));
    assert_eq!(gate.state(), GateState::Locked);

    assert!(gate.end_session().is_err());
    assert_eq!(gate.state(), GateState::Locked);
}

#[test]
fn file_backed_session_survives_reload() {
    let temp_dir = tempfile::tempdir().unwrap();
    let path = temp_dir.path().join("session.json");
    let clock = ManualClock::new(T0);

    let mut gate = SessionGate::new(
        FileKvStore::new(path.clone()),
        clock.clone(),
        TimerQueue::new(),
    );
    gate.check_session_on_init();
    gate.start_session().unwrap();
    drop(gate);

    clock.advance(minutes(45));
    let mut reloaded = SessionGate::new(
        FileKvStore::new(path.clone()),
        clock.clone(),
        TimerQueue::new(),
    );
    assert_eq!(reloaded.check_session_on_init(), GateState::Unlocked);
    assert_eq!(reloaded.remaining_time(), minutes(15));

    clock.advance(minutes(15));
    let mut expired = SessionGate::new(FileKvStore::new(path.clone()), clock, TimerQueue::new());
    assert_eq!(expired.check_session_on_init(), GateState::Locked);
    assert_eq!(FileKvStore::new(path).get(SESSION_KEY).unwrap(), None);
}
