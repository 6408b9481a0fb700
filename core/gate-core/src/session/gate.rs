//! The session gate: decides whether the protected UI is shown.
//!
//! ```text
//! Locked   --start_session-------------------------------> Unlocked
//! Unlocked --end_session | expiry fires | init finds stale-> Locked
//! Unlocked --init finds valid record (re-arms expiry)----> Unlocked
//! ```
//!
//! Every ambiguity resolves to `Locked`: unreadable stores, corrupt records
//! and inactive records lock the app and clear the record.
//!
//! At most one expiry timer is armed. Arming always cancels the previous
//! timer first, and a fired timer is checked against the armed slot and the
//! persisted `startTime` before it is allowed to lock anything.

use std::time::Duration;

use tracing::{debug, info, warn};

use super::clock::Clock;
use super::kv::KvStore;
use super::scheduler::{ExpiryTimer, Scheduler, TimerId};
use super::types::{GateState, SessionRecord, SESSION_KEY};
use crate::error::{GateError, Result};

enum StoredSession {
    Missing,
    Present(SessionRecord),
    Unreadable(String),
}

pub struct SessionGate<K, C, S> {
    store: K,
    clock: C,
    scheduler: S,
    state: GateState,
    checked: bool,
    armed: Option<ExpiryTimer>,
    next_timer_id: u64,
}

impl<K: KvStore, C: Clock, S: Scheduler> SessionGate<K, C, S> {
    /// Starts `Locked` and loading; call [`Self::check_session_on_init`] once.
    pub fn new(store: K, clock: C, scheduler: S) -> Self {
        Self {
            store,
            clock,
            scheduler,
            state: GateState::Locked,
            checked: false,
            armed: None,
            next_timer_id: 1,
        }
    }

    pub fn state(&self) -> GateState {
        self.state
    }

    pub fn is_unlocked(&self) -> bool {
        self.state.is_unlocked()
    }

    /// True until the first startup check has run.
    pub fn is_loading(&self) -> bool {
        !self.checked
    }

    pub fn armed_timer(&self) -> Option<ExpiryTimer> {
        self.armed
    }

    pub fn store(&self) -> &K {
        &self.store
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Reads the persisted record and settles the initial state.
    ///
    /// A valid record resumes the session and arms expiry at its original
    /// deadline, not a full duration from now.
    pub fn check_session_on_init(&mut self) -> GateState {
        let now = self.clock.now_ms();
        let state = match self.read_record() {
            StoredSession::Missing => {
                debug!("No session record; gate locked");
                self.disarm();
                self.state = GateState::Locked;
                GateState::Locked
            }
            StoredSession::Unreadable(details) => {
                warn!(details = %details, "Session record unreadable; clearing");
                self.lock_and_clear();
                GateState::Locked
            }
            StoredSession::Present(record) => self.adopt_record(record, now),
        };
        self.checked = true;
        state
    }

    /// Unconditionally replaces any record with a fresh one starting now.
    pub fn start_session(&mut self) -> Result<()> {
        let now = self.clock.now_ms();
        let record = SessionRecord::started_at(now);
        let payload = serde_json::to_string(&record).map_err(|source| GateError::Json {
            context: "serializing session record".to_string(),
            source,
        })?;
        self.store.set(SESSION_KEY, &payload)?;

        self.state = GateState::Unlocked;
        self.checked = true;
        self.arm(&record);
        info!(start_time = now, expires_at = record.expires_at(), "Session started");
        Ok(())
    }

    /// Clears the record and locks. Safe to call when already locked.
    ///
    /// The state is `Locked` even when clearing the record fails; the error
    /// is returned for the caller to log.
    pub fn end_session(&mut self) -> Result<()> {
        self.disarm();
        let was_unlocked = self.state.is_unlocked();
        self.state = GateState::Locked;
        self.store.remove(SESSION_KEY)?;
        if was_unlocked {
            info!("Session ended");
        }
        Ok(())
    }

    /// Time left on the persisted session, or zero when there is none.
    pub fn remaining_time(&self) -> Duration {
        match self.read_record() {
            StoredSession::Present(record) => {
                let remaining = record.remaining_ms(self.clock.now_ms());
                Duration::from_millis(remaining as u64)
            }
            StoredSession::Missing => Duration::ZERO,
            StoredSession::Unreadable(details) => {
                debug!(details = %details, "Session record unreadable; no time remaining");
                Duration::ZERO
            }
        }
    }

    /// Delivers a fired expiry timer. Returns true when it locked the gate.
    ///
    /// Timers that are no longer armed (cancelled, superseded, or already
    /// handled) are ignored. If the persisted record now belongs to a
    /// different session, that session is adopted instead of being cleared.
    pub fn handle_expiry(&mut self, timer: ExpiryTimer) -> bool {
        match self.armed {
            Some(armed) if armed == timer => {}
            _ => {
                debug!(timer_id = timer.id.0, "Ignoring stale expiry timer");
                return false;
            }
        }
        self.armed = None;

        if let StoredSession::Present(record) = self.read_record() {
            if record.start_time != timer.session_start_ms {
                debug!(
                    timer_start = timer.session_start_ms,
                    record_start = record.start_time,
                    "Session replaced before expiry; re-evaluating"
                );
                let now = self.clock.now_ms();
                return !self.adopt_record(record, now).is_unlocked();
            }
        }

        info!(start_time = timer.session_start_ms, "Session expired");
        self.lock_and_clear();
        true
    }

    fn adopt_record(&mut self, record: SessionRecord, now: i64) -> GateState {
        if record.is_valid_at(now) {
            self.state = GateState::Unlocked;
            self.arm(&record);
            debug!(
                start_time = record.start_time,
                remaining_ms = record.remaining_ms(now),
                "Resumed session"
            );
            GateState::Unlocked
        } else {
            debug!(
                start_time = record.start_time,
                is_active = record.is_active,
                "Session record expired or inactive; clearing"
            );
            self.lock_and_clear();
            GateState::Locked
        }
    }

    fn read_record(&self) -> StoredSession {
        let raw = match self.store.get(SESSION_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return StoredSession::Missing,
            Err(err) => return StoredSession::Unreadable(err.to_string()),
        };
        match serde_json::from_str::<SessionRecord>(&raw) {
            Ok(record) => StoredSession::Present(record),
            Err(err) => StoredSession::Unreadable(err.to_string()),
        }
    }

    fn lock_and_clear(&mut self) {
        if let Err(err) = self.end_session() {
            warn!(error = %err, "Failed to clear session record");
        }
    }

    fn arm(&mut self, record: &SessionRecord) {
        self.disarm();
        let timer = ExpiryTimer {
            id: TimerId(self.next_timer_id),
            session_start_ms: record.start_time,
            due_at_ms: record.expires_at(),
        };
        self.next_timer_id += 1;
        self.scheduler.schedule(timer);
        self.armed = Some(timer);
    }

    fn disarm(&mut self) {
        if let Some(timer) = self.armed.take() {
            self.scheduler.cancel(timer.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{ManualClock, MemoryKvStore, TimerQueue, SESSION_DURATION};

    const T0: i64 = 1_760_000_000_000;

    type TestGate = SessionGate<MemoryKvStore, ManualClock, TimerQueue>;

    fn gate_with(store: MemoryKvStore) -> (TestGate, ManualClock, TimerQueue) {
        let clock = ManualClock::new(T0);
        let queue = TimerQueue::new();
        let gate = SessionGate::new(store, clock.clone(), queue.clone());
        (gate, clock, queue)
    }

    fn store_with(raw: &str) -> MemoryKvStore {
        let mut store = MemoryKvStore::new();
        store.set(SESSION_KEY, raw).unwrap();
        store
    }

    fn minutes(n: u64) -> Duration {
        Duration::from_secs(n * 60)
    }

    #[test]
    fn starts_locked_and_loading() {
        let (gate, _, _) = gate_with(MemoryKvStore::new());
        assert_eq!(gate.state(), GateState::Locked);
        assert!(gate.is_loading());
    }

    #[test]
    fn start_session_persists_record_and_arms_full_duration() {
        let (mut gate, _, queue) = gate_with(MemoryKvStore::new());
        gate.start_session().unwrap();

        assert!(gate.is_unlocked());
        let raw = gate.store().get(SESSION_KEY).unwrap().unwrap();
        assert_eq!(
            serde_json::from_str::<SessionRecord>(&raw).unwrap(),
            SessionRecord::started_at(T0)
        );
        let pending = queue.pending();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].due_at_ms, T0 + SESSION_DURATION.as_millis() as i64);
        assert_eq!(gate.remaining_time(), SESSION_DURATION);
    }

    #[test]
    fn expiry_fires_at_deadline_and_locks() {
        let (mut gate, clock, queue) = gate_with(MemoryKvStore::new());
        gate.start_session().unwrap();

        clock.advance(SESSION_DURATION - Duration::from_millis(1));
        assert!(queue.take_due(clock.now_ms()).is_empty());

        clock.advance(Duration::from_millis(1));
        let fired = queue.take_due(clock.now_ms());
        assert_eq!(fired.len(), 1);
        assert!(gate.handle_expiry(fired[0]));
        assert_eq!(gate.state(), GateState::Locked);
        assert!(!gate.store().contains(SESSION_KEY));
    }

    #[test]
    fn restarting_cancels_previous_timer() {
        let (mut gate, clock, queue) = gate_with(MemoryKvStore::new());
        gate.start_session().unwrap();
        clock.advance(minutes(5));
        gate.start_session().unwrap();

        let pending = queue.pending();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].session_start_ms, T0 + 5 * 60_000);
    }

    #[test]
    fn end_session_cancels_armed_timer() {
        let (mut gate, _, queue) = gate_with(MemoryKvStore::new());
        gate.start_session().unwrap();
        let timer = queue.pending()[0];

        gate.end_session().unwrap();
        assert!(queue.is_empty());
        assert!(gate.armed_timer().is_none());
        assert!(!gate.handle_expiry(timer));
    }

    #[test]
    fn expiry_adopts_record_written_by_another_writer() {
        let (mut gate, clock, _) = gate_with(MemoryKvStore::new());
        gate.start_session().unwrap();
        let timer = gate.armed_timer().unwrap();

        clock.advance(SESSION_DURATION);
        let newer = SessionRecord::started_at(clock.now_ms() - 1_000);
        let mut store = gate.store().clone();
        store
            .set(SESSION_KEY, &serde_json::to_string(&newer).unwrap())
            .unwrap();
        gate.store = store;

        assert!(!gate.handle_expiry(timer));
        assert!(gate.is_unlocked());
        assert_eq!(gate.armed_timer().unwrap().session_start_ms, newer.start_time);
    }

    #[test]
    fn inactive_record_locks_and_clears() {
        let (mut gate, _, queue) =
            gate_with(store_with(&format!(r#"{{"startTime":{T0},"isActive":false}}"#)));
        assert_eq!(gate.check_session_on_init(), GateState::Locked);
        assert!(!gate.store().contains(SESSION_KEY));
        assert!(queue.is_empty());
        assert!(!gate.is_loading());
    }

    #[test]
    fn future_start_time_unlocks_until_its_own_expiry() {
        let future = T0 + 60_000;
        let (mut gate, _, queue) =
            gate_with(store_with(&format!(r#"{{"startTime":{future},"isActive":true}}"#)));
        assert_eq!(gate.remaining_time(), SESSION_DURATION + Duration::from_secs(60));
        assert_eq!(gate.check_session_on_init(), GateState::Unlocked);
        assert!(gate.store().contains(SESSION_KEY));
        assert_eq!(
            queue.next().map(|timer| timer.due_at_ms),
            Some(future + SESSION_DURATION.as_millis() as i64)
        );
    }

    #[test]
    fn remaining_time_ignores_active_flag_and_never_mutates() {
        let start = T0 - minutes(10).as_millis() as i64;
        let (gate, _, _) =
            gate_with(store_with(&format!(r#"{{"startTime":{start},"isActive":false}}"#)));
        assert_eq!(gate.remaining_time(), minutes(50));
        assert!(gate.store().contains(SESSION_KEY));
        assert_eq!(gate.state(), GateState::Locked);
    }
}
