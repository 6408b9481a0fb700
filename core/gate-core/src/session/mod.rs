//! Session gating.
//!
//! A single persisted record (`startTime` + `isActive`) plus a fixed one-hour
//! duration decides whether the app is unlocked.
//!
//! # Module Structure
//!
//! - [`gate`]: the [`SessionGate`] state machine
//! - [`kv`]: synchronous string stores holding the record
//! - [`clock`] / [`scheduler`]: time and one-shot expiry timers, swappable
//!   for virtual implementations in tests
//! - [`types`]: the record, gate state and constants
//!
//! # Non-guarantees
//!
//! Two processes sharing one store can race: one may clear a record the
//! other's timer still refers to. The gate re-reads the record when a timer
//! fires, but cross-process consistency is not provided.

pub mod clock;
pub mod gate;
pub mod kv;
pub mod scheduler;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use gate::SessionGate;
pub use kv::{FileKvStore, KvStore, MemoryKvStore};
pub use scheduler::{ExpiryTimer, Scheduler, TimerId, TimerQueue};
pub use types::{GateState, SessionRecord, SESSION_DURATION, SESSION_KEY};
