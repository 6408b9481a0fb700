//! # gate-core
//!
//! Core library for kidgate, the kids' flash-card app: the session gate that
//! decides whether the app is unlocked, the lock-screen puzzle that unlocks
//! it, and the SQLite catalog of categories and flash cards.
//!
//! ## Design Principles
//!
//! - **Synchronous**: No async runtime dependency. Expiry timers are data
//!   handed to a [`session::Scheduler`]; the caller drives the event loop.
//! - **Fail-closed**: Anything ambiguous about the session record locks the app.
//! - **Injectable time and storage**: [`session::Clock`], [`session::KvStore`]
//!   and [`StorageConfig::with_root`] let tests run on virtual time and temp dirs.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use gate_core::session::{FileKvStore, SessionGate, SystemClock, TimerQueue};
//!
//! let storage = gate_core::StorageConfig::from_home()?;
//! let mut gate = SessionGate::new(
//!     FileKvStore::new(storage.session_store_file()),
//!     SystemClock,
//!     TimerQueue::new(),
//! );
//! if !gate.check_session_on_init().is_unlocked() {
//!     // show the lock puzzle
//! }
//! ```

pub mod catalog;
pub mod config;
pub mod error;
pub mod puzzle;
pub mod session;
pub mod storage;

pub use catalog::CatalogDb;
pub use config::{load_config, GateConfig, PuzzleConfig};
pub use error::{GateError, Result};
pub use puzzle::{LockPuzzle, SubmitOutcome};
pub use session::{GateState, SessionGate, SESSION_DURATION};
pub use storage::StorageConfig;
