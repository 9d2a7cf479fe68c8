//! # tickflow - Basket events and time-indexed history for dataflow engines
//!
//! tickflow defines two contracts a push-based dataflow engine honours every
//! evaluation cycle:
//!
//! - **Dynamic basket membership**: a lossless, ordered log of the keys that
//!   entered or left a keyed collection during one cycle.
//! - **Time-index policies**: how a range or boundary lookup into a
//!   time-ordered value history treats the sample at (or near) the boundary.
//!
//! ## Core Concepts
//!
//! - **BasketEventLog**: one cycle's membership changes, with `added_keys` and
//!   `removed_keys` filter views that keep every occurrence
//! - **TimeIndexPolicy**: `INCLUSIVE`, `EXCLUSIVE` or `EXTRAPOLATE` per edge
//! - **HistoryStore**: the lookup contract; `InMemoryHistory` implements it
//! - **MirrorSchema**: the stable layout native engines mirror
//!
//! ## Usage
//!
//! ```rust
//! use chrono::{TimeZone, Utc};
//! use tickflow::{BasketEventRecorder, HistoryStore, InMemoryHistory, TimeIndexPolicy};
//!
//! let mut recorder = BasketEventRecorder::new();
//! recorder.record_added("AAPL").record_removed("AAPL").record_added("AAPL");
//! let log = recorder.finish();
//! assert_eq!(log.added_keys().count(), 2);
//!
//! let history = InMemoryHistory::new();
//! history.push(Utc.timestamp_opt(1, 0).unwrap(), 10.0).unwrap();
//! history.push(Utc.timestamp_opt(5, 0).unwrap(), 12.5).unwrap();
//!
//! let window = history
//!     .values_between(
//!         Utc.timestamp_opt(1, 0).unwrap(),
//!         Utc.timestamp_opt(5, 0).unwrap(),
//!         TimeIndexPolicy::Inclusive,
//!         TimeIndexPolicy::Exclusive,
//!     )
//!     .unwrap();
//! assert_eq!(window.len(), 1);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod basket;
pub mod config;
pub mod error;
pub mod history;
pub mod mirror;
pub mod policy;

// Re-export primary types at crate root for convenience
pub use basket::{BasketEvent, BasketEventLog, BasketEventRecorder};
pub use config::HistoryConfig;
pub use error::{TickflowError, TickflowResult, ValidationError};
pub use history::{HistoryError, HistoryStore, InMemoryHistory, Sample};
pub use mirror::{MirrorSchema, MIRROR_VERSION};
pub use policy::{resolve_boundary, Boundary, BoundaryResolution, DuplicatePolicy, TimeIndexPolicy};
