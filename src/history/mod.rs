//! Time-ordered value histories.
//!
//! [`HistoryStore`] is the lookup contract; [`InMemoryHistory`] is the
//! reference implementation used by embedded engines and tests.

mod memory;
mod traits;

pub use memory::InMemoryHistory;
pub use traits::{HistoryError, HistoryStore, Sample};
