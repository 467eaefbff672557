pub mod filter;
pub mod store;

pub use filter::{preview_of, HistoryFilter, Period};
pub use store::{HistoryRecord, HistoryStore};
