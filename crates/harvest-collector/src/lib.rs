//! Incremental collection of rows from a lazily rendered table
//!
//! The collector reads whatever rows are currently rendered, keeps the ones
//! it has not seen, scrolls, waits a fixed settle interval and repeats until
//! either the advertised total is reached or a pass turns up nothing new.
//!
//! - [`view`]: the [`TableView`] capability the loop drives, plus a scripted mock
//! - [`status`]: parsing the "Showing X of N" indicator
//! - [`collector`]: the loop itself

pub mod collector;
pub mod status;
pub mod view;

pub use collector::{Harvest, IncrementalCollector, StopReason};
pub use status::parse_total_count;
pub use view::{MockTableView, TableView};
