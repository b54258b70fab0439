//! Batch indicator lookup against the Sumo Logic Search Job API.
//!
//! Each entity in a batch gets its own asynchronous search job, driven to a
//! terminal state by a bounded poll loop under an admission gate, with the
//! results condensed into short display tags.

mod batch;
mod entity;
mod gate;
mod options;
mod poller;
mod search_api;
mod summary;
mod template;

pub use batch::*;
pub use entity::*;
pub use gate::*;
pub use options::*;
pub use poller::*;
pub use search_api::SearchJobApi;
pub use summary::*;
pub use template::*;
