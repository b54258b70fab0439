mod auth;
mod client;
mod search_job;
mod search_url;

pub use auth::*;
pub use client::*;
pub use search_job::*;
pub use search_url::*;
