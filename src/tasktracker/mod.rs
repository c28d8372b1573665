pub mod api;
pub mod api_types;
pub mod cache;
pub mod client;
pub mod types;

#[cfg(test)]
pub mod testing;

pub use api::TaskTrackerApi;
pub use cache::TaskTrackerKey;
pub use client::TaskTrackerClient;
