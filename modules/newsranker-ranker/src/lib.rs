//! The news-ranking service: message handlers, the subscription runtime, the
//! scrape-target publishing seam and the liveness loop. The binary in
//! `main.rs` wires these against Postgres and the broker.

pub mod handlers;
pub mod health;
pub mod publish;
pub mod subscriptions;

pub use publish::{BrokerScrapePublisher, ScrapePublisher};
