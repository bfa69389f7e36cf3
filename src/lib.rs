//! Order lifecycle engine for a multi-vendor marketplace: carts, priced
//! orders with a guarded status machine, refund/exchange requests with
//! time-based escalation, and dine-in reservation requests.

pub mod api;
pub mod app;
pub mod clock;
pub mod config;
pub mod domain;
pub mod error;
pub mod event_sourcing;
pub mod metrics;
pub mod notifications;
pub mod scheduler;
pub mod utils;
