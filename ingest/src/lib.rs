pub mod adapters;
pub mod api;
pub mod config;
pub mod prometheus;
pub mod router;
pub mod server;
pub mod uom;
pub mod v0_endpoint;
