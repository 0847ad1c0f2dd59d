pub mod app;
pub mod config;
pub mod dispatcher;
pub mod dump;
pub mod fill;
pub mod logging;
pub mod registry;
pub mod remote;
pub mod router;
pub mod types;
pub mod viewport;
