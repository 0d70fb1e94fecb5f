pub mod api;
pub mod collectors;
pub mod config;
pub mod debug_session;
pub mod hub;
pub mod logging;
pub mod monitor;
pub mod queries;
pub mod scheduler;
pub mod server;
pub mod snapshot;
pub mod types;
pub mod ui;

pub use config::Config;
pub use monitor::{Broadcast, Monitor};
pub use server::{launch_allowed, serve};
pub use types::{FullState, MetricsSnapshot, ProcessInfo};
