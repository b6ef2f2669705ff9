pub mod feed_monitor;
pub mod scheduler;
pub mod types;
