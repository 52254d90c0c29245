pub mod activity_log;
pub mod populate;
