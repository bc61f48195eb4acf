pub mod auth;
pub mod core;
pub mod dashboards;
pub mod history;
pub mod sessions;
