pub mod config;
pub mod email;
pub mod link;
pub mod page;
pub mod platform;
pub mod profile;
pub mod record;
