pub mod config;
pub mod error;
pub mod facts;
pub mod identity;
pub mod server;
pub mod users;
