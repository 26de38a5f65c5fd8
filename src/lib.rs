pub mod cache;
pub mod config;
pub mod error;
pub mod items;
pub mod oauth;
pub mod routes;
pub mod server;

pub use config::Config;
pub use server::Server;
