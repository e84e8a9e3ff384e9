pub mod config;
mod default;
pub mod error;
pub mod factory;
pub mod fetch;
pub mod sheeta;
pub mod utils;

pub use default::{default_client, default_factory, install_rustls_provider};
