pub mod config;
pub mod error;
pub mod extract;
pub mod store;
pub mod traits;
pub mod types;
pub mod window;
