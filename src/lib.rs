mod api;
pub mod args;
pub mod cache;
pub mod commands;
mod config;
mod error;
pub mod form;
pub mod model;
mod session;
pub mod stats;
mod utils;
pub mod window;


pub use api::Mode;
pub use config::Config;
pub use error::Result;
