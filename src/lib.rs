pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod models;
pub mod store;
pub mod sync;
pub mod view;
pub mod websocket;

pub use error::{Error, Result};
