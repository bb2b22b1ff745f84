pub mod api;
pub mod config;
pub mod database;
pub mod error;
pub mod firing;
pub mod gitlab;
pub mod notifier;
pub mod schedule;

pub use error::{NotifierError, Result};
