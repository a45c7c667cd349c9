pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod git;
pub mod logging;
pub mod message;
pub mod notifier;
pub mod space;

pub use error::NotifyError;
