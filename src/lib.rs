pub mod config;
pub mod error;
pub mod launcher;
pub mod logger;
pub mod reporter;
pub mod runner;
pub mod server;

// Re-export commonly used types
pub use error::{Result, RustemError};
pub use runner::{
    BrowserRunner, ProcessRunner, ResultSet, Runner, RunnerEvent, RunnerId, TestOutcome,
};
pub use server::{AppContext, ServerEvent, ServerLink};
