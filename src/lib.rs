/* src/lib.rs */

// Re-export modules for both binary and tests
pub mod control;
pub mod error;
pub mod health;
pub mod logger;
pub mod parse;
pub mod runtime;

pub use control::Supervisor;
pub use error::{ConfigError, LogError, StartError};
pub use health::{HealthCheckOutcome, HealthChecker, Probe};
pub use parse::Config;
pub use runtime::{CommandSpawner, ProcessSpawner};
