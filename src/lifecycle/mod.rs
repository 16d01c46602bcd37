//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Validate config → Register routes → Bind listener → Serve
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop accepting → Drain connections → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//!
//! Supervisor (supervisor.rs):
//!     Panic outside a request → Fatal log → Exit(1)
//! ```
//!
//! # Design Decisions
//! - Fail fast: any startup error is returned before a socket is opened
//! - One process-wide supervisor, installed explicitly with its logger

pub mod shutdown;
pub mod signals;
pub mod startup;
pub mod supervisor;

pub use shutdown::Shutdown;
pub use signals::shutdown_signal;
pub use startup::{start_server, StartupError};
pub use supervisor::{Supervisor, SupervisorError};
