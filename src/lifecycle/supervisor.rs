//! Process-level failure handling.
//!
//! A [`Supervisor`] is installed once per process with an explicit logger.
//! It registers a panic hook: panics raised inside a request scope are left
//! to the request handler, anything else is logged at fatal severity and
//! the process exits with code 1.

use std::error::Error;
use std::panic::{self, PanicHookInfo};
use std::sync::OnceLock;

use serde_json::Value;
use thiserror::Error;

use crate::http::middleware::in_request_scope;
use crate::http::middleware::request_scope::panic_message;
use crate::observability::audit::standard_error;
use crate::observability::logger::SharedLogger;

static SUPERVISOR: OnceLock<Supervisor> = OnceLock::new();

/// Exit status used for every fatal termination.
pub const FATAL_EXIT_CODE: i32 = 1;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SupervisorError {
    #[error("a process supervisor is already installed")]
    AlreadyInstalled,
}

type Terminator = Box<dyn Fn(i32) + Send + Sync>;

pub struct Supervisor {
    logger: SharedLogger,
    terminate: Terminator,
}

impl Supervisor {
    /// Install the process supervisor, terminating with `process::exit`.
    pub fn install(logger: SharedLogger) -> Result<&'static Supervisor, SupervisorError> {
        Self::install_with(logger, |code| std::process::exit(code))
    }

    /// Install with a custom terminator. Only the first call succeeds.
    pub fn install_with(
        logger: SharedLogger,
        terminate: impl Fn(i32) + Send + Sync + 'static,
    ) -> Result<&'static Supervisor, SupervisorError> {
        let mut installed = false;
        let supervisor = SUPERVISOR.get_or_init(|| {
            installed = true;
            Supervisor {
                logger,
                terminate: Box::new(terminate),
            }
        });
        if !installed {
            return Err(SupervisorError::AlreadyInstalled);
        }

        panic::set_hook(Box::new(|info| {
            if in_request_scope() {
                return;
            }
            if let Some(supervisor) = SUPERVISOR.get() {
                supervisor.on_panic(info);
            }
        }));
        Ok(supervisor)
    }

    /// The installed supervisor, if any.
    pub fn get() -> Option<&'static Supervisor> {
        SUPERVISOR.get()
    }

    /// Log `err` at fatal severity and terminate.
    pub fn fail(&self, err: &(dyn Error + 'static)) {
        let serialized = self
            .logger
            .serialize_error(err)
            .unwrap_or_else(|| standard_error(err));
        self.logger
            .fatal("uncaught exception", crate::fields!("err" => serialized));
        (self.terminate)(FATAL_EXIT_CODE);
    }

    fn on_panic(&self, info: &PanicHookInfo<'_>) {
        let location = info
            .location()
            .map(|l| Value::String(format!("{}:{}:{}", l.file(), l.line(), l.column())))
            .unwrap_or(Value::Null);
        let thread = std::thread::current();
        self.logger.fatal(
            "uncaught exception",
            crate::fields!(
                "thread" => thread.name().unwrap_or("<unnamed>"),
                "err" => crate::fields!(
                    "name" => "Panic",
                    "message" => panic_message(info.payload()),
                    "stack" => location,
                ),
            ),
        );
        (self.terminate)(FATAL_EXIT_CODE);
    }
}
