//! Bounded retry for remote calls that can report a transient outage.
//!
//! The wrapped action reports its outcome as an [`Attempt`] instead of relying on error
//! types, so the executor only has to branch on the tag:
//!
//! - [`Attempt::Done`] returns immediately.
//! - [`Attempt::Transient`] waits the configured delay and tries again, until
//!   `max_attempts` invocations have been made.
//! - [`Attempt::Fatal`] propagates without retrying.
//!
//! The wait blocks the calling thread. The pipeline is strictly sequential, so there is
//! nothing else to run in the meantime.

use std::time::Duration;

use eex_types::RetryConfig;
use tracing::{debug, error};

/// Outcome of a single invocation of a retried action.
#[derive(Debug)]
pub enum Attempt<T> {
    Done(T),
    /// The remote side signalled it is temporarily unavailable.
    Transient(String),
    Fatal(anyhow::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum RetryError {
    #[error("the action has not completed normally after {attempts} attempt(s)")]
    Exhausted { attempts: u32 },
    #[error(transparent)]
    Fatal(anyhow::Error),
}

/// Run `action` under `config` using a caller-supplied sleep function.
///
/// The attempt counter starts at 1 and is incremented after every transient failure;
/// another attempt is made while the counter is at most `max_attempts`. The first
/// attempt always runs, so a `max_attempts` of 0 behaves like 1.
///
/// There is no pause after the final failed attempt: exhausting `max_attempts`
/// invocations sleeps `max_attempts - 1` times and never logs a retry beyond the limit.
pub fn with_retries_and_sleep<T, F, S>(
    config: &RetryConfig,
    mut action: F,
    mut sleep: S,
) -> Result<T, RetryError>
where
    F: FnMut() -> Attempt<T>,
    S: FnMut(Duration),
{
    let mut attempt = 1u32;
    loop {
        match action() {
            Attempt::Done(value) => return Ok(value),
            Attempt::Fatal(e) => return Err(RetryError::Fatal(e)),
            Attempt::Transient(reason) => {
                error!("Service is unavailable {}", reason);
            }
        }

        attempt += 1;
        if attempt > config.max_attempts {
            return Err(RetryError::Exhausted {
                attempts: attempt - 1,
            });
        }
        debug!(
            "Retry {} of {} in {} seconds",
            attempt,
            config.max_attempts,
            config.delay.as_secs()
        );
        sleep(config.delay);
    }
}
