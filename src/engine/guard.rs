//! Failure containment for capability calls made during a run.
//!
//! A capability may fail by returning an error or by panicking. Either way the
//! run must end with a reported outcome instead of taking the host down.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

/// Run `f`, turning errors and panics into a message.
pub fn guarded<T>(f: impl FnOnce() -> anyhow::Result<T>) -> Result<T, String> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(format!("{:#}", e)),
        Err(payload) => Err(panic_message(payload.as_ref())),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {}", s)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {}", s)
    } else {
        "panicked".to_string()
    }
}
