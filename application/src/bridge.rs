//! Blocking-to-async bridge.
//!
//! The agent contract exposes blocking entry points (`chat`,
//! `stream_chat`) for callers that do not run inside an event loop. The
//! bridge either reuses the ambient tokio runtime or builds a private
//! current-thread runtime, so the blocking forms never assume a runtime
//! exists.

use std::future::Future;

use thiserror::Error;
use tokio::runtime::{Builder, Handle, Runtime};

/// Errors from acquiring a runtime for blocking execution
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Failed to build blocking runtime: {0}")]
    Runtime(String),
}

/// A handle that can drive futures to completion from blocking code.
///
/// `Owned` carries a private current-thread runtime; tasks spawned while
/// a future runs under [`block_on`](BlockingBridge::block_on) live on
/// that runtime and make progress only during subsequent `block_on`
/// calls — keep the bridge alive as long as those tasks matter.
///
/// `Ambient` reuses the caller's runtime via `block_in_place`, which
/// requires a multi-thread runtime; calling the blocking entry points
/// from a current-thread runtime is a caller error.
pub enum BlockingBridge {
    Owned(Runtime),
    Ambient(Handle),
}

impl BlockingBridge {
    /// Reuse the ambient runtime if present, otherwise build one.
    pub fn acquire() -> Result<Self, BridgeError> {
        match Handle::try_current() {
            Ok(handle) => Ok(Self::Ambient(handle)),
            Err(_) => Builder::new_current_thread()
                .enable_all()
                .build()
                .map(Self::Owned)
                .map_err(|e| BridgeError::Runtime(e.to_string())),
        }
    }

    /// Drive a future to completion, blocking the current thread.
    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        match self {
            Self::Owned(runtime) => runtime.block_on(future),
            Self::Ambient(handle) => tokio::task::block_in_place(|| handle.block_on(future)),
        }
    }
}

/// One-shot helper: drive a single future from blocking code.
pub fn run_blocking<F: Future>(future: F) -> Result<F::Output, BridgeError> {
    Ok(BlockingBridge::acquire()?.block_on(future))
}
