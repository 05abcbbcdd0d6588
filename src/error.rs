//! Error types for the demodulation pipeline.
//!
//! Frame rejection (bad preamble, bad CRC, unmet confidence threshold) is not an
//! error at all here -- it happens at high volume and is modeled as silent
//! non-emission (see `pipeline` and `trust`). Only genuine misuse of the API
//! surfaces as `DemodError`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DemodError {
    /// `start_async` was called while an async worker was already running.
    #[error("async worker already running")]
    AlreadyRunning,

    /// `process_samples` (synchronous) was called while the async worker is active.
    #[error("cannot process samples synchronously while the async worker is running")]
    SyncWhileAsyncRunning,

    /// The async worker task terminated abnormally.
    #[error("demodulator worker panicked")]
    WorkerPanicked,
}
