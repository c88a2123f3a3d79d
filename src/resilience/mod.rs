//! Retry pacing for remote calls.
//!
//! Only the XUMM status poller retries. Horizon submission is never retried.

pub mod backoff;

pub use backoff::retry_delay;
