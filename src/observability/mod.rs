//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Store, adapters, bridge and submitter produce:
//!     → logging.rs (structured log events via `tracing`)
//!     → metrics.rs (counters via the `metrics` facade)
//!
//! Consumers:
//!     → stderr (pretty or JSON lines)
//!     → whatever metrics recorder the host application installs
//! ```
//!
//! # Design Decisions
//! - Public keys are logged shortened; payloads are never logged
//! - Metrics are no-ops until a recorder is installed

pub mod logging;
pub mod metrics;
