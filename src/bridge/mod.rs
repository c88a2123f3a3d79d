//! Remote signing bridges.
//!
//! # Data Flow
//! ```text
//! XummAdapter (first use)
//!     → XummBridgeFactory::init (credentials from config / env)
//!     → XummClient
//!         → POST /payload        (sign request, deep link logged)
//!         → GET  /payload/{uuid} (polled until resolved or expired)
//!         → PayloadEvent stream back to the adapter
//! ```
//!
//! # Security Constraints
//! - The API secret is marked sensitive and never logged
//! - Signed blobs are handed back to the caller, never logged

pub mod xumm_client;

pub use xumm_client::{XummBridgeFactory, XummClient};
