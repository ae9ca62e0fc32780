//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events with structured fields
//!         (node/key for unused configuration, verb/path for registrations,
//!          status/error for rejected requests)
//!     → logging.rs (EnvFilter + fmt layer on stderr)
//!
//! HTTP server adds:
//!     → TraceLayer spans per request
//!     → x-request-id set and propagated
//! ```
//!
//! # Design Decisions
//! - Structured fields rather than formatted messages
//! - Library code only emits events; the binary installs the subscriber

pub mod logging;
