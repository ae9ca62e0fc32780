//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Load phase:
//!     tree nodes
//!     → Registrar::mount (middlewares, path prefix)
//!     → Registrar::route (verb + exact path + handler chain)
//!     → Dispatcher layer stack (registration order)
//!
//! Incoming Request (method, path, query, body)
//!     → router.rs (walk layers in order)
//!     → matcher.rs (prefix or exact match, capture :params)
//!     → handlers stage a response or fail
//!     → JSON response, JSON error, or 404
//! ```
//!
//! # Design Decisions
//! - Layers registered at load time, immutable while serving
//! - No regex in hot path (segment comparison only)
//! - Deterministic: same request always runs the same layers
//! - First match wins (registration order)

pub mod matcher;
pub mod router;

pub use matcher::{join_paths, PathPattern};
pub use router::{Dispatcher, HttpVerb, Registrar, DEFAULT_BODY_LIMIT};
