//! HTTP request handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, timeout, tracing)
//!     → routing::Dispatcher (buffer body, decode query, walk layers)
//!     → context.rs (RequestContext shared by every handler)
//!     → middlewares (Handler impls) and handler.rs (MethodHandler)
//!         → validate params and body → controller.rs (Controller::call)
//!     → staged response, or response.rs (RouteError as JSON)
//!     → Send to client
//! ```
//!
//! # Design Decisions
//! - Handlers return `Result`; failures never unwind through the dispatcher
//! - Responses are staged so later middlewares can inspect them
//! - Controllers get validated copies; the raw request stays on the context

pub mod context;
pub mod controller;
pub mod handler;
pub mod response;
pub mod server;

pub use context::{
    handler_fn, ContextInitializer, CustomArgs, Flow, Handler, RequestContext, StagedResponse,
};
pub use controller::{controller_fn, Controller, ControllerInput, ControllerResult, StatusSetter};
pub use handler::MethodHandler;
pub use response::{RouteError, ValidationData};
pub use server::HttpServer;
