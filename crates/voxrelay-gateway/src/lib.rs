//! HTTP gateway for the voice pipeline.
//!
//! One shared session: every `/api/process` call runs the pipeline against
//! it, one run at a time, and `/api/history` reads it back.

pub mod handlers;
pub mod server;
pub mod state;

pub use server::{router, start_gateway};
pub use state::GatewayState;
