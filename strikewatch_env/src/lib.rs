//! StrikeWatch Environment Abstraction Layer
//!
//! This crate provides the "Sans-IO" seam that lets the strike detection
//! protocol run both against the real clock (tokio) and inside the
//! deterministic simulation harness.
//!
//! # Core Concept
//!
//! Every source of non-determinism the protocol touches is behind a trait:
//! - Time (`now()`, `sleep()`)
//! - Messaging (`send()`, `recv()`, `broadcast()`)
//!
//! # Example
//!
//! ```ignore
//! use strikewatch_env::{StrikeContext, NetworkTransport, Message};
//!
//! async fn agent_loop<Ctx: StrikeContext, Net: NetworkTransport>(ctx: &Ctx, net: &Net) {
//!     while let Some((from, message)) = net.recv().await {
//!         if let Message::Finish = message {
//!             break;
//!         }
//!         // answer the round token ...
//!     }
//! }
//! ```

mod context;
mod network;
mod types;
mod error;
mod tokio_impl;

pub use context::StrikeContext;
pub use network::{NetworkTransport, NetworkController};
pub use types::{Rank, RoundToken, Message, COORDINATOR_RANK};
pub use error::EnvError;
pub use tokio_impl::TokioContext;
