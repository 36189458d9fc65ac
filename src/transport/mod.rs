//! Offloading computations to background workers.
//!
//! Requests and responses are plain serde types ([`ComputeRequest`],
//! [`ComputeResponse`]) with a camelCase JSON wire form. A
//! [`ComputeWorker`] owns one engine on a dedicated thread and answers one
//! request at a time.

pub mod codec;
mod message;
mod worker;

pub use message::{ComputeRequest, ComputeResponse, Mode};
pub use worker::{ComputeWorker, PendingResponse, RequestState};

pub use crate::matrix::MatrixBuffer;
