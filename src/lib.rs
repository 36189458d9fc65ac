// -- Lint policy ---------------------------------------------------------
// This is the single source of truth for crate-wide lints.

// Broad lint groups
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![deny(clippy::nursery)]
// Documentation
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]
#![deny(rustdoc::bare_urls)]
// No panicking in library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]
// No debug/print artifacts
#![deny(clippy::dbg_macro)]
#![deny(clippy::print_stdout)]
#![deny(clippy::print_stderr)]
// Import hygiene
#![deny(clippy::wildcard_imports)]
// Complexity limits
#![deny(clippy::cognitive_complexity)]
#![deny(clippy::too_many_lines)]
#![deny(clippy::excessive_nesting)]
// Function signature hygiene
#![deny(clippy::too_many_arguments)]
#![deny(clippy::fn_params_excessive_bools)]
// Clone / pass-by-value hygiene
#![deny(clippy::needless_pass_by_value)]
#![deny(clippy::implicit_clone)]
// String hygiene
#![deny(clippy::inefficient_to_string)]
#![deny(clippy::redundant_closure_for_method_calls)]
#![deny(clippy::manual_string_new)]
#![deny(clippy::str_to_string)]
// Cargo lints (warn, not deny since cargo lints can be noisy)
#![warn(clippy::cargo)]
// Unused / redundant code
#![deny(unused_results)]
#![deny(unused_qualifications)]
// Cast hygiene
#![deny(trivial_casts)]
#![deny(trivial_numeric_casts)]

//! Spatial indexing and matrix accumulation for 3D genome structures.
//!
//! Livemap turns traces (one 3D point per genomic segment, some segments
//! missing) into two square, symmetric data products: a contact-frequency
//! matrix counting how often two segments lie within a distance threshold,
//! and a distance matrix holding pairwise distances of one trace or their
//! per-cell average across an ensemble.
//!
//! # Key entry points
//!
//! - [`spatial::SpatialIndex`] - static k-d tree with radius and box queries
//! - [`matrix::compute_contact_frequency`] - contact counts over traces
//! - [`matrix::compute_trace_distances`] and
//!   [`matrix::compute_ensemble_average_distances`] - distance matrices
//! - [`transport::ComputeWorker`] - runs an [`engine::ComputeEngine`] on a
//!   background thread, one request at a time
//! - [`options::Options`] - index and threshold tunables with TOML presets
//!
//! # Architecture
//!
//! Callers build a [`transport::ComputeRequest`], submit it to a worker and
//! receive a [`transport::ComputeResponse`] whose flat `f32` matrix buffer
//! is moved, not copied, back across the thread boundary. Inside the
//! worker, the contact engine builds one spatial index per trace and
//! accumulates traces in parallel; the distance engine computes all pairs
//! directly.

pub mod engine;
pub mod error;
pub mod matrix;
pub mod options;
pub mod spatial;
pub mod trace;
pub mod transport;
#[cfg(feature = "web")]
pub mod web;

pub use error::LiveMapError;
pub use options::Options;
pub use trace::{Point3D, Trace};
