//! Lot Console Library
//!
//! Client core of the factory inventory console: reconciling intake
//! quantities, planning lot allocations for tasks, parsing scanned labels,
//! and the typed REST client they talk through.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod client;
pub mod config;
pub mod errors;
pub mod gateway;
pub mod models;
pub mod services;
pub mod session;

pub use client::ApiClient;
pub use errors::ServiceError;
pub use services::allocation::{LotAllocationPlanner, QuantityMode, SessionPhase};
pub use services::barcode::parse_item_id;
pub use session::Session;
