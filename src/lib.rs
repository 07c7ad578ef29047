//! modvault - A private, self-hostable registry for versioned Terraform modules
//!
//! Artifacts are organized as namespace → module → system → version. The
//! [`registry`] module owns the hierarchy and its invariants; the storage
//! contracts live in [`document_store`] and [`blob_store`].

pub mod blob_store;
pub mod cli;
pub mod document_store;
pub mod http_server;
pub mod logging;
pub mod registry;
