//! # api — HTTP adapter for the hosted record store
//!
//! Implements the core's [`store::RemoteStore`] trait against the store's
//! REST surface. The [`client`] module carries the request plumbing and
//! error classification; [`fields`] owns the translation between the wire
//! field names and the canonical contact model, so none of the store's
//! naming quirks leak past this crate.

pub mod client;
pub mod fields;

pub use client::HttpRemoteStore;
