//! HTTP outbound adapter for the portal's remote API.
//!
//! This module provides a thin reqwest implementation of the
//! `IdentityApi`, `BloodRequestApi` and `DictionarySource` ports.

mod client;
mod dto;

pub use client::HttpPortalApi;
