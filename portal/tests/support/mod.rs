//! Shared helper utilities for portal integration tests.
//!
//! Integration tests compile as separate crates under `portal/tests/`, so
//! each suite pulls this module in with `mod support;` and uses only what it
//! needs.

#![allow(dead_code)]

pub mod doubles;

use std::sync::Arc;

use tokio::runtime::Runtime;

/// Cloneable runtime handle so scenario worlds can keep it in a `Slot`.
#[derive(Clone)]
pub struct RuntimeHandle(pub Arc<Runtime>);

impl RuntimeHandle {
    pub fn new() -> Self {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("tokio runtime should build");
        Self(Arc::new(runtime))
    }

    pub fn block_on<F: std::future::Future>(&self, future: F) -> F::Output {
        self.0.block_on(future)
    }
}
