//! # Trellis Testkit
//!
//! Testing utilities for Trellis.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Fixtures**: wired-up services over in-memory stores and temp-dir
//!   binary stores, plus quad builders
//! - **Generators**: Proptest strategies for tokens, layouts, quads and content
//! - **Tracing**: a test subscriber honouring `RUST_LOG`
//!
//! ## Test Fixtures
//!
//! ```rust
//! use trellis_testkit::fixtures::{dataset, user_quad, TestFixture};
//!
//! let fixture = TestFixture::new();
//! let quads = dataset(&[user_quad("http://example.com/1", "title")]);
//! assert_eq!(quads.len(), 1);
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use trellis_testkit::generators::token;
//!
//! proptest! {
//!     #[test]
//!     fn layout_is_deterministic(t in token()) {
//!         // ...
//!     }
//! }
//! ```

pub mod fixtures;
pub mod generators;

pub use fixtures::{BinaryFixture, TestFixture};

/// Install a global `tracing` subscriber for tests.
///
/// Filtered by `RUST_LOG`; output goes through the test harness so it is
/// only shown for failing tests. Safe to call from every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
