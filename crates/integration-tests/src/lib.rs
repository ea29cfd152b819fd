//! Integration tests for Tandem.
//!
//! These tests exercise the gallery subsystem across crate boundaries
//! without a database or network:
//!
//! - `gallery_invariants` - the single-primary invariant over operation
//!   sequences and the persisted wire shape
//! - `gallery_editor_session` - concurrent upload completions, cancellation,
//!   and save/retry behavior of the editing session
//! - `transcode` - the image normalization contract
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p tandem-integration-tests
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]
