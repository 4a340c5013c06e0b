// SPDX-FileCopyrightText: 2026 Uproar Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Uproar integration tests.
//!
//! Provides mock adapters and test harness infrastructure for fast,
//! deterministic, CI-runnable tests without external services.
//!
//! # Components
//!
//! - [`MockChannel`] - Mock messaging channel with message injection and capture
//! - [`MockVerifier`] - Mock engagement verifier with scripted verdicts
//! - [`TestHarness`] - Full agent stack over a temp SQLite database

pub mod harness;
pub mod mock_channel;
pub mod mock_verifier;

pub use harness::TestHarness;
pub use mock_channel::MockChannel;
pub use mock_verifier::MockVerifier;
