// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Switchboard integration tests.
//!
//! Provides a scriptable mock provider for fast, deterministic,
//! CI-runnable tests without external model APIs.
//!
//! # Components
//!
//! - [`MockProvider`] - Mock provider adapter with a scripted outcome queue

pub mod mock_provider;

pub use mock_provider::{MOCK_OPT_OUT, MockProvider};
