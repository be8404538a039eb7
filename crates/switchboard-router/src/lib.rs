// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Complexity classification, provider registry, and routing policy for
//! Switchboard.
//!
//! This crate provides:
//! - [`Classifier`]: Heuristic complexity classification (zero-cost, zero-latency)
//! - [`ProviderRegistry`]: Registered providers with lock-free health tracking
//! - [`RoutingPolicy`]: Fallback-chain construction from preference, tier, and health
//!
//! The router sits between request intake and provider execution: a prompt
//! is classified into a tier, the tier's preference ladder is filtered
//! against live registry health, and the resulting candidate chain is
//! handed to the execution engine for sequential attempts.

pub mod classifier;
pub mod policy;
pub mod registry;

pub use classifier::{Classification, Classifier};
pub use policy::{Candidate, RoutePreference, RoutingDecision, RoutingPolicy};
pub use registry::{ProviderRegistry, ProviderView};
