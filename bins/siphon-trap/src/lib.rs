// siphon-rs - The Siphon SIP Stack
// Copyright (C) 2025 James Ferris <ferrous.communications@gmail.com>
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! SIP honeypot daemon.
//!
//! Answers OPTIONS pings and REGISTER sweeps, challenges and then accepts
//! INVITEs, and records whatever RTP the caller sends to the advertised
//! media port. See [`server::Honeypot`] for the entry point.

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod handlers;
pub mod server;
pub mod services;
pub mod session;
pub mod transport;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::HoneypotConfig;
pub use server::Honeypot;
