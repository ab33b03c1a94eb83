//! Healthcheck Integration Tests
//!
//! Drives a registry chain and a monitored chain against each other through
//! an in-memory transport, relaying every handshake step, packet,
//! acknowledgement and timeout between them.
//!
//! # Scenarios Tested
//!
//! 1. **Handshake**: full four-step open, role ordering, duplicate and
//!    unregistered peers, crossing hellos
//! 2. **Reports**: periodic emission, acceptance, staleness, delivery
//!    outcomes and timeouts

pub mod harness;

#[cfg(test)]
mod handshake_tests;
