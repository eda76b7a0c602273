//! `twincan`: `no_std` driver for a two-node CAN link. One transmit and one
//! receive message object, a single-slot receive buffer, statistics, bus-off
//! recovery, an echo responder, and an on-target self-test harness reporting
//! through two status indicators.
//!
//! The peripheral, the indicators and the clock are injected through the
//! traits in [`driver::traits`], so the same code runs on target and against
//! host-side doubles.
#![no_std]
//==================================================================================
/// Driver configuration: bit rate, identifiers, slots, loopback and mode.
pub mod config;
/// Frame and statistics value types.
pub mod core;
/// Driver, message objects, error handling and event delivery.
pub mod driver;
/// Configuration, message and driver errors.
pub mod error;
/// Deadlines and bounded polling on an injected clock.
pub mod infra;
/// Six-case on-target self-test and its indicator report.
pub mod selftest;
/// Normal-mode loop and mode dispatch.
pub mod app;
//==================================================================================
#[cfg(test)]
extern crate std;
#[cfg(test)]
use critical_section as _;
