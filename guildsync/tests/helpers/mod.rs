//! Test helpers for guildsync integration tests
//!
//! - FakeTransport: scripted HTTP responses, recorded requests
//! - ManualClock: fixed time, recorded sleeps
//! - fixtures: roster pages, store responses, commands, settings

#![allow(dead_code)]

pub mod fake_transport;
pub mod fixtures;
pub mod manual_clock;

pub use fake_transport::FakeTransport;
pub use fixtures::*;
pub use manual_clock::{ManualClock, SequentialIds};
