//! cheapcharge library - cheapest-slot battery charge scheduling
//!
//! This module exports internal components for integration testing.

pub mod cli;
pub mod config;
pub mod daylight;
pub mod error;
pub mod growatt;
pub mod octopus;
pub mod orchestrator;
pub mod redact;
pub mod schedule;
pub mod scheduler;
pub mod tariff;
pub mod window;
