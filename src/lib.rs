//! Machina CLI library — exposes modules for integration testing.

#![cfg_attr(test, allow(clippy::expect_used))]

pub mod actions;
pub mod channel;
pub mod cli;
pub mod command_runner;
pub mod commands;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod logging;
pub mod output;
pub mod patch;
pub mod resolver;
pub mod session;
