//! Unit tests for machina CLI
//!
//! These tests use mocked channel/inventory ports and run fast without
//! touching AWS.

mod dispatch_tests;
mod helpers;
mod property_tests;
