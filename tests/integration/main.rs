//! Integration tests for machina CLI
//!
//! These tests spawn the actual binary and test end-to-end argument
//! handling. Nothing here reaches AWS.
