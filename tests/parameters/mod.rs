//! Integration tests for the parameter system
//!
//! These tests verify that the parameter tree behaves correctly in various scenarios.

// Tests for the node hierarchy and change notification
mod node_tests;

// Tests for leaf values, types and validators
mod leaf_tests;



// Tests for the JSON and binary snapshots
mod io_tests;
