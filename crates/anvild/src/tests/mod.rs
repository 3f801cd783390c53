//! Crate-level tests for the tool server.

mod support;
