//! Consolidated integration tests for securedapp-core.
//!
//! One test binary keeps link time down and avoids parallel proptest
//! binaries fighting over the runner.
//! See: https://matklad.github.io/2021/02/27/delete-cargo-integration-tests.html

mod evaluator;
mod gate;
mod signing;
mod support;
