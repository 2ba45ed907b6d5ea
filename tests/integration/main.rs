//! Integration tests for the page analyzer
//!
//! `analyze_tests` drives full analysis runs against wiremock servers;
//! `pool_tests` exercises the task pool through its public API.

mod analyze_tests;
mod pool_tests;
