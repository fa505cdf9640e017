//! Integration tests for Deadlink-Patrol
//!
//! These tests use wiremock to create mock websites, webhooks and health
//! check endpoints and run complete checks against them.

mod crawl_tests;
mod run_tests;
