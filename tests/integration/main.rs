//! Integration tests for the harvester
//!
//! These tests use wiremock to serve a small news site and run the
//! pipeline stages against it end-to-end.

mod collect;
mod common;
mod fetch;
mod pipeline;
