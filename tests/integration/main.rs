//! Integration tests for oi-snapshot

mod e2e_test;
mod feed_test;
mod proptests;
mod snapshot_test;
