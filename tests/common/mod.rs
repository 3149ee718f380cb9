//! Shared test fixtures

pub mod database;
