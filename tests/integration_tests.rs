//! Integration tests entry point
//!
//! This file includes all integration test modules from the integration/
//! subdirectory, keeping them in one test binary while allowing the files to
//! stay organized per subsystem.

mod integration;
