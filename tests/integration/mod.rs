//! Integration tests for the Hearth listing collection system

mod cli_commands;
mod persistence_reopen;
mod service_reconcile;
mod test_utils;
