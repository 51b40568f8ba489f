//! Hearth: Rental Listing Collection
//!
//! Collects rental listings from external sites, caches fetched pages, and
//! reconciles fresh scrapes against stored records without clobbering manual
//! edits. Protection is decided by fingerprinting field values at the moment
//! the automation last wrote them.

pub mod api;
pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod fetch;
pub mod ledger;
pub mod listing;
pub mod logging;
pub mod reconcile;
pub mod source;
pub mod store;
