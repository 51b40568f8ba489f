//! CLI domain: parse, route, and output only.
//! No domain orchestration; the single route table dispatches to the listing
//! service.

mod output;
mod parse;
mod route;

pub use output::map_error;
pub use parse::{CacheCommands, Cli, Commands, LedgerCommands};
pub use route::RunContext;
