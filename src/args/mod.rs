//! CLI argument types and parsing helpers.
mod cli;
mod parsers;
mod types;


pub use cli::{NodeManagerArgs, WorkGenArgs};
pub use types::HostPort;
