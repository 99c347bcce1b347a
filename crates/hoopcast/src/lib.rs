// Library root: re-exports all modules so integration tests and the binary
// can reach the crate's public API.

pub mod config;
pub mod context;
pub mod draft;
pub mod llm;
pub mod protocol;
pub mod repl;
pub mod session;
pub mod stats;
pub mod tools;
pub mod ws_server;
