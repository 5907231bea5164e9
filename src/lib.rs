pub mod ast;
pub mod config;
pub mod environment;
pub mod error;
pub mod executor;
