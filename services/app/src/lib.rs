pub mod adapters;
pub mod config;
pub mod error;
pub mod shell;
pub mod state;
