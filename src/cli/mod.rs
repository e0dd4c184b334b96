mod ask;
mod config;
mod root;

pub use root::Cli;
