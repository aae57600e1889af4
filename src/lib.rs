pub mod config;
pub mod errors;
pub mod export;
pub mod ingest;

pub mod database;
pub mod server;
pub mod services;
