pub mod config;
pub mod csv_writer;
pub mod env_loader;
pub mod error;
pub mod extract;
pub mod models;
pub mod pipeline;
pub mod report;
pub mod sink;
pub mod storage;
