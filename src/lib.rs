pub mod alert;
pub mod cli;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod rules;
pub mod watcher;
pub mod workbook;
