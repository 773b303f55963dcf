pub mod types;
pub mod error;
pub mod config;
pub mod data;
pub mod filter;
pub mod aggregate;
pub mod chart;
pub mod view;
pub mod pages;
pub mod server;
