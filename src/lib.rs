pub mod account;
pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod ids;
pub mod resource;
pub mod storage;
