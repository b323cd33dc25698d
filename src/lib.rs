pub mod api;
pub mod cli;
pub mod config;
pub mod database;
pub mod error;
pub mod notify;
pub mod paging;
pub mod repository;
pub mod schedules;
pub mod schema;
pub mod server;
pub mod service;
