pub mod api;
pub mod auth;
pub mod cli;
pub mod config;
pub mod controller;
pub mod database;
pub mod error;
pub mod filter;
pub mod handlers;
pub mod middleware;
pub mod server;
