pub mod auth;
pub mod cli;
pub mod config;
pub mod database;
pub mod error;
pub mod filter;
pub mod handlers;
pub mod ledger;
pub mod middleware;

#[cfg(test)]
pub mod testing;
