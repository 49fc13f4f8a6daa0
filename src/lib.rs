pub mod api;
pub mod auth;
pub mod bootstrap;
pub mod campaigns;
pub mod config;
pub mod error;
pub mod funding;
pub mod gateway;
pub mod ledger;
pub mod middleware;
pub mod notifications;
pub mod server;
pub mod settlement;
pub mod users;

#[cfg(test)]
mod test_support;
