pub mod campaigns;
pub mod handler;
pub mod models;
pub mod payments;
pub mod users;
