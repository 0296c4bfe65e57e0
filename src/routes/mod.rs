pub mod admin;
pub mod auth;
pub mod hotel;
pub mod public;
