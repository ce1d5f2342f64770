//! Thin clients for the Google APIs the scheduler depends on: OAuth
//! token exchange, Calendar event insertion, and Gmail sending.

pub mod gcal;
pub mod gmail;
pub mod oauth;

pub use oauth::Credentials;
