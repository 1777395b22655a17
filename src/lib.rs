//! EliteBuilders: the session/profile resolver plus the HTTP API over the
//! builders, sponsors, challenges and submissions tables.

pub mod app;
pub mod auth;
pub mod builders;
pub mod challenges;
pub mod config;
pub mod db;
pub mod error;
pub mod session;
pub mod sponsors;
pub mod state;
pub mod store;
pub mod submissions;
pub mod validation;

#[cfg(test)]
pub(crate) mod testing;
