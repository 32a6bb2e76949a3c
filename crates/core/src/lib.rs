//! Core business logic for Broto Complain Track.
//!
//! Page-level services over the `broto-db` repositories, form validation,
//! and the assistant chat client.

pub mod chat;
pub mod services;
pub mod validation;

#[cfg(test)]
mod test_support;

pub use services::*;
