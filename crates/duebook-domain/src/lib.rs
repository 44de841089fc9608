//! duebook-domain
//!
//! Pure domain models (Client, Transaction, Amount).
//! No I/O, no CLI, no storage. Only data types and core enums.

pub mod client;
pub mod common;
pub mod error;
pub mod transaction;

pub use client::*;
pub use common::*;
pub use error::DomainError;
pub use transaction::*;
