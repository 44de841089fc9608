//! duebook-core
//!
//! Ledger computations and services for duebook.
//! Depends on duebook-domain. No CLI, no terminal I/O, no direct filesystem access.

pub mod client_service;
pub mod directory_service;
pub mod error;
pub mod format;
pub mod ledger_model;
pub mod statement_service;
pub mod storage;
pub mod summary_service;
pub mod time;

pub use client_service::*;
pub use directory_service::*;
pub use error::{CoreError, CoreResult};
pub use ledger_model::*;
pub use statement_service::*;
pub use storage::{client_warnings, ClientBackupInfo, ClientStore, MemoryClientStore};
pub use summary_service::*;
pub use time::{Clock, FixedClock, SystemClock};
