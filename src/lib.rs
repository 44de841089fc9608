#![doc(test(attr(deny(warnings))))]

//! duebook keeps a book of clients, the debts they take on and the payments
//! they make, and answers who owes what, what is overdue and how activity
//! trends over time.

pub mod cli;
pub mod core;
pub mod errors;
pub mod export;
pub mod utils;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("duebook tracing initialized.");
    });
}
