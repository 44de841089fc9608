pub mod book_manager;

pub use book_manager::{BookManager, SyncStatus};
