//! Files and links handed to the outside world: CSV/JSON history exports and
//! messaging links for reminders.

pub mod history;
pub mod links;

pub use history::{
    export_file_name, write_transactions_csv, write_transactions_json, ExportFormat,
};
pub use links::reminder_link;
