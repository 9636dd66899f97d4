// Import/export of ledger data. Only spreadsheet-style export exists today.

pub mod export;

pub use export::*;
