//! Parsers for uploaded generation data.
//!
//! Uploads arrive either as CSV text or as a JSON array of flat records (the
//! shape the frontend keeps for previews). Both are normalised into a
//! [`RawTable`] of strings; typing happens in the schema validator.
//!
//! - [`csv_parser`]: CSV text and files, plus dataset export back to CSV
//! - [`json_parser`]: JSON record arrays

pub mod csv_parser;
pub mod json_parser;
mod table;


pub use csv_parser::{dataset_to_csv, parse_csv_file, parse_csv_str};
pub use json_parser::{parse_records_json_str, parse_records_value};
pub use table::RawTable;
