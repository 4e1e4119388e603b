//! Core definitions shared by all podcont-* crates: the error type, the `Result`
//! alias and argument/data verification helpers.

pub mod error;
pub mod result;

pub use error::{Error, ErrorKind};
pub use result::Result;
