//! Response models for the command-line tool
//!
//! Every command prints exactly one of these as a JSON document on stdout.

pub mod responses;

// Re-export commonly used types
pub use responses::{GetResponse, KeysResponse, PurgeResponse, WriteResponse, WriteStatus};
