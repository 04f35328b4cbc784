//! The text form of proofs used by database files: either a sequence of labels, or
//! `( refs ) CODES` for a compressed proof, or `?` for a missing proof.

pub mod error;
mod proof;

pub use error::SerializationError;
pub use proof::*;
