use std::fmt::{self, Display};

use nom::{
    error::{ContextError, ErrorKind, ParseError},
    InputLength,
};
use thiserror::Error;

use crate::{error::ProofErrorKind, types::*};

/// Error produced when reading or writing the text form of a proof.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SerializationError {
    #[error("malformed proof: {0}")]
    Syntax(String),
    #[error("label `{0}` is not defined")]
    UnknownLabel(String),
    #[error("label {0} has no name")]
    UnnamedLabel(LabTok),
    #[error(transparent)]
    Code(#[from] ProofErrorKind),
}

/// Where the proof grammar gave up.
///
/// When every alternative fails, the one that read furthest into the input is reported, together
/// with the grammar rules it was inside of.
#[derive(Debug)]
pub struct ProofSyntaxError<I> {
    input: I,
    kind: ErrorKind,
    contexts: Vec<&'static str>,
}

impl<I: InputLength> ParseError<I> for ProofSyntaxError<I> {
    fn from_error_kind(input: I, kind: ErrorKind) -> Self {
        ProofSyntaxError {
            input,
            kind,
            contexts: Vec::new(),
        }
    }

    fn append(_input: I, _kind: ErrorKind, other: Self) -> Self {
        other
    }

    fn or(self, other: Self) -> Self {
        if self.input.input_len() <= other.input.input_len() {
            self
        } else {
            other
        }
    }
}

impl<I> ContextError<I> for ProofSyntaxError<I> {
    fn add_context(_input: I, ctx: &'static str, mut other: Self) -> Self {
        other.contexts.push(ctx);
        other
    }
}

impl Display for ProofSyntaxError<&str> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let snippet: String = self.input.chars().take(20).collect();
        write!(f, "{:?} at {:?}", self.kind, snippet)?;
        for ctx in &self.contexts {
            write!(f, " in {}", ctx)?;
        }
        Ok(())
    }
}
