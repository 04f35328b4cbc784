use std::fmt::{self, Debug, Display};

use thiserror::Error;

use crate::types::*;

/// The reason a proof was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum ProofErrorKind {
    #[error("not enough frames on the stack")]
    StackUnderflow,
    #[error("type code of floating hypothesis does not match the stack")]
    FloatingTypeMismatch,
    #[error("constant of essential hypothesis does not match the stack")]
    EssentialWrongConstant,
    #[error("stack formula is shorter than the essential hypothesis")]
    EssentialStackTooShort,
    #[error("substitution does not match the stack formula")]
    EssentialWrongSubstitution,
    #[error("stack formula is longer than the essential hypothesis")]
    EssentialStackTooLong,
    #[error("distinct variable constraint is violated")]
    DistinctViolation,
    #[error("proof needs distinct variable constraints that are not declared")]
    DistinctTooWide,
    #[error("proof does not end with exactly one formula on the stack")]
    ProofStackNotSingleton,
    #[error("proven formula does not match the thesis")]
    ThesisMismatch,
    #[error("compressed code is out of range")]
    CompressedCodeOutOfRange,
    #[error("decompressed proof is too large")]
    DecompressionTooLarge,
    #[error("invalid character in compressed proof")]
    InvalidCompressedCharacter,
    #[error("compressed proof ends in the middle of a code")]
    UnterminatedCompressedCode,
    #[error("label is neither an assertion nor a hypothesis")]
    UnknownLabel,
    #[error("compression strategy is not supported")]
    UnsupportedStrategy,
}

/// An error which is produced when trying to verify something incorrect.
///
/// Besides the [`ProofErrorKind`] it carries whatever context was available at the point of
/// failure: the label being processed, the formula found on the stack, the formula it was matched
/// against and the substitution built so far.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProofError<S = Sentence, V = SymTok> {
    pub kind: ProofErrorKind,
    pub label: LabTok,
    pub on_stack: Option<S>,
    pub template: Option<S>,
    pub subst: Vec<(V, S)>,
}

impl<S, V> ProofError<S, V> {
    pub fn new(kind: ProofErrorKind) -> Self {
        ProofError {
            kind,
            label: 0,
            on_stack: None,
            template: None,
            subst: Vec::new(),
        }
    }

    pub fn with_label(mut self, label: LabTok) -> Self {
        self.label = label;
        self
    }
}

impl<S, V> From<ProofErrorKind> for ProofError<S, V> {
    fn from(kind: ProofErrorKind) -> Self {
        Self::new(kind)
    }
}

impl<S: Debug, V: Debug> Display for ProofError<S, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (label {})", self.kind, self.label)?;
        if let Some(on_stack) = &self.on_stack {
            write!(f, ", on stack: {:?}", on_stack)?;
        }
        if let Some(template) = &self.template {
            write!(f, ", template: {:?}", template)?;
        }
        if !self.subst.is_empty() {
            write!(f, ", substitution: {:?}", self.subst)?;
        }
        Ok(())
    }
}

impl<S: Debug, V: Debug> std::error::Error for ProofError<S, V> {}
