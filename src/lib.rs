//! `mmkernel` is the proof checking core of a [Metamath](http://us.metamath.org/mm.html)
//! verifier. It replays proofs against a library of assertions, and converts proofs between the
//! uncompressed and the compressed format.
//!
//! # Main data structures
//!
//! ## Libraries
//! A [`Library`] maps labels to hypotheses and assertions. Symbols and labels are interned as
//! integers, with `0` reserved for "not found". [`LibraryImpl`] is an in-memory library that can
//! be filled by hand.
//!
//! ## Assertions
//! An [`Assertion`] is an axiom or a theorem. Its thesis is a sentence, its mandatory
//! hypotheses are split in floating ones (which give variables a type) and essential ones.
//! Additionally it carries distinct variable restrictions ([`DVR`]s) and, for theorems, a
//! [`Proof`].
//!
//! ## The proof engine
//! The [`Engine`] is a stack machine. Pushing the label of a hypothesis pushes its sentence,
//! pushing the label of an assertion pops the mandatory hypotheses, unifies them with the popped
//! sentences and pushes the substituted thesis. Distinct variable restrictions are propagated and
//! checked along the way. Sentences are abstracted by [`ProofSentence`], so the engine can work on
//! other representations than plain symbol strings.
//!
//! ## Proofs
//! A [`Proof`] is either a plain label sequence ([`UncompressedProof`]) or a list of referenced
//! labels with a sequence of numerals ([`CompressedProof`]), which can save intermediate steps and
//! refer back to them. [`ProofExecutor`] replays a proof, [`ProofOperator`] compresses and
//! decompresses it.

#[cfg(feature = "serialization")]
extern crate nom;
#[cfg(test)]
#[macro_use]
extern crate quickcheck;

pub mod codec;
mod compression;
mod dvr;
mod engine;
pub mod error;
mod library;
mod proof;
mod sentence;
#[cfg(feature = "serialization")]
pub mod serialization;
mod substitution;
mod tree;
mod types;
mod verify;

#[cfg(test)]
mod fixtures;

pub use compression::MAX_DECOMPRESSED_LABELS;
pub use dvr::*;
pub use engine::Engine;
pub use library::{Assertion, Library, LibraryError, LibraryImpl, SentenceType};
pub use proof::*;
pub use sentence::ProofSentence;
pub use substitution::SubstMap;
pub use tree::*;
pub use types::*;
pub use verify::*;
