use std::collections::BTreeSet;

use crate::{error::ProofErrorKind, library::Library, sentence::ProofSentence, types::*};

/// A distinct variable restriction: the two variables may never be substituted with formulas that
/// share a variable.
///
/// The pair is stored ordered, so `DVR::new(a, b) == DVR::new(b, a)`.
#[derive(PartialEq, Eq, Clone, Copy, PartialOrd, Ord, Hash, Debug)]
pub struct DVR<V = SymTok>(V, V);

/// A set of [`DVR`]s, as accumulated on the stack of an [`Engine`][crate::Engine].
pub type DVRSet<V = SymTok> = BTreeSet<DVR<V>>;

impl<V: Ord + Copy> DVR<V> {
    /// Creates a new restriction between `a` and `b`.
    ///
    /// # Errors
    /// * DistinctViolation - if `a == b`
    ///
    /// # Example
    /// ```
    /// use mmkernel::{error::ProofErrorKind, DVR};
    ///
    /// assert_eq!(DVR::new(3, 1), DVR::new(1, 3));
    /// assert_eq!(DVR::new(2, 2), Err(ProofErrorKind::DistinctViolation));
    /// ```
    pub fn new(a: V, b: V) -> Result<Self, ProofErrorKind> {
        if a < b {
            Ok(DVR(a, b))
        } else if a > b {
            Ok(DVR(b, a))
        } else {
            Err(ProofErrorKind::DistinctViolation)
        }
    }

    pub fn first(&self) -> V {
        self.0
    }

    pub fn second(&self) -> V {
        self.1
    }

    /// The restrictions implied when the two restricted variables are replaced by `sub_a` and
    /// `sub_b`: every variable of `sub_a` has to be distinct from every variable of `sub_b`.
    pub fn substitute<'a, L, S>(
        lib: &'a L,
        sub_a: &'a S,
        sub_b: &'a S,
    ) -> impl Iterator<Item = Result<Self, ProofErrorKind>> + 'a
    where
        L: Library + ?Sized,
        S: ProofSentence<L, Var = V>,
        V: 'a,
    {
        sub_a
            .variables(lib)
            .flat_map(move |new_a| sub_b.variables(lib).map(move |new_b| Self::new(new_a, new_b)))
    }
}
