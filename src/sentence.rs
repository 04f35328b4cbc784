use std::fmt::Debug;

use crate::{error::ProofErrorKind, library::Library, substitution::SubstMap, types::*};

/// The operations the [`Engine`][crate::Engine] needs from a formula representation.
///
/// The engine only ever talks to formulas through this trait, so the same replay logic works for
/// every representation that implements it. The crate implements it for plain token sequences
/// ([`Sentence`]).
pub trait ProofSentence<L: Library + ?Sized>: Clone + Ord + Debug + Sized {
    /// What a floating hypothesis binds.
    type Var: Copy + Ord + Debug;

    /// The variable bound by the floating hypothesis `label`.
    fn floating_to_var(lib: &L, label: LabTok) -> Option<Self::Var>;

    /// The type code declared by the floating hypothesis `label`.
    fn floating_to_type(lib: &L, label: LabTok) -> Option<SymTok>;

    /// The symbol that distinct variable constraints use to name `var`.
    fn var_to_symbol(lib: &L, var: Self::Var) -> SymTok;

    /// The formula of `label`: the hypothesis itself or the thesis of an assertion.
    fn get_sentence(lib: &L, label: LabTok) -> Option<&Self>;

    /// The leading type code.
    fn sentence_to_type(&self) -> SymTok;

    /// Checks that `template`, with `subst` applied, is exactly `self`.
    ///
    /// # Errors
    /// * EssentialWrongConstant - if a constant of `template` differs from the token of `self` it
    /// is aligned with
    /// * EssentialStackTooShort - if `self` ends before `template` is exhausted
    /// * EssentialWrongSubstitution - if a substituted variable does not match `self` or is not
    /// bound by `subst`
    /// * EssentialStackTooLong - if `self` has tokens left after `template` is exhausted
    fn check_match(
        &self,
        lib: &L,
        template: &Self,
        subst: &SubstMap<Self::Var, Self>,
    ) -> Result<(), ProofErrorKind>;

    /// Applies `subst` to `self`. Variables without a binding are kept.
    fn substitute(&self, lib: &L, subst: &SubstMap<Self::Var, Self>) -> Self;

    /// Iterates over the variable occurrences of `self`, in order and with repetitions.
    fn variables<'s>(&'s self, lib: &'s L) -> impl Iterator<Item = Self::Var> + 's;
}

/// The part of a bound formula that replaces a variable: everything but the type code.
fn fragment(sentence: &Sentence) -> &[SymTok] {
    sentence.get(1..).unwrap_or_default()
}

impl<L: Library + ?Sized> ProofSentence<L> for Sentence {
    type Var = SymTok;

    fn floating_to_var(lib: &L, label: LabTok) -> Option<SymTok> {
        lib.get_sentence(label)?.get(1).copied()
    }

    fn floating_to_type(lib: &L, label: LabTok) -> Option<SymTok> {
        lib.get_sentence(label)?.first().copied()
    }

    fn var_to_symbol(_lib: &L, var: SymTok) -> SymTok {
        var
    }

    fn get_sentence(lib: &L, label: LabTok) -> Option<&Sentence> {
        lib.get_sentence(label)
    }

    fn sentence_to_type(&self) -> SymTok {
        self.first().copied().unwrap_or(0)
    }

    fn check_match(
        &self,
        lib: &L,
        template: &Sentence,
        subst: &SubstMap<SymTok, Sentence>,
    ) -> Result<(), ProofErrorKind> {
        let mut rest: &[SymTok] = self;
        for &tok in template {
            if lib.is_constant(tok) {
                match rest.split_first() {
                    Some((&head, tail)) if head == tok => rest = tail,
                    Some(_) => return Err(ProofErrorKind::EssentialWrongConstant),
                    None => return Err(ProofErrorKind::EssentialStackTooShort),
                }
            } else {
                let fragment = match subst.get(tok) {
                    Some(sentence) => fragment(sentence),
                    None => return Err(ProofErrorKind::EssentialWrongSubstitution),
                };
                if fragment.len() > rest.len() {
                    return Err(ProofErrorKind::EssentialStackTooShort);
                }
                let (head, tail) = rest.split_at(fragment.len());
                if head != fragment {
                    return Err(ProofErrorKind::EssentialWrongSubstitution);
                }
                rest = tail;
            }
        }
        if rest.is_empty() {
            Ok(())
        } else {
            Err(ProofErrorKind::EssentialStackTooLong)
        }
    }

    fn substitute(&self, _lib: &L, subst: &SubstMap<SymTok, Sentence>) -> Sentence {
        let mut res = Vec::with_capacity(self.len());
        for &tok in self {
            match subst.get(tok) {
                Some(sentence) => res.extend_from_slice(fragment(sentence)),
                None => res.push(tok),
            }
        }
        res
    }

    fn variables<'s>(&'s self, lib: &'s L) -> impl Iterator<Item = SymTok> + 's {
        self.iter().copied().filter(move |&tok| !lib.is_constant(tok))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::demo0;

    fn sent(lib: &crate::LibraryImpl, text: &str) -> Sentence {
        lib.sentence(text).unwrap()
    }

    #[test]
    fn floating_parts() {
        let lib = demo0();
        let tt = lib.get_label("tt").unwrap();
        let t = lib.get_symbol("t").unwrap();
        let term = lib.get_symbol("term").unwrap();
        assert_eq!(<Sentence as ProofSentence<_>>::floating_to_var(&lib, tt), Some(t));
        assert_eq!(<Sentence as ProofSentence<_>>::floating_to_type(&lib, tt), Some(term));
    }

    #[test]
    fn substitute_and_match() {
        let lib = demo0();
        let t = lib.get_symbol("t").unwrap();
        let r = lib.get_symbol("r").unwrap();
        let mut subst = SubstMap::with_capacity(2);
        subst.insert(t, sent(&lib, "term ( t + 0 )"));
        subst.insert(r, sent(&lib, "term t"));

        let template = sent(&lib, "wff t = r");
        let result = template.substitute(&lib, &subst);
        assert_eq!(result, sent(&lib, "wff ( t + 0 ) = t"));
        assert_eq!(result.check_match(&lib, &template, &subst), Ok(()));
    }

    #[test]
    fn match_errors() {
        let lib = demo0();
        let t = lib.get_symbol("t").unwrap();
        let mut subst = SubstMap::with_capacity(1);
        subst.insert(t, sent(&lib, "term 0"));
        let template = sent(&lib, "|- ( t + 0 ) = t");

        let check = |stack: &str| sent(&lib, stack).check_match(&lib, &template, &subst);
        assert_eq!(check("|- ( 0 + 0 ) = 0"), Ok(()));
        assert_eq!(
            check("|- ( 0 + 0 ) = t"),
            Err(ProofErrorKind::EssentialWrongSubstitution)
        );
        assert_eq!(
            check("|- ( 0 + 0 ) -> 0"),
            Err(ProofErrorKind::EssentialWrongConstant)
        );
        assert_eq!(
            check("|- ( 0 + 0 )"),
            Err(ProofErrorKind::EssentialStackTooShort)
        );
        assert_eq!(
            check("|- ( 0 + 0 ) = 0 0"),
            Err(ProofErrorKind::EssentialStackTooLong)
        );
    }

    #[test]
    fn variables_skip_constants() {
        let lib = demo0();
        let s = sent(&lib, "wff ( t + r ) = t");
        let vars: Vec<_> = s.variables(&lib).collect();
        let t = lib.get_symbol("t").unwrap();
        let r = lib.get_symbol("r").unwrap();
        assert_eq!(vars, vec![t, r, t]);
    }
}
