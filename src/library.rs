use std::collections::{BTreeSet, HashMap};

use thiserror::Error;

use crate::{
    dvr::{DVRSet, DVR},
    proof::{Proof, ProofExecutor, ProofOperator},
    types::*,
};

/// The read-only view of a database that proof verification needs.
///
/// Implementations own the interning of symbols and labels; the kernel only ever sees the integer
/// handles.
pub trait Library {
    fn is_constant(&self, sym: SymTok) -> bool;

    /// The formula of `label`: the hypothesis itself, or the thesis of an assertion.
    fn get_sentence(&self, label: LabTok) -> Option<&Sentence>;

    /// The assertion named `label`, or `None` if `label` is a hypothesis (or unknown).
    fn get_assertion(&self, label: LabTok) -> Option<&Assertion>;

    fn get_label(&self, name: &str) -> Option<LabTok>;

    fn resolve_label(&self, label: LabTok) -> Option<&str>;

    /// The labels of all assertions, in the order of their numbers.
    fn assertion_labels(&self) -> &[LabTok];
}

/// The declared contract of an axiom or theorem.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Assertion {
    theorem: bool,
    thesis: LabTok,
    number: LabTok,
    float_hyps: Vec<LabTok>,
    ess_hyps: Vec<LabTok>,
    opt_hyps: BTreeSet<LabTok>,
    mand_dists: DVRSet,
    opt_dists: DVRSet,
    proof: Option<Proof>,
}

impl Assertion {
    /// Creates an assertion whose thesis is the formula of `thesis`. Floating hypotheses have to
    /// be given in the order in which they bind variables, essential hypotheses in the order they
    /// are expected on the stack.
    pub fn new(theorem: bool, thesis: LabTok, float_hyps: Vec<LabTok>, ess_hyps: Vec<LabTok>) -> Self {
        Assertion {
            theorem,
            thesis,
            float_hyps,
            ess_hyps,
            ..Default::default()
        }
    }

    pub fn with_dists(mut self, mand_dists: impl IntoIterator<Item = DVR>) -> Self {
        self.mand_dists = mand_dists.into_iter().collect();
        self
    }

    /// Adds the hypotheses and restrictions on variables that occur in the proof but neither in
    /// the thesis nor in the essential hypotheses.
    pub fn with_optional(
        mut self,
        opt_hyps: impl IntoIterator<Item = LabTok>,
        opt_dists: impl IntoIterator<Item = DVR>,
    ) -> Self {
        self.opt_hyps = opt_hyps.into_iter().collect();
        self.opt_dists = opt_dists.into_iter().collect();
        self
    }

    pub fn with_number(mut self, number: LabTok) -> Self {
        self.number = number;
        self
    }

    pub fn with_proof(mut self, proof: Proof) -> Self {
        self.proof = Some(proof);
        self
    }

    pub fn is_theorem(&self) -> bool {
        self.theorem
    }

    pub fn thesis(&self) -> LabTok {
        self.thesis
    }

    /// The position of this assertion in the database.
    pub fn number(&self) -> LabTok {
        self.number
    }

    pub fn float_hyps(&self) -> &[LabTok] {
        &self.float_hyps
    }

    pub fn ess_hyps(&self) -> &[LabTok] {
        &self.ess_hyps
    }

    pub fn opt_hyps(&self) -> &BTreeSet<LabTok> {
        &self.opt_hyps
    }

    pub fn mand_dists(&self) -> &DVRSet {
        &self.mand_dists
    }

    pub fn opt_dists(&self) -> &DVRSet {
        &self.opt_dists
    }

    /// All declared restrictions, mandatory and optional.
    pub fn get_dists(&self) -> DVRSet {
        self.mand_dists.union(&self.opt_dists).copied().collect()
    }

    /// Whether a restriction between `a` and `b` is declared.
    pub fn constrains(&self, a: SymTok, b: SymTok) -> bool {
        DVR::new(a, b).map_or(false, |dvr| {
            self.mand_dists.contains(&dvr) || self.opt_dists.contains(&dvr)
        })
    }

    pub fn mand_hyps_num(&self) -> usize {
        self.float_hyps.len() + self.ess_hyps.len()
    }

    /// The `index`-th mandatory hypothesis, counting floating hypotheses first.
    ///
    /// # Example
    /// ```
    /// use mmkernel::Assertion;
    ///
    /// let ass = Assertion::new(true, 10, vec![1, 2], vec![3]);
    /// assert_eq!(ass.mand_hyp(0), Some(1));
    /// assert_eq!(ass.mand_hyp(2), Some(3));
    /// assert_eq!(ass.mand_hyp(3), None);
    /// ```
    pub fn mand_hyp(&self, index: usize) -> Option<LabTok> {
        self.float_hyps
            .iter()
            .chain(self.ess_hyps.iter())
            .nth(index)
            .copied()
    }

    pub fn proof(&self) -> Option<&Proof> {
        self.proof.as_ref()
    }

    /// Replaces the attached proof, returning the previous one.
    pub fn set_proof(&mut self, proof: Option<Proof>) -> Option<Proof> {
        std::mem::replace(&mut self.proof, proof)
    }

    pub fn proof_executor<'a, L: Library + ?Sized>(
        &'a self,
        lib: &'a L,
        gen_proof_tree: bool,
    ) -> Option<ProofExecutor<'a, L>> {
        let proof = self.proof.as_ref()?;
        Some(ProofExecutor::new(lib, self, proof, gen_proof_tree))
    }

    pub fn proof_operator<'a, L: Library + ?Sized>(
        &'a self,
        lib: &'a L,
    ) -> Option<ProofOperator<'a, L>> {
        let proof = self.proof.as_ref()?;
        Some(ProofOperator::new(lib, self, proof))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SentenceType {
    Floating,
    Essential,
    Axiom,
    Theorem,
}

/// Error produced while building a [`LibraryImpl`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LibraryError {
    #[error("name `{0}` is already in use")]
    NameCollision(String),
    #[error("symbol `{0}` is not declared")]
    UnknownSymbol(String),
    #[error("label `{0}` is not declared")]
    UnknownLabel(String),
    #[error("formula `{0}` does not start with a constant")]
    MissingTypeCode(String),
    #[error("`{0}` is not of the form `type variable`")]
    MalformedFloating(String),
    #[error("`{0}` and `{1}` cannot be distinct")]
    MalformedDistinct(String, String),
    #[error("label `{0}` is not a hypothesis")]
    NotAHypothesis(String),
    #[error("label `{0}` is not an assertion")]
    NotAnAssertion(String),
}

#[derive(Debug, Clone)]
struct Interner {
    ids: HashMap<String, u32>,
    names: Vec<String>,
}

impl Interner {
    fn new() -> Self {
        Interner {
            ids: HashMap::new(),
            names: vec![String::new()],
        }
    }

    fn create(&mut self, name: &str) -> Result<u32, LibraryError> {
        if self.ids.contains_key(name) {
            return Err(LibraryError::NameCollision(name.to_owned()));
        }
        let id = self.names.len() as u32;
        self.ids.insert(name.to_owned(), id);
        self.names.push(name.to_owned());
        Ok(id)
    }

    fn get(&self, name: &str) -> Option<u32> {
        self.ids.get(name).copied()
    }

    fn resolve(&self, id: u32) -> Option<&str> {
        match id {
            0 => None,
            _ => self.names.get(id as usize).map(String::as_str),
        }
    }
}

/// An in-memory [`Library`], built one declaration at a time.
///
/// Formulas are written as whitespace separated symbols that have to be declared beforehand.
///
/// # Example
/// ```
/// use mmkernel::{Library, LibraryImpl};
///
/// let mut lib = LibraryImpl::new();
/// lib.add_constants("wff |- ( ) ->").unwrap();
/// lib.add_variables("ph ps").unwrap();
/// lib.add_floating("wph", "wff ph").unwrap();
/// lib.add_floating("wps", "wff ps").unwrap();
/// lib.add_essential("min", "|- ph").unwrap();
/// lib.add_essential("maj", "|- ( ph -> ps )").unwrap();
/// let mp = lib
///     .add_axiom("mp", "|- ps", &["wph", "wps", "min", "maj"], &[])
///     .unwrap();
///
/// let ass = lib.get_assertion(mp).unwrap();
/// assert_eq!(ass.mand_hyps_num(), 4);
/// assert_eq!(ass.ess_hyps().len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct LibraryImpl {
    symbols: Interner,
    labels: Interner,
    constants: Vec<bool>,
    sentences: Vec<Option<(Sentence, SentenceType)>>,
    assertions: Vec<Option<Assertion>>,
    assertion_labels: Vec<LabTok>,
}

impl Default for LibraryImpl {
    fn default() -> Self {
        Self::new()
    }
}

impl LibraryImpl {
    pub fn new() -> Self {
        LibraryImpl {
            symbols: Interner::new(),
            labels: Interner::new(),
            constants: vec![false],
            sentences: vec![None],
            assertions: vec![None],
            assertion_labels: Vec::new(),
        }
    }

    fn add_symbols(&mut self, names: &str, constant: bool) -> Result<(), LibraryError> {
        for name in names.split_whitespace() {
            self.symbols.create(name)?;
            self.constants.push(constant);
        }
        Ok(())
    }

    pub fn add_constants(&mut self, names: &str) -> Result<(), LibraryError> {
        self.add_symbols(names, true)
    }

    pub fn add_variables(&mut self, names: &str) -> Result<(), LibraryError> {
        self.add_symbols(names, false)
    }

    pub fn get_symbol(&self, name: &str) -> Option<SymTok> {
        self.symbols.get(name)
    }

    pub fn resolve_symbol(&self, sym: SymTok) -> Option<&str> {
        self.symbols.resolve(sym)
    }

    /// Interns the formula `text`. The first symbol has to be a constant.
    pub fn sentence(&self, text: &str) -> Result<Sentence, LibraryError> {
        let sentence = text
            .split_whitespace()
            .map(|name| {
                self.get_symbol(name)
                    .ok_or_else(|| LibraryError::UnknownSymbol(name.to_owned()))
            })
            .collect::<Result<Sentence, _>>()?;
        match sentence.first() {
            Some(&type_code) if self.is_constant(type_code) => Ok(sentence),
            _ => Err(LibraryError::MissingTypeCode(text.to_owned())),
        }
    }

    /// Resolves whitespace separated label names.
    pub fn labels(&self, text: &str) -> Result<Vec<LabTok>, LibraryError> {
        text.split_whitespace()
            .map(|name| self.label(name))
            .collect()
    }

    fn label(&self, name: &str) -> Result<LabTok, LibraryError> {
        self.labels
            .get(name)
            .ok_or_else(|| LibraryError::UnknownLabel(name.to_owned()))
    }

    fn add_sentence(
        &mut self,
        label: &str,
        sentence: Sentence,
        typ: SentenceType,
    ) -> Result<LabTok, LibraryError> {
        let tok = self.labels.create(label)?;
        self.sentences.push(Some((sentence, typ)));
        self.assertions.push(None);
        Ok(tok)
    }

    pub fn add_floating(&mut self, label: &str, text: &str) -> Result<LabTok, LibraryError> {
        let sentence = self.sentence(text)?;
        match sentence[..] {
            [_, var] if !self.is_constant(var) => {}
            _ => return Err(LibraryError::MalformedFloating(text.to_owned())),
        }
        self.add_sentence(label, sentence, SentenceType::Floating)
    }

    pub fn add_essential(&mut self, label: &str, text: &str) -> Result<LabTok, LibraryError> {
        let sentence = self.sentence(text)?;
        self.add_sentence(label, sentence, SentenceType::Essential)
    }

    fn dists(&self, dists: &[(&str, &str)]) -> Result<Vec<DVR>, LibraryError> {
        dists
            .iter()
            .map(|&(a, b)| {
                let sym = |name: &str| {
                    self.get_symbol(name)
                        .ok_or_else(|| LibraryError::UnknownSymbol(name.to_owned()))
                };
                DVR::new(sym(a)?, sym(b)?)
                    .map_err(|_| LibraryError::MalformedDistinct(a.to_owned(), b.to_owned()))
            })
            .collect()
    }

    fn add_assertion(
        &mut self,
        label: &str,
        text: &str,
        hyps: &[&str],
        dists: &[(&str, &str)],
        proof: Option<Proof>,
        typ: SentenceType,
    ) -> Result<LabTok, LibraryError> {
        let sentence = self.sentence(text)?;
        let mut float_hyps = Vec::new();
        let mut ess_hyps = Vec::new();
        for &hyp in hyps {
            let tok = self.label(hyp)?;
            match self.sentence_type(tok) {
                Some(SentenceType::Floating) => float_hyps.push(tok),
                Some(SentenceType::Essential) => ess_hyps.push(tok),
                _ => return Err(LibraryError::NotAHypothesis(hyp.to_owned())),
            }
        }
        let dists = self.dists(dists)?;
        let tok = self.add_sentence(label, sentence, typ)?;
        let number = self.assertion_labels.len() as LabTok + 1;
        let mut assertion = Assertion::new(typ == SentenceType::Theorem, tok, float_hyps, ess_hyps)
            .with_dists(dists)
            .with_number(number);
        assertion.set_proof(proof);
        self.assertions[tok as usize] = Some(assertion);
        self.assertion_labels.push(tok);
        Ok(tok)
    }

    /// Adds an axiom. `hyps` lists its mandatory hypotheses, floating and essential ones in any
    /// interleaving.
    pub fn add_axiom(
        &mut self,
        label: &str,
        text: &str,
        hyps: &[&str],
        dists: &[(&str, &str)],
    ) -> Result<LabTok, LibraryError> {
        self.add_assertion(label, text, hyps, dists, None, SentenceType::Axiom)
    }

    /// Adds a theorem. A theorem without proof is allowed and stands for an incomplete proof.
    pub fn add_theorem(
        &mut self,
        label: &str,
        text: &str,
        hyps: &[&str],
        dists: &[(&str, &str)],
        proof: Option<Proof>,
    ) -> Result<LabTok, LibraryError> {
        self.add_assertion(label, text, hyps, dists, proof, SentenceType::Theorem)
    }

    fn assertion_mut(&mut self, label: LabTok) -> Result<&mut Assertion, LibraryError> {
        let name = self.labels.resolve(label).unwrap_or_default().to_owned();
        self.assertions
            .get_mut(label as usize)
            .and_then(Option::as_mut)
            .ok_or(LibraryError::NotAnAssertion(name))
    }

    /// Declares the hypotheses and restrictions for dummy variables of the proof of `label`.
    pub fn set_optional(
        &mut self,
        label: LabTok,
        opt_hyps: &[&str],
        opt_dists: &[(&str, &str)],
    ) -> Result<(), LibraryError> {
        let opt_hyps = opt_hyps
            .iter()
            .map(|name| self.label(name))
            .collect::<Result<Vec<_>, _>>()?;
        let opt_dists = self.dists(opt_dists)?;
        let assertion = self.assertion_mut(label)?;
        *assertion = std::mem::take(assertion).with_optional(opt_hyps, opt_dists);
        Ok(())
    }

    /// Replaces the proof of `label`, returning the previous one.
    pub fn set_proof(
        &mut self,
        label: LabTok,
        proof: Option<Proof>,
    ) -> Result<Option<Proof>, LibraryError> {
        Ok(self.assertion_mut(label)?.set_proof(proof))
    }

    pub fn sentence_type(&self, label: LabTok) -> Option<SentenceType> {
        self.sentences
            .get(label as usize)?
            .as_ref()
            .map(|(_, typ)| *typ)
    }

    /// All assertions, in the order they were added.
    pub fn assertions(&self) -> impl Iterator<Item = (LabTok, &Assertion)> + '_ {
        self.assertion_labels()
            .iter()
            .filter_map(|&label| Some((label, self.get_assertion(label)?)))
    }

    pub fn format_sentence(&self, sentence: &Sentence) -> String {
        sentence
            .iter()
            .map(|&sym| self.resolve_symbol(sym).unwrap_or("?"))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl Library for LibraryImpl {
    fn is_constant(&self, sym: SymTok) -> bool {
        self.constants.get(sym as usize).copied().unwrap_or(false)
    }

    fn get_sentence(&self, label: LabTok) -> Option<&Sentence> {
        self.sentences
            .get(label as usize)?
            .as_ref()
            .map(|(sentence, _)| sentence)
    }

    fn get_assertion(&self, label: LabTok) -> Option<&Assertion> {
        self.assertions.get(label as usize)?.as_ref()
    }

    fn get_label(&self, name: &str) -> Option<LabTok> {
        self.labels.get(name)
    }

    fn resolve_label(&self, label: LabTok) -> Option<&str> {
        self.labels.resolve(label)
    }

    fn assertion_labels(&self) -> &[LabTok] {
        &self.assertion_labels
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::demo0;

    #[test]
    fn hypotheses_are_partitioned() {
        let lib = demo0();
        let mp = lib.get_assertion(lib.get_label("mp").unwrap()).unwrap();
        assert_eq!(mp.float_hyps(), &lib.labels("wp wq").unwrap()[..]);
        assert_eq!(mp.ess_hyps(), &lib.labels("min maj").unwrap()[..]);
        assert_eq!(mp.mand_hyp(1), lib.get_label("wq"));
        assert_eq!(mp.mand_hyp(2), lib.get_label("min"));
        assert!(!mp.is_theorem());
    }

    #[test]
    fn hypotheses_are_not_assertions() {
        let lib = demo0();
        let tt = lib.get_label("tt").unwrap();
        assert!(lib.get_assertion(tt).is_none());
        assert_eq!(lib.get_sentence(tt), Some(&lib.sentence("term t").unwrap()));
        assert_eq!(lib.sentence_type(tt), Some(SentenceType::Floating));
    }

    #[test]
    fn sentences_are_formatted_back() {
        let lib = demo0();
        let a1 = lib.get_label("a1").unwrap();
        assert_eq!(
            lib.format_sentence(lib.get_sentence(a1).unwrap()),
            "|- ( t = r -> ( t = s -> r = s ) )"
        );
        assert_eq!(lib.format_sentence(&vec![lib.get_symbol("wff").unwrap(), 999]), "wff ?");
    }

    #[test]
    fn numbers_follow_declaration_order() {
        let lib = demo0();
        let numbers: Vec<_> = lib.assertions().map(|(_, ass)| ass.number()).collect();
        assert_eq!(numbers, (1..=numbers.len() as LabTok).collect::<Vec<_>>());
    }

    #[test]
    fn dists_union() {
        let lib = demo0();
        let t = lib.get_symbol("t").unwrap();
        let r = lib.get_symbol("r").unwrap();
        let s = lib.get_symbol("s").unwrap();
        let ass = Assertion::new(true, 1, vec![], vec![])
            .with_dists([DVR::new(t, r).unwrap()])
            .with_optional(Vec::<LabTok>::new(), [DVR::new(r, s).unwrap()]);
        assert_eq!(ass.get_dists().len(), 2);
        assert!(ass.constrains(r, t));
        assert!(ass.constrains(s, r));
        assert!(!ass.constrains(t, s));
        assert!(!ass.constrains(t, t));
    }

    #[test]
    fn builder_errors() {
        let mut lib = demo0();
        assert_eq!(
            lib.add_constants("term"),
            Err(LibraryError::NameCollision("term".to_owned()))
        );
        assert_eq!(
            lib.sentence("t = t"),
            Err(LibraryError::MissingTypeCode("t = t".to_owned()))
        );
        assert_eq!(
            lib.add_floating("bad", "term 0"),
            Err(LibraryError::MalformedFloating("term 0".to_owned()))
        );
        assert_eq!(
            lib.add_axiom("bad", "|- t = t", &["a2"], &[]),
            Err(LibraryError::NotAHypothesis("a2".to_owned()))
        );
        assert_eq!(
            lib.add_axiom("bad", "|- t = t", &["tt"], &[("t", "t")]),
            Err(LibraryError::MalformedDistinct("t".to_owned(), "t".to_owned()))
        );
    }
}
