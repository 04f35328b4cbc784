use log::debug;

use crate::{
    compression,
    engine::Engine,
    error::{ProofError, ProofErrorKind},
    library::{Assertion, Library},
    sentence::ProofSentence,
    types::*,
};

/// A proof as an explicit sequence of labels, replayed one after another.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UncompressedProof {
    labels: Vec<LabTok>,
}

impl UncompressedProof {
    pub fn new(labels: Vec<LabTok>) -> Self {
        UncompressedProof { labels }
    }

    pub fn labels(&self) -> &[LabTok] {
        &self.labels
    }
}

/// A proof as a list of referenced labels and a sequence of codes.
///
/// For an assertion with `H` mandatory hypotheses and `R = refs.len()`, the code `c` means
/// * `0`: save the frame on top of the stack
/// * `1..=H`: the `c`-th mandatory hypothesis
/// * `H+1..=H+R`: the label `refs[c - H - 1]`
/// * `c > H+R`: the saved frame `c - H - R - 1`
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CompressedProof {
    refs: Vec<LabTok>,
    codes: Vec<CodeTok>,
}

impl CompressedProof {
    pub fn new(refs: Vec<LabTok>, codes: Vec<CodeTok>) -> Self {
        CompressedProof { refs, codes }
    }

    pub fn refs(&self) -> &[LabTok] {
        &self.refs
    }

    pub fn codes(&self) -> &[CodeTok] {
        &self.codes
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Proof {
    Uncompressed(UncompressedProof),
    Compressed(CompressedProof),
}

impl From<UncompressedProof> for Proof {
    fn from(proof: UncompressedProof) -> Self {
        Proof::Uncompressed(proof)
    }
}

impl From<CompressedProof> for Proof {
    fn from(proof: CompressedProof) -> Self {
        Proof::Compressed(proof)
    }
}

impl Proof {
    pub fn executor<'a, L: Library + ?Sized>(
        &'a self,
        lib: &'a L,
        ass: &'a Assertion,
        gen_proof_tree: bool,
    ) -> ProofExecutor<'a, L> {
        ProofExecutor::new(lib, ass, self, gen_proof_tree)
    }

    pub fn operator<'a, L: Library + ?Sized>(
        &'a self,
        lib: &'a L,
        ass: &'a Assertion,
    ) -> ProofOperator<'a, L> {
        as_operator(self, lib, ass)
    }
}

/// How backreferences are used when compressing a proof.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompressionStrategy {
    /// Whatever is considered best, currently the same as
    /// [`CompressionStrategy::BackrefsOnIdenticalSentence`]. An already compressed proof is kept as
    /// is.
    #[default]
    Any,
    /// Every label is referenced directly, nothing is saved.
    NoBackrefs,
    /// Reuse subproofs that are identical as trees. Not supported.
    BackrefsOnIdenticalTree,
    /// Reuse the first proof of every formula that is proven more than once.
    BackrefsOnIdenticalSentence,
}

/// Replays `proof` of `ass` into `engine`, without checking the result.
///
/// # Errors
/// * CompressedCodeOutOfRange - if a code of a compressed proof refers to a step that was not
/// saved yet
/// * any error of [`Engine::process_label`]
pub fn execute<L, S>(
    proof: &Proof,
    ass: &Assertion,
    engine: &mut Engine<L, S>,
) -> Result<(), ProofError<S, S::Var>>
where
    L: Library + ?Sized,
    S: ProofSentence<L>,
{
    match proof {
        Proof::Uncompressed(proof) => {
            for &label in proof.labels() {
                engine.process_label(label)?;
            }
        }
        Proof::Compressed(proof) => {
            let hyps_num = ass.mand_hyps_num();
            let refs_num = proof.refs().len();
            for &code in proof.codes() {
                let code = code as usize;
                if code == 0 {
                    engine.save_step()?;
                } else if code <= hyps_num {
                    let label = ass
                        .mand_hyp(code - 1)
                        .ok_or(ProofErrorKind::CompressedCodeOutOfRange)?;
                    engine.process_label(label)?;
                } else if code <= hyps_num + refs_num {
                    engine.process_label(proof.refs()[code - hyps_num - 1])?;
                } else {
                    engine.process_saved_step(code - hyps_num - refs_num - 1)?;
                }
            }
        }
    }
    Ok(())
}

pub fn as_operator<'a, L: Library + ?Sized>(
    proof: &'a Proof,
    lib: &'a L,
    ass: &'a Assertion,
) -> ProofOperator<'a, L> {
    ProofOperator::new(lib, ass, proof)
}

/// Replays a proof in its own [`Engine`] and checks that it proves its assertion.
pub struct ProofExecutor<'a, L: Library + ?Sized, S: ProofSentence<L> = Sentence> {
    ass: &'a Assertion,
    proof: &'a Proof,
    engine: Engine<'a, L, S>,
    relax_checks: bool,
}

impl<'a, L: Library + ?Sized, S: ProofSentence<L>> ProofExecutor<'a, L, S> {
    pub fn new(lib: &'a L, ass: &'a Assertion, proof: &'a Proof, gen_proof_tree: bool) -> Self {
        ProofExecutor {
            ass,
            proof,
            engine: Engine::new(lib, gen_proof_tree),
            relax_checks: false,
        }
    }

    /// If set, [`ProofExecutor::execute`] does not check the final state of the stack.
    pub fn set_relax_checks(&mut self, relax_checks: bool) {
        self.relax_checks = relax_checks;
    }

    /// Replays the proof.
    ///
    /// # Errors
    /// * any error of [`execute`]
    /// * any error of [`Engine::final_checks`], unless checks are relaxed
    pub fn execute(&mut self) -> Result<(), ProofError<S, S::Var>> {
        execute(self.proof, self.ass, &mut self.engine)?;
        if !self.relax_checks {
            self.engine.final_checks(self.ass)?;
        }
        Ok(())
    }

    pub fn engine(&self) -> &Engine<'a, L, S> {
        &self.engine
    }

    pub fn into_engine(self) -> Engine<'a, L, S> {
        self.engine
    }
}

/// Transformations and static checks of a proof.
pub struct ProofOperator<'a, L: Library + ?Sized> {
    lib: &'a L,
    ass: &'a Assertion,
    proof: &'a Proof,
}

impl<'a, L: Library + ?Sized> ProofOperator<'a, L> {
    pub fn new(lib: &'a L, ass: &'a Assertion, proof: &'a Proof) -> Self {
        ProofOperator { lib, ass, proof }
    }

    /// Compresses the proof.
    ///
    /// # Errors
    /// * UnsupportedStrategy - for [`CompressionStrategy::BackrefsOnIdenticalTree`]
    /// * ProofStackNotSingleton - if the proof does not leave exactly one frame on the stack
    /// * any error of replaying or decompressing the proof
    pub fn compress(&self, strategy: CompressionStrategy) -> Result<CompressedProof, ProofError> {
        debug!("compressing proof of {} with {:?}", self.ass.thesis(), strategy);
        match (self.proof, strategy) {
            (_, CompressionStrategy::BackrefsOnIdenticalTree) => {
                Err(ProofErrorKind::UnsupportedStrategy.into())
            }
            (Proof::Compressed(proof), CompressionStrategy::Any) => Ok(proof.clone()),
            (Proof::Uncompressed(proof), CompressionStrategy::NoBackrefs) => {
                Ok(compression::compress_no_backrefs(self.ass, proof.labels()))
            }
            (Proof::Compressed(_), CompressionStrategy::NoBackrefs) => {
                let proof = self.decompress()?;
                Ok(compression::compress_no_backrefs(self.ass, proof.labels()))
            }
            (_, CompressionStrategy::Any | CompressionStrategy::BackrefsOnIdenticalSentence) => {
                let mut executor: ProofExecutor<L> =
                    ProofExecutor::new(self.lib, self.ass, self.proof, true);
                executor.set_relax_checks(true);
                executor.execute()?;
                let engine = executor.engine();
                if engine.stack().len() != 1 {
                    return Err(ProofError::new(ProofErrorKind::ProofStackNotSingleton)
                        .with_label(self.ass.thesis()));
                }
                match engine.proof_tree().and_then(|tree| Some((tree, tree.root()?))) {
                    Some((tree, root)) => Ok(compression::compress_identical_sentences(
                        self.ass, tree, root,
                    )),
                    None => Err(ProofErrorKind::ProofStackNotSingleton.into()),
                }
            }
        }
    }

    /// Expands the proof into a list of labels.
    ///
    /// # Errors
    /// * DecompressionTooLarge - if the result would have more than
    /// [`MAX_DECOMPRESSED_LABELS`][compression::MAX_DECOMPRESSED_LABELS] labels
    /// * StackUnderflow, CompressedCodeOutOfRange, ProofStackNotSingleton - if the codes do not
    /// form a single proof
    pub fn decompress(&self) -> Result<UncompressedProof, ProofError> {
        match self.proof {
            Proof::Uncompressed(proof) => Ok(proof.clone()),
            Proof::Compressed(proof) => {
                compression::decompress(self.lib, self.ass, proof).map_err(|kind| {
                    ProofError::new(kind).with_label(self.ass.thesis())
                })
            }
        }
    }

    /// Checks without replaying that every label is allowed in a proof of the assertion and that
    /// every code refers to something.
    pub fn check_syntax(&self) -> bool {
        let allowed_ref = |label: LabTok| {
            self.lib.get_assertion(label).is_some() || self.ass.opt_hyps().contains(&label)
        };
        match self.proof {
            Proof::Uncompressed(proof) => proof.labels().iter().all(|&label| {
                allowed_ref(label)
                    || self.ass.float_hyps().contains(&label)
                    || self.ass.ess_hyps().contains(&label)
            }),
            Proof::Compressed(proof) => {
                if !proof.refs().iter().all(|&label| allowed_ref(label)) {
                    return false;
                }
                let mut limit = self.ass.mand_hyps_num() + proof.refs().len();
                for &code in proof.codes() {
                    if code == 0 {
                        limit += 1;
                    } else if code as usize > limit {
                        return false;
                    }
                }
                true
            }
        }
    }

    /// Whether the proof only cites a single essential step, apart from floating hypotheses.
    pub fn is_trivial(&self) -> bool {
        match self.proof {
            Proof::Uncompressed(proof) => {
                proof
                    .labels()
                    .iter()
                    .filter(|label| !self.ass.float_hyps().contains(label))
                    .count()
                    == 1
            }
            Proof::Compressed(proof) => {
                let floats = self.ass.float_hyps().len();
                !proof.codes().contains(&0)
                    && proof
                        .codes()
                        .iter()
                        .filter(|&&code| code as usize > floats)
                        .count()
                        == 1
            }
        }
    }
}
