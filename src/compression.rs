use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::ops::Range;

use log::debug;

use crate::{
    error::ProofErrorKind,
    library::{Assertion, Library},
    proof::{CompressedProof, UncompressedProof},
    tree::{NodeId, ProofTree, TreeVisitor},
    types::*,
};

/// Decompression fails instead of producing a proof with more labels than this.
pub const MAX_DECOMPRESSED_LABELS: usize = 1024 * 1024;

/// Codes `1..=H` for the mandatory hypotheses of `ass`.
fn hypothesis_codes(ass: &Assertion) -> HashMap<LabTok, CodeTok> {
    ass.float_hyps()
        .iter()
        .chain(ass.ess_hyps())
        .enumerate()
        .map(|(i, &label)| (label, i as CodeTok + 1))
        .collect()
}

/// Expands `proof` by only keeping track of where the subproof of every stack frame starts.
pub fn decompress<L: Library + ?Sized>(
    lib: &L,
    ass: &Assertion,
    proof: &CompressedProof,
) -> Result<UncompressedProof, ProofErrorKind> {
    let hyps_num = ass.mand_hyps_num();
    let refs_num = proof.refs().len();
    let mut labels: Vec<LabTok> = Vec::with_capacity(proof.codes().len());
    let mut openings: Vec<usize> = Vec::new();
    let mut saved: Vec<Range<usize>> = Vec::new();
    for &code in proof.codes() {
        let code = code as usize;
        if code == 0 {
            let &start = openings.last().ok_or(ProofErrorKind::StackUnderflow)?;
            saved.push(start..labels.len());
            continue;
        }
        if code <= hyps_num + refs_num {
            let label = if code <= hyps_num {
                ass.mand_hyp(code - 1)
                    .ok_or(ProofErrorKind::CompressedCodeOutOfRange)?
            } else {
                proof.refs()[code - hyps_num - 1]
            };
            let consumed = lib
                .get_assertion(label)
                .map_or(0, Assertion::mand_hyps_num);
            if openings.len() < consumed {
                return Err(ProofErrorKind::StackUnderflow);
            }
            let start = match consumed {
                0 => labels.len(),
                _ => openings[openings.len() - consumed],
            };
            openings.truncate(openings.len() - consumed);
            openings.push(start);
            labels.push(label);
        } else {
            let range = saved
                .get(code - hyps_num - refs_num - 1)
                .ok_or(ProofErrorKind::CompressedCodeOutOfRange)?
                .clone();
            openings.push(labels.len());
            labels.extend_from_within(range);
        }
        if labels.len() > MAX_DECOMPRESSED_LABELS {
            return Err(ProofErrorKind::DecompressionTooLarge);
        }
    }
    if openings.len() != 1 {
        return Err(ProofErrorKind::ProofStackNotSingleton);
    }
    Ok(UncompressedProof::new(labels))
}

/// Gives every label its own code, in order of first use.
pub fn compress_no_backrefs(ass: &Assertion, labels: &[LabTok]) -> CompressedProof {
    let mut label_map = hypothesis_codes(ass);
    let mut refs = Vec::new();
    let mut codes = Vec::with_capacity(labels.len());
    for &label in labels {
        let next = (ass.mand_hyps_num() + refs.len() + 1) as CodeTok;
        let code = *label_map.entry(label).or_insert_with(|| {
            refs.push(label);
            next
        });
        codes.push(code);
    }
    CompressedProof::new(refs, codes)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    FindDuplicates,
    Emit,
}

/// Both phases walk the tree the same way: a node is not descended into if it has children and
/// its formula was already proven by a node that was left before.
struct SentenceCompressor<'t, S> {
    phase: Phase,
    label_map: HashMap<LabTok, CodeTok>,
    refs: Vec<LabTok>,
    next_code: CodeTok,
    seen: BTreeSet<&'t S>,
    dupl: BTreeSet<&'t S>,
    dupl_map: BTreeMap<&'t S, CodeTok>,
    codes: Vec<CodeTok>,
}

impl<'t, S: Ord, V> TreeVisitor<'t, S, V> for SentenceCompressor<'t, S> {
    fn enter(&mut self, tree: &'t ProofTree<S, V>, id: NodeId) -> bool {
        let node = tree.node(id);
        if node.children.is_empty() || !self.seen.contains(&node.sentence) {
            return true;
        }
        match self.phase {
            Phase::FindDuplicates => {
                self.dupl.insert(&node.sentence);
            }
            Phase::Emit => match self.dupl_map.get(&node.sentence) {
                Some(&code) => self.codes.push(code),
                None => unreachable!("duplicate formula pruned before it was saved"),
            },
        }
        false
    }

    fn leave(&mut self, tree: &'t ProofTree<S, V>, id: NodeId) {
        let node = tree.node(id);
        match self.phase {
            Phase::FindDuplicates => {
                if !self.label_map.contains_key(&node.label) {
                    self.label_map.insert(node.label, self.next_code);
                    self.refs.push(node.label);
                    self.next_code += 1;
                }
            }
            Phase::Emit => {
                match self.label_map.get(&node.label) {
                    Some(&code) => self.codes.push(code),
                    None => unreachable!("label left without a code"),
                }
                if self.dupl.contains(&node.sentence) && !self.dupl_map.contains_key(&node.sentence)
                {
                    self.dupl_map.insert(&node.sentence, self.next_code);
                    self.next_code += 1;
                    self.codes.push(0);
                }
            }
        }
        self.seen.insert(&node.sentence);
    }
}

/// Compresses the proof below `root`, saving the first proof of every formula that is proven more
/// than once and referring back to it instead of repeating it.
pub fn compress_identical_sentences<S: Ord, V>(
    ass: &Assertion,
    tree: &ProofTree<S, V>,
    root: NodeId,
) -> CompressedProof {
    let mut compressor = SentenceCompressor {
        phase: Phase::FindDuplicates,
        label_map: hypothesis_codes(ass),
        refs: Vec::new(),
        next_code: ass.mand_hyps_num() as CodeTok + 1,
        seen: BTreeSet::new(),
        dupl: BTreeSet::new(),
        dupl_map: BTreeMap::new(),
        codes: Vec::new(),
    };
    tree.walk(root, &mut compressor);
    debug!(
        "{} labels referenced, {} formulas proven more than once",
        compressor.refs.len(),
        compressor.dupl.len()
    );

    compressor.phase = Phase::Emit;
    compressor.seen.clear();
    tree.walk(root, &mut compressor);
    CompressedProof::new(compressor.refs, compressor.codes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::demo0;
    use crate::LibraryImpl;

    fn th1(lib: &LibraryImpl) -> &Assertion {
        lib.get_assertion(lib.get_label("th1").unwrap()).unwrap()
    }

    #[test]
    fn decompress_shape_errors() {
        let lib = demo0();
        let ass = th1(&lib);
        let tpl = lib.labels("tpl").unwrap();
        let run = |codes: Vec<CodeTok>| decompress(&lib, ass, &CompressedProof::new(tpl.clone(), codes));
        assert_eq!(run(vec![0]), Err(ProofErrorKind::StackUnderflow));
        assert_eq!(run(vec![1, 2]), Err(ProofErrorKind::StackUnderflow));
        assert_eq!(run(vec![1, 1]), Err(ProofErrorKind::ProofStackNotSingleton));
        assert_eq!(run(vec![]), Err(ProofErrorKind::ProofStackNotSingleton));
        assert_eq!(run(vec![1, 3]), Err(ProofErrorKind::CompressedCodeOutOfRange));
        assert_eq!(
            run(vec![1, 0, 3, 2]),
            Ok(UncompressedProof::new(lib.labels("tt tt tpl").unwrap()))
        );
    }

    #[test]
    fn decompression_bomb() {
        let lib = demo0();
        let ass = th1(&lib);
        // every round doubles the saved subproof: tt, then ( s + s ) with s the last saved
        let mut codes = vec![1, 0];
        for k in 0..25 {
            codes.extend([3 + k, 2, 0]);
        }
        let proof = CompressedProof::new(lib.labels("tpl").unwrap(), codes);
        assert_eq!(
            decompress(&lib, ass, &proof),
            Err(ProofErrorKind::DecompressionTooLarge)
        );
    }

    #[test]
    fn no_backrefs() {
        let lib = demo0();
        let ass = th1(&lib);
        let labels = lib.labels("tt tze tpl tt tze tpl weq").unwrap();
        let proof = compress_no_backrefs(ass, &labels);
        assert_eq!(proof.refs(), &lib.labels("tze tpl weq").unwrap()[..]);
        assert_eq!(proof.codes(), &[1, 2, 3, 1, 2, 3, 4]);
    }
}
