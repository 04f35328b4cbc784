use log::{debug, trace};

use crate::{
    dvr::{DVRSet, DVR},
    error::{ProofError, ProofErrorKind},
    library::{Assertion, Library},
    sentence::ProofSentence,
    substitution::SubstMap,
    tree::{NodeId, ProofTree, ProofTreeNode},
    types::*,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Checkpoint {
    stack_len: usize,
    proof_len: usize,
    saved_len: usize,
    tree_len: usize,
    cleared_len: usize,
}

#[derive(Debug, Clone)]
struct SavedStep<S, V> {
    sentence: S,
    dists: DVRSet<V>,
    node: Option<NodeId>,
}

/// The stack machine that replays proofs.
///
/// Every frame on the stack is a formula together with the distinct variable restrictions that
/// were needed to derive it. Labels are applied one at a time with [`Engine::process_label`];
/// hypotheses push their formula and assertions consume their mandatory hypotheses from the top of
/// the stack and push their substituted thesis.
///
/// [`Engine::checkpoint`], [`Engine::commit`] and [`Engine::rollback`] allow trying out proof steps
/// and undoing them again. Checkpoints have to be closed in reverse order of opening, and no step
/// may consume a frame that was pushed before the innermost open checkpoint; breaking either rule
/// is a bug in the caller and panics.
///
/// # Example
/// ```
/// use mmkernel::{Engine, Library, LibraryImpl};
///
/// let mut lib = LibraryImpl::new();
/// lib.add_constants("wff |- ( ) ->").unwrap();
/// lib.add_variables("ph ps").unwrap();
/// lib.add_floating("wph", "wff ph").unwrap();
/// lib.add_floating("wps", "wff ps").unwrap();
/// lib.add_essential("min", "|- ph").unwrap();
/// lib.add_essential("maj", "|- ( ph -> ps )").unwrap();
/// lib.add_axiom("mp", "|- ps", &["wph", "wps", "min", "maj"], &[]).unwrap();
///
/// let mut engine: Engine<_> = Engine::new(&lib, false);
/// for label in lib.labels("wph wps min maj mp").unwrap() {
///     engine.process_label(label).unwrap();
/// }
/// assert_eq!(engine.stack(), &[lib.sentence("|- ps").unwrap()]);
/// ```
#[derive(Debug, Clone)]
pub struct Engine<'a, L: Library + ?Sized, S: ProofSentence<L> = Sentence> {
    lib: &'a L,
    gen_proof_tree: bool,
    stack: Vec<S>,
    dists_stack: Vec<DVRSet<S::Var>>,
    tree_stack: Vec<NodeId>,
    tree: ProofTree<S, S::Var>,
    saved_steps: Vec<SavedStep<S, S::Var>>,
    cleared: Vec<NodeId>,
    proof: Vec<LabTok>,
    checkpoints: Vec<Checkpoint>,
}

impl<'a, L: Library + ?Sized, S: ProofSentence<L>> Engine<'a, L, S> {
    /// Creates an engine with an empty stack. If `gen_proof_tree` is set, every step is recorded in
    /// a [`ProofTree`].
    pub fn new(lib: &'a L, gen_proof_tree: bool) -> Self {
        Engine {
            lib,
            gen_proof_tree,
            stack: Vec::new(),
            dists_stack: Vec::new(),
            tree_stack: Vec::new(),
            tree: ProofTree::default(),
            saved_steps: Vec::new(),
            cleared: Vec::new(),
            proof: Vec::new(),
            checkpoints: Vec::new(),
        }
    }

    fn error(
        &self,
        kind: ProofErrorKind,
        label: LabTok,
        on_stack: Option<&S>,
        template: Option<&S>,
        subst: &SubstMap<S::Var, S>,
    ) -> ProofError<S, S::Var> {
        ProofError {
            kind,
            label,
            on_stack: on_stack.cloned(),
            template: template.cloned(),
            subst: subst.to_vec(),
        }
    }

    fn unknown_label(label: LabTok) -> ProofError<S, S::Var> {
        ProofError::new(ProofErrorKind::UnknownLabel).with_label(label)
    }

    fn push_frame(
        &mut self,
        sentence: S,
        dists: DVRSet<S::Var>,
        label: LabTok,
        number: LabTok,
        children: Vec<NodeId>,
    ) {
        if self.gen_proof_tree {
            let id = self.tree.push(ProofTreeNode {
                sentence: sentence.clone(),
                label,
                children,
                dists: dists.clone(),
                essential: true,
                number,
            });
            self.tree_stack.push(id);
            self.tree.set_root(Some(id));
        }
        self.stack.push(sentence);
        self.dists_stack.push(dists);
    }

    /// Pushes a frame that is not produced by any label.
    pub fn push(&mut self, sentence: S, dists: DVRSet<S::Var>) {
        self.push_frame(sentence, dists, 0, 0, Vec::new());
    }

    /// Pushes `sentence` with no restrictions, as the result of `label`.
    pub fn process_sentence(&mut self, sentence: S, label: LabTok) {
        self.push_frame(sentence, DVRSet::new(), label, 0, Vec::new());
        self.proof.push(label);
    }

    /// Applies one proof step: an assertion if `label` names one, otherwise the hypothesis
    /// `label`.
    ///
    /// # Errors
    /// * UnknownLabel - if `label` has no formula
    /// * any error of [`Engine::process_assertion`]
    pub fn process_label(&mut self, label: LabTok) -> Result<(), ProofError<S, S::Var>> {
        trace!("processing label {}", label);
        let lib = self.lib;
        if let Some(ass) = lib.get_assertion(label) {
            return self.process_assertion(ass, label);
        }
        let sentence = S::get_sentence(lib, label).ok_or_else(|| Self::unknown_label(label))?;
        self.process_sentence(sentence.clone(), label);
        Ok(())
    }

    /// Applies the assertion `ass` (named `label`) to the top of the stack.
    ///
    /// The mandatory hypotheses are consumed from the stack: floating hypotheses define the
    /// substitution, essential hypotheses are checked against it, and the restrictions of `ass`
    /// are carried over to the variables substituted into them. The substituted thesis is pushed.
    /// Nothing is changed if an error is returned.
    ///
    /// # Errors
    /// * StackUnderflow - if the stack has fewer frames than `ass` has mandatory hypotheses
    /// * FloatingTypeMismatch - if a frame has another type code than its floating hypothesis
    /// * EssentialWrongConstant, EssentialStackTooShort, EssentialWrongSubstitution,
    /// EssentialStackTooLong - if a frame does not match its essential hypothesis (see
    /// [`ProofSentence::check_match`])
    /// * DistinctViolation - if restricted variables are substituted with formulas that share a
    /// variable
    /// * UnknownLabel - if a hypothesis or the thesis of `ass` has no formula
    pub fn process_assertion(
        &mut self,
        ass: &Assertion,
        label: LabTok,
    ) -> Result<(), ProofError<S, S::Var>> {
        let lib = self.lib;
        let unknown = Self::unknown_label;
        let hyps_num = ass.mand_hyps_num();
        if self.stack.len() < hyps_num {
            return Err(ProofError::new(ProofErrorKind::StackUnderflow).with_label(label));
        }
        let stack_base = self.stack.len() - hyps_num;
        debug!(
            "applying assertion {} to {} of {} frames",
            label,
            hyps_num,
            self.stack.len()
        );

        let float_num = ass.float_hyps().len();
        let mut subst = SubstMap::with_capacity(float_num);
        for (i, &hyp) in ass.float_hyps().iter().enumerate() {
            let stack_sent = &self.stack[stack_base + i];
            let typ = S::floating_to_type(lib, hyp).ok_or_else(|| unknown(hyp))?;
            if typ != stack_sent.sentence_to_type() {
                return Err(self.error(
                    ProofErrorKind::FloatingTypeMismatch,
                    label,
                    Some(stack_sent),
                    S::get_sentence(lib, hyp),
                    &subst,
                ));
            }
            let var = S::floating_to_var(lib, hyp).ok_or_else(|| unknown(hyp))?;
            let fresh = subst.insert(var, stack_sent.clone());
            debug_assert!(fresh, "variable bound by two floating hypotheses");
        }

        let mut dists = DVRSet::new();
        for (i, &hyp) in ass.ess_hyps().iter().enumerate() {
            let pos = stack_base + float_num + i;
            let stack_sent = &self.stack[pos];
            let template = S::get_sentence(lib, hyp).ok_or_else(|| unknown(hyp))?;
            dists.extend(self.dists_stack[pos].iter().copied());
            stack_sent
                .check_match(lib, template, &subst)
                .map_err(|kind| self.error(kind, label, Some(stack_sent), Some(template), &subst))?;
        }

        for (j, (var1, sent1)) in subst.iter().enumerate() {
            for (var2, sent2) in subst.iter().take(j) {
                if !ass.constrains(S::var_to_symbol(lib, var1), S::var_to_symbol(lib, var2)) {
                    continue;
                }
                for dvr in DVR::substitute(lib, sent1, sent2) {
                    let dvr = dvr.map_err(|kind| {
                        self.error(kind, label, Some(sent1), Some(sent2), &subst)
                    })?;
                    dists.insert(dvr);
                }
            }
        }

        let thesis = S::get_sentence(lib, ass.thesis()).ok_or_else(|| unknown(ass.thesis()))?;
        let sentence = thesis.substitute(lib, &subst);

        self.stack_resize(stack_base);
        let children = if self.gen_proof_tree {
            for &id in &self.tree_stack[stack_base..stack_base + float_num] {
                let node = self.tree.node_mut(id);
                if node.essential {
                    node.essential = false;
                    self.cleared.push(id);
                }
            }
            self.tree_stack.split_off(stack_base)
        } else {
            Vec::new()
        };
        self.push_frame(sentence, dists, label, ass.number(), children);
        self.proof.push(label);
        Ok(())
    }

    fn stack_resize(&mut self, len: usize) {
        if let Some(checkpoint) = self.checkpoints.last() {
            assert!(
                len >= checkpoint.stack_len,
                "stack shrunk below the innermost checkpoint ({} < {})",
                len,
                checkpoint.stack_len
            );
        }
        self.stack.truncate(len);
        self.dists_stack.truncate(len);
    }

    /// Remembers the frame on top of the stack, so it can be pushed again with
    /// [`Engine::process_saved_step`]. Returns the index of the saved step.
    ///
    /// # Errors
    /// * StackUnderflow - if the stack is empty
    pub fn save_step(&mut self) -> Result<usize, ProofError<S, S::Var>> {
        let sentence = self
            .stack
            .last()
            .ok_or(ProofErrorKind::StackUnderflow)?;
        let dists = self.dists_stack.last().cloned().unwrap_or_default();
        self.saved_steps.push(SavedStep {
            sentence: sentence.clone(),
            dists,
            node: self.tree_stack.last().copied(),
        });
        Ok(self.saved_steps.len() - 1)
    }

    /// Pushes a copy of the `index`-th saved step. The step is not recorded in
    /// [`Engine::proof_labels`].
    ///
    /// # Errors
    /// * CompressedCodeOutOfRange - if there are not enough saved steps
    pub fn process_saved_step(&mut self, index: usize) -> Result<(), ProofError<S, S::Var>> {
        let step = self
            .saved_steps
            .get(index)
            .ok_or(ProofErrorKind::CompressedCodeOutOfRange)?;
        self.stack.push(step.sentence.clone());
        self.dists_stack.push(step.dists.clone());
        if let Some(node) = step.node {
            self.tree_stack.push(node);
            self.tree.set_root(Some(node));
        }
        Ok(())
    }

    pub fn saved_steps_num(&self) -> usize {
        self.saved_steps.len()
    }

    /// Opens a checkpoint that a later [`Engine::rollback`] returns to.
    pub fn checkpoint(&mut self) {
        debug!("checkpoint at stack size {}", self.stack.len());
        self.checkpoints.push(Checkpoint {
            stack_len: self.stack.len(),
            proof_len: self.proof.len(),
            saved_len: self.saved_steps.len(),
            tree_len: self.tree.len(),
            cleared_len: self.cleared.len(),
        });
    }

    /// Closes the innermost checkpoint, keeping everything done since.
    ///
    /// # Panics
    /// This method panics if there is no open checkpoint
    pub fn commit(&mut self) {
        assert!(self.checkpoints.pop().is_some(), "commit without checkpoint");
    }

    /// Closes the innermost checkpoint and undoes everything done since.
    ///
    /// # Panics
    /// This method panics if there is no open checkpoint
    pub fn rollback(&mut self) {
        let checkpoint = match self.checkpoints.pop() {
            Some(checkpoint) => checkpoint,
            None => panic!("rollback without checkpoint"),
        };
        debug!("rollback to stack size {}", checkpoint.stack_len);
        self.stack.truncate(checkpoint.stack_len);
        self.dists_stack.truncate(checkpoint.stack_len);
        self.proof.truncate(checkpoint.proof_len);
        self.saved_steps.truncate(checkpoint.saved_len);
        if self.gen_proof_tree {
            // saved nodes from before the checkpoint may have been consumed as floating hypotheses
            for id in self.cleared.drain(checkpoint.cleared_len..) {
                self.tree.node_mut(id).essential = true;
            }
            self.tree_stack.truncate(checkpoint.stack_len);
            self.tree.truncate(checkpoint.tree_len);
            self.tree.set_root(self.tree_stack.last().copied());
        }
    }

    pub fn stack(&self) -> &[S] {
        &self.stack
    }

    /// The restrictions of the frame on top of the stack.
    pub fn dists(&self) -> Option<&DVRSet<S::Var>> {
        self.dists_stack.last()
    }

    /// The labels processed so far, without the ones undone by [`Engine::rollback`].
    pub fn proof_labels(&self) -> &[LabTok] {
        &self.proof
    }

    /// The derivation tree, if it is generated.
    pub fn proof_tree(&self) -> Option<&ProofTree<S, S::Var>> {
        if self.gen_proof_tree {
            Some(&self.tree)
        } else {
            None
        }
    }

    /// Checks that the replayed proof proves `ass`: exactly one frame is left, it is the thesis of
    /// `ass`, and every restriction it needs is declared by `ass`.
    ///
    /// # Errors
    /// * ProofStackNotSingleton - if not exactly one frame is left
    /// * ThesisMismatch - if the frame differs from the thesis
    /// * DistinctTooWide - if the frame needs a restriction that is not declared
    pub fn final_checks(&self, ass: &Assertion) -> Result<(), ProofError<S, S::Var>> {
        let label = ass.thesis();
        let (sentence, dists) = match (&self.stack[..], &self.dists_stack[..]) {
            ([sentence], [dists]) => (sentence, dists),
            _ => {
                return Err(ProofError::new(ProofErrorKind::ProofStackNotSingleton).with_label(label))
            }
        };
        let thesis = S::get_sentence(self.lib, label).ok_or_else(|| Self::unknown_label(label))?;
        if sentence != thesis {
            return Err(ProofError {
                on_stack: Some(sentence.clone()),
                template: Some(thesis.clone()),
                ..ProofError::new(ProofErrorKind::ThesisMismatch).with_label(label)
            });
        }
        for dvr in dists {
            let a = S::var_to_symbol(self.lib, dvr.first());
            let b = S::var_to_symbol(self.lib, dvr.second());
            if !ass.constrains(a, b) {
                return Err(ProofError {
                    on_stack: Some(sentence.clone()),
                    ..ProofError::new(ProofErrorKind::DistinctTooWide).with_label(label)
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{demo0, propositional};
    use crate::LibraryImpl;

    fn run<'a>(lib: &'a LibraryImpl, labels: &str) -> Result<Engine<'a, LibraryImpl>, ProofError> {
        let mut engine = Engine::new(lib, true);
        for label in lib.labels(labels).unwrap() {
            engine.process_label(label)?;
        }
        Ok(engine)
    }

    #[test]
    fn modus_ponens() {
        let lib = propositional();
        let err = run(&lib, "min maj mp").map(|_| ()).unwrap_err();
        assert_eq!(err.kind, ProofErrorKind::StackUnderflow);

        let mut engine: Engine<_> = Engine::new(&lib, false);
        engine.process_sentence(lib.sentence("wff ph").unwrap(), lib.get_label("wph").unwrap());
        engine.process_sentence(lib.sentence("wff ps").unwrap(), lib.get_label("wps").unwrap());
        engine.process_sentence(lib.sentence("|- ph").unwrap(), lib.get_label("min").unwrap());
        engine.process_sentence(
            lib.sentence("|- ( ph -> ps )").unwrap(),
            lib.get_label("maj").unwrap(),
        );
        engine.process_label(lib.get_label("mp").unwrap()).unwrap();
        assert_eq!(engine.stack(), &[lib.sentence("|- ps").unwrap()]);
        assert_eq!(engine.proof_labels(), &lib.labels("wph wps min maj mp").unwrap()[..]);
    }

    #[test]
    fn th1_steps() {
        let lib = demo0();
        let engine = run(&lib, "tt tze tpl tt weq").unwrap();
        assert_eq!(engine.stack(), &[lib.sentence("wff ( t + 0 ) = t").unwrap()]);

        let tree = engine.proof_tree().unwrap();
        let root = tree.node(tree.root().unwrap());
        assert_eq!(root.label, lib.get_label("weq").unwrap());
        assert_eq!(root.children.len(), 2);
        assert!(root.essential);
        let tpl = tree.node(root.children[0]);
        assert!(!tpl.essential);
        assert_eq!(tpl.children.len(), 2);
        assert!(tpl.children.iter().all(|&id| !tree.node(id).essential));
    }

    #[test]
    fn floating_type_mismatch() {
        let lib = demo0();
        let err = run(&lib, "wp tt weq").map(|_| ()).unwrap_err();
        assert_eq!(err.kind, ProofErrorKind::FloatingTypeMismatch);
        assert_eq!(err.label, lib.get_label("weq").unwrap());
        assert_eq!(err.on_stack, Some(lib.sentence("wff P").unwrap()));
        assert_eq!(err.template, Some(lib.sentence("term t").unwrap()));
    }

    #[test]
    fn essential_mismatch() {
        let lib = demo0();
        let err = run(&lib, "wp wq tt a2 tt a2 mp").map(|_| ()).unwrap_err();
        assert_eq!(err.kind, ProofErrorKind::EssentialWrongSubstitution);
        assert_eq!(err.subst.len(), 2);
    }

    #[test]
    fn distinct_violation() {
        let lib = demo0();
        let err = run(&lib, "tt tt adist").map(|_| ()).unwrap_err();
        assert_eq!(err.kind, ProofErrorKind::DistinctViolation);

        let engine = run(&lib, "tt ts adist").unwrap();
        let t = lib.get_symbol("t").unwrap();
        let s = lib.get_symbol("s").unwrap();
        assert_eq!(
            engine.dists().unwrap().iter().copied().collect::<Vec<_>>(),
            vec![DVR::new(t, s).unwrap()]
        );
    }

    #[test]
    fn dists_are_inherited() {
        let lib = demo0();
        let engine = run(&lib, "tt ts tpl ts tt tpl tt ts adist eqsym").unwrap();
        assert_eq!(
            engine.stack(),
            &[lib.sentence("|- ( s + t ) = ( t + s )").unwrap()]
        );
        assert_eq!(engine.dists().unwrap().len(), 1);
    }

    #[test]
    fn save_and_reuse() {
        let lib = demo0();
        let mut engine: Engine<_> = Engine::new(&lib, true);
        let tt = lib.get_label("tt").unwrap();
        let tze = lib.get_label("tze").unwrap();
        let tpl = lib.get_label("tpl").unwrap();
        assert_eq!(
            engine.save_step().map(|_| ()).unwrap_err().kind,
            ProofErrorKind::StackUnderflow
        );
        for label in [tt, tze, tpl] {
            engine.process_label(label).unwrap();
        }
        assert_eq!(engine.save_step().unwrap(), 0);
        engine.process_saved_step(0).unwrap();
        assert_eq!(engine.stack()[0], engine.stack()[1]);
        assert_eq!(
            engine.process_saved_step(1).unwrap_err().kind,
            ProofErrorKind::CompressedCodeOutOfRange
        );
        engine.process_label(lib.get_label("weq").unwrap()).unwrap();
        assert_eq!(
            engine.stack(),
            &[lib.sentence("wff ( t + 0 ) = ( t + 0 )").unwrap()]
        );
        assert_eq!(engine.proof_labels(), &[tt, tze, tpl, lib.get_label("weq").unwrap()]);

        let tree = engine.proof_tree().unwrap();
        let root = tree.node(tree.root().unwrap());
        assert_eq!(root.children[0], root.children[1]);
    }

    #[test]
    fn rollback_restores_state() {
        let lib = demo0();
        let mut engine = run(&lib, "tt").unwrap();
        engine.checkpoint();
        engine.process_label(lib.get_label("tze").unwrap()).unwrap();
        engine.save_step().unwrap();
        engine.checkpoint();
        for label in lib.labels("tt tze").unwrap() {
            engine.process_label(label).unwrap();
        }
        engine.rollback();
        assert_eq!(engine.stack().len(), 2);
        engine.rollback();
        assert_eq!(engine.stack(), &[lib.sentence("term t").unwrap()]);
        assert_eq!(engine.proof_labels(), &[lib.get_label("tt").unwrap()]);
        assert_eq!(engine.saved_steps_num(), 0);
        let tree = engine.proof_tree().unwrap();
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.root(), Some(0));
    }

    #[test]
    fn rollback_restores_essential_flags() {
        let lib = demo0();
        let mut engine = run(&lib, "tt").unwrap();
        engine.save_step().unwrap();
        engine.checkpoint();
        engine.process_saved_step(0).unwrap();
        for label in lib.labels("tt weq").unwrap() {
            engine.process_label(label).unwrap();
        }
        let tree = engine.proof_tree().unwrap();
        assert!(!tree.node(0).essential);
        assert_eq!(tree.node(tree.root().unwrap()).children[0], 0);

        engine.rollback();
        let tree = engine.proof_tree().unwrap();
        assert_eq!(tree.len(), 1);
        assert!(tree.node(0).essential);
    }

    #[test]
    #[should_panic]
    fn checkpoint_discipline() {
        let lib = demo0();
        let mut engine = run(&lib, "tt tze").unwrap();
        engine.checkpoint();
        let _ = engine.process_label(lib.get_label("tpl").unwrap());
    }

    #[test]
    #[should_panic]
    fn rollback_without_checkpoint() {
        let lib = demo0();
        let mut engine = run(&lib, "tt").unwrap();
        engine.rollback();
    }

    #[test]
    fn final_checks() {
        let lib = demo0();
        let ass = lib.get_assertion(lib.get_label("th1").unwrap()).unwrap();
        let engine = run(&lib, "tt tt weq").unwrap();
        let err = engine.final_checks(ass).unwrap_err();
        assert_eq!(err.kind, ProofErrorKind::ThesisMismatch);
        assert_eq!(err.on_stack, Some(lib.sentence("wff t = t").unwrap()));

        let engine = run(&lib, "tt tt").unwrap();
        assert_eq!(
            engine.final_checks(ass).unwrap_err().kind,
            ProofErrorKind::ProofStackNotSingleton
        );
    }

    quickcheck! {
        fn checkpoint_lifo(ops: Vec<u8>) -> bool {
            let lib = demo0();
            let tt = lib.get_label("tt").unwrap();
            let tze = lib.get_label("tze").unwrap();
            let mut engine: Engine<_> = Engine::new(&lib, true);
            let mut marks = Vec::new();
            for op in ops {
                match op % 6 {
                    0 => {
                        engine.checkpoint();
                        marks.push((engine.stack().len(), engine.proof_labels().len()));
                    }
                    1 => engine.process_label(tt).unwrap(),
                    2 => engine.process_label(tze).unwrap(),
                    3 => {
                        engine.save_step().ok();
                    }
                    4 => {
                        if let Some((stack_len, proof_len)) = marks.pop() {
                            engine.rollback();
                            if engine.stack().len() != stack_len
                                || engine.proof_labels().len() != proof_len
                            {
                                return false;
                            }
                        }
                    }
                    _ => {
                        if marks.pop().is_some() {
                            engine.commit();
                        }
                    }
                }
            }
            engine.proof_tree().map(|tree| tree.len()) == Some(engine.proof_labels().len())
        }
    }
}
