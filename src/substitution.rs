/// The substitution built while processing one assertion step: every floating hypothesis binds its
/// variable to the formula found on the stack.
///
/// Entries keep the order in which they were inserted, which is the order of the floating
/// hypotheses of the assertion. Lookups are linear, assertions rarely have more than a handful of
/// floating hypotheses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubstMap<V, S> {
    entries: Vec<(V, S)>,
}

impl<V: Copy + Eq, S> SubstMap<V, S> {
    pub fn with_capacity(capacity: usize) -> Self {
        SubstMap {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Binds `var` to `sentence`. Returns `false` and leaves the map untouched if `var` is already
    /// bound.
    ///
    /// # Example
    /// ```
    /// use mmkernel::SubstMap;
    ///
    /// let mut subst = SubstMap::with_capacity(2);
    /// assert!(subst.insert(5, vec![1, 7]));
    /// assert!(!subst.insert(5, vec![1, 8]));
    /// assert_eq!(subst.get(5), Some(&vec![1, 7]));
    /// assert_eq!(subst.get(6), None);
    /// ```
    pub fn insert(&mut self, var: V, sentence: S) -> bool {
        if self.get(var).is_some() {
            return false;
        }
        self.entries.push((var, sentence));
        true
    }

    pub fn get(&self, var: V) -> Option<&S> {
        self.entries
            .iter()
            .find(|(v, _)| *v == var)
            .map(|(_, sentence)| sentence)
    }

    pub fn iter(&self) -> impl Iterator<Item = (V, &S)> {
        self.entries.iter().map(|(v, sentence)| (*v, sentence))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<V: Copy + Eq, S: Clone> SubstMap<V, S> {
    pub fn to_vec(&self) -> Vec<(V, S)> {
        self.entries.clone()
    }
}
