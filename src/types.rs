/// Type alias for an interned math symbol. `0` is reserved to mean "not found".
pub type SymTok = u32;

/// Type alias for an interned label (hypothesis, axiom or theorem). `0` is reserved to mean "not
/// found".
pub type LabTok = u32;

/// Type alias for one code of a [`CompressedProof`][crate::CompressedProof].
pub type CodeTok = u32;

/// A formula, i.e. a sequence of symbols whose first element is a constant type code (like `wff`
/// or `|-`).
pub type Sentence = Vec<SymTok>;
