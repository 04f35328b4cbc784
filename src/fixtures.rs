//! Small databases shared by the tests.

use crate::{library::LibraryImpl, proof::UncompressedProof};

pub const TH1_PROOF: &str = "tt tze tpl tt weq tt tt weq tt a2 tt tze tpl tt weq tt tze tpl tt weq \
                             tt tt weq wim tt a2 tt tze tpl tt tt a1 mp mp";
pub const TH1_REFS: &str = "tze tpl weq a2 wim a1 mp";
pub const TH1_CODES: &str = "ABCZADZAADZAEZJJKFLIAAGHH";

/// The arithmetic example database from the Metamath book, extended by a commutativity axiom with
/// a distinct variable restriction.
pub fn demo0() -> LibraryImpl {
    let mut lib = LibraryImpl::new();
    lib.add_constants("0 + = -> ( ) term wff |-").unwrap();
    lib.add_variables("t r s P Q").unwrap();
    lib.add_floating("tt", "term t").unwrap();
    lib.add_floating("tr", "term r").unwrap();
    lib.add_floating("ts", "term s").unwrap();
    lib.add_floating("wp", "wff P").unwrap();
    lib.add_floating("wq", "wff Q").unwrap();
    lib.add_axiom("tze", "term 0", &[], &[]).unwrap();
    lib.add_axiom("tpl", "term ( t + r )", &["tt", "tr"], &[])
        .unwrap();
    lib.add_axiom("weq", "wff t = r", &["tt", "tr"], &[]).unwrap();
    lib.add_axiom("wim", "wff ( P -> Q )", &["wp", "wq"], &[])
        .unwrap();
    lib.add_axiom(
        "a1",
        "|- ( t = r -> ( t = s -> r = s ) )",
        &["tt", "tr", "ts"],
        &[],
    )
    .unwrap();
    lib.add_axiom("a2", "|- ( t + 0 ) = t", &["tt"], &[]).unwrap();
    lib.add_essential("min", "|- P").unwrap();
    lib.add_essential("maj", "|- ( P -> Q )").unwrap();
    lib.add_axiom("mp", "|- Q", &["wp", "wq", "min", "maj"], &[])
        .unwrap();
    let proof = UncompressedProof::new(lib.labels(TH1_PROOF).unwrap());
    lib.add_theorem("th1", "|- t = t", &["tt"], &[], Some(proof.into()))
        .unwrap();

    lib.add_axiom(
        "adist",
        "|- ( t + r ) = ( r + t )",
        &["tt", "tr"],
        &[("t", "r")],
    )
    .unwrap();
    lib.add_essential("hsym", "|- t = r").unwrap();
    lib.add_axiom("eqsym", "|- r = t", &["tt", "tr", "hsym"], &[])
        .unwrap();
    let proof = UncompressedProof::new(lib.labels("tt ts adist").unwrap());
    lib.add_theorem(
        "thd",
        "|- ( t + s ) = ( s + t )",
        &["tt", "ts"],
        &[("t", "s")],
        Some(proof.into()),
    )
    .unwrap();
    lib
}

/// Just modus ponens.
pub fn propositional() -> LibraryImpl {
    let mut lib = LibraryImpl::new();
    lib.add_constants("wff |- ( ) ->").unwrap();
    lib.add_variables("ph ps").unwrap();
    lib.add_floating("wph", "wff ph").unwrap();
    lib.add_floating("wps", "wff ps").unwrap();
    lib.add_essential("min", "|- ph").unwrap();
    lib.add_essential("maj", "|- ( ph -> ps )").unwrap();
    lib.add_axiom("mp", "|- ps", &["wph", "wps", "min", "maj"], &[])
        .unwrap();
    lib
}
