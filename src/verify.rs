use std::thread;

use log::{info, warn};

use crate::{
    error::ProofError,
    library::{Assertion, Library},
    proof::{CompressionStrategy, Proof},
    types::*,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerifyOptions {
    /// Also check that compressing and decompressing every proof gives proofs that verify.
    pub round_trip: bool,
    /// Number of threads sharing the work, at least one.
    pub threads: usize,
}

impl Default for VerifyOptions {
    fn default() -> Self {
        VerifyOptions {
            round_trip: false,
            threads: 1,
        }
    }
}

/// Verifies the proof attached to `ass`, if any.
///
/// With `round_trip`, the compressed and decompressed forms of the proof are verified too, as well
/// as the results of decompressing the compressed one and compressing the decompressed one.
pub fn verify_assertion<L: Library + ?Sized>(
    lib: &L,
    ass: &Assertion,
    round_trip: bool,
) -> Result<(), ProofError> {
    let proof = match ass.proof() {
        Some(proof) => proof,
        None => return Ok(()),
    };
    proof.executor(lib, ass, false).execute()?;
    if !round_trip {
        return Ok(());
    }

    let operator = proof.operator(lib, ass);
    let compressed = Proof::from(operator.compress(CompressionStrategy::Any)?);
    let decompressed = Proof::from(operator.decompress()?);
    let recompressed = Proof::from(
        decompressed
            .operator(lib, ass)
            .compress(CompressionStrategy::Any)?,
    );
    let redecompressed = Proof::from(compressed.operator(lib, ass).decompress()?);
    for variant in [&compressed, &decompressed, &recompressed, &redecompressed] {
        variant.executor(lib, ass, false).execute()?;
    }
    Ok(())
}

fn verify_chunk<L: Library + ?Sized>(
    lib: &L,
    theorems: &[(LabTok, &Assertion)],
    round_trip: bool,
) -> Vec<(LabTok, ProofError)> {
    let mut failures = Vec::new();
    for &(label, ass) in theorems {
        if ass.proof().is_none() {
            warn!(
                "theorem {} has no proof",
                lib.resolve_label(label).unwrap_or_default()
            );
            continue;
        }
        if let Err(err) = verify_assertion(lib, ass, round_trip) {
            warn!(
                "proof of {} is wrong: {}",
                lib.resolve_label(label).unwrap_or_default(),
                err
            );
            failures.push((label, err));
        }
    }
    failures
}

/// Verifies every theorem of `lib` and returns the ones whose proof is wrong, in the order they
/// were added to `lib`.
pub fn verify_library<L: Library + Sync + ?Sized>(
    lib: &L,
    options: &VerifyOptions,
) -> Vec<(LabTok, ProofError)> {
    let theorems: Vec<_> = lib
        .assertion_labels()
        .iter()
        .filter_map(|&label| Some((label, lib.get_assertion(label)?)))
        .filter(|(_, ass)| ass.is_theorem())
        .collect();
    let threads = options.threads.max(1);
    info!(
        "verifying {} theorems on {} threads",
        theorems.len(),
        threads
    );
    let failures = if threads == 1 || theorems.len() < 2 {
        verify_chunk(lib, &theorems, options.round_trip)
    } else {
        let chunk_size = (theorems.len() + threads - 1) / threads;
        thread::scope(|scope| {
            let handles: Vec<_> = theorems
                .chunks(chunk_size)
                .map(|chunk| scope.spawn(move || verify_chunk(lib, chunk, options.round_trip)))
                .collect();
            handles
                .into_iter()
                .flat_map(|handle| match handle.join() {
                    Ok(failures) => failures,
                    Err(panic) => std::panic::resume_unwind(panic),
                })
                .collect()
        })
    };
    info!("{} of {} proofs are wrong", failures.len(), theorems.len());
    failures
}
