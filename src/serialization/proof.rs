use nom::{
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    combinator::{all_consuming, cut, map, rest},
    error::context,
    multi::{many0, many1},
    sequence::terminated,
    Finish, IResult,
};

use crate::{
    codec::{decode_codes, encode_codes, is_mm_whitespace},
    library::Library,
    proof::{CompressedProof, Proof, UncompressedProof},
    serialization::error::{ProofSyntaxError, SerializationError},
    types::*,
};

/// A proof whose labels are not resolved yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProofText<'a> {
    Uncompressed(Vec<&'a str>),
    Compressed(Vec<&'a str>, &'a str),
    Incomplete,
}

fn is_label_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '.' || c == '_'
}

fn whitespace0(input: &str) -> IResult<&str, (), ProofSyntaxError<&str>> {
    let (input, _) = take_while(is_mm_whitespace)(input)?;
    Ok((input, ()))
}

fn label(input: &str) -> IResult<&str, &str, ProofSyntaxError<&str>> {
    context("label", take_while1(is_label_char))(input)
}

fn compressed_proof(input: &str) -> IResult<&str, ProofText, ProofSyntaxError<&str>> {
    let (input, _) = tag("(")(input)?;
    let (input, _) = whitespace0(input)?;
    let (input, refs) = many0(terminated(label, whitespace0))(input)?;
    let (input, _) = cut(tag(")"))(input)?;
    let (input, _) = whitespace0(input)?;
    let (input, codes) = rest(input)?;
    Ok((input, ProofText::Compressed(refs, codes)))
}

fn incomplete_proof(input: &str) -> IResult<&str, ProofText, ProofSyntaxError<&str>> {
    map(terminated(tag("?"), whitespace0), |_| ProofText::Incomplete)(input)
}

fn uncompressed_proof(input: &str) -> IResult<&str, ProofText, ProofSyntaxError<&str>> {
    map(
        many1(terminated(label, whitespace0)),
        ProofText::Uncompressed,
    )(input)
}

/// Parses the text of one proof.
pub fn proof_text(input: &str) -> IResult<&str, ProofText, ProofSyntaxError<&str>> {
    let (input, _) = whitespace0(input)?;
    all_consuming(alt((
        context("compressed_proof", compressed_proof),
        context("incomplete_proof", incomplete_proof),
        context("uncompressed_proof", uncompressed_proof),
    )))(input)
}

impl<'a> ProofText<'a> {
    /// Looks up the labels in `lib` and decodes the codes. An incomplete proof gives `None`.
    pub fn resolve<L: Library + ?Sized>(
        &self,
        lib: &L,
    ) -> Result<Option<Proof>, SerializationError> {
        let resolve = |names: &[&str]| {
            names
                .iter()
                .map(|&name| {
                    lib.get_label(name)
                        .ok_or_else(|| SerializationError::UnknownLabel(name.to_owned()))
                })
                .collect::<Result<Vec<_>, _>>()
        };
        let proof: Proof = match self {
            ProofText::Incomplete => return Ok(None),
            ProofText::Uncompressed(labels) => {
                UncompressedProof::new(resolve(&labels[..])?).into()
            }
            ProofText::Compressed(refs, codes) => {
                CompressedProof::new(resolve(&refs[..])?, decode_codes(codes)?).into()
            }
        };
        Ok(Some(proof))
    }
}

/// Reads a proof from its text form.
///
/// # Example
/// ```
/// use mmkernel::{serialization::parse_proof, LibraryImpl, Proof};
///
/// let mut lib = LibraryImpl::new();
/// lib.add_constants("wff").unwrap();
/// lib.add_variables("ph").unwrap();
/// lib.add_floating("wph", "wff ph").unwrap();
///
/// match parse_proof(&lib, "( ) AZB").unwrap() {
///     Some(Proof::Compressed(proof)) => assert_eq!(proof.codes(), &[1, 0, 2]),
///     _ => unreachable!(),
/// }
/// assert_eq!(parse_proof(&lib, " ? ").unwrap(), None);
/// assert!(parse_proof(&lib, "wph wps").is_err());
/// ```
pub fn parse_proof<L: Library + ?Sized>(
    lib: &L,
    input: &str,
) -> Result<Option<Proof>, SerializationError> {
    let (_, text) = proof_text(input)
        .finish()
        .map_err(|e| SerializationError::Syntax(e.to_string()))?;
    text.resolve(lib)
}

/// Writes a proof in its text form.
pub fn format_proof<L: Library + ?Sized>(
    lib: &L,
    proof: &Proof,
) -> Result<String, SerializationError> {
    let name = |label: LabTok| {
        lib.resolve_label(label)
            .ok_or(SerializationError::UnnamedLabel(label))
    };
    let mut res = String::new();
    match proof {
        Proof::Uncompressed(proof) => {
            for (i, &label) in proof.labels().iter().enumerate() {
                if i > 0 {
                    res.push(' ');
                }
                res.push_str(name(label)?);
            }
        }
        Proof::Compressed(proof) => {
            res.push('(');
            for &label in proof.refs() {
                res.push(' ');
                res.push_str(name(label)?);
            }
            res.push_str(" ) ");
            res.push_str(&encode_codes(proof.codes()));
        }
    }
    Ok(res)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProofErrorKind;
    use crate::fixtures::{demo0, TH1_CODES, TH1_PROOF, TH1_REFS};
    use crate::proof::CompressionStrategy;

    #[test]
    fn parse_text() {
        assert_eq!(
            proof_text(" ( a b.c ) AB\nZ ").ok().map(|(_, text)| text),
            Some(ProofText::Compressed(vec!["a", "b.c"], "AB\nZ "))
        );
        assert_eq!(
            proof_text("a  b\tc").ok().map(|(_, text)| text),
            Some(ProofText::Uncompressed(vec!["a", "b", "c"]))
        );
        assert_eq!(
            proof_text("?").ok().map(|(_, text)| text),
            Some(ProofText::Incomplete)
        );
        match proof_text("( a b") {
            Err(nom::Err::Failure(e)) => {
                assert_eq!(e.to_string(), "Tag at \"\" in compressed_proof")
            }
            _ => panic!("unclosed reference list accepted"),
        }
        assert!(proof_text("").is_err());
        assert!(proof_text("a $ b").is_err());
    }

    #[test]
    fn th1_text() {
        let lib = demo0();
        let th1 = lib.get_assertion(lib.get_label("th1").unwrap()).unwrap();
        let text = format!("( {} ) {}", TH1_REFS, TH1_CODES);
        let compressed = parse_proof(&lib, &text).unwrap().unwrap();
        assert_eq!(format_proof(&lib, &compressed), Ok(text));

        let uncompressed = th1.proof().unwrap();
        assert_eq!(
            format_proof(&lib, uncompressed).unwrap(),
            TH1_PROOF.split_whitespace().collect::<Vec<_>>().join(" ")
        );
        let recompressed = uncompressed
            .operator(&lib, th1)
            .compress(CompressionStrategy::Any)
            .unwrap();
        assert_eq!(Proof::from(recompressed), compressed);
    }

    #[test]
    fn resolve_errors() {
        let lib = demo0();
        assert_eq!(
            parse_proof(&lib, "tt nope weq"),
            Err(SerializationError::UnknownLabel("nope".to_owned()))
        );
        assert_eq!(
            parse_proof(&lib, "( tze ) ABc"),
            Err(SerializationError::Code(
                ProofErrorKind::InvalidCompressedCharacter
            ))
        );
        assert_eq!(
            parse_proof(&lib, "( tze ) ABU"),
            Err(SerializationError::Code(
                ProofErrorKind::UnterminatedCompressedCode
            ))
        );
        assert!(matches!(
            parse_proof(&lib, "( tze"),
            Err(SerializationError::Syntax(_))
        ));
        assert_eq!(
            format_proof(&lib, &UncompressedProof::new(vec![999]).into()),
            Err(SerializationError::UnnamedLabel(999))
        );
    }
}
