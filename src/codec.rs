//! The numerals used for the codes of compressed proofs.
//!
//! A code `n > 0` is written as a bijective base-5 prefix over `U`-`Y` followed by one bijective
//! base-20 digit over `A`-`T`. Since a numeral always ends with a letter from `A`-`T`, numerals can
//! be concatenated without separators. `Z` stands for the code `0`.
//!
//! # Example
//! ```
//! use mmkernel::codec::{decode_codes, encode_codes};
//!
//! assert_eq!(encode_codes(&[1, 20, 21, 0, 121]), "ATUAZUUA");
//! assert_eq!(decode_codes("AT UA Z\nUUA"), Ok(vec![1, 20, 21, 0, 121]));
//! ```

use crate::{error::ProofErrorKind, types::*};

/// Whitespace as understood by the database format.
pub fn is_mm_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r' | '\x0c')
}

/// Reads codes one character at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CompressedDecoder {
    current: CodeTok,
}

impl CompressedDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one character. Returns the code it completes, if any.
    ///
    /// # Errors
    /// * InvalidCompressedCharacter - if `c` is not a letter from `A`-`Z` or whitespace, or if `Z`
    /// follows an unfinished numeral
    /// * CompressedCodeOutOfRange - if the numeral does not fit into a [`CodeTok`]
    pub fn push_char(&mut self, c: char) -> Result<Option<CodeTok>, ProofErrorKind> {
        match c {
            'A'..='T' => {
                let digit = c as CodeTok - 'A' as CodeTok + 1;
                let code = self
                    .current
                    .checked_mul(20)
                    .and_then(|x| x.checked_add(digit))
                    .ok_or(ProofErrorKind::CompressedCodeOutOfRange)?;
                self.current = 0;
                Ok(Some(code))
            }
            'U'..='Y' => {
                let digit = c as CodeTok - 'U' as CodeTok + 1;
                self.current = self
                    .current
                    .checked_mul(5)
                    .and_then(|x| x.checked_add(digit))
                    .ok_or(ProofErrorKind::CompressedCodeOutOfRange)?;
                Ok(None)
            }
            'Z' if self.current == 0 => Ok(Some(0)),
            c if is_mm_whitespace(c) => Ok(None),
            _ => Err(ProofErrorKind::InvalidCompressedCharacter),
        }
    }

    /// Whether a numeral was started but not finished.
    pub fn is_pending(&self) -> bool {
        self.current != 0
    }

    /// Checks that the input ended between two numerals.
    pub fn finish(&self) -> Result<(), ProofErrorKind> {
        if self.is_pending() {
            Err(ProofErrorKind::UnterminatedCompressedCode)
        } else {
            Ok(())
        }
    }
}

/// Appends the numeral of `code` to `out`.
pub fn push_code(out: &mut String, code: CodeTok) {
    if code == 0 {
        out.push('Z');
        return;
    }
    let mut digits = [0u8; 16];
    let mut len = 0;
    let mut x = code - 1;
    digits[len] = b'A' + (x % 20) as u8;
    len += 1;
    x /= 20;
    while x > 0 {
        x -= 1;
        digits[len] = b'U' + (x % 5) as u8;
        len += 1;
        x /= 5;
    }
    out.extend(digits[..len].iter().rev().map(|&b| b as char));
}

pub fn encode_code(code: CodeTok) -> String {
    let mut res = String::new();
    push_code(&mut res, code);
    res
}

pub fn encode_codes(codes: &[CodeTok]) -> String {
    let mut res = String::with_capacity(codes.len() * 2);
    for &code in codes {
        push_code(&mut res, code);
    }
    res
}

pub fn decode_codes(text: &str) -> Result<Vec<CodeTok>, ProofErrorKind> {
    let mut decoder = CompressedDecoder::new();
    let mut res = Vec::with_capacity(text.len());
    for c in text.chars() {
        if let Some(code) = decoder.push_char(c)? {
            res.push(code);
        }
    }
    decoder.finish()?;
    Ok(res)
}
