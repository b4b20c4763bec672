//! One-time code generation and comparison.

use rand::rngs::OsRng;
use rand::Rng;
use subtle::ConstantTimeEq;

/// Characters used in human-presence challenges.
///
/// Visually ambiguous glyphs (`0/O`, `1/I/L`) are left out.
pub const CHALLENGE_ALPHABET: &[u8] = b"23456789ABCDEFGHJKMNPQRSTUVWXYZ";

/// A uniformly random string of `len` decimal digits.
pub fn numeric_code(len: usize) -> String {
    let mut rng = OsRng;
    (0..len)
        .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
        .collect()
}

/// A uniformly random challenge string of `len` characters from [`CHALLENGE_ALPHABET`].
pub fn challenge_code(len: usize) -> String {
    let mut rng = OsRng;
    (0..len)
        .map(|_| char::from(CHALLENGE_ALPHABET[rng.gen_range(0..CHALLENGE_ALPHABET.len())]))
        .collect()
}

/// Constant-time equality for submitted codes.
pub fn codes_match(expected: &str, submitted: &str) -> bool {
    expected.as_bytes().ct_eq(submitted.as_bytes()).into()
}

/// Constant-time, ASCII case-insensitive equality.
pub fn codes_match_ignore_case(expected: &str, submitted: &str) -> bool {
    let expected = expected.to_ascii_uppercase();
    let submitted = submitted.to_ascii_uppercase();
    codes_match(&expected, &submitted)
}
