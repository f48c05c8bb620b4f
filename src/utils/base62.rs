//! Base-62 encoding for short codes.
//!
//! Codes are produced from a monotonically increasing database sequence, so
//! uniqueness is guaranteed by the sequence and the encoding only has to be
//! a stable bijection. The alphabet is `0-9A-Za-z`, most significant digit
//! first, with `encode(0) == "0"`.

const ALPHABET: &[u8; 62] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

const BASE: u64 = 62;

/// Encodes a non-negative integer as a base-62 string.
pub fn encode(mut n: u64) -> String {
    if n == 0 {
        return "0".to_string();
    }

    let mut digits = Vec::new();
    while n > 0 {
        digits.push(ALPHABET[(n % BASE) as usize]);
        n /= BASE;
    }
    digits.reverse();

    // The alphabet is pure ASCII.
    String::from_utf8(digits).expect("base62 alphabet is valid UTF-8")
}

/// Decodes a base-62 string back into an integer.
///
/// Returns `None` if the input is empty or contains a character outside the
/// alphabet.
pub fn decode(s: &str) -> Option<u64> {
    if s.is_empty() {
        return None;
    }

    let mut value: u64 = 0;
    for b in s.bytes() {
        let digit = match b {
            b'0'..=b'9' => b - b'0',
            b'A'..=b'Z' => b - b'A' + 10,
            b'a'..=b'z' => b - b'a' + 36,
            _ => return None,
        };
        value = value.checked_mul(BASE)?.checked_add(digit as u64)?;
    }

    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_zero() {
        assert_eq!(encode(0), "0");
    }

    #[test]
    fn test_encode_single_digits() {
        assert_eq!(encode(9), "9");
        assert_eq!(encode(10), "A");
        assert_eq!(encode(35), "Z");
        assert_eq!(encode(36), "a");
        assert_eq!(encode(61), "z");
    }

    #[test]
    fn test_encode_rollover() {
        assert_eq!(encode(62), "10");
        assert_eq!(encode(63), "11");
        assert_eq!(encode(62 * 62), "100");
    }

    #[test]
    fn test_encode_is_most_significant_first() {
        // 12345 = 3*62^2 + 13*62 + 11 -> "3", "D", "B"
        assert_eq!(encode(12345), "3DB");
    }

    #[test]
    fn test_decode_round_trip() {
        for n in [0u64, 1, 61, 62, 63, 3843, 3844, 12345, 999_999_999, u64::MAX] {
            assert_eq!(decode(&encode(n)), Some(n), "round trip failed for {}", n);
        }
    }

    #[test]
    fn test_decode_rejects_invalid_input() {
        assert_eq!(decode(""), None);
        assert_eq!(decode("abc-"), None);
        assert_eq!(decode("hello world"), None);
    }

    #[test]
    fn test_decode_rejects_overflow() {
        // One digit longer than encode(u64::MAX).
        let too_big = format!("{}0", encode(u64::MAX));
        assert_eq!(decode(&too_big), None);
    }

    #[test]
    fn test_sequential_inputs_give_distinct_codes() {
        let mut seen = std::collections::HashSet::new();
        for n in 0..10_000u64 {
            assert!(seen.insert(encode(n)));
        }
    }
}
