//! Check-digit math for securities identifiers.
//!
//! Both schemes expand letters to two-digit numbers (A=10 … Z=35) before
//! summing. Input is trimmed and upper-cased; anything outside ASCII fails.

const ISIN_LEN: usize = 12;
const CUSIP_LEN: usize = 9;

/// 0-9 for digits, 10-35 for A-Z.
fn char_value(c: u8) -> Option<u32> {
    match c {
        b'0'..=b'9' => Some(u32::from(c - b'0')),
        b'A'..=b'Z' => Some(u32::from(c - b'A') + 10),
        _ => None,
    }
}

fn normalize(value: &str) -> Option<Vec<u8>> {
    let value = value.trim();
    if !value.is_ascii() {
        return None;
    }
    Some(value.to_ascii_uppercase().into_bytes())
}

fn check_char(digit: u32) -> u8 {
    b'0' + digit as u8
}

/// Check digit over the first 11 characters of an ISIN.
///
/// Letters expand to their two-digit values; over the resulting digit string,
/// every other digit starting at the rightmost is doubled (minus 9 when above 9).
pub fn isin_check_digit(body: &[u8]) -> Option<u32> {
    let mut digits = Vec::with_capacity(body.len() * 2);
    for &c in body {
        let v = char_value(c)?;
        if v >= 10 {
            digits.push(v / 10);
        }
        digits.push(v % 10);
    }

    let total: u32 = digits
        .iter()
        .rev()
        .enumerate()
        .map(|(i, &d)| {
            if i % 2 == 0 {
                let doubled = d * 2;
                if doubled > 9 { doubled - 9 } else { doubled }
            } else {
                d
            }
        })
        .sum();

    Some((10 - total % 10) % 10)
}

/// Two-letter country code, nine alphanumerics, one check digit.
pub fn is_valid_isin(value: &str) -> bool {
    let Some(isin) = normalize(value) else {
        return false;
    };
    if isin.len() != ISIN_LEN {
        return false;
    }
    if !isin[..2].iter().all(u8::is_ascii_alphabetic) {
        return false;
    }
    if !isin[2..ISIN_LEN - 1].iter().all(u8::is_ascii_alphanumeric) {
        return false;
    }
    isin_check_digit(&isin[..ISIN_LEN - 1])
        .is_some_and(|d| check_char(d) == isin[ISIN_LEN - 1])
}

/// Check digit over the first 8 characters of a CUSIP.
///
/// Values at odd (0-based) positions are doubled; the decimal digits of every
/// value are summed.
pub fn cusip_check_digit(body: &[u8]) -> Option<u32> {
    let mut total = 0;
    for (i, &c) in body.iter().enumerate() {
        let mut v = char_value(c)?;
        if i % 2 == 1 {
            v *= 2;
        }
        total += v / 10 + v % 10;
    }
    Some((10 - total % 10) % 10)
}

/// Eight alphanumerics followed by one check digit.
pub fn is_valid_cusip(value: &str) -> bool {
    let Some(cusip) = normalize(value) else {
        return false;
    };
    if cusip.len() != CUSIP_LEN {
        return false;
    }
    if !cusip[..CUSIP_LEN - 1].iter().all(u8::is_ascii_alphanumeric) {
        return false;
    }
    cusip_check_digit(&cusip[..CUSIP_LEN - 1])
        .is_some_and(|d| check_char(d) == cusip[CUSIP_LEN - 1])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_isins_validate() {
        for isin in ["US0378331005", "GB0002634946", "US5949181045", "DE000BAY0017", "AU0000XVGZA3"] {
            assert!(is_valid_isin(isin), "{isin} should be valid");
        }
    }

    #[test]
    fn isin_is_case_and_whitespace_insensitive() {
        assert!(is_valid_isin(" us0378331005 "));
    }

    #[test]
    fn isin_wrong_check_digit() {
        assert!(!is_valid_isin("US0378331006"));
    }

    #[test]
    fn every_other_isin_check_digit_fails() {
        let body = &b"US037833100"[..];
        let correct = isin_check_digit(body).unwrap();
        for d in 0..10u32 {
            let candidate = format!("US037833100{d}");
            assert_eq!(is_valid_isin(&candidate), d == correct, "{candidate}");
        }
    }

    #[test]
    fn isin_shape_errors() {
        assert!(!is_valid_isin("US037833100"));    // too short
        assert!(!is_valid_isin("US03783310055"));  // too long
        assert!(!is_valid_isin("1S0378331005"));   // country code not alphabetic
        assert!(!is_valid_isin("US03783-1005"));   // punctuation in body
        assert!(!is_valid_isin("US037833100X"));   // non-digit check character
        assert!(!is_valid_isin("ÜS0378331005"));
        assert!(!is_valid_isin(""));
    }

    #[test]
    fn apple_cusip() {
        assert!(is_valid_cusip("037833100"));
        assert!(!is_valid_cusip("037833101"));
    }

    #[test]
    fn cusips_with_letters() {
        assert!(is_valid_cusip("38259P508"));
        assert!(is_valid_cusip("68389X105"));
        assert!(is_valid_cusip("68389x105"));
        assert!(!is_valid_cusip("38259P509"));
    }

    #[test]
    fn cusip_shape_errors() {
        assert!(!is_valid_cusip("03783310"));
        assert!(!is_valid_cusip("0378331000"));
        assert!(!is_valid_cusip("0378-3100"));
        assert!(!is_valid_cusip("03783310A"));
    }
}
