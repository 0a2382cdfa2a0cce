use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;
use thiserror::Error;

pub const CPF_LENGTH: usize = 11;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CpfError {
    #[error("CPF must have 11 digits, found {0}")]
    WrongLength(usize),
    #[error("CPF digits are all identical")]
    RepeatedDigits,
    #[error("CPF check digit {position} does not match")]
    CheckDigitMismatch { position: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CpfValidation {
    pub valid: bool,
}

/// A CPF whose check digits have been verified. Holds the bare 11 digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Cpf {
    digits: String,
}

impl Cpf {
    pub fn parse(raw: &str) -> Result<Self, CpfError> {
        let digits = strip_non_digits(raw);
        verify_digits(&digits)?;
        Ok(Self { digits })
    }

    pub fn digits(&self) -> &str {
        &self.digits
    }
}

impl fmt::Display for Cpf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_mask(&self.digits))
    }
}

fn non_digit_pattern() -> &'static Regex {
    static NON_DIGIT_RE: OnceLock<Regex> = OnceLock::new();
    NON_DIGIT_RE.get_or_init(|| Regex::new(r"[^0-9]").expect("invalid non-digit regex"))
}

pub fn strip_non_digits(raw: &str) -> String {
    non_digit_pattern().replace_all(raw, "").into_owned()
}

pub fn check(raw: &str) -> Result<(), CpfError> {
    verify_digits(&strip_non_digits(raw))
}

pub fn is_valid(raw: &str) -> bool {
    check(raw).is_ok()
}

pub fn validate_cpf(raw: &str) -> CpfValidation {
    CpfValidation { valid: is_valid(raw) }
}

/// Form-field flavour of [`check`]: a blank field is left to the "required"
/// rule and reports no error here.
pub fn field_error(value: &str) -> Option<CpfError> {
    if value.trim().is_empty() {
        return None;
    }
    check(value).err()
}

fn verify_digits(digits: &str) -> Result<(), CpfError> {
    let values: Vec<u32> = digits.bytes().map(|b| u32::from(b - b'0')).collect();

    if values.len() != CPF_LENGTH {
        return Err(CpfError::WrongLength(values.len()));
    }

    if values.iter().all(|&d| d == values[0]) {
        return Err(CpfError::RepeatedDigits);
    }

    if check_digit(&values[..9]) != values[9] {
        return Err(CpfError::CheckDigitMismatch { position: 10 });
    }

    if check_digit(&values[..10]) != values[10] {
        return Err(CpfError::CheckDigitMismatch { position: 11 });
    }

    Ok(())
}

// Weights run from len+1 down to 2.
fn check_digit(prefix: &[u32]) -> u32 {
    let top = prefix.len() as u32 + 1;
    let sum: u32 = prefix
        .iter()
        .enumerate()
        .map(|(i, d)| d * (top - i as u32))
        .sum();
    let remainder = 11 - (sum % 11);
    if remainder < 10 { remainder } else { 0 }
}

/// Renders `###.###.###-##` progressively as digits are typed. Input with
/// more than 11 digits comes back as the bare digit string.
pub fn format_mask(raw: &str) -> String {
    let digits = strip_non_digits(raw);
    if digits.len() > CPF_LENGTH {
        return digits;
    }

    let mut masked = String::with_capacity(CPF_LENGTH + 3);
    for (i, c) in digits.chars().enumerate() {
        match i {
            3 | 6 => masked.push('.'),
            9 => masked.push('-'),
            _ => {}
        }
        masked.push(c);
    }
    masked
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn known_valid_cpf_passes() {
        assert!(is_valid("11144477735"));
        assert_eq!(validate_cpf("11144477735"), CpfValidation { valid: true });
    }

    #[test]
    fn corrupted_last_digit_fails() {
        assert_eq!(
            check("11144477736"),
            Err(CpfError::CheckDigitMismatch { position: 11 })
        );
        assert!(!validate_cpf("11144477736").valid);
    }

    #[test]
    fn corrupted_first_check_digit_fails() {
        assert_eq!(
            check("11144477745"),
            Err(CpfError::CheckDigitMismatch { position: 10 })
        );
    }

    #[test]
    fn punctuation_is_stripped_before_checking() {
        assert!(is_valid("111.444.777-35"));
        assert!(is_valid(" 111 444 777 35 "));
        assert!(is_valid("abc111x444y777z35"));
    }

    #[test]
    fn repeated_digits_are_rejected() {
        for d in 0..=9 {
            let cpf = d.to_string().repeat(11);
            assert_eq!(check(&cpf), Err(CpfError::RepeatedDigits));
        }
    }

    #[test]
    fn wrong_length_reports_digit_count() {
        assert_eq!(check("123.456"), Err(CpfError::WrongLength(6)));
        assert_eq!(check(""), Err(CpfError::WrongLength(0)));
        assert_eq!(check("111444777350"), Err(CpfError::WrongLength(12)));
    }

    #[test]
    fn remainder_of_ten_or_more_yields_zero_check_digit() {
        // 100.000.001-08: the first remainder is 10, so its check digit is 0.
        assert!(is_valid("10000000108"));
        assert!(is_valid("52998224725"));
    }

    #[test]
    fn blank_field_is_left_to_required_rule() {
        assert_eq!(field_error(""), None);
        assert_eq!(field_error("   "), None);
        assert_eq!(field_error("123"), Some(CpfError::WrongLength(3)));
        assert_eq!(field_error("111.444.777-35"), None);
    }

    #[test]
    fn parsed_cpf_displays_masked() {
        let cpf = Cpf::parse("11144477735").unwrap();
        assert_eq!(cpf.digits(), "11144477735");
        assert_eq!(cpf.to_string(), "111.444.777-35");
    }

    #[test]
    fn parse_rejects_invalid_cpf() {
        assert!(Cpf::parse("11111111111").is_err());
    }

    #[test]
    fn mask_groups_partial_input() {
        assert_eq!(format_mask(""), "");
        assert_eq!(format_mask("111"), "111");
        assert_eq!(format_mask("1114"), "111.4");
        assert_eq!(format_mask("111444"), "111.444");
        assert_eq!(format_mask("1114447"), "111.444.7");
        assert_eq!(format_mask("111444777"), "111.444.777");
        assert_eq!(format_mask("1114447773"), "111.444.777-3");
        assert_eq!(format_mask("11144477735"), "111.444.777-35");
    }

    #[test]
    fn mask_leaves_overlong_input_as_digits() {
        assert_eq!(format_mask("111.444.777-350"), "111444777350");
    }

    proptest! {
        #[test]
        fn mask_is_idempotent(s in "[0-9a-z .\\-]{0,20}") {
            let once = format_mask(&s);
            prop_assert_eq!(format_mask(&once), once);
        }

        #[test]
        fn wrong_digit_count_is_invalid(s in "[0-9]{0,10}|[0-9]{12,16}") {
            prop_assert!(!is_valid(&s));
        }

        #[test]
        fn validation_ignores_separators(s in "[0-9]{11}") {
            prop_assert_eq!(is_valid(&s), is_valid(&format_mask(&s)));
        }
    }
}
