use serde::{Deserialize, Serialize};

/// Number of blob bytes rendered in a cell before the preview is cut.
pub const MAX_BLOB_PREVIEW: usize = 100;

/// Database value, one variant per SQLite storage class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
}

/// SQLite storage class of a stored value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageClass {
    Null,
    Integer,
    Float,
    Text,
    Blob,
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn storage_class(&self) -> StorageClass {
        match self {
            Value::Null => StorageClass::Null,
            Value::Int(_) => StorageClass::Integer,
            Value::Float(_) => StorageClass::Float,
            Value::Text(_) => StorageClass::Text,
            Value::Bytes(_) => StorageClass::Blob,
        }
    }

    /// Text as the engine would return it for the value, without any
    /// display substitutions.
    pub fn as_text(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => format_real(*f),
            Value::Text(s) => s.clone(),
            Value::Bytes(b) => String::from_utf8_lossy(b).into_owned(),
        }
    }

    pub fn as_i64(&self) -> i64 {
        match self {
            Value::Int(i) => *i,
            Value::Float(f) => *f as i64,
            Value::Text(s) => parse_leading_i64(s),
            Value::Bytes(b) => parse_leading_i64(&String::from_utf8_lossy(b)),
            Value::Null => 0,
        }
    }

    pub fn as_f64(&self) -> f64 {
        match self {
            Value::Int(i) => *i as f64,
            Value::Float(f) => *f,
            Value::Text(s) => parse_leading_f64(s),
            Value::Bytes(b) => parse_leading_f64(&String::from_utf8_lossy(b)),
            Value::Null => 0.0,
        }
    }

    /// Single-line rendering used by panel listings, the row editor and
    /// both export formats.
    ///
    /// NULL renders empty, control characters in text become spaces and
    /// blobs render as a length-prefixed hex preview.
    pub fn to_cell_text(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => format_real(*f),
            Value::Text(s) => s
                .chars()
                .map(|c| if c < ' ' { ' ' } else { c })
                .collect(),
            Value::Bytes(b) => blob_preview(b),
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_cell_text())
    }
}

/// `[<len>]:0x<hex>` over at most [`MAX_BLOB_PREVIEW`] bytes, with `...`
/// appended when the blob is longer.
pub fn blob_preview(bytes: &[u8]) -> String {
    let shown = &bytes[..bytes.len().min(MAX_BLOB_PREVIEW)];
    let mut out = format!("[{}]:0x{}", bytes.len(), hex::encode(shown));
    if bytes.len() > MAX_BLOB_PREVIEW {
        out.push_str("...");
    }
    out
}

/// Parses the longest integer prefix of `s` (after leading whitespace).
///
/// Input without a numeric prefix yields `0`; out-of-range values saturate.
pub fn parse_leading_i64(s: &str) -> i64 {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }
    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end == digits_start {
        return 0;
    }

    match s[..end].parse::<i64>() {
        Ok(v) => v,
        Err(_) if bytes[0] == b'-' => i64::MIN,
        Err(_) => i64::MAX,
    }
}

/// Parses the longest decimal floating point prefix of `s` (after leading
/// whitespace), independent of locale. No numeric prefix yields `0.0`.
pub fn parse_leading_f64(s: &str) -> f64 {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }

    let mut digits = 0;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
        digits += 1;
    }
    if end < bytes.len() && bytes[end] == b'.' {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
            digits += 1;
        }
    }
    if digits == 0 {
        return 0.0;
    }

    // Exponent only counts when at least one digit follows it.
    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && matches!(bytes[exp_end], b'+' | b'-') {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    s[..end].parse::<f64>().unwrap_or(0.0)
}

/// Significant digits the engine keeps when it turns a REAL into text.
const REAL_DIGITS: usize = 15;

/// Renders a REAL the way the engine's `%!.15g` conversion does: 15
/// significant digits, trailing zeros dropped but at least one fractional
/// digit kept, and `e+NN` notation outside `1e-4 ..= 1e15`.
fn format_real(f: f64) -> String {
    if f.is_nan() {
        return String::new();
    }
    if f.is_infinite() {
        return if f < 0.0 { "-Inf" } else { "Inf" }.to_string();
    }
    if f == 0.0 {
        return "0.0".to_string();
    }

    // "d.dddddddddddddde<exp>" rounded to REAL_DIGITS significant digits
    let scientific = format!("{:.*e}", REAL_DIGITS - 1, f.abs());
    let Some((mantissa, exp)) = scientific.split_once('e') else {
        return f.to_string();
    };
    let exp: i32 = exp.parse().unwrap_or(0);
    let digits: String = mantissa.chars().filter(char::is_ascii_digit).collect();

    let mut out = String::new();
    if f < 0.0 {
        out.push('-');
    }

    if exp < -4 || exp >= REAL_DIGITS as i32 {
        let (first, rest) = digits.split_at(1);
        out.push_str(first);
        out.push('.');
        out.push_str(fraction_or_zero(rest));
        out.push_str(&format!("e{}{:02}", if exp < 0 { '-' } else { '+' }, exp.abs()));
    } else if exp < 0 {
        out.push_str("0.");
        out.push_str(&"0".repeat((-exp - 1) as usize));
        out.push_str(digits.trim_end_matches('0'));
    } else {
        let (whole, rest) = digits.split_at(exp as usize + 1);
        out.push_str(whole);
        out.push('.');
        out.push_str(fraction_or_zero(rest));
    }
    out
}

fn fraction_or_zero(digits: &str) -> &str {
    match digits.trim_end_matches('0') {
        "" => "0",
        trimmed => trimmed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_renders_empty() {
        assert_eq!(Value::Null.to_cell_text(), "");
    }

    #[test]
    fn control_characters_become_spaces() {
        let value = Value::Text("line1\nline2\tend".to_string());
        assert_eq!(value.to_cell_text(), "line1 line2 end");
    }

    #[test]
    fn reals_keep_fraction_marker() {
        assert_eq!(Value::Float(3.0).to_cell_text(), "3.0");
        assert_eq!(Value::Float(2.5).to_cell_text(), "2.5");
    }

    #[test]
    fn reals_use_fifteen_significant_digits() {
        assert_eq!(format_real(0.1 + 0.2), "0.3");
        assert_eq!(format_real(1e20), "1.0e+20");
        assert_eq!(format_real(-1.5e-7), "-1.5e-07");
        assert_eq!(format_real(1e15), "1.0e+15");
        assert_eq!(format_real(123456789012345.0), "123456789012345.0");
        assert_eq!(format_real(0.0001), "0.0001");
        assert_eq!(format_real(1.0 / 3.0), "0.333333333333333");
        assert_eq!(format_real(-0.0), "0.0");
        assert_eq!(format_real(f64::INFINITY), "Inf");
    }

    #[test]
    fn short_blob_is_fully_rendered() {
        let value = Value::Bytes(vec![0xDE, 0xAD, 0xBE, 0xEF]);
        assert_eq!(value.to_cell_text(), "[4]:0xdeadbeef");
    }

    #[test]
    fn long_blob_preview_is_capped() {
        let preview = blob_preview(&[0xAB; 150]);

        assert!(preview.starts_with("[150]:0x"));
        assert!(preview.ends_with("..."));
        assert_eq!(preview.matches("ab").count(), MAX_BLOB_PREVIEW);
    }

    #[test]
    fn blob_of_exactly_preview_size_has_no_ellipsis() {
        let preview = blob_preview(&[0x01; MAX_BLOB_PREVIEW]);
        assert!(!preview.ends_with("..."));
    }

    #[test]
    fn integer_prefix_parsing_is_permissive() {
        assert_eq!(parse_leading_i64("42"), 42);
        assert_eq!(parse_leading_i64("  -17abc"), -17);
        assert_eq!(parse_leading_i64("12.9"), 12);
        assert_eq!(parse_leading_i64("abc"), 0);
        assert_eq!(parse_leading_i64(""), 0);
        assert_eq!(parse_leading_i64("99999999999999999999"), i64::MAX);
    }

    #[test]
    fn float_prefix_parsing_is_permissive() {
        assert_eq!(parse_leading_f64("3.25"), 3.25);
        assert_eq!(parse_leading_f64(" 1e3xyz"), 1000.0);
        assert_eq!(parse_leading_f64("2e"), 2.0);
        assert_eq!(parse_leading_f64("-.5"), -0.5);
        assert_eq!(parse_leading_f64("7."), 7.0);
        assert_eq!(parse_leading_f64("1,5"), 1.0);
        assert_eq!(parse_leading_f64("n/a"), 0.0);
    }

    #[test]
    fn text_values_coerce_like_the_engine() {
        assert_eq!(Value::Text("15 apples".into()).as_i64(), 15);
        assert_eq!(Value::Float(2.9).as_i64(), 2);
        assert_eq!(Value::Int(3).as_f64(), 3.0);
        assert_eq!(Value::Bytes(b"raw".to_vec()).as_text(), "raw");
    }

    #[test]
    fn storage_class_follows_variant() {
        assert_eq!(Value::Int(1).storage_class(), StorageClass::Integer);
        assert_eq!(Value::Bytes(vec![]).storage_class(), StorageClass::Blob);
        assert_eq!(Value::Null.storage_class(), StorageClass::Null);
    }
}
