//! Low-level delimited text handling: quote-aware field splitting plus
//! encoding and delimiter auto-detection.
//!
//! No schema logic here. The splitter knows nothing about columns or
//! types; it only turns raw lines into cleaned field strings.

use std::fmt;

// =============================================================================
// Split Errors
// =============================================================================

/// Error from the quote-aware field splitter.
///
/// The only structural failure a single line can have is a quoted field
/// that never closes before the end of the line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitError {
    /// Zero-based character position of the opening quote.
    pub quote_position: usize,
}

impl fmt::Display for SplitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unterminated quoted field (quote opened at character {})",
            self.quote_position + 1
        )
    }
}

impl std::error::Error for SplitError {}

// =============================================================================
// Line Extraction
// =============================================================================

/// Split content into lines on `\n` and drop the ones that are blank
/// after trimming. Line and row numbering downstream is based on this
/// filtered view, so files padded with empty lines stay stable.
pub fn content_lines(content: &str) -> Vec<&str> {
    content
        .split('\n')
        .filter(|line| !line.trim().is_empty())
        .collect()
}

// =============================================================================
// Field Splitting
// =============================================================================

/// Split a single line into fields, honoring double quotes.
///
/// Rules:
/// - an unquoted delimiter ends the current field
/// - a delimiter between quotes is literal data
/// - `""` inside a quoted field is an escaped quote character
/// - quote characters toggle quote mode and are not part of the field
///
/// Every field is cleaned on the way out: the first `\r` and the first
/// `\n` are removed (line endings leak into the last field of CRLF
/// files), then trailing whitespace is trimmed. Leading whitespace is
/// preserved.
///
/// # Example
/// ```ignore
/// use tabcheck::split_line;
///
/// let fields = split_line(r#"a,"b,c",d"#, ',').unwrap();
/// assert_eq!(fields, vec!["a", "b,c", "d"]);
/// ```
pub fn split_line(line: &str, delimiter: char) -> Result<Vec<String>, SplitError> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut quote_position = 0;

    let mut chars = line.chars().enumerate().peekable();
    while let Some((pos, c)) = chars.next() {
        if c == '"' {
            if in_quotes {
                if matches!(chars.peek(), Some((_, '"'))) {
                    // escaped quote, keep one and skip the second
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            } else {
                in_quotes = true;
                quote_position = pos;
            }
        } else if c == delimiter && !in_quotes {
            fields.push(clean_field(current));
            current = String::new();
        } else {
            current.push(c);
        }
    }

    if in_quotes {
        return Err(SplitError { quote_position });
    }

    fields.push(clean_field(current));
    Ok(fields)
}

/// Strip the first `\r` and the first `\n`, then right-trim.
fn clean_field(mut field: String) -> String {
    if let Some(pos) = field.find('\r') {
        field.remove(pos);
    }
    if let Some(pos) = field.find('\n') {
        field.remove(pos);
    }
    field.truncate(field.trim_end().len());
    field
}

// =============================================================================
// Auto-Detection
// =============================================================================

/// Detect the delimiter by counting candidate occurrences in the first line.
///
/// Candidates are comma, semicolon, tab and pipe. Falls back to comma
/// when none of them appear.
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let candidates = [',', ';', '\t', '|'];
    let mut best = ',';
    let mut best_count = 0;

    for &candidate in &candidates {
        let count = first_line.matches(candidate).count();
        if count > best_count {
            best_count = count;
            best = candidate;
        }
    }

    best
}

/// Detect the encoding of raw bytes using chardet.
pub fn detect_encoding(bytes: &[u8]) -> String {
    let (charset, _, _) = chardet::detect(bytes);

    // Normalize charset names
    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        other => other.to_string(),
    }
}

/// Decode bytes to a string using the given encoding name.
///
/// Unknown encodings and invalid byte sequences fall back to lossy
/// UTF-8, so decoding never fails; a mangled character in one cell is
/// preferable to rejecting the whole upload.
pub fn decode_content(bytes: &[u8], encoding: &str) -> String {
    match encoding.to_lowercase().as_str() {
        // windows-1252 is a superset of latin-1, safe for both
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" | "windows-1252" | "cp1252" => {
            encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned()
        }
        _ => String::from_utf8_lossy(bytes).into_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_simple() {
        let fields = split_line("a,b,c", ',').unwrap();
        assert_eq!(fields, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_split_semicolon() {
        let fields = split_line("Alice;30;Paris", ';').unwrap();
        assert_eq!(fields, vec!["Alice", "30", "Paris"]);
    }

    #[test]
    fn test_split_quoted_delimiter() {
        let fields = split_line(r#"a,"b,c",d"#, ',').unwrap();
        assert_eq!(fields, vec!["a", "b,c", "d"]);
    }

    #[test]
    fn test_split_escaped_quotes() {
        let fields = split_line(r#""say ""hi"" now",b"#, ',').unwrap();
        assert_eq!(fields, vec![r#"say "hi" now"#, "b"]);
    }

    #[test]
    fn test_split_empty_fields() {
        let fields = split_line("a,,c,", ',').unwrap();
        assert_eq!(fields, vec!["a", "", "c", ""]);
    }

    #[test]
    fn test_split_then_rejoin_round_trips() {
        // holds for any line without embedded quotes or quoted delimiters
        for line in ["a,b,c", "x,,y", "one", "Doe;John,30"] {
            let fields = split_line(line, ',').unwrap();
            assert_eq!(fields.join(","), line);
        }
    }

    #[test]
    fn test_split_preserves_leading_whitespace() {
        let fields = split_line("  a,b  ", ',').unwrap();
        assert_eq!(fields, vec!["  a", "b"]);
    }

    #[test]
    fn test_split_strips_carriage_return() {
        // last field of a CRLF line carries the \r
        let fields = split_line("a,b\r", ',').unwrap();
        assert_eq!(fields, vec!["a", "b"]);
    }

    #[test]
    fn test_split_unterminated_quote() {
        let err = split_line(r#"a,"oops"#, ',').unwrap_err();
        assert_eq!(err.quote_position, 2);
        assert!(err.to_string().contains("unterminated"));
    }

    #[test]
    fn test_content_lines_filters_blanks() {
        let lines = content_lines("a,b\n\n1,2\n   \n3,4\n");
        assert_eq!(lines, vec!["a,b", "1,2", "3,4"]);
    }

    #[test]
    fn test_content_lines_empty() {
        assert!(content_lines("").is_empty());
        assert!(content_lines("\n\n  \n").is_empty());
    }

    #[test]
    fn test_detect_delimiter_comma() {
        assert_eq!(detect_delimiter("a,b,c\n1,2,3"), ',');
    }

    #[test]
    fn test_detect_delimiter_semicolon() {
        assert_eq!(detect_delimiter("a;b;c\n1;2;3"), ';');
    }

    #[test]
    fn test_detect_delimiter_tab() {
        assert_eq!(detect_delimiter("a\tb\tc"), '\t');
    }

    #[test]
    fn test_detect_delimiter_pipe() {
        assert_eq!(detect_delimiter("a|b|c"), '|');
    }

    #[test]
    fn test_detect_delimiter_fallback() {
        assert_eq!(detect_delimiter("single-column"), ',');
    }

    #[test]
    fn test_latin1_decoding() {
        // "Société" in ISO-8859-1
        let bytes: &[u8] = &[0x53, 0x6F, 0x63, 0x69, 0xE9, 0x74, 0xE9];
        let decoded = decode_content(bytes, "iso-8859-1");
        assert_eq!(decoded, "Société");
    }

    #[test]
    fn test_unknown_encoding_is_lossy_utf8() {
        let decoded = decode_content("héllo".as_bytes(), "koi8-r");
        assert!(decoded.contains("llo"));
    }
}
