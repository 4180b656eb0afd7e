//! Date template compilation and calendar checks.
//!
//! Date columns can carry a template pattern such as `YYYY-MM-DD` or
//! `M/D/YYYY`. Templates are compiled into anchored regexes with one
//! capture group per date component, so a matching value can be taken
//! apart again and checked against the real calendar (chrono), catching
//! rollover dates like `2023-02-30` that are shape-valid but do not
//! exist.
//!
//! Independently of any template, values must land in one of six
//! generic date shapes before they are considered dates at all.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

/// One captured component of a compiled template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Component {
    /// `yyyy`, four digits.
    Year4,
    /// `yy`, two digits, resolved as 2000 + yy for the calendar check.
    Year2,
    /// `MM` (two digits) or `M` (one or two).
    Month,
    /// `dd` (two digits) or `d` (one or two).
    Day,
}

/// A compiled date template: anchored regex plus component order.
#[derive(Debug)]
pub(crate) struct DateTemplate {
    regex: Regex,
    components: Vec<Component>,
}

impl DateTemplate {
    /// Whether the value matches the template shape *and* names a date
    /// that exists on the calendar.
    pub(crate) fn matches(&self, value: &str) -> bool {
        let caps = match self.regex.captures(value) {
            Some(caps) => caps,
            None => return false,
        };

        // components missing from the template default to a valid date part
        let mut year: i32 = 2000;
        let mut month: u32 = 1;
        let mut day: u32 = 1;

        for (i, component) in self.components.iter().enumerate() {
            let text = caps.get(i + 1).map(|m| m.as_str()).unwrap_or("");
            match component {
                Component::Year4 => year = text.parse().unwrap_or(0),
                Component::Year2 => year = 2000 + text.parse::<i32>().unwrap_or(0),
                Component::Month => month = text.parse().unwrap_or(0),
                Component::Day => day = text.parse().unwrap_or(0),
            }
        }

        NaiveDate::from_ymd_opt(year, month, day).is_some()
    }
}

/// Compile a date template into a [`DateTemplate`].
///
/// Recognized tokens: `yyyy`, `yy`, `MM`, `M`, `dd`, `d` (year and day
/// tokens are case-insensitive). Everything else passes through into
/// the regex verbatim, so a template containing stray regex
/// metacharacters can fail to compile; callers surface that as an
/// invalid date pattern.
pub(crate) fn compile_template(template: &str) -> Result<DateTemplate, regex::Error> {
    let chars: Vec<char> = template.chars().collect();
    let mut pattern = String::from("^");
    let mut components = Vec::new();

    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c.eq_ignore_ascii_case(&'y') {
            let run = token_run(&chars, i, |x| x.eq_ignore_ascii_case(&'y'));
            if run >= 4 {
                pattern.push_str(r"(\d{4})");
                components.push(Component::Year4);
            } else {
                pattern.push_str(r"(\d{2})");
                components.push(Component::Year2);
            }
            i += run;
        } else if c == 'M' || c == 'm' {
            let run = token_run(&chars, i, |x| x == 'M' || x == 'm');
            if run >= 2 {
                pattern.push_str(r"(\d{2})");
            } else {
                pattern.push_str(r"(\d{1,2})");
            }
            components.push(Component::Month);
            i += run;
        } else if c.eq_ignore_ascii_case(&'d') {
            let run = token_run(&chars, i, |x| x.eq_ignore_ascii_case(&'d'));
            if run >= 2 {
                pattern.push_str(r"(\d{2})");
            } else {
                pattern.push_str(r"(\d{1,2})");
            }
            components.push(Component::Day);
            i += run;
        } else {
            pattern.push(c);
            i += 1;
        }
    }

    pattern.push('$');
    let regex = Regex::new(&pattern)?;
    Ok(DateTemplate { regex, components })
}

fn token_run(chars: &[char], start: usize, matches: impl Fn(char) -> bool) -> usize {
    chars[start..].iter().take_while(|&&c| matches(c)).count()
}

/// Example value for a known template, used as the `expected_format`
/// hint on mismatches.
pub(crate) fn template_hint(template: &str) -> String {
    let known: &[(&str, &str)] = &[
        ("YYYY-MM-DD", "2023-01-15"),
        ("YYYY/MM/DD", "2023/01/15"),
        ("MM/DD/YYYY", "01/15/2023"),
        ("MM-DD-YYYY", "01-15-2023"),
        ("DD/MM/YYYY", "15/01/2023"),
        ("DD-MM-YYYY", "15-01-2023"),
        ("M/D/YYYY", "1/15/2023"),
        ("M-D-YYYY", "1-15-2023"),
    ];

    let normalized = template.to_uppercase();
    for (name, example) in known {
        if normalized == *name {
            return format!("{} (e.g. {})", name, example);
        }
    }
    template.to_string()
}

// =============================================================================
// Generic Date Shapes
// =============================================================================

#[derive(Debug, Clone, Copy)]
enum ShapeOrder {
    YearMonthDay,
    MonthDayYear,
}

/// The six shapes a value must land in to count as a date at all.
/// Two-part numeric shapes (2-2-4 and 1..2-1..2-4) read as month/day/year.
static GENERIC_SHAPES: Lazy<Vec<(Regex, ShapeOrder)>> = Lazy::new(|| {
    [
        (r"^(\d{4})-(\d{2})-(\d{2})$", ShapeOrder::YearMonthDay),
        (r"^(\d{2})/(\d{2})/(\d{4})$", ShapeOrder::MonthDayYear),
        (r"^(\d{2})-(\d{2})-(\d{4})$", ShapeOrder::MonthDayYear),
        (r"^(\d{4})/(\d{2})/(\d{2})$", ShapeOrder::YearMonthDay),
        (r"^(\d{1,2})/(\d{1,2})/(\d{4})$", ShapeOrder::MonthDayYear),
        (r"^(\d{1,2})-(\d{1,2})-(\d{4})$", ShapeOrder::MonthDayYear),
    ]
    .into_iter()
    .map(|(pattern, order)| {
        (Regex::new(pattern).expect("valid date shape regex"), order)
    })
    .collect()
});

/// Hint listing the generic shapes, for `INVALID_DATE` findings.
pub(crate) const GENERIC_SHAPES_HINT: &str =
    "YYYY-MM-DD, MM/DD/YYYY, MM-DD-YYYY, YYYY/MM/DD, M/D/YYYY or M-D-YYYY";

/// Parse a value against the generic shapes, returning the calendar
/// date when one shape matches and the components exist on the calendar.
pub(crate) fn parse_generic_date(value: &str) -> Option<NaiveDate> {
    for (regex, order) in GENERIC_SHAPES.iter() {
        if let Some(caps) = regex.captures(value) {
            let (year, month, day) = match order {
                ShapeOrder::YearMonthDay => (&caps[1], &caps[2], &caps[3]),
                ShapeOrder::MonthDayYear => (&caps[3], &caps[1], &caps[2]),
            };
            // shape matched but rolled over: keep trying narrower shapes
            if let Some(date) = NaiveDate::from_ymd_opt(
                year.parse().ok()?,
                month.parse().ok()?,
                day.parse().ok()?,
            ) {
                return Some(date);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iso_template() {
        let tpl = compile_template("YYYY-MM-DD").unwrap();
        assert!(tpl.matches("2023-01-15"));
        assert!(!tpl.matches("01/15/2023"));
        assert!(!tpl.matches("2023-1-15"));
    }

    #[test]
    fn test_template_catches_rollover() {
        let tpl = compile_template("YYYY-MM-DD").unwrap();
        assert!(!tpl.matches("2023-02-30"));
        assert!(!tpl.matches("2023-13-01"));
        // leap years
        assert!(tpl.matches("2024-02-29"));
        assert!(!tpl.matches("2023-02-29"));
    }

    #[test]
    fn test_single_digit_tokens() {
        let tpl = compile_template("M/D/YYYY").unwrap();
        assert!(tpl.matches("1/15/2023"));
        assert!(tpl.matches("01/15/2023"));
        assert!(!tpl.matches("1/15/23"));
    }

    #[test]
    fn test_two_digit_year() {
        let tpl = compile_template("dd/MM/yy").unwrap();
        assert!(tpl.matches("15/01/23"));
        assert!(!tpl.matches("15/01/2023"));
        // 29/02/23 resolves to 2023-02-29, which does not exist
        assert!(!tpl.matches("29/02/23"));
        assert!(tpl.matches("29/02/24"));
    }

    #[test]
    fn test_day_month_template() {
        let tpl = compile_template("DD/MM/YYYY").unwrap();
        // day 30, month 01
        assert!(tpl.matches("30/01/2023"));
        // day 01, month 30 does not exist
        assert!(!tpl.matches("01/30/2023"));
    }

    #[test]
    fn test_lowercase_template_tokens() {
        let tpl = compile_template("yyyy-mm-dd").unwrap();
        assert!(tpl.matches("2023-01-15"));
    }

    #[test]
    fn test_bad_template_fails_compilation() {
        assert!(compile_template("yyyy-MM-dd (").is_err());
    }

    #[test]
    fn test_template_hint_known() {
        let hint = template_hint("yyyy-MM-dd");
        assert!(hint.contains("YYYY-MM-DD"));
        assert!(hint.contains("2023-01-15"));
    }

    #[test]
    fn test_template_hint_unknown_passthrough() {
        assert_eq!(template_hint("Qx yyyy"), "Qx yyyy");
    }

    #[test]
    fn test_generic_iso() {
        assert_eq!(
            parse_generic_date("2023-01-15"),
            NaiveDate::from_ymd_opt(2023, 1, 15)
        );
    }

    #[test]
    fn test_generic_us_shapes() {
        assert!(parse_generic_date("01/15/2023").is_some());
        assert!(parse_generic_date("01-15-2023").is_some());
        assert!(parse_generic_date("1/15/2023").is_some());
        assert!(parse_generic_date("1-15-2023").is_some());
        assert!(parse_generic_date("2023/01/15").is_some());
    }

    #[test]
    fn test_generic_rejects_rollover() {
        assert!(parse_generic_date("2023-02-30").is_none());
        assert!(parse_generic_date("13/45/2023").is_none());
    }

    #[test]
    fn test_generic_rejects_other_text() {
        assert!(parse_generic_date("not a date").is_none());
        assert!(parse_generic_date("2023.01.15").is_none());
        assert!(parse_generic_date("15/01/2023 10:30").is_none());
        assert!(parse_generic_date("").is_none());
    }

    #[test]
    fn test_generic_two_part_shapes_are_month_first() {
        // 25/12/2023 only parses if 25 were a month, which it is not
        assert!(parse_generic_date("25/12/2023").is_none());
        assert!(parse_generic_date("12/25/2023").is_some());
    }
}
