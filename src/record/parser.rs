//! Device line parser
//!
//! Lines look like `ID: 42 | Time: 1.234 seconds`. The match is anchored at
//! the start of the line; anything after `seconds` is ignored. Whitespace
//! around the delimiters is optional.
//!
//! Anything else (boot banners, partial reads, noise) yields `None`. A
//! mismatch is the normal case for a noisy line and is never an error.

use once_cell::sync::Lazy;
use regex::Regex;

use super::entry::Reading;

static LINE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^ID:\s*([0-9]+)\s*\|\s*Time:\s*([0-9.]+)\s*seconds")
        .expect("line pattern is a valid regex")
});

/// Parse one line of device output
///
/// Returns `None` when the line does not match, when the id overflows `u64`,
/// or when the time field is not a finite number (e.g. `1.2.3`).
pub fn parse_line(line: &str) -> Option<Reading> {
    let caps = LINE_PATTERN.captures(line)?;

    let id = caps.get(1)?.as_str().parse::<u64>().ok()?;
    let time = caps.get(2)?.as_str().parse::<f64>().ok()?;

    if !time.is_finite() {
        return None;
    }

    Some(Reading::new(id, time))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_canonical_line() {
        let reading = parse_line("ID: 42 | Time: 1.234 seconds").unwrap();
        assert_eq!(reading.id, 42);
        assert_eq!(reading.time, 1.234);
    }

    #[test]
    fn test_parse_whitespace_variants() {
        let lines = [
            "ID:42|Time:1.234seconds",
            "ID:  42  |  Time:  1.234  seconds",
            "ID:\t42\t|\tTime:\t1.234\tseconds",
            "ID: 42 |Time: 1.234 seconds",
            "ID:42 | Time:1.234 seconds",
        ];

        for line in lines {
            let reading = parse_line(line).unwrap_or_else(|| panic!("no match: {line:?}"));
            assert_eq!(reading, Reading::new(42, 1.234), "line: {line:?}");
        }
    }

    #[test]
    fn test_parse_ignores_trailing_content() {
        let reading = parse_line("ID: 7 | Time: 0.5 seconds (lane 2)").unwrap();
        assert_eq!(reading, Reading::new(7, 0.5));
    }

    #[test]
    fn test_parse_integer_time() {
        let reading = parse_line("ID: 1 | Time: 12 seconds").unwrap();
        assert_eq!(reading.time, 12.0);
    }

    #[test]
    fn test_parse_requires_line_start() {
        assert!(parse_line("> ID: 42 | Time: 1.234 seconds").is_none());
        assert!(parse_line(" ID: 42 | Time: 1.234 seconds").is_none());
        assert!(parse_line("boot ok ID: 42 | Time: 1.234 seconds").is_none());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let lines = [
            "",
            "garbage noise",
            "ID: | Time: 1.234 seconds",
            "ID: 42 | Time: seconds",
            "ID: 42 Time: 1.234 seconds",
            "ID: 42 | Time: 1.234",
            "ID: -1 | Time: 1.234 seconds",
            "ID: 4x2 | Time: 1.234 seconds",
            "id: 42 | time: 1.234 seconds",
            "ID: 42 | Time: 1.234 secs",
        ];

        for line in lines {
            assert!(parse_line(line).is_none(), "unexpected match: {line:?}");
        }
    }

    #[test]
    fn test_parse_rejects_malformed_numbers() {
        assert!(parse_line("ID: 42 | Time: 1.2.3 seconds").is_none());
        assert!(parse_line("ID: 42 | Time: . seconds").is_none());
        assert!(parse_line("ID: 99999999999999999999999 | Time: 1.0 seconds").is_none());
    }

    #[test]
    fn test_parse_rejects_non_ascii_digits() {
        assert!(parse_line("ID: ٤٢ | Time: 1.0 seconds").is_none());
    }

    #[test]
    fn test_parse_large_id() {
        let line = format!("ID: {} | Time: 0.001 seconds", u64::MAX);
        assert_eq!(parse_line(&line).unwrap().id, u64::MAX);
    }
}
