//! Symbol list and refresh interval resolution

use std::collections::HashSet;
use std::io::{self, BufRead, Write};
use std::time::Duration;

/// Split a comma separated list into uppercased, de-duplicated symbols.
///
/// Falls back to `defaults` when the input holds no symbol at all.
pub fn parse_symbols(input: &str, defaults: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    let symbols: Vec<String> = input
        .split(',')
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .filter(|s| seen.insert(s.clone()))
        .collect();

    if symbols.is_empty() {
        defaults.to_vec()
    } else {
        symbols
    }
}

/// Whole, positive number of seconds
pub fn parse_interval(input: &str) -> Option<Duration> {
    match input.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Some(Duration::from_secs(secs)),
        _ => None,
    }
}

/// Interval chosen from user input, remembering whether the default kicked in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntervalChoice {
    pub interval: Duration,
    pub defaulted: bool,
}

impl IntervalChoice {
    pub fn resolve(input: &str, default: Duration) -> Self {
        match parse_interval(input) {
            Some(interval) => Self {
                interval,
                defaulted: false,
            },
            None => Self {
                interval: default,
                defaulted: true,
            },
        }
    }

    pub fn warning(&self) -> Option<String> {
        self.defaulted.then(|| {
            format!(
                "⚠️ Invalid input. Using default interval: {} seconds.",
                self.interval.as_secs()
            )
        })
    }
}

fn read_answer<R: BufRead, W: Write>(input: &mut R, output: &mut W, prompt: &str) -> io::Result<String> {
    write!(output, "{prompt}")?;
    output.flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(line.trim().to_string())
}

/// Ask for the symbol list
pub fn prompt_symbols<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    defaults: &[String],
) -> io::Result<Vec<String>> {
    let answer = read_answer(
        input,
        output,
        "Enter stock symbols separated by commas (or press Enter to use defaults): ",
    )?;
    Ok(parse_symbols(&answer, defaults))
}

/// Ask for the refresh interval, warning on invalid input
pub fn prompt_interval<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    default: Duration,
) -> io::Result<Duration> {
    let answer = read_answer(
        input,
        output,
        &format!(
            "Enter refresh interval in seconds (e.g., {}): ",
            default.as_secs()
        ),
    )?;

    let choice = IntervalChoice::resolve(&answer, default);
    if let Some(warning) = choice.warning() {
        tracing::warn!(input = %answer, "invalid refresh interval, using default");
        writeln!(output, "{warning}")?;
    }
    Ok(choice.interval)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn defaults() -> Vec<String> {
        vec!["AAPL".to_string(), "KO".to_string()]
    }

    #[test]
    fn test_parse_symbols() {
        assert_eq!(
            parse_symbols(" msft, ibm ,,MSFT, nvda", &defaults()),
            vec!["MSFT", "IBM", "NVDA"]
        );
        assert_eq!(parse_symbols("", &defaults()), defaults());
        assert_eq!(parse_symbols(" , ,", &defaults()), defaults());
    }

    #[test]
    fn test_parse_interval() {
        assert_eq!(parse_interval("15"), Some(Duration::from_secs(15)));
        assert_eq!(parse_interval(" 3 \n"), Some(Duration::from_secs(3)));
        assert_eq!(parse_interval("abc"), None);
        assert_eq!(parse_interval("0"), None);
        assert_eq!(parse_interval("-5"), None);
        assert_eq!(parse_interval("2.5"), None);
    }

    #[test]
    fn test_invalid_interval_uses_default_with_warning() {
        let mut input = Cursor::new("abc\n");
        let mut output = Vec::new();

        let interval = prompt_interval(&mut input, &mut output, Duration::from_secs(10)).unwrap();

        assert_eq!(interval, Duration::from_secs(10));
        let shown = String::from_utf8(output).unwrap();
        assert!(shown.contains("Invalid input. Using default interval: 10 seconds."));
    }

    #[test]
    fn test_valid_interval_has_no_warning() {
        let choice = IntervalChoice::resolve("30", Duration::from_secs(10));
        assert_eq!(choice.interval, Duration::from_secs(30));
        assert!(choice.warning().is_none());
    }

    #[test]
    fn test_prompt_symbols_reads_line() {
        let mut input = Cursor::new("tsla, goog\n");
        let mut output = Vec::new();

        let symbols = prompt_symbols(&mut input, &mut output, &defaults()).unwrap();

        assert_eq!(symbols, vec!["TSLA", "GOOG"]);
        assert!(String::from_utf8(output).unwrap().starts_with("Enter stock symbols"));
    }

    #[test]
    fn test_prompt_symbols_eof_uses_defaults() {
        let mut input = Cursor::new("");
        let mut output = Vec::new();
        let symbols = prompt_symbols(&mut input, &mut output, &defaults()).unwrap();
        assert_eq!(symbols, defaults());
    }
}
