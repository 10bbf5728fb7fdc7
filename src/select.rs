use std::io::{BufRead as _, Write as _};

use crate::error::MixreelResult;

/// Capability for choosing exactly one item from a named set.
///
/// `Ok(None)` is the explicit "none selected" signal (user abort); the
/// pipeline treats it as a clean early exit, never as an error.
pub trait ChoicePrompt {
    fn choose(&mut self, message: &str, choices: &[String]) -> MixreelResult<Option<usize>>;
}

/// Interactive prompt on stdin/stdout: numbered list, empty line or `q`
/// aborts.
#[derive(Debug, Default)]
pub struct TerminalPrompt;

impl TerminalPrompt {
    pub fn new() -> Self {
        Self
    }
}

impl ChoicePrompt for TerminalPrompt {
    fn choose(&mut self, message: &str, choices: &[String]) -> MixreelResult<Option<usize>> {
        if choices.is_empty() {
            return Ok(None);
        }

        let stdout = std::io::stdout();
        let stdin = std::io::stdin();

        {
            let mut out = stdout.lock();
            let _ = writeln!(out, "{message}");
            for (i, choice) in choices.iter().enumerate() {
                let _ = writeln!(out, "  {}) {choice}", i + 1);
            }
        }

        loop {
            {
                let mut out = stdout.lock();
                let _ = write!(out, "> ");
                let _ = out.flush();
            }

            let mut line = String::new();
            let read = stdin
                .lock()
                .read_line(&mut line)
                .map_err(|e| anyhow::anyhow!("failed to read selection: {e}"))?;
            if read == 0 {
                // EOF: nothing selected.
                return Ok(None);
            }

            match parse_choice(&line, choices.len()) {
                ParsedChoice::Pick(idx) => return Ok(Some(idx)),
                ParsedChoice::Abort => return Ok(None),
                ParsedChoice::Invalid => {
                    let mut out = stdout.lock();
                    let _ = writeln!(
                        out,
                        "enter a number between 1 and {}, or q to cancel",
                        choices.len()
                    );
                }
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ParsedChoice {
    Pick(usize),
    Abort,
    Invalid,
}

fn parse_choice(line: &str, len: usize) -> ParsedChoice {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("q") {
        return ParsedChoice::Abort;
    }
    match trimmed.parse::<usize>() {
        Ok(n) if (1..=len).contains(&n) => ParsedChoice::Pick(n - 1),
        _ => ParsedChoice::Invalid,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_map_to_zero_based_indices() {
        assert_eq!(parse_choice("1\n", 3), ParsedChoice::Pick(0));
        assert_eq!(parse_choice(" 3 \n", 3), ParsedChoice::Pick(2));
    }

    #[test]
    fn empty_or_q_aborts() {
        assert_eq!(parse_choice("\n", 3), ParsedChoice::Abort);
        assert_eq!(parse_choice("  \n", 3), ParsedChoice::Abort);
        assert_eq!(parse_choice("q\n", 3), ParsedChoice::Abort);
        assert_eq!(parse_choice("Q\n", 3), ParsedChoice::Abort);
    }

    #[test]
    fn out_of_range_or_garbage_is_invalid() {
        assert_eq!(parse_choice("0\n", 3), ParsedChoice::Invalid);
        assert_eq!(parse_choice("4\n", 3), ParsedChoice::Invalid);
        assert_eq!(parse_choice("abc\n", 3), ParsedChoice::Invalid);
        assert_eq!(parse_choice("-1\n", 3), ParsedChoice::Invalid);
    }
}
