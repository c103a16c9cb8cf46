//! Terminal prompts backing the interactive collaborators.
//!
//! Prompts are written to stderr and answers read line by line from stdin.
//! End of input, `q` or `exit` cancel the current step.

use std::io::{BufRead, Write};

use crate::bundle::{Chooser, Confirmer, MenuEntry, Selection};
use crate::error::{BundleError, Result};

/// Stdin/stderr prompt implementing [`Chooser`] and [`Confirmer`].
#[derive(Debug, Default, Clone, Copy)]
pub struct StdioPrompt;

impl StdioPrompt {
    /// Creates a stdio prompt.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Asks for a number, returning `default` on an empty answer.
    ///
    /// # Errors
    ///
    /// Returns `OperatorCancelled` on end of input or an exit request.
    pub fn number(self, question: &str, default: i64) -> Result<i64> {
        prompt_number(&mut std::io::stdin().lock(), &mut std::io::stderr(), question, default)
    }
}

impl Chooser for StdioPrompt {
    fn choose(&mut self, entries: &[MenuEntry]) -> Result<Selection> {
        prompt_choice(&mut std::io::stdin().lock(), &mut std::io::stderr(), entries)
    }
}

impl Confirmer for StdioPrompt {
    fn confirm_overcommit(&mut self, requested: u32, installed: u32) -> Result<bool> {
        prompt_overcommit(
            &mut std::io::stdin().lock(),
            &mut std::io::stderr(),
            requested,
            installed,
        )
    }
}

/// Reads one answer line. `None` means the operator cancelled.
fn read_answer<R: BufRead>(input: &mut R) -> Result<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    let answer = line.trim();
    if answer.eq_ignore_ascii_case("q") || answer.eq_ignore_ascii_case("exit") {
        return Ok(None);
    }
    Ok(Some(answer.to_string()))
}

/// Shows the bundle menu until a valid entry is picked.
///
/// # Errors
///
/// Returns `OperatorCancelled` on end of input or an exit request.
pub fn prompt_choice<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    entries: &[MenuEntry],
) -> Result<Selection> {
    let bundles = entries.len().saturating_sub(1);
    loop {
        writeln!(output, "\nSelect Virtual Machine configuration")?;
        for entry in entries {
            writeln!(output, "  {:>2}) {}", entry.tag, entry.label)?;
        }
        write!(output, "Choice: ")?;
        output.flush()?;

        let answer = read_answer(input)?.ok_or(BundleError::OperatorCancelled)?;
        if let Some(selection) = Selection::from_tag(&answer, bundles) {
            return Ok(selection);
        }
        writeln!(output, "Invalid choice '{answer}'")?;
    }
}

/// Asks the operator to approve CPU overcommit. Anything but `y`/`yes`
/// declines.
///
/// # Errors
///
/// Returns `OperatorCancelled` on end of input or an exit request.
pub fn prompt_overcommit<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    requested: u32,
    installed: u32,
) -> Result<bool> {
    write!(
        output,
        "The configuration requests {requested} vCPUs but the host has {installed} CPUs installed.\n\
         Overcommit CPUs? [y/N]: "
    )?;
    output.flush()?;

    let answer = read_answer(input)?.ok_or(BundleError::OperatorCancelled)?;
    Ok(answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes"))
}

/// Asks for a number until a valid one is typed.
///
/// # Errors
///
/// Returns `OperatorCancelled` on end of input or an exit request.
pub fn prompt_number<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    question: &str,
    default: i64,
) -> Result<i64> {
    loop {
        write!(output, "{question} [{default}]: ")?;
        output.flush()?;

        let answer = read_answer(input)?.ok_or(BundleError::OperatorCancelled)?;
        if answer.is_empty() {
            return Ok(default);
        }
        match answer.parse() {
            Ok(value) => return Ok(value),
            Err(_) => writeln!(output, "Not a number: '{answer}'")?,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DeployerError;
    use std::io::Cursor;

    fn entries() -> Vec<MenuEntry> {
        vec![
            MenuEntry {
                tag: String::from("1"),
                label: String::from("Test1"),
            },
            MenuEntry {
                tag: String::from("2"),
                label: String::from("Custom configuration"),
            },
        ]
    }

    #[test]
    fn test_choice_retries_until_valid() {
        let mut input = Cursor::new("\n7\n1\n");
        let mut output = Vec::new();

        let selection = prompt_choice(&mut input, &mut output, &entries()).unwrap();
        assert_eq!(selection, Selection::Bundle(0));

        let shown = String::from_utf8(output).unwrap();
        assert_eq!(shown.matches("Select Virtual Machine configuration").count(), 3);
        assert!(shown.contains("Invalid choice '7'"));
    }

    #[test]
    fn test_choice_custom_entry() {
        let mut input = Cursor::new("2\n");
        let selection = prompt_choice(&mut input, &mut Vec::new(), &entries()).unwrap();
        assert_eq!(selection, Selection::Custom);
    }

    #[test]
    fn test_choice_cancelled_on_eof() {
        let mut input = Cursor::new("");
        let err = prompt_choice(&mut input, &mut Vec::new(), &entries()).unwrap_err();
        assert!(matches!(err, DeployerError::Bundle(BundleError::OperatorCancelled)));
    }

    #[test]
    fn test_overcommit_answers() {
        assert!(prompt_overcommit(&mut Cursor::new("y\n"), &mut Vec::new(), 8, 4).unwrap());
        assert!(!prompt_overcommit(&mut Cursor::new("\n"), &mut Vec::new(), 8, 4).unwrap());
        assert!(prompt_overcommit(&mut Cursor::new("exit\n"), &mut Vec::new(), 8, 4).is_err());
    }

    #[test]
    fn test_number_default_and_retry() {
        assert_eq!(prompt_number(&mut Cursor::new("\n"), &mut Vec::new(), "CPUs", 2).unwrap(), 2);
        assert_eq!(
            prompt_number(&mut Cursor::new("many\n4\n"), &mut Vec::new(), "CPUs", 2).unwrap(),
            4
        );
    }
}
