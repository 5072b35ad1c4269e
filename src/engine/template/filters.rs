//! Template filters.
//!
//! A filter takes the resolved value of a substitution and transforms it.
//! Filters return an Option instead of a Result on purpose: they are a
//! side-channel, and a broken side-channel must not take the whole render
//! down with it. A `None` renders as the empty string and the reason lands
//! in the log.
use log::warn;
use std::process::Command;

pub trait Filter {
    fn apply(&self, input: &str) -> Option<String>;
}

/// Runs its input as a shell command and substitutes the captured stdout.
///
/// `select a from t where host = "[ "hostname" | popen ]"` embeds the local
/// hostname into the query. The child is always waited on, whatever happens;
/// a failed spawn or a non-zero exit logs a warning and yields nothing.
pub struct Popen;

impl Filter for Popen {
    fn apply(&self, command: &str) -> Option<String> {
        let words = shell_words(command);
        let (program, arguments) = words.split_first()?;

        // Command::output() waits for the child and reaps it on every path.
        match Command::new(program).args(arguments).output() {
            Ok(output) if output.status.success() => {
                Some(String::from_utf8_lossy(&output.stdout).into_owned())
            }
            Ok(output) => {
                warn!(
                    "Warning, template subprocess `{}` exited with {}",
                    command, output.status
                );
                None
            }
            Err(error) => {
                warn!(
                    "Warning, template subprocess `{}` failed to start: {}",
                    command, error
                );
                None
            }
        }
    }
}

/// Splits a command line into words, honoring quotes and backslashes, roughly
/// the way a shell would. Unterminated quotes take everything to the end of
/// the input; this is a best-effort filter, not a shell.
fn shell_words(input: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current: Option<String> = None;
    let mut chars = input.chars();

    while let Some(c) = chars.next() {
        match c {
            ' ' | '\t' => {
                if let Some(word) = current.take() {
                    words.push(word);
                }
            }
            '\'' | '"' => {
                let quote = c;
                let word = current.get_or_insert_with(String::new);
                for inner in chars.by_ref() {
                    if inner == quote {
                        break;
                    }
                    word.push(inner);
                }
            }
            '\\' => {
                if let Some(escaped) = chars.next() {
                    current.get_or_insert_with(String::new).push(escaped);
                }
            }
            other => current.get_or_insert_with(String::new).push(other),
        }
    }

    if let Some(word) = current {
        words.push(word);
    }

    words
}
