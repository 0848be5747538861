//! Prompting for missing argument values.
//!
//! Registered via [`AppRunner::use_prompting`](crate::AppRunner::use_prompting),
//! the prompt unit runs after parsing and before binding: any in-scope
//! argument that requires at least one value, received none, and has no
//! usable default is asked for interactively. Answers are appended to the
//! parse result as prompt-sourced input values, so the binder treats them
//! like any other input (second only to argv in precedence).
//!
//! Collection arguments prompt repeatedly until a blank line. The loop
//! polls the cancellation token and stops promptly when it trips.

use std::collections::VecDeque;
use std::io::{BufRead, IsTerminal, Write};

use thiserror::Error;

/// Failure while collecting a prompted value.
#[derive(Debug, Error)]
pub enum PromptError {
    #[error("failed to read prompt input: {0}")]
    Io(#[from] std::io::Error),
}

/// Source of interactive answers.
///
/// [`StdPrompter`] is the production implementation; tests use
/// [`QueuedPrompter`] to replay scripted answers.
pub trait Prompter {
    /// False when the environment cannot prompt (input redirected away from
    /// a terminal). The prompt unit skips entirely in that case.
    fn is_available(&self) -> bool {
        true
    }

    /// Asks one question. `Ok(None)` means the user ended input (EOF),
    /// which cancels the run.
    fn prompt(&mut self, text: &str) -> Result<Option<String>, PromptError>;
}

/// Reads answers from the process's stdin.
#[derive(Debug, Default)]
pub struct StdPrompter;

impl StdPrompter {
    pub fn new() -> Self {
        Self
    }
}

impl Prompter for StdPrompter {
    fn is_available(&self) -> bool {
        std::io::stdin().is_terminal()
    }

    fn prompt(&mut self, text: &str) -> Result<Option<String>, PromptError> {
        let mut err = std::io::stderr().lock();
        write!(err, "{text}")?;
        err.flush()?;

        let mut line = String::new();
        let read = std::io::stdin().lock().read_line(&mut line)?;
        if read == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }
}

/// Replays scripted answers; records the prompt texts it was asked.
#[derive(Debug, Default)]
pub struct QueuedPrompter {
    answers: VecDeque<String>,
    asked: Vec<String>,
}

impl QueuedPrompter {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            asked: Vec::new(),
        }
    }

    /// The prompt texts asked so far.
    pub fn asked(&self) -> &[String] {
        &self.asked
    }
}

impl Prompter for QueuedPrompter {
    fn prompt(&mut self, text: &str) -> Result<Option<String>, PromptError> {
        self.asked.push(text.to_string());
        Ok(self.answers.pop_front())
    }
}
