//! Interactive prompt for pasting `dt` dumps.
//!
//! Each dump is collected line by line until an empty line, then handed to
//! the converter. The prompt repeats until the user quits.

use anyhow::Result;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::{Config, Editor};
use tracing::debug;

const PROMPT: &str = "Enter dumped WinDbg data-type: ";

/// What the prompt should do after a line was read.
#[derive(Debug, PartialEq, Eq)]
pub enum Step {
    /// Keep reading lines of the current dump.
    Pending,
    /// A complete dump is ready for conversion.
    Ready(String),
    /// Leave the prompt.
    Quit,
}

/// Accumulates the lines of one pasted dump.
#[derive(Debug, Default)]
pub struct DumpBuffer {
    lines: Vec<String>,
}

impl DumpBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Feed one input line.
    pub fn push_line(&mut self, line: &str) -> Step {
        if is_quit(line) {
            return Step::Quit;
        }
        if line.trim().is_empty() {
            if self.lines.is_empty() {
                return Step::Quit;
            }
            let mut text = self.lines.join("\n");
            text.push('\n');
            self.lines.clear();
            return Step::Ready(text);
        }
        self.lines.push(line.to_string());
        Step::Pending
    }

    /// Drop whatever has been collected so far.
    pub fn clear(&mut self) {
        self.lines.clear();
    }
}

fn is_quit(line: &str) -> bool {
    matches!(
        line.trim().to_ascii_lowercase().as_str(),
        "q" | "x" | "quit" | "exit"
    )
}

/// Line-editing loop around a [`DumpBuffer`].
pub struct Prompt {
    editor: Editor<(), DefaultHistory>,
    buffer: DumpBuffer,
}

impl Prompt {
    pub fn new() -> Result<Self> {
        let config = Config::builder()
            .history_ignore_space(true)
            .auto_add_history(false)
            .build();

        let editor = Editor::with_config(config)?;

        Ok(Self {
            editor,
            buffer: DumpBuffer::new(),
        })
    }

    /// Run until the user quits, passing every complete dump to `convert`.
    pub fn run<F>(&mut self, mut convert: F) -> Result<()>
    where
        F: FnMut(&str) -> Result<String>,
    {
        println!("Paste a WinDbg `dt` dump and finish it with an empty line.");
        println!("Enter q to quit.");
        println!();

        loop {
            let prompt = if self.buffer.is_empty() { PROMPT } else { "" };

            match self.editor.readline(prompt) {
                Ok(line) => match self.buffer.push_line(&line) {
                    Step::Pending => {}
                    Step::Ready(text) => {
                        debug!(bytes = text.len(), "converting pasted dump");
                        match convert(&text) {
                            Ok(output) => println!("{}", output),
                            Err(e) => eprintln!("Error: {:#}", e),
                        }
                    }
                    Step::Quit => break,
                },
                Err(ReadlineError::Eof) => break,
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    self.buffer.clear();
                }
                Err(e) => {
                    eprintln!("Error reading input: {}", e);
                    break;
                }
            }
        }

        Ok(())
    }
}
