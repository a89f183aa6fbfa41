//! Terminal implementations of the progress and prompt capabilities.
//!
//! Progress lines go to stderr so stdout carries only command output. Ctrl+C
//! during a run sets a shared flag that the runner polls between files.

use crate::capabilities::{ProgressSink, PromptAnswer, UserPrompt};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, warn};

/// Progress reporting on stderr with a Ctrl+C cancel flag.
#[derive(Debug, Clone, Default)]
pub struct TerminalProgress {
    cancelled: Arc<AtomicBool>,
    visible: bool,
    files: Vec<PathBuf>,
}

impl TerminalProgress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route Ctrl+C to this progress window's cancel flag.
    ///
    /// Can only be called once per process.
    pub fn install_ctrlc_handler(&self) -> Result<(), ctrlc::Error> {
        let flag = Arc::clone(&self.cancelled);
        ctrlc::set_handler(move || {
            flag.store(true, Ordering::SeqCst);
        })
    }

    /// Shared cancel flag.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }
}

impl ProgressSink for TerminalProgress {
    fn show_run(&mut self, title: &str) {
        self.visible = true;
        eprintln!("{}", title);
    }

    fn show_files(&mut self, files: &[PathBuf]) {
        self.files = files.to_vec();
    }

    fn advance(&mut self, index: usize, total: usize) {
        match self.files.get(index) {
            Some(path) => eprintln!("[{}/{}] {}", index + 1, total, path.display()),
            None => eprintln!("[{}/{}]", index + 1, total),
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    fn is_still_visible(&self) -> bool {
        self.visible
    }

    fn finish(&mut self) {
        if self.is_cancelled() {
            eprintln!("Cancelled.");
        }
        self.visible = false;
    }
}

/// Line-based prompts over any reader/writer pair.
#[derive(Debug)]
pub struct TerminalPrompt<R, W> {
    input: R,
    output: W,
    /// Answer returned to every confirmation without reading input
    assume: Option<PromptAnswer>,
}

impl TerminalPrompt<io::StdinLock<'static>, io::Stderr> {
    /// Prompt on stderr, reading answers from stdin.
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stderr())
    }
}

impl<R: BufRead, W: Write> TerminalPrompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self {
            input,
            output,
            assume: None,
        }
    }

    /// Answer every confirmation with `answer` instead of asking.
    pub fn assume(mut self, answer: PromptAnswer) -> Self {
        self.assume = Some(answer);
        self
    }

    pub fn into_output(self) -> W {
        self.output
    }

    fn read_line(&mut self) -> Option<String> {
        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(0) => None,
            Ok(_) => Some(line.trim_end_matches(['\r', '\n']).to_string()),
            Err(e) => {
                warn!("Failed to read answer: {}", e);
                None
            }
        }
    }

    fn write_prompt(&mut self, text: &str) {
        if let Err(e) = write!(self.output, "{}", text).and_then(|_| self.output.flush()) {
            warn!("Failed to write prompt: {}", e);
        }
    }
}

impl<R: BufRead, W: Write> UserPrompt for TerminalPrompt<R, W> {
    fn confirm(&mut self, message: &str) -> PromptAnswer {
        if let Some(answer) = self.assume {
            debug!("Assuming {} for: {}", answer, message);
            return answer;
        }
        loop {
            self.write_prompt(&format!("{} [y/n/c] ", message));
            let Some(line) = self.read_line() else {
                return PromptAnswer::Cancel;
            };
            match line.trim().to_ascii_lowercase().as_str() {
                "y" | "yes" => return PromptAnswer::Yes,
                "n" | "no" => return PromptAnswer::No,
                "c" | "cancel" => return PromptAnswer::Cancel,
                _ => self.write_prompt("Please answer y, n or c.\n"),
            }
        }
    }

    fn input_text(&mut self, prompt: &str) -> Option<String> {
        self.write_prompt(&format!("{}: ", prompt));
        self.read_line()
    }

    fn notify_error(&mut self, message: &str) {
        self.write_prompt(&format!("Error: {}\n", message));
    }
}
