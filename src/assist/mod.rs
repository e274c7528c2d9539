//! Generative text for welcome lines, chain critiques and tone blueprints.
//!
//! The editor never blocks on an assistant: requests go to a worker thread
//! (see [`worker`]) and replies are applied when they arrive.

pub mod blueprint;
pub mod prompt;
pub mod worker;

pub use blueprint::Blueprint;
pub use worker::{AssistKind, AssistReply, AssistWorker};

use std::io::{ErrorKind, Read, Write};
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};

/// Source of generated text
pub trait ToneAssistant: Send {
    fn generate(&self, prompt: &str) -> Result<String>;
}

/// Canned replies for when no assistant program is configured
pub struct OfflineAssistant;

impl ToneAssistant for OfflineAssistant {
    fn generate(&self, text: &str) -> Result<String> {
        if text.contains(prompt::BLUEPRINT_MARKER) {
            bail!("no assistant configured");
        }
        if text.starts_with(prompt::WELCOME_MARKER) {
            return Ok("Welcome to ToneShare!".to_string());
        }
        Ok(prompt::CRITIQUE_FALLBACK.to_string())
    }
}

/// Runs an external program: prompt on stdin, reply on stdout
pub struct CommandAssistant {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandAssistant {
    pub fn new(program: impl Into<String>, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args,
            timeout,
        }
    }
}

impl CommandAssistant {
    /// Feed the prompt and collect the reply, bounded by the timeout.
    /// Both pipes are serviced on their own threads so a program that
    /// answers before reading all of its input can't stall the poll loop.
    fn exchange(&self, child: &mut Child, prompt: &str) -> Result<String> {
        let mut stdout = child.stdout.take().context("Assistant stdout missing")?;
        let reader = thread::spawn(move || {
            let mut buf = String::new();
            stdout.read_to_string(&mut buf).map(|_| buf)
        });

        let mut stdin = child.stdin.take().context("Assistant stdin missing")?;
        let input = prompt.to_owned();
        let writer = thread::spawn(move || stdin.write_all(input.as_bytes()));

        let start = Instant::now();
        let status = loop {
            match child.try_wait().context("Failed to wait for assistant")? {
                Some(status) => break status,
                None if start.elapsed() > self.timeout => {
                    bail!("assistant timed out after {:?}", self.timeout);
                }
                None => thread::sleep(Duration::from_millis(50)),
            }
        };

        match writer.join() {
            // Programs may answer without consuming the whole prompt
            Ok(Err(e)) if e.kind() == ErrorKind::BrokenPipe => {}
            Ok(result) => result.context("Failed to write prompt")?,
            Err(_) => bail!("assistant writer thread panicked"),
        }
        let text = match reader.join() {
            Ok(result) => result.context("Failed to read assistant output")?,
            Err(_) => bail!("assistant reader thread panicked"),
        };
        if !status.success() {
            bail!("assistant exited with {}", status);
        }
        let text = text.trim();
        if text.is_empty() {
            bail!("assistant returned no text");
        }
        Ok(text.to_string())
    }
}

impl ToneAssistant for CommandAssistant {
    fn generate(&self, prompt: &str) -> Result<String> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .with_context(|| format!("Failed to spawn '{}'", self.program))?;

        let result = self.exchange(&mut child, prompt);
        if result.is_err() {
            // Never leave a running or unreaped child behind
            let _ = child.kill();
            let _ = child.wait();
        }
        result
    }
}
