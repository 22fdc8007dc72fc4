//! Scripted [`RemoteShell`] for tests.

use super::{CommandOutput, RemoteShell};
use crate::error::Result;

/// Answers commands from a script of `(needle, output)` pairs.
///
/// The first entry whose needle occurs in the command wins. Commands that
/// match nothing exit with status 127, like an unknown binary would.
#[derive(Debug, Default)]
pub struct MockShell {
    script: Vec<(String, CommandOutput)>,
    pub commands: Vec<String>,
    pub close_calls: usize,
}

impl MockShell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, needle: &str, stdout: impl Into<Vec<u8>>) -> Self {
        self.respond_with(
            needle,
            CommandOutput {
                status: 0,
                stdout: stdout.into(),
                stderr: Vec::new(),
            },
        )
    }

    pub fn respond_status(self, needle: &str, status: i32, stderr: &str) -> Self {
        self.respond_with(
            needle,
            CommandOutput {
                status,
                stdout: Vec::new(),
                stderr: stderr.as_bytes().to_vec(),
            },
        )
    }

    pub fn respond_with(mut self, needle: &str, output: CommandOutput) -> Self {
        self.script.push((needle.to_string(), output));
        self
    }

    /// Whether any issued command contained `needle`.
    pub fn issued(&self, needle: &str) -> bool {
        self.commands.iter().any(|c| c.contains(needle))
    }
}

impl RemoteShell for MockShell {
    fn exec(&mut self, command: &str) -> Result<CommandOutput> {
        self.commands.push(command.to_string());
        let output = self
            .script
            .iter()
            .find(|(needle, _)| command.contains(needle.as_str()))
            .map(|(_, output)| output.clone())
            .unwrap_or_else(|| CommandOutput {
                status: 127,
                stdout: Vec::new(),
                stderr: format!("not scripted: {command}").into_bytes(),
            });
        Ok(output)
    }

    fn close(&mut self) -> Result<()> {
        self.close_calls += 1;
        Ok(())
    }
}
