//! Remote command execution on the tablet.
//!
//! Every stage of a capture talks to the device through [`RemoteShell`]:
//! send one command string, block until it finishes, get its exit status
//! and raw output back. [`SshSession`] is the production implementation.

#[cfg(test)]
pub mod mock;
mod ssh;

pub use ssh::SshSession;

#[cfg(test)]
pub use mock::MockShell;

use crate::error::{Error, Result};

/// Output of one remote command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub status: i32,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status == 0
    }

    /// Stdout decoded as UTF-8, invalid sequences replaced.
    pub fn stdout_text(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    pub fn stderr_text(&self) -> String {
        String::from_utf8_lossy(&self.stderr).trim().to_string()
    }
}

/// A blocking request/response channel to the device.
pub trait RemoteShell {
    /// Run `command` through the remote shell and wait for it to finish.
    ///
    /// A non-zero exit status is not an error at this level; transport
    /// failures are.
    fn exec(&mut self, command: &str) -> Result<CommandOutput>;

    /// Release the session. Calling it more than once is a no-op.
    fn close(&mut self) -> Result<()>;

    /// Run `command` and fail with [`Error::CommandFailed`] on a non-zero
    /// exit status.
    fn exec_checked(&mut self, command: &str) -> Result<CommandOutput> {
        let output = self.exec(command)?;
        if !output.success() {
            return Err(Error::CommandFailed {
                command: command.to_string(),
                status: output.status,
                stderr: output.stderr_text(),
            });
        }
        Ok(output)
    }
}

impl<S: RemoteShell + ?Sized> RemoteShell for &mut S {
    fn exec(&mut self, command: &str) -> Result<CommandOutput> {
        (**self).exec(command)
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }
}

/// Quote a value for interpolation into a POSIX shell command.
///
/// Values made only of characters that are inert to the shell are passed
/// through unchanged so that logged commands stay readable.
pub fn shell_quote(value: &str) -> String {
    let inert = !value.is_empty()
        && value
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'/' | b'.' | b'_' | b'-' | b':'));
    if inert {
        return value.to_string();
    }
    format!("'{}'", value.replace('\'', r"'\''"))
}

/// Validate a remote executable path: absolute, single line, no NUL.
pub fn validate_remote_path(path: &str) -> Result<()> {
    if !path.starts_with('/') {
        return Err(Error::InvalidCommandArgument(format!(
            "remote path must be absolute: {:?}",
            path
        )));
    }
    if path.chars().any(|c| c == '\0' || c == '\n' || c == '\r') {
        return Err(Error::InvalidCommandArgument(format!(
            "remote path contains control characters: {:?}",
            path
        )));
    }
    Ok(())
}
