//! [`RemoteShell`] over the system OpenSSH client.
//!
//! One ControlMaster connection is opened per session; every command is a
//! short-lived `ssh` invocation multiplexed over it, so authentication and
//! host-key checks happen once. Host keys come from the user's
//! `known_hosts` and authentication from the user's agent or keys.

use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};

use tempfile::TempDir;
use tracing::{debug, warn};

use super::{CommandOutput, RemoteShell};
use crate::error::{Error, Result};

/// Control socket file name inside the session's private directory
const CONTROL_SOCKET: &str = "control";
/// Log file the backgrounded master writes its diagnostics to
const MASTER_LOG: &str = "master.log";

pub struct SshSession {
    program: PathBuf,
    destination: String,
    control_dir: TempDir,
    open: bool,
}

impl SshSession {
    /// Authenticate against `user@host` and keep the connection open.
    pub fn connect<P: Into<PathBuf>>(program: P, user: &str, host: &str) -> Result<Self> {
        validate_endpoint("user", user)?;
        validate_endpoint("host", host)?;

        let mut session = Self {
            program: program.into(),
            destination: format!("{user}@{host}"),
            control_dir: tempfile::Builder::new().prefix("rmsnap-ssh").tempdir()?,
            open: false,
        };

        // The backgrounded master inherits its stdio, so piping it would
        // never reach EOF; diagnostics go to a log file instead.
        let log_path = session.control_dir.path().join(MASTER_LOG);
        debug!("Opening ssh master connection to {}", session.destination);
        let status = session
            .base_command()
            .args(["-M", "-f", "-N", "-o", "ControlPersist=yes", "-E"])
            .arg(&log_path)
            .arg(&session.destination)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()?;
        if !status.success() {
            return Err(Error::CommandFailed {
                command: "ssh -M".to_string(),
                status: status.code().unwrap_or(-1),
                stderr: fs::read_to_string(&log_path)
                    .map(|log| log.trim().to_string())
                    .unwrap_or_default(),
            });
        }
        session.open = true;

        Ok(session)
    }

    fn control_path(&self) -> PathBuf {
        self.control_dir.path().join(CONTROL_SOCKET)
    }

    fn base_command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command
            .arg("-S")
            .arg(self.control_path())
            .args(["-o", "BatchMode=yes"]);
        command
    }
}

impl RemoteShell for SshSession {
    fn exec(&mut self, command: &str) -> Result<CommandOutput> {
        if !self.open {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotConnected,
                "ssh session already closed",
            )));
        }

        debug!("$ {}", command);
        let output = self
            .base_command()
            .arg(&self.destination)
            .arg("--")
            .arg(command)
            .output()?;

        Ok(CommandOutput {
            // Killed by a signal: no code, report like a shell does
            status: output.status.code().unwrap_or(-1),
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }

    fn close(&mut self) -> Result<()> {
        if !self.open {
            return Ok(());
        }
        self.open = false;

        debug!("Closing ssh master connection to {}", self.destination);
        let output = self
            .base_command()
            .args(["-O", "exit"])
            .arg(&self.destination)
            .output()?;
        check_status("ssh -O exit", &output)
    }
}

impl Drop for SshSession {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!(
                "Failed to close ssh session ({}): {}",
                self.control_path().display(),
                e
            );
        }
    }
}

fn check_status(command: &str, output: &Output) -> Result<()> {
    if output.status.success() {
        return Ok(());
    }
    Err(Error::CommandFailed {
        command: command.to_string(),
        status: output.status.code().unwrap_or(-1),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    })
}

/// Reject values ssh would read as options or split into several arguments.
fn validate_endpoint(kind: &str, value: &str) -> Result<()> {
    let valid = !value.is_empty()
        && !value.starts_with('-')
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_' | ':' | '[' | ']'));
    if valid {
        Ok(())
    } else {
        Err(Error::InvalidCommandArgument(format!(
            "invalid ssh {kind}: {value:?}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_endpoint_accepts_addresses() {
        assert!(validate_endpoint("host", "10.11.99.1").is_ok());
        assert!(validate_endpoint("host", "remarkable.local").is_ok());
        assert!(validate_endpoint("host", "[fe80::1]").is_ok());
        assert!(validate_endpoint("user", "root").is_ok());
    }

    #[test]
    fn test_validate_endpoint_rejects_options_and_spaces() {
        assert!(validate_endpoint("host", "-oProxyCommand=sh").is_err());
        assert!(validate_endpoint("host", "a b").is_err());
        assert!(validate_endpoint("user", "").is_err());
        assert!(validate_endpoint("user", "root@evil").is_err());
    }

    #[test]
    fn test_connect_rejects_bad_host_before_spawning() {
        let result = SshSession::connect("/nonexistent/ssh", "root", "-bad");
        assert!(matches!(result, Err(Error::InvalidCommandArgument(_))));
    }
}
