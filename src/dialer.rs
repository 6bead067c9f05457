use std::process::{Command, Stdio};

use anyhow::{bail, Context, Result};

use crate::config::CommandExec;

/// Call-initiation collaborator. The core hands over a phone string and
/// observes nothing beyond success or failure.
pub trait Dialer {
    fn dial(&self, phone: &str) -> Result<()>;
}

/// Spawns the configured program with the phone number as its final argument.
pub struct CommandDialer {
    exec: CommandExec,
}

impl CommandDialer {
    pub fn new(exec: CommandExec) -> Self {
        Self { exec }
    }
}

impl Dialer for CommandDialer {
    fn dial(&self, phone: &str) -> Result<()> {
        let trimmed = phone.trim();
        if trimmed.is_empty() {
            bail!("no phone number on record");
        }

        let status = Command::new(&self.exec.program)
            .args(&self.exec.args)
            .arg(trimmed)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .with_context(|| format!("failed to spawn `{}`", self.exec.program))?;

        if !status.success() {
            bail!("`{}` exited with {}", self.exec.program, status);
        }

        Ok(())
    }
}

/// Stand-in when no dial command is configured.
pub struct UnconfiguredDialer;

impl Dialer for UnconfiguredDialer {
    fn dial(&self, _phone: &str) -> Result<()> {
        bail!("dial command not configured");
    }
}

pub fn from_config(dial: Option<&CommandExec>) -> Box<dyn Dialer> {
    match dial {
        Some(exec) => Box::new(CommandDialer::new(exec.clone())),
        None => Box::new(UnconfiguredDialer),
    }
}
