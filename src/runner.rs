//! External tool invocation
//!
//! The backup cycle never reimplements PostgreSQL tooling; it shells out to
//! `pg_basebackup` and `pg_archivecleanup`. `ToolRunner` is the seam between
//! the cycle and the operating system so the cycle can be exercised without
//! spawning real processes.

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::debug;

use crate::error::{KeeperError, KeeperResult};

/// A program plus its arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    program: PathBuf,
    args: Vec<OsString>,
}

impl ToolCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn args(&self) -> &[OsString] {
        &self.args
    }

    /// Name used in error messages
    pub fn tool_name(&self) -> String {
        self.program.display().to_string()
    }
}

impl fmt::Display for ToolCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

/// Runs external tools to completion
pub trait ToolRunner {
    /// Run the command and block until it exits
    ///
    /// # Errors
    ///
    /// Any exit other than status 0 is an error.
    fn run(&self, command: &ToolCommand) -> KeeperResult<()>;
}

impl<R: ToolRunner + ?Sized> ToolRunner for &R {
    fn run(&self, command: &ToolCommand) -> KeeperResult<()> {
        (**self).run(command)
    }
}

/// Spawns real child processes that inherit stdio
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemToolRunner;

impl ToolRunner for SystemToolRunner {
    fn run(&self, command: &ToolCommand) -> KeeperResult<()> {
        debug!("Running {}", command);

        let status = Command::new(command.program())
            .args(command.args())
            .status()
            .map_err(|e| KeeperError::ToolSpawn {
                tool: command.tool_name(),
                reason: e.to_string(),
            })?;

        debug!("{} exited with {}", command.tool_name(), status);

        if status.success() {
            return Ok(());
        }

        match status.code() {
            Some(code) => Err(KeeperError::ToolFailed {
                tool: command.tool_name(),
                code,
            }),
            None => Err(KeeperError::ToolTerminated {
                tool: command.tool_name(),
            }),
        }
    }
}

/// In-process test double for `ToolRunner`
#[cfg(test)]
pub(crate) mod testing {
    use std::cell::RefCell;
    use std::path::{Path, PathBuf};

    use super::{ToolCommand, ToolRunner};
    use crate::error::{KeeperError, KeeperResult};

    /// Records every command instead of spawning it
    ///
    /// Optionally fails a given program with an exit code, and optionally
    /// plays the part of pg_basebackup by creating the `-D` directory with a
    /// `backup_label` inside.
    #[derive(Default)]
    pub(crate) struct RecordingRunner {
        calls: RefCell<Vec<ToolCommand>>,
        failure: Option<(PathBuf, i32)>,
        create_backups: bool,
    }

    impl RecordingRunner {
        pub(crate) fn new() -> Self {
            Self::default()
        }

        pub(crate) fn failing(program: impl Into<PathBuf>, code: i32) -> Self {
            Self {
                failure: Some((program.into(), code)),
                ..Self::default()
            }
        }

        pub(crate) fn creating_backups(mut self) -> Self {
            self.create_backups = true;
            self
        }

        pub(crate) fn calls(&self) -> Vec<ToolCommand> {
            self.calls.borrow().clone()
        }

        pub(crate) fn calls_to(&self, program: &Path) -> Vec<ToolCommand> {
            self.calls
                .borrow()
                .iter()
                .filter(|call| call.program() == program)
                .cloned()
                .collect()
        }
    }

    impl ToolRunner for RecordingRunner {
        fn run(&self, command: &ToolCommand) -> KeeperResult<()> {
            self.calls.borrow_mut().push(command.clone());

            if let Some((program, code)) = &self.failure {
                if command.program() == program.as_path() {
                    return Err(KeeperError::ToolFailed {
                        tool: command.tool_name(),
                        code: *code,
                    });
                }
            }

            if self.create_backups {
                let args = command.args();
                if let Some(pos) = args.iter().position(|arg| arg == "-D") {
                    if let Some(target) = args.get(pos + 1) {
                        let target = Path::new(target);
                        std::fs::create_dir_all(target)?;
                        std::fs::write(target.join("backup_label"), "START WAL LOCATION")?;
                    }
                }
            }

            Ok(())
        }
    }
}
