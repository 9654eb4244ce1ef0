//! Command-line construction shared by the real runner and its test double.

use std::fmt;

use crate::error::VBoxResult;

/// Arguments for one invocation, plus whether it should be elevated.
///
/// An `Invocation` is consumed by the call that runs it, so an elevation
/// request can never leak into a later, unrelated call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Invocation {
    args: Vec<String>,
    elevate: bool,
}

impl Invocation {
    pub fn new<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            args: args.into_iter().map(Into::into).collect(),
            elevate: false,
        }
    }

    /// Request elevation if the current user is permitted to elevate.
    pub fn elevated(self) -> Self {
        self.with_elevation(true)
    }

    pub fn with_elevation(mut self, elevate: bool) -> Self {
        self.elevate = elevate;
        self
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn wants_elevation(&self) -> bool {
        self.elevate
    }
}

impl<S: Into<String>> FromIterator<S> for Invocation {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter)
    }
}

/// Program and argument vector that will actually be executed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCommand {
    pub program: String,
    pub args: Vec<String>,
    /// Whether the elevation program was prefixed.
    pub elevated: bool,
}

impl ResolvedCommand {
    pub fn to_command(&self) -> std::process::Command {
        let mut cmd = std::process::Command::new(&self.program);
        cmd.args(&self.args);
        cmd
    }
}

impl fmt::Display for ResolvedCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Separately captured standard output and standard error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapturedOutput {
    pub stdout: String,
    pub stderr: String,
}

/// One external executable and how to build its command lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    program: String,
    prefix_args: Vec<String>,
    elevation_program: String,
    can_elevate: bool,
}

impl CommandLine {
    pub fn new(
        program: impl Into<String>,
        elevation_program: impl Into<String>,
        can_elevate: bool,
    ) -> Self {
        Self {
            program: program.into(),
            prefix_args: Vec::new(),
            elevation_program: elevation_program.into(),
            can_elevate,
        }
    }

    /// Arguments placed before every invocation's own arguments.
    pub fn with_prefix_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.prefix_args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn prefix_args(&self) -> &[String] {
        &self.prefix_args
    }

    pub fn can_elevate(&self) -> bool {
        self.can_elevate
    }

    /// Build the final command line for `invocation`.
    ///
    /// Elevation applies only when requested, permitted, and not on Windows;
    /// otherwise the request is silently ignored.
    pub fn resolve(&self, invocation: &Invocation) -> ResolvedCommand {
        let elevated = invocation.wants_elevation() && self.can_elevate && !cfg!(windows);

        let mut args = Vec::with_capacity(1 + self.prefix_args.len() + invocation.args().len());
        let program = if elevated {
            args.push(self.program.clone());
            self.elevation_program.clone()
        } else {
            self.program.clone()
        };
        args.extend(self.prefix_args.iter().cloned());
        args.extend(invocation.args().iter().cloned());

        ResolvedCommand {
            program,
            args,
            elevated,
        }
    }
}

/// Operations available on a VirtualBox executable.
///
/// Implemented by [`crate::Runner`], which spawns real processes, and by
/// [`crate::testing::RecordingCommand`], which records calls instead.
pub trait VBoxCommand {
    /// Program name or path this command invokes.
    fn program(&self) -> &str;

    /// Run without returning output.
    fn run(&self, invocation: Invocation) -> VBoxResult<()>;

    /// Run and return captured standard output.
    fn run_out(&self, invocation: Invocation) -> VBoxResult<String>;

    /// Run and return standard output and standard error separately.
    fn run_out_err(&self, invocation: Invocation) -> VBoxResult<CapturedOutput>;
}
