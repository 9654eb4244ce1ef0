//! Process-spawning implementation of [`VBoxCommand`].

use std::process::{self, ExitStatus, Output, Stdio};

use log::{debug, info};

use crate::command::{CapturedOutput, CommandLine, Invocation, ResolvedCommand, VBoxCommand};
use crate::config::RunnerConfig;
use crate::error::{VBoxError, VBoxResult};
use crate::privilege::{ElevationPolicy, detect_policy};

/// Runs one VirtualBox executable as a blocking child process.
///
/// Each call spawns exactly one child and waits for it to exit. There is no
/// timeout; a hung child hangs the caller.
#[derive(Debug, Clone)]
pub struct Runner {
    line: CommandLine,
    verbose: bool,
}

impl Runner {
    /// Create a runner for `program`, detecting elevation permission for the
    /// current user.
    pub fn new(program: impl Into<String>, config: &RunnerConfig) -> VBoxResult<Self> {
        let policy = detect_policy(config);
        Self::with_policy(program, config, policy.as_ref())
    }

    /// Create a runner using an explicit elevation policy.
    pub fn with_policy(
        program: impl Into<String>,
        config: &RunnerConfig,
        policy: &dyn ElevationPolicy,
    ) -> VBoxResult<Self> {
        let program = program.into();
        let can_elevate = policy.can_elevate()?;
        debug!("Runner for {} (can elevate: {})", program, can_elevate);

        Ok(Self {
            line: CommandLine::new(program, config.elevation_program.clone(), can_elevate),
            verbose: config.verbose,
        })
    }

    /// Runner for the host-side management tool.
    pub fn manage(config: &RunnerConfig) -> VBoxResult<Self> {
        Self::new(config.resolve_manage_program(), config)
    }

    /// Runner for the guest-side control tool.
    pub fn control(config: &RunnerConfig) -> VBoxResult<Self> {
        Self::new(config.control_program.clone(), config)
    }

    /// Arguments placed before every invocation's own arguments.
    pub fn with_prefix_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.line = self.line.with_prefix_args(args);
        self
    }

    pub fn can_elevate(&self) -> bool {
        self.line.can_elevate()
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Command line that `invocation` would execute.
    pub fn resolve(&self, invocation: &Invocation) -> ResolvedCommand {
        self.line.resolve(invocation)
    }

    fn prepare(&self, invocation: &Invocation) -> (ResolvedCommand, process::Command) {
        let resolved = self.line.resolve(invocation);
        if self.verbose {
            info!("executing: {}", resolved);
        } else {
            debug!("executing: {}", resolved);
        }

        let mut cmd = resolved.to_command();
        cmd.stdin(Stdio::null());
        (resolved, cmd)
    }

    fn check(&self, status: ExitStatus, stdout: String, stderr: String) -> VBoxResult<()> {
        if status.success() {
            return Ok(());
        }
        Err(VBoxError::ExitFailure {
            program: self.line.program().to_string(),
            status,
            stdout,
            stderr,
        })
    }

    fn output(resolved: &ResolvedCommand, cmd: &mut process::Command) -> VBoxResult<Output> {
        cmd.output().map_err(|e| VBoxError::spawn(&resolved.program, e))
    }
}

impl VBoxCommand for Runner {
    fn program(&self) -> &str {
        self.line.program()
    }

    fn run(&self, invocation: Invocation) -> VBoxResult<()> {
        let (resolved, mut cmd) = self.prepare(&invocation);
        if self.verbose {
            cmd.stdout(Stdio::inherit()).stderr(Stdio::inherit());
        } else {
            cmd.stdout(Stdio::null()).stderr(Stdio::null());
        }

        let status = cmd.status().map_err(|e| VBoxError::spawn(&resolved.program, e))?;
        self.check(status, String::new(), String::new())
    }

    fn run_out(&self, invocation: Invocation) -> VBoxResult<String> {
        let (resolved, mut cmd) = self.prepare(&invocation);
        cmd.stdout(Stdio::piped());
        if self.verbose {
            cmd.stderr(Stdio::inherit());
        } else {
            cmd.stderr(Stdio::piped());
        }

        let output = Self::output(&resolved, &mut cmd)?;
        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        self.check(output.status, stdout.clone(), stderr)?;
        Ok(stdout)
    }

    fn run_out_err(&self, invocation: Invocation) -> VBoxResult<CapturedOutput> {
        let (resolved, mut cmd) = self.prepare(&invocation);
        cmd.stdout(Stdio::piped()).stderr(Stdio::piped());

        let output = Self::output(&resolved, &mut cmd)?;
        let captured = CapturedOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        self.check(output.status, captured.stdout.clone(), captured.stderr.clone())?;
        Ok(captured)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::privilege::StaticPolicy;

    fn runner(program: &str, can_elevate: bool) -> Runner {
        Runner::with_policy(program, &RunnerConfig::default(), &StaticPolicy(can_elevate))
            .unwrap()
    }

    #[test]
    fn test_verbosity_comes_from_config() {
        let config = RunnerConfig::default().with_verbose(true);
        let loud = Runner::with_policy("VBoxManage", &config, &StaticPolicy(false)).unwrap();
        assert!(loud.is_verbose());
        assert!(!runner("VBoxManage", false).is_verbose());
    }

    #[test]
    fn test_manage_uses_configured_program() {
        let config = RunnerConfig {
            manage_program: "/opt/vbox/VBoxManage".to_string(),
            ..Default::default()
        };
        let runner = Runner::with_policy(
            config.resolve_manage_program(),
            &config,
            &StaticPolicy(false),
        )
        .unwrap();
        assert_eq!(runner.program(), "/opt/vbox/VBoxManage");
    }

    #[test]
    fn test_policy_error_aborts_construction() {
        struct Failing;
        impl ElevationPolicy for Failing {
            fn can_elevate(&self) -> VBoxResult<bool> {
                Err(VBoxError::PermissionLookup(std::io::Error::other("nss unavailable")))
            }
        }

        let err = Runner::with_policy("VBoxManage", &RunnerConfig::default(), &Failing)
            .unwrap_err();
        assert!(matches!(err, VBoxError::PermissionLookup(_)));
    }

    #[cfg(not(windows))]
    #[test]
    fn test_elevation_does_not_carry_over() {
        let runner = runner("VBoxManage", true);
        let first = runner.resolve(&Invocation::new(["startvm", "dev"]).elevated());
        let second = runner.resolve(&Invocation::new(["list", "vms"]));
        assert!(first.elevated);
        assert_eq!(first.program, "sudo");
        assert!(!second.elevated);
        assert_eq!(second.program, "VBoxManage");
    }

    #[test]
    fn test_missing_program_is_command_not_found() {
        let runner = runner("doesnotexist_tool", false);
        assert!(runner.run(Invocation::new(["list"])).unwrap_err().is_not_found());
        assert!(runner.run_out(Invocation::new(["list"])).unwrap_err().is_not_found());
        assert!(
            runner
                .run_out_err(Invocation::new(["list"]))
                .unwrap_err()
                .is_not_found()
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_run_out_failure_carries_stdout() {
        let runner = runner("sh", false);
        let err = runner
            .run_out(Invocation::new(["-c", "echo partial; exit 3"]))
            .unwrap_err();
        assert_eq!(err.stdout(), Some("partial\n"));
        assert_eq!(err.exit_code(), Some(3));
    }
}
