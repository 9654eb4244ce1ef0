//! Command runner for the VirtualBox command-line tools.
//!
//! This crate builds and executes invocations of `VBoxManage` (host side) and
//! `VBoxControl` (guest side). It does not model machines or parse the tools'
//! output; callers speak the tools' own command syntax.
//!
//! ## Execution modes
//!
//! - [`VBoxCommand::run`] discards output (or streams it live when verbose)
//! - [`VBoxCommand::run_out`] captures standard output
//! - [`VBoxCommand::run_out_err`] captures standard output and error separately
//!
//! A missing executable is always reported as [`VBoxError::CommandNotFound`].
//!
//! ## Elevation
//!
//! An [`Invocation`] marked with [`Invocation::elevated`] is prefixed with
//! `sudo` when the current Linux user belongs to the `sudo` group. The request
//! applies to that one invocation only.
//!
//! ```no_run
//! use virtualbox::{Invocation, Runner, RunnerConfig, VBoxCommand};
//!
//! # fn main() -> virtualbox::VBoxResult<()> {
//! let manage = Runner::manage(&RunnerConfig::default())?;
//! let vms = manage.run_out(Invocation::new(["list", "vms"]))?;
//! manage.run(Invocation::new(["startvm", "dev", "--type", "headless"]).elevated())?;
//! # let _ = vms;
//! # Ok(())
//! # }
//! ```

pub mod command;
pub mod config;
pub mod error;
pub mod import;
pub mod privilege;
pub mod runner;
pub mod settings;
pub mod testing;

pub use command::{CapturedOutput, CommandLine, Invocation, ResolvedCommand, VBoxCommand};
pub use config::RunnerConfig;
pub use error::{VBoxError, VBoxResult};
pub use import::import_ovf;
pub use privilege::{ElevationPolicy, StaticPolicy, detect_policy};
pub use runner::Runner;
pub use settings::Settings;
