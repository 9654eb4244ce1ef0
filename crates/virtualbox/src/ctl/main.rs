//! vboxctl - run VirtualBox tools through the `virtualbox` command runner.
//!
//! ## Usage
//!
//! ```bash
//! # List machines, streaming VBoxManage output
//! vboxctl --verbose run -- list vms
//!
//! # Capture output, elevating through sudo when permitted
//! vboxctl output --sudo -- showvminfo dev --machinereadable
//!
//! # Query a guest property from inside a guest
//! vboxctl guest -- guestproperty get /VirtualBox/GuestInfo/OS/Product
//!
//! # Import an appliance
//! vboxctl import --path ./dev.ova --vsys 0 --name dev
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use log::{debug, error};

use virtualbox::{
    Invocation, Runner, RunnerConfig, Settings, VBoxCommand, VBoxError, import_ovf,
};

#[derive(Parser, Debug)]
#[command(name = "vboxctl", version, about = "Run VBoxManage and VBoxControl commands")]
struct Cli {
    /// Override the config file path
    #[arg(long, value_name = "PATH", global = true, env = "VBOXCTL_CONFIG")]
    config: Option<PathBuf>,

    /// Log resolved command lines and stream tool output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run VBoxManage, printing nothing unless --verbose
    Run(ToolArgs),
    /// Run VBoxManage and print its standard output
    Output(ToolArgs),
    /// Run VBoxManage and print standard output and standard error
    Capture(ToolArgs),
    /// Run VBoxControl (guest side) and print its standard output
    Guest(ToolArgs),
    /// Import an OVA/OVF appliance
    Import {
        /// Appliance file
        #[arg(long)]
        path: PathBuf,
        /// Virtual system index inside the appliance
        #[arg(long, default_value_t = 0)]
        vsys: u32,
        /// Name of the new machine
        #[arg(long)]
        name: String,
    },
    /// Report whether the current user may elevate through sudo
    CanElevate,
    /// Print the effective configuration
    Config,
}

#[derive(Args, Debug)]
struct ToolArgs {
    /// Elevate this invocation when the current user is permitted to
    #[arg(long)]
    sudo: bool,

    /// Arguments passed verbatim to the tool
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

impl ToolArgs {
    fn into_invocation(self) -> Invocation {
        Invocation::new(self.args).with_elevation(self.sudo)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if is_not_installed(&err) {
                error!("VirtualBox does not appear to be installed (tool not found on PATH)");
            }
            eprintln!("Error: {err:?}");
            exit_code_for(&err)
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let settings = Settings::load(cli.config.as_deref())?;
    let config = settings.runner.clone().with_verbose(settings.runner.verbose || cli.verbose);
    debug!("Effective runner config: {:?}", config);

    match cli.command {
        Command::Run(tool) => {
            let manage = manage_runner(&config)?;
            manage
                .run(tool.into_invocation())
                .with_context(|| format!("running {}", manage.program()))
        }
        Command::Output(tool) => {
            let manage = manage_runner(&config)?;
            let stdout = manage
                .run_out(tool.into_invocation())
                .with_context(|| format!("running {}", manage.program()))?;
            print!("{stdout}");
            Ok(())
        }
        Command::Capture(tool) => {
            let manage = manage_runner(&config)?;
            match manage.run_out_err(tool.into_invocation()) {
                Ok(output) => {
                    print!("{}", output.stdout);
                    eprint!("{}", output.stderr);
                    Ok(())
                }
                Err(err) => {
                    if let Some(stdout) = err.stdout() {
                        print!("{stdout}");
                    }
                    if let Some(stderr) = err.stderr() {
                        eprint!("{stderr}");
                    }
                    Err(err).with_context(|| format!("running {}", manage.program()))
                }
            }
        }
        Command::Guest(tool) => {
            let control = Runner::control(&config).context("preparing VBoxControl runner")?;
            let stdout = control
                .run_out(tool.into_invocation())
                .with_context(|| format!("running {}", control.program()))?;
            print!("{stdout}");
            Ok(())
        }
        Command::Import { path, vsys, name } => {
            let manage = manage_runner(&config)?;
            import_ovf(&manage, &path, vsys, &name)
                .with_context(|| format!("importing {}", path.display()))
        }
        Command::CanElevate => {
            let manage = manage_runner(&config)?;
            println!("{}", manage.can_elevate());
            Ok(())
        }
        Command::Config => {
            let effective = Settings { runner: config };
            print!("{}", effective.to_toml()?);
            Ok(())
        }
    }
}

fn manage_runner(config: &RunnerConfig) -> Result<Runner> {
    Runner::manage(config).context("preparing VBoxManage runner")
}

fn is_not_installed(err: &anyhow::Error) -> bool {
    err.downcast_ref::<VBoxError>().is_some_and(VBoxError::is_not_found)
}

/// Mirror the tool's exit code when it ran and failed.
fn exit_code_for(err: &anyhow::Error) -> ExitCode {
    err.downcast_ref::<VBoxError>()
        .and_then(VBoxError::exit_code)
        .and_then(|code| u8::try_from(code).ok())
        .filter(|code| *code != 0)
        .map(ExitCode::from)
        .unwrap_or(ExitCode::FAILURE)
}
