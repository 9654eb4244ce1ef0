//! Test double for code built on top of [`VBoxCommand`].
//!
//! `RecordingCommand` never spawns anything. It records every resolved
//! command line and replays canned outcomes in the order they were queued;
//! when the queue is empty a call succeeds with empty output.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::command::{CapturedOutput, CommandLine, Invocation, ResolvedCommand, VBoxCommand};
use crate::config::DEFAULT_ELEVATION_PROGRAM;
use crate::error::VBoxResult;

/// Which execution mode a recorded call used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallMode {
    Run,
    Out,
    OutErr,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub mode: CallMode,
    pub resolved: ResolvedCommand,
}

#[derive(Debug)]
pub struct RecordingCommand {
    line: CommandLine,
    calls: Mutex<Vec<RecordedCall>>,
    outcomes: Mutex<VecDeque<VBoxResult<CapturedOutput>>>,
}

impl RecordingCommand {
    /// A double for `program` whose user may not elevate.
    pub fn new(program: impl Into<String>) -> Self {
        Self::from_line(CommandLine::new(program, DEFAULT_ELEVATION_PROGRAM, false))
    }

    /// A double for `program` whose user may elevate.
    pub fn elevating(program: impl Into<String>) -> Self {
        Self::from_line(CommandLine::new(program, DEFAULT_ELEVATION_PROGRAM, true))
    }

    pub fn from_line(line: CommandLine) -> Self {
        Self {
            line,
            calls: Mutex::new(Vec::new()),
            outcomes: Mutex::new(VecDeque::new()),
        }
    }

    /// Queue the outcome of the next unanswered call.
    pub fn push_outcome(&self, outcome: VBoxResult<CapturedOutput>) {
        lock(&self.outcomes).push_back(outcome);
    }

    /// Queue a successful call with the given output.
    pub fn push_output(&self, stdout: impl Into<String>, stderr: impl Into<String>) {
        self.push_outcome(Ok(CapturedOutput {
            stdout: stdout.into(),
            stderr: stderr.into(),
        }));
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        lock(&self.calls).clone()
    }

    pub fn last_call(&self) -> Option<RecordedCall> {
        lock(&self.calls).last().cloned()
    }

    fn record(&self, mode: CallMode, invocation: &Invocation) -> VBoxResult<CapturedOutput> {
        let resolved = self.line.resolve(invocation);
        lock(&self.calls).push(RecordedCall { mode, resolved });
        lock(&self.outcomes)
            .pop_front()
            .unwrap_or_else(|| Ok(CapturedOutput::default()))
    }
}

impl VBoxCommand for RecordingCommand {
    fn program(&self) -> &str {
        self.line.program()
    }

    fn run(&self, invocation: Invocation) -> VBoxResult<()> {
        self.record(CallMode::Run, &invocation).map(|_| ())
    }

    fn run_out(&self, invocation: Invocation) -> VBoxResult<String> {
        self.record(CallMode::Out, &invocation).map(|output| output.stdout)
    }

    fn run_out_err(&self, invocation: Invocation) -> VBoxResult<CapturedOutput> {
        self.record(CallMode::OutErr, &invocation)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
