//! mr_filter command line composition and execution.

use std::fmt;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use crate::error::{ExternalToolError, Result};

use super::config::{MrFilterArgs, MrFilterOptions};

/// A fully resolved mr_filter invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct MrFilterCommand {
    pub program: PathBuf,
    /// Switches, without the two file paths.
    pub args: Vec<String>,
    pub input: PathBuf,
    pub output: PathBuf,
}

impl MrFilterCommand {
    pub fn new(
        program: PathBuf,
        args: &MrFilterArgs,
        verbose: bool,
        input: PathBuf,
        output: PathBuf,
    ) -> Self {
        let args = match args {
            MrFilterArgs::Composed(options) => options_to_flags(options, verbose),
            MrFilterArgs::Raw(raw) => raw.split_whitespace().map(str::to_string).collect(),
        };
        Self {
            program,
            args,
            input,
            output,
        }
    }

    pub fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args).arg(&self.input).arg(&self.output);
        cmd
    }
}

impl fmt::Display for MrFilterCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        write!(
            f,
            " \"{}\" \"{}\"",
            self.input.display(),
            self.output.display()
        )
    }
}

/// One switch per set option, in mr_filter's documented order.
pub fn options_to_flags(options: &MrFilterOptions, verbose: bool) -> Vec<String> {
    let mut flags = Vec::new();

    let mut value = |flag: &str, v: Option<String>| {
        if let Some(v) = v {
            flags.push(format!("{flag}{v}"));
        }
    };
    let opt = |v: Option<u32>| v.map(|v| v.to_string());
    // `{:?}` keeps the trailing `.0` of whole numbers, as in historical logs
    let float = |v: Option<f64>| v.map(|v| format!("{v:?}"));
    let switch = |set: bool| set.then(String::new);

    value("-t", opt(options.transform_type));
    value("-T", opt(options.filter_type));
    value("-U", opt(options.non_orthog_filter_type));
    value("-n", opt(options.number_of_scales));
    value("-K", switch(options.suppress_last_scale));
    value("-k", switch(options.suppress_isolated_pixels));
    value("-C", opt(options.coef_detection_method));
    value("-s", float(options.k_sigma_noise_threshold));
    value("-m", opt(options.noise_model));
    value("-p", switch(options.detect_only_positive_structure));
    value("-P", switch(options.suppress_positivity_constraint));
    value("-f", opt(options.filtering_type));
    value("-F", opt(options.first_detection_scale));
    value("-i", opt(options.number_of_iterations));
    value("-e", float(options.epsilon));
    value(
        "-w",
        options
            .support_file
            .as_ref()
            .map(|p| p.display().to_string()),
    );
    value("-E", float(options.precision));

    // the mask path is a separate argument
    if let Some(mask) = &options.mask_file {
        flags.push("-I".to_string());
        flags.push(mask.display().to_string());
    }
    if verbose {
        flags.push("-v".to_string());
    }

    flags
}

/// How the external program terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolExit {
    Success,
    /// `code` is `None` when the process was killed by a signal.
    Failure { code: Option<i32> },
}

/// Runs an mr_filter invocation to completion.
pub trait MrFilterRunner: Send + Sync + fmt::Debug {
    fn run(&self, command: &MrFilterCommand, verbose: bool) -> Result<ToolExit>;
}

/// Runs mr_filter as a child process and blocks until it exits.
///
/// Stdout is discarded unless `verbose`. There is no timeout.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl MrFilterRunner for ProcessRunner {
    fn run(&self, command: &MrFilterCommand, verbose: bool) -> Result<ToolExit> {
        let mut cmd = command.to_command();
        if !verbose {
            cmd.stdout(Stdio::null());
        }

        tracing::debug!("Command: {:?}", cmd);

        let status = cmd.status().map_err(|source| {
            tracing::error!("Error on command: {}", command);
            ExternalToolError::Spawn {
                program: command.program.clone(),
                source,
            }
        })?;

        Ok(if status.success() {
            ToolExit::Success
        } else {
            ToolExit::Failure {
                code: status.code(),
            }
        })
    }
}
