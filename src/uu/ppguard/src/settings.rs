// This file is part of the ppguard package.
//
// For the full copyright and license information, please view the LICENSE
// file that was distributed with this source code.

//! Normalisation of the command line into the [`Settings`] the pipeline and
//! worker pool consume.

use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use clap::ArgMatches;

use ppcore::display::Quotable;
use ppcore::error::{UResult, UUsageError};

use crate::error::PpguardError;
use crate::uu_args::options;

/// Name of the output sink used in test mode and shown in its logs.
pub const NULL_SINK: &str = "/dev/null";

/// How the preprocessor child is launched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChildCommand {
    /// A single user-supplied string, run through `/bin/sh -c`.
    Shell(String),
    /// An argv vector, spawned directly.
    Argv(Vec<String>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stages {
    pub pre: bool,
    pub mid: bool,
    pub post: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BufferMode {
    Default,
    Line,
    Zero,
}

impl BufferMode {
    fn from_arg(arg: &str) -> Self {
        match arg {
            "line" => Self::Line,
            "zero" => Self::Zero,
            _ => Self::Default,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub stages: Stages,
    pub command: ChildCommand,
    pub queue_size: i64,
    pub poll: Duration,
    pub timeout: f64,
    pub ranges: Option<Vec<(i64, i64)>>,
    pub pairs: Vec<(String, String)>,
}

impl Settings {
    pub fn from_matches(matches: &ArgMatches) -> UResult<Self> {
        let stages = stages(matches);
        let command = command(matches)?;
        let queue_size = *matches.get_one::<i64>(options::QUEUE).unwrap();
        let poll = *matches.get_one::<f64>(options::POLL).unwrap();
        if !poll.is_finite() || poll <= 0.0 {
            return Err(UUsageError::new(2, "Poll period must be positive."));
        }
        let timeout = *matches.get_one::<f64>(options::TIMEOUT).unwrap();
        if !timeout.is_finite() || timeout < 0.0 {
            return Err(UUsageError::new(2, "Child-exit timeout must not be negative."));
        }
        Ok(Self {
            stages,
            command,
            queue_size,
            poll: Duration::from_secs_f64(poll),
            timeout,
            ranges: ranges(matches)?,
            pairs: pairs(matches)?,
        })
    }
}

fn stages(matches: &ArgMatches) -> Stages {
    let selected: Vec<&String> = matches
        .get_many::<String>(options::STAGE)
        .unwrap()
        .collect();
    let full = selected.iter().any(|s| *s == "full");
    Stages {
        pre: full || selected.iter().any(|s| *s == "pre"),
        mid: full || selected.iter().any(|s| *s == "mid"),
        post: full || selected.iter().any(|s| *s == "post"),
    }
}

/// Expand `@FILE` tokens into one path per line.
fn expand_paths(tokens: Vec<&String>) -> UResult<Vec<String>> {
    let mut paths = Vec::with_capacity(tokens.len());
    for token in tokens {
        if let Some(listing) = token.strip_prefix('@') {
            let content = fs::read_to_string(listing).map_err(|e| {
                UUsageError::new(2, format!("cannot read path list {}: {e}", listing.quote()))
            })?;
            paths.extend(content.lines().map(str::to_string));
        } else {
            paths.push(token.clone());
        }
    }
    Ok(paths)
}

fn pairs(matches: &ArgMatches) -> UResult<Vec<(String, String)>> {
    let inputs = expand_paths(
        matches
            .get_many::<String>(options::INPUT)
            .unwrap()
            .collect(),
    )?;
    if inputs.iter().filter(|p| *p == "-").count() > 1 {
        return Err(UUsageError::new(2, "Stdin ('-') can be processed only once."));
    }
    let outputs = if matches.get_flag(options::TEST) {
        vec![NULL_SINK.to_string(); inputs.len()]
    } else {
        let given = expand_paths(
            matches
                .get_many::<String>(options::OUT)
                .unwrap_or_default()
                .collect(),
        )?;
        if given.is_empty() {
            vec!["-".to_string(); inputs.len()]
        } else {
            given
        }
    };
    Ok(inputs.into_iter().zip(outputs).collect())
}

fn ranges(matches: &ArgMatches) -> UResult<Option<Vec<(i64, i64)>>> {
    let Some(args) = matches.get_many::<String>(options::RANGE) else {
        return Ok(None);
    };
    let mut ranges = Vec::new();
    for arg in args {
        let parsed: Option<Vec<i64>> = arg.split(',').map(|b| b.trim().parse().ok()).collect();
        match parsed.as_deref() {
            Some([upper, lower]) => ranges.push((*upper, *lower)),
            _ => {
                return Err(UUsageError::new(
                    2,
                    format!("Invalid range {}: expected 'UPPER,LOWER'.", arg.quote()),
                ));
            }
        }
    }
    Ok(Some(ranges))
}

fn command(matches: &ArgMatches) -> UResult<ChildCommand> {
    if let Some(script) = matches.get_one::<String>(options::SCRIPT) {
        return Ok(ChildCommand::Shell(script.clone()));
    }
    let mut argv = vec![
        preprocessor_path(matches)?,
        "-E".to_string(),
        "-P".to_string(),
    ];
    if let Some(forwarded) = matches.get_many::<String>(options::CLANG) {
        argv.extend(forwarded.map(|a| a.trim_start_matches('\\').to_string()));
    }
    if let Some(defines) = matches.get_many::<String>(options::DEFINE) {
        argv.extend(defines.map(|d| format!("-D{d}")));
    }
    if !matches.get_flag(options::NO_KEEP) {
        argv.push("-C".to_string());
    }
    argv.push("-".to_string());
    let mut wrapped = buffering_prefix(matches)?;
    if wrapped.is_empty() {
        return Ok(ChildCommand::Argv(argv));
    }
    wrapped.push("--".to_string());
    wrapped.extend(argv);
    Ok(ChildCommand::Argv(wrapped))
}

fn preprocessor_path(matches: &ArgMatches) -> UResult<String> {
    if let Some(path) = matches.get_one::<String>(options::PATH) {
        let absolute = std::path::absolute(path)
            .map_err(|e| UUsageError::new(2, format!("bad preprocessor path {}: {e}", path.quote())))?;
        return Ok(absolute.to_string_lossy().into_owned());
    }
    match find_in_path("clang") {
        Some(clang) => Ok(clang.to_string_lossy().into_owned()),
        None => Err(PpguardError::PreprocessorNotFound.into()),
    }
}

fn buffering_prefix(matches: &ArgMatches) -> UResult<Vec<String>> {
    let ibuff = BufferMode::from_arg(matches.get_one::<String>(options::IBUFF).unwrap());
    let obuff = BufferMode::from_arg(matches.get_one::<String>(options::OBUFF).unwrap());
    let mut opts = Vec::new();
    match ibuff {
        BufferMode::Default => {}
        BufferMode::Line => {
            return Err(UUsageError::new(2, "Line buffered stdin is meaningless."));
        }
        BufferMode::Zero => opts.push("-i0".to_string()),
    }
    match obuff {
        BufferMode::Default => {}
        BufferMode::Line => opts.push("-oL".to_string()),
        BufferMode::Zero => opts.push("-o0".to_string()),
    }
    if opts.is_empty() {
        return Ok(opts);
    }
    let stdbuf = find_in_path("stdbuf").ok_or(PpguardError::StdbufNotFound)?;
    let mut prefix = vec![stdbuf.to_string_lossy().into_owned()];
    prefix.extend(opts);
    Ok(prefix)
}

pub(crate) fn find_in_path(name: &str) -> Option<PathBuf> {
    let paths = env::var_os("PATH")?;
    env::split_paths(&paths)
        .map(|dir| dir.join(name))
        .find(|candidate| candidate.is_file())
}
