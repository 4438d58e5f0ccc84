//! Request grammar.
//!
//! A request is a single line of whitespace-separated tokens. The first
//! token is the verb; `Start` takes optional `key=value` options and every
//! other verb takes a fixed number of positional arguments.

use std::fmt;
use std::str::FromStr;

use rpicamera_core::{AwbGains, Resolution, ZoomRect};

use crate::error::{ProtocolError, ProtocolResult};

/// Experiment number used when `Start` omits `Experiment=`.
pub const DEFAULT_EXPERIMENT: u32 = 0;

/// Recording number used when `Start` omits `Recording=`.
pub const DEFAULT_RECORDING: u32 = 1;

/// Options carried by a `Start` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartArgs {
    /// Experiment number.
    pub experiment: u32,
    /// Recording number within the experiment.
    pub recording: u32,
    /// Directory the acquisition software records into. Only its last
    /// component is used.
    pub path: Option<String>,
}

impl Default for StartArgs {
    fn default() -> Self {
        Self {
            experiment: DEFAULT_EXPERIMENT,
            recording: DEFAULT_RECORDING,
            path: None,
        }
    }
}

/// A parsed request.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Start(StartArgs),
    Stop,
    Close,
    Resolution(Resolution),
    Framerate(f64),
    ResetGains,
    GetGains,
    SetGains(AwbGains),
    VFlip(bool),
    HFlip(bool),
    Zoom(ZoomRect),
    /// A verb this server does not know. Not an error: it gets its own reply.
    Unknown(String),
}

impl Command {
    /// Parses a raw request.
    pub fn from_bytes(bytes: &[u8]) -> ProtocolResult<Self> {
        std::str::from_utf8(bytes)
            .map_err(|_| ProtocolError::InvalidEncoding)?
            .parse()
    }

    /// Returns the wire verb.
    pub fn verb(&self) -> &str {
        match self {
            Self::Start(_) => "Start",
            Self::Stop => "Stop",
            Self::Close => "Close",
            Self::Resolution(_) => "Resolution",
            Self::Framerate(_) => "Framerate",
            Self::ResetGains => "ResetGains",
            Self::GetGains => "GetGains",
            Self::SetGains(_) => "SetGains",
            Self::VFlip(_) => "VFlip",
            Self::HFlip(_) => "HFlip",
            Self::Zoom(_) => "Zoom",
            Self::Unknown(verb) => verb,
        }
    }
}

impl FromStr for Command {
    type Err = ProtocolError;

    fn from_str(request: &str) -> ProtocolResult<Self> {
        let mut tokens = request.split_whitespace();
        let verb = tokens.next().ok_or(ProtocolError::EmptyRequest)?;
        let args: Vec<&str> = tokens.collect();

        let command = match verb {
            "Start" => Self::Start(parse_start(verb, &args)?),
            "Stop" => {
                expect_args(verb, &args, 0)?;
                Self::Stop
            }
            "Close" => {
                expect_args(verb, &args, 0)?;
                Self::Close
            }
            "Resolution" => {
                expect_args(verb, &args, 2)?;
                Self::Resolution(Resolution::new(
                    parse_int(verb, args[0])?,
                    parse_int(verb, args[1])?,
                ))
            }
            "Framerate" => {
                expect_args(verb, &args, 1)?;
                Self::Framerate(parse_float(verb, args[0])?)
            }
            "ResetGains" => {
                expect_args(verb, &args, 0)?;
                Self::ResetGains
            }
            "GetGains" => {
                expect_args(verb, &args, 0)?;
                Self::GetGains
            }
            "SetGains" => {
                expect_args(verb, &args, 2)?;
                Self::SetGains(AwbGains::new(
                    parse_float(verb, args[0])?,
                    parse_float(verb, args[1])?,
                ))
            }
            "VFlip" => {
                expect_args(verb, &args, 1)?;
                Self::VFlip(parse_flag(verb, args[0])?)
            }
            "HFlip" => {
                expect_args(verb, &args, 1)?;
                Self::HFlip(parse_flag(verb, args[0])?)
            }
            "Zoom" => {
                expect_args(verb, &args, 4)?;
                Self::Zoom(ZoomRect {
                    x0: parse_float(verb, args[0])?,
                    y0: parse_float(verb, args[1])?,
                    x1: parse_float(verb, args[2])?,
                    y1: parse_float(verb, args[3])?,
                })
            }
            other => Self::Unknown(other.to_string()),
        };

        Ok(command)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start(args) => {
                write!(
                    f,
                    "Start Experiment={} Recording={}",
                    args.experiment, args.recording
                )?;
                if let Some(path) = &args.path {
                    write!(f, " Path={path}")?;
                }
                Ok(())
            }
            Self::Resolution(r) => write!(f, "Resolution {} {}", r.width, r.height),
            Self::Framerate(fps) => write!(f, "Framerate {fps}"),
            Self::SetGains(g) => write!(f, "SetGains {} {}", g.red, g.blue),
            Self::VFlip(on) => write!(f, "VFlip {}", u8::from(*on)),
            Self::HFlip(on) => write!(f, "HFlip {}", u8::from(*on)),
            Self::Zoom(z) => write!(f, "Zoom {} {} {} {}", z.x0, z.y0, z.x1, z.y1),
            other => f.write_str(other.verb()),
        }
    }
}

fn expect_args(verb: &str, args: &[&str], expected: usize) -> ProtocolResult<()> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(ProtocolError::arity(verb, expected, args.len()))
    }
}

fn parse_int(verb: &str, token: &str) -> ProtocolResult<u32> {
    token
        .parse()
        .map_err(|_| ProtocolError::invalid_number(verb, "integer", token))
}

fn parse_float(verb: &str, token: &str) -> ProtocolResult<f64> {
    match token.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(ProtocolError::invalid_number(verb, "number", token)),
    }
}

// Any integer is accepted; positive means on.
fn parse_flag(verb: &str, token: &str) -> ProtocolResult<bool> {
    token
        .parse::<i64>()
        .map(|v| v > 0)
        .map_err(|_| ProtocolError::invalid_number(verb, "flag", token))
}

fn parse_start(verb: &str, args: &[&str]) -> ProtocolResult<StartArgs> {
    let mut start = StartArgs::default();
    for token in args {
        let (key, value) = token
            .split_once('=')
            .ok_or_else(|| ProtocolError::MalformedOption {
                verb: verb.to_string(),
                token: token.to_string(),
            })?;
        match key {
            "Experiment" => start.experiment = parse_int(verb, value)?,
            "Recording" => start.recording = parse_int(verb, value)?,
            "Path" => start.path = Some(value.to_string()),
            _ => {}
        }
    }
    Ok(start)
}
