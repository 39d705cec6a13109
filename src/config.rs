use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;

use crate::world::WorldConfig;

pub const USAGE: &str = "\
Usage: quadlife [OPTIONS] <PATTERN>

Run Conway's Game of Life on a plaintext (.cells) pattern and print the result.

Options:
  -g, --generations <N>  Number of generations to compute [default: 0]
  -a, --animate          Redraw the world in the terminal after every generation
  -b, --braille          Draw with braille characters, 2x4 cells each
      --fps <N>          Frames per second when animating [default: 10]
      --gc <N>           Drop unreachable nodes once more than N are stored
  -h, --help             Print this message
";

const DEFAULT_FPS: u32 = 10;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub path: PathBuf,

    /// Generations to compute. When animating, `0` means forever.
    pub generations: u64,

    pub animate: bool,
    pub braille: bool,
    pub fps: u32,
    pub gc_threshold: Option<usize>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Run(Config),
    Help,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing value for {flag}")]
    MissingValue { flag: String },

    #[error("Invalid value \"{value}\" for {flag}")]
    InvalidValue { flag: String, value: String },

    #[error("Unknown option \"{0}\"")]
    UnknownOption(String),

    #[error("A pattern file is required")]
    NoPattern,

    #[error("Only one pattern file can be given, found \"{0}\"")]
    ExtraArgument(String),
}

impl Config {
    /// Parse command line arguments, not including the program name.
    pub fn from_args<I>(args: I) -> Result<Command, ConfigError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut args = args.into_iter();

        let mut path = None;
        let mut generations = 0;
        let mut animate = false;
        let mut braille = false;
        let mut fps = DEFAULT_FPS;
        let mut gc_threshold = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "-h" | "--help" => return Ok(Command::Help),
                "-g" | "--generations" => generations = value(&arg, args.next())?,
                "-a" | "--animate" => animate = true,
                "-b" | "--braille" => braille = true,
                "--fps" => {
                    fps = value(&arg, args.next())?;

                    if fps == 0 {
                        return Err(ConfigError::InvalidValue {
                            flag: arg,
                            value: fps.to_string(),
                        });
                    }
                }
                "--gc" => gc_threshold = Some(value(&arg, args.next())?),
                flag if flag.starts_with('-') && flag.len() > 1 => {
                    return Err(ConfigError::UnknownOption(flag.to_string()));
                }
                _ => {
                    if path.is_some() {
                        return Err(ConfigError::ExtraArgument(arg));
                    }

                    path = Some(PathBuf::from(arg));
                }
            }
        }

        let path = path.ok_or(ConfigError::NoPattern)?;

        Ok(Command::Run(Config {
            path,
            generations,
            animate,
            braille,
            fps,
            gc_threshold,
        }))
    }

    pub fn world(&self) -> WorldConfig {
        WorldConfig {
            gc_threshold: self.gc_threshold,
        }
    }
}

fn value<T: FromStr>(flag: &str, value: Option<String>) -> Result<T, ConfigError> {
    let Some(value) = value else {
        return Err(ConfigError::MissingValue {
            flag: flag.to_string(),
        });
    };

    value.parse().map_err(|_| ConfigError::InvalidValue {
        flag: flag.to_string(),
        value,
    })
}
