//! Operator command language.
//!
//! The console has no pointer or form widgets; an operator (or a script)
//! drives it with one command per line on stdin.  Each line parses into an
//! [`OperatorCommand`]:
//!
//! ```text
//! map <id>                      select the active map
//! view anchors|locate|telemetry select the active view
//! image <w> <h>                 native size of the active map image
//! container <w> <h>             size of the display area
//! fit contain|cover             image fitting mode
//! scale <ratio>                 set the active map's pixels per meter
//! anchor <mac> <x> <y>          place an anchor (meters)
//! clear <mac>                   remove an anchor from the active map
//! remove <mac>                  remove a beacon from the server list
//! calibrate                     start two-point calibration
//! click <x> <y>                 click at container pixels
//! distance <meters>             finish calibration
//! cancel                        abort calibration and any drag
//! down <mac> <x> <y> [pointer]  start dragging an anchor
//! move <x> <y> [pointer]        move the drag pointer
//! up [pointer]                  release the drag pointer
//! frame                         flush one rendering frame now
//! show <what>                   print maps|scale|anchors|locate|telemetry|beacons|status
//! help                          list commands
//! quit                          exit
//! ```
//!
//! Blank lines and lines starting with `#` are ignored.

use std::str::FromStr;

use locate_core::{FitMode, IdentityError, MacAddress, ScreenPoint};
use thiserror::Error;

use crate::domain::ActiveView;

/// Pointer id used when a drag command does not name one.
pub const DEFAULT_POINTER: u32 = 1;

/// Errors produced while parsing an operator line.
#[derive(Debug, Error, PartialEq)]
pub enum CommandParseError {
    #[error("unknown command {0:?}; type `help` for a list")]
    UnknownCommand(String),

    #[error("`{command}` needs a {argument} argument")]
    MissingArgument {
        command: &'static str,
        argument: &'static str,
    },

    #[error("`{command}` takes at most {max} arguments")]
    TooManyArguments { command: &'static str, max: usize },

    #[error("`{command}`: {value:?} is not a number")]
    InvalidNumber { command: &'static str, value: String },

    #[error("invalid beacon identity: {0}")]
    InvalidIdentity(#[from] IdentityError),

    #[error("unknown view {0:?}; expected anchors, locate, or telemetry")]
    InvalidView(String),

    #[error("unknown fit mode {0:?}; expected contain or cover")]
    InvalidFit(String),

    #[error("unknown show target {0:?}")]
    InvalidShowTarget(String),
}

/// What `show` prints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShowTarget {
    Maps,
    Scale,
    Anchors,
    Locate,
    Telemetry,
    Beacons,
    Status,
}

impl FromStr for ShowTarget {
    type Err = CommandParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "maps" => Ok(ShowTarget::Maps),
            "scale" => Ok(ShowTarget::Scale),
            "anchors" => Ok(ShowTarget::Anchors),
            "locate" => Ok(ShowTarget::Locate),
            "telemetry" => Ok(ShowTarget::Telemetry),
            "beacons" => Ok(ShowTarget::Beacons),
            "status" => Ok(ShowTarget::Status),
            other => Err(CommandParseError::InvalidShowTarget(other.to_string())),
        }
    }
}

/// One parsed operator line.
#[derive(Debug, Clone, PartialEq)]
pub enum OperatorCommand {
    Map(String),
    View(ActiveView),
    Image { width: f64, height: f64 },
    Container { width: f64, height: f64 },
    Fit(FitMode),
    Scale(f64),
    Anchor { mac: MacAddress, x: f64, y: f64 },
    Clear(MacAddress),
    Remove(MacAddress),
    Calibrate,
    Click(ScreenPoint),
    Distance(f64),
    Cancel,
    Down { mac: MacAddress, at: ScreenPoint, pointer: u32 },
    Move { at: ScreenPoint, pointer: u32 },
    Up { pointer: u32 },
    Frame,
    Show(ShowTarget),
    Help,
    Quit,
}

impl OperatorCommand {
    /// Parses one line.  Returns `Ok(None)` for blank lines and comments.
    ///
    /// # Errors
    ///
    /// See [`CommandParseError`].
    pub fn parse(line: &str) -> Result<Option<Self>, CommandParseError> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }
        let mut words = line.split_whitespace();
        let Some(head) = words.next() else {
            return Ok(None);
        };
        let args: Vec<&str> = words.collect();

        let cmd = match head.to_ascii_lowercase().as_str() {
            "map" => {
                let a = Args::new("map", &args, 1)?;
                OperatorCommand::Map(a.word(0, "map id")?.to_string())
            }
            "view" => {
                let a = Args::new("view", &args, 1)?;
                let name = a.word(0, "view name")?;
                OperatorCommand::View(
                    name.parse()
                        .map_err(|_| CommandParseError::InvalidView(name.to_string()))?,
                )
            }
            "image" => {
                let a = Args::new("image", &args, 2)?;
                OperatorCommand::Image {
                    width: a.number(0, "width")?,
                    height: a.number(1, "height")?,
                }
            }
            "container" => {
                let a = Args::new("container", &args, 2)?;
                OperatorCommand::Container {
                    width: a.number(0, "width")?,
                    height: a.number(1, "height")?,
                }
            }
            "fit" => {
                let a = Args::new("fit", &args, 1)?;
                let name = a.word(0, "fit mode")?;
                OperatorCommand::Fit(
                    name.parse()
                        .map_err(|_| CommandParseError::InvalidFit(name.to_string()))?,
                )
            }
            "scale" => {
                let a = Args::new("scale", &args, 1)?;
                OperatorCommand::Scale(a.number(0, "ratio")?)
            }
            "anchor" => {
                let a = Args::new("anchor", &args, 3)?;
                OperatorCommand::Anchor {
                    mac: a.mac(0)?,
                    x: a.number(1, "x")?,
                    y: a.number(2, "y")?,
                }
            }
            "clear" => OperatorCommand::Clear(Args::new("clear", &args, 1)?.mac(0)?),
            "remove" => OperatorCommand::Remove(Args::new("remove", &args, 1)?.mac(0)?),
            "calibrate" => {
                Args::new("calibrate", &args, 0)?;
                OperatorCommand::Calibrate
            }
            "click" => {
                let a = Args::new("click", &args, 2)?;
                OperatorCommand::Click(ScreenPoint::new(a.number(0, "x")?, a.number(1, "y")?))
            }
            "distance" => {
                let a = Args::new("distance", &args, 1)?;
                OperatorCommand::Distance(a.number(0, "meters")?)
            }
            "cancel" => {
                Args::new("cancel", &args, 0)?;
                OperatorCommand::Cancel
            }
            "down" => {
                let a = Args::new("down", &args, 4)?;
                OperatorCommand::Down {
                    mac: a.mac(0)?,
                    at: ScreenPoint::new(a.number(1, "x")?, a.number(2, "y")?),
                    pointer: a.pointer(3)?,
                }
            }
            "move" => {
                let a = Args::new("move", &args, 3)?;
                OperatorCommand::Move {
                    at: ScreenPoint::new(a.number(0, "x")?, a.number(1, "y")?),
                    pointer: a.pointer(2)?,
                }
            }
            "up" => {
                let a = Args::new("up", &args, 1)?;
                OperatorCommand::Up { pointer: a.pointer(0)? }
            }
            "frame" => {
                Args::new("frame", &args, 0)?;
                OperatorCommand::Frame
            }
            "show" => {
                let a = Args::new("show", &args, 1)?;
                OperatorCommand::Show(a.word(0, "target")?.parse()?)
            }
            "help" | "?" => OperatorCommand::Help,
            "quit" | "exit" => OperatorCommand::Quit,
            other => return Err(CommandParseError::UnknownCommand(other.to_string())),
        };
        Ok(Some(cmd))
    }
}

/// Positional argument accessor for one command.
struct Args<'a> {
    command: &'static str,
    args: &'a [&'a str],
}

impl<'a> Args<'a> {
    fn new(command: &'static str, args: &'a [&'a str], max: usize) -> Result<Self, CommandParseError> {
        if args.len() > max {
            return Err(CommandParseError::TooManyArguments { command, max });
        }
        Ok(Self { command, args })
    }

    fn word(&self, i: usize, argument: &'static str) -> Result<&'a str, CommandParseError> {
        self.args.get(i).copied().ok_or(CommandParseError::MissingArgument {
            command: self.command,
            argument,
        })
    }

    fn number(&self, i: usize, argument: &'static str) -> Result<f64, CommandParseError> {
        let raw = self.word(i, argument)?;
        raw.parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .ok_or_else(|| CommandParseError::InvalidNumber {
                command: self.command,
                value: raw.to_string(),
            })
    }

    fn mac(&self, i: usize) -> Result<MacAddress, CommandParseError> {
        Ok(MacAddress::parse(self.word(i, "mac")?)?)
    }

    /// Optional trailing pointer id.
    fn pointer(&self, i: usize) -> Result<u32, CommandParseError> {
        match self.args.get(i) {
            None => Ok(DEFAULT_POINTER),
            Some(raw) => raw.parse().map_err(|_| CommandParseError::InvalidNumber {
                command: self.command,
                value: raw.to_string(),
            }),
        }
    }
}

/// Text printed by `help`.
pub const HELP: &str = "\
map <id> | view anchors|locate|telemetry | image <w> <h> | container <w> <h>
fit contain|cover | scale <ratio> | anchor <mac> <x> <y> | clear <mac> | remove <mac>
calibrate | click <x> <y> | distance <m> | cancel
down <mac> <x> <y> [ptr] | move <x> <y> [ptr] | up [ptr] | frame
show maps|scale|anchors|locate|telemetry|beacons|status | help | quit";

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> OperatorCommand {
        OperatorCommand::parse(line).unwrap().unwrap()
    }

    #[test]
    fn test_parse_blank_and_comment_lines_are_skipped() {
        assert_eq!(OperatorCommand::parse("   "), Ok(None));
        assert_eq!(OperatorCommand::parse("# note"), Ok(None));
    }

    #[test]
    fn test_parse_anchor_normalizes_mac() {
        let cmd = parse("anchor aa-bb-cc-dd-ee-ff 1.5 -2");
        assert_eq!(
            cmd,
            OperatorCommand::Anchor {
                mac: MacAddress::parse("AA:BB:CC:DD:EE:FF").unwrap(),
                x: 1.5,
                y: -2.0,
            }
        );
    }

    #[test]
    fn test_parse_drag_commands_default_pointer() {
        assert_eq!(
            parse("move 10 20"),
            OperatorCommand::Move { at: ScreenPoint::new(10.0, 20.0), pointer: DEFAULT_POINTER }
        );
        assert_eq!(parse("up 7"), OperatorCommand::Up { pointer: 7 });
    }

    #[test]
    fn test_parse_is_case_insensitive_for_keywords() {
        assert_eq!(parse("VIEW Locate"), OperatorCommand::View(ActiveView::Locate));
        assert_eq!(parse("Fit COVER"), OperatorCommand::Fit(FitMode::Cover));
        assert_eq!(parse("show Beacons"), OperatorCommand::Show(ShowTarget::Beacons));
    }

    #[test]
    fn test_parse_rejects_unknown_command() {
        assert_eq!(
            OperatorCommand::parse("teleport 1 2"),
            Err(CommandParseError::UnknownCommand("teleport".into()))
        );
    }

    #[test]
    fn test_parse_reports_missing_argument() {
        assert_eq!(
            OperatorCommand::parse("distance"),
            Err(CommandParseError::MissingArgument { command: "distance", argument: "meters" })
        );
    }

    #[test]
    fn test_parse_rejects_non_numeric_and_nan() {
        assert!(matches!(
            OperatorCommand::parse("scale abc"),
            Err(CommandParseError::InvalidNumber { .. })
        ));
        assert!(matches!(
            OperatorCommand::parse("distance NaN"),
            Err(CommandParseError::InvalidNumber { .. })
        ));
    }

    #[test]
    fn test_parse_rejects_extra_arguments() {
        assert_eq!(
            OperatorCommand::parse("calibrate now"),
            Err(CommandParseError::TooManyArguments { command: "calibrate", max: 0 })
        );
    }

    #[test]
    fn test_parse_rejects_bad_mac() {
        assert!(matches!(
            OperatorCommand::parse("remove C3:00"),
            Err(CommandParseError::InvalidIdentity(_))
        ));
    }
}
