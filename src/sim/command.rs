//! Commands delivered to the controller, one at a time

use std::str::FromStr;

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::grid::Cell;

/// Manual movement direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    North,
    South,
    East,
    West,
}

impl Direction {
    /// Displacement for one step of `step` degrees (x = lat, y = lng)
    pub fn offset(self, step: f64) -> DVec2 {
        match self {
            Direction::North => DVec2::new(step, 0.0),
            Direction::South => DVec2::new(-step, 0.0),
            Direction::East => DVec2::new(0.0, step),
            Direction::West => DVec2::new(0.0, -step),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::North => "north",
            Direction::South => "south",
            Direction::East => "east",
            Direction::West => "west",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "north" | "n" => Some(Direction::North),
            "south" | "s" => Some(Direction::South),
            "east" | "e" => Some(Direction::East),
            "west" | "w" => Some(Direction::West),
            _ => None,
        }
    }
}

/// A single user or position-feed event
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Command {
    /// Step one cell
    Move(Direction),
    /// Position feed update (lat, lng)
    PositionUpdate { lat: f64, lng: f64 },
    /// Position feed denied or failed
    PositionUnavailable,
    /// Turn the position feed on/off
    SetTracking(bool),
    /// Take one coin from the cache at this cell
    Collect(Cell),
    /// Put one held coin into the cache at this cell
    Deposit(Cell),
    /// Wipe everything and start over
    Reset,
}

impl FromStr for Command {
    type Err = String;

    /// Parse the text form used by the native driver and the web facade:
    /// `north`, `goto <lat> <lng>`, `collect <i> <j>`, `deposit <i> <j>`,
    /// `track on|off`, `lost`, `reset`.
    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let verb = words.next().ok_or_else(|| "empty command".to_string())?;
        let args: Vec<&str> = words.collect();

        if let Some(direction) = Direction::from_str(verb) {
            return Ok(Command::Move(direction));
        }

        match (verb.to_lowercase().as_str(), args.as_slice()) {
            ("goto", [lat, lng]) => Ok(Command::PositionUpdate {
                lat: parse_num(lat)?,
                lng: parse_num(lng)?,
            }),
            ("collect", [i, j]) => Ok(Command::Collect(Cell::new(parse_num(i)?, parse_num(j)?))),
            ("deposit", [i, j]) => Ok(Command::Deposit(Cell::new(parse_num(i)?, parse_num(j)?))),
            ("track", ["on"]) => Ok(Command::SetTracking(true)),
            ("track", ["off"]) => Ok(Command::SetTracking(false)),
            ("lost", []) => Ok(Command::PositionUnavailable),
            ("reset", []) => Ok(Command::Reset),
            _ => Err(format!("unrecognized command `{}`", line.trim())),
        }
    }
}

fn parse_num<T: FromStr>(word: &str) -> Result<T, String> {
    word.parse().map_err(|_| format!("bad number `{word}`"))
}
