//! Difficulty level and transient change indicator

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::ReasonCode;
use crate::{DEFAULT_LEVEL, MAX_LEVEL, MIN_LEVEL};

/// Question difficulty, always within [1, 5]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct DifficultyLevel(u8);

impl DifficultyLevel {
    pub const MIN: Self = Self(MIN_LEVEL);
    pub const MAX: Self = Self(MAX_LEVEL);

    /// Clamp any integer into range
    pub fn clamped(value: i64) -> Self {
        Self(value.clamp(MIN_LEVEL as i64, MAX_LEVEL as i64) as u8)
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// One step easier, saturating at 1
    pub fn lower(self) -> Self {
        Self::clamped(self.0 as i64 - 1)
    }

    /// One step harder, saturating at 5
    pub fn raise(self) -> Self {
        Self::clamped(self.0 as i64 + 1)
    }

    pub fn label(self) -> &'static str {
        match self.0 {
            1 => "Very Easy",
            2 => "Easy",
            3 => "Medium",
            4 => "Hard",
            _ => "Very Hard",
        }
    }
}

impl Default for DifficultyLevel {
    fn default() -> Self {
        Self(DEFAULT_LEVEL)
    }
}

impl TryFrom<u8> for DifficultyLevel {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if (MIN_LEVEL..=MAX_LEVEL).contains(&value) {
            Ok(Self(value))
        } else {
            Err(format!("difficulty {} outside {}..={}", value, MIN_LEVEL, MAX_LEVEL))
        }
    }
}

impl From<DifficultyLevel> for u8 {
    fn from(level: DifficultyLevel) -> Self {
        level.0
    }
}

impl std::fmt::Display for DifficultyLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Direction of the last difficulty change, shown briefly then cleared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeDirection {
    #[default]
    None,
    Up,
    Down,
}

impl ChangeDirection {
    pub fn arrow(&self) -> &'static str {
        match self {
            ChangeDirection::None => "",
            ChangeDirection::Up => "↑",
            ChangeDirection::Down => "↓",
        }
    }
}

/// Difficulty state owned by the controller
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DifficultyState {
    pub level: DifficultyLevel,
    pub changed_direction: ChangeDirection,
    pub cooldown_active: bool,
}

impl DifficultyState {
    pub fn new(level: DifficultyLevel) -> Self {
        Self {
            level,
            ..Self::default()
        }
    }
}

/// One applied difficulty decision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DifficultyChange {
    pub from: DifficultyLevel,
    pub to: DifficultyLevel,
    pub direction: ChangeDirection,
    pub reason: ReasonCode,
    pub at: DateTime<Utc>,
}
