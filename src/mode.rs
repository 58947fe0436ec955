//! Test run modes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RunError;

/// Execution context a test runs under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    /// Static, non-interactive context.
    Edit,
    /// Interactive context with the host running.
    Play,
}

impl RunMode {
    pub const ALL: [RunMode; 2] = [RunMode::Edit, RunMode::Play];

    /// Lowercase name used on the wire and in config.
    pub fn as_str(&self) -> &'static str {
        match self {
            RunMode::Edit => "edit",
            RunMode::Play => "play",
        }
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunMode::Edit => write!(f, "Edit"),
            RunMode::Play => write!(f, "Play"),
        }
    }
}

impl FromStr for RunMode {
    type Err = RunError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "edit" | "editmode" => Ok(RunMode::Edit),
            "play" | "playmode" => Ok(RunMode::Play),
            _ => Err(RunError::InvalidMode(s.trim().to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("play".parse::<RunMode>().unwrap(), RunMode::Play);
        assert_eq!("PLAY".parse::<RunMode>().unwrap(), RunMode::Play);
        assert_eq!(" Edit ".parse::<RunMode>().unwrap(), RunMode::Edit);
    }

    #[test]
    fn test_parse_accepts_editor_aliases() {
        assert_eq!("PlayMode".parse::<RunMode>().unwrap(), RunMode::Play);
        assert_eq!("editmode".parse::<RunMode>().unwrap(), RunMode::Edit);
    }

    #[test]
    fn test_parse_rejects_unknown() {
        let err = "runtime".parse::<RunMode>().unwrap_err();
        assert!(matches!(err, RunError::InvalidMode(ref m) if m == "runtime"));
        assert!(err.to_string().contains("'runtime'"));
    }

    #[test]
    fn test_display_and_wire_forms() {
        assert_eq!(RunMode::Play.to_string(), "Play");
        assert_eq!(RunMode::Edit.as_str(), "edit");
        assert_eq!(serde_json::to_string(&RunMode::Play).unwrap(), "\"play\"");
    }
}
