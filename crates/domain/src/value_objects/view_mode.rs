use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// How a selected story is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    /// Render the story on its own
    #[default]
    Story,
    /// Render the story's documentation page
    Docs,
}

impl ViewMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViewMode::Story => "story",
            ViewMode::Docs => "docs",
        }
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ViewMode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "story" => Ok(ViewMode::Story),
            "docs" => Ok(ViewMode::Docs),
            other => Err(DomainError::UnknownViewMode(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_modes_case_insensitively() {
        assert_eq!("Docs".parse::<ViewMode>(), Ok(ViewMode::Docs));
        assert_eq!(" story ".parse::<ViewMode>(), Ok(ViewMode::Story));
    }

    #[test]
    fn rejects_unknown_mode() {
        assert_eq!(
            "canvas".parse::<ViewMode>(),
            Err(DomainError::UnknownViewMode("canvas".into()))
        );
    }
}
