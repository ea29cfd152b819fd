//! Product category - a closed set of collections.

use serde::{Deserialize, Serialize};

/// Catalog collection a product belongs to.
///
/// Stored as lowercase text in the record store; parsing an unknown value
/// is a data-corruption error on the read path, never a panic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[default]
    Casual,
    Classic,
    Limited,
}

impl Category {
    /// All categories, in display order.
    pub const ALL: [Self; 3] = [Self::Casual, Self::Classic, Self::Limited];

    /// Stable lowercase name, as persisted.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Casual => "casual",
            Self::Classic => "classic",
            Self::Limited => "limited",
        }
    }

    /// Human-facing label for templates.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Casual => "Casual",
            Self::Classic => "Classic",
            Self::Limited => "Limited",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "casual" => Ok(Self::Casual),
            "classic" => Ok(Self::Classic),
            "limited" => Ok(Self::Limited),
            _ => Err(format!("invalid category: {s}")),
        }
    }
}
