use std::{
    fmt::{self, Formatter},
    io,
    path::PathBuf,
    result,
};

use kiln_shared::{derive_more::Display, thiserror};

use crate::config::BackingInteger;

pub type Result<T> = result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Frame file name is not a number: {}", .path.display())]
    InvalidFrameName { path: PathBuf },
    #[error("Failed to read directory '{}': {source}", .path.display())]
    UnreadableDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Identifier '{identifier}' is derived from both '{first}' and '{second}'")]
    DuplicateIdentifier { identifier: String, first: String, second: String },
    #[error("Identifier '{identifier}' derived from '{origin}' is not a valid identifier")]
    InvalidIdentifier { identifier: String, origin: String },
    #[error("{count} values don't fit into an enum backed by {backing}")]
    TooManyIdentifiers { count: usize, backing: BackingInteger },
    #[error("Invalid path: {}", .0.display())]
    InvalidPath(PathBuf),
    #[error("Invalid configuration in '{}': {message}", .path.display())]
    InvalidConfig { path: PathBuf, message: String },
    #[error("IoError: {0}")]
    IoError(#[from] io::Error),
}

/// Identifies an animation by its position in the directory taxonomy.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaxonomyKey {
    pub asset_type: String,
    pub subtype: String,
    pub animation: String,
}

impl TaxonomyKey {
    /// Creates a new [`TaxonomyKey`]. The names are stored verbatim.
    ///
    /// # Example
    ///
    /// ```rust
    /// use kiln_content::TaxonomyKey;
    /// let key = TaxonomyKey::new("Character", "Player", "idle");
    /// assert_eq!(key.to_string(), "Character/Player/idle");
    /// ```
    pub fn new(asset_type: impl Into<String>, subtype: impl Into<String>, animation: impl Into<String>) -> Self {
        Self {
            asset_type: asset_type.into(),
            subtype: subtype.into(),
            animation: animation.into(),
        }
    }
}

impl fmt::Display for TaxonomyKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.asset_type, self.subtype, self.animation)
    }
}

/// Position of an animation in the global identifier space.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AssetId(pub usize);

impl AssetId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Position of an animation in the mode space of its type and subtype.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ModeOrdinal(pub usize);

impl ModeOrdinal {
    pub fn index(self) -> usize {
        self.0
    }
}
