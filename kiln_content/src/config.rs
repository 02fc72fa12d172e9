use std::{
    fmt::{self, Formatter},
    fs,
    path::{Path, PathBuf},
};

use kiln_shared::{
    log::{info, trace},
    serde_yaml,
};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// File that is read by the tool when no other configuration file is given.
pub const DEFAULT_CONFIG_FILE_NAME: &str = "kiln.yaml";

pub const DEFAULT_ASSET_ROOT: &str = "assets/visual";
pub const DEFAULT_OUTPUT_PATH: &str = "src/visual_assets.zig";

/// Determines which sections are part of the manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ManifestVariant {
    /// Identifiers, modes, asset table and frame counts.
    Basic,
    /// Additionally declares the texture storage that the runtime fills when loading.
    #[default]
    Extended,
}

/// Order in which the frames of an animation are played.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameOrdering {
    /// The file stem is parsed as an unsigned integer. Fails for any other file name.
    #[default]
    Numeric,
    /// Plain lexicographic order of the file names.
    FileName,
}

/// Integer type backing the generated enums.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackingInteger {
    U8,
    #[default]
    U16,
    U32,
}

impl BackingInteger {
    /// Name of the integer type in the generated code.
    pub fn as_str(self) -> &'static str {
        match self {
            BackingInteger::U8 => "u8",
            BackingInteger::U16 => "u16",
            BackingInteger::U32 => "u32",
        }
    }

    /// Number of distinct values an enum with this backing integer can hold.
    pub fn capacity(self) -> u64 {
        match self {
            BackingInteger::U8 => 1 << 8,
            BackingInteger::U16 => 1 << 16,
            BackingInteger::U32 => 1 << 32,
        }
    }

    /// Fails with [`Error::TooManyIdentifiers`] when `count` values can't be represented.
    pub fn check_capacity(self, count: usize) -> Result<()> {
        if count as u64 > self.capacity() {
            return Err(Error::TooManyIdentifiers { count, backing: self });
        }
        Ok(())
    }
}

impl fmt::Display for BackingInteger {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration of a compiler run.
///
/// The defaults describe the regular project layout, so a project following it doesn't need
/// a configuration file at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ManifestConfig {
    /// Directory containing the `<Type>/<Subtype>/<Animation>/<frame>` hierarchy
    pub asset_root: PathBuf,
    /// File the manifest is written to
    pub output_path: PathBuf,
    /// Frame paths in the asset table are relative to this directory
    pub base_directory: PathBuf,
    pub variant: ManifestVariant,
    pub frame_ordering: FrameOrdering,
    pub backing_integer: BackingInteger,
    /// Number of spaces per indentation level
    pub indent_width: usize,
    /// Ignore files and directories whose name starts with a dot
    pub skip_hidden: bool,
    /// Only files with one of these extensions are frames. All files are frames when empty.
    pub frame_extensions: Vec<String>,
    /// Expression the runtime texture handle type is bound to
    pub texture_import: String,
    /// Emit the comptime `EntityMode.init` helper
    pub construction_helper: bool,
    /// Name written into the header of the generated file
    pub generator: String,
}

impl Default for ManifestConfig {
    fn default() -> Self {
        Self {
            asset_root: PathBuf::from(DEFAULT_ASSET_ROOT),
            output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
            base_directory: PathBuf::from("."),
            variant: ManifestVariant::default(),
            frame_ordering: FrameOrdering::default(),
            backing_integer: BackingInteger::default(),
            indent_width: 4,
            skip_hidden: true,
            frame_extensions: Vec::new(),
            texture_import: "@import(\"sdl2\").SDL_Texture".to_owned(),
            construction_helper: true,
            generator: "kiln".to_owned(),
        }
    }
}

impl ManifestConfig {
    /// Loads the configuration from the YAML file at `path`.
    ///
    /// When the file doesn't exist, the default configuration is returned. Relative paths in
    /// the file are relative to the directory of the file.
    ///
    /// # Example
    ///
    /// ```rust
    /// use kiln_content::ManifestConfig;
    /// let config = ManifestConfig::load("does_not_exist.yaml").unwrap();
    /// assert_eq!(config, ManifestConfig::default());
    /// ```
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            info!("Configuration file '{}' doesn't exist, using the defaults", path.display());
            return Ok(Self::default());
        }

        info!("Loading configuration from '{}'", path.display());
        let content = fs::read_to_string(path).map_err(|err| Error::InvalidConfig {
            path: path.to_owned(),
            message: err.to_string(),
        })?;
        let mut config = Self::from_yaml(&content).map_err(|err| Error::InvalidConfig {
            path: path.to_owned(),
            message: err.to_string(),
        })?;
        if let Some(directory) = path.parent() {
            config.resolve_relative_to(directory);
        }
        trace!("Configuration: {config:#?}");
        Ok(config)
    }

    /// Parses the configuration from a YAML string. Missing fields have their default value.
    pub fn from_yaml(content: &str) -> std::result::Result<Self, serde_yaml::Error> {
        // An empty document deserializes to null which isn't a map.
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content)
    }

    fn resolve_relative_to(&mut self, directory: &Path) {
        for path in [&mut self.asset_root, &mut self.output_path, &mut self.base_directory] {
            if path.is_relative() {
                *path = directory.join(&*path);
            }
        }
    }

    /// Whether the texture storage is part of the manifest.
    pub fn has_texture_storage(&self) -> bool {
        self.variant == ManifestVariant::Extended
    }
}

#[cfg(test)]
mod tests {
    use kiln_shared::indoc::indoc;
    use tempdir::TempDir;

    use super::*;

    #[test]
    fn defaults() {
        let config = ManifestConfig::default();
        assert_eq!(config.asset_root, Path::new("assets/visual"));
        assert_eq!(config.output_path, Path::new("src/visual_assets.zig"));
        assert_eq!(config.frame_ordering, FrameOrdering::Numeric);
        assert_eq!(config.backing_integer, BackingInteger::U16);
        assert!(config.has_texture_storage());
    }

    #[test]
    fn parse_partial() {
        let content = indoc! {"
            variant: basic
            frame_ordering: file_name
            backing_integer: u8
            frame_extensions: [png]
        "};
        let config = ManifestConfig::from_yaml(content).unwrap();
        assert_eq!(config.variant, ManifestVariant::Basic);
        assert_eq!(config.frame_ordering, FrameOrdering::FileName);
        assert_eq!(config.backing_integer, BackingInteger::U8);
        assert_eq!(config.frame_extensions, vec!["png".to_owned()]);
        assert_eq!(config.indent_width, 4);
        assert!(!config.has_texture_storage());
    }

    #[test]
    fn parse_empty() {
        assert_eq!(ManifestConfig::from_yaml("").unwrap(), ManifestConfig::default());
    }

    #[test]
    fn unknown_field() {
        assert!(ManifestConfig::from_yaml("asset_rot: assets").is_err());
    }

    #[test]
    fn load_resolves_relative_paths() {
        let root = TempDir::new("root").unwrap();
        let config_path = root.path().join("kiln.yaml");
        fs::write(&config_path, "asset_root: art\noutput_path: /tmp/out.zig\n").unwrap();
        let config = ManifestConfig::load(&config_path).unwrap();
        assert_eq!(config.asset_root, root.path().join("art"));
        assert_eq!(config.output_path, Path::new("/tmp/out.zig"));
        assert_eq!(config.base_directory, root.path().join("."));
    }

    #[test]
    fn load_malformed() {
        let root = TempDir::new("root").unwrap();
        let config_path = root.path().join("kiln.yaml");
        fs::write(&config_path, "variant: [").unwrap();
        let result = ManifestConfig::load(&config_path);
        assert!(matches!(result, Err(Error::InvalidConfig { .. })));
    }

    #[test]
    fn load_unreadable() {
        let root = TempDir::new("root").unwrap();
        let config_path = root.path().join("kiln.yaml");
        fs::create_dir(&config_path).unwrap();
        match ManifestConfig::load(&config_path) {
            Err(Error::InvalidConfig { path, .. }) => assert_eq!(path, config_path),
            other => panic!("expected InvalidConfig, got {other:?}"),
        }
    }

    #[test]
    fn backing_integer_capacity() {
        assert!(BackingInteger::U8.check_capacity(256).is_ok());
        assert!(matches!(
            BackingInteger::U8.check_capacity(257),
            Err(Error::TooManyIdentifiers {
                count: 257,
                backing: BackingInteger::U8
            })
        ));
        assert_eq!(BackingInteger::U32.to_string(), "u32");
    }
}
