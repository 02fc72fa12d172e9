//! Runs the complete compilation from the asset directory to the written manifest.

use std::{env, path::Path};

use kiln_shared::{log::info, pathdiff};

use crate::{
    identifier::DeriveOptions,
    output::{self, WriteOutcome},
    AssetTree, Error, FileSystem, IdentifierDeriver, Manifest, ManifestConfig, Result, TaxonomyBuilder, TaxonomySource,
    ZigEmitter,
};

/// Summary of a [`compile`] run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompileReport {
    pub identifiers: usize,
    pub frames: usize,
    pub outcome: WriteOutcome,
}

/// Compiles an [`AssetTree`] into the [`Manifest`] and its rendered code without touching the file system.
///
/// # Example
///
/// ```rust
/// use kiln_content::{pipeline, AssetTree, ManifestConfig};
/// let tree = AssetTree::new("assets/visual").with_frame("Character", "Player", "idle", "1.png");
/// let (manifest, code) = pipeline::compile_tree(&tree, &ManifestConfig::default()).unwrap();
/// assert_eq!(manifest.identifiers, vec!["CHARACTER_PLAYER_IDLE"]);
/// assert!(code.contains(".{ .path = \"assets/visual/Character/Player/idle/1.png\", .id = .CHARACTER_PLAYER_IDLE },"));
/// ```
pub fn compile_tree(tree: &AssetTree, config: &ManifestConfig) -> Result<(Manifest, String)> {
    let mut builder = TaxonomyBuilder::new();
    builder.extend(tree.walk(config.frame_ordering))?;
    let taxonomy = builder.build();
    info!(
        "Found {} animations with {} frames in {} groups",
        taxonomy.asset_count(),
        taxonomy.frame_count(),
        taxonomy.groups().len()
    );

    let manifest = IdentifierDeriver::new(DeriveOptions::from_config(config)).derive(&taxonomy)?;
    debug_assert!(manifest.is_consistent(), "Derived an inconsistent manifest: {manifest:#?}");

    let code = ZigEmitter::from_config(config).emit(&manifest);
    Ok((manifest, code))
}

/// Reads the asset tree, compiles it and writes the manifest to the configured output path.
///
/// Nothing is written when any step fails, so the previous manifest stays intact.
pub fn compile(config: &ManifestConfig) -> Result<CompileReport> {
    let (manifest, code) = compile_source(&file_system(config)?, config)?;
    let outcome = output::write_atomically(&config.output_path, &code)?;
    Ok(CompileReport {
        identifiers: manifest.identifiers.len(),
        frames: manifest.assets.len(),
        outcome,
    })
}

/// Compiles the manifest and returns whether the file at the configured output path is up to date.
pub fn check(config: &ManifestConfig) -> Result<bool> {
    let (_, code) = compile_source(&file_system(config)?, config)?;
    output::is_up_to_date(&config.output_path, &code)
}

/// Compiles the tree provided by `source`.
pub fn compile_source(source: &dyn TaxonomySource, config: &ManifestConfig) -> Result<(Manifest, String)> {
    let tree = source.read_tree()?;
    let config = with_comparable_paths(tree.root(), config)?;
    compile_tree(&tree, &config)
}

fn file_system(config: &ManifestConfig) -> Result<FileSystem> {
    Ok(FileSystem::new(&config.asset_root)?
        .with_skip_hidden(config.skip_hidden)
        .with_frame_extensions(&config.frame_extensions))
}

/// Frame paths can only be made relative to the base directory when both are either
/// absolute or relative. Otherwise the base directory is converted via the current directory.
fn with_comparable_paths(root: &Path, config: &ManifestConfig) -> Result<ManifestConfig> {
    let mut config = config.clone();
    if root.is_absolute() != config.base_directory.is_absolute() {
        let current_dir = env::current_dir()?;
        config.base_directory = if root.is_absolute() {
            current_dir.join(&config.base_directory)
        } else {
            pathdiff::diff_paths(&config.base_directory, &current_dir)
                .ok_or_else(|| Error::InvalidPath(config.base_directory.clone()))?
        };
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use kiln_test::{
        create_dirs, create_files, setup_logger,
        spectral::{assert_that, prelude::*},
    };
    use tempdir::TempDir;

    use super::*;

    fn project(root: &Path) -> ManifestConfig {
        ManifestConfig {
            asset_root: root.join("assets/visual"),
            output_path: root.join("src/visual_assets.zig"),
            base_directory: root.to_owned(),
            ..ManifestConfig::default()
        }
    }

    fn create_player(root: &Path) {
        create_files(
            &root.join("assets/visual"),
            [
                "Character/Player/idle/2.png",
                "Character/Player/idle/1.png",
                "Character/Player/run/1.png",
            ],
        );
    }

    #[test]
    fn smoke() {
        setup_logger();
        let root = TempDir::new("root").unwrap();
        create_player(root.path());
        let config = project(root.path());

        let report = compile(&config).unwrap();
        assert_that!(report).is_equal_to(&CompileReport {
            identifiers: 2,
            frames: 3,
            outcome: WriteOutcome::Written,
        });

        let code = fs::read_to_string(&config.output_path).unwrap();
        assert!(code.contains("pub const ID = enum(u16) {\n    CHARACTER_PLAYER_IDLE,\n    CHARACTER_PLAYER_RUN,\n"));
        assert!(code.contains(r#"    .{ .path = "assets/visual/Character/Player/idle/1.png", .id = .CHARACTER_PLAYER_IDLE },
    .{ .path = "assets/visual/Character/Player/idle/2.png", .id = .CHARACTER_PLAYER_IDLE },
    .{ .path = "assets/visual/Character/Player/run/1.png", .id = .CHARACTER_PLAYER_RUN },"#));
        assert!(code.contains("pub const ASSETS_PER_ID: [ID.size()]usize = .{ 2, 1 };"));
        assert!(code.contains("var character_player_idle_textures: [2]Texture = undefined;"));
    }

    #[test]
    fn second_run_is_unchanged() {
        setup_logger();
        let root = TempDir::new("root").unwrap();
        create_player(root.path());
        let config = project(root.path());

        assert_that!(compile(&config).unwrap().outcome).is_equal_to(&WriteOutcome::Written);
        let first = fs::read_to_string(&config.output_path).unwrap();
        assert_that!(check(&config).unwrap()).is_true();
        assert_that!(compile(&config).unwrap().outcome).is_equal_to(&WriteOutcome::Unchanged);
        assert_that!(fs::read_to_string(&config.output_path).unwrap()).is_equal_to(&first);
    }

    #[test]
    fn check_detects_stale_manifest() {
        setup_logger();
        let root = TempDir::new("root").unwrap();
        create_player(root.path());
        let config = project(root.path());
        assert_that!(check(&config).unwrap()).is_false();

        compile(&config).unwrap();
        create_files(&root.path().join("assets/visual"), ["Character/Player/run/2.png"]);
        assert_that!(check(&config).unwrap()).is_false();
        let code = fs::read_to_string(&config.output_path).unwrap();
        assert!(code.contains("pub const ASSETS_PER_ID: [ID.size()]usize = .{ 2, 1 };"));
    }

    #[test]
    fn empty_groups_are_not_emitted() {
        setup_logger();
        let root = TempDir::new("root").unwrap();
        create_player(root.path());
        create_dirs(&root.path().join("assets/visual"), ["Character/Ghost/idle", "Stage/Empty"]);
        let config = project(root.path());

        compile(&config).unwrap();
        let code = fs::read_to_string(&config.output_path).unwrap();
        assert!(!code.contains("Ghost"));
        assert!(!code.contains("Stage"));
    }

    #[test]
    fn failure_keeps_previous_manifest() {
        setup_logger();
        let root = TempDir::new("root").unwrap();
        create_player(root.path());
        let config = project(root.path());
        compile(&config).unwrap();
        let previous = fs::read_to_string(&config.output_path).unwrap();

        create_files(&root.path().join("assets/visual"), ["Character/Player/run/final.png"]);
        let result = compile(&config);
        assert!(matches!(result, Err(Error::InvalidFrameName { .. })));
        assert_that!(fs::read_to_string(&config.output_path).unwrap()).is_equal_to(&previous);
    }

    #[test]
    fn missing_root() {
        setup_logger();
        let root = TempDir::new("root").unwrap();
        let config = project(root.path());
        assert!(matches!(compile(&config), Err(Error::UnreadableDirectory { .. })));
        assert!(!config.output_path.exists());
    }

    #[test]
    fn duplicate_identifier_writes_nothing() {
        setup_logger();
        let root = TempDir::new("root").unwrap();
        create_files(
            &root.path().join("assets/visual"),
            ["Character/Player/Idle/1.png", "Character/Player/idle/1.png"],
        );
        let config = project(root.path());
        assert!(matches!(compile(&config), Err(Error::DuplicateIdentifier { .. })));
        assert!(!config.output_path.exists());
    }

    #[test]
    fn relative_base_directory() {
        setup_logger();
        let root = TempDir::new("root").unwrap();
        create_player(root.path());
        let tree = FileSystem::new(root.path().join("assets/visual")).unwrap();
        let config = ManifestConfig {
            base_directory: ".".into(),
            ..ManifestConfig::default()
        };
        let (manifest, _) = compile_source(&tree, &config).unwrap();
        let expected = relative_to_current_dir(&root.path().join("assets/visual/Character/Player/idle/1.png"));
        assert_that!(manifest.assets[0].path).is_equal_to(&expected);
    }

    fn relative_to_current_dir(path: &Path) -> String {
        let current_dir = env::current_dir().unwrap();
        kiln_shared::pathdiff::diff_paths(path, current_dir)
            .unwrap()
            .components()
            .map(|component| component.as_os_str().to_str().unwrap().to_owned())
            .collect::<Vec<_>>()
            .join("/")
    }

    #[test]
    fn frame_ordering_by_file_name() {
        let tree = AssetTree::new("assets")
            .with_frame("Character", "Player", "idle", "b.png")
            .with_frame("Character", "Player", "idle", "a.png");
        let config = ManifestConfig {
            frame_ordering: crate::config::FrameOrdering::FileName,
            ..ManifestConfig::default()
        };
        let (manifest, _) = compile_tree(&tree, &config).unwrap();
        let paths = manifest.assets.iter().map(|row| row.path.as_str()).collect::<Vec<_>>();
        assert_that!(paths).is_equal_to(&vec!["assets/Character/Player/idle/a.png", "assets/Character/Player/idle/b.png"]);
    }
}
