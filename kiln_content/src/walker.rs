//! Reads the asset directory hierarchy `<root>/<Type>/<Subtype>/<Animation>/<frame>`.
//!
//! The hierarchy is first read into an [`AssetTree`] which is then walked with
//! [`AssetTree::walk`]. This way everything after the directory listing can be
//! tested with synthetic trees.

use std::{
    io,
    path::{Path, PathBuf},
};

use kiln_shared::{
    log::{info, trace},
    walkdir::{DirEntry, WalkDir},
};

use crate::{config::FrameOrdering, Error, Result, TaxonomyKey};

/// Something that can provide the [`AssetTree`] that the manifest is compiled from.
pub trait TaxonomySource {
    /// Reads the complete tree.
    fn read_tree(&self) -> Result<AssetTree>;
}

/// One frame of an animation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// File name including the extension
    pub file_name: String,
    /// Path of the file. It starts with the root of the [`AssetTree`].
    pub path: PathBuf,
}

/// An animation together with its frames in playback order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnimationEntry {
    pub key: TaxonomyKey,
    pub frames: Vec<Frame>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnimationNode {
    pub name: String,
    /// File names in the order they were discovered
    pub frame_files: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtypeNode {
    pub name: String,
    pub animations: Vec<AnimationNode>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeNode {
    pub name: String,
    pub subtypes: Vec<SubtypeNode>,
}

/// In-memory representation of the asset directory hierarchy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetTree {
    root: PathBuf,
    types: Vec<TypeNode>,
}

impl AssetTree {
    /// Creates an empty tree. `root` is the directory the frame paths start with.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            types: Vec::new(),
        }
    }

    /// Adds a frame file and creates the type, subtype and animation when they don't exist yet.
    ///
    /// # Example
    ///
    /// ```rust
    /// use kiln_content::AssetTree;
    /// let tree = AssetTree::new("assets")
    ///     .with_frame("Character", "Player", "idle", "2.png")
    ///     .with_frame("Character", "Player", "idle", "1.png")
    ///     .with_frame("Character", "Player", "run", "1.png");
    /// assert_eq!(tree.types().len(), 1);
    /// assert_eq!(tree.types()[0].subtypes[0].animations.len(), 2);
    /// ```
    pub fn with_frame(mut self, asset_type: &str, subtype: &str, animation: &str, file_name: &str) -> Self {
        self.animation_mut(asset_type, subtype, animation)
            .frame_files
            .push(file_name.to_owned());
        self
    }

    /// Adds an animation without frames.
    pub fn with_animation(mut self, asset_type: &str, subtype: &str, animation: &str) -> Self {
        self.animation_mut(asset_type, subtype, animation);
        self
    }

    /// Adds a subtype without animations.
    pub fn with_subtype(mut self, asset_type: &str, subtype: &str) -> Self {
        self.subtype_mut(asset_type, subtype);
        self
    }

    /// Directory the frame paths start with.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Types in the order they were discovered.
    pub fn types(&self) -> &[TypeNode] {
        &self.types
    }

    /// Returns a lazy iterator over all animations of the tree in traversal order. The frames
    /// of every animation are sorted according to `ordering`.
    ///
    /// An item is an [`Error::InvalidFrameName`] when a frame can't be ordered numerically.
    pub fn walk(&self, ordering: FrameOrdering) -> impl Iterator<Item = Result<AnimationEntry>> + '_ {
        self.types.iter().flat_map(move |type_node| {
            type_node.subtypes.iter().flat_map(move |subtype_node| {
                subtype_node.animations.iter().map(move |animation_node| -> Result<AnimationEntry> {
                    let key = TaxonomyKey::new(&type_node.name, &subtype_node.name, &animation_node.name);
                    let directory = self
                        .root
                        .join(&type_node.name)
                        .join(&subtype_node.name)
                        .join(&animation_node.name);
                    let frames = sort_frames(&directory, &animation_node.frame_files, ordering)?;
                    trace!("Walked animation '{key}' with {} frames", frames.len());
                    Ok(AnimationEntry { key, frames })
                })
            })
        })
    }

    fn subtype_mut(&mut self, asset_type: &str, subtype: &str) -> &mut SubtypeNode {
        let type_index = match self.types.iter().position(|node| node.name == asset_type) {
            Some(index) => index,
            None => {
                self.types.push(TypeNode {
                    name: asset_type.to_owned(),
                    subtypes: Vec::new(),
                });
                self.types.len() - 1
            }
        };
        let subtypes = &mut self.types[type_index].subtypes;
        let subtype_index = match subtypes.iter().position(|node| node.name == subtype) {
            Some(index) => index,
            None => {
                subtypes.push(SubtypeNode {
                    name: subtype.to_owned(),
                    animations: Vec::new(),
                });
                subtypes.len() - 1
            }
        };
        &mut subtypes[subtype_index]
    }

    fn animation_mut(&mut self, asset_type: &str, subtype: &str, animation: &str) -> &mut AnimationNode {
        let animations = &mut self.subtype_mut(asset_type, subtype).animations;
        let index = match animations.iter().position(|node| node.name == animation) {
            Some(index) => index,
            None => {
                animations.push(AnimationNode {
                    name: animation.to_owned(),
                    frame_files: Vec::new(),
                });
                animations.len() - 1
            }
        };
        &mut animations[index]
    }
}

impl TaxonomySource for AssetTree {
    fn read_tree(&self) -> Result<AssetTree> {
        Ok(self.clone())
    }
}

/// Sorts the frame files of the animation in `directory` into playback order.
fn sort_frames(directory: &Path, frame_files: &[String], ordering: FrameOrdering) -> Result<Vec<Frame>> {
    let frames = frame_files.iter().map(|file_name| Frame {
        file_name: file_name.clone(),
        path: directory.join(file_name),
    });
    match ordering {
        FrameOrdering::Numeric => {
            let mut numbered = frames
                .map(|frame| frame_number(&frame).map(|number| (number, frame)))
                .collect::<Result<Vec<_>>>()?;
            // Ties like "1.png" and "01.png" are broken by the file name.
            numbered.sort_by(|(a, frame_a), (b, frame_b)| a.cmp(b).then_with(|| frame_a.file_name.cmp(&frame_b.file_name)));
            Ok(numbered.into_iter().map(|(_, frame)| frame).collect())
        }
        FrameOrdering::FileName => {
            let mut frames = frames.collect::<Vec<_>>();
            frames.sort_by(|a, b| a.file_name.cmp(&b.file_name));
            Ok(frames)
        }
    }
}

/// Parses the stem of the frame file name, e.g. `12` for `12.png`.
fn frame_number(frame: &Frame) -> Result<u64> {
    Path::new(&frame.file_name)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .and_then(|stem| stem.parse::<u64>().ok())
        .ok_or_else(|| Error::InvalidFrameName { path: frame.path.clone() })
}

/// Reads an [`AssetTree`] from the file system.
#[derive(Debug, Clone)]
pub struct FileSystem {
    root: PathBuf,
    skip_hidden: bool,
    frame_extensions: Vec<String>,
}

impl FileSystem {
    /// Creates a new [`FileSystem`] source and checks that the given root directory exists.
    ///
    /// # Example
    ///
    /// ```
    /// use kiln_content::FileSystem;
    /// let _file_system = FileSystem::new(std::env::temp_dir()).unwrap();
    /// ```
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(Error::UnreadableDirectory {
                source: io::Error::new(io::ErrorKind::NotFound, "not a directory"),
                path: root,
            });
        }
        Ok(Self {
            root,
            skip_hidden: true,
            frame_extensions: Vec::new(),
        })
    }

    /// Sets whether files and directories starting with a dot are ignored.
    pub fn with_skip_hidden(mut self, skip_hidden: bool) -> Self {
        self.skip_hidden = skip_hidden;
        self
    }

    /// Restricts the frames to files with one of the given extensions. The comparison ignores the case.
    pub fn with_frame_extensions<S: AsRef<str>>(mut self, extensions: impl IntoIterator<Item = S>) -> Self {
        self.frame_extensions = extensions
            .into_iter()
            .map(|extension| extension.as_ref().trim_start_matches('.').to_lowercase())
            .collect();
        self
    }

    /// Lists the entries of `directory` sorted by name.
    fn list(&self, directory: &Path) -> Result<Vec<DirEntry>> {
        let mut entries = Vec::new();
        let walk_dir = WalkDir::new(directory)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .sort_by_file_name();
        for entry in walk_dir {
            let entry = match entry {
                Ok(entry) => entry,
                // A symbolic link whose target doesn't exist is neither a directory nor a file.
                Err(err) if err.depth() == 1 && err.io_error().map(io::Error::kind) == Some(io::ErrorKind::NotFound) => {
                    trace!("Skipping '{}' because it can't be followed", err.path().unwrap_or(directory).display());
                    continue;
                }
                Err(err) => {
                    return Err(Error::UnreadableDirectory {
                        path: err.path().unwrap_or(directory).to_owned(),
                        source: io::Error::from(err),
                    })
                }
            };
            if self.skip_hidden && entry.file_name().to_string_lossy().starts_with('.') {
                trace!("Skipping hidden entry '{}'", entry.path().display());
                continue;
            }
            entries.push(entry);
        }
        Ok(entries)
    }

    /// Lists the subdirectories of `directory` and returns them with their names.
    fn list_directories(&self, directory: &Path) -> Result<Vec<(String, PathBuf)>> {
        let mut directories = Vec::new();
        for entry in self.list(directory)? {
            if !entry.file_type().is_dir() {
                trace!("Skipping '{}' because it is not a directory", entry.path().display());
                continue;
            }
            directories.push((entry_name(&entry)?, entry.into_path()));
        }
        Ok(directories)
    }

    fn is_frame(&self, entry: &DirEntry) -> bool {
        if !entry.file_type().is_file() {
            trace!("Skipping '{}' because it is not a file", entry.path().display());
            return false;
        }
        if self.frame_extensions.is_empty() {
            return true;
        }
        let extension = entry
            .path()
            .extension()
            .and_then(|extension| extension.to_str())
            .map(|extension| extension.to_lowercase());
        match extension {
            Some(extension) if self.frame_extensions.contains(&extension) => true,
            _ => {
                trace!("Skipping '{}' because of its extension", entry.path().display());
                false
            }
        }
    }
}

impl TaxonomySource for FileSystem {
    fn read_tree(&self) -> Result<AssetTree> {
        info!("Reading asset tree from '{}'", self.root.display());
        let mut tree = AssetTree::new(&self.root);
        for (type_name, type_path) in self.list_directories(&self.root)? {
            let mut type_node = TypeNode {
                name: type_name,
                subtypes: Vec::new(),
            };
            for (subtype_name, subtype_path) in self.list_directories(&type_path)? {
                let mut subtype_node = SubtypeNode {
                    name: subtype_name,
                    animations: Vec::new(),
                };
                for (animation_name, animation_path) in self.list_directories(&subtype_path)? {
                    let mut frame_files = Vec::new();
                    for entry in self.list(&animation_path)? {
                        if self.is_frame(&entry) {
                            frame_files.push(entry_name(&entry)?);
                        }
                    }
                    subtype_node.animations.push(AnimationNode {
                        name: animation_name,
                        frame_files,
                    });
                }
                type_node.subtypes.push(subtype_node);
            }
            tree.types.push(type_node);
        }
        Ok(tree)
    }
}

fn entry_name(entry: &DirEntry) -> Result<String> {
    entry
        .file_name()
        .to_str()
        .map(|name| name.to_owned())
        .ok_or_else(|| Error::InvalidPath(entry.path().to_owned()))
}

#[cfg(test)]
mod tests {
    use kiln_test::{create_dirs, create_files, setup_logger, spectral::assert_that};
    use tempdir::TempDir;

    use super::*;

    fn file_names(entry: &AnimationEntry) -> Vec<&str> {
        entry.frames.iter().map(|frame| frame.file_name.as_str()).collect()
    }

    #[test]
    fn walk_sorts_numerically() {
        let tree = AssetTree::new("assets")
            .with_frame("Character", "Player", "idle", "10.png")
            .with_frame("Character", "Player", "idle", "2.png")
            .with_frame("Character", "Player", "idle", "1.png");
        let entries = tree.walk(FrameOrdering::Numeric).collect::<Result<Vec<_>>>().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].key, TaxonomyKey::new("Character", "Player", "idle"));
        assert_eq!(file_names(&entries[0]), vec!["1.png", "2.png", "10.png"]);
        assert_eq!(entries[0].frames[0].path, Path::new("assets/Character/Player/idle/1.png"));
    }

    #[test]
    fn walk_sorts_by_file_name() {
        let tree = AssetTree::new("assets")
            .with_frame("Character", "Player", "idle", "10.png")
            .with_frame("Character", "Player", "idle", "2.png")
            .with_frame("Character", "Player", "idle", "frame.png");
        let entries = tree.walk(FrameOrdering::FileName).collect::<Result<Vec<_>>>().unwrap();
        assert_eq!(file_names(&entries[0]), vec!["10.png", "2.png", "frame.png"]);
    }

    #[test]
    fn numeric_ties_are_broken_by_file_name() {
        let tree = AssetTree::new("assets")
            .with_frame("A", "B", "c", "1.png")
            .with_frame("A", "B", "c", "01.png");
        let entries = tree.walk(FrameOrdering::Numeric).collect::<Result<Vec<_>>>().unwrap();
        assert_eq!(file_names(&entries[0]), vec!["01.png", "1.png"]);
    }

    #[test]
    fn invalid_frame_name() {
        let tree = AssetTree::new("assets")
            .with_frame("Character", "Player", "idle", "1.png")
            .with_frame("Character", "Player", "idle", "first.png");
        let result = tree.walk(FrameOrdering::Numeric).collect::<Result<Vec<_>>>();
        match result {
            Err(Error::InvalidFrameName { path }) => assert_eq!(path, Path::new("assets/Character/Player/idle/first.png")),
            other => panic!("expected InvalidFrameName, got {other:?}"),
        }
    }

    #[test]
    fn walk_keeps_traversal_order() {
        let tree = AssetTree::new("assets")
            .with_frame("Stage", "Forest", "background", "1.png")
            .with_frame("Character", "Player", "run", "1.png")
            .with_frame("Character", "Player", "idle", "1.png")
            .with_animation("Character", "Enemy", "idle")
            .with_subtype("Character", "Ghost");
        let keys = tree
            .walk(FrameOrdering::Numeric)
            .map(|entry| entry.unwrap().key.to_string())
            .collect::<Vec<_>>();
        assert_eq!(
            keys,
            vec!["Stage/Forest/background", "Character/Player/run", "Character/Player/idle", "Character/Enemy/idle"]
        );
    }

    #[test]
    fn read_file_system() {
        setup_logger();
        let root = TempDir::new("root").unwrap();
        create_files(
            root.path(),
            [
                "Character/Player/run/1.png",
                "Character/Player/idle/2.png",
                "Character/Player/idle/1.png",
                "Character/Player/idle/.DS_Store",
                "Character/Player/notes.txt",
                "Character/readme.md",
                "Stage/Forest/background/1.png",
            ],
        );
        create_dirs(root.path(), ["Character/Player/idle/nested", "Character/Empty/none", "Stage/Bare"]);

        let tree = FileSystem::new(root.path()).unwrap().read_tree().unwrap();
        let types = tree.types().iter().map(|node| node.name.as_str()).collect::<Vec<_>>();
        assert_eq!(types, vec!["Character", "Stage"]);

        let character = &tree.types()[0];
        let subtypes = character.subtypes.iter().map(|node| node.name.as_str()).collect::<Vec<_>>();
        assert_eq!(subtypes, vec!["Empty", "Player"]);
        assert_eq!(character.subtypes[0].animations.len(), 1);
        assert!(character.subtypes[0].animations[0].frame_files.is_empty());

        let player = &character.subtypes[1];
        let animations = player.animations.iter().map(|node| node.name.as_str()).collect::<Vec<_>>();
        assert_eq!(animations, vec!["idle", "run"]);
        assert_that!(player.animations[0].frame_files).is_equal_to(vec!["1.png".to_owned(), "2.png".to_owned()]);

        assert!(tree.types()[1].subtypes.iter().any(|node| node.name == "Bare" && node.animations.is_empty()));
    }

    #[test]
    fn read_file_system_with_extension_filter() {
        let root = TempDir::new("root").unwrap();
        create_files(root.path(), ["A/B/c/1.PNG", "A/B/c/2.png", "A/B/c/3.json", "A/B/c/.hidden"]);

        let tree = FileSystem::new(root.path())
            .unwrap()
            .with_frame_extensions([".png"])
            .read_tree()
            .unwrap();
        assert_eq!(tree.types()[0].subtypes[0].animations[0].frame_files, vec!["1.PNG", "2.png"]);

        let tree = FileSystem::new(root.path()).unwrap().with_skip_hidden(false).read_tree().unwrap();
        assert_eq!(
            tree.types()[0].subtypes[0].animations[0].frame_files,
            vec![".hidden", "1.PNG", "2.png", "3.json"]
        );
    }

    #[test]
    fn walk_file_system() {
        let root = TempDir::new("root").unwrap();
        create_files(root.path(), ["Character/Player/idle/2.png", "Character/Player/idle/10.png", "Character/Player/idle/1.png"]);
        let tree = FileSystem::new(root.path()).unwrap().read_tree().unwrap();
        let entries = tree.walk(FrameOrdering::Numeric).collect::<Result<Vec<_>>>().unwrap();
        assert_eq!(file_names(&entries[0]), vec!["1.png", "2.png", "10.png"]);
        assert_eq!(entries[0].frames[2].path, root.path().join("Character/Player/idle/10.png"));
    }

    #[cfg(unix)]
    #[test]
    fn dangling_symbolic_links_are_skipped() {
        use std::os::unix::fs::symlink;

        setup_logger();
        let root = TempDir::new("root").unwrap();
        create_files(root.path(), ["Character/Player/idle/1.png"]);
        symlink(root.path().join("missing"), root.path().join("stale_link")).unwrap();
        symlink(
            root.path().join("Character/Player/idle/missing.png"),
            root.path().join("Character/Player/idle/2.png"),
        )
        .unwrap();

        let tree = FileSystem::new(root.path()).unwrap().read_tree().unwrap();
        let types = tree.types().iter().map(|node| node.name.as_str()).collect::<Vec<_>>();
        assert_eq!(types, vec!["Character"]);
        assert_that!(tree.types()[0].subtypes[0].animations[0].frame_files).is_equal_to(vec!["1.png".to_owned()]);
    }

    #[test]
    fn directory_not_found() {
        let result = FileSystem::new("not_found");
        assert!(matches!(result, Err(Error::UnreadableDirectory { .. })));
    }
}
