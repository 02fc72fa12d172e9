//! Derives the generated names from the taxonomy keys and builds the [`Manifest`].
//!
//! | Name                | Derived from              | Example                          |
//! |---------------------|---------------------------|----------------------------------|
//! | Asset identifier    | type, subtype, animation  | `CHARACTER_PLAYER_IDLE`          |
//! | Union field         | type, subtype             | `character_player`               |
//! | Mode type           | type, subtype             | `CharacterPlayerMode`            |
//! | Mode variant        | animation                 | `IDLE`                           |
//! | Texture storage     | asset identifier          | `character_player_idle_textures` |

use std::{
    collections::BTreeMap,
    path::{Component, Path, PathBuf},
};

use kiln_shared::{itertools::Itertools, log::info, pathdiff};

use crate::{
    config::{BackingInteger, ManifestConfig},
    emit::RESERVED_DECLARATIONS,
    manifest::{AssetRow, Manifest, ModeGroup, ModeVariant, TextureStorage},
    taxonomy::Taxonomy,
    Error, Result, TaxonomyKey,
};

pub const SEPARATOR: &str = "_";

/// Global identifier of an animation, e.g. `CHARACTER_PLAYER_IDLE`.
pub fn asset_identifier(key: &TaxonomyKey) -> String {
    [&key.asset_type, &key.subtype, &key.animation]
        .iter()
        .map(|part| part.to_uppercase())
        .join(SEPARATOR)
}

/// Field of the tagged union for a type and subtype, e.g. `character_player`.
pub fn mode_field_name(asset_type: &str, subtype: &str) -> String {
    format!("{}{SEPARATOR}{}", asset_type.to_lowercase(), subtype.to_lowercase())
}

/// Mode enumeration for a type and subtype, e.g. `CharacterPlayerMode`. The case of the names is kept.
pub fn mode_type_name(asset_type: &str, subtype: &str) -> String {
    format!("{asset_type}{subtype}Mode")
}

/// Variant of the mode enumeration for an animation, e.g. `IDLE`.
pub fn mode_variant_name(animation: &str) -> String {
    animation.to_uppercase()
}

/// Texture storage of an identifier, e.g. `character_player_idle_textures`.
pub fn texture_storage_name(identifier: &str) -> String {
    format!("{}{SEPARATOR}textures", identifier.to_lowercase())
}

/// Whether `name` can be used as identifier without quoting: `[A-Za-z_][A-Za-z0-9_]*`.
/// A single `_` is the discard pattern and not an identifier.
pub fn is_valid_identifier(name: &str) -> bool {
    if name == "_" {
        return false;
    }
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => chars.all(|c| c.is_ascii_alphanumeric() || c == '_'),
        _ => false,
    }
}

/// A set of names that must be unique. Remembers where every name came from for the error message.
struct Namespace {
    origins: BTreeMap<String, String>,
}

impl Namespace {
    fn new() -> Self {
        Self { origins: BTreeMap::new() }
    }

    fn with_reserved(reserved: &[&str]) -> Self {
        let mut namespace = Self::new();
        for name in reserved {
            namespace.origins.insert((*name).to_owned(), "generated code".to_owned());
        }
        namespace
    }

    fn insert(&mut self, name: &str, origin: impl ToString) -> Result<()> {
        let origin = origin.to_string();
        if !is_valid_identifier(name) {
            return Err(Error::InvalidIdentifier {
                identifier: name.to_owned(),
                origin,
            });
        }
        if let Some(first) = self.origins.get(name) {
            return Err(Error::DuplicateIdentifier {
                identifier: name.to_owned(),
                first: first.clone(),
                second: origin,
            });
        }
        self.origins.insert(name.to_owned(), origin);
        Ok(())
    }
}

/// Options of the [`IdentifierDeriver`].
#[derive(Debug, Clone)]
pub struct DeriveOptions {
    /// Frame paths are written relative to this directory
    pub base_directory: PathBuf,
    pub backing_integer: BackingInteger,
    pub texture_storage: bool,
}

impl Default for DeriveOptions {
    fn default() -> Self {
        Self::from_config(&ManifestConfig::default())
    }
}

impl DeriveOptions {
    pub fn from_config(config: &ManifestConfig) -> Self {
        Self {
            base_directory: config.base_directory.clone(),
            backing_integer: config.backing_integer,
            texture_storage: config.has_texture_storage(),
        }
    }
}

/// Turns a [`Taxonomy`] into a [`Manifest`].
///
/// All names are validated before anything is rendered: they must be valid identifiers and
/// unique in their namespace. Two animations normalizing to the same name, e.g. `Idle` and
/// `idle`, fail with [`Error::DuplicateIdentifier`].
pub struct IdentifierDeriver {
    options: DeriveOptions,
}

impl IdentifierDeriver {
    pub fn new(options: DeriveOptions) -> Self {
        Self { options }
    }

    pub fn derive(&self, taxonomy: &Taxonomy) -> Result<Manifest> {
        let backing_integer = self.options.backing_integer;
        backing_integer.check_capacity(taxonomy.asset_count())?;
        backing_integer.check_capacity(taxonomy.groups().len())?;

        let mut identifiers = Namespace::new();
        let mut fields = Namespace::new();
        let mut declarations = Namespace::with_reserved(RESERVED_DECLARATIONS);

        let mut manifest = Manifest {
            asset_count: taxonomy.asset_count(),
            texture_storage: self.options.texture_storage.then(Vec::new),
            ..Manifest::default()
        };

        for group in taxonomy.groups() {
            let group_origin = format!("{}/{}", group.asset_type, group.subtype);
            let field_name = mode_field_name(&group.asset_type, &group.subtype);
            fields.insert(&field_name, &group_origin)?;
            let type_name = mode_type_name(&group.asset_type, &group.subtype);
            declarations.insert(&type_name, &group_origin)?;
            backing_integer.check_capacity(group.animations.len())?;

            let mut variant_names = Namespace::new();
            let mut variants = Vec::with_capacity(group.animations.len());
            for animation in &group.animations {
                let key = group.key(animation);
                debug_assert_eq!(animation.asset_id.index(), manifest.identifiers.len());

                let identifier = asset_identifier(&key);
                identifiers.insert(&identifier, &key)?;
                let variant_name = mode_variant_name(&animation.name);
                variant_names.insert(&variant_name, &key)?;

                for frame in &animation.frames {
                    manifest.assets.push(AssetRow {
                        path: self.relative_path(&frame.path)?,
                        asset_id: animation.asset_id,
                    });
                }
                manifest.frame_counts.push(animation.frames.len());

                if let Some(texture_storage) = &mut manifest.texture_storage {
                    let name = texture_storage_name(&identifier);
                    declarations.insert(&name, &key)?;
                    texture_storage.push(TextureStorage {
                        name,
                        capacity: animation.frames.len(),
                    });
                }

                manifest.identifiers.push(identifier);
                variants.push(ModeVariant {
                    name: variant_name,
                    asset_id: animation.asset_id,
                });
            }

            manifest.mode_groups.push(ModeGroup {
                field_name,
                type_name,
                variants,
            });
        }

        info!(
            "Derived {} identifiers in {} mode groups for {} frames",
            manifest.identifiers.len(),
            manifest.mode_groups.len(),
            manifest.assets.len()
        );
        Ok(manifest)
    }

    /// Path of the frame relative to the base directory with `/` as separator.
    fn relative_path(&self, path: &Path) -> Result<String> {
        let base_directory = &self.options.base_directory;
        if path.is_absolute() != base_directory.is_absolute() {
            return Err(Error::InvalidPath(path.to_owned()));
        }
        let relative = pathdiff::diff_paths(path, base_directory).ok_or_else(|| Error::InvalidPath(path.to_owned()))?;
        relative
            .components()
            .filter(|component| *component != Component::CurDir)
            .map(|component| component.as_os_str().to_str().ok_or_else(|| Error::InvalidPath(path.to_owned())))
            .collect::<Result<Vec<_>>>()
            .map(|parts| parts.join("/"))
    }
}
