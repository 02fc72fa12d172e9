//! Target independent representation of everything the generated manifest contains.

use kiln_shared::itertools::Itertools;

use crate::AssetId;

/// One animation of a [`ModeGroup`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModeVariant {
    pub name: String,
    pub asset_id: AssetId,
}

/// The mode enumeration of one type and subtype together with its union field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModeGroup {
    /// Name of the field in the tagged union, e.g. `character_player`
    pub field_name: String,
    /// Name of the mode enumeration, e.g. `CharacterPlayerMode`
    pub type_name: String,
    /// Variants in mode order
    pub variants: Vec<ModeVariant>,
}

/// One row of the asset table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRow {
    /// Path of the frame relative to the base directory, always with `/` as separator
    pub path: String,
    pub asset_id: AssetId,
}

/// Fixed capacity storage that the runtime fills with the textures of one identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureStorage {
    pub name: String,
    pub capacity: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    /// Global identifiers indexed by [`AssetId`]
    pub identifiers: Vec<String>,
    /// Size of the identifier space as counted by the taxonomy
    pub asset_count: usize,
    pub mode_groups: Vec<ModeGroup>,
    /// Frames in [`AssetId`] order and playback order within one identifier
    pub assets: Vec<AssetRow>,
    /// Number of frames indexed by [`AssetId`]
    pub frame_counts: Vec<usize>,
    /// Texture storage indexed by [`AssetId`]. Only present in the extended variant.
    pub texture_storage: Option<Vec<TextureStorage>>,
}

impl Manifest {
    /// Returns the identifier with the given [`AssetId`].
    pub fn identifier(&self, asset_id: AssetId) -> Option<&str> {
        self.identifiers.get(asset_id.index()).map(String::as_str)
    }

    /// Reverse lookup from a union value to its [`AssetId`]. This is what the generated
    /// `IDFromEntityMode` computes at runtime.
    pub fn lookup(&self, field_name: &str, variant: &str) -> Option<AssetId> {
        self.mode_groups
            .iter()
            .find(|group| group.field_name == field_name)?
            .variants
            .iter()
            .find(|candidate| candidate.name == variant)
            .map(|candidate| candidate.asset_id)
    }

    /// Iterates over all `(field_name, variant_name, asset_id)` values of the tagged union.
    pub fn union_values(&self) -> impl Iterator<Item = (&str, &str, AssetId)> {
        self.mode_groups.iter().flat_map(|group| {
            group
                .variants
                .iter()
                .map(move |variant| (group.field_name.as_str(), variant.name.as_str(), variant.asset_id))
        })
    }

    /// Checks the relations between the sections:
    ///
    /// - the identifier space, the frame count table and the texture storage have the same length,
    /// - every identifier has at least one frame,
    /// - the frame counts add up to the rows of the asset table and the rows are grouped by identifier,
    /// - every identifier is reached by exactly one union value.
    pub fn is_consistent(&self) -> bool {
        let asset_count = self.asset_count;
        if self.identifiers.len() != asset_count || self.frame_counts.len() != asset_count {
            return false;
        }
        if self.frame_counts.iter().any(|count| *count == 0) {
            return false;
        }
        if self.frame_counts.iter().sum::<usize>() != self.assets.len() {
            return false;
        }

        let rows_per_id = self
            .assets
            .iter()
            .map(|row| row.asset_id)
            .dedup_with_count()
            .collect::<Vec<_>>();
        let rows_are_grouped = rows_per_id.len() == asset_count
            && rows_per_id
                .iter()
                .enumerate()
                .all(|(index, (count, asset_id))| asset_id.index() == index && *count == self.frame_counts[index]);
        if !rows_are_grouped {
            return false;
        }

        let mut reached = self.union_values().map(|(_, _, asset_id)| asset_id.index()).collect::<Vec<_>>();
        reached.sort_unstable();
        if reached != (0..asset_count).collect::<Vec<_>>() {
            return false;
        }

        match &self.texture_storage {
            Some(storage) => {
                storage.len() == asset_count
                    && storage
                        .iter()
                        .zip(&self.frame_counts)
                        .all(|(storage, count)| storage.capacity == *count)
            }
            None => true,
        }
    }
}
