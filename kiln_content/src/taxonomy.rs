use std::collections::BTreeMap;

use kiln_shared::log::trace;

use crate::{walker::AnimationEntry, walker::Frame, AssetId, ModeOrdinal, Result, TaxonomyKey};

/// An animation that has at least one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnimationRecord {
    pub name: String,
    /// Position within the [`Group`]
    pub mode: ModeOrdinal,
    /// Position in the global identifier space
    pub asset_id: AssetId,
    /// Frames in playback order
    pub frames: Vec<Frame>,
}

/// All animations of one type and subtype.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub asset_type: String,
    pub subtype: String,
    pub animations: Vec<AnimationRecord>,
}

impl Group {
    /// Returns the [`TaxonomyKey`] of the given animation of this group.
    pub fn key(&self, animation: &AnimationRecord) -> TaxonomyKey {
        TaxonomyKey::new(&self.asset_type, &self.subtype, &animation.name)
    }
}

/// Animations grouped by type and subtype with their ordinals assigned.
///
/// Every group has at least one animation and every animation has at least one frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Taxonomy {
    groups: Vec<Group>,
    asset_count: usize,
}

impl Taxonomy {
    /// Groups in the order they were first encountered.
    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    /// Number of identifiers, i.e. the number of animations over all groups.
    pub fn asset_count(&self) -> usize {
        self.asset_count
    }

    /// Number of frames over all animations.
    pub fn frame_count(&self) -> usize {
        self.animations().map(|(_, animation)| animation.frames.len()).sum()
    }

    /// Iterates over all animations in [`AssetId`] order.
    pub fn animations(&self) -> impl Iterator<Item = (&Group, &AnimationRecord)> {
        self.groups
            .iter()
            .flat_map(|group| group.animations.iter().map(move |animation| (group, animation)))
    }
}

struct PendingGroup {
    asset_type: String,
    subtype: String,
    animations: Vec<(String, Vec<Frame>)>,
}

/// Accumulates the walked animations and builds the [`Taxonomy`].
///
/// # Example
///
/// ```rust
/// use kiln_content::{AssetTree, TaxonomyBuilder, config::FrameOrdering};
/// let tree = AssetTree::new("assets")
///     .with_frame("Character", "Player", "idle", "1.png")
///     .with_animation("Character", "Player", "jump");
/// let mut builder = TaxonomyBuilder::new();
/// builder.extend(tree.walk(FrameOrdering::Numeric)).unwrap();
/// let taxonomy = builder.build();
/// assert_eq!(taxonomy.asset_count(), 1);
/// ```
#[derive(Default)]
pub struct TaxonomyBuilder {
    groups: Vec<PendingGroup>,
    group_indices: BTreeMap<(String, String), usize>,
}

impl TaxonomyBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an animation. Animations without frames are ignored.
    pub fn push(&mut self, entry: AnimationEntry) -> &mut Self {
        if entry.frames.is_empty() {
            trace!("Skipping animation '{}' because it has no frames", entry.key);
            return self;
        }

        let TaxonomyKey {
            asset_type,
            subtype,
            animation,
        } = entry.key;
        let groups = &mut self.groups;
        let index = *self
            .group_indices
            .entry((asset_type.clone(), subtype.clone()))
            .or_insert_with(|| {
                groups.push(PendingGroup {
                    asset_type,
                    subtype,
                    animations: Vec::new(),
                });
                groups.len() - 1
            });
        self.groups[index].animations.push((animation, entry.frames));
        self
    }

    /// Adds all animations of the iterator and stops at the first error.
    pub fn extend<I>(&mut self, entries: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = Result<AnimationEntry>>,
    {
        for entry in entries {
            self.push(entry?);
        }
        Ok(self)
    }

    /// Assigns the [`ModeOrdinal`]s and [`AssetId`]s and returns the [`Taxonomy`].
    pub fn build(self) -> Taxonomy {
        let mut asset_count = 0;
        let groups = self
            .groups
            .into_iter()
            .map(|group| {
                let animations = group
                    .animations
                    .into_iter()
                    .enumerate()
                    .map(|(mode, (name, frames))| {
                        let asset_id = AssetId(asset_count);
                        asset_count += 1;
                        AnimationRecord {
                            name,
                            mode: ModeOrdinal(mode),
                            asset_id,
                            frames,
                        }
                    })
                    .collect();
                Group {
                    asset_type: group.asset_type,
                    subtype: group.subtype,
                    animations,
                }
            })
            .collect();
        Taxonomy { groups, asset_count }
    }
}
