//! # Overview
//!
//! Crate for compiling an asset directory tree into a statically typed manifest that
//! a game runtime uses to load its textures at startup.
//!
//! The taxonomy of the assets is defined by the directory structure alone. Every
//! animation is a directory of numbered frame files, grouped by a subtype directory
//! which itself is grouped by a type directory.
//!
//! ## Example:
//!
//! **Asset Directory:**
//!
//! ```text
//! assets/visual/
//! ├─ Character/
//! │  ├─ Player/
//! │  │  ├─ idle/
//! │  │  │  ├─ 1.png
//! │  │  │  ├─ 2.png
//! │  │  ├─ run/
//! │  │  │  ├─ 1.png
//! ```
//!
//! **Manifest (excerpt):**
//!
//! ```text
//! pub const ID = enum(u16) {
//!     CHARACTER_PLAYER_IDLE,
//!     CHARACTER_PLAYER_RUN,
//!     ...
//! };
//! pub const CharacterPlayerMode = enum(u16) {
//!     IDLE,
//!     RUN,
//! };
//! pub const ASSETS_PER_ID: [ID.size()]usize = .{ 2, 1 };
//! ```
//!
//! # Components
//!
//! The compilation is a strictly sequential pipeline:
//!
//! 1. The [`walker`] reads the directory tree into an [`AssetTree`] and yields one
//!    entry per animation with its frames in playback order.
//! 2. The [`TaxonomyBuilder`] groups the animations by type and subtype and assigns
//!    the ordinals.
//! 3. The [`IdentifierDeriver`] turns the [`Taxonomy`] into a [`Manifest`] and
//!    validates that all generated names are unique.
//! 4. The [`ZigEmitter`] renders the [`Manifest`] which is then written atomically by
//!    the [`output`] module.
//!
//! The whole pipeline is driven by [`pipeline::compile`].

pub mod common;
pub mod config;
pub mod emit;
pub mod identifier;
pub mod manifest;
pub mod output;
pub mod pipeline;
pub mod taxonomy;
pub mod walker;

pub use common::{AssetId, Error, ModeOrdinal, Result, TaxonomyKey};
pub use config::ManifestConfig;
pub use emit::ZigEmitter;
pub use identifier::IdentifierDeriver;
pub use manifest::Manifest;
pub use taxonomy::{Taxonomy, TaxonomyBuilder};
pub use walker::{AssetTree, FileSystem, TaxonomySource};
