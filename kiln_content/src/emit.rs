//! Renders a [`Manifest`] as Zig source code.

use std::fmt::{self, Write};

use kiln_shared::itertools::Itertools;

use crate::{config::BackingInteger, manifest::Manifest, ManifestConfig};

/// Top level declarations of the generated file. Derived names must not collide with them.
pub const RESERVED_DECLARATIONS: &[&str] = &[
    "ID",
    "EntityMode",
    "IDFromEntityMode",
    "Asset",
    "Texture",
    "TextureHandle",
    "ALL",
    "ASSETS_PER_ID",
    "texture_slices",
];

/// Renders the [`Manifest`] into a single Zig source file.
///
/// The sections are written in the following order:
///
/// 1. header comment and the `Texture` and `Asset` declarations
/// 2. `ID` enum with one variant per identifier
/// 3. `IDFromEntityMode` reverse lookup
/// 4. `EntityMode` tagged union with the optional comptime `init` helper
/// 5. one mode enum per type and subtype
/// 6. `ALL` asset table and `ASSETS_PER_ID` frame counts
/// 7. texture storage and `texture_slices` when the manifest has texture storage
#[derive(Debug, Clone)]
pub struct ZigEmitter {
    /// Number of spaces per indentation level
    pub indent: usize,
    pub backing_integer: BackingInteger,
    /// Expression the `TextureHandle` declaration is bound to
    pub texture_import: String,
    pub construction_helper: bool,
    /// Name written into the header comment
    pub generator: String,
}

impl Default for ZigEmitter {
    fn default() -> Self {
        Self::from_config(&ManifestConfig::default())
    }
}

impl ZigEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &ManifestConfig) -> Self {
        Self {
            indent: config.indent_width,
            backing_integer: config.backing_integer,
            texture_import: config.texture_import.clone(),
            construction_helper: config.construction_helper,
            generator: config.generator.clone(),
        }
    }

    /// Renders the manifest into a `String`.
    pub fn emit(&self, manifest: &Manifest) -> String {
        let mut code = String::new();
        // Writing into a String can't fail.
        let _ = self.write(manifest, &mut code);
        code
    }

    /// Renders the manifest into `writer`.
    pub fn write(&self, manifest: &Manifest, writer: &mut impl Write) -> fmt::Result {
        self.write_header(manifest, writer)?;
        writeln!(writer)?;
        self.write_id_enum(manifest, writer)?;
        writeln!(writer)?;
        self.write_reverse_lookup(manifest, writer)?;
        writeln!(writer)?;
        self.write_entity_mode(manifest, writer)?;
        for group in &manifest.mode_groups {
            writeln!(writer)?;
            writeln!(writer, "pub const {} = enum({}) {{", group.type_name, self.backing_integer)?;
            for variant in &group.variants {
                writeln!(writer, "{}{},", self.pad(1), variant.name)?;
            }
            writeln!(writer, "}};")?;
        }
        writeln!(writer)?;
        self.write_asset_table(manifest, writer)?;
        if let Some(texture_storage) = &manifest.texture_storage {
            writeln!(writer)?;
            writeln!(writer, "// Storage for textures to be initialized at runtime.")?;
            for storage in texture_storage {
                writeln!(writer, "var {}: [{}]Texture = undefined;", storage.name, storage.capacity)?;
            }
            writeln!(writer)?;
            if texture_storage.is_empty() {
                writeln!(writer, "pub var texture_slices: [ID.size()][]Texture = .{{}};")?;
            } else {
                writeln!(writer, "pub var texture_slices: [ID.size()][]Texture = .{{")?;
                for storage in texture_storage {
                    writeln!(writer, "{}&{},", self.pad(1), storage.name)?;
                }
                writeln!(writer, "}};")?;
            }
        }
        Ok(())
    }

    fn write_header(&self, manifest: &Manifest, writer: &mut impl Write) -> fmt::Result {
        let i1 = self.pad(1);
        writeln!(
            writer,
            "// File generated by {} - Manual changes will probably be overwritten.",
            self.generator
        )?;
        if manifest.texture_storage.is_some() {
            writeln!(writer, "const TextureHandle = {};", self.texture_import)?;
            writeln!(writer)?;
            writeln!(writer, "pub const Texture = struct {{")?;
            writeln!(writer, "{i1}ptr: ?*TextureHandle,")?;
            writeln!(writer, "{i1}width: c_int,")?;
            writeln!(writer, "{i1}height: c_int,")?;
            writeln!(writer, "}};")?;
        }
        writeln!(writer)?;
        writeln!(writer, "pub const Asset = struct {{")?;
        writeln!(writer, "{i1}path: []const u8,")?;
        writeln!(writer, "{i1}id: ID,")?;
        writeln!(writer, "}};")
    }

    fn write_id_enum(&self, manifest: &Manifest, writer: &mut impl Write) -> fmt::Result {
        let (i1, i2) = (self.pad(1), self.pad(2));
        let backing_integer = self.backing_integer;
        writeln!(writer, "pub const ID = enum({backing_integer}) {{")?;
        for identifier in &manifest.identifiers {
            writeln!(writer, "{i1}{identifier},")?;
        }
        writeln!(writer)?;
        writeln!(writer, "{i1}pub const count: usize = {};", manifest.asset_count)?;
        writeln!(writer)?;
        writeln!(writer, "{i1}pub inline fn int(id: ID) {backing_integer} {{")?;
        writeln!(writer, "{i2}return @intFromEnum(id);")?;
        writeln!(writer, "{i1}}}")?;
        writeln!(writer)?;
        writeln!(writer, "{i1}pub inline fn size() usize {{")?;
        writeln!(writer, "{i2}return count;")?;
        writeln!(writer, "{i1}}}")?;
        writeln!(writer, "}};")
    }

    fn write_reverse_lookup(&self, manifest: &Manifest, writer: &mut impl Write) -> fmt::Result {
        let (i1, i2, i3) = (self.pad(1), self.pad(2), self.pad(3));
        writeln!(writer, "pub fn IDFromEntityMode(mode: EntityMode) ID {{")?;
        if manifest.mode_groups.is_empty() {
            writeln!(writer, "{i1}return switch (mode) {{}};")?;
        } else {
            writeln!(writer, "{i1}return switch (mode) {{")?;
            for group in &manifest.mode_groups {
                let field_name = &group.field_name;
                writeln!(
                    writer,
                    "{i2}.{field_name} => |{field_name}_mode| switch ({field_name}_mode) {{"
                )?;
                for variant in &group.variants {
                    let identifier = manifest.identifier(variant.asset_id).ok_or(fmt::Error)?;
                    writeln!(writer, "{i3}.{} => .{identifier},", variant.name)?;
                }
                writeln!(writer, "{i2}}},")?;
            }
            writeln!(writer, "{i1}}};")?;
        }
        writeln!(writer, "}}")
    }

    fn write_entity_mode(&self, manifest: &Manifest, writer: &mut impl Write) -> fmt::Result {
        let (i1, i2, i3) = (self.pad(1), self.pad(2), self.pad(3));
        writeln!(writer, "pub const EntityMode = union(enum({})) {{", self.backing_integer)?;
        for group in &manifest.mode_groups {
            writeln!(writer, "{i1}{}: {},", group.field_name, group.type_name)?;
        }
        if self.construction_helper {
            if !manifest.mode_groups.is_empty() {
                writeln!(writer)?;
            }
            writeln!(
                writer,
                "{i1}pub fn init(comptime Type: type, comptime val: @TypeOf(.enum_literal)) EntityMode {{"
            )?;
            writeln!(writer, "{i2}return switch (Type) {{")?;
            for group in &manifest.mode_groups {
                writeln!(
                    writer,
                    "{i3}{} => @unionInit(EntityMode, {}, @as(Type, val)),",
                    group.type_name,
                    zig_string(&group.field_name)
                )?;
            }
            writeln!(
                writer,
                "{i3}else => @compileError(\"Unexpected entity mode type: \" ++ @typeName(Type)),"
            )?;
            writeln!(writer, "{i2}}};")?;
            writeln!(writer, "{i1}}}")?;
        }
        writeln!(writer, "}};")
    }

    fn write_asset_table(&self, manifest: &Manifest, writer: &mut impl Write) -> fmt::Result {
        let i1 = self.pad(1);
        if manifest.assets.is_empty() {
            writeln!(writer, "pub const ALL: [0]Asset = .{{}};")?;
        } else {
            writeln!(writer, "pub const ALL: [{}]Asset = .{{", manifest.assets.len())?;
            for row in &manifest.assets {
                let identifier = manifest.identifier(row.asset_id).ok_or(fmt::Error)?;
                writeln!(writer, "{i1}.{{ .path = {}, .id = .{identifier} }},", zig_string(&row.path))?;
            }
            writeln!(writer, "}};")?;
        }
        writeln!(writer)?;
        if manifest.frame_counts.is_empty() {
            writeln!(writer, "pub const ASSETS_PER_ID: [ID.size()]usize = .{{}};")
        } else {
            writeln!(
                writer,
                "pub const ASSETS_PER_ID: [ID.size()]usize = .{{ {} }};",
                manifest.frame_counts.iter().join(", ")
            )
        }
    }

    fn pad(&self, level: usize) -> String {
        " ".repeat(self.indent * level)
    }
}

/// Quotes `value` as Zig string literal.
pub fn zig_string(value: &str) -> String {
    let mut literal = String::with_capacity(value.len() + 2);
    literal.push('"');
    for c in value.chars() {
        match c {
            '\\' => literal.push_str("\\\\"),
            '"' => literal.push_str("\\\""),
            '\n' => literal.push_str("\\n"),
            '\r' => literal.push_str("\\r"),
            '\t' => literal.push_str("\\t"),
            c if c.is_ascii_control() => literal.push_str(&format!("\\x{:02x}", c as u32)),
            c => literal.push(c),
        }
    }
    literal.push('"');
    literal
}
