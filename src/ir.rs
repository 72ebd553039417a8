//! Registry intermediate representation.
//!
//! The fully parsed, cross-referenced in-memory model the registry parser
//! produces and every downstream stage consumes:
//! - Commands with structural native types and length expressions
//! - Enum groups with bit-exact 64-bit canonical values
//! - Version-gated features and vendor extensions
//!
//! Commands are owned exclusively by [`CommandMap`]; require/remove entries
//! hold validated names into that table rather than owning copies.

use std::collections::HashMap;
use std::fmt;

use crate::expr::Expression;
use crate::types::NativeType;

/// Target API identifier. `None` means the element carries no restriction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Api {
    /// No API restriction.
    None,
    /// Desktop OpenGL.
    Gl,
    /// OpenGL ES 1.x.
    Gles1,
    /// OpenGL ES 2.0+.
    Gles2,
    /// OpenGL SC 2.0.
    Glsc2,
}

/// Profile qualifier narrowing which require/remove entries apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    /// No profile qualifier; applies unconditionally.
    None,
    /// Core profile.
    Core,
    /// Compatibility profile.
    Compatibility,
    /// Common profile (ES).
    Common,
}

/// Whether an enum group holds bitmask values or plain constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKind {
    /// Plain enumerated constants.
    Plain,
    /// OR-able bitmask values.
    Bitmask,
}

/// The numeric-literal width/signedness tag an enum value was declared with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiteralSuffix {
    /// No suffix: 32-bit signed, reinterpreted through the unsigned pattern.
    None,
    /// `u`: unsigned 32-bit.
    U,
    /// `ull`: unsigned 64-bit.
    Ull,
}

/// Strict major.minor feature version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    /// Major component.
    pub major: u32,
    /// Minor component.
    pub minor: u32,
}

impl Version {
    /// Construct a version pair.
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// A typed slot (parameter or return value): the structural type plus the
/// optional semantic group tag and data-dependent length expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PType {
    /// Structural native type.
    pub ty: NativeType,
    /// Semantic group tag (e.g. an enum group name or `Boolean`).
    pub group: Option<String>,
    /// Element count for pointer/array slots whose length is data-dependent.
    pub length: Option<Expression>,
}

/// A named command parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    /// Parameter name, unique within its command.
    pub name: String,
    /// Slot type.
    pub ty: PType,
}

/// A native entry point: return type plus ordered parameter list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// Entry-point name, the unique key into [`CommandMap`].
    pub entry_point: String,
    /// Return slot.
    pub return_ty: PType,
    /// Ordered parameters.
    pub parameters: Vec<Parameter>,
}

/// Insertion-ordered command table.
///
/// Duplicate entry-point names overwrite the existing entry: last write wins,
/// keeping the original declaration position. Override documents rely on this.
#[derive(Debug, Default, Clone)]
pub struct CommandMap {
    entries: Vec<Command>,
    index: HashMap<String, usize>,
}

impl CommandMap {
    /// Insert a command, overwriting any previous entry with the same name.
    pub fn insert(&mut self, command: Command) {
        if let Some(&position) = self.index.get(&command.entry_point) {
            self.entries[position] = command;
        } else {
            self.index
                .insert(command.entry_point.clone(), self.entries.len());
            self.entries.push(command);
        }
    }

    /// Look up a command by entry-point name.
    pub fn get(&self, name: &str) -> Option<&Command> {
        self.index.get(name).map(|&position| &self.entries[position])
    }

    /// Whether an entry point is present.
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Number of distinct commands.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Commands in original declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Command> {
        self.entries.iter()
    }
}

/// A single enum constant with its canonical 64-bit value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumEntry {
    /// Constant name.
    pub name: String,
    /// Canonical value; bit-exact per the declared literal suffix.
    pub value: u64,
    /// The literal's declared width/signedness tag.
    pub suffix: LiteralSuffix,
    /// Name of another entry this one aliases, if any.
    pub alias: Option<String>,
    /// Group memberships.
    pub groups: Vec<String>,
    /// Originating API restriction.
    pub api: Api,
}

/// A block of enum constants sharing a namespace.
///
/// Multiple groups may declare entries with the same name; later declarations
/// are overlays, not replacements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumGroup {
    /// Namespace the block belongs to.
    pub namespace: String,
    /// Group-name list from the block's `group` attribute.
    pub groups: Vec<String>,
    /// Bitmask or plain constants.
    pub kind: GroupKind,
    /// Reserving vendor, if any.
    pub vendor: Option<String>,
    /// Contiguous reserved numeric range (start, end), if declared.
    pub range: Option<(i64, i64)>,
    /// Ordered entries.
    pub entries: Vec<EnumEntry>,
}

/// A `<require>` block: validated command/enum names to add to a surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequireEntry {
    /// Target API qualifier.
    pub api: Api,
    /// Profile qualifier.
    pub profile: Profile,
    /// Required command entry points (resolved at parse time).
    pub commands: Vec<String>,
    /// Required enum names (resolved at parse time).
    pub enums: Vec<String>,
}

/// A `<remove>` block: validated command/enum names to subtract from a surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoveEntry {
    /// Target API qualifier.
    pub api: Api,
    /// Profile qualifier.
    pub profile: Profile,
    /// Removed command entry points (resolved at parse time).
    pub commands: Vec<String>,
    /// Removed enum names (resolved at parse time).
    pub enums: Vec<String>,
}

/// A named, versioned bundle of incremental additions/removals for one API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feature {
    /// Target API.
    pub api: Api,
    /// Semantic version of the feature.
    pub version: Version,
    /// Feature name (e.g. `GL_VERSION_1_5`).
    pub name: String,
    /// Ordered require blocks.
    pub requires: Vec<RequireEntry>,
    /// Ordered remove blocks.
    pub removes: Vec<RemoveEntry>,
}

/// A vendor-qualified, version-independent bundle of additions.
///
/// Extensions only add; they carry no remove entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extension {
    /// Full extension name (e.g. `GL_ARB_multisample`).
    pub name: String,
    /// Vendor tag sliced out of the name (e.g. `ARB`).
    pub vendor: String,
    /// APIs the extension supports.
    pub supported: Vec<Api>,
    /// Ordered require blocks.
    pub requires: Vec<RequireEntry>,
}

/// The complete parsed registry.
#[derive(Debug, Default, Clone)]
pub struct Specification {
    /// Command table, keyed by entry point, in declaration order.
    pub commands: CommandMap,
    /// Enum groups in document order.
    pub enum_groups: Vec<EnumGroup>,
    /// Features in document order.
    pub features: Vec<Feature>,
    /// Extensions in document order.
    pub extensions: Vec<Extension>,
}

impl Specification {
    /// Find an enum entry by name across all groups, first declaration wins.
    pub fn find_enum(&self, name: &str) -> Option<&EnumEntry> {
        self.enum_groups
            .iter()
            .flat_map(|group| group.entries.iter())
            .find(|entry| entry.name == name)
    }

    /// Whether any group declares an enum with the given name.
    pub fn contains_enum(&self, name: &str) -> bool {
        self.find_enum(name).is_some()
    }

    /// Find an extension by full name.
    pub fn find_extension(&self, name: &str) -> Option<&Extension> {
        self.extensions.iter().find(|ext| ext.name == name)
    }
}
