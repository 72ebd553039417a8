//! Registry document parser.
//!
//! Walks the XML registry and produces the cross-referenced [`Specification`]:
//! commands and enums are parsed first, then features and extensions resolve
//! their require/remove entries against those tables. That ordering is a hard
//! dependency, not an optimization.
//!
//! The parser is intentionally strict: a missing required attribute, an
//! unresolved command/enum reference, or an attribute value outside its closed
//! enumeration aborts the whole run. There is no partial or best-effort mode.

use roxmltree::{Document, Node};
use tracing::{debug, info};

use crate::error::{ParseError, ReferenceKind};
use crate::expr::parse_expression;
use crate::ir::{
    Api, Command, CommandMap, EnumEntry, EnumGroup, Extension, Feature, GroupKind, LiteralSuffix,
    PType, Parameter, Profile, RemoveEntry, RequireEntry, Specification, Version,
};
use crate::types::parse_type;

/// A reader variant producing the common [`Specification`] IR.
///
/// The XML registry schema is the shipped format; readers over other schemas
/// plug in behind the same contract.
pub trait RegistryReader {
    /// Parse one document into the IR.
    fn read(&self, input: &str) -> Result<Specification, ParseError>;
}

/// Reader for the Khronos XML registry schema.
#[derive(Debug, Clone, Copy, Default)]
pub struct XmlRegistryReader;

impl RegistryReader for XmlRegistryReader {
    fn read(&self, input: &str) -> Result<Specification, ParseError> {
        parse_registry(input)
    }
}

/// Parse a registry document into a fresh [`Specification`].
pub fn parse_registry(xml: &str) -> Result<Specification, ParseError> {
    let mut spec = Specification::default();
    parse_into(xml, &mut spec)?;
    Ok(spec)
}

impl Specification {
    /// Apply a same-schema override document as a post-hoc amendment.
    ///
    /// Commands overwrite existing entries by entry point (last write wins);
    /// enum groups are appended as overlays; features and extensions are
    /// appended and their require/remove entries resolve against the merged
    /// tables.
    pub fn apply_overrides(&mut self, xml: &str) -> Result<(), ParseError> {
        parse_into(xml, self)
    }
}

fn parse_into(xml: &str, spec: &mut Specification) -> Result<(), ParseError> {
    let document = Document::parse(xml)?;
    let root = document.root_element();

    parse_commands(root, &mut spec.commands)?;
    parse_enum_groups(root, &mut spec.enum_groups)?;

    // Features and extensions resolve names against the tables built above.
    parse_features(root, spec)?;
    parse_extensions(root, spec)?;

    Ok(())
}

fn child_elements<'a, 'input: 'a>(
    node: Node<'a, 'input>,
    name: &'a str,
) -> impl Iterator<Item = Node<'a, 'input>> + 'a {
    node.children().filter(move |n| n.has_tag_name(name))
}

fn child_element<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|n| n.has_tag_name(name))
}

fn missing(node: Node<'_, '_>, attribute: &str) -> ParseError {
    ParseError::MissingAttribute {
        element: node.tag_name().name().to_string(),
        attribute: attribute.to_string(),
    }
}

fn require_attribute<'a>(node: Node<'a, '_>, attribute: &str) -> Result<&'a str, ParseError> {
    node.attribute(attribute).ok_or_else(|| missing(node, attribute))
}

/// Split a comma/pipe-delimited list attribute, dropping empty entries.
fn list_attribute(node: Node<'_, '_>, attribute: &str, separator: char) -> Vec<String> {
    node.attribute(attribute)
        .map(|value| {
            value
                .split(separator)
                .filter(|item| !item.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

fn parse_commands(root: Node<'_, '_>, commands: &mut CommandMap) -> Result<(), ParseError> {
    info!("parsing commands");
    for block in child_elements(root, "commands") {
        for element in child_elements(block, "command") {
            commands.insert(parse_command(element)?);
        }
    }
    debug!(count = commands.len(), "parsed commands");
    Ok(())
}

fn parse_command(node: Node<'_, '_>) -> Result<Command, ParseError> {
    let proto = child_element(node, "proto").ok_or_else(|| missing(node, "proto"))?;
    let entry_point = child_element(proto, "name")
        .and_then(|n| n.text())
        .ok_or_else(|| missing(proto, "name"))?
        .trim()
        .to_string();

    let mut parameters = Vec::new();
    for param in child_elements(node, "param") {
        let name = child_element(param, "name")
            .and_then(|n| n.text())
            .ok_or_else(|| missing(param, "name"))?
            .trim()
            .to_string();
        parameters.push(Parameter {
            name,
            ty: parse_ptype(param)?,
        });
    }

    let return_ty = parse_ptype(proto)?;

    Ok(Command {
        entry_point,
        return_ty,
        parameters,
    })
}

/// Parse the typed slot of a `<proto>` or `<param>` element: the element text
/// with the `<name>` child excluded is the type description; `group` and `len`
/// attributes carry the semantic tag and length expression.
fn parse_ptype(node: Node<'_, '_>) -> Result<PType, ParseError> {
    let group = node.attribute("group").map(str::to_string);
    let length = node.attribute("len").map(parse_expression).transpose()?;
    let text = type_text(node);
    Ok(PType {
        ty: parse_type(&text)?,
        group,
        length,
    })
}

fn type_text(node: Node<'_, '_>) -> String {
    let mut text = String::new();
    for child in node.children() {
        if child.is_text() {
            text.push_str(child.text().unwrap_or(""));
        } else if child.is_element() && !child.has_tag_name("name") {
            text.push_str(child.text().unwrap_or(""));
        }
    }
    text.trim().to_string()
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

fn parse_enum_groups(root: Node<'_, '_>, groups: &mut Vec<EnumGroup>) -> Result<(), ParseError> {
    info!("parsing enums");
    for block in child_elements(root, "enums") {
        let namespace = require_attribute(block, "namespace")?.to_string();
        let group_names = list_attribute(block, "group", ',');
        let vendor = block.attribute("vendor").map(str::to_string);
        let kind = parse_group_kind(block.attribute("type"))?;
        let range = parse_group_range(block)?;

        let mut entries = Vec::new();
        for element in child_elements(block, "enum") {
            entries.push(parse_enum_entry(element)?);
        }

        groups.push(EnumGroup {
            namespace,
            groups: group_names,
            kind,
            vendor,
            range,
            entries,
        });
    }
    Ok(())
}

fn parse_group_kind(value: Option<&str>) -> Result<GroupKind, ParseError> {
    match value {
        None | Some("") => Ok(GroupKind::Plain),
        Some("bitmask") => Ok(GroupKind::Bitmask),
        Some(other) => Err(ParseError::InvalidEnumeratedValue {
            what: "enum group kind",
            value: other.to_string(),
        }),
    }
}

/// `start`/`end` must come as a pair or not at all.
fn parse_group_range(node: Node<'_, '_>) -> Result<Option<(i64, i64)>, ParseError> {
    match (node.attribute("start"), node.attribute("end")) {
        (None, None) => Ok(None),
        (Some(start), Some(end)) => Ok(Some((parse_i64_literal(start)?, parse_i64_literal(end)?))),
        (Some(_), None) => Err(missing(node, "end")),
        (None, Some(_)) => Err(missing(node, "start")),
    }
}

fn parse_enum_entry(node: Node<'_, '_>) -> Result<EnumEntry, ParseError> {
    let name = require_attribute(node, "name")?.to_string();
    let literal = require_attribute(node, "value")?;
    let suffix = parse_literal_suffix(node.attribute("type"))?;
    let value = convert_literal(literal, suffix)?;
    let alias = node.attribute("alias").map(str::to_string);
    let groups = list_attribute(node, "group", ',');
    let api = parse_api(node.attribute("api"))?;

    Ok(EnumEntry {
        name,
        value,
        suffix,
        alias,
        groups,
        api,
    })
}

fn parse_literal_suffix(value: Option<&str>) -> Result<LiteralSuffix, ParseError> {
    match value {
        None | Some("") => Ok(LiteralSuffix::None),
        Some("u") => Ok(LiteralSuffix::U),
        Some("ull") => Ok(LiteralSuffix::Ull),
        Some(other) => Err(ParseError::InvalidLiteralSuffix(other.to_string())),
    }
}

/// Convert an enum value literal to its canonical 64-bit pattern.
///
/// No suffix: parse as 32-bit signed and sign-extend through the unsigned
/// pattern, so `0xFFFFFFFF` becomes `0xFFFFFFFFFFFFFFFF`. `u`: parse as
/// unsigned 32-bit and zero-extend. `ull`: parse as signed 64-bit (hex admits
/// full-width two's-complement patterns) and reinterpret as unsigned.
fn convert_literal(text: &str, suffix: LiteralSuffix) -> Result<u64, ParseError> {
    match suffix {
        LiteralSuffix::None => Ok(parse_i32_literal(text)? as i64 as u64),
        LiteralSuffix::U => Ok(u64::from(parse_u32_literal(text)?)),
        LiteralSuffix::Ull => Ok(parse_i64_literal(text)? as u64),
    }
}

fn hex_digits(text: &str) -> Option<&str> {
    text.strip_prefix("0x").or_else(|| text.strip_prefix("0X"))
}

fn parse_i32_literal(text: &str) -> Result<i32, ParseError> {
    let parsed = match hex_digits(text) {
        Some(digits) => u32::from_str_radix(digits, 16).map(|v| v as i32),
        None => text.parse::<i32>(),
    };
    parsed.map_err(|_| ParseError::MalformedLiteral(text.to_string()))
}

fn parse_u32_literal(text: &str) -> Result<u32, ParseError> {
    let parsed = match hex_digits(text) {
        Some(digits) => u32::from_str_radix(digits, 16),
        None => text.parse::<u32>(),
    };
    parsed.map_err(|_| ParseError::MalformedLiteral(text.to_string()))
}

fn parse_i64_literal(text: &str) -> Result<i64, ParseError> {
    let parsed = match hex_digits(text) {
        Some(digits) => u64::from_str_radix(digits, 16).map(|v| v as i64),
        None => text.parse::<i64>(),
    };
    parsed.map_err(|_| ParseError::MalformedLiteral(text.to_string()))
}

// ---------------------------------------------------------------------------
// Features and extensions
// ---------------------------------------------------------------------------

fn parse_features(root: Node<'_, '_>, spec: &mut Specification) -> Result<(), ParseError> {
    info!("parsing features");
    for node in child_elements(root, "feature") {
        let api = parse_api(Some(require_attribute(node, "api")?))?;
        let name = require_attribute(node, "name")?.to_string();
        let version = parse_version(require_attribute(node, "number")?)?;

        let mut requires = Vec::new();
        for block in child_elements(node, "require") {
            requires.push(parse_require(block, spec)?);
        }

        let mut removes = Vec::new();
        for block in child_elements(node, "remove") {
            removes.push(parse_remove(block, spec)?);
        }

        debug!(feature = %name, version = %version, "parsed feature");
        spec.features.push(Feature {
            api,
            version,
            name,
            requires,
            removes,
        });
    }
    Ok(())
}

fn parse_extensions(root: Node<'_, '_>, spec: &mut Specification) -> Result<(), ParseError> {
    info!("parsing extensions");
    // Extensions appear directly under the root or grouped in an
    // <extensions> block; accept both placements.
    let direct = child_elements(root, "extension");
    let grouped = child_elements(root, "extensions").flat_map(|block| child_elements(block, "extension"));

    for node in direct.chain(grouped) {
        let name = require_attribute(node, "name")?.to_string();
        let vendor = extension_vendor(&name)?;

        let supported: Vec<Api> = require_attribute(node, "supported")?
            .split('|')
            .filter(|item| !item.is_empty())
            .map(|item| parse_api(Some(item)))
            .collect::<Result<_, _>>()?;
        if supported.is_empty() {
            return Err(missing(node, "supported"));
        }

        let mut requires = Vec::new();
        for block in child_elements(node, "require") {
            requires.push(parse_require(block, spec)?);
        }

        spec.extensions.push(Extension {
            name,
            vendor,
            supported,
            requires,
        });
    }
    Ok(())
}

/// Slice the vendor tag out of an extension name: the characters from byte
/// offset 3 up to the next underscore (`GL_ARB_multisample` -> `ARB`).
fn extension_vendor(name: &str) -> Result<String, ParseError> {
    let rest = name
        .get(3..)
        .ok_or_else(|| ParseError::MalformedExtensionName(name.to_string()))?;
    let end = rest
        .find('_')
        .ok_or_else(|| ParseError::MalformedExtensionName(name.to_string()))?;
    if end == 0 {
        return Err(ParseError::MalformedExtensionName(name.to_string()));
    }
    Ok(rest[..end].to_string())
}

fn parse_require(node: Node<'_, '_>, spec: &Specification) -> Result<RequireEntry, ParseError> {
    let api = parse_api(node.attribute("api"))?;
    let profile = parse_profile(node.attribute("profile"))?;
    let (commands, enums) = parse_interface_refs(node, spec)?;
    Ok(RequireEntry {
        api,
        profile,
        commands,
        enums,
    })
}

fn parse_remove(node: Node<'_, '_>, spec: &Specification) -> Result<RemoveEntry, ParseError> {
    let api = parse_api(node.attribute("api"))?;
    let profile = parse_profile(node.attribute("profile"))?;
    let (commands, enums) = parse_interface_refs(node, spec)?;
    Ok(RemoveEntry {
        api,
        profile,
        commands,
        enums,
    })
}

/// Resolve the `<command>`/`<enum>` children of a require/remove block against
/// the already-built tables. A name that does not resolve is a hard error.
fn parse_interface_refs(
    node: Node<'_, '_>,
    spec: &Specification,
) -> Result<(Vec<String>, Vec<String>), ParseError> {
    let mut commands = Vec::new();
    let mut enums = Vec::new();

    for entry in node.children().filter(Node::is_element) {
        match entry.tag_name().name() {
            "command" => {
                let name = require_attribute(entry, "name")?;
                if !spec.commands.contains(name) {
                    return Err(ParseError::UnresolvedReference {
                        kind: ReferenceKind::Command,
                        name: name.to_string(),
                    });
                }
                commands.push(name.to_string());
            }
            "enum" => {
                let name = require_attribute(entry, "name")?;
                if !spec.contains_enum(name) {
                    return Err(ParseError::UnresolvedReference {
                        kind: ReferenceKind::Enum,
                        name: name.to_string(),
                    });
                }
                enums.push(name.to_string());
            }
            // <type> and comment entries carry no binding information.
            _ => {}
        }
    }

    Ok((commands, enums))
}

fn parse_version(text: &str) -> Result<Version, ParseError> {
    let (major, minor) = text
        .split_once('.')
        .ok_or_else(|| ParseError::MalformedVersion(text.to_string()))?;
    let major = major
        .parse()
        .map_err(|_| ParseError::MalformedVersion(text.to_string()))?;
    let minor = minor
        .parse()
        .map_err(|_| ParseError::MalformedVersion(text.to_string()))?;
    Ok(Version::new(major, minor))
}

/// Parse an API identifier. Absent or empty means no restriction; anything
/// outside the closed vocabulary is fatal.
fn parse_api(value: Option<&str>) -> Result<Api, ParseError> {
    match value {
        None | Some("") => Ok(Api::None),
        Some("gl") => Ok(Api::Gl),
        Some("gles1") => Ok(Api::Gles1),
        Some("gles2") => Ok(Api::Gles2),
        Some("glsc2") => Ok(Api::Glsc2),
        Some(other) => Err(ParseError::InvalidEnumeratedValue {
            what: "API identifier",
            value: other.to_string(),
        }),
    }
}

/// Parse a profile identifier, same closed-vocabulary policy as [`parse_api`].
fn parse_profile(value: Option<&str>) -> Result<Profile, ParseError> {
    match value {
        None | Some("") => Ok(Profile::None),
        Some("core") => Ok(Profile::Core),
        Some("compatibility") => Ok(Profile::Compatibility),
        Some("common") => Ok(Profile::Common),
        Some(other) => Err(ParseError::InvalidEnumeratedValue {
            what: "profile identifier",
            value: other.to_string(),
        }),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::expr::Expression;
    use crate::types::{NativeType, PrimitiveKind};

    #[test]
    fn test_vendor_tag_extraction() {
        assert_eq!(extension_vendor("GL_ARB_multisample").unwrap(), "ARB");
        assert_eq!(extension_vendor("GL_EXT_texture3D").unwrap(), "EXT");
        assert_eq!(extension_vendor("GL_NV_fence").unwrap(), "NV");
    }

    #[test]
    fn test_vendor_tag_requires_second_underscore() {
        assert!(matches!(
            extension_vendor("GL_ARB").unwrap_err(),
            ParseError::MalformedExtensionName(_)
        ));
        assert!(matches!(
            extension_vendor("GL__broken").unwrap_err(),
            ParseError::MalformedExtensionName(_)
        ));
        assert!(matches!(
            extension_vendor("GL").unwrap_err(),
            ParseError::MalformedExtensionName(_)
        ));
    }

    #[test]
    fn test_literal_conversion_is_bit_exact() {
        // No suffix: signed 32-bit reinterpreted through the unsigned pattern.
        assert_eq!(
            convert_literal("0x8000", LiteralSuffix::None).unwrap(),
            0x0000_0000_0000_8000
        );
        assert_eq!(
            convert_literal("0xFFFFFFFF", LiteralSuffix::None).unwrap(),
            0xFFFF_FFFF_FFFF_FFFF
        );
        assert_eq!(convert_literal("-1", LiteralSuffix::None).unwrap(), u64::MAX);
        // u: unsigned 32-bit, zero-extended.
        assert_eq!(
            convert_literal("0xFFFFFFFF", LiteralSuffix::U).unwrap(),
            0x0000_0000_FFFF_FFFF
        );
        // ull: full 64-bit patterns.
        assert_eq!(convert_literal("1", LiteralSuffix::Ull).unwrap(), 1);
        assert_eq!(
            convert_literal("0xFFFFFFFFFFFFFFFF", LiteralSuffix::Ull).unwrap(),
            u64::MAX
        );
    }

    #[test]
    fn test_unrecognized_suffix_is_fatal() {
        assert!(matches!(
            parse_literal_suffix(Some("ll")).unwrap_err(),
            ParseError::InvalidLiteralSuffix(s) if s == "ll"
        ));
    }

    #[test]
    fn test_version_must_be_major_minor() {
        assert_eq!(parse_version("3.2").unwrap(), Version::new(3, 2));
        assert!(parse_version("3").is_err());
        assert!(parse_version("3.x").is_err());
    }

    #[test]
    fn test_api_and_profile_vocabularies_are_closed() {
        assert_eq!(parse_api(Some("gles2")).unwrap(), Api::Gles2);
        assert_eq!(parse_api(None).unwrap(), Api::None);
        assert!(parse_api(Some("vulkan")).is_err());

        assert_eq!(parse_profile(Some("core")).unwrap(), Profile::Core);
        assert!(parse_profile(Some("webgl")).is_err());
    }

    #[test]
    fn test_parse_command_with_mixed_type_text() {
        let xml = r#"<registry>
            <commands namespace="GL">
                <command>
                    <proto>const <ptype>GLubyte</ptype> *<name>glGetString</name></proto>
                    <param group="StringName"><ptype>GLenum</ptype> <name>name</name></param>
                </command>
            </commands>
        </registry>"#;
        let spec = parse_registry(xml).unwrap();
        let command = spec.commands.get("glGetString").unwrap();
        assert_eq!(
            command.return_ty.ty,
            NativeType::Pointer {
                base: Box::new(NativeType::Primitive(PrimitiveKind::Byte)),
                is_const: true,
            }
        );
        assert_eq!(command.parameters[0].name, "name");
        assert_eq!(command.parameters[0].ty.group.as_deref(), Some("StringName"));
    }

    #[test]
    fn test_parse_param_length_expression() {
        let xml = r#"<registry>
            <commands namespace="GL">
                <command>
                    <proto>void <name>glReadnPixels</name></proto>
                    <param><ptype>GLsizei</ptype> <name>bufSize</name></param>
                    <param len="bufSize">void *<name>data</name></param>
                </command>
            </commands>
        </registry>"#;
        let spec = parse_registry(xml).unwrap();
        let command = spec.commands.get("glReadnPixels").unwrap();
        assert_eq!(
            command.parameters[1].ty.length,
            Some(Expression::ParameterRef("bufSize".to_string()))
        );
    }

    #[test]
    fn test_enums_group_range_must_be_paired() {
        let xml = r#"<registry>
            <enums namespace="GL" start="0x0500">
                <enum value="0x0500" name="GL_INVALID_ENUM"/>
            </enums>
        </registry>"#;
        assert!(matches!(
            parse_registry(xml).unwrap_err(),
            ParseError::MissingAttribute { attribute, .. } if attribute == "end"
        ));
    }

    #[test]
    fn test_unresolved_require_command_aborts() {
        let xml = r#"<registry>
            <feature api="gl" name="GL_VERSION_1_0" number="1.0">
                <require><command name="glDoesNotExist"/></require>
            </feature>
        </registry>"#;
        let err = parse_registry(xml).unwrap_err();
        assert!(matches!(
            err,
            ParseError::UnresolvedReference {
                kind: ReferenceKind::Command,
                name,
            } if name == "glDoesNotExist"
        ));
    }

    #[test]
    fn test_extension_with_unknown_supported_api_aborts() {
        let xml = r#"<registry>
            <extensions>
                <extension name="GL_ARB_thing" supported="gl|glcore">
                    <require/>
                </extension>
            </extensions>
        </registry>"#;
        assert!(matches!(
            parse_registry(xml).unwrap_err(),
            ParseError::InvalidEnumeratedValue { .. }
        ));
    }

    #[test]
    fn test_extension_with_empty_supported_list_aborts() {
        let xml = r#"<registry>
            <extension name="GL_ARB_thing" supported=""/>
        </registry>"#;
        assert!(matches!(
            parse_registry(xml).unwrap_err(),
            ParseError::MissingAttribute { attribute, .. } if attribute == "supported"
        ));
    }

    #[test]
    fn test_override_document_overwrites_commands_last_wins() {
        let primary = r#"<registry>
            <commands namespace="GL">
                <command>
                    <proto>void <name>glFoo</name></proto>
                </command>
            </commands>
        </registry>"#;
        let overlay = r#"<registry>
            <commands namespace="GL">
                <command>
                    <proto>void <name>glFoo</name></proto>
                    <param><ptype>GLint</ptype> <name>x</name></param>
                </command>
            </commands>
        </registry>"#;

        let mut spec = parse_registry(primary).unwrap();
        assert!(spec.commands.get("glFoo").unwrap().parameters.is_empty());

        // Overlay semantics are deliberate: the last override file to mention
        // a command silently replaces the earlier signature.
        spec.apply_overrides(overlay).unwrap();
        assert_eq!(spec.commands.len(), 1);
        assert_eq!(spec.commands.get("glFoo").unwrap().parameters.len(), 1);
    }

    #[test]
    fn test_override_feature_resolves_against_primary_tables() {
        let primary = r#"<registry>
            <commands namespace="GL">
                <command>
                    <proto>void <name>glFoo</name></proto>
                </command>
            </commands>
        </registry>"#;
        let overlay = r#"<registry>
            <feature api="gl" name="GL_VERSION_1_0" number="1.0">
                <require><command name="glFoo"/></require>
            </feature>
        </registry>"#;

        let mut spec = parse_registry(primary).unwrap();
        spec.apply_overrides(overlay).unwrap();
        assert_eq!(spec.features.len(), 1);
        assert_eq!(spec.features[0].requires[0].commands, ["glFoo"]);
    }
}
