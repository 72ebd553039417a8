//! OpenGL registry parser and overload generator.
//!
//! This crate ingests the Khronos XML registry (`gl.xml`-style documents) and
//! resolves it into a fully-typed, cross-referenced intermediate
//! representation suitable for generating language bindings:
//! - Command signatures with structural native types and array-length
//!   expressions ([`parser`], [`types`], [`expr`])
//! - Enum groups with bit-exact 64-bit canonical values
//! - Version-gated features and vendor extensions, sliced per
//!   (api, profile, version) request ([`resolve`])
//! - An ordered pipeline of signature overloaders producing caller-friendly
//!   derived signatures ([`overloads`])
//!
//! Parsing is strict: any malformed input aborts the run with a
//! [`ParseError`]; no partial IR is ever produced. Code emission, file
//! discovery and documentation merging are collaborators outside this crate;
//! they consume the [`Specification`] snapshot and the overload sets.

pub mod error;
pub mod expr;
pub mod ir;
pub mod overloads;
pub mod parser;
pub mod resolve;
pub mod types;

pub use error::ParseError;
pub use ir::Specification;
pub use overloads::OverloaderPipeline;
pub use parser::{RegistryReader, XmlRegistryReader, parse_registry};
pub use resolve::ApiSurface;

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use crate::expr::Expression;
    use crate::ir::{Api, LiteralSuffix, Profile, Version};
    use crate::overloads::OverloaderPipeline;
    use crate::parser::parse_registry;
    use crate::types::{NativeType, PrimitiveKind};

    const TEST_REGISTRY_XML: &str = r#"<registry>
    <commands namespace="GL">
        <command>
            <proto>void <name>glFlush</name></proto>
        </command>
        <command>
            <proto group="Boolean"><ptype>GLboolean</ptype> <name>glIsEnabled</name></proto>
            <param group="EnableCap"><ptype>GLenum</ptype> <name>cap</name></param>
        </command>
        <command>
            <proto>void <name>glBufferData</name></proto>
            <param group="BufferTargetARB"><ptype>GLenum</ptype> <name>target</name></param>
            <param><ptype>GLsizeiptr</ptype> <name>size</name></param>
            <param len="size">const void *<name>data</name></param>
            <param group="BufferUsageARB"><ptype>GLenum</ptype> <name>usage</name></param>
        </command>
        <command>
            <proto>void <name>glDeleteTextures</name></proto>
            <param><ptype>GLsizei</ptype> <name>n</name></param>
            <param len="n">const <ptype>GLuint</ptype> *<name>textures</name></param>
        </command>
        <command>
            <proto>void <name>glColor4fv</name></proto>
            <param len="4">const <ptype>GLfloat</ptype> *<name>v</name></param>
        </command>
        <command>
            <proto>void <name>glTexImage2D</name></proto>
            <param group="TextureTarget"><ptype>GLenum</ptype> <name>target</name></param>
            <param><ptype>GLint</ptype> <name>level</name></param>
            <param><ptype>GLsizei</ptype> <name>width</name></param>
            <param><ptype>GLsizei</ptype> <name>height</name></param>
            <param len="COMPSIZE(width,height)">const void *<name>pixels</name></param>
        </command>
    </commands>
    <enums namespace="GL" group="Boolean">
        <enum value="0" name="GL_FALSE"/>
        <enum value="1" name="GL_TRUE"/>
    </enums>
    <enums namespace="GL" start="0x0500" end="0x05FF" vendor="ARB">
        <enum value="0x0500" name="GL_INVALID_ENUM"/>
        <enum value="0xFFFFFFFF" name="GL_INVALID_INDEX" type="u"/>
        <enum value="0xFFFFFFFFFFFFFFFF" name="GL_TIMEOUT_IGNORED" type="ull"/>
        <enum value="0x8000" name="GL_MULTISAMPLE_BIT"/>
        <enum value="0x8000" name="GL_MULTISAMPLE_BIT_ARB" alias="GL_MULTISAMPLE_BIT"/>
    </enums>
    <feature api="gl" name="GL_VERSION_1_0" number="1.0">
        <require>
            <command name="glFlush"/>
            <command name="glIsEnabled"/>
            <command name="glColor4fv"/>
            <command name="glTexImage2D"/>
            <enum name="GL_FALSE"/>
            <enum name="GL_TRUE"/>
        </require>
    </feature>
    <feature api="gl" name="GL_VERSION_1_5" number="1.5">
        <require>
            <command name="glBufferData"/>
            <command name="glDeleteTextures"/>
            <enum name="GL_INVALID_ENUM"/>
        </require>
    </feature>
    <feature api="gl" name="GL_VERSION_3_2" number="3.2">
        <remove profile="core">
            <command name="glColor4fv"/>
        </remove>
    </feature>
    <extensions>
        <extension name="GL_ARB_timeout_query" supported="gl|gles2">
            <require>
                <enum name="GL_TIMEOUT_IGNORED"/>
            </require>
        </extension>
    </extensions>
</registry>"#;

    #[test]
    fn test_parse_full_registry() {
        let spec = parse_registry(TEST_REGISTRY_XML).unwrap();

        assert_eq!(spec.commands.len(), 6);
        assert_eq!(spec.enum_groups.len(), 2);
        assert_eq!(spec.features.len(), 3);
        assert_eq!(spec.extensions.len(), 1);

        let buffer_data = spec.commands.get("glBufferData").unwrap();
        assert_eq!(buffer_data.parameters.len(), 4);
        assert_eq!(
            buffer_data.parameters[2].ty.ty,
            NativeType::Pointer {
                base: Box::new(NativeType::Primitive(PrimitiveKind::Void)),
                is_const: true,
            }
        );
        assert_eq!(
            buffer_data.parameters[2].ty.length,
            Some(Expression::ParameterRef("size".to_string()))
        );
        assert_eq!(
            buffer_data.parameters[0].ty.group.as_deref(),
            Some("BufferTargetARB")
        );

        let tex_image = spec.commands.get("glTexImage2D").unwrap();
        assert_eq!(
            tex_image.parameters[4].ty.length,
            Some(Expression::SizeOf(vec![
                Expression::ParameterRef("width".to_string()),
                Expression::ParameterRef("height".to_string()),
            ]))
        );
    }

    #[test]
    fn test_enum_values_are_bit_exact() {
        let spec = parse_registry(TEST_REGISTRY_XML).unwrap();

        let multisample = spec.find_enum("GL_MULTISAMPLE_BIT").unwrap();
        assert_eq!(multisample.value, 0x0000_0000_0000_8000);
        assert_eq!(multisample.suffix, LiteralSuffix::None);

        let invalid_index = spec.find_enum("GL_INVALID_INDEX").unwrap();
        assert_eq!(invalid_index.value, 0x0000_0000_FFFF_FFFF);
        assert_eq!(invalid_index.suffix, LiteralSuffix::U);

        let timeout = spec.find_enum("GL_TIMEOUT_IGNORED").unwrap();
        assert_eq!(timeout.value, u64::MAX);
        assert_eq!(timeout.suffix, LiteralSuffix::Ull);

        let alias = spec.find_enum("GL_MULTISAMPLE_BIT_ARB").unwrap();
        assert_eq!(alias.alias.as_deref(), Some("GL_MULTISAMPLE_BIT"));
    }

    #[test]
    fn test_enum_group_metadata() {
        let spec = parse_registry(TEST_REGISTRY_XML).unwrap();
        let reserved = &spec.enum_groups[1];
        assert_eq!(reserved.vendor.as_deref(), Some("ARB"));
        assert_eq!(reserved.range, Some((0x0500, 0x05FF)));
    }

    #[test]
    fn test_extension_vendor_and_supported_apis() {
        let spec = parse_registry(TEST_REGISTRY_XML).unwrap();
        let extension = spec.find_extension("GL_ARB_timeout_query").unwrap();
        assert_eq!(extension.vendor, "ARB");
        assert_eq!(extension.supported, [Api::Gl, Api::Gles2]);
        assert_eq!(extension.requires[0].enums, ["GL_TIMEOUT_IGNORED"]);
    }

    #[test]
    fn test_resolve_then_overload_end_to_end() {
        let spec = parse_registry(TEST_REGISTRY_XML).unwrap();
        let surface = spec.resolve_surface(Api::Gl, Profile::Core, Version::new(3, 2));

        // glColor4fv is removed from the core profile at 3.2.
        assert!(!surface.commands.contains("glColor4fv"));
        assert!(surface.commands.contains("glBufferData"));

        let ordered = surface.commands_in_declaration_order(&spec);
        let names: Vec<&str> = ordered.iter().map(|c| c.entry_point.as_str()).collect();
        assert_eq!(
            names,
            ["glFlush", "glIsEnabled", "glBufferData", "glDeleteTextures", "glTexImage2D"]
        );

        let pipeline = OverloaderPipeline::new();
        let overloads = pipeline.consume(ordered.iter().copied());

        // glIsEnabled gets a boolean return, glBufferData and glTexImage2D
        // get void-pointer parameter rewrites; glFlush and glDeleteTextures
        // pass through untouched.
        let bodies: Vec<&str> = overloads.iter().map(|o| o.body.as_str()).collect();
        assert_eq!(
            bodies,
            [
                "glIsEnabled(cap) != 0",
                "glBufferData(target, size, data as _, usage)",
                "glTexImage2D(target, level, width, height, pixels as _)",
            ]
        );
    }

    #[test]
    fn test_two_runs_produce_identical_output() {
        let run = || {
            let spec = parse_registry(TEST_REGISTRY_XML).unwrap();
            let surface = spec.resolve_surface(Api::Gl, Profile::Core, Version::new(3, 2));
            let ordered = surface.commands_in_declaration_order(&spec);
            OverloaderPipeline::new()
                .consume(ordered.iter().copied())
                .iter()
                .map(|o| format!("{}:{}", o.signature.entry_point, o.body))
                .collect::<Vec<_>>()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_fatal_error_produces_no_specification() {
        let broken = r#"<registry>
            <feature api="gl" name="GL_VERSION_1_0" number="1.0">
                <require><command name="glMissing"/></require>
            </feature>
        </registry>"#;
        let result = parse_registry(broken);
        assert!(result.is_err());
    }
}
