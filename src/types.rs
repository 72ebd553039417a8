//! Structural native type model and the textual type parser.
//!
//! Types are parsed from the normalized text of a `<proto>`/`<param>` element
//! (qualifiers plus the declarator, with the `<name>` token stripped out
//! upstream). Parsing is purely textual and deterministic: identical input
//! always yields an identical value, and equal types compare equal, which the
//! overload pipeline relies on for grouping.

use crate::error::ParseError;

/// Primitive scalar kinds the registry vocabulary maps onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveKind {
    /// `void` / `GLvoid`.
    Void,
    /// Boolean convenience kind. Never produced by the lookup table; only the
    /// overload pipeline introduces it.
    Bool,
    /// Unsigned 8-bit (`GLubyte`, `GLboolean`, `GLchar`).
    Byte,
    /// Signed 8-bit (`GLbyte`).
    Sbyte,
    /// Signed 16-bit (`GLshort`, `GLhalf`).
    Short,
    /// Unsigned 16-bit (`GLushort`, `GLhalfNV`).
    Ushort,
    /// Signed 32-bit (`GLint`, `GLsizei`, `GLfixed`).
    Int,
    /// Unsigned 32-bit (`GLuint`, `GLbitfield`).
    Uint,
    /// 32-bit float (`GLfloat`, `GLclampf`).
    Float,
    /// 64-bit float (`GLdouble`, `GLclampd`).
    Double,
    /// `GLenum`.
    Enum,
    /// Pointer-sized integer (`GLintptr`, `GLsizeiptr`).
    IntPtr,
    /// Untyped pointer spelled as a leaf name (`GLeglImageOES`).
    VoidPtr,
}

/// Platform-specific handle kinds with no structural decomposition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpaqueKind {
    /// `GLsync`.
    Sync,
    /// `_cl_context`.
    ClContext,
    /// `_cl_event`.
    ClEvent,
    /// `GLDEBUGPROC`.
    DebugProc,
    /// `GLDEBUGPROCARB`.
    DebugProcArb,
    /// `GLDEBUGPROCKHR`.
    DebugProcKhr,
    /// `GLDEBUGPROCAMD`.
    DebugProcAmd,
    /// `GLDEBUGPROCNV`.
    DebugProcNv,
    /// `GLhandleARB`. Platform specific on Apple.
    HandleArb,
}

/// A native type: primitive, pointer-to, fixed array-of, or an opaque handle
/// resolved by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NativeType {
    /// A scalar from the recognized vocabulary.
    Primitive(PrimitiveKind),
    /// Pointer to a base type.
    Pointer {
        /// Pointee type.
        base: Box<NativeType>,
        /// Whether the pointee is `const`-qualified.
        is_const: bool,
    },
    /// Fixed-size array of a base type.
    Array {
        /// Element type.
        base: Box<NativeType>,
        /// Whether the elements are `const`-qualified.
        is_const: bool,
        /// Declared element count.
        length: i32,
    },
    /// A named handle type with no structural decomposition.
    Opaque {
        /// Original registry spelling.
        name: String,
        /// Resolved handle kind.
        kind: OpaqueKind,
        /// Whether the handle is `const`-qualified.
        is_const: bool,
    },
}

/// Parse a normalized type description by peeling declarators right-to-left:
/// trailing `[N]` array suffixes, trailing `*` pointers (with `const` in
/// either position), a leading `struct` tag, and finally an exhaustive leaf
/// lookup.
pub fn parse_type(text: &str) -> Result<NativeType, ParseError> {
    let text = text.trim();

    if let Some(prefix) = text.strip_suffix(']') {
        // Trailing [N] is a fixed array suffix.
        let open = prefix
            .rfind('[')
            .ok_or_else(|| ParseError::UnknownType(text.to_string()))?;
        let length_text = prefix[open + 1..].trim();
        let length: i32 = length_text
            .parse()
            .map_err(|_| ParseError::MalformedLiteral(length_text.to_string()))?;
        let base = parse_type(&prefix[..open])?;
        return Ok(NativeType::Array {
            base: Box::new(base),
            is_const: false,
            length,
        });
    }

    if let Some(without_asterisk) = text.strip_suffix('*') {
        let mut pointee = without_asterisk.trim_end();
        let mut is_const = false;
        // const may qualify the pointee from either side.
        if let Some(stripped) = pointee.strip_suffix("const") {
            is_const = true;
            pointee = stripped;
        } else if let Some(stripped) = pointee.strip_prefix("const") {
            is_const = true;
            pointee = stripped;
        }
        let base = parse_type(pointee)?;
        return Ok(NativeType::Pointer {
            base: Box::new(base),
            is_const,
        });
    }

    // struct-ness adds no information to the IR; needed for _cl_context and
    // _cl_event spellings.
    if let Some(rest) = text.strip_prefix("struct") {
        return parse_type(rest);
    }

    leaf_type(text)
}

fn leaf_type(name: &str) -> Result<NativeType, ParseError> {
    let kind = match name {
        "void" | "GLvoid" | "GLVULKANPROCNV" => PrimitiveKind::Void,
        "GLenum" => PrimitiveKind::Enum,
        "GLboolean" | "GLubyte" | "GLchar" | "GLcharARB" => PrimitiveKind::Byte,
        "GLbitfield" => PrimitiveKind::Uint,
        "GLbyte" => PrimitiveKind::Sbyte,
        "GLshort" | "GLhalf" | "GLhalfARB" => PrimitiveKind::Short,
        "GLushort" | "GLhalfNV" => PrimitiveKind::Ushort,
        "GLint" | "GLclampx" | "GLsizei" | "GLfixed" | "GLint64" | "GLint64EXT" => {
            PrimitiveKind::Int
        }
        "GLuint" | "GLuint64" | "GLuint64EXT" => PrimitiveKind::Uint,
        "GLfloat" | "GLclampf" => PrimitiveKind::Float,
        "GLdouble" | "GLclampd" => PrimitiveKind::Double,
        "GLintptr" | "GLintptrARB" | "GLsizeiptr" | "GLsizeiptrARB" | "GLvdpauSurfaceNV" => {
            PrimitiveKind::IntPtr
        }
        "GLeglClientBufferEXT" | "GLeglImageOES" => PrimitiveKind::VoidPtr,
        _ => return opaque_type(name),
    };
    Ok(NativeType::Primitive(kind))
}

fn opaque_type(name: &str) -> Result<NativeType, ParseError> {
    let kind = match name {
        "GLsync" => OpaqueKind::Sync,
        "_cl_context" => OpaqueKind::ClContext,
        "_cl_event" => OpaqueKind::ClEvent,
        "GLDEBUGPROC" => OpaqueKind::DebugProc,
        "GLDEBUGPROCARB" => OpaqueKind::DebugProcArb,
        "GLDEBUGPROCKHR" => OpaqueKind::DebugProcKhr,
        "GLDEBUGPROCAMD" => OpaqueKind::DebugProcAmd,
        "GLDEBUGPROCNV" => OpaqueKind::DebugProcNv,
        "GLhandleARB" => OpaqueKind::HandleArb,
        _ => return Err(ParseError::UnknownType(name.to_string())),
    };
    Ok(NativeType::Opaque {
        name: name.to_string(),
        kind,
        is_const: false,
    })
}
