//! Signature overload pipeline.
//!
//! An ordered list of independent transformers. Each decides applicability
//! against a native command signature and emits zero or more derived,
//! caller-friendly signatures together with a marshalling body template for
//! the writer. Outputs are additive: a signature matching several stages
//! yields several independent overloads, in stage order. The pipeline runs
//! exactly once per native signature and never feeds its own output back in.

use std::fmt;

use crate::expr::Expression;
use crate::ir::{Command, Parameter};
use crate::types::{NativeType, PrimitiveKind};

/// A derived signature plus the marshalling body template the writer splices
/// in place of the raw native call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Overload {
    /// The rewritten signature.
    pub signature: Command,
    /// Call-forwarding template for the writer.
    pub body: String,
}

/// A single overload-generation strategy.
pub trait Overloader {
    /// Whether this stage would rewrite the given signature.
    fn is_applicable(&self, signature: &Command) -> bool;
    /// Produce the derived overloads for an applicable signature.
    fn create_overloads(&self, signature: &Command) -> Vec<Overload>;
}

/// Ordered pipeline of overloaders applied to each native signature.
pub struct OverloaderPipeline {
    stages: Vec<Box<dyn Overloader>>,
}

impl fmt::Debug for OverloaderPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OverloaderPipeline")
            .field("stages", &self.stages.len())
            .finish()
    }
}

impl Default for OverloaderPipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl OverloaderPipeline {
    /// The baseline set of overloaders, in application order.
    pub fn new() -> Self {
        Self {
            stages: vec![
                Box::new(VoidPointerParameterOverloader),
                Box::new(VoidPointerReturnOverloader),
                Box::new(ReturnTypeConvenienceOverloader),
                Box::new(ArrayParameterConvenienceOverloader),
            ],
        }
    }

    /// Whether any stage would rewrite the given signature. Pure; callers use
    /// this to decide whether rewriting will occur before committing.
    pub fn has_applicable_stage(&self, signature: &Command) -> bool {
        self.stages.iter().any(|stage| stage.is_applicable(signature))
    }

    /// Pass signatures through the pipeline, concatenating every applicable
    /// stage's output in stage order.
    pub fn consume<'a, I>(&self, signatures: I) -> Vec<Overload>
    where
        I: IntoIterator<Item = &'a Command>,
    {
        let mut overloads = Vec::new();
        for signature in signatures {
            for stage in &self.stages {
                if stage.is_applicable(signature) {
                    overloads.extend(stage.create_overloads(signature));
                }
            }
        }
        overloads
    }
}

fn is_void_pointer(ty: &NativeType) -> bool {
    matches!(
        ty,
        NativeType::Pointer { base, .. }
            if matches!(base.as_ref(), NativeType::Primitive(PrimitiveKind::Void))
    )
}

/// Render the forwarding call, substituting rewritten argument spellings.
fn call_template<F>(signature: &Command, rewrite: F) -> String
where
    F: Fn(&Parameter) -> Option<String>,
{
    let args: Vec<String> = signature
        .parameters
        .iter()
        .map(|parameter| rewrite(parameter).unwrap_or_else(|| parameter.name.clone()))
        .collect();
    format!("{}({})", signature.entry_point, args.join(", "))
}

/// Rewrites untyped `void *` parameters into a pointer-sized-integer
/// convenience overload, so callers can hand over opaque buffers without a
/// cast at every call site.
#[derive(Debug, Clone, Copy)]
pub struct VoidPointerParameterOverloader;

impl Overloader for VoidPointerParameterOverloader {
    fn is_applicable(&self, signature: &Command) -> bool {
        signature
            .parameters
            .iter()
            .any(|parameter| is_void_pointer(&parameter.ty.ty))
    }

    fn create_overloads(&self, signature: &Command) -> Vec<Overload> {
        let mut derived = signature.clone();
        for parameter in &mut derived.parameters {
            if is_void_pointer(&parameter.ty.ty) {
                parameter.ty.ty = NativeType::Primitive(PrimitiveKind::IntPtr);
            }
        }
        let body = call_template(signature, |parameter| {
            is_void_pointer(&parameter.ty.ty).then(|| format!("{} as _", parameter.name))
        });
        vec![Overload {
            signature: derived,
            body,
        }]
    }
}

/// Rewrites an untyped `void *` return value into a pointer-sized-integer
/// return.
#[derive(Debug, Clone, Copy)]
pub struct VoidPointerReturnOverloader;

impl Overloader for VoidPointerReturnOverloader {
    fn is_applicable(&self, signature: &Command) -> bool {
        is_void_pointer(&signature.return_ty.ty)
    }

    fn create_overloads(&self, signature: &Command) -> Vec<Overload> {
        let mut derived = signature.clone();
        derived.return_ty.ty = NativeType::Primitive(PrimitiveKind::IntPtr);
        let body = format!("{} as _", call_template(signature, |_| None));
        vec![Overload {
            signature: derived,
            body,
        }]
    }
}

/// Rewrites a boolean-like return value (byte primitive tagged with the
/// `Boolean` group) into a real boolean without changing call semantics.
#[derive(Debug, Clone, Copy)]
pub struct ReturnTypeConvenienceOverloader;

impl Overloader for ReturnTypeConvenienceOverloader {
    fn is_applicable(&self, signature: &Command) -> bool {
        signature.return_ty.ty == NativeType::Primitive(PrimitiveKind::Byte)
            && signature.return_ty.group.as_deref() == Some("Boolean")
    }

    fn create_overloads(&self, signature: &Command) -> Vec<Overload> {
        let mut derived = signature.clone();
        derived.return_ty.ty = NativeType::Primitive(PrimitiveKind::Bool);
        let body = format!("{} != 0", call_template(signature, |_| None));
        vec![Overload {
            signature: derived,
            body,
        }]
    }
}

/// Rewrites pointer parameters carrying a constant length expression into
/// fixed-array parameters, so callers pass a managed sequence instead of a
/// raw pointer plus implicit count.
#[derive(Debug, Clone, Copy)]
pub struct ArrayParameterConvenienceOverloader;

fn constant_length(parameter: &Parameter) -> Option<i32> {
    if !matches!(parameter.ty.ty, NativeType::Pointer { .. }) {
        return None;
    }
    match parameter.ty.length {
        Some(Expression::Constant(length)) => i32::try_from(length).ok(),
        _ => None,
    }
}

impl Overloader for ArrayParameterConvenienceOverloader {
    fn is_applicable(&self, signature: &Command) -> bool {
        signature.parameters.iter().any(|p| constant_length(p).is_some())
    }

    fn create_overloads(&self, signature: &Command) -> Vec<Overload> {
        let mut derived = signature.clone();
        for parameter in &mut derived.parameters {
            let Some(length) = constant_length(parameter) else {
                continue;
            };
            let NativeType::Pointer { base, is_const } = parameter.ty.ty.clone() else {
                continue;
            };
            parameter.ty.ty = NativeType::Array {
                base,
                is_const,
                length,
            };
            // The element count is now part of the type.
            parameter.ty.length = None;
        }
        let body = call_template(signature, |parameter| {
            constant_length(parameter).map(|_| format!("{}.as_ptr()", parameter.name))
        });
        vec![Overload {
            signature: derived,
            body,
        }]
    }
}
