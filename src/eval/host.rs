//! Host interface for resolving names and touching target state
//!
//! The evaluator never owns symbol tables or memory. Everything it knows
//! about the target comes through [`ExprHost`]: an application implements
//! the subset of methods its descriptor tree can answer and leaves the rest
//! on their defaults, which decline with `None`. Resolution then fails with
//! a normal evaluation error instead of a panic.
//!
//! Descriptor nodes are identified by [`HostNodeId`], an opaque handle the
//! host hands out and the evaluator passes back. The evaluator attaches no
//! meaning to the value inside.

use async_trait::async_trait;

use crate::eval::context::RefContainer;
use crate::numeric::{CType, CValue};
use crate::parser::Intrinsic;

/// Opaque handle to a descriptor node owned by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HostNodeId(pub u64);

/// One argument of an intrinsic call, already shaped by the evaluator.
#[derive(Debug, Clone)]
pub enum IntrinsicArg {
    /// An evaluated C value.
    Value(CValue),
    /// An unevaluated name: a bare symbol, a joined colon path, or the
    /// spelling of a type.
    Name(String),
}

/// Host verdict on an intrinsic call.
#[derive(Debug, Clone)]
pub enum IntrinsicOutcome {
    /// The host does not implement this intrinsic at all.
    Unsupported,
    /// The host implements the intrinsic but has no answer here.
    NoValue,
    /// The call produced a value.
    Value(CValue),
}

/// Everything the evaluator may ask of the embedding application.
///
/// All methods are optional; the defaults answer `None` (or
/// [`IntrinsicOutcome::Unsupported`]), which the evaluator turns into
/// ordinary evaluation errors. Implementations are async so a host may
/// fetch descriptor data or target memory over a debug probe.
#[async_trait(?Send)]
pub trait ExprHost {
    /// Resolves a bare identifier to a descriptor node, scoped under
    /// `root` when the evaluator has one. `for_write` is a hint that the
    /// caller intends to store through the result.
    async fn symbol_ref(
        &self,
        root: Option<HostNodeId>,
        name: &str,
        for_write: bool,
    ) -> Option<HostNodeId> {
        let _ = (root, name, for_write);
        None
    }

    /// Resolves a member name against `base`, returning the node the
    /// reference moves to. A host may answer `None` here and still supply
    /// an offset, in which case the reference narrows in place.
    async fn member_ref(
        &self,
        base: HostNodeId,
        name: &str,
        for_write: bool,
    ) -> Option<HostNodeId> {
        let _ = (base, name, for_write);
        None
    }

    /// Byte offset contributed by selecting `name` within `base`.
    async fn member_offset(&self, base: HostNodeId, name: &str) -> Option<i64> {
        let _ = (base, name);
        None
    }

    /// Element descriptor of an array-like node.
    async fn element_ref(&self, array: HostNodeId) -> Option<HostNodeId> {
        let _ = array;
        None
    }

    /// Byte distance between consecutive elements of `array`.
    async fn element_stride(&self, array: HostNodeId) -> Option<i64> {
        let _ = array;
        None
    }

    /// Number of elements in `array`, for the `_count` pseudo member.
    async fn element_count(&self, array: HostNodeId) -> Option<u64> {
        let _ = array;
        None
    }

    /// Base target address of `node`, for `&x` and the `_addr` pseudo
    /// member. Reference offsets are added by the evaluator.
    async fn address_of(&self, node: HostNodeId) -> Option<u64> {
        let _ = node;
        None
    }

    /// Width of `node` in bytes, when the host knows it without a type.
    async fn byte_width(&self, node: HostNodeId) -> Option<u32> {
        let _ = node;
        None
    }

    /// C type the host associates with `node`.
    async fn value_type(&self, node: HostNodeId) -> Option<CType> {
        let _ = node;
        None
    }

    /// Reads `ty.byte_width()` bytes at `offset` from `node` and returns
    /// them as a value of `ty`.
    async fn read_value(
        &self,
        node: HostNodeId,
        offset: i64,
        ty: &CType,
    ) -> Option<CValue> {
        let _ = (node, offset, ty);
        None
    }

    /// Stores `value` at `offset` within `node`. Returns the value the
    /// target ended up holding, or `None` when the write was refused.
    async fn write_value(
        &self,
        node: HostNodeId,
        offset: i64,
        value: &CValue,
    ) -> Option<CValue> {
        let _ = (node, offset, value);
        None
    }

    /// Resolves a `Peripheral:Register:Field` style path directly to a
    /// value. Colon paths are read-only and bypass node resolution.
    async fn resolve_colon_path(
        &self,
        root: Option<HostNodeId>,
        segments: &[String],
    ) -> Option<CValue> {
        let _ = (root, segments);
        None
    }

    /// Executes a double-underscore intrinsic.
    async fn call_intrinsic(
        &self,
        intr: Intrinsic,
        args: &[IntrinsicArg],
    ) -> IntrinsicOutcome {
        let _ = (intr, args);
        IntrinsicOutcome::Unsupported
    }

    /// Formats a printf segment value. `container` carries the resolved
    /// reference behind `value` when there is one, so a host can apply
    /// enumerated-value names or field-specific radixes. `None` falls back
    /// to the built-in formatter.
    async fn format_value(
        &self,
        spec: &str,
        value: &CValue,
        container: Option<&RefContainer>,
    ) -> Option<String> {
        let _ = (spec, value, container);
        None
    }
}

/// A host that resolves nothing. Constant expressions still evaluate;
/// anything touching target state reports an evaluation error.
#[derive(Debug, Default)]
pub struct NullHost;

#[async_trait(?Send)]
impl ExprHost for NullHost {}
