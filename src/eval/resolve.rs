//! Reference resolution
//!
//! Turns reference-form nodes (identifiers, member chains, subscripts,
//! dereferences) into an anchored [`RefContainer`] the access helpers can
//! read and write through. Resolution is strictly left to right: the base
//! of a chain resolves before its selector, and a subscript expression is
//! evaluated in its own container so it cannot disturb the chain it
//! indexes.

use futures::future::LocalBoxFuture;
use tracing::trace;

use crate::diag::Span;
use crate::eval::context::RefContainer;
use crate::eval::errors::EvalError;
use crate::eval::host::HostNodeId;
use crate::eval::Evaluator;
use crate::numeric::{convert_to_type, CType, CValue, UnOp};
use crate::parser::{AstNode, NodeKind};

/// True for the node forms `resolve_ref` accepts. Colon paths are
/// reference-like to the parser but resolve directly to values, so they
/// are excluded here.
pub(crate) fn is_resolvable_ref(node: &AstNode) -> bool {
    matches!(
        node.kind,
        NodeKind::Ident(_)
            | NodeKind::Member { .. }
            | NodeKind::Index { .. }
            | NodeKind::Unary {
                op: UnOp::Deref,
                ..
            }
    )
}

impl Evaluator {
    /// Resolves a reference-form node into `self.ctx`.
    ///
    /// On success the container is anchored and positioned at the target;
    /// the caller decides whether to read, write, or take the address.
    pub(crate) fn resolve_ref<'a>(
        &'a mut self,
        node: &'a AstNode,
        for_write: bool,
    ) -> LocalBoxFuture<'a, Result<(), EvalError>> {
        Box::pin(async move {
            match &node.kind {
                NodeKind::Ident(name) => {
                    self.resolve_ident(name, for_write, node.span).await
                }
                NodeKind::Member { base, name, .. } => {
                    self.resolve_ref(base, for_write).await?;
                    self.member_step(name, node.span, for_write).await
                }
                NodeKind::Index { base, index } => {
                    self.resolve_ref(base, for_write).await?;
                    // The subscript may itself touch target state; give it
                    // a fresh container and restore ours afterwards.
                    self.push_ctx();
                    let idx = self.eval_node(index).await;
                    self.pop_ctx();
                    let idx = idx?.as_int().ok_or(EvalError::BadIndex {
                        span: index.span,
                    })?;
                    self.element_step(idx, node.span).await
                }
                NodeKind::Unary {
                    op: UnOp::Deref,
                    operand,
                } => {
                    // Descriptors hide indirection, so `*p` targets the
                    // same container `p` does.
                    self.resolve_ref(operand, for_write).await
                }
                _ => Err(EvalError::NotAReference { span: node.span }),
            }
        })
    }

    async fn resolve_ident(
        &mut self,
        name: &str,
        for_write: bool,
        span: Span,
    ) -> Result<(), EvalError> {
        let key = (self.ctx.root, name.to_string(), for_write);
        if let Some(n) = self.ident_cache.get(&key) {
            let n = *n;
            trace!(symbol = name, node = n.0, "resolve_ident cache hit");
            self.ctx.rebase(n);
            return Ok(());
        }
        self.touch_host();
        match self.host.symbol_ref(self.ctx.root, name, for_write).await {
            Some(n) => {
                trace!(symbol = name, node = n.0, "resolve_ident via host");
                self.ident_cache.insert(key, n);
                self.ctx.rebase(n);
                Ok(())
            }
            None => Err(EvalError::UnknownSymbol {
                name: name.to_string(),
                span,
            }),
        }
    }

    async fn member_step(
        &mut self,
        name: &str,
        span: Span,
        for_write: bool,
    ) -> Result<(), EvalError> {
        let base = self.ctx.current.ok_or(EvalError::Unresolved { span })?;
        self.touch_host();
        let next = self.host.member_ref(base, name, for_write).await;
        self.touch_host();
        let delta = self.host.member_offset(base, name).await;
        if next.is_none() && delta.is_none() {
            return Err(EvalError::UnknownMember {
                name: name.to_string(),
                span,
            });
        }
        self.ctx.invalidate_shape();
        if let Some(n) = next {
            self.ctx.current = Some(n);
        }
        if let Some(d) = delta {
            self.ctx.offset += d;
        }
        self.ctx.member = Some(name.to_string());
        self.ctx.index = None;
        Ok(())
    }

    async fn element_step(&mut self, index: i128, span: Span) -> Result<(), EvalError> {
        let array = self.ctx.current.ok_or(EvalError::Unresolved { span })?;
        self.touch_host();
        let stride = self
            .host
            .element_stride(array)
            .await
            .ok_or(EvalError::NoStride { span })?;
        self.touch_host();
        let elem = self.host.element_ref(array).await;
        self.ctx.invalidate_shape();
        if let Some(n) = elem {
            self.ctx.current = Some(n);
        }
        self.ctx.offset += (index as i64).wrapping_mul(stride);
        self.ctx.index = Some(index);
        self.ctx.member = None;
        Ok(())
    }

    /// Byte width of `node`, consulting the container, the width cache,
    /// then the host.
    async fn width_query(&mut self, node: HostNodeId) -> Option<u32> {
        if let Some(w) = self.ctx.width {
            return Some(w);
        }
        if let Some(w) = self.width_cache.get(&node) {
            let w = *w;
            self.ctx.width = Some(w);
            return Some(w);
        }
        self.touch_host();
        let w = self.host.byte_width(node).await;
        if let Some(w) = w {
            self.width_cache.insert(node, w);
            self.ctx.width = Some(w);
        }
        w
    }

    /// Value type of the resolved target.
    ///
    /// Falls back from the host's declared type to an unsigned integer of
    /// the target's byte width, and finally to a plain 32-bit unsigned.
    pub(crate) async fn resolved_type(&mut self, span: Span) -> Result<CType, EvalError> {
        if let Some(ty) = self.ctx.value_type {
            return Ok(ty);
        }
        let node = self.ctx.current.ok_or(EvalError::Unresolved { span })?;
        if let Some(ty) = self.type_cache.get(&node) {
            let ty = *ty;
            self.ctx.value_type = Some(ty);
            return Ok(ty);
        }
        self.touch_host();
        if let Some(ty) = self.host.value_type(node).await {
            self.type_cache.insert(node, ty);
            self.ctx.value_type = Some(ty);
            return Ok(ty);
        }
        let bits = match self.width_query(node).await {
            Some(w) => w.saturating_mul(8),
            None => 32,
        };
        let ty = CType::unsigned_bits(bits);
        self.ctx.value_type = Some(ty);
        Ok(ty)
    }

    /// Byte width of the resolved target, for `sizeof` over a reference.
    pub(crate) async fn resolved_width(&mut self, span: Span) -> Result<u32, EvalError> {
        let node = self.ctx.current.ok_or(EvalError::Unresolved { span })?;
        if let Some(w) = self.width_query(node).await {
            return Ok(w);
        }
        let ty = self.resolved_type(span).await?;
        Ok(ty.byte_width())
    }

    /// Address of the resolved target: anchor base address plus the
    /// accumulated byte offset, as a pointer-typed value.
    pub(crate) async fn resolved_address(&mut self, span: Span) -> Result<CValue, EvalError> {
        let anchor = self.ctx.anchor.ok_or(EvalError::Unresolved { span })?;
        self.touch_host();
        match self.host.address_of(anchor).await {
            Some(base) => Ok(CValue::int(
                CType::pointer(&self.model),
                base as i128 + self.ctx.offset as i128,
            )),
            None => Err(EvalError::NoValue {
                what: "the target address",
                span,
            }),
        }
    }

    /// Reads the target described by `ctx` as `ty`.
    pub(crate) async fn read_via(
        &mut self,
        ctx: &RefContainer,
        span: Span,
        ty: &CType,
    ) -> Result<CValue, EvalError> {
        let anchor = ctx.anchor.ok_or(EvalError::Unresolved { span })?;
        self.touch_host();
        match self.host.read_value(anchor, ctx.offset, ty).await {
            Some(v) => Ok(convert_to_type(&v, ty)),
            None => Err(EvalError::NoValue {
                what: "the resolved target",
                span,
            }),
        }
    }

    /// Reads the currently resolved container.
    pub(crate) async fn read_resolved(&mut self, span: Span) -> Result<CValue, EvalError> {
        let ty = self.resolved_type(span).await?;
        let ctx = self.ctx.clone();
        self.read_via(&ctx, span, &ty).await
    }

    /// Writes `value` through `ctx`. A successful write drops every cache,
    /// since stored bytes may change what later resolution steps see.
    pub(crate) async fn write_via(
        &mut self,
        ctx: &RefContainer,
        span: Span,
        value: &CValue,
    ) -> Result<(), EvalError> {
        let anchor = ctx.anchor.ok_or(EvalError::Unresolved { span })?;
        self.touch_host();
        let stored = self.host.write_value(anchor, ctx.offset, value).await;
        if stored.is_none() {
            return Err(EvalError::WriteFailed { span });
        }
        self.clear_caches();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::host::NullHost;
    use crate::numeric::IntegerModel;
    use crate::parser::Parser;
    use futures::executor::block_on;
    use std::rc::Rc;

    fn parse(src: &str) -> AstNode {
        Parser::new(src, IntegerModel::ILP32).parse_root().root
    }

    #[test]
    fn test_unknown_symbol_reported() {
        let mut ev = Evaluator::new(Rc::new(NullHost), IntegerModel::ILP32);
        let root = parse("missing");
        let err = block_on(ev.resolve_ref(&root, false)).unwrap_err();
        assert!(matches!(err, EvalError::UnknownSymbol { ref name, .. } if name == "missing"));
    }

    #[test]
    fn test_non_reference_rejected() {
        let mut ev = Evaluator::new(Rc::new(NullHost), IntegerModel::ILP32);
        let root = parse("1 + 2");
        let err = block_on(ev.resolve_ref(&root, false)).unwrap_err();
        assert!(matches!(err, EvalError::NotAReference { .. }));
    }
}
