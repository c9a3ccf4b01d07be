//! Expression dispatch
//!
//! One `eval_node` entry point walks the tree and produces C values.
//! Folded literals short-circuit through their attached value; operator
//! nodes check the memo table first and record their result when the
//! sub-tree finished without touching the host.

use futures::future::LocalBoxFuture;

use crate::eval::errors::EvalError;
use crate::eval::resolve::is_resolvable_ref;
use crate::eval::Evaluator;
use crate::numeric::{
    apply_binary, apply_unary, convert_to_type, BinOp, CType, CValue, UnOp,
};
use crate::parser::{AstNode, NodeKind};

impl Evaluator {
    /// Evaluates one node to a C value.
    pub(crate) fn eval_node<'a>(
        &'a mut self,
        node: &'a AstNode,
    ) -> LocalBoxFuture<'a, Result<CValue, EvalError>> {
        Box::pin(async move {
            if let Some(cv) = node.cv {
                return Ok(cv);
            }
            let memoizable = matches!(
                node.kind,
                NodeKind::Unary { .. }
                    | NodeKind::Binary { .. }
                    | NodeKind::Conditional { .. }
            );
            if memoizable {
                if let Some(v) = self.memo.get(&node.id) {
                    return Ok(*v);
                }
            }
            let before = self.reads;
            let result = self.eval_kind(node).await;
            if memoizable && self.reads == before {
                if let Ok(v) = &result {
                    self.memo.insert(node.id, *v);
                }
            }
            result
        })
    }

    async fn eval_kind(&mut self, node: &AstNode) -> Result<CValue, EvalError> {
        match &node.kind {
            // `_count` and `_addr` are pseudo members answered from the
            // descriptor itself, not from member resolution.
            NodeKind::Member { base, name, .. } if name == "_count" => {
                self.resolve_ref(base, false).await?;
                let target = self.ctx.current.ok_or(EvalError::Unresolved {
                    span: node.span,
                })?;
                self.touch_host();
                match self.host.element_count(target).await {
                    Some(n) => Ok(CValue::int(
                        CType::unsigned_int(&self.model),
                        n as i128,
                    )),
                    None => Err(EvalError::NoValue {
                        what: "the element count",
                        span: node.span,
                    }),
                }
            }
            NodeKind::Member { base, name, .. } if name == "_addr" => {
                self.resolve_ref(base, false).await?;
                self.resolved_address(node.span).await
            }

            NodeKind::Ident(_) | NodeKind::Member { .. } | NodeKind::Index { .. } => {
                self.resolve_ref(node, false).await?;
                self.read_resolved(node.span).await
            }

            NodeKind::ColonPath { segments } => {
                self.touch_host();
                match self.host.resolve_colon_path(self.ctx.root, segments).await {
                    Some(v) => Ok(v),
                    None => Err(EvalError::UnknownSymbol {
                        name: segments.join(":"),
                        span: node.span,
                    }),
                }
            }

            NodeKind::Unary {
                op: UnOp::Deref, ..
            } => {
                self.resolve_ref(node, false).await?;
                self.read_resolved(node.span).await
            }
            NodeKind::Unary {
                op: UnOp::AddrOf,
                operand,
            } => {
                self.resolve_ref(operand, false).await?;
                self.resolved_address(node.span).await
            }
            NodeKind::Unary { op, operand } => {
                let v = self.eval_node(operand).await?;
                apply_unary(*op, &v, &self.model).map_err(|err| EvalError::Numeric {
                    err,
                    span: node.span,
                })
            }

            NodeKind::Binary {
                op: BinOp::And,
                left,
                right,
            } => {
                let int = CType::int(&self.model);
                if !self.eval_node(left).await?.is_truthy() {
                    return Ok(CValue::int(int, 0));
                }
                let r = self.eval_node(right).await?;
                Ok(CValue::int(int, r.is_truthy() as i128))
            }
            NodeKind::Binary {
                op: BinOp::Or,
                left,
                right,
            } => {
                let int = CType::int(&self.model);
                if self.eval_node(left).await?.is_truthy() {
                    return Ok(CValue::int(int, 1));
                }
                let r = self.eval_node(right).await?;
                Ok(CValue::int(int, r.is_truthy() as i128))
            }
            NodeKind::Binary { op, left, right } => {
                let l = self.eval_node(left).await?;
                let r = self.eval_node(right).await?;
                apply_binary(*op, &l, &r, &self.model).map_err(|err| {
                    EvalError::Numeric {
                        err,
                        span: node.span,
                    }
                })
            }

            NodeKind::Conditional {
                cond,
                then_branch,
                else_branch,
            } => {
                if self.eval_node(cond).await?.is_truthy() {
                    self.eval_node(then_branch).await
                } else {
                    self.eval_node(else_branch).await
                }
            }

            NodeKind::Assign { op, target, value } => {
                if !target.is_assignable() {
                    return Err(EvalError::NotWritable { span: target.span });
                }
                self.resolve_ref(target, true).await?;
                let target_ty = self.resolved_type(target.span).await?;
                let saved = self.ctx.clone();
                let old = match op {
                    Some(_) => {
                        Some(self.read_via(&saved, target.span, &target_ty).await?)
                    }
                    None => None,
                };
                let rhs = self.eval_node(value).await?;
                let combined = match (op, old) {
                    (Some(op), Some(old)) => apply_binary(*op, &old, &rhs, &self.model)
                        .map_err(|err| EvalError::Numeric {
                            err,
                            span: node.span,
                        })?,
                    _ => rhs,
                };
                // The value stored, converted to the target's type, is
                // also the value of the assignment expression.
                let converted = convert_to_type(&combined, &target_ty);
                self.write_via(&saved, target.span, &converted).await?;
                Ok(converted)
            }

            NodeKind::Update { op, prefix, target } => {
                if !target.is_assignable() {
                    return Err(EvalError::NotWritable { span: target.span });
                }
                self.resolve_ref(target, true).await?;
                let target_ty = self.resolved_type(target.span).await?;
                let saved = self.ctx.clone();
                let old = self.read_via(&saved, target.span, &target_ty).await?;
                let one = CValue::int(CType::int(&self.model), 1);
                let stepped = apply_binary(op.step(), &old, &one, &self.model)
                    .map_err(|err| EvalError::Numeric {
                        err,
                        span: node.span,
                    })?;
                let converted = convert_to_type(&stepped, &target_ty);
                self.write_via(&saved, target.span, &converted).await?;
                Ok(if *prefix { converted } else { old })
            }

            NodeKind::Cast { ty, operand } => {
                let v = self.eval_node(operand).await?;
                Ok(convert_to_type(&v, ty))
            }

            NodeKind::SizeofType { ty } | NodeKind::AlignofType { ty } => Ok(
                CValue::int(CType::size_t(&self.model), ty.byte_width() as i128),
            ),
            NodeKind::SizeofExpr { operand } | NodeKind::AlignofExpr { operand } => {
                let bytes = self.operand_size(operand).await?;
                Ok(CValue::int(CType::size_t(&self.model), bytes as i128))
            }

            NodeKind::Intrinsic { intr, args } => {
                self.eval_intrinsic(node, *intr, args).await
            }
            NodeKind::Call { callee, .. } => Err(EvalError::UnknownFunction {
                name: callee.clone(),
                span: node.span,
            }),

            NodeKind::Comma { left, right } => {
                self.eval_node(left).await?;
                self.eval_node(right).await
            }

            NodeKind::Str(_) => Err(EvalError::NotAValue {
                what: "string literal",
                span: node.span,
            }),
            NodeKind::TypeName { .. } => Err(EvalError::NotAValue {
                what: "type name",
                span: node.span,
            }),

            NodeKind::Number | NodeKind::Error | NodeKind::Printf { .. } => {
                Err(EvalError::InvalidNode { span: node.span })
            }
        }
    }

    /// Size in bytes of a `sizeof` operand. References report the width
    /// of their resolved target without reading it; plain values report
    /// the width of their computed type.
    async fn operand_size(&mut self, operand: &AstNode) -> Result<u32, EvalError> {
        if is_resolvable_ref(operand) {
            self.push_ctx();
            let resolved = self.resolve_ref(operand, false).await;
            let width = match resolved {
                Ok(()) => self.resolved_width(operand.span).await,
                Err(e) => Err(e),
            };
            self.pop_ctx();
            return width;
        }
        let v = self.eval_node(operand).await?;
        Ok(v.ty().byte_width())
    }
}
