//! Intrinsic call dispatch
//!
//! Arguments are shaped before the host sees them: name-taking intrinsics
//! receive their arguments as strings (bare identifiers, string literals,
//! joined colon paths, or type spellings), the rest receive evaluated
//! values. `__size_of` over a C type the crate already knows is answered
//! locally without a host round trip.

use crate::eval::errors::EvalError;
use crate::eval::host::{IntrinsicArg, IntrinsicOutcome};
use crate::eval::Evaluator;
use crate::numeric::{CType, CValue};
use crate::parser::{type_from_name, AstNode, Intrinsic, NodeKind};

impl Evaluator {
    pub(crate) async fn eval_intrinsic(
        &mut self,
        node: &AstNode,
        intr: Intrinsic,
        args: &[AstNode],
    ) -> Result<CValue, EvalError> {
        if intr == Intrinsic::SizeOf {
            if let Some(v) = self.builtin_size_of(args) {
                return Ok(v);
            }
        }
        let mut shaped = Vec::with_capacity(args.len());
        for (position, arg) in args.iter().enumerate() {
            shaped.push(self.shape_arg(intr, position, arg).await?);
        }
        self.touch_host();
        match self.host.call_intrinsic(intr, &shaped).await {
            IntrinsicOutcome::Value(v) => Ok(v),
            IntrinsicOutcome::NoValue => Err(EvalError::IntrinsicNoValue {
                name: intr.name(),
                span: node.span,
            }),
            IntrinsicOutcome::Unsupported => Err(EvalError::IntrinsicUnsupported {
                name: intr.name(),
                span: node.span,
            }),
        }
    }

    async fn shape_arg(
        &mut self,
        intr: Intrinsic,
        position: usize,
        arg: &AstNode,
    ) -> Result<IntrinsicArg, EvalError> {
        if !intr.takes_names() {
            let v = self.eval_node(arg).await?;
            return Ok(IntrinsicArg::Value(v));
        }
        let name = match &arg.kind {
            NodeKind::Ident(n) => Some(n.clone()),
            NodeKind::Str(s) => Some(s.clone()),
            NodeKind::ColonPath { segments } => Some(segments.join(":")),
            NodeKind::TypeName { ty } => Some(ty.to_string()),
            _ => None,
        };
        match name {
            Some(n) => Ok(IntrinsicArg::Name(n)),
            None => Err(EvalError::BadIntrinsicArg {
                name: intr.name(),
                position: position + 1,
                span: arg.span,
            }),
        }
    }

    /// Answers `__size_of` locally when its argument spells a C type in
    /// the current model. Unknown names fall through to the host, which
    /// may know them as descriptor or debug-info types.
    fn builtin_size_of(&self, args: &[AstNode]) -> Option<CValue> {
        let arg = args.first()?;
        let ty = match &arg.kind {
            NodeKind::TypeName { ty } => Some(*ty),
            NodeKind::Ident(n) => type_from_name(n, &self.model),
            NodeKind::Str(s) => type_from_name(s, &self.model),
            _ => None,
        }?;
        Some(CValue::int(
            CType::size_t(&self.model),
            ty.byte_width() as i128,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::NullHost;
    use crate::numeric::IntegerModel;
    use crate::parser::Parser;
    use futures::executor::block_on;
    use std::rc::Rc;

    fn eval(src: &str, model: IntegerModel) -> Result<CValue, EvalError> {
        let parsed = Parser::new(src, model).parse_root();
        let mut ev = Evaluator::new(Rc::new(NullHost), model);
        block_on(ev.eval_node(&parsed.root))
    }

    #[test]
    fn test_size_of_known_type_is_local() {
        let v = eval("__size_of(unsigned long)", IntegerModel::ILP32).unwrap();
        assert_eq!(v.as_int(), Some(4));
        let v = eval("__size_of(unsigned long)", IntegerModel::LP64).unwrap();
        assert_eq!(v.as_int(), Some(8));
        // Quoted spellings work the same way
        let v = eval("__size_of(\"long long\")", IntegerModel::ILP32).unwrap();
        assert_eq!(v.as_int(), Some(8));
    }

    #[test]
    fn test_unknown_type_goes_to_host() {
        // NullHost does not implement __size_of, so a non-type name
        // surfaces as an unsupported intrinsic.
        let err = eval("__size_of(MyStruct)", IntegerModel::ILP32).unwrap_err();
        assert_eq!(err.to_string(), "__size_of is not supported by this target");
    }

    #[test]
    fn test_running_unsupported_on_null_host() {
        let err = eval("__Running()", IntegerModel::ILP32).unwrap_err();
        assert!(matches!(err, EvalError::IntrinsicUnsupported { .. }));
    }

    #[test]
    fn test_numeric_arg_failure_propagates() {
        let err = eval(
            "__CalcMemUsed(1, 2, 3, 1 / 0)",
            IntegerModel::ILP32,
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "Division by zero");
    }
}
