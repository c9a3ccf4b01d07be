//! Tree-walking evaluation of parsed expressions
//!
//! The evaluator executes an AST against an [`ExprHost`]. Reference forms
//! (identifiers, members, subscripts) resolve to containers holding a
//! descriptor node and a byte offset; everything else computes plain C
//! values through the numeric engine. Results of pure operator nodes are
//! memoized per parse, and every cache is dropped on a write or an
//! integer model switch, since either can change what the host answers.

pub mod context;
pub mod errors;
pub mod exprs;
pub mod host;
pub mod intrinsics;
pub mod printf;
pub mod resolve;

pub use context::RefContainer;
pub use errors::EvalError;
pub use host::{ExprHost, HostNodeId, IntrinsicArg, IntrinsicOutcome, NullHost};

use std::rc::Rc;

use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use crate::diag::Diagnostic;
use crate::numeric::{CType, CValue, IntegerModel};
use crate::parser::{NodeId, ParseResult};

/// Outcome of one evaluation pass.
#[derive(Debug, Clone)]
pub struct Evaluation {
    /// Final value, when the expression produced one.
    pub value: Option<CValue>,
    /// Rendered text, when the expression was a printf format.
    pub text: Option<String>,
    /// Errors raised while evaluating. Parse diagnostics stay on the
    /// parse result and are not repeated here.
    pub diagnostics: Vec<Diagnostic>,
}

impl Evaluation {
    /// True when the pass produced a value or rendered text.
    pub fn ok(&self) -> bool {
        self.value.is_some() || self.text.is_some()
    }
}

/// Evaluates parsed expressions against a host.
///
/// The evaluator is cheap to keep around and is meant to be reused: it
/// carries resolution caches keyed by host node, plus a memo table for
/// operator nodes whose sub-trees required no host interaction.
pub struct Evaluator {
    pub(crate) host: Rc<dyn ExprHost>,
    pub(crate) model: IntegerModel,
    scope_root: Option<HostNodeId>,
    /// Container of the reference currently being resolved.
    pub(crate) ctx: RefContainer,
    saved: Vec<RefContainer>,
    /// Host interactions since construction. A sub-tree is only memoized
    /// when this does not move while evaluating it.
    pub(crate) reads: u64,
    pub(crate) ident_cache: FxHashMap<(Option<HostNodeId>, String, bool), HostNodeId>,
    pub(crate) width_cache: FxHashMap<HostNodeId, u32>,
    pub(crate) type_cache: FxHashMap<HostNodeId, CType>,
    pub(crate) memo: FxHashMap<NodeId, CValue>,
    last_stamp: u64,
}

impl Evaluator {
    pub fn new(host: Rc<dyn ExprHost>, model: IntegerModel) -> Self {
        Self {
            host,
            model,
            scope_root: None,
            ctx: RefContainer::new(None),
            saved: Vec::new(),
            reads: 0,
            ident_cache: FxHashMap::default(),
            width_cache: FxHashMap::default(),
            type_cache: FxHashMap::default(),
            memo: FxHashMap::default(),
            last_stamp: 0,
        }
    }

    pub fn model(&self) -> IntegerModel {
        self.model
    }

    /// Switches the integer model. Every cache goes with it: type widths
    /// and therefore resolved layouts may differ between models.
    pub fn set_model(&mut self, model: IntegerModel) {
        if self.model != model {
            debug!(
                int_bits = model.int_bits,
                long_bits = model.long_bits,
                "integer model switched"
            );
            self.model = model;
            self.clear_caches();
        }
    }

    /// Sets the descriptor scope bare identifiers resolve under. Cached
    /// identifier resolutions are keyed by scope, so no flush is needed.
    pub fn set_scope_root(&mut self, root: Option<HostNodeId>) {
        self.scope_root = root;
    }

    /// Number of host interactions so far.
    pub fn host_calls(&self) -> u64 {
        self.reads
    }

    #[inline]
    pub(crate) fn touch_host(&mut self) {
        self.reads += 1;
    }

    /// Drops identifier, width, and type resolutions along with the memo
    /// table.
    pub(crate) fn clear_caches(&mut self) {
        trace!("resolution caches dropped");
        self.ident_cache.clear();
        self.width_cache.clear();
        self.type_cache.clear();
        self.memo.clear();
    }

    /// Parks the active container and starts a fresh one in the same
    /// scope. Used around sub-expressions that must not disturb the
    /// reference chain being resolved.
    pub(crate) fn push_ctx(&mut self) {
        let fresh = RefContainer::new(self.ctx.root);
        self.saved.push(std::mem::replace(&mut self.ctx, fresh));
    }

    pub(crate) fn pop_ctx(&mut self) {
        if let Some(prev) = self.saved.pop() {
            self.ctx = prev;
        }
    }

    /// Evaluates a parsed expression.
    ///
    /// Constant-folded expressions return their value without touching
    /// the host. Printf expressions render to text; everything else
    /// produces a value or an error diagnostic.
    pub async fn evaluate(&mut self, parsed: &ParseResult) -> Evaluation {
        if parsed.stamp() != self.last_stamp {
            // Memo entries are keyed by node id, which is only
            // meaningful within a single parse.
            self.memo.clear();
            self.last_stamp = parsed.stamp();
        }
        self.ctx = RefContainer::new(self.scope_root);
        self.saved.clear();
        let mut diagnostics = Vec::new();
        if let Some(cv) = parsed.const_value {
            return Evaluation {
                value: Some(cv),
                text: None,
                diagnostics,
            };
        }
        if parsed.is_printf {
            let text = self.eval_printf(&parsed.root, &mut diagnostics).await;
            return Evaluation {
                value: None,
                text: Some(text),
                diagnostics,
            };
        }
        match self.eval_node(&parsed.root).await {
            Ok(v) => Evaluation {
                value: Some(v),
                text: None,
                diagnostics,
            },
            Err(e) => {
                diagnostics.push(e.to_diagnostic());
                Evaluation {
                    value: None,
                    text: None,
                    diagnostics,
                }
            }
        }
    }
}
