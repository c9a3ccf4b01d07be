//! Reference container tracking the target of the reference under resolution
//!
//! Resolving `arr[2].field` walks descriptor nodes while accumulating a
//! byte offset: the identifier anchors the container, the subscript adds
//! `index * stride`, the member adds its offset. The accumulated state
//! lives in a [`RefContainer`] so that a read, write, or `&` at the end of
//! the chain sees one flat `(anchor, offset)` pair instead of re-walking
//! the tree.

use crate::eval::host::HostNodeId;
use crate::numeric::CType;

/// State of one reference chain while it resolves.
///
/// `anchor` is the node the final memory access goes through; `current`
/// is the descriptor the next `.member` or `[index]` step is interpreted
/// against. They start out equal and diverge when a step switches
/// descriptors without switching the accessed node.
#[derive(Debug, Clone)]
pub struct RefContainer {
    /// Scope the next bare identifier resolves under.
    pub root: Option<HostNodeId>,
    /// Node whose memory the reference ultimately touches.
    pub anchor: Option<HostNodeId>,
    /// Descriptor the next resolution step starts from.
    pub current: Option<HostNodeId>,
    /// Last member name selected, if the chain ended in one.
    pub member: Option<String>,
    /// Last subscript applied, if the chain ended in one.
    pub index: Option<i128>,
    /// Byte offset accumulated from the anchor.
    pub offset: i64,
    /// Cached byte width of the resolved target.
    pub width: Option<u32>,
    /// Cached value type of the resolved target.
    pub value_type: Option<CType>,
}

impl RefContainer {
    pub fn new(root: Option<HostNodeId>) -> Self {
        Self {
            root,
            anchor: None,
            current: None,
            member: None,
            index: None,
            offset: 0,
            width: None,
            value_type: None,
        }
    }

    /// Restarts the chain at `node`, as when an identifier resolves.
    pub(crate) fn rebase(&mut self, node: HostNodeId) {
        self.anchor = Some(node);
        self.current = Some(node);
        self.member = None;
        self.index = None;
        self.offset = 0;
        self.width = None;
        self.value_type = None;
    }

    /// Drops width and type knowledge after a step that narrowed the
    /// target, keeping the accumulated offset.
    pub(crate) fn invalidate_shape(&mut self) {
        self.width = None;
        self.value_type = None;
    }

    /// True once an identifier has anchored the chain.
    pub fn is_anchored(&self) -> bool {
        self.anchor.is_some()
    }
}
