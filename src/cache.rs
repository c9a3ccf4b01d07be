//! Parse result cache
//!
//! Parsing is deterministic for a given source text, integer model, and
//! printf flag, so results are shared behind `Rc` and handed back on
//! repeat lookups. View descriptors re-evaluate the same expression
//! strings on every refresh; caching the parse keeps refresh cost at
//! evaluation only. The cache is unbounded; a descriptor set carries a
//! small fixed population of expressions.

use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::numeric::IntegerModel;
use crate::parser::ParseResult;

#[derive(Default)]
pub struct ParseCache {
    entries: FxHashMap<(Box<str>, IntegerModel, bool), Rc<ParseResult>>,
}

impl ParseCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached parse of `text`, parsing on first sight.
    pub fn get_or_parse(
        &mut self,
        text: &str,
        model: IntegerModel,
        printf: bool,
    ) -> Rc<ParseResult> {
        let key = (Box::from(text), model, printf);
        if let Some(hit) = self.entries.get(&key) {
            return Rc::clone(hit);
        }
        let parsed = Rc::new(crate::parse(text, model, printf));
        self.entries.insert(key, Rc::clone(&parsed));
        parsed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
