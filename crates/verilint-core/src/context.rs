//! Ancestor stack maintained while walking the syntax tree.

use crate::syntax::{NodeTag, SyntaxNode};

/// Stack of the nodes currently being traversed, innermost last. All
/// references are valid only for the duration of the walk that pushed them.
#[derive(Debug, Default)]
pub struct SyntaxTreeContext<'t> {
    stack: Vec<&'t SyntaxNode>,
}

impl<'t> SyntaxTreeContext<'t> {
    pub fn new() -> Self {
        Self { stack: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    /// Closest ancestor, if any.
    pub fn top(&self) -> Option<&'t SyntaxNode> {
        self.stack.last().copied()
    }

    /// Runs `f` with `node` pushed as the innermost ancestor. The pop is
    /// guaranteed on every exit path.
    pub fn with_node<R>(&mut self, node: &'t SyntaxNode, f: impl FnOnce(&mut Self) -> R) -> R {
        self.stack.push(node);
        let result = f(self);
        self.stack.pop();
        result
    }

    /// True if any ancestor carries the given tag. Searches from the
    /// outermost ancestor and stops on the first match.
    pub fn is_inside(&self, tag: NodeTag) -> bool {
        self.stack.iter().any(|node| node.tag() == tag)
    }

    /// True if the stack is non-empty and the direct parent carries `tag`.
    pub fn direct_parent_is(&self, tag: NodeTag) -> bool {
        self.top().map(|node| node.tag() == tag).unwrap_or(false)
    }

    pub fn direct_parent_is_one_of(&self, tags: &[NodeTag]) -> bool {
        self.top()
            .map(|node| tags.contains(&node.tag()))
            .unwrap_or(false)
    }

    /// True if the immediate parents, top-down, are exactly the given
    /// sequence prefix: direct parent first, then grandparent, and so on.
    /// The empty sequence trivially matches.
    pub fn direct_parents_are(&self, tags: &[NodeTag]) -> bool {
        if tags.len() > self.stack.len() {
            return false;
        }
        tags.iter()
            .zip(self.stack.iter().rev())
            .all(|(tag, node)| node.tag() == *tag)
    }

    /// Searches from the innermost ancestor outward; true if one of
    /// `includes` is found before any of `excludes`.
    pub fn is_inside_first(&self, includes: &[NodeTag], excludes: &[NodeTag]) -> bool {
        for node in self.stack.iter().rev() {
            if includes.contains(&node.tag()) {
                return true;
            }
            if excludes.contains(&node.tag()) {
                return false;
            }
        }
        false
    }

    /// Ancestor tags, outermost first. Violations snapshot this so they can
    /// outlive the walk.
    pub fn tag_snapshot(&self) -> Vec<NodeTag> {
        self.stack.iter().map(|node| node.tag()).collect()
    }
}
