//! Concrete syntax tree: nodes tagged with a grammar enum, leaves wrapping
//! tokens, and the traversal utilities the lint rules are built from.
//!
//! The tree is strictly tree-shaped. There are no parent pointers; ancestor
//! access during a walk goes through [`crate::context::SyntaxTreeContext`].

use crate::token::{ByteSpan, Token};

/// Grammar tags for internal nodes. The structural parser only produces the
/// shapes the checkers consume; everything else degrades to plain leaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NodeTag {
    SourceText,
    ModuleDeclaration,
    ModuleHeader,
    ModuleItemList,
    PackageDeclaration,
    ClassDeclaration,
    FunctionDeclaration,
    TaskDeclaration,
    AlwaysStatement,
    EventControl,
    SeqBlock,
    ForLoop,
    ForSpec,
    ParamDeclaration,
    TypeInfo,
    GenerateRegion,
    Statement,
}

/// A child slot. `None` marks a deliberately absent (nil) child, which is
/// legal and skipped during walks.
pub type ChildSlot = Option<Symbol>;

/// The polymorphic tree variant: internal node or token leaf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Symbol {
    Node(SyntaxNode),
    Leaf(Token),
}

impl Symbol {
    pub fn leaf(token: Token) -> Symbol {
        Symbol::Leaf(token)
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Symbol::Leaf(_))
    }

    pub fn is_node(&self) -> bool {
        matches!(self, Symbol::Node(_))
    }

    pub fn as_node(&self) -> Option<&SyntaxNode> {
        match self {
            Symbol::Node(node) => Some(node),
            Symbol::Leaf(_) => None,
        }
    }

    pub fn as_leaf(&self) -> Option<&Token> {
        match self {
            Symbol::Node(_) => None,
            Symbol::Leaf(token) => Some(token),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxNode {
    tag: NodeTag,
    children: Vec<ChildSlot>,
}

impl SyntaxNode {
    pub fn new(tag: NodeTag) -> Self {
        Self {
            tag,
            children: Vec::new(),
        }
    }

    /// Moves `children` into a new node, preserving nil slots in order.
    pub fn with_children(tag: NodeTag, children: Vec<ChildSlot>) -> Self {
        Self { tag, children }
    }

    pub fn tag(&self) -> NodeTag {
        self.tag
    }

    pub fn children(&self) -> &[ChildSlot] {
        &self.children
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub fn push_child(&mut self, child: ChildSlot) {
        self.children.push(child);
    }

    pub fn push_leaf(&mut self, token: Token) {
        self.children.push(Some(Symbol::Leaf(token)));
    }

    pub fn push_node(&mut self, node: SyntaxNode) {
        self.children.push(Some(Symbol::Node(node)));
    }

    /// Fills a placeholder slot in place. Out-of-range indices are a
    /// programming error.
    pub fn set_child(&mut self, index: usize, value: ChildSlot) {
        assert!(
            index < self.children.len(),
            "set_child index {index} out of range for node with {} children",
            self.children.len()
        );
        self.children[index] = value;
    }

    /// Bounds-checked subscript; `None` means the slot is nil.
    pub fn child(&self, index: usize) -> Option<&Symbol> {
        assert!(
            index < self.children.len(),
            "child index {index} out of range for node with {} children",
            self.children.len()
        );
        self.children[index].as_ref()
    }

    /// Non-nil children in order.
    pub fn present_children(&self) -> impl DoubleEndedIterator<Item = &Symbol> {
        self.children.iter().flatten()
    }
}

/// Follows the unique-child chain: stops at the first node with more or
/// fewer than one child, or whose only child is nil, or at a leaf.
pub fn descend_through_singletons(symbol: &Symbol) -> &Symbol {
    let mut current = symbol;
    while let Symbol::Node(node) = current {
        match node.children() {
            [Some(only)] => current = only,
            _ => break,
        }
    }
    current
}

/// Strict indexed descent. Any step through a leaf, a nil slot, or an
/// out-of-range index is a programming error.
pub fn descend_path<'a>(symbol: &'a Symbol, indices: &[usize]) -> &'a Symbol {
    let mut current = symbol;
    for &index in indices {
        let node = current
            .as_node()
            .expect("descend_path stepped through a leaf");
        current = node
            .child(index)
            .expect("descend_path stepped through a nil child");
    }
    current
}

/// First leaf token in pre-order, skipping nil children. Empty subtrees
/// yield none.
pub fn leftmost_leaf(symbol: &Symbol) -> Option<&Token> {
    match symbol {
        Symbol::Leaf(token) => Some(token),
        Symbol::Node(node) => node.present_children().find_map(leftmost_leaf),
    }
}

/// Last leaf token, skipping nil children.
pub fn rightmost_leaf(symbol: &Symbol) -> Option<&Token> {
    match symbol {
        Symbol::Leaf(token) => Some(token),
        Symbol::Node(node) => node.present_children().rev().find_map(rightmost_leaf),
    }
}

/// The minimum contiguous byte range covering every leaf of `symbol`.
pub fn span_of_symbol(symbol: &Symbol) -> Option<ByteSpan> {
    let left = leftmost_leaf(symbol)?;
    let right = rightmost_leaf(symbol)?;
    Some(ByteSpan::new(left.left(), right.right()))
}

/// Minimum contiguous byte range covering the leaves of both symbols.
pub fn span_of_symbols(first: &Symbol, second: &Symbol) -> Option<ByteSpan> {
    let a = span_of_symbol(first)?;
    let b = span_of_symbol(second)?;
    Some(ByteSpan::new(a.start.min(b.start), a.end.max(b.end)))
}

/// Pre-order search for the first subtree satisfying the predicate.
pub fn find_first_subtree<'a>(
    symbol: &'a Symbol,
    predicate: &dyn Fn(&Symbol) -> bool,
) -> Option<&'a Symbol> {
    if predicate(symbol) {
        return Some(symbol);
    }
    match symbol {
        Symbol::Leaf(_) => None,
        Symbol::Node(node) => node
            .present_children()
            .find_map(|child| find_first_subtree(child, predicate)),
    }
}

/// Reverse pre-order search: still checks a subtree before its children,
/// but scans children right to left, yielding the rightmost match.
pub fn find_last_subtree<'a>(
    symbol: &'a Symbol,
    predicate: &dyn Fn(&Symbol) -> bool,
) -> Option<&'a Symbol> {
    if predicate(symbol) {
        return Some(symbol);
    }
    match symbol {
        Symbol::Leaf(_) => None,
        Symbol::Node(node) => node
            .present_children()
            .rev()
            .find_map(|child| find_last_subtree(child, predicate)),
    }
}

pub fn find_first_subtree_mut<'a>(
    symbol: &'a mut Symbol,
    predicate: &dyn Fn(&Symbol) -> bool,
) -> Option<&'a mut Symbol> {
    if predicate(symbol) {
        return Some(symbol);
    }
    match symbol {
        Symbol::Leaf(_) => None,
        Symbol::Node(node) => node
            .children
            .iter_mut()
            .flatten()
            .find_map(|child| find_first_subtree_mut(child, predicate)),
    }
}

pub fn find_last_subtree_mut<'a>(
    symbol: &'a mut Symbol,
    predicate: &dyn Fn(&Symbol) -> bool,
) -> Option<&'a mut Symbol> {
    if predicate(symbol) {
        return Some(symbol);
    }
    match symbol {
        Symbol::Leaf(_) => None,
        Symbol::Node(node) => node
            .children
            .iter_mut()
            .flatten()
            .rev()
            .find_map(|child| find_last_subtree_mut(child, predicate)),
    }
}

/// Returns the smallest subtree whose span begins at or after `offset`,
/// descending only while a candidate still starts before the target.
pub fn find_subtree_starting_at_offset(symbol: &Symbol, offset: usize) -> Option<&Symbol> {
    let span = span_of_symbol(symbol)?;
    if span.start >= offset {
        return Some(symbol);
    }
    if span.end <= offset {
        return None;
    }
    match symbol {
        Symbol::Leaf(_) => None,
        Symbol::Node(node) => node
            .present_children()
            .find_map(|child| find_subtree_starting_at_offset(child, offset)),
    }
}

/// Applies `f` to every leaf token in pre-order.
pub fn mutate_leaves(symbol: &mut Symbol, f: &mut dyn FnMut(&mut Token)) {
    match symbol {
        Symbol::Leaf(token) => f(token),
        Symbol::Node(node) => {
            for child in node.children.iter_mut().flatten() {
                mutate_leaves(child, f);
            }
        }
    }
}

/// Drops trailing children whose content begins strictly after `offset`
/// (nil and leafless trailing children included), then recursively prunes
/// the last remaining child.
pub fn prune_syntax_tree_after_offset(symbol: &mut Symbol, offset: usize) {
    if let Symbol::Node(node) = symbol {
        while let Some(last) = node.children.last() {
            let starts_after = match last {
                None => true,
                Some(child) => match leftmost_leaf(child) {
                    None => true,
                    Some(leaf) => leaf.left() > offset,
                },
            };
            if starts_after {
                node.children.pop();
            } else {
                break;
            }
        }
        if let Some(Some(last)) = node.children.last_mut() {
            prune_syntax_tree_after_offset(last, offset);
        }
    }
}

/// Narrows to the first subtree found while descending whose full span lies
/// within the half-open byte `range`; yields nil when nothing fits.
pub fn trim_syntax_tree(symbol: Symbol, range: ByteSpan) -> Option<Symbol> {
    let span = span_of_symbol(&symbol)?;
    if span.start >= range.start && span.end <= range.end {
        return Some(symbol);
    }
    match symbol {
        Symbol::Leaf(_) => None,
        Symbol::Node(node) => node
            .children
            .into_iter()
            .flatten()
            .find_map(|child| trim_syntax_tree(child, range)),
    }
}

/// Deterministic, nil-aware tree dump. With `show_offsets`, each leaf is
/// annotated with its byte range.
pub fn pretty_print_tree(symbol: &Symbol, source: &str, show_offsets: bool) -> String {
    let mut out = String::new();
    print_symbol(symbol, source, show_offsets, 0, &mut out);
    out
}

fn print_symbol(symbol: &Symbol, source: &str, show_offsets: bool, depth: usize, out: &mut String) {
    for _ in 0..depth {
        out.push_str("  ");
    }
    match symbol {
        Symbol::Leaf(token) => {
            if show_offsets {
                out.push_str(&format!(
                    "Leaf @{}-{} {:?} '{}'\n",
                    token.left(),
                    token.right(),
                    token.kind,
                    token.text(source)
                ));
            } else {
                out.push_str(&format!("Leaf {:?} '{}'\n", token.kind, token.text(source)));
            }
        }
        Symbol::Node(node) => {
            out.push_str(&format!("Node {:?} {{\n", node.tag()));
            for child in node.children() {
                match child {
                    None => {
                        for _ in 0..depth + 1 {
                            out.push_str("  ");
                        }
                        out.push_str("NULL\n");
                    }
                    Some(symbol) => print_symbol(symbol, source, show_offsets, depth + 1, out),
                }
            }
            for _ in 0..depth {
                out.push_str("  ");
            }
            out.push_str("}\n");
        }
    }
}
