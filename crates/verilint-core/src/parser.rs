//! Error-salvaging structural parser: token stream in, concrete syntax tree
//! out.
//!
//! This recognizes only the shapes the syntax-tree checkers consume
//! (modules and their headers, always constructs with event controls,
//! parameter declarations with possibly-empty type info, begin/end blocks,
//! for-loop specifications). Everything else degrades to plain leaves in
//! source order. The parser never fails: unexpected tokens become leaves,
//! unterminated constructs are closed at end of input, and each such
//! salvage records a syntax error so the driver can report it while linting
//! continues on the salvaged tree.

use crate::analyzer::SyntaxError;
use crate::syntax::{NodeTag, Symbol, SyntaxNode};
use crate::token::{ByteSpan, Token, TokenKind};

#[derive(Debug)]
pub struct ParseResult {
    pub tree: Symbol,
    pub errors: Vec<SyntaxError>,
}

/// Builds a CST from a full token sequence (trivia is dropped here; the
/// tree's leaves are exactly the non-trivia tokens, in order).
pub fn parse(tokens: &[Token], source: &str) -> ParseResult {
    let significant: Vec<Token> = tokens
        .iter()
        .filter(|t| !t.kind.is_trivia() && !t.is_eof())
        .copied()
        .collect();
    let mut parser = Parser {
        tokens: significant,
        source,
        pos: 0,
        errors: Vec::new(),
    };
    let tree = Symbol::Node(parser.parse_source_text());
    ParseResult {
        tree,
        errors: parser.errors,
    }
}

/// Keywords that terminate an open statement without being part of it.
const STATEMENT_STOPPERS: &[&str] = &[
    "end",
    "endmodule",
    "endpackage",
    "endclass",
    "endfunction",
    "endtask",
    "endgenerate",
    "endcase",
    "begin",
    "else",
];

struct Parser<'a> {
    tokens: Vec<Token>,
    source: &'a str,
    pos: usize,
    errors: Vec<SyntaxError>,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn at_keyword(&self, keyword: &str) -> bool {
        self.peek()
            .map(|t| t.kind == TokenKind::Keyword && t.text(self.source) == keyword)
            .unwrap_or(false)
    }

    fn at_any_keyword(&self, keywords: &[&str]) -> bool {
        self.peek()
            .map(|t| t.kind == TokenKind::Keyword && keywords.contains(&t.text(self.source)))
            .unwrap_or(false)
    }

    fn at_operator(&self, text: &str) -> bool {
        self.peek()
            .map(|t| t.kind == TokenKind::Operator && t.text(self.source) == text)
            .unwrap_or(false)
    }

    fn advance(&mut self) -> Token {
        let token = self.tokens[self.pos];
        self.pos += 1;
        token
    }

    fn record_error_here(&mut self) {
        let span = self
            .peek()
            .map(|t| t.span)
            .unwrap_or_else(|| ByteSpan::empty(self.source.len()));
        self.errors.push(SyntaxError { span });
    }

    fn parse_source_text(&mut self) -> SyntaxNode {
        let mut root = SyntaxNode::new(NodeTag::SourceText);
        while !self.at_end() {
            if self.at_any_keyword(&["module", "macromodule"]) {
                root.push_node(self.parse_module());
            } else if self.at_keyword("package") {
                let node = self.parse_wrapper(NodeTag::PackageDeclaration, "endpackage");
                root.push_node(node);
            } else if self.at_keyword("class") {
                let node = self.parse_wrapper(NodeTag::ClassDeclaration, "endclass");
                root.push_node(node);
            } else if self.at_keyword("function") {
                let node = self.parse_wrapper(NodeTag::FunctionDeclaration, "endfunction");
                root.push_node(node);
            } else if self.at_keyword("task") {
                let node = self.parse_wrapper(NodeTag::TaskDeclaration, "endtask");
                root.push_node(node);
            } else if self.at_any_keyword(&["endmodule", "endpackage", "endclass"]) {
                // Orphan end keyword: report, keep the leaf, move on.
                self.record_error_here();
                let token = self.advance();
                root.push_leaf(token);
            } else {
                let token = self.advance();
                root.push_leaf(token);
            }
        }
        root
    }

    fn parse_module(&mut self) -> SyntaxNode {
        let mut module = SyntaxNode::new(NodeTag::ModuleDeclaration);
        module.push_node(self.parse_module_header());

        let mut items = SyntaxNode::new(NodeTag::ModuleItemList);
        loop {
            if self.at_end() {
                self.record_error_here();
                break;
            }
            if self.at_keyword("endmodule") {
                break;
            }
            self.parse_module_item(&mut items);
        }
        module.push_node(items);
        if self.at_keyword("endmodule") {
            let token = self.advance();
            module.push_leaf(token);
        }
        module
    }

    /// `module name ... ;` — parameter declarations inside the `#(...)`
    /// port-parameter list are parsed as proper subtrees so the
    /// parameter-oriented checks see them.
    fn parse_module_header(&mut self) -> SyntaxNode {
        let mut header = SyntaxNode::new(NodeTag::ModuleHeader);
        let keyword = self.advance();
        header.push_leaf(keyword);
        match self.peek() {
            Some(token) if token.kind == TokenKind::Identifier => {
                self.advance();
                header.push_leaf(token);
            }
            _ => self.record_error_here(),
        }
        loop {
            if self.at_end() || self.at_keyword("endmodule") {
                self.record_error_here();
                break;
            }
            if self.at_any_keyword(&["parameter", "localparam"]) {
                let node = self.parse_param_declaration(&[",", ")"]);
                header.push_node(node);
                continue;
            }
            let token = self.advance();
            let done = token.kind == TokenKind::Semicolon;
            header.push_leaf(token);
            if done {
                break;
            }
        }
        header
    }

    fn parse_module_item(&mut self, parent: &mut SyntaxNode) {
        if self.at_any_keyword(&["module", "macromodule"]) {
            parent.push_node(self.parse_module());
        } else if self.at_any_keyword(&["always", "always_comb", "always_ff", "always_latch"]) {
            parent.push_node(self.parse_always());
        } else if self.at_any_keyword(&["parameter", "localparam"]) {
            let node = self.parse_param_declaration(&[";"]);
            parent.push_node(node);
        } else if self.at_keyword("begin") {
            parent.push_node(self.parse_seq_block());
        } else if self.at_keyword("for") {
            parent.push_node(self.parse_for_loop());
        } else if self.at_keyword("generate") {
            let node = self.parse_wrapper(NodeTag::GenerateRegion, "endgenerate");
            parent.push_node(node);
        } else if self.at_keyword("function") {
            let node = self.parse_wrapper(NodeTag::FunctionDeclaration, "endfunction");
            parent.push_node(node);
        } else if self.at_keyword("task") {
            let node = self.parse_wrapper(NodeTag::TaskDeclaration, "endtask");
            parent.push_node(node);
        } else if self
            .peek()
            .map(|t| t.kind == TokenKind::Semicolon)
            .unwrap_or(false)
        {
            let token = self.advance();
            parent.push_leaf(token);
        } else if self.at_any_keyword(STATEMENT_STOPPERS) {
            // An end keyword we have no open construct for; let it be a
            // leaf rather than looping forever.
            let token = self.advance();
            parent.push_leaf(token);
        } else {
            parent.push_node(self.parse_statement());
        }
    }

    /// Leaves up to and including `;`, stopping early at block keywords.
    fn parse_statement(&mut self) -> SyntaxNode {
        let mut statement = SyntaxNode::new(NodeTag::Statement);
        while !self.at_end() {
            if self.at_any_keyword(STATEMENT_STOPPERS) {
                break;
            }
            if self.at_keyword("for") {
                statement.push_node(self.parse_for_loop());
                continue;
            }
            let token = self.advance();
            let done = token.kind == TokenKind::Semicolon;
            statement.push_leaf(token);
            if done {
                break;
            }
        }
        statement
    }

    fn parse_seq_block(&mut self) -> SyntaxNode {
        let mut block = SyntaxNode::new(NodeTag::SeqBlock);
        let begin = self.advance();
        block.push_leaf(begin);
        loop {
            if self.at_end() {
                self.record_error_here();
                break;
            }
            if self.at_keyword("end") {
                let token = self.advance();
                block.push_leaf(token);
                break;
            }
            // A missing `end`: leave the enclosing construct's closer alone.
            if self.at_any_keyword(&[
                "endmodule",
                "endpackage",
                "endclass",
                "endfunction",
                "endtask",
                "endgenerate",
            ]) {
                self.record_error_here();
                break;
            }
            self.parse_module_item(&mut block);
        }
        block
    }

    fn parse_for_loop(&mut self) -> SyntaxNode {
        let mut for_loop = SyntaxNode::new(NodeTag::ForLoop);
        let keyword = self.advance();
        for_loop.push_leaf(keyword);
        if self.at_operator("(") {
            let mut spec = SyntaxNode::new(NodeTag::ForSpec);
            let mut depth = 0usize;
            while !self.at_end() {
                if self.at_operator("(") {
                    depth += 1;
                } else if self.at_operator(")") {
                    depth -= 1;
                }
                let closing = self.at_operator(")") && depth == 0;
                let token = self.advance();
                spec.push_leaf(token);
                if closing {
                    break;
                }
            }
            for_loop.push_node(spec);
        }
        // Loop body: a single item, unless an enclosing construct ends here.
        if self.can_start_body_item() {
            self.parse_module_item(&mut for_loop);
        }
        for_loop
    }

    /// A statement body may follow unless the next token closes an
    /// enclosing construct. `begin` is fine; it opens the body block.
    fn can_start_body_item(&self) -> bool {
        if self.at_end() {
            return false;
        }
        self.at_keyword("begin") || !self.at_any_keyword(STATEMENT_STOPPERS)
    }

    fn parse_always(&mut self) -> SyntaxNode {
        let mut always = SyntaxNode::new(NodeTag::AlwaysStatement);
        let keyword = self.advance();
        always.push_leaf(keyword);
        if self.at_operator("@") {
            let mut event = SyntaxNode::new(NodeTag::EventControl);
            let at = self.advance();
            event.push_leaf(at);
            if self.at_operator("*") {
                let star = self.advance();
                event.push_leaf(star);
            } else if self.at_operator("(") {
                let mut depth = 0usize;
                while !self.at_end() {
                    if self.at_operator("(") {
                        depth += 1;
                    } else if self.at_operator(")") {
                        depth -= 1;
                    }
                    let closing = self.at_operator(")") && depth == 0;
                    let token = self.advance();
                    event.push_leaf(token);
                    if closing {
                        break;
                    }
                }
            }
            always.push_node(event);
        }
        if self.can_start_body_item() {
            self.parse_module_item(&mut always);
        }
        always
    }

    /// `parameter`/`localparam` declaration. The type-info subtree between
    /// the keyword and the name is empty when the declaration relies on an
    /// implicit storage type. Stops at (and consumes) `;`, or stops before
    /// one of `terminators` when parsing inside a parameter port list.
    fn parse_param_declaration(&mut self, terminators: &[&str]) -> SyntaxNode {
        let mut declaration = SyntaxNode::new(NodeTag::ParamDeclaration);
        let keyword = self.advance();
        declaration.push_leaf(keyword);

        if self.at_keyword("type") {
            // `parameter type T = ...` declares a type parameter; there is
            // no storage type to check.
            let type_keyword = self.advance();
            declaration.push_leaf(type_keyword);
            if let Some(token) = self.peek() {
                if token.kind == TokenKind::Identifier {
                    self.advance();
                    declaration.push_leaf(token);
                }
            }
            self.consume_param_tail(&mut declaration, terminators);
            return declaration;
        }

        // Everything before the name is the storage type. The name is the
        // last identifier before `=` (or before the terminator when there
        // is no assignment).
        let name_index = self.find_param_name_index(terminators);
        let mut type_info = SyntaxNode::new(NodeTag::TypeInfo);
        match name_index {
            Some(name_index) => {
                while self.pos < name_index {
                    let token = self.advance();
                    type_info.push_leaf(token);
                }
                declaration.push_node(type_info);
                let name = self.advance();
                declaration.push_leaf(name);
            }
            None => {
                declaration.push_node(type_info);
                self.record_error_here();
            }
        }
        self.consume_param_tail(&mut declaration, terminators);
        declaration
    }

    /// Scans ahead for the declared name without consuming anything.
    fn find_param_name_index(&self, terminators: &[&str]) -> Option<usize> {
        let mut depth = 0usize;
        let mut last_identifier = None;
        for index in self.pos..self.tokens.len() {
            let token = self.tokens[index];
            let text = token.text(self.source);
            match token.kind {
                TokenKind::Operator if matches!(text, "(" | "[" | "{") => depth += 1,
                TokenKind::Operator if matches!(text, ")" | "]" | "}") => {
                    if depth == 0 && terminators.contains(&text) {
                        return last_identifier;
                    }
                    depth = depth.saturating_sub(1);
                }
                TokenKind::Operator if depth == 0 && text == "=" => return last_identifier,
                TokenKind::Operator if depth == 0 && terminators.contains(&text) => {
                    return last_identifier
                }
                TokenKind::Semicolon => return last_identifier,
                TokenKind::Identifier => last_identifier = Some(index),
                TokenKind::Keyword if STATEMENT_STOPPERS.contains(&text) => {
                    return last_identifier
                }
                _ => {}
            }
        }
        last_identifier
    }

    /// Assignment and trailing tokens of a parameter declaration.
    fn consume_param_tail(&mut self, declaration: &mut SyntaxNode, terminators: &[&str]) {
        let mut depth = 0usize;
        while !self.at_end() {
            let token = self.tokens[self.pos];
            let text = token.text(self.source);
            if token.kind == TokenKind::Semicolon {
                self.advance();
                declaration.push_leaf(token);
                return;
            }
            if token.kind == TokenKind::Operator {
                match text {
                    "(" | "[" | "{" => depth += 1,
                    ")" | "]" | "}" => {
                        if depth == 0 {
                            // Closing paren of the enclosing list.
                            return;
                        }
                        depth -= 1;
                    }
                    _ => {}
                }
                if depth == 0 && terminators.contains(&text) {
                    return;
                }
            }
            if token.kind == TokenKind::Keyword && STATEMENT_STOPPERS.contains(&text) {
                self.record_error_here();
                return;
            }
            self.advance();
            declaration.push_leaf(token);
        }
    }

    fn parse_wrapper(&mut self, tag: NodeTag, end_keyword: &str) -> SyntaxNode {
        let mut node = SyntaxNode::new(tag);
        let keyword = self.advance();
        node.push_leaf(keyword);
        loop {
            if self.at_end() {
                self.record_error_here();
                break;
            }
            if self.at_keyword(end_keyword) {
                let token = self.advance();
                node.push_leaf(token);
                break;
            }
            self.parse_module_item(&mut node);
        }
        node
    }
}

// ---------------------------------------------------------------------------
// CST accessors used by the checkers.
// ---------------------------------------------------------------------------

/// Name token of a module declaration: the first identifier in its header.
pub fn get_module_name_token(module: &SyntaxNode) -> Option<Token> {
    debug_assert_eq!(NodeTag::ModuleDeclaration, module.tag());
    let header = module.child(0)?.as_node()?;
    header
        .present_children()
        .filter_map(|child| child.as_leaf())
        .find(|leaf| leaf.kind == TokenKind::Identifier)
        .copied()
}

/// All module declarations in the tree, paired with whether each is nested
/// inside another module declaration.
pub fn find_module_declarations(tree: &Symbol) -> Vec<(&SyntaxNode, bool)> {
    let mut found = Vec::new();
    collect_modules(tree, false, &mut found);
    found
}

fn collect_modules<'a>(
    symbol: &'a Symbol,
    inside_module: bool,
    found: &mut Vec<(&'a SyntaxNode, bool)>,
) {
    if let Symbol::Node(node) = symbol {
        let is_module = node.tag() == NodeTag::ModuleDeclaration;
        if is_module {
            found.push((node, inside_module));
        }
        for child in node.present_children() {
            collect_modules(child, inside_module || is_module, found);
        }
    }
}

/// First leaf of an always statement: the `always`/`always_comb`/... keyword.
pub fn get_always_keyword(always: &SyntaxNode) -> Option<Token> {
    debug_assert_eq!(NodeTag::AlwaysStatement, always.tag());
    always
        .present_children()
        .next()
        .and_then(|child| child.as_leaf())
        .copied()
}

/// True when the event control of this always statement covers all signals:
/// `@*` or `@(*)`.
pub fn always_has_event_control_star(always: &SyntaxNode, source: &str) -> bool {
    always
        .present_children()
        .filter_map(|child| child.as_node())
        .filter(|node| node.tag() == NodeTag::EventControl)
        .any(|event| {
            let text: String = event
                .present_children()
                .filter_map(|child| child.as_leaf())
                .map(|leaf| leaf.text(source))
                .collect();
            text == "@*" || text == "@(*)"
        })
}

/// Keyword token (`parameter` or `localparam`) of a declaration.
pub fn get_param_keyword(declaration: &SyntaxNode) -> Option<Token> {
    debug_assert_eq!(NodeTag::ParamDeclaration, declaration.tag());
    declaration
        .present_children()
        .next()
        .and_then(|child| child.as_leaf())
        .copied()
}

/// `parameter type T = ...` declarations carry a `type` keyword leaf where
/// value declarations carry their type-info subtree.
pub fn is_param_type_declaration(declaration: &SyntaxNode) -> bool {
    declaration.len() > 1
        && declaration
            .child(1)
            .map(|child| child.is_leaf())
            .unwrap_or(false)
}

pub fn get_param_type_info(declaration: &SyntaxNode) -> Option<&SyntaxNode> {
    declaration
        .child(1)?
        .as_node()
        .filter(|node| node.tag() == NodeTag::TypeInfo)
}

/// Declared name: for value parameters the leaf right after the type info,
/// for type parameters the identifier after the `type` keyword.
pub fn get_param_name_token(declaration: &SyntaxNode) -> Option<Token> {
    declaration
        .present_children()
        .skip(1)
        .filter_map(|child| child.as_leaf())
        .find(|leaf| leaf.kind == TokenKind::Identifier)
        .copied()
}

/// True when the declaration assigns exactly one string literal.
pub fn param_has_string_assignment(declaration: &SyntaxNode, source: &str) -> bool {
    let children: Vec<&Symbol> = declaration.present_children().collect();
    let assign_index = children.iter().position(|child| {
        child
            .as_leaf()
            .map(|leaf| leaf.kind == TokenKind::Operator && leaf.text(source) == "=")
            .unwrap_or(false)
    });
    let Some(assign_index) = assign_index else {
        return false;
    };
    let rhs: Vec<&Token> = children[assign_index + 1..]
        .iter()
        .filter_map(|child| child.as_leaf())
        .filter(|leaf| leaf.kind != TokenKind::Semicolon)
        .collect();
    rhs.len() == 1 && rhs[0].kind == TokenKind::StringLiteral
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::lexer::lex;
    use crate::syntax::{find_first_subtree, leftmost_leaf, span_of_symbol};

    fn parse_source(source: &str) -> ParseResult {
        parse(&lex(source), source)
    }

    fn first_node_with_tag(tree: &Symbol, tag: NodeTag) -> Option<&SyntaxNode> {
        find_first_subtree(tree, &move |symbol| {
            symbol.as_node().map(|n| n.tag() == tag).unwrap_or(false)
        })
        .and_then(|symbol| symbol.as_node())
    }

    #[test]
    fn test_module_name_is_reachable() {
        let source = "module foo;\nendmodule\n";
        let result = parse_source(source);
        assert!(result.errors.is_empty());
        let module = first_node_with_tag(&result.tree, NodeTag::ModuleDeclaration).unwrap();
        let name = get_module_name_token(module).unwrap();
        assert_eq!("foo", name.text(source));
    }

    #[test]
    fn test_nested_modules_are_flagged_as_nested() {
        let source = "module outer;\nmodule inner;\nendmodule\nendmodule\n";
        let result = parse_source(source);
        let modules = find_module_declarations(&result.tree);
        assert_eq!(2, modules.len());
        assert!(!modules[0].1);
        assert!(modules[1].1);
        assert_eq!(
            "inner",
            get_module_name_token(modules[1].0).unwrap().text(source)
        );
    }

    #[test]
    fn test_always_star_event_control() {
        let source = "module m;\nalways @* begin\nf = g;\nend\nendmodule\n";
        let result = parse_source(source);
        let always = first_node_with_tag(&result.tree, NodeTag::AlwaysStatement).unwrap();
        assert_eq!(
            "always",
            get_always_keyword(always).unwrap().text(source)
        );
        assert!(always_has_event_control_star(always, source));
    }

    #[test]
    fn test_always_parenthesized_star() {
        let source = "module m;\nalways @(*) f = g;\nendmodule\n";
        let result = parse_source(source);
        let always = first_node_with_tag(&result.tree, NodeTag::AlwaysStatement).unwrap();
        assert!(always_has_event_control_star(always, source));
    }

    #[test]
    fn test_always_explicit_sensitivity_is_not_star() {
        let source = "module m;\nalways @(posedge clk) q <= d;\nendmodule\n";
        let result = parse_source(source);
        let always = first_node_with_tag(&result.tree, NodeTag::AlwaysStatement).unwrap();
        assert!(!always_has_event_control_star(always, source));
    }

    #[test]
    fn test_param_without_type_has_empty_type_info() {
        let source = "module m;\nparameter N = 4;\nendmodule\n";
        let result = parse_source(source);
        let param = first_node_with_tag(&result.tree, NodeTag::ParamDeclaration).unwrap();
        assert!(!is_param_type_declaration(param));
        assert!(get_param_type_info(param).unwrap().is_empty());
        assert_eq!("N", get_param_name_token(param).unwrap().text(source));
        assert_eq!("parameter", get_param_keyword(param).unwrap().text(source));
    }

    #[test]
    fn test_param_with_type_fills_type_info() {
        let source = "module m;\nlocalparam int Width = 8;\nendmodule\n";
        let result = parse_source(source);
        let param = first_node_with_tag(&result.tree, NodeTag::ParamDeclaration).unwrap();
        assert!(!get_param_type_info(param).unwrap().is_empty());
        assert_eq!("Width", get_param_name_token(param).unwrap().text(source));
        assert_eq!(
            "localparam",
            get_param_keyword(param).unwrap().text(source)
        );
    }

    #[test]
    fn test_type_parameter_declaration() {
        let source = "module m;\nparameter type T = int;\nendmodule\n";
        let result = parse_source(source);
        let param = first_node_with_tag(&result.tree, NodeTag::ParamDeclaration).unwrap();
        assert!(is_param_type_declaration(param));
    }

    #[test]
    fn test_string_assignment_detection() {
        let source = "module m;\nparameter Name = \"x\";\nparameter N = 4;\nendmodule\n";
        let result = parse_source(source);
        let tree = &result.tree;
        let params: Vec<&SyntaxNode> = {
            let mut out = Vec::new();
            collect_params(tree, &mut out);
            out
        };
        assert_eq!(2, params.len());
        assert!(param_has_string_assignment(params[0], source));
        assert!(!param_has_string_assignment(params[1], source));
    }

    fn collect_params<'a>(symbol: &'a Symbol, out: &mut Vec<&'a SyntaxNode>) {
        if let Symbol::Node(node) = symbol {
            if node.tag() == NodeTag::ParamDeclaration {
                out.push(node);
            }
            for child in node.present_children() {
                collect_params(child, out);
            }
        }
    }

    #[test]
    fn test_header_parameter_list_is_parsed() {
        let source = "module m #(parameter W = 8) (input clk);\nendmodule\n";
        let result = parse_source(source);
        let param = first_node_with_tag(&result.tree, NodeTag::ParamDeclaration).unwrap();
        assert_eq!("W", get_param_name_token(param).unwrap().text(source));
        // The parameter sits inside the module header.
        let header = first_node_with_tag(&result.tree, NodeTag::ModuleHeader).unwrap();
        assert!(header
            .present_children()
            .filter_map(|c| c.as_node())
            .any(|n| n.tag() == NodeTag::ParamDeclaration));
    }

    #[test]
    fn test_for_spec_holds_the_semicolons() {
        let source = "module m;\nalways @* begin\nfor (;;) x = y;\nend\nendmodule\n";
        let result = parse_source(source);
        let spec = first_node_with_tag(&result.tree, NodeTag::ForSpec).unwrap();
        let semicolons = spec
            .present_children()
            .filter_map(|c| c.as_leaf())
            .filter(|l| l.kind == TokenKind::Semicolon)
            .count();
        assert_eq!(2, semicolons);
    }

    #[test]
    fn test_unterminated_module_is_salvaged_with_error() {
        let source = "module m;\nwire w;\n";
        let result = parse_source(source);
        assert_eq!(1, result.errors.len());
        // The tree still holds everything that was seen.
        let module = first_node_with_tag(&result.tree, NodeTag::ModuleDeclaration).unwrap();
        assert_eq!("m", get_module_name_token(module).unwrap().text(source));
    }

    #[test]
    fn test_orphan_endmodule_reports_error_but_keeps_leaf() {
        let source = "endmodule\n";
        let result = parse_source(source);
        assert_eq!(1, result.errors.len());
        assert_eq!("endmodule", result.errors[0].span.text(source));
        assert!(leftmost_leaf(&result.tree).is_some());
    }

    #[test]
    fn test_every_significant_token_lands_in_the_tree() {
        let source = "module m #(parameter W = 8) (input clk);\nalways @(posedge clk) begin\nfor (i = 0; i < W; i = i + 1) q <= d;\nend\nendmodule\n";
        let result = parse_source(source);
        let significant = lex(source)
            .iter()
            .filter(|t| !t.kind.is_trivia() && !t.is_eof())
            .count();
        let mut leaves = 0;
        count_leaves(&result.tree, &mut leaves);
        assert_eq!(significant, leaves);
        // And they cover the source in order.
        let span = span_of_symbol(&result.tree).unwrap();
        assert_eq!(0, span.start);
    }

    fn count_leaves(symbol: &Symbol, count: &mut usize) {
        match symbol {
            Symbol::Leaf(_) => *count += 1,
            Symbol::Node(node) => {
                for child in node.present_children() {
                    count_leaves(child, count);
                }
            }
        }
    }
}
