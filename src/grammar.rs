//! Grammar graphs of composable patterns.
//!
//! Patterns live in an arena owned by a [`Grammar`] and reference each
//! other through [`PatternId`] handles, which gives rules the stable
//! identity that recursion counting and duplicate detection need while
//! allowing the rule graph to contain cycles: declare a rule first with
//! [`Grammar::rule`], then close the cycle with [`Grammar::define`].
//!
//! ```
//! use descant::{Grammar, Parser, SourceFile};
//! use bumpalo::Bump;
//!
//! let mut g = Grammar::new();
//! let x = g.exact(1, "x");
//! let list = g.rule("x list", 2);
//! let rest = g.repeated(0, 1, list);
//! let body = g.sequence(vec![x, rest]);
//! g.define(list, body);
//!
//! let parser = Parser::new(g, list, None).unwrap();
//! let file = SourceFile::new("list.txt", "xxx");
//! let bump = Bump::new();
//! let tree = parser.parse(&file, &bump).unwrap();
//! assert_eq!(tree.kind(), 2);
//! assert_eq!(tree.text(), "xxx");
//! ```

use std::cell::RefCell;
use std::fmt;

use crate::fragment::{Construct, FragmentKind};
use crate::source::Cursor;

/// A handle to a pattern stored in a [`Grammar`].
///
/// The id is the pattern's identity: two handles are the same pattern
/// exactly when they are equal.
///
/// [`Grammar`]: struct.Grammar.html
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct PatternId(pub(crate) usize);

impl fmt::Display for PatternId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The error type user actions may raise; it aborts the parse wrapped
/// with the construct's begin position.
pub type ActionError = Box<dyn std::error::Error + Send + Sync>;

/// A rule's action callback, invoked with the finished construct.
pub type Action = Box<dyn FnMut(&Construct<'_, '_>) -> Result<(), ActionError>>;

/// A lexed terminal's predicate: `(local_index, cursor) -> bool`, where
/// `local_index` counts the scalars consumed by the current match.
pub type LexFn = Box<dyn Fn(usize, Cursor<'_>) -> bool>;

pub(crate) struct RuleNode {
    pub(crate) designation: String,
    pub(crate) kind: FragmentKind,
    pub(crate) body: Option<PatternId>,
    pub(crate) action: Option<RefCell<Action>>,
}

pub(crate) enum Node {
    Rule(RuleNode),
    Exact {
        kind: FragmentKind,
        expectation: Vec<char>,
    },
    Lexed {
        kind: FragmentKind,
        designation: String,
        min_len: usize,
        lex: LexFn,
    },
    Sequence(Vec<PatternId>),
    Repeated {
        min: usize,
        max: usize,
        pattern: PatternId,
    },
    Either(Vec<PatternId>),
    Not(PatternId),
}

/// An arena of grammar patterns.
///
/// All builder methods append a node and return its handle. The grammar is
/// plain data until it is handed to [`Parser::new`](crate::Parser::new),
/// which validates the graph once.
#[derive(Default)]
pub struct Grammar {
    nodes: Vec<Node>,
}

impl Grammar {
    /// Creates an empty grammar.
    pub fn new() -> Self {
        Grammar { nodes: Vec::new() }
    }

    fn push(&mut self, node: Node) -> PatternId {
        let id = PatternId(self.nodes.len());
        self.nodes.push(node);
        id
    }

    /// Declares a named production with no body yet.
    ///
    /// The body is attached later with [`define`](Grammar::define), which
    /// is what allows rules to reference themselves. A rule left without a
    /// body is rejected at parser construction.
    pub fn rule(&mut self, designation: impl Into<String>, kind: FragmentKind) -> PatternId {
        self.push(Node::Rule(RuleNode {
            designation: designation.into(),
            kind,
            body: None,
            action: None,
        }))
    }

    /// Declares a named production and attaches its body in one step.
    pub fn rule_with(
        &mut self,
        designation: impl Into<String>,
        kind: FragmentKind,
        body: PatternId,
    ) -> PatternId {
        let id = self.rule(designation, kind);
        self.define(id, body);
        id
    }

    /// Attaches (or replaces) the body of a previously declared rule.
    ///
    /// # Panics
    ///
    /// Panics when `rule` does not refer to a rule.
    pub fn define(&mut self, rule: PatternId, body: PatternId) {
        match self.nodes.get_mut(rule.0) {
            Some(Node::Rule(node)) => node.body = Some(body),
            _ => panic!("define: {} is not a rule", rule),
        }
    }

    /// Attaches an action to a previously declared rule. The action runs
    /// each time the rule's construct is finished; an `Err` aborts the
    /// parse.
    ///
    /// # Panics
    ///
    /// Panics when `rule` does not refer to a rule.
    pub fn bind(
        &mut self,
        rule: PatternId,
        action: impl FnMut(&Construct<'_, '_>) -> Result<(), ActionError> + 'static,
    ) {
        match self.nodes.get_mut(rule.0) {
            Some(Node::Rule(node)) => node.action = Some(RefCell::new(Box::new(action))),
            _ => panic!("bind: {} is not a rule", rule),
        }
    }

    /// A terminal matching the exact scalar sequence of `expectation`.
    pub fn exact(&mut self, kind: FragmentKind, expectation: &str) -> PatternId {
        self.push(Node::Exact {
            kind,
            expectation: expectation.chars().collect(),
        })
    }

    /// A terminal greedily consuming scalars while the predicate holds,
    /// failing when fewer than `min_len` scalars were consumed.
    pub fn lexed(
        &mut self,
        kind: FragmentKind,
        designation: impl Into<String>,
        min_len: usize,
        lex: impl Fn(usize, Cursor<'_>) -> bool + 'static,
    ) -> PatternId {
        self.push(Node::Lexed {
            kind,
            designation: designation.into(),
            min_len,
            lex: Box::new(lex),
        })
    }

    /// All elements in order.
    pub fn sequence(&mut self, elements: Vec<PatternId>) -> PatternId {
        self.push(Node::Sequence(elements))
    }

    /// Between `min` and `max` greedy repetitions of `pattern`;
    /// `max == 0` means unbounded.
    pub fn repeated(&mut self, min: usize, max: usize, pattern: PatternId) -> PatternId {
        self.push(Node::Repeated { min, max, pattern })
    }

    /// Ordered choice: the first matching option wins.
    pub fn either(&mut self, options: Vec<PatternId>) -> PatternId {
        self.push(Node::Either(options))
    }

    /// Zero-width negative lookahead: succeeds exactly when `pattern` does
    /// not match, never consuming input.
    pub fn not(&mut self, pattern: PatternId) -> PatternId {
        self.push(Node::Not(pattern))
    }

    /// The human-readable designation of a pattern, as used in error
    /// messages.
    pub fn designation(&self, id: PatternId) -> String {
        match self.get(id) {
            None => "<unknown>".to_string(),
            Some(Node::Rule(rule)) => rule.designation.clone(),
            Some(Node::Lexed { designation, .. }) => designation.clone(),
            Some(Node::Exact { expectation, .. }) => {
                format!("'{}'", expectation.iter().collect::<String>())
            }
            Some(Node::Sequence(elements)) => {
                let inner: Vec<String> =
                    elements.iter().map(|&el| self.designation(el)).collect();
                format!("{{{}}}", inner.join(", "))
            }
            Some(Node::Either(options)) => {
                let inner: Vec<String> =
                    options.iter().map(|&opt| self.designation(opt)).collect();
                format!("either of [{}]", inner.join(", "))
            }
            Some(Node::Not(pattern)) => format!("not a {}", self.designation(*pattern)),
            Some(Node::Repeated { min, max, pattern }) => {
                let inner = self.designation(*pattern);
                if *max == 0 {
                    format!("{}+ repetitions of {}", min, inner)
                } else if min == max {
                    format!("exactly {} repetitions of {}", min, inner)
                } else {
                    format!("{}-{} repetitions of {}", min, max, inner)
                }
            }
        }
    }

    pub(crate) fn get(&self, id: PatternId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    /// Looks a validated pattern up; ids handed out by the builder methods
    /// of this grammar are always in range.
    pub(crate) fn node(&self, id: PatternId) -> &Node {
        &self.nodes[id.0]
    }

    /// Container patterns collect their children into the enclosing
    /// scanner themselves; only leaf-producing patterns (rules and
    /// terminals) yield a fragment their caller appends.
    pub(crate) fn is_container(&self, id: PatternId) -> bool {
        matches!(
            self.get(id),
            Some(Node::Sequence(_) | Node::Repeated { .. } | Node::Either(_) | Node::Not(_))
        )
    }

    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }
}

impl fmt::Debug for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Grammar")
            .field("patterns", &self.nodes.len())
            .finish()
    }
}
