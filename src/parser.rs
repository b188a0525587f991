//! The top-down parser: pattern dispatch, backtracking, recursion
//! control, and the error-grammar refinement pass.

use bumpalo::Bump;
use log::debug;
use rustc_hash::FxHashMap;

use crate::debug::{DebugProfile, NoTrace, Tracer};
use crate::error::{GrammarError, ParseError};
use crate::fragment::Fragment;
use crate::grammar::{ActionError, Grammar, Node, PatternId, RuleNode};
use crate::lexer::{ExactScan, Lexer, Scan};
use crate::scanner::Scanner;
use crate::source::{Cursor, SourceFile};
use crate::validate::{find_rules, validate};

/// The internal failure signal of the dispatcher. End-of-input is always
/// consumed internally; the other variants surface as [`ParseError`] once
/// the parse gives up.
pub(crate) enum Reject<'s> {
    Mismatch {
        at: Cursor<'s>,
        expected: Option<PatternId>,
    },
    Eof,
    Recursion {
        rule: PatternId,
        at: Cursor<'s>,
        propagated: bool,
    },
    Action {
        at: Cursor<'s>,
        source: ActionError,
    },
}

/// A parser for one validated grammar.
///
/// Construction validates the grammar graph once; afterwards a parser can
/// be reused for any number of sequential parses. A single parser must not
/// run two parses concurrently — each parse mutates the recursion register
/// and may run `FnMut` actions. Parsers are cheap to construct, so
/// concurrent callers should each hold their own.
pub struct Parser {
    grammar: Grammar,
    start: PatternId,
    error_rule: Option<PatternId>,
    rule_index: FxHashMap<PatternId, usize>,
    /// Caps the dispatch depth per distinct rule; `0` disables the cap.
    pub max_recursion_level: usize,
}

impl Parser {
    /// Validates the grammar graph reachable from `start` and, when given,
    /// `error_rule`, and caches the set of reachable rules for recursion
    /// counting. Both entry points must be rules.
    ///
    /// The error rule, when configured, runs only after a failed parse: it
    /// is rewound to the failure position and given one chance to match
    /// the malformed region and emit a better diagnostic through its
    /// action.
    pub fn new(
        grammar: Grammar,
        start: PatternId,
        error_rule: Option<PatternId>,
    ) -> Result<Self, GrammarError> {
        validate(&grammar, start)?;
        if let Some(error_rule) = error_rule {
            validate(&grammar, error_rule)?;
        }

        let mut rules = Vec::new();
        find_rules(&grammar, start, &mut rules);
        if let Some(error_rule) = error_rule {
            find_rules(&grammar, error_rule, &mut rules);
        }
        let rule_index = rules
            .iter()
            .enumerate()
            .map(|(slot, &id)| (id, slot))
            .collect::<FxHashMap<_, _>>();
        debug!(
            "grammar validated, {} rule(s) reachable from the entry points",
            rule_index.len()
        );

        Ok(Parser {
            grammar,
            start,
            error_rule,
            rule_index,
            max_recursion_level: 0,
        })
    }

    /// The validated grammar.
    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    /// Parses `file`, allocating the fragment tree in `bump`.
    ///
    /// On success the returned fragment is the start rule's construct and
    /// covers the entire input; trailing unmatched input is an error.
    pub fn parse<'s, 'a>(
        &self,
        file: &'s SourceFile,
        bump: &'a Bump,
    ) -> Result<Fragment<'s, 'a>, ParseError<'s>> {
        self.run(file, bump, NoTrace)
    }

    /// Parses `file` exactly like [`parse`](Parser::parse), additionally
    /// recording the linear dispatch trace.
    pub fn debug<'s, 'a>(
        &self,
        file: &'s SourceFile,
        bump: &'a Bump,
    ) -> (DebugProfile<'s>, Result<Fragment<'s, 'a>, ParseError<'s>>) {
        let mut profile = DebugProfile::default();
        let result = self.run(file, bump, &mut profile);
        (profile, result)
    }

    fn run<'s, 'a, T>(
        &self,
        file: &'s SourceFile,
        bump: &'a Bump,
        tracer: T,
    ) -> Result<Fragment<'s, 'a>, ParseError<'s>>
    where
        T: Tracer<'s>,
    {
        let mut run = Run {
            grammar: &self.grammar,
            rule_index: &self.rule_index,
            depths: vec![0; self.rule_index.len()],
            max_recursion: self.max_recursion_level,
            tracer,
        };
        let mut lexer = Lexer::new(file);

        let dispatched = {
            let mut scanner = Scanner::new(&mut lexer, bump);
            run.handle(self.start, &mut scanner, 0)
        };

        let reject = match dispatched {
            Ok(fragment) => {
                let root = match fragment {
                    Some(root) => root,
                    None => unreachable!("the start rule always yields a construct"),
                };
                // Ensure the remainder of the input is empty.
                match lexer.read_until(&|_: usize, _: Cursor| true, 0) {
                    Scan::Token(trailing) => Reject::Mismatch {
                        at: trailing.begin(),
                        expected: None,
                    },
                    Scan::Eof | Scan::Empty => return Ok(root),
                }
            }
            Err(Reject::Eof) => Reject::Mismatch {
                at: lexer.position(),
                expected: None,
            },
            Err(reject) => reject,
        };

        // Action errors abort outright; the diagnostic layer never
        // second-guesses user errors.
        if let Reject::Action { .. } = reject {
            return Err(self.finish(reject));
        }

        if let Reject::Mismatch { at, .. } = &reject {
            lexer.set(*at);
        }
        let reject = match self.error_rule {
            Some(error_rule) => {
                debug!("parse failed, running the error grammar at {}", lexer.position());
                run.recover(error_rule, &mut lexer, bump, reject)
            }
            None => reject,
        };
        Err(self.finish(reject))
    }

    fn finish<'s>(&self, reject: Reject<'s>) -> ParseError<'s> {
        match reject {
            Reject::Mismatch { at, expected } => ParseError::UnexpectedToken {
                at,
                expected: expected.map(|id| self.grammar.designation(id)),
            },
            Reject::Recursion { rule, at, .. } => ParseError::RecursionLimit {
                rule: self.grammar.designation(rule),
                at,
            },
            Reject::Action { at, source } => ParseError::Action { at, source },
            Reject::Eof => unreachable!("end-of-input signals never surface"),
        }
    }
}

impl std::fmt::Debug for Parser {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("Parser")
            .field("grammar", &self.grammar)
            .field("start", &self.start)
            .field("error_rule", &self.error_rule)
            .field("max_recursion_level", &self.max_recursion_level)
            .finish()
    }
}

/// The state of one parse invocation.
struct Run<'g, T> {
    grammar: &'g Grammar,
    rule_index: &'g FxHashMap<PatternId, usize>,
    depths: Vec<usize>,
    max_recursion: usize,
    tracer: T,
}

impl<'g, T> Run<'g, T> {
    /// Dispatches one pattern, recording the trace entry around it.
    fn handle<'s, 'a>(
        &mut self,
        id: PatternId,
        scanner: &mut Scanner<'s, 'a, '_>,
        level: usize,
    ) -> Result<Option<Fragment<'s, 'a>>, Reject<'s>>
    where
        T: Tracer<'s>,
    {
        let slot = self.tracer.enter(id, scanner.position(), level);
        let mut result = self.dispatch(id, scanner, level);
        let matched = match &mut result {
            Ok(_) => true,
            // The entry at which the recursion cap fires is flagged as
            // matched; its ancestors see the propagated error.
            Err(Reject::Recursion { propagated, .. }) if !*propagated => {
                *propagated = true;
                true
            }
            Err(_) => false,
        };
        self.tracer.exit(slot, matched);
        result
    }

    fn dispatch<'s, 'a>(
        &mut self,
        id: PatternId,
        scanner: &mut Scanner<'s, 'a, '_>,
        level: usize,
    ) -> Result<Option<Fragment<'s, 'a>>, Reject<'s>>
    where
        T: Tracer<'s>,
    {
        let grammar = self.grammar;
        match grammar.node(id) {
            Node::Rule(rule) => {
                let at = scanner.position();
                if self.max_recursion > 0 {
                    if let Some(&slot) = self.rule_index.get(&id) {
                        self.depths[slot] += 1;
                        if self.depths[slot] > self.max_recursion {
                            self.depths[slot] -= 1;
                            return Err(Reject::Recursion {
                                rule: id,
                                at,
                                propagated: false,
                            });
                        }
                    }
                }
                let result = self.rule(id, rule, scanner, level);
                if self.max_recursion > 0 {
                    if let Some(&slot) = self.rule_index.get(&id) {
                        self.depths[slot] -= 1;
                    }
                }
                result
            }

            Node::Exact { kind, expectation } => {
                let at = scanner.position();
                match scanner.read_exact(expectation, *kind) {
                    ExactScan::Eof => Err(Reject::Eof),
                    ExactScan::Match(token) => Ok(Some(Fragment::Token(token))),
                    ExactScan::Mismatch(_) => Err(Reject::Mismatch {
                        at,
                        expected: Some(id),
                    }),
                }
            }

            Node::Lexed {
                kind, min_len, lex, ..
            } => {
                let at = scanner.position();
                match scanner.read_until(&**lex, *kind) {
                    Scan::Eof => Err(Reject::Eof),
                    Scan::Empty => Err(Reject::Mismatch {
                        at,
                        expected: Some(id),
                    }),
                    Scan::Token(token) => {
                        if token.src().len() < *min_len {
                            return Err(Reject::Mismatch {
                                at,
                                expected: Some(id),
                            });
                        }
                        Ok(Some(Fragment::Token(token)))
                    }
                }
            }

            Node::Sequence(elements) => {
                for &element in elements {
                    let fragment = self.handle(element, scanner, level + 1)?;
                    if !grammar.is_container(element) {
                        if let Some(fragment) = fragment {
                            scanner.append(fragment);
                        }
                    }
                }
                Ok(None)
            }

            Node::Repeated { min, max, pattern } => {
                let (min, max, pattern) = (*min, *max, *pattern);
                let mut matched = 0usize;
                let mut last_good = scanner.position();
                loop {
                    if max > 0 && matched == max {
                        break;
                    }
                    match self.handle(pattern, scanner, level + 1) {
                        Ok(fragment) => {
                            matched += 1;
                            last_good = scanner.position();
                            if !grammar.is_container(pattern) {
                                if let Some(fragment) = fragment {
                                    scanner.append(fragment);
                                }
                            }
                        }
                        Err(Reject::Mismatch { at, expected }) => {
                            if matched < min {
                                return Err(Reject::Mismatch { at, expected });
                            }
                            scanner.set(last_good);
                            break;
                        }
                        Err(Reject::Eof) => {
                            if matched < min {
                                return Err(Reject::Mismatch {
                                    at: scanner.position(),
                                    expected: Some(pattern),
                                });
                            }
                            scanner.set(last_good);
                            break;
                        }
                        Err(other) => return Err(other),
                    }
                }
                Ok(None)
            }

            Node::Either(options) => {
                let before = scanner.position();
                let last = options.len().saturating_sub(1);
                for (ix, &option) in options.iter().enumerate() {
                    match self.handle(option, scanner, level + 1) {
                        Ok(fragment) => {
                            if !grammar.is_container(option) {
                                if let Some(frag) = fragment {
                                    scanner.append(frag);
                                }
                            }
                            return Ok(fragment);
                        }
                        Err(Reject::Mismatch { at, .. }) => {
                            if ix == last {
                                // The diagnostic names the whole choice,
                                // not the option that happened to fail
                                // last.
                                return Err(Reject::Mismatch {
                                    at,
                                    expected: Some(id),
                                });
                            }
                            scanner.set(before);
                        }
                        Err(other) => return Err(other),
                    }
                }
                unreachable!("either-combinators have at least two options")
            }

            Node::Not(pattern) => {
                let before = scanner.position();
                match self.handle(*pattern, scanner, level + 1) {
                    Ok(_) => {
                        scanner.set(before);
                        Err(Reject::Mismatch {
                            at: before,
                            expected: Some(id),
                        })
                    }
                    Err(Reject::Mismatch { .. }) | Err(Reject::Eof) => {
                        scanner.set(before);
                        Ok(None)
                    }
                    Err(other) => Err(other),
                }
            }
        }
    }

    fn rule<'s, 'a>(
        &mut self,
        id: PatternId,
        rule: &'g RuleNode,
        scanner: &mut Scanner<'s, 'a, '_>,
        level: usize,
    ) -> Result<Option<Fragment<'s, 'a>>, Reject<'s>>
    where
        T: Tracer<'s>,
    {
        let grammar = self.grammar;
        let body = match rule.body {
            Some(body) => body,
            None => unreachable!("validated rules carry a body"),
        };

        let mut sub = scanner.sub();
        match self.handle(body, &mut sub, level + 1) {
            Ok(fragment) => {
                if !grammar.is_container(body) {
                    if let Some(fragment) = fragment {
                        sub.append(fragment);
                    }
                }
                let construct = sub.build(rule.kind);
                if let Some(action) = &rule.action {
                    let mut callback = action.borrow_mut();
                    if let Err(source) = (*callback)(&construct) {
                        return Err(Reject::Action {
                            at: construct.begin(),
                            source,
                        });
                    }
                }
                Ok(Some(Fragment::Construct(construct)))
            }
            Err(mut reject) => {
                // Let the diagnostic name the production instead of its
                // body terminal; richer container designations (choices,
                // lookaheads) are kept as-is.
                if let Reject::Mismatch { expected, .. } = &mut reject {
                    if *expected == Some(body) && !grammar.is_container(body) {
                        *expected = Some(id);
                    }
                }
                Err(reject)
            }
        }
    }

    /// Runs the error grammar against the rewound input. A user diagnostic
    /// raised by its action supersedes the original failure; its own
    /// mismatch surfaces with the expected slot cleared; everything else
    /// leaves the original failure in place.
    fn recover<'s, 'a>(
        &mut self,
        error_rule: PatternId,
        lexer: &mut Lexer<'s>,
        bump: &'a Bump,
        original: Reject<'s>,
    ) -> Reject<'s>
    where
        T: Tracer<'s>,
    {
        let mut scanner = Scanner::new(lexer, bump);
        match self.handle(error_rule, &mut scanner, 0) {
            Ok(_) | Err(Reject::Eof) => original,
            Err(Reject::Mismatch { at, .. }) => Reject::Mismatch { at, expected: None },
            Err(other) => other,
        }
    }
}
