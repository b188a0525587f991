#![warn(missing_docs)]

//! A grammar-driven recursive descent parsing toolkit.
//!
//! Applications declare a grammar as a graph of composable patterns —
//! rules, exact and lexed terminals, sequences, repetitions, ordered
//! choices and negative lookaheads — and hand a [`Parser`] a source file
//! together with a bump allocator. The parser answers with a typed
//! fragment tree covering the whole input, or a positioned error. An
//! optional secondary error grammar can refine diagnostics for malformed
//! input, and [`Parser::debug`] records a linear trace of every dispatch.
//!
//! Matching follows ordered-choice (PEG) semantics: within an `either`
//! the first matching option wins, and backtracking restores both the
//! cursor and the collected records.
//!
//! ```
//! use bumpalo::Bump;
//! use descant::{Grammar, Parser, SourceFile};
//!
//! let mut g = Grammar::new();
//! let word = g.lexed(1, "latin word", 1, |_, cr| {
//!     cr.scalar().map_or(false, |c| c.is_ascii_alphanumeric())
//! });
//! let space = g.lexed(2, "space", 1, |_, cr| {
//!     cr.scalar().map_or(false, char::is_whitespace)
//! });
//! let greeting = g.rule("greeting", 3);
//! let body = g.sequence(vec![word, space, word]);
//! g.define(greeting, body);
//!
//! let parser = Parser::new(g, greeting, None).unwrap();
//! let file = SourceFile::new("hello.txt", "hello world");
//! let bump = Bump::new();
//!
//! let tree = parser.parse(&file, &bump).unwrap();
//! assert_eq!(tree.kind(), 3);
//! assert_eq!(tree.elements().len(), 3);
//! assert_eq!(tree.elements()[2].text(), "world");
//! ```

pub use bumpalo;

pub mod debug;
pub mod error;
pub mod fragment;
pub mod grammar;
pub mod print;
pub mod source;

mod lexer;
mod parser;
mod scanner;
mod validate;

pub use debug::{DebugLogEntry, DebugProfile};
pub use error::{GrammarError, ParseError};
pub use fragment::{Construct, Fragment, FragmentKind, Token};
pub use grammar::{Action, ActionError, Grammar, LexFn, PatternId};
pub use parser::Parser;
pub use print::{print_fragment, PrintOptions};
pub use source::{Cursor, SourceFile};
