//! Character-level lexing primitives over a single mutable cursor.

use crate::fragment::{FragmentKind, Token};
use crate::source::{Cursor, SourceFile};

/// Outcome of [`Lexer::read_until`].
#[derive(Debug)]
pub(crate) enum Scan<'s> {
    /// One or more scalars were consumed.
    Token(Token<'s>),
    /// The predicate rejected the first scalar; nothing was consumed.
    Empty,
    /// The cursor already stood at end of input.
    Eof,
}

/// Outcome of [`Lexer::read_exact`].
#[derive(Debug)]
pub(crate) enum ExactScan<'s> {
    /// The full expectation was matched.
    Match(Token<'s>),
    /// A scalar differed, or the input ended mid-expectation. The token
    /// covers whatever was consumed, including the differing scalar.
    Mismatch(Token<'s>),
    /// The cursor already stood at end of input.
    Eof,
}

/// The lexer owns the one mutable cursor of a parse and exposes the two
/// primitives the dispatcher matches terminals with. Rewinding is a plain
/// cursor copy via [`set`](Lexer::set).
pub(crate) struct Lexer<'s> {
    cursor: Cursor<'s>,
}

impl<'s> Lexer<'s> {
    pub(crate) fn new(file: &'s SourceFile) -> Self {
        Lexer {
            cursor: Cursor::new(file),
        }
    }

    pub(crate) fn position(&self) -> Cursor<'s> {
        self.cursor
    }

    pub(crate) fn set(&mut self, cursor: Cursor<'s>) {
        self.cursor = cursor;
    }

    pub(crate) fn reached_eof(&self) -> bool {
        self.cursor.reached_eof()
    }

    /// Reads the exact scalar sequence `expectation`.
    ///
    /// Every scalar, matching or not, advances the cursor; on a mismatch
    /// the differing scalar is therefore part of the returned token.
    /// `expectation` must be non-empty, which grammar validation
    /// guarantees.
    pub(crate) fn read_exact(
        &mut self,
        expectation: &[char],
        kind: FragmentKind,
    ) -> ExactScan<'s> {
        if self.reached_eof() {
            return ExactScan::Eof;
        }
        let begin = self.cursor;
        for &expected in expectation {
            if self.reached_eof() {
                return ExactScan::Mismatch(Token {
                    kind,
                    begin,
                    end: self.cursor,
                });
            }
            let actual = self.cursor.scalar();
            self.cursor.advance();
            if actual != Some(expected) {
                return ExactScan::Mismatch(Token {
                    kind,
                    begin,
                    end: self.cursor,
                });
            }
        }
        ExactScan::Match(Token {
            kind,
            begin,
            end: self.cursor,
        })
    }

    /// Reads scalars while `lex(local_index, cursor)` holds, where
    /// `local_index` counts the scalars consumed by this call.
    pub(crate) fn read_until<F>(&mut self, lex: &F, kind: FragmentKind) -> Scan<'s>
    where
        F: ?Sized + Fn(usize, Cursor<'s>) -> bool,
    {
        if self.reached_eof() {
            return Scan::Eof;
        }
        let begin = self.cursor;
        let mut index = 0;
        while !self.reached_eof() && lex(index, self.cursor) {
            self.cursor.advance();
            index += 1;
        }
        if self.cursor.index() == begin.index() {
            return Scan::Empty;
        }
        Scan::Token(Token {
            kind,
            begin,
            end: self.cursor,
        })
    }
}
