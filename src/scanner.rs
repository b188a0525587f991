//! The sequence-recording scanner driving one rule invocation.

use bumpalo::collections::Vec as BumpVec;
use bumpalo::Bump;

use crate::fragment::{Construct, Fragment, FragmentKind, Token};
use crate::lexer::{ExactScan, Lexer, Scan};
use crate::source::Cursor;

/// A scanner couples the shared lexer with the record list of one rule
/// body: the child fragments collected so far, in match order, allocated
/// in the parse's bump arena.
///
/// Entering a nested rule creates a [`sub`](Scanner::sub) scanner over the
/// same lexer with its own empty records; the records of the finished body
/// become the construct's children via [`build`](Scanner::build).
pub(crate) struct Scanner<'s, 'a, 'l> {
    lexer: &'l mut Lexer<'s>,
    bump: &'a Bump,
    records: BumpVec<'a, Fragment<'s, 'a>>,
}

impl<'s, 'a, 'l> Scanner<'s, 'a, 'l> {
    pub(crate) fn new(lexer: &'l mut Lexer<'s>, bump: &'a Bump) -> Self {
        Scanner {
            lexer,
            bump,
            records: BumpVec::new_in(bump),
        }
    }

    /// A scanner over the same lexer with its own empty record list.
    pub(crate) fn sub(&mut self) -> Scanner<'s, 'a, '_> {
        Scanner {
            lexer: &mut *self.lexer,
            bump: self.bump,
            records: BumpVec::new_in(self.bump),
        }
    }

    pub(crate) fn position(&self) -> Cursor<'s> {
        self.lexer.position()
    }

    pub(crate) fn read_exact(
        &mut self,
        expectation: &[char],
        kind: FragmentKind,
    ) -> ExactScan<'s> {
        self.lexer.read_exact(expectation, kind)
    }

    pub(crate) fn read_until<F>(&mut self, lex: &F, kind: FragmentKind) -> Scan<'s>
    where
        F: ?Sized + Fn(usize, Cursor<'s>) -> bool,
    {
        self.lexer.read_until(lex, kind)
    }

    /// Appends one child record.
    pub(crate) fn append(&mut self, fragment: Fragment<'s, 'a>) {
        self.records.push(fragment);
    }

    /// Rewinds the lexer to `cursor` and drops every record that begins at
    /// or after it, keeping the record list consistent with the lexer
    /// position. This is the backtracking primitive.
    pub(crate) fn set(&mut self, cursor: Cursor<'s>) {
        self.lexer.set(cursor);
        while let Some(last) = self.records.last() {
            if last.begin().index() < cursor.index() {
                break;
            }
            self.records.pop();
        }
    }

    /// Materialises the construct over the collected records, spanning
    /// from the first record's begin to the last record's end, or
    /// zero-width at the current position when no records were collected.
    pub(crate) fn build(&mut self, kind: FragmentKind) -> Construct<'s, 'a> {
        let token = match (self.records.first(), self.records.last()) {
            (Some(first), Some(last)) => Token {
                kind,
                begin: first.begin(),
                end: last.end(),
            },
            _ => {
                let pos = self.lexer.position();
                Token {
                    kind,
                    begin: pos,
                    end: pos,
                }
            }
        };
        let records = std::mem::replace(&mut self.records, BumpVec::new_in(self.bump));
        Construct {
            token,
            elements: records.into_bump_slice(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SourceFile;
    use pretty_assertions::assert_eq;

    fn word(_: usize, cr: Cursor) -> bool {
        cr.scalar().map_or(false, |c| c.is_ascii_alphanumeric())
    }

    #[test]
    fn build_spans_the_collected_records() {
        let file = SourceFile::new("test.txt", "foo bar");
        let bump = Bump::new();
        let mut lexer = Lexer::new(&file);
        let mut scan = Scanner::new(&mut lexer, &bump);

        let first = match scan.read_until(&word, 1) {
            Scan::Token(tk) => tk,
            other => panic!("unexpected outcome: {:?}", other),
        };
        scan.append(Fragment::Token(first));
        let space = match scan.read_exact(&[' '], 2) {
            ExactScan::Match(tk) => tk,
            other => panic!("unexpected outcome: {:?}", other),
        };
        scan.append(Fragment::Token(space));
        let second = match scan.read_until(&word, 1) {
            Scan::Token(tk) => tk,
            other => panic!("unexpected outcome: {:?}", other),
        };
        scan.append(Fragment::Token(second));

        let built = scan.build(9);
        assert_eq!(built.kind(), 9);
        assert_eq!(built.text(), "foo bar");
        assert_eq!(built.elements().len(), 3);
        assert_eq!(built.elements()[1].text(), " ");
    }

    #[test]
    fn build_without_records_is_zero_width() {
        let file = SourceFile::new("test.txt", "foo");
        let bump = Bump::new();
        let mut lexer = Lexer::new(&file);
        let mut scan = Scanner::new(&mut lexer, &bump);

        let built = scan.build(5);
        assert_eq!(built.begin().index(), 0);
        assert_eq!(built.end().index(), 0);
        assert!(built.elements().is_empty());
    }

    #[test]
    fn set_truncates_records_behind_the_cursor() {
        let file = SourceFile::new("test.txt", "ab");
        let bump = Bump::new();
        let mut lexer = Lexer::new(&file);
        let mut scan = Scanner::new(&mut lexer, &bump);

        let before = scan.position();
        let a = match scan.read_exact(&['a'], 1) {
            ExactScan::Match(tk) => tk,
            other => panic!("unexpected outcome: {:?}", other),
        };
        scan.append(Fragment::Token(a));
        let mid = scan.position();
        let b = match scan.read_exact(&['b'], 1) {
            ExactScan::Match(tk) => tk,
            other => panic!("unexpected outcome: {:?}", other),
        };
        scan.append(Fragment::Token(b));

        scan.set(mid);
        assert_eq!(scan.position(), mid);
        let built = scan.build(0);
        assert_eq!(built.elements().len(), 1);
        assert_eq!(built.text(), "a");

        scan.set(before);
        let built = scan.build(0);
        assert!(built.elements().is_empty());
    }

    #[test]
    fn sub_scanner_shares_the_lexer_but_not_records() {
        let file = SourceFile::new("test.txt", "ab");
        let bump = Bump::new();
        let mut lexer = Lexer::new(&file);
        let mut outer = Scanner::new(&mut lexer, &bump);

        let a = match outer.read_exact(&['a'], 1) {
            ExactScan::Match(tk) => tk,
            other => panic!("unexpected outcome: {:?}", other),
        };
        outer.append(Fragment::Token(a));

        {
            let mut inner = outer.sub();
            let b = match inner.read_exact(&['b'], 1) {
                ExactScan::Match(tk) => tk,
                other => panic!("unexpected outcome: {:?}", other),
            };
            inner.append(Fragment::Token(b));
            let built = inner.build(0);
            assert_eq!(built.elements().len(), 1);
            assert_eq!(built.text(), "b");
        }

        // The outer record list was untouched; the lexer advanced.
        assert_eq!(outer.position().index(), 2);
        let built = outer.build(0);
        assert_eq!(built.elements().len(), 1);
        assert_eq!(built.text(), "a");
    }
}
