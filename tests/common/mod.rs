#![allow(dead_code)]

use descant::{Cursor, Fragment, FragmentKind, Grammar, PatternId, SourceFile};

pub const FR_SPACE: FragmentKind = 1;
pub const FR_SEPARATOR: FragmentKind = 2;
pub const FR_WORD: FragmentKind = 3;
pub const FR_FOO: FragmentKind = 4;
pub const FR_BAR: FragmentKind = 5;

pub fn source(src: &str) -> SourceFile {
    SourceFile::new("test.txt", src)
}

pub fn term_space(g: &mut Grammar) -> PatternId {
    g.lexed(FR_SPACE, "space", 0, |_, cr| {
        matches!(cr.scalar(), Some(' ' | '\t' | '\n' | '\r'))
    })
}

pub fn term_latin_word(g: &mut Grammar) -> PatternId {
    g.lexed(FR_WORD, "latin word", 0, |_, cr| {
        cr.scalar().map_or(false, |c| c.is_ascii_alphanumeric())
    })
}

pub fn term_separator(g: &mut Grammar) -> PatternId {
    g.exact(FR_SEPARATOR, ",")
}

pub fn rule_foo(g: &mut Grammar) -> PatternId {
    let body = g.exact(0, "foo");
    g.rule_with("keyword foo", FR_FOO, body)
}

pub fn rule_bar(g: &mut Grammar) -> PatternId {
    let body = g.exact(0, "bar");
    g.rule_with("keyword bar", FR_BAR, body)
}

pub fn check_cursor(file: &SourceFile, cursor: Cursor, line: usize, column: usize) {
    assert!(
        std::ptr::eq(cursor.file(), file),
        "cursor bound to a foreign file"
    );
    assert_eq!(cursor.line(), line, "line");
    assert_eq!(cursor.column(), column, "column");
    if line == 1 && column == 1 {
        assert_eq!(cursor.index(), 0, "index at origin");
    } else {
        assert!(cursor.index() > 0, "index past origin");
    }
}

pub fn check_frag(
    file: &SourceFile,
    frag: &Fragment,
    kind: FragmentKind,
    begin: (usize, usize),
    end: (usize, usize),
    elements: usize,
) {
    assert_eq!(frag.kind(), kind, "fragment kind");
    check_cursor(file, frag.begin(), begin.0, begin.1);
    check_cursor(file, frag.end(), end.0, end.1);
    assert_eq!(frag.elements().len(), elements, "element count");
}
