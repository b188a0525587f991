//! A JSON grammar declared against the parsing engine.
//!
//! Reads a JSON document from the first argument or stdin and prints the
//! resulting fragment tree, or the positioned parse error.

use std::io::Read;

use bumpalo::Bump;
use descant::{
    print_fragment, Cursor, Fragment, FragmentKind, Grammar, Parser, PatternId, PrintOptions,
    SourceFile,
};

const WHITESPACE: FragmentKind = 1;
const LBRACE: FragmentKind = 2;
const RBRACE: FragmentKind = 3;
const LBRACKET: FragmentKind = 4;
const RBRACKET: FragmentKind = 5;
const COLON: FragmentKind = 6;
const COMMA: FragmentKind = 7;
const QUOTE: FragmentKind = 8;
const STRING_CHARS: FragmentKind = 9;
const ESCAPE: FragmentKind = 10;
const NUMBER: FragmentKind = 11;
const BOOLEAN: FragmentKind = 12;
const NULL: FragmentKind = 13;
const STRING: FragmentKind = 14;
const VALUE: FragmentKind = 15;
const MEMBER: FragmentKind = 16;
const OBJECT: FragmentKind = 17;
const ARRAY: FragmentKind = 18;
const DOCUMENT: FragmentKind = 19;

fn kind_name(kind: FragmentKind) -> &'static str {
    match kind {
        WHITESPACE => "whitespace",
        LBRACE => "'{'",
        RBRACE => "'}'",
        LBRACKET => "'['",
        RBRACKET => "']'",
        COLON => "':'",
        COMMA => "','",
        QUOTE => "quote",
        STRING_CHARS => "chars",
        ESCAPE => "escape",
        NUMBER => "number",
        BOOLEAN => "boolean",
        NULL => "null",
        STRING => "string",
        VALUE => "value",
        MEMBER => "member",
        OBJECT => "object",
        ARRAY => "array",
        DOCUMENT => "document",
        _ => "?",
    }
}

fn is_number_scalar(ix: usize, cr: Cursor) -> bool {
    match cr.scalar() {
        Some(c) if c.is_ascii_digit() => true,
        Some('-') => ix == 0,
        Some('.' | '+' | 'e' | 'E') => ix > 0,
        _ => false,
    }
}

/// `string = '"' (chars | escape)* '"'`, with `chars` a run of anything
/// except quotes and backslashes, and `escape` a backslash followed by one
/// scalar.
fn string_rule(g: &mut Grammar) -> PatternId {
    let open = g.exact(QUOTE, "\"");
    let close = g.exact(QUOTE, "\"");
    let chars = g.lexed(STRING_CHARS, "string characters", 1, |_, cr| {
        !matches!(cr.scalar(), None | Some('"' | '\\'))
    });
    let backslash = g.exact(ESCAPE, "\\");
    let escaped = g.lexed(STRING_CHARS, "escaped character", 1, |ix, _| ix == 0);
    let escape = g.sequence(vec![backslash, escaped]);
    let piece = g.either(vec![chars, escape]);
    let pieces = g.repeated(0, 0, piece);
    let body = g.sequence(vec![open, pieces, close]);
    g.rule_with("string", STRING, body)
}

fn grammar() -> (Grammar, PatternId) {
    let mut g = Grammar::new();

    let ws = g.lexed(WHITESPACE, "whitespace", 1, |_, cr| {
        matches!(cr.scalar(), Some(' ' | '\t' | '\n' | '\r'))
    });
    let ws_opt = g.repeated(0, 1, ws);

    let value = g.rule("value", VALUE);
    let string = string_rule(&mut g);
    let number = g.lexed(NUMBER, "number", 1, is_number_scalar);
    let true_lit = g.exact(BOOLEAN, "true");
    let false_lit = g.exact(BOOLEAN, "false");
    let null_lit = g.exact(NULL, "null");

    // member = string ws? ':' ws? value
    let colon = g.exact(COLON, ":");
    let member_body = g.sequence(vec![string, ws_opt, colon, ws_opt, value]);
    let member = g.rule_with("object member", MEMBER, member_body);

    // object = '{' ws? (member (ws? ',' ws? member)*)? ws? '}'
    let lbrace = g.exact(LBRACE, "{");
    let rbrace = g.exact(RBRACE, "}");
    let comma = g.exact(COMMA, ",");
    let member_tail = g.sequence(vec![ws_opt, comma, ws_opt, member]);
    let member_tails = g.repeated(0, 0, member_tail);
    let members = g.sequence(vec![member, member_tails]);
    let members_opt = g.repeated(0, 1, members);
    let object_body = g.sequence(vec![lbrace, ws_opt, members_opt, ws_opt, rbrace]);
    let object = g.rule_with("object", OBJECT, object_body);

    // array = '[' ws? (value (ws? ',' ws? value)*)? ws? ']'
    let lbracket = g.exact(LBRACKET, "[");
    let rbracket = g.exact(RBRACKET, "]");
    let comma2 = g.exact(COMMA, ",");
    let element_tail = g.sequence(vec![ws_opt, comma2, ws_opt, value]);
    let element_tails = g.repeated(0, 0, element_tail);
    let elements = g.sequence(vec![value, element_tails]);
    let elements_opt = g.repeated(0, 1, elements);
    let array_body = g.sequence(vec![lbracket, ws_opt, elements_opt, ws_opt, rbracket]);
    let array = g.rule_with("array", ARRAY, array_body);

    let value_body = g.either(vec![
        object, array, string, number, true_lit, false_lit, null_lit,
    ]);
    g.define(value, value_body);

    // document = ws? value ws?
    let document_body = g.sequence(vec![ws_opt, value, ws_opt]);
    let document = g.rule_with("JSON document", DOCUMENT, document_body);

    (g, document)
}

fn main() {
    let args = std::env::args().collect::<Vec<_>>();
    let input = match args.get(1) {
        Some(arg) if arg == "-h" || arg == "--help" => {
            println!("usage: {} <json>", &args[0]);
            return;
        }
        Some(arg) => arg.to_owned(),
        None => {
            let mut input = String::new();
            std::io::stdin()
                .lock()
                .read_to_string(&mut input)
                .expect("reading stdin");
            input
        }
    };

    let (g, document) = grammar();
    let parser = Parser::new(g, document, None).expect("valid JSON grammar");

    let file = SourceFile::new("<stdin>", &input);
    let bump = Bump::new();
    match parser.parse(&file, &bump) {
        Ok(tree) => {
            let format = |frag: &Fragment| -> (Option<String>, Option<String>) {
                let head = match frag {
                    Fragment::Token(tk) => format!("{} '{}'", kind_name(tk.kind()), tk.text()),
                    Fragment::Construct(ct) => kind_name(ct.kind()).to_string(),
                };
                (Some(head), None)
            };
            let mut out = std::io::stdout().lock();
            print_fragment(
                &tree,
                &mut out,
                &PrintOptions {
                    indentation: "  ",
                    format: Some(&format),
                    ..PrintOptions::default()
                },
            )
            .expect("writing the tree");
            println!();
        }
        Err(err) => {
            eprintln!("{}", err);
            std::process::exit(1);
        }
    }
}
