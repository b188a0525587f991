//! A configurable textual rendering of fragment trees.

use std::io;

use crate::fragment::Fragment;

/// Per-fragment override hook: returns an optional head replacing the
/// default rendering and, for constructs, an optional body that replaces
/// the recursive child block entirely.
pub type FormatFn<'o> = &'o dyn Fn(&Fragment<'_, '_>) -> (Option<String>, Option<String>);

/// Options for [`print_fragment`].
///
/// With an empty `indentation` the tree renders flat on one line, with a
/// single space standing in for every break.
///
/// [`print_fragment`]: fn.print_fragment.html
pub struct PrintOptions<'o> {
    /// Written once per nesting level in front of every line.
    pub indentation: &'o str,
    /// Written at the very start and after every line break.
    pub prefix: &'o str,
    /// The line separator; ignored while `indentation` is empty.
    pub line_break: &'o str,
    /// Optional per-fragment head/body override.
    pub format: Option<FormatFn<'o>>,
}

impl<'o> Default for PrintOptions<'o> {
    fn default() -> Self {
        PrintOptions {
            indentation: "",
            prefix: "",
            line_break: "\n",
            format: None,
        }
    }
}

/// Prints the fragment tree recursively, returning the number of bytes
/// written.
pub fn print_fragment(
    fragment: &Fragment<'_, '_>,
    out: &mut dyn io::Write,
    options: &PrintOptions<'_>,
) -> io::Result<usize> {
    let mut printer = Printer {
        out,
        options,
        written: 0,
    };
    printer.write(options.prefix)?;
    printer.fragment(0, fragment)?;
    Ok(printer.written)
}

struct Printer<'p, 'o> {
    out: &'p mut dyn io::Write,
    options: &'p PrintOptions<'o>,
    written: usize,
}

impl<'p, 'o> Printer<'p, 'o> {
    fn write(&mut self, snippet: &str) -> io::Result<()> {
        self.out.write_all(snippet.as_bytes())?;
        self.written += snippet.len();
        Ok(())
    }

    fn line_break(&mut self) -> io::Result<()> {
        if self.options.indentation.is_empty() {
            return self.write(" ");
        }
        self.write(self.options.line_break)?;
        self.write(self.options.prefix)
    }

    fn indent(&mut self, level: usize) -> io::Result<()> {
        if self.options.indentation.is_empty() {
            return Ok(());
        }
        for _ in 0..level {
            self.write(self.options.indentation)?;
        }
        Ok(())
    }

    fn fragment(&mut self, level: usize, fragment: &Fragment<'_, '_>) -> io::Result<()> {
        self.indent(level)?;

        let (head, body) = match self.options.format {
            Some(format) => format(fragment),
            None => (None, None),
        };
        match head {
            Some(head) => self.write(&head)?,
            None => self.write(&fragment.to_string())?,
        }

        let construct = match fragment {
            Fragment::Token(_) => return Ok(()),
            Fragment::Construct(construct) => construct,
        };
        if let Some(body) = body {
            return self.write(&body);
        }

        self.write(" {")?;
        self.line_break()?;
        for element in construct.elements() {
            self.fragment(level + 1, element)?;
            self.line_break()?;
        }
        self.indent(level)?;
        self.write("}")
    }
}
