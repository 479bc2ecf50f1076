//! Indented C text emitter.
//!
//! Two spaces per level. Every emitted line is newline-terminated; there
//! is no API for a partial line.

#[derive(Debug, Default)]
pub struct CWriter {
    buf: String,
    indent: usize,
}

impl CWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit one indented, newline-terminated line.
    pub fn line(&mut self, text: impl AsRef<str>) {
        let text = text.as_ref();
        debug_assert!(!text.contains('\n'), "line() takes a single line");
        for _ in 0..self.indent {
            self.buf.push_str("  ");
        }
        self.buf.push_str(text);
        self.buf.push('\n');
    }

    pub fn blank(&mut self) {
        self.buf.push('\n');
    }

    /// `header {`, one level deeper until the matching `close`.
    pub fn open(&mut self, header: impl AsRef<str>) {
        self.line(format!("{} {{", header.as_ref()));
        self.indent += 1;
    }

    pub fn close(&mut self) {
        self.close_with("}");
    }

    /// Close with a custom tail, e.g. `};` for initializer lists.
    pub fn close_with(&mut self, tail: &str) {
        debug_assert!(self.indent > 0, "unbalanced close()");
        self.indent -= 1;
        self.line(tail);
    }

    /// Close the current block and immediately open a sibling one, e.g.
    /// `} else {` or `} else if (cond) {`.
    pub fn chain(&mut self, joint: &str) {
        debug_assert!(self.indent > 0, "unbalanced chain()");
        self.indent -= 1;
        self.line(joint);
        self.indent += 1;
    }

    /// Emit pre-formatted multi-line text verbatim, without indentation.
    pub fn raw(&mut self, text: &str) {
        self.buf.push_str(text);
        if !text.ends_with('\n') {
            self.buf.push('\n');
        }
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn finish(self) -> String {
        debug_assert_eq!(self.indent, 0, "unbalanced block at finish()");
        self.buf
    }
}
