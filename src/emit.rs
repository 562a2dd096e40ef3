//! Text emission primitives shared by every synthesizer backend.

/// One generated file: name plus full source text. Artifacts are a pure
/// function of the resolved model — same model, same bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedArtifact {
    pub file_name: String,
    pub source: String,
}

/// Indentation-aware source builder.
pub struct SourceWriter {
    buf: String,
    indent: usize,
}

const INDENT: &str = "    ";

impl SourceWriter {
    pub fn new() -> Self {
        Self {
            buf: String::new(),
            indent: 0,
        }
    }

    pub fn line(&mut self, text: &str) {
        if text.is_empty() {
            self.buf.push('\n');
            return;
        }
        for _ in 0..self.indent {
            self.buf.push_str(INDENT);
        }
        self.buf.push_str(text);
        self.buf.push('\n');
    }

    pub fn blank(&mut self) {
        self.buf.push('\n');
    }

    /// `header {` and one level of indent.
    pub fn open(&mut self, header: &str) {
        self.line(&format!("{header} {{"));
        self.indent += 1;
    }

    pub fn close(&mut self) {
        debug_assert!(self.indent > 0, "unbalanced close");
        self.indent = self.indent.saturating_sub(1);
        self.line("}");
    }

    /// Close with a trailing token, e.g. `});` or `},`.
    pub fn close_with(&mut self, tail: &str) {
        debug_assert!(self.indent > 0, "unbalanced close");
        self.indent = self.indent.saturating_sub(1);
        self.line(&format!("}}{tail}"));
    }

    pub fn into_string(self) -> String {
        self.buf
    }
}

impl Default for SourceWriter {
    fn default() -> Self {
        Self::new()
    }
}
