/// Indentation-aware line buffer for generated source
#[derive(Debug, Clone)]
pub struct CodeWriter {
    buf: String,
    depth: usize,
    unit: &'static str,

    /// Whether each open block has received a statement (comments do not count)
    filled: Vec<bool>,

    /// Written into a block that is closed without statements
    empty_block: Option<&'static str>,
}

impl CodeWriter {
    pub fn new(unit: &'static str) -> Self {
        Self {
            buf: String::new(),
            depth: 0,
            unit,
            filled: Vec::new(),
            empty_block: None,
        }
    }

    /// Four-space indentation, as used by both Python and TypeScript output
    pub fn spaces() -> Self {
        Self::new("    ")
    }

    /// Four-space indentation; blocks left with only comments get `pass`
    pub fn python() -> Self {
        Self::spaces().with_empty_block("pass")
    }

    /// Builder method: statement used to close an otherwise empty block
    pub fn with_empty_block(mut self, statement: &'static str) -> Self {
        self.empty_block = Some(statement);
        self
    }

    pub fn line(&mut self, text: impl AsRef<str>) {
        let text = text.as_ref();
        if !text.is_empty() {
            if let Some(filled) = self.filled.last_mut() {
                *filled = true;
            }
        }
        self.write(text);
    }

    fn write(&mut self, text: &str) {
        if text.is_empty() {
            self.buf.push('\n');
            return;
        }
        for _ in 0..self.depth {
            self.buf.push_str(self.unit);
        }
        self.buf.push_str(text);
        self.buf.push('\n');
    }

    pub fn blank(&mut self) {
        self.blank_lines(1);
    }

    /// Ensure the buffer ends with at least `count` empty lines
    pub fn blank_lines(&mut self, count: usize) {
        if self.buf.is_empty() {
            return;
        }
        let target = "\n".repeat(count + 1);
        while !self.buf.ends_with(&target) {
            self.buf.push('\n');
        }
    }

    /// Prefix every line of a possibly multi-line comment
    pub fn comment(&mut self, prefix: &str, text: &str) {
        for line in text.lines() {
            self.write(format!("{} {}", prefix, line).trim_end());
        }
    }

    pub fn indent(&mut self) {
        self.depth += 1;
        self.filled.push(false);
    }

    pub fn dedent(&mut self) {
        if self.filled.pop() == Some(false) {
            if let Some(statement) = self.empty_block {
                self.write(statement);
            }
        }
        self.depth = self.depth.saturating_sub(1);
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Length of the buffer, for detecting empty blocks
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn finish(self) -> String {
        self.buf
    }
}

/// Double-quoted string literal valid in TypeScript, Python and Mermaid labels
pub fn quote(text: &str) -> String {
    serde_json::to_string(text).unwrap_or_else(|_| format!("\"{}\"", text.replace('"', "'")))
}
