//! Emission buffer for generated C code.
//!
//! The [`EmissionBuffer`] holds the ordered fragments of one method: plain
//! code lines and frame-dependent placeholders. Nothing is turned into text
//! until the stack-growth decision is final.
//!
//! # Example
//!
//! ```ignore
//! let mut buffer = EmissionBuffer::new();
//! buffer.frame(1, FrameToken::Acquire);
//! buffer.code(1, "ZEPHIR_INIT_VAR(&s);");
//! buffer.frame(1, FrameToken::Return(ReturnMacro::Null));
//!
//! let mut growth = StackGrowth::new();
//! growth.request();
//! let body = growth.finalize(buffer);
//! ```

mod frame;

pub use frame::{FinalizedBody, FrameToken, ReturnMacro, StackGrowth};

/// What a fragment contains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FragmentKind {
    Code(String),
    Frame(FrameToken),
    Blank,
}

/// One line of output at a given indentation depth.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub indent: usize,
    pub kind: FragmentKind,
}

/// Ordered fragments of a method being compiled.
#[derive(Debug, Clone, Default)]
pub struct EmissionBuffer {
    fragments: Vec<Fragment>,
}

impl EmissionBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a line of code.
    pub fn code(&mut self, indent: usize, text: impl Into<String>) {
        self.fragments.push(Fragment {
            indent,
            kind: FragmentKind::Code(text.into()),
        });
    }

    /// Append a frame-dependent placeholder.
    pub fn frame(&mut self, indent: usize, token: FrameToken) {
        self.fragments.push(Fragment {
            indent,
            kind: FragmentKind::Frame(token),
        });
    }

    pub fn blank(&mut self) {
        self.fragments.push(Fragment {
            indent: 0,
            kind: FragmentKind::Blank,
        });
    }

    /// Append lines, each at `indent`.
    pub fn code_lines<I, S>(&mut self, indent: usize, lines: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for line in lines {
            self.code(indent, line);
        }
    }

    /// Move all fragments of `other` to the end of this buffer.
    pub fn append(&mut self, other: EmissionBuffer) {
        self.fragments.extend(other.fragments);
    }

    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// All placeholders, in emission order.
    pub fn frame_tokens(&self) -> impl Iterator<Item = &FrameToken> {
        self.fragments.iter().filter_map(|f| match &f.kind {
            FragmentKind::Frame(token) => Some(token),
            _ => None,
        })
    }

    /// Render every fragment with the given frame decision.
    ///
    /// Dropped placeholders leave no line behind.
    pub fn render(&self, grown: bool) -> String {
        let mut out = String::new();
        for fragment in &self.fragments {
            let text = match &fragment.kind {
                FragmentKind::Code(text) => text.clone(),
                FragmentKind::Frame(token) => match token.render(grown) {
                    Some(text) => text,
                    None => continue,
                },
                FragmentKind::Blank => {
                    out.push('\n');
                    continue;
                }
            };
            for _ in 0..fragment.indent {
                out.push('\t');
            }
            out.push_str(&text);
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_buffer_is_empty() {
        let buffer = EmissionBuffer::new();
        assert!(buffer.is_empty());
        assert_eq!(buffer.render(true), "");
    }

    #[test]
    fn indentation_uses_tabs() {
        let mut buffer = EmissionBuffer::new();
        buffer.code(0, "if (x) {");
        buffer.code(2, "y = 1;");
        buffer.blank();
        assert_eq!(buffer.render(false), "if (x) {\n\t\ty = 1;\n\n");
    }

    #[test]
    fn append_preserves_order() {
        let mut head = EmissionBuffer::new();
        head.code(0, "a;");
        let mut tail = EmissionBuffer::new();
        tail.frame(0, FrameToken::Restore);
        tail.code(0, "b;");
        head.append(tail);

        assert_eq!(head.len(), 3);
        assert_eq!(head.frame_tokens().count(), 1);
        assert_eq!(head.render(true), "a;\nZEPHIR_MM_RESTORE();\nb;\n");
    }
}
