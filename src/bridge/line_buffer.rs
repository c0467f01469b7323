//! Local line editing for exec sessions.
//!
//! Printable input is echoed and held here until a carriage return submits
//! it. A trailing backslash keeps the line open for continuation.

/// What a carriage return did to the buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReturnOutcome {
    /// Line ended with `\`; the buffer now ends with a single space and
    /// editing continues.
    Continue,
    /// Line is complete; the buffer was drained into this string.
    Submit(String),
}

/// Characters typed since the last submitted line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineBuffer {
    text: String,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Append echoed input
    pub fn push_str(&mut self, text: &str) {
        self.text.push_str(text);
    }

    /// Remove the last character, if any
    pub fn pop(&mut self) -> Option<char> {
        self.text.pop()
    }

    pub fn clear(&mut self) {
        self.text.clear();
    }

    /// Apply a carriage return.
    ///
    /// Trailing whitespace is trimmed first. If the line then ends with a
    /// backslash, the backslash and any whitespace before it are replaced by
    /// one space. Otherwise the trimmed line is taken out and the buffer is
    /// left empty.
    pub fn take_return(&mut self) -> ReturnOutcome {
        let trimmed = self.text.trim_end().len();
        self.text.truncate(trimmed);

        if self.text.ends_with('\\') {
            self.text.pop();
            let kept = self.text.trim_end().len();
            self.text.truncate(kept);
            self.text.push(' ');
            return ReturnOutcome::Continue;
        }

        ReturnOutcome::Submit(std::mem::take(&mut self.text))
    }
}
