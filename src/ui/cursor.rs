//! Cursor movement and text edits for the input surface.
//!
//! The cursor is a (line, column) pair counted in `char`s. Edits take the
//! current text and return the new text; the caller forwards it to the shell
//! as a document change.

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cursor {
    pub line: usize,
    pub column: usize,
}

impl Cursor {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }

    /// Pull the cursor back inside `text`
    pub fn clamp(&mut self, text: &str) {
        self.line = self.line.min(line_count(text) - 1);
        self.column = self.column.min(line_len(text, self.line));
    }

    /// Char offset of the cursor in `text`
    pub fn offset(&self, text: &str) -> usize {
        let before: usize = text
            .split('\n')
            .take(self.line)
            .map(|l| l.chars().count() + 1)
            .sum();
        before + self.column
    }

    pub fn insert(&mut self, text: &str, ch: char) -> String {
        self.clamp(text);
        let mut buf = [0u8; 4];
        let edited = splice(text, self.offset(text), 0, ch.encode_utf8(&mut buf));
        if ch == '\n' {
            self.line += 1;
            self.column = 0;
        } else {
            self.column += 1;
        }
        edited
    }

    /// Remove the char before the cursor, joining lines at column 0
    pub fn backspace(&mut self, text: &str) -> Option<String> {
        self.clamp(text);
        let offset = self.offset(text);
        if offset == 0 {
            return None;
        }
        if self.column > 0 {
            self.column -= 1;
        } else {
            self.line -= 1;
            self.column = line_len(text, self.line);
        }
        Some(splice(text, offset - 1, 1, ""))
    }

    /// Remove the char under the cursor
    pub fn delete(&mut self, text: &str) -> Option<String> {
        self.clamp(text);
        let offset = self.offset(text);
        if offset >= text.chars().count() {
            return None;
        }
        Some(splice(text, offset, 1, ""))
    }

    pub fn move_left(&mut self, text: &str) {
        self.clamp(text);
        if self.column > 0 {
            self.column -= 1;
        } else if self.line > 0 {
            self.line -= 1;
            self.column = line_len(text, self.line);
        }
    }

    pub fn move_right(&mut self, text: &str) {
        self.clamp(text);
        if self.column < line_len(text, self.line) {
            self.column += 1;
        } else if self.line + 1 < line_count(text) {
            self.line += 1;
            self.column = 0;
        }
    }

    pub fn move_up(&mut self, text: &str) {
        if self.line > 0 {
            self.line -= 1;
        }
        self.clamp(text);
    }

    pub fn move_down(&mut self, text: &str) {
        self.line += 1;
        self.clamp(text);
    }

    pub fn move_home(&mut self) {
        self.column = 0;
    }

    pub fn move_end(&mut self, text: &str) {
        self.clamp(text);
        self.column = line_len(text, self.line);
    }
}

/// Number of lines; an empty text and a trailing newline both count a line
fn line_count(text: &str) -> usize {
    text.split('\n').count()
}

fn line_len(text: &str, line: usize) -> usize {
    text.split('\n').nth(line).map_or(0, |l| l.chars().count())
}

fn splice(text: &str, at: usize, remove: usize, insert: &str) -> String {
    let mut out = String::with_capacity(text.len() + insert.len());
    let mut chars = text.chars();
    out.extend(chars.by_ref().take(at));
    out.push_str(insert);
    out.extend(chars.skip(remove));
    out
}
