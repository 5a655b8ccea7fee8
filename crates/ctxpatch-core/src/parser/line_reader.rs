use std::str::Lines;

/// Line source with a single line of pushback.
///
/// `next_line` hands out the pending line again after `unread`, so a reader can
/// peek at the line that ends its block and leave it for the dispatcher.
pub struct PatchLineReader<'a> {
    lines: Lines<'a>,
    current: Option<&'a str>,
    pushed_back: bool,
    line_number: usize,
}

impl<'a> PatchLineReader<'a> {
    pub fn new(content: &'a str) -> Self {
        Self {
            lines: content.lines(),
            current: None,
            pushed_back: false,
            line_number: 0,
        }
    }

    pub fn next_line(&mut self) -> Option<&'a str> {
        if self.pushed_back {
            self.pushed_back = false;
        } else {
            self.current = self.lines.next();
            if self.current.is_some() {
                self.line_number += 1;
            }
        }
        self.current
    }

    pub fn unread(&mut self) {
        self.pushed_back = true;
    }

    /// 1-based number of the line last returned by `next_line`.
    pub fn line_number(&self) -> usize {
        self.line_number
    }
}
