//! Byte-offset to line/column translation.

use std::fmt;

/// Zero-based line and byte-column. Rendered one-based, the way every file
/// diagnostic tool indexes lines and columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct LineColumn {
    pub line: usize,
    /// Byte offset within the line, not a character count.
    pub column: usize,
}

impl fmt::Display for LineColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line + 1, self.column + 1)
    }
}

/// Records the byte offset of every line start, which makes offset-to-position
/// translation a binary search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineColumnMap {
    line_offsets: Vec<usize>,
}

impl LineColumnMap {
    /// The first line always starts at offset 0; every `\n` opens a new line
    /// just past itself. A missing final newline is not synthesized.
    pub fn new(text: &str) -> Self {
        let mut line_offsets = vec![0];
        for (pos, byte) in text.bytes().enumerate() {
            if byte == b'\n' {
                line_offsets.push(pos + 1);
            }
        }
        Self { line_offsets }
    }

    /// Reconstructs the map from already-split lines, assuming one `\n`
    /// separator between each.
    pub fn from_lines<S: AsRef<str>>(lines: &[S]) -> Self {
        let mut line_offsets = Vec::with_capacity(lines.len().max(1));
        let mut offset = 0;
        for line in lines {
            line_offsets.push(offset);
            offset += line.as_ref().len() + 1;
        }
        if line_offsets.is_empty() {
            line_offsets.push(0);
        }
        Self { line_offsets }
    }

    pub fn line_offsets(&self) -> &[usize] {
        &self.line_offsets
    }

    /// Byte offset at which `line` begins, clamped to the last recorded line.
    pub fn start_of_line(&self, line: usize) -> usize {
        let index = line.min(self.line_offsets.len() - 1);
        self.line_offsets[index]
    }

    /// Translate a byte offset to line and byte-column by finding the
    /// greatest line start at or before the offset.
    pub fn lookup(&self, offset: usize) -> LineColumn {
        let line = self.line_offsets.partition_point(|&start| start <= offset) - 1;
        LineColumn {
            line,
            column: offset - self.line_offsets[line],
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_empty_text_has_one_line() {
        let map = LineColumnMap::new("");
        assert_eq!(&[0], map.line_offsets());
        assert_eq!(LineColumn { line: 0, column: 0 }, map.lookup(0));
    }

    #[test]
    fn test_no_trailing_newline_is_not_synthesized() {
        let map = LineColumnMap::new("abc");
        assert_eq!(&[0], map.line_offsets());
        assert_eq!(LineColumn { line: 0, column: 2 }, map.lookup(2));
    }

    #[test]
    fn test_lines_start_after_each_newline() {
        let map = LineColumnMap::new("ab\ncd\n");
        assert_eq!(&[0, 3, 6], map.line_offsets());
        assert_eq!(LineColumn { line: 0, column: 0 }, map.lookup(0));
        assert_eq!(LineColumn { line: 0, column: 2 }, map.lookup(2));
        assert_eq!(LineColumn { line: 1, column: 0 }, map.lookup(3));
        assert_eq!(LineColumn { line: 1, column: 2 }, map.lookup(5));
        assert_eq!(LineColumn { line: 2, column: 0 }, map.lookup(6));
    }

    #[test]
    fn test_start_of_line_clamps_past_the_end() {
        let map = LineColumnMap::new("ab\ncd");
        assert_eq!(0, map.start_of_line(0));
        assert_eq!(3, map.start_of_line(1));
        assert_eq!(3, map.start_of_line(99));
    }

    #[test]
    fn test_display_is_one_based() {
        let map = LineColumnMap::new("ab\ncd");
        assert_eq!("2:2", format!("{}", map.lookup(4)));
    }

    #[test]
    fn test_rebuilding_from_lines_is_idempotent() {
        let text = "one\ntwo\nthree\n";
        let direct = LineColumnMap::new(text);
        let lines: Vec<&str> = text.split('\n').collect();
        // split() yields a trailing empty line after the final \n; the
        // vector constructor must produce the identical offset list.
        let rebuilt = LineColumnMap::from_lines(&lines);
        assert_eq!(direct, rebuilt);
    }
}
