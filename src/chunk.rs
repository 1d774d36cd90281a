//! Paragraph-boundary text chunker.
//!
//! Splits note text into chunks that respect a character budget. Paragraphs
//! (separated by a blank line) are packed greedily. A paragraph that alone
//! exceeds the budget is packed line by line, and a line that alone exceeds
//! it is packed word by word. Whitespace inside a chunk is kept as written;
//! only the separator at a chunk boundary is dropped. Lengths are counted in
//! characters, not bytes.

const PARAGRAPH_SEP: &str = "\n\n";
const LINE_SEP: &str = "\n";

struct Accumulator {
    chunks: Vec<String>,
    buf: String,
    buf_len: usize,
}

impl Accumulator {
    fn new() -> Self {
        Self {
            chunks: Vec::new(),
            buf: String::new(),
            buf_len: 0,
        }
    }

    /// Length of the buffer if `piece` were appended after `sep`.
    fn would_be(&self, sep: &str, piece_len: usize) -> usize {
        if self.buf.is_empty() {
            piece_len
        } else {
            self.buf_len + sep.chars().count() + piece_len
        }
    }

    fn push(&mut self, sep: &str, piece: &str, piece_len: usize) {
        if !self.buf.is_empty() {
            self.buf.push_str(sep);
            self.buf_len += sep.chars().count();
        }
        self.buf.push_str(piece);
        self.buf_len += piece_len;
    }

    fn flush(&mut self) {
        if !self.buf.is_empty() {
            self.chunks.push(std::mem::take(&mut self.buf));
            self.buf_len = 0;
        }
    }
}

fn push_line(acc: &mut Accumulator, line: &str, budget: usize) {
    let line_len = line.chars().count();
    if line.trim().is_empty() {
        // Blank lines never start a chunk.
        if !acc.buf.is_empty() && acc.would_be(LINE_SEP, line_len) <= budget {
            acc.push(LINE_SEP, line, line_len);
        }
        return;
    }
    if acc.would_be(LINE_SEP, line_len) <= budget {
        acc.push(LINE_SEP, line, line_len);
        return;
    }
    if line_len <= budget {
        acc.flush();
        acc.push(LINE_SEP, line, line_len);
        return;
    }

    for (i, (sep, word)) in words_with_separators(line).into_iter().enumerate() {
        let sep = if i == 0 { LINE_SEP } else { sep };
        let word_len = word.chars().count();
        if acc.would_be(sep, word_len) > budget {
            acc.flush();
        }
        acc.push(sep, word, word_len);
    }
}

/// Split a line into words, each paired with the whitespace run before it.
/// Leading whitespace stays on the first word and trailing whitespace on the
/// last, so only the inner runs can become chunk boundaries.
fn words_with_separators(line: &str) -> Vec<(&str, &str)> {
    let mut spans: Vec<(usize, usize)> = Vec::new();
    let mut start: Option<usize> = None;
    for (i, c) in line.char_indices() {
        match (c.is_whitespace(), start) {
            (false, None) => start = Some(i),
            (true, Some(s)) => {
                spans.push((s, i));
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        spans.push((s, line.len()));
    }
    if spans.is_empty() {
        return vec![("", line)];
    }

    let last = spans.len() - 1;
    spans
        .iter()
        .enumerate()
        .map(|(i, &(s, e))| {
            let prev_end = if i == 0 { 0 } else { spans[i - 1].1 };
            let word_start = if i == 0 { 0 } else { s };
            let word_end = if i == last { line.len() } else { e };
            (&line[prev_end..word_start], &line[word_start..word_end])
        })
        .collect()
}

/// Split `content` into non-empty chunks of at most `budget` characters.
///
/// A chunk only exceeds the budget when it holds a single word longer than
/// the budget. Joining the chunks with the separators they were split on
/// gives back the content, minus whitespace-only paragraphs. Empty or
/// whitespace-only content produces no chunks.
pub fn chunk_content(content: &str, budget: usize) -> Vec<String> {
    let budget = budget.max(1);
    let mut acc = Accumulator::new();

    for para in content.split(PARAGRAPH_SEP) {
        if para.trim().is_empty() {
            continue;
        }
        let para_len = para.chars().count();

        if acc.would_be(PARAGRAPH_SEP, para_len) <= budget {
            acc.push(PARAGRAPH_SEP, para, para_len);
            continue;
        }

        acc.flush();

        if para_len <= budget {
            acc.push(PARAGRAPH_SEP, para, para_len);
            continue;
        }

        for line in para.split(LINE_SEP) {
            push_line(&mut acc, line, budget);
        }
    }

    acc.flush();
    acc.chunks
}
