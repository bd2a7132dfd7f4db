//! Resumable tokenizer state machine.
//!
//! A comment character finalizes whatever was accumulated for the current
//! field, then discards the rest of the line; a lone zero-length field is
//! how a blank line collapses to zero fields. This type owns a copy of the
//! current chunk (`Vec<u32>`) rather than borrowing it, since the source
//! chunk is only guaranteed to live until the next `next_chunk()` call.

use crate::config::ParserConfig;
use crate::error::ReaderError;
use crate::stream::{ChunkSource, ChunkStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Init,
    Unquoted,
    Quoted,
    QuotedCheckDoubleQuote,
    Whitespace,
    CheckComment,
    FinalizeLine,
    EatCrlf,
    FinalizeFile,
    /// Used only by [`TokenizerState::skip_line`], never by [`TokenizerState::next_row`].
    #[allow(dead_code)]
    GotoLineEnd,
}

/// One entry in the fields index: the code-point offset (into the field
/// buffer) where this field starts, and whether it was quoted.
#[derive(Debug, Clone, Copy)]
struct FieldInfo {
    offset: usize,
    quoted: bool,
}

/// Mutable, per-read-session tokenizer state.
///
/// One instance is driven across an entire `read()` call: [`next_row`]
/// returns one logical row per successful call, resuming internally across
/// as many chunk fetches as the row requires.
pub struct TokenizerState {
    state: State,
    /// Code points accumulated for the row currently being assembled.
    field_buf: Vec<u32>,
    /// `num_fields + 1` entries while building (see module docs).
    fields: Vec<FieldInfo>,
    num_fields: usize,
    current_quoted: bool,

    /// Copy of the chunk currently being scanned.
    chunk: Vec<u32>,
    pos: usize,
    chunk_status: ChunkStatus,
    /// Set once a `FileEnd` chunk has been fully consumed; no further
    /// `next_chunk` calls are made after that.
    at_eof: bool,

    /// Second byte of a two-character comment marker. Never set by any
    /// public configuration surface today (see DESIGN.md's Open Question
    /// decision); present so the `CheckComment` state has real behavior to
    /// exercise in tests.
    comment_second: Option<u32>,
}

impl Default for TokenizerState {
    fn default() -> Self {
        TokenizerState::new()
    }
}

impl TokenizerState {
    pub fn new() -> Self {
        TokenizerState {
            state: State::Init,
            field_buf: Vec::new(),
            fields: vec![FieldInfo { offset: 0, quoted: false }],
            num_fields: 0,
            current_quoted: false,
            chunk: Vec::new(),
            pos: 0,
            chunk_status: ChunkStatus::MayContainNewline,
            at_eof: false,
            comment_second: None,
        }
    }

    #[cfg(test)]
    pub(crate) fn set_comment_second(&mut self, second: Option<u32>) {
        self.comment_second = second;
    }

    /// Number of fields in the most recently produced row.
    pub fn num_fields(&self) -> usize {
        self.num_fields
    }

    /// Code points of field `i` of the most recently produced row.
    pub fn field(&self, i: usize) -> &[u32] {
        let start = self.fields[i].offset;
        let end = self.fields[i + 1].offset - 1;
        &self.field_buf[start..end]
    }

    /// Whether field `i` of the most recently produced row was quoted.
    pub fn field_quoted(&self, i: usize) -> bool {
        self.fields[i].quoted
    }

    fn reset_row(&mut self) {
        self.field_buf.clear();
        self.fields.clear();
        self.fields.push(FieldInfo { offset: 0, quoted: false });
        self.num_fields = 0;
        self.current_quoted = false;
        self.state = State::Init;
    }

    fn finalize_field(&mut self) {
        self.field_buf.push(0);
        self.fields[self.num_fields].quoted = self.current_quoted;
        self.num_fields += 1;
        self.fields.push(FieldInfo {
            offset: self.field_buf.len(),
            quoted: false,
        });
        self.current_quoted = false;
    }

    /// The extra reserved NUL beyond the last field's own terminator,
    /// matching the "two trailing NUL cells always present" invariant.
    fn close_row_buffer(&mut self) {
        self.field_buf.push(0);
    }

    /// A row with exactly one unquoted, zero-length field is how a blank
    /// line is represented; collapse it to zero fields.
    fn apply_blank_line_elision(&mut self) {
        if self.num_fields == 1 && !self.fields[0].quoted && self.field(0).is_empty() {
            self.num_fields = 0;
        }
    }

    /// Ensures at least one more code point is available at `self.pos`,
    /// fetching further chunks from `source` as needed. Returns `false`
    /// only when the stream is genuinely exhausted.
    fn ensure_chunk<S: ChunkSource>(&mut self, source: &mut S) -> Result<bool, ReaderError> {
        loop {
            if self.pos < self.chunk.len() {
                return Ok(true);
            }
            if self.at_eof {
                return Ok(false);
            }
            let chunk = source.next_chunk()?;
            self.chunk.clear();
            self.chunk.extend_from_slice(chunk.data);
            self.pos = 0;
            self.chunk_status = chunk.status;
            if chunk.status == ChunkStatus::FileEnd {
                self.at_eof = true;
            }
            if self.chunk.is_empty() {
                if self.at_eof {
                    return Ok(false);
                }
                continue;
            }
            return Ok(true);
        }
    }

    fn peek<S: ChunkSource>(&mut self, source: &mut S) -> Result<Option<u32>, ReaderError> {
        if !self.ensure_chunk(source)? {
            return Ok(None);
        }
        Ok(Some(self.chunk[self.pos]))
    }

    /// Drives the state machine until one logical row has been assembled.
    /// Returns `Ok(false)` when there is no more data at all (the stream
    /// was already exhausted between rows).
    pub fn next_row<S: ChunkSource>(
        &mut self,
        source: &mut S,
        config: &ParserConfig,
    ) -> Result<bool, ReaderError> {
        self.reset_row();

        let whitespace_mode = config.delimiter_is_whitespace();
        let delim = if whitespace_mode {
            ' ' as u32
        } else {
            config.delimiter.expect("checked by delimiter_is_whitespace")
        };
        let after_field_state = if whitespace_mode { State::Whitespace } else { State::Init };

        loop {
            match self.state {
                State::Init => {
                    if config.ignore_leading_whitespace {
                        loop {
                            match self.peek(source)? {
                                Some(c) if c == ' ' as u32 => {
                                    self.pos += 1;
                                }
                                _ => break,
                            }
                        }
                    }
                    match self.peek(source)? {
                        None => {
                            if self.num_fields == 0 {
                                return Ok(false);
                            }
                            self.finalize_field();
                            self.state = State::FinalizeFile;
                        }
                        Some(c) if c == config.quote => {
                            self.pos += 1;
                            self.current_quoted = true;
                            self.state = State::Quoted;
                        }
                        Some(_) => {
                            self.state = State::Unquoted;
                        }
                    }
                }

                State::Whitespace => loop {
                    match self.peek(source)? {
                        Some(c) if c == ' ' as u32 => {
                            self.pos += 1;
                        }
                        _ => {
                            self.state = State::Init;
                            break;
                        }
                    }
                },

                State::Unquoted => self.scan_unquoted(source, config, delim, after_field_state)?,

                State::Quoted => self.scan_quoted(source, config)?,

                State::QuotedCheckDoubleQuote => match self.peek(source)? {
                    Some(c) if c == config.quote => {
                        self.pos += 1;
                        self.field_buf.push(config.quote);
                        self.state = State::Quoted;
                    }
                    _ => {
                        self.state = State::Unquoted;
                    }
                },

                State::CheckComment => {
                    if self.comment_second.is_none() {
                        // Single-byte dialect: the marker was already fully
                        // matched by the one comment byte consumed in Unquoted.
                        self.finalize_field();
                        self.state = State::FinalizeLine;
                    } else {
                        match self.peek(source)? {
                            Some(c) if Some(c) == self.comment_second => {
                                self.pos += 1;
                                self.finalize_field();
                                self.state = State::FinalizeLine;
                            }
                            _ => {
                                // Not actually a comment marker: the byte we
                                // provisionally consumed is literal data.
                                self.field_buf.push(config.comment.expect("comment set"));
                                self.state = State::Unquoted;
                            }
                        }
                    }
                }

                State::FinalizeLine => loop {
                    match self.peek(source)? {
                        None => {
                            self.state = State::FinalizeFile;
                            break;
                        }
                        Some(c) if is_newline(c) => {
                            self.state = State::EatCrlf;
                            break;
                        }
                        Some(_) => {
                            self.pos += 1;
                        }
                    }
                },

                State::EatCrlf => {
                    if let Some(c) = self.peek(source)? {
                        if c == '\r' as u32 {
                            self.pos += 1;
                            if let Some(c2) = self.peek(source)? {
                                if c2 == '\n' as u32 {
                                    self.pos += 1;
                                }
                            }
                        } else if c == '\n' as u32 {
                            self.pos += 1;
                        }
                    }
                    self.close_row_buffer();
                    self.apply_blank_line_elision();
                    if self.num_fields == 0 {
                        // Blank or comment-only line: not a row, keep scanning.
                        self.reset_row();
                        continue;
                    }
                    return Ok(true);
                }

                State::FinalizeFile => {
                    self.close_row_buffer();
                    self.apply_blank_line_elision();
                    if self.num_fields == 0 {
                        return Ok(false);
                    }
                    return Ok(true);
                }

                State::GotoLineEnd => unreachable!("GotoLineEnd is only driven by skip_line"),
            }
        }
    }

    fn scan_unquoted<S: ChunkSource>(
        &mut self,
        source: &mut S,
        config: &ParserConfig,
        delim: u32,
        after_field_state: State,
    ) -> Result<(), ReaderError> {
        loop {
            if !self.ensure_chunk(source)? {
                self.finalize_field();
                self.state = State::FinalizeFile;
                return Ok(());
            }
            let len = self.chunk.len();
            let start = self.pos;
            while self.pos < len {
                let c = self.chunk[self.pos];
                if c == delim || is_newline(c) || config.comment == Some(c) {
                    break;
                }
                self.pos += 1;
            }
            if self.pos > start {
                self.field_buf.extend_from_slice(&self.chunk[start..self.pos]);
            }
            if self.pos == len {
                continue;
            }

            let c = self.chunk[self.pos];
            if c == delim {
                self.pos += 1;
                self.finalize_field();
                self.state = after_field_state;
                return Ok(());
            }
            if config.comment == Some(c) {
                self.pos += 1;
                if self.comment_second.is_some() {
                    self.state = State::CheckComment;
                } else {
                    self.finalize_field();
                    self.state = State::FinalizeLine;
                }
                return Ok(());
            }
            // Newline: field ends, row ends; EatCrlf consumes the terminator.
            self.finalize_field();
            self.state = State::EatCrlf;
            return Ok(());
        }
    }

    fn scan_quoted<S: ChunkSource>(
        &mut self,
        source: &mut S,
        config: &ParserConfig,
    ) -> Result<(), ReaderError> {
        loop {
            if !self.ensure_chunk(source)? {
                self.finalize_field();
                self.state = State::FinalizeFile;
                return Ok(());
            }
            let len = self.chunk.len();
            let start = self.pos;
            while self.pos < len {
                let c = self.chunk[self.pos];
                if c == config.quote {
                    break;
                }
                if is_newline(c) && !config.allow_embedded_newline {
                    break;
                }
                self.pos += 1;
            }
            if self.pos > start {
                self.field_buf.extend_from_slice(&self.chunk[start..self.pos]);
            }
            if self.pos == len {
                continue;
            }

            let c = self.chunk[self.pos];
            if c == config.quote {
                self.pos += 1;
                self.state = State::QuotedCheckDoubleQuote;
                return Ok(());
            }
            // Newline with embedded newlines disallowed: close field, end row.
            self.finalize_field();
            self.state = State::EatCrlf;
            return Ok(());
        }
    }

    /// Discards one line of input without building any fields from it,
    /// used to implement `skiprows`. Returns `false` only when there was
    /// no more data to skip at all.
    pub fn skip_line<S: ChunkSource>(&mut self, source: &mut S) -> Result<bool, ReaderError> {
        if !self.ensure_chunk(source)? {
            return Ok(false);
        }
        loop {
            if !self.ensure_chunk(source)? {
                return Ok(true);
            }
            let c = self.chunk[self.pos];
            self.pos += 1;
            if c == '\n' as u32 {
                return Ok(true);
            }
            if c == '\r' as u32 {
                if let Some(c2) = self.peek(source)? {
                    if c2 == '\n' as u32 {
                        self.pos += 1;
                    }
                }
                return Ok(true);
            }
        }
    }
}

fn is_newline(c: u32) -> bool {
    c == '\n' as u32 || c == '\r' as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::Chunk;

    /// A `ChunkSource` fed from a fixed list of pre-split chunks, for tests
    /// that need to pin exact chunk boundaries. `NoNewline`/`MayContainNewline`
    /// status per chunk is driven by the `newline_aware` flag on each entry.
    struct FixedChunks {
        chunks: Vec<(Vec<u32>, ChunkStatus)>,
        idx: usize,
    }

    impl FixedChunks {
        fn new(parts: &[&str]) -> Self {
            FixedChunks {
                chunks: parts
                    .iter()
                    .map(|s| (s.chars().map(|c| c as u32).collect(), ChunkStatus::MayContainNewline))
                    .collect(),
                idx: 0,
            }
        }
    }

    impl ChunkSource for FixedChunks {
        fn next_chunk(&mut self) -> Result<Chunk<'_>, ReaderError> {
            if self.idx >= self.chunks.len() {
                return Ok(Chunk { data: &[], status: ChunkStatus::FileEnd });
            }
            let (data, status) = &self.chunks[self.idx];
            self.idx += 1;
            Ok(Chunk { data, status: *status })
        }
    }

    fn fields(tok: &TokenizerState) -> Vec<String> {
        (0..tok.num_fields())
            .map(|i| tok.field(i).iter().filter_map(|&c| char::from_u32(c)).collect())
            .collect()
    }

    fn run_all(input: &str, config: &ParserConfig) -> Vec<Vec<String>> {
        let mut source = FixedChunks::new(&[input]);
        let mut tok = TokenizerState::new();
        let mut rows = Vec::new();
        while tok.next_row(&mut source, config).unwrap() {
            rows.push(fields(&tok));
        }
        rows
    }

    #[test]
    fn simple_rows() {
        let rows = run_all("1,2,3\n4,5,6\n", &ParserConfig::default());
        assert_eq!(rows, vec![vec!["1", "2", "3"], vec!["4", "5", "6"]]);
    }

    #[test]
    fn blank_line_is_elided() {
        let rows = run_all("1,2,3\n\n4,5,6\n", &ParserConfig::default());
        assert_eq!(rows, vec![vec!["1", "2", "3"], vec!["4", "5", "6"]]);
    }

    #[test]
    fn quoted_field_with_embedded_comma_and_doubled_quote() {
        let rows = run_all(
            "12.3,\"New York, NY\",\"3'2\"\"\"\n",
            &ParserConfig::default(),
        );
        assert_eq!(rows, vec![vec!["12.3", "New York, NY", "3'2\""]]);
    }

    #[test]
    fn closing_quote_then_trailing_chars() {
        let rows = run_all("12.3,\"ABC\"DEF,XY\"Z\n", &ParserConfig::default());
        assert_eq!(rows, vec![vec!["12.3", "ABCDEF", "XY\"Z"]]);
    }

    #[test]
    fn universal_newlines() {
        let cfg = ParserConfig::default();
        assert_eq!(run_all("a,b\nc,d\n", &cfg), run_all("a,b\rc,d\r", &cfg));
        assert_eq!(run_all("a,b\nc,d\n", &cfg), run_all("a,b\r\nc,d\r\n", &cfg));
    }

    #[test]
    fn no_trailing_newline_still_closes_row() {
        let rows = run_all("a,b\nc,d", &ParserConfig::default());
        assert_eq!(rows, vec![vec!["a", "b"], vec!["c", "d"]]);
    }

    #[test]
    fn trailing_delimiter_then_eof_adds_empty_field() {
        let rows = run_all("1,2,", &ParserConfig::default());
        assert_eq!(rows, vec![vec!["1", "2", ""]]);
    }

    #[test]
    fn mid_row_eof_inside_quotes_closes_field_as_quoted() {
        let mut source = FixedChunks::new(&["a,\"unterminated"]);
        let mut tok = TokenizerState::new();
        assert!(tok.next_row(&mut source, &ParserConfig::default()).unwrap());
        assert_eq!(fields(&tok), vec!["a", "unterminated"]);
        assert!(tok.field_quoted(1));
        assert!(!tok.next_row(&mut source, &ParserConfig::default()).unwrap());
    }

    #[test]
    fn comment_line_is_elided() {
        let mut cfg = ParserConfig::default();
        cfg.delimiter = None;
        cfg.ignore_leading_whitespace = true;
        let rows = run_all("# header\n1 2 3\n4 5 6\n", &cfg);
        assert_eq!(rows, vec![vec!["1", "2", "3"], vec!["4", "5", "6"]]);
    }

    #[test]
    fn comment_mid_line_ends_row_keeping_prior_field_content() {
        let rows = run_all("1,2#trailing comment\n3,4\n", &ParserConfig::default());
        assert_eq!(rows, vec![vec!["1", "2"], vec!["3", "4"]]);
    }

    #[test]
    fn two_char_comment_marker_capability() {
        let mut cfg = ParserConfig::default();
        cfg.comment = Some('-' as u32);
        let mut tok = TokenizerState::new();
        tok.set_comment_second(Some('-' as u32));
        let mut source = FixedChunks::new(&["a,b--comment\nc,d\n"]);
        assert!(tok.next_row(&mut source, &cfg).unwrap());
        assert_eq!(fields(&tok), vec!["a", "b"]);
        assert!(tok.next_row(&mut source, &cfg).unwrap());
        assert_eq!(fields(&tok), vec!["c", "d"]);
    }

    #[test]
    fn single_dash_is_not_a_comment_when_second_byte_required() {
        let mut cfg = ParserConfig::default();
        cfg.comment = Some('-' as u32);
        let mut tok = TokenizerState::new();
        tok.set_comment_second(Some('-' as u32));
        let mut source = FixedChunks::new(&["a-b,c\n"]);
        assert!(tok.next_row(&mut source, &cfg).unwrap());
        assert_eq!(fields(&tok), vec!["a-b", "c"]);
    }

    #[test]
    fn whitespace_delimited_dialect() {
        let mut cfg = ParserConfig::default();
        cfg.delimiter = None;
        cfg.ignore_leading_whitespace = true;
        let rows = run_all("1   2 3\n4 5  6\n", &cfg);
        assert_eq!(rows, vec![vec!["1", "2", "3"], vec!["4", "5", "6"]]);
    }

    #[test]
    fn chunk_boundary_inside_delimiter_run_resumes_correctly() {
        // Split right in the middle of a quoted field and right at a comma.
        let parts = ["a,\"hel", "lo wor", "ld\",", "c\n"];
        let mut source = FixedChunks::new(&parts);
        let mut tok = TokenizerState::new();
        assert!(tok.next_row(&mut source, &ParserConfig::default()).unwrap());
        assert_eq!(fields(&tok), vec!["a", "hello world", "c"]);
        assert!(!tok.next_row(&mut source, &ParserConfig::default()).unwrap());
    }

    #[test]
    fn empty_input_yields_no_rows() {
        assert_eq!(run_all("", &ParserConfig::default()), Vec::<Vec<String>>::new());
    }

    #[test]
    fn quote_idempotence() {
        let cfg = ParserConfig::default();
        let plain = run_all("ABC\n", &cfg);
        let quoted = run_all("\"ABC\"\n", &cfg);
        assert_eq!(plain, quoted);

        let doubled = run_all("\"ABC\"\",\"\"ABC\"\"\"\n", &cfg);
        assert_eq!(doubled, vec![vec!["ABC\",\"ABC\""]]);
    }

    #[test]
    fn leading_comment_line_never_surfaces_as_a_row() {
        let mut cfg = ParserConfig::default();
        cfg.delimiter = None;
        cfg.ignore_leading_whitespace = true;
        let rows = run_all("# header\n1 2 3\n4 5 6\n", &cfg);
        assert_eq!(rows, vec![vec!["1", "2", "3"], vec!["4", "5", "6"]]);
    }

    #[test]
    fn trailing_blank_line_at_eof_yields_no_extra_row() {
        let rows = run_all("1,2,3\n\n", &ParserConfig::default());
        assert_eq!(rows, vec![vec!["1", "2", "3"]]);
    }

    #[test]
    fn multiple_consecutive_blank_lines_are_all_elided() {
        let rows = run_all("1,2\n\n\n\n3,4\n", &ParserConfig::default());
        assert_eq!(rows, vec![vec!["1", "2"], vec!["3", "4"]]);
    }
}
