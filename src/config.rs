//! Dialect configuration and per-read options.
//!
//! A small, host-independent option struct with a fluent builder, pre-filled
//! with sensible dialect defaults.

use std::collections::HashMap;

use crate::reader::Converter;

/// Immutable per-call dialect bundle. Never mutated during a read.
#[derive(Clone, Copy, Debug)]
pub struct ParserConfig {
    /// `None` means "no delimiter": switch to whitespace splitting.
    pub delimiter: Option<u32>,
    pub comment: Option<u32>,
    pub quote: u32,
    pub imaginary_unit: u32,
    pub allow_embedded_newline: bool,
    pub ignore_leading_whitespace: bool,
    pub allow_float_for_int: bool,
    pub python_byte_converters: bool,
    pub c_byte_converters: bool,
}

impl ParserConfig {
    /// True when `delimiter` is unset, i.e. the dialect splits on whitespace runs.
    pub fn delimiter_is_whitespace(&self) -> bool {
        self.delimiter.is_none()
    }
}

impl Default for ParserConfig {
    /// Dialect defaults: `,` delimiter, `#` comment, `"` quote, `j`
    /// imaginary unit, float-for-int fallback and embedded newlines on,
    /// leading whitespace preserved.
    fn default() -> Self {
        ParserConfig {
            delimiter: Some(','  as u32),
            comment: Some('#' as u32),
            quote: '"' as u32,
            imaginary_unit: 'j' as u32,
            allow_embedded_newline: true,
            ignore_leading_whitespace: false,
            allow_float_for_int: true,
            python_byte_converters: false,
            c_byte_converters: false,
        }
    }
}

/// The non-dialect knobs of a single read call: column selection, how many
/// leading lines to discard, a row cap, and per-column converter callbacks.
pub struct ReadOptions {
    /// Source column indices to keep, in output order. Negative values are
    /// normalized by adding the current row's field count.
    pub usecols: Option<Vec<i64>>,
    pub skiprows: usize,
    /// `None` (or negative in the original C API) means "until EOF".
    pub max_rows: Option<usize>,
    /// Keyed by source column index (same negative-index convention as `usecols`).
    pub converters: HashMap<i64, Converter>,
}

impl Default for ReadOptions {
    fn default() -> Self {
        ReadOptions {
            usecols: None,
            skiprows: 0,
            max_rows: None,
            converters: HashMap::new(),
        }
    }
}

/// Fluent constructor for a `(ParserConfig, ReadOptions)` pair, pre-filled
/// with the default dialect.
#[derive(Default)]
pub struct ReaderBuilder {
    config: ParserConfig,
    options: ReadOptions,
    buffer_size: usize,
}

impl ReaderBuilder {
    pub fn new() -> Self {
        ReaderBuilder {
            config: ParserConfig::default(),
            options: ReadOptions::default(),
            buffer_size: crate::stream::file::DEFAULT_BUFFER_SIZE,
        }
    }

    pub fn delimiter(mut self, delimiter: char) -> Self {
        self.config.delimiter = Some(delimiter as u32);
        self
    }

    /// Unset the delimiter, switching to whitespace splitting (also enables
    /// `ignore_leading_whitespace`).
    pub fn whitespace_delimited(mut self) -> Self {
        self.config.delimiter = None;
        self.config.ignore_leading_whitespace = true;
        self
    }

    pub fn comment(mut self, comment: Option<char>) -> Self {
        self.config.comment = comment.map(|c| c as u32);
        self
    }

    pub fn quote(mut self, quote: char) -> Self {
        self.config.quote = quote as u32;
        self
    }

    pub fn imaginary_unit(mut self, unit: char) -> Self {
        self.config.imaginary_unit = unit as u32;
        self
    }

    pub fn allow_embedded_newline(mut self, allow: bool) -> Self {
        self.config.allow_embedded_newline = allow;
        self
    }

    pub fn ignore_leading_whitespace(mut self, ignore: bool) -> Self {
        self.config.ignore_leading_whitespace = ignore;
        self
    }

    pub fn allow_float_for_int(mut self, allow: bool) -> Self {
        self.config.allow_float_for_int = allow;
        self
    }

    pub fn usecols(mut self, usecols: Vec<i64>) -> Self {
        self.options.usecols = Some(usecols);
        self
    }

    pub fn skiprows(mut self, skiprows: usize) -> Self {
        self.options.skiprows = skiprows;
        self
    }

    pub fn max_rows(mut self, max_rows: usize) -> Self {
        self.options.max_rows = Some(max_rows);
        self
    }

    pub fn converter(mut self, source_col: i64, converter: Converter) -> Self {
        self.options.converters.insert(source_col, converter);
        self
    }

    /// Internal buffer size to use when the caller constructs a
    /// [`crate::stream::file::FileChunkSource`] from this builder's settings.
    pub fn buffer_size(mut self, bytes: usize) -> Self {
        self.buffer_size = bytes;
        self
    }

    pub fn build(self) -> (ParserConfig, ReadOptions) {
        (self.config, self.options)
    }
}
