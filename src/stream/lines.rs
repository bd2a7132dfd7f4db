//! Line-iterator-backed stream adapter.
//!
//! Wraps a line iterator, emitting `NoNewline` chunks with a synthetic
//! terminating newline per yield.

use super::{Chunk, ChunkSource, ChunkStatus};
use crate::error::ReaderError;

/// Adapts any `Iterator<Item = std::io::Result<String>>` (e.g.
/// `BufRead::lines()`) into a [`ChunkSource`]. Each yielded line becomes one
/// chunk with a synthetic trailing `\n` appended and status `NoNewline`,
/// since the caller already knows where lines end and the tokenizer should
/// not go hunting for a terminator inside it.
pub struct LinesChunkSource<I> {
    lines: I,
    code_buf: Vec<u32>,
    done: bool,
}

impl<I> LinesChunkSource<I>
where
    I: Iterator<Item = std::io::Result<String>>,
{
    pub fn new(lines: I) -> Self {
        LinesChunkSource {
            lines,
            code_buf: Vec::new(),
            done: false,
        }
    }
}

impl<I> ChunkSource for LinesChunkSource<I>
where
    I: Iterator<Item = std::io::Result<String>>,
{
    fn next_chunk(&mut self) -> Result<Chunk<'_>, ReaderError> {
        if self.done {
            self.code_buf.clear();
            return Ok(Chunk {
                data: &self.code_buf,
                status: ChunkStatus::FileEnd,
            });
        }

        match self.lines.next() {
            Some(line) => {
                let line = line?;
                self.code_buf.clear();
                self.code_buf.extend(line.chars().map(|c| c as u32));
                self.code_buf.push('\n' as u32);
                Ok(Chunk {
                    data: &self.code_buf,
                    status: ChunkStatus::NoNewline,
                })
            }
            None => {
                self.done = true;
                self.code_buf.clear();
                Ok(Chunk {
                    data: &self.code_buf,
                    status: ChunkStatus::FileEnd,
                })
            }
        }
    }
}
