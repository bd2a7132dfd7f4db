//! Buffered-reader-backed stream adapter.
//!
//! A file-descriptor-style reader with a caller-tunable buffer size that
//! emits `MayContainNewline` chunks. UTF-8 decoding of raw bytes happens
//! here, at the stream boundary — the core tokenizer never sees anything
//! but already-decoded code points.

use std::io::Read;

use super::{Chunk, ChunkSource, ChunkStatus};
use crate::error::ReaderError;

/// Default internal buffer size: 16 MiB.
pub const DEFAULT_BUFFER_SIZE: usize = 16 * 1024 * 1024;

/// Adapts any [`std::io::Read`] into a [`ChunkSource`].
pub struct FileChunkSource<R> {
    reader: R,
    buffer_size: usize,
    /// Bytes read but not yet decoded: a UTF-8 sequence truncated at the end
    /// of the previous raw read, carried forward to be completed by the next.
    pending: Vec<u8>,
    code_buf: Vec<u32>,
    reader_done: bool,
}

impl<R: Read> FileChunkSource<R> {
    pub fn new(reader: R) -> Self {
        Self::with_buffer_size(reader, DEFAULT_BUFFER_SIZE)
    }

    pub fn with_buffer_size(reader: R, buffer_size: usize) -> Self {
        FileChunkSource {
            reader,
            buffer_size: buffer_size.max(1),
            pending: Vec::new(),
            code_buf: Vec::new(),
            reader_done: false,
        }
    }
}

impl<R: Read> ChunkSource for FileChunkSource<R> {
    fn next_chunk(&mut self) -> Result<Chunk<'_>, ReaderError> {
        if self.reader_done {
            self.code_buf.clear();
            return Ok(Chunk {
                data: &self.code_buf,
                status: ChunkStatus::FileEnd,
            });
        }

        let mut raw = std::mem::take(&mut self.pending);
        let mut byte_buf = vec![0u8; self.buffer_size];
        let n = self.reader.read(&mut byte_buf)?;
        raw.extend_from_slice(&byte_buf[..n]);

        if n == 0 {
            self.reader_done = true;
            if raw.is_empty() {
                self.code_buf.clear();
            } else {
                let text = std::str::from_utf8(&raw).map_err(|_| {
                    ReaderError::from(std::io::Error::new(
                        std::io::ErrorKind::InvalidData,
                        "truncated UTF-8 sequence at end of stream",
                    ))
                })?;
                self.code_buf.clear();
                self.code_buf.extend(text.chars().map(|c| c as u32));
            }
            return Ok(Chunk {
                data: &self.code_buf,
                status: ChunkStatus::FileEnd,
            });
        }

        match std::str::from_utf8(&raw) {
            Ok(text) => {
                self.code_buf.clear();
                self.code_buf.extend(text.chars().map(|c| c as u32));
            }
            Err(e) => {
                let valid_len = e.valid_up_to();
                if e.error_len().is_some() {
                    // A genuine invalid byte sequence, not just a boundary split.
                    return Err(std::io::Error::new(
                        std::io::ErrorKind::InvalidData,
                        "invalid UTF-8 in input stream",
                    )
                    .into());
                }
                let text = std::str::from_utf8(&raw[..valid_len]).expect("validated above");
                self.code_buf.clear();
                self.code_buf.extend(text.chars().map(|c| c as u32));
                self.pending = raw[valid_len..].to_vec();
            }
        }

        Ok(Chunk {
            data: &self.code_buf,
            status: ChunkStatus::MayContainNewline,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(mut src: FileChunkSource<&[u8]>) -> (Vec<u32>, bool) {
        let mut all = Vec::new();
        loop {
            let chunk = src.next_chunk().unwrap();
            all.extend_from_slice(chunk.data);
            if chunk.status == ChunkStatus::FileEnd {
                return (all, true);
            }
        }
    }

    #[test]
    fn reads_ascii_in_one_chunk() {
        let data = b"a,b,c\n";
        let src = FileChunkSource::new(&data[..]);
        let (codes, done) = drain(src);
        assert!(done);
        assert_eq!(codes, "a,b,c\n".chars().map(|c| c as u32).collect::<Vec<_>>());
    }

    #[test]
    fn small_buffer_splits_across_chunks() {
        let data = b"abcdefgh\n";
        let src = FileChunkSource::with_buffer_size(&data[..], 3);
        let (codes, done) = drain(src);
        assert!(done);
        assert_eq!(codes, "abcdefgh\n".chars().map(|c| c as u32).collect::<Vec<_>>());
    }

    #[test]
    fn utf8_multibyte_char_split_across_raw_reads() {
        // "é" is 2 bytes in UTF-8 (0xC3 0xA9); force a 1-byte buffer so the
        // boundary falls inside the character.
        let data = "é\n".as_bytes().to_vec();
        let src = FileChunkSource::with_buffer_size(&data[..], 1);
        let (codes, done) = drain(src);
        assert!(done);
        assert_eq!(codes, vec!['é' as u32, '\n' as u32]);
    }

    #[test]
    fn empty_input_is_immediate_file_end() {
        let data: &[u8] = b"";
        let mut src = FileChunkSource::new(data);
        let chunk = src.next_chunk().unwrap();
        assert_eq!(chunk.status, ChunkStatus::FileEnd);
        assert!(chunk.data.is_empty());
    }
}
