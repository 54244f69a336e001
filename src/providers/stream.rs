use std::io::{BufRead, BufReader, Read};
use std::iter::FusedIterator;

use crate::errors::ChatResult;

use super::chunk::StreamChunk;

/// Lazily decodes a streamed completion body, one framed line at a time.
///
/// The stream ends after the first [`StreamChunk::Done`], the first error, or
/// the end of the body, whichever comes first. It cannot be restarted.
pub struct ChunkStream<R> {
    reader: BufReader<R>,
    finished: bool,
}

impl<R: Read> ChunkStream<R> {
    pub fn new(body: R) -> Self {
        Self {
            reader: BufReader::new(body),
            finished: false,
        }
    }

    fn finish(&mut self, item: ChatResult<StreamChunk>) -> Option<ChatResult<StreamChunk>> {
        self.finished = true;
        Some(item)
    }
}

impl<R: Read> Iterator for ChunkStream<R> {
    type Item = ChatResult<StreamChunk>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.finished {
            let mut line = Vec::new();
            match self.reader.read_until(b'\n', &mut line) {
                Ok(0) => {
                    self.finished = true;
                    return None;
                }
                Ok(_) => {}
                Err(e) => return self.finish(Err(e.into())),
            }

            while matches!(line.last(), Some(b'\n' | b'\r')) {
                line.pop();
            }
            // Event separators and SSE comments (`: keep-alive`)
            if line.is_empty() || line[0] == b':' {
                continue;
            }

            return match StreamChunk::parse(&line) {
                Ok(StreamChunk::Done) => self.finish(Ok(StreamChunk::Done)),
                Ok(chunk) => Some(Ok(chunk)),
                Err(e) => self.finish(Err(e)),
            };
        }
        None
    }
}

impl<R: Read> FusedIterator for ChunkStream<R> {}
