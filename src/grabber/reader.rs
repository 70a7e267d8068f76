use crate::storage::ObjectStream;
use bytes::{Buf, Bytes};
use futures::StreamExt;
use std::io::{self, Read};
use std::sync::Arc;
use tokio::runtime::Runtime;

/// Blocking reader over an object body, pulling chunks as they are consumed
pub struct ObjectReader {
    key: String,
    runtime: Arc<Runtime>,
    stream: ObjectStream,
    chunk: Bytes,
}

impl ObjectReader {
    pub(crate) fn new(key: String, runtime: Arc<Runtime>, stream: ObjectStream) -> Self {
        Self {
            key,
            runtime,
            stream,
            chunk: Bytes::new(),
        }
    }

    /// Object key this reader was opened for
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Read for ObjectReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        while self.chunk.is_empty() {
            match self.runtime.block_on(self.stream.next()) {
                Some(Ok(chunk)) => self.chunk = chunk,
                Some(Err(e)) => return Err(io::Error::other(e)),
                None => return Ok(0),
            }
        }

        let n = buf.len().min(self.chunk.len());
        buf[..n].copy_from_slice(&self.chunk[..n]);
        self.chunk.advance(n);
        Ok(n)
    }
}

impl std::fmt::Debug for ObjectReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectReader")
            .field("key", &self.key)
            .field("buffered", &self.chunk.len())
            .finish_non_exhaustive()
    }
}
