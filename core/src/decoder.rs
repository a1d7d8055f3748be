//! Response body accumulation and JSON decoding.

use bytes::{Bytes, BytesMut};
use serde::de::DeserializeOwned;

use crate::error::FetchError;

/// Collects body chunks for one call and decodes them once the body ends.
///
/// Chunks are joined as bytes, so a UTF-8 sequence split across two chunks
/// survives intact.
#[derive(Debug, Default)]
pub struct ResponseDecoder {
    buffer: BytesMut,
}

impl ResponseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, chunk: &[u8]) {
        self.buffer.extend_from_slice(chunk);
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Decode the accumulated body as JSON.
    ///
    /// An empty body is not JSON and fails like any other invalid input.
    pub fn finish<T: DeserializeOwned>(self, status: u16) -> Result<T, FetchError> {
        let body: Bytes = self.buffer.freeze();
        serde_json::from_slice(&body).map_err(|source| FetchError::Decode {
            status,
            body,
            source,
        })
    }
}
