//! Chunked streaming with context overlap.

use super::AsyncReasoningApi;
use crate::config::StreamOptions;
use crate::error::Result;
use crate::result::{AnalysisResult, StreamChunk};
use crate::text::{char_len, char_to_byte};
use futures::{pin_mut, Stream, StreamExt};
use tracing::{debug, warn};

const PREVIEW_CHARS: usize = 100;

/// Accumulates fragments and cuts them into overlapping chunks.
///
/// Each chunk is the previous chunk's trailing `overlap` characters followed
/// by the next `chunk_size` buffered characters. The buffer then advances by
/// `chunk_size - overlap`. Lengths are counted in characters.
#[derive(Debug, Clone)]
pub struct Chunker {
    chunk_size: usize,
    overlap: usize,
    buffer: String,
    previous_overlap: String,
    chunk_num: usize,
}

impl Chunker {
    /// `overlap` must be smaller than `chunk_size` (see [`StreamOptions::validate`]).
    pub fn new(chunk_size: usize, overlap: usize) -> Self {
        Self {
            chunk_size,
            overlap,
            buffer: String::new(),
            previous_overlap: String::new(),
            chunk_num: 0,
        }
    }

    /// Append a fragment and return every chunk that became ready, numbered
    /// from 1 across the lifetime of the chunker.
    pub fn push(&mut self, fragment: &str) -> Vec<(usize, String)> {
        self.buffer.push_str(fragment);

        let mut ready = Vec::new();
        while char_len(&self.buffer) >= self.chunk_size {
            let end = char_to_byte(&self.buffer, self.chunk_size);
            let advance = char_to_byte(&self.buffer, self.chunk_size - self.overlap);

            let text = format!("{}{}", self.previous_overlap, &self.buffer[..end]);
            self.previous_overlap = self.buffer[advance..end].to_string();
            self.buffer.drain(..advance);

            self.chunk_num += 1;
            ready.push((self.chunk_num, text));
        }
        ready
    }

    /// The final chunk, if anything but whitespace is left over.
    pub fn finish(&mut self) -> Option<(usize, String)> {
        if self.buffer.trim().is_empty() && self.previous_overlap.trim().is_empty() {
            return None;
        }
        let text = format!("{}{}", self.previous_overlap, self.buffer);
        self.buffer.clear();
        self.previous_overlap.clear();
        self.chunk_num += 1;
        Some((self.chunk_num, text))
    }
}

impl AsyncReasoningApi {
    /// Analyse a stream of text fragments chunk by chunk.
    ///
    /// Only bad `options` are reported as an error, before anything is read.
    /// Once started, the stream never fails: a chunk that cannot be analysed
    /// yields an error-shaped record and the stream moves on. Chunks are
    /// analysed strictly in order and the last record, if any, is the only
    /// one with `is_final` set.
    pub fn process_stream<'a, S>(
        &'a self,
        source: S,
        options: StreamOptions,
    ) -> Result<impl Stream<Item = StreamChunk> + 'a>
    where
        S: Stream<Item = String> + 'a,
    {
        self.process_stream_with_progress(source, options, |_, _| {})
    }

    /// [`AsyncReasoningApi::process_stream`], calling `progress(chunk_num,
    /// preview)` before each chunk is analysed.
    pub fn process_stream_with_progress<'a, S, P>(
        &'a self,
        source: S,
        options: StreamOptions,
        mut progress: P,
    ) -> Result<impl Stream<Item = StreamChunk> + 'a>
    where
        S: Stream<Item = String> + 'a,
        P: FnMut(usize, &str) + 'a,
    {
        options.validate()?;

        Ok(async_stream::stream! {
            pin_mut!(source);
            let mut chunker = Chunker::new(options.chunk_size, options.overlap);

            while let Some(fragment) = source.next().await {
                for (chunk_num, text) in chunker.push(&fragment) {
                    progress(chunk_num, &preview(&text));
                    let result = self.analyze_chunk(chunk_num, text, options.include_graph).await;
                    yield StreamChunk { chunk_num, is_final: false, result };
                }
            }

            if let Some((chunk_num, text)) = chunker.finish() {
                progress(chunk_num, "Final chunk");
                let result = self.analyze_chunk(chunk_num, text, options.include_graph).await;
                yield StreamChunk { chunk_num, is_final: true, result };
            }
        })
    }

    async fn analyze_chunk(&self, chunk_num: usize, text: String, include_graph: bool) -> AnalysisResult {
        debug!(chunk_num, chars = char_len(&text), "analysing stream chunk");
        match super::analyze(self.api.clone(), text, include_graph).await {
            Ok(result) => result,
            Err(e) => {
                warn!(chunk_num, error = %e, "stream chunk failed");
                AnalysisResult::failed(e)
            }
        }
    }
}

fn preview(text: &str) -> String {
    format!("{}...", &text[..char_to_byte(text, PREVIEW_CHARS)])
}
