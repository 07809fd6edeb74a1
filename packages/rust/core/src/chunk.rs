//! Fixed-width text chunking.

use webqa_shared::Chunk;

/// Split `text` into contiguous chunks of `chunk_size` characters.
///
/// The last chunk may be shorter. Concatenating the chunks reproduces
/// `text` exactly. Empty input yields no chunks; a `chunk_size` of zero
/// yields the whole text as one chunk.
pub fn chunk_text(text: &str, chunk_size: usize) -> Vec<Chunk> {
    if text.is_empty() {
        return Vec::new();
    }
    if chunk_size == 0 {
        return vec![Chunk {
            index: 0,
            text: text.to_string(),
        }];
    }

    let mut chunks = Vec::new();
    let mut start = 0;
    let mut count = 0;

    for (byte_idx, _) in text.char_indices() {
        if count == chunk_size {
            chunks.push(Chunk {
                index: chunks.len(),
                text: text[start..byte_idx].to_string(),
            });
            start = byte_idx;
            count = 0;
        }
        count += 1;
    }

    chunks.push(Chunk {
        index: chunks.len(),
        text: text[start..].to_string(),
    });
    chunks
}
