use crate::format::StorageBlock;

/// Split `payload` into consecutive chunks of at most `max_chunk` bytes.
///
/// Always yields at least one chunk; an empty payload yields one empty chunk.
/// Chunk boundaries fall on char boundaries. Transcoded payloads are ASCII,
/// so every chunk but the last is exactly `max_chunk` bytes and the chunk
/// count is `ceil(len / max_chunk)`.
pub fn split_payload(payload: &str, max_chunk: usize) -> Vec<&str> {
    assert!(max_chunk > 0, "max_chunk must be positive");
    if payload.len() <= max_chunk {
        return vec![payload];
    }

    let mut chunks = Vec::with_capacity(payload.len().div_ceil(max_chunk));
    let mut rest = payload;
    while !rest.is_empty() {
        let mut end = rest.len().min(max_chunk);
        while !rest.is_char_boundary(end) {
            end -= 1;
        }
        // A single char wider than max_chunk still has to go somewhere.
        if end == 0 {
            end = rest.chars().next().map_or(rest.len(), char::len_utf8);
        }
        let (chunk, tail) = rest.split_at(end);
        chunks.push(chunk);
        rest = tail;
    }
    chunks
}

/// Reassemble chunks, in index order, into the original payload.
pub fn join_chunks<'a>(chunks: impl IntoIterator<Item = &'a str>) -> String {
    chunks.into_iter().collect()
}

/// Split `payload` and wrap each chunk in a linked [`StorageBlock`].
pub fn build_blocks(payload: &str, max_chunk: usize) -> Vec<StorageBlock> {
    let chunks = split_payload(payload, max_chunk);
    let total = chunks.len() as u32;
    chunks
        .into_iter()
        .enumerate()
        .map(|(i, chunk)| StorageBlock {
            data: chunk.to_string(),
            has_next: (i as u32) < total - 1,
            block_index: i as u32,
            total_blocks: Some(total),
        })
        .collect()
}
