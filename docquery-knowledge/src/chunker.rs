use crate::errors::{KnowledgeError, KnowledgeResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub index: usize,
    pub content: String,
}

/// Split `input` into overlapping windows of `size` characters.
///
/// Consecutive windows share `overlap` characters. Lengths are counted in
/// Unicode scalar values so a window never splits a code point. The last
/// window ends at the end of the text; empty input yields no chunks.
pub fn chunk_text(input: &str, size: usize, overlap: usize) -> KnowledgeResult<Vec<Chunk>> {
    if size == 0 || overlap >= size {
        return Err(KnowledgeError::InvalidChunking { size, overlap });
    }
    if input.is_empty() {
        return Ok(Vec::new());
    }

    let boundaries: Vec<usize> = input
        .char_indices()
        .map(|(offset, _)| offset)
        .chain(std::iter::once(input.len()))
        .collect();
    let char_len = boundaries.len() - 1;
    let step = size - overlap;

    let mut chunks = Vec::with_capacity(char_len.div_ceil(step));
    let mut start = 0;
    loop {
        let end = (start + size).min(char_len);
        chunks.push(Chunk {
            index: chunks.len(),
            content: input[boundaries[start]..boundaries[end]].to_string(),
        });
        if end == char_len {
            break;
        }
        start += step;
    }

    Ok(chunks)
}

/// Rebuild the source text by dropping the leading `overlap` characters of
/// every chunk after the first.
pub fn strip_overlaps(chunks: &[Chunk], overlap: usize) -> String {
    let mut out = String::new();
    for chunk in chunks {
        if chunk.index == 0 {
            out.push_str(&chunk.content);
        } else {
            out.extend(chunk.content.chars().skip(overlap));
        }
    }
    out
}

pub fn into_contents(chunks: Vec<Chunk>) -> Vec<String> {
    chunks.into_iter().map(|chunk| chunk.content).collect()
}
