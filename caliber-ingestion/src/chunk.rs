//! Document chunking (C9 stage 1, spec.md §4.8), ported from
//! `original_source/src/guard/utils/extraction.py`'s
//! `PolicyAgent._split_into_chunks`: greedy paragraph packing up to a
//! character budget, never splitting a paragraph across chunks.

/// Split `content` on newline-delimited paragraphs into chunks of at
/// most `max_chunk_size` characters, packing paragraphs greedily and
/// starting a new chunk only when the next paragraph would overflow the
/// current one.
pub fn chunk_document(content: &str, max_chunk_size: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();

    for paragraph in content.split('\n') {
        let would_be = current.len() + paragraph.len() + 1;
        if would_be > max_chunk_size && !current.is_empty() {
            chunks.push(current.trim().to_string());
            current = paragraph.to_string();
        } else if current.is_empty() {
            current = paragraph.to_string();
        } else {
            current.push('\n');
            current.push_str(paragraph);
        }
    }

    if !current.trim().is_empty() {
        chunks.push(current.trim().to_string());
    }

    chunks
}
