//! Text chunking for ingestion

/// Split text into chunks of at most `chunk_size` characters, each chunk
/// starting `chunk_size - overlap` characters after the previous one.
///
/// Works on characters rather than bytes so a chunk never splits a UTF-8
/// sequence. An overlap greater than or equal to the chunk size is clamped so
/// that every step advances by at least one character.
pub fn chunk_text(text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() || chunk_size == 0 {
        return Vec::new();
    }

    let step = chunk_size.saturating_sub(overlap).max(1);
    let mut chunks = Vec::new();
    let mut start = 0usize;

    while start < chars.len() {
        let end = (start + chunk_size).min(chars.len());
        chunks.push(chars[start..end].iter().collect());
        if end == chars.len() {
            break;
        }
        start += step;
    }

    chunks
}
