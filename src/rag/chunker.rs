//! Sentence-packing text splitter.

/// Splits `text` into chunks of roughly `chunk_size` characters.
///
/// Newlines are flattened to spaces and sentences are delimited by the
/// literal `". "` sequence, so abbreviations like "Dr. Smith" split too.
/// Sentences are packed greedily by character count; a lone sentence longer
/// than `chunk_size` still becomes its own chunk rather than being cut.
pub fn split_text(text: &str, chunk_size: usize) -> Vec<String> {
    let normalized = text.replace('\n', " ");

    let mut chunks: Vec<String> = Vec::new();
    let mut current: Vec<String> = Vec::new();
    let mut current_len = 0usize;

    for raw in normalized.split(". ") {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            continue;
        }

        let mut sentence = trimmed.to_string();
        if !sentence.ends_with('.') {
            sentence.push('.');
        }

        let sentence_len = sentence.chars().count();
        if current_len + sentence_len > chunk_size && !current.is_empty() {
            chunks.push(current.join(" "));
            current = vec![sentence];
            current_len = sentence_len;
        } else {
            current.push(sentence);
            current_len += sentence_len;
        }
    }

    if !current.is_empty() {
        chunks.push(current.join(" "));
    }

    chunks
}
