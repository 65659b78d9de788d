//! Sentence-boundary text chunker.
//!
//! Splits normalized page text into retrieval-sized passages bounded by a
//! configurable word count. Splitting uses sentence-terminal punctuation
//! as a heuristic boundary so passages stay semantically coherent; a
//! single sentence longer than the cap is kept whole in its own passage
//! rather than truncated.

/// Split text into sentence-like units on `.`, `!`, or `?` followed by
/// whitespace (or end of input).
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        current.push(c);
        if matches!(c, '.' | '!' | '?') && chars.peek().is_none_or(|n| n.is_whitespace()) {
            let sentence = current.trim();
            if !sentence.is_empty() {
                sentences.push(sentence.to_string());
            }
            current.clear();
            while chars.peek().is_some_and(|n| n.is_whitespace()) {
                chars.next();
            }
        }
    }

    let tail = current.trim();
    if !tail.is_empty() {
        sentences.push(tail.to_string());
    }

    sentences
}

/// Accumulate sentences into passages of at most `max_words` words.
///
/// The current passage is closed before a sentence that would push it
/// over the cap; the final partial passage is emitted even when under
/// the cap. Empty input yields an empty vec.
pub fn chunk_text(text: &str, max_words: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current: Vec<String> = Vec::new();
    let mut current_words = 0usize;

    for sentence in split_sentences(text) {
        let words = sentence.split_whitespace().count();

        if current_words + words > max_words && !current.is_empty() {
            chunks.push(current.join(" "));
            current.clear();
            current_words = 0;
        }

        current_words += words;
        current.push(sentence);
    }

    if !current.is_empty() {
        chunks.push(current.join(" "));
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word_count(s: &str) -> usize {
        s.split_whitespace().count()
    }

    #[test]
    fn empty_text_yields_no_chunks() {
        assert!(chunk_text("", 700).is_empty());
        assert!(chunk_text("   ", 700).is_empty());
    }

    #[test]
    fn short_text_single_chunk() {
        let chunks = chunk_text("Hello there, world.", 700);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0], "Hello there, world.");
    }

    #[test]
    fn splits_on_terminal_punctuation() {
        let sentences = split_sentences("One fish. Two fish! Red fish? Blue fish");
        assert_eq!(
            sentences,
            vec!["One fish.", "Two fish!", "Red fish?", "Blue fish"]
        );
    }

    #[test]
    fn decimal_points_do_not_split_sentences() {
        let sentences = split_sentences("Version 1.5 shipped today. It is stable.");
        assert_eq!(sentences.len(), 2);
        assert!(sentences[0].contains("1.5"));
    }

    #[test]
    fn respects_word_cap() {
        let text = (0..40)
            .map(|i| format!("Sentence number {i} carries a few words."))
            .collect::<Vec<_>>()
            .join(" ");
        let chunks = chunk_text(&text, 20);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(
                word_count(chunk) <= 20,
                "chunk exceeded cap: {} words",
                word_count(chunk)
            );
        }
    }

    #[test]
    fn oversized_single_sentence_kept_whole() {
        let long_sentence = format!("{} end.", vec!["word"; 50].join(" "));
        let text = format!("A short lead-in sentence. {long_sentence} A short tail sentence.");
        let chunks = chunk_text(&text, 10);
        assert!(chunks.iter().any(|c| word_count(c) > 10));
        let joined = chunks.join(" ");
        assert!(joined.contains("end."));
        assert!(joined.contains("tail sentence."));
    }

    #[test]
    fn final_partial_chunk_emitted() {
        let chunks = chunk_text("First sentence here. Second one.", 100);
        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].ends_with("Second one."));
    }
}
