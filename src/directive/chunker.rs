//! Overlapping character-window chunking with sentence-boundary snapping.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkerConfig {
    /// Maximum chunk size in characters
    pub chunk_size: usize,
    /// Overlap between consecutive chunks, in characters
    pub chunk_overlap: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 100,
        }
    }
}

/// A chunk of directive text with its provenance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextChunk {
    pub text: String,
    /// Source label (e.g. "directive-cfst.pdf p.3")
    pub source: String,
    /// Character offset within the source section
    pub start_offset: usize,
    /// Chunk index within the source section
    pub chunk_index: usize,
}

/// Split text into overlapping chunks. Offsets are character-based. The
/// window may be cut back to a sentence boundary; the next chunk starts
/// `chunk_overlap` characters before that cut, so every character lands
/// in at least one chunk.
pub fn split_into_chunks(text: &str, source: &str, config: &ChunkerConfig) -> Vec<TextChunk> {
    let chunk_size = config.chunk_size.max(1);
    let overlap = config.chunk_overlap.min(chunk_size - 1);

    let chars: Vec<char> = text.chars().collect();
    let total_chars = chars.len();

    let mut chunks = Vec::new();
    if total_chars == 0 {
        return chunks;
    }

    let mut start = 0;
    let mut chunk_index = 0;

    while start < total_chars {
        let end = (start + chunk_size).min(total_chars);
        let window: String = chars[start..end].iter().collect();

        let (final_text, consumed) = if end < total_chars {
            let snapped = snap_to_sentence_boundary(&window);
            let consumed = snapped.chars().count();
            (snapped, consumed)
        } else {
            (window, end - start)
        };

        let trimmed = final_text.trim();
        if !trimmed.is_empty() {
            chunks.push(TextChunk {
                text: trimmed.to_string(),
                source: source.to_string(),
                start_offset: start,
                chunk_index,
            });
            chunk_index += 1;
        }

        if end >= total_chars {
            break;
        }
        start += consumed.saturating_sub(overlap).max(1);
    }

    chunks
}

/// Cut the window at the last sentence ending found in its final fifth,
/// so chunks do not end mid-sentence. Works on char boundaries only.
fn snap_to_sentence_boundary(text: &str) -> String {
    let sentence_endings = [". ", "! ", "? ", ".\n", "!\n", "?\n"];

    let chars: Vec<char> = text.chars().collect();
    let search_start_char = (chars.len() * 80) / 100;
    let search_start: usize = chars[..search_start_char].iter().map(|c| c.len_utf8()).sum();
    let search_text = &text[search_start..];

    for ending in sentence_endings.iter() {
        if let Some(pos) = search_text.rfind(ending) {
            let cut_pos = search_start + pos + ending.len();
            return text[..cut_pos].to_string();
        }
    }

    text.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_yields_no_chunks() {
        let chunks = split_into_chunks("", "doc", &ChunkerConfig::default());
        assert!(chunks.is_empty());
    }

    #[test]
    fn short_text_is_a_single_chunk() {
        let chunks = split_into_chunks("Un danger simple.", "doc", &ChunkerConfig::default());
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].start_offset, 0);
        assert_eq!(chunks[0].chunk_index, 0);
    }

    #[test]
    fn offsets_increase_by_step() {
        let config = ChunkerConfig {
            chunk_size: 100,
            chunk_overlap: 20,
        };
        let text = "Une phrase de test. ".repeat(30);
        let chunks = split_into_chunks(&text, "doc", &config);

        assert!(chunks.len() > 1);
        for pair in chunks.windows(2) {
            assert_eq!(pair[1].start_offset - pair[0].start_offset, 80);
        }
    }

    #[test]
    fn chunks_end_on_sentence_boundaries() {
        let config = ChunkerConfig {
            chunk_size: 100,
            chunk_overlap: 10,
        };
        let text = "Chaque phrase courte finit par un point net. ".repeat(10);
        let chunks = split_into_chunks(&text, "doc", &config);

        // every non-final chunk should end with a complete sentence
        for chunk in &chunks[..chunks.len() - 1] {
            assert!(
                chunk.text.ends_with('.'),
                "chunk did not end on a sentence: {:?}",
                chunk.text
            );
        }
    }

    #[test]
    fn text_after_a_snapped_boundary_is_not_dropped() {
        let config = ChunkerConfig {
            chunk_size: 100,
            chunk_overlap: 10,
        };
        // the sentence ends inside the snap zone of the first window, so
        // the marker sits between the cut and a fixed-step next start
        let mut text = "a".repeat(82);
        text.push_str(". ");
        text.push_str("REPERE");
        text.push_str(&"b".repeat(200));

        let chunks = split_into_chunks(&text, "doc", &config);
        assert!(
            chunks.iter().any(|c| c.text.contains("REPERE")),
            "marker fell between two chunks: {:?}",
            chunks.iter().map(|c| &c.text).collect::<Vec<_>>()
        );
    }

    #[test]
    fn consecutive_chunks_overlap_after_a_snap() {
        let config = ChunkerConfig {
            chunk_size: 100,
            chunk_overlap: 10,
        };
        // 45-char sentence: the second boundary lands in the snap zone
        let text = "Chaque phrase courte finit par un point net. ".repeat(10);
        let chunks = split_into_chunks(&text, "doc", &config);

        assert!(chunks.len() > 1);
        for pair in chunks.windows(2) {
            let prev_end = pair[0].start_offset + pair[0].text.chars().count();
            assert!(
                pair[1].start_offset <= prev_end,
                "gap between chunk ending at {} and chunk starting at {}",
                prev_end,
                pair[1].start_offset
            );
        }
    }

    #[test]
    fn accented_text_does_not_break_boundary_snapping() {
        let config = ChunkerConfig {
            chunk_size: 50,
            chunk_overlap: 5,
        };
        let text = "Sécurité et santé au travail, prévention des dangers. ".repeat(10);
        let chunks = split_into_chunks(&text, "doc", &config);
        assert!(!chunks.is_empty());
    }

    #[test]
    fn overlap_larger_than_chunk_size_is_clamped() {
        let config = ChunkerConfig {
            chunk_size: 10,
            chunk_overlap: 50,
        };
        let chunks = split_into_chunks(&"abcdefghij".repeat(5), "doc", &config);
        // step is clamped to 1, so the loop still terminates
        assert!(!chunks.is_empty());
    }
}
