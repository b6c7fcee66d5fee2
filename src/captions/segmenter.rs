//! Proportional caption timing.

use thiserror::Error;

use crate::models::CaptionChunk;

/// Errors from caption segmentation.
#[derive(Error, Debug)]
pub enum SegmentError {
    #[error("words_per_chunk must be at least 1")]
    InvalidChunkSize,

    #[error("Total duration must be a positive finite number, got {0}")]
    InvalidDuration(f64),
}

/// Result type for segmentation.
pub type SegmentResult<T> = Result<T, SegmentError>;

/// Split narration into tokens, preserving case and punctuation.
pub fn tokenize(text: &str) -> Vec<&str> {
    text.split_whitespace().collect()
}

/// A token signals emphasis when it has at least two letters and every
/// letter is uppercase ("INSANE", "CAN'T"); single capitals like "I" or
/// "A" do not count.
fn is_emphasis_token(token: &str) -> bool {
    let letters: Vec<char> = token.chars().filter(|c| c.is_alphabetic()).collect();
    letters.len() >= 2 && letters.iter().all(|c| c.is_uppercase())
}

/// Partition narration into timed caption chunks.
///
/// Each chunk covers `words_per_chunk` consecutive tokens (the final one
/// may be shorter) and gets a window proportional to its token share of
/// `total_duration`. The final chunk's end is forced to exactly
/// `total_duration` to absorb floating-point drift.
pub fn segment(
    text: &str,
    total_duration: f64,
    words_per_chunk: usize,
) -> SegmentResult<Vec<CaptionChunk>> {
    if words_per_chunk == 0 {
        return Err(SegmentError::InvalidChunkSize);
    }

    let tokens = tokenize(text);
    if tokens.is_empty() {
        return Ok(Vec::new());
    }

    if !total_duration.is_finite() || total_duration <= 0.0 {
        return Err(SegmentError::InvalidDuration(total_duration));
    }

    let total_tokens = tokens.len();
    let mut chunks = Vec::with_capacity(total_tokens.div_ceil(words_per_chunk));

    for (index, group) in tokens.chunks(words_per_chunk).enumerate() {
        let tokens_before = index * words_per_chunk;
        let start = total_duration * tokens_before as f64 / total_tokens as f64;
        let is_last = tokens_before + group.len() == total_tokens;
        let end = if is_last {
            total_duration
        } else {
            start + total_duration * group.len() as f64 / total_tokens as f64
        };

        chunks.push(CaptionChunk {
            text: group.join(" "),
            start,
            end,
            has_emphasis: group.iter().any(|t| is_emphasis_token(t)),
        });
    }

    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn emergency_broadcast_scenario() {
        let chunks = segment(
            "This is a test of the emergency broadcast system",
            9.0,
            2,
        )
        .unwrap();

        let expected = [
            ("This is", 0.0, 1.8),
            ("a test", 1.8, 3.6),
            ("of the", 3.6, 5.4),
            ("emergency broadcast", 5.4, 7.2),
            ("system", 7.2, 9.0),
        ];

        assert_eq!(chunks.len(), expected.len());
        for (chunk, (text, start, end)) in chunks.iter().zip(expected) {
            assert_eq!(chunk.text, text);
            assert!((chunk.start - start).abs() < EPS, "{}: start", text);
            assert!((chunk.end - end).abs() < EPS, "{}: end", text);
        }
    }

    #[test]
    fn durations_sum_to_total_and_tokens_round_trip() {
        let text = "one two three four five six seven eight nine ten eleven";
        for k in 1..=5 {
            let chunks = segment(text, 13.7, k).unwrap();

            let sum: f64 = chunks.iter().map(|c| c.duration()).sum();
            assert!((sum - 13.7).abs() < 1e-6, "k={k}: sum {sum}");

            let joined = chunks
                .iter()
                .map(|c| c.text.as_str())
                .collect::<Vec<_>>()
                .join(" ");
            assert_eq!(joined, text, "k={k}: token round trip");

            assert!((chunks.first().unwrap().start - 0.0).abs() < EPS);
            assert!((chunks.last().unwrap().end - 13.7).abs() < EPS);
        }
    }

    #[test]
    fn chunks_are_contiguous_and_non_overlapping() {
        let chunks = segment("a b c d e f g", 5.0, 3).unwrap();
        for pair in chunks.windows(2) {
            assert!((pair[0].end - pair[1].start).abs() < EPS);
            assert!(pair[0].start < pair[0].end);
        }
    }

    #[test]
    fn empty_text_yields_empty_sequence() {
        assert!(segment("", 10.0, 2).unwrap().is_empty());
        assert!(segment("   \n\t ", 10.0, 2).unwrap().is_empty());
    }

    #[test]
    fn single_token_spans_full_duration() {
        let chunks = segment("hello", 7.5, 4).unwrap();
        assert_eq!(chunks.len(), 1);
        assert!((chunks[0].start - 0.0).abs() < EPS);
        assert!((chunks[0].end - 7.5).abs() < EPS);
    }

    #[test]
    fn one_word_per_chunk_gives_proportional_shares() {
        let chunks = segment("a b c d", 8.0, 1).unwrap();
        assert_eq!(chunks.len(), 4);
        for (i, chunk) in chunks.iter().enumerate() {
            assert!((chunk.start - 2.0 * i as f64).abs() < EPS);
            assert!((chunk.duration() - 2.0).abs() < EPS);
        }
    }

    #[test]
    fn zero_chunk_size_is_rejected() {
        assert!(matches!(
            segment("a b", 5.0, 0),
            Err(SegmentError::InvalidChunkSize)
        ));
    }

    #[test]
    fn nonpositive_duration_is_rejected() {
        assert!(matches!(
            segment("a b", 0.0, 2),
            Err(SegmentError::InvalidDuration(_))
        ));
        assert!(matches!(
            segment("a b", f64::NAN, 2),
            Err(SegmentError::InvalidDuration(_))
        ));
    }

    #[test]
    fn emphasis_detection() {
        let chunks = segment("this is INSANE honestly", 4.0, 2).unwrap();
        assert!(!chunks[0].has_emphasis);
        assert!(chunks[1].has_emphasis);

        // Single capitals are ordinary words.
        let chunks = segment("I am here", 3.0, 3).unwrap();
        assert!(!chunks[0].has_emphasis);

        // Apostrophes do not break emphasis.
        let chunks = segment("CAN'T stop", 2.0, 2).unwrap();
        assert!(chunks[0].has_emphasis);
    }

    #[test]
    fn case_and_punctuation_survive() {
        let chunks = segment("Wait, what?! No way.", 4.0, 2).unwrap();
        assert_eq!(chunks[0].text, "Wait, what?!");
        assert_eq!(chunks[1].text, "No way.");
    }
}
