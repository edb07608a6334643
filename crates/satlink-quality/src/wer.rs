//! Word error rate: minimum-edit-distance transcript comparison.
//!
//! Transcription itself (speech-to-text on the degraded audio) is an
//! external collaborator; this module only compares two texts.

/// Word error rate between a reference and a hypothesis transcript.
///
/// Tokenization is lowercase + whitespace split; the rate is the minimum
/// number of word substitutions, insertions and deletions divided by the
/// reference word count. 0 = perfect match; can exceed 1 when the
/// hypothesis inserts many extra words. An empty reference divides by a
/// floor of one word instead of zero.
pub fn compute(reference: &str, hypothesis: &str) -> f32 {
    let reference_words = tokenize(reference);
    let hypothesis_words = tokenize(hypothesis);

    let distance = edit_distance(&reference_words, &hypothesis_words);
    distance as f32 / reference_words.len().max(1) as f32
}

fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|word| word.to_lowercase())
        .collect()
}

/// Word-level Levenshtein distance, two-row dynamic programming.
fn edit_distance(reference: &[String], hypothesis: &[String]) -> usize {
    if reference.is_empty() {
        return hypothesis.len();
    }
    if hypothesis.is_empty() {
        return reference.len();
    }

    let mut previous: Vec<usize> = (0..=hypothesis.len()).collect();
    let mut current = vec![0usize; hypothesis.len() + 1];

    for (i, ref_word) in reference.iter().enumerate() {
        current[0] = i + 1;
        for (j, hyp_word) in hypothesis.iter().enumerate() {
            let substitution = previous[j] + usize::from(ref_word != hyp_word);
            let deletion = previous[j + 1] + 1;
            let insertion = current[j] + 1;
            current[j + 1] = substitution.min(deletion).min(insertion);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[hypothesis.len()]
}
