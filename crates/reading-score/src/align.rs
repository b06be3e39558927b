use lectura_transcript::normalize::{NormalizeOptions, tokenize};

/// Word-level comparison of a hypothesis against a reference.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "specta", derive(specta::Type))]
pub struct AlignmentResult {
    pub edit_distance: usize,
    /// Word error rate; may exceed 1 when the hypothesis is much longer.
    pub wer: f64,
    /// One flag per reference word: `true` when the backtrace matched it.
    pub match_vector: Vec<bool>,
}

impl AlignmentResult {
    pub fn accuracy(&self) -> f64 {
        (1.0 - self.wer).clamp(0.0, 1.0)
    }

    pub fn matched_words(&self) -> usize {
        self.match_vector.iter().filter(|m| **m).count()
    }
}

pub fn align(reference: &str, hypothesis: &str) -> AlignmentResult {
    align_with(reference, hypothesis, NormalizeOptions::default())
}

pub fn align_with(reference: &str, hypothesis: &str, options: NormalizeOptions) -> AlignmentResult {
    align_words(&tokenize(reference, options), &tokenize(hypothesis, options))
}

/// Align already-normalized word sequences.
pub fn align_words<R, H>(reference: &[R], hypothesis: &[H]) -> AlignmentResult
where
    R: AsRef<str>,
    H: AsRef<str>,
{
    let matrix = EditMatrix::build(reference, hypothesis);
    let edit_distance = matrix.distance();

    AlignmentResult {
        edit_distance,
        wer: error_rate(edit_distance, reference.len(), hypothesis.len()),
        match_vector: matrix.backtrace(reference, hypothesis),
    }
}

pub fn word_error_rate(reference: &str, hypothesis: &str) -> f64 {
    align(reference, hypothesis).wer
}

/// `1 - wer`, clamped to `[0, 1]`.
pub fn accuracy(reference: &str, hypothesis: &str) -> f64 {
    align(reference, hypothesis).accuracy()
}

fn error_rate(distance: usize, reference_len: usize, hypothesis_len: usize) -> f64 {
    if reference_len == 0 {
        return if hypothesis_len > 0 { 1.0 } else { 0.0 };
    }
    distance as f64 / reference_len as f64
}

fn substitution_cost<R: AsRef<str>, H: AsRef<str>>(r: &R, h: &H) -> usize {
    usize::from(r.as_ref() != h.as_ref())
}

/// Full Levenshtein table over whole words, `(|ref| + 1) × (|hyp| + 1)`,
/// stored row-major.
struct EditMatrix {
    cols: usize,
    cells: Vec<usize>,
}

impl EditMatrix {
    fn build<R: AsRef<str>, H: AsRef<str>>(reference: &[R], hypothesis: &[H]) -> Self {
        let rows = reference.len() + 1;
        let cols = hypothesis.len() + 1;
        let mut m = Self {
            cols,
            cells: vec![0; rows * cols],
        };

        for i in 0..rows {
            m.set(i, 0, i);
        }
        for j in 0..cols {
            m.set(0, j, j);
        }

        for i in 1..rows {
            for j in 1..cols {
                let cost = substitution_cost(&reference[i - 1], &hypothesis[j - 1]);
                let value = (m.get(i - 1, j) + 1)
                    .min(m.get(i, j - 1) + 1)
                    .min(m.get(i - 1, j - 1) + cost);
                m.set(i, j, value);
            }
        }

        m
    }

    fn get(&self, i: usize, j: usize) -> usize {
        self.cells[i * self.cols + j]
    }

    fn set(&mut self, i: usize, j: usize, value: usize) {
        self.cells[i * self.cols + j] = value;
    }

    fn distance(&self) -> usize {
        self.cells.last().copied().unwrap_or(0)
    }

    /// Walk back from the bottom-right corner, preferring the diagonal, then
    /// a deletion, then an insertion, whenever the step is consistent with
    /// the table.
    fn backtrace<R: AsRef<str>, H: AsRef<str>>(
        &self,
        reference: &[R],
        hypothesis: &[H],
    ) -> Vec<bool> {
        let mut matched = vec![false; reference.len()];
        let mut i = reference.len();
        let mut j = hypothesis.len();

        while i > 0 || j > 0 {
            let here = self.get(i, j);

            if i > 0 && j > 0 {
                let cost = substitution_cost(&reference[i - 1], &hypothesis[j - 1]);
                if here == self.get(i - 1, j - 1) + cost {
                    matched[i - 1] = cost == 0;
                    i -= 1;
                    j -= 1;
                    continue;
                }
            }

            if i > 0 && here == self.get(i - 1, j) + 1 {
                i -= 1;
                continue;
            }

            if j > 0 && here == self.get(i, j - 1) + 1 {
                j -= 1;
                continue;
            }

            break;
        }

        matched
    }
}
