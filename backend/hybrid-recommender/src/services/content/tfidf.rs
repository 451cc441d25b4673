/// TF-IDF Vector Space
///
/// Builds one term space over a small corpus and compares rows by cosine
/// similarity. Term counts come from aprender's `CountVectorizer` (lowercased,
/// English stop words removed, vocabulary capped at `max_features` by corpus
/// frequency with alphabetical tie-break). Weighting uses the smoothed idf:
///
/// ```text
/// idf(t)      = ln((1 + n) / (1 + df(t))) + 1
/// tfidf(t, d) = count(t, d) * idf(t), rows L2-normalized
/// ```
use aprender::text::vectorize::CountVectorizer;
use aprender::text::Tokenizer;
use aprender::AprenderError;
use ndarray::{Array2, ArrayView1};
use std::collections::BTreeMap;
use tracing::debug;

/// Runs of alphanumerics (or `_`) at least two chars long; case folding
/// happens in the vectorizer
#[derive(Debug, Clone, Copy, Default)]
pub struct TermTokenizer;

impl Tokenizer for TermTokenizer {
    fn tokenize(&self, text: &str) -> Result<Vec<String>, AprenderError> {
        Ok(text
            .split(|c: char| !(c.is_alphanumeric() || c == '_'))
            .filter(|token| token.chars().count() >= 2)
            .map(str::to_string)
            .collect())
    }
}

pub struct TfidfVectorizer {
    max_features: usize,
    english_stop_words: bool,
}

/// Fitted term space: one L2-normalized row per document
#[derive(Debug, Clone)]
pub struct TfidfMatrix {
    vocabulary: BTreeMap<String, usize>,
    rows: Array2<f64>,
}

impl TfidfVectorizer {
    pub fn new(max_features: usize) -> Self {
        Self {
            max_features,
            english_stop_words: true,
        }
    }

    pub fn without_stop_words(mut self) -> Self {
        self.english_stop_words = false;
        self
    }

    fn count_vectorizer(&self) -> CountVectorizer {
        let vectorizer = CountVectorizer::new()
            .with_tokenizer(Box::new(TermTokenizer))
            .with_lowercase(true)
            .with_max_features(self.max_features);

        if self.english_stop_words {
            vectorizer.with_stop_words_english()
        } else {
            vectorizer
        }
    }

    /// Fit a term space over `documents`.
    ///
    /// A corpus without a single usable term yields all-zero rows.
    pub fn fit_transform<S: AsRef<str>>(&self, documents: &[S]) -> TfidfMatrix {
        let n_docs = documents.len();
        let mut vectorizer = self.count_vectorizer();

        let counts = match vectorizer.fit_transform(documents) {
            Ok(counts) => counts,
            Err(e) => {
                debug!(documents = n_docs, "Empty term space: {}", e);
                return TfidfMatrix {
                    vocabulary: BTreeMap::new(),
                    rows: Array2::zeros((n_docs, 0)),
                };
            }
        };

        let vocabulary: BTreeMap<String, usize> = vectorizer
            .vocabulary()
            .iter()
            .map(|(term, &col)| (term.clone(), col))
            .collect();
        let n_terms = counts.n_cols();

        let mut rows = Array2::<f64>::zeros((n_docs, n_terms));
        for row in 0..n_docs {
            for col in 0..n_terms {
                rows[[row, col]] = counts.get(row, col);
            }
        }

        let idf: Vec<f64> = rows
            .columns()
            .into_iter()
            .map(|column| {
                let df = column.iter().filter(|&&count| count > 0.0).count() as f64;
                ((1.0 + n_docs as f64) / (1.0 + df)).ln() + 1.0
            })
            .collect();

        for mut row_view in rows.rows_mut() {
            for (value, weight) in row_view.iter_mut().zip(&idf) {
                *value *= weight;
            }
            let norm = row_view.dot(&row_view).sqrt();
            if norm > 0.0 {
                row_view.mapv_inplace(|v| v / norm);
            }
        }

        TfidfMatrix { vocabulary, rows }
    }
}

impl TfidfMatrix {
    pub fn n_rows(&self) -> usize {
        self.rows.nrows()
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn contains_term(&self, term: &str) -> bool {
        self.vocabulary.contains_key(term)
    }

    /// Cosine similarity of two rows; an all-zero row has similarity 0
    pub fn cosine(&self, a: usize, b: usize) -> f64 {
        cosine_similarity(self.rows.row(a), self.rows.row(b))
    }
}

pub fn cosine_similarity(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
    let norm_a = a.dot(&a).sqrt();
    let norm_b = b.dot(&b).sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        (a.dot(&b) / (norm_a * norm_b)).clamp(0.0, 1.0)
    }
}
