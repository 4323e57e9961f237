use crate::models::AnalysisRequest;

/// Buckets for hashed term features
pub const HASH_DIM: usize = 512;

/// Scalar metadata features appended after the text block
pub const META_DIM: usize = 6;

/// Total feature dimension
pub const FEATURE_DIM: usize = HASH_DIM + META_DIM;

/// Fixed-shape feature record consumable by a classifier
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRecord {
    values: Vec<f64>,
}

impl FeatureRecord {
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn dim(&self) -> usize {
        self.values.len()
    }
}

/// Build a feature record from an analysis request
pub fn from_request(request: &AnalysisRequest) -> FeatureRecord {
    build(
        &request.title,
        &request.description,
        request.customer_email.as_deref(),
        request.category.as_deref().or(request.sub_category.as_deref()),
        request.tags.as_deref(),
        request.attachments.as_deref(),
    )
}

/// Build a feature record from bare text (title and description both set to
/// the given text), optionally with a category hint
pub fn from_text(text: &str, category_hint: Option<&str>) -> FeatureRecord {
    build(text, text, None, category_hint, None, None)
}

/// Build a feature record from raw ticket fields.
///
/// Pure and infallible: empty inputs yield a degenerate but well-formed
/// record of the same fixed shape.
pub fn build(
    title: &str,
    description: &str,
    customer_email: Option<&str>,
    category_hint: Option<&str>,
    tags: Option<&str>,
    attachments: Option<&str>,
) -> FeatureRecord {
    let mut values = vec![0.0; FEATURE_DIM];

    // Hashed term frequencies over unigrams and bigrams
    let terms = extract_terms(title, description);
    for term in &terms {
        let bucket = (fnv1a(term) % HASH_DIM as u64) as usize;
        values[bucket] += 1.0;
    }

    // L2-normalize the text block so short and long tickets are comparable
    let norm: f64 = values[..HASH_DIM].iter().map(|v| v * v).sum::<f64>().sqrt();
    if norm > 0.0 {
        for v in values[..HASH_DIM].iter_mut() {
            *v /= norm;
        }
    }

    // Scalar metadata block
    let meta = &mut values[HASH_DIM..];
    meta[0] = (title.len().min(200) as f64) / 200.0;
    meta[1] = (description.len().min(2000) as f64) / 2000.0;
    meta[2] = presence(customer_email);
    meta[3] = presence(category_hint);
    meta[4] = tags
        .map(|t| (t.split(',').filter(|s| !s.trim().is_empty()).count().min(10) as f64) / 10.0)
        .unwrap_or(0.0);
    meta[5] = presence(attachments);

    FeatureRecord { values }
}

fn presence(field: Option<&str>) -> f64 {
    match field {
        Some(s) if !s.trim().is_empty() => 1.0,
        _ => 0.0,
    }
}

/// Extract terms from ticket text: lowercase words of three or more
/// characters plus their bigrams
fn extract_terms(title: &str, description: &str) -> Vec<String> {
    let text = format!("{} {}", title, description).to_lowercase();

    let words: Vec<String> = text
        .split(|c: char| c.is_whitespace() || c.is_ascii_punctuation())
        .filter(|w| !w.is_empty() && w.len() > 2)
        .map(|w| w.to_string())
        .collect();

    let mut terms = words.clone();
    for window in words.windows(2) {
        terms.push(window.join("_"));
    }

    terms
}

/// FNV-1a hash. The artifact's feature layout must be stable across
/// processes; the std hasher does not guarantee that.
fn fnv1a(term: &str) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in term.as_bytes() {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}
