// Text normalization shared by every predictor.
//
// All model inputs and keyword matches operate on the normalized form, so
// the rules here define what "contains a keyword" means everywhere else.

/// Normalize text for model input: lowercase, strip characters outside
/// word characters / whitespace / basic punctuation (. , ! ? -), and
/// collapse whitespace runs to a single space.
///
/// Empty or whitespace-only input normalizes to the empty string, which
/// short-circuits the ensemble to the zero-confidence non-threat result.
pub fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_space = false;

    for ch in text.chars() {
        if ch.is_whitespace() {
            pending_space = !out.is_empty();
            continue;
        }
        if !is_kept(ch) {
            continue;
        }
        if pending_space {
            out.push(' ');
            pending_space = false;
        }
        for lower in ch.to_lowercase() {
            out.push(lower);
        }
    }

    out
}

/// Word characters plus the basic punctuation the models were trained with.
fn is_kept(ch: char) -> bool {
    ch.is_alphanumeric() || matches!(ch, '_' | '.' | ',' | '!' | '?' | '-')
}

/// True if any keyword occurs as a substring of the (normalized) text.
///
/// Substring semantics, not word-boundary semantics — "fire" matches
/// "misfired". This mirrors how the classifiers' fallback heuristics were
/// validated, so do not tighten it without re-checking the fixtures.
pub fn contains_any(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| text.contains(k))
}

/// Count how many of the keywords occur in the text.
pub fn count_matches(text: &str, keywords: &[&str]) -> usize {
    keywords.iter().filter(|k| text.contains(*k)).count()
}

/// Stable 64-bit FNV-1a hash.
///
/// Used for the crude word→token-id mapping and for deterministic record
/// ids. `DefaultHasher` is deliberately avoided: its output is not
/// guaranteed stable across releases, and both uses must be reproducible.
pub fn stable_hash(s: &str) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;

    let mut hash = OFFSET;
    for byte in s.as_bytes() {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(PRIME);
    }
    hash
}
