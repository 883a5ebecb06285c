//! Morphological variant detection.
//!
//! Used to reject candidate words that only differ from an anchor, a target,
//! or an already selected word by inflection or affixation. Rule-based and
//! deliberately aggressive: a false positive costs one skipped candidate, a
//! false negative lets "mysteries" stand in for "mystery".

/// Prefixes stripped before re-checking, longest first.
const STRIP_PREFIXES: [&str; 12] = [
    "counter", "under", "anti", "over", "dis", "non", "pre", "mis", "un", "in", "im", "re",
];

/// Suffixes stripped during stemming, longest first.
const STRIP_SUFFIXES: [&str; 25] = [
    "ically", "ation", "ness", "ment", "able", "ible", "tion", "sion", "ally", "ful", "less",
    "ing", "ity", "ous", "ive", "est", "ier", "ies", "ied", "ly", "ed", "er", "en", "es", "s",
];

/// Maximum length difference for the prefix-containment rule.
const PREFIX_LENGTH_BOUND: usize = 3;

/// Minimum stem length left standing after any strip.
const MIN_STEM: usize = 3;

/// Whether two words differ only by inflection or affixation.
pub fn is_morphological_variant(a: &str, b: &str) -> bool {
    let a = a.trim().to_lowercase();
    let b = b.trim().to_lowercase();
    if a.is_empty() || b.is_empty() {
        return false;
    }

    // All normalized forms of each word, cross-checked pairwise. This covers
    // exact matches, inflections caught by stemming, prefixed negations, and
    // compounds like "certainty" vs "uncertain".
    let forms_a = normalized_forms(&a);
    let forms_b = normalized_forms(&b);

    for fa in &forms_a {
        for fb in &forms_b {
            if fa == fb || prefix_within_bound(fa, fb) {
                return true;
            }
        }
    }
    false
}

/// The word plus its stemmed and prefix-stripped forms.
fn normalized_forms(word: &str) -> Vec<String> {
    let mut forms = vec![word.to_string(), stem(word)];
    if let Some(stripped) = strip_prefix(word) {
        forms.push(stem(&stripped));
        forms.push(stripped);
    }
    forms.sort_unstable();
    forms.dedup();
    forms
}

/// One string is a prefix of the other and the lengths are close.
fn prefix_within_bound(a: &str, b: &str) -> bool {
    let (short, long) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    short.len() >= MIN_STEM
        && long.len() - short.len() <= PREFIX_LENGTH_BOUND
        && long.starts_with(short)
}

fn strip_prefix(word: &str) -> Option<String> {
    for prefix in STRIP_PREFIXES {
        if let Some(rest) = word.strip_prefix(prefix) {
            if rest.len() >= MIN_STEM {
                return Some(rest.to_string());
            }
        }
    }
    None
}

/// Strips known suffixes (at most two passes), then normalizes a trailing
/// `y` or `i` away, so `mystery`, `mysteries`, `mysterious`, and
/// `mysteriously` all reduce to `myster`.
fn stem(word: &str) -> String {
    let mut form = word.to_string();
    for _ in 0..2 {
        let mut stripped = false;
        for suffix in STRIP_SUFFIXES {
            if let Some(rest) = form.strip_suffix(suffix) {
                if rest.len() >= MIN_STEM {
                    form = rest.to_string();
                    stripped = true;
                    break;
                }
            }
        }
        if !stripped {
            break;
        }
    }

    while form.len() > MIN_STEM && (form.ends_with('y') || form.ends_with('i')) {
        form.pop();
    }
    form
}
