//! Context verification — TF-IDF cosine between the evidence lines of a matched skill.
//!
//! Tokens are lowercase runs of two or more word characters with English stop words
//! removed. The two evidence texts form the whole corpus, idf is smoothed
//! (`ln((1 + n) / (1 + df)) + 1`) and rows are L2-normalized before the cosine.

use std::collections::{BTreeMap, HashSet};

use once_cell::sync::Lazy;
use regex::Regex;

static TOKEN_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b\w\w+\b").expect("token pattern is valid"));

static STOP_WORDS: Lazy<HashSet<&'static str>> =
    Lazy::new(|| ENGLISH_STOP_WORDS.iter().copied().collect());

/// Cosine similarity of the TF-IDF vectors of `a` and `b`.
///
/// Returns `None` when neither text has a single non-stop-word token; callers treat
/// that as "no additional evidence" and keep the base weight.
pub fn context_similarity(a: &str, b: &str) -> Option<f64> {
    let docs = [term_counts(a), term_counts(b)];

    let vocabulary: BTreeMap<&str, usize> = docs
        .iter()
        .flat_map(|counts| counts.keys())
        .map(|term| (term.as_str(), docs.iter().filter(|d| d.contains_key(term)).count()))
        .collect();
    if vocabulary.is_empty() {
        return None;
    }

    let n = docs.len() as f64;
    let rows: Vec<Vec<f64>> = docs
        .iter()
        .map(|counts| {
            let mut row: Vec<f64> = vocabulary
                .iter()
                .map(|(term, df)| {
                    let tf = counts.get(*term).copied().unwrap_or(0) as f64;
                    let idf = ((1.0 + n) / (1.0 + *df as f64)).ln() + 1.0;
                    tf * idf
                })
                .collect();
            l2_normalize(&mut row);
            row
        })
        .collect();

    Some(rows[0].iter().zip(&rows[1]).map(|(x, y)| x * y).sum())
}

fn term_counts(text: &str) -> BTreeMap<String, usize> {
    let lowered = text.to_lowercase();
    let mut counts = BTreeMap::new();
    for token in TOKEN_PATTERN.find_iter(&lowered).map(|m| m.as_str()) {
        if STOP_WORDS.contains(token) {
            continue;
        }
        *counts.entry(token.to_string()).or_insert(0) += 1;
    }
    counts
}

fn l2_normalize(row: &mut [f64]) {
    let norm = row.iter().map(|v| v * v).sum::<f64>().sqrt();
    if norm > 0.0 {
        row.iter_mut().for_each(|v| *v /= norm);
    }
}

const ENGLISH_STOP_WORDS: &[&str] = &[
    "a", "about", "above", "across", "after", "afterwards", "again", "against", "all",
    "almost", "alone", "along", "already", "also", "although", "always", "am", "among",
    "amongst", "amoungst", "amount", "an", "and", "another", "any", "anyhow", "anyone",
    "anything", "anyway", "anywhere", "are", "around", "as", "at", "back", "be", "became",
    "because", "become", "becomes", "becoming", "been", "before", "beforehand", "behind",
    "being", "below", "beside", "besides", "between", "beyond", "bill", "both", "bottom",
    "but", "by", "call", "can", "cannot", "cant", "co", "con", "could", "couldnt", "cry",
    "de", "describe", "detail", "do", "done", "down", "due", "during", "each", "eg", "eight",
    "either", "eleven", "else", "elsewhere", "empty", "enough", "etc", "even", "ever",
    "every", "everyone", "everything", "everywhere", "except", "few", "fifteen", "fifty",
    "fill", "find", "fire", "first", "five", "for", "former", "formerly", "forty", "found",
    "four", "from", "front", "full", "further", "get", "give", "go", "had", "has", "hasnt",
    "have", "he", "hence", "her", "here", "hereafter", "hereby", "herein", "hereupon", "hers",
    "herself", "him", "himself", "his", "how", "however", "hundred", "i", "ie", "if", "in",
    "inc", "indeed", "interest", "into", "is", "it", "its", "itself", "keep", "last",
    "latter", "latterly", "least", "less", "ltd", "made", "many", "may", "me", "meanwhile",
    "might", "mill", "mine", "more", "moreover", "most", "mostly", "move", "much", "must",
    "my", "myself", "name", "namely", "neither", "never", "nevertheless", "next", "nine",
    "no", "nobody", "none", "noone", "nor", "not", "nothing", "now", "nowhere", "of", "off",
    "often", "on", "once", "one", "only", "onto", "or", "other", "others", "otherwise", "our",
    "ours", "ourselves", "out", "over", "own", "part", "per", "perhaps", "please", "put",
    "rather", "re", "same", "see", "seem", "seemed", "seeming", "seems", "serious", "several",
    "she", "should", "show", "side", "since", "sincere", "six", "sixty", "so", "some",
    "somehow", "someone", "something", "sometime", "sometimes", "somewhere", "still", "such",
    "system", "take", "ten", "than", "that", "the", "their", "them", "themselves", "then",
    "thence", "there", "thereafter", "thereby", "therefore", "therein", "thereupon", "these",
    "they", "thick", "thin", "third", "this", "those", "though", "three", "through",
    "throughout", "thru", "thus", "to", "together", "too", "top", "toward", "towards",
    "twelve", "twenty", "two", "un", "under", "until", "up", "upon", "us", "very", "via",
    "was", "we", "well", "were", "what", "whatever", "when", "whence", "whenever", "where",
    "whereafter", "whereas", "whereby", "wherein", "whereupon", "wherever", "whether",
    "which", "while", "whither", "who", "whoever", "whole", "whom", "whose", "why", "will",
    "with", "within", "without", "would", "yet", "you", "your", "yours", "yourself",
    "yourselves",
];
