use lazy_static::lazy_static;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    // Word runs, or runs of punctuation, the same split a word/punct tokenizer makes.
    static ref RE: Regex = Regex::new(r"(?u)\w+|[^\w\s]+").expect("valid regex");
}

/// Split text into (raw token, position) pairs after NFKC normalization.
///
/// Tokens keep their original case; punctuation runs come out as their own
/// tokens so later filtering can drop them.
pub fn tokenize(text: &str) -> Vec<(String, usize)> {
    let normalized = text.nfkc().collect::<String>();
    tokenize_raw(&normalized)
}

/// Same as [`tokenize`] without the NFKC pass.
pub fn tokenize_raw(text: &str) -> Vec<(String, usize)> {
    RE.find_iter(text)
        .enumerate()
        .map(|(pos, mat)| (mat.as_str().to_string(), pos))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_words_and_punctuation() {
        let t = tokenize("Кот, сидит!! 42");
        let words: Vec<&str> = t.iter().map(|(w, _)| w.as_str()).collect();
        assert_eq!(words, vec!["Кот", ",", "сидит", "!!", "42"]);
        assert_eq!(t[2].1, 2);
    }

    #[test]
    fn nfkc_composes_decomposed_letters() {
        // "й" written as и + combining breve
        let t = tokenize("мои\u{0306}");
        assert_eq!(t[0].0, "мой");
    }
}
