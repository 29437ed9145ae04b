use log::warn;
use tokenizers::{
    pre_tokenizers::whitespace::Whitespace, OffsetReferential, OffsetType, PreTokenizedString,
    PreTokenizer,
};

use super::lemmatizer;

/// Split text into word and punctuation tokens (`\w+|[^\w\s]+`)
pub fn word_tokenize(text: &str) -> Vec<String> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    let mut pretokenized = PreTokenizedString::from(text);

    if let Err(err) = Whitespace::default().pre_tokenize(&mut pretokenized) {
        warn!("Pre-tokenization failed, splitting on whitespace: {}", err);

        return text.split_whitespace().map(str::to_string).collect();
    }

    pretokenized
        .get_splits(OffsetReferential::Original, OffsetType::Byte)
        .into_iter()
        .map(|(token, _, _)| token.to_string())
        .collect()
}

/// Tokenize text into lowercase, lemmatized, whitespace-trimmed word tokens
pub fn tokenize(text: &str) -> Vec<String> {
    word_tokenize(text)
        .into_iter()
        .map(|token| lemmatizer::lemmatize(&token.to_lowercase()).trim().to_string())
        .filter(|token| !token.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn empty_input_has_no_tokens() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("   \n\t").is_empty());
    }

    #[test]
    fn tokens_are_lowercase_and_trimmed() {
        let tokens = tokenize("Running RUNS");

        assert_eq!(tokens.len(), 2);
        for token in &tokens {
            assert_eq!(token, &token.to_lowercase());
            assert_eq!(token, token.trim());
        }
    }

    #[test]
    fn splits_punctuation_from_words() {
        assert_eq!(
            word_tokenize("We need water, food!"),
            vec!["We", "need", "water", ",", "food", "!"]
        );
    }

    #[test]
    fn plural_nouns_are_reduced() {
        assert_eq!(
            tokenize("Tents and BLANKETS needed"),
            vec!["tent", "and", "blanket", "needed"]
        );
    }

    #[test]
    fn short_plurals_are_not_over_stripped() {
        assert_eq!(tokenize("ties, dies or lies"), vec!["tie", ",", "die", "or", "lie"]);
    }

    #[test]
    fn tokenizing_twice_gives_the_same_tokens() {
        let text = "Is the Hurricane over or is it not over";

        assert_eq!(tokenize(text), tokenize(text));
    }
}
