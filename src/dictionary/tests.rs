use super::*;

#[test]
fn test_priority_order_starts_with_main() {
    assert_eq!(DictionaryType::ORDERED[0], DictionaryType::Main);
    assert_eq!(&DictionaryType::ORDERED[1..], &DictionaryType::SUB_TYPES);
}

#[test]
fn test_suggested_word_kind_and_score() {
    let exact = SuggestedWord::new("工", "a", "a", DictionaryType::Main, 0);
    assert_eq!(exact.kind, SuggestionKind::Correction);
    assert_eq!(exact.score, 1000);

    let completion = SuggestedWord::new("式", "aa", "a", DictionaryType::Main, 3);
    assert_eq!(completion.kind, SuggestionKind::Completion);
    assert_eq!(completion.score, 997);
}

#[test]
fn test_score_saturates() {
    let far = SuggestedWord::new("x", "a", "a", DictionaryType::User, usize::MAX);
    assert_eq!(far.score, MAX_SCORE - i32::MAX);
}

#[test]
fn test_dictionary_type_names() {
    assert_eq!(DictionaryType::UserHistory.to_string(), "history");
    let parsed: DictionaryType = serde_json::from_str("\"user_history\"").unwrap();
    assert_eq!(parsed, DictionaryType::UserHistory);
}
