table! {
    lexicon_entries (id) {
        id -> Integer,
        code -> Text,
        word -> Text,
    }
}

table! {
    lexicon_meta (name) {
        name -> Text,
        value -> Text,
    }
}

allow_tables_to_appear_in_same_query!(lexicon_entries, lexicon_meta,);
