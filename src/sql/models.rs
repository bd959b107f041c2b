use crate::sql::schema::{lexicon_entries, lexicon_meta};

#[derive(Insertable)]
#[table_name = "lexicon_entries"]
pub(crate) struct NewEntry<'a> {
    pub code: &'a str,
    pub word: &'a str,
}

#[derive(Insertable)]
#[table_name = "lexicon_meta"]
pub(crate) struct NewMeta<'a> {
    pub name: &'a str,
    pub value: &'a str,
}
