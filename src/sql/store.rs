// Note: this is the indexed store for large lexicons. Entries are looked up
// with LIKE, so the connection must use case-sensitive LIKE for the index on
// `code` to be used (and for 'A' not to match 'a')

use std::fmt::{Debug, Formatter};
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use log::{debug, info, warn};
use parking_lot::Mutex;

use crate::lexicon::{to_suggestions, CodeIndex, CodePattern, DEFAULT_WILDCARD};
use crate::sql::models::*;
use crate::sql::schema::*;
use crate::{Dictionary, DictionaryType, SuggestedWord};

diesel_migrations::embed_migrations!("migrations");

// Bump this when the bundled lexicon changes: stores holding an other
// version are dropped and rebuilt
pub const LEXICON_VERSION: &str = "1";

const VERSION_KEY: &str = "lexicon_version";
const INSERT_BATCH_SIZE: usize = 500;

pub fn default_db_path(data_dir: &Path, name: &str) -> Result<String> {
    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("Could not create {}", data_dir.display()))?;
    let db_path = data_dir.join(format!("{}.db", name));
    let url = db_path
        .to_str()
        .ok_or_else(|| anyhow!("{} contains non-UTF-8 chars", db_path.display()))?;
    Ok(url.to_string())
}

pub struct SqlDictionary {
    dictionary_type: DictionaryType,
    url: String,
    // None once closed
    connection: Mutex<Option<SqliteConnection>>,
    wildcard: char,
    completion: bool,
}

impl Debug for SqlDictionary {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        write!(f, "SqlDictionary<{}, {}>", self.dictionary_type, self.url)
    }
}

impl SqlDictionary {
    pub fn open(dictionary_type: DictionaryType, url: &str) -> Result<Self> {
        let connection = SqliteConnection::establish(url)
            .with_context(|| format!("Could not connect to {}", url))?;
        embedded_migrations::run(&connection).with_context(|| "Could not migrate db")?;
        diesel::sql_query("PRAGMA case_sensitive_like = true")
            .execute(&connection)
            .with_context(|| "Could not enable case sensitive LIKE")?;
        Ok(Self {
            dictionary_type,
            url: url.to_string(),
            connection: Mutex::new(Some(connection)),
            wildcard: DEFAULT_WILDCARD,
            completion: true,
        })
    }

    #[cfg(test)]
    pub(crate) fn in_memory(dictionary_type: DictionaryType) -> Self {
        Self::open(dictionary_type, ":memory:").unwrap()
    }

    pub fn with_wildcard(mut self, wildcard: char) -> Self {
        self.wildcard = wildcard;
        self
    }

    pub fn with_completion(mut self, completion: bool) -> Self {
        self.completion = completion;
        self
    }

    fn with_connection<T>(&self, f: impl FnOnce(&SqliteConnection) -> Result<T>) -> Result<T> {
        let guard = self.connection.lock();
        match guard.as_ref() {
            Some(c) => f(c),
            None => bail!("{:?} is closed", self),
        }
    }

    pub fn stored_version(&self) -> Result<Option<String>> {
        self.with_connection(|connection| {
            lexicon_meta::table
                .filter(lexicon_meta::name.eq(VERSION_KEY))
                .select(lexicon_meta::value)
                .first::<String>(connection)
                .optional()
                .with_context(|| "Could not read lexicon version")
        })
    }

    pub fn num_entries(&self) -> Result<i64> {
        self.with_connection(|connection| {
            lexicon_entries::table
                .count()
                .get_result::<i64>(connection)
                .with_context(|| "Could not count lexicon entries")
        })
    }

    // Fill the store from `source` unless it already holds the current
    // lexicon version. Returns true if the store was rebuilt
    pub fn populate_if_needed(&self, source: impl FnOnce() -> Result<CodeIndex>) -> Result<bool> {
        let version = self.stored_version()?;
        if version.as_deref() == Some(LEXICON_VERSION) && self.num_entries()? > 0 {
            debug!("{:?} is up to date", self);
            return Ok(false);
        }
        if let Some(v) = version {
            info!("Dropping lexicon version {} from {:?}", v, self);
        }
        let index = source()?;
        self.rebuild(&index)?;
        Ok(true)
    }

    // Replace every entry with the contents of `index`
    pub fn rebuild(&self, index: &CodeIndex) -> Result<()> {
        self.with_connection(|connection| {
            connection.transaction::<_, anyhow::Error, _>(|| {
                diesel::delete(lexicon_entries::table)
                    .execute(connection)
                    .with_context(|| "Could not clear lexicon entries")?;

                let mut batch = Vec::with_capacity(INSERT_BATCH_SIZE);
                for (code, word) in index.iter() {
                    batch.push(NewEntry { code, word });
                    if batch.len() == INSERT_BATCH_SIZE {
                        insert_entries(connection, std::mem::take(&mut batch))?;
                    }
                }
                if !batch.is_empty() {
                    insert_entries(connection, batch)?;
                }

                diesel::replace_into(lexicon_meta::table)
                    .values(NewMeta {
                        name: VERSION_KEY,
                        value: LEXICON_VERSION,
                    })
                    .execute(connection)
                    .with_context(|| "Could not store lexicon version")?;
                Ok(())
            })
        })?;
        info!("Stored {} codes in {:?}", index.num_codes(), self);
        Ok(())
    }

    fn lookup(&self, pattern: &CodePattern, limit: usize) -> Result<Vec<(String, String)>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        self.with_connection(|connection| {
            lexicon_entries::table
                .filter(lexicon_entries::code.like(pattern.to_like_pattern()))
                .order((lexicon_entries::code.asc(), lexicon_entries::id.asc()))
                .select((lexicon_entries::code, lexicon_entries::word))
                .limit(limit)
                .load::<(String, String)>(connection)
                .with_context(|| "Could not look up lexicon entries")
        })
    }

    fn contains(&self, word: &str) -> Result<bool> {
        self.with_connection(|connection| {
            Ok(lexicon_entries::table
                .filter(lexicon_entries::word.eq(word))
                .select(lexicon_entries::id)
                .first::<i32>(connection)
                .optional()
                .with_context(|| "Error when checking if word is in lexicon")?
                .is_some())
        })
    }
}

fn insert_entries(connection: &SqliteConnection, entries: Vec<NewEntry<'_>>) -> Result<()> {
    diesel::insert_into(lexicon_entries::table)
        .values(entries)
        .execute(connection)
        .with_context(|| "Could not insert lexicon entries")?;
    Ok(())
}

impl Dictionary for SqlDictionary {
    fn dictionary_type(&self) -> DictionaryType {
        self.dictionary_type
    }

    fn suggestions(&self, typed_code: &str, limit: usize) -> Vec<SuggestedWord> {
        let pattern = match CodePattern::parse(typed_code, self.wildcard, self.completion) {
            Some(p) => p,
            None => return vec![],
        };
        if !self.is_initialized() {
            return vec![];
        }
        match self.lookup(&pattern, limit) {
            Ok(rows) => {
                let matches: Vec<_> = rows
                    .iter()
                    .map(|(c, w)| (c.as_str(), w.as_str()))
                    .collect();
                to_suggestions(&matches, typed_code, self.dictionary_type)
            }
            Err(e) => {
                warn!("{:#}", e);
                vec![]
            }
        }
    }

    fn is_valid_word(&self, word: &str) -> bool {
        if !self.is_initialized() {
            return false;
        }
        self.contains(word).unwrap_or_else(|e| {
            warn!("{:#}", e);
            false
        })
    }

    fn is_initialized(&self) -> bool {
        self.connection.lock().is_some()
    }

    fn close(&self) {
        if self.connection.lock().take().is_some() {
            debug!("Closed {:?}", self);
        }
    }

    fn add_entry(&self, code: &str, word: &str) -> Result<()> {
        self.with_connection(|connection| {
            diesel::insert_into(lexicon_entries::table)
                .values(NewEntry { code, word })
                .execute(connection)
                .with_context(|| format!("Could not insert '{}' for code '{}'", word, code))?;
            Ok(())
        })
    }

    fn remove_word(&self, word: &str) -> bool {
        let res = self.with_connection(|connection| {
            diesel::delete(lexicon_entries::table)
                .filter(lexicon_entries::word.eq(word))
                .execute(connection)
                .with_context(|| format!("Could not remove '{}'", word))
        });
        match res {
            Ok(num_rows) => num_rows != 0,
            Err(e) => {
                warn!("{:#}", e);
                false
            }
        }
    }
}
