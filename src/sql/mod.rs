pub(crate) mod models;
mod schema;
mod store;

pub use store::{default_db_path, SqlDictionary, LEXICON_VERSION};
