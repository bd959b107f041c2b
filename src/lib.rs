#[macro_use]
extern crate diesel;
#[macro_use]
extern crate diesel_migrations;
#[macro_use]
extern crate lazy_static;

pub mod cli;
pub mod config;
mod dictionary;
mod dynamic;
pub mod executor;
mod facilitator;
pub mod lexicon;
mod locale;
mod logger;
pub mod registry;
mod sql;
mod suggestions;

#[cfg(test)]
mod tests;

pub use config::{Backend, Settings};
pub use dictionary::{same_dictionary, Dictionary, DictionaryType, SuggestedWord, SuggestionKind};
pub use dynamic::DynamicDictionary;
pub use executor::{Executor, ThreadExecutor};
pub use facilitator::{DictionaryFacilitator, DictionaryInitializationListener, DictionarySet};
pub use lexicon::{CodeIndex, CodePattern, StaticLexicon};
pub use locale::Locale;
pub use registry::DictionaryRegistry;
pub use sql::{SqlDictionary, LEXICON_VERSION};
pub use suggestions::{Composer, SuggestionContext, SuggestionResults, MAX_SUGGESTIONS};

#[macro_export]
macro_rules! info_1 {
    ($($arg:tt)*) => ({
        use colored::*;
        println!("{} {}", "::".bold().blue(), format!($($arg)*));
    })
}

#[macro_export]
macro_rules! print_error {
    ($($arg:tt)*) => ({
        use colored::*;

        eprintln!("{} {}", "Error:".red(), format!($($arg)*));
    })
}
