use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::*;
use log::warn;

use crate::config::Settings;
use crate::lexicon::read_lexicon;
use crate::registry::open_main_db;
use crate::{info_1, print_error};
use crate::{Dictionary, DictionaryFacilitator, Locale, SuggestionContext};

pub fn run() -> Result<()> {
    let opts: Opts = Opts::parse();
    crate::logger::init(opts.verbose)?;

    let settings = match &opts.config {
        Some(path) => Settings::load(path)?,
        None => Settings::load_default()?,
    };
    let locale = match &opts.locale {
        Some(tag) => Locale::new(tag)?,
        None => settings.main_locale()?,
    };

    match opts.action {
        Action::Suggest(opts) => suggest(&settings, &locale, opts),
        Action::Check(opts) => check(&settings, &locale, opts),
        Action::BuildDb(opts) => build_db(settings, &locale, opts),
        Action::AddWord(opts) => add_word(&settings, &locale, opts),
    }
}

#[derive(Parser)]
#[clap(version = env!("CARGO_PKG_VERSION"))]
struct Opts {
    #[clap(long, global = true, help = "Path to the settings file")]
    config: Option<PathBuf>,

    #[clap(
        long,
        global = true,
        help = "Locale to use",
        long_help = "Locale to use, like zh_CN - defaults to the main_locale setting"
    )]
    locale: Option<String>,

    #[clap(short, long, global = true, help = "Print debug messages")]
    verbose: bool,

    #[clap(subcommand)]
    action: Action,
}

#[derive(Subcommand)]
enum Action {
    #[clap(about = "Suggest words for the given code")]
    Suggest(SuggestOpts),
    #[clap(about = "Check whether words are known by the dictionaries")]
    Check(CheckOpts),
    #[clap(about = "Store the main lexicon in a sqlite database")]
    BuildDb(BuildDbOpts),
    #[clap(about = "Add a word to the user dictionary")]
    AddWord(AddWordOpts),
}

#[derive(Args)]
struct SuggestOpts {
    code: String,

    #[clap(long, help = "Print results as JSON")]
    json: bool,

    #[clap(long, help = "Also use the personalized dictionaries")]
    personalized: bool,

    #[clap(long, help = "Do not wait for the main dictionary")]
    no_wait: bool,
}

#[derive(Args)]
struct CheckOpts {
    #[clap(help = "List of words to check")]
    words: Vec<String>,

    #[clap(long)]
    ignore_case: bool,
}

#[derive(Args)]
struct BuildDbOpts {
    #[clap(long, help = "Lexicon to store instead of the configured one")]
    lexicon: Option<PathBuf>,

    #[clap(long, help = "Rebuild even if the database is up to date")]
    force: bool,
}

#[derive(Args)]
struct AddWordOpts {
    code: String,
    word: String,
}

fn open_facilitator(
    settings: &Settings,
    locale: &Locale,
    use_personalized: bool,
    wait: bool,
) -> DictionaryFacilitator {
    let facilitator = DictionaryFacilitator::from_settings(settings);
    facilitator.reset(locale, false, use_personalized, false, "", None);
    if wait && !facilitator.wait_for_main_dictionary(settings.load_timeout()) {
        warn!("Main dictionary for {} is not available", locale);
    }
    facilitator
}

fn suggest(settings: &Settings, locale: &Locale, opts: SuggestOpts) -> Result<()> {
    let facilitator = open_facilitator(settings, locale, opts.personalized, !opts.no_wait);
    let results = facilitator.suggestion_results(&opts.code, &SuggestionContext::default());
    facilitator.close_all();

    if opts.json {
        let json = serde_json::to_string_pretty(&results)
            .with_context(|| "Could not serialize suggestions")?;
        println!("{}", json);
        return Ok(());
    }

    if results.is_empty() {
        println!("No suggestion for {}", opts.code.bold());
    }
    for (i, suggestion) in results.words().iter().enumerate() {
        println!(
            "{:>2}. {} {} {}",
            i + 1,
            suggestion.word,
            suggestion.code.blue(),
            suggestion.source.to_string().dimmed()
        );
    }
    Ok(())
}

fn check(settings: &Settings, locale: &Locale, opts: CheckOpts) -> Result<()> {
    if opts.words.is_empty() {
        println!("No word given - nothing to do");
        return Ok(());
    }

    let facilitator = open_facilitator(settings, locale, false, true);
    let mut unknown = 0;
    for word in &opts.words {
        if facilitator.is_valid_word(word, opts.ignore_case) {
            println!("{} {}", "ok".green(), word);
        } else {
            print_error!("unknown word: {}", word.bold());
            unknown += 1;
        }
    }
    facilitator.close_all();

    if unknown != 0 {
        std::process::exit(1);
    }
    Ok(())
}

fn build_db(mut settings: Settings, locale: &Locale, opts: BuildDbOpts) -> Result<()> {
    if opts.lexicon.is_some() {
        settings.lexicon_path = opts.lexicon;
    }
    let lexicon_path = settings.lexicon_path.as_deref();

    let dictionary = open_main_db(&settings, locale)?;
    let rebuilt = if opts.force {
        dictionary.rebuild(&read_lexicon(lexicon_path)?)?;
        true
    } else {
        dictionary.populate_if_needed(|| read_lexicon(lexicon_path))?
    };
    let num_entries = dictionary.num_entries()?;
    dictionary.close();

    if rebuilt {
        info_1!("Stored {} entries for {}", num_entries, locale);
    } else {
        info_1!("Database for {} is up to date ({} entries)", locale, num_entries);
    }
    Ok(())
}

fn add_word(settings: &Settings, locale: &Locale, opts: AddWordOpts) -> Result<()> {
    let facilitator = open_facilitator(settings, locale, false, false);
    let res = facilitator.add_word_to_user_dictionary(&opts.code, &opts.word);
    facilitator.close_all();
    res?;

    info_1!(
        "Added {} for code {} to the user dictionary",
        opts.word.bold(),
        opts.code.blue()
    );
    Ok(())
}
