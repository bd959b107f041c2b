// Owns the dictionaries of the active locale.
//
// Readers take a snapshot of the current DictionarySet and never wait:
// the set is immutable and replaced as a whole. Every replacement goes
// through `write_lock`, and the main dictionary is loaded in the
// background, then installed only if the locale did not change meanwhile.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};
use log::{debug, error, info, warn};
use parking_lot::{Condvar, Mutex, ReentrantMutex, RwLock};

use crate::config::Settings;
use crate::dictionary::same_dictionary;
use crate::executor::{Executor, ThreadExecutor};
use crate::registry::DictionaryRegistry;
use crate::suggestions::{self, Composer, SuggestionContext, SuggestionResults, MAX_SUGGESTIONS};
use crate::{Dictionary, DictionaryType, Locale};

pub const MAIN_DICTIONARY_LOADER: &str = "InitializeMainDictionary";

pub trait DictionaryInitializationListener: Send + Sync {
    fn on_update_main_dictionary_availability(&self, is_available: bool);
}

#[derive(Default)]
pub struct DictionarySet {
    locale: Option<Locale>,
    main: Option<Arc<dyn Dictionary>>,
    subs: HashMap<DictionaryType, Arc<dyn Dictionary>>,
    user_dictionary_enabled: bool,
}

impl DictionarySet {
    fn new(
        locale: Locale,
        main: Option<Arc<dyn Dictionary>>,
        subs: HashMap<DictionaryType, Arc<dyn Dictionary>>,
    ) -> Self {
        let user_dictionary_enabled = subs
            .get(&DictionaryType::User)
            .map_or(false, |d| d.is_initialized());
        Self {
            locale: Some(locale),
            main,
            subs,
            user_dictionary_enabled,
        }
    }

    // Same set, other main dictionary
    fn with_main(&self, main: Option<Arc<dyn Dictionary>>) -> Self {
        Self {
            locale: self.locale.clone(),
            main,
            subs: self.subs.clone(),
            user_dictionary_enabled: self.user_dictionary_enabled,
        }
    }

    pub fn locale(&self) -> Option<&Locale> {
        self.locale.as_ref()
    }

    pub fn get(&self, dictionary_type: DictionaryType) -> Option<&Arc<dyn Dictionary>> {
        match dictionary_type {
            DictionaryType::Main => self.main.as_ref(),
            _ => self.subs.get(&dictionary_type),
        }
    }

    pub fn has(&self, dictionary_type: DictionaryType) -> bool {
        self.get(dictionary_type).is_some()
    }

    pub fn is_user_dictionary_enabled(&self) -> bool {
        self.user_dictionary_enabled
    }

    // Present dictionaries, in priority order
    pub fn dictionaries(&self) -> impl Iterator<Item = (DictionaryType, &Arc<dyn Dictionary>)> {
        DictionaryType::ORDERED
            .into_iter()
            .filter_map(move |t| self.get(t).map(|d| (t, d)))
    }

    fn close(&self) {
        for (dictionary_type, dictionary) in self.dictionaries() {
            debug!("Closing {} dictionary", dictionary_type);
            dictionary.close();
        }
    }
}

// Released once a main dictionary load is over, whatever its outcome
pub(crate) struct LoadLatch {
    released: Mutex<bool>,
    condvar: Condvar,
}

impl LoadLatch {
    fn new(released: bool) -> Self {
        Self {
            released: Mutex::new(released),
            condvar: Condvar::new(),
        }
    }

    fn release(&self) {
        *self.released.lock() = true;
        self.condvar.notify_all();
    }

    pub(crate) fn is_released(&self) -> bool {
        *self.released.lock()
    }

    // Returns false on timeout
    pub(crate) fn wait(&self, timeout: Duration) -> bool {
        let mut released = self.released.lock();
        if *released || timeout.is_zero() {
            return *released;
        }
        match Instant::now().checked_add(timeout) {
            Some(deadline) => {
                while !*released {
                    if self.condvar.wait_until(&mut released, deadline).timed_out() {
                        break;
                    }
                }
            }
            None => {
                while !*released {
                    self.condvar.wait(&mut released);
                }
            }
        }
        *released
    }
}

struct Inner {
    current: RwLock<Arc<DictionarySet>>,
    // Serializes writers. Reentrant so that a load job run inline by the
    // executor can install its result
    write_lock: ReentrantMutex<()>,
    latch: RwLock<Arc<LoadLatch>>,
    registry: DictionaryRegistry,
    executor: Arc<dyn Executor>,
}

impl Inner {
    fn snapshot(&self) -> Arc<DictionarySet> {
        Arc::clone(&self.current.read())
    }

    fn install(&self, set: DictionarySet) {
        *self.current.write() = Arc::new(set);
    }

    fn is_main_dictionary_ready(&self) -> bool {
        self.snapshot()
            .get(DictionaryType::Main)
            .map_or(false, |d| d.is_initialized())
    }

    fn create_sub(
        &self,
        dictionary_type: DictionaryType,
        locale: &Locale,
        prefix: &str,
    ) -> Option<Arc<dyn Dictionary>> {
        match self.registry.create_sub(dictionary_type, locale, prefix) {
            Ok(d) => Some(d),
            Err(e) => {
                warn!("Could not create {} dictionary for {}: {:#}", dictionary_type, locale, e);
                None
            }
        }
    }

    // Must be called with the write lock held
    fn load_main_in_background(
        self: &Arc<Self>,
        locale: &Locale,
        listener: Option<Arc<dyn DictionaryInitializationListener>>,
    ) {
        let latch = Arc::new(LoadLatch::new(false));
        *self.latch.write() = Arc::clone(&latch);
        let inner = Arc::clone(self);
        let locale = locale.clone();
        self.executor.execute(
            MAIN_DICTIONARY_LOADER,
            Box::new(move || {
                match inner.registry.create_main(&locale) {
                    Ok(dictionary) => inner.install_main(&locale, dictionary),
                    Err(e) => error!("Could not load main dictionary for {}: {:#}", locale, e),
                }
                if let Some(listener) = listener {
                    listener.on_update_main_dictionary_availability(inner.is_main_dictionary_ready());
                }
                latch.release();
            }),
        );
    }

    fn install_main(&self, locale: &Locale, dictionary: Arc<dyn Dictionary>) {
        let to_close = {
            let _guard = self.write_lock.lock();
            let current = self.snapshot();
            if current.locale() == Some(locale) {
                let previous = current.get(DictionaryType::Main).cloned();
                self.install(current.with_main(Some(Arc::clone(&dictionary))));
                debug!("Main dictionary for {} is installed", locale);
                previous.filter(|p| !same_dictionary(p, &dictionary))
            } else {
                info!(
                    "Discarding main dictionary for {}: locale changed to {}",
                    locale,
                    current.locale().map_or("none".to_string(), |l| l.to_string())
                );
                Some(dictionary)
            }
        };
        if let Some(dictionary) = to_close {
            dictionary.close();
        }
    }
}

pub struct DictionaryFacilitator {
    inner: Arc<Inner>,
    max_suggestions: usize,
    keep_raw_suggestions: bool,
}

impl DictionaryFacilitator {
    pub fn new(registry: DictionaryRegistry, executor: Arc<dyn Executor>) -> Self {
        Self {
            inner: Arc::new(Inner {
                current: RwLock::new(Arc::new(DictionarySet::default())),
                write_lock: ReentrantMutex::new(()),
                latch: RwLock::new(Arc::new(LoadLatch::new(true))),
                registry,
                executor,
            }),
            max_suggestions: MAX_SUGGESTIONS,
            keep_raw_suggestions: false,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            DictionaryRegistry::from_settings(settings),
            Arc::new(ThreadExecutor),
        )
        .with_max_suggestions(settings.max_suggestions)
        .with_raw_suggestions(settings.keep_raw_suggestions)
    }

    pub fn with_max_suggestions(mut self, max_suggestions: usize) -> Self {
        self.max_suggestions = max_suggestions;
        self
    }

    pub fn with_raw_suggestions(mut self, keep_raw_suggestions: bool) -> Self {
        self.keep_raw_suggestions = keep_raw_suggestions;
        self
    }

    // The dictionaries in use right now. Never blocks on a load
    pub fn snapshot(&self) -> Arc<DictionarySet> {
        self.inner.snapshot()
    }

    pub fn locale(&self) -> Option<Locale> {
        self.snapshot().locale().cloned()
    }

    pub fn dictionary(&self, dictionary_type: DictionaryType) -> Option<Arc<dyn Dictionary>> {
        self.snapshot().get(dictionary_type).cloned()
    }

    pub fn has_dictionary(&self, dictionary_type: DictionaryType) -> bool {
        self.snapshot().has(dictionary_type)
    }

    pub fn is_user_dictionary_enabled(&self) -> bool {
        self.snapshot().is_user_dictionary_enabled()
    }

    // Switch to the dictionaries needed for `locale`, reusing whatever
    // can be reused. The main dictionary is loaded in the background
    // if the locale changed or if `force_reload_main` is set.
    pub fn reset(
        &self,
        locale: &Locale,
        use_contacts: bool,
        use_personalized: bool,
        force_reload_main: bool,
        prefix: &str,
        listener: Option<Arc<dyn DictionaryInitializationListener>>,
    ) {
        let is_wanted = |dictionary_type: DictionaryType| match dictionary_type {
            DictionaryType::Main | DictionaryType::User => true,
            DictionaryType::Contacts => use_contacts,
            DictionaryType::UserHistory
            | DictionaryType::Personalization
            | DictionaryType::Contextual => use_personalized,
        };

        let (old, locale_changed, reload_main) = {
            let _guard = self.inner.write_lock.lock();
            let old = self.snapshot();
            let locale_changed = old.locale() != Some(locale);
            let reload_main = locale_changed || force_reload_main;

            let main = if reload_main {
                None
            } else {
                old.get(DictionaryType::Main).cloned()
            };

            let mut subs = HashMap::new();
            for dictionary_type in DictionaryType::SUB_TYPES {
                if !is_wanted(dictionary_type) {
                    continue;
                }
                let dictionary = match old.get(dictionary_type) {
                    Some(d) if !locale_changed => Some(Arc::clone(d)),
                    _ => self.inner.create_sub(dictionary_type, locale, prefix),
                };
                if let Some(d) = dictionary {
                    subs.insert(dictionary_type, d);
                }
            }

            self.inner
                .install(DictionarySet::new(locale.clone(), main, subs));
            info!("Dictionaries reset for {}", locale);

            if reload_main {
                self.inner.load_main_in_background(locale, listener.clone());
            }
            (old, locale_changed, reload_main)
        };

        if let Some(listener) = listener {
            listener.on_update_main_dictionary_availability(self.is_main_dictionary_ready());
        }

        // Only close what the new set no longer holds
        if reload_main {
            if let Some(main) = old.get(DictionaryType::Main) {
                main.close();
            }
        }
        for dictionary_type in DictionaryType::SUB_TYPES {
            if locale_changed || !is_wanted(dictionary_type) {
                if let Some(dictionary) = old.get(dictionary_type) {
                    dictionary.close();
                }
            }
        }
    }

    pub fn is_main_dictionary_ready(&self) -> bool {
        self.inner.is_main_dictionary_ready()
    }

    // Wait at most `timeout` for the pending main dictionary load, if any.
    // Returns whether the main dictionary is ready
    pub fn wait_for_main_dictionary(&self, timeout: Duration) -> bool {
        let latch = Arc::clone(&self.inner.latch.read());
        if !latch.wait(timeout) {
            debug!("Main dictionary still loading after {:?}", timeout);
        }
        self.is_main_dictionary_ready()
    }

    pub fn close_all(&self) {
        let old = {
            let _guard = self.inner.write_lock.lock();
            let old = self.snapshot();
            self.inner.install(DictionarySet::default());
            old
        };
        old.close();
    }

    // Is the word known by any dictionary? With `ignore_case`, its
    // lower-case form is looked up too
    pub fn is_valid_word(&self, word: &str, ignore_case: bool) -> bool {
        if word.is_empty() {
            return false;
        }
        let set = self.snapshot();
        let locale = match set.locale() {
            Some(l) => l,
            None => return false,
        };
        let lower_case = if ignore_case {
            Some(locale.to_lowercase(word))
        } else {
            None
        };
        let found = set.dictionaries().any(|(_, dictionary)| {
            dictionary.is_valid_word(word)
                || lower_case
                    .as_deref()
                    .map_or(false, |w| dictionary.is_valid_word(w))
        });
        found
    }

    pub fn suggestion_results<C: Composer + ?Sized>(
        &self,
        composer: &C,
        context: &SuggestionContext,
    ) -> SuggestionResults {
        let set = self.snapshot();
        let results = SuggestionResults::new(
            set.locale().cloned(),
            self.max_suggestions,
            context.is_beginning_of_sentence,
            self.keep_raw_suggestions,
        );
        suggestions::collect(set.dictionaries(), composer.typed_code(), results)
    }

    pub fn remove_word_from_personalized_dicts(&self, word: &str) {
        let set = self.snapshot();
        for dictionary_type in [
            DictionaryType::UserHistory,
            DictionaryType::Personalization,
            DictionaryType::Contextual,
        ] {
            if let Some(dictionary) = set.get(dictionary_type) {
                if dictionary.remove_word(word) {
                    debug!("Removed '{}' from {} dictionary", word, dictionary_type);
                }
            }
        }
    }

    pub fn add_word_to_user_dictionary(&self, code: &str, word: &str) -> Result<()> {
        let set = self.snapshot();
        let user = set
            .get(DictionaryType::User)
            .ok_or_else(|| anyhow!("No user dictionary"))?;
        user.add_entry(code, word)
    }
}
