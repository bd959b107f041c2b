mod fake_dictionary;

pub(crate) use fake_dictionary::FakeDictionary;
pub(crate) use manual_executor::ManualExecutor;
