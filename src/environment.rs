use std::collections::HashMap;
use std::ffi::OsString;

/// Snapshot of shell variables handed to built-ins.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Environment {
    vars: HashMap<String, String>,
}

impl Environment {
    /// Import the OS environment of the current process. Variables whose
    /// name or value is not valid UTF-8 are skipped; children still inherit
    /// them unchanged.
    pub fn new() -> Self {
        Environment::from_os(std::env::vars_os())
    }

    pub fn from_os<I>(vars: I) -> Self
    where
        I: IntoIterator<Item = (OsString, OsString)>,
    {
        let vars = vars
            .into_iter()
            .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)))
            .collect();
        Environment { vars }
    }

    pub fn empty() -> Self {
        Environment::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(|v| v.as_str())
    }

    pub fn set(&mut self, key: &str, value: &str) {
        self.vars.insert(key.to_string(), value.to_string());
    }

    pub fn unset(&mut self, key: &str) {
        self.vars.remove(key);
    }
}
