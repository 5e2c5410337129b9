use std::fmt::Write as _;

/// Facts gathered while acquiring the payload binary, used to enrich error reports.
#[derive(Debug, Default)]
pub struct Diagnostics {
    facts: Vec<(&'static str, String)>,
    warnings: Vec<String>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a fact, replacing any earlier value under the same key.
    pub fn record(&mut self, key: &'static str, value: impl Into<String>) {
        let value = value.into();
        if let Some(slot) = self.facts.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = value;
        } else {
            self.facts.push((key, value));
        }
    }

    /// Record a non-fatal problem and emit it as a warning.
    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!("{message}");
        self.warnings.push(message);
    }

    #[cfg(test)]
    pub(crate) fn get(&self, key: &str) -> Option<&str> {
        self.facts
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Render the collected facts, one `key: value` per line, with `indent` prefixed.
    pub fn render(&self, indent: &str) -> String {
        let mut out = String::new();
        for (key, value) in &self.facts {
            let _ = writeln!(out, "{indent}{key}: {value}");
        }
        for warning in &self.warnings {
            let _ = writeln!(out, "{indent}warning: {warning}");
        }
        out
    }
}
