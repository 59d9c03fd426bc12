//! ObservationScope for automatic begin/complete logging
//!
//! - Logs `{name}_BEGIN` on creation (INFO)
//! - Logs `{name}_COMPLETE` when `complete()` is called (INFO)
//! - Logs `{name}_ABORTED` on drop if never completed (WARN)
//!
//! Used around unit-of-work completion so every root transaction leaves a
//! begin/end pair in the log even on early exit.

use std::cell::Cell;

use super::logger::Logger;

/// A scope that automatically logs begin and completion events.
pub struct ObservationScope<'a> {
    name: &'a str,
    completed: Cell<bool>,
    fields: Vec<(&'a str, String)>,
}

impl<'a> ObservationScope<'a> {
    /// Create a new observation scope and log `{name}_BEGIN`.
    pub fn new(name: &'a str) -> Self {
        Logger::info(&format!("{}_BEGIN", name), &[]);
        Self {
            name,
            completed: Cell::new(false),
            fields: Vec::new(),
        }
    }

    /// Attach a field reported with the completion event.
    pub fn field(&mut self, key: &'a str, value: impl Into<String>) {
        self.fields.push((key, value.into()));
    }

    /// Mark the scope successful and log `{name}_COMPLETE`.
    pub fn complete(self) {
        self.completed.set(true);
        self.emit("COMPLETE");
    }

    fn emit(&self, suffix: &str) {
        let event = format!("{}_{}", self.name, suffix);
        let fields: Vec<(&str, &str)> = self
            .fields
            .iter()
            .map(|(k, v)| (*k, v.as_str()))
            .collect();
        if suffix == "COMPLETE" {
            Logger::info(&event, &fields);
        } else {
            Logger::warn(&event, &fields);
        }
    }
}

impl Drop for ObservationScope<'_> {
    fn drop(&mut self) {
        if !self.completed.get() {
            self.emit("ABORTED");
        }
    }
}
