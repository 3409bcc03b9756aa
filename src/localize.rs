//! Localized UI strings.

use std::collections::HashMap;

/// Title of the notification shown when the push stream reports an error.
pub const PUSH_ERROR: u32 = 30101;

/// "Executed command %s".
pub const EXECUTED_COMMAND: u32 = 30104;

/// Looks up UI strings by numeric id.
pub trait Localizer: Send + Sync {
    fn localize(&self, id: u32) -> String;
}

/// Built-in English strings, optionally overridden per id.
#[derive(Debug, Clone, Default)]
pub struct CatalogLocalizer {
    overrides: HashMap<u32, String>,
}

impl CatalogLocalizer {
    pub fn new(overrides: HashMap<u32, String>) -> Self {
        Self { overrides }
    }

    fn builtin(id: u32) -> Option<&'static str> {
        match id {
            PUSH_ERROR => Some("Pushbullet error"),
            EXECUTED_COMMAND => Some("Executed command %s"),
            _ => None,
        }
    }
}

impl Localizer for CatalogLocalizer {
    fn localize(&self, id: u32) -> String {
        self.overrides
            .get(&id)
            .cloned()
            .or_else(|| Self::builtin(id).map(str::to_string))
            .unwrap_or_else(|| format!("#{}", id))
    }
}

/// Substitutes `arg` for the first `%s`.
pub fn format_localized(template: &str, arg: &str) -> String {
    template.replacen("%s", arg, 1)
}
