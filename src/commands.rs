//! Phrase resolution for the Fire TV remote
//!
//! This module handles:
//! - Phrase normalization (trim + lowercase)
//! - The command table (canonical name -> key-event code)
//! - The alias table, validated when it is built
//! - Resolving a heard phrase to the key event it should send

use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

use crate::lookups::{ALIASES, COMMANDS};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TableError {
    #[error("alias '{alias}' is defined twice ('{first}' and '{second}')")]
    DuplicateAlias {
        alias: String,
        first: String,
        second: String,
    },

    #[error("alias '{alias}' points at unknown command '{target}'")]
    UnknownTarget { alias: String, target: String },
}

/// Normalize a heard phrase for exact matching
pub fn normalize(phrase: &str) -> String {
    phrase.trim().to_lowercase()
}

/// Canonical command name -> key-event code
#[derive(Debug, Clone)]
pub struct CommandTable {
    entries: Vec<(String, String)>,
}

impl CommandTable {
    pub fn builtin() -> Self {
        Self::new(COMMANDS.iter().copied())
    }

    pub fn new<'a>(entries: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|(name, code)| (name.to_string(), code.to_string()))
                .collect(),
        }
    }

    pub fn keycode(&self, canonical: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(name, _)| name == canonical)
            .map(|(_, code)| code.as_str())
    }

    pub fn contains(&self, canonical: &str) -> bool {
        self.keycode(canonical).is_some()
    }

    /// Canonical names in declaration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, c)| (n.as_str(), c.as_str()))
    }
}

/// An alias that replaced an earlier definition under [`AliasTable::last_write_wins`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasConflict {
    pub alias: String,
    pub replaced: String,
    pub kept: String,
}

/// Spoken alias -> canonical command name
#[derive(Debug, Clone, Default)]
pub struct AliasTable {
    // Insertion order is kept for the help listing
    entries: Vec<(String, String)>,
    index: HashMap<String, usize>,
}

impl AliasTable {
    /// The shipped aliases, validated against the shipped commands
    pub fn builtin() -> Result<Self, TableError> {
        Self::new(ALIASES.iter().copied(), &CommandTable::builtin())
    }

    /// Build a table, rejecting duplicate aliases and unknown targets
    pub fn new<'a>(
        entries: impl IntoIterator<Item = (&'a str, &'a str)>,
        commands: &CommandTable,
    ) -> Result<Self, TableError> {
        let mut table = Self::default();
        for (alias, target) in entries {
            let alias = normalize(alias);
            if let Some(&i) = table.index.get(&alias) {
                return Err(TableError::DuplicateAlias {
                    alias,
                    first: table.entries[i].1.clone(),
                    second: target.to_string(),
                });
            }
            check_target(&alias, target, commands)?;
            table.push(alias, target.to_string());
        }
        Ok(table)
    }

    /// Build a table where a repeated alias silently takes its latest target.
    /// Every override is returned so the caller can report it.
    pub fn last_write_wins<'a>(
        entries: impl IntoIterator<Item = (&'a str, &'a str)>,
        commands: &CommandTable,
    ) -> Result<(Self, Vec<AliasConflict>), TableError> {
        let mut table = Self::default();
        let mut conflicts = Vec::new();
        for (alias, target) in entries {
            let alias = normalize(alias);
            check_target(&alias, target, commands)?;
            match table.index.get(&alias) {
                Some(&i) => {
                    let replaced = std::mem::replace(&mut table.entries[i].1, target.to_string());
                    conflicts.push(AliasConflict {
                        alias,
                        replaced,
                        kept: target.to_string(),
                    });
                }
                None => table.push(alias, target.to_string()),
            }
        }
        Ok((table, conflicts))
    }

    /// Apply user aliases on top of this table. A user alias replaces a
    /// shipped alias of the same name.
    pub fn with_overrides(
        mut self,
        overrides: &BTreeMap<String, String>,
        commands: &CommandTable,
    ) -> Result<Self, TableError> {
        for (alias, target) in overrides {
            let alias = normalize(alias);
            let target = normalize(target);
            check_target(&alias, &target, commands)?;
            match self.index.get(&alias) {
                Some(&i) => {
                    tracing::info!(
                        "User alias '{}' -> '{}' replaces built-in '{}'",
                        alias,
                        target,
                        self.entries[i].1
                    );
                    self.entries[i].1 = target;
                }
                None => {
                    tracing::debug!("User alias '{}' -> '{}'", alias, target);
                    self.push(alias, target);
                }
            }
        }
        Ok(self)
    }

    pub fn target(&self, alias: &str) -> Option<&str> {
        self.index.get(alias).map(|&i| self.entries[i].1.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(a, t)| (a.as_str(), t.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn push(&mut self, alias: String, target: String) {
        self.index.insert(alias.clone(), self.entries.len());
        self.entries.push((alias, target));
    }
}

fn check_target(alias: &str, target: &str, commands: &CommandTable) -> Result<(), TableError> {
    if commands.contains(target) {
        Ok(())
    } else {
        Err(TableError::UnknownTarget {
            alias: alias.to_string(),
            target: target.to_string(),
        })
    }
}

/// Outcome of resolving a heard phrase
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Command {
        /// The normalized phrase as heard
        phrase: String,
        canonical: String,
        keycode: String,
        /// Set when the phrase went through the alias table
        via_alias: bool,
    },
    Unknown(String),
}

/// Alias -> canonical -> key-event code, exact matches only
#[derive(Debug, Clone)]
pub struct Resolver {
    commands: CommandTable,
    aliases: AliasTable,
}

impl Resolver {
    pub fn new(commands: CommandTable, aliases: AliasTable) -> Self {
        Self { commands, aliases }
    }

    /// Shipped tables plus user aliases from the config file
    pub fn builtin_with(overrides: &BTreeMap<String, String>) -> Result<Self, TableError> {
        let commands = CommandTable::builtin();
        let aliases = AliasTable::builtin()?.with_overrides(overrides, &commands)?;
        Ok(Self::new(commands, aliases))
    }

    pub fn resolve(&self, phrase: &str) -> Resolution {
        let phrase = normalize(phrase);
        let (canonical, via_alias) = match self.aliases.target(&phrase) {
            Some(target) => (target.to_string(), true),
            None => (phrase.clone(), false),
        };

        match self.commands.keycode(&canonical) {
            Some(keycode) => Resolution::Command {
                keycode: keycode.to_string(),
                canonical,
                via_alias,
                phrase,
            },
            None => Resolution::Unknown(phrase),
        }
    }

    pub fn commands(&self) -> &CommandTable {
        &self.commands
    }

    pub fn aliases(&self) -> &AliasTable {
        &self.aliases
    }
}
