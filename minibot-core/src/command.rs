//! Commands and the insertion-ordered command table.
//!
//! A [`Command`] pairs an async handler with display metadata. The
//! [`CommandTable`] keeps registration order for human-readable listing and
//! preserves a token's original position on overwrite. Note the two distinct
//! visibility rules: the textual listing requires a description and no hide
//! override, while the platform command menu honors the tri-state
//! `force_visible` flag first.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;

use crate::error::Result;
use crate::outgoing::SendTarget;
use crate::types::BotCommand;

pub type CommandFuture = BoxFuture<'static, Result<()>>;

/// Stored handler shape: the triggering target plus the trailing argument
/// string (the text after the command token, leading whitespace included).
pub type CommandFn = Arc<dyn Fn(SendTarget, String) -> CommandFuture + Send + Sync>;

/// One invocable action: handler plus listing metadata.
#[derive(Clone)]
pub struct Command {
    handler: CommandFn,
    description: Option<String>,
    force_visible: Option<bool>,
    hidden: bool,
}

impl Command {
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(SendTarget, String) -> CommandFuture + Send + Sync + 'static,
    {
        Self {
            handler: Arc::new(handler),
            description: None,
            force_visible: None,
            hidden: false,
        }
    }

    /// Human-readable description; a command without one is not listed.
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Forces menu visibility on or off regardless of the description.
    pub fn visible(mut self, visible: bool) -> Self {
        self.force_visible = Some(visible);
        self
    }

    /// Excludes the command from the textual listing even when described.
    pub fn hide(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Invokes the handler with the triggering target and argument tail.
    pub async fn run(&self, target: SendTarget, rest: String) -> Result<()> {
        (self.handler)(target, rest).await
    }

    fn listed(&self) -> bool {
        !self.hidden && self.description.as_deref().is_some_and(|d| !d.is_empty())
    }

    fn menu_visible(&self) -> bool {
        match self.force_visible {
            Some(v) => v,
            None => self.description.as_deref().is_some_and(|d| !d.is_empty()),
        }
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("description", &self.description)
            .field("force_visible", &self.force_visible)
            .field("hidden", &self.hidden)
            .finish_non_exhaustive()
    }
}

/// Token → command mapping that preserves registration order. Overwriting a
/// token keeps its original position.
#[derive(Debug, Default)]
pub struct CommandTable {
    order: Vec<String>,
    entries: HashMap<String, Command>,
}

impl CommandTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or overwrites. Lookup is exact-string on the token, leading
    /// symbol included.
    pub fn set(&mut self, token: impl Into<String>, command: Command) {
        let token = token.into();
        if self.entries.insert(token.clone(), command).is_none() {
            self.order.push(token);
        }
    }

    pub fn get(&self, token: &str) -> Option<&Command> {
        self.entries.get(token)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// All entries in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Command)> {
        self.order
            .iter()
            .filter_map(|t| self.entries.get(t).map(|c| (t.as_str(), c)))
    }

    /// Entries for the textual listing: described and not hidden.
    pub fn listed_entries(&self) -> Vec<(&str, &Command)> {
        self.iter().filter(|(_, c)| c.listed()).collect()
    }

    /// Entries for the platform command menu: `force_visible` wins when set,
    /// otherwise a non-empty description makes the command visible.
    pub fn visible_for_menu(&self) -> Vec<BotCommand> {
        self.iter()
            .filter(|(_, c)| c.menu_visible())
            .map(|(t, c)| BotCommand {
                command: t.to_string(),
                description: c.description().unwrap_or("").to_string(),
            })
            .collect()
    }
}

impl fmt::Display for CommandTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (token, command) in self.listed_entries() {
            writeln!(f, "{}: {}", token, command.description().unwrap_or(""))?;
        }
        Ok(())
    }
}
