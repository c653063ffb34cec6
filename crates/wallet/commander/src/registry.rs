//! Command registry: stable command name → factory
//!
//! Names are a versionable surface. Adding a command is additive; a name is
//! never re-registered with a different meaning. The process-wide table is
//! written once at startup and read-only afterwards.

use crate::command::{Command, NamedCommand};
use crate::commands;
use crate::error::BuildError;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, OnceLock};
use wallet_types::{Address, Intent};

/// Builds a command from its bound address and optional intent
pub type CommandFactory =
    Arc<dyn Fn(Address, Option<Intent>) -> Result<Box<dyn Command>, BuildError> + Send + Sync>;

static GLOBAL_REGISTRY: OnceLock<Arc<CommandRegistry>> = OnceLock::new();

#[derive(Clone, Default)]
pub struct CommandRegistry {
    factories: BTreeMap<String, CommandFactory>,
}

impl CommandRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            factories: BTreeMap::new(),
        }
    }

    /// Registry pre-populated with the built-in wallet commands
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        commands::install_builtins(&mut registry);
        registry
    }

    /// Install `registry` as the process-wide table.
    ///
    /// Succeeds once per process; later calls fail with
    /// [`BuildError::RegistryAlreadyInstalled`].
    pub fn install(registry: CommandRegistry) -> Result<Arc<CommandRegistry>, BuildError> {
        let shared = Arc::new(registry);
        GLOBAL_REGISTRY
            .set(shared.clone())
            .map_err(|_| BuildError::RegistryAlreadyInstalled)?;
        tracing::info!(commands = shared.len(), "Command registry installed");
        Ok(shared)
    }

    /// The process-wide table, defaulting to the built-ins on first use
    pub fn global() -> Arc<CommandRegistry> {
        GLOBAL_REGISTRY
            .get_or_init(|| Arc::new(Self::with_builtins()))
            .clone()
    }

    /// Register a factory under `name`
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F) -> Result<(), BuildError>
    where
        F: Fn(Address, Option<Intent>) -> Result<Box<dyn Command>, BuildError>
            + Send
            + Sync
            + 'static,
    {
        let name = name.into();
        if self.factories.contains_key(&name) {
            return Err(BuildError::DuplicateName(name));
        }
        tracing::debug!(command = %name, "Command registered");
        self.factories.insert(name, Arc::new(factory));
        Ok(())
    }

    /// Register a typed command under its constant name
    pub fn register_named<C: NamedCommand>(&mut self) -> Result<(), BuildError> {
        self.register(C::NAME, build_boxed::<C>)
    }

    /// Build a command by name.
    ///
    /// Fails closed: an unknown name is an error, never a default command.
    pub fn create(
        &self,
        name: &str,
        address: Address,
        intent: Option<Intent>,
    ) -> Result<Box<dyn Command>, BuildError> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| BuildError::UnknownCommand(name.to_string()))?;
        factory(address, intent)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandRegistry")
            .field("commands", &self.names())
            .finish()
    }
}

fn build_boxed<C: NamedCommand>(
    address: Address,
    intent: Option<Intent>,
) -> Result<Box<dyn Command>, BuildError> {
    Ok(Box::new(C::build(address, intent)?))
}
