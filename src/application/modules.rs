//! # Modules
//!
//! Bot functionality is grouped into modules that can be loaded, unloaded and reloaded at
//! runtime. Modules are compiled in; the registry lists which ones are available.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::application::bot::Bot;
use crate::application::commands::CommandError;
use crate::application::context::CommandContext;
use crate::domain::types::MemberInfo;

#[async_trait]
pub trait BotModule: Send + Sync {
    /// Name used by the `module` and `default` commands.
    fn name(&self) -> &'static str;

    /// Registers commands, help and module info, restores persisted data and starts
    /// background tasks. Anything registered is rolled back if this fails.
    async fn setup(&self, bot: &Arc<Bot>) -> anyhow::Result<()>;

    /// Stops background tasks and removes what `setup` registered.
    async fn teardown(&self, bot: &Arc<Bot>);

    /// Runs the body of one of the module's commands.
    async fn invoke(&self, ctx: &CommandContext) -> Result<(), CommandError>;

    async fn on_member_join(&self, _bot: &Arc<Bot>, _member: &MemberInfo) {}
}

pub type ModuleFactory = fn() -> Arc<dyn BotModule>;

/// Modules available for loading.
#[derive(Default, Clone)]
pub struct ModuleRegistry {
    factories: BTreeMap<&'static str, ModuleFactory>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &'static str, factory: ModuleFactory) -> Self {
        self.factories.insert(name, factory);
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.factories.keys().copied().collect()
    }

    /// A fresh instance of the named module.
    pub fn create(&self, name: &str) -> Option<Arc<dyn BotModule>> {
        self.factories.get(name).map(|factory| factory())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ModuleError {
    #[error("No `{0}` module was found.")]
    NotFound(String),
    #[error("The `{0}` module was already loaded.")]
    AlreadyLoaded(String),
    #[error("No `{0}` module is loaded.")]
    NotLoaded(String),
    #[error("The `{module}` module failed while loading: {source}")]
    Failed {
        module: String,
        #[source]
        source: anyhow::Error,
    },
}

impl ModuleError {
    /// The underlying cause for failed loads, the message otherwise.
    pub fn detail(&self) -> String {
        match self {
            ModuleError::Failed { source, .. } => format!("{source:#}"),
            other => other.to_string(),
        }
    }
}
