//! # Bot Core
//!
//! Owns the shared state, the storage handle, the chat connection and the loaded
//! modules. Module loading, command registration and the connection lifecycle go
//! through here.

use anyhow::{Context, Result, bail};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock, watch};

use crate::application::commands::{Command, CommandState};
use crate::application::help::{HelpInfo, ModuleInfo, Restrictions};
use crate::application::modules::{BotModule, ModuleError, ModuleRegistry};
use crate::application::state::BotState;
use crate::domain::config::AppConfig;
use crate::domain::traits::{ChatProvider, Storage};
use crate::domain::types::{MemberInfo, UserId};
use crate::strings;

/// The module holding the built-in commands. Always loaded, never listed.
pub const CORE_MODULE: &str = "core_commands";

struct LoadedModule {
    name: String,
    module: Arc<dyn BotModule>,
}

pub struct Bot {
    pub config: AppConfig,
    pub storage: Arc<dyn Storage>,
    pub state: Mutex<BotState>,
    chat: RwLock<Option<Arc<dyn ChatProvider>>>,
    registry: ModuleRegistry,
    loaded: Mutex<Vec<LoadedModule>>,
    shutdown: watch::Sender<bool>,
}

/// Status text shown under the bot's name.
pub fn activity_text(prefix: Option<&str>) -> String {
    match prefix {
        Some(prefix) => format!("prefix: {prefix}"),
        None => "pings only".to_string(),
    }
}

/// Decodes the `\n`, `\r` and `\t` escapes used when settings are entered in chat.
pub fn decode_escapes(text: &str) -> String {
    text.replace("\\n", "\n").replace("\\r", "\n").replace("\\t", "\t")
}

impl Bot {
    pub fn new(config: AppConfig, storage: Arc<dyn Storage>, registry: ModuleRegistry) -> Arc<Self> {
        let (shutdown, _) = watch::channel(false);
        let state = BotState {
            owners: config.discord.owners.clone(),
            delete_messages: config.bot.delete_messages,
            ..Default::default()
        };
        Arc::new(Self {
            config,
            storage,
            state: Mutex::new(state),
            chat: RwLock::new(None),
            registry,
            loaded: Mutex::new(Vec::new()),
            shutdown,
        })
    }

    /// Creates the tables and loads persisted settings, seeding defaults on first start.
    pub async fn init(&self) -> Result<()> {
        self.storage.init().await.context("Failed to initialise storage")?;

        let prefix = match self.storage.setting("prefix").await? {
            Some(prefix) => prefix,
            None => {
                let prefix = self.config.bot.default_prefix.clone();
                self.storage.set_setting("prefix", &prefix).await?;
                prefix
            }
        };
        let delete_messages = match self.storage.setting("delete_messages").await? {
            Some(value) => value == "1",
            None => {
                let value = self.config.bot.delete_messages;
                self.storage
                    .set_setting("delete_messages", if value { "1" } else { "0" })
                    .await?;
                value
            }
        };
        let config = self.storage.config_entries().await?;

        let mut state = self.state.lock().await;
        state.prefix = (!prefix.is_empty()).then_some(prefix);
        state.delete_messages = delete_messages;
        state.config = config.into_iter().collect();
        Ok(())
    }

    pub fn subscribe_shutdown(&self) -> watch::Receiver<bool> {
        self.shutdown.subscribe()
    }

    pub fn request_shutdown(&self) {
        self.shutdown.send_replace(true);
    }

    pub async fn attach_chat(&self, chat: Arc<dyn ChatProvider>) {
        *self.chat.write().await = Some(chat);
    }

    pub async fn chat(&self) -> Option<Arc<dyn ChatProvider>> {
        self.chat.read().await.clone()
    }

    pub async fn prefix(&self) -> Option<String> {
        self.state.lock().await.prefix.clone()
    }

    /// The prefix as shown to users: the set prefix, or a mention of the bot.
    pub async fn display_prefix(&self) -> String {
        if let Some(prefix) = self.prefix().await {
            return prefix;
        }
        match self.chat().await {
            Some(chat) => format!("@{} ", chat.current_user().tag()),
            None => "@bot ".to_string(),
        }
    }

    /// Sets or (with `None`) removes the prefix and updates the status text.
    pub async fn set_prefix(&self, prefix: Option<String>) -> Result<()> {
        self.storage
            .set_setting("prefix", prefix.as_deref().unwrap_or(""))
            .await?;
        self.state.lock().await.prefix = prefix.clone();
        if let Some(chat) = self.chat().await {
            chat.set_listening(&activity_text(prefix.as_deref())).await;
        }
        Ok(())
    }

    pub async fn set_delete_messages(&self, enabled: bool) -> Result<()> {
        self.storage
            .set_setting("delete_messages", if enabled { "1" } else { "0" })
            .await?;
        self.state.lock().await.delete_messages = enabled;
        Ok(())
    }

    pub async fn is_owner(&self, user: UserId) -> bool {
        self.state.lock().await.owners.contains(&user)
    }

    /// Owners looked up from the application. Ignored when owners are configured.
    pub async fn set_owners(&self, owners: Vec<UserId>) {
        if self.config.discord.owners.is_empty() {
            self.state.lock().await.owners = owners;
        }
    }

    pub async fn config_value(&self, key: &str) -> Option<String> {
        self.state.lock().await.config.get(key).cloned()
    }

    pub async fn set_config(&self, key: &str, value: &str) -> Result<()> {
        self.storage.set_config(key, value).await?;
        self.state.lock().await.config.insert(key.to_string(), value.to_string());
        Ok(())
    }

    pub async fn remove_config(&self, key: &str) -> Result<bool> {
        let removed = self.storage.remove_config(key).await?;
        self.state.lock().await.config.remove(key);
        Ok(removed)
    }

    pub async fn is_connected(&self) -> bool {
        self.state.lock().await.connected
    }

    pub async fn record_error(&self, message: String) {
        self.state.lock().await.last_error = Some(message);
    }

    /// Registers commands for `module` under the cog name `cog`.
    pub async fn add_commands(&self, module: &str, cog: &str, commands: Vec<Command>) -> Result<()> {
        let mut state = self.state.lock().await;
        for command in commands {
            let command = Command {
                module: module.to_string(),
                cog: cog.to_string(),
                ..command
            };
            state.commands.add(command)?;
        }
        Ok(())
    }

    pub async fn add_command_help(
        &self,
        qualified: &str,
        category: &str,
        restrictions: Restrictions,
        examples: &[&str],
    ) -> Result<()> {
        let mut state = self.state.lock().await;
        let command = state
            .commands
            .get(qualified)
            .with_context(|| format!("Cannot add help for unknown command `{qualified}`."))?;
        let info = HelpInfo::new(command, category, restrictions, examples);
        state.help.insert(qualified.to_string(), info);
        Ok(())
    }

    /// Adds a module's about page. Names are unique regardless of case.
    pub async fn add_module_info(&self, info: ModuleInfo) -> Result<()> {
        let mut state = self.state.lock().await;
        let key = info.name.to_lowercase();
        if state.modules.contains_key(&key) {
            bail!("A module with the name '{}' already exists.", info.name);
        }
        state.modules.insert(key, info);
        Ok(())
    }

    pub async fn remove_module_info(&self, name: &str) {
        self.state.lock().await.modules.remove(&name.to_lowercase());
    }

    /// Removes the commands of `module` and their help entries.
    async fn remove_module_commands(&self, module: &str) {
        let mut state = self.state.lock().await;
        for name in state.commands.remove_module(module) {
            state.help.remove(&name);
        }
    }

    /// Stored state code of a top-level command, inserting 0 when none is stored.
    pub async fn command_state_code(&self, state_key: &str) -> Result<i16> {
        match self.storage.command_state(state_key).await? {
            Some(code) => Ok(code),
            None => {
                self.storage.set_command_state(state_key, 0).await?;
                Ok(0)
            }
        }
    }

    pub async fn set_command_state(&self, qualified: &str, new_state: CommandState) -> Result<()> {
        let key = {
            let state = self.state.lock().await;
            let command = state
                .commands
                .get(qualified)
                .with_context(|| format!("Unknown command `{qualified}`."))?;
            command.state_key()
        };
        self.storage.set_command_state(&key, new_state.code()).await?;
        if let Some(command) = self.state.lock().await.commands.get_mut(qualified) {
            command.set_state(new_state);
        }
        Ok(())
    }

    /// Applies the stored enable/hide state to every top-level command.
    pub async fn update_command_states(&self) -> Result<()> {
        let keys: Vec<(String, String)> = {
            let state = self.state.lock().await;
            state
                .commands
                .top_level()
                .map(|c| (c.qualified_name(), c.state_key()))
                .collect()
        };
        let mut states = Vec::with_capacity(keys.len());
        for (qualified, key) in keys {
            let code = self.command_state_code(&key).await?;
            states.push((qualified, CommandState::from_code(code)));
        }
        let mut state = self.state.lock().await;
        for (qualified, command_state) in states {
            if let Some(command) = state.commands.get_mut(&qualified) {
                command.set_state(command_state);
            }
        }
        Ok(())
    }

    pub fn available_modules(&self) -> Vec<&'static str> {
        self.registry.names()
    }

    pub fn has_module(&self, name: &str) -> bool {
        self.registry.contains(name)
    }

    /// Names of loaded modules, in load order, without the core module.
    pub async fn loaded_modules(&self) -> Vec<String> {
        self.loaded
            .lock()
            .await
            .iter()
            .filter(|m| m.name != CORE_MODULE)
            .map(|m| m.name.clone())
            .collect()
    }

    pub async fn module(&self, name: &str) -> Option<Arc<dyn BotModule>> {
        self.loaded
            .lock()
            .await
            .iter()
            .find(|m| m.name == name)
            .map(|m| m.module.clone())
    }

    /// Runs setup and refreshes command states, undoing all registrations on failure.
    async fn install(self: &Arc<Self>, name: &str, module: &Arc<dyn BotModule>) -> Result<()> {
        let (old_help, old_modules) = {
            let state = self.state.lock().await;
            (state.help.clone(), state.modules.clone())
        };
        let result: Result<()> = async {
            module.setup(self).await?;
            self.update_command_states().await
        }
        .await;
        if let Err(e) = result {
            module.teardown(self).await;
            let mut state = self.state.lock().await;
            state.commands.remove_module(name);
            state.help = old_help;
            state.modules = old_modules;
            return Err(e);
        }
        Ok(())
    }

    pub async fn load_core(self: &Arc<Self>, module: Arc<dyn BotModule>) -> Result<()> {
        let mut loaded = self.loaded.lock().await;
        self.install(CORE_MODULE, &module).await?;
        loaded.push(LoadedModule {
            name: CORE_MODULE.to_string(),
            module,
        });
        Ok(())
    }

    pub async fn load_module(self: &Arc<Self>, name: &str) -> Result<(), ModuleError> {
        let mut loaded = self.loaded.lock().await;
        if loaded.iter().any(|m| m.name == name) {
            return Err(ModuleError::AlreadyLoaded(name.to_string()));
        }
        let module = self
            .registry
            .create(name)
            .ok_or_else(|| ModuleError::NotFound(name.to_string()))?;
        self.install(name, &module).await.map_err(|source| ModuleError::Failed {
            module: name.to_string(),
            source,
        })?;
        loaded.push(LoadedModule {
            name: name.to_string(),
            module,
        });
        Ok(())
    }

    pub async fn unload_module(self: &Arc<Self>, name: &str) -> Result<(), ModuleError> {
        let mut loaded = self.loaded.lock().await;
        let position = loaded
            .iter()
            .position(|m| m.name == name && m.name != CORE_MODULE)
            .ok_or_else(|| ModuleError::NotLoaded(name.to_string()))?;
        let old = loaded.remove(position);
        old.module.teardown(self).await;
        self.remove_module_commands(name).await;
        Ok(())
    }

    /// Unloads and loads a module. On failure the previous instance is restored.
    pub async fn reload_module(self: &Arc<Self>, name: &str) -> Result<(), ModuleError> {
        let mut loaded = self.loaded.lock().await;
        let position = loaded
            .iter()
            .position(|m| m.name == name && m.name != CORE_MODULE)
            .ok_or_else(|| ModuleError::NotLoaded(name.to_string()))?;
        let fresh = self
            .registry
            .create(name)
            .ok_or_else(|| ModuleError::NotFound(name.to_string()))?;

        let old = loaded.remove(position);
        old.module.teardown(self).await;
        self.remove_module_commands(name).await;

        match self.install(name, &fresh).await {
            Ok(()) => {
                loaded.insert(
                    position,
                    LoadedModule {
                        name: name.to_string(),
                        module: fresh,
                    },
                );
                Ok(())
            }
            Err(source) => {
                match self.install(name, &old.module).await {
                    Ok(()) => loaded.insert(position, old),
                    Err(e) => {
                        tracing::error!("Failed to restore the '{}' module after a failed reload: {:#}", name, e)
                    }
                }
                Err(ModuleError::Failed {
                    module: name.to_string(),
                    source,
                })
            }
        }
    }

    /// Loads every default module, recording failures as the last module error.
    pub async fn load_default_modules(self: &Arc<Self>) -> Result<()> {
        for name in self.storage.default_modules().await? {
            match self.load_module(&name).await {
                Ok(()) => tracing::info!("Loaded default module '{}'.", name),
                Err(e) => {
                    tracing::warn!("Failed to load default module '{}': {:#}", name, e);
                    let message = strings::messages::module_failed(&name, &e.detail());
                    self.state.lock().await.last_module_error = Some(message);
                }
            }
        }
        Ok(())
    }

    /// Registers the bot's own about page from the stored description and credits.
    pub async fn register_bot_info(&self) -> Result<()> {
        let Some(chat) = self.chat().await else {
            return Ok(());
        };
        let me = chat.current_user();
        self.remove_module_info(&me.name).await;

        let credits = self
            .storage
            .setting("additional_credits")
            .await?
            .filter(|c| !c.is_empty())
            .map(|c| decode_escapes(&c));
        let description = self
            .storage
            .setting("bot_description")
            .await?
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| strings::messages::NO_BOT_DESCRIPTION.to_string());

        let info = ModuleInfo::new(&me.name, strings::help::BOT_AUTHOR, None, Some(&description))
            .credits(credits.as_deref())
            .image(me.avatar_url.clone());
        self.add_module_info(info).await
    }

    /// Called on every (re)connect to the gateway.
    pub async fn on_ready(&self, chat: Arc<dyn ChatProvider>) -> Result<()> {
        let me = chat.current_user();
        self.attach_chat(chat.clone()).await;
        let registered = self.state.lock().await.modules.contains_key(&me.name.to_lowercase());
        if !registered {
            self.register_bot_info().await?;
        }
        let prefix = self.prefix().await;
        chat.set_listening(&activity_text(prefix.as_deref())).await;
        self.state.lock().await.connected = true;
        tracing::info!("{} is ready!", me.name);
        Ok(())
    }

    pub async fn on_disconnect(&self) {
        let mut state = self.state.lock().await;
        if state.connected {
            tracing::info!("Disconnected from Discord.");
            state.connected = false;
        }
    }

    pub async fn on_resume(&self) {
        let mut state = self.state.lock().await;
        if !state.connected {
            tracing::info!("Reconnected to Discord.");
            state.connected = true;
        }
    }

    pub async fn on_member_join(self: &Arc<Self>, member: &MemberInfo) {
        let modules: Vec<Arc<dyn BotModule>> = self.loaded.lock().await.iter().map(|m| m.module.clone()).collect();
        for module in modules {
            module.on_member_join(self, member).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::commands::CommandError;
    use crate::application::context::CommandContext;
    use crate::testing::{MemoryStorage, RecordingChat, test_config};
    use async_trait::async_trait;

    struct Widgets {
        fail: bool,
    }

    #[async_trait]
    impl BotModule for Widgets {
        fn name(&self) -> &'static str {
            "widgets"
        }

        async fn setup(&self, bot: &Arc<Bot>) -> Result<()> {
            bot.add_commands("widgets", "Widgets", vec![Command::new("widget")]).await?;
            bot.add_command_help("widget", "widgets", Restrictions::none(), &[]).await?;
            bot.add_module_info(ModuleInfo::new("Widgets", "Someone", None, None)).await?;
            if self.fail {
                bail!("widget factory exploded");
            }
            Ok(())
        }

        async fn teardown(&self, bot: &Arc<Bot>) {
            bot.remove_module_info("Widgets").await;
        }

        async fn invoke(&self, _ctx: &CommandContext) -> Result<(), CommandError> {
            Ok(())
        }
    }

    fn registry() -> ModuleRegistry {
        ModuleRegistry::new()
            .with("widgets", || Arc::new(Widgets { fail: false }))
            .with("broken", || Arc::new(Widgets { fail: true }))
    }

    async fn bot(storage: Arc<MemoryStorage>) -> Arc<Bot> {
        let bot = Bot::new(test_config(), storage, registry());
        bot.init().await.unwrap();
        bot
    }

    #[tokio::test]
    async fn test_init_seeds_settings() {
        let storage = Arc::new(MemoryStorage::default());
        let bot = bot(storage.clone()).await;
        assert_eq!(bot.prefix().await.as_deref(), Some("!"));
        assert_eq!(storage.setting("prefix").await.unwrap().as_deref(), Some("!"));
        assert_eq!(storage.setting("delete_messages").await.unwrap().as_deref(), Some("1"));

        storage.set_setting("prefix", "").await.unwrap();
        let bot = self::bot(storage).await;
        assert_eq!(bot.prefix().await, None);
        assert_eq!(bot.display_prefix().await, "@bot ");
    }

    #[tokio::test]
    async fn test_load_and_unload() {
        let storage = Arc::new(MemoryStorage::default());
        let bot = bot(storage.clone()).await;

        bot.load_module("widgets").await.unwrap();
        assert_eq!(bot.loaded_modules().await, vec!["widgets".to_string()]);
        assert!(matches!(bot.load_module("widgets").await, Err(ModuleError::AlreadyLoaded(_))));
        assert_eq!(storage.command_state("Widgets.widget").await.unwrap(), Some(0));
        {
            let state = bot.state.lock().await;
            assert!(state.commands.find("widget").is_some());
            assert!(state.modules.contains_key("widgets"));
        }

        bot.unload_module("widgets").await.unwrap();
        assert!(bot.loaded_modules().await.is_empty());
        let state = bot.state.lock().await;
        assert!(state.commands.find("widget").is_none());
        assert!(state.help.is_empty());
        assert!(state.modules.is_empty());
    }

    #[tokio::test]
    async fn test_failed_load_rolls_back() {
        let bot = bot(Arc::new(MemoryStorage::default())).await;
        let err = bot.load_module("broken").await.unwrap_err();
        assert!(matches!(err, ModuleError::Failed { .. }));
        assert!(bot.loaded_modules().await.is_empty());
        let state = bot.state.lock().await;
        assert!(state.commands.find("widget").is_none());
        assert!(state.help.is_empty());
        assert!(state.modules.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_and_unloaded_modules() {
        let bot = bot(Arc::new(MemoryStorage::default())).await;
        assert!(matches!(bot.load_module("nope").await, Err(ModuleError::NotFound(_))));
        assert!(matches!(bot.unload_module("widgets").await, Err(ModuleError::NotLoaded(_))));
        assert!(matches!(bot.reload_module("widgets").await, Err(ModuleError::NotLoaded(_))));
        assert!(matches!(bot.unload_module(CORE_MODULE).await, Err(ModuleError::NotLoaded(_))));
    }

    #[tokio::test]
    async fn test_reload_keeps_module_loaded() {
        let bot = bot(Arc::new(MemoryStorage::default())).await;
        bot.load_module("widgets").await.unwrap();
        bot.reload_module("widgets").await.unwrap();
        assert_eq!(bot.loaded_modules().await, vec!["widgets".to_string()]);
        assert!(bot.state.lock().await.commands.find("widget").is_some());
    }

    #[tokio::test]
    async fn test_stored_command_state_is_applied() {
        let storage = Arc::new(MemoryStorage::default());
        storage.set_command_state("Widgets.widget", 3).await.unwrap();
        let bot = bot(storage).await;
        bot.load_module("widgets").await.unwrap();
        let state = bot.state.lock().await;
        let widget = state.commands.find("widget").unwrap();
        assert!(!widget.enabled);
        assert!(widget.hidden);
    }

    #[tokio::test]
    async fn test_default_modules_failures_are_recorded() {
        let storage = Arc::new(MemoryStorage::default());
        storage.add_default_module("widgets").await.unwrap();
        storage.add_default_module("broken").await.unwrap();
        let bot = bot(storage).await;
        bot.load_default_modules().await.unwrap();
        assert_eq!(bot.loaded_modules().await, vec!["widgets".to_string()]);
        let error = bot.state.lock().await.last_module_error.clone().unwrap();
        assert!(error.starts_with("The `broken` module failed while loading."));
    }

    #[tokio::test]
    async fn test_ready_registers_bot_info_and_status() {
        let storage = Arc::new(MemoryStorage::default());
        storage.set_setting("additional_credits", "Thanks to\\n\\tEveryone").await.unwrap();
        let bot = bot(storage).await;
        let chat = Arc::new(RecordingChat::new());
        bot.on_ready(chat.clone()).await.unwrap();

        assert!(bot.is_connected().await);
        assert_eq!(chat.activity().as_deref(), Some("prefix: !"));
        let state = bot.state.lock().await;
        let info = state.modules.get("testbot").unwrap();
        assert_eq!(info.description, strings::messages::NO_BOT_DESCRIPTION);
        assert_eq!(
            info.credits.as_deref(),
            Some("Thanks to\n\u{202f}\u{202f}\u{202f}\u{202f}\u{202f}Everyone")
        );
    }

    #[tokio::test]
    async fn test_set_prefix_updates_status() {
        let storage = Arc::new(MemoryStorage::default());
        let bot = bot(storage.clone()).await;
        let chat = Arc::new(RecordingChat::new());
        bot.attach_chat(chat.clone()).await;
        bot.set_prefix(None).await.unwrap();
        assert_eq!(chat.activity().as_deref(), Some("pings only"));
        assert_eq!(storage.setting("prefix").await.unwrap().as_deref(), Some(""));
        assert_eq!(bot.display_prefix().await, "@TestBot ");
    }
}
