use std::path::PathBuf;

use dialoguer::theme::ColorfulTheme;

use duebook_config::{Config, ConfigManager};
use duebook_core::SystemClock;
use duebook_storage_json::JsonClientStore;

use crate::core::BookManager;
use crate::utils;

use super::commands;
use super::core::CliError;
use super::output;
use super::registry::CommandRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliMode {
    Interactive,
    Script,
}

pub struct ShellContext {
    pub mode: CliMode,
    pub registry: CommandRegistry,
    pub book: BookManager,
    pub theme: ColorfulTheme,
    pub config_manager: ConfigManager,
    pub config: Config,
    pub data_root: PathBuf,
    pub running: bool,
}

impl ShellContext {
    /// Opens the config and client book from the default locations.
    pub fn new(mode: CliMode) -> Result<Self, CliError> {
        let config_manager = ConfigManager::with_base_dir(utils::default_base_dir())?;
        let config = config_manager.load()?;
        let data_root = utils::data_dir_override().unwrap_or_else(|| config.resolve_data_root());
        let store = JsonClientStore::new(&data_root)?;
        let book = BookManager::open(Box::new(store), Box::new(SystemClock))?;
        Ok(Self::with_parts(mode, book, config_manager, config, data_root))
    }

    pub fn with_parts(
        mode: CliMode,
        book: BookManager,
        config_manager: ConfigManager,
        config: Config,
        data_root: PathBuf,
    ) -> Self {
        output::set_color_enabled(config.ui_color_enabled && mode == CliMode::Interactive);
        Self {
            mode,
            registry: CommandRegistry::with_entries(commands::all_definitions()),
            book,
            theme: ColorfulTheme::default(),
            config_manager,
            config,
            data_root,
            running: true,
        }
    }

    pub fn client_names(&self) -> Vec<String> {
        self.book
            .clients()
            .iter()
            .map(|client| client.name.clone())
            .collect()
    }

    pub fn prompt(&self) -> String {
        format!("duebook ({} clients)> ", self.book.clients().len())
    }
}
