//! Configuration view and validation commands (`taskboard config`).

use anyhow::Result;

use super::super::{Cli, ConfigCommands};

pub fn cmd_config(cli: &Cli, project_dir: &std::path::Path, command: Option<ConfigCommands>) -> Result<()> {
    use taskboard::gateway_config::{CONFIG_FILE, ENV_TOKEN, TaskboardConfig, TaskboardToml};
    use taskboard::ui::icons::{GEAR, WARNING};

    match command {
        None | Some(ConfigCommands::Show) => {
            let config = TaskboardConfig::with_cli_args(
                project_dir.to_path_buf(),
                cli.config.clone(),
                cli.workspace,
                cli.gateway_url.clone(),
            )?;

            println!();
            println!("{}Taskboard Configuration", GEAR);
            println!("=======================");
            println!();

            if config.config_path.exists() {
                println!("Config file: {}", config.config_path.display());
            } else {
                println!("No {} found at {}", CONFIG_FILE, config.config_path.display());
                println!("Using default configuration.");
            }
            println!();

            let toml = &config.toml;
            println!("[gateway]");
            println!("  url = \"{}\"", toml.gateway.url);
            println!("  reference_path = \"{}\"", toml.gateway.reference_path);
            println!("  aggregator_path = \"{}\"", toml.gateway.aggregator_path);
            println!("  tasks_path = \"{}\"", toml.gateway.tasks_path);
            println!("  timeout_secs = {}", toml.gateway.timeout_secs);
            println!();
            println!("[session]");
            match toml.session.workspace_id {
                Some(id) => println!("  workspace_id = {}", id),
                None => println!("  workspace_id = (not set)"),
            }
            println!();

            println!("Effective values (with env/CLI overrides):");
            println!("  gateway_url = \"{}\"", config.gateway_url());
            println!("  reference_path = \"{}\"", toml.reference_path());
            println!("  aggregator_path = \"{}\"", toml.aggregator_path());
            println!("  tasks_path = \"{}\"", toml.tasks_path());
            match config.workspace_id() {
                Ok(Some(id)) => println!("  workspace_id = {}", id),
                Ok(None) => println!("  workspace_id = (not set)"),
                Err(e) => println!("  workspace_id = (invalid: {})", e),
            }
            let token = if config.token().is_some() { "set" } else { "not set" };
            println!("  {} = ({})", ENV_TOKEN, token);
            println!();
        }
        Some(ConfigCommands::Validate) => {
            println!();
            println!("Validating configuration...");
            println!();

            let config = TaskboardConfig::with_cli_args(
                project_dir.to_path_buf(),
                cli.config.clone(),
                cli.workspace,
                cli.gateway_url.clone(),
            )?;
            if !config.config_path.exists() {
                println!("No {} found. Using defaults.", CONFIG_FILE);
            }

            let warnings = config.validate();
            if warnings.is_empty() {
                println!("Configuration is valid.");
            } else {
                println!("{}Configuration warnings:", WARNING);
                for warning in warnings {
                    println!("  - {}", warning);
                }
            }
            println!();
        }
        Some(ConfigCommands::Init) => {
            let config = TaskboardConfig::new(project_dir.to_path_buf())?;
            let config_dir = config.config_dir();
            let config_path = cli.config.clone().unwrap_or(config.config_path);

            if config_path.exists() {
                println!("{} already exists at {}", CONFIG_FILE, config_path.display());
                println!("Delete it first if you want to recreate it.");
                return Ok(());
            }

            if cli.config.is_none() && !config_dir.exists() {
                std::fs::create_dir_all(&config_dir)?;
            }

            let mut toml = TaskboardToml::default();
            toml.session.workspace_id = cli.workspace;
            if let Some(url) = &cli.gateway_url {
                toml.gateway.url = url.clone();
            }
            toml.save(&config_path)?;

            println!("Created {} at {}", CONFIG_FILE, config_path.display());
            println!();
            println!("You can now customize:");
            println!("  - [gateway] url, service paths, timeout_secs");
            println!("  - [session] workspace_id");
            println!();
            println!("Set {} (or add it to a .env file) to authenticate.", ENV_TOKEN);
            println!();
        }
    }

    Ok(())
}
