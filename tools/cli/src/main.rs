//! Lockbox CLI - command line interface for a local secret vault.
//!
//! Each invocation opens the vault directory, performs one action, reports
//! its status and flushes pending changes before exiting. Only `init`
//! creates a vault; `generate` never touches the vault at all.

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, info, Level};
use tracing_subscriber::FmtSubscriber;
use zeroize::Zeroizing;

use lockbox_common::Error;
use lockbox_crypto::{generate_secret, KdfParams, DEFAULT_SECRET_LENGTH};
use lockbox_vault::{Status, VaultConfig, VaultContext, VaultManager};

#[derive(Parser)]
#[command(name = "lockbox")]
#[command(about = "Lockbox - local encrypted secret vault")]
#[command(version)]
struct Cli {
    /// Vault directory (default: the platform data directory).
    #[arg(long, global = true)]
    vault_dir: Option<PathBuf>,

    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the vault and set its master passphrase.
    Init {
        /// KDF strength: "interactive", "moderate", or "sensitive".
        #[arg(short, long, default_value = "interactive")]
        strength: String,
    },

    /// Store a secret under a name.
    Add {
        /// Entry name.
        #[arg(short, long)]
        name: String,

        /// Generate a random secret instead of prompting for one.
        #[arg(short, long)]
        generate: bool,

        /// Length of the generated secret.
        #[arg(short, long, requires = "generate")]
        length: Option<usize>,
    },

    /// Print the secret stored under a name.
    Get {
        /// Entry name.
        #[arg(short, long)]
        name: String,
    },

    /// Delete an entry.
    Delete {
        /// Entry name.
        #[arg(short, long)]
        name: String,
    },

    /// List entry names.
    List,

    /// Print a random secret without storing it.
    Generate {
        /// Number of characters.
        #[arg(short, long)]
        length: Option<usize>,
    },

    /// Change the master passphrase and re-encrypt every entry.
    ChangeMaster,

    /// Print shell completions.
    Completions {
        /// Target shell.
        shell: Shell,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::WARN };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to install logger: {}", e);
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    if let Commands::Completions { shell } = cli.command {
        let mut command = Cli::command();
        clap_complete::generate(shell, &mut command, "lockbox", &mut std::io::stdout());
        return Ok(());
    }

    let root = match cli.vault_dir {
        Some(dir) => dir,
        None => dirs::data_dir()
            .context("No data directory on this platform; pass --vault-dir")?
            .join("lockbox"),
    };
    let manager = VaultManager::new(&root);

    match cli.command {
        Commands::Init { strength } => cmd_init(&manager, &strength),
        Commands::Add {
            name,
            generate,
            length,
        } => with_vault(&manager, |ctx, config| {
            cmd_add(ctx, &name, generate, length.unwrap_or(config.secret_length))
        }),
        Commands::Get { name } => with_vault(&manager, |ctx, _| cmd_get(ctx, &name)),
        Commands::Delete { name } => with_vault(&manager, |ctx, _| cmd_delete(ctx, &name)),
        Commands::List => with_vault(&manager, |ctx, _| cmd_list(ctx)),
        Commands::Generate { length } => {
            let length = match length {
                Some(length) => length,
                None => configured_secret_length(&manager)?,
            };
            cmd_generate(length)
        }
        Commands::ChangeMaster => with_vault(&manager, |ctx, config| {
            cmd_change_master(&manager, config, ctx)
        }),
        Commands::Completions { .. } => Ok(()),
    }
}

/// Open an existing vault, run `action` and flush before returning.
fn with_vault<F>(manager: &VaultManager, action: F) -> Result<()>
where
    F: FnOnce(&mut VaultContext, &mut VaultConfig) -> Result<()>,
{
    let (mut config, mut ctx) = manager
        .open_existing()
        .with_context(|| format!("Failed to open vault at {}", manager.root().display()))?;

    let outcome = action(&mut ctx, &mut config);
    ctx.flush().context("Failed to save vault")?;
    outcome
}

/// Convert a vault error into the status message shown to the user.
fn report(error: Error) -> anyhow::Error {
    debug!(error = %error, "Vault action failed");
    anyhow::anyhow!(Status::from(&error).message())
}

/// Prompt for a passphrase or secret without echo.
fn prompt_secret(prompt: &str) -> Result<Zeroizing<String>> {
    let value = rpassword::prompt_password(prompt).context("Failed to read input")?;
    Ok(Zeroizing::new(value))
}

/// Default generated length: the vault's setting, if a vault exists.
fn configured_secret_length(manager: &VaultManager) -> Result<usize> {
    let config = manager
        .load_config()
        .with_context(|| format!("Failed to read {}", manager.config_path().display()))?;
    Ok(config.map_or(DEFAULT_SECRET_LENGTH, |config| config.secret_length))
}

/// Create the vault and its master passphrase.
fn cmd_init(manager: &VaultManager, strength: &str) -> Result<()> {
    let params = KdfParams::from_strength(strength).map_err(report)?;
    let (_, mut ctx) = manager
        .init(params)
        .with_context(|| format!("Failed to open vault at {}", manager.root().display()))?;

    if ctx.is_credential_corrupt() {
        return Err(report(Error::CorruptCredential(
            "stored master credential is unreadable".to_string(),
        )));
    }
    if ctx.has_master() {
        anyhow::bail!("Vault already has a master passphrase; use change-master");
    }

    let passphrase = prompt_secret("New master passphrase: ")?;
    let confirm = prompt_secret("Confirm master passphrase: ")?;
    if *passphrase != *confirm {
        anyhow::bail!("Passphrases do not match");
    }

    ctx.create_master(passphrase.as_bytes()).map_err(report)?;

    println!("Vault created at {}", manager.root().display());
    println!("{}", Status::Ok);
    Ok(())
}

/// Store a prompted or generated secret.
fn cmd_add(ctx: &mut VaultContext, name: &str, generate: bool, length: usize) -> Result<()> {
    info!(entry = name, "Adding entry");

    if !ctx.has_master() {
        return Err(report(Error::NoMaster));
    }

    let secret = if generate {
        let secret = ctx.generate_secret(length).map_err(report)?;
        Zeroizing::new(secret.as_str().map_err(report)?.to_string())
    } else {
        prompt_secret("Secret: ")?
    };
    let master = prompt_secret("Master passphrase: ")?;

    ctx.add_entry(name, secret.as_bytes(), master.as_bytes())
        .map_err(report)?;

    if generate {
        println!("{}", secret.as_str());
    }
    println!("{}", Status::Ok);
    Ok(())
}

/// Print a stored secret.
fn cmd_get(ctx: &mut VaultContext, name: &str) -> Result<()> {
    let master = prompt_secret("Master passphrase: ")?;
    let secret = ctx.get_entry(name, master.as_bytes()).map_err(report)?;

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(secret.as_bytes())?;
    stdout.write_all(b"\n")?;
    Ok(())
}

/// Delete an entry.
fn cmd_delete(ctx: &mut VaultContext, name: &str) -> Result<()> {
    info!(entry = name, "Deleting entry");

    let master = prompt_secret("Master passphrase: ")?;
    ctx.delete_entry(name, master.as_bytes()).map_err(report)?;

    println!("{}", Status::Ok);
    Ok(())
}

/// List entry names.
fn cmd_list(ctx: &mut VaultContext) -> Result<()> {
    if ctx.is_empty() {
        println!("Vault is empty.");
    } else {
        for name in ctx.entry_names() {
            println!("{}", name);
        }
    }
    Ok(())
}

/// Print a random secret.
fn cmd_generate(length: usize) -> Result<()> {
    let secret = generate_secret(length).map_err(report)?;
    println!("{}", secret.as_str().map_err(report)?);
    Ok(())
}

/// Change the master passphrase.
fn cmd_change_master(
    manager: &VaultManager,
    config: &mut VaultConfig,
    ctx: &mut VaultContext,
) -> Result<()> {
    info!("Changing master passphrase");

    if !ctx.has_master() {
        return Err(report(Error::NoMaster));
    }

    let old = prompt_secret("Current master passphrase: ")?;
    let new = prompt_secret("New master passphrase: ")?;
    let confirm = prompt_secret("Confirm new master passphrase: ")?;
    if *new != *confirm {
        anyhow::bail!("New passphrases do not match");
    }

    manager
        .change_master(config, ctx, old.as_bytes(), new.as_bytes())
        .map_err(report)?;

    println!("Master passphrase changed; {} entries re-encrypted.", ctx.len());
    println!("{}", Status::Ok);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_add_with_generate() {
        let cli = Cli::try_parse_from([
            "lockbox", "--vault-dir", "/tmp/v", "add", "--name", "email", "--generate", "--length",
            "12",
        ])
        .unwrap();

        match cli.command {
            Commands::Add {
                name,
                generate,
                length,
            } => {
                assert_eq!(name, "email");
                assert!(generate);
                assert_eq!(length, Some(12));
            }
            _ => panic!("expected add"),
        }
        assert_eq!(cli.vault_dir, Some(PathBuf::from("/tmp/v")));
    }

    #[test]
    fn test_length_requires_generate() {
        assert!(Cli::try_parse_from(["lockbox", "add", "--name", "x", "--length", "4"]).is_err());
    }

    #[test]
    fn test_commands_do_not_create_a_vault() {
        let dir = TempDir::new().unwrap();
        let manager = VaultManager::new(dir.path().join("vault"));

        assert_eq!(
            configured_secret_length(&manager).unwrap(),
            DEFAULT_SECRET_LENGTH
        );
        assert!(with_vault(&manager, |_, _| Ok(())).is_err());
        assert!(!manager.root().exists());
    }

    #[test]
    fn test_generate_uses_configured_length() {
        let dir = TempDir::new().unwrap();
        let manager = VaultManager::new(dir.path());
        let mut config = VaultConfig::new(KdfParams::moderate());
        config.secret_length = 20;
        manager.save_config(&config).unwrap();

        assert_eq!(configured_secret_length(&manager).unwrap(), 20);
    }

    #[test]
    fn test_report_hides_details() {
        let error = report(Error::Format("blob for 'email' is 3 bytes".to_string()));
        assert_eq!(error.to_string(), Status::InternalError.message());
    }
}
