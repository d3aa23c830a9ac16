//! schedctl CLI - training schedule access from the command line
//!
//! Every command logs in first (`--user`/`--password` or `SCHEDCTL_USER` /
//! `SCHEDCTL_PASSWORD`) and is then checked against the caller's role:
//! guests may `list` and `search`, admins may do everything.

use std::process::ExitCode;

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::debug;

use schedctl_db::config::{self, ServiceConfig};

mod commands;
mod render;
mod tracing_setup;

use commands::admin::{ConfirmArgs, CreateUserArgs};
use commands::trainings::{DeleteArgs, SearchArgs, TrainingArgs, UpdateArgs};
use commands::Context;
use render::OutputFormat;

#[derive(Parser, Debug)]
#[command(
    name = "schedctl",
    author,
    version,
    about = "Manage a training schedule through its PostgreSQL stored procedures",
    long_about = "List, search, add, update and delete scheduled trainings, and run the \
                  administrative procedures (database, table and user setup). Access is \
                  decided by the role stored for your login."
)]
struct Cli {
    /// Login name
    #[arg(long, short = 'u', global = true, env = "SCHEDCTL_USER")]
    user: Option<String>,

    /// Login password
    #[arg(long, short = 'p', global = true, env = "SCHEDCTL_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Human)]
    format: OutputFormat,

    /// Debug logging (RUST_LOG still wins when set)
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check credentials and show the permitted operations
    Login,
    /// List every scheduled training
    List,
    /// Find trainings whose text column equals a value
    Search(SearchArgs),
    /// Schedule a new training
    Add(TrainingArgs),
    /// Change one field or a whole training record
    Update(UpdateArgs),
    /// Delete trainings whose text column equals a value
    Delete(DeleteArgs),
    /// Remove every training from the schedule
    Clear(ConfirmArgs),
    /// Create the schedule database
    CreateDb,
    /// Create the trainings table
    CreateTable,
    /// Drop the schedule database
    DropDb(ConfirmArgs),
    /// Register a new login with a role
    CreateUser(CreateUserArgs),
    /// Generate shell completion scripts
    Completions(CompletionsArgs),
}

#[derive(Parser, Debug)]
struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    shell: Shell,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
#[allow(clippy::enum_variant_names)] // PowerShell is a proper noun, not a suffix
enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // .env first so SCHEDCTL_USER / SCHEDCTL_PASSWORD can come from it
    let loaded = config::load_dotenv();
    let cli = Cli::parse();
    tracing_setup::init_tracing(cli.debug).ok();
    for path in &loaded {
        debug!("loaded environment from {}", path.display());
    }

    match cli.command {
        Commands::Completions(args) => run_completions(args),
        command => {
            let config = ServiceConfig::load().context("failed to load configuration")?;
            let user = cli
                .user
                .context("no login name: pass --user or set SCHEDCTL_USER")?;
            let password = cli
                .password
                .context("no password: pass --password or set SCHEDCTL_PASSWORD")?;

            let ctx = Context::connect(&config, &user, &password, cli.format).await?;
            run(&ctx, command).await
        }
    }
}

async fn run(ctx: &Context, command: Commands) -> Result<ExitCode> {
    use commands::{admin, trainings};

    match command {
        Commands::Login => admin::run_login(ctx),
        Commands::List => trainings::run_list(ctx).await,
        Commands::Search(args) => trainings::run_search(ctx, args).await,
        Commands::Add(args) => trainings::run_add(ctx, args).await,
        Commands::Update(args) => trainings::run_update(ctx, args).await,
        Commands::Delete(args) => trainings::run_delete(ctx, args).await,
        Commands::Clear(args) => admin::run_clear(ctx, args).await,
        Commands::CreateDb => admin::run_create_database(ctx).await,
        Commands::CreateTable => admin::run_create_table(ctx).await,
        Commands::DropDb(args) => admin::run_drop_database(ctx, args).await,
        Commands::CreateUser(args) => admin::run_create_user(ctx, args).await,
        Commands::Completions(args) => run_completions(args),
    }
}

fn run_completions(args: CompletionsArgs) -> Result<ExitCode> {
    use clap::CommandFactory;
    use clap_complete::{generate, Shell as CompletionShell};
    use std::io;

    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();

    let shell = match args.shell {
        Shell::Bash => CompletionShell::Bash,
        Shell::Zsh => CompletionShell::Zsh,
        Shell::Fish => CompletionShell::Fish,
        Shell::PowerShell => CompletionShell::PowerShell,
        Shell::Elvish => CompletionShell::Elvish,
    };

    generate(shell, &mut cmd, bin_name, &mut io::stdout());

    Ok(ExitCode::SUCCESS)
}
