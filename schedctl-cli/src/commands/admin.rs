//! Session and administrative commands

use std::process::ExitCode;

use anyhow::{bail, Result};
use clap::Args;
use serde_json::json;

use schedctl_core::policy::{authorize, permitted};
use schedctl_core::{DatabaseName, NewUser, Operation, Role};

use super::Context;
use crate::render::OutputFormat;

#[derive(Args, Debug)]
pub struct ConfirmArgs {
    /// Skip the safety check for destructive commands
    #[arg(long)]
    pub yes: bool,
}

#[derive(Args, Debug)]
pub struct CreateUserArgs {
    /// Login name of the new account
    #[arg(long = "new-user", value_name = "NAME")]
    pub username: String,

    /// Password of the new account
    #[arg(long = "new-password", value_name = "PASSWORD")]
    pub password: String,

    /// Role of the new account: admin or guest
    #[arg(long, default_value = "guest")]
    pub role: String,
}

/// Show who the credentials resolve to and what they may do.
pub fn run_login(ctx: &Context) -> Result<ExitCode> {
    let session = &ctx.session;
    let operations = permitted(session.role());

    match ctx.format {
        OutputFormat::Human => {
            let names: Vec<&str> = operations.iter().map(|op| op.as_str()).collect();
            println!("logged in as {} ({})", session.username(), session.role());
            println!("permitted: {}", names.join(", "));
        }
        OutputFormat::Json => {
            let value = json!({
                "username": session.username(),
                "role": session.role(),
                "permitted": operations.iter().map(|op| op.as_str()).collect::<Vec<_>>(),
            });
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
    }
    Ok(ExitCode::SUCCESS)
}

pub async fn run_create_database(ctx: &Context) -> Result<ExitCode> {
    let outcome = ctx.scheduler.create_database(&ctx.session).await;
    ctx.report(Operation::CreateDatabase, outcome)
}

pub async fn run_create_table(ctx: &Context) -> Result<ExitCode> {
    let outcome = ctx.scheduler.create_table(&ctx.session).await;
    ctx.report(Operation::CreateTable, outcome)
}

pub async fn run_clear(ctx: &Context, args: ConfirmArgs) -> Result<ExitCode> {
    confirm(ctx, Operation::ClearDatabase, args)?;
    let outcome = ctx.scheduler.clear_database(&ctx.session).await;
    ctx.report(Operation::ClearDatabase, outcome)
}

pub async fn run_drop_database(ctx: &Context, args: ConfirmArgs) -> Result<ExitCode> {
    confirm(ctx, Operation::DropDatabase, args)?;
    let outcome = ctx.scheduler.drop_database(&ctx.session).await;
    ctx.report(Operation::DropDatabase, outcome)
}

pub async fn run_create_user(ctx: &Context, args: CreateUserArgs) -> Result<ExitCode> {
    let user = NewUser::new(args.username, args.password, args.role);
    let outcome = ctx.scheduler.create_user(&ctx.session, &user).await;
    ctx.report(Operation::CreateUser, outcome)
}

/// Stop a destructive command that lacks `--yes`. A caller the policy denies
/// goes on to the scheduler, which reports the denial instead.
fn confirm(ctx: &Context, operation: Operation, args: ConfirmArgs) -> Result<()> {
    if needs_confirmation(ctx.session.role(), operation, args.yes) {
        bail!("{}; re-run with --yes", consequence(operation, ctx.scheduler.target()));
    }
    Ok(())
}

fn needs_confirmation(role: Role, operation: Operation, yes: bool) -> bool {
    !yes && authorize(role, operation)
}

fn consequence(operation: Operation, target: &DatabaseName) -> String {
    match operation {
        Operation::ClearDatabase => format!("clear removes every training in '{target}'"),
        Operation::DropDatabase => {
            format!("drop-db drops the database '{target}' and everything in it")
        }
        other => format!("{other} on '{target}' cannot be undone"),
    }
}
