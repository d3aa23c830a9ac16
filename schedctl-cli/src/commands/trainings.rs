//! Training commands: list, search, add, update, delete

use std::process::ExitCode;

use std::ffi::OsStr;

use anyhow::Result;
use chrono::{NaiveDate, NaiveTime};
use clap::builder::{PossibleValue, TypedValueParser};
use clap::error::ErrorKind;
use clap::{Arg, Args, Command, Subcommand};

use schedctl_core::{DifficultyLevel, NewTraining, Operation, Price};

use super::Context;

/// Fields of a training record
///
/// Participant counts and the level are passed through as given; the database
/// decides whether they are acceptable.
#[derive(Args, Debug, Clone)]
pub struct TrainingArgs {
    /// Title of the training
    #[arg(long)]
    pub title: String,

    /// Date (YYYY-MM-DD)
    #[arg(long)]
    pub date: NaiveDate,

    /// Start time (HH:MM:SS)
    #[arg(long = "start-time", value_name = "TIME")]
    pub start_time: NaiveTime,

    /// Duration as a PostgreSQL interval, e.g. 01:30:00 or '90 minutes'
    #[arg(long)]
    pub duration: String,

    /// Maximum number of participants
    #[arg(long = "max-participants", value_name = "N", allow_negative_numbers = true)]
    pub max_participants: i32,

    /// Participants already signed up
    #[arg(
        long = "current-participants",
        value_name = "N",
        default_value_t = 0,
        allow_negative_numbers = true
    )]
    pub current_participants: i32,

    /// Difficulty level
    #[arg(long, default_value = "mixed", value_parser = LevelParser)]
    pub level: String,

    /// Trainer running the session
    #[arg(long)]
    pub trainer: String,

    /// Price, e.g. 15 or 15.50
    #[arg(long, default_value = "0")]
    pub price: Price,
}

/// Offers the known levels to help and completions but keeps any text, so
/// the database still answers an unknown level with its own code.
#[derive(Debug, Clone, Copy)]
pub struct LevelParser;

impl TypedValueParser for LevelParser {
    type Value = String;

    fn parse_ref(
        &self,
        cmd: &Command,
        _arg: Option<&Arg>,
        value: &OsStr,
    ) -> std::result::Result<String, clap::Error> {
        let text = value
            .to_str()
            .ok_or_else(|| clap::Error::new(ErrorKind::InvalidUtf8).with_cmd(cmd))?;
        if text.parse::<DifficultyLevel>().is_err() {
            tracing::debug!(level = text, "unknown difficulty level passed through");
        }
        Ok(text.to_owned())
    }

    fn possible_values(&self) -> Option<Box<dyn Iterator<Item = PossibleValue> + '_>> {
        Some(Box::new(
            DifficultyLevel::ALL
                .into_iter()
                .map(|level| PossibleValue::new(level.as_str())),
        ))
    }
}

impl From<TrainingArgs> for NewTraining {
    fn from(args: TrainingArgs) -> Self {
        NewTraining {
            title: args.title,
            date: args.date,
            start_time: args.start_time,
            duration: args.duration,
            max_participants: args.max_participants,
            current_participants: args.current_participants,
            difficulty_level: args.level,
            trainer_name: args.trainer,
            price: args.price,
        }
    }
}

#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Text column to match (title, trainer_name, difficulty_level, ...)
    #[arg(long)]
    pub field: String,

    /// Exact value to look for
    #[arg(long)]
    pub value: String,
}

#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Text column to match
    #[arg(long)]
    pub field: String,

    /// Every training whose column equals this value is deleted
    #[arg(long)]
    pub value: String,
}

#[derive(Args, Debug)]
pub struct UpdateArgs {
    #[command(subcommand)]
    pub command: UpdateCommand,
}

#[derive(Subcommand, Debug)]
pub enum UpdateCommand {
    /// Set one text column of a training
    Field(UpdateFieldArgs),
    /// Replace every field of a training
    Record(UpdateRecordArgs),
}

#[derive(Args, Debug)]
pub struct UpdateFieldArgs {
    /// Training id
    #[arg(long, allow_negative_numbers = true)]
    pub id: i32,

    /// Column to set
    #[arg(long)]
    pub field: String,

    /// New value
    #[arg(long)]
    pub value: String,
}

#[derive(Args, Debug)]
pub struct UpdateRecordArgs {
    /// Training id
    #[arg(long, allow_negative_numbers = true)]
    pub id: i32,

    #[command(flatten)]
    pub training: TrainingArgs,
}

pub async fn run_list(ctx: &Context) -> Result<ExitCode> {
    let outcome = ctx.scheduler.get_all_trainings(&ctx.session).await;
    ctx.report(Operation::GetAllTrainings, outcome)
}

pub async fn run_search(ctx: &Context, args: SearchArgs) -> Result<ExitCode> {
    let outcome = ctx
        .scheduler
        .search_training(&ctx.session, &args.field, &args.value)
        .await;
    ctx.report(Operation::SearchTraining, outcome)
}

pub async fn run_add(ctx: &Context, args: TrainingArgs) -> Result<ExitCode> {
    let training = NewTraining::from(args);
    let outcome = ctx.scheduler.add_training(&ctx.session, &training).await;
    ctx.report(Operation::AddTraining, outcome)
}

pub async fn run_delete(ctx: &Context, args: DeleteArgs) -> Result<ExitCode> {
    let outcome = ctx
        .scheduler
        .delete_training(&ctx.session, &args.field, &args.value)
        .await;
    ctx.report(Operation::DeleteTraining, outcome)
}

pub async fn run_update(ctx: &Context, args: UpdateArgs) -> Result<ExitCode> {
    let outcome = match args.command {
        UpdateCommand::Field(args) => {
            ctx.scheduler
                .update_training_field(&ctx.session, args.id, &args.field, &args.value)
                .await
        }
        UpdateCommand::Record(args) => {
            let training = NewTraining::from(args.training);
            ctx.scheduler
                .update_training_record(&ctx.session, args.id, &training)
                .await
        }
    };
    ctx.report(Operation::UpdateTraining, outcome)
}
