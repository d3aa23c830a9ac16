//! Human and JSON rendering of outcomes

use anyhow::Result;
use clap::ValueEnum;

use schedctl_core::model::TRAINING_COLUMNS;
use schedctl_core::{Completion, Operation, Outcome, TrainingRow};

#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Tables and one-line messages
    #[default]
    Human,
    /// One JSON document per call
    Json,
}

pub fn render(format: OutputFormat, operation: Operation, outcome: &Outcome) -> Result<String> {
    match format {
        OutputFormat::Human => Ok(human(operation, outcome)),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(outcome)?),
    }
}

/// User-facing text for an outcome.
pub fn human(operation: Operation, outcome: &Outcome) -> String {
    match outcome {
        Outcome::Created { id } => format!("training added with id {id}"),
        Outcome::Affected { count } => match operation {
            Operation::DeleteTraining => format!("deleted {count} training(s)"),
            Operation::UpdateTraining => format!("updated {count} training(s)"),
            Operation::ClearDatabase => format!("cleared {count} training(s)"),
            _ => format!("{count} row(s) affected"),
        },
        Outcome::Completed { completion } => match completion {
            Completion::DatabaseCreated => "database created".to_owned(),
            Completion::TableCreated => "trainings table created".to_owned(),
            Completion::DatabaseDropped => "database dropped".to_owned(),
            Completion::UserCreated => "user created".to_owned(),
        },
        Outcome::Rows { rows } if rows.is_empty() => "no trainings scheduled".to_owned(),
        Outcome::Rows { rows } => table(rows),
        Outcome::NoMatches { field, value } => format!("no trainings where {field} = '{value}'"),
        Outcome::NotFound => "no matching training".to_owned(),
        Outcome::Rejected { rejection } if rejection.is_conflict() => {
            format!("conflict: {rejection} (code {})", rejection.code())
        }
        Outcome::Rejected { rejection } => {
            format!("rejected: {rejection} (code {})", rejection.code())
        }
    }
}

/// Fixed-width ten-column table, header first.
pub fn table(rows: &[TrainingRow]) -> String {
    let cells: Vec<[String; 10]> = rows.iter().map(TrainingRow::cells).collect();

    let mut widths = TRAINING_COLUMNS.map(str::len);
    for row in &cells {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let line = |values: &mut dyn Iterator<Item = &str>| -> String {
        values
            .zip(widths)
            .map(|(value, width)| format!("{value:<width$}"))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_owned()
    };

    let mut out = vec![line(&mut TRAINING_COLUMNS.iter().copied())];
    out.push(line(&mut widths.iter().map(|w| &DASHES[..(*w).min(DASHES.len())])));
    for row in &cells {
        out.push(line(&mut row.iter().map(String::as_str)));
    }
    out.join("\n")
}

const DASHES: &str = "----------------------------------------------------------------";

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveTime};
    use schedctl_core::{Price, Rejection};

    use super::*;

    fn row(id: i32, title: &str) -> TrainingRow {
        TrainingRow {
            id,
            title: title.into(),
            date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            start_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            duration: Some("01:00:00".into()),
            max_participants: Some(10),
            current_participants: None,
            difficulty_level: None,
            trainer_name: Some("Olga".into()),
            price: None,
        }
    }

    #[test]
    fn table_has_header_and_placeholders() {
        let text = table(&[row(1, "Yoga"), row(12, "Pilates")]);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("id  title    date"));
        assert!(lines[1].starts_with("--  -------"));
        assert!(lines[2].contains("N/A"));
        assert!(lines[2].ends_with("0.00"));
        assert!(lines[3].starts_with("12  Pilates"));
    }

    #[test]
    fn search_sentinel_names_field_and_value() {
        let outcome = Outcome::NoMatches {
            field: "title".into(),
            value: "Yoga".into(),
        };
        assert_eq!(
            human(Operation::SearchTraining, &outcome),
            "no trainings where title = 'Yoga'"
        );
    }

    #[test]
    fn messages_depend_on_operation() {
        let outcome = Outcome::Affected { count: 2 };
        assert_eq!(human(Operation::DeleteTraining, &outcome), "deleted 2 training(s)");
        assert_eq!(human(Operation::ClearDatabase, &outcome), "cleared 2 training(s)");
        assert_eq!(
            human(Operation::GetAllTrainings, &Outcome::Rows { rows: vec![] }),
            "no trainings scheduled"
        );
    }

    #[test]
    fn rejections_show_reason_and_code() {
        let outcome = Outcome::Rejected {
            rejection: Rejection::TrainerConflict,
        };
        let text = human(Operation::AddTraining, &outcome);
        assert!(text.contains("trainer already has a session"));
        assert!(text.ends_with("(code -6)"));
    }

    #[test]
    fn existing_state_is_reported_as_conflict() {
        let clash = Outcome::Rejected {
            rejection: Rejection::UserAlreadyExists,
        };
        assert_eq!(
            human(Operation::CreateUser, &clash),
            "conflict: user already exists (code -13)"
        );

        let bad_input = Outcome::Rejected {
            rejection: Rejection::MaxParticipantsNotPositive,
        };
        assert!(human(Operation::AddTraining, &bad_input).starts_with("rejected: "));
    }

    #[test]
    fn json_is_tagged() {
        let outcome = Outcome::Created { id: 5 };
        let text = render(OutputFormat::Json, Operation::AddTraining, &outcome).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["outcome"], "created");
        assert_eq!(value["id"], 5);

        let priced = Outcome::Rows {
            rows: vec![TrainingRow {
                price: Some(Price::from_cents(1250)),
                ..row(1, "Yoga")
            }],
        };
        let text = render(OutputFormat::Json, Operation::GetAllTrainings, &priced).unwrap();
        assert!(text.contains("\"12.50\""));
    }
}
