//! Decoding the ten-column row sets of the list/search procedures
//!
//! `duration` and `price` are selected as text: the interval keeps the
//! server's own formatting and the numeric is parsed into `Price` without a
//! float round trip.

use chrono::{NaiveDate, NaiveTime};
use sqlx::postgres::PgRow;
use sqlx::{Decode, Postgres, Row, Type};

use schedctl_core::{Price, Result, ScheduleError, TrainingRow};

/// `SELECT` list shared by every row-set procedure, in display order
macro_rules! select_trainings_from {
    ($source:literal) => {
        concat!(
            "SELECT id, title, date, start_time, duration::text AS duration, ",
            "max_participants, current_participants, difficulty_level, trainer_name, ",
            "price::text AS price FROM ",
            $source
        )
    };
}

pub const LIST_SQL: &str = select_trainings_from!("get_all_trainings($1)");
pub const SEARCH_SQL: &str = select_trainings_from!("search_training_by_field($1, $2, $3)");

fn column<'r, T>(row: &'r PgRow, name: &str) -> Result<T>
where
    T: Decode<'r, Postgres> + Type<Postgres>,
{
    row.try_get(name)
        .map_err(|e| ScheduleError::Transport(format!("malformed column {name}: {e}")))
}

/// Parse a `numeric::text` price; NULL stays `None`.
pub fn parse_price(text: Option<String>) -> Result<Option<Price>> {
    text.map(|t| {
        t.parse::<Price>()
            .map_err(|e| ScheduleError::Transport(format!("malformed column price '{t}': {e}")))
    })
    .transpose()
}

pub fn decode_training(row: &PgRow) -> Result<TrainingRow> {
    Ok(TrainingRow {
        id: column::<i32>(row, "id")?,
        title: column::<Option<String>>(row, "title")?.unwrap_or_default(),
        date: column::<NaiveDate>(row, "date")?,
        start_time: column::<NaiveTime>(row, "start_time")?,
        duration: column(row, "duration")?,
        max_participants: column(row, "max_participants")?,
        current_participants: column(row, "current_participants")?,
        difficulty_level: column(row, "difficulty_level")?,
        trainer_name: column(row, "trainer_name")?,
        price: parse_price(column(row, "price")?)?,
    })
}

pub fn decode_all(rows: &[PgRow]) -> Result<Vec<TrainingRow>> {
    rows.iter().map(decode_training).collect()
}

#[cfg(test)]
mod tests {
    use schedctl_core::model::TRAINING_COLUMNS;

    use super::*;

    #[test]
    fn select_lists_columns_in_display_order() {
        let select = LIST_SQL
            .strip_prefix("SELECT ")
            .and_then(|s| s.split(" FROM ").next())
            .unwrap();
        let names: Vec<&str> = select
            .split(", ")
            .map(|c| c.rsplit(' ').next().unwrap())
            .collect();
        assert_eq!(names, TRAINING_COLUMNS);
    }

    #[test]
    fn procedures_are_parameterized() {
        assert!(LIST_SQL.ends_with("FROM get_all_trainings($1)"));
        assert!(SEARCH_SQL.ends_with("FROM search_training_by_field($1, $2, $3)"));
    }

    #[test]
    fn price_text() {
        assert_eq!(parse_price(None).unwrap(), None);
        assert_eq!(
            parse_price(Some("15.00".into())).unwrap(),
            Some(Price::from_cents(1500))
        );
        let err = parse_price(Some("$15.00".into())).unwrap_err();
        assert!(err.is_transport());
    }
}
