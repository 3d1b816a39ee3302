//! Ledger dates and the store's date-string codec
//!
//! Movement dates are calendar dates: the time of day is cleared to local
//! midnight before anything is persisted or compared. The store keeps them
//! as ISO 8601 calendar dates (`YYYY-MM-DD`), which sort chronologically.

use chrono::{DateTime, Local, NaiveDate, TimeZone};
use miette::Diagnostic;
use thiserror::Error;

/// Textual format of every date column
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Date codec failures
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum DateFormatError {
    #[error("'{input}' is not a calendar date (expected YYYY-MM-DD)")]
    #[diagnostic(code(warehouse::date::unparsable))]
    Unparsable { input: String },

    #[error("column '{column}' requires a date")]
    #[diagnostic(code(warehouse::date::missing))]
    Missing { column: String },
}

/// Same instant's calendar day at local midnight
pub fn clear_time_components(moment: DateTime<Local>) -> DateTime<Local> {
    let midnight = moment.date_naive().and_time(chrono::NaiveTime::MIN);
    // Midnight can be skipped by a DST transition; keep the given moment then
    Local
        .from_local_datetime(&midnight)
        .earliest()
        .unwrap_or(moment)
}

/// Calendar date used by the ledger for a local moment
pub fn ledger_date(moment: DateTime<Local>) -> NaiveDate {
    clear_time_components(moment).date_naive()
}

/// Today's ledger date
pub fn today() -> NaiveDate {
    ledger_date(Local::now())
}

pub fn encode_date(date: &NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Encode a possibly missing date for `column`.
///
/// A missing date is only accepted for nullable columns.
pub fn encode_column(
    column: &str,
    date: Option<&NaiveDate>,
    nullable: bool,
) -> Result<Option<String>, DateFormatError> {
    match date {
        Some(date) => Ok(Some(encode_date(date))),
        None if nullable => Ok(None),
        None => Err(DateFormatError::Missing {
            column: column.to_string(),
        }),
    }
}

pub fn decode_date(text: &str) -> Result<NaiveDate, DateFormatError> {
    let unparsable = || DateFormatError::Unparsable {
        input: text.to_string(),
    };
    // chrono accepts unpadded fields; the stored contract is fixed width
    if text.len() != 10 {
        return Err(unparsable());
    }
    NaiveDate::parse_from_str(text, DATE_FORMAT).map_err(|_| unparsable())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn test_encode_decode() {
        let date = NaiveDate::from_ymd_opt(2023, 1, 10).unwrap();
        assert_eq!(encode_date(&date), "2023-01-10");
        assert_eq!(decode_date("2023-01-10").unwrap(), date);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        for input in ["", "2023-1-10", "10/01/2023", "2023-02-30", "2023-01-10T12:00:00"] {
            assert_eq!(
                decode_date(input),
                Err(DateFormatError::Unparsable {
                    input: input.to_string()
                }),
                "{input}"
            );
        }
    }

    #[test]
    fn test_encode_column_nullability() {
        let date = NaiveDate::from_ymd_opt(2023, 1, 12).unwrap();
        assert_eq!(
            encode_column("movement_date", Some(&date), false).unwrap(),
            Some("2023-01-12".to_string())
        );
        assert_eq!(encode_column("note", None, true).unwrap(), None);
        assert!(matches!(
            encode_column("movement_date", None, false),
            Err(DateFormatError::Missing { .. })
        ));
    }

    #[test]
    fn test_clear_time_components() {
        let moment = Local.with_ymd_and_hms(2023, 1, 13, 15, 42, 7).earliest().unwrap();
        let cleared = clear_time_components(moment);
        assert_eq!(cleared.hour(), 0);
        assert_eq!(cleared.minute(), 0);
        assert_eq!(cleared.second(), 0);
        assert_eq!(ledger_date(moment), NaiveDate::from_ymd_opt(2023, 1, 13).unwrap());
    }
}
