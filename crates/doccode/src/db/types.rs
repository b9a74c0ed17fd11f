//! SQLite column conversions for the registry's value types.
//!
//! Everything is stored as text and re-validated when read back.

use std::str::FromStr;

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};

use crate::codes::Code;
use crate::models::{CodeStatus, ConfidenceLevel, DocumentType, ExtractionSource, ProcessingStatus};

fn parse_text<T>(value: ValueRef<'_>) -> FromSqlResult<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .as_str()?
        .parse::<T>()
        .map_err(|e| FromSqlError::Other(Box::new(e)))
}

impl ToSql for Code {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Code {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        parse_text(value)
    }
}

macro_rules! text_column {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl ToSql for $ty {
                fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                    Ok(ToSqlOutput::from(self.as_str()))
                }
            }

            impl FromSql for $ty {
                fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                    parse_text(value)
                }
            }
        )+
    };
}

text_column!(
    DocumentType,
    ProcessingStatus,
    ConfidenceLevel,
    ExtractionSource,
    CodeStatus,
);
