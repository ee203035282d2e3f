//! Statement results as JSON rows.

use futures::stream::BoxStream;
use futures::TryStreamExt;
use indexmap::IndexMap;
use sqlx::Either;

use crate::error::Error;

/// Column name to value, in result-set column order.
pub type Row = IndexMap<String, serde_json::Value>;

/// The rows of one statement. Statements that produce no rows have a single
/// `{"count": <affected rows>}` row.
pub type StatementResult = Vec<Row>;

pub const COUNT_COLUMN: &str = "count";

pub fn count_row(rows_affected: u64) -> Row {
    IndexMap::from([(COUNT_COLUMN.to_string(), serde_json::Value::from(rows_affected))])
}

/// Add a column to a row. A name already in the row gets the first free `_2`, `_3`,
/// ... suffix so no value is lost.
pub(crate) fn insert_column(row: &mut Row, name: &str, value: serde_json::Value) {
    if !row.contains_key(name) {
        row.insert(name.to_string(), value);
        return;
    }
    let mut n = 2;
    while row.contains_key(&format!("{name}_{n}")) {
        n += 1;
    }
    row.insert(format!("{name}_{n}"), value);
}

/// Drain a result stream, which may interleave the results of several statements when
/// multi-statement text was sent.
pub(crate) async fn drain<Q, R>(
    mut stream: BoxStream<'_, Result<Either<Q, R>, sqlx::Error>>,
    rows_affected: impl Fn(&Q) -> u64,
    decode: impl Fn(&R) -> Result<Row, Error>,
) -> Result<StatementResult, Error> {
    let mut rows = vec![];
    let mut affected = 0;
    while let Some(step) = stream.try_next().await? {
        match step {
            Either::Left(done) => affected += rows_affected(&done),
            Either::Right(row) => rows.push(decode(&row)?),
        }
    }
    if rows.is_empty() {
        rows.push(count_row(affected));
    }
    Ok(rows)
}

pub(crate) fn float_value(value: f64) -> serde_json::Value {
    serde_json::Number::from_f64(value).map_or(serde_json::Value::Null, serde_json::Value::Number)
}

/// `f32` through its shortest decimal form, so `0.1` stays `0.1`.
pub(crate) fn real_value(value: f32) -> serde_json::Value {
    value
        .to_string()
        .parse::<f64>()
        .map_or(serde_json::Value::Null, float_value)
}

/// A decimal as a JSON number when it parses as one, otherwise as its text.
pub(crate) fn decimal_value(text: &str) -> serde_json::Value {
    text.parse::<serde_json::Number>()
        .map_or_else(|_| serde_json::Value::String(text.to_string()), serde_json::Value::Number)
}

pub(crate) fn timestamp_value(value: &chrono::NaiveDateTime) -> serde_json::Value {
    serde_json::Value::String(value.format("%Y-%m-%dT%H:%M:%S%.f").to_string())
}

pub(crate) fn timestamptz_value(value: &chrono::DateTime<chrono::Utc>) -> serde_json::Value {
    serde_json::Value::String(value.to_rfc3339_opts(chrono::SecondsFormat::AutoSi, true))
}
