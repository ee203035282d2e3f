//! PostgreSQL connections.

use std::fmt::Write as _;
use std::net::IpAddr;

use async_trait::async_trait;
use futures::future::BoxFuture;
use query_engine_sql::sql::string::{Param, PlaceholderStyle, SQL};
use sqlx::encode::IsNull;
use sqlx::error::BoxDynError;
use sqlx::postgres::types::{Oid, PgInterval, PgMoney};
use sqlx::postgres::{
    PgArgumentBuffer, PgArguments, PgConnectOptions, PgHasArrayType, PgRow, PgTypeInfo,
    PgValueFormat, PgValueRef,
};
use sqlx::query::Query;
use sqlx::{
    Column, ConnectOptions, Connection as _, Decode, Encode, Executor, Postgres, Row as _,
    TypeInfo, ValueRef,
};

use crate::connection::{ConnectTarget, Connection, Transaction};
use crate::error::Error;
use crate::results::{self, Row, StatementResult};

pub struct PgConnection {
    inner: sqlx::PgConnection,
}

pub fn open(target: ConnectTarget) -> BoxFuture<'static, Result<Box<dyn Connection>, Error>> {
    Box::pin(async move {
        let mut options = PgConnectOptions::from_url(&target.url)
            .map_err(Error::Connection)?
            .disable_statement_logging();
        if let Some(username) = &target.username {
            options = options.username(username);
        }
        if let Some(password) = &target.password {
            options = options.password(password);
        }
        let inner = options.connect().await.map_err(Error::Connection)?;
        Ok(Box::new(PgConnection { inner }) as Box<dyn Connection>)
    })
}

#[async_trait]
impl Connection for PgConnection {
    fn placeholder_style(&self) -> PlaceholderStyle {
        PlaceholderStyle::Numbered
    }

    async fn begin<'c>(&'c mut self) -> Result<Box<dyn Transaction + 'c>, Error> {
        let inner = self.inner.begin().await?;
        Ok(Box::new(PgTransaction { inner }))
    }

    async fn close(self: Box<Self>) -> Result<(), Error> {
        self.inner.close().await.map_err(Error::Connection)
    }
}

struct PgTransaction<'c> {
    inner: sqlx::Transaction<'c, Postgres>,
}

#[async_trait]
impl<'c> Transaction for PgTransaction<'c> {
    async fn execute(&mut self, statement: &SQL) -> Result<StatementResult, Error> {
        let connection = &mut *self.inner;
        if statement.has_params() {
            let stream = bind(sqlx::query(&statement.sql), &statement.params).fetch_many(connection);
            results::drain(stream, sqlx::postgres::PgQueryResult::rows_affected, decode_row).await
        } else {
            let stream = connection.fetch_many(statement.sql.as_str());
            results::drain(stream, sqlx::postgres::PgQueryResult::rows_affected, decode_row).await
        }
    }

    async fn commit(self: Box<Self>) -> Result<(), Error> {
        Ok(self.inner.commit().await?)
    }

    async fn rollback(self: Box<Self>) -> Result<(), Error> {
        Ok(self.inner.rollback().await?)
    }
}

/// A null whose type is left for the server to infer from the placeholder's context.
struct UntypedNull;

impl sqlx::Type<Postgres> for UntypedNull {
    fn type_info() -> PgTypeInfo {
        PgTypeInfo::with_oid(Oid(0))
    }
}

impl Encode<'_, Postgres> for UntypedNull {
    fn encode_by_ref(&self, _buf: &mut PgArgumentBuffer) -> IsNull {
        IsNull::Yes
    }
}

const NUMERIC_OID: Oid = Oid(1700);
const NUMERIC_ARRAY_OID: Oid = Oid(1231);

/// A NUMERIC bound in the binary wire format.
struct NumericParam(Vec<u8>);

impl sqlx::Type<Postgres> for NumericParam {
    fn type_info() -> PgTypeInfo {
        PgTypeInfo::with_oid(NUMERIC_OID)
    }
}

impl Encode<'_, Postgres> for NumericParam {
    fn encode_by_ref(&self, buf: &mut PgArgumentBuffer) -> IsNull {
        buf.extend_from_slice(&self.0);
        IsNull::No
    }
}

/// A NUMERIC read as its decimal text.
struct Numeric(String);

impl sqlx::Type<Postgres> for Numeric {
    fn type_info() -> PgTypeInfo {
        PgTypeInfo::with_oid(NUMERIC_OID)
    }
}

impl PgHasArrayType for Numeric {
    fn array_type_info() -> PgTypeInfo {
        PgTypeInfo::with_oid(NUMERIC_ARRAY_OID)
    }
}

impl<'r> Decode<'r, Postgres> for Numeric {
    fn decode(value: PgValueRef<'r>) -> Result<Self, BoxDynError> {
        Ok(Numeric(match value.format() {
            PgValueFormat::Text => value.as_str()?.to_string(),
            PgValueFormat::Binary => numeric_to_string(value.as_bytes()?),
        }))
    }
}

fn bind<'q>(
    query: Query<'q, Postgres, PgArguments>,
    params: &'q [Param],
) -> Query<'q, Postgres, PgArguments> {
    params.iter().fold(query, |query, param| match param {
        Param::Text(text) => query.bind(text.as_str()),
        Param::Boolean(b) => query.bind(*b),
        Param::Integer(i) => query.bind(*i),
        Param::Decimal(decimal) => match numeric_to_bytes(decimal) {
            Some(bytes) => query.bind(NumericParam(bytes)),
            None => query.bind(decimal.as_str()),
        },
        Param::Null => query.bind(UntypedNull),
    })
}

fn decode_row(row: &PgRow) -> Result<Row, Error> {
    let mut decoded = Row::new();
    for column in row.columns() {
        let value = decode_value(row, column.ordinal()).map_err(|source| match source {
            DecodeError::Unsupported(type_name) => Error::UnsupportedColumn {
                column: column.name().to_string(),
                type_name,
            },
            DecodeError::Sqlx(source) => Error::ColumnDecode {
                column: column.name().to_string(),
                source,
            },
        })?;
        results::insert_column(&mut decoded, column.name(), value);
    }
    Ok(decoded)
}

enum DecodeError {
    Unsupported(String),
    Sqlx(sqlx::Error),
}

impl From<sqlx::Error> for DecodeError {
    fn from(err: sqlx::Error) -> Self {
        DecodeError::Sqlx(err)
    }
}

fn decode_value(row: &PgRow, index: usize) -> Result<serde_json::Value, DecodeError> {
    let raw = row.try_get_raw(index)?;
    if raw.is_null() {
        return Ok(serde_json::Value::Null);
    }
    let type_name = row.columns()[index].type_info().name();
    if let Some(element) = type_name.strip_suffix("[]") {
        if let Ok(Some(value)) = decode_array(row, index, element) {
            return Ok(value);
        }
    }
    let value = match type_name {
        "BOOL" => serde_json::Value::Bool(row.try_get(index)?),
        "INT2" => serde_json::Value::from(row.try_get::<i16, _>(index)?),
        "INT4" => serde_json::Value::from(row.try_get::<i32, _>(index)?),
        "INT8" => serde_json::Value::from(row.try_get::<i64, _>(index)?),
        "OID" => serde_json::Value::from(row.try_get::<Oid, _>(index)?.0),
        "FLOAT4" => results::real_value(row.try_get(index)?),
        "FLOAT8" => results::float_value(row.try_get(index)?),
        "NUMERIC" => results::decimal_value(&row.try_get_unchecked::<Numeric, _>(index)?.0),
        "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" | "CHAR" | "UNKNOWN" | "CITEXT" | "citext" => {
            serde_json::Value::String(row.try_get_unchecked(index)?)
        }
        "JSON" | "JSONB" => row.try_get(index)?,
        "UUID" => serde_json::Value::String(row.try_get::<uuid::Uuid, _>(index)?.to_string()),
        "TIMESTAMPTZ" => results::timestamptz_value(&row.try_get(index)?),
        "TIMESTAMP" => results::timestamp_value(&row.try_get(index)?),
        "DATE" => serde_json::Value::String(row.try_get::<chrono::NaiveDate, _>(index)?.to_string()),
        "TIME" => serde_json::Value::String(row.try_get::<chrono::NaiveTime, _>(index)?.to_string()),
        "VOID" => serde_json::Value::Null,
        other => decode_other(row, index, other)?,
    };
    Ok(value)
}

/// One-dimensional arrays of the element types above, as JSON arrays.
fn decode_array(
    row: &PgRow,
    index: usize,
    element: &str,
) -> Result<Option<serde_json::Value>, sqlx::Error> {
    fn values<T, F>(row: &PgRow, index: usize, to_json: F) -> Result<serde_json::Value, sqlx::Error>
    where
        T: for<'a> Decode<'a, Postgres> + sqlx::Type<Postgres>,
        F: Fn(T) -> serde_json::Value,
    {
        let elements = row.try_get_unchecked::<Vec<Option<T>>, _>(index)?;
        Ok(elements
            .into_iter()
            .map(|element| element.map_or(serde_json::Value::Null, &to_json))
            .collect())
    }

    let value = match element {
        "BOOL" => values(row, index, serde_json::Value::Bool)?,
        "INT2" => values::<i16, _>(row, index, serde_json::Value::from)?,
        "INT4" => values::<i32, _>(row, index, serde_json::Value::from)?,
        "INT8" => values::<i64, _>(row, index, serde_json::Value::from)?,
        "FLOAT4" => values(row, index, results::real_value)?,
        "FLOAT8" => values(row, index, results::float_value)?,
        "NUMERIC" => values(row, index, |numeric: Numeric| results::decimal_value(&numeric.0))?,
        "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" => values(row, index, serde_json::Value::String)?,
        "JSON" | "JSONB" => values(row, index, |value: serde_json::Value| value)?,
        "UUID" => values(row, index, |uuid: uuid::Uuid| {
            serde_json::Value::String(uuid.to_string())
        })?,
        "DATE" => values(row, index, |date: chrono::NaiveDate| {
            serde_json::Value::String(date.to_string())
        })?,
        "TIMESTAMP" => values(row, index, |timestamp: chrono::NaiveDateTime| {
            results::timestamp_value(&timestamp)
        })?,
        "TIMESTAMPTZ" => values(row, index, |timestamp: chrono::DateTime<chrono::Utc>| {
            results::timestamptz_value(&timestamp)
        })?,
        _ => return Ok(None),
    };
    Ok(Some(value))
}

/// Any other type as the text PostgreSQL writes for it. Results of the simple query
/// protocol are text already; binary results are rendered for the common types and
/// otherwise read as UTF-8.
fn decode_other(
    row: &PgRow,
    index: usize,
    type_name: &str,
) -> Result<serde_json::Value, DecodeError> {
    let raw = row.try_get_raw(index)?;
    if matches!(raw.format(), PgValueFormat::Text) {
        let text = raw.as_str().map_err(sqlx::Error::Decode)?;
        return Ok(serde_json::Value::String(text.to_string()));
    }
    let text = match type_name {
        "INTERVAL" => Some(interval_to_string(&row.try_get::<PgInterval, _>(index)?)),
        "MONEY" => return Ok(money_value(row.try_get::<PgMoney, _>(index)?.0)),
        "INET" | "CIDR" => raw
            .as_bytes()
            .ok()
            .and_then(|bytes| inet_to_string(bytes, type_name == "CIDR")),
        _ => raw
            .as_bytes()
            .ok()
            .and_then(|bytes| std::str::from_utf8(bytes).ok())
            .map(str::to_string),
    };
    text.map(serde_json::Value::String)
        .ok_or_else(|| DecodeError::Unsupported(type_name.to_string()))
}

/// The `postgres` interval style, e.g. `1 year 2 mons 3 days 04:05:06.5`.
fn interval_to_string(interval: &PgInterval) -> String {
    fn unit(n: i32, name: &str) -> String {
        if n == 1 {
            format!("1 {name}")
        } else {
            format!("{n} {name}s")
        }
    }

    let mut parts = vec![];
    let (years, months) = (interval.months / 12, interval.months % 12);
    if years != 0 {
        parts.push(unit(years, "year"));
    }
    if months != 0 {
        parts.push(unit(months, "mon"));
    }
    if interval.days != 0 {
        parts.push(unit(interval.days, "day"));
    }
    if interval.microseconds != 0 || parts.is_empty() {
        let sign = if interval.microseconds < 0 { "-" } else { "" };
        let micros = interval.microseconds.unsigned_abs();
        let seconds = micros / 1_000_000;
        let mut time = format!(
            "{sign}{:02}:{:02}:{:02}",
            seconds / 3600,
            seconds / 60 % 60,
            seconds % 60
        );
        let fraction = format!("{:06}", micros % 1_000_000);
        let fraction = fraction.trim_end_matches('0');
        if !fraction.is_empty() {
            time.push('.');
            time.push_str(fraction);
        }
        parts.push(time);
    }
    parts.join(" ")
}

/// MONEY is a count of cents.
fn money_value(cents: i64) -> serde_json::Value {
    let sign = if cents < 0 { "-" } else { "" };
    let cents = cents.unsigned_abs();
    results::decimal_value(&format!("{sign}{}.{:02}", cents / 100, cents % 100))
}

/// INET and CIDR in the binary wire format: family, prefix bits, a cidr flag, the
/// address length and the address.
fn inet_to_string(bytes: &[u8], cidr: bool) -> Option<String> {
    let [family, bits, _, length, address @ ..] = bytes else {
        return None;
    };
    let (address, max_bits): (IpAddr, u8) = match (*family, *length) {
        (2, 4) => (<[u8; 4]>::try_from(address).ok()?.into(), 32),
        (3, 16) => (<[u8; 16]>::try_from(address).ok()?.into(), 128),
        _ => return None,
    };
    Some(if cidr || *bits != max_bits {
        format!("{address}/{bits}")
    } else {
        address.to_string()
    })
}

const NUMERIC_POS: u16 = 0x0000;
const NUMERIC_NEG: u16 = 0x4000;
const NUMERIC_NAN: u16 = 0xC000;
const NUMERIC_PINF: u16 = 0xD000;
const NUMERIC_NINF: u16 = 0xF000;

/// Render a NUMERIC in the binary wire format: four 16-bit header words (number of
/// digits, weight, sign, display scale) followed by base-10000 digits.
fn numeric_to_string(bytes: &[u8]) -> String {
    let word = |i: usize| -> u16 {
        bytes
            .get(i * 2..i * 2 + 2)
            .map_or(0, |pair| u16::from_be_bytes([pair[0], pair[1]]))
    };
    let ndigits = usize::from(word(0));
    let weight = i32::from(i16::from_be_bytes(word(1).to_be_bytes()));
    let sign = word(2);
    let scale = usize::from(word(3));
    match sign {
        NUMERIC_NAN => return "NaN".to_string(),
        NUMERIC_PINF => return "Infinity".to_string(),
        NUMERIC_NINF => return "-Infinity".to_string(),
        _ => {}
    }
    let digit = |position: i32| -> u16 {
        usize::try_from(position)
            .ok()
            .filter(|position| *position < ndigits)
            .map_or(0, |position| word(4 + position))
    };

    let mut text = String::new();
    if sign == NUMERIC_NEG {
        text.push('-');
    }
    if weight < 0 {
        text.push('0');
    } else {
        let _ = write!(text, "{}", digit(0));
        for position in 1..=weight {
            let _ = write!(text, "{:04}", digit(position));
        }
    }
    if scale > 0 {
        let mut fraction = String::new();
        let mut position = weight + 1;
        while fraction.len() < scale {
            let _ = write!(fraction, "{:04}", digit(position));
            position += 1;
        }
        fraction.truncate(scale);
        text.push('.');
        text.push_str(&fraction);
    }
    text
}

/// Encode plain decimal text such as `-12.50` as a binary NUMERIC.
fn numeric_to_bytes(text: &str) -> Option<Vec<u8>> {
    let (negative, unsigned) = match text.strip_prefix('-') {
        Some(unsigned) => (true, unsigned),
        None => (false, text),
    };
    let (whole, fraction) = unsigned.split_once('.').unwrap_or((unsigned, ""));
    if (whole.is_empty() && fraction.is_empty())
        || !whole.bytes().chain(fraction.bytes()).all(|b| b.is_ascii_digit())
    {
        return None;
    }
    let scale = u16::try_from(fraction.len()).ok()?;

    // Pad both sides out to whole base-10000 digits.
    let whole = whole.trim_start_matches('0');
    let whole = format!("{}{whole}", "0".repeat((4 - whole.len() % 4) % 4));
    let fraction = format!("{fraction}{}", "0".repeat((4 - fraction.len() % 4) % 4));
    let mut digits: Vec<u16> = format!("{whole}{fraction}")
        .as_bytes()
        .chunks(4)
        .map(|chunk| chunk.iter().fold(0, |acc, b| acc * 10 + u16::from(b - b'0')))
        .collect();
    let mut weight = i32::try_from(whole.len() / 4).ok()? - 1;

    let leading = digits.iter().take_while(|digit| **digit == 0).count();
    digits.drain(..leading);
    weight -= i32::try_from(leading).ok()?;
    while digits.last() == Some(&0) {
        digits.pop();
    }
    let (weight, sign) = match (digits.is_empty(), negative) {
        (true, _) => (0, NUMERIC_POS),
        (false, true) => (weight, NUMERIC_NEG),
        (false, false) => (weight, NUMERIC_POS),
    };

    let mut bytes = Vec::with_capacity(8 + digits.len() * 2);
    bytes.extend(u16::try_from(digits.len()).ok()?.to_be_bytes());
    bytes.extend(i16::try_from(weight).ok()?.to_be_bytes());
    bytes.extend(sign.to_be_bytes());
    bytes.extend(scale.to_be_bytes());
    for digit in digits {
        bytes.extend(digit.to_be_bytes());
    }
    Some(bytes)
}
