//! MySQL (and MariaDB) connections.
//!
//! Bound values are written into the statement text as escaped literals and every
//! statement goes through the text protocol. Statements such as
//! `CREATE USER .. IDENTIFIED BY ?` cannot be prepared by the server.

use async_trait::async_trait;
use futures::future::BoxFuture;
use query_engine_sql::sql::string::{Param, PlaceholderStyle, SQL};
use sqlx::mysql::{MySqlConnectOptions, MySqlRow};
use sqlx::{Column, ConnectOptions, Connection as _, Executor, MySql, Row as _, TypeInfo, ValueRef};

use crate::connection::{ConnectTarget, Connection, Transaction};
use crate::error::Error;
use crate::results::{self, Row, StatementResult};

pub struct MySqlConnection {
    inner: sqlx::MySqlConnection,
}

pub fn open(target: ConnectTarget) -> BoxFuture<'static, Result<Box<dyn Connection>, Error>> {
    Box::pin(async move {
        let mut options = MySqlConnectOptions::from_url(&target.url)
            .map_err(Error::Connection)?
            .disable_statement_logging();
        if let Some(username) = &target.username {
            options = options.username(username);
        }
        if let Some(password) = &target.password {
            options = options.password(password);
        }
        let inner = options.connect().await.map_err(Error::Connection)?;
        Ok(Box::new(MySqlConnection { inner }) as Box<dyn Connection>)
    })
}

#[async_trait]
impl Connection for MySqlConnection {
    fn placeholder_style(&self) -> PlaceholderStyle {
        PlaceholderStyle::QuestionMark
    }

    async fn begin<'c>(&'c mut self) -> Result<Box<dyn Transaction + 'c>, Error> {
        let inner = self.inner.begin().await?;
        Ok(Box::new(MySqlTransaction { inner }))
    }

    async fn close(self: Box<Self>) -> Result<(), Error> {
        self.inner.close().await.map_err(Error::Connection)
    }
}

struct MySqlTransaction<'c> {
    inner: sqlx::Transaction<'c, MySql>,
}

#[async_trait]
impl<'c> Transaction for MySqlTransaction<'c> {
    async fn execute(&mut self, statement: &SQL) -> Result<StatementResult, Error> {
        let sql = statement.inline_params(write_literal);
        let connection = &mut *self.inner;
        let stream = connection.fetch_many(sql.as_str());
        results::drain(stream, sqlx::mysql::MySqlQueryResult::rows_affected, decode_row).await
    }

    async fn commit(self: Box<Self>) -> Result<(), Error> {
        Ok(self.inner.commit().await?)
    }

    async fn rollback(self: Box<Self>) -> Result<(), Error> {
        Ok(self.inner.rollback().await?)
    }
}

fn write_literal(param: &Param, sql: &mut String) {
    match param {
        Param::Text(text) => {
            sql.push('\'');
            for c in text.chars() {
                match c {
                    '\\' => sql.push_str("\\\\"),
                    '\'' => sql.push_str("\\'"),
                    '"' => sql.push_str("\\\""),
                    '\0' => sql.push_str("\\0"),
                    '\n' => sql.push_str("\\n"),
                    '\r' => sql.push_str("\\r"),
                    '\x1a' => sql.push_str("\\Z"),
                    c => sql.push(c),
                }
            }
            sql.push('\'');
        }
        Param::Boolean(b) => sql.push(if *b { '1' } else { '0' }),
        Param::Integer(i) => sql.push_str(&i.to_string()),
        Param::Decimal(decimal) => sql.push_str(decimal),
        Param::Null => sql.push_str("NULL"),
    }
}

fn decode_row(row: &MySqlRow) -> Result<Row, Error> {
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

fn decode_value(row: &MySqlRow, index: usize) -> Result<serde_json::Value, DecodeError> {
    if row.try_get_raw(index)?.is_null() {
        return Ok(serde_json::Value::Null);
    }
    let type_name = row.columns()[index].type_info().name();
    let value = match type_name {
        "BOOLEAN" => serde_json::Value::Bool(row.try_get(index)?),
        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" => {
            serde_json::Value::from(row.try_get_unchecked::<i64, _>(index)?)
        }
        "TINYINT UNSIGNED" | "SMALLINT UNSIGNED" | "MEDIUMINT UNSIGNED" | "INT UNSIGNED"
        | "BIGINT UNSIGNED" | "YEAR" => {
            serde_json::Value::from(row.try_get_unchecked::<u64, _>(index)?)
        }
        "FLOAT" => results::real_value(row.try_get(index)?),
        "DOUBLE" => results::float_value(row.try_get(index)?),
        "DECIMAL" => results::decimal_value(&row.try_get_unchecked::<String, _>(index)?),
        "DATETIME" => results::timestamp_value(&row.try_get(index)?),
        "TIMESTAMP" => results::timestamptz_value(&row.try_get(index)?),
        "DATE" => serde_json::Value::String(row.try_get::<chrono::NaiveDate, _>(index)?.to_string()),
        "TIME" => serde_json::Value::String(row.try_get::<chrono::NaiveTime, _>(index)?.to_string()),
        "JSON" => row.try_get(index)?,
        "CHAR" | "VARCHAR" | "TINYTEXT" | "TEXT" | "MEDIUMTEXT" | "LONGTEXT" | "ENUM" | "SET" => {
            serde_json::Value::String(row.try_get_unchecked(index)?)
        }
        // Anything else as the server's text for it, when that text is UTF-8.
        other => match row.try_get_unchecked::<String, _>(index) {
            Ok(text) => serde_json::Value::String(text),
            Err(_) => return Err(DecodeError::Unsupported(other.to_string())),
        },
    };
    Ok(value)
}
