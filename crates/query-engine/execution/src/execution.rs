//! Run a batch of statements on one connection, inside one transaction.

use indexmap::IndexMap;
use query_engine_references::ReferenceResolver;
use query_engine_sql::sql;
use query_engine_sql::sql::string::PlaceholderStyle;
use sql_run_configuration::{ParameterValue, SqlStatement};
use tracing::{info_span, Instrument};

use crate::connection::{Connection, Transaction};
use crate::error::Error;
use crate::results::StatementResult;

/// Execute `statements` in order and commit, or roll everything back on the first
/// failure. Results are returned in statement order.
pub async fn run(
    connection: &mut dyn Connection,
    statements: &[&SqlStatement],
    resolver: &dyn ReferenceResolver,
) -> Result<Vec<StatementResult>, Error> {
    let style = connection.placeholder_style();
    let mut transaction = connection
        .begin()
        .instrument(info_span!("Begin transaction"))
        .await?;

    let outcome = run_statements(transaction.as_mut(), statements, style, resolver).await;
    match outcome {
        Ok(results) => {
            transaction
                .commit()
                .instrument(info_span!("Commit transaction"))
                .await?;
            Ok(results)
        }
        Err(err) => {
            if let Err(rollback_err) = transaction
                .rollback()
                .instrument(info_span!("Rollback transaction"))
                .await
            {
                tracing::warn!(error = %rollback_err, "Rollback failed");
            }
            Err(err)
        }
    }
}

async fn run_statements(
    transaction: &mut dyn Transaction,
    statements: &[&SqlStatement],
    style: PlaceholderStyle,
    resolver: &dyn ReferenceResolver,
) -> Result<Vec<StatementResult>, Error> {
    let mut results = Vec::with_capacity(statements.len());
    for (index, statement) in statements.iter().enumerate() {
        let result = run_statement(transaction, statement, style, resolver)
            .instrument(info_span!("Run statement", index))
            .await
            .map_err(|source| Error::Statement {
                index,
                source: Box::new(source),
            })?;
        results.push(result);
    }
    Ok(results)
}

async fn run_statement(
    transaction: &mut dyn Transaction,
    statement: &SqlStatement,
    style: PlaceholderStyle,
    resolver: &dyn ReferenceResolver,
) -> Result<StatementResult, Error> {
    // Only the text as written is logged; resolved text may contain secrets.
    tracing::info!(sql = %statement.sql, "Executing statement");

    let text = resolver.resolve(&statement.sql).await?;
    let parameters = resolve_parameters(statement.parameters.as_ref(), resolver).await?;
    let positional = sql::format::format(&text, parameters.as_ref(), style);
    tracing::debug!(bound = positional.params.len(), "Formatted statement");

    let result = transaction.execute(&positional).await?;
    tracing::debug!(rows = result.len(), "Statement done");
    Ok(result)
}

/// Resolve references inside string parameters. Other literals are bound as given.
async fn resolve_parameters(
    parameters: Option<&IndexMap<String, ParameterValue>>,
    resolver: &dyn ReferenceResolver,
) -> Result<Option<IndexMap<String, ParameterValue>>, Error> {
    let Some(parameters) = parameters else {
        return Ok(None);
    };
    let mut resolved = IndexMap::with_capacity(parameters.len());
    for (name, value) in parameters {
        let value = match value {
            ParameterValue::String(text) => ParameterValue::String(resolver.resolve(text).await?),
            other => other.clone(),
        };
        resolved.insert(name.clone(), value);
    }
    Ok(Some(resolved))
}
