//! Opening database connections from connection descriptors.

use async_trait::async_trait;
use query_engine_references::ReferenceResolver;
use query_engine_sql::sql::string::{PlaceholderStyle, SQL};
use sql_run_configuration::{ConnectionDescriptor, DriverTypeHostPort};
use tracing::{info_span, Instrument};
use url::Url;

use crate::drivers::{self, Driver};
use crate::error::Error;
use crate::results::StatementResult;

/// A live database connection, owned by a single invocation.
///
/// Dropping a connection releases it; `close` shuts it down gracefully.
#[async_trait]
pub trait Connection: Send {
    fn placeholder_style(&self) -> PlaceholderStyle;

    async fn begin<'c>(&'c mut self) -> Result<Box<dyn Transaction + 'c>, Error>;

    async fn close(self: Box<Self>) -> Result<(), Error>;
}

/// An open transaction. Dropping it without committing rolls it back.
#[async_trait]
pub trait Transaction: Send {
    async fn execute(&mut self, statement: &SQL) -> Result<StatementResult, Error>;

    async fn commit(self: Box<Self>) -> Result<(), Error>;

    async fn rollback(self: Box<Self>) -> Result<(), Error>;
}

/// Opens connections. Credentials are resolved through `resolver` just before
/// connecting.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn open(
        &self,
        descriptor: &ConnectionDescriptor,
        resolver: &dyn ReferenceResolver,
    ) -> Result<Box<dyn Connection>, Error>;
}

/// Connects to real databases through the driver registry.
#[derive(Debug, Clone, Copy, Default)]
pub struct DatabaseConnector;

#[async_trait]
impl Connector for DatabaseConnector {
    async fn open(
        &self,
        descriptor: &ConnectionDescriptor,
        resolver: &dyn ReferenceResolver,
    ) -> Result<Box<dyn Connection>, Error> {
        let (driver, target) = connect_target(descriptor, resolver).await?;
        (driver.open)(target)
            .instrument(info_span!("Connect", driver = %driver.driver_type))
            .await
    }
}

/// Where and as whom to connect.
#[derive(Clone)]
pub struct ConnectTarget {
    pub url: Url,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl std::fmt::Debug for ConnectTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("ConnectTarget")
            .field("url", &self.url.as_str())
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Pick the driver for `descriptor` and resolve everything needed to connect with it.
pub async fn connect_target(
    descriptor: &ConnectionDescriptor,
    resolver: &dyn ReferenceResolver,
) -> Result<(&'static Driver, ConnectTarget), Error> {
    match descriptor {
        ConnectionDescriptor::DriverTypeHostPort(host_port) => {
            let driver = drivers::driver(host_port.driver_type);
            let url = compose_url(driver, host_port)?;
            tracing::info!(
                driver = %driver.driver_type,
                host = %host_port.host,
                port = url.port(),
                database = %host_port.database,
                "Connecting"
            );
            let target = ConnectTarget {
                url,
                username: Some(resolver.resolve(&host_port.username).await?),
                password: Some(resolver.resolve(&host_port.password).await?),
            };
            Ok((driver, target))
        }
        ConnectionDescriptor::JdbcUrl(jdbc) => {
            let resolved = resolver.resolve(&jdbc.jdbc_url).await?;
            let (driver, url) = parse_jdbc_url(&resolved)?;
            tracing::info!(driver = %driver.driver_type, "Connecting through a JDBC URL");
            let target = ConnectTarget {
                url,
                username: resolve_optional(resolver, jdbc.username.as_deref()).await?,
                password: resolve_optional(resolver, jdbc.password.as_deref()).await?,
            };
            Ok((driver, target))
        }
    }
}

async fn resolve_optional(
    resolver: &dyn ReferenceResolver,
    value: Option<&str>,
) -> Result<Option<String>, Error> {
    match value {
        None => Ok(None),
        Some(value) => Ok(Some(resolver.resolve(value).await?)),
    }
}

/// `scheme://host:port/database?option=value&...`, without credentials.
pub fn compose_url(driver: &Driver, host_port: &DriverTypeHostPort) -> Result<Url, Error> {
    let port = host_port.port.map_or(driver.default_port, u16::from);
    let mut url = Url::parse(&format!(
        "{}://{}:{port}",
        driver.url_scheme, host_port.host
    ))
    .map_err(|err| Error::InvalidConnection(format!("host '{}': {err}", host_port.host)))?;
    url.set_path(&format!("/{}", host_port.database));
    if !host_port.options.is_empty() {
        url.query_pairs_mut().extend_pairs(&host_port.options);
    }
    Ok(url)
}

/// Split a `jdbc:<scheme>://...` URL into its driver and a URL the driver accepts.
pub fn parse_jdbc_url(jdbc_url: &str) -> Result<(&'static Driver, Url), Error> {
    let raw = jdbc_url.strip_prefix("jdbc:").unwrap_or(jdbc_url);
    let mut url = Url::parse(raw)
        .map_err(|err| Error::InvalidConnection(format!("malformed JDBC URL: {err}")))?;
    let driver = drivers::driver_for_scheme(url.scheme()).ok_or_else(|| {
        Error::InvalidConnection(format!("unsupported JDBC URL scheme '{}'", url.scheme()))
    })?;
    if url.scheme() != driver.url_scheme {
        url.set_scheme(driver.url_scheme).map_err(|()| {
            Error::InvalidConnection(format!("unsupported JDBC URL scheme '{}'", url.scheme()))
        })?;
    }
    if url.port().is_none() {
        url.set_port(Some(driver.default_port))
            .map_err(|()| Error::InvalidConnection("JDBC URL has no host".to_string()))?;
    }
    Ok((driver, url))
}
