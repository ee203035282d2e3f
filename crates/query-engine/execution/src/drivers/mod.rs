//! The database drivers we can connect with.

pub mod mysql;
pub mod postgres;

use futures::future::BoxFuture;
use query_engine_sql::sql::string::PlaceholderStyle;
use sql_run_configuration::DriverType;

use crate::connection::{ConnectTarget, Connection};
use crate::error::Error;

pub type OpenConnection = fn(ConnectTarget) -> BoxFuture<'static, Result<Box<dyn Connection>, Error>>;

/// Static facts about a driver and how to open a connection with it.
pub struct Driver {
    pub driver_type: DriverType,
    pub default_port: u16,
    pub url_scheme: &'static str,
    /// Other URL schemes naming the same driver.
    pub scheme_aliases: &'static [&'static str],
    pub placeholder_style: PlaceholderStyle,
    pub open: OpenConnection,
}

impl std::fmt::Debug for Driver {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("Driver")
            .field("driver_type", &self.driver_type)
            .field("default_port", &self.default_port)
            .field("url_scheme", &self.url_scheme)
            .finish_non_exhaustive()
    }
}

static MYSQL: Driver = Driver {
    driver_type: DriverType::Mysql,
    default_port: 3306,
    url_scheme: "mysql",
    scheme_aliases: &["mariadb"],
    placeholder_style: PlaceholderStyle::QuestionMark,
    open: mysql::open,
};

static POSTGRESQL: Driver = Driver {
    driver_type: DriverType::Postgresql,
    default_port: 5432,
    url_scheme: "postgresql",
    scheme_aliases: &["postgres"],
    placeholder_style: PlaceholderStyle::Numbered,
    open: postgres::open,
};

pub fn driver(driver_type: DriverType) -> &'static Driver {
    match driver_type {
        DriverType::Mysql => &MYSQL,
        DriverType::Postgresql => &POSTGRESQL,
    }
}

/// The driver registered for a URL scheme, case-insensitively.
pub fn driver_for_scheme(scheme: &str) -> Option<&'static Driver> {
    let scheme = scheme.to_ascii_lowercase();
    enum_iterator::all::<DriverType>().map(driver).find(|driver| {
        driver.url_scheme == scheme || driver.scheme_aliases.contains(&scheme.as_str())
    })
}
