//! Runs SQL statements against a MySQL or PostgreSQL database on behalf of a
//! `Custom::SqlRun` resource, driven by the resource's lifecycle events.

pub mod connector;
pub mod error;
pub mod event;
pub mod invoke;
pub mod logging;
pub mod response;
pub mod schema;
pub mod state;

pub use connector::Handler;
pub use error::{Error, ErrorKind};
pub use event::{LifecycleEvent, RequestType};
pub use response::ResponseEnvelope;
