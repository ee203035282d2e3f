//! Positional SQL strings and the formatter producing them from named-placeholder
//! templates.

pub mod sql;
