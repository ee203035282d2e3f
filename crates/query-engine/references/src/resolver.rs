//! The resolver capability and its composition.

use std::ops::Range;

use async_trait::async_trait;
use regex::{Captures, Regex};

use crate::error::Error;

/// Rewrites the placeholders of one (or several) grammars found in a string. Text
/// that is not a placeholder of the resolver's own grammar is left untouched.
#[async_trait]
pub trait ReferenceResolver: Send + Sync {
    async fn resolve(&self, value: &str) -> Result<String, Error>;
}

/// Threads a string through every resolver once, in registration order. The output
/// of one resolver is the input of the next.
#[derive(Default)]
pub struct CompositeResolver {
    resolvers: Vec<Box<dyn ReferenceResolver>>,
}

impl CompositeResolver {
    pub fn new(resolvers: Vec<Box<dyn ReferenceResolver>>) -> Self {
        CompositeResolver { resolvers }
    }

    /// Register one more grammar, applied after the existing ones.
    pub fn push(&mut self, resolver: Box<dyn ReferenceResolver>) {
        self.resolvers.push(resolver);
    }
}

#[async_trait]
impl ReferenceResolver for CompositeResolver {
    async fn resolve(&self, value: &str) -> Result<String, Error> {
        let mut resolved = value.to_string();
        for resolver in &self.resolvers {
            resolved = resolver.resolve(&resolved).await?;
        }
        Ok(resolved)
    }
}

/// A placeholder found in a string.
pub(crate) struct Occurrence<R> {
    pub range: Range<usize>,
    /// The placeholder text, as written.
    pub raw: String,
    pub reference: R,
}

/// Every non-overlapping match of `pattern`, left to right.
pub(crate) fn occurrences<R>(
    pattern: &Regex,
    value: &str,
    parse: impl Fn(&Captures) -> R,
) -> Vec<Occurrence<R>> {
    pattern
        .captures_iter(value)
        .filter_map(|captures| {
            let whole = captures.get(0)?;
            Some(Occurrence {
                range: whole.range(),
                raw: whole.as_str().to_string(),
                reference: parse(&captures),
            })
        })
        .collect()
}

/// Replace the given, ordered and non-overlapping, ranges of `value`.
pub(crate) fn splice(value: &str, replacements: Vec<(Range<usize>, String)>) -> String {
    let mut spliced = String::with_capacity(value.len());
    let mut last = 0;
    for (range, replacement) in replacements {
        spliced.push_str(&value[last..range.start]);
        spliced.push_str(&replacement);
        last = range.end;
    }
    spliced.push_str(&value[last..]);
    spliced
}

/// Fail when text outside of the recognised placeholders still opens a placeholder of
/// the same grammar.
pub(crate) fn reject_leftovers<R>(
    opening: &Regex,
    value: &str,
    found: &[Occurrence<R>],
) -> Result<(), Error> {
    let unmatched = splice(
        value,
        found
            .iter()
            .map(|occurrence| (occurrence.range.clone(), String::new()))
            .collect(),
    );
    match opening.find(&unmatched) {
        None => Ok(()),
        Some(start) => {
            let near: String = unmatched[start.start()..].chars().take(64).collect();
            Err(Error::Malformed(near))
        }
    }
}
