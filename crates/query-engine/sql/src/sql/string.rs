//! Type definitions of a low-level SQL string representation.

use sql_run_configuration::ParameterValue;

/// SQL text with positional placeholders and the values bound to them, in binding
/// order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SQL {
    pub sql: String,
    pub params: Vec<Param>,
    /// Byte offsets of the question mark placeholders in `sql`, one per param.
    pub(crate) placeholders: Vec<usize>,
}

/// A value bound to a positional placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    Text(String),
    Boolean(bool),
    Integer(i64),
    /// A number that is not an `i64`, in plain decimal notation.
    Decimal(String),
    /// An untyped null; the database infers the type from the placeholder's context.
    Null,
}

/// How a driver spells positional placeholders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderStyle {
    /// `?`, bound in textual order.
    QuestionMark,
    /// `$1`, `$2`, ... referring to a bound value by position.
    Numbered,
}

impl SQL {
    pub fn new() -> SQL {
        SQL::default()
    }

    pub fn append_syntax(&mut self, sql: &str) {
        self.sql.push_str(sql);
    }

    /// Append a question mark placeholder, binding `param` to it.
    pub fn append_param(&mut self, param: Param) {
        self.placeholders.push(self.sql.len());
        self.sql.push('?');
        self.params.push(param);
    }

    /// Append a reference to an already bound value, `slot` counting from 1.
    pub fn append_slot(&mut self, slot: usize) {
        self.sql.push('$');
        self.sql.push_str(&slot.to_string());
    }

    pub fn has_params(&self) -> bool {
        !self.params.is_empty()
    }

    /// The text with each question mark placeholder replaced by its value, written
    /// by `literal`. Question marks that were part of the original text stay put.
    pub fn inline_params(&self, mut literal: impl FnMut(&Param, &mut String)) -> String {
        let mut sql = String::with_capacity(self.sql.len());
        let mut start = 0;
        for (offset, param) in self.placeholders.iter().zip(&self.params) {
            sql.push_str(&self.sql[start..*offset]);
            literal(param, &mut sql);
            start = offset + 1;
        }
        sql.push_str(&self.sql[start..]);
        sql
    }
}

impl From<&ParameterValue> for Param {
    fn from(value: &ParameterValue) -> Self {
        match value {
            ParameterValue::Null => Param::Null,
            ParameterValue::Boolean(b) => Param::Boolean(*b),
            ParameterValue::String(s) => Param::Text(s.clone()),
            ParameterValue::Number(n) => match n.as_i64() {
                Some(i) => Param::Integer(i),
                // u64 beyond i64 and fractional numbers.
                None => Param::Decimal(plain_decimal(&n.to_string())),
            },
        }
    }
}

/// Rewrite a number such as `1.5e-7` without its exponent.
fn plain_decimal(text: &str) -> String {
    let Some((mantissa, exponent)) = text.split_once(['e', 'E']) else {
        return text.to_string();
    };
    let Ok(exponent) = exponent.parse::<i64>() else {
        return text.to_string();
    };
    let (sign, mantissa) = match mantissa.strip_prefix('-') {
        Some(mantissa) => ("-", mantissa),
        None => ("", mantissa),
    };
    let (whole, fraction) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    let digits = format!("{whole}{fraction}");
    let point = i64::try_from(whole.len()).unwrap_or(i64::MAX).saturating_add(exponent);

    let (whole, fraction) = match usize::try_from(point) {
        Err(_) | Ok(0) => {
            let zeros = usize::try_from(point.unsigned_abs()).unwrap_or_default();
            ("0".to_string(), format!("{}{digits}", "0".repeat(zeros)))
        }
        Ok(point) if point >= digits.len() => (
            format!("{digits}{}", "0".repeat(point - digits.len())),
            String::new(),
        ),
        Ok(point) => (digits[..point].to_string(), digits[point..].to_string()),
    };
    let whole = match whole.trim_start_matches('0') {
        "" => "0",
        trimmed => trimmed,
    };
    let fraction = fraction.trim_end_matches('0');
    if fraction.is_empty() {
        format!("{sign}{whole}")
    } else {
        format!("{sign}{whole}.{fraction}")
    }
}
