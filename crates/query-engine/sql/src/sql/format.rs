//! Rewrite `:name` placeholders into the positional form a driver understands.
//!
//! An occurrence is a colon followed by a complete identifier
//! (`[A-Za-z_][A-Za-z0-9_]*`) naming a parameter of the statement. `::type` casts and
//! names without a parameter are left as they are.

use indexmap::IndexMap;
use sql_run_configuration::ParameterValue;

use super::string::{Param, PlaceholderStyle, SQL};

enum Piece<'a> {
    Text(&'a str),
    /// Index of the parameter in the parameter map.
    Placeholder(usize),
}

/// Format `sql` for a driver using `style` placeholders.
///
/// With `QuestionMark`, every occurrence binds its value, in textual order. With
/// `Numbered`, every parameter that occurs is bound once, in parameter-map order, and
/// all of its occurrences refer to that slot. Parameters that never occur are not
/// bound.
pub fn format(
    sql: &str,
    parameters: Option<&IndexMap<String, ParameterValue>>,
    style: PlaceholderStyle,
) -> SQL {
    let Some(parameters) = parameters.filter(|parameters| !parameters.is_empty()) else {
        return SQL {
            sql: sql.to_string(),
            ..SQL::default()
        };
    };

    let pieces = split(sql, parameters);
    let mut statement = SQL::new();
    match style {
        PlaceholderStyle::QuestionMark => {
            for piece in pieces {
                match piece {
                    Piece::Text(text) => statement.append_syntax(text),
                    Piece::Placeholder(index) => {
                        statement.append_param(Param::from(&parameters[index]));
                    }
                }
            }
        }
        PlaceholderStyle::Numbered => {
            let mut slots = vec![None; parameters.len()];
            for piece in &pieces {
                if let Piece::Placeholder(index) = piece {
                    slots[*index] = Some(0);
                }
            }
            for (index, slot) in slots.iter_mut().enumerate() {
                if slot.is_some() {
                    statement.params.push(Param::from(&parameters[index]));
                    *slot = Some(statement.params.len());
                }
            }
            for piece in pieces {
                match piece {
                    Piece::Text(text) => statement.append_syntax(text),
                    Piece::Placeholder(index) => {
                        statement.append_slot(slots[index].unwrap_or_default());
                    }
                }
            }
        }
    }
    statement
}

fn split<'a>(sql: &'a str, parameters: &IndexMap<String, ParameterValue>) -> Vec<Piece<'a>> {
    let bytes = sql.as_bytes();
    let mut pieces = vec![];
    let mut text_start = 0;
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] != b':' {
            i += 1;
            continue;
        }
        // `::` is a cast.
        if bytes.get(i + 1) == Some(&b':') {
            i += 2;
            continue;
        }
        let name_end = identifier_end(bytes, i + 1);
        if name_end == i + 1 {
            i += 1;
            continue;
        }
        if let Some(index) = parameters.get_index_of(&sql[i + 1..name_end]) {
            pieces.push(Piece::Text(&sql[text_start..i]));
            pieces.push(Piece::Placeholder(index));
            text_start = name_end;
        }
        i = name_end;
    }
    pieces.push(Piece::Text(&sql[text_start..]));
    pieces
}

/// The end of the identifier starting at `start`, or `start` if there is none.
fn identifier_end(bytes: &[u8], start: usize) -> usize {
    match bytes.get(start) {
        Some(b) if b.is_ascii_alphabetic() || *b == b'_' => {}
        _ => return start,
    }
    let mut end = start + 1;
    while matches!(bytes.get(end), Some(b) if b.is_ascii_alphanumeric() || *b == b'_') {
        end += 1;
    }
    end
}
