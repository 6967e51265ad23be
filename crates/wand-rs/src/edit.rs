//! Command-line edit operations applied to an [`Editor`].

use log::debug;
use std::num::ParseIntError;
use thiserror::Error;
use wand_rs_core::{Editor, EditorError};
use wand_rs_protocol::{Record, Role, UnknownRole};

/// One structural or field edit, addressed by the index at the time it runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOp {
    SetRole { index: usize, role: Role },
    SetContent { index: usize, content: String },
    /// Insert an empty assistant row before `index`.
    Insert { index: usize },
    Delete { index: usize },
    Move { from: usize, to: usize },
}

#[derive(Debug, Error)]
pub enum EditArgError {
    #[error("expected `{expected}`, got `{input}`")]
    Shape {
        expected: &'static str,
        input: String,
    },
    #[error("invalid index `{input}`: {source}")]
    Index {
        input: String,
        #[source]
        source: ParseIntError,
    },
    #[error(transparent)]
    Role(#[from] UnknownRole),
}

/// Parse `I=ROLE`.
pub fn parse_set_role(input: &str) -> Result<EditOp, EditArgError> {
    let (index, role) = split_pair(input, '=', "INDEX=ROLE")?;
    Ok(EditOp::SetRole {
        index: parse_index(index)?,
        role: role.parse()?,
    })
}

/// Parse `I=TEXT`; everything after the first `=` is the content.
pub fn parse_set_content(input: &str) -> Result<EditOp, EditArgError> {
    let (index, content) = split_pair(input, '=', "INDEX=TEXT")?;
    Ok(EditOp::SetContent {
        index: parse_index(index)?,
        content: content.to_string(),
    })
}

pub fn parse_insert(input: &str) -> Result<EditOp, EditArgError> {
    Ok(EditOp::Insert {
        index: parse_index(input)?,
    })
}

pub fn parse_delete(input: &str) -> Result<EditOp, EditArgError> {
    Ok(EditOp::Delete {
        index: parse_index(input)?,
    })
}

/// Parse `FROM:TO`.
pub fn parse_move(input: &str) -> Result<EditOp, EditArgError> {
    let (from, to) = split_pair(input, ':', "FROM:TO")?;
    Ok(EditOp::Move {
        from: parse_index(from)?,
        to: parse_index(to)?,
    })
}

/// Apply `ops` in order, stopping at the first failure.
///
/// Returns how many operations were applied.
pub fn apply_all(editor: &mut Editor, ops: &[EditOp]) -> Result<usize, EditorError> {
    for op in ops {
        debug!("applying edit (op={:?})", op);
        match op {
            EditOp::SetRole { index, role } => {
                editor.set_role(*index, *role)?;
            }
            EditOp::SetContent { index, content } => {
                editor.set_content(*index, content.clone())?;
            }
            EditOp::Insert { index } => {
                editor.insert_at(*index, Record::blank())?;
            }
            EditOp::Delete { index } => {
                editor.remove_at(*index)?;
            }
            EditOp::Move { from, to } => {
                editor.move_to(*from, *to)?;
            }
        }
    }
    Ok(ops.len())
}

fn split_pair<'a>(
    input: &'a str,
    separator: char,
    expected: &'static str,
) -> Result<(&'a str, &'a str), EditArgError> {
    input
        .split_once(separator)
        .ok_or_else(|| EditArgError::Shape {
            expected,
            input: input.to_string(),
        })
}

fn parse_index(input: &str) -> Result<usize, EditArgError> {
    input
        .trim()
        .parse()
        .map_err(|source| EditArgError::Index {
            input: input.to_string(),
            source,
        })
}
