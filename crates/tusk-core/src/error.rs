use thiserror::Error;

use crate::task::Status;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("illegal transition: {from} -> {to}")]
    IllegalTransition { from: Status, to: Status },

    #[error("invalid input: {0}")]
    InvalidInput(String),
}
