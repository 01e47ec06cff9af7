//! Entry point for front ends
//!
//! `dispatch` turns a [`LedgerRequest`] into an [`Outcome`]: it checks that the
//! requester owns the source account, runs the operation, and folds any error
//! into a status plus message. It never panics on bad input.

use super::engine::LedgerEngine;
use super::validation::validate_ownership;
use crate::types::{LedgerError, LedgerRequest, Outcome, Receipt};

/// Authorize and execute one request
///
/// Uses the engine's configured lock timeout as the deadline.
pub fn dispatch(engine: &LedgerEngine, request: &LedgerRequest) -> Outcome {
    Outcome::from(authorize_and_execute(engine, request))
}

fn authorize_and_execute(
    engine: &LedgerEngine,
    request: &LedgerRequest,
) -> Result<Receipt, LedgerError> {
    if let Some(requester) = request.requester {
        let account = engine.account(request.operation.source_account())?;
        validate_ownership(&account, requester)?;
    }
    engine.execute(&request.operation, engine.default_deadline())
}
