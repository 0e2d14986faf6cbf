//! Operator trait and lifecycle types
//!
//! Operators produce solution rows through the `open/next/close`
//! lifecycle.

use async_trait::async_trait;

use crate::binding::BindingRow;
use crate::context::ExecutionContext;
use crate::error::{FtsError, Result};
use crate::var_registry::VarId;

/// Query execution operator
///
/// Operators follow a lifecycle pattern:
/// 1. `open()` - validate and dispatch
/// 2. `next()` - pull rows until exhausted (returns None)
/// 3. `close()` - release resources
///
/// # Schema Contract
///
/// - `schema()` returns the output variables, fixed at construction
/// - Every row from `next()` has exactly these variables, in this order
#[async_trait]
pub trait Operator: Send {
    /// Output schema - which variables this operator binds
    fn schema(&self) -> &[VarId];

    /// Initialize operator state. Called once before `next()`.
    async fn open(&mut self, ctx: &ExecutionContext) -> Result<()>;

    /// Pull the next row, or `None` when exhausted
    async fn next(&mut self, ctx: &ExecutionContext) -> Result<Option<BindingRow>>;

    /// Release resources. Idempotent, legal in any state.
    fn close(&mut self);

    /// Estimated cardinality, if known
    fn estimated_rows(&self) -> Option<usize> {
        None
    }
}

/// Boxed operator for dynamic dispatch
pub type BoxedOperator = Box<dyn Operator>;

/// Operator state for lifecycle tracking
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorState {
    /// Not yet opened
    Created,
    /// Dispatched; no row pulled yet
    Open,
    /// At least one `next()` call made
    Streaming,
    /// Exhausted, truncated, or closed by the caller
    Closed,
    /// Ended by an error
    Failed,
}

impl OperatorState {
    pub fn can_open(&self) -> bool {
        matches!(self, OperatorState::Created)
    }

    pub fn can_next(&self) -> bool {
        matches!(self, OperatorState::Open | OperatorState::Streaming)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OperatorState::Closed | OperatorState::Failed)
    }
}

/// Open an operator, drain it, and close it.
///
/// The operator is closed on every path.
pub async fn collect_rows(
    op: &mut dyn Operator,
    ctx: &ExecutionContext,
) -> Result<Vec<BindingRow>> {
    let result = async {
        op.open(ctx).await?;
        let mut rows = Vec::new();
        while let Some(row) = op.next(ctx).await? {
            rows.push(row);
        }
        Ok::<_, FtsError>(rows)
    }
    .await;
    op.close();
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_predicates() {
        assert!(OperatorState::Created.can_open());
        assert!(!OperatorState::Open.can_open());
        assert!(OperatorState::Open.can_next());
        assert!(OperatorState::Streaming.can_next());
        assert!(!OperatorState::Created.can_next());
        assert!(OperatorState::Failed.is_terminal());
        assert!(OperatorState::Closed.is_terminal());
        assert!(!OperatorState::Streaming.is_terminal());
    }
}
