use std::sync::atomic::{AtomicU64, Ordering};
use crate::core::error::{Error, ErrorKind, Result};
use crate::index::document::Document;

/// Transaction ID generator
static TRANSACTION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Transaction state
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransactionState {
    Active,
    Committed,
    Aborted,
}

/// Transaction operation log
#[derive(Debug, Clone)]
pub enum TransactionOp {
    Replace { id_term: String, document: Document },
    SetMetadata { key: String, value: String },
}

/// Buffered writes against one index. Nothing reaches the index until
/// `commit`; `rollback` drops the whole batch.
pub struct Transaction {
    pub id: u64,
    pub state: TransactionState,
    pub operations: Vec<TransactionOp>,
}

impl Transaction {
    pub fn begin() -> Self {
        Transaction {
            id: TRANSACTION_ID_COUNTER.fetch_add(1, Ordering::SeqCst),
            state: TransactionState::Active,
            operations: Vec::new(),
        }
    }

    pub fn push(&mut self, op: TransactionOp) -> Result<()> {
        self.check_active()?;
        self.operations.push(op);
        Ok(())
    }

    /// Close the transaction and hand back its operations in order.
    pub fn commit(&mut self) -> Result<Vec<TransactionOp>> {
        self.check_active()?;
        self.state = TransactionState::Committed;
        Ok(std::mem::take(&mut self.operations))
    }

    pub fn rollback(&mut self) {
        self.state = TransactionState::Aborted;
        self.operations.clear();
    }

    fn check_active(&self) -> Result<()> {
        if self.state != TransactionState::Active {
            return Err(Error::new(
                ErrorKind::InvalidState,
                format!("transaction {} is {:?}", self.id, self.state),
            ));
        }
        Ok(())
    }
}
