//! Sales and purchases, and the atomic operations that record them.

mod atomic;
mod core;

pub use atomic::{create_transaction_atomic, process_bulk_entries};
pub use core::{
    Amount, NewEntry, Transaction, TransactionId, TransactionKind, create_transaction_table,
    delete_transaction,
};
