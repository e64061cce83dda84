use super::OpIterator;
use common::ids::TransactionId;
use common::storage_trait::StorageTrait;
use common::{Attribute, DataType, Field, ShaleError, TableSchema, Tuple};

/// Delete operator: reads tuples from its child and removes them from
/// storage under the operator's transaction.
///
/// Fires exactly once per open/rewind cycle, emitting a single tuple with
/// the number of deleted records.
pub struct Delete {
    /// Storage layer the deletions are issued against.
    storage: &'static dyn StorageTrait,
    /// Transaction the deletions run in.
    tid: TransactionId,
    /// Child operator to read tuples for deletion from.
    child: Box<dyn OpIterator>,
    /// Output schema, a single integer count.
    schema: TableSchema,
    /// Whether the deletion pass has already run and reported.
    deleted: bool,
    /// Boolean if the iterator is open.
    open: bool,
}

impl Delete {
    /// Delete constructor.
    ///
    /// # Arguments
    ///
    /// * `storage` - Storage layer to delete tuples from.
    /// * `tid` - Transaction the deletions run in.
    /// * `child` - Child operator to read tuples for deletion from.
    pub fn new(
        storage: &'static dyn StorageTrait,
        tid: TransactionId,
        child: Box<dyn OpIterator>,
    ) -> Self {
        Self {
            storage,
            tid,
            child,
            schema: TableSchema::new(vec![Attribute::new("count".to_string(), DataType::Int)]),
            deleted: false,
            open: false,
        }
    }
}

impl OpIterator for Delete {
    fn open(&mut self) -> Result<(), ShaleError> {
        self.child.open()?;
        self.deleted = false;
        self.open = true;
        Ok(())
    }

    /// Drains the child on the first call, issuing one delete per tuple, and
    /// returns a 1-field tuple with the number of deleted records (zero
    /// included). Every later call returns None without touching the child
    /// or the storage layer.
    fn next(&mut self) -> Result<Option<Tuple>, ShaleError> {
        if !self.open {
            return Err(ShaleError::IllegalState(String::from(
                "operator has not been opened",
            )));
        }
        if self.deleted {
            return Ok(None);
        }
        let mut count = 0;
        while let Some(tuple) = self.child.next()? {
            self.storage.delete_tuple(self.tid, &tuple)?;
            count += 1;
        }
        debug!("delete removed {} tuples", count);
        self.deleted = true;
        Ok(Some(Tuple::new(vec![Field::IntField(count)])))
    }

    fn close(&mut self) -> Result<(), ShaleError> {
        if !self.open {
            return Err(ShaleError::IllegalState(String::from(
                "operator has not been opened",
            )));
        }
        self.child.close()?;
        self.open = false;
        Ok(())
    }

    /// Rewinds the child and re-arms the single-shot deletion pass.
    fn rewind(&mut self) -> Result<(), ShaleError> {
        if !self.open {
            return Err(ShaleError::IllegalState(String::from(
                "operator has not been opened",
            )));
        }
        self.child.rewind()?;
        self.deleted = false;
        Ok(())
    }

    fn get_schema(&self) -> &TableSchema {
        &self.schema
    }
}
