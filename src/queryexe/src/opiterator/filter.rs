use super::OpIterator;
use common::{Field, PredicateOp, ShaleError, TableSchema, Tuple};

/// Compares one field of a tuple against a fixed operand.
pub struct FilterPredicate {
    /// Operation used to compare.
    op: PredicateOp,
    /// Index of the field to filter.
    field_ind: usize,
    /// Operand to compare against.
    operand: Field,
}

impl FilterPredicate {
    /// Constructor - Creates a new predicate over one field of a tuple.
    ///
    /// # Arguments
    ///
    /// * `op` - The operation to apply.
    /// * `field_ind` - Field index to compare against.
    /// * `operand` - Field value to compare passed in tuples to.
    fn new(op: PredicateOp, field_ind: usize, operand: Field) -> Self {
        Self {
            op,
            field_ind,
            operand,
        }
    }

    /// Apply the predicate to the specified tuple.
    ///
    /// # Arguments
    ///
    /// * `tuple` - Tuple to apply the filter to.
    fn filter(&self, tuple: &Tuple) -> Result<bool, ShaleError> {
        let field = tuple.get_field(self.field_ind).ok_or_else(|| {
            ShaleError::SchemaMismatch(format!("tuple has no field at index {}", self.field_ind))
        })?;
        Ok(self.op.compare(field, &self.operand))
    }
}

/// Filter operator.
pub struct Filter {
    /// Predicate to filter by.
    predicate: FilterPredicate,
    /// Schema of the child.
    schema: TableSchema,
    /// Boolean if the iterator is open.
    open: bool,
    /// Child operator passing data into operator.
    child: Box<dyn OpIterator>,
}

impl Filter {
    /// Filter constructor.
    ///
    /// # Arguments
    ///
    /// * `op` - Operation to compare with.
    /// * `field_ind` - Field index to compare against.
    /// * `operand` - Field value to compare passed in tuples to.
    /// * `child` - Child OpIterator passing data into the operator.
    pub fn new(
        op: PredicateOp,
        field_ind: usize,
        operand: Field,
        child: Box<dyn OpIterator>,
    ) -> Self {
        Self {
            predicate: FilterPredicate::new(op, field_ind, operand),
            schema: child.get_schema().clone(),
            open: false,
            child,
        }
    }
}

impl OpIterator for Filter {
    fn open(&mut self) -> Result<(), ShaleError> {
        self.child.open()?;
        self.open = true;
        Ok(())
    }

    fn next(&mut self) -> Result<Option<Tuple>, ShaleError> {
        if !self.open {
            return Err(ShaleError::IllegalState(String::from(
                "operator has not been opened",
            )));
        }
        let mut res = None;
        while let Some(t) = self.child.next()? {
            if self.predicate.filter(&t)? {
                res = Some(t);
                break;
            }
        }
        Ok(res)
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

    fn rewind(&mut self) -> Result<(), ShaleError> {
        if !self.open {
            return Err(ShaleError::IllegalState(String::from(
                "operator has not been opened",
            )));
        }
        self.child.rewind()
    }

    fn get_schema(&self) -> &TableSchema {
        &self.schema
    }
}
