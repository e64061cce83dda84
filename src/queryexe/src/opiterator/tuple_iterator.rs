use super::OpIterator;
use common::{ShaleError, TableSchema, Tuple};

/// Iterator over a materialized Vec of tuples.
///
/// Serves as the result iterator of the aggregation engine and as a tuple
/// source in tests.
pub struct TupleIterator {
    /// Tuples to iterate over.
    tuples: Vec<Tuple>,
    /// Schema of the output.
    schema: TableSchema,
    /// Current position in the iteration; None while closed.
    index: Option<usize>,
}

impl TupleIterator {
    /// Create a new tuple iterator over a set of results.
    ///
    /// # Arguments
    ///
    /// * `tuples` - Tuples to iterate over.
    /// * `schema` - Schema of the output results.
    pub fn new(tuples: Vec<Tuple>, schema: TableSchema) -> Self {
        Self {
            index: None,
            tuples,
            schema,
        }
    }
}

impl OpIterator for TupleIterator {
    /// Opens the iterator without returning a tuple.
    fn open(&mut self) -> Result<(), ShaleError> {
        self.index = Some(0);
        Ok(())
    }

    /// Retrieves the next tuple in the iterator.
    fn next(&mut self) -> Result<Option<Tuple>, ShaleError> {
        let i = match self.index {
            None => {
                return Err(ShaleError::IllegalState(String::from(
                    "operator has not been opened",
                )))
            }
            Some(i) => i,
        };
        let tuple = self.tuples.get(i);
        self.index = Some(i + 1);
        Ok(tuple.cloned())
    }

    /// Closes the tuple iterator.
    fn close(&mut self) -> Result<(), ShaleError> {
        if self.index.is_none() {
            return Err(ShaleError::IllegalState(String::from(
                "operator has not been opened",
            )));
        }
        self.index = None;
        Ok(())
    }

    /// Make iterator point to the first tuple again.
    fn rewind(&mut self) -> Result<(), ShaleError> {
        if self.index.is_none() {
            return Err(ShaleError::IllegalState(String::from(
                "operator has not been opened",
            )));
        }
        self.close()?;
        self.open()
    }

    /// Returns the schema of the tuples.
    fn get_schema(&self) -> &TableSchema {
        &self.schema
    }
}
