use crate::opiterator::OpIterator;
use common::{QueryResult, QueryResultType, ShaleError, Tuple, QUERY_RESULT_TYPE};

/// Manages the execution of a query over a tree of OpIterators.
///
/// The executor opens the top operator and pulls tuples upward one at a
/// time; closing happens on every exit path of `execute`.
pub struct Executor {
    /// Executor state
    pub plan: Option<Box<dyn OpIterator>>,
}

impl Executor {
    /// Initializes an executor with no query configured.
    pub fn new() -> Self {
        Self { plan: None }
    }

    /// Set the operator tree to run.
    ///
    /// # Arguments
    ///
    /// * `opiterator` - Top operator of the physical plan.
    pub fn configure_query(&mut self, opiterator: Box<dyn OpIterator>) {
        self.plan = Some(opiterator);
    }

    fn plan_mut(&mut self) -> Result<&mut Box<dyn OpIterator>, ShaleError> {
        self.plan
            .as_mut()
            .ok_or_else(|| ShaleError::ExecutionError(String::from("no query configured")))
    }

    /// Opens the op plan iterator to begin execution.
    pub fn start(&mut self) -> Result<(), ShaleError> {
        debug!("executor starting query");
        self.plan_mut()?.open()
    }

    /// Returns the next tuple or None if there is no such tuple.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Result<Option<Tuple>, ShaleError> {
        self.plan_mut()?.next()
    }

    /// Closes the op iterator.
    pub fn close(&mut self) -> Result<(), ShaleError> {
        self.plan_mut()?.close()
    }

    /// Consumes the opiterator and stores the result in a QueryResult.
    pub fn execute(&mut self) -> Result<QueryResult, ShaleError> {
        let plan = self.plan_mut()?;
        let schema = plan.get_schema();

        match QUERY_RESULT_TYPE {
            QueryResultType::Width(header, default_width) => {
                let width = schema
                    .attributes()
                    .map(|a| a.name().len())
                    .max()
                    .unwrap_or(default_width)
                    + 2;
                let mut res = String::new();
                if header {
                    for attr in schema.attributes() {
                        let s = format!("{:width$}", attr.name(), width = width);
                        res.push_str(&s);
                    }
                    res.push('\n');
                }

                self.start()?;
                while let Some(t) = &self.next()? {
                    for f in t.field_vals() {
                        let s = format!("{:width$}", f.to_string(), width = width);
                        res.push_str(&s);
                    }
                    res.push('\n');
                }
                self.close()?;
                Ok(QueryResult::new(&res))
            }
            QueryResultType::Csv(header) => {
                let mut res = String::new();
                if header {
                    for attr in schema.attributes() {
                        let s = format!("{},", attr.name());
                        res.push_str(&s);
                    }
                    //remove the last ,
                    res.pop();
                    res.push('\n');
                }

                self.start()?;
                while let Some(t) = &self.next()? {
                    for f in t.field_vals() {
                        let s = format!("{},", f);
                        res.push_str(&s);
                    }
                    //remove the last ,
                    res.pop();
                    res.push('\n');
                }
                //remove the last \n
                res.pop();
                self.close()?;
                Ok(QueryResult::new(&res))
            }
        }
    }
}

impl Default for Executor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::opiterator::{Aggregate, TupleIterator};
    use common::testutil::*;
    use common::AggOp;

    fn scan() -> TupleIterator {
        let tuples = create_tuple_list(vec![vec![1, 2], vec![3, 4], vec![5, 6]]);
        TupleIterator::new(tuples, get_int_table_schema(2))
    }

    #[test]
    fn test_execute_csv() -> Result<(), ShaleError> {
        let mut executor = Executor::new();
        executor.configure_query(Box::new(scan()));
        let result = executor.execute()?;
        assert_eq!("1,2\n3,4\n5,6", result.result());
        Ok(())
    }

    #[test]
    fn test_execute_aggregate_plan() -> Result<(), ShaleError> {
        let mut executor = Executor::new();
        let agg = Aggregate::new(None, 0, AggOp::Sum, Box::new(scan()));
        executor.configure_query(Box::new(agg));
        let result = executor.execute()?;
        assert_eq!("9", result.result());
        Ok(())
    }

    #[test]
    fn test_no_query_configured() {
        let mut executor = Executor::new();
        assert!(matches!(
            executor.start(),
            Err(ShaleError::ExecutionError(_))
        ));
        assert!(matches!(
            executor.execute(),
            Err(ShaleError::ExecutionError(_))
        ));
    }

    #[test]
    fn test_manual_drive() -> Result<(), ShaleError> {
        let mut executor = Executor::new();
        executor.configure_query(Box::new(scan()));
        executor.start()?;
        let mut rows = 0;
        while executor.next()?.is_some() {
            rows += 1;
        }
        assert_eq!(3, rows);
        executor.close()
    }
}
