use super::{OpIterator, TupleIterator};
use common::{AggOp, Attribute, DataType, Field, ShaleError, TableSchema, Tuple};
use std::collections::hash_map::Entry;
use std::collections::HashMap;

/// Running state for one group under one aggregate operation.
///
/// A function is created when its group sees its first value and is seeded
/// from that value, so MIN and MAX never need a sentinel initial value and
/// AVG never divides by zero.
enum AggregateFunction {
    Count(i32),
    Sum(i32),
    Avg { sum: i32, count: i32 },
    Min(Field),
    Max(Field),
}

impl AggregateFunction {
    /// Creates the running state for `op`, seeded with the first merged value.
    ///
    /// SUM and AVG are only defined over integer values; seeding them with a
    /// string fails before any state exists for the group.
    fn create(op: AggOp, first: &Field) -> Result<Self, ShaleError> {
        let func = match op {
            AggOp::Count => AggregateFunction::Count(1),
            AggOp::Sum => AggregateFunction::Sum(int_value(op, first)?),
            AggOp::Avg => AggregateFunction::Avg {
                sum: int_value(op, first)?,
                count: 1,
            },
            AggOp::Min => AggregateFunction::Min(first.clone()),
            AggOp::Max => AggregateFunction::Max(first.clone()),
        };
        Ok(func)
    }

    /// Folds one more value into the running state.
    fn merge(&mut self, value: &Field) -> Result<(), ShaleError> {
        match self {
            AggregateFunction::Count(count) => *count += 1,
            AggregateFunction::Sum(sum) => *sum += int_value(AggOp::Sum, value)?,
            AggregateFunction::Avg { sum, count } => {
                *sum += int_value(AggOp::Avg, value)?;
                *count += 1;
            }
            AggregateFunction::Min(min) => {
                if *value < *min {
                    *min = value.clone();
                }
            }
            AggregateFunction::Max(max) => {
                if *value > *max {
                    *max = value.clone();
                }
            }
        }
        Ok(())
    }

    /// The aggregate value accumulated so far. AVG divides with integer
    /// truncation.
    fn result(&self) -> Field {
        match self {
            AggregateFunction::Count(count) => Field::IntField(*count),
            AggregateFunction::Sum(sum) => Field::IntField(*sum),
            AggregateFunction::Avg { sum, count } => Field::IntField(sum / count),
            AggregateFunction::Min(min) => min.clone(),
            AggregateFunction::Max(max) => max.clone(),
        }
    }
}

fn int_value(op: AggOp, field: &Field) -> Result<i32, ShaleError> {
    match field {
        Field::IntField(i) => Ok(*i),
        Field::StringField(_) => Err(ShaleError::UnsupportedOperation(format!(
            "{} is not defined over string fields",
            op
        ))),
    }
}

/// The aggregation engine: a grouping map plus per-group running state for a
/// single aggregate operation over a single column.
///
/// The map is owned exclusively by one engine instance; `clear` is the only
/// reset path. A group exists only once at least one tuple has been merged
/// for its key.
struct Aggregator {
    /// Index of the field being aggregated.
    agg_field: usize,
    /// Type of the field being aggregated.
    agg_dtype: DataType,
    /// Index and type of the grouping field; None for a single implicit group.
    group_by: Option<(usize, DataType)>,
    /// Aggregate operation folded into each group.
    op: AggOp,
    /// Schema of the result tuples.
    schema: TableSchema,
    /// Running state per grouping key; the None key is the ungrouped sentinel.
    groups: HashMap<Option<Field>, AggregateFunction>,
}

impl Aggregator {
    /// Aggregator constructor.
    ///
    /// # Arguments
    ///
    /// * `agg_field` - Index of the field to aggregate over.
    /// * `agg_dtype` - Type of the field to aggregate over.
    /// * `group_by` - Index and type of the field to group by, if any.
    /// * `op` - Aggregate operation to apply.
    /// * `schema` - Schema of the result tuples, (grouping field, aggregate field).
    fn new(
        agg_field: usize,
        agg_dtype: DataType,
        group_by: Option<(usize, DataType)>,
        op: AggOp,
        schema: TableSchema,
    ) -> Self {
        Self {
            agg_field,
            agg_dtype,
            group_by,
            op,
            schema,
            groups: HashMap::new(),
        }
    }

    /// Pulls the field at `i` out of the tuple, checking it against the type
    /// fixed at construction.
    fn field_at<'a>(
        &self,
        tuple: &'a Tuple,
        i: usize,
        expected: &DataType,
    ) -> Result<&'a Field, ShaleError> {
        let field = tuple
            .get_field(i)
            .ok_or_else(|| ShaleError::SchemaMismatch(format!("tuple has no field at index {}", i)))?;
        if field.dtype() != *expected {
            return Err(ShaleError::SchemaMismatch(format!(
                "field {} is a {:?}, expected {:?}",
                i,
                field.dtype(),
                expected
            )));
        }
        Ok(field)
    }

    /// Handles the creation of groups for aggregation.
    ///
    /// If a group exists, then merge the tuple into the group's accumulated
    /// value. Otherwise, create a new group aggregate result seeded from this
    /// tuple. A failing merge creates no group state.
    ///
    /// # Arguments
    ///
    /// * `tuple` - Tuple to add to a group.
    pub fn merge_tuple_into_group(&mut self, tuple: &Tuple) -> Result<(), ShaleError> {
        let group_key = match &self.group_by {
            None => None,
            Some((idx, dtype)) => Some(self.field_at(tuple, *idx, dtype)?.clone()),
        };
        let value = self.field_at(tuple, self.agg_field, &self.agg_dtype)?;
        match self.groups.entry(group_key) {
            Entry::Occupied(mut entry) => entry.get_mut().merge(value)?,
            Entry::Vacant(entry) => {
                entry.insert(AggregateFunction::create(self.op, value)?);
            }
        }
        Ok(())
    }

    /// Returns a `TupleIterator` over the results.
    ///
    /// Resulting tuples are of the form (group by field, aggregate field),
    /// one per group that has been merged at least once. Order is
    /// unspecified; every observed group appears exactly once.
    pub fn iterator(&self) -> TupleIterator {
        let mut tuples = Vec::new();
        for (key, func) in self.groups.iter() {
            let mut fields = Vec::new();
            if let Some(group_val) = key {
                fields.push(group_val.clone());
            }
            fields.push(func.result());
            tuples.push(Tuple::new(fields));
        }
        TupleIterator::new(tuples, self.schema.clone())
    }

    /// Discards all group state, returning the engine to its just-constructed
    /// state.
    pub fn clear(&mut self) {
        self.groups.clear();
    }
}

/// Aggregate operator: drains its child into the aggregation engine on open,
/// then serves the materialized results.
pub struct Aggregate {
    /// Aggregation engine holding the grouping map.
    aggregator: Aggregator,
    /// Iterator over the materialized results, populated by open.
    agg_iter: Option<TupleIterator>,
    /// Output schema, (grouping field attribute, result attribute).
    schema: TableSchema,
    /// Boolean if the iterator is open.
    open: bool,
    /// Child operator to get the data from.
    child: Box<dyn OpIterator>,
}

impl Aggregate {
    /// Aggregate constructor.
    ///
    /// # Arguments
    ///
    /// * `group_field` - Index of the field to group by, or None for no grouping.
    /// * `agg_field` - Index of the field to aggregate over.
    /// * `op` - Aggregate operation to apply.
    /// * `child` - Child operator to get the input data from.
    ///
    /// # Panics
    ///
    /// Panics if a field index is not in the child's schema.
    pub fn new(
        group_field: Option<usize>,
        agg_field: usize,
        op: AggOp,
        child: Box<dyn OpIterator>,
    ) -> Self {
        let child_schema = child.get_schema();
        let mut attrs = Vec::new();
        let mut group_by = None;
        if let Some(g) = group_field {
            let group_attr = child_schema.get_attribute(g).unwrap();
            group_by = Some((g, group_attr.dtype().clone()));
            attrs.push(group_attr.clone());
        }
        let agg_attr = child_schema.get_attribute(agg_field).unwrap();
        attrs.push(Attribute::new(
            format!("{}({})", op, agg_attr.name()),
            Self::result_dtype(op, agg_attr.dtype()),
        ));
        let agg_dtype = agg_attr.dtype().clone();
        let schema = TableSchema::new(attrs);
        Self {
            aggregator: Aggregator::new(agg_field, agg_dtype, group_by, op, schema.clone()),
            agg_iter: None,
            schema,
            open: false,
            child,
        }
    }

    /// Type of the result attribute for the given operation over an
    /// attribute of the given type.
    fn result_dtype(op: AggOp, child_dtype: &DataType) -> DataType {
        match op {
            AggOp::Count | AggOp::Sum | AggOp::Avg => DataType::Int,
            AggOp::Min | AggOp::Max => child_dtype.clone(),
        }
    }
}

impl OpIterator for Aggregate {
    /// Opens the child and drains it fully into the aggregation engine before
    /// returning. Aggregate results are never interleaved with child
    /// production.
    fn open(&mut self) -> Result<(), ShaleError> {
        self.child.open()?;
        self.open = true;
        self.aggregator.clear();
        let mut merged = 0;
        while let Some(input_tuple) = self.child.next()? {
            self.aggregator.merge_tuple_into_group(&input_tuple)?;
            merged += 1;
        }
        debug!("aggregate drained {} tuples from child", merged);
        let mut agg_iter = self.aggregator.iterator();
        agg_iter.open()?;
        self.agg_iter = Some(agg_iter);
        Ok(())
    }

    fn next(&mut self) -> Result<Option<Tuple>, ShaleError> {
        if !self.open {
            return Err(ShaleError::IllegalState(String::from(
                "operator has not been opened",
            )));
        }
        match self.agg_iter.as_mut() {
            Some(agg_iter) => agg_iter.next(),
            None => Err(ShaleError::IllegalState(String::from(
                "aggregate results have not been materialized",
            ))),
        }
    }

    fn close(&mut self) -> Result<(), ShaleError> {
        if !self.open {
            return Err(ShaleError::IllegalState(String::from(
                "operator has not been opened",
            )));
        }
        self.child.close()?;
        if let Some(mut agg_iter) = self.agg_iter.take() {
            agg_iter.close()?;
        }
        self.open = false;
        Ok(())
    }

    /// Rewinds the materialized result iterator only; the child is not
    /// re-drained and no groups are recomputed.
    fn rewind(&mut self) -> Result<(), ShaleError> {
        if !self.open {
            return Err(ShaleError::IllegalState(String::from(
                "operator has not been opened",
            )));
        }
        match self.agg_iter.as_mut() {
            Some(agg_iter) => agg_iter.rewind(),
            None => Err(ShaleError::IllegalState(String::from(
                "aggregate results have not been materialized",
            ))),
        }
    }

    fn get_schema(&self) -> &TableSchema {
        &self.schema
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::opiterator::testutil::*;
    use common::testutil::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Creates a vector of tuples to create the following table:
    ///
    /// 1 1 3 E
    /// 2 1 3 G
    /// 3 1 4 A
    /// 4 2 4 G
    /// 5 2 5 G
    /// 6 2 5 G
    fn tuples() -> Vec<Tuple> {
        let tuples = vec![
            Tuple::new(vec![
                Field::IntField(1),
                Field::IntField(1),
                Field::IntField(3),
                Field::StringField("E".to_string()),
            ]),
            Tuple::new(vec![
                Field::IntField(2),
                Field::IntField(1),
                Field::IntField(3),
                Field::StringField("G".to_string()),
            ]),
            Tuple::new(vec![
                Field::IntField(3),
                Field::IntField(1),
                Field::IntField(4),
                Field::StringField("A".to_string()),
            ]),
            Tuple::new(vec![
                Field::IntField(4),
                Field::IntField(2),
                Field::IntField(4),
                Field::StringField("G".to_string()),
            ]),
            Tuple::new(vec![
                Field::IntField(5),
                Field::IntField(2),
                Field::IntField(5),
                Field::StringField("G".to_string()),
            ]),
            Tuple::new(vec![
                Field::IntField(6),
                Field::IntField(2),
                Field::IntField(5),
                Field::StringField("G".to_string()),
            ]),
        ];
        tuples
    }

    fn source_schema() -> TableSchema {
        let names = vec!["1", "2", "3", "4"];
        let dtypes = vec![
            DataType::Int,
            DataType::Int,
            DataType::Int,
            DataType::String,
        ];
        TableSchema::from_vecs(names, dtypes)
    }

    mod aggregator {
        use super::*;

        fn result_schema(op: AggOp, field: usize) -> TableSchema {
            let dtype = match op {
                AggOp::Min | AggOp::Max => source_schema().get_attribute(field).unwrap().dtype.clone(),
                _ => DataType::Int,
            };
            TableSchema::new(vec![Attribute::new("agg".to_string(), dtype)])
        }

        /// Set up testing aggregations without grouping.
        ///
        /// # Arguments
        ///
        /// * `op` - Aggregation Operation.
        /// * `field` - Field do aggregation operation over.
        /// * `expected` - The expected result.
        fn test_no_group(op: AggOp, field: usize, expected: Field) -> Result<(), ShaleError> {
            let dtype = source_schema().get_attribute(field).unwrap().dtype.clone();
            let mut agg = Aggregator::new(field, dtype, None, op, result_schema(op, field));
            let ti = tuples();
            for t in &ti {
                agg.merge_tuple_into_group(t)?;
            }

            let mut ai = agg.iterator();
            ai.open()?;
            assert_eq!(expected, *ai.next()?.unwrap().get_field(0).unwrap());
            assert_eq!(None, ai.next()?);
            Ok(())
        }

        #[test]
        fn test_merge_tuples_count() -> Result<(), ShaleError> {
            test_no_group(AggOp::Count, 0, Field::IntField(6))
        }

        #[test]
        fn test_merge_tuples_sum() -> Result<(), ShaleError> {
            test_no_group(AggOp::Sum, 1, Field::IntField(9))
        }

        #[test]
        fn test_merge_tuples_max() -> Result<(), ShaleError> {
            test_no_group(AggOp::Max, 0, Field::IntField(6))
        }

        #[test]
        fn test_merge_tuples_min() -> Result<(), ShaleError> {
            test_no_group(AggOp::Min, 0, Field::IntField(1))
        }

        #[test]
        fn test_merge_tuples_avg() -> Result<(), ShaleError> {
            test_no_group(AggOp::Avg, 0, Field::IntField(3))
        }

        #[test]
        fn test_count_string_field() -> Result<(), ShaleError> {
            test_no_group(AggOp::Count, 3, Field::IntField(6))
        }

        #[test]
        fn test_min_max_string_field() -> Result<(), ShaleError> {
            test_no_group(AggOp::Max, 3, Field::StringField("G".to_string()))?;
            test_no_group(AggOp::Min, 3, Field::StringField("A".to_string()))
        }

        #[test]
        fn test_avg_truncates() -> Result<(), ShaleError> {
            let mut agg = Aggregator::new(
                0,
                DataType::Int,
                None,
                AggOp::Avg,
                TableSchema::new(vec![Attribute::new("agg".to_string(), DataType::Int)]),
            );
            for v in [4, 7, 9] {
                agg.merge_tuple_into_group(&int_vec_to_tuple(vec![v]))?;
            }
            let mut ai = agg.iterator();
            ai.open()?;
            assert_eq!(
                Field::IntField(6),
                *ai.next()?.unwrap().get_field(0).unwrap()
            );
            Ok(())
        }

        #[test]
        fn test_min_max_single_merge() -> Result<(), ShaleError> {
            for op in [AggOp::Min, AggOp::Max] {
                let mut agg = Aggregator::new(
                    0,
                    DataType::Int,
                    None,
                    op,
                    TableSchema::new(vec![Attribute::new("agg".to_string(), DataType::Int)]),
                );
                agg.merge_tuple_into_group(&int_vec_to_tuple(vec![42]))?;
                let mut ai = agg.iterator();
                ai.open()?;
                assert_eq!(
                    Field::IntField(42),
                    *ai.next()?.unwrap().get_field(0).unwrap()
                );
            }
            Ok(())
        }

        #[test]
        fn test_empty_merge_yields_no_groups() -> Result<(), ShaleError> {
            let agg = Aggregator::new(
                0,
                DataType::Int,
                None,
                AggOp::Count,
                TableSchema::new(vec![Attribute::new("agg".to_string(), DataType::Int)]),
            );
            let mut ai = agg.iterator();
            ai.open()?;
            assert_eq!(None, ai.next()?);
            Ok(())
        }

        #[test]
        fn test_merge_string_not_supported() -> Result<(), ShaleError> {
            for op in [AggOp::Sum, AggOp::Avg] {
                let mut agg = Aggregator::new(
                    3,
                    DataType::String,
                    None,
                    op,
                    TableSchema::new(vec![Attribute::new("agg".to_string(), DataType::Int)]),
                );
                let res = agg.merge_tuple_into_group(&tuples()[0]);
                assert!(matches!(res, Err(ShaleError::UnsupportedOperation(_))));
                // the failed merge must leave no partial group state
                let mut ai = agg.iterator();
                ai.open()?;
                assert_eq!(None, ai.next()?);
            }
            Ok(())
        }

        #[test]
        fn test_merge_wrong_field_type() {
            // schema promised an int aggregate field, tuple carries a string
            let mut agg = Aggregator::new(
                3,
                DataType::Int,
                None,
                AggOp::Count,
                TableSchema::new(vec![Attribute::new("agg".to_string(), DataType::Int)]),
            );
            let res = agg.merge_tuple_into_group(&tuples()[0]);
            assert!(matches!(res, Err(ShaleError::SchemaMismatch(_))));
        }

        #[test]
        fn test_merge_tuples_one_group_field() -> Result<(), ShaleError> {
            let schema = TableSchema::new(vec![
                Attribute::new("group".to_string(), DataType::Int),
                Attribute::new("agg".to_string(), DataType::Int),
            ]);
            let mut agg = Aggregator::new(
                0,
                DataType::Int,
                Some((2, DataType::Int)),
                AggOp::Sum,
                schema,
            );

            let ti = tuples();
            for t in &ti {
                agg.merge_tuple_into_group(t)?;
            }

            let mut ai = agg.iterator();
            ai.open()?;
            let rows = num_tuples(&mut ai)?;
            assert_eq!(3, rows);
            Ok(())
        }

        #[test]
        fn test_merge_tuples_string_group() -> Result<(), ShaleError> {
            let schema = TableSchema::new(vec![
                Attribute::new("group".to_string(), DataType::String),
                Attribute::new("agg".to_string(), DataType::Int),
            ]);
            let mut agg = Aggregator::new(
                0,
                DataType::Int,
                Some((3, DataType::String)),
                AggOp::Count,
                schema,
            );

            for t in &tuples() {
                agg.merge_tuple_into_group(t)?;
            }

            let mut ai = agg.iterator();
            ai.open()?;
            let mut rows: Vec<(String, i32)> = Vec::new();
            while let Some(t) = ai.next()? {
                rows.push((
                    t.get_field(0).unwrap().unwrap_string_field().to_string(),
                    t.get_field(1).unwrap().unwrap_int_field(),
                ));
            }
            rows.sort();
            assert_eq!(
                vec![
                    ("A".to_string(), 1),
                    ("E".to_string(), 1),
                    ("G".to_string(), 4)
                ],
                rows
            );
            Ok(())
        }

        #[test]
        fn test_clear() -> Result<(), ShaleError> {
            let mut agg = Aggregator::new(
                0,
                DataType::Int,
                None,
                AggOp::Count,
                TableSchema::new(vec![Attribute::new("agg".to_string(), DataType::Int)]),
            );
            for t in &tuples() {
                agg.merge_tuple_into_group(t)?;
            }
            agg.clear();
            let mut ai = agg.iterator();
            ai.open()?;
            assert_eq!(None, ai.next()?);
            Ok(())
        }
    }

    mod aggregate {
        use super::*;

        fn tuple_iterator() -> TupleIterator {
            TupleIterator::new(tuples(), source_schema())
        }

        #[test]
        fn test_open() -> Result<(), ShaleError> {
            let ti = tuple_iterator();
            let mut ai = Aggregate::new(None, 0, AggOp::Count, Box::new(ti));
            assert!(!ai.open);
            ai.open()?;
            assert!(ai.open);
            Ok(())
        }

        fn test_single_agg_no_group(
            op: AggOp,
            col: usize,
            expected: Field,
        ) -> Result<(), ShaleError> {
            let ti = tuple_iterator();
            let mut ai = Aggregate::new(None, col, op, Box::new(ti));
            ai.open()?;
            assert_eq!(expected, *ai.next()?.unwrap().get_field(0).unwrap());
            assert_eq!(None, ai.next()?);
            ai.close()
        }

        #[test]
        fn test_single_agg() -> Result<(), ShaleError> {
            test_single_agg_no_group(AggOp::Count, 0, Field::IntField(6))?;
            test_single_agg_no_group(AggOp::Sum, 0, Field::IntField(21))?;
            test_single_agg_no_group(AggOp::Max, 0, Field::IntField(6))?;
            test_single_agg_no_group(AggOp::Min, 0, Field::IntField(1))?;
            test_single_agg_no_group(AggOp::Avg, 0, Field::IntField(3))?;
            test_single_agg_no_group(AggOp::Count, 3, Field::IntField(6))?;
            test_single_agg_no_group(AggOp::Max, 3, Field::StringField("G".to_string()))?;
            test_single_agg_no_group(AggOp::Min, 3, Field::StringField("A".to_string()))
        }

        #[test]
        fn test_empty_child_yields_no_rows() -> Result<(), ShaleError> {
            let ti = TupleIterator::new(Vec::new(), source_schema());
            let mut ai = Aggregate::new(None, 0, AggOp::Count, Box::new(ti));
            ai.open()?;
            assert_eq!(None, ai.next()?);
            ai.close()
        }

        #[test]
        fn test_sum_over_string_fails_on_open() {
            let ti = tuple_iterator();
            let mut ai = Aggregate::new(None, 3, AggOp::Sum, Box::new(ti));
            assert!(matches!(
                ai.open(),
                Err(ShaleError::UnsupportedOperation(_))
            ));
        }

        /// Consumes an OpIterator and returns a corresponding 2D Vec of fields
        fn iter_to_vec(iter: &mut impl OpIterator) -> Result<Vec<Vec<Field>>, ShaleError> {
            let mut rows = Vec::new();
            iter.open()?;
            while let Some(t) = iter.next()? {
                rows.push(t.field_vals().cloned().collect());
            }
            iter.close()?;
            Ok(rows)
        }

        #[test]
        fn test_group_values() -> Result<(), ShaleError> {
            let ti = tuple_iterator();
            let mut ai = Aggregate::new(Some(1), 0, AggOp::Max, Box::new(ti));
            let mut result = iter_to_vec(&mut ai)?;
            result.sort();
            let expected = vec![
                vec![Field::IntField(1), Field::IntField(3)],
                vec![Field::IntField(2), Field::IntField(6)],
            ];
            assert_eq!(expected, result);
            Ok(())
        }

        #[test]
        fn test_grouped_row_count() -> Result<(), ShaleError> {
            let ti = tuple_iterator();
            let mut ai = Aggregate::new(Some(2), 3, AggOp::Count, Box::new(ti));
            ai.open()?;
            let rows = num_tuples(&mut ai)?;
            ai.close()?;
            assert_eq!(3, rows);
            Ok(())
        }

        #[test]
        fn test_next_not_open() {
            let ti = tuple_iterator();
            let mut ai = Aggregate::new(None, 0, AggOp::Count, Box::new(ti));
            assert!(matches!(ai.next(), Err(ShaleError::IllegalState(_))));
        }

        #[test]
        fn test_close() -> Result<(), ShaleError> {
            let ti = tuple_iterator();
            let mut ai = Aggregate::new(None, 0, AggOp::Count, Box::new(ti));
            ai.open()?;
            assert!(ai.open);
            ai.close()?;
            assert!(!ai.open);
            Ok(())
        }

        #[test]
        fn test_close_not_open() {
            let ti = tuple_iterator();
            let mut ai = Aggregate::new(None, 0, AggOp::Count, Box::new(ti));
            assert!(matches!(ai.close(), Err(ShaleError::IllegalState(_))));
        }

        #[test]
        fn test_rewind_not_open() {
            let ti = tuple_iterator();
            let mut ai = Aggregate::new(None, 0, AggOp::Count, Box::new(ti));
            assert!(matches!(ai.rewind(), Err(ShaleError::IllegalState(_))));
        }

        #[test]
        fn test_rewind() -> Result<(), ShaleError> {
            let ti = tuple_iterator();
            let mut ai = Aggregate::new(Some(2), 3, AggOp::Count, Box::new(ti));
            ai.open()?;
            let count_before = num_tuples(&mut ai)?;
            ai.rewind()?;
            let count_after = num_tuples(&mut ai)?;
            ai.close()?;
            assert_eq!(count_before, count_after);
            Ok(())
        }

        /// Child wrapper counting how many tuples are pulled through it.
        struct CountingChild {
            inner: TupleIterator,
            pulls: Arc<AtomicUsize>,
        }

        impl OpIterator for CountingChild {
            fn open(&mut self) -> Result<(), ShaleError> {
                self.inner.open()
            }

            fn next(&mut self) -> Result<Option<Tuple>, ShaleError> {
                let t = self.inner.next()?;
                if t.is_some() {
                    self.pulls.fetch_add(1, Ordering::SeqCst);
                }
                Ok(t)
            }

            fn close(&mut self) -> Result<(), ShaleError> {
                self.inner.close()
            }

            fn rewind(&mut self) -> Result<(), ShaleError> {
                self.inner.rewind()
            }

            fn get_schema(&self) -> &TableSchema {
                self.inner.get_schema()
            }
        }

        #[test]
        fn test_rewind_does_not_redrain_child() -> Result<(), ShaleError> {
            let pulls = Arc::new(AtomicUsize::new(0));
            let child = CountingChild {
                inner: tuple_iterator(),
                pulls: Arc::clone(&pulls),
            };
            let mut ai = Aggregate::new(None, 0, AggOp::Sum, Box::new(child));
            ai.open()?;
            assert_eq!(6, pulls.load(Ordering::SeqCst));
            while ai.next()?.is_some() {}
            ai.rewind()?;
            assert_eq!(
                Field::IntField(21),
                *ai.next()?.unwrap().get_field(0).unwrap()
            );
            // the child was only drained once, by open
            assert_eq!(6, pulls.load(Ordering::SeqCst));
            ai.close()
        }

        #[test]
        fn test_get_schema() {
            let ti = tuple_iterator();
            let ai = Aggregate::new(Some(1), 3, AggOp::Count, Box::new(ti));
            let schema = ai.get_schema();
            assert_eq!(2, schema.size());
            assert_eq!("2", schema.get_attribute(0).unwrap().name());
            assert_eq!(&DataType::Int, schema.get_attribute(0).unwrap().dtype());
            assert_eq!("count(4)", schema.get_attribute(1).unwrap().name());
            assert_eq!(&DataType::Int, schema.get_attribute(1).unwrap().dtype());
        }

        #[test]
        fn test_min_schema_keeps_child_dtype() {
            let ti = tuple_iterator();
            let ai = Aggregate::new(None, 3, AggOp::Min, Box::new(ti));
            let schema = ai.get_schema();
            assert_eq!(1, schema.size());
            assert_eq!("min(4)", schema.get_attribute(0).unwrap().name());
            assert_eq!(&DataType::String, schema.get_attribute(0).unwrap().dtype());
        }

        #[test]
        fn test_count_random_tuples() -> Result<(), ShaleError> {
            init();
            let n = 137;
            let ti = TupleIterator::new(gen_test_tuples(n), gen_test_schema());
            let mut ai = Aggregate::new(None, 0, AggOp::Count, Box::new(ti));
            ai.open()?;
            assert_eq!(
                Field::IntField(n as i32),
                *ai.next()?.unwrap().get_field(0).unwrap()
            );
            assert_eq!(None, ai.next()?);
            ai.close()
        }
    }
}
