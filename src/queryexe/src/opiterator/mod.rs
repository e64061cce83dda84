pub use self::aggregate::Aggregate;
pub use self::delete::Delete;
pub use self::filter::{Filter, FilterPredicate};
pub use self::join::{Join, JoinPredicate};
pub use self::tuple_iterator::TupleIterator;
use common::{ShaleError, TableSchema, Tuple};

mod aggregate;
mod delete;
mod filter;
mod join;
mod testutil;
mod tuple_iterator;

/// The pull-based protocol every execution operator implements.
///
/// An operator starts closed. `open` moves it to the open state, `close`
/// back to closed. `next` and `rewind` are valid only while open. Calling
/// `open` on an already open operator is undefined; callers must guard
/// against it.
pub trait OpIterator {
    /// Opens the iterator. This must be called before any of the other methods.
    fn open(&mut self) -> Result<(), ShaleError>;

    /// Advances the iterator and returns the next tuple from the operator.
    ///
    /// Returns None when iteration is finished. None is the normal
    /// end-of-sequence signal, never an error.
    ///
    /// # Errors
    ///
    /// Returns an illegal-state error if the iterator is not open.
    fn next(&mut self) -> Result<Option<Tuple>, ShaleError>;

    /// Closes the iterator, releasing any child iterators.
    ///
    /// # Errors
    ///
    /// Returns an illegal-state error if the iterator is not open.
    fn close(&mut self) -> Result<(), ShaleError>;

    /// Returns the iterator to the start, without repeating the side effects
    /// of `open` unless a concrete operator specifies otherwise.
    ///
    /// # Errors
    ///
    /// Returns an illegal-state error if the iterator is not open.
    fn rewind(&mut self) -> Result<(), ShaleError>;

    /// Returns the schema associated with this OpIterator.
    fn get_schema(&self) -> &TableSchema;
}
