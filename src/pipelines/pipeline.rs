//! Pipeline trait.
use crate::error::Error;

/// This trait must be implemented for each Pipeline,
/// and is generic over the return type so that
/// a pipeline can hand its run statistics back to the caller.
pub trait Pipeline<T> {
    fn run(&self) -> Result<T, Error>;
}
