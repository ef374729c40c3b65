use crate::errors::ProcessingError;

/// The per-job function run by every worker of a pool.
///
/// Implemented for any `Fn(J) -> Result<R, ProcessingError>` closure. One
/// processor is shared by all workers, so it takes `&self`; working memory
/// belongs on the stack of `process`, not in shared fields.
///
/// `process` is synchronous. Unless the pool runs its processors on the
/// blocking thread pool, it executes on a runtime worker and must not block.
pub trait Processor<J, R>: Send + Sync + 'static {
    fn process(&self, job: J) -> Result<R, ProcessingError>;
}

impl<J, R, F> Processor<J, R> for F
where
    F: Fn(J) -> Result<R, ProcessingError> + Send + Sync + 'static,
{
    fn process(&self, job: J) -> Result<R, ProcessingError> {
        self(job)
    }
}

/// Adapts a plain `J -> R` function into a processor that never fails.
pub fn infallible<J, R, F>(f: F) -> impl Fn(J) -> Result<R, ProcessingError> + Send + Sync + 'static
where
    F: Fn(J) -> R + Send + Sync + 'static,
{
    move |job| Ok(f(job))
}
