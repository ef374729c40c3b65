use crate::errors::{ActorError, ProcessingError};

pub type ActorResult<T> = Result<T, ActorError>;

/// What a worker publishes for one job.
pub type Outcome<R> = Result<R, ProcessingError>;

/// Identity of one actor loop, used in logs and reports.
pub type LoopId = uuid::Uuid;

/// A value paired with a caller-chosen correlation id.
///
/// Pools do not preserve submission order and carry no job identity of their
/// own. Callers that need to match results to jobs submit `Tagged` jobs and
/// keep the id with [`Tagged::map`] or [`Tagged::try_map`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tagged<T> {
    pub id: u64,
    pub value: T,
}

impl<T> Tagged<T> {
    pub fn new(id: u64, value: T) -> Self {
        Self { id, value }
    }

    /// Transforms the value, keeping the id.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Tagged<U> {
        Tagged { id: self.id, value: f(self.value) }
    }

    /// Fallible [`map`](Self::map); the error is tagged too so a failed job
    /// can still be matched to its submission.
    pub fn try_map<U, E>(self, f: impl FnOnce(T) -> Result<U, E>) -> Result<Tagged<U>, Tagged<E>> {
        let id = self.id;
        f(self.value)
            .map(|value| Tagged { id, value })
            .map_err(|value| Tagged { id, value })
    }
}

/// Tags every item of `items` with its position.
pub fn enumerate_tagged<T>(items: impl IntoIterator<Item = T>) -> impl Iterator<Item = Tagged<T>> {
    items
        .into_iter()
        .enumerate()
        .map(|(id, value)| Tagged::new(id as u64, value))
}
