//! Loose references to rows that the store does not keep consistent.

use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Formatter};
use std::marker::PhantomData;

/// Stored id of a `T` row with no referential-integrity guarantee.
///
/// The target may have been deleted or may never have existed; consumers
/// must treat resolution as an optional lookup.
#[derive(Serialize, Deserialize)]
#[serde(transparent, bound = "")]
pub struct WeakRef<T> {
    id: i64,
    #[serde(skip)]
    _target: PhantomData<fn() -> T>,
}

impl<T> WeakRef<T> {
    pub fn new(id: i64) -> Self {
        Self {
            id,
            _target: PhantomData,
        }
    }

    /// Raw id exactly as it was stored.
    pub fn id(&self) -> i64 {
        self.id
    }

    /// Resolves the reference with `lookup`, mapping absence to `None`.
    pub fn resolve<E>(&self, lookup: impl FnOnce(i64) -> Result<Option<T>, E>) -> Result<Option<T>, E> {
        lookup(self.id)
    }
}

impl<T> Clone for WeakRef<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for WeakRef<T> {}

impl<T> PartialEq for WeakRef<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for WeakRef<T> {}

impl<T> Debug for WeakRef<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "WeakRef({})", self.id)
    }
}

impl<T> From<i64> for WeakRef<T> {
    fn from(id: i64) -> Self {
        Self::new(id)
    }
}
