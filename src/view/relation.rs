use crate::core::Result;
use futures::future::BoxFuture;
use std::sync::Arc;

/// Deferred, zero-argument accessor for a related record or records.
///
/// Holds a closure over the owning record's reference ids and the
/// operation's loaders. Nothing is fetched until `call` is invoked, and
/// every invocation goes through the same loaders.
pub struct Relation<T> {
    resolve: Arc<dyn Fn() -> BoxFuture<'static, Result<T>> + Send + Sync>,
}

impl<T> Relation<T> {
    pub fn new<F>(resolve: F) -> Self
    where
        F: Fn() -> BoxFuture<'static, Result<T>> + Send + Sync + 'static,
    {
        Self {
            resolve: Arc::new(resolve),
        }
    }

    pub fn call(&self) -> BoxFuture<'static, Result<T>> {
        (self.resolve)()
    }
}

impl<T> Clone for Relation<T> {
    fn clone(&self) -> Self {
        Self {
            resolve: Arc::clone(&self.resolve),
        }
    }
}

impl<T> std::fmt::Debug for Relation<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Relation(..)")
    }
}
