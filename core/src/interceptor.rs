//! Ordered interceptor chains for requests and responses.
//!
//! # Design
//! Each direction owns an `InterceptorManager`: a list of slots where
//! `eject` leaves a hole instead of shifting later entries, so an id stays
//! valid until that exact handler is ejected. A run clones the live handlers
//! under the read lock and releases it before awaiting anything; handlers
//! registered or ejected mid-run are seen by the next run only.

use std::future::Future;
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;

use crate::error::HttpError;
use crate::http::{HttpRequest, HttpResponse};

/// A pair of optional transforms applied to a value travelling through a chain.
///
/// Both methods default to passing their input through unchanged, so an
/// implementation only overrides the path it cares about.
#[async_trait]
pub trait Interceptor<V: Send + 'static>: Send + Sync {
    /// Transform a value on the success path. An `Err` stops the chain and
    /// fails the call.
    async fn fulfilled(&self, value: V) -> Result<V, HttpError> {
        Ok(value)
    }

    /// Reshape an error on the failure path.
    async fn rejected(&self, error: HttpError) -> HttpError {
        error
    }
}

struct FulfilledFn<F>(F);

#[async_trait]
impl<V, F, Fut> Interceptor<V> for FulfilledFn<F>
where
    V: Send + 'static,
    F: Fn(V) -> Fut + Send + Sync,
    Fut: Future<Output = Result<V, HttpError>> + Send + 'static,
{
    async fn fulfilled(&self, value: V) -> Result<V, HttpError> {
        (self.0)(value).await
    }
}

struct RejectedFn<F>(F);

#[async_trait]
impl<V, F, Fut> Interceptor<V> for RejectedFn<F>
where
    V: Send + 'static,
    F: Fn(HttpError) -> Fut + Send + Sync,
    Fut: Future<Output = HttpError> + Send + 'static,
{
    async fn rejected(&self, error: HttpError) -> HttpError {
        (self.0)(error).await
    }
}

type Handler<V> = Arc<dyn Interceptor<V>>;

/// Registry of interceptors for one direction of the client.
///
/// Handlers are identified by the id `use_handler` returns, which is their
/// registration position. Registration and ejection go through a lock, so a
/// manager can be mutated while requests are in flight.
pub struct InterceptorManager<V: Send + 'static> {
    handlers: RwLock<Vec<Option<Handler<V>>>>,
}

impl<V: Send + 'static> Default for InterceptorManager<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Send + 'static> InterceptorManager<V> {
    pub fn new() -> Self {
        Self {
            handlers: RwLock::new(Vec::new()),
        }
    }

    /// Append `handler` to the chain and return its id.
    pub fn use_handler<I: Interceptor<V> + 'static>(&self, handler: I) -> usize {
        self.use_arc(Arc::new(handler))
    }

    pub fn use_arc(&self, handler: Arc<dyn Interceptor<V>>) -> usize {
        let mut handlers = self.handlers.write().unwrap_or_else(PoisonError::into_inner);
        handlers.push(Some(handler));
        handlers.len() - 1
    }

    /// Register a success-path transform only.
    pub fn on_fulfilled<F, Fut>(&self, f: F) -> usize
    where
        F: Fn(V) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<V, HttpError>> + Send + 'static,
    {
        self.use_handler(FulfilledFn(f))
    }

    /// Register a failure-path transform only.
    pub fn on_rejected<F, Fut>(&self, f: F) -> usize
    where
        F: Fn(HttpError) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HttpError> + Send + 'static,
    {
        self.use_handler(RejectedFn(f))
    }

    /// Remove the handler registered under `id`.
    ///
    /// Returns `false` when `id` was never issued or was already ejected.
    pub fn eject(&self, id: usize) -> bool {
        let mut handlers = self.handlers.write().unwrap_or_else(PoisonError::into_inner);
        handlers.get_mut(id).and_then(Option::take).is_some()
    }

    /// Number of live handlers.
    pub fn len(&self) -> usize {
        let handlers = self.handlers.read().unwrap_or_else(PoisonError::into_inner);
        handlers.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn snapshot(&self) -> Vec<Handler<V>> {
        let handlers = self.handlers.read().unwrap_or_else(PoisonError::into_inner);
        handlers.iter().flatten().cloned().collect()
    }

    /// Fold `value` through every handler's `fulfilled` transform in
    /// registration order.
    pub async fn run_fulfilled(&self, value: V) -> Result<V, HttpError> {
        let mut value = value;
        for handler in self.snapshot() {
            value = handler.fulfilled(value).await?;
        }
        Ok(value)
    }

    /// Fold `error` through every handler's `rejected` transform in
    /// registration order.
    pub async fn run_rejected(&self, error: HttpError) -> HttpError {
        let mut error = error;
        for handler in self.snapshot() {
            error = handler.rejected(error).await;
        }
        error
    }
}

/// The request and response chains of one client.
#[derive(Default)]
pub struct Interceptors {
    pub request: InterceptorManager<HttpRequest>,
    pub response: InterceptorManager<HttpResponse>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::sync::Mutex;

    fn push(log: &Arc<Mutex<Vec<&'static str>>>, entry: &'static str) {
        log.lock().unwrap().push(entry);
    }

    #[tokio::test]
    async fn fulfilled_handlers_run_in_registration_order() {
        let chain = InterceptorManager::<Vec<u32>>::new();
        for n in 1..=3 {
            chain.on_fulfilled(move |mut v: Vec<u32>| async move {
                v.push(n);
                Ok(v)
            });
        }
        assert_eq!(chain.run_fulfilled(Vec::new()).await.unwrap(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn handler_without_path_is_a_no_op() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let chain = InterceptorManager::<u32>::new();
        let l = log.clone();
        chain.on_rejected(move |e| {
            let l = l.clone();
            async move {
                push(&l, "rejected");
                e
            }
        });
        assert_eq!(chain.run_fulfilled(5).await.unwrap(), 5);
        assert!(log.lock().unwrap().is_empty());

        let err = chain.run_rejected(HttpError::decode("x")).await;
        assert_eq!(err.message, "x");
        assert_eq!(*log.lock().unwrap(), vec!["rejected"]);
    }

    #[tokio::test]
    async fn failing_fulfilled_handler_stops_the_chain() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let chain = InterceptorManager::<u32>::new();
        chain.on_fulfilled(|_| async { Err(HttpError::interceptor("denied")) });
        let l = log.clone();
        chain.on_fulfilled(move |v| {
            let l = l.clone();
            async move {
                push(&l, "second");
                Ok(v)
            }
        });
        let err = chain.run_fulfilled(1).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Interceptor);
        assert!(log.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn rejected_handlers_reshape_the_error() {
        let chain = InterceptorManager::<u32>::new();
        chain.on_rejected(|mut e| async move {
            e.message = format!("{} (wrapped)", e.message);
            e
        });
        chain.on_rejected(|mut e| async move {
            e.name = "Wrapped".into();
            e
        });
        let err = chain.run_rejected(HttpError::decode("bad")).await;
        assert_eq!(err.name, "Wrapped");
        assert_eq!(err.message, "bad (wrapped)");
    }

    #[test]
    fn ids_are_positions_and_survive_ejection() {
        let chain = InterceptorManager::<u32>::new();
        let a = chain.on_fulfilled(|v| async move { Ok(v) });
        let b = chain.on_fulfilled(|v| async move { Ok(v) });
        assert_eq!((a, b), (0, 1));

        assert!(chain.eject(a));
        assert!(!chain.eject(a));
        assert_eq!(chain.len(), 1);

        let c = chain.on_fulfilled(|v| async move { Ok(v) });
        assert_eq!(c, 2);
        assert!(chain.eject(b));
        assert!(chain.eject(c));
        assert!(chain.is_empty());
        assert!(!chain.eject(42));
    }

    #[tokio::test]
    async fn ejected_handler_no_longer_runs() {
        let chain = InterceptorManager::<u32>::new();
        let id = chain.on_fulfilled(|v| async move { Ok(v * 10) });
        chain.on_fulfilled(|v| async move { Ok(v + 1) });
        assert_eq!(chain.run_fulfilled(1).await.unwrap(), 11);

        assert!(chain.eject(id));
        assert_eq!(chain.run_fulfilled(1).await.unwrap(), 2);
    }

    struct Doubler;

    #[async_trait]
    impl Interceptor<u32> for Doubler {
        async fn fulfilled(&self, value: u32) -> Result<u32, HttpError> {
            Ok(value * 2)
        }
    }

    #[tokio::test]
    async fn trait_handlers_are_supported() {
        let chain = InterceptorManager::<u32>::new();
        chain.use_handler(Doubler);
        chain.use_handler(Doubler);
        assert_eq!(chain.run_fulfilled(3).await.unwrap(), 12);
        assert_eq!(chain.run_rejected(HttpError::decode("e")).await.message, "e");
    }

    #[tokio::test]
    async fn handlers_registered_mid_run_wait_for_the_next_run() {
        let chain = Arc::new(InterceptorManager::<u32>::new());
        let log = Arc::new(Mutex::new(Vec::new()));

        let registrar = {
            let chain = Arc::downgrade(&chain);
            let log = log.clone();
            move |value: u32| {
                if let Some(chain) = chain.upgrade() {
                    if chain.len() == 1 {
                        let log = log.clone();
                        chain.on_fulfilled(move |value: u32| {
                            push(&log, "late");
                            async move { Ok(value + 10) }
                        });
                    }
                }
                async move { Ok(value + 1) }
            }
        };
        chain.on_fulfilled(registrar);

        assert_eq!(chain.run_fulfilled(0).await.unwrap(), 1);
        assert!(log.lock().unwrap().is_empty());
        assert_eq!(chain.len(), 2);

        assert_eq!(chain.run_fulfilled(0).await.unwrap(), 11);
        assert_eq!(*log.lock().unwrap(), vec!["late"]);
    }

    #[tokio::test]
    async fn handlers_ejected_mid_run_still_finish_that_run() {
        let chain = Arc::new(InterceptorManager::<u32>::new());
        let ejector = {
            let chain = Arc::downgrade(&chain);
            move |value: u32| {
                if let Some(chain) = chain.upgrade() {
                    chain.eject(1);
                }
                async move { Ok(value + 1) }
            }
        };
        chain.on_fulfilled(ejector);
        chain.on_fulfilled(|value: u32| async move { Ok(value * 10) });

        assert_eq!(chain.run_fulfilled(1).await.unwrap(), 20);
        assert_eq!(chain.len(), 1);
        assert_eq!(chain.run_fulfilled(1).await.unwrap(), 2);
    }
}
