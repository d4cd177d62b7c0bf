//! Token-refresh callbacks.
//!
//! Callers persist the session by registering a callback that receives
//! every refreshed [`Token`]. It may be plain blocking code or async code;
//! which one is decided when it is registered, and [`TokenCallback::invoke`]
//! turns either into a future the async client can await.

use crate::token::Token;
use futures::FutureExt;
use futures::future::BoxFuture;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tracing::error;

type SyncFn = dyn Fn(Token) + Send + Sync;
type AsyncFn = dyn Fn(Token) -> BoxFuture<'static, ()> + Send + Sync;

/// A callback fired after a refreshed token has been stored on the client.
#[derive(Clone)]
pub enum TokenCallback {
    /// Blocking code. The async client runs it on tokio's blocking pool.
    Sync(Arc<SyncFn>),
    /// A closure returning a future, awaited in place.
    Async(Arc<AsyncFn>),
}

impl TokenCallback {
    pub fn from_sync<F>(f: F) -> Self
    where
        F: Fn(Token) + Send + Sync + 'static,
    {
        Self::Sync(Arc::new(f))
    }

    pub fn from_async<F, Fut>(f: F) -> Self
    where
        F: Fn(Token) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Self::Async(Arc::new(move |token| f(token).boxed()))
    }

    /// Run the callback from async code.
    ///
    /// A [`Sync`](Self::Sync) callback is moved to `spawn_blocking`, so it
    /// never stalls other tasks on the runtime; the returned future
    /// completes when it has finished.
    pub fn invoke(&self, token: Token) -> BoxFuture<'static, ()> {
        match self {
            Self::Sync(f) => {
                let f = Arc::clone(f);
                async move {
                    if let Err(e) = tokio::task::spawn_blocking(move || f(token)).await {
                        error!(error = %e, "token refresh callback panicked");
                    }
                }
                .boxed()
            }
            Self::Async(f) => f(token),
        }
    }

    /// Run the callback from blocking code. An [`Async`](Self::Async)
    /// callback is driven to completion on the current thread, so it must
    /// not depend on a tokio runtime.
    pub(crate) fn call_blocking(&self, token: Token) {
        match self {
            Self::Sync(f) => f(token),
            Self::Async(f) => futures::executor::block_on(f(token)),
        }
    }
}

impl fmt::Debug for TokenCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sync(_) => f.write_str("TokenCallback::Sync"),
            Self::Async(_) => f.write_str("TokenCallback::Async"),
        }
    }
}
