//! The middleware around-chain (spec §4.5/§4.9 REDESIGN FLAGS).
//!
//! Represented as a stack of `Arc<dyn Middleware>` composed by explicit
//! recursion rather than nested closures captured at registration time —
//! the REDESIGN FLAGS note calls this out directly for systems languages.
//! `before`/`after` run once per activation, sequentially, in registration
//! order; `around` wraps the whole `before → attempt loop → after` unit,
//! composed so the *last* registered middleware sits innermost (closest to
//! the core).

use std::sync::Arc;

use flowcraft_context::AsyncContext;
use flowcraft_model::NodeResult;
use futures::future::BoxFuture;

use crate::error::EngineError;

/// The remaining chain, handed to an `around` implementation so it can
/// decide whether to call it at all.
pub struct Next<'a> {
    inner: Box<dyn FnOnce() -> BoxFuture<'a, Result<NodeResult, EngineError>> + Send + 'a>,
}

impl<'a> Next<'a> {
    pub async fn call(self) -> Result<NodeResult, EngineError> {
        (self.inner)().await
    }
}

pub trait Middleware: Send + Sync {
    fn before<'a>(
        &'a self,
        _ctx: &'a dyn AsyncContext,
        _node_id: &'a str,
    ) -> BoxFuture<'a, Result<(), EngineError>> {
        Box::pin(async { Ok(()) })
    }

    fn after<'a>(
        &'a self,
        _ctx: &'a dyn AsyncContext,
        _node_id: &'a str,
        _result: Option<&'a NodeResult>,
        _error: Option<&'a EngineError>,
    ) -> BoxFuture<'a, ()> {
        Box::pin(async {})
    }

    /// May short-circuit by not calling `next`.
    fn around<'a>(
        &'a self,
        _ctx: &'a dyn AsyncContext,
        _node_id: &'a str,
        next: Next<'a>,
    ) -> BoxFuture<'a, Result<NodeResult, EngineError>> {
        Box::pin(async move { next.call().await })
    }
}

#[derive(Clone, Default)]
pub struct MiddlewareChain {
    middlewares: Vec<Arc<dyn Middleware>>,
}

impl MiddlewareChain {
    pub fn new(middlewares: Vec<Arc<dyn Middleware>>) -> Self {
        Self { middlewares }
    }

    pub fn is_empty(&self) -> bool {
        self.middlewares.is_empty()
    }

    pub async fn run_before(&self, ctx: &dyn AsyncContext, node_id: &str) -> Result<(), EngineError> {
        for mw in &self.middlewares {
            mw.before(ctx, node_id).await?;
        }
        Ok(())
    }

    pub async fn run_after(
        &self,
        ctx: &dyn AsyncContext,
        node_id: &str,
        result: Option<&NodeResult>,
        error: Option<&EngineError>,
    ) {
        for mw in &self.middlewares {
            mw.after(ctx, node_id, result, error).await;
        }
    }

    /// Compose the `around` chain and invoke it with `core` as the
    /// innermost step.
    pub fn run_around<'a>(
        &'a self,
        ctx: &'a dyn AsyncContext,
        node_id: &'a str,
        core: Box<dyn FnOnce() -> BoxFuture<'a, Result<NodeResult, EngineError>> + Send + 'a>,
    ) -> BoxFuture<'a, Result<NodeResult, EngineError>> {
        build(&self.middlewares, ctx, node_id, core)
    }
}

fn build<'a>(
    mws: &'a [Arc<dyn Middleware>],
    ctx: &'a dyn AsyncContext,
    node_id: &'a str,
    core: Box<dyn FnOnce() -> BoxFuture<'a, Result<NodeResult, EngineError>> + Send + 'a>,
) -> BoxFuture<'a, Result<NodeResult, EngineError>> {
    match mws.split_first() {
        None => core(),
        Some((first, rest)) => {
            let next = Next {
                inner: Box::new(move || build(rest, ctx, node_id, core)),
            };
            first.around(ctx, node_id, next)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowcraft_context::{Context, ExecutionMeta, SyncContextView};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use uuid::Uuid;

    struct RecordingMiddleware {
        id: &'static str,
        log: Arc<std::sync::Mutex<Vec<String>>>,
    }

    impl Middleware for RecordingMiddleware {
        fn before<'a>(
            &'a self,
            _ctx: &'a dyn AsyncContext,
            _node_id: &'a str,
        ) -> BoxFuture<'a, Result<(), EngineError>> {
            self.log.lock().unwrap().push(format!("{}:before", self.id));
            Box::pin(async { Ok(()) })
        }

        fn around<'a>(
            &'a self,
            ctx: &'a dyn AsyncContext,
            node_id: &'a str,
            next: Next<'a>,
        ) -> BoxFuture<'a, Result<NodeResult, EngineError>> {
            self.log.lock().unwrap().push(format!("{}:around-enter", self.id));
            Box::pin(async move {
                let _ = ctx;
                let _ = node_id;
                let result = next.call().await;
                self.log.lock().unwrap().push(format!("{}:around-exit", self.id));
                result
            })
        }
    }

    #[tokio::test]
    async fn last_registered_is_innermost() {
        let log = Arc::new(std::sync::Mutex::new(Vec::new()));
        let chain = MiddlewareChain::new(vec![
            Arc::new(RecordingMiddleware { id: "m1", log: log.clone() }),
            Arc::new(RecordingMiddleware { id: "m2", log: log.clone() }),
        ]);

        let ctx = SyncContextView::new(Context::new(ExecutionMeta::new(Uuid::new_v4(), "bp", "n")));
        let counter = AtomicUsize::new(0);

        let result = chain
            .run_around(
                &ctx,
                "n",
                Box::new(|| {
                    Box::pin(async {
                        counter.fetch_add(1, Ordering::SeqCst);
                        Ok(NodeResult::ok(json!(1)))
                    })
                }),
            )
            .await;

        assert!(result.is_ok());
        assert_eq!(
            *log.lock().unwrap(),
            vec!["m1:around-enter", "m2:around-enter", "m2:around-exit", "m1:around-exit"]
        );
    }
}
