// Pipeline construction: behaviors folded around a terminal handler

use crate::error::{DispatchError, DispatchResult};
use crate::request::{Next, PipelineBehavior, PipelineFuture, Request, RequestHandler};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::trace;

/// Composed invocation chain for a single dispatch
///
/// Built by [`Pipeline::build`] without running anything; [`Pipeline::run`]
/// executes it. The first behavior is the outermost wrapper: for behaviors
/// `[A, B]` around handler `H` the call order is
/// `A-enter, B-enter, H, B-exit, A-exit`.
pub struct Pipeline<R: Request> {
    entry: Next<R>,
    stages: usize,
}

impl<R: Request> Pipeline<R> {
    /// Compose `behaviors` around `handler`
    pub fn build(
        behaviors: Vec<Arc<dyn PipelineBehavior<R>>>,
        handler: Arc<dyn RequestHandler<R>>,
        cancellation: CancellationToken,
    ) -> Self {
        let stages = behaviors.len() + 1;

        let terminal_token = cancellation.clone();
        let mut next: Next<R> = Box::new(move |request: R| {
            Box::pin(async move {
                if terminal_token.is_cancelled() {
                    return Err(DispatchError::Cancelled);
                }
                trace!("Pipeline reached handler");
                handler.handle(request, terminal_token).await
            }) as PipelineFuture<R::Response>
        });

        // Fold in reverse so the first behavior ends up outermost
        for (index, behavior) in behaviors.into_iter().enumerate().rev() {
            let inner = next;
            let token = cancellation.clone();
            next = Box::new(move |request: R| {
                Box::pin(async move {
                    trace!(behavior_index = index, "Executing behavior");
                    behavior.handle(request, token, inner).await
                }) as PipelineFuture<R::Response>
            });
        }

        Self {
            entry: next,
            stages,
        }
    }

    /// Number of stages, handler included
    pub fn stages(&self) -> usize {
        self.stages
    }

    /// Execute the chain with `request`
    pub async fn run(self, request: R) -> DispatchResult<R::Response> {
        (self.entry)(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Echo(String);

    impl Request for Echo {
        type Response = String;
    }

    type Trace = Arc<Mutex<Vec<String>>>;

    struct TracingHandler {
        trace: Trace,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl RequestHandler<Echo> for TracingHandler {
        async fn handle(&self, request: Echo, _cancellation: CancellationToken) -> DispatchResult<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.trace.lock().unwrap().push("H".to_string());
            Ok(request.0)
        }
    }

    struct Tracer {
        name: &'static str,
        trace: Trace,
    }

    #[async_trait]
    impl PipelineBehavior<Echo> for Tracer {
        async fn handle(
            &self,
            request: Echo,
            _cancellation: CancellationToken,
            next: Next<Echo>,
        ) -> DispatchResult<String> {
            self.trace.lock().unwrap().push(format!("{}-enter", self.name));
            let result = next(request).await;
            self.trace.lock().unwrap().push(format!("{}-exit", self.name));
            result
        }
    }

    struct ShortCircuit;

    #[async_trait]
    impl PipelineBehavior<Echo> for ShortCircuit {
        async fn handle(
            &self,
            _request: Echo,
            _cancellation: CancellationToken,
            _next: Next<Echo>,
        ) -> DispatchResult<String> {
            Ok("short".to_string())
        }
    }

    fn handler(trace: &Trace, calls: &Arc<AtomicUsize>) -> Arc<dyn RequestHandler<Echo>> {
        Arc::new(TracingHandler {
            trace: trace.clone(),
            calls: calls.clone(),
        })
    }

    fn tracer(name: &'static str, trace: &Trace) -> Arc<dyn PipelineBehavior<Echo>> {
        Arc::new(Tracer {
            name,
            trace: trace.clone(),
        })
    }

    #[tokio::test]
    async fn test_first_behavior_is_outermost() {
        let trace: Trace = Arc::default();
        let calls = Arc::new(AtomicUsize::new(0));

        let pipeline = Pipeline::build(
            vec![tracer("A", &trace), tracer("B", &trace)],
            handler(&trace, &calls),
            CancellationToken::new(),
        );
        assert_eq!(pipeline.stages(), 3);

        let result = pipeline.run(Echo("ok".to_string())).await.unwrap();
        assert_eq!(result, "ok");
        assert_eq!(
            *trace.lock().unwrap(),
            vec!["A-enter", "B-enter", "H", "B-exit", "A-exit"]
        );
    }

    #[tokio::test]
    async fn test_build_does_not_execute() {
        let trace: Trace = Arc::default();
        let calls = Arc::new(AtomicUsize::new(0));

        let pipeline = Pipeline::build(
            vec![tracer("A", &trace)],
            handler(&trace, &calls),
            CancellationToken::new(),
        );

        assert!(trace.lock().unwrap().is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        drop(pipeline);
    }

    #[tokio::test]
    async fn test_short_circuit_skips_inner_stages() {
        let trace: Trace = Arc::default();
        let calls = Arc::new(AtomicUsize::new(0));

        let pipeline = Pipeline::build(
            vec![
                tracer("A", &trace),
                Arc::new(ShortCircuit) as Arc<dyn PipelineBehavior<Echo>>,
                tracer("C", &trace),
            ],
            handler(&trace, &calls),
            CancellationToken::new(),
        );

        let result = pipeline.run(Echo("ignored".to_string())).await.unwrap();
        assert_eq!(result, "short");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(*trace.lock().unwrap(), vec!["A-enter", "A-exit"]);
    }

    #[tokio::test]
    async fn test_handler_only() {
        let trace: Trace = Arc::default();
        let calls = Arc::new(AtomicUsize::new(0));

        let pipeline = Pipeline::build(Vec::new(), handler(&trace, &calls), CancellationToken::new());
        assert_eq!(pipeline.stages(), 1);
        assert_eq!(pipeline.run(Echo("x".to_string())).await.unwrap(), "x");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cancelled_token_stops_before_handler() {
        let trace: Trace = Arc::default();
        let calls = Arc::new(AtomicUsize::new(0));
        let token = CancellationToken::new();
        token.cancel();

        let pipeline = Pipeline::build(vec![tracer("A", &trace)], handler(&trace, &calls), token);
        let error = pipeline.run(Echo("x".to_string())).await.unwrap_err();

        assert!(error.is_cancelled());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(*trace.lock().unwrap(), vec!["A-enter", "A-exit"]);
    }
}
