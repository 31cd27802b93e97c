// Built-in pipeline behaviors

use crate::error::DispatchResult;
use crate::request::{Next, PipelineBehavior, Request};
use async_trait::async_trait;
use std::fmt::Debug;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Logging behavior
///
/// Tags each dispatch with a fresh id and logs entry, outcome and elapsed
/// time. The result passes through untouched.
#[derive(Debug, Clone, Default)]
pub struct LoggingBehavior {
    log_request: bool,
}

impl LoggingBehavior {
    pub fn new() -> Self {
        Self::default()
    }

    /// Include the request's `Debug` output in the entry log
    pub fn with_request(mut self, enable: bool) -> Self {
        self.log_request = enable;
        self
    }
}

/// Whole milliseconds, saturating at `u64::MAX`
fn elapsed_millis(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}

#[async_trait]
impl<R> PipelineBehavior<R> for LoggingBehavior
where
    R: Request + Debug,
{
    async fn handle(
        &self,
        request: R,
        _cancellation: CancellationToken,
        next: Next<R>,
    ) -> DispatchResult<R::Response> {
        let dispatch_id = Uuid::new_v4();
        let request_type = std::any::type_name::<R>();
        let start = Instant::now();

        if self.log_request {
            debug!(%dispatch_id, request_type, request = ?request, "Handling request");
        } else {
            debug!(%dispatch_id, request_type, "Handling request");
        }

        let result = next(request).await;
        let elapsed_ms = elapsed_millis(start.elapsed());

        match &result {
            Ok(_) => info!(%dispatch_id, request_type, elapsed_ms, "Request handled"),
            Err(error) => warn!(
                %dispatch_id,
                request_type,
                elapsed_ms,
                kind = error.kind(),
                error = %error,
                "Request failed"
            ),
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DispatchError;
    use crate::request::PipelineFuture;

    #[derive(Debug)]
    struct Lookup(u32);

    impl Request for Lookup {
        type Response = String;
    }

    fn next_ok() -> Next<Lookup> {
        Box::new(|request: Lookup| {
            Box::pin(async move { Ok(format!("item-{}", request.0)) }) as PipelineFuture<String>
        })
    }

    fn next_err() -> Next<Lookup> {
        Box::new(|_request: Lookup| {
            Box::pin(async { Err(DispatchError::invalid_argument("bad id")) }) as PipelineFuture<String>
        })
    }

    #[tokio::test]
    async fn test_passes_result_through() {
        let behavior = LoggingBehavior::new().with_request(true);
        let result = behavior
            .handle(Lookup(9), CancellationToken::new(), next_ok())
            .await
            .unwrap();
        assert_eq!(result, "item-9");
    }

    #[tokio::test]
    async fn test_passes_error_through() {
        let behavior = LoggingBehavior::new();
        let error = behavior
            .handle(Lookup(1), CancellationToken::new(), next_err())
            .await
            .unwrap_err();
        assert!(matches!(error, DispatchError::InvalidArgument(_)));
    }

    #[test]
    fn test_elapsed_millis_saturates() {
        assert_eq!(elapsed_millis(Duration::from_micros(2_500)), 2);
        assert_eq!(elapsed_millis(Duration::MAX), u64::MAX);
    }
}
