use std::sync::Arc;

use governor::DefaultDirectRateLimiter;
use tracing::{Instrument, debug_span, info_span};

use super::{CompletionError, CompletionModel, CompletionRequest, CompletionResponse};

/// Spaces requests to the wrapped model according to a shared limiter.
///
/// Clones share the limiter, so concurrent extraction tasks still respect
/// the provider quota as a whole.
#[derive(Clone)]
pub struct RateLimitedCompletionModel<M: CompletionModel> {
    model: M,
    limiter: Arc<DefaultDirectRateLimiter>,
}

impl<M> RateLimitedCompletionModel<M>
where
    M: CompletionModel,
{
    pub fn new(model: M, limiter: DefaultDirectRateLimiter) -> Self {
        Self {
            model,
            limiter: Arc::new(limiter),
        }
    }

    pub fn inner(&self) -> &M {
        &self.model
    }
}

impl<M: CompletionModel> CompletionModel for RateLimitedCompletionModel<M> {
    async fn completion(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, CompletionError> {
        self.limiter
            .until_ready()
            .instrument(debug_span!("limiter"))
            .await;
        self.model
            .completion(request)
            .instrument(info_span!("completion"))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MockCompletionModel;
    use governor::{Quota, RateLimiter};
    use std::time::{Duration, Instant};

    fn request() -> CompletionRequest {
        CompletionRequest {
            preamble: String::new(),
            prompt: "p".to_string(),
            temperature: 0.1,
            max_tokens: 10,
            json_mode: true,
        }
    }

    #[tokio::test]
    async fn test_requests_are_spaced() {
        let mock = MockCompletionModel::new();
        let quota = Quota::with_period(Duration::from_millis(200)).unwrap();
        let model = RateLimitedCompletionModel::new(mock.clone(), RateLimiter::direct(quota));

        let start = Instant::now();
        model.completion(request()).await.unwrap();
        model.completion(request()).await.unwrap();
        model.completion(request()).await.unwrap();

        assert!(start.elapsed() >= Duration::from_millis(350));
        assert_eq!(mock.requests().await.len(), 3);
    }
}
