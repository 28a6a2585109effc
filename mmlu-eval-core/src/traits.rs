use async_trait::async_trait;

use crate::domain::{Generation, GenerationRequest, SamplingParams};
use crate::error::Result;

#[async_trait]
pub trait MetricCalculator {
    type Input;
    type Output;

    async fn calculate(&self, input: Self::Input) -> Result<Self::Output>;
}

/// An inference-serving system that answers a batch of prompts.
///
/// Implementations must return exactly one [`Generation`] per request, in
/// request order, or fail the whole batch. Scheduling within the batch is up
/// to the backend; `parallel` is only an upper bound on requests in flight.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Identifier recorded in the result file.
    fn name(&self) -> &str;

    async fn run_batch(
        &self,
        requests: Vec<GenerationRequest>,
        params: &SamplingParams,
        parallel: usize,
    ) -> Result<Vec<Generation>>;
}
