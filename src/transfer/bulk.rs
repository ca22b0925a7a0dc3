use std::sync::Arc;

use tokio::{
    sync::{Mutex, mpsc},
    task::JoinSet,
};
use tracing::{debug, error};

use crate::context::Context;

use super::{TransferRequest, TransferResult, engine::TransferEngine};

pub const DEFAULT_WORKERS: usize = 3;

/// Fans a batch of transfers out to a fixed pool of workers and collects
/// one [`TransferResult`] per request, in completion order.
pub struct BulkTransferPipeline {
    engine: Arc<TransferEngine>,
    workers: usize,
}

impl BulkTransferPipeline {
    pub fn new(engine: Arc<TransferEngine>) -> Self {
        Self::with_workers(engine, DEFAULT_WORKERS)
    }

    pub fn with_workers(engine: Arc<TransferEngine>, workers: usize) -> Self {
        Self {
            engine,
            workers: workers.max(1),
        }
    }

    pub fn engine(&self) -> &Arc<TransferEngine> {
        &self.engine
    }

    /// No more workers than there are requests to hand out.
    fn pool_size(&self, batch_size: usize) -> usize {
        self.workers.min(batch_size).max(1)
    }

    pub async fn bulk_transfer(
        &self,
        ctx: &Context,
        requests: Vec<TransferRequest>,
    ) -> Vec<TransferResult> {
        if requests.is_empty() {
            return Vec::new();
        }
        let batch_size = requests.len();

        // both queues hold the whole batch, so neither side ever waits on the other
        let (job_tx, job_rx) = mpsc::channel::<TransferRequest>(batch_size);
        let (result_tx, mut result_rx) = mpsc::channel::<TransferResult>(batch_size);
        let job_rx = Arc::new(Mutex::new(job_rx));

        let mut workers = JoinSet::new();
        for worker_id in 0..self.pool_size(batch_size) {
            let engine = Arc::clone(&self.engine);
            let jobs = Arc::clone(&job_rx);
            let results = result_tx.clone();
            let ctx = ctx.clone();
            workers.spawn(async move {
                let mut handled = 0usize;
                loop {
                    let next = jobs.lock().await.recv().await;
                    let Some(request) = next else {
                        break;
                    };
                    let outcome = engine
                        .transfer(
                            &ctx,
                            &request.from_account_id,
                            &request.to_account_id,
                            request.amount,
                        )
                        .await;
                    handled += 1;
                    let result = TransferResult {
                        request_id: request.request_id,
                        outcome,
                    };
                    if results.send(result).await.is_err() {
                        break;
                    }
                }
                debug!(worker_id, handled, "Bulk worker drained");
            });
        }
        drop(result_tx);

        for request in requests {
            if job_tx.send(request).await.is_err() {
                error!("All bulk workers exited before the batch was queued");
                break;
            }
        }
        drop(job_tx);

        while let Some(joined) = workers.join_next().await {
            if let Err(err) = joined {
                error!(error = %err, "Bulk worker failed");
            }
        }

        let mut collected = Vec::with_capacity(batch_size);
        while let Some(result) = result_rx.recv().await {
            collected.push(result);
        }
        debug!(
            requests = batch_size,
            succeeded = collected.iter().filter(|r| r.success()).count(),
            "Bulk transfer finished"
        );
        collected
    }
}
