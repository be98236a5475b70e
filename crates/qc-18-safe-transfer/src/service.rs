//! # Safe Transfer Service
//!
//! Runs operation batches submitted over the Event Bus, each batch inside one
//! unit of work on the host ledger.
//!
//! ## Architecture Compliance
//!
//! - Subscribes to `TransferBatchRequest` from the configured senders
//! - Publishes results via Event Bus
//! - NO direct subsystem-to-subsystem calls
//!
//! ## Security
//!
//! - Validates `sender_id` from envelope against `ServiceConfig::authorized_senders`
//! - All identity from the envelope's `sender_id` only

use crate::adapters::InMemoryLedger;
use crate::config::ServiceConfig;
use crate::domain::entities::OperationKind;
use crate::domain::value_objects::U256;
use crate::errors::{IpcError, TransferError};
use crate::events::{topics, TransferBatchRequestPayload, TransferBatchResponsePayload};
use crate::ports::inbound::{OperationResult, SafeTransferApi, TransferBatchExecutor};
use crate::ports::outbound::{run_in_unit_of_work, LedgerHost, UnitOfWork, UnitOfWorkError};
use crate::transfer::SafeTransfer;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Statistics for the Safe Transfer Service.
#[derive(Debug, Default, Clone)]
pub struct ServiceStats {
    /// Batches that reached the unit of work.
    pub batches_executed: u64,
    /// Batches committed.
    pub batches_committed: u64,
    /// Batches rolled back.
    pub batches_aborted: u64,
    /// Operations in committed batches.
    pub operations_executed: u64,
    /// Average batch execution time in microseconds.
    pub avg_batch_time_us: u64,
    /// Rejected requests (unauthorized sender, invalid batch).
    pub rejected_requests: u64,
}

/// The main Safe Transfer Service.
///
/// This service:
/// 1. Receives batch requests from the Event Bus
/// 2. Runs each batch as one unit of work on the host
/// 3. Publishes results back to the Event Bus
/// 4. Maintains batch statistics
pub struct SafeTransferService<H> {
    /// Service configuration.
    config: ServiceConfig,
    /// Host ledger. Batches run one at a time.
    host: Arc<RwLock<H>>,
    /// Service statistics.
    stats: Arc<RwLock<ServiceStats>>,
}

impl<H: LedgerHost + UnitOfWork + Send + Sync> SafeTransferService<H> {
    /// Create a new Safe Transfer Service.
    pub fn new(host: H, config: ServiceConfig) -> Self {
        Self {
            config,
            host: Arc::new(RwLock::new(host)),
            stats: Arc::new(RwLock::new(ServiceStats::default())),
        }
    }

    /// Service configuration.
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Shared handle to the host ledger.
    pub fn host(&self) -> Arc<RwLock<H>> {
        Arc::clone(&self.host)
    }

    /// Get current service statistics.
    pub async fn stats(&self) -> ServiceStats {
        self.stats.read().await.clone()
    }

    /// Handle a batch request from the Event Bus.
    ///
    /// An operation failure is not an IPC error: the batch is rolled back and
    /// the response carries the failing index and error kind.
    ///
    /// # Errors
    ///
    /// * `IpcError::UnauthorizedSender` - `sender_id` not in the allowed list
    /// * `IpcError::ValidationFailed` - Empty or oversize batch
    /// * `IpcError::Ledger` - The host refused the unit of work
    #[instrument(skip(self, payload), fields(correlation_id = %correlation_id))]
    pub async fn handle_transfer_batch(
        &self,
        sender_id: u8,
        correlation_id: Uuid,
        payload: TransferBatchRequestPayload,
    ) -> Result<TransferBatchResponsePayload, IpcError> {
        // Security: Validate sender
        if !self.config.is_authorized_sender(sender_id) {
            warn!(sender_id = sender_id, "Unauthorized sender for TransferBatchRequest");
            self.stats.write().await.rejected_requests += 1;
            return Err(IpcError::UnauthorizedSender {
                sender_id,
                allowed: self.config.authorized_senders.clone(),
            });
        }

        if let Err(e) = self.validate(&payload) {
            warn!(error = %e, "Rejected TransferBatchRequest");
            self.stats.write().await.rejected_requests += 1;
            return Err(e);
        }

        info!(
            topic = topics::TRANSFER_BATCH_REQUEST,
            this = ?payload.this,
            caller = ?payload.caller,
            operations = payload.operations.len(),
            "Processing transfer batch"
        );

        let start = Instant::now();
        let outcome = {
            let mut host = self.host.write().await;
            self.run_batch(&mut *host, &payload)
        };
        let elapsed_us = u64::try_from(start.elapsed().as_micros()).unwrap_or(u64::MAX);

        let response = match outcome {
            Ok(results) => {
                debug!(
                    topic = topics::TRANSFER_BATCH_RESPONSE,
                    results = results.len(),
                    "Transfer batch committed"
                );
                TransferBatchResponsePayload::committed(results)
            }
            Err(UnitOfWorkError::Aborted((index, e))) => {
                warn!(
                    topic = topics::TRANSFER_BATCH_RESPONSE,
                    index,
                    error = %e,
                    kind = e.kind(),
                    "Transfer batch aborted"
                );
                TransferBatchResponsePayload::aborted(index, e.kind(), e.to_string())
            }
            Err(UnitOfWorkError::Ledger(e)) => {
                warn!(error = %e, "Unit of work refused");
                return Err(IpcError::Ledger(e));
            }
        };

        // Update statistics
        {
            let mut stats = self.stats.write().await;
            stats.batches_executed += 1;
            if response.success {
                stats.batches_committed += 1;
                stats.operations_executed += response.results.len() as u64;
            } else {
                stats.batches_aborted += 1;
            }
            let total = stats.batches_executed;
            stats.avg_batch_time_us = (stats.avg_batch_time_us * (total - 1) + elapsed_us) / total;
        }

        Ok(response)
    }

    fn validate(&self, payload: &TransferBatchRequestPayload) -> Result<(), IpcError> {
        if payload.operations.is_empty() {
            return Err(IpcError::ValidationFailed("empty batch".to_string()));
        }
        if payload.operations.len() > self.config.max_operations_per_batch {
            return Err(IpcError::ValidationFailed(format!(
                "batch of {} operations exceeds limit {}",
                payload.operations.len(),
                self.config.max_operations_per_batch
            )));
        }
        Ok(())
    }

    /// Runs every operation in order inside one unit of work.
    ///
    /// The attached value funds at most one native pull. A later native pull
    /// in the same batch sees nothing attached and aborts the batch.
    fn run_batch(
        &self,
        host: &mut H,
        payload: &TransferBatchRequestPayload,
    ) -> Result<Vec<OperationResult>, UnitOfWorkError<(usize, TransferError)>> {
        let transfer_config = self.config.transfer;
        run_in_unit_of_work(host, payload.frame(), |host| {
            let mut transfers = SafeTransfer::new(host, transfer_config);
            let mut results = Vec::with_capacity(payload.operations.len());
            let mut value_spent = false;
            for (index, operation) in payload.operations.iter().enumerate() {
                let native_pull = operation.native_pull();
                if let Some(amount) = native_pull {
                    if value_spent {
                        warn!(index, expected = %amount, "Attached native value already spent");
                        return Err((
                            index,
                            TransferError::InvalidNativeTransferAmount {
                                expected: amount,
                                attached: U256::zero(),
                            },
                        ));
                    }
                }
                let result = transfers
                    .apply(operation)
                    .map_err(|e| (index, e))?;
                value_spent |= native_pull.is_some();
                if result.kind == OperationKind::TransferAll {
                    debug!(index, moved = %result.value, "transfer_all completed");
                }
                results.push(result);
            }
            Ok(results)
        })
    }
}

/// Create a default service with an in-memory ledger (for testing).
#[must_use]
pub fn create_test_service() -> SafeTransferService<InMemoryLedger> {
    SafeTransferService::new(InMemoryLedger::new(), ServiceConfig::default())
}

// =============================================================================
// TransferBatchExecutor Implementation
// =============================================================================

#[async_trait]
impl<H: LedgerHost + UnitOfWork + Send + Sync> TransferBatchExecutor for SafeTransferService<H> {
    async fn execute_batch(
        &self,
        sender_id: u8,
        correlation_id: Uuid,
        request: TransferBatchRequestPayload,
    ) -> Result<TransferBatchResponsePayload, IpcError> {
        self.handle_transfer_batch(sender_id, correlation_id, request)
            .await
    }
}

// =============================================================================
// TESTS
// =============================================================================
