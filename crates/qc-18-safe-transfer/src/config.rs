//! Safe transfer configuration from defaults or environment variables.

use crate::domain::invariants::limits;
use crate::events::subsystem_ids;
use std::env;

/// Configuration of the transfer operations themselves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransferConfig {
    /// Gas forwarded with native sends (None forwards all remaining gas).
    pub native_transfer_gas: Option<u64>,
}

impl TransferConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `QC_SAFE_TRANSFER_NATIVE_GAS`: Gas forwarded with native sends
    ///   (default: all remaining gas)
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            native_transfer_gas: env::var("QC_SAFE_TRANSFER_NATIVE_GAS")
                .ok()
                .and_then(|v| v.parse().ok()),
        }
    }

    /// Returns the configuration with a fixed native forwarding gas.
    #[must_use]
    pub fn with_native_transfer_gas(mut self, gas: u64) -> Self {
        self.native_transfer_gas = Some(gas);
        self
    }
}

/// Batch service configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Transfer configuration used for every batch.
    pub transfer: TransferConfig,
    /// Subsystems allowed to submit batches.
    pub authorized_senders: Vec<u8>,
    /// Maximum operations per batch.
    pub max_operations_per_batch: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            transfer: TransferConfig::default(),
            authorized_senders: vec![subsystem_ids::SMART_CONTRACTS, subsystem_ids::CROSS_CHAIN],
            max_operations_per_batch: limits::DEFAULT_MAX_OPERATIONS_PER_BATCH,
        }
    }
}

impl ServiceConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `QC_SAFE_TRANSFER_NATIVE_GAS`: see [`TransferConfig::from_env`]
    /// - `QC_SAFE_TRANSFER_MAX_BATCH`: Maximum operations per batch (default: 64)
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            transfer: TransferConfig::from_env(),
            max_operations_per_batch: env::var("QC_SAFE_TRANSFER_MAX_BATCH")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|&max: &usize| max > 0)
                .unwrap_or(defaults.max_operations_per_batch),
            ..defaults
        }
    }

    /// Returns true if `sender_id` may submit batches.
    #[must_use]
    pub fn is_authorized_sender(&self, sender_id: u8) -> bool {
        self.authorized_senders.contains(&sender_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_transfer_config_forwards_all_gas() {
        assert_eq!(TransferConfig::default().native_transfer_gas, None);
        assert_eq!(
            TransferConfig::default()
                .with_native_transfer_gas(2300)
                .native_transfer_gas,
            Some(2300)
        );
    }

    #[test]
    fn test_default_service_config() {
        let config = ServiceConfig::default();
        assert_eq!(config.max_operations_per_batch, 64);
        assert!(config.is_authorized_sender(11));
        assert!(config.is_authorized_sender(15));
        assert!(!config.is_authorized_sender(8));
    }
}
