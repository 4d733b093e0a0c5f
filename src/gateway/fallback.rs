//! Sequence number selection for `activate-fallback`.
//!
//! With no explicit sequence number the operator's requests are scanned
//! newest first. The first unfulfilled one the contract reports as
//! fallback-eligible is chosen. Whatever the source, the target is checked
//! again with `canActivateFallback` right before the write is signed.

use alloy::primitives::Address;

use crate::blockchain::contracts::IChestOpening;
use crate::gateway::{Gateway, RelayError, RelayResult};

impl Gateway {
    pub(super) async fn fallback_allowed(&self, sequence_number: u64) -> RelayResult<bool> {
        self.view(
            self.contracts.chest,
            IChestOpening::canActivateFallbackCall {
                sequenceNumber: sequence_number,
            },
        )
        .await
    }

    /// Newest unfulfilled request of `owner` that passes `canActivateFallback`.
    pub(super) async fn discover_fallback_target(&self, owner: Address) -> RelayResult<u64> {
        let requests = self
            .view(self.contracts.chest, IChestOpening::getUserChestRequestsCall { user: owner })
            .await?;

        for sequence_number in unfulfilled_newest_first(&requests.sequenceNumbers, &requests.fulfilled) {
            if self.fallback_allowed(sequence_number).await? {
                tracing::info!(sequence_number, "Found fallback-eligible request");
                return Ok(sequence_number);
            }
            tracing::debug!(sequence_number, "Request not eligible for fallback");
        }

        Err(RelayError::NoEligibleRequest(owner))
    }

    /// Resolve the target, then confirm it is still eligible.
    pub(super) async fn fallback_target(&self, requested: Option<u64>, owner: Address) -> RelayResult<u64> {
        let target = match requested {
            Some(sequence_number) => sequence_number,
            None => self.discover_fallback_target(owner).await?,
        };

        if !self.fallback_allowed(target).await? {
            return Err(RelayError::FallbackNotEligible(target));
        }
        Ok(target)
    }
}

/// Candidate sequence numbers in scan order. Entries past the shorter of the
/// two arrays are ignored.
fn unfulfilled_newest_first(sequence_numbers: &[u64], fulfilled: &[bool]) -> Vec<u64> {
    sequence_numbers
        .iter()
        .zip(fulfilled)
        .rev()
        .filter(|(_, done)| !**done)
        .map(|(sequence_number, _)| *sequence_number)
        .collect()
}
