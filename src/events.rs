// Telemetry events consumed by off-chain indexers. Advisory only: nothing
// here carries authority over balances.

use crate::bridge::types::{CanonicalTransferRecord, TrackingRecord};
use crate::data_structures::{AccountId, AssetId, CorrelationId, TransactionId};
use ethers::types::U256;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum BridgeEvent {
    // Custody confirmed on the source chain and handed to the external protocol.
    BridgeStarted {
        correlation_id: CorrelationId,
        record: TrackingRecord,
        timestamp: i64,
    },
    // Links our correlation id to the external protocol's own transaction id.
    ProtocolLinked {
        correlation_id: CorrelationId,
        protocol_tx_id: TransactionId,
        transfer: CanonicalTransferRecord,
        timestamp: i64,
    },
    // Funds delivered (possibly zero, see swap_and_complete_bridge) on the
    // destination chain.
    BridgeCompleted {
        correlation_id: CorrelationId,
        asset: AssetId,
        receiver: AccountId,
        amount: U256,
        timestamp: i64,
    },
}

impl BridgeEvent {
    pub fn name(&self) -> &'static str {
        match self {
            BridgeEvent::BridgeStarted { .. } => "BridgeStarted",
            BridgeEvent::ProtocolLinked { .. } => "ProtocolLinked",
            BridgeEvent::BridgeCompleted { .. } => "BridgeCompleted",
        }
    }

    pub fn correlation_id(&self) -> &CorrelationId {
        match self {
            BridgeEvent::BridgeStarted { correlation_id, .. } => correlation_id,
            BridgeEvent::ProtocolLinked { correlation_id, .. } => correlation_id,
            BridgeEvent::BridgeCompleted { correlation_id, .. } => correlation_id,
        }
    }
}

/// Destination for emitted events. Implementations must not fail the
/// bridging call: emission is fire-and-forget.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: BridgeEvent);
}

/// Forwards events over a tokio channel, e.g. to an indexer task.
pub struct ChannelEventSink {
    tx: mpsc::UnboundedSender<BridgeEvent>,
}

impl ChannelEventSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<BridgeEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (ChannelEventSink { tx }, rx)
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: BridgeEvent) {
        log::debug!(
            "emitting {} for correlation {}",
            event.name(),
            hex::encode(event.correlation_id())
        );
        // Receiver may have been dropped (indexer shut down); the bridge
        // call must not fail because of that.
        let _ = self.tx.send(event);
    }
}

/// Discards all events. Useful for tests that only check balances.
pub struct NullEventSink;

impl EventSink for NullEventSink {
    fn emit(&self, _event: BridgeEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_sink_delivers_events() {
        let (sink, mut rx) = ChannelEventSink::new();
        let event = BridgeEvent::BridgeCompleted {
            correlation_id: [7u8; 32],
            asset: AssetId::native(1, "ETH"),
            receiver: AccountId::new(1, "0xreceiver"),
            amount: U256::from(42),
            timestamp: 1_700_000_000,
        };
        sink.emit(event.clone());

        let received = rx.try_recv().expect("event should be queued");
        assert_eq!(received, event);
        assert_eq!(received.name(), "BridgeCompleted");
        assert_eq!(received.correlation_id(), &[7u8; 32]);
    }

    #[test]
    fn channel_sink_survives_dropped_receiver() {
        let (sink, rx) = ChannelEventSink::new();
        drop(rx);
        sink.emit(BridgeEvent::BridgeCompleted {
            correlation_id: [1u8; 32],
            asset: AssetId::native(1, "ETH"),
            receiver: AccountId::new(1, "0xreceiver"),
            amount: U256::zero(),
            timestamp: 0,
        });
        // No panic: emission is fire-and-forget.
    }

    #[test]
    fn events_serialize_for_indexers() {
        let event = BridgeEvent::BridgeCompleted {
            correlation_id: [0u8; 32],
            asset: AssetId::token(10, "USDC", "0xusdc"),
            receiver: AccountId::new(10, "0xreceiver"),
            amount: U256::from(1000),
            timestamp: 1_700_000_000,
        };
        let json = serde_json::to_string(&event).expect("serializable");
        assert!(json.contains("BridgeCompleted"));
        assert!(json.contains("USDC"));
    }
}
