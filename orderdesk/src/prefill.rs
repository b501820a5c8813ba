use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tokio::sync::mpsc;

use crate::error::DeskError;
use crate::types::Side;

/// A price-level selection travelling from the book display to the form.
/// `sequence` is the change signal; equal payloads still get a new number.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrefillEvent {
    pub side: Side,
    pub price: f64,
    pub sequence: u64,
}

/// What the form does after adopting a prefill
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PrefillPolicy {
    /// Adopt side and price only
    #[default]
    PrefillOnly,
    /// Adopt side and price, re-establish a quantity/notional basis, then submit
    PrefillAndSubmit,
}

impl fmt::Display for PrefillPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrefillPolicy::PrefillOnly => f.write_str("prefill-only"),
            PrefillPolicy::PrefillAndSubmit => f.write_str("prefill-and-submit"),
        }
    }
}

impl FromStr for PrefillPolicy {
    type Err = DeskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "prefill-only" => Ok(PrefillPolicy::PrefillOnly),
            "prefill-and-submit" => Ok(PrefillPolicy::PrefillAndSubmit),
            other => Err(DeskError::Config(format!(
                "unknown prefill policy '{other}' (expected prefill-only or prefill-and-submit)"
            ))),
        }
    }
}

/// Sending half of the prefill channel, owned by the book display side
pub struct PrefillBridge {
    last_sequence: u64,
    tx: mpsc::UnboundedSender<PrefillEvent>,
}

/// Creates a bridge and the receiver the order form listens on
pub fn channel() -> (PrefillBridge, mpsc::UnboundedReceiver<PrefillEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        PrefillBridge {
            last_sequence: 0,
            tx,
        },
        rx,
    )
}

impl PrefillBridge {
    /// Converts a click on a displayed level into a prefill event and sends it
    pub fn select_level(&mut self, side: Side, price: f64) -> PrefillEvent {
        self.last_sequence += 1;
        let event = PrefillEvent {
            side,
            price,
            sequence: self.last_sequence,
        };

        if self.tx.send(event).is_err() {
            tracing::debug!(sequence = event.sequence, "Prefill receiver gone, event dropped");
        }

        event
    }

    pub fn last_sequence(&self) -> u64 {
        self.last_sequence
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_clicks_get_increasing_sequence() {
        let (mut bridge, mut rx) = channel();

        let first = bridge.select_level(Side::Buy, 100.0);
        let second = bridge.select_level(Side::Buy, 100.0);

        assert!(second.sequence > first.sequence);
        assert_eq!(rx.try_recv().unwrap(), first);
        assert_eq!(rx.try_recv().unwrap(), second);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_sequence_starts_at_one() {
        let (mut bridge, _rx) = channel();
        assert_eq!(bridge.last_sequence(), 0);
        assert_eq!(bridge.select_level(Side::Sell, 42.0).sequence, 1);
        assert_eq!(bridge.last_sequence(), 1);
    }

    #[test]
    fn test_select_without_receiver_still_numbers_events() {
        let (mut bridge, rx) = channel();
        drop(rx);

        assert_eq!(bridge.select_level(Side::Buy, 1.0).sequence, 1);
        assert_eq!(bridge.select_level(Side::Buy, 1.0).sequence, 2);
    }

    #[test]
    fn test_policy_parsing() {
        assert_eq!("prefill-only".parse::<PrefillPolicy>().unwrap(), PrefillPolicy::PrefillOnly);
        assert_eq!(
            " prefill-and-submit ".parse::<PrefillPolicy>().unwrap(),
            PrefillPolicy::PrefillAndSubmit
        );
        assert!(matches!("auto".parse::<PrefillPolicy>(), Err(DeskError::Config(_))));
        assert_eq!(PrefillPolicy::PrefillAndSubmit.to_string(), "prefill-and-submit");
    }
}
