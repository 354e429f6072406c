//! Thread boundary between a running graph and its display/storage
//! consumers.
//!
//! A `ChannelHook` sends every output it observes as a `Tap` over a bounded
//! crossbeam channel. Sends never block the pass: when the consumer falls
//! behind, taps are dropped and counted. The consumer side is a `TapBridge`.

use crate::pipeline::compiled_plan::Edge;
use crate::pipeline::executor::Graph;
use crate::pipeline::hook::Hook;
use crate::pipeline::id::NodeId;
use crate::pipeline::port::{Arity, InputShape};
use crate::pipeline::value::Value;
use chrono::{DateTime, Utc};
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Channel capacity for taps (graph → consumer).
/// 10,000 taps ≈ 10s at 1kHz for one tapped block.
pub const TAP_CHANNEL_CAPACITY: usize = 10_000;

/// Log one warning per this many dropped taps after the first.
const DROP_WARN_INTERVAL: u64 = 1_000;

/// A block output captured by a `ChannelHook`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tap {
    /// Label given to the hook, usually the block's path
    pub block: String,
    /// Per-hook sequence number, starting at 1
    pub pass: u64,
    pub captured_at: DateTime<Utc>,
    pub value: Value,
}

/// Hook forwarding outputs to a `TapBridge`.
pub struct ChannelHook {
    block: String,
    tx: Sender<Tap>,
    pass: u64,
    dropped: Arc<AtomicU64>,
}

impl ChannelHook {
    /// Taps dropped so far by every hook sharing this hook's bridge.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl Hook for ChannelHook {
    fn observe(&mut self, output: &Value) -> anyhow::Result<()> {
        self.pass += 1;
        let tap = Tap {
            block: self.block.clone(),
            pass: self.pass,
            captured_at: Utc::now(),
            value: output.clone(),
        };
        match self.tx.try_send(tap) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => {
                let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                if dropped == 1 || dropped % DROP_WARN_INTERVAL == 0 {
                    tracing::warn!(
                        "Tap consumer not keeping up: {} taps dropped (latest from {})",
                        dropped,
                        self.block
                    );
                }
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for ChannelHook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelHook")
            .field("block", &self.block)
            .field("pass", &self.pass)
            .finish()
    }
}

/// Consumer-side handle for taps.
pub struct TapBridge {
    tx: Sender<Tap>,
    pub tap_rx: Receiver<Tap>,
    dropped: Arc<AtomicU64>,
}

impl TapBridge {
    pub fn new() -> Self {
        Self::with_capacity(TAP_CHANNEL_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, tap_rx) = bounded(capacity);
        Self {
            tx,
            tap_rx,
            dropped: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Create a hook feeding this bridge. Bind it to a node before
    /// compiling.
    pub fn hook(&self, block: impl Into<String>) -> ChannelHook {
        ChannelHook {
            block: block.into(),
            tx: self.tx.clone(),
            pass: 0,
            dropped: Arc::clone(&self.dropped),
        }
    }

    /// Drain all pending taps.
    pub fn drain(&self) -> Vec<Tap> {
        let mut taps = Vec::new();
        while let Ok(tap) = self.tap_rx.try_recv() {
            taps.push(tap);
        }
        taps
    }

    /// Try to receive a single tap without blocking.
    pub fn try_recv(&self) -> Option<Tap> {
        self.tap_rx.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<Tap> {
        self.tap_rx.recv_timeout(timeout).ok()
    }

    /// Taps dropped because the channel was full.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl Default for TapBridge {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of a single block of a compiled graph.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeSnapshot {
    pub id: NodeId,
    pub name: String,
    pub path: String,
    /// Name reported by the block itself
    pub block: String,
    pub accepts: InputShape,
    pub produces: Arity,
    pub hooks: usize,
}

/// Complete topology snapshot of a compiled graph.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopologySnapshot {
    pub nodes: Vec<NodeSnapshot>,
    pub edges: Vec<Edge>,
    /// Block ids in the order a pass runs them
    pub order: Vec<NodeId>,
    pub input: InputShape,
    pub output: Arity,
    pub passes: u64,
}

impl TopologySnapshot {
    pub fn of(graph: &Graph) -> Self {
        let nodes = graph
            .nodes()
            .iter()
            .enumerate()
            .map(|(index, node)| {
                let id = NodeId(index as u32);
                NodeSnapshot {
                    id,
                    name: node.name().to_string(),
                    path: node.path().to_string(),
                    block: node.block().name().to_string(),
                    accepts: node.block().accepts(),
                    produces: node.block().produces(),
                    hooks: graph.hooks().count(id),
                }
            })
            .collect();

        let plan = graph.plan();
        Self {
            nodes,
            edges: plan.edges.clone(),
            order: plan.execution_order().collect(),
            input: plan.input_shape,
            output: plan.output_arity,
            passes: graph.passes(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::block::Node;
    use crate::pipeline::blocks::Callable;
    use crate::pipeline::compiled_plan::Endpoint;
    use crate::{parallel, series};

    #[test]
    fn test_taps_reach_consumer_in_order() {
        let bridge = TapBridge::new();
        let mut graph = Graph::compile(series![
            Node::new(Callable::map("inc", |x| x + 1.0)).with_hook(bridge.hook("inc")),
            Node::new(Callable::map("dbl", |x| x * 2.0)).with_hook(bridge.hook("dbl"))
        ])
        .unwrap();

        graph.run(1.0).unwrap();
        graph.run(2.0).unwrap();

        let taps = bridge.drain();
        let seen: Vec<(&str, u64, Value)> = taps
            .iter()
            .map(|t| (t.block.as_str(), t.pass, t.value.clone()))
            .collect();
        assert_eq!(
            seen,
            vec![
                ("inc", 1, Value::Scalar(2.0)),
                ("dbl", 1, Value::Scalar(4.0)),
                ("inc", 2, Value::Scalar(3.0)),
                ("dbl", 2, Value::Scalar(6.0)),
            ]
        );
        assert!(bridge.try_recv().is_none());
    }

    #[test]
    fn test_full_channel_drops_without_failing_pass() {
        let bridge = TapBridge::with_capacity(2);
        let mut graph =
            Graph::compile(Node::new(Callable::map("id", |x| x)).with_hook(bridge.hook("id")))
                .unwrap();

        for i in 0..5 {
            graph.run(i as f64).unwrap();
        }
        assert_eq!(bridge.dropped(), 3);
        assert_eq!(bridge.drain().len(), 2);

        graph.run(9.0).unwrap();
        assert_eq!(bridge.try_recv().map(|t| t.pass), Some(6));
    }

    #[test]
    fn test_topology_snapshot() {
        let mut graph = Graph::compile(series![
            Callable::map("a", |x| x),
            parallel![Callable::map("b", |x| x), Callable::map("c", |x| x)]
        ])
        .unwrap();
        graph.run(1.0).unwrap();

        let topology = graph.topology();
        assert_eq!(topology.nodes.len(), 3);
        assert_eq!(topology.nodes[2].path, "c");
        assert_eq!(topology.output, Arity::Tuple(2));
        assert_eq!(topology.passes, 1);
        assert_eq!(topology.order, vec![NodeId(0), NodeId(1), NodeId(2)]);
        assert!(topology.edges.contains(&Edge {
            from: Endpoint::Node(NodeId(2)),
            to: Endpoint::Output
        }));

        let json: serde_json::Value = serde_json::from_str(&topology.to_json().unwrap()).unwrap();
        assert_eq!(json["nodes"][0]["name"], "a");
        assert_eq!(json["edges"][0]["from"], "input");
    }
}
