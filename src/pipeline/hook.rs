//! Observer hooks fired on block outputs.
//!
//! Hooks are purely observational: they see a block's output before any
//! downstream block does, and nothing they return flows back into the graph.
//! An error from a hook aborts the pass.

use crate::pipeline::id::NodeId;
use crate::pipeline::value::Value;

/// Observer of a block's output.
#[cfg_attr(test, mockall::automock)]
pub trait Hook: Send {
    fn observe(&mut self, output: &Value) -> anyhow::Result<()>;
}

impl<F> Hook for F
where
    F: FnMut(&Value) -> anyhow::Result<()> + Send,
{
    fn observe(&mut self, output: &Value) -> anyhow::Result<()> {
        self(output)
    }
}

/// Adapter for closures that cannot fail.
pub struct Observer<F>(F);

/// Wrap an infallible closure as a hook.
pub fn observer<F>(f: F) -> Observer<F>
where
    F: FnMut(&Value) + Send,
{
    Observer(f)
}

impl<F> Hook for Observer<F>
where
    F: FnMut(&Value) + Send,
{
    fn observe(&mut self, output: &Value) -> anyhow::Result<()> {
        (self.0)(output);
        Ok(())
    }
}

/// Emits every output it sees as a `tracing` debug event.
pub struct TraceHook {
    label: String,
    seen: u64,
}

impl TraceHook {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            seen: 0,
        }
    }

    pub fn seen(&self) -> u64 {
        self.seen
    }
}

impl Hook for TraceHook {
    fn observe(&mut self, output: &Value) -> anyhow::Result<()> {
        self.seen += 1;
        tracing::debug!(
            block = %self.label,
            pass = self.seen,
            kind = output.kind(),
            "block output: {:?}",
            output
        );
        Ok(())
    }
}

/// Per-block ordered hook lists, indexed by `NodeId`.
///
/// Populated by the compiler from each node's bindings; frozen afterwards.
#[derive(Default)]
pub struct HookRegistry {
    hooks: Vec<Vec<Box<dyn Hook>>>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind the hooks for the next node. Nodes must be registered in
    /// `NodeId` order.
    pub(crate) fn register(&mut self, node: NodeId, hooks: Vec<Box<dyn Hook>>) {
        debug_assert_eq!(node.index(), self.hooks.len());
        self.hooks.push(hooks);
    }

    /// Number of hooks bound to `node`.
    pub fn count(&self, node: NodeId) -> usize {
        self.hooks.get(node.index()).map(Vec::len).unwrap_or(0)
    }

    /// Total number of bound hooks.
    pub fn total(&self) -> usize {
        self.hooks.iter().map(Vec::len).sum()
    }

    /// Invoke every hook of `node` in registration order. Stops at the first
    /// failure, returning its position and error.
    pub fn fire(&mut self, node: NodeId, output: &Value) -> Result<(), (usize, anyhow::Error)> {
        let Some(hooks) = self.hooks.get_mut(node.index()) else {
            return Ok(());
        };
        for (index, hook) in hooks.iter_mut().enumerate() {
            hook.observe(output).map_err(|e| (index, e))?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookRegistry")
            .field("nodes", &self.hooks.len())
            .field("hooks", &self.total())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::Sequence;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_hooks_fire_in_registration_order() {
        let mut seq = Sequence::new();
        let mut first = MockHook::new();
        let mut second = MockHook::new();
        first
            .expect_observe()
            .withf(|v| *v == Value::Scalar(2.0))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        second
            .expect_observe()
            .withf(|v| *v == Value::Scalar(2.0))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));

        let mut registry = HookRegistry::new();
        registry.register(NodeId(0), vec![Box::new(first), Box::new(second)]);
        registry.fire(NodeId(0), &Value::Scalar(2.0)).unwrap();
    }

    #[test]
    fn test_failing_hook_stops_later_hooks() {
        let mut failing = MockHook::new();
        failing
            .expect_observe()
            .times(1)
            .returning(|_| Err(anyhow::anyhow!("display closed")));
        let mut never = MockHook::new();
        never.expect_observe().times(0);

        let mut registry = HookRegistry::new();
        registry.register(NodeId(0), vec![Box::new(failing), Box::new(never)]);
        let (index, err) = registry.fire(NodeId(0), &Value::Scalar(1.0)).unwrap_err();
        assert_eq!(index, 0);
        assert_eq!(err.to_string(), "display closed");
    }

    #[test]
    fn test_closure_hooks() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);

        let mut registry = HookRegistry::new();
        registry.register(NodeId(0), Vec::new());
        registry.register(
            NodeId(1),
            vec![Box::new(observer(move |v: &Value| {
                sink.lock().unwrap().push(v.clone());
            }))],
        );

        registry.fire(NodeId(0), &Value::Scalar(0.0)).unwrap();
        registry.fire(NodeId(1), &Value::Scalar(5.0)).unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![Value::Scalar(5.0)]);
        assert_eq!(registry.count(NodeId(0)), 0);
        assert_eq!(registry.count(NodeId(1)), 1);
        assert_eq!(registry.total(), 1);
    }

    #[test]
    fn test_trace_hook_counts() {
        let mut hook = TraceHook::new("win");
        hook.observe(&Value::Scalar(1.0)).unwrap();
        hook.observe(&Value::Scalar(2.0)).unwrap();
        assert_eq!(hook.seen(), 2);
    }
}
