//! Per-client observability context
//!
//! Every client instance owns one of these: a tracing span that scopes its
//! log lines and a call counter for chain RPC traffic. Clones share the
//! same counter.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::Span;

#[derive(Clone, Debug)]
pub struct Observability {
    span: Span,
    rpc_calls: Arc<AtomicU64>,
}

impl Observability {
    pub fn new(client_name: &str) -> Self {
        Self {
            span: tracing::info_span!("gasless", client = %client_name),
            rpc_calls: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    /// Count one RPC attempt and return the running total.
    pub fn record_rpc_call(&self) -> u64 {
        self.rpc_calls.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn rpc_calls(&self) -> u64 {
        self.rpc_calls.load(Ordering::Relaxed)
    }
}

impl Default for Observability {
    fn default() -> Self {
        Self::new("default")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_is_shared_between_clones() {
        let obs = Observability::new("test");
        let clone = obs.clone();

        obs.record_rpc_call();
        clone.record_rpc_call();

        assert_eq!(obs.rpc_calls(), 2);
    }

    #[test]
    fn test_separate_instances_do_not_share_state() {
        let a = Observability::new("a");
        let b = Observability::new("b");
        a.record_rpc_call();
        assert_eq!(b.rpc_calls(), 0);
    }
}
