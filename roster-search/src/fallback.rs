//! Lookup chains: the fallback order as data.
//!
//! An id is looked up by trying an ordered list of partitions, first success
//! wins: its routed partition (if any), then every other partition in scan
//! order. The chain is built once and evaluated with [`LookupChain::first_match`],
//! so the order can be tested without touching a store.

use std::future::Future;
use std::sync::Arc;

use roster_core::{KeyRouter, StoreResult};
use roster_storage::{loadable_partitions, PartitionRegistry};
use tracing::warn;

/// One attempt in a lookup chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupStep {
    /// The partition the router picked.
    Targeted(String),
    /// A partition tried during the exhaustive scan.
    Scan(String),
}

impl LookupStep {
    pub fn partition(&self) -> &str {
        match self {
            Self::Targeted(p) | Self::Scan(p) => p,
        }
    }

    pub fn is_scan(&self) -> bool {
        matches!(self, Self::Scan(_))
    }
}

/// Result of evaluating a chain.
#[derive(Debug, Clone, PartialEq)]
pub enum ChainOutcome<T> {
    /// A step matched.
    Found { value: T, step: LookupStep },
    /// Every step answered and none matched.
    NotFound,
    /// No step matched and at least one could not be read, so absence is
    /// not proven. Holds `(partition, reason)` per failed step.
    Failed { errors: Vec<(String, String)> },
}

/// Ordered partitions to try for one identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LookupChain {
    steps: Vec<LookupStep>,
}

impl LookupChain {
    /// Routed partition first, then the rest of `scan_order`.
    pub fn for_identifier(id: &str, router: &KeyRouter, scan_order: &[String]) -> Self {
        let target = router.target_partition(id);
        let mut steps = Vec::with_capacity(scan_order.len() + 1);
        if let Some(partition) = target {
            steps.push(LookupStep::Targeted(partition.to_string()));
        }
        steps.extend(
            scan_order
                .iter()
                .filter(|p| Some(p.as_str()) != target)
                .map(|p| LookupStep::Scan(p.clone())),
        );
        Self { steps }
    }

    /// Only the scan steps, for ids whose targeted step already ran.
    pub fn scan_only(&self) -> Self {
        Self {
            steps: self.steps.iter().filter(|s| s.is_scan()).cloned().collect(),
        }
    }

    pub fn steps(&self) -> &[LookupStep] {
        &self.steps
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Whether the chain tries `partition`.
    pub fn covers(&self, partition: &str) -> bool {
        self.steps.iter().any(|s| s.partition() == partition)
    }

    /// Run `probe` on each step in order until one yields a value.
    ///
    /// A failing step does not stop the chain.
    pub async fn first_match<T, F, Fut>(&self, mut probe: F) -> ChainOutcome<T>
    where
        F: FnMut(&LookupStep) -> Fut,
        Fut: Future<Output = StoreResult<Option<T>>>,
    {
        let mut errors = Vec::new();
        for step in &self.steps {
            match probe(step).await {
                Ok(Some(value)) => {
                    return ChainOutcome::Found {
                        value,
                        step: step.clone(),
                    }
                }
                Ok(None) => {}
                Err(err) => errors.push((step.partition().to_string(), err.to_string())),
            }
        }
        if errors.is_empty() {
            ChainOutcome::NotFound
        } else {
            ChainOutcome::Failed { errors }
        }
    }
}

/// Partitions in scan order: the registry's data-holding partitions, or the
/// section table's partitions if the registry cannot be read.
pub async fn scan_order(registry: &Arc<dyn PartitionRegistry>, router: &KeyRouter) -> Vec<String> {
    match registry.list_partitions().await {
        Ok(partitions) => loadable_partitions(&partitions),
        Err(err) => {
            warn!(error = %err, "Registry unavailable, scanning section table partitions");
            router.partitions().into_iter().map(str::to_string).collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roster_core::StoreError;

    fn order() -> Vec<String> {
        ["students_it_1", "students_cse_1", "students_ece_1"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    #[test]
    fn test_routed_id_targets_first_and_skips_target_in_scan() {
        let chain = LookupChain::for_identifier("22015112001", KeyRouter::standard(), &order());
        assert_eq!(
            chain.steps(),
            &[
                LookupStep::Targeted("students_cse_1".to_string()),
                LookupStep::Scan("students_it_1".to_string()),
                LookupStep::Scan("students_ece_1".to_string()),
            ]
        );
        assert_eq!(chain.scan_only().steps().len(), 2);
        assert!(!chain.scan_only().covers("students_cse_1"));
    }

    #[test]
    fn test_unroutable_id_scans_everything() {
        let chain = LookupChain::for_identifier("invalid123", KeyRouter::standard(), &order());
        assert_eq!(chain.steps().len(), 3);
        assert!(chain.steps().iter().all(LookupStep::is_scan));
        assert_eq!(chain.steps()[0].partition(), "students_it_1");
    }

    #[tokio::test]
    async fn test_first_match_short_circuits() {
        let chain = LookupChain::for_identifier("invalid123", KeyRouter::standard(), &order());
        let mut tried = Vec::new();
        let outcome = chain
            .first_match(|step| {
                tried.push(step.partition().to_string());
                let hit = step.partition() == "students_cse_1";
                async move { Ok(hit.then_some(7)) }
            })
            .await;
        assert_eq!(
            outcome,
            ChainOutcome::Found {
                value: 7,
                step: LookupStep::Scan("students_cse_1".to_string())
            }
        );
        assert_eq!(tried, vec!["students_it_1", "students_cse_1"]);
    }

    #[tokio::test]
    async fn test_failed_step_is_not_proof_of_absence() {
        let chain = LookupChain::for_identifier("invalid123", KeyRouter::standard(), &order());
        let outcome: ChainOutcome<u8> = chain
            .first_match(|step| {
                let partition = step.partition().to_string();
                async move {
                    if partition == "students_ece_1" {
                        Err(StoreError::Unavailable {
                            partition,
                            reason: "timeout".to_string(),
                        })
                    } else {
                        Ok(None)
                    }
                }
            })
            .await;
        assert!(matches!(outcome, ChainOutcome::Failed { ref errors } if errors.len() == 1));

        let empty: ChainOutcome<u8> = LookupChain::default()
            .first_match(|_| async { Ok(None) })
            .await;
        assert_eq!(empty, ChainOutcome::NotFound);
    }
}
