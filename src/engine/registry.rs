use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use log::debug;
use crate::engine::models::ProbeKind;
use crate::shared::error::RegistryError;
use crate::shared::traits::Probe;

/// How a probe's execution budget is chosen: explicit override by name,
/// then the budget the probe declares, then the default.
#[derive(Debug, Clone)]
pub struct TimeoutPolicy {
    pub default: Duration,
    pub overrides: HashMap<String, Duration>,
}

impl TimeoutPolicy {
    pub fn uniform(default: Duration) -> Self {
        Self {
            default,
            overrides: HashMap::new(),
        }
    }

    pub fn resolve(&self, probe: &dyn Probe) -> Duration {
        self.overrides
            .get(probe.name())
            .copied()
            .or_else(|| probe.timeout())
            .unwrap_or(self.default)
    }
}

#[derive(Clone)]
pub struct RegisteredProbe {
    pub probe: Arc<dyn Probe>,
    pub timeout: Duration,
}

impl RegisteredProbe {
    pub fn name(&self) -> &str {
        self.probe.name()
    }

    pub fn kind(&self) -> ProbeKind {
        self.probe.kind()
    }
}

/// Ordered set of probes for one run configuration. Built once, then only read.
pub struct ProbeRegistry {
    timeouts: TimeoutPolicy,
    probes: Vec<RegisteredProbe>,
}

impl ProbeRegistry {
    pub fn new(timeouts: TimeoutPolicy) -> Self {
        Self {
            timeouts,
            probes: Vec::new(),
        }
    }

    pub fn register(&mut self, probe: Arc<dyn Probe>) -> Result<(), RegistryError> {
        if self.probes.iter().any(|p| p.name() == probe.name()) {
            return Err(RegistryError::DuplicateName(probe.name().to_string()));
        }

        let timeout = self.timeouts.resolve(probe.as_ref());
        debug!(
            "Registered probe '{}' ({:?}, timeout {:?})",
            probe.name(),
            probe.kind(),
            timeout
        );
        self.probes.push(RegisteredProbe { probe, timeout });
        Ok(())
    }

    pub fn register_all<I>(&mut self, probes: I) -> Result<(), RegistryError>
    where
        I: IntoIterator<Item = Arc<dyn Probe>>,
    {
        probes.into_iter().try_for_each(|p| self.register(p))
    }

    pub fn concurrent_set(&self) -> impl Iterator<Item = &RegisteredProbe> {
        self.probes
            .iter()
            .filter(|p| p.kind() == ProbeKind::Concurrent)
    }

    pub fn sequential_set(&self) -> impl Iterator<Item = &RegisteredProbe> {
        self.probes
            .iter()
            .filter(|p| p.kind() == ProbeKind::Sequential)
    }

    pub fn probes(&self) -> &[RegisteredProbe] {
        &self.probes
    }

    pub fn len(&self) -> usize {
        self.probes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.probes.is_empty()
    }

    pub fn max_timeout(&self) -> Duration {
        self.probes
            .iter()
            .map(|p| p.timeout)
            .max()
            .unwrap_or(Duration::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::models::Payload;
    use crate::shared::traits::FnProbe;

    fn probe(name: &str, kind: ProbeKind) -> Arc<dyn Probe> {
        Arc::new(FnProbe::new(name, kind, |_| async {
            Ok(Payload::Text(String::new()))
        }))
    }

    fn names<'a>(it: impl Iterator<Item = &'a RegisteredProbe>) -> Vec<String> {
        it.map(|p| p.name().to_string()).collect()
    }

    #[test]
    fn rejects_duplicate_names() {
        let mut registry = ProbeRegistry::new(TimeoutPolicy::uniform(Duration::from_secs(5)));
        registry.register(probe("cpu", ProbeKind::Concurrent)).unwrap();

        let err = registry
            .register(probe("cpu", ProbeKind::Sequential))
            .unwrap_err();
        assert_eq!(err, RegistryError::DuplicateName("cpu".to_string()));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn partitions_by_kind_in_registration_order() {
        let mut registry = ProbeRegistry::new(TimeoutPolicy::uniform(Duration::from_secs(5)));
        registry
            .register_all(vec![
                probe("lsvg", ProbeKind::Sequential),
                probe("cpu", ProbeKind::Concurrent),
                probe("lsvg_detail", ProbeKind::Sequential),
                probe("net", ProbeKind::Concurrent),
            ])
            .unwrap();

        assert_eq!(names(registry.concurrent_set()), vec!["cpu", "net"]);
        assert_eq!(names(registry.sequential_set()), vec!["lsvg", "lsvg_detail"]);
    }

    #[test]
    fn override_beats_declared_timeout_which_beats_default() {
        let mut overrides = HashMap::new();
        overrides.insert("disk_io".to_string(), Duration::from_secs(30));
        let policy = TimeoutPolicy {
            default: Duration::from_secs(60),
            overrides,
        };
        let mut registry = ProbeRegistry::new(policy);

        let declared: Arc<dyn Probe> = Arc::new(
            FnProbe::new("slow", ProbeKind::Concurrent, |_| async {
                Ok(Payload::Text(String::new()))
            })
            .with_timeout(Duration::from_secs(7)),
        );
        let overridden: Arc<dyn Probe> = Arc::new(
            FnProbe::new("disk_io", ProbeKind::Concurrent, |_| async {
                Ok(Payload::Text(String::new()))
            })
            .with_timeout(Duration::from_secs(7)),
        );
        registry
            .register_all(vec![declared, overridden, probe("plain", ProbeKind::Sequential)])
            .unwrap();

        let timeouts: Vec<_> = registry.probes().iter().map(|p| p.timeout).collect();
        assert_eq!(
            timeouts,
            vec![
                Duration::from_secs(7),
                Duration::from_secs(30),
                Duration::from_secs(60)
            ]
        );
        assert_eq!(registry.max_timeout(), Duration::from_secs(60));
    }

    #[test]
    fn empty_registry_has_empty_sets() {
        let registry = ProbeRegistry::new(TimeoutPolicy::uniform(Duration::from_secs(1)));
        assert!(registry.is_empty());
        assert_eq!(registry.concurrent_set().count(), 0);
        assert_eq!(registry.sequential_set().count(), 0);
    }
}
