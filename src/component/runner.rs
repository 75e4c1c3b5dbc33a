use rayon::prelude::*;
use tracing::{error, info};

use crate::component::{Component, Registry};
use crate::error::Result;

/// How a [Runner] schedules its components
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionMode {
    /// One at a time, in order, stopping at the first failure
    #[default]
    Sequential,
    /// All at once on the rayon pool; siblings not yet started are skipped after a failure
    Concurrent,
}

/// Runs a bounded list of independent components
pub struct Runner {
    mode: ExecutionMode,
    components: Vec<Box<dyn Component>>,
}

impl Runner {
    pub fn new(mode: ExecutionMode) -> Self {
        Runner {
            mode,
            components: Vec::new(),
        }
    }

    pub fn add(&mut self, component: Box<dyn Component>) {
        self.components.push(component);
    }

    /// Instantiate each named component from `registry`
    pub fn from_registry(registry: &Registry, names: &[&str], mode: ExecutionMode) -> Result<Self> {
        let mut runner = Runner::new(mode);
        for name in names {
            runner.add(registry.create(name)?);
        }
        Ok(runner)
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Run every component; the first error wins
    pub fn run(&self) -> Result<()> {
        info!(mode = ?self.mode, components = self.components.len(), "runner started");

        match self.mode {
            ExecutionMode::Sequential => self.components.iter().try_for_each(|c| run_one(&**c))?,
            ExecutionMode::Concurrent => self
                .components
                .par_iter()
                .try_for_each(|c| run_one(&**c))?,
        }

        info!("all components completed");
        Ok(())
    }
}

fn run_one(component: &dyn Component) -> Result<()> {
    info!(component = component.name(), "running component");
    component.run().map_err(|e| {
        error!(component = component.name(), error = %e, "component failed");
        e
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReleaseError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Counting {
        name: String,
        runs: Arc<AtomicUsize>,
        fail: bool,
    }

    impl Component for Counting {
        fn name(&self) -> &str {
            &self.name
        }

        fn run(&self) -> Result<()> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(ReleaseError::command(self.name.clone(), "boom"))
            } else {
                Ok(())
            }
        }
    }

    fn runner(mode: ExecutionMode, fail_at: Option<usize>, runs: &Arc<AtomicUsize>) -> Runner {
        let mut runner = Runner::new(mode);
        for i in 0..4 {
            runner.add(Box::new(Counting {
                name: format!("c{}", i),
                runs: Arc::clone(runs),
                fail: fail_at == Some(i),
            }));
        }
        runner
    }

    #[test]
    fn test_sequential_runs_all_in_order() {
        let runs = Arc::new(AtomicUsize::new(0));
        runner(ExecutionMode::Sequential, None, &runs).run().unwrap();
        assert_eq!(runs.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_sequential_stops_at_first_failure() {
        let runs = Arc::new(AtomicUsize::new(0));
        let err = runner(ExecutionMode::Sequential, Some(1), &runs).run().unwrap_err();
        assert!(err.to_string().contains("c1"));
        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_concurrent_runs_all() {
        let runs = Arc::new(AtomicUsize::new(0));
        runner(ExecutionMode::Concurrent, None, &runs).run().unwrap();
        assert_eq!(runs.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_concurrent_reports_failure() {
        let runs = Arc::new(AtomicUsize::new(0));
        let err = runner(ExecutionMode::Concurrent, Some(2), &runs).run().unwrap_err();
        assert!(err.to_string().contains("c2"));
    }

    #[test]
    fn test_from_registry_rejects_unknown_names() {
        let registry = crate::component::builtin().unwrap();
        assert!(Runner::from_registry(&registry, &["prometheus.scrape"], ExecutionMode::Concurrent).is_ok());
        assert!(Runner::from_registry(&registry, &["nope"], ExecutionMode::Sequential).is_err());
    }
}
