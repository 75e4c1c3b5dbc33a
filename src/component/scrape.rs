use tracing::info;

use crate::component::{Component, Registration};
use crate::error::Result;

const NAME: &str = "prometheus.scrape";

/// Scrapes metrics from a list of targets
#[derive(Debug, Default)]
pub struct Scraper {
    targets: Vec<String>,
}

impl Scraper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_target(&mut self, target: impl Into<String>) {
        self.targets.push(target.into());
    }

    pub fn targets(&self) -> &[String] {
        &self.targets
    }
}

impl Component for Scraper {
    fn name(&self) -> &str {
        NAME
    }

    fn run(&self) -> Result<()> {
        info!(component = NAME, targets = self.targets.len(), "starting");
        Ok(())
    }
}

pub fn registration() -> Registration {
    Registration {
        name: NAME,
        description: "Scrapes Prometheus metrics from targets",
        version: Some(env!("CARGO_PKG_VERSION")),
        build,
    }
}

fn build() -> Box<dyn Component> {
    Box::new(Scraper::new())
}
