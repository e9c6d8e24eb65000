pub mod config;
pub mod locator;
pub mod split;

pub use config::LocatorConfig;
pub use locator::{HeaderPattern, SectionLocator, SectionSpan};
pub use split::{split_options, split_topology, OptionsSplit, TopologySplit};

use once_cell::sync::Lazy;

static BUILTIN: Lazy<(SectionLocator, SectionLocator)> = Lazy::new(|| {
    let compiled = LocatorConfig::builtin()
        .and_then(|cfg| Ok((cfg.topology_locator()?, cfg.options_locator()?)));
    match compiled {
        Ok(pair) => pair,
        Err(err) => {
            tracing::error!(error = %err, "built-in locator patterns failed to load");
            (SectionLocator::empty(), SectionLocator::empty())
        }
    }
});

/// Locator for the graph topology block, compiled from the built-in patterns.
pub fn topology_locator() -> &'static SectionLocator {
    &BUILTIN.0
}

/// Locator for the decision options block, compiled from the built-in patterns.
pub fn options_locator() -> &'static SectionLocator {
    &BUILTIN.1
}
