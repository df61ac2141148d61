//! Hand-off of resolved modules to the host runtime

use crate::layout::RuntimeLayout;
use crate::report::ResolutionReport;
use anyhow::Result;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// The host process that loads module code
pub trait HostRuntime {
    /// Make code at `path` loadable
    fn extend_search_path(&mut self, path: &Path) -> Result<()>;

    /// Instantiate and start the given entry points
    fn activate(&mut self, entry_points: &[String]) -> Result<()>;
}

/// What was handed to the host
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadPlan {
    pub search_paths: Vec<PathBuf>,
    pub entry_points: Vec<String>,
    pub activated: bool,
    /// Host failures, in the order they happened
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

/// Feeds the resolved set of a pass into a [`HostRuntime`]
#[derive(Debug, Clone, Copy)]
pub struct LoaderBoundary<'a> {
    layout: &'a RuntimeLayout,
}

impl<'a> LoaderBoundary<'a> {
    pub fn new(layout: &'a RuntimeLayout) -> Self {
        Self { layout }
    }

    /// Extend the host's search path with every resolved module, then
    /// activate the accumulated entry points
    ///
    /// Host failures are logged and recorded in the returned plan.
    pub fn hand_off(&self, report: &ResolutionReport, host: &mut dyn HostRuntime) -> LoadPlan {
        let mut plan = LoadPlan::default();

        for module in report.resolved() {
            let path = match self.layout.extraction_path(&module.artifact_ref) {
                Ok(path) => path,
                Err(e) => {
                    warn!(module = %module.name, "No runtime path: {:#}", e);
                    plan.errors.push(format!("{}: {:#}", module.name, e));
                    continue;
                }
            };

            match host.extend_search_path(&path) {
                Ok(()) => {
                    debug!(module = %module.name, "Added {} to search path", path.display());
                    plan.search_paths.push(path);
                }
                Err(e) => {
                    warn!(module = %module.name, "Host rejected search path: {:#}", e);
                    plan.errors.push(format!("{}: {:#}", module.name, e));
                }
            }
        }

        plan.entry_points = report.entry_points.clone();
        match host.activate(&plan.entry_points) {
            Ok(()) => {
                plan.activated = true;
                info!("Activated {} entry point(s)", plan.entry_points.len());
            }
            Err(e) => {
                warn!("Host failed to activate entry points: {:#}", e);
                plan.errors.push(format!("activation: {:#}", e));
            }
        }

        plan
    }
}

/// Host that only records what it was asked to do
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordingHost {
    pub search_paths: Vec<PathBuf>,
    pub activated: Vec<String>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HostRuntime for RecordingHost {
    fn extend_search_path(&mut self, path: &Path) -> Result<()> {
        self.search_paths.push(path.to_path_buf());
        Ok(())
    }

    fn activate(&mut self, entry_points: &[String]) -> Result<()> {
        self.activated.extend(entry_points.iter().cloned());
        Ok(())
    }
}
