//! Ordered filter pipelines
//!
//! A pipeline is a list of nodes, each a filter with its arguments. Preflight
//! validates every node against a metadata-only copy of the graph, applying
//! each node's actions in preflight mode so later nodes see the outputs of
//! earlier ones. Execute runs the enabled nodes in order through the driver
//! and stops at the first one that does not complete.
//!
//! Pipelines are saved as JSON naming each filter by uuid; loading resolves
//! the uuids through a [`FilterRegistry`].

use crate::action::ActionMode;
use crate::driver::{FilterReport, FilterRunner};
use crate::filter::Filter;
use crate::message::MessageHandler;
use crate::registry::FilterRegistry;
use crate::result::ValidationResult;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tessera_core::{Arguments, CancelFlag, Error, Result};
use tessera_storage::DataStructure;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Code when a node's actions cannot be applied to the preflight graph
pub const PREFLIGHT_APPLY_FAILED: i32 = -950;

/// One filter invocation in a pipeline
#[derive(Debug, Clone)]
pub struct PipelineNode {
    /// Filter to run
    pub filter: Box<dyn Filter>,
    /// Arguments for this run
    pub args: Arguments,
    /// Disabled nodes are skipped by preflight and execute
    pub enabled: bool,
}

impl PipelineNode {
    /// Enabled node
    pub fn new(filter: Box<dyn Filter>, args: Arguments) -> Self {
        Self {
            filter,
            args,
            enabled: true,
        }
    }

    /// Node holding the filter's default arguments
    pub fn with_defaults(filter: Box<dyn Filter>) -> Self {
        let args = filter.parameters().default_arguments();
        Self::new(filter, args)
    }
}

fn enabled_by_default() -> bool {
    true
}

/// Saved form of a node
#[derive(Debug, Serialize, Deserialize)]
struct NodeRecord {
    filter: Uuid,
    /// Informational; the uuid decides which filter is loaded
    #[serde(default)]
    name: String,
    args: Arguments,
    #[serde(default = "enabled_by_default")]
    enabled: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct PipelineRecord {
    nodes: Vec<NodeRecord>,
}

/// Preflight outcome of a whole pipeline
#[derive(Debug, Clone, Default)]
pub struct PipelinePreflight {
    /// Per node, `None` for disabled nodes
    pub results: Vec<Option<ValidationResult>>,
}

impl PipelinePreflight {
    /// True if every enabled node validated without errors
    pub fn is_valid(&self) -> bool {
        self.results.iter().flatten().all(ValidationResult::is_valid)
    }

    /// Index of the first node that reported errors
    pub fn first_invalid(&self) -> Option<usize> {
        self.results
            .iter()
            .position(|r| r.as_ref().map_or(false, |r| !r.is_valid()))
    }
}

/// Execute outcome of a whole pipeline
#[derive(Debug, Default)]
pub struct PipelineReport {
    /// Reports of the nodes that ran, in order, as `(node index, report)`
    pub reports: Vec<(usize, FilterReport)>,
    /// Wall time of the whole run
    pub elapsed: Duration,
}

impl PipelineReport {
    /// True if every node that ran completed
    ///
    /// A pipeline stops at the first node that does not complete, so this is
    /// also true only if every enabled node ran.
    pub fn is_completed(&self) -> bool {
        self.reports.iter().all(|(_, r)| r.is_completed())
    }

    /// The report that stopped the pipeline, if any
    pub fn failure(&self) -> Option<&(usize, FilterReport)> {
        self.reports.iter().find(|(_, r)| !r.is_completed())
    }
}

/// Ordered list of filter invocations
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    nodes: Vec<PipelineNode>,
    runner: FilterRunner,
}

impl Pipeline {
    /// Empty pipeline run on rayon's global pool
    pub fn new() -> Self {
        Self::default()
    }

    /// Use this runner (and its pool) for execute
    pub fn with_runner(mut self, runner: FilterRunner) -> Self {
        self.runner = runner;
        self
    }

    /// Append a node
    pub fn push(&mut self, node: PipelineNode) {
        self.nodes.push(node);
    }

    /// Append a filter with its arguments
    pub fn push_filter(&mut self, filter: Box<dyn Filter>, args: Arguments) {
        self.push(PipelineNode::new(filter, args));
    }

    /// Nodes in order
    pub fn nodes(&self) -> &[PipelineNode] {
        &self.nodes
    }

    /// Mutable access to the nodes, to edit arguments or toggle nodes
    pub fn nodes_mut(&mut self) -> &mut [PipelineNode] {
        &mut self.nodes
    }

    /// Number of nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True if the pipeline has no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Save as pretty-printed JSON
    pub fn to_json(&self) -> Result<String> {
        let record = PipelineRecord {
            nodes: self
                .nodes
                .iter()
                .map(|node| NodeRecord {
                    filter: node.filter.uuid(),
                    name: node.filter.name().to_string(),
                    args: node.args.clone(),
                    enabled: node.enabled,
                })
                .collect(),
        };
        serde_json::to_string_pretty(&record)
            .map_err(|e| Error::invalid_argument(format!("cannot serialize pipeline: {}", e)))
    }

    /// Load a pipeline saved by [`to_json`](Self::to_json)
    ///
    /// Fails if a node names a filter the registry does not know.
    pub fn from_json(text: &str, registry: &FilterRegistry) -> Result<Self> {
        let record: PipelineRecord = serde_json::from_str(text)
            .map_err(|e| Error::invalid_argument(format!("invalid pipeline file: {}", e)))?;
        let mut pipeline = Pipeline::new();
        for (index, node) in record.nodes.into_iter().enumerate() {
            let filter = registry.create_by_uuid(&node.filter).ok_or_else(|| {
                Error::invalid_argument(format!(
                    "node {}: unknown filter {} ({})",
                    index, node.filter, node.name
                ))
            })?;
            pipeline.push(PipelineNode {
                filter,
                args: node.args,
                enabled: node.enabled,
            });
        }
        Ok(pipeline)
    }

    /// Validate every enabled node without touching `ds`
    ///
    /// Nodes after an invalid one are still validated, against the graph as
    /// it stood before the invalid node. A node whose actions fail part way
    /// leaves none of them behind.
    pub fn preflight(&self, ds: &DataStructure, cancel: &CancelFlag) -> PipelinePreflight {
        let mut graph = ds.preflight_copy();
        let mut results = Vec::with_capacity(self.nodes.len());
        for (index, node) in self.nodes.iter().enumerate() {
            if !node.enabled {
                results.push(None);
                continue;
            }
            let mut result = node.filter.preflight(&graph, &node.args, cancel);
            if result.is_valid() {
                let mut scratch = graph.clone();
                let applied = result
                    .actions
                    .apply_all(&mut scratch, ActionMode::Preflight)
                    .and_then(|_| result.actions.apply_deferred(&mut scratch, ActionMode::Preflight));
                match applied {
                    Ok(()) => graph = scratch,
                    Err(e) => result.push_error(PREFLIGHT_APPLY_FAILED, e.to_string()),
                }
            }
            debug!(
                target: "tessera::pipeline",
                index,
                filter = node.filter.name(),
                valid = result.is_valid(),
                "preflight node"
            );
            results.push(Some(result));
        }
        PipelinePreflight { results }
    }

    /// Run the enabled nodes in order, stopping at the first that does not
    /// complete
    pub fn execute(
        &self,
        ds: &mut DataStructure,
        messages: &dyn MessageHandler,
        cancel: &CancelFlag,
    ) -> PipelineReport {
        let started = Instant::now();
        let mut reports = Vec::new();
        for (index, node) in self.nodes.iter().enumerate() {
            if !node.enabled {
                debug!(target: "tessera::pipeline", index, filter = node.filter.name(), "skip disabled node");
                continue;
            }
            let report = self
                .runner
                .run(node.filter.as_ref(), ds, &node.args, messages, cancel);
            let completed = report.is_completed();
            if !completed {
                warn!(
                    target: "tessera::pipeline",
                    index,
                    filter = report.filter,
                    state = %report.state,
                    "pipeline stopped"
                );
            }
            reports.push((index, report));
            if !completed {
                break;
            }
        }
        let report = PipelineReport {
            reports,
            elapsed: started.elapsed(),
        };
        info!(
            target: "tessera::pipeline",
            nodes = report.reports.len(),
            completed = report.is_completed(),
            elapsed_ms = report.elapsed.as_millis() as u64,
            "pipeline finished"
        );
        report
    }
}
