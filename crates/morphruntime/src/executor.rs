use crate::registry::BlockRegistry;
use chrono::Utc;
use morphcore::{
    BlockContext, BlockId, BlockState, Chain, ChainError, ChainId, CompatibilityTable,
    DataContainer, EventBus, PortDecl, PortDirection, RunEvent, RunId,
};
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

/// Executes a chain: validates its structure, orders the blocks and runs
/// them strictly one at a time.
///
/// Block execution cost is dominated by the geometry algorithms inside the
/// blocks, not by scheduling, so the engine deliberately runs sequentially
/// and introduces no concurrency of its own.
pub struct ChainExecutor {
    compat: Arc<CompatibilityTable>,
}

struct Validated {
    instances: HashMap<BlockId, Box<dyn morphcore::Block>>,
    in_ports: HashMap<BlockId, Vec<PortDecl>>,
    order: Vec<BlockId>,
}

impl ChainExecutor {
    pub fn new(compat: Arc<CompatibilityTable>) -> Self {
        Self { compat }
    }

    /// Run a chain from scratch: every run revalidates and recomputes the
    /// order; there is no incremental re-execution.
    pub async fn execute(
        &self,
        chain: &Chain,
        registry: &BlockRegistry,
        event_bus: &EventBus,
    ) -> RunReport {
        let run_id = RunId::new_v4();
        let started = Instant::now();

        event_bus.emit(RunEvent::ChainStarted {
            run_id,
            chain_id: chain.id,
            timestamp: Utc::now(),
        });
        tracing::info!("Starting chain run: {} ({})", chain.name, chain.id);

        let mut report = RunReport {
            run_id,
            chain_id: chain.id,
            outcome: RunOutcome::Aborted,
            error: None,
            statuses: chain
                .blocks
                .iter()
                .map(|b| (b.id, BlockState::NotExecuted))
                .collect(),
            outputs: HashMap::new(),
            order: Vec::new(),
        };

        match self.validate(chain, registry) {
            Ok(validated) => {
                report.order = validated.order.clone();
                self.run_ordered(chain, validated, event_bus, run_id, &mut report)
                    .await;
            }
            Err(err) => {
                tracing::error!("Chain {} failed validation: {}", chain.id, err);
                report.error = Some(err);
            }
        }

        let duration_ms = started.elapsed().as_millis() as u64;
        let success = report.outcome == RunOutcome::Completed;
        event_bus.emit(RunEvent::ChainCompleted {
            run_id,
            success,
            duration_ms,
            timestamp: Utc::now(),
        });
        report
    }

    /// Validate a chain without executing it.
    pub fn check(&self, chain: &Chain, registry: &BlockRegistry) -> Result<(), ChainError> {
        self.validate(chain, registry).map(|_| ())
    }

    /// Structural validation: instantiate blocks, resolve links against the
    /// declared ports, check mandatory inputs and reject cycles. Nothing
    /// executes if any check fails.
    fn validate(&self, chain: &Chain, registry: &BlockRegistry) -> Result<Validated, ChainError> {
        let mut instances = HashMap::new();
        let mut in_ports = HashMap::new();
        let mut out_ports = HashMap::new();
        for spec in &chain.blocks {
            let block = registry.create_block(&spec.block_type, &spec.config)?;
            in_ports.insert(spec.id, block.input_ports());
            out_ports.insert(spec.id, block.output_ports());
            instances.insert(spec.id, block);
        }

        let mut seen_inputs: HashSet<(BlockId, &str)> = HashSet::new();
        for link in &chain.links {
            let from_decls: &Vec<PortDecl> = out_ports
                .get(&link.from_block)
                .ok_or(ChainError::BlockNotFound(link.from_block))?;
            let to_decls: &Vec<PortDecl> = in_ports
                .get(&link.to_block)
                .ok_or(ChainError::BlockNotFound(link.to_block))?;
            let from = from_decls
                .iter()
                .find(|p| p.name == link.from_port)
                .ok_or_else(|| ChainError::PortNotFound {
                    block: link.from_block,
                    direction: PortDirection::Out,
                    port: link.from_port.clone(),
                })?;
            let to = to_decls
                .iter()
                .find(|p| p.name == link.to_port)
                .ok_or_else(|| ChainError::PortNotFound {
                    block: link.to_block,
                    direction: PortDirection::In,
                    port: link.to_port.clone(),
                })?;
            // An input port holds at most one link, even in a hand-edited
            // chain file.
            if !seen_inputs.insert((link.to_block, link.to_port.as_str())) {
                return Err(ChainError::AlreadyConnected {
                    block: link.to_block,
                    port: link.to_port.clone(),
                });
            }
            if !self.compat.is_compatible(from.tag, to.tag) {
                return Err(ChainError::TypeIncompatible {
                    from_block: link.from_block,
                    from_port: link.from_port.clone(),
                    from_tag: from.tag,
                    to_block: link.to_block,
                    to_port: link.to_port.clone(),
                    to_tag: to.tag,
                });
            }
        }

        for spec in &chain.blocks {
            for decl in &in_ports[&spec.id] {
                if decl.mandatory && chain.link_into(spec.id, &decl.name).is_none() {
                    return Err(ChainError::NotConnected {
                        block: spec.id,
                        port: decl.name.clone(),
                    });
                }
            }
        }

        self.check_cycles(chain)?;
        let order = self.topological_order(chain)?;

        Ok(Validated {
            instances,
            in_ports,
            order,
        })
    }

    /// Rejects any strongly connected component with more than one block,
    /// or a self-loop, reporting the participating block ids.
    fn check_cycles(&self, chain: &Chain) -> Result<(), ChainError> {
        let mut graph: DiGraph<BlockId, ()> = DiGraph::new();
        let mut index_of: HashMap<BlockId, NodeIndex> = HashMap::new();
        for spec in &chain.blocks {
            let idx = graph.add_node(spec.id);
            index_of.insert(spec.id, idx);
        }
        for link in &chain.links {
            if let (Some(&from), Some(&to)) = (
                index_of.get(&link.from_block),
                index_of.get(&link.to_block),
            ) {
                graph.add_edge(from, to, ());
            }
        }

        for scc in tarjan_scc(&graph) {
            let cyclic = scc.len() > 1 || graph.contains_edge(scc[0], scc[0]);
            if cyclic {
                let mut ids: Vec<BlockId> = scc.iter().map(|&idx| graph[idx]).collect();
                ids.sort_by_key(|id| chain.blocks.iter().position(|b| b.id == *id));
                return Err(ChainError::CyclicDependency(ids));
            }
        }
        Ok(())
    }

    /// Kahn's algorithm; ties among simultaneously ready blocks break by
    /// insertion order, so a given chain always replays identically.
    fn topological_order(&self, chain: &Chain) -> Result<Vec<BlockId>, ChainError> {
        let mut preds: HashMap<BlockId, HashSet<BlockId>> = chain
            .blocks
            .iter()
            .map(|b| (b.id, HashSet::new()))
            .collect();
        for link in &chain.links {
            if let Some(set) = preds.get_mut(&link.to_block) {
                set.insert(link.from_block);
            }
        }

        let mut order = Vec::with_capacity(chain.blocks.len());
        let mut done: HashSet<BlockId> = HashSet::new();
        while order.len() < chain.blocks.len() {
            let ready = chain
                .blocks
                .iter()
                .map(|b| b.id)
                .find(|id| !done.contains(id) && preds[id].iter().all(|p| done.contains(p)));
            match ready {
                Some(id) => {
                    done.insert(id);
                    order.push(id);
                }
                // Unreachable after the cycle check.
                None => return Err(ChainError::Invalid("no executable order".to_string())),
            }
        }
        Ok(order)
    }

    async fn run_ordered(
        &self,
        chain: &Chain,
        validated: Validated,
        event_bus: &EventBus,
        run_id: RunId,
        report: &mut RunReport,
    ) {
        let Validated {
            instances,
            in_ports,
            order,
        } = validated;
        let mut completed: HashSet<BlockId> = HashSet::new();

        for block_id in order {
            let (Some(spec), Some(block)) = (chain.find_block(block_id), instances.get(&block_id))
            else {
                report.error = Some(ChainError::BlockNotFound(block_id));
                return;
            };

            let inputs = match self.collect_inputs(
                chain,
                block_id,
                &in_ports,
                &completed,
                &report.outputs,
            ) {
                Ok(inputs) => inputs,
                Err(err) => {
                    tracing::error!("Input propagation failed for block {}: {}", block_id, err);
                    report.error = Some(err);
                    return;
                }
            };

            event_bus.emit(RunEvent::BlockStarted {
                run_id,
                block_id,
                block_type: spec.block_type.clone(),
                timestamp: Utc::now(),
            });
            tracing::debug!("Executing block {} ({})", spec.label(), block_id);

            let ctx = BlockContext {
                block_id,
                inputs,
                config: spec.config.clone(),
                events: event_bus.create_emitter(run_id, block_id),
            };
            let start = Instant::now();
            match block.execute(ctx).await {
                Ok(output) => {
                    let duration_ms = start.elapsed().as_millis() as u64;
                    tracing::info!("Block {} completed in {}ms", spec.label(), duration_ms);

                    let mut ports: Vec<String> = output.outputs.keys().cloned().collect();
                    ports.sort();
                    event_bus.emit(RunEvent::BlockCompleted {
                        run_id,
                        block_id,
                        ports,
                        duration_ms,
                        timestamp: Utc::now(),
                    });

                    report.statuses.insert(block_id, BlockState::Executed);
                    report.outputs.insert(block_id, output.outputs);
                    completed.insert(block_id);
                }
                Err(e) => {
                    tracing::error!("Block {} failed: {}", spec.label(), e);
                    event_bus.emit(RunEvent::BlockFailed {
                        run_id,
                        block_id,
                        error: e.to_string(),
                        timestamp: Utc::now(),
                    });

                    report.statuses.insert(block_id, BlockState::Failed);
                    // Upstream outputs stay in the report for diagnostics.
                    self.skip_downstream(chain, block_id, event_bus, run_id, report);
                    report.error = Some(ChainError::BlockFailed {
                        block: block_id,
                        source: e,
                    });
                    return;
                }
            }
        }

        report.outcome = RunOutcome::Completed;
    }

    /// Pulls published containers along the block's links, applying the
    /// compatibility converter where the tags differ.
    ///
    /// A linked upstream outside the completed set means the scheduler broke
    /// its ordering invariant; that aborts the run as an engine bug. An
    /// upstream that completed without publishing the linked port simply
    /// contributes nothing.
    fn collect_inputs(
        &self,
        chain: &Chain,
        block_id: BlockId,
        in_ports: &HashMap<BlockId, Vec<PortDecl>>,
        completed: &HashSet<BlockId>,
        outputs: &HashMap<BlockId, HashMap<String, DataContainer>>,
    ) -> Result<HashMap<String, DataContainer>, ChainError> {
        let mut inputs = HashMap::new();
        let decls = in_ports.get(&block_id).map(Vec::as_slice).unwrap_or(&[]);

        for link in chain.links_into_block(block_id) {
            if !completed.contains(&link.from_block) {
                return Err(ChainError::NoData {
                    block: block_id,
                    port: link.to_port.clone(),
                });
            }
            let Some(container) = outputs
                .get(&link.from_block)
                .and_then(|m| m.get(&link.from_port))
            else {
                continue;
            };
            let Some(decl) = decls.iter().find(|p| p.name == link.to_port) else {
                continue;
            };
            match self.compat.convert(container, decl.tag) {
                Some(converted) => {
                    inputs.insert(link.to_port.clone(), converted);
                }
                None => {
                    return Err(ChainError::TypeIncompatible {
                        from_block: link.from_block,
                        from_port: link.from_port.clone(),
                        from_tag: container.tag(),
                        to_block: block_id,
                        to_port: link.to_port.clone(),
                        to_tag: decl.tag,
                    })
                }
            }
        }
        Ok(inputs)
    }

    /// Marks every transitive successor of a failed block as skipped.
    fn skip_downstream(
        &self,
        chain: &Chain,
        failed: BlockId,
        event_bus: &EventBus,
        run_id: RunId,
        report: &mut RunReport,
    ) {
        let mut stack = vec![failed];
        let mut visited: HashSet<BlockId> = HashSet::new();
        visited.insert(failed);
        while let Some(id) = stack.pop() {
            for link in chain.links_from_block(id) {
                if visited.insert(link.to_block) {
                    if report.statuses.get(&link.to_block) == Some(&BlockState::NotExecuted) {
                        report.statuses.insert(link.to_block, BlockState::Skipped);
                        event_bus.emit(RunEvent::BlockSkipped {
                            run_id,
                            block_id: link.to_block,
                            timestamp: Utc::now(),
                        });
                    }
                    stack.push(link.to_block);
                }
            }
        }
    }
}

impl Default for ChainExecutor {
    fn default() -> Self {
        Self::new(Arc::new(CompatibilityTable::standard()))
    }
}

/// Final state of one chain run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunOutcome {
    /// Every block executed without failure.
    Completed,
    /// Validation failed or a block failed mid-run.
    Aborted,
}

/// Outcome of a chain run: per-block statuses and the last-published
/// container of every executed block's output ports.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: RunId,
    pub chain_id: ChainId,
    pub outcome: RunOutcome,
    /// The error that aborted the run, if it aborted.
    pub error: Option<ChainError>,
    pub statuses: HashMap<BlockId, BlockState>,
    pub outputs: HashMap<BlockId, HashMap<String, DataContainer>>,
    /// The computed execution order; empty when validation failed.
    pub order: Vec<BlockId>,
}

impl RunReport {
    pub fn is_completed(&self) -> bool {
        self.outcome == RunOutcome::Completed
    }

    pub fn status(&self, block: BlockId) -> BlockState {
        self.statuses
            .get(&block)
            .copied()
            .unwrap_or(BlockState::NotExecuted)
    }

    /// Last-published container on an output port, queryable by
    /// (block, port name).
    pub fn output(&self, block: BlockId, port: &str) -> Option<&DataContainer> {
        self.outputs.get(&block).and_then(|m| m.get(port))
    }
}
