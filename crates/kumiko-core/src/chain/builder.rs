//! Derives a [`SignalChain`] from the patcher's signal connections.
//!
//! Participants are the boxes with at least one signal port whose `prepare`
//! accepted the current settings. They are ordered with Kahn's algorithm; the
//! queue is FIFO and seeded by ascending box ID, so a given topology always
//! yields the same order. Boxes left over after the sort sit on a cycle.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use crate::error::ChainError;
use crate::graph::{BoxId, Connection, Object};

use super::buffer::Source;
use super::schedule::{SignalChain, Step};

/// A box as seen by the chain builder.
pub(crate) struct SignalNode {
    pub id: BoxId,
    pub object: Arc<dyn Object>,
    /// Per inlet: accepts a signal.
    pub inlets: Vec<bool>,
    /// Per outlet: produces a signal.
    pub outlets: Vec<bool>,
}

/// Snapshot of the signal part of a patcher.
pub(crate) struct SignalGraph {
    /// Candidate boxes in ascending ID order.
    pub nodes: Vec<SignalNode>,
    /// Signal connections in insertion order.
    pub edges: Vec<Connection>,
    /// Topology version the snapshot was taken at.
    pub version: u64,
}

/// Builds the chain for `graph` at the given settings.
pub(crate) fn build(
    graph: SignalGraph,
    sample_rate: f32,
    block_size: usize,
) -> Result<SignalChain, ChainError> {
    if block_size == 0 || !sample_rate.is_finite() || sample_rate <= 0.0 {
        return Err(ChainError::InvalidSettings {
            sample_rate,
            block_size,
        });
    }

    let nodes: Vec<SignalNode> = graph
        .nodes
        .into_iter()
        .filter(|node| node.object.prepare(sample_rate, block_size))
        .collect();
    let index: HashMap<BoxId, usize> = nodes.iter().enumerate().map(|(i, n)| (n.id, i)).collect();
    let edges: Vec<Connection> = graph
        .edges
        .into_iter()
        .filter(|e| index.contains_key(&e.from) && index.contains_key(&e.to))
        .collect();

    let order = kahn_sort(&nodes, &index, &edges)?;

    // Fan-out per producer outlet, used to decide in-place eligibility.
    let mut consumers: HashMap<(BoxId, usize), usize> = HashMap::new();
    for edge in &edges {
        *consumers.entry((edge.from, edge.outlet)).or_default() += 1;
    }

    let mut step_of: HashMap<BoxId, usize> = HashMap::with_capacity(order.len());
    // Physical buffer location of each (step, outlet).
    let mut location: Vec<Vec<(usize, usize)>> = Vec::with_capacity(order.len());
    let mut steps: Vec<Step> = Vec::with_capacity(order.len());

    for (k, &node_idx) in order.iter().enumerate() {
        let node = &nodes[node_idx];
        let incoming: Vec<&Connection> = edges.iter().filter(|e| e.to == node.id).collect();
        let resolve = |edge: &Connection| location[step_of[&edge.from]][edge.outlet];

        let signal_outlets = node.outlets.iter().filter(|&&s| s).count();
        let inplace = (node.object.is_inplace()
            && signal_outlets == 1
            && node.outlets.first() == Some(&true)
            && incoming.len() == 1
            && incoming[0].inlet == 0
            && consumers.get(&(incoming[0].from, incoming[0].outlet)) == Some(&1))
        .then(|| resolve(incoming[0]));

        let mut own_location: Vec<(usize, usize)> =
            (0..node.outlets.len()).map(|outlet| (k, outlet)).collect();

        let step = if let Some(producer) = inplace {
            own_location[0] = producer;
            Step {
                id: node.id,
                object: Arc::clone(&node.object),
                inputs: vec![Source::Silence; node.inlets.len()],
                mixes: Vec::new(),
                mix: Vec::new(),
                outputs: vec![Vec::new(); node.outlets.len()],
                inplace: Some(producer),
            }
        } else {
            let mut inputs = Vec::with_capacity(node.inlets.len());
            let mut mixes = Vec::new();
            for inlet in 0..node.inlets.len() {
                let sources: Vec<(usize, usize)> = incoming
                    .iter()
                    .filter(|e| e.inlet == inlet)
                    .map(|e| resolve(e))
                    .collect();
                inputs.push(match sources.as_slice() {
                    [] => Source::Silence,
                    [(step, outlet)] => Source::Single {
                        step: *step,
                        outlet: *outlet,
                    },
                    _ => {
                        mixes.push(sources);
                        Source::Mix {
                            slot: mixes.len() - 1,
                        }
                    }
                });
            }
            Step {
                id: node.id,
                object: Arc::clone(&node.object),
                inputs,
                mix: vec![vec![0.0; block_size]; mixes.len()],
                mixes,
                outputs: node
                    .outlets
                    .iter()
                    .map(|&signal| if signal { vec![0.0; block_size] } else { Vec::new() })
                    .collect(),
                inplace: None,
            }
        };

        step_of.insert(node.id, k);
        location.push(own_location);
        steps.push(step);
    }

    tracing::debug!(
        steps = steps.len(),
        inplace = steps.iter().filter(|s| s.inplace.is_some()).count(),
        version = graph.version,
        "signal chain built"
    );

    Ok(SignalChain {
        steps,
        silence: vec![0.0; block_size],
        sample_rate,
        block_size,
    })
}

fn kahn_sort(
    nodes: &[SignalNode],
    index: &HashMap<BoxId, usize>,
    edges: &[Connection],
) -> Result<Vec<usize>, ChainError> {
    let n = nodes.len();
    let mut in_degree = vec![0usize; n];
    let mut outgoing: Vec<Vec<usize>> = vec![Vec::new(); n];
    for edge in edges {
        in_degree[index[&edge.to]] += 1;
        outgoing[index[&edge.from]].push(index[&edge.to]);
    }

    let mut queue: VecDeque<usize> = (0..n).filter(|&i| in_degree[i] == 0).collect();
    let mut sorted = Vec::with_capacity(n);

    while let Some(idx) = queue.pop_front() {
        sorted.push(idx);
        for &to in &outgoing[idx] {
            in_degree[to] -= 1;
            if in_degree[to] == 0 {
                queue.push_back(to);
            }
        }
    }

    if sorted.len() != n {
        let boxes = (0..n)
            .filter(|&i| in_degree[i] > 0)
            .map(|i| nodes[i].id)
            .collect();
        return Err(ChainError::Cycle { boxes });
    }

    Ok(sorted)
}
