/// Graph compiler
///
/// Linearizes a workflow's nodes into Python statements. Nodes are ordered
/// either by canvas position (top to bottom, then left to right) or by the
/// workflow's connections, using a petgraph graph with position as tie-breaker.

use crate::error::CompileError;
use crate::workflow::types::{NodeKind, Workflow, WorkflowNode};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Reverse;
use std::collections::{BTreeMap, BinaryHeap, HashMap};
use std::str::FromStr;

const HEADER: &str = "# Generated Python Code\n";

/// Python keywords plus `print`, which generated code must not shadow
const RESERVED_NAMES: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global",
    "if", "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return",
    "try", "while", "with", "yield", "print",
];

/// How the compiler decides execution order
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderingStrategy {
    /// Stable sort by `(y, x)`; connections are ignored
    #[default]
    Spatial,
    /// Topological order over connections, position breaks ties
    Dependency,
}

impl FromStr for OrderingStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "spatial" => Ok(Self::Spatial),
            "dependency" => Ok(Self::Dependency),
            other => Err(format!("unknown ordering strategy '{other}' (expected 'spatial' or 'dependency')")),
        }
    }
}

/// Output of a compilation pass
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompiledProgram {
    /// Generated source text
    #[serde(rename = "code")]
    pub source: String,
    /// Node ids in the order they were visited
    pub order: Vec<String>,
    /// Variable name -> last assigned value
    pub bindings: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GraphCompiler {
    ordering: OrderingStrategy,
}

impl GraphCompiler {
    pub fn new(ordering: OrderingStrategy) -> Self {
        Self { ordering }
    }

    pub fn ordering(&self) -> OrderingStrategy {
        self.ordering
    }

    /// Compile a workflow into a single source blob
    pub fn compile(&self, workflow: &Workflow) -> Result<CompiledProgram, CompileError> {
        tracing::debug!(
            "🏗️ Compiling workflow '{}' ({} nodes, {:?} ordering)",
            workflow.id,
            workflow.nodes.len(),
            self.ordering
        );

        let ordered = match self.ordering {
            OrderingStrategy::Spatial => spatial_order(&workflow.nodes),
            OrderingStrategy::Dependency => dependency_order(workflow)?,
        };

        let mut source = String::from(HEADER);
        let mut bindings = BTreeMap::new();
        let mut order = Vec::with_capacity(ordered.len());

        for node in ordered {
            order.push(node.id.clone());
            match &node.kind {
                NodeKind::Variable(props) => {
                    if !is_identifier(&props.name) {
                        return Err(CompileError::InvalidIdentifier {
                            node_id: node.id.clone(),
                            name: props.name.clone(),
                        });
                    }
                    source.push_str(&format!("{} = {}\n", props.name, python_string(&props.value)));
                    bindings.insert(props.name.clone(), props.value.clone());
                }
                NodeKind::Print(props) => {
                    if bindings.contains_key(&props.message) {
                        source.push_str(&format!("print({})\n", props.message));
                    } else {
                        source.push_str(&format!("print({})\n", python_string(&props.message)));
                    }
                }
                NodeKind::Other { node_type, .. } => {
                    tracing::debug!("⏭️ Skipping node '{}' of type '{}'", node.id, node_type);
                }
            }
        }

        tracing::debug!("📋 Compiled order: {:?}", order);
        Ok(CompiledProgram {
            source,
            order,
            bindings,
        })
    }
}

/// Stable sort by `(y, x)`; equal positions keep insertion order
pub fn spatial_order(nodes: &[WorkflowNode]) -> Vec<&WorkflowNode> {
    let mut sorted: Vec<&WorkflowNode> = nodes.iter().collect();
    sorted.sort_by(|a, b| {
        a.position
            .y
            .total_cmp(&b.position.y)
            .then(a.position.x.total_cmp(&b.position.x))
    });
    sorted
}

/// Topological order over the workflow's connections
///
/// Among nodes whose dependencies are all satisfied, the one earliest in
/// spatial order goes first, so unconnected branches keep the spatial order.
pub fn dependency_order(workflow: &Workflow) -> Result<Vec<&WorkflowNode>, CompileError> {
    let spatial = spatial_order(&workflow.nodes);

    // Graph indices follow spatial rank, so the index doubles as priority
    let mut graph: DiGraph<&WorkflowNode, ()> = DiGraph::with_capacity(spatial.len(), workflow.connections.len());
    let mut node_id_to_index: HashMap<&str, NodeIndex> = HashMap::new();
    for node in &spatial {
        let index = graph.add_node(*node);
        node_id_to_index.entry(node.id.as_str()).or_insert(index);
    }

    for connection in &workflow.connections {
        let lookup = |node_id: &str| {
            node_id_to_index
                .get(node_id)
                .copied()
                .ok_or_else(|| CompileError::UnknownNode {
                    connection_id: connection.id.clone(),
                    node_id: node_id.to_string(),
                })
        };
        let from = lookup(&connection.source_node)?;
        let to = lookup(&connection.target_node)?;
        graph.add_edge(from, to, ());
    }

    if petgraph::algo::is_cyclic_directed(&graph) {
        tracing::warn!("❌ Workflow '{}' contains a dependency cycle", workflow.id);
        return Err(CompileError::Cycle);
    }

    let mut in_degree: Vec<usize> = graph
        .node_indices()
        .map(|index| graph.edges_directed(index, Direction::Incoming).count())
        .collect();
    let mut ready: BinaryHeap<Reverse<usize>> = in_degree
        .iter()
        .enumerate()
        .filter(|(_, degree)| **degree == 0)
        .map(|(index, _)| Reverse(index))
        .collect();

    let mut ordered = Vec::with_capacity(graph.node_count());
    while let Some(Reverse(index)) = ready.pop() {
        let current = NodeIndex::new(index);
        ordered.push(graph[current]);
        for target in graph.neighbors_directed(current, Direction::Outgoing) {
            let degree = &mut in_degree[target.index()];
            *degree -= 1;
            if *degree == 0 {
                ready.push(Reverse(target.index()));
            }
        }
    }

    if ordered.len() != graph.node_count() {
        return Err(CompileError::Cycle);
    }
    Ok(ordered)
}

/// Python string literal for `text`
///
/// JSON string escaping produces a valid Python literal.
fn python_string(text: &str) -> String {
    Value::String(text.to_owned()).to_string()
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let starts_well = matches!(chars.next(), Some(c) if c == '_' || c.is_ascii_alphabetic());
    starts_well
        && chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
        && !RESERVED_NAMES.contains(&name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::types::{Connection, Position, PrintProperties, VariableProperties};

    fn variable(name: &str, value: &str) -> NodeKind {
        NodeKind::Variable(VariableProperties {
            name: name.to_string(),
            value: value.to_string(),
        })
    }

    fn print(message: &str) -> NodeKind {
        NodeKind::Print(PrintProperties {
            message: message.to_string(),
        })
    }

    fn node(workflow: &mut Workflow, id: &str, kind: NodeKind, x: f64, y: f64) {
        workflow.add_node(kind, Position::new(x, y)).id = id.to_string();
    }

    fn connect(workflow: &mut Workflow, from: &str, to: &str) {
        let id = workflow.next_connection_id();
        workflow.connections.push(Connection {
            id,
            source_node: from.to_string(),
            source_output: "out".to_string(),
            target_node: to.to_string(),
            target_input: "in".to_string(),
        });
    }

    #[test]
    fn spatial_order_is_stable_for_equal_positions() {
        let mut workflow = Workflow::new("wf", "order");
        node(&mut workflow, "c", print("c"), 5.0, 10.0);
        node(&mut workflow, "a", print("a"), 0.0, 0.0);
        node(&mut workflow, "b1", print("b1"), 2.0, 5.0);
        node(&mut workflow, "b2", print("b2"), 2.0, 5.0);
        node(&mut workflow, "b0", print("b0"), 1.0, 5.0);

        let ids: Vec<&str> = spatial_order(&workflow.nodes).iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b0", "b1", "b2", "c"]);
    }

    #[test]
    fn variable_then_print_emits_assignment_and_reference() {
        let mut workflow = Workflow::new("wf", "demo");
        node(&mut workflow, "p", print("greeting"), 100.0, 200.0);
        node(&mut workflow, "v", variable("greeting", "Hello, AgentBlocks!"), 100.0, 100.0);

        let program = GraphCompiler::default().compile(&workflow).unwrap();

        assert_eq!(
            program.source,
            "# Generated Python Code\ngreeting = \"Hello, AgentBlocks!\"\nprint(greeting)\n"
        );
        assert_eq!(program.order, vec!["v", "p"]);
        assert_eq!(program.bindings["greeting"], "Hello, AgentBlocks!");
    }

    #[test]
    fn unbound_message_prints_literal_text() {
        let mut workflow = Workflow::new("wf", "literal");
        node(&mut workflow, "p", print("greeting"), 0.0, 0.0);
        node(&mut workflow, "v", variable("greeting", "too late"), 0.0, 50.0);

        let program = GraphCompiler::default().compile(&workflow).unwrap();

        assert!(program.source.contains("print(\"greeting\")\n"));
    }

    #[test]
    fn literals_are_escaped() {
        let mut workflow = Workflow::new("wf", "escape");
        node(&mut workflow, "v", variable("quote", "say \"hi\"\\\n"), 0.0, 0.0);
        node(&mut workflow, "p", print("it's \"fine\""), 0.0, 1.0);

        let program = GraphCompiler::default().compile(&workflow).unwrap();

        assert!(program.source.contains("quote = \"say \\\"hi\\\"\\\\\\n\"\n"));
        assert!(program.source.contains("print(\"it's \\\"fine\\\"\")\n"));
    }

    #[test]
    fn invalid_variable_names_are_rejected() {
        for name in ["1abc", "my var", "class", "print", ""] {
            let mut workflow = Workflow::new("wf", "bad");
            node(&mut workflow, "v", variable(name, "x"), 0.0, 0.0);

            let result = GraphCompiler::default().compile(&workflow);
            assert!(
                matches!(result, Err(CompileError::InvalidIdentifier { .. })),
                "name {name:?} should be rejected"
            );
        }
    }

    #[test]
    fn other_node_types_emit_nothing() {
        let mut workflow = Workflow::new("wf", "noop");
        node(&mut workflow, "x", NodeKind::with_defaults("comment"), 0.0, 0.0);

        let program = GraphCompiler::default().compile(&workflow).unwrap();

        assert_eq!(program.source, HEADER);
        assert_eq!(program.order, vec!["x"]);
    }

    #[test]
    fn dependency_order_follows_connections_over_position() {
        let mut workflow = Workflow::new("wf", "deps");
        node(&mut workflow, "p", print("greeting"), 0.0, 0.0);
        node(&mut workflow, "v", variable("greeting", "from below"), 0.0, 300.0);
        node(&mut workflow, "free", print("side branch"), 50.0, 100.0);
        connect(&mut workflow, "v", "p");

        let program = GraphCompiler::new(OrderingStrategy::Dependency)
            .compile(&workflow)
            .unwrap();

        assert_eq!(program.order, vec!["free", "v", "p"]);
        assert!(program.source.ends_with("greeting = \"from below\"\nprint(greeting)\n"));
    }

    #[test]
    fn dependency_order_rejects_cycles_and_dangling_edges() {
        let mut cyclic = Workflow::new("wf", "cycle");
        node(&mut cyclic, "a", print("a"), 0.0, 0.0);
        node(&mut cyclic, "b", print("b"), 0.0, 1.0);
        connect(&mut cyclic, "a", "b");
        connect(&mut cyclic, "b", "a");
        assert!(matches!(dependency_order(&cyclic), Err(CompileError::Cycle)));

        let mut dangling = Workflow::new("wf", "dangling");
        node(&mut dangling, "a", print("a"), 0.0, 0.0);
        connect(&mut dangling, "a", "ghost");
        assert!(matches!(
            dependency_order(&dangling),
            Err(CompileError::UnknownNode { node_id, .. }) if node_id == "ghost"
        ));
    }

    #[test]
    fn ordering_strategy_parses_case_insensitively() {
        assert_eq!("Dependency".parse::<OrderingStrategy>(), Ok(OrderingStrategy::Dependency));
        assert_eq!("spatial".parse::<OrderingStrategy>(), Ok(OrderingStrategy::Spatial));
        assert!("random".parse::<OrderingStrategy>().is_err());
    }
}
