/// Core workflow type definitions
///
/// Defines workflows, nodes and connections as the editor exchanges them over the
/// wire. Node properties are typed per node kind; unknown kinds keep their
/// properties verbatim so documents produced by newer editors survive a round trip.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A complete workflow: a named graph of nodes and connections
///
/// Nodes are kept in insertion order, which is not their execution order.
/// The compiler decides the order at compile time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workflow {
    /// Unique workflow identifier
    pub id: String,
    /// Human-readable workflow name
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Nodes in insertion order
    #[serde(default)]
    pub nodes: Vec<WorkflowNode>,
    /// Declared edges between node slots
    #[serde(default)]
    pub connections: Vec<Connection>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Workflow {
    /// Create an empty workflow stamped with the current time
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            nodes: Vec::new(),
            connections: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Add a node of the given kind with a fresh UUID and return it for editing
    pub fn add_node(&mut self, kind: NodeKind, position: Position) -> &mut WorkflowNode {
        let index = self.nodes.len();
        self.nodes.push(WorkflowNode {
            id: uuid::Uuid::new_v4().to_string(),
            kind,
            position,
            inputs: Vec::new(),
            outputs: Vec::new(),
        });
        &mut self.nodes[index]
    }

    pub fn node(&self, node_id: &str) -> Option<&WorkflowNode> {
        self.nodes.iter().find(|node| node.id == node_id)
    }

    /// First free `node_<n>` id, counting up from the current node count
    pub fn next_node_id(&self) -> String {
        next_free_id("node", self.nodes.len() + 1, |candidate| {
            self.nodes.iter().any(|node| node.id == candidate)
        })
    }

    /// First free `conn_<n>` id, counting up from the current connection count
    pub fn next_connection_id(&self) -> String {
        next_free_id("conn", self.connections.len() + 1, |candidate| {
            self.connections.iter().any(|conn| conn.id == candidate)
        })
    }
}

fn next_free_id(prefix: &str, start: usize, taken: impl Fn(&str) -> bool) -> String {
    (start..)
        .map(|n| format!("{prefix}_{n}"))
        .find(|candidate| !taken(candidate))
        .unwrap_or_else(|| format!("{prefix}_{}", uuid::Uuid::new_v4()))
}

/// Canvas position of a node. Only used for ordering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A single node on the canvas
///
/// On the wire a node looks like
/// `{ "id", "type", "position", "properties", "inputs", "outputs" }`;
/// `type` and `properties` are folded into the typed [`NodeKind`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "NodeRecord", into = "NodeRecord")]
pub struct WorkflowNode {
    pub id: String,
    pub kind: NodeKind,
    pub position: Position,
    /// Input slot descriptors, opaque to the backend
    pub inputs: Vec<Value>,
    /// Output slot descriptors, opaque to the backend
    pub outputs: Vec<Value>,
}

/// Wire shape of a node
#[derive(Debug, Serialize, Deserialize)]
struct NodeRecord {
    id: String,
    #[serde(rename = "type", default = "default_node_type")]
    node_type: String,
    #[serde(default)]
    position: Position,
    #[serde(default)]
    properties: Option<Value>,
    #[serde(default)]
    inputs: Vec<Value>,
    #[serde(default)]
    outputs: Vec<Value>,
}

impl TryFrom<NodeRecord> for WorkflowNode {
    type Error = serde_json::Error;

    fn try_from(record: NodeRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            kind: NodeKind::from_parts(&record.node_type, record.properties)?,
            id: record.id,
            position: record.position,
            inputs: record.inputs,
            outputs: record.outputs,
        })
    }
}

impl From<WorkflowNode> for NodeRecord {
    fn from(node: WorkflowNode) -> Self {
        Self {
            node_type: node.kind.type_name().to_string(),
            properties: Some(Value::Object(node.kind.properties())),
            id: node.id,
            position: node.position,
            inputs: node.inputs,
            outputs: node.outputs,
        }
    }
}

pub(crate) fn default_node_type() -> String {
    "default".to_string()
}

/// Node behaviour with a typed property schema per kind
///
/// Known kinds reject unknown or mistyped properties and fill in defaults for
/// missing ones. Any other type name is carried as [`NodeKind::Other`] and
/// compiles to nothing.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Assigns a string value to a named variable
    Variable(VariableProperties),
    /// Prints a bound variable, or the message itself as literal text
    Print(PrintProperties),
    Other {
        node_type: String,
        properties: Map<String, Value>,
    },
}

impl NodeKind {
    pub const VARIABLE: &'static str = "variable";
    pub const PRINT: &'static str = "print";

    /// Build a kind from its wire type name and raw properties
    ///
    /// Missing (or null) properties yield the kind's defaults.
    pub fn from_parts(node_type: &str, properties: Option<Value>) -> Result<Self, serde_json::Error> {
        let properties = match properties {
            None | Some(Value::Null) => Value::Object(Map::new()),
            Some(value) => value,
        };

        match node_type {
            Self::VARIABLE => Ok(Self::Variable(serde_json::from_value(properties)?)),
            Self::PRINT => Ok(Self::Print(serde_json::from_value(properties)?)),
            other => match properties {
                Value::Object(properties) => Ok(Self::Other {
                    node_type: other.to_string(),
                    properties,
                }),
                _ => Err(<serde_json::Error as serde::de::Error>::custom(
                    "node properties must be a JSON object",
                )),
            },
        }
    }

    /// Kind with default properties, as created from the editor palette
    pub fn with_defaults(node_type: &str) -> Self {
        match node_type {
            Self::VARIABLE => Self::Variable(VariableProperties::default()),
            Self::PRINT => Self::Print(PrintProperties::default()),
            other => Self::Other {
                node_type: other.to_string(),
                properties: Map::new(),
            },
        }
    }

    pub fn type_name(&self) -> &str {
        match self {
            Self::Variable(_) => Self::VARIABLE,
            Self::Print(_) => Self::PRINT,
            Self::Other { node_type, .. } => node_type,
        }
    }

    /// Properties in their wire form
    pub fn properties(&self) -> Map<String, Value> {
        let value = match self {
            Self::Variable(props) => serde_json::to_value(props),
            Self::Print(props) => serde_json::to_value(props),
            Self::Other { properties, .. } => return properties.clone(),
        };
        match value {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }
}

/// Properties of a `variable` node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VariableProperties {
    #[serde(default = "default_variable_name")]
    pub name: String,
    #[serde(default = "default_variable_value")]
    pub value: String,
}

impl Default for VariableProperties {
    fn default() -> Self {
        Self {
            name: default_variable_name(),
            value: default_variable_value(),
        }
    }
}

/// Properties of a `print` node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PrintProperties {
    /// Variable name to print, or literal text when no such variable is bound
    #[serde(default = "default_variable_name")]
    pub message: String,
}

impl Default for PrintProperties {
    fn default() -> Self {
        Self {
            message: default_variable_name(),
        }
    }
}

fn default_variable_name() -> String {
    "myVariable".to_string()
}

fn default_variable_value() -> String {
    "hello world".to_string()
}

/// Edge from an output slot of one node to an input slot of another
///
/// Purely descriptive for the store; only the dependency ordering strategy
/// of the compiler reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub id: String,
    pub source_node: String,
    pub source_output: String,
    pub target_node: String,
    pub target_input: String,
}

/// Request body for workflow creation
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateWorkflowRequest {
    pub id: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
}

/// Partial workflow update; provided fields replace the stored ones wholesale
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WorkflowPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub nodes: Option<Vec<WorkflowNode>>,
    pub connections: Option<Vec<Connection>>,
}

/// Request body for appending a node
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NodeSpec {
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub node_type: Option<String>,
    pub position: Option<Position>,
    pub properties: Option<Value>,
    #[serde(default)]
    pub inputs: Vec<Value>,
    #[serde(default)]
    pub outputs: Vec<Value>,
}

/// Request body for moving a node or replacing its properties
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NodePatch {
    pub position: Option<Position>,
    pub properties: Option<Value>,
}

/// Request body for appending a connection
///
/// The four endpoint fields are required; they are optional here so a missing
/// field is reported as a validation error naming it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConnectionSpec {
    pub id: Option<String>,
    pub source_node: Option<String>,
    pub source_output: Option<String>,
    pub target_node: Option<String>,
    pub target_input: Option<String>,
}
