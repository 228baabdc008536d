/// In-memory workflow store
///
/// The store is the only owner of workflow records for the lifetime of the
/// process. Route handlers talk to it through the [`WorkflowStore`] trait so a
/// persistent implementation can replace it without touching the API layer.

use crate::error::StoreError;
use crate::workflow::types::{
    Connection, ConnectionSpec, CreateWorkflowRequest, NodeKind, NodePatch, NodeSpec, Workflow,
    WorkflowNode, WorkflowPatch,
};
use arc_swap::ArcSwap;
use chrono::Utc;
use std::{collections::HashMap, sync::Arc};

/// Storage contract used by the HTTP layer
pub trait WorkflowStore: Send + Sync {
    /// All workflows, oldest first
    fn list(&self) -> Vec<Workflow>;

    /// Insert a new workflow, generating an id when none is given.
    /// An explicit id that already exists is overwritten.
    fn create(&self, request: CreateWorkflowRequest) -> Workflow;

    fn get(&self, id: &str) -> Result<Workflow, StoreError>;

    /// Replace the provided fields wholesale and refresh `updated_at`
    fn update(&self, id: &str, patch: WorkflowPatch) -> Result<Workflow, StoreError>;

    fn append_node(&self, id: &str, spec: NodeSpec) -> Result<WorkflowNode, StoreError>;

    /// Move a node and/or replace its properties
    fn update_node(&self, id: &str, node_id: &str, patch: NodePatch) -> Result<WorkflowNode, StoreError>;

    fn append_connection(&self, id: &str, spec: ConnectionSpec) -> Result<Connection, StoreError>;
}

/// Lock-free in-memory store
///
/// Readers load a snapshot of the whole map without blocking. Writers clone the
/// map, apply their change and swap it in with `rcu`, which retries when another
/// writer got there first. Every read-modify-write is therefore atomic with
/// respect to other writers.
#[derive(Debug, Default)]
pub struct InMemoryWorkflowStore {
    workflows: ArcSwap<HashMap<String, Workflow>>,
}

impl InMemoryWorkflowStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.workflows.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.workflows.load().is_empty()
    }

    /// Apply `change` to a copy of one workflow and publish it atomically
    ///
    /// Nothing is published when the workflow is missing or `change` fails.
    /// `change` may run more than once under contention.
    fn modify<T>(
        &self,
        id: &str,
        mut change: impl FnMut(&mut Workflow) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut outcome = None;

        self.workflows.rcu(|current| {
            let Some(existing) = current.get(id) else {
                outcome = Some(Err(StoreError::WorkflowNotFound(id.to_string())));
                return Arc::clone(current);
            };

            let mut workflow = existing.clone();
            workflow.updated_at = Utc::now();
            match change(&mut workflow) {
                Ok(value) => {
                    let mut next = (**current).clone();
                    next.insert(id.to_string(), workflow);
                    outcome = Some(Ok(value));
                    Arc::new(next)
                }
                Err(e) => {
                    outcome = Some(Err(e));
                    Arc::clone(current)
                }
            }
        });

        outcome.unwrap_or_else(|| Err(StoreError::WorkflowNotFound(id.to_string())))
    }
}

impl WorkflowStore for InMemoryWorkflowStore {
    fn list(&self) -> Vec<Workflow> {
        let mut workflows: Vec<Workflow> = self.workflows.load().values().cloned().collect();
        workflows.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        workflows
    }

    fn create(&self, request: CreateWorkflowRequest) -> Workflow {
        let mut created = None;

        self.workflows.rcu(|current| {
            let id = request.id.clone().unwrap_or_else(|| {
                let mut id = uuid::Uuid::new_v4().to_string();
                while current.contains_key(&id) {
                    id = uuid::Uuid::new_v4().to_string();
                }
                id
            });

            let mut workflow = Workflow::new(
                id.clone(),
                request.name.clone().unwrap_or_else(|| "Untitled Workflow".to_string()),
            );
            workflow.description = request.description.clone().unwrap_or_default();

            let mut next = (**current).clone();
            next.insert(id, workflow.clone());
            created = Some(workflow);
            Arc::new(next)
        });

        let workflow = created.unwrap_or_else(|| Workflow::new("", ""));
        tracing::info!("Created workflow: {} ({})", workflow.id, workflow.name);
        workflow
    }

    fn get(&self, id: &str) -> Result<Workflow, StoreError> {
        self.workflows
            .load()
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::WorkflowNotFound(id.to_string()))
    }

    fn update(&self, id: &str, patch: WorkflowPatch) -> Result<Workflow, StoreError> {
        let updated = self.modify(id, |workflow| {
            if let Some(name) = &patch.name {
                workflow.name = name.clone();
            }
            if let Some(description) = &patch.description {
                workflow.description = description.clone();
            }
            if let Some(nodes) = &patch.nodes {
                workflow.nodes = nodes.clone();
            }
            if let Some(connections) = &patch.connections {
                workflow.connections = connections.clone();
            }
            Ok(workflow.clone())
        })?;

        tracing::info!("Updated workflow: {}", id);
        Ok(updated)
    }

    fn append_node(&self, id: &str, spec: NodeSpec) -> Result<WorkflowNode, StoreError> {
        let node_type = spec
            .node_type
            .clone()
            .unwrap_or_else(crate::workflow::types::default_node_type);
        let kind = NodeKind::from_parts(&node_type, spec.properties.clone())
            .map_err(|source| StoreError::InvalidProperties { node_type, source })?;

        let node = self.modify(id, |workflow| {
            let node = WorkflowNode {
                id: spec.id.clone().unwrap_or_else(|| workflow.next_node_id()),
                kind: kind.clone(),
                position: spec.position.unwrap_or_default(),
                inputs: spec.inputs.clone(),
                outputs: spec.outputs.clone(),
            };
            workflow.nodes.push(node.clone());
            Ok(node)
        })?;

        tracing::info!("Added {} node '{}' to workflow {}", node.kind.type_name(), node.id, id);
        Ok(node)
    }

    fn update_node(&self, id: &str, node_id: &str, patch: NodePatch) -> Result<WorkflowNode, StoreError> {
        let node = self.modify(id, |workflow| {
            let node = workflow
                .nodes
                .iter_mut()
                .find(|node| node.id == node_id)
                .ok_or_else(|| StoreError::NodeNotFound {
                    workflow_id: id.to_string(),
                    node_id: node_id.to_string(),
                })?;

            if let Some(position) = patch.position {
                node.position = position;
            }
            if let Some(properties) = &patch.properties {
                let node_type = node.kind.type_name().to_string();
                node.kind = NodeKind::from_parts(&node_type, Some(properties.clone()))
                    .map_err(|source| StoreError::InvalidProperties { node_type, source })?;
            }
            Ok(node.clone())
        })?;

        tracing::info!("Updated node '{}' in workflow {}", node_id, id);
        Ok(node)
    }

    fn append_connection(&self, id: &str, spec: ConnectionSpec) -> Result<Connection, StoreError> {
        let (source_node, source_output, target_node, target_input) = match (
            spec.source_node,
            spec.source_output,
            spec.target_node,
            spec.target_input,
        ) {
            (Some(source_node), Some(source_output), Some(target_node), Some(target_input)) => {
                (source_node, source_output, target_node, target_input)
            }
            (source_node, source_output, target_node, target_input) => {
                let missing = [
                    ("source_node", source_node.is_none()),
                    ("source_output", source_output.is_none()),
                    ("target_node", target_node.is_none()),
                    ("target_input", target_input.is_none()),
                ]
                .into_iter()
                .filter_map(|(field, absent)| absent.then_some(field))
                .collect();
                return Err(StoreError::MissingFields(missing));
            }
        };

        let connection = self.modify(id, |workflow| {
            let connection = Connection {
                id: spec.id.clone().unwrap_or_else(|| workflow.next_connection_id()),
                source_node: source_node.clone(),
                source_output: source_output.clone(),
                target_node: target_node.clone(),
                target_input: target_input.clone(),
            };
            workflow.connections.push(connection.clone());
            Ok(connection)
        })?;

        tracing::info!(
            "Connected {}.{} -> {}.{} in workflow {}",
            connection.source_node,
            connection.source_output,
            connection.target_node,
            connection.target_input,
            id
        );
        Ok(connection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::types::{Position, PrintProperties};
    use serde_json::json;

    fn store_with(id: &str) -> InMemoryWorkflowStore {
        let store = InMemoryWorkflowStore::new();
        store.create(CreateWorkflowRequest {
            id: Some(id.to_string()),
            name: Some("Test".to_string()),
            description: None,
        });
        store
    }

    #[test]
    fn create_without_id_assigns_unique_ids() {
        let store = InMemoryWorkflowStore::new();
        let first = store.create(CreateWorkflowRequest::default());
        let second = store.create(CreateWorkflowRequest::default());

        assert_ne!(first.id, second.id);
        assert_eq!(first.name, "Untitled Workflow");
        assert_eq!(first.description, "");
        assert!(first.nodes.is_empty() && first.connections.is_empty());
        assert_eq!(first.created_at, first.updated_at);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn create_with_existing_id_overwrites() {
        let store = store_with("wf");
        store.create(CreateWorkflowRequest {
            id: Some("wf".to_string()),
            name: Some("Replacement".to_string()),
            description: None,
        });

        assert_eq!(store.len(), 1);
        assert_eq!(store.get("wf").unwrap().name, "Replacement");
    }

    #[test]
    fn update_replaces_only_provided_fields() {
        let store = store_with("wf");
        let before = store.get("wf").unwrap();

        let updated = store
            .update(
                "wf",
                WorkflowPatch {
                    description: Some("now described".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(updated.name, "Test");
        assert_eq!(updated.description, "now described");
        assert!(updated.updated_at >= before.updated_at);
        assert_eq!(updated.created_at, before.created_at);
    }

    #[test]
    fn update_of_missing_workflow_leaves_store_unchanged() {
        let store = store_with("wf");
        let before = store.list();

        let result = store.update(
            "missing",
            WorkflowPatch {
                name: Some("ghost".to_string()),
                ..Default::default()
            },
        );

        assert!(matches!(result, Err(StoreError::WorkflowNotFound(id)) if id == "missing"));
        assert_eq!(store.list(), before);
    }

    #[test]
    fn append_node_assigns_default_id_and_properties() {
        let store = store_with("wf");

        let node = store
            .append_node(
                "wf",
                NodeSpec {
                    node_type: Some("print".to_string()),
                    position: Some(Position::new(5.0, 6.0)),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(node.id, "node_1");
        assert_eq!(node.kind, NodeKind::Print(PrintProperties::default()));
        assert_eq!(store.get("wf").unwrap().nodes, vec![node]);
    }

    #[test]
    fn append_node_rejects_invalid_properties() {
        let store = store_with("wf");

        let result = store.append_node(
            "wf",
            NodeSpec {
                node_type: Some("variable".to_string()),
                properties: Some(json!({ "name": 7 })),
                ..Default::default()
            },
        );

        assert!(matches!(result, Err(StoreError::InvalidProperties { .. })));
        assert!(store.get("wf").unwrap().nodes.is_empty());
    }

    #[test]
    fn update_node_moves_and_revalidates() {
        let store = store_with("wf");
        store
            .append_node(
                "wf",
                NodeSpec {
                    id: Some("v".to_string()),
                    node_type: Some("variable".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();

        let moved = store
            .update_node(
                "wf",
                "v",
                NodePatch {
                    position: Some(Position::new(1.0, 2.0)),
                    properties: Some(json!({ "name": "answer", "value": "42" })),
                },
            )
            .unwrap();
        assert_eq!(moved.position, Position::new(1.0, 2.0));
        assert_eq!(moved.kind.properties()["name"], json!("answer"));

        let missing = store.update_node("wf", "nope", NodePatch::default());
        assert!(matches!(missing, Err(StoreError::NodeNotFound { .. })));
    }

    #[test]
    fn append_connection_reports_missing_fields() {
        let store = store_with("wf");

        let result = store.append_connection(
            "wf",
            ConnectionSpec {
                source_node: Some("a".to_string()),
                target_node: Some("b".to_string()),
                ..Default::default()
            },
        );

        match result {
            Err(StoreError::MissingFields(fields)) => {
                assert_eq!(fields, vec!["source_output", "target_input"]);
            }
            other => panic!("expected missing fields, got {other:?}"),
        }
        assert!(store.get("wf").unwrap().connections.is_empty());
    }

    #[test]
    fn append_connection_to_missing_workflow_is_not_found() {
        let store = InMemoryWorkflowStore::new();
        let result = store.append_connection(
            "missing",
            ConnectionSpec {
                source_node: Some("a".to_string()),
                source_output: Some("out".to_string()),
                target_node: Some("b".to_string()),
                target_input: Some("in".to_string()),
                ..Default::default()
            },
        );

        assert!(matches!(result, Err(StoreError::WorkflowNotFound(_))));
        assert!(store.is_empty());
    }

    #[test]
    fn concurrent_appends_are_not_lost() {
        let store = Arc::new(store_with("wf"));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for _ in 0..25 {
                        store.append_node("wf", NodeSpec::default()).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let workflow = store.get("wf").unwrap();
        assert_eq!(workflow.nodes.len(), 200);
        let mut ids: Vec<_> = workflow.nodes.iter().map(|n| n.id.clone()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 200);
    }
}
