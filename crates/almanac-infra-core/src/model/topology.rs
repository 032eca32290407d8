//! Resource topology graph
//!
//! A topology is the complete declaration of one stack: resources in
//! declaration order plus the named edges wiring them together. It is built
//! through [`TopologyBuilder`], validated once, and never mutated afterwards.

use super::environment::EnvironmentDescriptor;
use super::resource::{Resource, ResourceId, ResourceKind, ResourceType};
use crate::error::{Result, TopologyError};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;

/// Permission a principal holds on a target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessLevel {
    /// Every data-plane action on a table
    FullAccess,
    /// Object reads
    Read,
    /// Object writes and deletes
    Write,
    /// Cache invalidation
    Invalidate,
}

impl AccessLevel {
    /// Provider actions this level expands to
    pub fn actions(&self) -> &'static [&'static str] {
        match self {
            AccessLevel::FullAccess => &["dynamodb:*"],
            AccessLevel::Read => &["s3:GetObject"],
            AccessLevel::Write => &[
                "s3:GetObject*",
                "s3:GetBucket*",
                "s3:List*",
                "s3:DeleteObject*",
                "s3:PutObject",
                "s3:Abort*",
            ],
            AccessLevel::Invalidate => &["cloudfront:GetInvalidation", "cloudfront:CreateInvalidation"],
        }
    }
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessLevel::FullAccess => write!(f, "full-access"),
            AccessLevel::Read => write!(f, "read"),
            AccessLevel::Write => write!(f, "write"),
            AccessLevel::Invalidate => write!(f, "invalidate"),
        }
    }
}

/// Relationship carried by an edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EdgeKind {
    /// `from` may act on `to`
    Grants { access: AccessLevel },
    /// Traffic reaching `from` is forwarded to `to`
    RoutesTo,
    /// `from` is configured with `to` (certificate, zone, identity, ...)
    References,
}

/// Directed edge; `from` depends on `to`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub from: ResourceId,
    pub to: ResourceId,
    #[serde(flatten)]
    pub kind: EdgeKind,
}

/// (principal, target, access) triple read off a `Grants` edge
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AccessGrant {
    pub principal: ResourceId,
    pub target: ResourceId,
    pub access: AccessLevel,
}

/// A value the engine will need but that was not configured
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct UnresolvedReference {
    /// Resource carrying the gap, `None` for stack-level settings
    pub resource: Option<ResourceId>,
    /// Environment variable that would have supplied it
    pub setting: String,
}

impl fmt::Display for UnresolvedReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.resource {
            Some(id) => write!(f, "{} (needed by {})", self.setting, id),
            None => write!(f, "{}", self.setting),
        }
    }
}

/// Validated declaration of one stack
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceTopology {
    stack_name: String,
    environment: EnvironmentDescriptor,
    resources: Vec<Resource>,
    edges: Vec<Edge>,
}

impl ResourceTopology {
    pub fn stack_name(&self) -> &str {
        &self.stack_name
    }

    pub fn environment(&self) -> &EnvironmentDescriptor {
        &self.environment
    }

    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn resource(&self, id: &ResourceId) -> Option<&Resource> {
        self.resources.iter().find(|r| &r.id == id)
    }

    /// All resources of one type, in declaration order
    pub fn resources_of(&self, resource_type: ResourceType) -> Vec<&Resource> {
        self.resources
            .iter()
            .filter(|r| r.kind.resource_type() == resource_type)
            .collect()
    }

    pub fn edges_from<'a>(&'a self, id: &'a ResourceId) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |e| &e.from == id)
    }

    /// First resource of `resource_type` that `id` routes to or references
    pub fn linked(&self, id: &ResourceId, resource_type: ResourceType) -> Option<&Resource> {
        self.edges_from(id)
            .filter(|e| !matches!(e.kind, EdgeKind::Grants { .. }))
            .filter_map(|e| self.resource(&e.to))
            .find(|r| r.kind.resource_type() == resource_type)
    }

    /// Where traffic reaching `id` is forwarded
    pub fn route_target(&self, id: &ResourceId) -> Option<&Resource> {
        self.edges_from(id)
            .find(|e| e.kind == EdgeKind::RoutesTo)
            .and_then(|e| self.resource(&e.to))
    }

    pub fn access_grants(&self) -> Vec<AccessGrant> {
        self.edges
            .iter()
            .filter_map(|e| match e.kind {
                EdgeKind::Grants { access } => Some(AccessGrant {
                    principal: e.from.clone(),
                    target: e.to.clone(),
                    access,
                }),
                _ => None,
            })
            .collect()
    }

    /// `(from, to)` for every routing edge, in declaration order
    pub fn routes(&self) -> Vec<(&ResourceId, &ResourceId)> {
        self.edges
            .iter()
            .filter(|e| e.kind == EdgeKind::RoutesTo)
            .map(|e| (&e.from, &e.to))
            .collect()
    }

    /// Resources `id` depends on, deduplicated, in declaration order
    pub fn dependencies_of(&self, id: &ResourceId) -> Vec<&ResourceId> {
        let targets: BTreeSet<&ResourceId> = self.edges_from(id).map(|e| &e.to).collect();
        self.resources
            .iter()
            .map(|r| &r.id)
            .filter(|rid| targets.contains(rid))
            .collect()
    }

    /// Dependencies first; ties broken by declaration order
    pub fn creation_order(&self) -> Vec<&ResourceId> {
        topological_order(&self.resources, &self.edges)
            .into_iter()
            .map(|idx| &self.resources[idx].id)
            .collect()
    }

    /// Configuration gaps the engine will trip over at apply time
    pub fn unresolved_references(&self) -> Vec<UnresolvedReference> {
        let mut unresolved = Vec::new();
        if self.environment.account_id().is_none() {
            unresolved.push(UnresolvedReference {
                resource: None,
                setting: "ACCOUNT_ID".to_string(),
            });
        }
        for resource in &self.resources {
            let mut missing = |setting: &str| {
                unresolved.push(UnresolvedReference {
                    resource: Some(resource.id.clone()),
                    setting: setting.to_string(),
                })
            };
            match &resource.kind {
                ResourceKind::HostedZone(zone) if zone.hosted_zone_id.is_none() => {
                    missing("HOSTED_ZONE_ID")
                }
                ResourceKind::Certificate(cert) if cert.certificate_arn.is_none() => {
                    missing("CERTIFICATE_ARN")
                }
                ResourceKind::Function(function) => {
                    for name in &function.missing_environment {
                        missing(name.as_str());
                    }
                }
                _ => {}
            }
        }
        unresolved
    }
}

/// Accumulates resources and edges for one stack
#[derive(Debug)]
pub struct TopologyBuilder {
    stack_name: String,
    environment: EnvironmentDescriptor,
    resources: Vec<Resource>,
    edges: Vec<Edge>,
}

impl TopologyBuilder {
    pub fn new(stack_name: impl Into<String>, environment: EnvironmentDescriptor) -> Self {
        Self {
            stack_name: stack_name.into(),
            environment,
            resources: Vec::new(),
            edges: Vec::new(),
        }
    }

    /// Declare a resource and return its id for wiring
    pub fn declare(&mut self, id: impl Into<ResourceId>, kind: ResourceKind) -> ResourceId {
        let id = id.into();
        tracing::debug!(
            stack = %self.stack_name,
            resource = %id,
            resource_type = %kind.resource_type(),
            "Declared resource"
        );
        self.resources.push(Resource {
            id: id.clone(),
            kind,
        });
        id
    }

    pub fn grant(&mut self, principal: &ResourceId, target: &ResourceId, access: AccessLevel) {
        self.connect(principal, target, EdgeKind::Grants { access });
    }

    pub fn route(&mut self, from: &ResourceId, to: &ResourceId) {
        self.connect(from, to, EdgeKind::RoutesTo);
    }

    pub fn reference(&mut self, from: &ResourceId, to: &ResourceId) {
        self.connect(from, to, EdgeKind::References);
    }

    fn connect(&mut self, from: &ResourceId, to: &ResourceId, kind: EdgeKind) {
        self.edges.push(Edge {
            from: from.clone(),
            to: to.clone(),
            kind,
        });
    }

    /// Validate and freeze the graph
    pub fn build(self) -> Result<ResourceTopology> {
        let mut seen = BTreeSet::new();
        for resource in &self.resources {
            if !seen.insert(&resource.id) {
                return Err(TopologyError::DuplicateResource {
                    stack: self.stack_name.clone(),
                    id: resource.id.to_string(),
                });
            }
        }

        for edge in &self.edges {
            for endpoint in [&edge.from, &edge.to] {
                if !seen.contains(endpoint) {
                    return Err(TopologyError::UnknownResource {
                        stack: self.stack_name.clone(),
                        id: endpoint.to_string(),
                    });
                }
            }
        }

        let order = topological_order(&self.resources, &self.edges);
        if order.len() < self.resources.len() {
            let placed: BTreeSet<usize> = order.into_iter().collect();
            let resources = self
                .resources
                .iter()
                .enumerate()
                .filter(|(idx, _)| !placed.contains(idx))
                .map(|(_, r)| r.id.to_string())
                .collect();
            return Err(TopologyError::CycleDetected {
                stack: self.stack_name,
                resources,
            });
        }

        tracing::debug!(
            stack = %self.stack_name,
            resources = self.resources.len(),
            edges = self.edges.len(),
            "Built topology"
        );

        Ok(ResourceTopology {
            stack_name: self.stack_name,
            environment: self.environment,
            resources: self.resources,
            edges: self.edges,
        })
    }
}

/// Kahn's algorithm over "from depends on to". Returns resource indices;
/// fewer than `resources.len()` means a cycle.
fn topological_order(resources: &[Resource], edges: &[Edge]) -> Vec<usize> {
    let index: HashMap<&ResourceId, usize> =
        resources.iter().enumerate().map(|(i, r)| (&r.id, i)).collect();

    let mut pending = vec![0usize; resources.len()];
    let mut dependents: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); resources.len()];
    let mut unique = BTreeSet::new();
    for edge in edges {
        let (Some(&from), Some(&to)) = (index.get(&edge.from), index.get(&edge.to)) else {
            continue;
        };
        if unique.insert((from, to)) {
            pending[from] += 1;
            dependents[to].insert(from);
        }
    }

    let mut ready: BTreeSet<usize> = (0..resources.len()).filter(|&i| pending[i] == 0).collect();
    let mut order = Vec::with_capacity(resources.len());
    while let Some(next) = ready.pop_first() {
        order.push(next);
        for &dependent in &dependents[next] {
            pending[dependent] -= 1;
            if pending[dependent] == 0 {
                ready.insert(dependent);
            }
        }
    }
    order
}
