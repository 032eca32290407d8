//! CloudFormation-shaped template rendering
//!
//! Imported resources (hosted zone, certificate) are not created by the stack;
//! they land in an `Imports` section and are referenced by their literal id.
//! Values that were never configured render as `null` and are listed under
//! `Metadata.UnresolvedReferences` so the engine rejects them at apply time.

use crate::error::{Result, SynthError};
use almanac_infra_core::{
    AttributeType, RemovalPolicy, Resource, ResourceId, ResourceKind, ResourceTopology,
    ResourceType,
};
use serde_json::{Map, Value, json};
use std::fmt;
use std::str::FromStr;

pub const TEMPLATE_FORMAT_VERSION: &str = "2010-09-09";

/// On-disk template encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TemplateFormat {
    #[default]
    Json,
    Yaml,
}

impl TemplateFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            TemplateFormat::Json => "json",
            TemplateFormat::Yaml => "yaml",
        }
    }

    pub fn encode(&self, value: &Value) -> Result<String> {
        match self {
            TemplateFormat::Json => Ok(serde_json::to_string_pretty(value)?),
            TemplateFormat::Yaml => Ok(serde_yaml::to_string(value)?),
        }
    }
}

impl FromStr for TemplateFormat {
    type Err = SynthError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(TemplateFormat::Json),
            "yaml" | "yml" => Ok(TemplateFormat::Yaml),
            other => Err(SynthError::UnsupportedFormat(other.to_string())),
        }
    }
}

impl fmt::Display for TemplateFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Provider type name for a resource type
pub fn cloudformation_type(resource_type: ResourceType) -> &'static str {
    match resource_type {
        ResourceType::SessionStore => "AWS::DynamoDB::Table",
        ResourceType::Function => "AWS::Lambda::Function",
        ResourceType::RestApi => "AWS::ApiGateway::RestApi",
        ResourceType::HostedZone => "AWS::Route53::HostedZone",
        ResourceType::Certificate => "AWS::CertificateManager::Certificate",
        ResourceType::AliasRecord => "AWS::Route53::RecordSet",
        ResourceType::Bucket => "AWS::S3::Bucket",
        ResourceType::OriginAccessIdentity => "AWS::CloudFront::CloudFrontOriginAccessIdentity",
        ResourceType::BucketPolicy => "AWS::S3::BucketPolicy",
        ResourceType::Distribution => "AWS::CloudFront::Distribution",
        ResourceType::BucketDeployment => "Custom::BucketDeployment",
    }
}

/// Render one stack
pub fn render_template(topology: &ResourceTopology) -> Value {
    let mut resources = Map::new();
    let mut imports = Map::new();

    for resource in topology.resources() {
        let resource_type = resource.kind.resource_type();
        if resource_type.is_import() {
            imports.insert(resource.id.to_string(), import_entry(resource));
            continue;
        }

        let mut entry = Map::new();
        entry.insert("Type".into(), json!(cloudformation_type(resource_type)));
        entry.insert("Properties".into(), properties(topology, resource));

        let depends_on: Vec<&str> = topology
            .dependencies_of(&resource.id)
            .into_iter()
            .filter(|dep| !is_import(topology, dep))
            .map(|dep| dep.as_str())
            .collect();
        if !depends_on.is_empty() {
            entry.insert("DependsOn".into(), json!(depends_on));
        }

        if let ResourceKind::Bucket(bucket) = &resource.kind {
            let policy = match bucket.removal_policy {
                RemovalPolicy::Destroy => "Delete",
                RemovalPolicy::Retain => "Retain",
            };
            entry.insert("DeletionPolicy".into(), json!(policy));
            entry.insert(
                "Metadata".into(),
                json!({ "AutoDeleteObjects": bucket.auto_delete_objects }),
            );
        }

        resources.insert(resource.id.to_string(), Value::Object(entry));
    }

    let env = topology.environment();
    let grants: Vec<Value> = topology
        .access_grants()
        .iter()
        .map(|g| {
            json!({
                "Principal": g.principal.as_str(),
                "Target": g.target.as_str(),
                "Access": g.access.to_string(),
                "Actions": g.access.actions(),
            })
        })
        .collect();
    let unresolved: Vec<Value> = topology
        .unresolved_references()
        .iter()
        .map(|u| {
            json!({
                "Resource": u.resource.as_ref().map(|r| r.as_str()),
                "Setting": u.setting,
            })
        })
        .collect();
    let creation_order: Vec<&str> = topology
        .creation_order()
        .into_iter()
        .map(|id| id.as_str())
        .collect();

    json!({
        "AWSTemplateFormatVersion": TEMPLATE_FORMAT_VERSION,
        "Description": format!("AntAlmanac {} ({})", topology.stack_name(), env.deployment()),
        "Metadata": {
            "StackName": topology.stack_name(),
            "Environment": env.environment_uri(),
            "Stage": env.stage_name(),
            "Region": env.region(),
            "CreationOrder": creation_order,
            "AccessGrants": grants,
            "UnresolvedReferences": unresolved,
        },
        "Imports": imports,
        "Resources": resources,
    })
}

/// Render one stack straight to text
pub fn render_stack(topology: &ResourceTopology, format: TemplateFormat) -> Result<String> {
    format.encode(&render_template(topology))
}

fn is_import(topology: &ResourceTopology, id: &ResourceId) -> bool {
    topology
        .resource(id)
        .is_some_and(|r| r.kind.resource_type().is_import())
}

fn import_entry(resource: &Resource) -> Value {
    let resource_type = cloudformation_type(resource.kind.resource_type());
    match &resource.kind {
        ResourceKind::HostedZone(zone) => json!({
            "Type": resource_type,
            "ZoneName": zone.zone_name,
            "HostedZoneId": zone.hosted_zone_id,
        }),
        ResourceKind::Certificate(cert) => json!({
            "Type": resource_type,
            "CertificateArn": cert.certificate_arn,
        }),
        _ => json!({ "Type": resource_type }),
    }
}

/// Literal id for imports, `{"Ref": id}` for everything created in the stack
fn ref_value(resource: &Resource) -> Value {
    match &resource.kind {
        ResourceKind::HostedZone(zone) => json!(zone.hosted_zone_id),
        ResourceKind::Certificate(cert) => json!(cert.certificate_arn),
        _ => json!({ "Ref": resource.id.as_str() }),
    }
}

fn get_att(resource: &Resource, attribute: &str) -> Value {
    json!({ "Fn::GetAtt": [resource.id.as_str(), attribute] })
}

/// First resource of `resource_type` reachable over any edge from `id`
fn related<'a>(
    topology: &'a ResourceTopology,
    id: &'a ResourceId,
    resource_type: ResourceType,
) -> Option<&'a Resource> {
    topology
        .edges_from(id)
        .filter_map(|e| topology.resource(&e.to))
        .find(|r| r.kind.resource_type() == resource_type)
}

fn related_ref(topology: &ResourceTopology, id: &ResourceId, resource_type: ResourceType) -> Value {
    related(topology, id, resource_type)
        .map(ref_value)
        .unwrap_or(Value::Null)
}

fn properties(topology: &ResourceTopology, resource: &Resource) -> Value {
    let id = &resource.id;
    match &resource.kind {
        ResourceKind::SessionStore(store) => {
            let attribute_type = match store.partition_key_type {
                AttributeType::String => "S",
                AttributeType::Number => "N",
                AttributeType::Binary => "B",
            };
            json!({
                "TableName": store.table_name,
                "KeySchema": [{ "AttributeName": store.partition_key, "KeyType": "HASH" }],
                "AttributeDefinitions": [{
                    "AttributeName": store.partition_key,
                    "AttributeType": attribute_type,
                }],
                "TimeToLiveSpecification": {
                    "AttributeName": store.time_to_live_attribute,
                    "Enabled": true,
                },
            })
        }
        ResourceKind::Function(function) => {
            let mut variables: Map<String, Value> = function
                .environment
                .iter()
                .map(|(k, v)| (k.clone(), json!(v)))
                .collect();
            for name in &function.missing_environment {
                variables.insert(name.clone(), Value::Null);
            }
            let granted: Vec<Value> = topology
                .access_grants()
                .iter()
                .filter(|g| &g.principal == id)
                .map(|g| json!({ "Target": { "Ref": g.target.as_str() }, "Actions": g.access.actions() }))
                .collect();
            json!({
                "Runtime": function.runtime,
                "Handler": function.handler,
                "Code": { "AssetPath": function.code_asset },
                "Environment": { "Variables": variables },
                "Permissions": granted,
            })
        }
        ResourceKind::RestApi(api) => {
            let handler = topology
                .route_target(id)
                .map(|f| get_att(f, "Arn"))
                .unwrap_or(Value::Null);
            json!({
                "Name": api.name,
                "EndpointConfiguration": { "Types": [api.endpoint_type] },
                "DomainName": {
                    "DomainName": api.domain_name,
                    "CertificateArn": related_ref(topology, id, ResourceType::Certificate),
                },
                "ProxyIntegration": { "Type": "AWS_PROXY", "FunctionArn": handler },
            })
        }
        ResourceKind::AliasRecord(record) => {
            let alias_target = topology
                .route_target(id)
                .map(|target| get_att(target, "DomainName"))
                .unwrap_or(Value::Null);
            json!({
                "Name": format!("{}.", record.fqdn),
                "Type": "A",
                "HostedZoneId": related_ref(topology, id, ResourceType::HostedZone),
                "AliasTarget": { "DNSName": alias_target },
            })
        }
        ResourceKind::Bucket(bucket) => json!({ "BucketName": bucket.bucket_name }),
        ResourceKind::OriginAccessIdentity(oai) => json!({
            "CloudFrontOriginAccessIdentityConfig": { "Comment": oai.comment },
        }),
        ResourceKind::BucketPolicy(policy) => {
            let principal = related(topology, id, ResourceType::OriginAccessIdentity)
                .map(|oai| get_att(oai, "S3CanonicalUserId"))
                .unwrap_or(Value::Null);
            json!({
                "Bucket": related_ref(topology, id, ResourceType::Bucket),
                "PolicyDocument": {
                    "Statement": [{
                        "Effect": "Allow",
                        "Action": policy.actions,
                        "Resource": policy.resource_arn,
                        "Principal": { "CanonicalUser": principal },
                    }],
                },
            })
        }
        ResourceKind::Distribution(distribution) => {
            let origin = topology.route_target(id);
            let origin_id = origin.map(|o| o.id.as_str());
            let origin_domain = origin
                .map(|o| get_att(o, "RegionalDomainName"))
                .unwrap_or(Value::Null);
            json!({
                "DistributionConfig": {
                    "Enabled": true,
                    "Aliases": distribution.domain_names,
                    "DefaultRootObject": distribution.default_root_object,
                    "ViewerCertificate": {
                        "AcmCertificateArn": related_ref(topology, id, ResourceType::Certificate),
                        "SslSupportMethod": "sni-only",
                    },
                    "DefaultCacheBehavior": {
                        "TargetOriginId": origin_id,
                        "AllowedMethods": distribution.allowed_methods.methods(),
                        "ViewerProtocolPolicy": distribution.viewer_protocol_policy.as_str(),
                    },
                    "Origins": [{
                        "Id": origin_id,
                        "DomainName": origin_domain,
                        "S3OriginConfig": {
                            "OriginAccessIdentity": related_ref(topology, id, ResourceType::OriginAccessIdentity),
                        },
                    }],
                },
            })
        }
        ResourceKind::BucketDeployment(deployment) => json!({
            "SourcePath": deployment.source,
            "DestinationBucketName": related_ref(topology, id, ResourceType::Bucket),
            "DistributionId": related_ref(topology, id, ResourceType::Distribution),
            "DistributionPaths": deployment.distribution_paths,
        }),
        ResourceKind::HostedZone(_) | ResourceKind::Certificate(_) => json!({}),
    }
}
