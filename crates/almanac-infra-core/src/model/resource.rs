//! Declared cloud resources
//!
//! Resource payloads hold only their own settings. Wiring between resources
//! (which function an API invokes, which bucket a distribution fronts, ...)
//! lives exclusively on topology edges.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Logical identifier of a resource inside one stack
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(String);

impl ResourceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ResourceId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ResourceId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A declared resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub id: ResourceId,
    #[serde(flatten)]
    pub kind: ResourceKind,
}

/// Resource type tag, used for filtering and reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceType {
    SessionStore,
    Function,
    RestApi,
    HostedZone,
    Certificate,
    AliasRecord,
    Bucket,
    OriginAccessIdentity,
    BucketPolicy,
    Distribution,
    BucketDeployment,
}

impl ResourceType {
    pub const ALL: [ResourceType; 11] = [
        ResourceType::SessionStore,
        ResourceType::Function,
        ResourceType::RestApi,
        ResourceType::HostedZone,
        ResourceType::Certificate,
        ResourceType::AliasRecord,
        ResourceType::Bucket,
        ResourceType::OriginAccessIdentity,
        ResourceType::BucketPolicy,
        ResourceType::Distribution,
        ResourceType::BucketDeployment,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::SessionStore => "session-store",
            ResourceType::Function => "function",
            ResourceType::RestApi => "rest-api",
            ResourceType::HostedZone => "hosted-zone",
            ResourceType::Certificate => "certificate",
            ResourceType::AliasRecord => "alias-record",
            ResourceType::Bucket => "bucket",
            ResourceType::OriginAccessIdentity => "origin-access-identity",
            ResourceType::BucketPolicy => "bucket-policy",
            ResourceType::Distribution => "distribution",
            ResourceType::BucketDeployment => "bucket-deployment",
        }
    }

    /// Imported resources already exist outside the stack and are only
    /// looked up, never created.
    pub fn is_import(&self) -> bool {
        matches!(self, ResourceType::HostedZone | ResourceType::Certificate)
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resource-specific settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ResourceKind {
    SessionStore(SessionStore),
    Function(Function),
    RestApi(RestApi),
    HostedZone(HostedZoneRef),
    Certificate(CertificateRef),
    AliasRecord(AliasRecord),
    Bucket(Bucket),
    OriginAccessIdentity(OriginAccessIdentity),
    BucketPolicy(BucketPolicy),
    Distribution(Distribution),
    BucketDeployment(BucketDeployment),
}

impl ResourceKind {
    pub fn resource_type(&self) -> ResourceType {
        match self {
            ResourceKind::SessionStore(_) => ResourceType::SessionStore,
            ResourceKind::Function(_) => ResourceType::Function,
            ResourceKind::RestApi(_) => ResourceType::RestApi,
            ResourceKind::HostedZone(_) => ResourceType::HostedZone,
            ResourceKind::Certificate(_) => ResourceType::Certificate,
            ResourceKind::AliasRecord(_) => ResourceType::AliasRecord,
            ResourceKind::Bucket(_) => ResourceType::Bucket,
            ResourceKind::OriginAccessIdentity(_) => ResourceType::OriginAccessIdentity,
            ResourceKind::BucketPolicy(_) => ResourceType::BucketPolicy,
            ResourceKind::Distribution(_) => ResourceType::Distribution,
            ResourceKind::BucketDeployment(_) => ResourceType::BucketDeployment,
        }
    }
}

/// Key attribute type of a table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributeType {
    String,
    Number,
    Binary,
}

/// Key-value session store (DynamoDB table).
///
/// Items whose `time_to_live_attribute` lies in the past are evicted by the
/// store itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStore {
    pub table_name: String,
    pub partition_key: String,
    pub partition_key_type: AttributeType,
    pub time_to_live_attribute: String,
}

/// API handler function (Lambda)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Function {
    pub runtime: String,
    pub handler: String,
    /// Directory packaged as the function code
    pub code_asset: String,
    pub environment: BTreeMap<String, String>,
    /// Variables left out of `environment` because no value was configured
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing_environment: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EndpointType {
    Edge,
    Regional,
}

/// HTTP entry point proxying every request to its handler function
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestApi {
    pub name: String,
    pub domain_name: String,
    pub endpoint_type: EndpointType,
}

/// Existing Route 53 zone, looked up by id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostedZoneRef {
    pub zone_name: String,
    pub hosted_zone_id: Option<String>,
}

/// Existing ACM certificate, looked up by ARN
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateRef {
    pub certificate_arn: Option<String>,
}

/// A record aliasing a name in the zone to its route target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasRecord {
    /// Name relative to the zone (`dev.api`), or the zone apex itself
    pub record_name: String,
    /// Fully qualified name the record answers for
    pub fqdn: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemovalPolicy {
    /// Resource and contents are deleted with the stack
    Destroy,
    Retain,
}

/// Object storage bucket for the built website
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bucket {
    pub bucket_name: String,
    pub removal_policy: RemovalPolicy,
    /// Empty the bucket before deleting it
    pub auto_delete_objects: bool,
}

/// Identity the distribution uses to read from the bucket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OriginAccessIdentity {
    pub comment: String,
}

/// Resource policy attached to a bucket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketPolicy {
    pub actions: Vec<String>,
    /// Object ARN pattern the statement covers
    pub resource_arn: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllowedMethods {
    GetHead,
    GetHeadOptions,
    All,
}

impl AllowedMethods {
    pub fn methods(&self) -> &'static [&'static str] {
        match self {
            AllowedMethods::GetHead => &["GET", "HEAD"],
            AllowedMethods::GetHeadOptions => &["GET", "HEAD", "OPTIONS"],
            AllowedMethods::All => &["DELETE", "GET", "HEAD", "OPTIONS", "PATCH", "POST", "PUT"],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ViewerProtocolPolicy {
    AllowAll,
    RedirectToHttps,
    HttpsOnly,
}

impl ViewerProtocolPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViewerProtocolPolicy::AllowAll => "allow-all",
            ViewerProtocolPolicy::RedirectToHttps => "redirect-to-https",
            ViewerProtocolPolicy::HttpsOnly => "https-only",
        }
    }
}

/// CDN distribution in front of the website bucket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Distribution {
    pub domain_names: Vec<String>,
    pub default_root_object: String,
    pub allowed_methods: AllowedMethods,
    pub viewer_protocol_policy: ViewerProtocolPolicy,
}

/// Upload of pre-built assets followed by a cache invalidation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketDeployment {
    pub source: String,
    pub distribution_paths: Vec<String>,
}
