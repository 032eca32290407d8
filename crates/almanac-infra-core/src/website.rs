//! Website stack: asset bucket, origin identity, distribution, DNS record
//! and the asset upload

use crate::error::Result;
use crate::model::{
    AccessLevel, AliasRecord, AllowedMethods, Bucket, BucketDeployment, BucketPolicy,
    CertificateRef, Deployment, Distribution, EnvironmentDescriptor, HostedZoneRef, InfraConfig,
    OriginAccessIdentity, RemovalPolicy, ResourceKind, ResourceTopology, StackComponent,
    TopologyBuilder, ViewerProtocolPolicy, WebsiteDomainPolicy,
};
use crate::naming::{NON_PRODUCTION_LABEL, ZONE_NAME, derive_name, physical_name, relative_record_name};

/// Logical website domain before stage derivation
pub const WEBSITE_DOMAIN: &str = ZONE_NAME;

/// Directory holding the built frontend
pub const ASSET_DIRECTORY: &str = "./functions/AntAlmanac/build";

pub const DEFAULT_ROOT_OBJECT: &str = "index.html";

/// Paths invalidated after every upload
pub const INVALIDATION_PATHS: &[&str] = &["/*"];

/// Declare the website stack for `env`.
///
/// The bucket is created with `RemovalPolicy::Destroy` and auto-deleted
/// contents: tearing the stack down wipes the site. Acceptable for the
/// throwaway `dev` site, not for anything that must survive a teardown.
pub fn compose_website(env: &EnvironmentDescriptor, config: &InfraConfig) -> Result<ResourceTopology> {
    let stage = env.stage_name();
    let mut builder = TopologyBuilder::new(env.stack_name(StackComponent::Website), env.clone());

    let bucket_name = physical_name(WEBSITE_DOMAIN, env);
    let bucket = builder.declare(
        format!("antalmanac-website-bucket-{}", stage),
        ResourceKind::Bucket(Bucket {
            bucket_name: bucket_name.clone(),
            removal_policy: RemovalPolicy::Destroy,
            auto_delete_objects: true,
        }),
    );

    let identity = builder.declare(
        "cloudfront-OAI",
        ResourceKind::OriginAccessIdentity(OriginAccessIdentity {
            comment: format!("Identity for {}", bucket_name),
        }),
    );

    let policy = builder.declare(
        format!("antalmanac-website-bucket-{}-policy", stage),
        ResourceKind::BucketPolicy(BucketPolicy {
            actions: AccessLevel::Read.actions().iter().map(|a| a.to_string()).collect(),
            resource_arn: format!("arn:aws:s3:::{}/*", bucket_name),
        }),
    );
    builder.reference(&policy, &bucket);
    builder.reference(&policy, &identity);
    builder.grant(&identity, &bucket, AccessLevel::Read);

    let zone = builder.declare(
        format!("antalmanac-DNS-{}", stage),
        ResourceKind::HostedZone(HostedZoneRef {
            zone_name: ZONE_NAME.to_string(),
            hosted_zone_id: config.hosted_zone_id.clone(),
        }),
    );
    let certificate = builder.declare(
        format!("api-gateway-cert-{}", stage),
        ResourceKind::Certificate(CertificateRef {
            certificate_arn: config.certificate_arn.clone(),
        }),
    );

    let site_domain = website_domain(env, config.website_domain);
    let distribution = builder.declare(
        "Distribution",
        ResourceKind::Distribution(Distribution {
            domain_names: vec![site_domain.clone()],
            default_root_object: DEFAULT_ROOT_OBJECT.to_string(),
            allowed_methods: AllowedMethods::GetHeadOptions,
            viewer_protocol_policy: ViewerProtocolPolicy::RedirectToHttps,
        }),
    );
    builder.route(&distribution, &bucket);
    builder.reference(&distribution, &identity);
    builder.reference(&distribution, &certificate);

    let record = builder.declare(
        format!("antalmanac-frontend-a-record-{}", stage),
        ResourceKind::AliasRecord(AliasRecord {
            record_name: relative_record_name(&site_domain),
            fqdn: site_domain,
        }),
    );
    builder.reference(&record, &zone);
    builder.route(&record, &distribution);

    let deployment = builder.declare(
        "deployAntalmanacToBucket",
        ResourceKind::BucketDeployment(BucketDeployment {
            source: ASSET_DIRECTORY.to_string(),
            distribution_paths: INVALIDATION_PATHS.iter().map(|p| p.to_string()).collect(),
        }),
    );
    builder.grant(&deployment, &bucket, AccessLevel::Write);
    builder.grant(&deployment, &distribution, AccessLevel::Invalidate);

    builder.build()
}

/// Domain served by the distribution.
///
/// Under [`WebsiteDomainPolicy::Pinned`] this is always `dev.antalmanac.com`,
/// even when the bucket name follows another stage.
fn website_domain(env: &EnvironmentDescriptor, policy: WebsiteDomainPolicy) -> String {
    match policy {
        WebsiteDomainPolicy::Pinned => {
            if matches!(env.deployment(), Deployment::Production) {
                tracing::warn!(
                    stage = %env.stage_name(),
                    "Website domain is pinned to the dev label on a production stage; \
                     set ALMANAC_WEBSITE_DOMAIN=stage to derive it from the stage"
                );
            }
            derive_name(WEBSITE_DOMAIN, NON_PRODUCTION_LABEL)
        }
        WebsiteDomainPolicy::StageDerived => physical_name(WEBSITE_DOMAIN, env),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AccessGrant, ResourceId, ResourceType};

    fn dev() -> EnvironmentDescriptor {
        EnvironmentDescriptor::for_stage("dev", "us-east-1", Some("123".to_string()))
    }

    fn bucket_of(topology: &ResourceTopology) -> &Bucket {
        match &topology.resources_of(ResourceType::Bucket)[0].kind {
            ResourceKind::Bucket(b) => b,
            other => panic!("expected bucket, got {:?}", other),
        }
    }

    fn distribution_of(topology: &ResourceTopology) -> &Distribution {
        match &topology.resources_of(ResourceType::Distribution)[0].kind {
            ResourceKind::Distribution(d) => d,
            other => panic!("expected distribution, got {:?}", other),
        }
    }

    #[test]
    fn test_dev_website() {
        let topology = compose_website(&dev(), &InfraConfig::default()).unwrap();
        assert_eq!(topology.stack_name(), "dev-us-east-1-Website");

        let bucket = bucket_of(&topology);
        assert_eq!(bucket.bucket_name, "dev.antalmanac.com");
        assert_eq!(bucket.removal_policy, RemovalPolicy::Destroy);
        assert!(bucket.auto_delete_objects);

        let distribution = distribution_of(&topology);
        assert_eq!(distribution.domain_names, vec!["dev.antalmanac.com"]);
        assert_eq!(distribution.default_root_object, "index.html");
        assert_eq!(distribution.allowed_methods, AllowedMethods::GetHeadOptions);
        assert_eq!(distribution.viewer_protocol_policy, ViewerProtocolPolicy::RedirectToHttps);

        let record = topology.resources_of(ResourceType::AliasRecord)[0];
        match &record.kind {
            ResourceKind::AliasRecord(alias) => assert_eq!(alias.record_name, "dev"),
            other => panic!("expected alias record, got {:?}", other),
        }
        assert_eq!(
            topology.route_target(&record.id).map(|r| r.id.as_str()),
            Some("Distribution")
        );
    }

    #[test]
    fn test_distribution_fronts_bucket_through_identity() {
        let topology = compose_website(&dev(), &InfraConfig::default()).unwrap();
        let distribution = ResourceId::new("Distribution");

        assert_eq!(
            topology.route_target(&distribution).map(|r| r.id.as_str()),
            Some("antalmanac-website-bucket-dev")
        );
        assert!(
            topology
                .linked(&distribution, ResourceType::OriginAccessIdentity)
                .is_some()
        );
        assert!(topology.linked(&distribution, ResourceType::Certificate).is_some());
    }

    #[test]
    fn test_bucket_read_is_scoped_to_identity() {
        let topology = compose_website(&dev(), &InfraConfig::default()).unwrap();
        let bucket = ResourceId::new("antalmanac-website-bucket-dev");

        let readers: Vec<AccessGrant> = topology
            .access_grants()
            .into_iter()
            .filter(|g| g.target == bucket && g.access == AccessLevel::Read)
            .collect();
        assert_eq!(readers.len(), 1);
        assert_eq!(readers[0].principal, ResourceId::new("cloudfront-OAI"));

        let policy = topology.resources_of(ResourceType::BucketPolicy)[0];
        match &policy.kind {
            ResourceKind::BucketPolicy(p) => {
                assert_eq!(p.actions, vec!["s3:GetObject"]);
                assert_eq!(p.resource_arn, "arn:aws:s3:::dev.antalmanac.com/*");
            }
            other => panic!("expected bucket policy, got {:?}", other),
        }
    }

    #[test]
    fn test_deployment_uploads_and_invalidates() {
        let topology = compose_website(&dev(), &InfraConfig::default()).unwrap();
        let deployment = topology.resources_of(ResourceType::BucketDeployment)[0];
        match &deployment.kind {
            ResourceKind::BucketDeployment(d) => {
                assert_eq!(d.source, "./functions/AntAlmanac/build");
                assert_eq!(d.distribution_paths, vec!["/*"]);
            }
            other => panic!("expected bucket deployment, got {:?}", other),
        }

        let grants: Vec<_> = topology
            .access_grants()
            .into_iter()
            .filter(|g| g.principal == deployment.id)
            .map(|g| (g.target.to_string(), g.access))
            .collect();
        assert_eq!(
            grants,
            vec![
                ("antalmanac-website-bucket-dev".to_string(), AccessLevel::Write),
                ("Distribution".to_string(), AccessLevel::Invalidate),
            ]
        );

        // the upload runs last
        let order = topology.creation_order();
        assert_eq!(order.last().map(|id| id.as_str()), Some("deployAntalmanacToBucket"));
    }

    #[test]
    fn test_pinned_domain_on_prod_keeps_dev_label() {
        let prod = EnvironmentDescriptor::for_stage("prod", "us-west-1", None);
        let topology = compose_website(&prod, &InfraConfig::default()).unwrap();

        assert_eq!(bucket_of(&topology).bucket_name, "antalmanac.com");
        assert_eq!(distribution_of(&topology).domain_names, vec!["dev.antalmanac.com"]);
    }

    #[test]
    fn test_stage_derived_domain_on_prod() {
        let prod = EnvironmentDescriptor::for_stage("prod", "us-west-1", None);
        let config = InfraConfig {
            website_domain: WebsiteDomainPolicy::StageDerived,
            ..Default::default()
        };
        let topology = compose_website(&prod, &config).unwrap();

        assert_eq!(distribution_of(&topology).domain_names, vec!["antalmanac.com"]);
        match &topology.resources_of(ResourceType::AliasRecord)[0].kind {
            ResourceKind::AliasRecord(alias) => assert_eq!(alias.record_name, "antalmanac.com"),
            other => panic!("expected alias record, got {:?}", other),
        }
    }
}
