//! Backend stack: session store, API function, REST API and its DNS record

use crate::error::Result;
use crate::model::{
    AccessLevel, AliasRecord, AttributeType, CertificateRef, EndpointType, EnvironmentDescriptor,
    Function, HostedZoneRef, InfraConfig, ResourceKind, ResourceTopology, RestApi, SessionStore,
    StackComponent, TopologyBuilder,
};
use crate::naming::{ZONE_NAME, physical_name, relative_record_name};
use std::collections::BTreeMap;

/// Logical API domain before stage derivation
pub const API_DOMAIN: &str = "api.antalmanac.com";

pub const SESSION_PARTITION_KEY: &str = "sessionId";
pub const SESSION_TTL_ATTRIBUTE: &str = "expires";

pub const FUNCTION_RUNTIME: &str = "nodejs14.x";
pub const FUNCTION_HANDLER: &str = "lambda.handler";
pub const FUNCTION_CODE_ASSET: &str = "functions/antalmanac-backend";

/// Declare the backend stack for `env`.
pub fn compose_backend(env: &EnvironmentDescriptor, config: &InfraConfig) -> Result<ResourceTopology> {
    let stage = env.stage_name();
    let mut builder = TopologyBuilder::new(env.stack_name(StackComponent::Backend), env.clone());

    let table_name = format!("antalmanac-session-store-{}", stage);
    let store = builder.declare(
        format!("antalmanac-session-store-ddb-{}", stage),
        ResourceKind::SessionStore(SessionStore {
            table_name: table_name.clone(),
            partition_key: SESSION_PARTITION_KEY.to_string(),
            partition_key_type: AttributeType::String,
            time_to_live_attribute: SESSION_TTL_ATTRIBUTE.to_string(),
        }),
    );

    let function = builder.declare(
        format!("antalmanac-api-{}-lambda", stage),
        ResourceKind::Function(api_function(env, config, &table_name)),
    );
    builder.grant(&function, &store, AccessLevel::FullAccess);

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

    let api_domain = physical_name(API_DOMAIN, env);
    let api = builder.declare(
        format!("antalmanac-api-gateway-{}", stage),
        ResourceKind::RestApi(RestApi {
            name: format!("antalmanac-api-gateway-{}", stage),
            domain_name: api_domain.clone(),
            endpoint_type: EndpointType::Edge,
        }),
    );
    builder.route(&api, &function);
    builder.reference(&api, &certificate);

    let record = builder.declare(
        format!("antalmanac-backend-a-record-{}", stage),
        ResourceKind::AliasRecord(AliasRecord {
            record_name: relative_record_name(&api_domain),
            fqdn: api_domain,
        }),
    );
    builder.reference(&record, &zone);
    builder.route(&record, &api);

    builder.build()
}

/// API handler function with its stage-dependent environment.
///
/// Unset values are left out of the environment and recorded as missing.
fn api_function(env: &EnvironmentDescriptor, config: &InfraConfig, table_name: &str) -> Function {
    let deployment = env.deployment();
    let secrets = &config.secrets;

    let candidates: [(&str, Option<&str>); 6] = [
        ("AA_MONGODB_URI", secrets.mongodb_uri_for(deployment)),
        ("ISPROD", Some(if deployment.is_production() { "true" } else { "false" })),
        ("GOOGLE_CLIENT", secrets.google_client.as_deref()),
        ("GOOGLE_SECRET", secrets.google_secret.as_deref()),
        ("SESSION_SECRET", secrets.session_secret.as_deref()),
        ("SESSION_DDB_NAME", Some(table_name)),
    ];

    let mut environment = BTreeMap::new();
    let mut missing_environment = Vec::new();
    for (name, value) in candidates {
        match value {
            Some(value) => {
                environment.insert(name.to_string(), value.to_string());
            }
            None => {
                tracing::warn!(
                    stage = %env.stage_name(),
                    variable = name,
                    "No value configured for function environment variable"
                );
                missing_environment.push(name.to_string());
            }
        }
    }

    Function {
        runtime: FUNCTION_RUNTIME.to_string(),
        handler: FUNCTION_HANDLER.to_string(),
        code_asset: FUNCTION_CODE_ASSET.to_string(),
        environment,
        missing_environment,
    }
}
