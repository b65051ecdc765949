//! azurerm_hdinsight_hadoop_cluster

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use serde_json::json;
use stratus_core::provider::{ProviderError, ProviderResult};
use stratus_core::resource::{Resource, ResourceId, State, Value};
use stratus_core::schema::ResourceSchema;
use stratus_core::timeouts::{OperationContext, ResourceTimeouts};
use url::Url;

use super::{
    ResourceHandler, Session, call, call_optional, delete_tolerant, ensure_absent, gone, mutate,
    refreshed, tag,
};
use crate::fields::{Fields, single_block, string_map};
use crate::ids::ClusterId;
use crate::schemas::hdinsight::{HEAD_NODE, WORKER_NODE, ZOOKEEPER_NODE, hadoop_cluster_schema};
use crate::schemas::types::normalize_location;
use crate::sdk::hdinsight::{
    Cluster, ClusterCreateParametersExtended, ClusterCreateProperties, ClusterDefinition,
    ClusterPatchParameters, ClusterResizeParameters, ComputeProfile, GatewaySettings,
    HardwareProfile, LinuxOperatingSystemProfile, OsProfile, ROLE_HEAD_NODE, ROLE_WORKER_NODE,
    ROLE_ZOOKEEPER_NODE, Role, SshProfile, SshPublicKey, StorageAccount, StorageProfile,
    VirtualNetworkProfile,
};

const TYPE_NAME: &str = "azurerm_hdinsight_hadoop_cluster";
const CLUSTER_KIND: &str = "hadoop";
const COMPONENT: &str = "Hadoop";
const OS_TYPE: &str = "Linux";

/// Head and ZooKeeper nodes come in fixed numbers
const HEAD_NODE_COUNT: i64 = 2;
const ZOOKEEPER_NODE_COUNT: i64 = 3;

const TIERS: [&str; 2] = ["Standard", "Premium"];

// =============================================================================
// Configuration
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeDefinition {
    pub vm_size: String,
    pub username: String,
    pub password: Option<String>,
    pub ssh_keys: Vec<String>,
    pub subnet_id: Option<String>,
    pub virtual_network_id: Option<String>,
    pub target_instance_count: Option<i64>,
}

impl NodeDefinition {
    fn expand(block: &str, fields: &Fields) -> ProviderResult<Self> {
        let password = fields.str("password").map(str::to_string);
        let ssh_keys = fields.strings("ssh_keys");
        if password.is_some() == !ssh_keys.is_empty() {
            return Err(ProviderError::validation(format!(
                "`{}` needs exactly one of `password` or `ssh_keys`",
                block
            )));
        }

        let subnet_id = fields.str("subnet_id").map(str::to_string);
        let virtual_network_id = fields.str("virtual_network_id").map(str::to_string);
        if subnet_id.is_some() != virtual_network_id.is_some() {
            return Err(ProviderError::validation(format!(
                "`{}` needs both `subnet_id` and `virtual_network_id`, or neither",
                block
            )));
        }

        Ok(Self {
            vm_size: fields.required_str("vm_size")?.to_string(),
            username: fields.required_str("username")?.to_string(),
            password,
            ssh_keys,
            subnet_id,
            virtual_network_id,
            target_instance_count: fields.int("target_instance_count"),
        })
    }

    fn to_role(&self, name: &str, count: i64) -> Role {
        let ssh_profile = (!self.ssh_keys.is_empty()).then(|| SshProfile {
            public_keys: self
                .ssh_keys
                .iter()
                .map(|key| SshPublicKey {
                    certificate_data: Some(key.clone()),
                })
                .collect(),
        });
        let virtual_network_profile = match (&self.virtual_network_id, &self.subnet_id) {
            (Some(id), Some(subnet)) => Some(VirtualNetworkProfile {
                id: Some(id.clone()),
                subnet: Some(subnet.clone()),
            }),
            _ => None,
        };
        Role {
            name: name.to_string(),
            target_instance_count: Some(count),
            hardware_profile: Some(HardwareProfile {
                vm_size: Some(self.vm_size.clone()),
            }),
            os_profile: Some(OsProfile {
                linux_operating_system_profile: Some(LinuxOperatingSystemProfile {
                    username: Some(self.username.clone()),
                    password: self.password.clone(),
                    ssh_profile,
                }),
            }),
            virtual_network_profile,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Roles {
    pub head_node: NodeDefinition,
    pub worker_node: NodeDefinition,
    pub zookeeper_node: NodeDefinition,
}

impl Roles {
    pub fn expand(fields: &Fields) -> ProviderResult<Self> {
        let node = |name: &str| -> ProviderResult<NodeDefinition> {
            NodeDefinition::expand(name, &fields.required_block(name)?)
        };
        let roles = Self {
            head_node: node(HEAD_NODE)?,
            worker_node: node(WORKER_NODE)?,
            zookeeper_node: node(ZOOKEEPER_NODE)?,
        };
        if roles.worker_node.target_instance_count.is_none() {
            return Err(ProviderError::validation(
                "`worker_node` needs `target_instance_count`",
            ));
        }
        Ok(roles)
    }

    pub fn worker_count(&self) -> i64 {
        self.worker_node.target_instance_count.unwrap_or_default()
    }

    pub fn compute_profile(&self) -> ComputeProfile {
        ComputeProfile {
            roles: vec![
                self.head_node.to_role(ROLE_HEAD_NODE, HEAD_NODE_COUNT),
                self.worker_node.to_role(ROLE_WORKER_NODE, self.worker_count()),
                self.zookeeper_node
                    .to_role(ROLE_ZOOKEEPER_NODE, ZOOKEEPER_NODE_COUNT),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gateway {
    pub enabled: bool,
    pub username: String,
    pub password: String,
}

impl Gateway {
    pub fn expand(fields: &Fields) -> ProviderResult<Self> {
        Ok(Self {
            enabled: fields.bool_or("enabled", true),
            username: fields.required_str("username")?.to_string(),
            password: fields.required_str("password")?.to_string(),
        })
    }

    pub fn settings(&self) -> GatewaySettings {
        GatewaySettings {
            is_enabled: Some(serde_json::Value::Bool(self.enabled)),
            username: Some(self.username.clone()),
            password: Some(self.password.clone()),
        }
    }
}

/// One storage account attached to the cluster
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterStorage {
    /// Blob endpoint host, e.g. `acct1.blob.core.windows.net`
    pub account: String,
    pub container: String,
    pub key: String,
    pub is_default: bool,
}

impl ClusterStorage {
    pub fn expand(fields: &Fields) -> ProviderResult<Self> {
        let container_id = fields.required_str("storage_container_id")?;
        let (account, container) = parse_container_id(container_id)?;
        Ok(Self {
            account,
            container,
            key: fields.required_str("storage_account_key")?.to_string(),
            is_default: fields.bool_or("is_default", false),
        })
    }
}

/// Split a container URL into the account host and the container name
fn parse_container_id(container_id: &str) -> ProviderResult<(String, String)> {
    let invalid = || {
        ProviderError::validation(format!(
            "{:?} is not a storage container URL of the form https://{{account}}.blob.core.windows.net/{{container}}",
            container_id
        ))
    };
    let url = Url::parse(container_id).map_err(|_| invalid())?;
    let host = url.host_str().ok_or_else(invalid)?;
    let container = url.path().trim_matches('/');
    if container.is_empty() || container.contains('/') {
        return Err(invalid());
    }
    Ok((host.to_string(), container.to_string()))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HadoopClusterConfig {
    pub name: String,
    pub resource_group_name: String,
    pub location: String,
    pub cluster_version: String,
    pub tier: String,
    pub hadoop_version: String,
    pub gateway: Gateway,
    pub storage_accounts: Vec<ClusterStorage>,
    pub roles: Roles,
    pub tags: BTreeMap<String, String>,
}

impl HadoopClusterConfig {
    pub fn from_attributes(attrs: &HashMap<String, Value>) -> ProviderResult<Self> {
        let fields = Fields::new(attrs);
        let storage_accounts = fields
            .blocks("storage_account")
            .iter()
            .map(ClusterStorage::expand)
            .collect::<ProviderResult<Vec<_>>>()?;
        if storage_accounts.is_empty() {
            return Err(ProviderError::validation(
                "at least one `storage_account` block is required",
            ));
        }

        Ok(Self {
            name: fields.required_str("name")?.to_string(),
            resource_group_name: fields.required_str("resource_group_name")?.to_string(),
            location: normalize_location(fields.required_str("location")?),
            cluster_version: fields.required_str("cluster_version")?.to_string(),
            tier: fields.required_str("tier")?.to_string(),
            hadoop_version: fields
                .required_block("component_version")?
                .required_str("hadoop")?
                .to_string(),
            gateway: Gateway::expand(&fields.required_block("gateway")?)?,
            storage_accounts,
            roles: Roles::expand(&fields.required_block("roles")?)?,
            tags: fields.string_map("tags"),
        })
    }

    pub fn id(&self, subscription_id: &str) -> ClusterId {
        ClusterId::new(subscription_id, &self.resource_group_name, &self.name)
    }

    pub fn parameters(&self) -> ClusterCreateParametersExtended {
        let mut component_version = BTreeMap::new();
        component_version.insert(COMPONENT.to_string(), self.hadoop_version.clone());

        ClusterCreateParametersExtended {
            location: Some(self.location.clone()),
            tags: self.tags.clone(),
            properties: Some(ClusterCreateProperties {
                cluster_version: Some(self.cluster_version.clone()),
                os_type: Some(OS_TYPE.to_string()),
                tier: Some(self.tier.clone()),
                cluster_definition: Some(ClusterDefinition {
                    kind: Some(CLUSTER_KIND.to_string()),
                    component_version: Some(component_version),
                    configurations: Some(json!({ "gateway": self.gateway.settings() })),
                }),
                storage_profile: Some(StorageProfile {
                    storage_accounts: self
                        .storage_accounts
                        .iter()
                        .map(|storage| StorageAccount {
                            name: Some(storage.account.clone()),
                            is_default: Some(storage.is_default),
                            container: Some(storage.container.clone()),
                            key: Some(storage.key.clone()),
                        })
                        .collect(),
                }),
                compute_profile: Some(self.roles.compute_profile()),
            }),
        }
    }
}

// =============================================================================
// Flatten
// =============================================================================

/// Node blocks as the service reports them; credentials are never returned
fn flatten_node(role: Option<&Role>, with_count: bool) -> Value {
    let Some(role) = role else {
        return Value::List(vec![]);
    };
    let mut pairs = vec![
        (
            "vm_size",
            Value::string(
                role.hardware_profile
                    .as_ref()
                    .and_then(|h| h.vm_size.as_deref())
                    .unwrap_or_default(),
            ),
        ),
        (
            "username",
            Value::string(
                role.os_profile
                    .as_ref()
                    .and_then(|os| os.linux_operating_system_profile.as_ref())
                    .and_then(|linux| linux.username.as_deref())
                    .unwrap_or_default(),
            ),
        ),
    ];
    if let Some(network) = &role.virtual_network_profile {
        if let Some(subnet) = &network.subnet {
            pairs.push(("subnet_id", Value::string(subnet)));
        }
        if let Some(id) = &network.id {
            pairs.push(("virtual_network_id", Value::string(id)));
        }
    }
    if with_count && let Some(count) = role.target_instance_count {
        pairs.push(("target_instance_count", Value::Int(count)));
    }
    single_block(pairs)
}

pub fn flatten_roles(compute: Option<&ComputeProfile>) -> Value {
    let Some(compute) = compute else {
        return Value::List(vec![]);
    };
    single_block([
        (HEAD_NODE, flatten_node(compute.role(ROLE_HEAD_NODE), false)),
        (WORKER_NODE, flatten_node(compute.role(ROLE_WORKER_NODE), true)),
        (
            ZOOKEEPER_NODE,
            flatten_node(compute.role(ROLE_ZOOKEEPER_NODE), false),
        ),
    ])
}

pub fn flatten_gateway(settings: &GatewaySettings) -> Value {
    let mut pairs = vec![
        ("enabled", Value::Bool(settings.enabled())),
        (
            "username",
            Value::string(settings.username.as_deref().unwrap_or_default()),
        ),
    ];
    if let Some(password) = &settings.password {
        pairs.push(("password", Value::string(password)));
    }
    single_block(pairs)
}

pub fn flatten_component_version(definition: Option<&ClusterDefinition>) -> Value {
    let version = definition
        .and_then(|d| d.component_version.as_ref())
        .and_then(|versions| {
            versions
                .iter()
                .find(|(component, _)| component.eq_ignore_ascii_case(COMPONENT))
                .map(|(_, version)| version.clone())
        });
    match version {
        Some(version) => single_block([("hadoop", Value::String(version))]),
        None => Value::List(vec![]),
    }
}

/// Host of the endpoint named `name` (`HTTPS`, `SSH`)
fn endpoint(cluster: &Cluster, name: &str) -> Value {
    let location = cluster
        .properties
        .as_ref()
        .and_then(|p| p.connectivity_endpoints.as_ref())
        .and_then(|endpoints| {
            endpoints
                .iter()
                .find(|e| e.name.as_deref().is_some_and(|n| n.eq_ignore_ascii_case(name)))
        })
        .and_then(|e| e.location.as_deref());
    Value::string(location.unwrap_or_default())
}

/// The service reports the tier in any case
fn normalize_tier(tier: &str) -> String {
    TIERS
        .iter()
        .find(|t| t.eq_ignore_ascii_case(tier))
        .map_or_else(|| tier.to_string(), |t| t.to_string())
}

// =============================================================================
// Handler
// =============================================================================

pub struct HdInsightHadoopCluster;

impl HdInsightHadoopCluster {
    async fn read_id(
        &self,
        session: &Session,
        ctx: &OperationContext,
        rid: &ResourceId,
        id: &ClusterId,
    ) -> ProviderResult<State> {
        let clusters = &session.clients.hdinsight;
        let Some(cluster) = call_optional(ctx, id, clusters.clusters_get(id)).await? else {
            return Ok(gone(rid, id));
        };
        let gateway = call(ctx, id, clusters.configurations_get(id)).await?;

        let properties = cluster.properties.as_ref();
        let mut attrs = HashMap::new();
        attrs.insert("name".to_string(), Value::string(&id.cluster_name));
        attrs.insert(
            "resource_group_name".to_string(),
            Value::string(&id.resource_group_name),
        );
        if let Some(location) = &cluster.location {
            attrs.insert(
                "location".to_string(),
                Value::String(normalize_location(location)),
            );
        }
        if let Some(version) = properties.and_then(|p| p.cluster_version.as_deref()) {
            attrs.insert("cluster_version".to_string(), Value::string(version));
        }
        if let Some(tier) = properties.and_then(|p| p.tier.as_deref()) {
            attrs.insert("tier".to_string(), Value::String(normalize_tier(tier)));
        }
        attrs.insert(
            "component_version".to_string(),
            flatten_component_version(properties.and_then(|p| p.cluster_definition.as_ref())),
        );
        attrs.insert("gateway".to_string(), flatten_gateway(&gateway));
        attrs.insert(
            "roles".to_string(),
            flatten_roles(properties.and_then(|p| p.compute_profile.as_ref())),
        );
        attrs.insert("tags".to_string(), string_map(&cluster.tags));
        attrs.insert("https_endpoint".to_string(), endpoint(&cluster, "HTTPS"));
        attrs.insert("ssh_endpoint".to_string(), endpoint(&cluster, "SSH"));

        Ok(State::existing(rid.clone(), attrs).with_identifier(id.to_string()))
    }
}

#[async_trait]
impl ResourceHandler for HdInsightHadoopCluster {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> ResourceSchema {
        hadoop_cluster_schema()
    }

    fn timeouts(&self) -> ResourceTimeouts {
        ResourceTimeouts::minutes(60, 5, 60, 60)
    }

    async fn create(
        &self,
        session: &Session,
        ctx: &OperationContext,
        resource: &Resource,
    ) -> ProviderResult<State> {
        let config = HadoopClusterConfig::from_attributes(&resource.attributes)?;
        let id = config.id(&session.subscription_id);
        let clusters = &session.clients.hdinsight;

        ensure_absent(ctx, TYPE_NAME, &id, clusters.clusters_get(&id)).await?;
        log::info!("creating HDInsight cluster {}", id);
        mutate(ctx, &id, clusters.clusters_create(&id, &config.parameters())).await?;

        let state = self.read_id(session, ctx, &resource.id, &id).await?;
        refreshed(state, ctx, &id)
    }

    async fn read(
        &self,
        session: &Session,
        ctx: &OperationContext,
        id: &ResourceId,
        identifier: &str,
    ) -> ProviderResult<State> {
        let cluster_id = ClusterId::parse(identifier).map_err(|e| tag(e, ctx, &identifier))?;
        self.read_id(session, ctx, id, &cluster_id).await
    }

    /// Tags and the worker node count are the only in-place changes
    async fn update(
        &self,
        session: &Session,
        ctx: &OperationContext,
        id: &ResourceId,
        identifier: &str,
        from: &State,
        to: &Resource,
    ) -> ProviderResult<State> {
        let cluster_id = ClusterId::parse(identifier).map_err(|e| tag(e, ctx, &identifier))?;
        let config = HadoopClusterConfig::from_attributes(&to.attributes)?;
        let clusters = &session.clients.hdinsight;

        if Fields::new(&from.attributes).string_map("tags") != config.tags {
            let patch = ClusterPatchParameters {
                tags: config.tags.clone(),
            };
            mutate(
                ctx,
                &cluster_id,
                clusters.clusters_update_tags(&cluster_id, &patch),
            )
            .await?;
        }

        let current_count = Fields::new(&from.attributes)
            .block("roles")
            .and_then(|roles| roles.block(WORKER_NODE))
            .and_then(|worker| worker.int("target_instance_count"));
        let target_instance_count = config.roles.worker_count();
        if current_count != Some(target_instance_count) {
            log::info!(
                "resizing {} to {} worker nodes",
                cluster_id,
                target_instance_count
            );
            let resize = ClusterResizeParameters {
                target_instance_count,
            };
            mutate(
                ctx,
                &cluster_id,
                clusters.clusters_resize(&cluster_id, &resize),
            )
            .await?;
        }

        let state = self.read_id(session, ctx, id, &cluster_id).await?;
        refreshed(state, ctx, &cluster_id)
    }

    async fn delete(
        &self,
        session: &Session,
        ctx: &OperationContext,
        identifier: &str,
    ) -> ProviderResult<()> {
        let id = ClusterId::parse(identifier).map_err(|e| tag(e, ctx, &identifier))?;
        delete_tolerant(ctx, &id, session.clients.hdinsight.clusters_delete(&id)).await
    }

    async fn exists(
        &self,
        session: &Session,
        ctx: &OperationContext,
        identifier: &str,
    ) -> ProviderResult<bool> {
        let id = ClusterId::parse(identifier).map_err(|e| tag(e, ctx, &identifier))?;
        let cluster = call_optional(ctx, &id, session.clients.hdinsight.clusters_get(&id)).await?;
        Ok(cluster.is_some())
    }
}
