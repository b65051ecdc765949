//! In-memory ARM endpoint for handler tests
//!
//! Stores whatever is PUT, answers GETs from the store and records every
//! request in order. Long-running behavior, per-request delays and canned
//! responses are configurable per test.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Method;
use serde_json::{Value, json};
use url::Url;

use super::client::ArmClient;
use super::error::ApiError;
use super::transport::{HttpRequest, HttpResponse, Transport};

const OPERATIONS: &str = "/fake-operations/";

/// How mutating calls complete
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum LroMode {
    /// Done in the initial response
    #[default]
    Sync,
    /// Returns an operation URL that reports success on first poll
    Async,
    /// Returns an operation URL that never finishes
    Never,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Call {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
}

#[derive(Default)]
struct FakeState {
    objects: BTreeMap<String, Value>,
    calls: Vec<Call>,
    canned: Vec<(Method, String, HttpResponse)>,
    mode: LroMode,
    hold: Option<Duration>,
    next_operation: u64,
}

#[derive(Clone)]
pub(crate) struct FakeArm {
    state: Arc<Mutex<FakeState>>,
    endpoint: Url,
}

impl FakeArm {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(FakeState::default())),
            endpoint: Url::parse("http://fake.arm/").unwrap(),
        }
    }

    pub fn with_lro(self, mode: LroMode) -> Self {
        self.state.lock().unwrap().mode = mode;
        self
    }

    /// Delay every mutating request by `hold`
    pub fn with_hold(self, hold: Duration) -> Self {
        self.state.lock().unwrap().hold = Some(hold);
        self
    }

    pub fn endpoint(&self) -> Url {
        self.endpoint.clone()
    }

    pub fn client(&self) -> ArmClient {
        ArmClient::new(Arc::new(self.clone()), self.endpoint.clone())
    }

    pub fn insert(&self, path: impl Into<String>, object: Value) {
        self.state
            .lock()
            .unwrap()
            .objects
            .insert(path.into(), object);
    }

    pub fn object(&self, path: &str) -> Option<Value> {
        self.state.lock().unwrap().objects.get(path).cloned()
    }

    /// Always answer `method path` with `response`
    pub fn respond(&self, method: Method, path: impl Into<String>, response: HttpResponse) {
        self.state
            .lock()
            .unwrap()
            .canned
            .push((method, path.into(), response));
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn count(&self, method: Method, path_suffix: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.method == method && c.path.ends_with(path_suffix))
            .count()
    }

    fn operation_response(state: &mut FakeState, endpoint: &Url, status: u16) -> HttpResponse {
        state.next_operation += 1;
        let url = format!(
            "{}{}{}",
            endpoint.as_str().trim_end_matches('/'),
            OPERATIONS,
            state.next_operation
        );
        HttpResponse::new(status).with_header("Azure-AsyncOperation", url)
    }

    fn handle(&self, request: &HttpRequest) -> HttpResponse {
        let path = request.url.path().to_string();
        let mut state = self.state.lock().unwrap();

        if let Some((_, _, response)) = state
            .canned
            .iter()
            .find(|(m, p, _)| *m == request.method && *p == path)
        {
            return response.clone();
        }

        if path.starts_with(OPERATIONS) && request.method == Method::GET {
            let status = match state.mode {
                LroMode::Never => "InProgress",
                _ => "Succeeded",
            };
            return HttpResponse::new(200).with_json(&json!({ "status": status }));
        }

        let mode = state.mode;
        match request.method.as_str() {
            "GET" => match state.objects.get(&path) {
                Some(object) => HttpResponse::new(200).with_json(object),
                None => not_found(),
            },
            "PUT" => {
                let mut object = request.body.clone().unwrap_or_else(|| json!({}));
                object["id"] = json!(path);
                object["name"] = json!(path.rsplit('/').next().unwrap_or_default());
                let created = !state.objects.contains_key(&path);
                state.objects.insert(path.clone(), object.clone());
                side_effects(&mut state.objects, &path, &object);
                match mode {
                    LroMode::Sync => HttpResponse::new(if created { 201 } else { 200 }).with_json(&object),
                    _ => Self::operation_response(&mut state, &self.endpoint, 201).with_json(&object),
                }
            }
            "PATCH" => {
                let Some(object) = state.objects.get_mut(&path) else {
                    return not_found();
                };
                if let (Some(target), Some(Value::Object(patch))) =
                    (object.as_object_mut(), request.body.as_ref())
                {
                    for (k, v) in patch {
                        target.insert(k.clone(), v.clone());
                    }
                }
                HttpResponse::new(200).with_json(object)
            }
            "POST" => {
                if let Some(cluster) = path.strip_suffix("/roles/workernode/resize") {
                    let Some(object) = state.objects.get_mut(cluster) else {
                        return not_found();
                    };
                    let count = request
                        .body
                        .as_ref()
                        .and_then(|b| b.get("targetInstanceCount"))
                        .cloned()
                        .unwrap_or(Value::Null);
                    if let Some(roles) = object
                        .pointer_mut("/properties/computeProfile/roles")
                        .and_then(Value::as_array_mut)
                    {
                        for role in roles.iter_mut().filter(|r| r["name"] == "workernode") {
                            role["targetInstanceCount"] = count.clone();
                        }
                    }
                }
                match mode {
                    LroMode::Sync => HttpResponse::new(200),
                    _ => Self::operation_response(&mut state, &self.endpoint, 202),
                }
            }
            "DELETE" => {
                if state.objects.remove(&path).is_none() {
                    return not_found();
                }
                let prefix = format!("{}/", path);
                state.objects.retain(|k, _| !k.starts_with(&prefix));
                match mode {
                    LroMode::Sync => HttpResponse::new(200),
                    _ => Self::operation_response(&mut state, &self.endpoint, 202),
                }
            }
            _ => HttpResponse::new(405),
        }
    }
}

fn not_found() -> HttpResponse {
    HttpResponse::new(404).with_json(&json!({
        "error": {"code": "NotFound", "message": "The requested resource was not found."}
    }))
}

/// Objects the real service derives from a PUT
fn side_effects(objects: &mut BTreeMap<String, Value>, path: &str, object: &Value) {
    if path.contains("/sqlDatabases/") && !path.contains("/containers/") && !path.ends_with("/default")
    {
        let options = &object["properties"]["options"];
        let mut resource = json!({});
        if let Some(throughput) = options.get("throughput") {
            resource["throughput"] = throughput.clone();
        }
        if let Some(autoscale) = options.get("autoscaleSettings") {
            resource["autoscaleSettings"] = autoscale.clone();
        }
        if resource.as_object().is_some_and(|r| !r.is_empty()) {
            objects.insert(
                format!("{}/throughputSettings/default", path),
                json!({"properties": {"resource": resource}}),
            );
        }
    }

    if let Some(server) = path.strip_suffix("/encryptionProtector/current")
        && let Some(key_name) = object.pointer("/properties/serverKeyName").and_then(Value::as_str)
    {
        let uri = objects
            .get(&format!("{}/keys/{}", server, key_name))
            .and_then(|key| key.pointer("/properties/uri"))
            .cloned();
        if let Some(uri) = uri {
            let mut protector = object.clone();
            protector["properties"]["uri"] = uri;
            objects.insert(path.to_string(), protector);
        }
    }

    if path.contains("/providers/Microsoft.HDInsight/clusters/") && !path.contains("/roles/") {
        if let Some(gateway) = object.pointer("/properties/clusterDefinition/configurations/gateway")
        {
            objects.insert(format!("{}/configurations/gateway", path), gateway.clone());
        }
        let name = path.rsplit('/').next().unwrap_or_default();
        if let Some(properties) = objects
            .get_mut(path)
            .and_then(|cluster| cluster.get_mut("properties"))
        {
            properties["provisioningState"] = json!("Succeeded");
            properties["connectivityEndpoints"] = json!([
                {"name": "SSH", "protocol": "TCP", "location": format!("{}-ssh.azurehdinsight.net", name), "port": 22},
                {"name": "HTTPS", "protocol": "TCP", "location": format!("{}.azurehdinsight.net", name), "port": 443}
            ]);
        }
    }
}

#[async_trait]
impl Transport for FakeArm {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let hold = {
            let mut state = self.state.lock().unwrap();
            state.calls.push(Call {
                method: request.method.clone(),
                path: request.url.path().to_string(),
                body: request.body.clone(),
            });
            state.hold
        };
        if request.method != Method::GET
            && let Some(hold) = hold
        {
            tokio::time::sleep(hold).await;
        }
        Ok(self.handle(&request))
    }
}
