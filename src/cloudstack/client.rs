//! CloudStack Client
//!
//! Main client for the CloudStack API, combining request signing and the
//! HTTP transport.

use super::auth::ApiCredentials;
use super::error::ApiError;
use super::http::CloudStackHttpClient;
use super::vm::{ListVirtualMachinesResponse, VirtualMachine};
use async_trait::async_trait;
use serde_json::Value;
use url::Url;

/// Virtual machine lookups the provider needs from CloudStack.
///
/// Zero matches are reported as [`ApiError::NotFound`] so callers can tell a
/// missing instance apart from a failed call.
#[async_trait]
pub trait VirtualMachineApi: Send + Sync {
    /// Look up a virtual machine by exact name, optionally inside a project
    async fn virtual_machine_by_name(
        &self,
        name: &str,
        project_id: Option<&str>,
    ) -> Result<VirtualMachine, ApiError>;

    /// Look up a virtual machine by ID, optionally inside a project
    async fn virtual_machine_by_id(
        &self,
        id: &str,
        project_id: Option<&str>,
    ) -> Result<VirtualMachine, ApiError>;
}

/// Main CloudStack client
#[derive(Clone)]
pub struct CloudStackClient {
    endpoint: Url,
    credentials: ApiCredentials,
    http: CloudStackHttpClient,
}

impl CloudStackClient {
    /// Create a new client bound to `api_url`
    pub fn new(
        api_url: &str,
        api_key: &str,
        secret_key: &str,
        verify_tls: bool,
    ) -> Result<Self, ApiError> {
        let endpoint = Url::parse(api_url)
            .map_err(|e| ApiError::Client(format!("invalid API URL {}: {}", api_url, e)))?;

        Ok(Self {
            endpoint,
            credentials: ApiCredentials::new(api_key, secret_key),
            http: CloudStackHttpClient::new(verify_tls)?,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Run an API command and return the body of its `<command>response` object
    pub async fn execute(&self, command: &str, params: &[(&str, &str)]) -> Result<Value, ApiError> {
        let mut all = vec![("command", command), ("response", "json")];
        all.extend_from_slice(params);

        let mut url = self.endpoint.clone();
        url.set_query(Some(&self.credentials.signed_query(&all)));

        tracing::debug!("CloudStack API call: {}", command);
        let mut response = self.http.get(url).await?;

        let key = format!("{}response", command.to_lowercase());
        response
            .get_mut(&key)
            .map(Value::take)
            .ok_or_else(|| ApiError::Decode(format!("missing {} in response", key)))
    }

    async fn list_virtual_machines(
        &self,
        params: &[(&str, &str)],
    ) -> Result<ListVirtualMachinesResponse, ApiError> {
        let body = self.execute("listVirtualMachines", params).await?;
        Ok(serde_json::from_value(body)?)
    }
}

fn scoped<'a>(
    mut params: Vec<(&'a str, &'a str)>,
    project_id: Option<&'a str>,
) -> Vec<(&'a str, &'a str)> {
    if let Some(project_id) = project_id {
        params.push(("projectid", project_id));
    }
    params
}

/// The management server rejects an ID that names no VM (deleted, or never
/// existed) with a 431 instead of returning an empty list.
fn is_missing_entity(err: &ApiError, id: &str) -> bool {
    match err {
        ApiError::Status { message, .. } => message.contains(&format!(
            "Invalid parameter id value={} due to incorrect long value format, \
             or entity does not exist",
            id
        )),
        _ => false,
    }
}

#[async_trait]
impl VirtualMachineApi for CloudStackClient {
    async fn virtual_machine_by_name(
        &self,
        name: &str,
        project_id: Option<&str>,
    ) -> Result<VirtualMachine, ApiError> {
        let params = scoped(vec![("name", name), ("listall", "true")], project_id);
        let response = self.list_virtual_machines(&params).await?;

        // `name` is a keyword filter on the server side
        let mut matches: Vec<VirtualMachine> = response
            .virtual_machines
            .into_iter()
            .filter(|vm| vm.name == name)
            .collect();

        match matches.len() {
            0 => Err(ApiError::NotFound(name.to_string())),
            1 => Ok(matches.remove(0)),
            count => Err(ApiError::Ambiguous {
                name: name.to_string(),
                count,
            }),
        }
    }

    async fn virtual_machine_by_id(
        &self,
        id: &str,
        project_id: Option<&str>,
    ) -> Result<VirtualMachine, ApiError> {
        let params = scoped(vec![("id", id)], project_id);
        let mut response = match self.list_virtual_machines(&params).await {
            Err(err) if is_missing_entity(&err, id) => {
                return Err(ApiError::NotFound(id.to_string()))
            }
            other => other?,
        };

        match response.virtual_machines.len() {
            0 => Err(ApiError::NotFound(id.to_string())),
            1 => Ok(response.virtual_machines.remove(0)),
            count => Err(ApiError::Ambiguous {
                name: id.to_string(),
                count,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_invalid_endpoint_is_rejected() {
        let err = CloudStackClient::new("not a url", "key", "secret", true)
            .err()
            .expect("client should not be built");
        assert!(matches!(err, ApiError::Client(_)));
    }

    #[test]
    fn test_missing_entity_detection() {
        let missing = ApiError::Status {
            status: StatusCode::from_u16(431).unwrap(),
            message: "Unable to execute API command listvirtualmachines due to invalid value. \
                      Invalid parameter id value=abc due to incorrect long value format, \
                      or entity does not exist or due to incorrect parameter annotation \
                      for the field in api cmd class."
                .to_string(),
        };
        assert!(is_missing_entity(&missing, "abc"));
        assert!(!is_missing_entity(&missing, "other-id"));

        let unrelated = ApiError::Status {
            status: StatusCode::from_u16(431).unwrap(),
            message: "Unable to execute API command listvirtualmachines".to_string(),
        };
        assert!(!is_missing_entity(&unrelated, "abc"));
        assert!(!is_missing_entity(&ApiError::Decode("x".into()), "abc"));
    }

    #[test]
    fn test_project_scope_is_appended() {
        let params = scoped(vec![("id", "abc")], Some("proj"));
        assert_eq!(params, vec![("id", "abc"), ("projectid", "proj")]);
        assert_eq!(scoped(vec![("id", "abc")], None), vec![("id", "abc")]);
    }
}
