//! Outbound request construction from declarative mappings.

use crate::credentials::{Credentials, SecretString};
use crate::validate::ValidatedParams;
use crate::{EngineError, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use catalog::{ApiDetails, ApiKeyScheme, AuthMethod, HttpMethod, QueryTransform, ToolConfig};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

const AUTHORIZATION: &str = "Authorization";

/// A fully resolved HTTP request, ready for the transport.
#[derive(Clone, PartialEq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    pub headers: BTreeMap<String, String>,
}

impl HttpRequest {
    /// Header value by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    fn set_header(&mut self, name: &str, value: String) {
        self.headers.retain(|k, _| !k.eq_ignore_ascii_case(name));
        self.headers.insert(name.to_string(), value);
    }
}

// Header values may carry credentials; only names are printed.
impl fmt::Debug for HttpRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpRequest")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("query", &self.query)
            .field("body", &self.body)
            .field("headers", &self.headers.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Build the request for `tool` from validated parameters and credentials.
pub fn build_request(
    tool: &ToolConfig,
    api: &ApiDetails,
    params: &ValidatedParams,
    credentials: &Credentials,
) -> Result<HttpRequest> {
    let path = build_path(api, params)?;
    let mut request = HttpRequest {
        method: api.method,
        url: join_url(&api.base_url, &path),
        query: build_query(api, params),
        body: build_body(api, params),
        headers: api.static_headers.clone(),
    };

    if let Some((name, value)) = auth_header(tool, credentials)? {
        request.set_header(&name, value);
    }

    Ok(request)
}

fn build_path(api: &ApiDetails, params: &ValidatedParams) -> Result<String> {
    let mut path = api.path_template.clone();
    for (param, placeholder) in &api.param_mappings.path {
        let token = format!("{{{placeholder}}}");
        if !path.contains(&token) {
            return Err(EngineError::Configuration(format!(
                "path template has no placeholder {token} for parameter '{param}'"
            )));
        }
        let value = params
            .get(param)
            .ok_or_else(|| EngineError::MissingPathParameter(param.clone()))?;
        path = path.replace(&token, &urlencoding::encode(&render(value)));
    }

    if let Some(placeholder) = unresolved_placeholder(&path) {
        return Err(EngineError::Configuration(format!(
            "path template placeholder {placeholder} has no parameter mapping"
        )));
    }
    Ok(path)
}

fn unresolved_placeholder(path: &str) -> Option<&str> {
    let start = path.find('{')?;
    let len = path[start..].find('}')?;
    Some(&path[start..=start + len])
}

fn join_url(base_url: &str, path: &str) -> String {
    let base = base_url.trim_end_matches('/');
    if path.is_empty() || path.starts_with('/') {
        format!("{base}{path}")
    } else {
        format!("{base}/{path}")
    }
}

fn build_query(api: &ApiDetails, params: &ValidatedParams) -> Vec<(String, String)> {
    api.param_mappings
        .query
        .iter()
        .filter_map(|(param, mapping)| {
            let value = params.get(param)?;
            let rendered = match (mapping.transform(), value) {
                (Some(QueryTransform::JoinComma), Value::Array(items)) => {
                    items.iter().map(render).collect::<Vec<_>>().join(",")
                }
                _ => render(value),
            };
            Some((mapping.key().to_string(), rendered))
        })
        .collect()
}

fn build_body(api: &ApiDetails, params: &ValidatedParams) -> Option<Value> {
    let mappings = &api.param_mappings.body;
    if mappings.is_empty() {
        return None;
    }
    let body: Map<String, Value> = mappings
        .iter()
        .filter_map(|(param, field)| Some((field.clone(), params.get(param)?.clone())))
        .collect();
    Some(Value::Object(body))
}

/// Strings are sent raw; everything else as JSON text.
fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn auth_header(tool: &ToolConfig, credentials: &Credentials) -> Result<Option<(String, String)>> {
    match tool.auth_method {
        AuthMethod::None => Ok(None),
        AuthMethod::OAuth => {
            let token = require(&credentials.oauth_token, "oauth token")?;
            Ok(Some((AUTHORIZATION.into(), format!("Bearer {token}"))))
        }
        AuthMethod::ApiKey => {
            let details = tool.api_key_details.as_ref().ok_or_else(|| {
                EngineError::Configuration("api_key tool has no api_key_details".into())
            })?;
            let key = require(&credentials.api_key, "api key")?;
            let header = match details.scheme {
                ApiKeyScheme::Bearer => (AUTHORIZATION.into(), format!("Bearer {key}")),
                ApiKeyScheme::BasicUser => (
                    AUTHORIZATION.into(),
                    format!("Basic {}", STANDARD.encode(format!("{key}:"))),
                ),
                ApiKeyScheme::BasicPass => (
                    AUTHORIZATION.into(),
                    format!("Basic {}", STANDARD.encode(format!(":{key}"))),
                ),
                ApiKeyScheme::Header => {
                    let name = details
                        .header_name
                        .as_deref()
                        .filter(|n| !n.is_empty())
                        .ok_or_else(|| {
                            EngineError::Configuration("header scheme without header_name".into())
                        })?;
                    (name.to_string(), key.to_string())
                }
            };
            Ok(Some(header))
        }
    }
}

fn require<'a>(value: &'a Option<SecretString>, what: &'static str) -> Result<&'a str> {
    value
        .as_ref()
        .map(SecretString::expose)
        .ok_or(EngineError::MissingCredential(what))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use crate::validate::validate;
    use catalog::{ApiKeyDetails, ParamMappings, QueryMapping, ToolSchema, UtilityProvider};
    use serde_json::json;

    fn tool(auth_method: AuthMethod, scheme: Option<ApiKeyScheme>) -> ToolConfig {
        ToolConfig {
            id: "t".into(),
            description: String::new(),
            utility_provider: UtilityProvider::Custom,
            auth_method,
            required_secrets: vec!["key".into()],
            required_scopes: match auth_method {
                AuthMethod::OAuth => vec!["scope".into()],
                _ => Vec::new(),
            },
            api_key_details: scheme.map(|scheme| ApiKeyDetails {
                secret_name: "key".into(),
                scheme,
                header_name: Some("X-Api-Key".into()),
            }),
            schema: ToolSchema::default(),
            api_details: None,
        }
    }

    fn api(path_template: &str, mappings: ParamMappings) -> ApiDetails {
        ApiDetails {
            method: HttpMethod::Get,
            base_url: "https://api.example/".into(),
            path_template: path_template.into(),
            param_mappings: mappings,
            static_headers: BTreeMap::new(),
            response_pointer: None,
        }
    }

    fn params(value: Value) -> ValidatedParams {
        let properties = value
            .as_object()
            .map(|m| m.keys().map(|k| (k.clone(), json!({}))).collect())
            .unwrap_or_default();
        let schema = ToolSchema {
            properties,
            required: Vec::new(),
        };
        validate(&schema, &value).unwrap()
    }

    fn api_key(key: &str) -> Credentials {
        Credentials {
            api_key: Some(key.into()),
            oauth_token: None,
        }
    }

    #[test]
    fn substitutes_path_parameters() {
        let api = api(
            "/users/{uid}/repos",
            ParamMappings {
                path: BTreeMap::from([("repoOwner".into(), "uid".into())]),
                ..Default::default()
            },
        );
        let request = build_request(
            &tool(AuthMethod::None, None),
            &api,
            &params(json!({"repoOwner": "acme"})),
            &Credentials::default(),
        )
        .unwrap();
        assert_eq!(request.url, "https://api.example/users/acme/repos");
    }

    #[test]
    fn path_values_are_percent_encoded() {
        let api = api(
            "/files/{name}",
            ParamMappings {
                path: BTreeMap::from([("name".into(), "name".into())]),
                ..Default::default()
            },
        );
        let request = build_request(
            &tool(AuthMethod::None, None),
            &api,
            &params(json!({"name": "a b/c"})),
            &Credentials::default(),
        )
        .unwrap();
        assert_eq!(request.url, "https://api.example/files/a%20b%2Fc");
    }

    #[test]
    fn missing_path_parameter_fails() {
        let api = api(
            "/users/{uid}",
            ParamMappings {
                path: BTreeMap::from([("owner".into(), "uid".into())]),
                ..Default::default()
            },
        );
        let err = build_request(
            &tool(AuthMethod::None, None),
            &api,
            &params(json!({"owner": null})),
            &Credentials::default(),
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::MissingPathParameter(ref p) if p == "owner"));
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn unmapped_placeholder_is_configuration_error() {
        let api = api("/users/{uid}", ParamMappings::default());
        let err = build_request(
            &tool(AuthMethod::None, None),
            &api,
            &ValidatedParams::default(),
            &Credentials::default(),
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::Configuration(_)));
    }

    #[test]
    fn query_omits_absent_and_null() {
        let api = api(
            "/search",
            ParamMappings {
                query: BTreeMap::from([
                    ("term".into(), QueryMapping::Key("q".into())),
                    ("page".into(), QueryMapping::Key("page".into())),
                    ("sort".into(), QueryMapping::Key("sort".into())),
                ]),
                ..Default::default()
            },
        );
        let request = build_request(
            &tool(AuthMethod::None, None),
            &api,
            &params(json!({"term": "rust", "page": null})),
            &Credentials::default(),
        )
        .unwrap();
        assert_eq!(request.query, vec![("q".to_string(), "rust".to_string())]);
    }

    #[test]
    fn query_join_comma_and_stringify() {
        let api = api(
            "/issues",
            ParamMappings {
                query: BTreeMap::from([
                    (
                        "labels".into(),
                        QueryMapping::Detailed {
                            key: "labels".into(),
                            transform: Some(QueryTransform::JoinComma),
                        },
                    ),
                    ("limit".into(), QueryMapping::Key("per_page".into())),
                    ("ids".into(), QueryMapping::Key("ids".into())),
                ]),
                ..Default::default()
            },
        );
        let request = build_request(
            &tool(AuthMethod::None, None),
            &api,
            &params(json!({"labels": ["bug", "p1"], "limit": 50, "ids": [1, 2]})),
            &Credentials::default(),
        )
        .unwrap();
        assert_eq!(
            request.query,
            vec![
                ("ids".to_string(), "[1,2]".to_string()),
                ("labels".to_string(), "bug,p1".to_string()),
                ("per_page".to_string(), "50".to_string()),
            ]
        );
    }

    #[test]
    fn body_uses_target_field_names() {
        let api = api(
            "/send",
            ParamMappings {
                body: BTreeMap::from([
                    ("to".into(), "recipient".into()),
                    ("subject".into(), "subj".into()),
                    ("cc".into(), "cc".into()),
                ]),
                ..Default::default()
            },
        );
        let request = build_request(
            &tool(AuthMethod::None, None),
            &api,
            &params(json!({"to": "a@b.com", "subject": "hi", "cc": null})),
            &Credentials::default(),
        )
        .unwrap();
        assert_eq!(request.body, Some(json!({"recipient": "a@b.com", "subj": "hi"})));
    }

    #[test]
    fn no_body_mappings_no_body() {
        let request = build_request(
            &tool(AuthMethod::None, None),
            &api("/ping", ParamMappings::default()),
            &ValidatedParams::default(),
            &Credentials::default(),
        )
        .unwrap();
        assert_eq!(request.body, None);
        assert_eq!(request.url, "https://api.example/ping");
    }

    fn auth(tool: &ToolConfig, credentials: &Credentials) -> Result<HttpRequest> {
        build_request(
            tool,
            &api("/x", ParamMappings::default()),
            &ValidatedParams::default(),
            credentials,
        )
    }

    #[test]
    fn api_key_schemes() {
        let creds = api_key("secret");

        let bearer = auth(&tool(AuthMethod::ApiKey, Some(ApiKeyScheme::Bearer)), &creds).unwrap();
        assert_eq!(bearer.header("authorization"), Some("Bearer secret"));

        let user = auth(&tool(AuthMethod::ApiKey, Some(ApiKeyScheme::BasicUser)), &creds).unwrap();
        assert_eq!(
            user.header("Authorization"),
            Some(format!("Basic {}", STANDARD.encode("secret:")).as_str())
        );
        assert_eq!(user.header("Authorization"), Some("Basic c2VjcmV0Og=="));

        let pass = auth(&tool(AuthMethod::ApiKey, Some(ApiKeyScheme::BasicPass)), &creds).unwrap();
        assert_eq!(pass.header("Authorization"), Some("Basic OnNlY3JldA=="));

        let header = auth(&tool(AuthMethod::ApiKey, Some(ApiKeyScheme::Header)), &creds).unwrap();
        assert_eq!(header.header("x-api-key"), Some("secret"));
        assert_eq!(header.header("Authorization"), None);
    }

    #[test]
    fn oauth_uses_bearer_token() {
        let creds = Credentials {
            api_key: None,
            oauth_token: Some("gho_1".into()),
        };
        let request = auth(&tool(AuthMethod::OAuth, None), &creds).unwrap();
        assert_eq!(request.header("Authorization"), Some("Bearer gho_1"));
    }

    #[test]
    fn header_scheme_without_name_is_configuration_error() {
        let mut tool = tool(AuthMethod::ApiKey, Some(ApiKeyScheme::Header));
        if let Some(details) = tool.api_key_details.as_mut() {
            details.header_name = None;
        }
        let err = auth(&tool, &api_key("secret")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn missing_credential_is_an_error() {
        let err = auth(&tool(AuthMethod::OAuth, None), &Credentials::default()).unwrap_err();
        assert!(matches!(err, EngineError::MissingCredential(_)));
    }

    #[test]
    fn auth_header_overrides_static_header() {
        let mut api = api("/x", ParamMappings::default());
        api.static_headers = BTreeMap::from([
            ("authorization".into(), "Bearer stale".into()),
            ("Accept".into(), "application/json".into()),
        ]);
        let request = build_request(
            &tool(AuthMethod::ApiKey, Some(ApiKeyScheme::Bearer)),
            &api,
            &ValidatedParams::default(),
            &api_key("fresh"),
        )
        .unwrap();
        assert_eq!(request.headers.len(), 2);
        assert_eq!(request.header("Authorization"), Some("Bearer fresh"));
        assert_eq!(request.header("accept"), Some("application/json"));
    }

    #[test]
    fn debug_hides_header_values() {
        let request = auth(
            &tool(AuthMethod::ApiKey, Some(ApiKeyScheme::Bearer)),
            &api_key("topsecret"),
        )
        .unwrap();
        assert!(!format!("{request:?}").contains("topsecret"));
    }
}
