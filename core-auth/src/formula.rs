//! Formula / script layer: a declarative provider descriptor
//! ([`FormulaDoc`]) resolved into an executable, parameter-bound
//! [`ResolvedScript`].
//!
//! The resolved script's JSON shape is treated as an internal canonical
//! form rather than a documented external contract — only the fields the
//! flow engines actually read are guaranteed stable.

use serde_json::json;

use crate::error::{AuthError, Result};
use crate::types::{FormulaDoc, ResolvedScript};

const SCRIPT_VERSION: u32 = 1;

/// Normalizes `formula` into a canonical JSON document: informational
/// fields dropped, object keys sorted. Used for stable hashing/diffing of a
/// provider description, independent of any particular method binding.
pub fn script_from_formula(formula: &FormulaDoc) -> Result<serde_json::Value> {
    let value = serde_json::to_value(formula)?;
    Ok(canonicalize(value))
}

/// Binds `method` (and the caller-supplied parameters) to `formula`,
/// producing a [`ResolvedScript`] ready for [`crate::client::Client::run_script`].
#[allow(clippy::too_many_arguments)]
pub fn script_resolve_from_formula(
    formula: &FormulaDoc,
    method: &str,
    client_id: impl Into<String>,
    client_secret: Option<String>,
    scope: Option<String>,
    redirect_uri: Option<String>,
) -> Result<ResolvedScript> {
    let method_desc = formula
        .methods
        .iter()
        .find(|m| m.name == method)
        .ok_or_else(|| AuthError::Unsupported(format!("method '{method}' is not in this formula")))?;

    let redirect_uri = match (method, redirect_uri) {
        ("authorization_code", Some(uri)) => Some(uri),
        // Auto-assign a loopback redirect_uri when the caller omitted one
        // for the authorization_code method.
        ("authorization_code", None) => Some("http://127.0.0.1:0/callback".to_string()),
        (_, uri) => uri,
    };

    for required in &method_desc.inputs {
        let supplied = match required.as_str() {
            "client_id" => true,
            "client_secret" => client_secret.is_some(),
            "scope" => scope.is_some(),
            "redirect_uri" => redirect_uri.is_some(),
            _ => true,
        };
        if !supplied {
            return Err(AuthError::InvalidParameter(format!(
                "method '{method}' requires input '{required}'"
            )));
        }
    }

    if method == "device_code" && formula.endpoints.device_authorization.is_none() {
        return Err(AuthError::Unsupported(
            "formula has no device_authorization endpoint".to_string(),
        ));
    }

    Ok(ResolvedScript {
        version: SCRIPT_VERSION,
        method: method.to_string(),
        client_id: client_id.into(),
        client_secret,
        scope,
        redirect_uri,
        endpoints: formula.endpoints.clone(),
    })
}

/// Recursively sorts object keys so two semantically-equal documents
/// serialize identically.
fn canonicalize(value: serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(map) => {
            let mut sorted: Vec<(String, serde_json::Value)> =
                map.into_iter().map(|(k, v)| (k, canonicalize(v))).collect();
            sorted.sort_by(|a, b| a.0.cmp(&b.0));
            let mut out = serde_json::Map::new();
            for (k, v) in sorted {
                out.insert(k, v);
            }
            serde_json::Value::Object(out)
        }
        serde_json::Value::Array(items) => {
            serde_json::Value::Array(items.into_iter().map(canonicalize).collect())
        }
        other => other,
    }
}

/// Builds an example `FormulaDoc` JSON object directly, without going
/// through [`FormulaDoc`]'s typed form — useful for callers that already
/// have raw provider metadata.
pub fn formula_json(
    name: &str,
    authorization: &str,
    token: &str,
    device_authorization: Option<&str>,
) -> serde_json::Value {
    json!({
        "name": name,
        "endpoints": {
            "authorization": authorization,
            "token": token,
            "device_authorization": device_authorization,
        },
        "methods": [
            { "name": "authorization_code", "inputs": ["client_id", "redirect_uri"] },
        ],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FormulaEndpoints, FormulaMethod};

    fn sample_formula() -> FormulaDoc {
        FormulaDoc {
            name: "example".to_string(),
            endpoints: FormulaEndpoints {
                authorization: "https://as/auth".to_string(),
                token: "https://as/tok".to_string(),
                device_authorization: Some("https://as/dev".to_string()),
                registration: None,
            },
            methods: vec![
                FormulaMethod {
                    name: "authorization_code".to_string(),
                    inputs: vec!["client_id".to_string(), "redirect_uri".to_string()],
                },
                FormulaMethod {
                    name: "device_code".to_string(),
                    inputs: vec!["client_id".to_string()],
                },
            ],
        }
    }

    #[test]
    fn resolves_authorization_code_with_auto_redirect_uri() {
        let script = script_resolve_from_formula(&sample_formula(), "authorization_code", "abc", None, None, None).unwrap();
        assert_eq!(script.method, "authorization_code");
        assert!(script.redirect_uri.unwrap().starts_with("http://127.0.0.1"));
    }

    #[test]
    fn resolves_device_code_without_requiring_redirect_uri() {
        let script = script_resolve_from_formula(&sample_formula(), "device_code", "abc", None, None, None).unwrap();
        assert_eq!(script.method, "device_code");
        assert!(script.redirect_uri.is_none());
    }

    #[test]
    fn unknown_method_is_unsupported() {
        let result = script_resolve_from_formula(&sample_formula(), "client_credentials", "abc", None, None, None);
        assert!(matches!(result, Err(AuthError::Unsupported(_))));
    }

    #[test]
    fn script_from_formula_sorts_keys_canonically() {
        let formula = sample_formula();
        let canonical = script_from_formula(&formula).unwrap();
        let serialized = serde_json::to_string(&canonical).unwrap();
        // "endpoints" sorts before "methods" sorts before "name" alphabetically.
        let endpoints_pos = serialized.find("\"endpoints\"").unwrap();
        let name_pos = serialized.find("\"name\"").unwrap();
        assert!(endpoints_pos < name_pos);
    }
}
