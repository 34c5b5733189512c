//! Metadata bundle attached to log records as `props`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::context::{
    APP_NAME_KEY, CLIENT_ID_KEY, CORRELATION_ID_KEY, DOMAIN_SUFFIX_KEY, InvocationContext,
};
use crate::repr;

/// Identity of the invoked service method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceCall {
    /// Service name.
    pub name: String,
    /// Method name.
    pub method: String,
    /// Rendered positional arguments.
    pub args: String,
    /// Rendered keyword arguments.
    pub kwargs: String,
    /// Rendered call result, only on the finishing record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
}

/// Flat metadata derived from an [`InvocationContext`].
///
/// Every context data field is always present; missing entries hold `"-"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataBundle {
    /// Correlation id of the request.
    pub correlation_id: String,
    /// The invoked method.
    pub mservice: ServiceCall,
    /// Calling client id.
    pub disco_client_id: String,
    /// Virtual host domain suffix.
    pub vhost_domain_suffix: String,
    /// Application name.
    pub app_name: String,
}

impl MetadataBundle {
    /// Build the bundle for `ctx`, optionally carrying the call result.
    ///
    /// Empty results (`null`, `false`, zero, empty string, array or object)
    /// are left out.
    #[must_use]
    pub fn from_context(ctx: &InvocationContext, result: Option<&Value>) -> Self {
        let result = result
            .filter(|v| is_present(v))
            .map(repr::render_result);

        Self {
            correlation_id: ctx.data_or_empty(CORRELATION_ID_KEY),
            mservice: ServiceCall {
                name: ctx.service_name.clone(),
                method: ctx.method_name.clone(),
                args: repr::render_args(&ctx.args),
                kwargs: repr::render_kwargs(&ctx.kwargs),
                result,
            },
            disco_client_id: ctx.data_or_empty(CLIENT_ID_KEY),
            vhost_domain_suffix: ctx.data_or_empty(DOMAIN_SUFFIX_KEY),
            app_name: ctx.data_or_empty(APP_NAME_KEY),
        }
    }

    /// Convert into the JSON object merged into a canonical log object.
    #[must_use]
    pub fn into_props(self) -> Map<String, Value> {
        let mservice = {
            let ServiceCall {
                name,
                method,
                args,
                kwargs,
                result,
            } = self.mservice;
            let mut map = Map::new();
            map.insert("name".to_string(), Value::String(name));
            map.insert("method".to_string(), Value::String(method));
            map.insert("args".to_string(), Value::String(args));
            map.insert("kwargs".to_string(), Value::String(kwargs));
            if let Some(result) = result {
                map.insert("result".to_string(), Value::String(result));
            }
            map
        };

        let mut props = Map::new();
        props.insert(
            CORRELATION_ID_KEY.to_string(),
            Value::String(self.correlation_id),
        );
        props.insert("mservice".to_string(), Value::Object(mservice));
        props.insert(CLIENT_ID_KEY.to_string(), Value::String(self.disco_client_id));
        props.insert(
            DOMAIN_SUFFIX_KEY.to_string(),
            Value::String(self.vhost_domain_suffix),
        );
        props.insert(APP_NAME_KEY.to_string(), Value::String(self.app_name));
        props
    }
}

impl From<MetadataBundle> for Map<String, Value> {
    fn from(bundle: MetadataBundle) -> Self {
        bundle.into_props()
    }
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Build the metadata bundle for an invocation.
#[must_use]
pub fn build_metadata(ctx: &InvocationContext, result: Option<&Value>) -> MetadataBundle {
    MetadataBundle::from_context(ctx, result)
}
