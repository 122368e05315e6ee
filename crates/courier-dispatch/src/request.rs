// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Turns a chunk's recipients and text into a transport-ready request.
//!
//! Backends registered with a structured adapter get the adapter's request.
//! Every other backend gets the store's URL template with `%(name)s`
//! placeholders replaced by URL-encoded parameters.

use std::collections::BTreeMap;

use courier_config::DeliveryTarget;
use tracing::debug;

use crate::backend::BackendRegistry;
use crate::error::DeliveryError;
use crate::sanitize::Sanitizer;

/// HTTP basic auth credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicAuth {
    pub username: String,
    pub password: Option<String>,
}

/// Request body for structured POST requests.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    /// `application/x-www-form-urlencoded` fields, in order.
    Form(Vec<(String, String)>),
    /// `application/json` document.
    Json(serde_json::Value),
}

/// A fully built delivery request.
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundRequest {
    Get {
        url: String,
    },
    Post {
        url: String,
        headers: Vec<(String, String)>,
        auth: Option<BasicAuth>,
        body: Body,
    },
}

impl OutboundRequest {
    pub fn url(&self) -> &str {
        match self {
            OutboundRequest::Get { url } | OutboundRequest::Post { url, .. } => url,
        }
    }

    pub fn method(&self) -> &'static str {
        match self {
            OutboundRequest::Get { .. } => "GET",
            OutboundRequest::Post { .. } => "POST",
        }
    }
}

/// Builds delivery requests from the substitution table and the adapters.
pub struct RequestBuilder {
    sanitizer: Sanitizer,
    adapters: BackendRegistry,
}

impl RequestBuilder {
    pub fn new(sanitizer: Sanitizer, adapters: BackendRegistry) -> Self {
        Self {
            sanitizer,
            adapters,
        }
    }

    pub fn adapters(&self) -> &BackendRegistry {
        &self.adapters
    }

    /// Builds the request delivering `text` to `recipients` on `backend`.
    ///
    /// `extra` parameters are added to the template parameters and override
    /// the built-in ones of the same name. They are ignored by structured
    /// adapters, which take their context from configuration.
    pub fn build(
        &self,
        target: &DeliveryTarget,
        backend: &str,
        recipients: &[String],
        text: &str,
        priority: i32,
        extra: &[(&str, &str)],
    ) -> Result<OutboundRequest, DeliveryError> {
        let text = self.sanitizer.apply(text);

        if let Some(registered) = self.adapters.get(backend) {
            debug!(backend, engine = registered.adapter.engine(), "building request via adapter");
            return registered.adapter.prepare_request(
                priority,
                &text,
                recipients,
                &registered.context,
            );
        }

        let recipient = recipients.join(" ");
        let priority = priority.to_string();
        let mut params: BTreeMap<&str, String> = BTreeMap::new();
        params.insert("backend", quote_plus(backend));
        params.insert("recipient", quote_plus(&recipient));
        params.insert("text", quote_plus(&text));
        params.insert("priority", quote_plus(&priority));
        for (name, value) in extra {
            params.insert(*name, quote_plus(value));
        }

        let template = target
            .template_for(backend)
            .ok_or_else(|| DeliveryError::NoRoute {
                backend: backend.to_string(),
            })?;

        let url = render_template(template, &params)?;
        debug!(backend, url = %url, "built delivery url");
        Ok(OutboundRequest::Get { url })
    }
}

/// URL-encodes a value the way HTML forms do: spaces become `+`.
pub fn quote_plus(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

/// Substitutes `%(name)s` placeholders. `%%` renders a literal `%`.
///
/// Any other use of `%`, or a name missing from `params`, is an error.
pub fn render_template(
    template: &str,
    params: &BTreeMap<&str, String>,
) -> Result<String, DeliveryError> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(pos) = rest.find('%') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];

        if let Some(tail) = after.strip_prefix('%') {
            out.push('%');
            rest = tail;
            continue;
        }

        let Some(named) = after.strip_prefix('(') else {
            return Err(DeliveryError::Template {
                message: format!("unsupported `%` sequence in `{template}`"),
            });
        };
        let Some(close) = named.find(')') else {
            return Err(DeliveryError::Template {
                message: format!("unterminated placeholder in `{template}`"),
            });
        };
        let name = &named[..close];
        let Some(tail) = named[close + 1..].strip_prefix('s') else {
            return Err(DeliveryError::Template {
                message: format!("placeholder `{name}` must use the form %({name})s"),
            });
        };
        let value = params.get(name).ok_or_else(|| DeliveryError::Template {
            message: format!("unknown placeholder `{name}`"),
        })?;

        out.push_str(value);
        rest = tail;
    }

    out.push_str(rest);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::vumi::VumiAdapter;
    use std::sync::Arc;

    const KANNEL: &str =
        "http://kannel/send?to=%(recipient)s&text=%(text)s&smsc=%(backend)s&priority=%(priority)s";

    fn builder() -> RequestBuilder {
        RequestBuilder::new(Sanitizer::default(), BackendRegistry::new())
    }

    fn recipients(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    fn per_backend(pairs: &[(&str, &str)]) -> DeliveryTarget {
        DeliveryTarget::PerBackend(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn template_receives_encoded_params() {
        let target = DeliveryTarget::Template(KANNEL.to_string());
        let req = builder()
            .build(
                &target,
                "kannel",
                &recipients(&["256700000001", "256700000002"]),
                "hello world & more",
                1,
                &[],
            )
            .unwrap();

        assert_eq!(
            req,
            OutboundRequest::Get {
                url: "http://kannel/send?to=256700000001+256700000002&text=hello+world+%26+more&smsc=kannel&priority=1".to_string()
            }
        );
    }

    #[test]
    fn per_backend_map_prefers_specific_then_default() {
        let target = per_backend(&[
            ("default", "http://default/%(text)s"),
            ("yo", "http://yo/%(text)s"),
        ]);
        let b = builder();

        let yo = b.build(&target, "yo", &recipients(&["1"]), "hi", 1, &[]).unwrap();
        assert_eq!(yo.url(), "http://yo/hi");

        let other = b.build(&target, "mtn", &recipients(&["1"]), "hi", 1, &[]).unwrap();
        assert_eq!(other.url(), "http://default/hi");
    }

    #[test]
    fn missing_route_is_an_error() {
        let target = per_backend(&[("yo", "http://yo/%(text)s")]);
        let err = builder()
            .build(&target, "mtn", &recipients(&["1"]), "hi", 1, &[])
            .unwrap_err();
        assert!(matches!(err, DeliveryError::NoRoute { backend } if backend == "mtn"));
    }

    #[test]
    fn extra_params_fill_and_override() {
        let target = DeliveryTarget::Template("http://x/?a=%(account)s&p=%(priority)s".to_string());
        let req = builder()
            .build(
                &target,
                "kannel",
                &recipients(&["1"]),
                "hi",
                1,
                &[("account", "ops team"), ("priority", "9")],
            )
            .unwrap();
        assert_eq!(req.url(), "http://x/?a=ops+team&p=9");
    }

    #[test]
    fn text_is_sanitized_before_encoding() {
        let mut table = BTreeMap::new();
        table.insert("ç".to_string(), "c".to_string());
        let b = RequestBuilder::new(Sanitizer::new(&table).unwrap(), BackendRegistry::new());
        let target = DeliveryTarget::Template("http://x/%(text)s".to_string());

        let req = b.build(&target, "k", &recipients(&["1"]), "ça va", 1, &[]).unwrap();
        assert_eq!(req.url(), "http://x/ca+va");
    }

    #[test]
    fn registered_adapter_bypasses_template() {
        let mut adapters = BackendRegistry::new();
        adapters.register(
            "vumi",
            Arc::new(VumiAdapter::new("http://vumi/send/", None, None)),
            BTreeMap::new(),
        );
        let b = RequestBuilder::new(Sanitizer::default(), adapters);
        // No route exists for vumi; the adapter must not need one.
        let target = per_backend(&[("yo", "http://yo/%(text)s")]);

        let req = b
            .build(&target, "vumi", &recipients(&["256700000001"]), "hi", 2, &[])
            .unwrap();
        assert_eq!(req.method(), "POST");
        assert_eq!(req.url(), "http://vumi/send/");
    }

    #[test]
    fn render_handles_literal_percent() {
        let mut params = BTreeMap::new();
        params.insert("text", "hi".to_string());
        assert_eq!(
            render_template("100%% %(text)s", &params).unwrap(),
            "100% hi"
        );
    }

    #[test]
    fn render_rejects_unknown_and_malformed_placeholders() {
        let params = BTreeMap::new();
        assert!(matches!(
            render_template("%(missing)s", &params),
            Err(DeliveryError::Template { .. })
        ));
        assert!(render_template("%(open", &params).is_err());
        assert!(render_template("%(text)d", &params).is_err());
        assert!(render_template("50%", &params).is_err());
    }

    #[test]
    fn quote_plus_encodes_reserved_characters() {
        assert_eq!(quote_plus("a b&c=d/é"), "a+b%26c%3Dd%2F%C3%A9");
    }
}
