//! Naming convention for required symbols
//!
//! Every generated name is a template with one `{}` placeholder filled with
//! the method (or service) name. The same method always yields the same
//! names, which is what makes re-runs detect their own output.

use heck::{ToKebabCase, ToSnakeCase, ToUpperCamelCase};
use serde::{Deserialize, Serialize};

/// Fill the `{}` placeholders of a template
#[inline]
#[must_use]
pub fn fill(template: &str, value: &str) -> String {
    template.replace("{}", value)
}

/// `value` with its first character mapped by `f`; the rest is kept as is
fn map_first(value: &str, f: impl FnOnce(char) -> String) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => f(first) + chars.as_str(),
        None => String::new(),
    }
}

/// Name templates, configurable under `[naming]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NamingConvention {
    /// HTTP/gRPC request decoder function
    pub decoder: String,
    /// HTTP/gRPC response encoder function
    pub encoder: String,
    /// Handler constructor function
    pub handler: String,
    /// Go request record in the pb package
    pub request_record: String,
    /// Go response record in the pb package
    pub response_record: String,
    /// Schema request message
    pub request_message: String,
    /// Schema response message
    pub response_message: String,
    /// Route pattern variable in the conf package
    pub route_pattern: String,
    /// Shared coder variable
    pub coder_var: String,
    /// Shared error encoder function
    pub error_encoder: String,
    /// Service interface, filled with the UpperCamelCase service name
    pub interface: String,
    /// Package name of generated pb records and schema
    pub schema_package: String,
    /// Receiver record of the gRPC server
    pub grpc_server: String,
    /// Endpoint field on the endpoint set
    pub endpoint: String,
}

impl Default for NamingConvention {
    fn default() -> Self {
        Self {
            decoder: "decode{}Request".into(),
            encoder: "encode{}Response".into(),
            handler: "make{}Handler".into(),
            request_record: "{}Req".into(),
            response_record: "{}Rsp".into(),
            request_message: "{}Req".into(),
            response_message: "{}Rsp".into(),
            route_pattern: "{}ReqPattern".into(),
            coder_var: "defaultCoder".into(),
            error_encoder: "ErrorEncoder".into(),
            interface: "{}Service".into(),
            schema_package: "pb".into(),
            grpc_server: "grpcServer".into(),
            endpoint: "{}Endpoint".into(),
        }
    }
}

impl NamingConvention {
    /// `decode<M>Request`
    #[must_use]
    pub fn decoder(&self, method: &str) -> String {
        fill(&self.decoder, method)
    }

    /// `encode<M>Response`
    #[must_use]
    pub fn encoder(&self, method: &str) -> String {
        fill(&self.encoder, method)
    }

    /// `make<M>Handler`
    #[must_use]
    pub fn handler(&self, method: &str) -> String {
        fill(&self.handler, method)
    }

    /// `<M>Req` Go record
    #[must_use]
    pub fn request_record(&self, method: &str) -> String {
        fill(&self.request_record, method)
    }

    /// `<M>Rsp` Go record
    #[must_use]
    pub fn response_record(&self, method: &str) -> String {
        fill(&self.response_record, method)
    }

    /// `<M>Req` schema message
    #[must_use]
    pub fn request_message(&self, method: &str) -> String {
        fill(&self.request_message, method)
    }

    /// `<M>Rsp` schema message
    #[must_use]
    pub fn response_message(&self, method: &str) -> String {
        fill(&self.response_message, method)
    }

    /// `<M>ReqPattern`
    #[must_use]
    pub fn route_pattern(&self, method: &str) -> String {
        fill(&self.route_pattern, &map_first(method, |c| c.to_uppercase().collect()))
    }

    /// Mounted path of a method: `GetUser` -> `/get-user`
    #[must_use]
    pub fn route_path(&self, method: &str) -> String {
        format!("/{}", method.to_kebab_case())
    }

    /// `<M>Endpoint`
    #[must_use]
    pub fn endpoint(&self, method: &str) -> String {
        fill(&self.endpoint, method)
    }

    /// Schema service name: `user_order` -> `UserOrder`
    #[must_use]
    pub fn service_name(&self, service: &str) -> String {
        service.to_upper_camel_case()
    }

    /// Interface the service declaration must contain
    #[must_use]
    pub fn interface(&self, service: &str) -> String {
        fill(&self.interface, &self.service_name(service))
    }

    /// Directory segment for a service: `UserOrder` -> `user_order`
    #[must_use]
    pub fn service_dir(&self, service: &str) -> String {
        service.to_snake_case()
    }

    /// gRPC server field holding a method's handler
    #[must_use]
    pub fn server_field(&self, method: &str) -> String {
        map_first(method, |c| c.to_lowercase().collect())
    }

    /// Request parameter type a conforming method takes: `pb.<M>Req`
    #[must_use]
    pub fn request_type(&self, method: &str) -> String {
        format!("{}.{}", self.schema_package, self.request_record(method))
    }

    /// Response parameter type a conforming method takes: `*pb.<M>Rsp`
    #[must_use]
    pub fn response_type(&self, method: &str) -> String {
        format!("*{}.{}", self.schema_package, self.response_record(method))
    }
}
