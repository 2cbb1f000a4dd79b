//! proto3 schema templates

use super::TemplateSynthesizer;
use crate::fragment::SchemaFragment;
use genkit_artifact::schema::{Message, Rpc, Service};

/// Empty service entry
#[must_use]
pub fn service(t: &TemplateSynthesizer) -> SchemaFragment {
    let name = t.service_name();
    let comment = format!("The {name} service definition.");
    SchemaFragment::Service(Service::new(name).with_comment(&comment))
}

/// `rpc <M> (<M>Req) returns (<M>Rsp);`
#[must_use]
pub fn rpc(t: &TemplateSynthesizer, method: &str) -> SchemaFragment {
    let n = &t.naming;
    SchemaFragment::Rpc {
        service: t.service_name(),
        rpc: Rpc::new(method, n.request_message(method), n.response_message(method)),
    }
}

/// Empty request message
#[must_use]
pub fn request(t: &TemplateSynthesizer, method: &str) -> SchemaFragment {
    SchemaFragment::Message(Message::new(t.naming.request_message(method)))
}

/// Empty response message
#[must_use]
pub fn response(t: &TemplateSynthesizer, method: &str) -> SchemaFragment {
    SchemaFragment::Message(Message::new(t.naming.response_message(method)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::templates::test_synth;

    #[test]
    fn rpc_targets_the_camel_service() {
        let SchemaFragment::Rpc { service, rpc } = rpc(&test_synth(), "Ping") else {
            panic!("expected rpc fragment");
        };
        assert_eq!(service, "User");
        assert_eq!((rpc.request.as_str(), rpc.response.as_str()), ("PingReq", "PingRsp"));
    }

    #[test]
    fn service_carries_definition_comment() {
        let SchemaFragment::Service(svc) = service(&test_synth()) else {
            panic!("expected service fragment");
        };
        assert_eq!(svc.name, "User");
        assert_eq!(svc.comments, vec!["// The User service definition.".to_string()]);
    }
}
