//! pb request/response records

use super::TemplateSynthesizer;
use crate::ast::{StructDecl, TypeRef};

fn record(t: &TemplateSynthesizer, name: String, base: &str, message: String, what: &str, method: &str) -> StructDecl {
    let mut s = StructDecl::new(&name)
        .doc(format!("{name} collects the {what} parameters for the {method} method."))
        .embed(TypeRef::qual(&t.refs.comm_pb, base));
    // protoc emits the message into the same package; a record of the same
    // name would embed itself
    if message != name {
        s = s.embed(TypeRef::named(message));
    }
    s
}

/// `<M>Req` embedding `ReqBase` and the request message
#[must_use]
pub fn request(t: &TemplateSynthesizer, method: &str) -> StructDecl {
    let n = &t.naming;
    record(t, n.request_record(method), "ReqBase", n.request_message(method), "request", method)
}

/// `<M>Rsp` embedding `RspBase` and the response message
#[must_use]
pub fn response(t: &TemplateSynthesizer, method: &str) -> StructDecl {
    let n = &t.naming;
    record(t, n.response_record(method), "RspBase", n.response_message(method), "response", method)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::GoRenderer;
    use crate::templates::test_synth;
    use genkit_symbol::NamingConvention;
    use pretty_assertions::assert_eq;

    #[test]
    fn default_names_embed_only_the_base() {
        let text = GoRenderer::new().decl(&request(&test_synth(), "Ping").into());
        assert_eq!(
            text,
            "// PingReq collects the request parameters for the Ping method.\ntype PingReq struct {\n\tpb.ReqBase\n}\n"
        );
    }

    #[test]
    fn distinct_message_name_is_embedded() {
        let naming = NamingConvention {
            response_message: "{}Reply".into(),
            ..NamingConvention::default()
        };
        let mut t = test_synth();
        t.naming = naming;
        let text = GoRenderer::new().decl(&response(&t, "Ping").into());
        assert!(text.contains("type PingRsp struct {\n\tpb.RspBase\n\tPingReply\n}\n"));
    }
}
