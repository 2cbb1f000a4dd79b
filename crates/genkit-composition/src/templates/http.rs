//! go-kit HTTP transport templates

use super::{TemplateSynthesizer, CONTEXT, GORILLA_HANDLERS, GORILLA_MUX, KIT_HTTP, NET_HTTP};
use crate::ast::{Expr, FuncDecl, Stmt, TypeRef, VarDecl};

fn ctx_param() -> TypeRef {
    TypeRef::qual(CONTEXT, "Context")
}

fn coder(t: &TemplateSynthesizer) -> Expr {
    Expr::ident(&t.naming.coder_var)
}

fn endpoints(t: &TemplateSynthesizer) -> TypeRef {
    TypeRef::qual(&t.refs.endpoint, "Endpoints")
}

/// `http1.NewServer(endpoints.<M>Endpoint, decode<M>Request, encode<M>Response, options...)`
fn new_server(t: &TemplateSynthesizer, method: &str) -> Expr {
    let n = &t.naming;
    Expr::qual(KIT_HTTP, "NewServer").call(vec![
        Expr::ident("endpoints").dot(n.endpoint(method)),
        Expr::ident(n.decoder(method)),
        Expr::ident(n.encoder(method)),
        Expr::ident("options").spread(),
    ])
}

/// `var defaultCoder = http1.DefaultCoder{}`
#[must_use]
pub fn coder_var(t: &TemplateSynthesizer) -> VarDecl {
    VarDecl::new(
        &t.naming.coder_var,
        Expr::empty_composite(TypeRef::qual(&t.refs.comm_http, "DefaultCoder")),
    )
}

/// Shared error encoder delegating to the coder
#[must_use]
pub fn error_encoder(t: &TemplateSynthesizer) -> FuncDecl {
    FuncDecl::new(&t.naming.error_encoder)
        .param("ctx", ctx_param())
        .param("err", TypeRef::named("error"))
        .param("w", TypeRef::qual(NET_HTTP, "ResponseWriter"))
        .stmt(Stmt::Expr(coder(t).dot("ErrorEncoder").call(vec![
            Expr::ident("ctx"),
            Expr::ident("err"),
            Expr::ident("w"),
        ])))
}

/// `make<M>Handler` mounting the endpoint at its route pattern
#[must_use]
pub fn handler(t: &TemplateSynthesizer, method: &str) -> FuncDecl {
    let name = t.naming.handler(method);
    let pattern = Expr::qual(&t.refs.conf, t.naming.route_pattern(method));

    let (router, mount) = if t.gorilla_mux {
        let string_slice = |v: &str| Expr::SliceLit {
            elem: TypeRef::named("string"),
            items: vec![Expr::str(v)],
        };
        let cors = Expr::qual(GORILLA_HANDLERS, "CORS")
            .call(vec![
                Expr::qual(GORILLA_HANDLERS, "AllowedMethods").call(vec![string_slice("POST")]),
                Expr::qual(GORILLA_HANDLERS, "AllowedOrigins").call(vec![string_slice("*")]),
            ])
            .call(vec![new_server(t, method)]);
        let mount = Expr::ident("m")
            .dot("Methods")
            .call(vec![Expr::str("POST")])
            .dot("Path")
            .call(vec![pattern])
            .dot("Handler")
            .call(vec![cors]);
        (TypeRef::qual(GORILLA_MUX, "Router"), mount)
    } else {
        let mount = Expr::ident("m")
            .dot("Handle")
            .call(vec![pattern, new_server(t, method)]);
        (TypeRef::qual(NET_HTTP, "ServeMux"), mount)
    };

    FuncDecl::new(&name)
        .doc(format!("{name} creates the handler logic"))
        .param("m", router.pointer())
        .param("endpoints", endpoints(t))
        .param("options", TypeRef::qual(KIT_HTTP, "ServerOption").slice())
        .stmt(Stmt::Expr(mount))
}

/// JSON request decoder into the pb request record
#[must_use]
pub fn decoder(t: &TemplateSynthesizer, method: &str) -> FuncDecl {
    let name = t.naming.decoder(method);
    FuncDecl::new(&name)
        .doc(format!("{name} is a transport/http.DecodeRequestFunc that decodes a"))
        .doc("JSON-encoded request from the HTTP request body.")
        .param("ctx", ctx_param())
        .param("r", TypeRef::qual(NET_HTTP, "Request").pointer())
        .result("", TypeRef::Interface)
        .result("", TypeRef::named("error"))
        .stmt(Stmt::define(
            &["req"],
            Expr::empty_composite(TypeRef::qual(&t.refs.pb, t.naming.request_record(method))),
        ))
        .stmt(Stmt::define(
            &["err"],
            coder(t).dot("Decoder").call(vec![
                Expr::ident("ctx"),
                Expr::ident("r"),
                Expr::ident("req").addr(),
            ]),
        ))
        .stmt(Stmt::Return(vec![Expr::ident("req"), Expr::ident("err")]))
}

/// JSON response encoder
#[must_use]
pub fn encoder(t: &TemplateSynthesizer, method: &str) -> FuncDecl {
    let name = t.naming.encoder(method);
    FuncDecl::new(&name)
        .doc(format!("{name} is a transport/http.EncodeResponseFunc that encodes"))
        .doc("the response as JSON to the response writer")
        .param("ctx", ctx_param())
        .param("w", TypeRef::qual(NET_HTTP, "ResponseWriter"))
        .param("response", TypeRef::Interface)
        .result("err", TypeRef::named("error"))
        .stmt(Stmt::Return(vec![coder(t).dot("Encoder").call(vec![
            Expr::ident("ctx"),
            Expr::ident("w"),
            Expr::ident("response"),
        ])]))
}

/// `NewHTTPHandler` calling every mounted `make<M>Handler`
#[must_use]
pub fn base_handler(t: &TemplateSynthesizer, mounted: &[String]) -> FuncDecl {
    let router = if t.gorilla_mux {
        Expr::qual(GORILLA_MUX, "NewRouter").call(vec![])
    } else {
        Expr::qual(NET_HTTP, "NewServeMux").call(vec![])
    };

    let mut f = FuncDecl::new("NewHTTPHandler")
        .doc("NewHTTPHandler returns a handler that makes a set of endpoints available on")
        .doc("predefined paths.")
        .param("endpoints", endpoints(t))
        .param(
            "options",
            TypeRef::map_of(TypeRef::named("string"), TypeRef::qual(KIT_HTTP, "ServerOption").slice()),
        )
        .result("", TypeRef::qual(NET_HTTP, "Handler"))
        .stmt(Stmt::define(&["m"], router));

    for method in mounted {
        f = f.stmt(Stmt::Expr(Expr::ident(t.naming.handler(method)).call(vec![
            Expr::ident("m"),
            Expr::ident("endpoints"),
            Expr::ident("options").index(Expr::str(method.as_str())),
        ])));
    }
    f.stmt(Stmt::Return(vec![Expr::ident("m")]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::GoRenderer;
    use crate::templates::test_synth;
    use pretty_assertions::assert_eq;

    #[test]
    fn servemux_handler() {
        let mut r = GoRenderer::with_imports(&[genkit_artifact::ImportSpec::new(NET_HTTP)]);
        let text = r.decl(&handler(&test_synth(), "CreateOrder").into());
        assert_eq!(
            text,
            "// makeCreateOrderHandler creates the handler logic\n\
             func makeCreateOrderHandler(m *http.ServeMux, endpoints endpoint.Endpoints, options []http1.ServerOption) {\n\
             \tm.Handle(conf.CreateOrderReqPattern, http1.NewServer(endpoints.CreateOrderEndpoint, decodeCreateOrderRequest, encodeCreateOrderResponse, options...))\n\
             }\n"
        );
    }

    #[test]
    fn gorilla_handler_wraps_cors() {
        let t = test_synth().gorilla_mux(true);
        let mut r = GoRenderer::new();
        let text = r.decl(&handler(&t, "Ping").into());
        assert!(text.contains("m *mux.Router"));
        assert!(text.contains(
            "m.Methods(\"POST\").Path(conf.PingReqPattern).Handler(handlers.CORS(handlers.AllowedMethods([]string{\"POST\"}), handlers.AllowedOrigins([]string{\"*\"}))(http1.NewServer("
        ));
    }

    #[test]
    fn decoder_uses_pb_record() {
        let mut r = GoRenderer::new();
        let text = r.decl(&decoder(&test_synth(), "Ping").into());
        assert!(text.contains("func decodePingRequest(ctx context.Context, r *http.Request) (interface{}, error) {\n"));
        assert!(text.contains("\treq := pb.PingReq{}\n\terr := defaultCoder.Decoder(ctx, r, &req)\n\treturn req, err\n"));
    }

    #[test]
    fn base_handler_mounts_in_order() {
        let mut r = GoRenderer::new();
        let text = r.decl(&base_handler(&test_synth(), &["Ping".into(), "Pong".into()]).into());
        assert!(text.contains("\tm := http.NewServeMux()\n\tmakePingHandler(m, endpoints, options[\"Ping\"])\n\tmakePongHandler(m, endpoints, options[\"Pong\"])\n\treturn m\n"));
    }
}
