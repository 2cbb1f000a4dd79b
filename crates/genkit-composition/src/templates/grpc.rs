//! go-kit gRPC transport templates

use super::{TemplateSynthesizer, CONTEXT, ERRORS, KIT_GRPC};
use crate::ast::{Decl, Expr, FuncDecl, Stmt, StructDecl, TypeRef};

fn endpoints(t: &TemplateSynthesizer) -> TypeRef {
    TypeRef::qual(&t.refs.endpoint, "Endpoints")
}

fn not_implemented(t: &TemplateSynthesizer, what: &str) -> Stmt {
    let message = format!("'{}' {what} is not implemented", t.service_name());
    Stmt::Return(vec![
        Expr::Nil,
        Expr::qual(ERRORS, "New").call(vec![Expr::str(message)]),
    ])
}

fn stub(name: String, doc: &str) -> FuncDecl {
    FuncDecl::new(&name)
        .doc(format!("{name} {doc}"))
        .param("_", TypeRef::qual(CONTEXT, "Context"))
        .param("r", TypeRef::Interface)
        .result("", TypeRef::Interface)
        .result("", TypeRef::named("error"))
}

/// `make<M>Handler` returning a `grpc.Handler`
#[must_use]
pub fn handler(t: &TemplateSynthesizer, method: &str) -> FuncDecl {
    let n = &t.naming;
    let name = n.handler(method);
    FuncDecl::new(&name)
        .doc(format!("{name} creates the handler logic"))
        .param("endpoints", endpoints(t))
        .param("options", TypeRef::qual(KIT_GRPC, "ServerOption").slice())
        .result("", TypeRef::qual(KIT_GRPC, "Handler"))
        .stmt(Stmt::Return(vec![Expr::qual(KIT_GRPC, "NewServer").call(vec![
            Expr::ident("endpoints").dot(n.endpoint(method)),
            Expr::ident(n.decoder(method)),
            Expr::ident(n.encoder(method)),
            Expr::ident("options").spread(),
        ])]))
}

/// Decoder stub left for the developer
#[must_use]
pub fn decoder(t: &TemplateSynthesizer, method: &str) -> FuncDecl {
    stub(
        t.naming.decoder(method),
        "is a transport/grpc.DecodeRequestFunc that converts a gRPC request to a user-domain request.",
    )
    .stmt(not_implemented(t, "Decoder"))
}

/// Encoder stub left for the developer
#[must_use]
pub fn encoder(t: &TemplateSynthesizer, method: &str) -> FuncDecl {
    stub(
        t.naming.encoder(method),
        "is a transport/grpc.EncodeResponseFunc that converts a user-domain response to a gRPC reply.",
    )
    .stmt(not_implemented(t, "Encoder"))
}

/// `(g *grpcServer) <M>` serving through the method's handler
#[must_use]
pub fn server_method(t: &TemplateSynthesizer, method: &str) -> FuncDecl {
    let n = &t.naming;
    let rsp = TypeRef::qual(&t.refs.pb, n.response_record(method)).pointer();
    FuncDecl::new(method)
        .receiver("g", TypeRef::named(&n.grpc_server).pointer())
        .param("ctx", TypeRef::qual(CONTEXT, "Context"))
        .param("req", TypeRef::qual(&t.refs.pb, n.request_record(method)).pointer())
        .result("", rsp.clone())
        .result("", TypeRef::named("error"))
        .stmt(Stmt::define(
            &["_", "rep", "err"],
            Expr::ident("g")
                .dot(n.server_field(method))
                .dot("ServeGRPC")
                .call(vec![Expr::ident("ctx"), Expr::ident("req")]),
        ))
        .stmt(Stmt::If {
            cond: Expr::ident("err").binary("!=", Expr::Nil),
            body: vec![Stmt::Return(vec![Expr::Nil, Expr::ident("err")])],
        })
        .stmt(Stmt::Return(vec![Expr::ident("rep").assert(rsp), Expr::Nil]))
}

/// `grpcServer` struct and `NewGRPCServer` constructor
///
/// Every admitted method gets a field; only methods whose handler exists
/// are wired in the constructor.
#[must_use]
pub fn base(t: &TemplateSynthesizer, admitted: &[String], with_handlers: &[String]) -> Vec<Decl> {
    let n = &t.naming;
    let handler_ty = TypeRef::qual(KIT_GRPC, "Handler");

    let server = admitted.iter().fold(StructDecl::new(&n.grpc_server), |s, m| {
        s.field(n.server_field(m), handler_ty.clone())
    });

    let fields = with_handlers
        .iter()
        .map(|m| {
            let make = Expr::ident(n.handler(m)).call(vec![
                Expr::ident("endpoints"),
                Expr::ident("options").index(Expr::str(m.as_str())),
            ]);
            (n.server_field(m), make)
        })
        .collect();

    let svc = t.service_name();
    let ctor = FuncDecl::new("NewGRPCServer")
        .doc(format!("NewGRPCServer makes a set of endpoints available as a gRPC {svc}Server"))
        .param("endpoints", endpoints(t))
        .param(
            "options",
            TypeRef::map_of(TypeRef::named("string"), TypeRef::qual(KIT_GRPC, "ServerOption").slice()),
        )
        .result("", TypeRef::qual(&t.refs.pb, format!("{svc}Server")))
        .stmt(Stmt::Return(vec![Expr::Composite {
            ty: TypeRef::named(&n.grpc_server),
            fields,
        }
        .addr()]));

    vec![server.into(), ctor.into()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::GoRenderer;
    use crate::templates::test_synth;
    use pretty_assertions::assert_eq;

    #[test]
    fn handler_returns_kit_server() {
        let text = GoRenderer::new().decl(&handler(&test_synth(), "Ping").into());
        assert_eq!(
            text,
            "// makePingHandler creates the handler logic\n\
             func makePingHandler(endpoints endpoint.Endpoints, options []grpc.ServerOption) grpc.Handler {\n\
             \treturn grpc.NewServer(endpoints.PingEndpoint, decodePingRequest, encodePingResponse, options...)\n\
             }\n"
        );
    }

    #[test]
    fn stubs_name_the_service() {
        let text = GoRenderer::new().decl(&decoder(&test_synth(), "Ping").into());
        assert!(text.contains("func decodePingRequest(_ context.Context, r interface{}) (interface{}, error) {\n"));
        assert!(text.contains("\treturn nil, errors.New(\"'User' Decoder is not implemented\")\n"));
    }

    #[test]
    fn server_method_asserts_response_type() {
        let text = GoRenderer::new().decl(&server_method(&test_synth(), "GetUser").into());
        assert_eq!(
            text,
            "func (g *grpcServer) GetUser(ctx context.Context, req *pb.GetUserReq) (*pb.GetUserRsp, error) {\n\
             \t_, rep, err := g.getUser.ServeGRPC(ctx, req)\n\
             \tif err != nil {\n\
             \t\treturn nil, err\n\
             \t}\n\
             \treturn rep.(*pb.GetUserRsp), nil\n\
             }\n"
        );
    }

    #[test]
    fn base_wires_only_existing_handlers() {
        let admitted = vec!["Ping".to_string(), "GetUser".to_string()];
        let decls = base(&test_synth(), &admitted, &admitted[..1]);
        let text = GoRenderer::new().decls(&decls);
        assert!(text.contains("type grpcServer struct {\n\tping    grpc.Handler\n\tgetUser grpc.Handler\n}\n"));
        assert!(text.contains("pb.UserServer {\n\treturn &grpcServer{\n\t\tping: makePingHandler(endpoints, options[\"Ping\"]),\n\t}\n}\n"));
    }
}
