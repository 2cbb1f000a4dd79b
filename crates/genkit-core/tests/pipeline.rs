//! End-to-end pipeline runs over an in-memory project

use genkit_core::{GenerateError, GenerateRequest, Generator};
use genkit_layer::{ArtifactStore, MemoryFetcher, MemoryStore, StoreError, WriteStatus};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use genkit_symbol::{PolicyViolation, Transport};
use genkit_test_utils::{conforming, legacy, resolver, service_source, test_config, TestProject};
use pretty_assertions::assert_eq;

fn http(service: &str) -> GenerateRequest {
    GenerateRequest::new(service, "http")
}

fn run(project: &TestProject, request: &GenerateRequest) -> genkit_core::GenerationReport {
    Generator::new(test_config(), resolver(), &project.store)
        .add_transport(request)
        .unwrap()
}

fn synthesized(report: &genkit_core::GenerationReport, path: &std::path::Path) -> Vec<String> {
    report
        .artifact(path)
        .unwrap_or_else(|| panic!("no outcome for {}", path.display()))
        .synthesized
        .clone()
}

#[test]
fn legacy_method_is_kept_and_mismatch_rejected() {
    let other = "Other(ctx context.Context, id string) int32";
    let project = TestProject::new("user", "User", &[&legacy("GetUser"), other, "helper() int32"]);

    let report = run(&project, &http("user"));

    assert_eq!(report.kept, ["GetUser"]);
    assert_eq!(report.rewritten, ["GetUser"]);
    let reasons: Vec<_> = report.rejections.iter().map(|r| (r.method.as_str(), &r.reason)).collect();
    assert_eq!(reasons.len(), 2);
    let expected = PolicyViolation::SignatureMismatch {
        expected: conforming("Other"),
    };
    assert_eq!(reasons[0], ("Other", &expected));
    assert_eq!(reasons[1], ("helper", &PolicyViolation::Private));

    let handler = project.read(&project.paths.http_file);
    assert!(handler.contains("func makeGetUserHandler("));
    assert!(!handler.contains("makeOtherHandler"));

    // rewrites stay in memory without the flag
    assert!(project.read(&project.paths.service_file).contains(&legacy("GetUser")));
}

#[test]
fn signature_rewrites_are_persisted_on_request() {
    let project = TestProject::new("user", "User", &[&legacy("GetUser")]);

    let report = run(&project, &http("user").with_signature_rewrites(true));

    let service = project.read(&project.paths.service_file);
    assert!(service.contains("GetUser(ctx context.Context, req_pb pb.GetUserReq, rsp_pb *pb.GetUserRsp) int32"));
    let outcome = report.artifact(&project.paths.service_file).unwrap();
    assert_eq!(outcome.status, WriteStatus::Updated);

    // the rewritten declaration now conforms; nothing left to rewrite
    let again = run(&project, &http("user").with_signature_rewrites(true));
    assert!(again.rewritten.is_empty());
    assert!(again.is_noop());
}

#[test]
fn first_http_generation_creates_every_artifact() {
    let project = TestProject::new("order", "Order", &[&conforming("CreateOrder")]);

    let report = run(&project, &http("order"));

    assert_eq!(report.transport, Some(Transport::Http));
    assert_eq!(
        synthesized(&report, &project.paths.http_file),
        [
            "variable:defaultCoder",
            "function:ErrorEncoder",
            "function:makeCreateOrderHandler",
            "function:decodeCreateOrderRequest",
            "function:encodeCreateOrderResponse",
        ]
    );
    for outcome in &report.artifacts {
        assert!(outcome.first_generation, "{} existed", outcome.path.display());
        assert_eq!(outcome.status, WriteStatus::Created);
    }

    let handler = project.read(&project.paths.http_file);
    assert!(handler.starts_with("package http\n"));
    assert!(handler.contains("var defaultCoder"));
    assert!(handler.contains("func ErrorEncoder("));
    assert!(handler.contains("func decodeCreateOrderRequest("));
    assert!(handler.contains("func encodeCreateOrderResponse("));

    let base = project.read(&project.paths.http_base_file);
    assert!(base.contains("func NewHTTPHandler("));
    assert!(base.contains("makeCreateOrderHandler(m, endpoints, options[\"CreateOrder\"])"));

    let routes = project.read(&project.paths.routes_file);
    assert!(routes.starts_with("package conf\n"));
    assert!(routes.contains("CreateOrderReqPattern = \"/create-order\""));

    let records = project.read(&project.paths.records_file);
    assert!(records.contains("type CreateOrderReq struct"));
    assert!(records.contains("type CreateOrderRsp struct"));

    let schema = project.read(&project.paths.schema_file);
    assert!(schema.contains("service Order {\n  rpc CreateOrder (CreateOrderReq) returns (CreateOrderRsp);\n}"));
    assert!(project.store.get(&project.paths.compile_script).unwrap().contains("protoc order.proto"));
}

#[test]
fn new_method_is_appended_and_hand_edits_survive() {
    let project = TestProject::new("order", "Order", &[&conforming("CreateOrder")]);
    run(&project, &http("order"));

    let edited = format!(
        "{}\n// audit logs every request\nfunc audit(s string) {{\n\tprintln(s)\n}}\n",
        project.read(&project.paths.http_file)
    );
    project.store.write(&project.paths.http_file, &edited, true).unwrap();
    project.set_service("Order", &[&conforming("CreateOrder"), &conforming("CancelOrder")]);

    let report = run(&project, &http("order"));

    assert_eq!(
        synthesized(&report, &project.paths.http_file),
        [
            "function:makeCancelOrderHandler",
            "function:decodeCancelOrderRequest",
            "function:encodeCancelOrderResponse",
        ]
    );
    assert_eq!(synthesized(&report, &project.paths.routes_file), ["variable:CancelOrderReqPattern"]);
    assert!(!report.artifact(&project.paths.http_file).unwrap().first_generation);

    let handler = project.read(&project.paths.http_file);
    assert!(handler.contains("// audit logs every request\nfunc audit(s string) {"));
    assert!(handler.contains("func makeCreateOrderHandler("));
    assert!(handler.contains("func makeCancelOrderHandler("));
    assert_eq!(handler.matches("var defaultCoder").count(), 1);
    assert!(handler.find("func audit(").unwrap() < handler.find("func makeCancelOrderHandler(").unwrap());

    let base = project.read(&project.paths.http_base_file);
    assert!(base.contains("options[\"CreateOrder\"]"));
    assert!(base.contains("options[\"CancelOrder\"]"));
}

#[test]
fn schema_gains_only_the_new_rpc_and_messages() {
    let project = TestProject::new("user", "User", &[&conforming("Ping")]);
    let generator = Generator::new(test_config(), resolver(), &project.store);
    generator.add_schema("user", &[]).unwrap();

    project.set_service("User", &[&conforming("Ping"), &conforming("Pong")]);
    let report = generator.add_schema("user", &[]).unwrap();

    assert_eq!(report.transport, None);
    assert_eq!(
        synthesized(&report, &project.paths.schema_file),
        ["rpc:User.Pong", "message:PongReq", "message:PongRsp"]
    );
    let schema = project.read(&project.paths.schema_file);
    assert_eq!(schema.matches("service User").count(), 1);
    assert!(schema.contains("  rpc Ping (PingReq) returns (PingRsp);\n  rpc Pong (PongReq) returns (PongRsp);\n"));
    assert!(project.store.get(&project.paths.http_file).is_none());
}

#[test]
fn second_run_changes_nothing() {
    let project = TestProject::new("order", "Order", &[&conforming("CreateOrder"), &conforming("CancelOrder")]);
    run(&project, &http("order").with_gorilla_mux(true));
    let before = project.store.snapshot();

    let report = run(&project, &http("order").with_gorilla_mux(true));

    assert!(report.is_noop(), "rewrote {:?}", report.written().map(|a| &a.path).collect::<Vec<_>>());
    assert!(report.artifacts.iter().all(|a| a.synthesized.is_empty()));
    assert_eq!(project.store.snapshot(), before);
}

#[test]
fn acronym_method_names_route_once() {
    let project = TestProject::new("user", "User", &[&conforming("GetUserByID")]);
    run(&project, &http("user"));

    let again = run(&project, &http("user"));

    assert!(again.is_noop());
    let routes = project.read(&project.paths.routes_file);
    assert_eq!(routes.matches("var GetUserByIDReqPattern = \"/get-user-by-id\"").count(), 1);
    assert!(project.read(&project.paths.http_file).contains("conf.GetUserByIDReqPattern"));
}

#[test]
fn no_suitable_methods_writes_nothing() {
    let project = TestProject::new("user", "User", &["helper() int32", "Close(ctx context.Context)"]);

    let err = Generator::new(test_config(), resolver(), &project.store)
        .add_transport(&http("user"))
        .unwrap_err();

    assert!(matches!(err, GenerateError::NoSuitableMethods { ref service } if service == "user"));
    assert!(project.generated().is_empty());
}

#[test]
fn unsupported_transport_is_rejected_before_reading() {
    let store = MemoryStore::new();

    let err = Generator::new(test_config(), resolver(), &store)
        .add_transport(&GenerateRequest::new("user", "thrift"))
        .unwrap_err();

    assert!(matches!(err, GenerateError::UnsupportedConfiguration(ref kind) if kind == "thrift"));
    assert_eq!(err.to_string(), "transport `thrift` not supported");
}

#[test]
fn missing_service_declaration() {
    let store = MemoryStore::new();
    let err = Generator::new(test_config(), resolver(), &store)
        .add_transport(&http("user"))
        .unwrap_err();
    assert!(matches!(err, GenerateError::ServiceNotFound { .. }));
    assert!(err.path().unwrap().ends_with("user/pkg/service/service.go"));
}

#[test]
fn missing_interface() {
    let project = TestProject::new("user", "Account", &[&conforming("Ping")]);
    let err = Generator::new(test_config(), resolver(), &project.store)
        .add_transport(&http("user"))
        .unwrap_err();
    assert!(matches!(err, GenerateError::InterfaceNotFound { ref interface, .. } if interface == "UserService"));
}

#[test]
fn corrupt_handler_aborts_before_it_is_overwritten() {
    let project = TestProject::new("user", "User", &[&conforming("Ping")]);
    let broken = "package http\n\nfunc broken( {\n";
    project.store.write(&project.paths.http_file, broken, true).unwrap();

    let err = Generator::new(test_config(), resolver(), &project.store)
        .add_transport(&http("user"))
        .unwrap_err();

    assert!(matches!(err, GenerateError::ArtifactCorrupt { ref path, .. } if *path == project.paths.http_file));
    assert_eq!(project.read(&project.paths.http_file), broken);
    // earlier stages stay committed
    assert!(project.store.get(&project.paths.records_file).is_some());
    assert!(project.store.get(&project.paths.http_base_file).is_none());
}

/// Store that appends `edit` to `target` right after its first read
#[derive(Debug)]
struct EditedAfterRead<'a> {
    inner: &'a MemoryStore,
    target: PathBuf,
    edit: &'static str,
    done: AtomicBool,
}

impl ArtifactStore for EditedAfterRead<'_> {
    fn exists(&self, path: &Path) -> Result<bool, StoreError> {
        self.inner.exists(path)
    }

    fn read(&self, path: &Path) -> Result<String, StoreError> {
        let text = self.inner.read(path)?;
        if path == self.target && !self.done.swap(true, Ordering::SeqCst) {
            self.inner.write(path, &format!("{text}{}", self.edit), true)?;
        }
        Ok(text)
    }

    fn write(&self, path: &Path, text: &str, overwrite: bool) -> Result<(), StoreError> {
        self.inner.write(path, text, overwrite)
    }

    fn read_optional(&self, path: &Path) -> Result<Option<String>, StoreError> {
        if self.inner.exists(path)? {
            self.read(path).map(Some)
        } else {
            Ok(None)
        }
    }
}

#[test]
fn edit_during_the_run_is_not_overwritten() {
    let project = TestProject::new("user", "User", &[&legacy("GetUser")]);
    let edit = "\nvar mine = 1\n";
    let store = EditedAfterRead {
        inner: &project.store,
        target: project.paths.service_file.clone(),
        edit,
        done: AtomicBool::new(false),
    };

    let err = Generator::new(test_config(), resolver(), &store)
        .add_transport(&http("user").with_signature_rewrites(true))
        .unwrap_err();

    assert!(matches!(err, GenerateError::ArtifactChanged { ref path } if *path == project.paths.service_file));
    assert_eq!(err.path(), Some(project.paths.service_file.as_path()));
    let service = project.read(&project.paths.service_file);
    assert!(service.ends_with(edit));
    assert!(service.contains(&legacy("GetUser")));
}

#[test]
fn allow_list_limits_handlers_and_base_mounts_existing_ones() {
    let project = TestProject::new("order", "Order", &[&conforming("CreateOrder"), &conforming("CancelOrder")]);

    let report = run(&project, &http("order").with_methods(["CreateOrder"]));
    assert_eq!(report.kept, ["CreateOrder"]);
    let base = project.read(&project.paths.http_base_file);
    assert!(base.contains("makeCreateOrderHandler("));
    assert!(!base.contains("makeCancelOrderHandler("));

    run(&project, &http("order").with_methods(["CancelOrder"]));
    let base = project.read(&project.paths.http_base_file);
    assert!(base.contains("makeCreateOrderHandler("));
    assert!(base.contains("makeCancelOrderHandler("));
    let routes = project.read(&project.paths.routes_file);
    assert!(routes.contains("CreateOrderReqPattern"));
    assert!(routes.contains("CancelOrderReqPattern"));
}

#[test]
fn grpc_generation_wires_server_fields() {
    let project = TestProject::new("user", "User", &[&conforming("Ping"), &conforming("GetUser")]);

    let report = run(&project, &GenerateRequest::new("user", "grpc"));

    assert_eq!(report.transport, Some(Transport::Grpc));
    let handler = project.read(&project.paths.grpc_file);
    assert!(handler.starts_with("package grpc\n"));
    assert!(handler.contains("func (g *grpcServer) Ping(ctx context.Context, req *pb.PingReq) (*pb.PingRsp, error) {"));
    assert!(handler.contains("func decodeGetUserRequest("));
    assert!(!handler.contains("defaultCoder"));

    let base = project.read(&project.paths.grpc_base_file);
    assert!(base.contains("type grpcServer struct"));
    assert!(base.contains("func NewGRPCServer("));
    assert!(base.contains("getUser: makeGetUserHandler(endpoints, options[\"GetUser\"]),"));
    assert!(project.store.get(&project.paths.routes_file).is_none());
}

#[test]
fn imported_messages_are_not_synthesized() {
    let project = TestProject::new("user", "User", &[&conforming("Ping")]);
    project
        .store
        .write(
            &project.paths.schema_file,
            "syntax = \"proto3\";\n\npackage pb;\n\nimport \"common.proto\";\n",
            true,
        )
        .unwrap();
    let fetcher = MemoryFetcher::new().with_document(
        "https://schemas.example.com/common.proto",
        "syntax = \"proto3\";\n\npackage pb;\n\nmessage PingReq {}\n",
    );
    let mut config = test_config();
    config
        .schema
        .imports
        .insert("common.proto".into(), "https://schemas.example.com/common.proto".into());

    let report = Generator::new(config, resolver(), &project.store)
        .with_fetcher(&fetcher)
        .add_schema("user", &[])
        .unwrap();

    assert_eq!(
        synthesized(&report, &project.paths.schema_file),
        ["service:User", "rpc:User.Ping", "message:PingRsp"]
    );
    let schema = project.read(&project.paths.schema_file);
    assert!(schema.contains("import \"common.proto\";"));
    assert!(!schema.contains("message PingReq"));
}

#[test]
fn unreachable_import_fails_the_run() {
    let project = TestProject::new("user", "User", &[&conforming("Ping")]);
    project
        .store
        .write(&project.paths.schema_file, "syntax = \"proto3\";\n\nimport \"common.proto\";\n", true)
        .unwrap();
    let mut config = test_config();
    config.schema.imports.insert("common.proto".into(), "mem:missing".into());

    let err = Generator::new(config, resolver(), &project.store)
        .with_fetcher(&MemoryFetcher::new())
        .add_schema("user", &[])
        .unwrap_err();

    assert!(matches!(err, GenerateError::Import(_)));
}

#[test]
fn report_serializes_for_machine_output() {
    let project = TestProject::new("user", "User", &[&conforming("Ping"), "helper() int32"]);
    let report = run(&project, &http("user"));

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["service"], "user");
    assert_eq!(json["transport"], "http");
    assert_eq!(json["kept"], serde_json::json!(["Ping"]));
    assert_eq!(json["rejections"][0]["reason"]["kind"], "private");
    assert!(json.get("rewritten").is_none());
    assert_eq!(json["artifacts"][0]["status"], "created");
}

#[test]
fn service_declaration_fixture_parses_as_go() {
    let text = service_source("User", &[&conforming("Ping")]);
    let model = genkit_artifact::GoParser::new().parse(&text).unwrap();
    assert_eq!(model.interface("UserService").unwrap().methods.len(), 1);
}

mod reruns {
    use super::*;
    use proptest::prelude::*;

    const NAMES: [&str; 5] = ["CreateOrder", "CancelOrder", "GetOrder", "ListOrders", "Ping"];

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(12))]

        #[test]
        fn rerun_after_any_growth_is_noop(
            first in proptest::sample::subsequence(NAMES.to_vec(), 1..=5),
            grpc in any::<bool>(),
        ) {
            let transport = if grpc { "grpc" } else { "http" };
            let all: Vec<String> = first.iter().map(|n| conforming(n)).collect();
            let all: Vec<&str> = all.iter().map(String::as_str).collect();

            let project = TestProject::new("order", "Order", &all[..1]);
            run(&project, &GenerateRequest::new("order", transport));
            project.set_service("Order", &all);
            run(&project, &GenerateRequest::new("order", transport));

            let again = run(&project, &GenerateRequest::new("order", transport));
            prop_assert!(again.is_noop());
            prop_assert_eq!(again.kept.len(), first.len());
        }
    }
}
