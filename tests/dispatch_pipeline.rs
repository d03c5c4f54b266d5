//! End-to-end pipeline behavior over the generic wire formats.

mod common;

use std::sync::{Arc, Mutex};

use common::{body_str, content_type, send, Echo, EchoResponse};
use http::{Method, StatusCode};
use service_host::content::Format;
use service_host::errors::DispatchError;
use service_host::registry::{Operation, OperationDef};
use service_host::{BufferedResponse, Dispatcher, HostConfig, HostState, TransportRequest};

fn echo_operation(def: OperationDef) -> Operation {
    Operation::reply::<Echo, EchoResponse, _, _>(def, |req, _attrs| async move {
        Ok(EchoResponse { text: req.text })
    })
}

fn echo_dispatcher() -> Dispatcher {
    let mut host = HostState::default();
    host.register(echo_operation(
        OperationDef::new().named("Echo").route("/echo").route("/echo/{Text}"),
    ))
    .unwrap();
    Dispatcher::new(host.into_ready())
}

#[tokio::test]
async fn get_binds_from_query_onto_a_default_instance() {
    let dispatcher = echo_dispatcher();
    let outcome = send(
        &dispatcher,
        TransportRequest::new(Method::GET, "/echo").with_query_string("text=hello"),
    )
    .await;

    outcome.result.as_ref().unwrap();
    assert_eq!(outcome.response.status(), StatusCode::OK);
    assert_eq!(body_str(&outcome), r#"{"text":"hello"}"#);
    assert_eq!(content_type(&outcome), "application/json");
}

#[tokio::test]
async fn route_params_overlay_the_request() {
    let dispatcher = echo_dispatcher();
    let outcome = send(
        &dispatcher,
        TransportRequest::new(Method::GET, "/echo/from-path"),
    )
    .await;
    outcome.result.as_ref().unwrap();
    assert_eq!(body_str(&outcome), r#"{"text":"from-path"}"#);
}

#[tokio::test]
async fn unmatched_path_is_a_404_with_an_error_body() {
    let dispatcher = echo_dispatcher();
    let outcome = send(&dispatcher, TransportRequest::new(Method::GET, "/nowhere")).await;

    assert!(matches!(
        &outcome.result,
        Err(DispatchError::RouteNotFound { .. })
    ));
    assert_eq!(outcome.response.status(), StatusCode::NOT_FOUND);
    assert!(body_str(&outcome).contains("route_not_found"));
    assert!(outcome.response.is_finalized());
}

#[tokio::test]
async fn path_suffix_beats_the_accept_header() {
    let dispatcher = echo_dispatcher();
    let outcome = send(
        &dispatcher,
        TransportRequest::new(Method::GET, "/echo/hi.xml")
            .with_header(http::header::ACCEPT, "application/json"),
    )
    .await;

    outcome.result.as_ref().unwrap();
    assert_eq!(content_type(&outcome), "application/xml");
    assert!(body_str(&outcome).contains("<text>hi</text>"));
}

#[tokio::test]
async fn post_body_decodes_in_the_negotiated_format() {
    let dispatcher = echo_dispatcher();
    let outcome = send(
        &dispatcher,
        TransportRequest::new(Method::POST, "/echo")
            .with_header(http::header::CONTENT_TYPE, "application/json")
            .with_body(r#"{"text":"posted"}"#),
    )
    .await;
    outcome.result.as_ref().unwrap();
    assert_eq!(body_str(&outcome), r#"{"text":"posted"}"#);
}

#[tokio::test]
async fn form_encoded_bodies_bind_by_field_name() {
    let dispatcher = echo_dispatcher();
    let outcome = send(
        &dispatcher,
        TransportRequest::new(Method::POST, "/echo")
            .with_header(http::header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .with_body("text=form%20value"),
    )
    .await;
    outcome.result.as_ref().unwrap();
    assert_eq!(body_str(&outcome), r#"{"text":"form value"}"#);
}

#[tokio::test]
async fn unknown_body_content_type_falls_back_to_defaults() {
    let dispatcher = echo_dispatcher();
    let outcome = send(
        &dispatcher,
        TransportRequest::new(Method::POST, "/echo")
            .with_header(http::header::CONTENT_TYPE, "application/octet-stream")
            .with_body(&b"\x00\x01\x02"[..]),
    )
    .await;
    outcome.result.as_ref().unwrap();
    assert_eq!(body_str(&outcome), r#"{"text":""}"#);
}

#[tokio::test]
async fn filters_interleave_globals_between_priority_groups() {
    let log = Arc::new(Mutex::new(Vec::<String>::new()));
    let tag = |log: &Arc<Mutex<Vec<String>>>, name: &str| {
        let log = log.clone();
        let name = name.to_string();
        move |_ctx: &mut service_host::RequestContext, _payload: &mut dyn std::any::Any| {
            log.lock().unwrap().push(name.clone());
            Ok(())
        }
    };

    let mut host = HostState::default();
    {
        let log = log.clone();
        host.add_request_filter(Arc::new(move |_ctx, _payload| {
            log.lock().unwrap().push("global".to_string());
            Ok(())
        }))
        .unwrap();
    }
    host.register(echo_operation(
        OperationDef::new()
            .named("Echo")
            .route("/echo")
            .request_filter(3, tag(&log, "3"))
            .request_filter(-5, tag(&log, "-5"))
            .request_filter(0, tag(&log, "0"))
            .request_filter(-1, tag(&log, "-1")),
    ))
    .unwrap();
    let dispatcher = Dispatcher::new(host.into_ready());

    let outcome = send(&dispatcher, TransportRequest::new(Method::GET, "/echo")).await;
    outcome.result.as_ref().unwrap();
    assert_eq!(*log.lock().unwrap(), vec!["-5", "-1", "global", "0", "3"]);
}

#[tokio::test]
async fn closing_filter_preserves_its_body_and_skips_the_handler() {
    let invoked = Arc::new(Mutex::new(false));
    let mut host = HostState::default();
    host.add_request_filter(Arc::new(|ctx, _payload| {
        ctx.response.set_status(StatusCode::TOO_MANY_REQUESTS);
        ctx.response.write_body(b"slow down")?;
        ctx.response.close();
        Ok(())
    }))
    .unwrap();
    {
        let invoked = invoked.clone();
        host.register(Operation::reply::<Echo, EchoResponse, _, _>(
            OperationDef::new().named("Echo").route("/echo"),
            move |req, _attrs| {
                let invoked = invoked.clone();
                async move {
                    *invoked.lock().unwrap() = true;
                    Ok(EchoResponse { text: req.text })
                }
            },
        ))
        .unwrap();
    }
    let dispatcher = Dispatcher::new(host.into_ready());

    let outcome = send(&dispatcher, TransportRequest::new(Method::GET, "/echo")).await;
    outcome.result.as_ref().unwrap();
    assert_eq!(outcome.response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body_str(&outcome), "slow down");
    assert!(!*invoked.lock().unwrap());
}

#[tokio::test]
async fn handler_fault_renders_the_error_envelope() {
    let mut host = HostState::default();
    host.register(Operation::reply::<Echo, EchoResponse, _, _>(
        OperationDef::new().named("Echo").route("/echo"),
        |_req, _attrs| async { Err(DispatchError::fault("Echo", "storage offline")) },
    ))
    .unwrap();
    let dispatcher = Dispatcher::new(host.into_ready());

    let outcome = send(&dispatcher, TransportRequest::new(Method::GET, "/echo")).await;
    assert!(matches!(
        &outcome.result,
        Err(DispatchError::OperationFault { .. })
    ));
    assert_eq!(outcome.response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_str(&outcome);
    assert!(body.contains("operation_fault"));
    assert!(body.contains("storage offline"));
}

#[tokio::test]
async fn jsonp_wraps_json_replies_for_valid_callbacks() {
    let dispatcher = echo_dispatcher();
    let outcome = send(
        &dispatcher,
        TransportRequest::new(Method::GET, "/echo").with_query_string("text=hi&callback=onLoad"),
    )
    .await;
    outcome.result.as_ref().unwrap();
    assert_eq!(body_str(&outcome), r#"onLoad({"text":"hi"})"#);
    assert!(content_type(&outcome).starts_with("application/javascript"));

    // suspicious callback names fall back to plain json
    let outcome = send(
        &dispatcher,
        TransportRequest::new(Method::GET, "/echo").with_query_string("text=hi&callback=alert(1)"),
    )
    .await;
    outcome.result.as_ref().unwrap();
    assert_eq!(content_type(&outcome), "application/json");
}

#[tokio::test]
async fn debug_inspection_renders_a_flattened_text_view() {
    let dispatcher = echo_dispatcher();
    let outcome = send(
        &dispatcher,
        TransportRequest::new(Method::GET, "/echo").with_query_string("text=peek&debug=inspect"),
    )
    .await;
    outcome.result.as_ref().unwrap();
    assert!(content_type(&outcome).starts_with("text/plain"));
    assert!(body_str(&outcome).contains("text: \"peek\""));
}

#[tokio::test]
async fn one_way_operations_answer_204() {
    let mut host = HostState::default();
    host.register(Operation::one_way::<Echo, _, _>(
        OperationDef::new().named("FireEvent").route("/events"),
        |_req, _attrs| async { Ok(()) },
    ))
    .unwrap();
    let dispatcher = Dispatcher::new(host.into_ready());

    let outcome = send(
        &dispatcher,
        TransportRequest::new(Method::POST, "/events")
            .with_header(http::header::CONTENT_TYPE, "application/json")
            .with_body(r#"{"text":"x"}"#),
    )
    .await;
    outcome.result.as_ref().unwrap();
    assert_eq!(outcome.response.status(), StatusCode::NO_CONTENT);
    assert!(body_str(&outcome).is_empty());
}

#[tokio::test]
async fn disabled_formats_are_refused_up_front() {
    let mut config = HostConfig::default();
    config.enabled_formats.retain(|f| *f != Format::Csv);
    let mut host = HostState::new(config);
    host.register(echo_operation(OperationDef::new().named("Echo").route("/echo")))
        .unwrap();
    let dispatcher = Dispatcher::new(host.into_ready());

    let outcome = send(
        &dispatcher,
        TransportRequest::new(Method::GET, "/echo").with_query_string("format=csv"),
    )
    .await;
    assert!(matches!(
        &outcome.result,
        Err(DispatchError::UnauthorizedFormat { .. })
    ));
    assert_eq!(outcome.response.status(), StatusCode::FORBIDDEN);
    // refusal rendered in the default format, not the denied one
    assert_eq!(content_type(&outcome), "application/json");
}

#[tokio::test]
async fn dispatch_before_ready_is_a_lifecycle_error() {
    let host = Arc::new(HostState::default());
    let dispatcher = Dispatcher::new(host);
    let outcome = send(&dispatcher, TransportRequest::new(Method::GET, "/echo")).await;
    assert!(matches!(&outcome.result, Err(DispatchError::Lifecycle(_))));
    assert_eq!(outcome.response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn restricted_operations_reject_mismatched_callers() {
    use service_host::RequestAttributes;

    let mut host = HostState::default();
    host.register(echo_operation(
        OperationDef::new()
            .named("Echo")
            .route("/echo")
            .restrict(RequestAttributes::SECURE),
    ))
    .unwrap();
    let dispatcher = Dispatcher::new(host.into_ready());

    let outcome = dispatcher
        .dispatch_with_attributes(
            TransportRequest::new(Method::GET, "/echo"),
            Box::new(BufferedResponse::new()),
            RequestAttributes::INSECURE,
        )
        .await;
    assert!(matches!(
        &outcome.result,
        Err(DispatchError::UnauthorizedAccess { .. })
    ));
    assert_eq!(outcome.response.status(), StatusCode::FORBIDDEN);

    let outcome = dispatcher
        .dispatch_with_attributes(
            TransportRequest::new(Method::GET, "/echo").with_query_string("text=ok"),
            Box::new(BufferedResponse::new()),
            RequestAttributes::SECURE,
        )
        .await;
    outcome.result.as_ref().unwrap();
}

#[tokio::test]
async fn custom_binder_replaces_the_default_binding() {
    let mut host = HostState::default();
    host.register(echo_operation(OperationDef::new().named("Echo").route("/echo")))
        .unwrap();
    host.register_binder(
        "Echo",
        Arc::new(|request| {
            let text = request.header_str("x-echo").unwrap_or("missing").to_string();
            Ok(Box::new(Echo { text }))
        }),
    )
    .unwrap();
    let dispatcher = Dispatcher::new(host.into_ready());

    let outcome = send(
        &dispatcher,
        TransportRequest::new(Method::GET, "/echo").with_header("x-echo", "bound"),
    )
    .await;
    outcome.result.as_ref().unwrap();
    assert_eq!(body_str(&outcome), r#"{"text":"bound"}"#);
}
