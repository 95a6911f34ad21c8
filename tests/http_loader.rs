#![cfg(feature = "http")]

mod common;

use std::collections::HashMap;
use std::convert::Infallible;
use std::net::TcpListener;
use std::sync::Arc;

use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::service::{make_service_fn, service_fn};
use hyper::{Body, Request, Response, Server, StatusCode};
use serde_json::json;
use vc_verify::{
    DocumentLoader, HttpLoader, ResolutionError, Verifier, VerifierOptions,
};

use common::*;

// localhost web server for serving documents by path.
fn web_server(
    listener: TcpListener,
    routes: HashMap<String, String>,
) -> impl FnOnce() -> Result<(), ()> {
    let routes = Arc::new(routes);
    let make_svc = make_service_fn(move |_| {
        let routes = routes.clone();
        async move {
            Ok::<_, Infallible>(service_fn(move |req: Request<Body>| {
                let routes = routes.clone();
                async move {
                    let response = match routes.get(req.uri().path()) {
                        Some(body) if body == "<invalid>" => Response::new(Body::from("{not json")),
                        Some(body) => {
                            let mut response = Response::new(Body::from(body.clone()));
                            response
                                .headers_mut()
                                .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
                            response
                        }
                        None if req.uri().path() == "/error" => {
                            let mut response = Response::new(Body::empty());
                            *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
                            response
                        }
                        None => {
                            let mut response = Response::new(Body::empty());
                            *response.status_mut() = StatusCode::NOT_FOUND;
                            response
                        }
                    };
                    Ok::<_, Infallible>(response)
                }
            }))
        }
    });
    let server = Server::from_tcp(listener).unwrap().serve(make_svc);
    let (shutdown_tx, shutdown_rx) = futures::channel::oneshot::channel();
    let graceful = server.with_graceful_shutdown(async {
        shutdown_rx.await.ok();
    });
    tokio::task::spawn(async move {
        graceful.await.ok();
    });
    move || shutdown_tx.send(())
}

fn bind() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    (listener, url)
}

#[tokio::test]
async fn fetch_statuses() {
    let (listener, base) = bind();
    let mut routes = HashMap::new();
    routes.insert("/doc.json".to_string(), r#"{"id": "doc"}"#.to_string());
    routes.insert("/invalid.json".to_string(), "<invalid>".to_string());
    let shutdown = web_server(listener, routes);

    let loader = HttpLoader::new().unwrap();
    let doc = loader.fetch(&format!("{base}/doc.json")).await.unwrap();
    assert_eq!(doc, json!({"id": "doc"}));

    assert!(matches!(
        loader.fetch(&format!("{base}/missing.json")).await,
        Err(ResolutionError::NotFound(_))
    ));
    assert!(matches!(
        loader.fetch(&format!("{base}/error")).await,
        Err(ResolutionError::Http { status: 500, .. })
    ));
    assert!(matches!(
        loader.fetch(&format!("{base}/invalid.json")).await,
        Err(ResolutionError::Malformed { .. })
    ));
    shutdown().ok();
}

#[tokio::test]
async fn verify_over_http() {
    let (listener, base) = bind();
    let document_url = format!("{base}/issuer.json");
    let key_id = format!("{document_url}#key-1");
    let key = issuer_key().verifying_key();
    let document = json!({
        "id": document_url,
        "verificationMethod": [verification_method(&key_id, &document_url, &key)],
        "assertionMethod": [key_id]
    });
    let mut routes = HashMap::new();
    routes.insert("/issuer.json".to_string(), document.to_string());
    let shutdown = web_server(listener, routes);

    let credential = sign_with(
        &credential(&document_url),
        &proof_options(&key_id),
        &issuer_key(),
    );
    let verifier = Verifier::new(
        Arc::new(HttpLoader::new().unwrap()),
        VerifierOptions::default(),
    );
    let outcome = verifier.verify_credential(&credential).await;
    assert!(outcome.verified, "{:?}", outcome.reason);

    let mut tampered = credential.clone();
    tampered["credentialSubject"]["gpa"] = json!(2.5);
    let outcome = verifier.verify_credential(&tampered).await;
    assert_eq!(outcome.reason.as_deref(), Some("signature mismatch"));
    shutdown().ok();
}
