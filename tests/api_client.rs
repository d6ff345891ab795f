mod support;

use orshot_cli::request::{OutputFormat, RenderOptions, ResponseType, StudioOptions};
use orshot_cli::{ApiClient, ApiError, Credentials, RenderResult};
use serde_json::json;
use std::collections::BTreeMap;
use std::time::Duration;
use support::{closed_port, serve_json, serve_once, serve_silence};

fn client_for(base_url: &str) -> ApiClient {
    let creds = Credentials {
        domain: base_url.to_string(),
        ..Credentials::with_api_key("test-key-123456")
    };
    ApiClient::with_timeout(&creds, Duration::from_secs(5)).unwrap()
}

#[test]
fn library_modifications_query_template_id() {
    let (url, server) = serve_json(200, json!([{ "key": "title", "type": "text" }]));
    let specs = client_for(&url).get_library_template_modifications("tpl-1").unwrap();
    let request = server.join().unwrap();

    assert_eq!(
        request.request_line(),
        "GET /v1/templates/modifications?template_id=tpl-1 HTTP/1.1"
    );
    assert!(request.head.contains("authorization: Bearer test-key-123456"));
    assert!(request.head.contains("user-agent: orshot-cli/"));
    assert_eq!(specs.len(), 1);
    assert_eq!(specs[0].name(), "title");
}

#[test]
fn studio_modifications_query_template_id_camel_case() {
    let (url, server) = serve_json(200, json!([{ "id": "headline" }]));
    let specs = client_for(&url).get_studio_template_modifications("tpl-1").unwrap();
    let request = server.join().unwrap();

    assert_eq!(
        request.request_line(),
        "GET /v1/studio/template/modifications?templateId=tpl-1 HTTP/1.1"
    );
    assert_eq!(specs[0].name(), "headline");
}

#[test]
fn null_list_is_empty() {
    let (url, server) = serve_json(200, json!(null));
    let templates = client_for(&url).get_studio_templates().unwrap();
    server.join().unwrap();
    assert!(templates.is_empty());
}

#[test]
fn template_listing_passes_through() {
    let (url, server) = serve_json(
        200,
        json!([{ "id": 1, "title": "First" }, { "id": 2, "title": "Second" }]),
    );
    let templates = client_for(&url).get_library_templates().unwrap();
    let request = server.join().unwrap();

    assert_eq!(request.request_line(), "GET /v1/templates HTTP/1.1");
    let ids: Vec<&str> = templates.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, ["1", "2"]);
}

#[test]
fn status_codes_map_to_categories() {
    let (url, server) = serve_json(401, json!({ "error": "nope" }));
    let err = client_for(&url).get_library_templates().unwrap_err();
    server.join().unwrap();
    assert!(matches!(err, ApiError::Unauthorized));

    let (url, server) = serve_json(403, json!({}));
    let err = client_for(&url).get_current_user().unwrap_err();
    server.join().unwrap();
    assert!(matches!(err, ApiError::Forbidden));

    let (url, server) = serve_once(404, "text/html", "<h1>missing</h1>");
    let err = client_for(&url).get_studio_templates().unwrap_err();
    server.join().unwrap();
    assert!(matches!(err, ApiError::NotFound));

    let (url, server) = serve_json(429, json!({ "message": "slow down" }));
    let err = client_for(&url).get_library_templates().unwrap_err();
    server.join().unwrap();
    assert!(matches!(err, ApiError::RateLimited));
}

#[test]
fn other_statuses_carry_the_upstream_message() {
    let (url, server) = serve_json(500, json!({ "message": "renderer crashed" }));
    let err = client_for(&url).get_library_templates().unwrap_err();
    server.join().unwrap();
    match err {
        ApiError::Upstream { status, message } => {
            assert_eq!(status, 500);
            assert_eq!(message, "renderer crashed");
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn refused_connection_is_a_network_error() {
    let err = client_for(&closed_port()).get_library_templates().unwrap_err();
    assert!(matches!(err, ApiError::Network(_)), "got {:?}", err);
}

#[test]
fn timeout_is_a_network_error() {
    let url = serve_silence(Duration::from_secs(3));
    let creds = Credentials {
        domain: url,
        ..Credentials::with_api_key("k")
    };
    let api = ApiClient::with_timeout(&creds, Duration::from_millis(300)).unwrap();
    let err = api.get_library_templates().unwrap_err();
    assert!(matches!(err, ApiError::Network(_)), "got {:?}", err);
}

#[test]
fn missing_key_fails_before_any_request() {
    let creds = Credentials {
        domain: closed_port(),
        ..Credentials::default()
    };
    let api = ApiClient::with_timeout(&creds, Duration::from_secs(1)).unwrap();
    assert!(matches!(api.get_library_templates(), Err(ApiError::Authentication)));
}

#[test]
fn current_user_is_normalized() {
    let (url, server) = serve_json(
        200,
        json!({ "data": { "id": "u-9", "email": "ada@example.com", "full_name": "Ada" } }),
    );
    let user = client_for(&url).get_current_user().unwrap();
    let request = server.join().unwrap();

    assert_eq!(request.request_line(), "GET /v1/me/user_id HTTP/1.1");
    assert_eq!(user.user_id, "u-9");
    assert_eq!(user.email, "ada@example.com");
    assert_eq!(user.name, "Ada");
}

#[test]
fn library_render_posts_library_body() {
    let (url, server) = serve_json(200, json!({ "data": { "content": "aGVsbG8=" } }));
    let mut mods = BTreeMap::new();
    mods.insert("title".to_string(), "Hello".to_string());
    let result = client_for(&url)
        .generate_from_library(
            "og-1",
            mods,
            &RenderOptions {
                format: OutputFormat::Webp,
                response_type: ResponseType::Base64,
            },
        )
        .unwrap();
    let request = server.join().unwrap();

    assert_eq!(request.request_line(), "POST /v1/generate/images HTTP/1.1");
    assert!(request.head.contains("content-type: application/json"));
    assert_eq!(
        request.json(),
        json!({
            "templateId": "og-1",
            "modifications": { "title": "Hello" },
            "source": "cli",
            "response": { "format": "webp", "type": "base64" }
        })
    );
    assert_eq!(result, RenderResult::Json(json!({ "data": { "content": "aGVsbG8=" } })));
}

#[test]
fn studio_render_posts_pdf_options() {
    let (url, server) = serve_json(200, json!({ "url": "https://cdn/x.pdf" }));
    let options = StudioOptions {
        render: RenderOptions {
            format: OutputFormat::Pdf,
            response_type: ResponseType::Url,
        },
        dpi: Some(300),
        ..StudioOptions::default()
    };
    client_for(&url)
        .generate_from_studio("77", BTreeMap::new(), &options)
        .unwrap();
    let body = server.join().unwrap().json();

    assert_eq!(body["pdfOptions"]["dpi"], json!(300));
    assert!(body.get("videoOptions").is_none());
    assert_eq!(body["response"]["type"], json!("url"));
}

#[test]
fn binary_render_comes_back_as_bytes() {
    let png = vec![0x89, b'P', b'N', b'G', 0x0d, 0x0a];
    let (url, server) = serve_once(200, "image/png", png.clone());
    let options = StudioOptions {
        render: RenderOptions {
            format: OutputFormat::Png,
            response_type: ResponseType::Binary,
        },
        ..StudioOptions::default()
    };
    let result = client_for(&url)
        .generate_from_studio("77", BTreeMap::new(), &options)
        .unwrap();
    let request = server.join().unwrap();

    assert_eq!(request.request_line(), "POST /v1/studio/render HTTP/1.1");
    assert_eq!(result, RenderResult::Binary(png));
}
