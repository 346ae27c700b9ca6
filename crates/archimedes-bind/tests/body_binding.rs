//! End-to-end binding tests across content types.

use archimedes_bind::{
    bind_body, Bind, BindConfig, BindError, BindRequest, Binder, ContentKind, FieldViolation,
    FileHandle, RequestBody, Validate,
};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures_util::stream;
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Serialize, Deserialize, Bind, PartialEq)]
#[serde(default)]
struct Person {
    #[bind(form = "name")]
    name: String,
    #[bind(form = "age")]
    age: i32,
    #[bind(form = "email")]
    #[serde(rename = "emailAddress")]
    email: Option<String>,
}

#[derive(Debug, Default, Deserialize, Bind)]
#[serde(default)]
struct Survey {
    #[bind(form = "answer")]
    answers: Vec<u8>,
    #[bind(form = "answer")]
    first_answer: u8,
    #[bind(form = "submitted")]
    submitted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Deserialize, Bind)]
#[serde(default)]
#[bind(validate)]
struct Upload {
    #[bind(form = "title")]
    title: String,
    #[bind(form = "tag")]
    tags: Vec<String>,
    #[bind(file = "attachment")]
    #[serde(skip)]
    attachments: Vec<FileHandle>,
    #[bind(file = "cover")]
    #[serde(skip)]
    cover: Option<FileHandle>,
}

impl Validate for Upload {
    fn validate(&self) -> Vec<FieldViolation> {
        let mut violations = Vec::new();
        if self.title.trim().is_empty() {
            violations.push(FieldViolation::new("title", "must not be blank"));
        }
        violations
    }
}

#[derive(Debug, Default, Deserialize, Bind)]
#[serde(default)]
struct Application {
    #[bind(form = "age")]
    age: u8,
    #[bind(file = "resume")]
    #[serde(skip)]
    resume: Option<FileHandle>,
}

fn request(content_type: &str, body: impl Into<RequestBody>) -> BindRequest {
    BindRequest::builder()
        .content_type(content_type)
        .body(body)
        .build()
}

fn multipart_body(boundary: &str, parts: &[(&str, Option<&str>, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, filename, data) in parts {
        body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        match filename {
            Some(filename) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(b"Content-Type: text/plain\r\n");
            }
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{name}\"\r\n").as_bytes(),
            ),
        }
        body.extend_from_slice(b"\r\n");
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
    body
}

#[tokio::test]
async fn test_json_body() {
    let person: Person = bind_body(request(
        "application/json; charset=utf-8",
        r#"{"name":"Alice","age":30,"emailAddress":"alice@example.com"}"#,
    ))
    .await
    .unwrap();

    assert_eq!(
        person,
        Person {
            name: "Alice".into(),
            age: 30,
            email: Some("alice@example.com".into()),
        }
    );
}

#[tokio::test]
async fn test_json_round_trip() {
    let people = [
        Person::default(),
        Person {
            name: "Zoë \"Z\" Müller".into(),
            age: -17,
            email: None,
        },
        Person {
            name: "Grace Hopper".into(),
            age: i32::MAX,
            email: Some("grace@example.com".into()),
        },
    ];

    for person in people {
        let body = serde_json::to_string(&person).unwrap();
        let bound: Person = bind_body(request("application/json", body)).await.unwrap();
        assert_eq!(bound, person);
    }
}

#[tokio::test]
async fn test_xml_body() {
    let person: Person = bind_body(request(
        "text/xml",
        "<person><name>Bob</name><age>41</age></person>",
    ))
    .await
    .unwrap();

    assert_eq!(person.name, "Bob");
    assert_eq!(person.age, 41);
    assert_eq!(person.email, None);
}

#[tokio::test]
async fn test_yaml_body() {
    let person: Person = bind_body(request("application/x-yaml", "name: Carol\nage: 25\n"))
        .await
        .unwrap();

    assert_eq!(person.name, "Carol");
    assert_eq!(person.age, 25);
}

#[tokio::test]
async fn test_json_type_mismatch_is_conversion_error() {
    let err = bind_body::<Person>(request("application/json", r#"{"age":"old"}"#))
        .await
        .unwrap_err();

    assert_eq!(err.status_code(), http::StatusCode::BAD_REQUEST);
    assert_eq!(err.as_conversion().unwrap().field(), Some("age"));
}

#[tokio::test]
async fn test_yaml_type_mismatch_is_conversion_error() {
    let err = bind_body::<Person>(request("text/yaml", "age: abc\n"))
        .await
        .unwrap_err();

    let conversion = err.as_conversion().unwrap();
    assert_eq!(conversion.field(), Some("age"));
    assert_eq!(conversion.expected(), "i32");
}

#[tokio::test]
async fn test_whitespace_body_binds_nothing() {
    for content_type in ["application/json", "application/xml", "text/yaml"] {
        let person: Person = bind_body(request(content_type, "\n")).await.unwrap();
        assert_eq!(person, Person::default(), "content type {content_type}");
    }
}

#[tokio::test]
async fn test_oversized_form_rejected_by_default() {
    let body = format!("name={}", "x".repeat(archimedes_bind::DEFAULT_MAX_FORM_SIZE));

    let err = bind_body::<Person>(request("application/x-www-form-urlencoded", body))
        .await
        .unwrap_err();

    assert!(matches!(err, BindError::PayloadTooLarge { .. }));
    assert_eq!(err.status_code(), http::StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_malformed_json() {
    let err = bind_body::<Person>(request("application/json", "{not json"))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        BindError::MalformedBody {
            format: ContentKind::Json,
            ..
        }
    ));
}

#[tokio::test]
async fn test_empty_body_binds_nothing() {
    let content_types = [
        "application/json",
        "application/xml",
        "text/yaml",
        "application/x-www-form-urlencoded",
        "multipart/form-data; boundary=abc",
    ];
    for content_type in content_types {
        let person: Person = bind_body(request(content_type, "")).await.unwrap();
        assert_eq!(person, Person::default(), "content type {content_type}");
    }
}

#[tokio::test]
async fn test_unsupported_content_type() {
    let err = bind_body::<Person>(request("text/plain", "name=Alice"))
        .await
        .unwrap_err();

    assert!(matches!(err, BindError::UnsupportedContentType(ref ct) if ct == "text/plain"));
    assert_eq!(err.status_code(), http::StatusCode::UNSUPPORTED_MEDIA_TYPE);
}

#[tokio::test]
async fn test_urlencoded_conversion_failure() {
    let err = bind_body::<Person>(request(
        "application/x-www-form-urlencoded",
        "name=Alice&age=abc",
    ))
    .await
    .unwrap_err();

    let conversion = err.as_conversion().unwrap();
    assert_eq!(conversion.field(), Some("age"));
    assert_eq!(conversion.value(), "abc");
    assert_eq!(conversion.expected(), "i32");
}

#[tokio::test]
async fn test_partial_binding_survives_failure() {
    let mut person = Person::default();
    let err = Binder::new()
        .bind_body_into(
            &mut person,
            request("application/x-www-form-urlencoded", "name=Alice&age=abc"),
        )
        .await
        .unwrap_err();

    assert!(err.as_conversion().is_some());
    assert_eq!(person.name, "Alice");
    assert_eq!(person.age, 0);
}

#[tokio::test]
async fn test_repeated_and_single_share_a_tag() {
    let survey: Survey = bind_body(request(
        "application/x-www-form-urlencoded",
        "answer=3&answer=1&answer=2&submitted=2024-03-01T12:00:00Z",
    ))
    .await
    .unwrap();

    assert_eq!(survey.answers, [3, 1, 2]);
    assert_eq!(survey.first_answer, 3);
    assert_eq!(
        survey.submitted_at.unwrap().to_rfc3339(),
        "2024-03-01T12:00:00+00:00"
    );
}

#[tokio::test]
async fn test_multipart_values_and_files() {
    let body = multipart_body(
        "upload-boundary",
        &[
            ("title", None, b"Quarterly report"),
            ("tag", None, b"finance"),
            ("tag", None, b"q3"),
            ("attachment", Some("summary.txt"), b"summary"),
            ("attachment", Some("detail.txt"), b"detail"),
            ("cover", Some("cover.txt"), b"cover"),
        ],
    );

    let upload: Upload = bind_body(request(
        "multipart/form-data; boundary=upload-boundary",
        body,
    ))
    .await
    .unwrap();

    assert_eq!(upload.title, "Quarterly report");
    assert_eq!(upload.tags, ["finance", "q3"]);

    let names: Vec<_> = upload.attachments.iter().map(FileHandle::file_name).collect();
    assert_eq!(names, ["summary.txt", "detail.txt"]);
    assert_eq!(upload.attachments[1].extension(), Some("txt"));

    let cover = upload.cover.unwrap();
    assert_eq!(cover.content_type(), Some(&mime::TEXT_PLAIN));
    assert_eq!(&cover.bytes().await.unwrap()[..], b"cover");
}

#[tokio::test]
async fn test_multipart_value_failure_stops_before_files() {
    let body = multipart_body(
        "b",
        &[
            ("resume", Some("cv.txt"), b"experience"),
            ("age", None, b"abc"),
        ],
    );

    let mut application = Application::default();
    let err = Binder::new()
        .bind_body_into(
            &mut application,
            request("multipart/form-data; boundary=b", body),
        )
        .await
        .unwrap_err();

    let conversion = err.as_conversion().unwrap();
    assert_eq!(conversion.field(), Some("age"));
    assert_eq!(conversion.value(), "abc");
    assert_eq!(application.age, 0);
    assert!(application.resume.is_none());
}

#[tokio::test]
async fn test_multipart_value_then_file() {
    let body = multipart_body(
        "b",
        &[
            ("resume", Some("cv.txt"), b"experience"),
            ("age", None, b"33"),
        ],
    );

    let application: Application = bind_body(request("multipart/form-data; boundary=b", body))
        .await
        .unwrap();

    assert_eq!(application.age, 33);
    assert_eq!(application.resume.unwrap().file_name(), "cv.txt");
}

#[tokio::test]
async fn test_multipart_spooling_is_transparent() {
    let dir = tempfile::tempdir().unwrap();
    let binder = Binder::with_config(BindConfig {
        max_memory: 16,
        temp_dir: Some(dir.path().to_path_buf()),
        ..BindConfig::default()
    });

    let large = vec![b'x'; 4096];
    let body = multipart_body(
        "b",
        &[
            ("title", None, b"Big"),
            ("attachment", Some("big.bin"), &large),
        ],
    );

    let upload: Upload = binder
        .bind_body(request("multipart/form-data; boundary=b", body))
        .await
        .unwrap();

    let attachment = &upload.attachments[0];
    assert!(attachment.is_spooled());
    assert_eq!(attachment.size(), 4096);
    assert_eq!(attachment.bytes().await.unwrap().len(), 4096);
}

#[tokio::test]
async fn test_multipart_validation_failure() {
    let body = multipart_body("b", &[("title", None, b"   ")]);

    let err = bind_body::<Upload>(request("multipart/form-data; boundary=b", body))
        .await
        .unwrap_err();

    let validation = err.as_validation().unwrap();
    assert_eq!(validation.violations()[0].field(), "title");
    assert_eq!(err.status_code(), http::StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_streamed_body() {
    let chunks = vec![
        Ok::<_, std::io::Error>(Bytes::from_static(b"name=Al")),
        Ok(Bytes::new()),
        Ok(Bytes::from_static(b"ice&age=7")),
    ];
    let request = BindRequest::builder()
        .content_type("application/x-www-form-urlencoded")
        .body(RequestBody::from_stream(stream::iter(chunks)))
        .build();

    let person: Person = bind_body(request).await.unwrap();
    assert_eq!(person.name, "Alice");
    assert_eq!(person.age, 7);
}

#[tokio::test]
async fn test_from_http_request() {
    let request = http::Request::builder()
        .method("POST")
        .header("Content-Type", "application/json")
        .body(http_body_util::Full::new(Bytes::from_static(
            br#"{"name":"Dana","age":52}"#,
        )))
        .unwrap();

    let person: Person = bind_body(BindRequest::from_http(request)).await.unwrap();
    assert_eq!(person.name, "Dana");
    assert_eq!(person.age, 52);
}

#[test]
fn test_header_binding_is_case_insensitive() {
    let request = BindRequest::builder()
        .header("X-Retry-Count", "4")
        .header("x-trace", "abc")
        .build();

    let retries: u8 = request.header_field("x-retry-count").unwrap();
    let trace: String = request.header_field("X-TRACE").unwrap();
    let missing: i64 = request.header_field("x-missing").unwrap();

    assert_eq!(retries, 4);
    assert_eq!(trace, "abc");
    assert_eq!(missing, 0);
}
