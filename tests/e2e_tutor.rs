#![cfg(unix)]

use expectrl::{Eof, Error as ExpectError, Session};
use serial_test::serial;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::thread;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{body_string_contains, method, path as path_matcher, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const EXPECT_TIMEOUT: Duration = Duration::from_secs(4);
const EXPECT_RETRIES: usize = 3;
const MODEL_PATH: &str = "/v1beta/models/gemini-test:generateContent";

struct App {
    session: Session,
    _config_home: TempDir,
    state_home: TempDir,
    _work_dir: TempDir,
}

#[test]
#[serial]
fn startup_renders_prompt_status_and_trace() {
    let mut app = spawn_app(None, Some("test-key"));

    expect_text(&mut app.session, "you> ");
    expect_text(&mut app.session, "TutorAI | Session: ");

    exit_repl(&mut app.session);
    let (trace_path, content) = read_trace_file(&app.state_home);
    assert!(trace_path.exists());
    assert!(content.contains("[session    ] started "), "trace content:\n{content}");
    assert!(content.contains("[session    ] ended"), "trace content:\n{content}");
}

#[test]
#[serial]
fn question_is_answered_through_the_mock_service() {
    let rt = tokio::runtime::Runtime::new().expect("tokio runtime");
    let server = rt.block_on(MockServer::start());
    rt.block_on(async {
        Mock::given(method("POST"))
            .and(path_matcher(MODEL_PATH))
            .and(query_param("key", "test-key"))
            .and(body_string_contains("Student's Current Query:** What is a tuple?"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                r#"{"candidates":[{"content":{"parts":[{"text":"Mock tutor explains tuples"}]}}]}"#,
                "application/json",
            ))
            .expect(1)
            .mount(&server)
            .await;
    });

    let mut app = spawn_app(Some(&server), Some("test-key"));
    expect_text(&mut app.session, "you> ");

    submit_line(&mut app.session, "What is a tuple?");
    expect_text(&mut app.session, "Mock tutor explains tuples");

    exit_repl(&mut app.session);
    let (_trace_path, content) = read_trace_file(&app.state_home);
    assert!(content.contains("[student    ] What is a tuple?"), "trace content:\n{content}");
    assert!(
        content.contains("[tutor      ] Mock tutor explains tuples"),
        "trace content:\n{content}"
    );
    assert!(!content.contains("test-key"), "trace must not store the key");
}

#[test]
#[serial]
fn service_error_is_reported_and_next_question_recovers() {
    let rt = tokio::runtime::Runtime::new().expect("tokio runtime");
    let server = rt.block_on(MockServer::start());
    rt.block_on(async {
        Mock::given(method("POST"))
            .and(path_matcher(MODEL_PATH))
            .and(body_string_contains("first question"))
            .and(body_string_contains("History):**\\nNone"))
            .respond_with(ResponseTemplate::new(400).set_body_raw(
                r#"{"error":{"code":400,"message":"API key not valid"}}"#,
                "application/json",
            ))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path_matcher(MODEL_PATH))
            .and(body_string_contains("second question"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                r#"{"candidates":[{"content":{"parts":[{"text":"Recovered answer"}]}}]}"#,
                "application/json",
            ))
            .expect(1)
            .mount(&server)
            .await;
    });

    let mut app = spawn_app(Some(&server), Some("test-key"));
    expect_text(&mut app.session, "you> ");

    submit_line(&mut app.session, "first question");
    thread::sleep(Duration::from_millis(250));
    submit_line(&mut app.session, "second question");
    expect_text(&mut app.session, "Recovered answer");

    exit_repl(&mut app.session);
    let (_trace_path, content) = read_trace_file(&app.state_home);
    assert!(
        content.contains(
            "An AI API error occurred: API key not valid (HTTP 400). Check your API key's validity."
        ),
        "trace content:\n{content}"
    );
    assert!(content.contains("Recovered answer"), "trace content:\n{content}");
}

#[test]
#[serial]
fn missing_key_is_reported_without_any_request() {
    let rt = tokio::runtime::Runtime::new().expect("tokio runtime");
    let server = rt.block_on(MockServer::start());
    rt.block_on(async {
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
    });

    let mut app = spawn_app(Some(&server), None);
    expect_text(&mut app.session, "you> ");

    submit_line(&mut app.session, "What is a dict?");
    expect_text(&mut app.session, "GEMINI_API_KEY not found");

    exit_repl(&mut app.session);
    let (_trace_path, content) = read_trace_file(&app.state_home);
    assert!(
        content.contains(
            "ERROR: GEMINI_API_KEY not found. Please set your API key in your environment variables."
        ),
        "trace content:\n{content}"
    );
    assert!(!content.contains("[http.req"), "no request should be sent");
}

#[test]
#[serial]
fn slash_commands_are_traced_and_never_sent() {
    let mut app = spawn_app(None, Some("test-key"));
    expect_text(&mut app.session, "you> ");

    submit_line(&mut app.session, "/help");
    expect_text(&mut app.session, "Available commands:");
    submit_line(&mut app.session, "/history");
    expect_text(&mut app.session, "No previous interactions yet.");

    exit_repl(&mut app.session);
    let (_trace_path, content) = read_trace_file(&app.state_home);
    assert!(content.contains("[command    ] /help"), "trace content:\n{content}");
    assert!(content.contains("[command    ] /history"), "trace content:\n{content}");
    assert!(!content.contains("[student"), "commands are not questions");
}

fn spawn_app(server: Option<&MockServer>, api_key: Option<&str>) -> App {
    let config_home = tempfile::tempdir().expect("create XDG_CONFIG_HOME tempdir");
    let state_home = tempfile::tempdir().expect("create XDG_STATE_HOME tempdir");
    let work_dir = tempfile::tempdir().expect("working dir tempdir");
    let base_url = server.map_or_else(|| "http://127.0.0.1:9".to_string(), MockServer::uri);
    let cfg_path = write_test_config(work_dir.path(), &base_url);

    let mut command = Command::new(binary_path());
    command
        .arg("--config")
        .arg(&cfg_path)
        .current_dir(work_dir.path())
        .env("NO_COLOR", "1")
        .env("XDG_CONFIG_HOME", config_home.path())
        .env("XDG_STATE_HOME", state_home.path())
        .env("GEMINI_MODEL", "gemini-test")
        .env("GEMINI_BASE_URL", &base_url);
    match api_key {
        Some(key) => command.env("GEMINI_API_KEY", key),
        None => command.env_remove("GEMINI_API_KEY"),
    };

    let mut session = Session::spawn(command).expect("spawn tutorai in PTY");
    session.set_expect_timeout(Some(EXPECT_TIMEOUT));

    App {
        session,
        _config_home: config_home,
        state_home,
        _work_dir: work_dir,
    }
}

fn write_test_config(dir: &Path, base_url: &str) -> PathBuf {
    let path = dir.join("config.toml");
    let content = format!(
        "gemini_model = \"gemini-test\"\n\
         gemini_base_url = \"{base_url}\"\n\
         \n\
         [context]\n\
         window = 10\n"
    );
    fs::write(&path, content).expect("write test config");
    path
}

fn binary_path() -> String {
    std::env::var("CARGO_BIN_EXE_tutorai").unwrap_or_else(|_| "target/debug/tutorai".to_string())
}

fn submit_line(session: &mut Session, line: &str) {
    session.send(line).expect("send line text");
    session.send([b'\r']).expect("send Enter");
}

fn exit_repl(session: &mut Session) {
    submit_line(session, "quit");
    let _ = session.expect(Eof);
    thread::sleep(Duration::from_millis(25));
}

fn expect_text(session: &mut Session, text: &str) {
    for attempt in 1..=EXPECT_RETRIES {
        match session.expect(text) {
            Ok(_) => return,
            Err(ExpectError::ExpectTimeout) if attempt < EXPECT_RETRIES => continue,
            Err(err) => panic!(
                "failed to match text {:?} on attempt {}: {}",
                text, attempt, err
            ),
        }
    }

    panic!("unreachable: retries exhausted without returning");
}

fn read_trace_file(state_home: &TempDir) -> (PathBuf, String) {
    let trace_dir = state_home.path().join("tutorai").join("traces");
    let mut entries = fs::read_dir(&trace_dir)
        .unwrap_or_else(|err| panic!("failed to read {}: {err}", trace_dir.display()))
        .collect::<Result<Vec<_>, _>>()
        .unwrap_or_else(|err| panic!("failed to iterate {}: {err}", trace_dir.display()));
    assert_eq!(
        entries.len(),
        1,
        "expected exactly one trace file in {}",
        trace_dir.display()
    );
    let entry = entries.remove(0);
    let path = entry.path();
    let content = fs::read_to_string(&path)
        .unwrap_or_else(|err| panic!("failed to read {}: {err}", path.display()));
    (path, content)
}
