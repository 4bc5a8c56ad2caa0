use assert_cmd::Command;
use predicates::prelude::*;
use std::fs::write;
use tempfile::{tempdir, NamedTempFile};

/// Creates a config pointing at a classifier that is not listening.
fn create_offline_config() -> NamedTempFile {
    let config = NamedTempFile::new().expect("Creating temp config file failed");
    write(
        config.path(),
        b"app:\n  name: cli-test\n  owner: tester\nclassifier:\n  url: \"http://127.0.0.1:9\"\n  timeout_secs: 2\n",
    )
    .expect("Writing temp config failed");
    config
}

#[test]
fn load_prints_documents_even_when_classifier_is_unreachable() {
    let config = create_offline_config();
    let dir = tempdir().unwrap();
    let input = dir.path().join("notes.txt");
    write(&input, "hello from the cli").unwrap();

    let mut cmd = Command::cargo_bin("pebblo-reader").expect("Binary exists");
    cmd.arg("load")
        .arg("--config")
        .arg(config.path())
        .arg(&input)
        .env_remove("PEBBLO_CLASSIFIER_URL");

    cmd.assert()
        .success()
        .stdout(
            predicate::str::contains("hello from the cli")
                .and(predicate::str::contains("\"filename\": \"notes.txt\""))
                .and(predicate::str::contains("\"extension\": \".txt\"")),
        );
}

#[test]
fn load_fails_for_missing_input_file() {
    let config = create_offline_config();

    let mut cmd = Command::cargo_bin("pebblo-reader").expect("Binary exists");
    cmd.arg("load")
        .arg("--config")
        .arg(config.path())
        .arg("/no/such/input.txt")
        .env_remove("PEBBLO_CLASSIFIER_URL");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load"));
}

#[test]
fn load_fails_for_missing_config() {
    let mut cmd = Command::cargo_bin("pebblo-reader").expect("Binary exists");
    cmd.arg("load")
        .arg("--config")
        .arg("/no/such/config.yaml")
        .arg("whatever.txt");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read config file"));
}

use std::sync::{Arc, Mutex};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{layer::Context, Layer, Registry};

/// Custom Layer to collect emitted event messages.
struct EventCollector {
    events: Arc<Mutex<Vec<String>>>,
}

impl<S> Layer<S> for EventCollector
where
    S: tracing::Subscriber,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let mut msg = String::new();
        use std::fmt::Write as FmtWrite;
        let _ = write!(&mut msg, "{:?}", event);
        self.events.lock().unwrap().push(msg);
    }
}

#[tokio::test]
async fn run_emits_config_error_event() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let collector = EventCollector {
        events: events.clone(),
    };
    let subscriber = Registry::default().with(collector);
    let _guard = tracing::subscriber::set_default(subscriber);

    use pebblo_reader::cli::{run, Cli, Commands};

    let cli = Cli {
        command: Commands::Load {
            config: std::path::PathBuf::from("dummy.yaml"),
            path: std::path::PathBuf::from("dummy.txt"),
        },
    };

    let result = run(cli).await;
    assert!(result.is_err());

    let event_msgs = events.lock().unwrap();
    assert!(
        event_msgs
            .iter()
            .any(|msg| msg.contains("Failed to read config file")),
        "Expected a config read failure event, got: {:?}",
        event_msgs
    );
}
