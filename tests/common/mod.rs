// Shared helpers for integration tests

use docdex::core::config::Config;
use docdex::core::services::Services;
use docdex::core::types::{IngestAction, IngestDocument, IngestRequest};
use tempfile::TempDir;

/// Install a tracing subscriber so service logs show up under
/// `RUST_LOG=debug`; a no-op after the first call
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Services wired against temp directories; the TempDir must stay
/// alive for the duration of the test
pub fn create_test_services() -> (Services, TempDir) {
    init_tracing();

    let temp = TempDir::new().expect("temp dir");
    let mut config = Config::default();
    config.storage.index_dir = temp.path().join("index");
    config.storage.data_dir = temp.path().join("documents");

    let services = Services::new(config).expect("services");
    (services, temp)
}

pub fn upsert(path: &str, content: &str) -> IngestDocument {
    IngestDocument {
        path: path.to_string(),
        content: content.to_string(),
        action: IngestAction::Upsert,
        content_type: None,
    }
}

#[allow(dead_code)] // not every test binary uses the delete action
pub fn delete(path: &str) -> IngestDocument {
    IngestDocument {
        path: path.to_string(),
        content: String::new(),
        action: IngestAction::Delete,
        content_type: None,
    }
}

pub fn request(repo: &str, docs: Vec<IngestDocument>, sync: bool) -> IngestRequest {
    IngestRequest {
        repo: repo.to_string(),
        commit_sha: "0123abcd".to_string(),
        documents: docs,
        sync,
    }
}
