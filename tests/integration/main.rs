//! Integration tests for newsw

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    /// Isolated config file and state directory
    struct Sandbox {
        dir: TempDir,
    }

    impl Sandbox {
        fn new() -> Self {
            Self {
                dir: TempDir::new().unwrap(),
            }
        }

        /// Sandbox whose worker origin refuses connections
        fn offline() -> Self {
            let sandbox = Self::new();
            sandbox.write_config(
                r#"
[worker]
origin = "http://127.0.0.1:9/"
static_assets = ["./", "./style.css"]

[feed]
url = "http://127.0.0.1:9/feed.json"
"#,
            );
            sandbox
        }

        fn config_path(&self) -> PathBuf {
            self.dir.path().join("config.toml")
        }

        fn state_dir(&self) -> PathBuf {
            self.dir.path().join("state")
        }

        fn write_config(&self, content: &str) {
            fs::write(self.config_path(), content).unwrap();
        }

        fn newsw(&self) -> Command {
            let mut cmd = cargo_bin_cmd!("newsw");
            cmd.env("NEWSW_PLAIN", "1")
                .arg("--no-local")
                .arg("--config")
                .arg(self.config_path())
                .arg("--state-dir")
                .arg(self.state_dir());
            cmd
        }

        fn create_store(&self, name: &str) {
            fs::create_dir_all(self.state_dir().join("caches").join(name)).unwrap();
        }

        fn has_store(&self, name: &str) -> bool {
            self.state_dir().join("caches").join(name).is_dir()
        }
    }

    fn registration(state_dir: &Path) -> PathBuf {
        state_dir.join("registration.json")
    }

    #[test]
    fn help_displays() {
        cargo_bin_cmd!("newsw")
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("offline-capable news client"));
    }

    #[test]
    fn version_displays() {
        cargo_bin_cmd!("newsw")
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("newsw"));
    }

    #[test]
    fn config_path_honors_flag() {
        let sandbox = Sandbox::new();
        sandbox
            .newsw()
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_show_defaults() {
        let sandbox = Sandbox::new();
        sandbox
            .newsw()
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[worker]"))
            .stdout(predicate::str::contains("news-v1"));
    }

    #[test]
    fn config_set_then_show() {
        let sandbox = Sandbox::new();
        sandbox
            .newsw()
            .args(["config", "set", "worker.cache_name", "news-v2"])
            .assert()
            .success();

        sandbox
            .newsw()
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("news-v2"));
    }

    #[test]
    fn config_set_unknown_key() {
        let sandbox = Sandbox::new();
        sandbox
            .newsw()
            .args(["config", "set", "worker.nope", "x"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Unknown config key"));
    }

    #[test]
    fn config_set_rejects_bad_cache_name() {
        let sandbox = Sandbox::new();
        sandbox
            .newsw()
            .args(["config", "set", "worker.cache_name", "../escape"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid cache name"));
    }

    #[test]
    fn status_not_registered() {
        let sandbox = Sandbox::new();
        sandbox
            .newsw()
            .arg("status")
            .assert()
            .success()
            .stdout(predicate::str::contains("Not registered"));
    }

    #[test]
    fn status_json() {
        let sandbox = Sandbox::new();
        sandbox.create_store("news-v1");

        let output = sandbox
            .newsw()
            .args(["status", "--format", "json"])
            .output()
            .unwrap();
        assert!(output.status.success());

        let status: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert!(status["worker"].is_null());
        assert_eq!(status["caches"][0]["name"], "news-v1");
        assert_eq!(status["caches"][0]["entries"], 0);
    }

    #[test]
    fn cache_list_empty() {
        let sandbox = Sandbox::new();
        sandbox
            .newsw()
            .args(["cache", "list"])
            .assert()
            .success()
            .stdout(predicate::str::contains("No cache stores found"));
    }

    #[test]
    fn cache_list_plain() {
        let sandbox = Sandbox::new();
        sandbox.create_store("news-v0");
        sandbox.create_store("news-v1");

        sandbox
            .newsw()
            .args(["cache", "list", "--format", "plain"])
            .assert()
            .success()
            .stdout("news-v0\nnews-v1\n");
    }

    #[test]
    fn cache_show_missing_store() {
        let sandbox = Sandbox::new();
        sandbox
            .newsw()
            .args(["cache", "show", "news-v9"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Cache store not found"));
    }

    #[test]
    fn cache_purge_keeps_current() {
        let sandbox = Sandbox::new();
        sandbox.create_store("news-v0");
        sandbox.create_store("news-v1");

        sandbox
            .newsw()
            .args(["cache", "purge"])
            .assert()
            .success()
            .stdout(predicate::str::contains("removed 1 store(s)"));

        assert!(!sandbox.has_store("news-v0"));
        assert!(sandbox.has_store("news-v1"));
    }

    #[test]
    fn cache_clear_with_yes() {
        let sandbox = Sandbox::new();
        sandbox.create_store("news-v0");
        sandbox.create_store("news-v1");

        sandbox
            .newsw()
            .args(["cache", "clear", "--yes"])
            .assert()
            .success()
            .stdout(predicate::str::contains("cleared 2 store(s)"));

        assert!(!sandbox.has_store("news-v0"));
        assert!(!sandbox.has_store("news-v1"));
    }

    #[test]
    fn cache_clear_without_confirmation_aborts() {
        let sandbox = Sandbox::new();
        sandbox.create_store("news-v1");

        sandbox
            .newsw()
            .args(["cache", "clear"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Aborted"));

        assert!(sandbox.has_store("news-v1"));
    }

    #[test]
    fn unregister_when_not_registered() {
        let sandbox = Sandbox::new();
        sandbox
            .newsw()
            .arg("unregister")
            .assert()
            .success()
            .stdout(predicate::str::contains("No worker was registered"));
    }

    #[test]
    fn register_offline_fails_atomically() {
        let sandbox = Sandbox::offline();
        sandbox
            .newsw()
            .arg("register")
            .assert()
            .failure()
            .stderr(predicate::str::contains("install failed"))
            .stderr(predicate::str::contains("Hint:"));

        assert!(!registration(&sandbox.state_dir()).exists());
        let store = sandbox.state_dir().join("caches").join("news-v1");
        assert_eq!(fs::read_dir(store).unwrap().count(), 0);
    }

    #[test]
    fn fetch_offline_without_worker() {
        let sandbox = Sandbox::offline();
        sandbox
            .newsw()
            .args(["fetch", "./style.css"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Network error"));
    }

    #[test]
    fn articles_offline_reports_error() {
        let sandbox = Sandbox::offline();
        sandbox
            .newsw()
            .args(["articles", "--format", "json"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Error:"));

        assert!(!registration(&sandbox.state_dir()).exists());
    }

    #[test]
    fn journal_records_failed_install() {
        let sandbox = Sandbox::offline();
        sandbox.newsw().arg("register").assert().failure();

        let journal = fs::read_to_string(sandbox.state_dir().join("journal.log")).unwrap();
        assert!(journal.contains("worker.install_failed"));
    }
}
