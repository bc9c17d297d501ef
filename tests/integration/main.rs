//! Integration tests for texsync

mod fake_server;

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::path::Path;
    use tempfile::TempDir;

    /// Isolated home, config and state dirs for one test
    struct Env {
        home: TempDir,
        project: TempDir,
    }

    impl Env {
        fn new() -> Self {
            let env = Self {
                home: TempDir::new().unwrap(),
                project: TempDir::new().unwrap(),
            };
            std::fs::write(
                env.project.path().join("main.tex"),
                "\\documentclass{article}\\begin{document}Hi\\end{document}\n",
            )
            .unwrap();
            env
        }

        fn config_path(&self) -> std::path::PathBuf {
            self.home.path().join("config.toml")
        }

        fn write_config(&self, content: &str) {
            std::fs::write(self.config_path(), content).unwrap();
        }

        fn texsync(&self) -> Command {
            let mut cmd = cargo_bin_cmd!("texsync");
            cmd.current_dir(self.project.path())
                .env("HOME", self.home.path())
                .env("XDG_CONFIG_HOME", self.home.path().join("config"))
                .env("XDG_STATE_HOME", self.home.path().join("state"))
                .env_remove("TEXSYNC_TOKEN")
                .env_remove("TEXSYNC_CONFIG")
                .env_remove("RUST_LOG")
                .arg("--config")
                .arg(self.config_path());
            cmd
        }

        fn project_dir(&self) -> &Path {
            self.project.path()
        }
    }

    #[test]
    fn help_displays() {
        Env::new()
            .texsync()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("incremental LaTeX builds"));
    }

    #[test]
    fn version_displays() {
        Env::new()
            .texsync()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("texsync"));
    }

    #[test]
    fn config_path() {
        let env = Env::new();
        env.texsync()
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_show_defaults() {
        Env::new()
            .texsync()
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[build]").and(predicate::str::contains("main.tex")));
    }

    #[test]
    fn config_show_masks_token() {
        let env = Env::new();
        env.write_config("[server]\nurl = \"http://127.0.0.1:9\"\ntoken = \"s3cret\"\n");
        env.texsync()
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("********").and(predicate::str::contains("s3cret").not()));
    }

    #[test]
    fn local_config_overrides_global() {
        let env = Env::new();
        env.write_config("[build]\nmain_file = \"global.tex\"\n");
        std::fs::write(
            env.project_dir().join(".texsync.toml"),
            "[build]\nmain_file = \"thesis.tex\"\n",
        )
        .unwrap();

        env.texsync()
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("thesis.tex"));

        env.texsync()
            .args(["--no-local", "config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("global.tex"));
    }

    #[test]
    fn init_writes_local_config() {
        let env = Env::new();
        env.texsync().arg("init").assert().success();
        assert!(env.project_dir().join(".texsync.toml").exists());

        env.texsync()
            .arg("init")
            .assert()
            .failure()
            .stderr(predicate::str::contains("already exists"));
    }

    #[test]
    fn cache_show_empty_project() {
        Env::new()
            .texsync()
            .args(["cache", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("No cached files"));
    }

    #[test]
    fn history_empty() {
        Env::new()
            .texsync()
            .arg("history")
            .assert()
            .success()
            .stdout(predicate::str::contains("No builds recorded yet"));
    }

    #[test]
    fn synctex_without_build_fails_with_hint() {
        let env = Env::new();
        env.write_config("[server]\nurl = \"http://127.0.0.1:9\"\n");
        env.texsync()
            .args(["synctex", "view", "--file", "main.tex", "--line", "1"])
            .assert()
            .failure()
            .stderr(
                predicate::str::contains("No successful build")
                    .and(predicate::str::contains("texsync build")),
            );
    }

    #[test]
    fn build_without_server_fails_with_hint() {
        Env::new()
            .texsync()
            .arg("build")
            .assert()
            .failure()
            .stderr(
                predicate::str::contains("No compile server configured")
                    .and(predicate::str::contains("server.url")),
            );
    }

    #[test]
    fn unreachable_server_fails_to_start() {
        let env = Env::new();
        env.write_config("[server]\nurl = \"http://127.0.0.1:9\"\ntimeout_secs = 2\n");
        env.texsync()
            .args(["build", "--no-wait"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Failed to start build"));
    }

    #[test]
    fn completions_generate() {
        Env::new()
            .texsync()
            .args(["completions", "bash"])
            .assert()
            .success()
            .stdout(predicate::str::contains("texsync"));
    }

    mod against_fake_server {
        use super::*;
        use crate::fake_server::FakeServer;

        fn configured(server: &FakeServer) -> Env {
            let env = Env::new();
            std::fs::write(env.project_dir().join("refs.bib"), "@book{knuth}\n").unwrap();
            env.write_config(&format!(
                "[server]\nurl = \"{}\"\n\n[status]\nbase_delay_ms = 10\ndelay_increment_ms = 10\nmax_attempts = 2\n",
                server.url
            ));
            env
        }

        #[test]
        fn build_uploads_and_follows_status() {
            let server = FakeServer::start();
            let env = configured(&server);

            env.texsync()
                .arg("build")
                .assert()
                .success()
                .stdout(predicate::str::contains("Build b1 succeeded"));

            let uploads = server.uploads();
            assert_eq!(uploads.len(), 1);
            assert!(uploads[0].contains("name=\"manifest\""));
            assert!(uploads[0].contains("filename=\"main.tex\""));
            assert!(uploads[0].contains("filename=\"refs.bib\""));

            env.texsync()
                .args(["cache", "show"])
                .assert()
                .success()
                .stdout(
                    predicate::str::contains("main.tex")
                        .and(predicate::str::contains("refs.bib"))
                        .and(predicate::str::contains("1 successful builds")),
                );

            env.texsync()
                .arg("history")
                .assert()
                .success()
                .stdout(predicate::str::contains("b1").and(predicate::str::contains("success")));
        }

        #[test]
        fn synctex_queries_last_successful_build() {
            let server = FakeServer::start();
            let env = configured(&server);

            env.texsync().arg("build").assert().success();

            env.texsync()
                .args(["synctex", "view", "--file", "main.tex", "--line", "3"])
                .assert()
                .success()
                .stdout(predicate::str::contains("Page: 2"));

            env.texsync()
                .args(["synctex", "edit", "--page", "9", "-x", "1", "-y", "1"])
                .assert()
                .success()
                .stdout(predicate::str::contains("No mapping"));

            assert!(server
                .requests()
                .iter()
                .any(|r| r == "GET /builds/b1/synctex/view"));
        }

        #[test]
        fn legacy_build_skips_upload() {
            let server = FakeServer::start();
            let env = configured(&server);

            env.texsync()
                .args(["build", "--legacy"])
                .assert()
                .success()
                .stdout(predicate::str::contains("succeeded"));

            assert!(server.uploads().is_empty());
            assert!(server
                .requests()
                .iter()
                .any(|r| r.starts_with("POST /projects/") && r.ends_with("/builds")));
        }
    }
}
