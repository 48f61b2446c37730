// tests/config_loading.rs

mod common;
use crate::common::config_file;

use std::time::Duration;

use pipewright::config::load_and_validate;
use pipewright::engine::Batch;
use pipewright::errors::PipewrightError;
use pipewright::types::TaskKind;

#[test]
fn toml_jobs_are_loaded_in_order_with_canonical_task_keys() {
    let file = config_file(
        r#"
[config]
max_parallel_jobs = 2

[[jobs]]
name = "backend"

[[jobs.stages]]
name = "Checkout"

[jobs.stages.tasks.setup_and_clone]
enabled = true
source_url = "https://github.com/example/app.git"
branches = ["main", "develop"]

[[jobs.stages]]
name = "Build"
ignore_failure = true

[jobs.stages.tasks.maven]
enabled = true
timeout = "10m"
goals = "package"

[jobs.stages.tasks.trivy]
enabled = false

[[jobs]]
name = "frontend"

[[jobs.stages]]
[jobs.stages.tasks.npm]
enabled = true
"#,
        "toml",
    );

    let cfg = load_and_validate(file.path()).unwrap();
    assert_eq!(cfg.config.max_parallel_jobs, Some(2));

    let Batch::Jobs(jobs) = &cfg.batch else {
        panic!("expected jobs, got {:?}", cfg.batch);
    };
    assert_eq!(jobs.len(), 2);
    assert_eq!(jobs[0].id.display_name(), "backend");
    assert_eq!(jobs[1].id.index, 1);

    let build = &jobs[0].stages[1];
    assert!(build.ignore_failure);
    let maven = build.task(TaskKind::Maven).unwrap();
    assert!(maven.enabled);
    assert_eq!(maven.timeout(), Some(Duration::from_secs(600)));
    assert_eq!(maven.settings().str("goals").unwrap(), Some("package"));
    assert!(!build.task(TaskKind::Trivy).unwrap().enabled);

    assert_eq!(jobs[1].stages[0].name, "Unnamed Stage");
}

#[test]
fn yaml_files_are_read_by_extension() {
    let file = config_file(
        r#"
stages:
  - name: Checkout
    tasks:
      setup_and_clone:
        enabled: true
        source_url: https://github.com/example/app.git
        private_repo: true
        username: bot
        token: secret
  - name: Notify
    ignore_failure: true
    tasks:
      send_notification:
        enabled: true
        recipients: [dev@example.com]
        email_config:
          smtp_server: smtp.example.com
          smtp_port: 587
          sender_email: ci@example.com
          sender_password: pw
"#,
        "yaml",
    );

    let cfg = load_and_validate(file.path()).unwrap();
    let Batch::Stages(stages) = &cfg.batch else {
        panic!("expected a flat stage list");
    };
    assert_eq!(stages.len(), 2);

    let clone = stages[0].task(TaskKind::SetupAndClone).unwrap();
    assert!(clone.settings().bool("private_repo").unwrap());

    let notify = stages[1].task(TaskKind::SendNotification).unwrap();
    let email = notify.settings().table("email_config").unwrap().unwrap();
    assert_eq!(email.scalar("smtp_port").unwrap().as_deref(), Some("587"));
    assert_eq!(
        notify.settings().string_list("recipients").unwrap(),
        Some(vec!["dev@example.com".to_string()])
    );
}

#[test]
fn unknown_task_kinds_are_dropped_not_fatal() {
    let file = config_file(
        r#"
[[stages]]
name = "Odd"

[stages.tasks.kubectl]
enabled = true

[stages.tasks.sh]
enabled = true
steps = ["true"]
"#,
        "toml",
    );

    let cfg = load_and_validate(file.path()).unwrap();
    let Batch::Stages(stages) = cfg.batch else {
        panic!("expected a flat stage list");
    };
    let kinds: Vec<_> = stages[0].tasks().map(|(k, _)| k).collect();
    assert_eq!(kinds, vec![TaskKind::Sh]);
}

#[test]
fn both_jobs_and_stages_is_a_config_error() {
    let file = config_file(
        r#"
[[jobs]]
name = "a"

[[stages]]
name = "b"
"#,
        "toml",
    );

    match load_and_validate(file.path()) {
        Err(PipewrightError::ConfigError(msg)) => assert!(msg.contains("not both"), "{msg}"),
        other => panic!("expected ConfigError, got {other:?}"),
    }
}

#[test]
fn empty_file_is_a_config_error() {
    let file = config_file("", "toml");
    match load_and_validate(file.path()) {
        Err(PipewrightError::ConfigError(msg)) => assert!(msg.contains("`jobs` or a `stages`")),
        other => panic!("expected ConfigError, got {other:?}"),
    }
}

#[test]
fn duplicate_job_names_are_rejected() {
    let file = config_file(
        r#"
[[jobs]]
name = "same"

[[jobs]]
name = "same"
"#,
        "toml",
    );

    let err = load_and_validate(file.path()).unwrap_err();
    assert!(err.to_string().contains("duplicate job name 'same'"), "{err}");
}

#[test]
fn explicit_names_may_not_shadow_generated_ones() {
    let file = config_file(
        r#"
[[jobs]]
name = "job-2"

[[jobs]]
[[jobs.stages]]
name = "Build"
"#,
        "toml",
    );

    let err = load_and_validate(file.path()).unwrap_err();
    assert!(err.to_string().contains("duplicate job name 'job-2'"), "{err}");
}

#[test]
fn unnamed_jobs_alongside_distinct_names_are_fine() {
    let file = config_file(
        r#"
[[jobs]]
name = "job-1"

[[jobs]]
name = "api"

[[jobs]]
[[jobs.stages]]
name = "Build"
"#,
        "toml",
    );

    let cfg = load_and_validate(file.path()).unwrap();
    let Batch::Jobs(jobs) = &cfg.batch else {
        panic!("expected jobs");
    };
    assert_eq!(jobs[2].id.display_name(), "job-3");
}

#[test]
fn zero_parallel_jobs_is_rejected() {
    let file = config_file(
        r#"
[config]
max_parallel_jobs = 0

[[stages]]
name = "s"
"#,
        "toml",
    );
    assert!(matches!(
        load_and_validate(file.path()),
        Err(PipewrightError::ConfigError(_))
    ));
}

#[test]
fn unparseable_timeouts_name_their_task() {
    let file = config_file(
        r#"
[[jobs]]
name = "api"

[[jobs.stages]]
name = "Build"

[jobs.stages.tasks.gradle]
enabled = true
timeout = "soon"
"#,
        "toml",
    );

    let err = load_and_validate(file.path()).unwrap_err().to_string();
    assert!(err.contains("job 'api', stage 'Build', task 'gradle'"), "{err}");
}

#[test]
fn syntax_errors_keep_their_format() {
    let toml = config_file("[[jobs]\nname = ", "toml");
    assert!(matches!(
        load_and_validate(toml.path()),
        Err(PipewrightError::TomlError(_))
    ));

    let yaml = config_file("stages: [unterminated", "yml");
    assert!(matches!(
        load_and_validate(yaml.path()),
        Err(PipewrightError::YamlError(_))
    ));
}

#[test]
fn missing_file_is_an_io_error() {
    assert!(matches!(
        load_and_validate("/definitely/not/here/Pipeline.toml"),
        Err(PipewrightError::IoError(_))
    ));
}
