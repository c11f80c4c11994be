// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! End-to-end runs of the `native-relocate` binary.
#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::fs::{self, File};
use std::path::Path;
use std::time::{Duration, UNIX_EPOCH};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const PROPERTIES: &str = "META-INF/native-image/org.jooq/jooq/native-image.properties";
const REFLECT: &str = "META-INF/native-image/org.jooq/jooq/reflect-config.json";
const CLASS: &str = "org/jooq/impl/DSL.class";

fn bin() -> Command {
    Command::cargo_bin("native-relocate").expect("binary")
}

fn write(root: &Path, name: &str, content: &[u8], modified_ms: u64) {
    let path = root.join(name);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, content).unwrap();
    File::options()
        .write(true)
        .open(&path)
        .unwrap()
        .set_modified(UNIX_EPOCH + Duration::from_millis(modified_ms))
        .unwrap();
}

fn modified_ms(path: &Path) -> u128 {
    fs::metadata(path)
        .unwrap()
        .modified()
        .unwrap()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_millis()
}

/// Exploded jar with one descriptor of each family and a class file.
fn exploded_jar() -> TempDir {
    let dir = tempfile::tempdir().expect("tempdir");
    write(
        dir.path(),
        PROPERTIES,
        b"Args = --initialize-at-build-time=org.jooq.impl.DSL,com.other.Keep \\\n       -H:ReflectionConfigurationResources=${.}/reflect-config.json\n",
        1_700_000_000_000,
    );
    write(
        dir.path(),
        REFLECT,
        br#"[{"name": "org.jooq.impl.SQLDataType", "allPublicMethods": true}]"#,
        1_700_000_500_000,
    );
    write(dir.path(), CLASS, &[0xCA, 0xFE, 0xBA, 0xBE], 1_600_000_000_000);
    dir
}

#[test]
fn relocates_descriptors_and_copies_everything_else() {
    let input = exploded_jar();
    let output = tempfile::tempdir().expect("tempdir");

    bin()
        .args(["relocate", "--input"])
        .arg(input.path())
        .arg("--output")
        .arg(output.path())
        .args(["--relocate", "org.jooq=shaded.org.jooq"])
        .assert()
        .success()
        .stdout(predicate::eq("transformed 2 resource(s), copied 1\n"));

    let properties = fs::read_to_string(output.path().join(PROPERTIES)).unwrap();
    assert!(properties.contains(
        "Args=--initialize-at-build-time\\=shaded.org.jooq.impl.DSL,com.other.Keep -H\\:ReflectionConfigurationResources\\=${.}/reflect-config.json"
    ));

    let reflect: serde_json::Value =
        serde_json::from_slice(&fs::read(output.path().join(REFLECT)).unwrap()).unwrap();
    assert_eq!(
        reflect,
        serde_json::json!([{"name": "shaded.org.jooq.impl.SQLDataType", "allPublicMethods": true}])
    );

    assert_eq!(
        fs::read(output.path().join(CLASS)).unwrap(),
        vec![0xCA, 0xFE, 0xBA, 0xBE]
    );
    assert_eq!(modified_ms(&output.path().join(CLASS)), 1_600_000_000_000);
}

#[test]
fn emitted_descriptors_carry_the_latest_changed_timestamp() {
    let input = exploded_jar();
    let output = tempfile::tempdir().expect("tempdir");

    bin()
        .args(["relocate", "--input"])
        .arg(input.path())
        .arg("--output")
        .arg(output.path())
        .args(["--relocate", "org.jooq=shaded.org.jooq"])
        .assert()
        .success();

    assert_eq!(modified_ms(&output.path().join(PROPERTIES)), 1_700_000_000_000);
    assert_eq!(modified_ms(&output.path().join(REFLECT)), 1_700_000_500_000);
}

#[test]
fn refuses_to_run_without_rules() {
    let input = exploded_jar();
    let output = tempfile::tempdir().expect("tempdir");

    bin()
        .args(["relocate", "--input"])
        .arg(input.path())
        .arg("--output")
        .arg(output.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("no relocation rules given"));
}

#[test]
fn rejects_malformed_inline_relocation() {
    bin()
        .args(["relocate", "--input", ".", "--output", "out", "--relocate", "org.jooq"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("expected <pattern>=<shaded-pattern>"));
}

#[test]
fn malformed_descriptor_fails_the_run() {
    let input = exploded_jar();
    write(input.path(), REFLECT, b"[{\"name\": ", 1);
    let output = tempfile::tempdir().expect("tempdir");

    bin()
        .args(["relocate", "--input"])
        .arg(input.path())
        .arg("--output")
        .arg(output.path())
        .args(["--relocate", "org.jooq=shaded.org.jooq"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("malformed JSON in").and(predicate::str::contains(REFLECT)));
}

#[test]
fn check_reports_the_handling_transformer() {
    bin()
        .args(["check", PROPERTIES, REFLECT, CLASS])
        .assert()
        .success()
        .stdout(format!(
            "{PROPERTIES}\tnative-image-properties\n{REFLECT}\tnative-image-json\n{CLASS}\t-\n"
        ));
}

#[test]
fn saved_profiles_drive_a_run() {
    let config = tempfile::tempdir().expect("tempdir");
    bin()
        .args(["profile", "save", "jooq", "--relocate", "org.jooq=shaded.org.jooq"])
        .arg("--config-dir")
        .arg(config.path())
        .assert()
        .success();

    bin()
        .args(["profile", "show", "jooq", "--config-dir"])
        .arg(config.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("\"shaded_pattern\": \"shaded.org.jooq\""));

    let input = exploded_jar();
    let output = tempfile::tempdir().expect("tempdir");
    bin()
        .args(["relocate", "--input"])
        .arg(input.path())
        .arg("--output")
        .arg(output.path())
        .args(["--profile", "jooq", "--config-dir"])
        .arg(config.path())
        .assert()
        .success();

    let properties = fs::read_to_string(output.path().join(PROPERTIES)).unwrap();
    assert!(properties.contains("shaded.org.jooq.impl.DSL"));
}

#[test]
fn missing_profile_is_reported() {
    let config = tempfile::tempdir().expect("tempdir");
    bin()
        .args(["profile", "show", "absent", "--config-dir"])
        .arg(config.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to load profile `absent`"));
}

#[test]
fn profile_files_are_accepted() {
    let input = exploded_jar();
    let output = tempfile::tempdir().expect("tempdir");
    let profile = input.path().join("relocations.json");
    fs::write(
        &profile,
        r#"{"relocations": [{"pattern": "org.jooq", "shaded_pattern": "x.org.jooq", "excludes": ["org.jooq.impl.DSL"]}]}"#,
    )
    .unwrap();

    bin()
        .args(["relocate", "--input"])
        .arg(input.path())
        .arg("--output")
        .arg(output.path())
        .arg("--config")
        .arg(&profile)
        .assert()
        .success()
        .stdout(predicate::eq("transformed 2 resource(s), copied 2\n"));

    let properties = fs::read_to_string(output.path().join(PROPERTIES)).unwrap();
    assert!(properties.contains("--initialize-at-build-time\\=org.jooq.impl.DSL,com.other.Keep"));
    let reflect = fs::read_to_string(output.path().join(REFLECT)).unwrap();
    assert!(reflect.contains("x.org.jooq.impl.SQLDataType"));
}

#[cfg(unix)]
#[test]
fn symlinked_entries_are_copied_with_their_target_content() {
    let input = exploded_jar();
    let outside = tempfile::tempdir().expect("tempdir");
    let license = outside.path().join("LICENSE");
    fs::write(&license, "Apache License 2.0\n").unwrap();
    std::os::unix::fs::symlink(&license, input.path().join("META-INF").join("LICENSE.txt")).unwrap();
    let output = tempfile::tempdir().expect("tempdir");

    bin()
        .args(["relocate", "--input"])
        .arg(input.path())
        .arg("--output")
        .arg(output.path())
        .args(["--relocate", "org.jooq=shaded.org.jooq"])
        .assert()
        .success()
        .stdout(predicate::eq("transformed 2 resource(s), copied 2\n"));

    assert_eq!(
        fs::read_to_string(output.path().join("META-INF/LICENSE.txt")).unwrap(),
        "Apache License 2.0\n"
    );
}

#[test]
fn output_nested_inside_input_is_rejected() {
    let input = exploded_jar();
    let nested = input.path().join("relocated");

    bin()
        .args(["relocate", "--input"])
        .arg(input.path())
        .arg("--output")
        .arg(&nested)
        .args(["--relocate", "org.jooq=shaded.org.jooq"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("must not be inside input"));
    assert!(!nested.exists());

    bin()
        .args(["relocate", "--input"])
        .arg(input.path())
        .arg("--output")
        .arg(input.path())
        .args(["--relocate", "org.jooq=shaded.org.jooq"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("must not be inside input"));
}

#[test]
fn malformed_selector_in_profile_file_is_reported() {
    let input = exploded_jar();
    let output = tempfile::tempdir().expect("tempdir");
    let profile = output.path().join("relocations.json");
    fs::write(
        &profile,
        r#"{"relocations": [{"pattern": "org.jooq", "shaded_pattern": "x.org.jooq", "includes": ["org.jooq.[impl"]}]}"#,
    )
    .unwrap();

    bin()
        .args(["relocate", "--input"])
        .arg(input.path())
        .arg("--output")
        .arg(output.path().join("out"))
        .arg("--config")
        .arg(&profile)
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid selector `org.jooq.[impl`"));
}
