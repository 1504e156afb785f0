use predicates::prelude::*;

mod fixtures;
use fixtures::TestProject;

/// A fetched, locked, freshly built dependency lists as ok with its pin.
#[test]
fn test_list_ok_dependency() {
    let project = TestProject::new();
    project.write_config(
        r#"
[project]
name = "my_app"

[deps]
plug = "^1.14"
"#,
    );
    project.write_lockfile(
        r#"
version = 1

[deps.plug]
scm = "registry"
version = "1.14.2"
checksum = "sha256:9d2f31"
"#,
    );
    project.fetch("plug");
    project.write_manifest("plug", "registry", true, None);

    project
        .command()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("* plug ^1.14 (package)"))
        .stdout(predicate::str::contains("locked at 1.14.2 (sha256:9d2f31)"))
        .stdout(predicate::str::contains("ok"));
}

/// An unfetched dependency is unavailable, a fetched-but-unlocked one
/// reports nolock.
#[test]
fn test_list_unfetched_and_unlocked() {
    let project = TestProject::new();
    project.write_config(
        r#"
[project]
name = "my_app"

[deps]
missing = "^1.0"
unlocked = "^2.0"
"#,
    );
    project.fetch("unlocked");

    project
        .command()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("not available, fetch it first"))
        .stdout(predicate::str::contains("not locked, fetch it to record a pin"));
}

/// Conflicting requirements between the root and a transitive declaration
/// surface as a divergence status, not a crash.
#[test]
fn test_list_diverged_requirement() {
    let project = TestProject::new();
    project.write_config(
        r#"
[project]
name = "my_app"

[deps]
a = "~> 1.0"
b = { path = "../b" }
"#,
    );
    project.write_dep_config(
        "b",
        r#"
[project]
name = "b"

[deps]
a = "~> 2.0"
"#,
    );

    project
        .command()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("conflicting requirement"))
        .stdout(predicate::str::contains("deps/b/converge.toml"));
}

/// An override resolves the conflict; the losing declaration is reported
/// in its own section.
#[test]
fn test_list_override_wins() {
    let project = TestProject::new();
    project.write_config(
        r#"
[project]
name = "my_app"

[deps]
a = ">= 1.0"
b = { path = "../b" }
"#,
    );
    project.write_dep_config(
        "b",
        r#"
[project]
name = "b"

[deps]
a = { req = ">= 1.0", override = true }
"#,
    );

    project
        .command()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("Overridden declarations:"))
        .stdout(predicate::str::contains("overridden by the declaration in"));
}

/// Two declarations both claiming override abort with a pointed message
/// naming both sites.
#[test]
fn test_list_ambiguous_override_is_fatal() {
    let project = TestProject::new();
    project.write_config(
        r#"
[project]
name = "my_app"

[deps]
a = { req = ">= 1.0", override = true }
b = { path = "../b" }
"#,
    );
    project.write_dep_config(
        "b",
        r#"
[project]
name = "b"

[deps]
a = { req = ">= 2.0", override = true }
"#,
    );

    project
        .command()
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("conflicting overrides"))
        .stderr(predicate::str::contains("deps/b/converge.toml"));
}

/// Environment-restricted dependencies are hidden by default and shown
/// with --all.
#[test]
fn test_list_all_disables_filtering() {
    let project = TestProject::new();
    project.write_config(
        r#"
[project]
name = "my_app"

[deps]
plug = "^1.14"
exunit_helpers = { req = "^0.3", only = "test" }
"#,
    );

    project
        .command()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("plug"))
        .stdout(predicate::str::contains("exunit_helpers").not());

    project
        .command()
        .args(["list", "--all"])
        .assert()
        .success()
        .stdout(predicate::str::contains("exunit_helpers"));
}

/// Requesting a name absent from the converged set exits non-zero and
/// suggests the closest known name.
#[test]
fn test_list_unknown_name_fails() {
    let project = TestProject::new();
    project.write_config(
        r#"
[project]
name = "my_app"

[deps]
plug = "^1.14"
"#,
    );

    project
        .command()
        .args(["list", "pluf"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown dependency 'pluf'"))
        .stderr(predicate::str::contains("Did you mean 'plug'?"));
}

/// Selecting by name prints only the requested dependencies.
#[test]
fn test_list_selects_by_name() {
    let project = TestProject::new();
    project.write_config(
        r#"
[project]
name = "my_app"

[deps]
plug = "^1.14"
cowboy = "~> 2.0"
"#,
    );

    project
        .command()
        .args(["list", "cowboy"])
        .assert()
        .success()
        .stdout(predicate::str::contains("cowboy"))
        .stdout(predicate::str::contains("plug").not());
}

/// JSON output carries the converged records as structured data.
#[test]
fn test_list_json_format() {
    let project = TestProject::new();
    project.write_config(
        r#"
[project]
name = "my_app"

[deps]
plug = "^1.14"
"#,
    );

    project
        .command()
        .args(["list", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"deps\""))
        .stdout(predicate::str::contains("\"app\": \"plug\""))
        .stdout(predicate::str::contains("\"scm\": \"registry\""))
        .stdout(predicate::str::contains("\"top_level\": true"));
}

/// A manifest recording a different toolchain reports vsnlock; one
/// recording a different SCM reports scmlock.
#[test]
fn test_list_manifest_drift_statuses() {
    let project = TestProject::new();
    project.write_config(
        r#"
[project]
name = "my_app"

[deps]
stale_toolchain = "^1.0"
moved_scm = "^1.0"
"#,
    );
    project.write_lockfile(
        r#"
version = 1

[deps.stale_toolchain]
scm = "registry"
version = "1.2.0"

[deps.moved_scm]
scm = "registry"
version = "1.3.0"
"#,
    );
    project.write_manifest("stale_toolchain", "registry", true, Some("1.12.0"));
    project.write_manifest("moved_scm", "git", true, None);

    project
        .command()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("built with toolchain 1.12.0"))
        .stdout(predicate::str::contains("fetched with git"));
}

/// A lock entry no longer satisfying the declaration reports lockoutdated.
#[test]
fn test_list_outdated_lock() {
    let project = TestProject::new();
    project.write_config(
        r#"
[project]
name = "my_app"

[deps]
cowboy = "^2.0"
"#,
    );
    project.write_lockfile(
        r#"
version = 1

[deps.cowboy]
scm = "registry"
version = "1.9.0"
"#,
    );
    project.fetch("cowboy");

    project
        .command()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("no longer satisfies the declaration"));
}

/// Without a project configuration the command fails with a load error.
#[test]
fn test_list_without_project() {
    let project = TestProject::new();

    project
        .command()
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load project configuration"));
}

/// A dependency checkout with broken configuration aborts the whole walk.
#[test]
fn test_list_broken_dep_config_is_fatal() {
    let project = TestProject::new();
    project.write_config(
        r#"
[project]
name = "my_app"

[deps]
b = { path = "../b" }
"#,
    );
    let checkout = project.fetch("b");
    std::fs::write(checkout.join("converge.toml"), "[project\n").unwrap();

    project
        .command()
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load project configuration"))
        .stderr(predicate::str::contains("deps/b/converge.toml"));
}
