use predicates::prelude::*;

mod fixtures;
use fixtures::TestProject;

/// The tree shows the project at the root with transitive dependencies
/// nested under their parents.
#[test]
fn test_tree_renders_nested_dependencies() {
    let project = TestProject::new();
    project.write_config(
        r#"
[project]
name = "my_app"

[deps]
b = { path = "../b" }
"#,
    );
    project.write_dep_config(
        "b",
        r#"
[project]
name = "b"

[deps]
cowboy = "~> 2.0"
"#,
    );

    project
        .command()
        .arg("tree")
        .assert()
        .success()
        .stdout(predicate::str::contains("my_app"))
        .stdout(predicate::str::contains("└── b any (path)"))
        .stdout(predicate::str::contains("    └── cowboy ^2.0 (registry)"));
}

/// A diamond dependency renders in full once; later occurrences are marked.
#[test]
fn test_tree_marks_duplicates() {
    let project = TestProject::new();
    project.write_config(
        r#"
[project]
name = "my_app"

[deps]
b = { path = "../b" }
c = { path = "../c" }
"#,
    );
    project.write_dep_config(
        "b",
        r#"
[project]
name = "b"

[deps]
shared = "^1.0"
"#,
    );
    project.write_dep_config(
        "c",
        r#"
[project]
name = "c"

[deps]
shared = "^1.0"
"#,
    );

    project
        .command()
        .arg("tree")
        .assert()
        .success()
        .stdout(predicate::str::contains("shared ^1.0 (registry) (*)"))
        .stdout(predicate::str::contains("(*) = already shown above"));
}

/// --depth limits how far the tree recurses.
#[test]
fn test_tree_depth_limit() {
    let project = TestProject::new();
    project.write_config(
        r#"
[project]
name = "my_app"

[deps]
b = { path = "../b" }
"#,
    );
    project.write_dep_config(
        "b",
        r#"
[project]
name = "b"

[deps]
cowboy = "~> 2.0"
"#,
    );

    project
        .command()
        .args(["tree", "--depth", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("b any (path)"))
        .stdout(predicate::str::contains("cowboy").not());
}
