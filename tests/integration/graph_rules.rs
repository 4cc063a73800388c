//! Built-in graph validators against scratch projects.

use drift_cli::registry::ValidatorRegistry;
use drift_cli::rules::ValidationRule;
use drift_cli::test_utils::fixtures::RESOURCE_DIRS;
use drift_cli::test_utils::{TestProject, init_test_logging};

fn rule(rule_type: &str) -> ValidationRule {
    let dirs: Vec<String> = RESOURCE_DIRS.iter().map(|d| (*d).to_string()).collect();
    ValidationRule::new(rule_type, rule_type).with_param("resource_dirs", dirs)
}

#[test]
fn test_two_skill_cycle_end_to_end() {
    init_test_logging(None);
    let project = TestProject::new().unwrap();
    project.add_skill("skill-a", &["skill-b"]).unwrap();
    project.add_skill("skill-b", &["skill-a"]).unwrap();
    let (bundle, all) = project.bundle("skill-a").unwrap();

    let registry = ValidatorRegistry::new();
    let failure = registry
        .execute_rule(&rule("core:circular_dependencies"), &bundle, Some(&all))
        .unwrap()
        .expect("cycle should be reported");

    assert_eq!(failure.failure_details["circular_path"], "skill-a → skill-b → skill-a");
    assert_eq!(failure.failure_details["cycle_count"], 1);
    assert_eq!(failure.bundle_id, "skill-a");
    assert!(failure.file_paths[0].ends_with("skill-a.md"));
}

#[test]
fn test_cycle_across_resource_types() {
    let project = TestProject::new().unwrap();
    project.add_command("deploy", &["release"]).unwrap();
    project.add_skill_dir("release", &["deploy"]).unwrap();
    let (bundle, all) = project.bundle("deploy").unwrap();

    let registry = ValidatorRegistry::new();
    let failure = registry
        .execute_rule(&rule("core:circular_dependencies"), &bundle, Some(&all))
        .unwrap()
        .unwrap();
    assert_eq!(failure.failure_details["circular_path"], "deploy → release → deploy");
}

#[test]
fn test_unsaved_bundle_content_overrides_disk() {
    let project = TestProject::new().unwrap();
    project.add_skill("a", &["b"]).unwrap();
    project.add_skill("b", &[]).unwrap();
    let (mut bundle, all) = project.bundle("b").unwrap();

    bundle.files[0].content = "---\nname: b\nskills:\n  - a\n---\n".to_string();
    let all: Vec<_> = all.into_iter().filter(|b| b.bundle_id != "b").collect();

    let registry = ValidatorRegistry::new();
    let failure = registry
        .execute_rule(&rule("core:circular_dependencies"), &bundle, Some(&all))
        .unwrap()
        .unwrap();
    assert_eq!(failure.failure_details["circular_path"], "b → a → b");
}

#[test]
fn test_redundant_dependency_end_to_end() {
    let project = TestProject::new().unwrap();
    project.add_agent("reviewer", &["lint", "style"]).unwrap();
    project.add_skill("lint", &["style"]).unwrap();
    project.add_skill("style", &[]).unwrap();
    let (bundle, all) = project.bundle("reviewer").unwrap();

    let registry = ValidatorRegistry::new();
    let failure = registry
        .execute_rule(&rule("core:dependency_duplicate"), &bundle, Some(&all))
        .unwrap()
        .unwrap();
    assert_eq!(failure.failure_details["duplicate_resource"], "style");
    assert_eq!(failure.failure_details["declared_by"], "lint");

    project.add_agent("reviewer", &["lint"]).unwrap();
    let (bundle, all) = project.bundle("reviewer").unwrap();
    assert!(
        registry
            .execute_rule(&rule("core:dependency_duplicate"), &bundle, Some(&all))
            .unwrap()
            .is_none()
    );
}

#[test]
fn test_depth_with_dangling_leaf() {
    let project = TestProject::new().unwrap();
    project.add_skill("a", &["b"]).unwrap();
    project.add_skill("b", &["c"]).unwrap();
    project.add_skill("c", &["not-installed"]).unwrap();
    let (bundle, all) = project.bundle("a").unwrap();

    let registry = ValidatorRegistry::new();
    let failure = registry
        .execute_rule(&rule("core:max_dependency_depth").with_param("max_depth", 2), &bundle, Some(&all))
        .unwrap()
        .unwrap();
    assert_eq!(failure.failure_details["actual_depth"], 3);
    assert_eq!(failure.failure_details["dependency_chain"], "a → b → c → not-installed");
}

#[test]
fn test_graph_rules_skip_without_project_bundles() {
    let project = TestProject::new().unwrap();
    project.add_skill("a", &["a"]).unwrap();
    let (bundle, _) = project.bundle("a").unwrap();

    let registry = ValidatorRegistry::new();
    for rule_type in ["core:circular_dependencies", "core:dependency_duplicate", "core:max_dependency_depth"] {
        assert!(registry.execute_rule(&rule(rule_type), &bundle, None).unwrap().is_none());
    }
}

#[test]
fn test_missing_resource_dirs_is_a_configuration_error() {
    let project = TestProject::new().unwrap();
    project.add_skill("a", &[]).unwrap();
    let (bundle, all) = project.bundle("a").unwrap();

    let registry = ValidatorRegistry::new();
    let err = registry
        .execute_rule(&ValidationRule::new("core:max_dependency_depth", "depth"), &bundle, Some(&all))
        .unwrap_err();
    assert!(err.to_string().contains("resource_dirs"));
}
