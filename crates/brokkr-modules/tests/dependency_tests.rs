//! Dependency resolution integration tests
//!
//! Tests dependency handling including:
//! - Presence, activity and version checks
//! - Transitive failures and their causes
//! - Circular dependency detection
//! - Memoization of satisfied closures

mod common;

use brokkr_modules::{ModuleRef, ResolutionContext, ResolutionError};
use common::*;
use test_case::test_case;

fn module_ref(module: &ModuleBuilder) -> ModuleRef {
    ModuleRef::new(module.id(), module.name())
}

fn check(env: &TestEnv, module: &ModuleBuilder) -> (ResolutionContext, Result<(), ResolutionError>) {
    let pipeline = env.pipeline();
    let mut ctx = ResolutionContext::new();
    let result = pipeline
        .dependency_resolver()
        .dependencies_met(&mut ctx, &module_ref(module));
    (ctx, result)
}

#[test]
fn test_module_without_dependencies() {
    let core = ModuleBuilder::new("Core");
    let env = TestEnv::with_modules(std::slice::from_ref(&core));

    let (ctx, result) = check(&env, &core);

    assert!(result.is_ok());
    assert!(ctx.is_closure_validated("Core"));
    // Only dependencies are validated here, not the module itself
    assert!(!ctx.is_artifact_validated("Core"));
}

#[test]
fn test_satisfied_dependency_is_validated() {
    let core = ModuleBuilder::new("Core");
    let reports = ModuleBuilder::new("Reports").depends_on("Core", "^1.0.0");
    let env = TestEnv::with_modules(&[core.clone(), reports.clone()]);

    let (ctx, result) = check(&env, &reports);

    assert!(result.is_ok());
    assert!(ctx.is_artifact_validated("Core"));
    assert_eq!(ctx.contributions(core.id()), vec![entry_point_of("Core").as_str()]);
    assert!(ctx.contributions(reports.id()).is_empty());
}

#[test_case("1.0.0 - 2.0.0", "2.0.0", true ; "hyphen range")]
#[test_case(">=1.0.0 & <2.0.0", "2.0.0", false ; "ampersand conjunction")]
#[test_case(">=1.0.0 && <3.0.0", "2.0.0", true ; "double ampersand conjunction")]
#[test_case("!=2.0.0", "2.0.0", false ; "exclusion")]
#[test_case("^1.0.0 | ^2.0.0", "2.0.0", true ; "single bar disjunction")]
#[test_case("2.0.0-linux", "2.9.0", false ; "bare pre-release stays exact")]
#[test_case("1.0.0-x.1", "1.0.0-x.1", true ; "pre-release pin")]
fn test_range_forms_gate_dependency(range: &str, installed: &str, satisfied: bool) {
    let core = ModuleBuilder::new("Core").with_version(installed);
    let reports = ModuleBuilder::new("Reports").depends_on("Core", range);
    let env = TestEnv::with_modules(&[core, reports.clone()]);

    let (_, result) = check(&env, &reports);

    if satisfied {
        assert!(result.is_ok(), "{:?}", result);
    } else {
        assert!(
            matches!(result, Err(ResolutionError::VersionConstraintUnsatisfied { .. })),
            "{:?}",
            result
        );
    }
}

#[test]
fn test_missing_dependency() {
    let reports = ModuleBuilder::new("Reports").depends_on("Core", "^1.0.0");
    let env = TestEnv::with_modules(std::slice::from_ref(&reports));

    let (ctx, result) = check(&env, &reports);

    assert_eq!(
        result.unwrap_err(),
        ResolutionError::DependencyNotInstalled {
            module: "Reports".to_string(),
            dependency: "Core".to_string(),
        }
    );
    assert!(!ctx.is_closure_validated("Reports"));
}

#[test]
fn test_uninstalled_dependency_counts_as_missing() {
    let core = ModuleBuilder::new("Core").uninstalled();
    let reports = ModuleBuilder::new("Reports").depends_on("Core", "^1.0.0");
    let env = TestEnv::with_modules(&[core, reports.clone()]);

    let (_, result) = check(&env, &reports);

    assert!(matches!(result, Err(ResolutionError::DependencyNotInstalled { .. })));
}

#[test]
fn test_inactive_dependency() {
    let core = ModuleBuilder::new("Core").inactive();
    let reports = ModuleBuilder::new("Reports").depends_on("Core", "^1.0.0");
    let env = TestEnv::with_modules(&[core, reports.clone()]);

    let (_, result) = check(&env, &reports);

    assert!(matches!(result, Err(ResolutionError::DependencyInactive { .. })));
}

#[test]
fn test_version_outside_range() {
    let core = ModuleBuilder::new("Core").with_version("1.9.0");
    let reports = ModuleBuilder::new("Reports").depends_on("Core", "^2.0.0");
    let env = TestEnv::with_modules(&[core, reports.clone()]);

    let (ctx, result) = check(&env, &reports);

    assert_eq!(
        result.unwrap_err(),
        ResolutionError::VersionConstraintUnsatisfied {
            module: "Reports".to_string(),
            dependency: "Core".to_string(),
            required: "^2.0.0".to_string(),
            installed: "1.9.0".to_string(),
        }
    );
    assert!(ctx.extractions().is_empty());
}

#[test]
fn test_unparsable_range_is_unsatisfied() {
    let core = ModuleBuilder::new("Core");
    let reports = ModuleBuilder::new("Reports").depends_on("Core", "newest");
    let env = TestEnv::with_modules(&[core, reports.clone()]);

    let (_, result) = check(&env, &reports);

    match result.unwrap_err() {
        ResolutionError::VersionConstraintUnsatisfied { installed, .. } => {
            assert!(installed.starts_with("1.0.0 ("), "{}", installed)
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_transitive_failure_keeps_cause() {
    let ui = ModuleBuilder::new("Ui").depends_on("Reports", "1.0.0");
    let reports = ModuleBuilder::new("Reports").depends_on("Core", "^1.0.0");
    let env = TestEnv::with_modules(&[ui.clone(), reports]);

    let (_, result) = check(&env, &ui);

    let err = result.unwrap_err();
    assert!(matches!(
        err,
        ResolutionError::DependencyUnresolved { ref dependency, .. } if dependency == "Reports"
    ));
    assert!(matches!(
        err.root_cause(),
        ResolutionError::DependencyNotInstalled { dependency, .. } if dependency == "Core"
    ));
}

#[test]
fn test_invalid_dependency_artifact_fails_dependent() {
    let core = ModuleBuilder::new("Core").without_entry_points();
    let reports = ModuleBuilder::new("Reports").depends_on("Core", "^1.0.0");
    let env = TestEnv::with_modules(&[core, reports.clone()]);

    let (_, result) = check(&env, &reports);

    assert!(matches!(
        result.unwrap_err().root_cause(),
        ResolutionError::NoEntryPointFound { .. }
    ));
}

#[test]
fn test_presence_checked_before_recursion() {
    let core = ModuleBuilder::new("Core");
    let reports = ModuleBuilder::new("Reports")
        .depends_on("Core", "^1.0.0")
        .depends_on("Audit", "^1.0.0");
    let env = TestEnv::with_modules(&[core, reports.clone()]);

    let (ctx, result) = check(&env, &reports);

    assert!(matches!(result, Err(ResolutionError::DependencyNotInstalled { .. })));
    // Core was never recursed into
    assert!(ctx.extractions().is_empty());
    assert!(!ctx.is_closure_validated("Core"));
}

#[test]
fn test_cycle_terminates() {
    let billing = ModuleBuilder::new("Billing").depends_on("Auth", "^1.0.0");
    let auth = ModuleBuilder::new("Auth").depends_on("Billing", "^1.0.0");
    let env = TestEnv::with_modules(&[billing.clone(), auth]);

    let (ctx, result) = check(&env, &billing);

    let err = result.unwrap_err();
    assert!(err.is_cyclic());
    assert_eq!(
        err.root_cause(),
        &ResolutionError::CyclicDependency {
            cycle: vec!["Billing".into(), "Auth".into(), "Billing".into()]
        }
    );
    assert!(!ctx.is_visiting(billing.id()));
}

#[test]
fn test_self_dependency_is_a_cycle() {
    let narcissus = ModuleBuilder::new("Narcissus").depends_on("Narcissus", "^1.0.0");
    let env = TestEnv::with_modules(std::slice::from_ref(&narcissus));

    let (_, result) = check(&env, &narcissus);

    assert!(result.unwrap_err().is_cyclic());
}

#[test]
fn test_satisfied_closure_is_memoized() {
    let core = ModuleBuilder::new("Core");
    let reports = ModuleBuilder::new("Reports").depends_on("Core", "^1.0.0");
    let env = TestEnv::with_modules(&[core, reports.clone()]);
    let pipeline = env.pipeline();
    let resolver = pipeline.dependency_resolver();
    let mut ctx = ResolutionContext::new();

    resolver.dependencies_met(&mut ctx, &module_ref(&reports)).unwrap();
    let fetches = env.store.fetch_count();

    resolver.dependencies_met(&mut ctx, &module_ref(&reports)).unwrap();
    assert_eq!(env.store.fetch_count(), fetches);
}

#[test]
fn test_declared_dependencies_need_name_and_version() {
    let odd = ModuleBuilder::new("Odd")
        .with_manifest("name: Odd\nversion: 1.0.0\ndependencies:\n  - name: Core\n");
    let env = TestEnv::with_modules(std::slice::from_ref(&odd));

    let err = env
        .pipeline()
        .dependency_resolver()
        .declared_dependencies(&module_ref(&odd))
        .unwrap_err();

    assert!(matches!(err, ResolutionError::ManifestParseFailure { .. }));
}
