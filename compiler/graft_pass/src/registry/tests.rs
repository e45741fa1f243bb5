use pretty_assertions::assert_eq;
use proptest::prelude::*;

use super::*;
use crate::{PassKind, PassRecord};

fn names(registry: &PassRegistry) -> Vec<&str> {
    registry.get_passes().map(Pass::name).collect()
}

fn register(registry: &mut PassRegistry, name: &str, priority: f32) {
    let registered = registry
        .register_pass("cpu", name, Pass::transformation)
        .map(|pass| {
            pass.set_priority(priority);
        });
    assert_eq!(registered, Ok(()));
}

#[test]
fn new_registry_is_empty() {
    let registry = PassRegistry::new();
    assert!(registry.is_empty());
    assert_eq!(registry.get_passes().len(), 0);
}

#[test]
fn registration_assigns_increasing_indexes() {
    let mut registry = PassRegistry::new();
    register(&mut registry, "a", 1.0);
    register(&mut registry, "b", 1.0);
    register(&mut registry, "c", 1.0);

    let indexes: Vec<u32> = registry.get_passes().map(Pass::index).collect();
    assert_eq!(indexes, vec![0, 1, 2]);
    assert_eq!(registry.len(), 3);
}

#[test]
fn registration_uses_factory_kind_and_identity() {
    let mut registry = PassRegistry::new();
    let kind = registry
        .register_pass("gpu", "census", Pass::analysis)
        .map(|pass| pass.kind());
    assert_eq!(kind, Ok(PassKind::Analysis));

    let pass = registry.get_pass("census");
    assert_eq!(pass.map(Pass::backend), Ok("gpu"));
}

#[test]
fn duplicate_name_is_rejected_and_first_pass_kept() {
    let mut registry = PassRegistry::new();
    register(&mut registry, "fuse", 7.0);

    let err = registry
        .register_pass("gpu", "fuse", Pass::analysis)
        .map(|_| ());
    assert_eq!(
        err,
        Err(RegistryError::DuplicatePass {
            backend: "gpu".to_owned(),
            name: "fuse".to_owned(),
            existing_backend: "cpu".to_owned(),
        })
    );

    assert_eq!(registry.len(), 1);
    let kept = registry.get_pass("fuse");
    assert_eq!(kept.map(Pass::kind), Ok(PassKind::Transformation));
    assert_eq!(registry.get_pass("fuse").map(Pass::priority), Ok(7.0));
}

#[test]
fn rejected_registration_does_not_consume_an_index() {
    let mut registry = PassRegistry::new();
    register(&mut registry, "a", 1.0);
    assert!(registry
        .register_pass("cpu", "a", Pass::transformation)
        .is_err());
    register(&mut registry, "b", 1.0);

    assert_eq!(registry.get_pass("b").map(Pass::index), Ok(1));
}

#[test]
fn unknown_name_is_not_found() {
    let registry = PassRegistry::new();
    assert_eq!(
        registry.get_pass("missing").map(Pass::name),
        Err(RegistryError::PassNotFound {
            name: "missing".to_owned(),
        })
    );
    assert!(!registry.contains("missing"));
}

#[test]
fn get_pass_mut_reconfigures_in_place() {
    let mut registry = PassRegistry::new();
    register(&mut registry, "a", 1.0);
    register(&mut registry, "b", 2.0);

    if let Ok(pass) = registry.get_pass_mut("a") {
        pass.set_priority(3.0).set_enable(false);
    }
    registry.sort_passes();

    assert_eq!(names(&registry), vec!["a", "b"]);
    assert_eq!(registry.get_pass("a").map(Pass::enable), Ok(false));
}

#[test]
fn iteration_is_registration_order_until_sorted() {
    let mut registry = PassRegistry::new();
    register(&mut registry, "low", 1.0);
    register(&mut registry, "high", 9.0);
    assert_eq!(names(&registry), vec!["low", "high"]);

    registry.sort_passes();
    assert_eq!(names(&registry), vec!["high", "low"]);
}

#[test]
fn sort_keeps_registration_order_for_ties() {
    let mut registry = PassRegistry::new();
    register(&mut registry, "a", 5.0);
    register(&mut registry, "b", 8.0);
    register(&mut registry, "c", 5.0);
    register(&mut registry, "d", 8.0);
    register(&mut registry, "e", -1.0);

    registry.sort_passes();
    assert_eq!(names(&registry), vec!["b", "d", "a", "c", "e"]);

    // Sorting again is a no-op.
    registry.sort_passes();
    assert_eq!(names(&registry), vec!["b", "d", "a", "c", "e"]);
}

#[test]
fn signed_zero_priorities_tie() {
    let mut registry = PassRegistry::new();
    register(&mut registry, "neg_zero", -0.0);
    register(&mut registry, "pos_zero", 0.0);
    register(&mut registry, "neg_one", -1.0);
    register(&mut registry, "one", 1.0);

    registry.sort_passes();
    assert_eq!(names(&registry), vec!["one", "neg_zero", "pos_zero", "neg_one"]);
}

#[test]
fn macros_register_by_identifier() {
    let mut registry = PassRegistry::new();
    let fused = register_transformation_pass!(registry, cpu, conv_relu_fusion).map(|_| ());
    let census = register_analysis_pass!(registry, cpu, op_census).map(|_| ());
    assert_eq!(fused, Ok(()));
    assert_eq!(census, Ok(()));

    assert_eq!(
        registry.get_pass("conv_relu_fusion").map(Pass::kind),
        Ok(PassKind::Transformation)
    );
    assert_eq!(
        registry.get_pass("op_census").map(Pass::kind),
        Ok(PassKind::Analysis)
    );
    assert_eq!(registry.get_pass("op_census").map(Pass::backend), Ok("cpu"));
}

#[test]
fn save_passes_follows_execution_order() {
    let mut registry = PassRegistry::new();
    register(&mut registry, "a", 1.0);
    register(&mut registry, "b", 2.0);
    registry.sort_passes();

    let mut buf = Vec::new();
    assert!(registry.save_passes(&mut buf).is_ok());
    let config = PassConfig::from_reader(buf.as_slice());
    let saved: Option<Vec<String>> = config
        .ok()
        .map(|config| config.passes.into_iter().map(|r| r.pass_name).collect());
    assert_eq!(saved, Some(vec!["b".to_owned(), "a".to_owned()]));
}

#[test]
fn saved_config_restores_priorities_and_flags() {
    let mut source = PassRegistry::new();
    register(&mut source, "a", 1.0);
    register(&mut source, "b", 2.0);
    if let Ok(pass) = source.get_pass_mut("a") {
        pass.set_priority(4.0).set_enable(false);
    }
    let mut buf = Vec::new();
    assert!(source.save_passes(&mut buf).is_ok());

    let mut target = PassRegistry::new();
    register(&mut target, "a", 1.0);
    register(&mut target, "b", 2.0);
    target.sort_passes();
    assert_eq!(names(&target), vec!["b", "a"]);

    let config = PassConfig::from_reader(buf.as_slice());
    let applied = config.map(|config| target.apply_config(&config));
    assert!(matches!(applied, Ok(Ok(()))));

    assert_eq!(names(&target), vec!["a", "b"]);
    assert_eq!(target.get_pass("a").map(Pass::priority), Ok(4.0));
    assert_eq!(target.get_pass("a").map(Pass::enable), Ok(false));
}

fn override_for(name: &str, backend: &str, kind: PassKind) -> PassRecord {
    PassRecord {
        pass_name: name.to_owned(),
        pass_type: kind,
        pass_backend: backend.to_owned(),
        priority: 100.0,
        enable: false,
    }
}

fn config_with(records: Vec<PassRecord>) -> PassConfig {
    let mut config = PassConfig::new();
    config.passes = records;
    config
}

#[test]
fn apply_config_rejects_bad_records_without_partial_updates() {
    let mut registry = PassRegistry::new();
    register(&mut registry, "a", 1.0);
    register(&mut registry, "b", 2.0);
    registry.sort_passes();

    let good = override_for("a", "cpu", PassKind::Transformation);
    let cases = [
        (
            override_for("missing", "cpu", PassKind::Transformation),
            RegistryError::PassNotFound {
                name: "missing".to_owned(),
            },
        ),
        (
            override_for("b", "gpu", PassKind::Transformation),
            RegistryError::BackendMismatch {
                name: "b".to_owned(),
                registered: "cpu".to_owned(),
                found: "gpu".to_owned(),
            },
        ),
        (
            override_for("b", "cpu", PassKind::Analysis),
            RegistryError::KindMismatch {
                name: "b".to_owned(),
                registered: PassKind::Transformation,
                found: PassKind::Analysis,
            },
        ),
    ];

    for (bad, expected) in cases {
        let config = config_with(vec![good.clone(), bad]);
        assert_eq!(registry.apply_config(&config), Err(expected));
        assert_eq!(registry.get_pass("a").map(Pass::priority), Ok(1.0));
        assert_eq!(registry.get_pass("a").map(Pass::enable), Ok(true));
        assert_eq!(names(&registry), vec!["b", "a"]);
    }
}

#[test]
fn global_registry_holds_sorted_builtin_passes() {
    let registry = PassRegistry::global().read();
    assert!(registry.contains("conv_relu_fusion"));
    assert!(registry.contains("op_census"));

    let priorities: Vec<f32> = registry.get_passes().map(Pass::priority).collect();
    assert!(priorities.windows(2).all(|pair| pair[0] >= pair[1]));
}

proptest! {
    #[test]
    fn sorted_order_is_stable_and_descending(
        priorities in prop::collection::vec(
            prop_oneof![
                Just(1.0f32),
                Just(5.0f32),
                Just(0.0f32),
                Just(-0.0f32),
                -50.0f32..50.0f32,
            ],
            0..24,
        )
    ) {
        let mut registry = PassRegistry::new();
        for (i, &priority) in priorities.iter().enumerate() {
            register(&mut registry, &format!("p{i}"), priority);
        }
        registry.sort_passes();

        let passes: Vec<&Pass> = registry.get_passes().collect();
        prop_assert_eq!(passes.len(), priorities.len());
        for pair in passes.windows(2) {
            prop_assert!(pair[0].priority() >= pair[1].priority());
            if pair[0].priority() == pair[1].priority() {
                prop_assert!(pair[0].index() < pair[1].index());
            }
        }
    }
}

fn document(name: &str, backend: &str, priority: f32) -> String {
    format!(
        r#"{{"pass_name":"{name}","pass_type":"Transformation","pass_backend":"{backend}","priority":{priority:?},"enable":false}}"#
    )
}

#[test]
fn loading_a_document_cannot_rename_a_registered_pass() {
    let mut registry = PassRegistry::new();
    register(&mut registry, "a", 1.0);

    let renamed = document("b", "cpu", 3.0);
    let loaded = registry
        .get_pass_mut("a")
        .map(|pass| pass.load(renamed.as_bytes()));
    assert!(matches!(
        loaded,
        Ok(Err(SerializationError::IdentityMismatch { .. }))
    ));

    let rebacked = document("a", "gpu", 3.0);
    let loaded = registry
        .get_pass_mut("a")
        .map(|pass| pass.load(rebacked.as_bytes()));
    assert!(matches!(
        loaded,
        Ok(Err(SerializationError::IdentityMismatch { .. }))
    ));

    assert_eq!(registry.get_pass("a").map(Pass::name), Ok("a"));
    assert_eq!(registry.get_pass("a").map(Pass::priority), Ok(1.0));
    assert!(!registry.contains("b"));

    // The name map still matches the passes, so "b" is free exactly once.
    register(&mut registry, "b", 2.0);
    assert!(registry
        .register_pass("cpu", "b", Pass::transformation)
        .is_err());
    assert_eq!(names(&registry), vec!["a", "b"]);
}

#[test]
fn loading_a_matching_document_updates_a_registered_pass() {
    let mut registry = PassRegistry::new();
    register(&mut registry, "a", 1.0);
    register(&mut registry, "b", 2.0);

    let text = document("a", "cpu", 3.0);
    let loaded = registry
        .get_pass_mut("a")
        .map(|pass| pass.load(text.as_bytes()).is_ok());
    assert_eq!(loaded, Ok(true));
    registry.sort_passes();

    assert_eq!(names(&registry), vec!["a", "b"]);
    assert_eq!(registry.get_pass("a").map(Pass::enable), Ok(false));
    assert_eq!(registry.get_pass("a").map(Pass::is_registered), Ok(true));
}
