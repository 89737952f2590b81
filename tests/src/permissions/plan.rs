use super::init_tracing;
use rolekit_core::{Condition, ConditionNode, Operator, ParameterType};
use rolekit_permissions::{
    Call, Error, Permission, PlanConfig, Target, plan_apply_role, targets_from_permissions,
};
use rolekit_tests::{
    APPROVE, DEPOSIT, POOL, RoleState, TOKEN, TRANSFER, abi, canonical, eq, gt, word,
};

fn current() -> Vec<Target> {
    targets_from_permissions(&[
        Permission::allow_target(POOL),
        Permission::scope_function(TOKEN, TRANSFER, abi(vec![eq(1), gt(10)])),
        Permission::allow_function(TOKEN, APPROVE),
    ])
    .unwrap()
}

fn desired() -> Vec<Permission> {
    vec![
        Permission::allow_function(POOL, DEPOSIT).with_send(true),
        Permission::scope_function(TOKEN, TRANSFER, abi(vec![eq(1), gt(10)])),
        Permission::scope_function(TOKEN, TRANSFER, abi(vec![eq(2), gt(10)])),
        Permission::scope_function(TOKEN, APPROVE, abi(vec![eq(1)])),
        Permission::allow_function(TOKEN, APPROVE),
    ]
}

#[test]
fn test_plan_replays_to_planned_targets() {
    init_tracing();
    let current = current();
    for config in [
        PlanConfig::default(),
        PlanConfig {
            prune_obsolete_calls: false,
            ..PlanConfig::default()
        },
    ] {
        let plan = plan_apply_role(&current, &desired(), None, &config).unwrap();
        assert_eq!(plan.warnings.len(), 1);

        let mut state = RoleState::from_targets(&current);
        state.apply(&plan.calls);
        assert_eq!(canonical(&state.targets()), canonical(&plan.targets));
    }
}

#[test]
fn test_hoisted_plan_replays_to_planned_targets() {
    let probes = vec![
        Permission::scope_function(TOKEN, TRANSFER, abi(vec![eq(1), gt(10)])),
        Permission::scope_function(TOKEN, TRANSFER, abi(vec![eq(2), gt(10)])),
    ];
    let current = current();
    let plan = plan_apply_role(&current, &desired(), Some(&probes), &PlanConfig::default()).unwrap();

    let transfer = plan
        .targets
        .iter()
        .flat_map(|t| &t.functions)
        .find(|f| f.selector == TRANSFER)
        .unwrap();
    let stored = transfer.condition.as_ref().unwrap();
    assert_eq!(stored.operator(), Operator::Or);

    let mut state = RoleState::from_targets(&current);
    state.apply(&plan.calls);
    assert_eq!(canonical(&state.targets()), canonical(&plan.targets));
}

#[test]
fn test_replanning_is_a_no_op() {
    let first = plan_apply_role(&current(), &desired(), None, &PlanConfig::default()).unwrap();
    let second = plan_apply_role(&first.targets, &desired(), None, &PlanConfig::default()).unwrap();
    assert!(second.calls.is_empty());
}

#[test]
fn test_pruned_plan_is_shorter() {
    let current = current();
    let pruned = plan_apply_role(&current, &desired(), None, &PlanConfig::default()).unwrap();
    let config = PlanConfig {
        prune_obsolete_calls: false,
        ..PlanConfig::default()
    };
    let full = plan_apply_role(&current, &desired(), None, &config).unwrap();
    assert!(pruned.calls.len() < full.calls.len());
    assert!(
        pruned
            .calls
            .iter()
            .all(|call| !matches!(call, Call::RevokeTarget { .. }))
    );
}

#[test]
fn test_invalid_condition_fails_planning() {
    let broken = Condition::matches(ParameterType::Calldata, vec![eq(1)]);
    let err = plan_apply_role(
        &[],
        &[Permission::scope_function(TOKEN, TRANSFER, broken)],
        None,
        &PlanConfig::default(),
    )
    .unwrap_err();
    assert!(matches!(err, Error::Core(_)), "{err}");
}

#[test]
fn test_wide_condition_keeps_normal_form() {
    init_tracing();
    let ors = (0..9)
        .map(|i| Condition::or(vec![eq(2 * i + 1), eq(2 * i + 2)]))
        .collect();
    let desired = vec![Permission::scope_function(TOKEN, TRANSFER, abi(ors))];
    let probes = vec![Permission::allow_function(TOKEN, TRANSFER)];
    let plan = plan_apply_role(&[], &desired, Some(&probes), &PlanConfig::default()).unwrap();
    assert_eq!(plan.calls.len(), 2);

    let stored = plan.targets[0].functions[0].condition.as_ref().unwrap();
    assert_eq!(stored.operator(), Operator::Matches);
}

#[test]
fn test_static_tuple_equality_is_planned() {
    let mut pair = word(1);
    pair.extend(word(2));
    let tuple = Condition::equal_to(ParameterType::Tuple, pair).with_children(vec![
        Condition::pass(ParameterType::Static),
        Condition::pass(ParameterType::Static),
    ]);
    let desired = vec![Permission::scope_function(TOKEN, APPROVE, abi(vec![tuple]))];
    let plan = plan_apply_role(&[], &desired, None, &PlanConfig::default()).unwrap();

    let mut state = RoleState::default();
    state.apply(&plan.calls);
    assert_eq!(canonical(&state.targets()), canonical(&plan.targets));
}
