use super::init_tracing;
use proptest::prelude::*;
use rolekit_core::{Condition, ConditionNode, Operator, ParameterType, normalize};
use rolekit_tests::{abi, eq, gt, id};

fn arb_leaf() -> impl Strategy<Value = Condition> {
    prop_oneof![
        (0u64..6).prop_map(eq),
        (0u64..6).prop_map(gt),
        Just(Condition::pass(ParameterType::Static)),
    ]
}

/// Static-typed trees: comparisons under `And`/`Or`/`Nor`.
fn arb_static() -> impl Strategy<Value = Condition> {
    arb_leaf().prop_recursive(2, 12, 3, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 1..4).prop_map(Condition::and),
            prop::collection::vec(inner.clone(), 1..4).prop_map(Condition::or),
            prop::collection::vec(inner, 1..3).prop_map(Condition::nor),
        ]
    })
}

/// Function-scope trees: ABI encoded parameters, possibly combined logically. Kept small
/// enough that `Or`s over a few of them stay within the 256 addressable nodes.
fn arb_root() -> impl Strategy<Value = Condition> {
    let matches = prop::collection::vec(arb_static(), 1..3).prop_map(abi);
    matches.prop_recursive(1, 6, 3, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 1..4).prop_map(Condition::or),
            prop::collection::vec(inner, 1..3).prop_map(Condition::and),
        ]
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn normalization_is_idempotent(condition in arb_root()) {
        let once = normalize(&condition).unwrap();
        let twice = normalize(&once.to_condition()).unwrap();
        prop_assert_eq!(once.id(), twice.id());
        prop_assert_eq!(once.to_condition(), twice.to_condition());
    }

    #[test]
    fn or_branch_order_is_irrelevant(
        branches in prop::collection::vec(arb_root(), 1..4).prop_shuffle(),
    ) {
        let mut reversed = branches.clone();
        reversed.reverse();
        prop_assert_eq!(
            id(&Condition::or(branches)),
            id(&Condition::or(reversed))
        );
    }

    #[test]
    fn and_branch_order_is_irrelevant(
        branches in prop::collection::vec(arb_static(), 1..5),
    ) {
        let mut rotated = branches.clone();
        rotated.rotate_left(1);
        prop_assert_eq!(
            id(&abi(vec![Condition::and(branches)])),
            id(&abi(vec![Condition::and(rotated)]))
        );
    }

    #[test]
    fn duplicated_branches_are_absorbed(condition in arb_root()) {
        prop_assert_eq!(
            id(&Condition::or(vec![condition.clone(), condition.clone()])),
            id(&condition)
        );
    }
}

#[test]
fn test_nested_and_grouping() {
    init_tracing();
    let (a, b, c) = (eq(1), gt(2), eq(3));
    let left = abi(vec![Condition::and(vec![
        Condition::and(vec![a.clone(), b.clone()]),
        c.clone(),
    ])]);
    let right = abi(vec![Condition::and(vec![a, Condition::and(vec![b, c])])]);
    assert_eq!(id(&left), id(&right));
}

#[test]
fn test_or_duplicates_and_order() {
    let (a, b) = (eq(1), eq(2));
    let left = abi(vec![Condition::or(vec![a.clone(), a.clone(), b.clone()])]);
    let right = abi(vec![Condition::or(vec![b, a])]);
    assert_eq!(id(&left), id(&right));
}

#[test]
fn test_or_of_calls_pushed_into_parameter() {
    init_tracing();
    let either = Condition::or(vec![
        abi(vec![eq(1), gt(10)]),
        abi(vec![eq(2), gt(10)]),
    ]);
    let pushed = normalize(&either).unwrap();
    assert_eq!(pushed.operator(), Operator::Matches);
    assert_eq!(pushed.children()[0].operator(), Operator::Or);
    assert_eq!(
        pushed.id(),
        id(&abi(vec![Condition::or(vec![eq(1), eq(2)]), gt(10)]))
    );
}

#[test]
fn test_trailing_pass_does_not_change_id() {
    let with_pass = abi(vec![
        eq(1),
        Condition::pass(ParameterType::Static),
        Condition::pass(ParameterType::Dynamic),
    ]);
    assert_eq!(id(&with_pass), id(&abi(vec![eq(1)])));
}

#[test]
fn test_normalized_json_carries_ids() {
    let normalized = normalize(&abi(vec![Condition::or(vec![eq(2), eq(1)])])).unwrap();
    let json = serde_json::to_value(&normalized).unwrap();
    assert_eq!(json["id"], normalized.id().to_hex());
    assert_eq!(json["children"][0]["operator"], 2);
    assert_eq!(
        json["children"][0]["children"][0]["id"],
        normalized.children()[0].children()[0].id().to_hex()
    );
}
