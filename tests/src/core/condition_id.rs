//! Content address regression fixtures. The expected addresses are where the permission
//! contract deploys these conditions; any change here breaks on-chain lookups.

use rolekit_core::condition_id::{flatten_condition, pack_conditions};
use rolekit_core::{Condition, ConditionId, ConditionNode, Operator, ParameterType, normalize};
use rolekit_tests::{AVATAR, abi, address_word, encoded_bytes, eq, word};

fn expect_id(condition: &Condition, expected: &str) {
    let normalized = normalize(condition).unwrap();
    assert_eq!(normalized.id().to_hex(), expected);
    assert_eq!(normalized.id(), ConditionId::from_hex(expected).unwrap());
}

#[test]
fn test_static_leaf_ids() {
    expect_id(&eq(1), "0xc64985c1239e29226b9cb465fb244eecc3eef7ad");
    expect_id(&eq(2), "0x7fbc5d8614013b787a1c2929b61c5d1dd2fed37a");
}

#[test]
fn test_single_parameter_id() {
    expect_id(&abi(vec![eq(1)]), "0x4ed665f749d7bdeb20329a35410a446242393d7f");
}

fn transfer_like() -> Condition {
    abi(vec![
        Condition::equal_to(ParameterType::Static, address_word(AVATAR)),
        Condition::new(ParameterType::Static, Operator::GreaterThan).with_comp_value(word(100)),
        Condition::equal_to(ParameterType::Dynamic, encoded_bytes(&[0xde, 0xad, 0xbe, 0xef])),
        Condition::or(vec![eq(1), eq(2)]),
    ])
}

#[test]
fn test_mixed_condition_id() {
    expect_id(&transfer_like(), "0x5f7b7f6cfdb227267577cb98babe73496dc90f97");
}

#[test]
fn test_or_branches_sorted_by_id() {
    let normalized = normalize(&transfer_like()).unwrap();
    let or = &normalized.children()[3];
    // 0x7fbc.. sorts before 0xc649..
    assert_eq!(or.children()[0].comp_value(), Some(word(2).as_slice()));
    assert_eq!(or.children()[1].comp_value(), Some(word(1).as_slice()));
}

#[test]
fn test_packed_layout_of_mixed_condition() {
    let normalized = normalize(&transfer_like()).unwrap();
    let flat = flatten_condition(&normalized).unwrap();
    let parents: Vec<usize> = flat.iter().map(|c| c.parent).collect();
    assert_eq!(parents, vec![0, 0, 0, 0, 0, 4, 4]);

    let packed = pack_conditions(&flat).unwrap();
    // 7 headers and 5 payload words
    assert_eq!(packed.len(), 7 * 2 + 5 * 32);
    assert_eq!(
        hex::encode(&packed[..14]),
        "00c5003000310050000204300430"
    );
}

#[test]
fn test_reordered_input_has_same_id() {
    let reordered = abi(vec![
        Condition::equal_to(ParameterType::Static, address_word(AVATAR)),
        Condition::new(ParameterType::Static, Operator::GreaterThan).with_comp_value(word(100)),
        Condition::equal_to(ParameterType::Dynamic, encoded_bytes(&[0xde, 0xad, 0xbe, 0xef])),
        Condition::or(vec![eq(2), eq(1), eq(2)]),
        Condition::pass(ParameterType::Static),
    ]);
    expect_id(&reordered, "0x5f7b7f6cfdb227267577cb98babe73496dc90f97");
}
