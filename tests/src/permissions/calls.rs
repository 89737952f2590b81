use alloy_primitives::Address;
use rolekit_permissions::{Call, ExecutionOptions, Selector, remove_obsolete_calls};
use rolekit_tests::{APPROVE, POOL, RoleState, TOKEN, TRANSFER, abi, canonical, eq};

fn allow_target(target: Address) -> Call {
    Call::AllowTarget {
        target,
        execution_options: ExecutionOptions::None,
    }
}

fn allow_function(target: Address, selector: Selector) -> Call {
    Call::AllowFunction {
        target,
        selector,
        execution_options: ExecutionOptions::None,
    }
}

#[test]
fn test_allow_target_makes_function_call_obsolete() {
    let calls = vec![allow_function(TOKEN, TRANSFER), allow_target(TOKEN)];
    assert_eq!(remove_obsolete_calls(&calls), vec![allow_target(TOKEN)]);
}

#[test]
fn test_first_call_survives_dropped_override() {
    let scope = Call::ScopeTarget { target: TOKEN };
    let calls = vec![
        allow_function(TOKEN, TRANSFER),
        allow_target(TOKEN),
        scope.clone(),
    ];
    assert_eq!(
        remove_obsolete_calls(&calls),
        vec![allow_function(TOKEN, TRANSFER), scope]
    );
}

#[test]
fn test_pruning_keeps_the_resulting_state() {
    let calls = vec![
        Call::RevokeFunction {
            target: TOKEN,
            selector: TRANSFER,
        },
        Call::RevokeTarget { target: POOL },
        Call::ScopeTarget { target: TOKEN },
        Call::ScopeFunction {
            target: TOKEN,
            selector: TRANSFER,
            condition: abi(vec![eq(1)]),
            execution_options: ExecutionOptions::Send,
        },
        allow_function(TOKEN, APPROVE),
        Call::ScopeTarget { target: POOL },
        allow_function(POOL, TRANSFER),
        Call::RevokeFunction {
            target: TOKEN,
            selector: APPROVE,
        },
    ];
    let pruned = remove_obsolete_calls(&calls);
    assert_eq!(pruned.len(), 5);

    let mut full = RoleState::default();
    full.apply(&calls);
    let mut short = RoleState::default();
    short.apply(&pruned);
    assert_eq!(canonical(&short.targets()), canonical(&full.targets()));
}
