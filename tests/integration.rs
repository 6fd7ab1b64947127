mod common;

use std::{cell::RefCell, collections::HashSet, str::from_utf8};

use account_details::{
    aggregator::{AccountDetailsError, GET_LOCKED_AMOUNT, LedgerCall},
    bin_utils::{Service, collect_account_ids},
    lockup::derive_lockup_id,
    query::QueryError,
};
use common::{FakeLedger, SUFFIX, aggregator};
use serde_json::json;

const TEST_FILE: &str = include_str!("accounts.csv");

#[tokio::test]
async fn process_accounts() {
    let lockup = derive_lockup_id("alice.near", SUFFIX);
    let aggregator = aggregator(
        FakeLedger::new()
            .with_account("alice.near", 100, 20, 10)
            .with_account(&lockup, 50, 30, 0)
            .with_view(&lockup, GET_LOCKED_AMOUNT, json!("10"))
            .with_account("bob.near", 7, 0, 3)
            .with_account_error(
                "broken.near",
                QueryError::Rpc {
                    name: "INTERNAL_ERROR".to_owned(),
                    message: "storage error".to_owned(),
                },
            ),
    );

    let account_ids =
        collect_account_ids(vec!["bob.near".to_owned()], Some(TEST_FILE.as_bytes())).unwrap();
    assert_eq!(
        account_ids,
        ["bob.near", "alice.near", "nobody.near", "broken.near"]
    );

    let failures = RefCell::new(Vec::new());
    let mut output = Vec::new();
    let service = Service {
        aggregator: &aggregator,
        output: &mut output,
        error_printer: Box::new(|position: usize, account_id: &str, err: AccountDetailsError| {
            failures
                .borrow_mut()
                .push((position, account_id.to_owned(), err.call()));
        }),
    };
    service.run(account_ids).await.unwrap();

    assert_eq!(
        failures.into_inner(),
        vec![(4, "broken.near".to_owned(), Some(LedgerCall::AccountInfo))]
    );

    let lines: HashSet<String> = from_utf8(&output)
        .unwrap()
        .lines()
        .map(ToOwned::to_owned)
        .collect();
    assert_eq!(lines.len(), 4);
    assert!(lines.contains(
        "account_id,exists,storage_usage,staked_balance,non_staked_balance,minimum_balance,\
         available_balance,total_balance,lockup_account_id,lockup_total_balance,\
         lockup_locked_balance,lockup_unlocked_balance"
    ));
    assert!(lines.contains("bob.near,true,3,0,7,3,4,7,,,,"));
    assert!(lines.contains(&format!(
        "alice.near,true,10,20,100,10,100,200,{lockup},80,10,70"
    )));
    assert!(lines.contains("nobody.near,false,,,,,,,,,,"));
}

#[test]
fn unreadable_rows_are_rejected() {
    let err = collect_account_ids(Vec::new(), Some("id\nalice.near\n".as_bytes())).unwrap_err();
    assert!(err.to_string().starts_with("Invalid input row"));
}

#[test]
fn ragged_rows_only_need_the_account_id() {
    let input = "account_id,note\nalice.near,first\nbob.near\n";
    let account_ids = collect_account_ids(Vec::new(), Some(input.as_bytes())).unwrap();
    assert_eq!(account_ids, ["alice.near", "bob.near"]);

    let input = "note,account_id\nfirst,alice.near\nsecond\n";
    let err = collect_account_ids(Vec::new(), Some(input.as_bytes())).unwrap_err();
    assert_eq!(err.to_string(), "Invalid input row at line 3");
}
