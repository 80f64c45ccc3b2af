use anyhow::{bail, Result};
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::credo::CredoTransaction;
use super::transfers::*;

fn exchange_leg(id: &str, account: &str, at: &str, currency: &str, debit: Option<Decimal>, credit: Option<Decimal>) -> CredoTransaction {
    CredoTransaction {
        account_number: Some(account.to_string()),
        currency: Some(currency.to_string()),
        transaction_id: Some(id.to_string()),
        stmt_entry_id: Some(format!("S-{}", id)),
        debit,
        credit,
        amount_equivalent: debit.or(credit),
        description: Some(CURRENCY_EXCHANGE.to_string()),
        operation_date_time: Some(at.to_string()),
    }
}

#[test]
fn test_pairs_debit_with_credit() -> Result<()> {
    let transactions = vec![
        exchange_leg("1", "ACC-1", "2024-03-15T10:00:00", "USD", Some(dec!(100)), None),
        exchange_leg("2", "ACC-1", "2024-03-15T10:00:00", "GEL", None, Some(dec!(268.5))),
    ];

    let pairs = find_currency_transfers(&transactions);

    assert_eq!(pairs.len(), 1);
    let pair = &pairs[0];
    assert_eq!(pair.account_number(), "ACC-1");
    assert_eq!(pair.from_currency().as_deref(), Some("USD"));
    assert_eq!(pair.to_currency().as_deref(), Some("GEL"));
    assert_eq!(*pair.from_amount(), dec!(100));
    assert_eq!(*pair.to_amount(), dec!(268.5));
    assert_eq!(pair.from_transaction_id().as_deref(), Some("1"));
    assert_eq!(pair.to_stmt_entry_id().as_deref(), Some("S-2"));
    assert_eq!(*pair.exchange_rate(), Some(dec!(2.685)));

    Ok(())
}

#[test]
fn test_ignores_other_descriptions_and_odd_groups() {
    let mut not_exchange = exchange_leg("3", "ACC-1", "2024-03-15T11:00:00", "USD", Some(dec!(5)), None);
    not_exchange.description = Some("Card payment".to_string());

    let transactions = vec![
        // Three legs at one instant.
        exchange_leg("1", "ACC-1", "2024-03-15T10:00:00", "USD", Some(dec!(100)), None),
        exchange_leg("2", "ACC-1", "2024-03-15T10:00:00", "GEL", None, Some(dec!(268))),
        exchange_leg("4", "ACC-1", "2024-03-15T10:00:00", "EUR", None, Some(dec!(90))),
        // Two debits.
        exchange_leg("5", "ACC-2", "2024-03-16T10:00:00", "USD", Some(dec!(1)), None),
        exchange_leg("6", "ACC-2", "2024-03-16T10:00:00", "GEL", Some(dec!(2)), None),
        // Lone leg.
        exchange_leg("7", "ACC-3", "2024-03-17T10:00:00", "USD", Some(dec!(1)), None),
        not_exchange,
        exchange_leg("8", "ACC-1", "2024-03-15T11:00:00", "GEL", None, Some(dec!(13))),
    ];

    assert_eq!(find_currency_transfers(&transactions), Vec::<TransferPair>::new());
}

#[test]
fn test_pairs_are_ordered_by_account_then_time() {
    let transactions = vec![
        exchange_leg("1", "ACC-2", "2024-03-15T10:00:00", "USD", Some(dec!(1)), None),
        exchange_leg("2", "ACC-2", "2024-03-15T10:00:00", "GEL", None, Some(dec!(2))),
        exchange_leg("3", "ACC-1", "2024-03-16T10:00:00", "USD", Some(dec!(1)), None),
        exchange_leg("4", "ACC-1", "2024-03-16T10:00:00", "GEL", None, Some(dec!(2))),
        exchange_leg("5", "ACC-1", "2024-03-14T10:00:00", "USD", Some(dec!(1)), None),
        exchange_leg("6", "ACC-1", "2024-03-14T10:00:00", "GEL", None, Some(dec!(2))),
    ];

    let ids: Vec<Option<String>> = find_currency_transfers(&transactions)
        .iter()
        .map(|pair| pair.from_transaction_id().clone())
        .collect();

    assert_eq!(ids, vec![Some("5".to_string()), Some("3".to_string()), Some("1".to_string())]);
}

#[test]
fn test_zero_debit_has_no_rate() {
    let transactions = vec![
        exchange_leg("1", "ACC-1", "2024-03-15T10:00:00", "USD", Some(dec!(0)), None),
        exchange_leg("2", "ACC-1", "2024-03-15T10:00:00", "GEL", None, Some(dec!(1))),
    ];

    let pairs = find_currency_transfers(&transactions);

    assert_eq!(pairs.len(), 1);
    assert_eq!(*pairs[0].exchange_rate(), None);
}

#[test]
fn test_index_looks_up_both_legs() -> Result<()> {
    let transactions = vec![
        exchange_leg("1", "ACC-1", "2024-03-15T10:00:00", "USD", Some(dec!(100)), None),
        exchange_leg("2", "ACC-1", "2024-03-15T10:00:00", "GEL", None, Some(dec!(270))),
    ];
    let pairs = find_currency_transfers(&transactions);
    let index = TransferIndex::new(&pairs);

    let Some(from) = index.get("1") else {
        bail!("debit leg should be indexed");
    };
    assert_eq!(from.side, TransferSide::From);
    assert_eq!(from.side.as_str(), "from");
    assert_eq!(from.counterpart_currency(), Some("GEL"));
    assert_eq!(from.counterpart_amount(), dec!(270));
    assert_eq!(from.counterpart_transaction_id(), Some("2"));
    assert_eq!(from.exchange_rate(), Some(dec!(2.7)));

    let Some(to) = index.get("2") else {
        bail!("credit leg should be indexed");
    };
    assert_eq!(to.side, TransferSide::To);
    assert_eq!(to.counterpart_currency(), Some("USD"));
    assert_eq!(to.counterpart_amount(), dec!(100));

    assert!(index.get("3").is_none());
    assert!(TransferIndex::new(&[]).is_empty());

    Ok(())
}
