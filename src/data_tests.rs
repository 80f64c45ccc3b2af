use anyhow::{bail, Result};
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::json;

use crate::data::*;
use crate::statement::credo::CredoTransaction;
use crate::statement::income::{summarize_income, Period};
use crate::statement::matching::{match_transactions, MatchOptions};
use crate::statement::transfers::{find_currency_transfers, TransferIndex, CURRENCY_EXCHANGE};
use crate::statement::zen::ZenTable;

fn csv_text(write: impl FnOnce(&mut Vec<u8>) -> Result<()>) -> Result<String> {
    let mut buffer = Vec::new();
    write(&mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

#[test]
fn test_table_uses_union_of_keys_in_first_seen_order() -> Result<()> {
    let records = vec![
        json!({ "transactionId": 1, "currency": "GEL", "debit": 12.5 }),
        json!({ "transactionId": 2, "credit": 100, "canRepeat": true, "details": { "mcc": 5814 } }),
    ];

    let table = RecordTable::from_records(&records)?;

    assert_eq!(table.headers, vec!["transactionId", "currency", "debit", "credit", "canRepeat", "details"]);
    assert_eq!(table.rows[0], vec!["1", "GEL", "12.5", "", "", ""]);
    assert_eq!(table.rows[1], vec!["2", "", "", "100", "true", r#"{"mcc":5814}"#]);

    let text = csv_text(|buffer| table.write_csv(buffer))?;
    assert_eq!(
        text,
        "transactionId,currency,debit,credit,canRepeat,details\n1,GEL,12.5,,,\n2,,,100,true,\"{\"\"mcc\"\":5814}\"\n"
    );

    Ok(())
}

#[test]
fn test_table_rejects_non_objects() -> Result<()> {
    match RecordTable::from_records(&[json!({ "a": 1 }), json!(2)]) {
        Err(err) => assert_eq!(err, TableError::NotAnObject { index: 1 }),
        Ok(_) => bail!("scalars cannot be flattened"),
    }

    assert!(RecordTable::from_json(r#"{"a":1}"#).is_err());
    assert!(RecordTable::from_json("[").is_err());

    Ok(())
}

#[test]
fn test_empty_array_gives_empty_csv() -> Result<()> {
    let table = RecordTable::from_json("[]")?;

    assert_eq!(csv_text(|buffer| table.write_csv(buffer))?, "");

    Ok(())
}

#[test]
fn test_export_json_is_an_array() -> Result<()> {
    let text = csv_text(|buffer| export_json(&[json!({ "b": 1, "a": 2 })], buffer))?;
    let parsed: serde_json::Value = serde_json::from_str(&text)?;

    assert_eq!(parsed, json!([{ "b": 1, "a": 2 }]));
    assert!(text.find("\"b\"") < text.find("\"a\""));
    assert!(text.ends_with("]\n"));

    Ok(())
}

fn exchange_leg(id: &str, currency: &str, debit: Option<Decimal>, credit: Option<Decimal>) -> CredoTransaction {
    CredoTransaction {
        account_number: Some("ACC-1".to_string()),
        currency: Some(currency.to_string()),
        transaction_id: Some(id.to_string()),
        debit,
        credit,
        description: Some(CURRENCY_EXCHANGE.to_string()),
        operation_date_time: Some("2024-03-20T11:00:00".to_string()),
        ..Default::default()
    }
}

#[test]
fn test_export_transfers() -> Result<()> {
    let transactions = vec![
        exchange_leg("1", "USD", Some(dec!(100)), None),
        exchange_leg("2", "GEL", None, Some(dec!(268))),
    ];
    let pairs = find_currency_transfers(&transactions);

    let text = csv_text(|buffer| export_transfers(&pairs, buffer))?;

    assert_eq!(
        text,
        "account_number,operation_date_time,from_currency,to_currency,from_amount,to_amount,\
from_transaction_id,to_transaction_id,from_stmt_entry_id,to_stmt_entry_id,exchange_rate,\
from_amount_equivalent,to_amount_equivalent\n\
ACC-1,2024-03-20 11:00:00,USD,GEL,100,268,1,2,,,2.68,,\n"
    );

    Ok(())
}

#[test]
fn test_export_matches() -> Result<()> {
    let zen = ZenTable::parse("date,payee,outcome,income\n2024-03-20,Bank,100,\n", None)?;
    let transactions = vec![
        exchange_leg("1", "USD", Some(dec!(100)), None),
        exchange_leg("2", "GEL", None, Some(dec!(268))),
    ];
    let pairs = find_currency_transfers(&transactions);
    let index = TransferIndex::new(&pairs);
    let matches = match_transactions(&zen, &transactions, &index, &MatchOptions::default())?;

    let text = csv_text(|buffer| export_matches(&matches, &zen, buffer))?;
    let lines: Vec<&str> = text.lines().collect();

    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("zen_date,zen_amount,zen_amount_column,credo_date,"));
    assert!(lines[0].ends_with(",exchange_rate,zen_date,zen_payee,zen_outcome,zen_income"));
    assert_eq!(
        lines[1],
        "2024-03-20,-100,outcome,2024-03-20 11:00:00,-100,Currency exchange,USD,1,exact,true,from,GEL,268,2,2.68,2024-03-20,Bank,100,"
    );

    Ok(())
}

#[test]
fn test_export_income() -> Result<()> {
    let zen = ZenTable::parse("date,payee,outcome,income\n2024-01-03,A,,10\n2024-03-01,B,,2.5\n", None)?;
    let totals = summarize_income(&zen, Period::Month)?;

    let text = csv_text(|buffer| export_income(&totals, buffer))?;

    assert_eq!(text, "date,income\n2024-01-31,10\n2024-02-29,0\n2024-03-31,2.5\n");

    Ok(())
}
