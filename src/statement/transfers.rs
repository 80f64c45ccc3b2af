use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDateTime;
use getset::Getters;
use log::debug;
use rust_decimal::Decimal;

use super::credo::CredoTransaction;

/// Description the bank puts on both legs of an in-account currency exchange.
pub const CURRENCY_EXCHANGE: &str = "Currency exchange";

const RATE_PRECISION: u32 = 6;

/// Debit and credit legs of one currency exchange.
#[derive(Debug, Clone, PartialEq, Getters)]
#[getset(get = "pub")]
pub struct TransferPair {
    account_number: String,
    operated_at: NaiveDateTime,
    from_currency: Option<String>,
    to_currency: Option<String>,
    from_amount: Decimal,
    to_amount: Decimal,
    from_transaction_id: Option<String>,
    to_transaction_id: Option<String>,
    from_stmt_entry_id: Option<String>,
    to_stmt_entry_id: Option<String>,
    from_amount_equivalent: Option<Decimal>,
    to_amount_equivalent: Option<Decimal>,
    exchange_rate: Option<Decimal>,
}

impl TransferPair {
    /// A group forms a pair only with exactly two members, one debit and one credit.
    fn from_group(account_number: String, operated_at: NaiveDateTime, group: &[&CredoTransaction]) -> Option<TransferPair> {
        if group.len() != 2 {
            return None;
        }

        let mut debits = group.iter().filter(|tx| tx.debit.is_some());
        let mut credits = group.iter().filter(|tx| tx.credit.is_some());

        let (debit_tx, credit_tx) = match (debits.next(), debits.next(), credits.next(), credits.next()) {
            (Some(debit_tx), None, Some(credit_tx), None) => (*debit_tx, *credit_tx),
            _ => return None,
        };

        let from_amount = debit_tx.debit.unwrap_or_default();
        let to_amount = credit_tx.credit.unwrap_or_default();

        Some(TransferPair {
            account_number,
            operated_at,
            from_currency: debit_tx.currency.clone(),
            to_currency: credit_tx.currency.clone(),
            from_amount,
            to_amount,
            from_transaction_id: debit_tx.transaction_id.clone(),
            to_transaction_id: credit_tx.transaction_id.clone(),
            from_stmt_entry_id: debit_tx.stmt_entry_id.clone(),
            to_stmt_entry_id: credit_tx.stmt_entry_id.clone(),
            from_amount_equivalent: debit_tx.amount_equivalent,
            to_amount_equivalent: credit_tx.amount_equivalent,
            exchange_rate: to_amount.checked_div(from_amount).map(|rate| rate.round_dp(RATE_PRECISION)),
        })
    }
}

/// Pair up currency exchange legs that share an account and an operation time.
///
/// Pairs come out ordered by account number, then operation time.
pub fn find_currency_transfers(transactions: &[CredoTransaction]) -> Vec<TransferPair> {
    let mut groups: BTreeMap<(String, NaiveDateTime), Vec<&CredoTransaction>> = BTreeMap::new();

    for tx in transactions
        .iter()
        .filter(|tx| tx.description.as_deref() == Some(CURRENCY_EXCHANGE))
    {
        match (&tx.account_number, tx.operated_at()) {
            (Some(account_number), Some(operated_at)) => {
                groups.entry((account_number.clone(), operated_at)).or_default().push(tx);
            },
            _ => debug!("currency exchange without account or time, tx={:?}", tx.transaction_id),
        }
    }

    groups
        .into_iter()
        .filter_map(|((account_number, operated_at), group)| TransferPair::from_group(account_number, operated_at, &group))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferSide {
    From,
    To,
}

impl TransferSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferSide::From => "from",
            TransferSide::To => "to",
        }
    }
}

/// One leg of a transfer, seen from the transaction that was looked up.
#[derive(Debug, Clone, Copy)]
pub struct TransferLink<'a> {
    pub side: TransferSide,
    pub pair: &'a TransferPair,
}

impl<'a> TransferLink<'a> {
    pub fn counterpart_currency(&self) -> Option<&'a str> {
        match self.side {
            TransferSide::From => self.pair.to_currency.as_deref(),
            TransferSide::To => self.pair.from_currency.as_deref(),
        }
    }

    pub fn counterpart_amount(&self) -> Decimal {
        match self.side {
            TransferSide::From => self.pair.to_amount,
            TransferSide::To => self.pair.from_amount,
        }
    }

    pub fn counterpart_transaction_id(&self) -> Option<&'a str> {
        match self.side {
            TransferSide::From => self.pair.to_transaction_id.as_deref(),
            TransferSide::To => self.pair.from_transaction_id.as_deref(),
        }
    }

    pub fn exchange_rate(&self) -> Option<Decimal> {
        self.pair.exchange_rate
    }
}

/// Transfer lookup by transaction id.
///
/// A debit leg wins over a credit leg, and the first pair wins among equals.
#[derive(Debug, Default)]
pub struct TransferIndex<'a> {
    links: HashMap<&'a str, TransferLink<'a>>,
}

impl<'a> TransferIndex<'a> {
    pub fn new(pairs: &'a [TransferPair]) -> TransferIndex<'a> {
        let mut links = HashMap::new();

        for pair in pairs {
            if let Some(id) = pair.from_transaction_id.as_deref() {
                links.entry(id).or_insert(TransferLink { side: TransferSide::From, pair });
            }
        }

        for pair in pairs {
            if let Some(id) = pair.to_transaction_id.as_deref() {
                links.entry(id).or_insert(TransferLink { side: TransferSide::To, pair });
            }
        }

        TransferIndex { links }
    }

    pub fn get(&self, transaction_id: &str) -> Option<TransferLink<'a>> {
        self.links.get(transaction_id).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}
