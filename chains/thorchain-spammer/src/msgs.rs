//! Message payloads understood by the THORChain REST endpoint.
//!
//! The engine never looks inside a [`Msg`]; it only picks which kind to
//! build and hands the result to the signer.

use crate::coins::Coin;
use serde::{Deserialize, Serialize};

/// Amount attached to every liquidity-pool trade.
pub const TRADE_AMOUNT: i64 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum Msg {
    #[serde(rename = "cosmos-sdk/Send")]
    Send {
        from_address: String,
        to_address: String,
        amount: Vec<Coin>,
    },
    #[serde(rename = "clp/MsgTrade")]
    Trade {
        sender: String,
        from_ticker: String,
        to_ticker: String,
        #[serde(with = "crate::coins::amount_string")]
        amount: i64,
    },
}

impl Msg {
    pub fn kind(&self) -> &'static str {
        match self {
            Msg::Send { .. } => "send",
            Msg::Trade { .. } => "trade",
        }
    }
}

pub fn build_send(from: &str, to: &str, coins: &[Coin]) -> Msg {
    Msg::Send {
        from_address: from.to_string(),
        to_address: to.to_string(),
        amount: coins.to_vec(),
    }
}

pub fn build_trade(sender: &str, from_ticker: &str, to_ticker: &str) -> Msg {
    Msg::Trade {
        sender: sender.to_string(),
        from_ticker: from_ticker.to_string(),
        to_ticker: to_ticker.to_string(),
        amount: TRADE_AMOUNT,
    }
}
