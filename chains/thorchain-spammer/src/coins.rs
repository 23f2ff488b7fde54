//! Coin amounts and the per-spammer send slice.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coin {
    pub denom: String,
    #[serde(with = "amount_string")]
    pub amount: i64,
}

impl Coin {
    pub fn new(denom: impl Into<String>, amount: i64) -> Self {
        Self {
            denom: denom.into(),
            amount,
        }
    }

    pub fn is_positive(&self) -> bool {
        self.amount > 0
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}

pub fn format_coins(coins: &[Coin]) -> String {
    coins
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// Draws a random slice of every holding.
///
/// For a holding `a` the slice is uniform in `[0, a / divide_by)`. A draw of
/// zero on a non-empty holding is bumped to one, so every funded denomination
/// yields something to send. Denominations whose slice stays at zero are left
/// out of the result; an empty result means nothing can be sent.
pub fn random_coins_up_to<R: Rng>(coins: &[Coin], divide_by: i64, rng: &mut R) -> Vec<Coin> {
    coins
        .iter()
        .map(|coin| Coin::new(coin.denom.clone(), random_amount_up_to(coin.amount, divide_by, rng)))
        .filter(Coin::is_positive)
        .collect()
}

fn random_amount_up_to<R: Rng>(amount: i64, divide_by: i64, rng: &mut R) -> i64 {
    let upper = if divide_by > 0 { amount / divide_by } else { 0 };
    let drawn = if upper > 0 { rng.gen_range(0..upper) } else { 0 };

    if drawn == 0 && amount >= 1 {
        1
    } else {
        drawn
    }
}

/// Cosmos encodes integer amounts as JSON strings
pub(crate) mod amount_string {
    use serde::de::{self, Deserializer};
    use serde::{Deserialize, Serializer};

    pub fn serialize<S: Serializer>(amount: &i64, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&amount.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Str(String),
            Num(i64),
        }
        match Raw::deserialize(d)? {
            Raw::Str(s) => s.trim().parse().map_err(de::Error::custom),
            Raw::Num(n) => Ok(n),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_balance_at_divisor_forces_one() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let slice = random_coins_up_to(&[Coin::new("RUNE", 1000)], 1000, &mut rng);
            assert_eq!(slice, vec![Coin::new("RUNE", 1)]);
        }
    }

    #[test]
    fn test_zero_balance_yields_nothing() {
        let mut rng = StdRng::seed_from_u64(7);
        assert!(random_coins_up_to(&[Coin::new("RUNE", 0)], 1000, &mut rng).is_empty());
        assert!(random_coins_up_to(&[], 1000, &mut rng).is_empty());
    }

    #[test]
    fn test_small_balance_still_sends_one() {
        let mut rng = StdRng::seed_from_u64(1);
        let slice = random_coins_up_to(&[Coin::new("ETH", 3)], 1000, &mut rng);
        assert_eq!(slice, vec![Coin::new("ETH", 1)]);
    }

    #[test]
    fn test_slice_stays_below_bound() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..200 {
            let slice = random_coins_up_to(&[Coin::new("RUNE", 5_000_000)], 1000, &mut rng);
            let amount = slice[0].amount;
            assert!((1..5000).contains(&amount), "amount {amount} out of range");
        }
    }

    #[test]
    fn test_mixed_holdings_drop_empty_denoms() {
        let mut rng = StdRng::seed_from_u64(3);
        let holdings = vec![Coin::new("RUNE", 0), Coin::new("XMR", 20_000)];
        let slice = random_coins_up_to(&holdings, 1000, &mut rng);
        assert_eq!(slice.len(), 1);
        assert_eq!(slice[0].denom, "XMR");
    }

    #[test]
    fn test_amount_accepts_string_or_number() {
        let a: Coin = serde_json::from_str(r#"{"denom":"RUNE","amount":"15"}"#).unwrap();
        let b: Coin = serde_json::from_str(r#"{"denom":"RUNE","amount":15}"#).unwrap();
        assert_eq!(a, b);
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            r#"{"denom":"RUNE","amount":"15"}"#
        );
        assert_eq!(format_coins(&[a, Coin::new("ETH", 2)]), "15RUNE,2ETH");
    }
}
