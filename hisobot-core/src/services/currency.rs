//! Currency service - per-owner rates and conversion

use std::collections::HashMap;
use std::sync::Arc;

use rust_decimal::Decimal;

use crate::domain::result::{Error, Result};
use crate::domain::{Currency, CurrencyRate, BASE_CURRENCY};
use crate::ports::LedgerStore;

#[derive(Clone)]
pub struct CurrencyService {
    store: Arc<dyn LedgerStore>,
}

impl CurrencyService {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// The owner's rate table against the base currency. Falls back to
    /// the global defaults per currency, so conversion never fails for
    /// lack of data.
    pub fn rates_for(&self, owner_id: &str) -> Result<HashMap<Currency, Decimal>> {
        let mut rates: HashMap<Currency, Decimal> = Currency::foreign()
            .into_iter()
            .map(|c| (c, c.default_rate()))
            .collect();
        rates.insert(BASE_CURRENCY, Decimal::ONE);

        for row in self.store.rates_for(owner_id)? {
            if row.rate > Decimal::ZERO {
                rates.insert(row.currency, row.rate);
            }
        }
        Ok(rates)
    }

    /// Seed default rate rows the first time an owner is seen
    pub fn ensure_seeded(&self, owner_id: &str) -> Result<()> {
        if !self.store.rates_for(owner_id)?.is_empty() {
            return Ok(());
        }
        for currency in Currency::foreign() {
            self.store
                .upsert_rate(&CurrencyRate::default_for(owner_id, currency))?;
        }
        Ok(())
    }

    pub fn set_rate(&self, owner_id: &str, currency: Currency, rate: Decimal) -> Result<()> {
        if rate <= Decimal::ZERO {
            return Err(Error::validation("rate must be positive"));
        }
        if currency == BASE_CURRENCY {
            return Err(Error::validation("the base currency rate is fixed at 1"));
        }
        self.store.upsert_rate(&CurrencyRate {
            owner_id: owner_id.to_string(),
            currency,
            rate,
            symbol: currency.symbol().to_string(),
        })
    }

    /// `amount * rate(from -> base) / rate(to -> base)`.
    ///
    /// Base-currency results are rounded to whole units; foreign results
    /// keep two decimal places.
    pub fn convert(
        &self,
        amount: Decimal,
        from: Currency,
        to: Currency,
        owner_id: &str,
    ) -> Result<Decimal> {
        if from == to {
            return Ok(amount);
        }
        let rates = self.rates_for(owner_id)?;
        let from_rate = rates.get(&from).copied().unwrap_or_else(|| from.default_rate());
        let to_rate = rates.get(&to).copied().unwrap_or_else(|| to.default_rate());
        let converted = amount * from_rate / to_rate;
        Ok(Self::round_for(converted, to))
    }

    pub fn to_base(&self, amount: Decimal, from: Currency, owner_id: &str) -> Result<Decimal> {
        self.convert(amount, from, BASE_CURRENCY, owner_id)
    }

    fn round_for(amount: Decimal, currency: Currency) -> Decimal {
        if currency == BASE_CURRENCY {
            amount.round_dp(0)
        } else {
            amount.round_dp(2)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryStore;

    fn service() -> CurrencyService {
        CurrencyService::new(Arc::new(InMemoryStore::with_seed_categories()))
    }

    #[test]
    fn test_convert_uses_defaults_for_unknown_owner() {
        let svc = service();
        let base = svc
            .to_base(Decimal::from(100), Currency::Usd, "nobody")
            .unwrap();
        assert_eq!(base, Decimal::from(1250000));
    }

    #[test]
    fn test_convert_round_trip_within_rounding() {
        let svc = service();
        let amount = Decimal::from(137);
        let base = svc.to_base(amount, Currency::Eur, "1").unwrap();
        let back = svc
            .convert(base, BASE_CURRENCY, Currency::Eur, "1")
            .unwrap();
        let diff = (back - amount).abs();
        assert!(diff < Decimal::new(1, 2), "diff too large: {diff}");
    }

    #[test]
    fn test_custom_rate_overrides_default() {
        let svc = service();
        svc.set_rate("1", Currency::Usd, Decimal::from(13000)).unwrap();
        let base = svc.to_base(Decimal::from(10), Currency::Usd, "1").unwrap();
        assert_eq!(base, Decimal::from(130000));
    }

    #[test]
    fn test_rate_validation() {
        let svc = service();
        assert!(svc.set_rate("1", Currency::Usd, Decimal::ZERO).is_err());
        assert!(svc.set_rate("1", BASE_CURRENCY, Decimal::ONE).is_err());
    }

    #[test]
    fn test_seeding_is_idempotent() {
        let svc = service();
        svc.ensure_seeded("9").unwrap();
        svc.set_rate("9", Currency::Usd, Decimal::from(12800)).unwrap();
        svc.ensure_seeded("9").unwrap();
        let rates = svc.rates_for("9").unwrap();
        assert_eq!(rates[&Currency::Usd], Decimal::from(12800));
    }
}
