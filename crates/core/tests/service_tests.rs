// ═══════════════════════════════════════════════════════════════════
// Service Tests — ValuationService (costs and profits) and
// StatementService (filtering, ordering, totals, expiring list)
// ═══════════════════════════════════════════════════════════════════

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;

use deposit_tracker_core::errors::CoreError;
use deposit_tracker_core::models::deposit::{Completion, Deposit};
use deposit_tracker_core::models::rate::RatePair;
use deposit_tracker_core::services::accrual_service::AccrualService;
use deposit_tracker_core::services::rate_archive::RateLookup;
use deposit_tracker_core::services::statement_service::StatementService;
use deposit_tracker_core::services::valuation_service::ValuationService;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

// ═══════════════════════════════════════════════════════════════════
// Mock Lookup
// ═══════════════════════════════════════════════════════════════════

/// Exact-date rates only; RUB is the local currency.
struct FixedRates {
    rates: HashMap<(String, NaiveDate), RatePair>,
}

impl FixedRates {
    fn new() -> Self {
        Self {
            rates: HashMap::new(),
        }
    }

    fn with(mut self, currency: &str, on: NaiveDate, sell: Decimal, buy: Decimal) -> Self {
        self.rates
            .insert((currency.to_string(), on), RatePair::new(sell, buy));
        self
    }
}

impl RateLookup for FixedRates {
    fn get_approx(&self, currency: &str, on: NaiveDate) -> Result<Option<RatePair>, CoreError> {
        if currency == "RUB" {
            return Ok(Some(RatePair::ONE));
        }
        Ok(self.rates.get(&(currency.to_string(), on)).copied())
    }
}

fn usd_rates() -> FixedRates {
    FixedRates::new()
        .with("USD", date(2011, 1, 11), dec!(30.5), dec!(30))
        .with("USD", date(2011, 6, 6), dec!(28.5), dec!(28))
}

fn usd_from_rub() -> Deposit {
    let mut d = Deposit::new("ROST", date(2011, 1, 11), "USD", dec!(1000));
    d.source_currency = Some("RUB".into());
    d
}

fn local(bank: &str, open: NaiveDate, amount: Decimal) -> Deposit {
    Deposit::new(bank, open, "RUB", amount)
}

// ═══════════════════════════════════════════════════════════════════
// Valuation — local currency
// ═══════════════════════════════════════════════════════════════════

mod valuation_local {
    use super::*;

    #[test]
    fn past_cost_is_amount() {
        let service = ValuationService::new("RUB");
        let d = local("MKB", date(2011, 1, 1), dec!(100000));
        let cost = service.past_cost(&FixedRates::new(), &d, date(2011, 3, 1)).unwrap();
        assert_eq!(cost, Some(dec!(100000)));
    }

    #[test]
    fn stated_source_amount_overrides_amount() {
        let service = ValuationService::new("RUB");
        let mut d = local("MKB", date(2011, 1, 1), dec!(100000));
        d.source_amount = Some(dec!(99000));
        let cost = service.past_cost(&FixedRates::new(), &d, date(2011, 3, 1)).unwrap();
        assert_eq!(cost, Some(dec!(99000)));
    }

    #[test]
    fn completions_received_are_added() {
        let service = ValuationService::new("RUB");
        let mut d = local("MKB", date(2011, 1, 1), dec!(100000));
        d.completions = vec![
            Completion {
                date: date(2011, 2, 1),
                amount: dec!(5000),
                source_amount: None,
            },
            Completion {
                date: date(2011, 4, 1),
                amount: dec!(7000),
                source_amount: None,
            },
        ];
        let cost = service.past_cost(&FixedRates::new(), &d, date(2011, 3, 1)).unwrap();
        assert_eq!(cost, Some(dec!(105000)));
    }

    #[test]
    fn full_valuation() {
        let service = ValuationService::new("RUB");
        let open = date(2011, 1, 1);
        let mut d = local("MKB", open, dec!(100000));
        d.interest = Some(dec!(10));
        let on = date(2011, 3, 15);

        let v = service.value(&FixedRates::new(), &d, on).unwrap();
        let current = AccrualService::new().current_amount(&d, on).unwrap();

        assert_eq!(v.valuation_date, on);
        assert_eq!(v.cost, dec!(100000));
        assert_eq!(v.current_amount, current);
        assert_eq!(v.current_cost, Some(current));
        assert_eq!(v.past_cost, Some(dec!(100000)));
        assert_eq!(v.rate_profit, None);
        assert_eq!(v.pure_profit, Some(current - dec!(100000)));

        // Annualized back to the nominal interest.
        let percent = v.pure_profit_percent.unwrap();
        assert!((percent - dec!(10)).abs() < dec!(0.000001), "{percent}");
    }
}

// ═══════════════════════════════════════════════════════════════════
// Valuation — foreign currencies
// ═══════════════════════════════════════════════════════════════════

mod valuation_foreign {
    use super::*;

    #[test]
    fn bought_with_local_currency_uses_sell_rate() {
        let service = ValuationService::new("RUB");
        let v = service.value(&usd_rates(), &usd_from_rub(), date(2011, 6, 6)).unwrap();

        assert_eq!(v.past_cost, Some(dec!(30500)));
        assert_eq!(v.current_cost, Some(dec!(28000)));
        assert_eq!(v.rate_profit, Some(dec!(-2500)));
        assert_eq!(v.pure_profit, Some(dec!(-2500)));
    }

    #[test]
    fn stated_source_amount_skips_rate_lookup() {
        let service = ValuationService::new("RUB");
        let mut d = usd_from_rub();
        d.source_amount = Some(dec!(30200));
        let cost = service.past_cost(&FixedRates::new(), &d, date(2011, 6, 6)).unwrap();
        assert_eq!(cost, Some(dec!(30200)));
    }

    #[test]
    fn completions_add_their_local_cost() {
        let service = ValuationService::new("RUB");
        let mut d = usd_from_rub();
        d.close_date = Some(date(2011, 12, 1));
        d.completions = vec![
            Completion {
                date: date(2011, 2, 1),
                amount: dec!(100),
                source_amount: Some(dec!(3010)),
            },
            Completion {
                date: date(2011, 3, 1),
                amount: dec!(200),
                source_amount: Some(dec!(5900)),
            },
        ];

        let v = service.value(&usd_rates(), &d, date(2011, 6, 6)).unwrap();
        assert_eq!(v.past_cost, Some(dec!(30500) + dec!(3010) + dec!(5900)));
        assert_eq!(v.cost, dec!(1300));
        assert_eq!(v.rate_profit, Some(dec!(28) * dec!(1300) - dec!(39410)));
    }

    #[test]
    fn completions_without_local_cost_count_at_face_value() {
        let service = ValuationService::new("RUB");
        let mut d = usd_from_rub();
        d.completions = vec![
            Completion {
                date: date(2011, 2, 1),
                amount: dec!(3000),
                source_amount: None,
            },
            Completion {
                date: date(2011, 3, 1),
                amount: dec!(4000),
                source_amount: None,
            },
        ];

        let cost = service.past_cost(&usd_rates(), &d, date(2011, 6, 6)).unwrap();
        assert_eq!(cost, Some(dec!(30500) + dec!(3000) + dec!(4000)));
    }

    #[test]
    fn completion_after_valuation_date_is_ignored() {
        let service = ValuationService::new("RUB");
        let mut d = usd_from_rub();
        d.completions = vec![Completion {
            date: date(2011, 7, 1),
            amount: dec!(100),
            source_amount: None,
        }];
        let cost = service.past_cost(&usd_rates(), &d, date(2011, 6, 6)).unwrap();
        assert_eq!(cost, Some(dec!(30500)));
    }

    #[test]
    fn held_without_conversion_uses_buy_rate() {
        let service = ValuationService::new("RUB");
        let d = Deposit::new("Citi", date(2011, 1, 11), "USD", dec!(1000));
        let cost = service.past_cost(&usd_rates(), &d, date(2011, 6, 6)).unwrap();
        assert_eq!(cost, Some(dec!(30000)));
    }

    #[test]
    fn completions_without_conversion_are_unsupported() {
        let service = ValuationService::new("RUB");
        let mut d = Deposit::new("Citi", date(2011, 1, 11), "USD", dec!(1000));
        d.completions = vec![Completion {
            date: date(2011, 2, 1),
            amount: dec!(100),
            source_amount: Some(dec!(3000)),
        }];
        assert!(service.past_cost(&usd_rates(), &d, date(2011, 6, 6)).is_err());
    }

    #[test]
    fn cross_currency_is_unsupported() {
        let service = ValuationService::new("RUB");
        let mut d = usd_from_rub();
        d.source_currency = Some("EUR".into());
        let err = service.value(&usd_rates(), &d, date(2011, 6, 6)).unwrap_err();
        assert!(matches!(err, CoreError::UnsupportedConversion { .. }));
    }
}

// ═══════════════════════════════════════════════════════════════════
// Valuation — rate gaps and the profit percentage
// ═══════════════════════════════════════════════════════════════════

mod valuation_gaps {
    use super::*;

    #[test]
    fn missing_opening_rate_omits_dependent_figures() {
        let service = ValuationService::new("RUB");
        let rates = FixedRates::new().with("USD", date(2011, 6, 6), dec!(28.5), dec!(28));
        let v = service.value(&rates, &usd_from_rub(), date(2011, 6, 6)).unwrap();

        assert_eq!(v.past_cost, None);
        assert_eq!(v.rate_profit, None);
        assert_eq!(v.pure_profit, None);
        assert_eq!(v.pure_profit_percent, None);
        assert_eq!(v.current_cost, Some(dec!(28000)));
    }

    #[test]
    fn missing_current_rate_omits_dependent_figures() {
        let service = ValuationService::new("RUB");
        let rates = FixedRates::new().with("USD", date(2011, 1, 11), dec!(30.5), dec!(30));
        let v = service.value(&rates, &usd_from_rub(), date(2011, 6, 6)).unwrap();

        assert_eq!(v.past_cost, Some(dec!(30500)));
        assert_eq!(v.current_cost, None);
        assert_eq!(v.rate_profit, None);
        assert_eq!(v.pure_profit, None);
        assert!(!v.fields().contains_key("current_cost"));
    }

    #[test]
    fn percent_is_annualized() {
        let percent = ValuationService::pure_profit_percent(
            dec!(1000),
            dec!(100000),
            date(2011, 1, 1),
            date(2011, 3, 15),
        );
        assert!((percent - dec!(5)).abs() < dec!(0.000001), "{percent}");
    }

    #[test]
    fn percent_is_zero_for_zero_cost() {
        let percent = ValuationService::pure_profit_percent(
            dec!(1000),
            dec!(0),
            date(2011, 1, 1),
            date(2011, 3, 15),
        );
        assert_eq!(percent, Decimal::ZERO);
    }

    #[test]
    fn percent_is_zero_on_open_date() {
        let percent = ValuationService::pure_profit_percent(
            dec!(1000),
            dec!(100000),
            date(2011, 1, 1),
            date(2011, 1, 1),
        );
        assert_eq!(percent, Decimal::ZERO);

        let service = ValuationService::new("RUB");
        let v = service
            .value(&usd_rates(), &usd_from_rub(), date(2011, 1, 11))
            .unwrap();
        assert_eq!(v.pure_profit_percent, Some(Decimal::ZERO));
    }
}

// ═══════════════════════════════════════════════════════════════════
// Statement
// ═══════════════════════════════════════════════════════════════════

mod statement {
    use super::*;

    fn deposits() -> Vec<Deposit> {
        let mut short = local("Alfa", date(2011, 1, 1), dec!(1000));
        short.close_date = Some(date(2011, 3, 1));

        let mut long = local("Zenit", date(2011, 1, 1), dec!(2000));
        long.close_date = Some(date(2012, 1, 1));

        let open_ended = local("Sberbank", date(2010, 6, 1), dec!(3000));

        let mut closed = local("Bin", date(2011, 1, 1), dec!(4000));
        closed.close_date = Some(date(2011, 12, 1));
        closed.closed = true;

        let mut future = local("Future", date(2011, 9, 1), dec!(5000));
        future.close_date = Some(date(2012, 9, 1));

        let mut same_close = local("Avangard", date(2011, 1, 1), dec!(6000));
        same_close.close_date = Some(date(2012, 1, 1));

        vec![short, long, open_ended, closed, future, same_close]
    }

    fn banks(statement: &deposit_tracker_core::models::statement::Statement) -> Vec<&str> {
        statement.rows.iter().map(|r| r.deposit.bank.as_str()).collect()
    }

    #[test]
    fn ordering_and_filtering() {
        let service = StatementService::new("RUB");
        let statement = service
            .build(&FixedRates::new(), &deposits(), date(2011, 6, 6), false)
            .unwrap();

        assert_eq!(statement.date, date(2011, 6, 6));
        assert_eq!(banks(&statement), vec!["Sberbank", "Avangard", "Zenit", "Alfa"]);
    }

    #[test]
    fn show_all_includes_closed() {
        let service = StatementService::new("RUB");
        let statement = service
            .build(&FixedRates::new(), &deposits(), date(2011, 6, 6), true)
            .unwrap();

        assert_eq!(
            banks(&statement),
            vec!["Sberbank", "Avangard", "Zenit", "Bin", "Alfa"]
        );
    }

    #[test]
    fn expired_deposit_is_valued_at_close_date() {
        let service = StatementService::new("RUB");
        let statement = service
            .build(&FixedRates::new(), &deposits(), date(2011, 6, 6), false)
            .unwrap();

        let alfa = statement.rows.iter().find(|r| r.deposit.bank == "Alfa").unwrap();
        assert!(alfa.expired);
        assert_eq!(alfa.valuation.valuation_date, date(2011, 3, 1));

        let zenit = statement.rows.iter().find(|r| r.deposit.bank == "Zenit").unwrap();
        assert!(!zenit.expired);
        assert_eq!(zenit.valuation.valuation_date, date(2011, 6, 6));
    }

    #[test]
    fn totals_skip_closed_deposits() {
        let service = StatementService::new("RUB");
        let statement = service
            .build(&FixedRates::new(), &deposits(), date(2011, 6, 6), true)
            .unwrap();

        // No interest: current cost equals the amount of every shown deposit but "Bin".
        assert_eq!(statement.total_current_cost, dec!(12000));
        assert_eq!(statement.total_pure_profit, Decimal::ZERO);
    }

    #[test]
    fn totals_tolerate_rate_gaps() {
        let service = StatementService::new("RUB");
        let mut list = deposits();
        list.push(usd_from_rub());

        let statement = service
            .build(&FixedRates::new(), &list, date(2011, 6, 6), false)
            .unwrap();

        let rost = statement.rows.iter().find(|r| r.deposit.bank == "ROST").unwrap();
        assert_eq!(rost.valuation.current_cost, None);
        assert_eq!(statement.total_current_cost, dec!(12000));
    }

    #[test]
    fn unsupported_deposit_aborts_the_statement() {
        let service = StatementService::new("RUB");
        let mut list = deposits();
        let mut cross = usd_from_rub();
        cross.source_currency = Some("EUR".into());
        list.push(cross);

        assert!(service
            .build(&usd_rates(), &list, date(2011, 6, 6), false)
            .is_err());
    }

    #[test]
    fn expiring_soonest_first() {
        let service = StatementService::new("RUB");
        let list = deposits();

        let expiring = service.expiring(&list, date(2011, 11, 20), 45);
        let banks: Vec<&str> = expiring.iter().map(|d| d.bank.as_str()).collect();

        // "Bin" is closed; "Future" and the open-ended deposit don't expire in time.
        assert_eq!(banks, vec!["Alfa", "Zenit", "Avangard"]);
    }

    #[test]
    fn nothing_expiring() {
        let service = StatementService::new("RUB");
        assert!(service.expiring(&deposits(), date(2011, 1, 15), 30).is_empty());
    }

    #[test]
    fn window_past_calendar_end_covers_every_dated_deposit() {
        let service = StatementService::new("RUB");
        let list = deposits();

        let expiring = service.expiring(&list, date(2011, 1, 15), u64::MAX);
        let banks: Vec<&str> = expiring.iter().map(|d| d.bank.as_str()).collect();
        assert_eq!(banks, vec!["Alfa", "Zenit", "Avangard", "Future"]);

        let expiring = service.expiring(&list, date(2011, 1, 15), u64::from(u32::MAX));
        assert_eq!(expiring.len(), 4);
    }
}
