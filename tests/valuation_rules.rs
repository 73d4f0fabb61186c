mod support;

use stashboard::market_data::{PriceMap, PriceRecord};
use stashboard::models::{HoldingKind, NewHolding};
use stashboard::portfolio::{
    calculate_holdings, portfolio_total, value_holding, PriceStatus,
    OTHER_PLACEHOLDER_UNIT_VALUE,
};
use support::holding;

fn prices(entries: &[(&str, f64)]) -> PriceMap {
    entries
        .iter()
        .map(|(id, price)| (id.to_string(), PriceRecord::new(*price)))
        .collect()
}

const QUANTITIES: [f64; 6] = [0.0, 0.001, 1.0, 2.5, 17.0, 12345.678];

#[test]
fn priced_kinds_are_quantity_times_price() {
    let map = prices(&[("bitcoin", 64321.5), ("AAPL", 189.87), ("XAU", 2331.1)]);
    for kind_id in [
        (HoldingKind::Crypto, "bitcoin"),
        (HoldingKind::Equity, "AAPL"),
        (HoldingKind::Commodity, "XAU"),
    ] {
        for quantity in QUANTITIES {
            let h = holding(kind_id.0, kind_id.1, quantity);
            let price = map[kind_id.1].price;
            let v = value_holding(&h, &map);
            assert_eq!(v.unit_price, Some(price));
            assert_eq!(v.total_value, Some(quantity * price));
        }
    }
}

#[test]
fn priced_kinds_without_a_price_have_no_value() {
    let map = prices(&[("bitcoin", 1.0)]);
    for quantity in QUANTITIES {
        let h = holding(HoldingKind::Equity, "MSFT", quantity);
        let v = value_holding(&h, &map);
        assert_eq!(v.unit_price, None);
        assert_eq!(v.total_value, None);
    }
}

#[test]
fn other_without_purchase_value_uses_placeholder() {
    for quantity in QUANTITIES {
        let h = holding(HoldingKind::Other, "misc", quantity);
        let v = value_holding(&h, &PriceMap::new());
        assert_eq!(v.total_value, Some(quantity * OTHER_PLACEHOLDER_UNIT_VALUE));
        if quantity > 0.0 {
            assert_eq!(v.unit_price, Some(OTHER_PLACEHOLDER_UNIT_VALUE));
        } else {
            assert_eq!(v.unit_price, None);
        }
    }
}

#[test]
fn real_estate_uses_manual_value() {
    let house = NewHolding::new(HoldingKind::RealEstate, "House")
        .with_quantity(1.0)
        .with_manual_value(450000.0)
        .into_holding()
        .unwrap();
    let v = value_holding(&house, &PriceMap::new());
    assert_eq!(v.total_value, Some(450000.0));
    assert_eq!(v.unit_price, Some(450000.0));

    let unvalued = NewHolding::new(HoldingKind::RealEstate, "Lot")
        .with_quantity(1.0)
        .into_holding()
        .unwrap();
    assert_eq!(value_holding(&unvalued, &PriceMap::new()).total_value, None);
}

#[test]
fn price_map_ids_match_normalized_symbols() {
    let h = NewHolding::new(HoldingKind::Equity, "Apple")
        .with_id(" aapl ")
        .with_quantity(2.0)
        .into_holding()
        .unwrap();
    let v = value_holding(&h, &prices(&[("AAPL", 100.0)]));
    assert_eq!(v.total_value, Some(200.0));
}

#[test]
fn mixed_portfolio_total_skips_unvalued_holdings() {
    let holdings = vec![
        holding(HoldingKind::Crypto, "bitcoin", 2.0),
        holding(HoldingKind::Commodity, "XPT", 3.0),
        holding(HoldingKind::Other, "misc", 4.0),
    ];
    let calculated = calculate_holdings(
        &holdings,
        &prices(&[("bitcoin", 50000.0)]),
        PriceStatus::Priced,
    );

    assert_eq!(calculated[0].status, PriceStatus::Priced);
    assert_eq!(calculated[1].status, PriceStatus::Unavailable);
    assert_eq!(calculated[2].status, PriceStatus::Priced);
    assert_eq!(portfolio_total(&calculated), 100200.0);
}

#[test]
fn error_panel_marks_only_fetchable_kinds() {
    let holdings = vec![
        holding(HoldingKind::Crypto, "bitcoin", 2.0),
        holding(HoldingKind::Other, "misc", 1.0),
    ];
    let calculated = calculate_holdings(&holdings, &PriceMap::new(), PriceStatus::Error);

    assert_eq!(calculated[0].status, PriceStatus::Error);
    assert_eq!(calculated[0].total_value, None);
    assert_eq!(calculated[1].status, PriceStatus::Priced);
    assert_eq!(portfolio_total(&calculated), 50.0);
}
