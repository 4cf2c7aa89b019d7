use estimate_tool::calculations::bid_rollup;
use estimate_tool::{BidAdjustments, BidInputs, Estimate, LineItem, MarkupRates};

fn assert_close(actual: f64, expected: f64) {
    let tolerance = 1e-9 * expected.abs().max(1.0);
    assert!(
        (actual - expected).abs() <= tolerance,
        "expected {expected}, got {actual}"
    );
}

fn sample_adjustments() -> BidAdjustments {
    BidAdjustments {
        permit: 3550.0,
        equip_rental: 4730.0,
        labeling: 1500.0,
        material_markup: 0.0,
    }
}

#[test]
fn rolls_up_reference_bid() {
    let inputs = BidInputs::new(75743.0, 149257.0, &sample_adjustments());
    let rollup = bid_rollup::compute(&inputs, &MarkupRates::new(45.0, 45.0, 8.0));

    assert_close(rollup.subtotal, 159037.0);
    assert_close(rollup.tax, 12722.96);
    assert_close(rollup.overhead_markup, 34084.35);
    assert_close(rollup.labor_markup, 34084.35);
    assert_close(rollup.total_material_cost, 171759.96);
    assert_close(rollup.total_labor_cost, 143911.70);
    assert_close(rollup.total_bid, 315671.66);
    assert_close(rollup.total_profit, 68168.7);
    assert_close(rollup.profit_margin, 68168.7 / 315671.66);
}

#[test]
fn material_markup_counts_toward_profit_only() {
    let mut adjustments = sample_adjustments();
    adjustments.material_markup = 1000.0;
    let inputs = BidInputs::new(75743.0, 149257.0, &adjustments);
    let rollup = bid_rollup::compute(&inputs, &MarkupRates::default());
    assert_close(rollup.total_bid, 315671.66);
    assert_close(rollup.total_profit, 69168.7);
}

#[test]
fn zero_bid_has_zero_margin() {
    let rollup = bid_rollup::compute(&BidInputs::default(), &MarkupRates::default());
    assert_eq!(rollup.total_bid, 0.0);
    assert_eq!(rollup.profit_margin, 0.0);
}

#[test]
fn estimate_feeds_item_totals_into_rollup() {
    let mut estimate = Estimate::new();
    estimate
        .upsert_item(LineItem::priced(1, "Crew", 1.0, 0.0, "LS", 75743.0, 0.0))
        .unwrap();
    estimate
        .upsert_item(LineItem::priced(2, "Material", 1.0, 0.0, "LS", 0.0, 149257.0))
        .unwrap();
    estimate.set_adjustments(sample_adjustments());

    let rollup = estimate.bid_rollup();
    assert_close(rollup.total_bid, 315671.66);
    assert_eq!(estimate.summary().rollup, rollup);
}

#[test]
fn industry_average_rates_change_markup() {
    let inputs = BidInputs::new(1000.0, 1000.0, &BidAdjustments::default());
    let rollup = bid_rollup::compute(&inputs, &MarkupRates::industry_average());
    assert_close(rollup.overhead_markup, 420.0);
    assert_close(rollup.labor_markup, 400.0);
    assert_close(rollup.tax, 75.0);
    assert_close(rollup.total_bid, 2895.0);
}
