use estimate_tool::{ItemCosts, LineItem, calculations::item_cost};

fn assert_close(actual: f64, expected: f64) {
    let tolerance = 1e-9 * expected.abs().max(1.0);
    assert!(
        (actual - expected).abs() <= tolerance,
        "expected {expected}, got {actual}"
    );
}

#[test]
fn prices_item_with_wastage() {
    let costs = item_cost::compute(40.0, 0.1, 4.0, 3.1);
    assert_close(costs.quantity_with_wastage, 44.0);
    assert_close(costs.total_labor_cost, 176.0);
    assert_close(costs.total_material_cost, 136.4);
    assert_close(costs.item_cost, 312.4);
}

#[test]
fn item_cost_is_labor_plus_material() {
    let samples = [
        (1.0, 0.0, 0.0, 0.0),
        (3.5, 0.25, 12.75, 9.99),
        (1250.0, 0.05, 0.33, 1.7),
        (370.0, 0.0, 2.0, 5.0),
    ];
    for (quantity, wastage, labor, material) in samples {
        let costs = item_cost::compute(quantity, wastage, labor, material);
        assert_eq!(costs.item_cost, costs.total_labor_cost + costs.total_material_cost);
        assert_close(costs.total_labor_cost, quantity * (1.0 + wastage) * labor);
        assert_close(costs.total_material_cost, quantity * (1.0 + wastage) * material);
    }
}

#[test]
fn recalculating_twice_is_idempotent() {
    let mut item = LineItem::priced(1, "Copper pipe", 40.0, 0.1, "FT", 4.0, 3.1);
    let first = item.costs();
    item.recalculate();
    item.recalculate();
    assert_eq!(item.costs(), first);
}

#[test]
fn negative_wastage_reduces_quantity() {
    let costs = item_cost::compute(100.0, -0.1, 1.0, 1.0);
    assert_close(costs.quantity_with_wastage, 90.0);
    assert_close(costs.item_cost, 180.0);
}

#[test]
fn new_item_has_zero_costs() {
    let item = LineItem::new(7, "New Line Item");
    assert_eq!(item.unit, "EA");
    assert_eq!(item.costs(), ItemCosts::default());
    assert!(item.tags.is_empty());
}

#[test]
fn derived_fields_are_optional_in_json() {
    let json = r#"{
        "id": 3,
        "description": "PVC",
        "quantity": 200,
        "wastage": 0.05,
        "unit": "FT",
        "unit_labor_cost": 1.5,
        "unit_material_cost": 0.8,
        "tags": [{"name": "PVC"}, {"name": "Plumbing", "quantity": 50}]
    }"#;
    let mut item: LineItem = serde_json::from_str(json).unwrap();
    assert_eq!(item.item_cost, 0.0);
    item.recalculate();
    assert_close(item.quantity_with_wastage, 210.0);
    assert_close(item.item_cost, 210.0 * 1.5 + 210.0 * 0.8);
    assert_eq!(item.tags[1].quantity, Some(50.0));
}
