use estimate_tool::columns::visible_columns;
use estimate_tool::frames::{
    line_items_dataframe, tag_breakdowns_dataframe, tag_contributions_dataframe,
};
use estimate_tool::{Estimate, LineItem, LineItemColumn, Tag};

fn sample_estimate() -> Estimate {
    let mut estimate = Estimate::new();
    estimate
        .upsert_item(
            LineItem::priced(1, "Copper pipe", 40.0, 0.1, "FT", 4.0, 3.1)
                .with_tags(vec![Tag::with_quantity("Copper", 40.0), Tag::new("Plumbing")]),
        )
        .unwrap();
    estimate
        .upsert_item(
            LineItem::priced(2, "PVC drain", 200.0, 0.0, "FT", 1.5, 0.8)
                .with_tags(vec![Tag::new("Plumbing")]),
        )
        .unwrap();
    estimate
}

#[test]
fn line_item_frame_follows_visible_columns() {
    let mut estimate = sample_estimate();
    estimate.toggle_column(LineItemColumn::Wastage);
    estimate.toggle_column(LineItemColumn::Unit);
    let columns = visible_columns(estimate.columns());
    let items: Vec<&LineItem> = estimate.items().iter().collect();

    let df = line_items_dataframe(&items, &columns).unwrap();
    assert_eq!(df.height(), 2);
    let names: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect();
    assert_eq!(names.first().map(String::as_str), Some("id"));
    assert_eq!(names.last().map(String::as_str), Some("tags"));
    assert!(!names.contains(&"wastage".to_string()));
    assert!(!names.contains(&"unit".to_string()));
    assert!(names.contains(&"item_cost".to_string()));

    let tags = df.column("tags").unwrap().str().unwrap();
    assert_eq!(tags.get(0), Some("Copper (40), Plumbing"));
    let cost = df.column("item_cost").unwrap().f64().unwrap();
    assert!((cost.get(0).unwrap() - 312.4).abs() < 1e-9);
}

#[test]
fn breakdown_frame_has_one_row_per_tag() {
    let estimate = sample_estimate();
    let df = tag_breakdowns_dataframe(&estimate.tag_breakdowns(), estimate.rates()).unwrap();
    assert_eq!(df.height(), 2);
    assert_eq!(df.width(), 9);
    let tags = df.column("tag").unwrap().str().unwrap();
    assert_eq!(tags.get(0), Some("Copper"));
    assert_eq!(tags.get(1), Some("Plumbing"));
}

#[test]
fn contribution_frame_lists_tagged_items() {
    let estimate = sample_estimate();
    let breakdowns = estimate.tag_breakdowns();
    let plumbing = breakdowns.get("Plumbing").unwrap();
    let df = tag_contributions_dataframe(plumbing).unwrap();
    assert_eq!(df.height(), 2);
    let quantity = df.column("quantity").unwrap().f64().unwrap();
    assert_eq!(quantity.get(1), Some(200.0));
}
