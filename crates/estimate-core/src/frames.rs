use crate::calculations::tag_breakdown::{TagBreakdown, TagBreakdowns};
use crate::columns::{ColumnValue, LineItemColumn};
use crate::line_item::LineItem;
use crate::metadata::MarkupRates;
use polars::prelude::PlSmallStr;
use polars::prelude::*;

fn tag_label(item: &LineItem) -> String {
    item.tags
        .iter()
        .map(|tag| match tag.quantity {
            Some(quantity) => format!("{} ({})", tag.name, quantity),
            None => tag.name.clone(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Table view of `items` restricted to `columns`, with the id first and the
/// tag list last.
pub fn line_items_dataframe(
    items: &[&LineItem],
    columns: &[LineItemColumn],
) -> PolarsResult<DataFrame> {
    let mut frame_columns: Vec<Column> = Vec::with_capacity(columns.len() + 2);

    let ids: Vec<i32> = items.iter().map(|item| item.id).collect();
    frame_columns.push(Series::new(PlSmallStr::from_static("id"), ids).into_column());

    for column in columns {
        let name = PlSmallStr::from_static(column.key());
        let series = if column.is_text() {
            let values: Vec<&str> = items
                .iter()
                .map(|item| match column.value(item) {
                    ColumnValue::Text(text) => text,
                    ColumnValue::Number(_) => "",
                })
                .collect();
            Series::new(name, values)
        } else {
            let values: Vec<f64> = items
                .iter()
                .map(|item| match column.value(item) {
                    ColumnValue::Number(n) => n,
                    ColumnValue::Text(_) => 0.0,
                })
                .collect();
            Series::new(name, values)
        };
        frame_columns.push(series.into_column());
    }

    let tags: Vec<String> = items.iter().map(|item| tag_label(item)).collect();
    frame_columns.push(Series::new(PlSmallStr::from_static("tags"), tags).into_column());

    DataFrame::new(frame_columns)
}

/// One row per tag, including its share of markup and tax.
pub fn tag_breakdowns_dataframe(
    breakdowns: &TagBreakdowns,
    rates: &MarkupRates,
) -> PolarsResult<DataFrame> {
    let bids = breakdowns.with_markup(rates);
    let names: Vec<&str> = breakdowns.iter().map(|b| b.name.as_str()).collect();

    let f64_column = |name: &'static str, values: Vec<f64>| {
        Series::new(PlSmallStr::from_static(name), values).into_column()
    };

    DataFrame::new(vec![
        Series::new(PlSmallStr::from_static("tag"), names).into_column(),
        f64_column(
            "total_quantity",
            breakdowns.iter().map(|b| b.total_quantity).collect(),
        ),
        f64_column(
            "total_labor_cost",
            breakdowns.iter().map(|b| b.total_labor_cost).collect(),
        ),
        f64_column(
            "total_material_cost",
            breakdowns.iter().map(|b| b.total_material_cost).collect(),
        ),
        f64_column(
            "total_item_cost",
            breakdowns.iter().map(|b| b.total_item_cost).collect(),
        ),
        f64_column("overhead", bids.iter().map(|b| b.overhead).collect()),
        f64_column("labor_markup", bids.iter().map(|b| b.labor_markup).collect()),
        f64_column("sales_tax", bids.iter().map(|b| b.sales_tax).collect()),
        f64_column(
            "total_with_overhead_and_tax",
            bids.iter().map(|b| b.total_with_overhead_and_tax).collect(),
        ),
    ])
}

/// Per-item contributions of a single tag.
pub fn tag_contributions_dataframe(breakdown: &TagBreakdown) -> PolarsResult<DataFrame> {
    let rows = &breakdown.items;
    let descriptions: Vec<&str> = rows.iter().map(|row| row.description.as_str()).collect();
    DataFrame::new(vec![
        Series::new(PlSmallStr::from_static("description"), descriptions).into_column(),
        Series::new(
            PlSmallStr::from_static("quantity"),
            rows.iter().map(|row| row.quantity).collect::<Vec<f64>>(),
        )
        .into_column(),
        Series::new(
            PlSmallStr::from_static("labor_cost"),
            rows.iter().map(|row| row.labor_cost).collect::<Vec<f64>>(),
        )
        .into_column(),
        Series::new(
            PlSmallStr::from_static("material_cost"),
            rows.iter().map(|row| row.material_cost).collect::<Vec<f64>>(),
        )
        .into_column(),
        Series::new(
            PlSmallStr::from_static("item_cost"),
            rows.iter().map(|row| row.item_cost).collect::<Vec<f64>>(),
        )
        .into_column(),
    ])
}
