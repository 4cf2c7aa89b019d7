use chrono::NaiveDate;
use estimate_tool::columns::{LineItemColumn, SortDirection, visible_columns};
use estimate_tool::format::{format_currency, format_percentage, format_wastage};
use estimate_tool::frames::{
    line_items_dataframe, tag_breakdowns_dataframe, tag_contributions_dataframe,
};
use estimate_tool::{
    BidAdjustments, Estimate, FieldValue, LineItem, LineItemField, MarkupRates, PersistenceError,
    Tag, load_estimate_from_csv, load_estimate_from_json, load_rates_from_json,
    parse_line_items_csv, save_estimate_to_csv, save_estimate_to_json,
};
use polars::prelude::{AnyValue, DataFrame};
use std::fs::File;
use std::io::{self, Write};
use tracing_subscriber::EnvFilter;

fn cell_text(column: &str, value: &AnyValue) -> String {
    match value {
        AnyValue::Null => String::new(),
        AnyValue::Int32(v) => v.to_string(),
        AnyValue::Int64(v) => v.to_string(),
        AnyValue::Float64(v) if column == "wastage" => format_wastage(*v),
        AnyValue::Float64(v) => match LineItemColumn::from_key(column) {
            Some(key) if key.is_currency() => format_currency(*v),
            _ => format!("{v:.2}"),
        },
        AnyValue::String(s) => s.to_string(),
        other => other.to_string(),
    }
}

fn render_df_as_text_table(df: &DataFrame) -> String {
    let columns = df.get_columns();
    let col_names: Vec<String> = columns.iter().map(|c| c.name().to_string()).collect();

    let mut cells: Vec<Vec<String>> = Vec::with_capacity(df.height());
    for row_idx in 0..df.height() {
        let row = columns
            .iter()
            .map(|col| {
                col.get(row_idx)
                    .map(|av| cell_text(col.name(), &av))
                    .unwrap_or_default()
            })
            .collect::<Vec<_>>();
        cells.push(row);
    }

    let mut widths: Vec<usize> = col_names.iter().map(|n| n.len()).collect();
    for row in &cells {
        for (ci, cell) in row.iter().enumerate() {
            widths[ci] = widths[ci].max(cell.len());
        }
    }

    let mut sep = String::from("+");
    for w in &widths {
        sep.push_str(&"-".repeat(*w + 2));
        sep.push('+');
    }

    let push_row = |out: &mut String, values: &[String]| {
        out.push('|');
        for (ci, value) in values.iter().enumerate() {
            out.push(' ');
            out.push_str(value);
            out.push_str(&" ".repeat(widths[ci].saturating_sub(value.len())));
            out.push_str(" |");
        }
        out.push('\n');
    };

    let mut out = String::new();
    out.push_str(&sep);
    out.push('\n');
    push_row(&mut out, &col_names);
    out.push_str(&sep);
    out.push('\n');
    for row in &cells {
        push_row(&mut out, row);
    }
    out.push_str(&sep);
    out.push('\n');
    out
}

fn print_help() {
    println!(
        "Commands:\n  help                               Show this help\n  show                               Show line items and totals\n  new                                Append a blank line item\n  add <id> <qty> <wastage> <unit> <labor> <material> <description...>\n                                     Upsert a priced line item (wastage %, tags kept)\n  set <id> <field> <value...>        Edit description|qty|wastage(%)|unit|labor|material\n  delete <id>                        Delete a line item\n  tag add <id> <name> [qty]          Attach a tag, optionally with its own quantity\n  tag set <id> <index> <name> [qty]  Replace the tag at index\n  tag rm <id> <name>                 Remove every tag with that name\n  tag list [term]                    List distinct tag names\n  breakdown [tag]                    Per-tag cost breakdown, or one tag's items\n  bid                                Show the bid rollup\n  rates show                         Show markup and tax rates\n  rates set <overhead> <labor> <tax> Set rates in percent\n  rates avg                          Use industry average rates\n  rates load <json_path>             Load rates from JSON\n  adj <permit> <equip> <labeling> <material_markup>\n                                     Set project add-ons\n  columns show                       Show column visibility\n  columns toggle <key>               Toggle a column\n  filter [text...] [#tag...]         Filter rows by description and tags\n  sort <column> [asc|desc]           Sort rows by a column\n  meta show                          Show project metadata\n  meta name|desc|estimator <text...> Update project metadata\n  meta date <YYYY-MM-DD>             Update plan date\n  summary                            Recompute every figure\n  save <json|csv> <path>             Persist estimate to disk\n  load <json|csv> <path>             Load estimate from disk\n  import <csv_path>                  Append line items from CSV (ids must be new)\n  quit|exit                          Exit"
    );
}

fn render_items(estimate: &Estimate, items: &[&LineItem]) -> String {
    let columns = visible_columns(estimate.columns());
    match line_items_dataframe(items, &columns) {
        Ok(df) => render_df_as_text_table(&df),
        Err(e) => format!("Error rendering items: {e}"),
    }
}

fn show(estimate: &Estimate) {
    let items: Vec<&LineItem> = estimate.items().iter().collect();
    println!("{}", render_items(estimate, &items));
    let totals = estimate.totals();
    println!(
        "Totals: labor {}, material {}, cost {}",
        format_currency(totals.total_labor_cost),
        format_currency(totals.total_material_cost),
        format_currency(totals.total_cost)
    );
}

fn print_metadata(estimate: &Estimate) {
    let metadata = estimate.metadata();
    println!("Project name       : {}", metadata.project_name);
    println!("Project description: {}", metadata.project_description);
    println!("Plan date          : {}", metadata.plan_date);
    println!("Estimator          : {}", metadata.estimator_name);
}

fn print_rates(rates: &MarkupRates) {
    println!("Overhead markup    : {}%", rates.overhead_markup_percentage);
    println!("Labor markup       : {}%", rates.labor_markup_percentage);
    println!("Sales tax          : {}%", rates.sales_tax_percentage);
}

fn print_bid(estimate: &Estimate) {
    let rollup = estimate.bid_rollup();
    println!("Subtotal           : {}", format_currency(rollup.subtotal));
    println!("Sales tax          : {}", format_currency(rollup.tax));
    println!("Overhead markup    : {}", format_currency(rollup.overhead_markup));
    println!("Labor markup       : {}", format_currency(rollup.labor_markup));
    println!("Total material     : {}", format_currency(rollup.total_material_cost));
    println!("Total labor        : {}", format_currency(rollup.total_labor_cost));
    println!("Total bid          : {}", format_currency(rollup.total_bid));
    println!("Total profit       : {}", format_currency(rollup.total_profit));
    println!("Profit margin      : {}", format_percentage(rollup.profit_margin));
}

fn print_columns(estimate: &Estimate) {
    for config in estimate.columns() {
        let marker = if config.visible { "x" } else { " " };
        println!("  [{}] {:<22} {}", marker, config.key.key(), config.label);
    }
}

fn print_summary(estimate: &Estimate) {
    let summary = estimate.summary();
    println!("Summary ({})", summary.to_cli_summary());
    for warning in &summary.warnings {
        println!("  warning: {}", warning);
    }
}

fn parse_tag(name: &str, qty: Option<&str>) -> Result<Tag, String> {
    match qty {
        Some(q) => q
            .parse::<f64>()
            .map(|quantity| Tag::with_quantity(name, quantity))
            .map_err(|_| format!("Invalid tag quantity '{q}'")),
        None => Ok(Tag::new(name)),
    }
}

fn parse_f64_args(args: &[&str]) -> Option<Vec<f64>> {
    args.iter().map(|s| s.parse::<f64>().ok()).collect()
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let mut estimate = Estimate::new();

    println!("Estimate Tool (CLI) - type 'help' for commands\n");
    show(&estimate);

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("> ");
        let _ = io::stdout().flush();
        line.clear();
        match stdin.read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        let mut parts = input.split_whitespace();
        let cmd = parts.next().unwrap_or("");

        match cmd {
            "help" => print_help(),
            "quit" | "exit" => break,
            "show" => show(&estimate),
            "new" => match estimate.add_item() {
                Ok(id) => {
                    println!("Added line item id={}", id);
                    show(&estimate);
                }
                Err(e) => println!("Error: {}", e),
            },
            "add" => {
                let args: Vec<&str> = parts.collect();
                if args.len() < 7 {
                    println!(
                        "Usage: add <id> <qty> <wastage> <unit> <labor> <material> <description...>"
                    );
                    continue;
                }
                let id: i32 = match args[0].parse() {
                    Ok(v) => v,
                    Err(_) => {
                        println!("Invalid id");
                        continue;
                    }
                };
                let numbers = match parse_f64_args(&[args[1], args[2], args[4], args[5]]) {
                    Some(values) => values,
                    None => {
                        println!("Invalid number");
                        continue;
                    }
                };
                let description = args[6..].join(" ");
                let tags = estimate
                    .find_item(id)
                    .map(|item| item.tags.clone())
                    .unwrap_or_default();
                let item = LineItem::priced(
                    id,
                    description,
                    numbers[0],
                    numbers[1] / 100.0,
                    args[3],
                    numbers[2],
                    numbers[3],
                )
                .with_tags(tags);
                match estimate.upsert_item(item) {
                    Ok(_) => {
                        println!("Line item upserted.");
                        show(&estimate);
                    }
                    Err(e) => println!("Error: {}", e),
                }
            }
            "set" => {
                let id_s = parts.next();
                let field_s = parts.next();
                let rest: Vec<&str> = parts.collect();
                match (id_s, field_s, !rest.is_empty()) {
                    (Some(id_s), Some(field_s), true) => {
                        let id: i32 = match id_s.parse() {
                            Ok(v) => v,
                            Err(_) => {
                                println!("Invalid id");
                                continue;
                            }
                        };
                        let field = match LineItemField::from_str(field_s) {
                            Some(f) => f,
                            None => {
                                println!("Unknown field '{}'", field_s);
                                continue;
                            }
                        };
                        let value = match FieldValue::parse(field, &rest.join(" ")) {
                            Some(v) => v,
                            None => {
                                println!("Invalid value for {}", field.as_str());
                                continue;
                            }
                        };
                        match estimate.set_field(id, field, value) {
                            Ok(_) => {
                                println!("{} set.", field.as_str());
                                show(&estimate);
                            }
                            Err(e) => println!("Error: {}", e),
                        }
                    }
                    _ => println!("Usage: set <id> <field> <value...>"),
                }
            }
            "delete" => match parts.next().map(str::parse::<i32>) {
                Some(Ok(id)) => {
                    if estimate.delete_item(id) {
                        println!("Deleted line item {id}.");
                        show(&estimate);
                    } else {
                        println!("Line item {id} not found.");
                    }
                }
                Some(Err(_)) => println!("Invalid id"),
                None => println!("Usage: delete <id>"),
            },
            "tag" => match parts.next() {
                Some("add") => {
                    let id_s = parts.next();
                    let name = parts.next();
                    let qty = parts.next();
                    match (id_s.map(str::parse::<i32>), name) {
                        (Some(Ok(id)), Some(name)) => {
                            let tag = match parse_tag(name, qty) {
                                Ok(tag) => tag,
                                Err(msg) => {
                                    println!("{}", msg);
                                    continue;
                                }
                            };
                            match estimate.add_tag(id, tag) {
                                Ok(_) => println!("Tag '{}' added to line item {}.", name, id),
                                Err(e) => println!("Error: {}", e),
                            }
                        }
                        _ => println!("Usage: tag add <id> <name> [qty]"),
                    }
                }
                Some("set") => {
                    let id_s = parts.next();
                    let index_s = parts.next();
                    let name = parts.next();
                    let qty = parts.next();
                    match (
                        id_s.map(str::parse::<i32>),
                        index_s.map(str::parse::<usize>),
                        name,
                    ) {
                        (Some(Ok(id)), Some(Ok(index)), Some(name)) => {
                            let tag = match parse_tag(name, qty) {
                                Ok(tag) => tag,
                                Err(msg) => {
                                    println!("{}", msg);
                                    continue;
                                }
                            };
                            match estimate.update_tag(id, index, tag) {
                                Ok(_) => println!("Tag {} on line item {} updated.", index, id),
                                Err(e) => println!("Error: {}", e),
                            }
                        }
                        _ => println!("Usage: tag set <id> <index> <name> [qty]"),
                    }
                }
                Some("rm") => {
                    let id_s = parts.next();
                    let name = parts.next();
                    match (id_s.map(str::parse::<i32>), name) {
                        (Some(Ok(id)), Some(name)) => match estimate.remove_tag(id, name) {
                            Ok(_) => println!("Tag '{}' removed from line item {}.", name, id),
                            Err(e) => println!("Error: {}", e),
                        },
                        _ => println!("Usage: tag rm <id> <name>"),
                    }
                }
                Some("list") => {
                    let names = match parts.next() {
                        Some(term) => estimate.search_tags(term),
                        None => estimate.tag_names(),
                    };
                    if names.is_empty() {
                        println!("No tags.");
                    }
                    for name in names {
                        println!("  {}", name);
                    }
                }
                _ => println!("Usage: tag add|set|rm|list ..."),
            },
            "breakdown" => {
                let breakdowns = estimate.tag_breakdowns();
                let rendered = match parts.next() {
                    Some(name) => match breakdowns.get(name) {
                        Some(breakdown) => tag_contributions_dataframe(breakdown),
                        None => {
                            println!("Tag '{}' not found.", name);
                            continue;
                        }
                    },
                    None => tag_breakdowns_dataframe(&breakdowns, estimate.rates()),
                };
                match rendered {
                    Ok(df) => println!("{}", render_df_as_text_table(&df)),
                    Err(e) => println!("Error rendering breakdown: {}", e),
                }
            }
            "bid" => print_bid(&estimate),
            "rates" => match parts.next() {
                Some("show") | None => print_rates(estimate.rates()),
                Some("set") => {
                    let args: Vec<&str> = parts.collect();
                    match parse_f64_args(&args) {
                        Some(values) if values.len() == 3 => {
                            match estimate.set_rates(MarkupRates::new(values[0], values[1], values[2])) {
                                Ok(_) => {
                                    println!("Rates updated.");
                                    print_rates(estimate.rates());
                                }
                                Err(e) => println!("Error: {}", e),
                            }
                        }
                        _ => println!("Usage: rates set <overhead> <labor> <tax>"),
                    }
                }
                Some("avg") => match estimate.set_rates(MarkupRates::industry_average()) {
                    Ok(_) => {
                        println!("Industry average rates applied.");
                        print_rates(estimate.rates());
                    }
                    Err(e) => println!("Error: {}", e),
                },
                Some("load") => match parts.next() {
                    Some(path) => match load_rates_from_json(path) {
                        Ok(rates) => match estimate.set_rates(rates) {
                            Ok(_) => {
                                println!("Rates loaded from {}.", path);
                                print_rates(estimate.rates());
                            }
                            Err(e) => println!("Error: {}", e),
                        },
                        Err(e) => println!("Error loading rates: {}", e),
                    },
                    None => println!("Usage: rates load <json_path>"),
                },
                Some(other) => {
                    println!("Unknown rates command '{}'.", other);
                    println!("Usage: rates show|set|avg|load ...");
                }
            },
            "adj" => {
                let args: Vec<&str> = parts.collect();
                match parse_f64_args(&args) {
                    Some(values) if values.len() == 4 => {
                        estimate.set_adjustments(BidAdjustments {
                            permit: values[0],
                            equip_rental: values[1],
                            labeling: values[2],
                            material_markup: values[3],
                        });
                        println!("Adjustments updated.");
                        print_bid(&estimate);
                    }
                    _ => println!("Usage: adj <permit> <equip> <labeling> <material_markup>"),
                }
            }
            "columns" => match parts.next() {
                Some("show") | None => print_columns(&estimate),
                Some("toggle") => match parts.next() {
                    Some(key) => match LineItemColumn::from_key(key) {
                        Some(column) => match estimate.toggle_column(column) {
                            Some(visible) => {
                                println!("Column {} visible={}.", key, visible);
                                print_columns(&estimate);
                            }
                            None => println!("Column {} is not configured.", key),
                        },
                        None => println!("Unknown column '{}'.", key),
                    },
                    None => println!("Usage: columns toggle <key>"),
                },
                Some(other) => {
                    println!("Unknown columns command '{}'.", other);
                    println!("Usage: columns show|toggle <key>");
                }
            },
            "filter" => {
                let mut words = Vec::new();
                let mut tags = Vec::new();
                for part in parts {
                    match part.strip_prefix('#') {
                        Some(tag) => tags.push(tag.to_string()),
                        None => words.push(part),
                    }
                }
                let items = estimate.filter_items(&words.join(" "), &tags);
                println!("{} matching line items", items.len());
                println!("{}", render_items(&estimate, &items));
            }
            "sort" => {
                let column = match parts.next().map(LineItemColumn::from_key) {
                    Some(Some(column)) => column,
                    _ => {
                        println!("Usage: sort <column> [asc|desc]");
                        continue;
                    }
                };
                let direction = match parts.next() {
                    Some("desc") => SortDirection::Desc,
                    _ => SortDirection::Asc,
                };
                let items = estimate.sorted_items(column, direction);
                println!("{}", render_items(&estimate, &items));
            }
            "meta" => match parts.next() {
                Some("show") | None => print_metadata(&estimate),
                Some(field @ ("name" | "desc" | "estimator")) => {
                    let rest: Vec<&str> = parts.collect();
                    if rest.is_empty() {
                        println!("Usage: meta {} <text...>", field);
                        continue;
                    }
                    let text = rest.join(" ");
                    match field {
                        "name" => estimate.set_project_name(text),
                        "desc" => estimate.set_project_description(text),
                        _ => estimate.set_estimator_name(text),
                    }
                    println!("Metadata updated.");
                    print_metadata(&estimate);
                }
                Some("date") => match parts.next() {
                    Some(date_s) => match NaiveDate::parse_from_str(date_s, "%Y-%m-%d") {
                        Ok(date) => {
                            estimate.set_plan_date(date);
                            println!("Plan date updated.");
                            print_metadata(&estimate);
                        }
                        Err(_) => println!("Invalid date (YYYY-MM-DD)"),
                    },
                    None => println!("Usage: meta date <YYYY-MM-DD>"),
                },
                Some(other) => {
                    println!("Unknown meta command '{}'.", other);
                    println!("Usage: meta show|name|desc|estimator|date ...");
                }
            },
            "summary" => print_summary(&estimate),
            "save" => {
                let fmt = parts.next();
                let path = parts.next();
                let result = match (fmt, path) {
                    (Some("json"), Some(path)) => save_estimate_to_json(&estimate, path),
                    (Some("csv"), Some(path)) => save_estimate_to_csv(&estimate, path),
                    _ => {
                        println!("Usage: save <json|csv> <path>");
                        continue;
                    }
                };
                match result {
                    Ok(_) => println!("Estimate saved to {}.", path.unwrap_or_default()),
                    Err(e) => println!("Error saving estimate: {}", e),
                }
            }
            "load" => {
                let fmt = parts.next();
                let path = parts.next();
                let result = match (fmt, path) {
                    (Some("json"), Some(path)) => load_estimate_from_json(path),
                    (Some("csv"), Some(path)) => load_estimate_from_csv(path),
                    _ => {
                        println!("Usage: load <json|csv> <path>");
                        continue;
                    }
                };
                match result {
                    Ok(loaded) => {
                        estimate = loaded;
                        println!("Estimate loaded from {}.", path.unwrap_or_default());
                        show(&estimate);
                    }
                    Err(e) => println!("Error loading estimate: {}", e),
                }
            }
            "import" => match parts.next() {
                Some(path) => {
                    let parsed = estimate
                        .next_id()
                        .map_err(PersistenceError::from)
                        .and_then(|next_id| {
                            let file = File::open(path)?;
                            parse_line_items_csv(file, next_id)
                        });
                    match parsed {
                        Ok(items) => {
                            let taken: Vec<String> = items
                                .iter()
                                .filter(|item| estimate.find_item(item.id).is_some())
                                .map(|item| item.id.to_string())
                                .collect();
                            if !taken.is_empty() {
                                println!(
                                    "Import aborted: line item ids already in use: {}.",
                                    taken.join(", ")
                                );
                                continue;
                            }
                            let count = items.len();
                            let mut failed = false;
                            for item in items {
                                if let Err(e) = estimate.insert_item(item) {
                                    println!("Error importing line item: {}", e);
                                    failed = true;
                                    break;
                                }
                            }
                            if !failed {
                                println!("Imported {} line items from {}.", count, path);
                                show(&estimate);
                            }
                        }
                        Err(e) => println!("Error importing {}: {}", path, e),
                    }
                }
                None => println!("Usage: import <csv_path>"),
            },
            _ => {
                println!("Unknown command. Type 'help'.");
            }
        }
    }
}
