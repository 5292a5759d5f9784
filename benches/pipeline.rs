use std::fs::File;
use std::io::Write;
use std::path::Path;

use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use encoding_rs::UTF_8;
use order_insights::aggregate::GroupKey;
use order_insights::config::PipelineConfig;
use order_insights::filter::{FilterSpec, Selection};
use order_insights::pipeline::{Dashboard, Selected};
use tempfile::TempDir;

const CATEGORIES: [&str; 6] = [
    "beleza_saude",
    "esporte_lazer",
    "informatica_acessorios",
    "moveis_decoracao",
    "utilidades_domesticas",
    "pc_gamer",
];

fn write_lines(path: &Path, header: &str, rows: impl Iterator<Item = String>) {
    let mut file = File::create(path).expect("create csv");
    writeln!(file, "{header}").expect("header");
    for row in rows {
        writeln!(file, "{row}").expect("row");
    }
}

fn generate_dataset(orders: usize) -> TempDir {
    let dir = tempfile::tempdir().expect("temp dir");
    let root = dir.path();
    write_lines(
        &root.join("orders_dataset.csv"),
        "order_id,customer_id,order_status,order_purchase_timestamp",
        (0..orders).map(|i| {
            let month = (i % 12) + 1;
            let day = (i % 28) + 1;
            let hour = i % 24;
            let year = 2016 + (i % 3);
            format!("o{i},c{},delivered,{year}-{month:02}-{day:02} {hour:02}:15:00", i % 997)
        }),
    );
    write_lines(
        &root.join("order_items_dataset.csv"),
        "order_id,order_item_id,product_id,price",
        (0..orders * 2).map(|i| {
            let price = if i % 50 == 0 {
                String::new()
            } else {
                format!("{}.{:02}", 10 + i % 200, i % 100)
            };
            format!("o{},{},p{},{price}", i / 2, i % 2 + 1, i % 300)
        }),
    );
    write_lines(
        &root.join("products_dataset.csv"),
        "product_id,product_category_name,product_weight_g",
        (0..300).map(|i| {
            let category = if i % 40 == 0 { "" } else { CATEGORIES[i % CATEGORIES.len()] };
            format!("p{i},{category},{}", 100 + i)
        }),
    );
    write_lines(
        &root.join("product_category_name_translation.csv"),
        "product_category_name,product_category_name_english",
        CATEGORIES
            .iter()
            .take(CATEGORIES.len() - 1)
            .map(|c| format!("{c},{c}_en")),
    );
    write_lines(
        &root.join("customers_dataset.csv"),
        "customer_id,customer_city,customer_state",
        (0..997).map(|i| format!("c{i},city{},SP", i % 20)),
    );
    write_lines(
        &root.join("order_payments_dataset.csv"),
        "order_id,payment_type,payment_value",
        (0..orders).map(|i| format!("o{i},credit_card,{}.50", 20 + i % 100)),
    );
    dir
}

fn bench_pipeline(c: &mut Criterion) {
    let dir = generate_dataset(20_000);
    let config = PipelineConfig {
        data_dir: dir.path().to_path_buf(),
        ..PipelineConfig::default()
    };

    let mut group = c.benchmark_group("pipeline");

    group.bench_function("load_and_prepare", |b| {
        b.iter_batched(
            || config.clone(),
            |config| Dashboard::load(config, None, UTF_8).expect("load dataset"),
            BatchSize::SmallInput,
        );
    });

    let dashboard = Dashboard::load(config.clone(), None, UTF_8).expect("load dataset");
    let spec = FilterSpec {
        weekdays: Selection::from_values(Some(vec![5, 6])),
        hours: Some((8, 20)),
        ..FilterSpec::default()
    };

    group.bench_function("filter_and_aggregate", |b| {
        b.iter(|| {
            let Selected::Rows(view) = dashboard.select(&spec).expect("select") else {
                panic!("expected rows");
            };
            let top = dashboard.top_categories(&view);
            let hours = dashboard.counts(&view, GroupKey::Hour);
            let heatmap = dashboard.heatmap(&view);
            (top.len(), hours.total(), heatmap.total())
        });
    });

    drop(dir);
    group.finish();
}

criterion_group!(benches, bench_pipeline);
criterion_main!(benches);
