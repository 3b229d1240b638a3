use covidstats_core::service::report::{format_percent, group_thousands};
use covidstats_core::{RecordCollection, Segment};
use tabled::settings::object::Rows;
use tabled::settings::{Color, Modify, Style};
use tabled::{Table, Tabled};

const BAR_WIDTH: usize = 40;

#[derive(Tabled)]
struct RecordRow {
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Region")]
    region: String,
    #[tabled(rename = "Positive")]
    positive: String,
    #[tabled(rename = "Negative")]
    negative: String,
    #[tabled(rename = "Tests")]
    tests: String,
    #[tabled(rename = "Pos %")]
    percent: String,
    #[tabled(rename = "Hosp. Now")]
    current_hospitalized: String,
    #[tabled(rename = "Hosp. +")]
    hospitalized: String,
    #[tabled(rename = "Deaths")]
    deaths: String,
}

#[derive(Tabled)]
struct HistogramRow {
    #[tabled(rename = "Range")]
    range: String,
    #[tabled(rename = "Days")]
    count: String,
    #[tabled(rename = "")]
    bar: String,
}

pub fn show_records(records: &RecordCollection) {
    let rows: Vec<RecordRow> = records
        .iter()
        .map(|r| RecordRow {
            date: r.date().format("%Y-%m-%d").to_string(),
            region: r.region().to_string(),
            positive: group_thousands(r.positive_increase().into()),
            negative: group_thousands(r.negative_increase().into()),
            tests: group_thousands(r.total_tests()),
            // Days without tests report the raw count, not a ratio
            percent: if r.total_tests() > 0 {
                format_percent(r.positive_percentage())
            } else {
                "-".to_string()
            },
            current_hospitalized: group_thousands(r.current_hospitalized().into()),
            hospitalized: group_thousands(r.hospitalized_increase().into()),
            deaths: group_thousands(r.death_increase().into()),
        })
        .collect();

    let mut table = Table::new(rows);
    table
        .with(Style::modern())
        .with(Modify::new(Rows::first()).with(Color::FG_CYAN));

    println!("{}", table);
    println!("{} record(s)", records.len());
}

pub fn show_histogram(segments: &[Segment]) {
    if segments.is_empty() {
        println!("No positive cases to chart.");
        return;
    }

    let peak = segments.iter().map(|s| s.count).max().unwrap_or(0).max(1);
    let rows: Vec<HistogramRow> = segments
        .iter()
        .map(|s| HistogramRow {
            range: format!("{} - {}", group_thousands(s.start), group_thousands(s.end)),
            count: group_thousands(s.count as u64),
            bar: "█".repeat(s.count * BAR_WIDTH / peak),
        })
        .collect();

    let mut table = Table::new(rows);
    table
        .with(Style::modern())
        .with(Modify::new(Rows::first()).with(Color::FG_CYAN));

    println!("{}", table);
}
