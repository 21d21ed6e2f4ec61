use crate::domain::AnalysisRecord;
use crate::pipeline::{BatchReport, SkipReason};
use crate::search::SearchOutcome;
use crate::templates::{card, desktop_layout};
use maud::{html, Markup};
use rust_decimal::Decimal;

fn money(d: Option<Decimal>) -> String {
    match d {
        Some(d) => format!("${}", d.round_dp(0)),
        None => "—".to_string(),
    }
}

pub fn results_page(outcome: &SearchOutcome) -> Markup {
    let output = &outcome.output;
    let recent = output
        .skipped
        .iter()
        .filter(|s| s.reason == SkipReason::RecentlyAnalyzed)
        .count();

    desktop_layout(
        "Results",
        html! {
            main class="container" {
                h1 { "Results for " (outcome.search_location) }

                p {
                    strong { (output.outcomes.len()) } " analyzed, "
                    strong { (recent) } " skipped as recently analyzed, "
                    strong { (output.skipped.len() - recent) } " duplicates, "
                    strong { (output.degraded_count()) } " with errors."
                }
                @if output.cancelled {
                    p style="color: #b45309;" { "Run was cancelled before every listing was analyzed." }
                }
                @if let Some(report) = &outcome.report {
                    (report_summary(report))
                }

                @if output.outcomes.is_empty() {
                    p { "No new listings to analyze." }
                } @else {
                    table {
                        thead {
                            tr {
                                th { "#" }
                                th { "Address" }
                                th { "List" }
                                th { "ARV" }
                                th { "Best" }
                                th { "Best Profit" }
                                th { "Score" }
                                th { "Grade" }
                                th { "Recommendation" }
                                th { "Keywords" }
                                th { "Description" }
                                th { "Cash Flow" }
                                th { "Trend" }
                            }
                        }
                        tbody {
                            @for record in output.records() {
                                (record_row(record))
                            }
                        }
                    }
                }

                p { a href="/" { "New search" } " · " a href="/export.xlsx" { "Download saved results" } }
            }
        },
    )
}

fn report_summary(report: &BatchReport) -> Markup {
    card(
        "Saved",
        html! {
            p { (report.persisted.len()) " records saved." }
            @if !report.failed.is_empty() {
                p style="color: #dc2626;" { (report.failed.len()) " records could not be saved:" }
                ul {
                    @for f in &report.failed {
                        li { code { (f.record_id) } ": " (f.error) }
                    }
                }
            }
            @if !report.history_errors.is_empty() {
                p style="color: #b45309;" {
                    (report.history_errors.len()) " addresses may be re-analyzed on the next run."
                }
            }
        },
    )
}

fn record_row(record: &AnalysisRecord) -> Markup {
    let scenarios = record.deal.scenarios.as_ref();

    html! {
        tr class=[record.error.as_ref().map(|_| "degraded")] {
            td { (record.rank) }
            td { (record.listing.address.full()) }
            td { (money(record.listing.list_price)) }
            td { (money(record.listing.arv)) }
            td { (scenarios.map(|s| s.best.label()).unwrap_or("—")) }
            td { (money(scenarios.map(|s| s.best_profit))) }
            td { (record.deal.score.map(|s| s.to_string()).unwrap_or_default()) }
            td { (record.deal.grade.label()) }
            td {
                (record.deal.recommendation)
                @if let Some(err) = &record.error {
                    br; small style="color: #dc2626;" { (err) }
                }
            }
            td { (record.keywords.joined()) }
            td { (record.description.source().as_str()) }
            td {
                @if let Some(r) = &record.rental {
                    (format!("${:.0}/mo", r.monthly_cash_flow))
                    br; small { (r.grade.label()) }
                }
            }
            td {
                @if let Some(t) = &record.trend {
                    (t.direction.label()) " " (format!("{:+.1}%", t.one_year_change_pct))
                    br; small { (t.direction.signal()) }
                }
            }
        }
    }
}
