use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color, ContentArrangement, Row, Table};

use crate::analytics::AnalyticsSnapshot;
use crate::ranking::RankedMatch;
use crate::scoring::CompatibilityScore;
use crate::suggestions::InsightReport;

fn base_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn score_cell(score: f64) -> Cell {
    let text = format!("{score:.1}");
    if score >= 70.0 {
        Cell::new(text).fg(Color::Green)
    } else if score >= 40.0 {
        Cell::new(text).fg(Color::Yellow)
    } else {
        Cell::new(text).fg(Color::Red)
    }
}

pub fn render_score_table(score: &CompatibilityScore) -> String {
    let mut table = base_table();
    table.set_header(vec!["Factor", "Applicable", "Score", "Matched", "Missing"]);
    for factor in &score.factors {
        let applicable = if factor.applicable { "yes" } else { "no" };
        let score_text = if factor.applicable {
            format!("{:.1}", factor.score)
        } else {
            "-".to_string()
        };
        table.add_row(Row::from(vec![
            Cell::new(factor.factor.to_string()),
            Cell::new(applicable),
            Cell::new(score_text),
            Cell::new(factor.matched.iter().cloned().collect::<Vec<_>>().join(", ")),
            Cell::new(factor.missing.iter().cloned().collect::<Vec<_>>().join(", ")),
        ]));
    }
    table.add_row(Row::from(vec![
        Cell::new("overall"),
        Cell::new(""),
        score_cell(score.overall),
        Cell::new(""),
        Cell::new(""),
    ]));
    table.to_string()
}

pub fn render_ranking_table(matches: &[RankedMatch], id_header: &str) -> String {
    let mut table = base_table();
    table.set_header(vec![id_header, "Score", "Closing Soon", "Why"]);
    for entry in matches {
        let closing = if entry.closing_soon { "YES" } else { "" };
        let closing_cell = if entry.closing_soon {
            Cell::new(closing).fg(Color::Yellow)
        } else {
            Cell::new(closing)
        };
        let id = if id_header == "Profile" {
            &entry.score.profile_id
        } else {
            &entry.score.opportunity_id
        };
        table.add_row(Row::from(vec![
            Cell::new(id),
            score_cell(entry.score.overall),
            closing_cell,
            Cell::new(entry.reasons.join("; ")),
        ]));
    }
    table.to_string()
}

pub fn render_suggestions_table(report: &InsightReport) -> String {
    let mut table = base_table();
    table.set_header(vec!["Field", "Category", "Impact", "Opportunities", "Suggestion"]);
    for suggestion in &report.suggestions {
        table.add_row(Row::from(vec![
            Cell::new(suggestion.field.to_string()),
            Cell::new(suggestion.category.to_string()),
            Cell::new(format!("+{:.1}", suggestion.impact)),
            Cell::new(suggestion.affected_opportunities.to_string()),
            Cell::new(suggestion.message.clone()),
        ]));
    }
    format!(
        "Profile {}: score {:.0} -> potential {:.0}\n{}",
        report.profile_id,
        report.current_score,
        report.potential_score,
        table
    )
}

pub fn render_analytics_table(snapshot: &AnalyticsSnapshot) -> String {
    let mut table = base_table();
    table.set_header(vec!["Metric", "Value"]);
    table.add_row(vec![
        "window".to_string(),
        snapshot.window.to_string(),
    ]);
    table.add_row(vec![
        "avg compatibility".to_string(),
        format!("{:.1}", snapshot.avg_compatibility),
    ]);
    table.add_row(vec![
        "interactions".to_string(),
        snapshot.total_interactions.to_string(),
    ]);
    table.add_row(vec![
        "applications sent".to_string(),
        snapshot.applications_sent.to_string(),
    ]);
    table.add_row(vec![
        "successful matches".to_string(),
        snapshot.successful_matches.to_string(),
    ]);
    table.add_row(vec![
        "engagement".to_string(),
        format!(
            "{:.0} ({})",
            snapshot.engagement_score,
            snapshot.engagement_level()
        ),
    ]);
    for factor in &snapshot.top_factors {
        table.add_row(vec![
            format!("top factor: {}", factor.factor),
            format!("{} ({:.0}%)", factor.count, factor.percentage),
        ]);
    }
    table.to_string()
}
