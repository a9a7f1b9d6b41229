use anyhow::Result;

use crate::ranking::RankedMatch;
use crate::suggestions::InsightReport;

pub fn rankings_to_csv(matches: &[RankedMatch]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record([
        "profile",
        "opportunity",
        "score",
        "deadline",
        "closing_soon",
        "reasons",
    ])?;
    for entry in matches {
        writer.write_record([
            entry.score.profile_id.clone(),
            entry.score.opportunity_id.clone(),
            format!("{:.2}", entry.score.overall),
            entry
                .deadline
                .map(|d| d.to_rfc3339())
                .unwrap_or_default(),
            entry.closing_soon.to_string(),
            entry.reasons.join("; "),
        ])?;
    }
    let data = writer.into_inner()?;
    Ok(String::from_utf8_lossy(&data).to_string())
}

pub fn suggestions_to_csv(report: &InsightReport) -> Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record([
        "field",
        "category",
        "action",
        "impact",
        "affected_opportunities",
        "message",
    ])?;
    for suggestion in &report.suggestions {
        writer.write_record([
            suggestion.field.to_string(),
            suggestion.category.to_string(),
            suggestion.action.clone(),
            format!("{:.2}", suggestion.impact),
            suggestion.affected_opportunities.to_string(),
            suggestion.message.clone(),
        ])?;
    }
    let data = writer.into_inner()?;
    Ok(String::from_utf8_lossy(&data).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::CompatibilityScore;
    use chrono::{TimeZone, Utc};

    #[test]
    fn ranking_csv_has_header_and_rows() {
        let matches = vec![RankedMatch {
            score: CompatibilityScore {
                profile_id: "p1".to_string(),
                opportunity_id: "o1".to_string(),
                overall: 87.5,
                factors: Vec::new(),
                computed_at: Utc.with_ymd_and_hms(2026, 8, 1, 0, 0, 0).unwrap(),
            },
            deadline: None,
            closing_soon: false,
            reasons: vec!["skills: photography".to_string()],
        }];
        let csv = rankings_to_csv(&matches).expect("csv");
        let mut lines = csv.lines();
        assert_eq!(
            lines.next().unwrap(),
            "profile,opportunity,score,deadline,closing_soon,reasons"
        );
        assert!(lines.next().unwrap().starts_with("p1,o1,87.50"));
    }
}
