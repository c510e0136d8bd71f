use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use super::models::DrawingRecord;

const POPULAR_LABEL_LIMIT: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PopularLabel {
    #[serde(rename = "fishType")]
    pub label: String,
    pub count: usize,
}

/// Aggregate view over every stored record, recomputed on each request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub total_drawings: usize,
    /// Records whose timestamp falls on the same calendar day as `now`, in `now`'s zone.
    pub today_drawings: usize,
    /// Rounded mean over records that carry an analysis; 0 when none do.
    pub average_score: u32,
    pub popular_fish_types: Vec<PopularLabel>,
    pub last_drawing: Option<DateTime<Utc>>,
}

pub fn compute_statistics<Tz: TimeZone>(records: &[DrawingRecord], now: &DateTime<Tz>) -> Statistics {
    let zone = now.timezone();
    let today = now.date_naive();

    let today_drawings = records
        .iter()
        .filter(|record| record.timestamp.with_timezone(&zone).date_naive() == today)
        .count();

    let scores: Vec<u32> = records.iter().filter_map(DrawingRecord::score).collect();
    let average_score = if scores.is_empty() {
        0
    } else {
        let total: u64 = scores.iter().map(|&score| u64::from(score)).sum();
        (total as f64 / scores.len() as f64).round() as u32
    };

    // First-seen order breaks ties between equally common labels.
    let mut counts: Vec<PopularLabel> = Vec::new();
    let labels = records
        .iter()
        .filter_map(DrawingRecord::label)
        .filter(|label| !label.is_empty());
    for label in labels {
        match counts.iter_mut().find(|entry| entry.label == label) {
            Some(entry) => entry.count += 1,
            None => counts.push(PopularLabel {
                label: label.to_string(),
                count: 1,
            }),
        }
    }
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts.truncate(POPULAR_LABEL_LIMIT);

    Statistics {
        total_drawings: records.len(),
        today_drawings,
        average_score,
        popular_fish_types: counts,
        last_drawing: records.iter().map(|record| record.timestamp).max(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{suggest, AnalysisResult, FeatureSet};
    use crate::records::models::NewDrawing;
    use chrono::{Duration, FixedOffset};

    fn record(id: &str, timestamp: DateTime<Utc>, analysis: Option<(&str, u32)>) -> DrawingRecord {
        NewDrawing {
            image_data: String::new(),
            analysis_result: analysis.map(|(label, score)| AnalysisResult {
                label: label.into(),
                confidence: 0.5,
                score,
                features: FeatureSet::default(),
                suggestions: suggest(score),
                timestamp,
            }),
            ..NewDrawing::default()
        }
        .into_record(id.into(), timestamp)
    }

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).unwrap()
    }

    #[test]
    fn empty_store_has_zeroed_statistics() {
        let stats = compute_statistics(&[], &noon());
        assert_eq!(stats.total_drawings, 0);
        assert_eq!(stats.today_drawings, 0);
        assert_eq!(stats.average_score, 0);
        assert!(stats.popular_fish_types.is_empty());
        assert_eq!(stats.last_drawing, None);
    }

    #[test]
    fn averages_only_analysed_records() {
        let now = noon();
        let records = vec![
            record("a", now, Some(("Carp", 70))),
            record("b", now, None),
            record("c", now, Some(("Carp", 81))),
        ];
        let stats = compute_statistics(&records, &now);
        assert_eq!(stats.total_drawings, 3);
        // (70 + 81) / 2 = 75.5
        assert_eq!(stats.average_score, 76);
    }

    #[test]
    fn popular_labels_are_top_three_with_stable_ties() {
        let now = noon();
        let labels = ["Shark", "Carp", "Goldfish", "Carp", "Betta", "Goldfish", "Carp"];
        let records: Vec<_> = labels
            .iter()
            .enumerate()
            .map(|(i, &label)| record(&i.to_string(), now, Some((label, 50))))
            .collect();

        let stats = compute_statistics(&records, &now);
        let popular: Vec<(&str, usize)> = stats
            .popular_fish_types
            .iter()
            .map(|p| (p.label.as_str(), p.count))
            .collect();
        assert_eq!(popular, vec![("Carp", 3), ("Goldfish", 2), ("Shark", 1)]);
    }

    #[test]
    fn blank_labels_are_not_popular() {
        let now = noon();
        let records = vec![
            record("a", now, Some(("", 40))),
            record("b", now, Some(("", 40))),
            record("c", now, Some(("Betta", 60))),
        ];
        let stats = compute_statistics(&records, &now);
        assert_eq!(
            stats.popular_fish_types,
            vec![PopularLabel {
                label: "Betta".into(),
                count: 1
            }]
        );
        // still scored
        assert_eq!(stats.average_score, 47);
    }

    #[test]
    fn today_follows_the_callers_calendar() {
        let now = noon();
        let records = vec![
            record("today", now - Duration::hours(2), None),
            record("yesterday", now - Duration::hours(20), None),
            record("late", now - Duration::hours(13), None),
        ];
        assert_eq!(compute_statistics(&records, &now).today_drawings, 1);

        // At UTC+10 it is 22:00 and all three fall on the local 10th of May.
        let plus_ten = now.with_timezone(&FixedOffset::east_opt(10 * 3600).unwrap());
        assert_eq!(compute_statistics(&records, &plus_ten).today_drawings, 3);
    }

    #[test]
    fn last_drawing_is_newest_timestamp_not_last_inserted() {
        let now = noon();
        let records = vec![
            record("new", now, None),
            record("old", now - Duration::days(3), None),
        ];
        assert_eq!(compute_statistics(&records, &now).last_drawing, Some(now));
    }
}
