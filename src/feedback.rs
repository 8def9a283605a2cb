//! Feedback figures for the admin dashboard, computed from the surveys stored
//! on this device.

use std::collections::BTreeMap;

use log::warn;
use serde::Serialize;

use crate::{db::SubmissionRecord, models::SurveyPayload};

/// Ratings at or below this score count as a complaint.
const COMPLAINT_MAX_SCORE: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackSummary {
    pub total: u64,
    pub positive: u64,
    pub neutral: u64,
    pub negative: u64,
    /// Question with the most Fair/Poor answers.
    pub most_complained_question: Option<String>,
    /// Airport with the most negative surveys.
    pub most_complaints_airport: Option<String>,
    /// Airport with the highest average rating.
    pub best_rated_airport: Option<String>,
}

/// `Excellent` → 5 down to `Poor` → 1.
pub fn rating_score(label: &str) -> Option<u8> {
    match label {
        "Excellent" => Some(5),
        "Very Good" => Some(4),
        "Good" => Some(3),
        "Fair" => Some(2),
        "Poor" => Some(1),
        _ => None,
    }
}

fn scores(payload: &SurveyPayload) -> impl Iterator<Item = u8> + '_ {
    payload.ratings.values().filter_map(|label| rating_score(label))
}

fn average(sum: u32, count: u32) -> Option<f64> {
    (count > 0).then(|| f64::from(sum) / f64::from(count))
}

/// Overall tone of one survey from its average rating. A survey without any
/// recognised rating is neutral.
pub fn sentiment(payload: &SurveyPayload) -> Sentiment {
    let (sum, count) = scores(payload).fold((0u32, 0u32), |(s, c), score| {
        (s + u32::from(score), c + 1)
    });
    match average(sum, count) {
        Some(avg) if avg >= 3.5 => Sentiment::Positive,
        Some(avg) if avg < 2.5 => Sentiment::Negative,
        _ => Sentiment::Neutral,
    }
}

/// Highest value wins; on a tie the smallest key does.
fn top<'a, V: PartialOrd + Copy>(map: &'a BTreeMap<String, V>) -> Option<&'a str> {
    let mut best: Option<(&str, V)> = None;
    for (key, &value) in map {
        if best.map_or(true, |(_, current)| value > current) {
            best = Some((key, value));
        }
    }
    best.map(|(key, _)| key)
}

pub fn summarize(records: &[SubmissionRecord]) -> FeedbackSummary {
    let mut summary = FeedbackSummary::default();
    let mut complaints_by_question: BTreeMap<String, u64> = BTreeMap::new();
    let mut negatives_by_airport: BTreeMap<String, u64> = BTreeMap::new();
    let mut scores_by_airport: BTreeMap<String, (u32, u32)> = BTreeMap::new();

    for record in records {
        let payload: SurveyPayload = match serde_json::from_str(&record.payload) {
            Ok(payload) => payload,
            Err(err) => {
                warn!("Skipping submission {} in feedback summary: {err}", record.id);
                continue;
            }
        };

        summary.total += 1;
        let tone = sentiment(&payload);
        match tone {
            Sentiment::Positive => summary.positive += 1,
            Sentiment::Neutral => summary.neutral += 1,
            Sentiment::Negative => summary.negative += 1,
        }

        for (question, label) in &payload.ratings {
            if rating_score(label).is_some_and(|score| score <= COMPLAINT_MAX_SCORE) {
                *complaints_by_question.entry(question.clone()).or_default() += 1;
            }
        }

        if payload.airport_code.is_empty() {
            continue;
        }
        if tone == Sentiment::Negative {
            *negatives_by_airport
                .entry(payload.airport_code.clone())
                .or_default() += 1;
        }
        let entry = scores_by_airport
            .entry(payload.airport_code.clone())
            .or_default();
        for score in scores(&payload) {
            entry.0 += u32::from(score);
            entry.1 += 1;
        }
    }

    let averages: BTreeMap<String, f64> = scores_by_airport
        .into_iter()
        .filter_map(|(code, (sum, count))| average(sum, count).map(|avg| (code, avg)))
        .collect();

    summary.most_complained_question = top(&complaints_by_question).map(str::to_string);
    summary.most_complaints_airport = top(&negatives_by_airport).map(str::to_string);
    summary.best_rated_airport = top(&averages).map(str::to_string);
    summary
}
