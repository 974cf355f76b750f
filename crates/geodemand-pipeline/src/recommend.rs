//! Rider-facing recommendations derived from zone forecasts

use chrono::{DateTime, NaiveDate, Utc};
use geodemand_core::error::Result;
use geodemand_core::models::{Impact, Recommendation, RecommendationKind, ZoneWithPredictions};
use geodemand_geo::footprint::centroid;
use geodemand_llm::{describe_or_template, AreaStats, Narrator};
use geodemand_store::ForecastStore;
use std::sync::Arc;

/// Number of highest-fee zones considered for zone-driven recommendations
const TOP_ZONES: usize = 5;

/// Current-hour calls must exceed this for a pattern recommendation
const MIN_PATTERN_CALLS: u32 = 3;

const RISING_CONFIDENCE_FLOOR: f64 = 0.20;

/// A fixed recommendation that applies during a range of hours
#[derive(Debug, Clone, Copy)]
pub struct TimeOfDayRule {
    /// First hour of the range, inclusive
    pub start_hour: usize,
    /// Last hour of the range, inclusive. Smaller than `start_hour` when
    /// the range wraps past midnight.
    pub end_hour: usize,
    pub title: &'static str,
    pub description: &'static str,
    pub impact: Impact,
    pub confidence: f64,
}

impl TimeOfDayRule {
    pub fn matches(&self, hour: usize) -> bool {
        if self.start_hour <= self.end_hour {
            hour >= self.start_hour && hour <= self.end_hour
        } else {
            hour >= self.start_hour || hour <= self.end_hour
        }
    }
}

pub const TIME_OF_DAY_RULES: [TimeOfDayRule; 3] = [
    TimeOfDayRule {
        start_hour: 11,
        end_hour: 13,
        title: "Lunch rush",
        description: "Restaurant orders peak over lunch. Stay close to",
        impact: Impact::High,
        confidence: 0.80,
    },
    TimeOfDayRule {
        start_hour: 18,
        end_hour: 20,
        title: "Dinner rush",
        description: "Dinner is the busiest stretch of the day. Position yourself near",
        impact: Impact::High,
        confidence: 0.80,
    },
    TimeOfDayRule {
        start_hour: 22,
        end_hour: 1,
        title: "Late-night orders",
        description: "Late-night delivery keeps going past midnight around",
        impact: Impact::Medium,
        confidence: 0.60,
    },
];

/// Impact tier for an expected number of calls
pub fn impact_for_calls(calls: u32) -> Impact {
    if calls > 8 {
        Impact::High
    } else if calls > 5 {
        Impact::Medium
    } else {
        Impact::Low
    }
}

pub struct RecommendationComposer {
    forecasts: Arc<dyn ForecastStore>,
    narrator: Arc<dyn Narrator>,
}

impl RecommendationComposer {
    pub fn new(forecasts: Arc<dyn ForecastStore>, narrator: Arc<dyn Narrator>) -> Self {
        Self { forecasts, narrator }
    }

    /// Recommendations for `date` given the zones' forecasts and the local hour.
    ///
    /// Zone-driven entries come first, ordered by zone fee, followed by any
    /// time-of-day rule that matches `current_hour`. Narrator failures only
    /// shorten descriptions.
    pub async fn compose(
        &self,
        zones: &[ZoneWithPredictions],
        current_hour: usize,
        date: NaiveDate,
        created_at: DateTime<Utc>,
    ) -> Vec<Recommendation> {
        let current_hour = current_hour % 24;
        let next_hour = (current_hour + 1) % 24;

        let mut ranked: Vec<&ZoneWithPredictions> = zones.iter().collect();
        ranked.sort_by(|a, b| {
            b.zone
                .avg_fee
                .total_cmp(&a.zone.avg_fee)
                .then_with(|| a.zone.cell_key.cmp(&b.zone.cell_key))
        });

        let mut recommendations = Vec::new();

        for entry in ranked.iter().take(TOP_ZONES) {
            let zone = &entry.zone;
            let current = entry.expected_calls_at(current_hour);
            let next = entry.expected_calls_at(next_hour);

            if current > MIN_PATTERN_CALLS {
                let template = format!(
                    "About {} orders are expected in {} around {:02}:00, averaging {:.0} per delivery.",
                    current, zone.name, current_hour, zone.avg_fee
                );
                let description = match centroid(&zone.footprint) {
                    Some(center) => {
                        let stats = AreaStats {
                            zone_name: zone.name.clone(),
                            hour: current_hour,
                            expected_calls: current,
                            avg_fee: zone.avg_fee,
                        };
                        describe_or_template(self.narrator.as_ref(), &center, &stats, template)
                            .await
                    }
                    None => template,
                };

                recommendations.push(Recommendation {
                    zone_id: zone.id,
                    kind: RecommendationKind::HistoricalPattern,
                    title: format!("High demand in {}", zone.name),
                    description,
                    impact: impact_for_calls(current),
                    confidence: entry
                        .prediction_at(current_hour)
                        .map(|p| p.confidence)
                        .unwrap_or(zone.confidence),
                    target_date: date,
                    created_at,
                });
            }

            if next > current {
                recommendations.push(Recommendation {
                    zone_id: zone.id,
                    kind: RecommendationKind::DemandRising,
                    title: format!("Demand rising in {}", zone.name),
                    description: format!(
                        "Expected orders go from {} to {} at {:02}:00. Head over before it peaks.",
                        current, next, next_hour
                    ),
                    impact: Impact::Medium,
                    confidence: entry
                        .prediction_at(next_hour)
                        .map(|p| p.confidence)
                        .unwrap_or(RISING_CONFIDENCE_FLOOR),
                    target_date: date,
                    created_at,
                });
            }
        }

        if let Some(best) = ranked.first() {
            for rule in TIME_OF_DAY_RULES.iter().filter(|r| r.matches(current_hour)) {
                recommendations.push(Recommendation {
                    zone_id: best.zone.id,
                    kind: RecommendationKind::TimeOfDay,
                    title: rule.title.to_string(),
                    description: format!("{} {}.", rule.description, best.zone.name),
                    impact: rule.impact,
                    confidence: rule.confidence,
                    target_date: date,
                    created_at,
                });
            }
        }

        recommendations
    }

    /// Replace the stored recommendations for `date`
    pub async fn persist(&self, date: NaiveDate, recommendations: &[Recommendation]) -> Result<()> {
        self.forecasts.replace_recommendations(date, recommendations).await
    }
}
