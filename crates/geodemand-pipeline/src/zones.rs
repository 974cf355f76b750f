//! Zone selection and reconciliation with the zone store

use chrono::Utc;
use geodemand_core::config::{ConfidenceWeights, PipelineSettings};
use geodemand_core::error::Result;
use geodemand_core::models::{Coordinate, Zone, ZoneId};
use geodemand_geo::footprint::{square_ring, ZONE_HALF_WIDTH_DEG};
use geodemand_geo::grid::GridCell;
use geodemand_llm::{name_or_fallback, Narrator};
use geodemand_store::ZoneStore;
use std::collections::HashMap;
use std::sync::Arc;

use crate::aggregate::GeoCell;

/// Parameters for turning aggregated cells into zone candidates
#[derive(Debug, Clone)]
pub struct SelectionParams {
    /// Cells with fewer orders are never zones
    pub min_orders: u32,
    /// Maximum number of zones kept
    pub top_n: usize,
    /// Days in the aggregation window, used for daily averages
    pub window_days: u32,
    pub weights: ConfidenceWeights,
}

impl SelectionParams {
    pub fn from_settings(settings: &PipelineSettings) -> Self {
        Self {
            min_orders: settings.min_zone_orders,
            top_n: settings.max_zones,
            window_days: settings.zone_window_days,
            weights: settings.confidence,
        }
    }
}

impl Default for SelectionParams {
    fn default() -> Self {
        Self::from_settings(&PipelineSettings::default())
    }
}

/// A grid cell that qualified as a zone in this run
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneCandidate {
    pub cell_key: String,
    pub center: Coordinate,
    pub footprint: Vec<Coordinate>,
    pub order_count: u32,
    pub total_earnings: f64,
    /// Average calls per day over the window
    pub expected_calls: u32,
    pub avg_fee: f64,
    pub avg_duration: f64,
    pub avg_rating: f64,
    pub confidence: f64,
}

/// Heuristic zone confidence from volume, rating and speed
pub fn zone_confidence(
    order_count: u32,
    avg_rating: f64,
    avg_duration: f64,
    weights: &ConfidenceWeights,
) -> f64 {
    let speed_bonus = if avg_duration < weights.fast_threshold_minutes {
        weights.fast_bonus
    } else {
        weights.slow_bonus
    };
    let raw = f64::from(order_count) * weights.per_order
        + avg_rating * weights.per_rating_point
        + speed_bonus;
    raw.clamp(weights.min, weights.max)
}

/// Rank cells by total earnings and keep the best `top_n` above `min_orders`
pub fn select_zones(
    cells: &HashMap<GridCell, GeoCell>,
    params: &SelectionParams,
) -> Vec<ZoneCandidate> {
    let mut qualified: Vec<(String, &GeoCell)> = cells
        .values()
        .filter(|c| c.order_count >= params.min_orders)
        .map(|c| (c.cell.key(), c))
        .collect();

    qualified.sort_by(|(a_key, a), (b_key, b)| {
        b.total_earnings.total_cmp(&a.total_earnings).then_with(|| a_key.cmp(b_key))
    });
    qualified.truncate(params.top_n);

    let window_days = f64::from(params.window_days.max(1));

    qualified
        .into_iter()
        .map(|(cell_key, stats)| {
            let center = stats.cell.center();
            let avg_rating = stats.avg_rating();
            let avg_duration = stats.avg_duration();

            ZoneCandidate {
                cell_key,
                footprint: square_ring(&center, ZONE_HALF_WIDTH_DEG),
                center,
                order_count: stats.order_count,
                total_earnings: stats.total_earnings,
                expected_calls: (f64::from(stats.order_count) / window_days).round() as u32,
                avg_fee: stats.avg_earnings(),
                avg_duration,
                avg_rating,
                confidence: zone_confidence(
                    stats.order_count,
                    avg_rating,
                    avg_duration,
                    &params.weights,
                ),
            }
        })
        .collect()
}

/// Writes zone candidates into the zone store, keyed by cell
pub struct ZoneSynchronizer {
    zones: Arc<dyn ZoneStore>,
    narrator: Arc<dyn Narrator>,
    deactivate_missing: bool,
}

impl ZoneSynchronizer {
    pub fn new(zones: Arc<dyn ZoneStore>, narrator: Arc<dyn Narrator>) -> Self {
        Self { zones, narrator, deactivate_missing: false }
    }

    /// Deactivate active zones that did not qualify in this run
    pub fn with_deactivation(mut self, enabled: bool) -> Self {
        self.deactivate_missing = enabled;
        self
    }

    /// Insert or update one zone per candidate.
    ///
    /// Returns the number of zones written. A narrator failure never fails
    /// the call: new zones get the coordinate name and existing zones keep
    /// the name they already have.
    pub async fn reconcile(&self, candidates: &[ZoneCandidate]) -> Result<usize> {
        let mut kept: Vec<ZoneId> = Vec::with_capacity(candidates.len());
        let mut inserted = 0usize;
        let mut updated = 0usize;

        for candidate in candidates {
            let now = Utc::now();
            match self.zones.find_zone_by_key(&candidate.cell_key).await? {
                Some(existing) => {
                    let name = match self.narrator.name_for_coordinate(&candidate.center).await {
                        Ok(name) => name,
                        Err(e) => {
                            tracing::warn!(
                                error = %e,
                                cell = %candidate.cell_key,
                                "Zone naming failed, keeping existing name"
                            );
                            existing.name.clone()
                        }
                    };

                    let zone = Zone {
                        name,
                        footprint: candidate.footprint.clone(),
                        expected_calls: candidate.expected_calls,
                        avg_fee: candidate.avg_fee,
                        confidence: candidate.confidence,
                        is_active: true,
                        updated_at: now,
                        ..existing
                    };
                    self.zones.update_zone(&zone).await?;
                    kept.push(zone.id);
                    updated += 1;
                }
                None => {
                    let zone = Zone {
                        id: ZoneId::new(),
                        cell_key: candidate.cell_key.clone(),
                        name: name_or_fallback(self.narrator.as_ref(), &candidate.center).await,
                        footprint: candidate.footprint.clone(),
                        expected_calls: candidate.expected_calls,
                        avg_fee: candidate.avg_fee,
                        confidence: candidate.confidence,
                        is_active: true,
                        created_at: now,
                        updated_at: now,
                    };
                    let id = self.zones.insert_zone(&zone).await?;
                    kept.push(id);
                    inserted += 1;
                }
            }
        }

        let deactivated = if self.deactivate_missing {
            self.zones.deactivate_zones(&kept).await?
        } else {
            0
        };

        tracing::info!(inserted, updated, deactivated, "Zones reconciled");

        Ok(inserted + updated)
    }
}
