use std::sync::PoisonError;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use gridtrack_core::{
    CycleReport, GridError, HealthReport, InterpolationOutcome, ReconciliationReport,
    SeriesConfig, SeriesCycleReport, SeriesReport,
};

use crate::Collector;

impl Collector {
    /// Run one reconciliation cycle across every configured series.
    ///
    /// Per series, in order: latest collection, recent gap fill, backfill,
    /// forecast promotion (when enabled) and interpolation (when enabled).
    /// Different series run interleaved; a series never runs two cycles at
    /// once. Nothing is raised out of a cycle: failures land in the report.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "gridtrack::run_cycle", skip(self))
    )]
    pub async fn run_cycle(&self, now: DateTime<Utc>) -> CycleReport {
        let series = join_all(self.cfg.series.iter().map(|sc| self.run_series_cycle(sc, now))).await;

        {
            let mut last = self.last_filled.lock().unwrap_or_else(PoisonError::into_inner);
            for r in &series {
                last.insert(r.series, r.filled());
            }
        }
        #[cfg(feature = "tracing")]
        for r in &series {
            tracing::info!(
                series = %r.series,
                filled = r.filled(),
                warnings = r.all_warnings().len(),
                "reconciliation cycle finished"
            );
        }
        CycleReport { now, series }
    }

    async fn run_series_cycle(&self, sc: &SeriesConfig, now: DateTime<Utc>) -> SeriesCycleReport {
        let _guard = self.lock_series(sc.series).await;
        let mut report = SeriesCycleReport::new(sc.series);

        match self.collect_latest_series(sc, now).await {
            Ok(o) => report.latest = o,
            Err(e) => report.errors.push(e),
        }
        match self.fill_recent_gaps_series(sc, now).await {
            Ok(o) => report.gap_fill = o,
            Err(e) => report.errors.push(e),
        }
        match self.backfill_series(sc, now).await {
            Ok(o) => report.backfill = Some(o),
            Err(e) => report.errors.push(e),
        }
        if sc.reconcile_forecasts {
            match self.reconcile_series(sc, now).await {
                Ok(o) => report.reconcile = Some(o),
                Err(e) => report.errors.push(e),
            }
        }
        if sc.interpolate {
            match self.interpolate_series(sc.series, Self::step(sc)).await {
                Ok(o) => report.interpolation = Some(o),
                Err(GridError::EmptySeries { .. }) => {
                    report.interpolation = Some(InterpolationOutcome::default());
                }
                Err(e) => report.errors.push(e),
            }
        }
        report
    }

    /// Read-only state of every configured series: gaps, duplicates,
    /// provenance counts and what the last cycle filled.
    pub async fn report(&self) -> ReconciliationReport {
        let mut series = Vec::with_capacity(self.cfg.series.len());
        for sc in &self.cfg.series {
            series.push(self.series_report(sc).await);
        }
        ReconciliationReport {
            generated_at: Utc::now(),
            series,
        }
    }

    async fn series_report(&self, sc: &SeriesConfig) -> SeriesReport {
        let step = Self::step(sc);
        let mut report = SeriesReport {
            series: sc.series,
            earliest: None,
            latest: None,
            gaps: Vec::new(),
            missing_samples: 0,
            duplicates: Vec::new(),
            provenance: Default::default(),
            filled_last_cycle: self
                .last_filled
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .get(&sc.series)
                .copied()
                .unwrap_or(0),
            warnings: Vec::new(),
        };

        match self.store.min_max_instant(sc.series).await {
            Ok(Some((min, max))) => {
                report.earliest = Some(min);
                report.latest = Some(max);
            }
            Ok(None) => return report,
            Err(e) => {
                report.warnings.push(e);
                return report;
            }
        }
        match self.detect(sc.series, step, None, None).await {
            Ok(gaps) => {
                report.missing_samples = gaps.iter().map(|g| g.missing_count(step)).sum();
                report.gaps = gaps;
            }
            Err(e) => report.warnings.push(e),
        }
        match self.duplicates(sc.series).await {
            Ok(d) => report.duplicates = d,
            Err(e) => report.warnings.push(e),
        }
        match self.store.count_by_provenance(sc.series).await {
            Ok(c) => report.provenance = c,
            Err(e) => report.warnings.push(e),
        }
        report
    }

    /// Probe the store and every connector exposing a health capability.
    ///
    /// Each probe is bounded by `fetch_timeout`; a timed-out probe is unhealthy.
    pub async fn health(&self) -> HealthReport {
        let store = self.store.ping().await.is_ok();
        let probes = self.connectors.iter().filter_map(|c| {
            let provider = c.as_health_provider()?;
            let name = c.name();
            let timeout = self.cfg.fetch_timeout;
            Some(async move {
                let ok = tokio::time::timeout(timeout, provider.health())
                    .await
                    .unwrap_or(false);
                (name.to_string(), ok)
            })
        });
        let connectors = join_all(probes).await;
        #[cfg(feature = "tracing")]
        for (name, ok) in &connectors {
            if !ok {
                tracing::warn!(connector = %name, "connector unhealthy");
            }
        }
        HealthReport { store, connectors }
    }
}
