//! # Dashboard Service
//!
//! Read-side aggregations for the back-office landing page and the
//! shift history browser. Nothing here mutates state.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::Serialize;

use till_core::{CashSession, HistoryFilter, PaymentMethod, DASHBOARD_SERIES_DAYS};
use till_db::Database;

use crate::error::ApiError;
use crate::services::reconcile::Reconciliation;

/// Today's trading position, as shown on the dashboard.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TodaySummary {
    /// Everything collected today across all payment methods.
    pub total_collected_cents: i64,
    /// Today's totals split by payment method.
    pub by_payment_method: BTreeMap<PaymentMethod, i64>,
    /// Best estimate of physical cash in the drawer right now.
    pub estimated_cash_cents: i64,
    /// Daily sales totals, oldest first, ending today. Days without
    /// sales appear as zero.
    pub last_seven_days: Vec<DailySales>,
}

/// One day of the dashboard sales series.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailySales {
    pub date: NaiveDate,
    pub total_cents: i64,
}

/// Dashboard and history query service.
#[derive(Debug, Clone)]
pub struct DashboardService {
    db: Database,
    reconciliation: Reconciliation,
}

impl DashboardService {
    pub fn new(db: Database, reconciliation: Reconciliation) -> Self {
        DashboardService { db, reconciliation }
    }

    /// Builds the dashboard summary.
    ///
    /// One timestamp is snapped for the whole computation; the
    /// estimated cash figure uses the open shift's window when a shift
    /// is running, and the floating balance since the last close when
    /// none is.
    pub async fn todays_summary(&self) -> Result<TodaySummary, ApiError> {
        let now = Utc::now();
        let today = now.date_naive();

        let sales_today = self
            .db
            .sales()
            .sales_in_window(start_of_day(today), now, None)
            .await?;

        let mut by_payment_method: BTreeMap<PaymentMethod, i64> = BTreeMap::new();
        let mut total_collected_cents = 0;
        for sale in &sales_today {
            *by_payment_method.entry(sale.method).or_insert(0) += sale.total_cents;
            total_collected_cents += sale.total_cents;
        }

        let estimated_cash_cents = match self.db.sessions().find_open().await? {
            Some(open) => {
                let activity = self
                    .reconciliation
                    .shift_activity(open.opened_at, now)
                    .await?;
                (open.opening() + activity.net()).cents()
            }
            None => self.reconciliation.opening_balance(now).await?.cents(),
        };

        let last_seven_days = self.daily_series(now).await?;

        Ok(TodaySummary {
            total_collected_cents,
            by_payment_method,
            estimated_cash_cents,
            last_seven_days,
        })
    }

    /// Daily sales totals for the trailing week, zero-filled.
    async fn daily_series(&self, now: DateTime<Utc>) -> Result<Vec<DailySales>, ApiError> {
        let first_day = now.date_naive() - Duration::days(DASHBOARD_SERIES_DAYS - 1);

        let sales = self
            .db
            .sales()
            .sales_in_window(start_of_day(first_day), now, None)
            .await?;

        let mut per_day: BTreeMap<NaiveDate, i64> = BTreeMap::new();
        for sale in &sales {
            *per_day.entry(sale.sold_at.date_naive()).or_insert(0) += sale.total_cents;
        }

        let series = (0..DASHBOARD_SERIES_DAYS)
            .map(|offset| {
                let date = first_day + Duration::days(offset);
                DailySales {
                    date,
                    total_cents: per_day.get(&date).copied().unwrap_or(0),
                }
            })
            .collect();

        Ok(series)
    }

    /// Filtered shift history, newest first, one page.
    pub async fn history(&self, filter: &HistoryFilter) -> Result<Vec<CashSession>, ApiError> {
        Ok(self.db.sessions().history(filter).await?)
    }
}

/// Midnight UTC at the start of the given date.
fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::session::SessionService;
    use crate::services::testutil::{seed_sale, seed_user, seed_withdrawal, test_db};

    async fn service() -> (DashboardService, SessionService) {
        let db = test_db().await;
        seed_user(&db, "cash-1", "Bob Tanaka", "cashier").await;
        let reconciliation = Reconciliation::new(db.clone());
        (
            DashboardService::new(db.clone(), reconciliation.clone()),
            SessionService::new(db, reconciliation),
        )
    }

    #[tokio::test]
    async fn test_summary_splits_todays_sales_by_method() {
        let (dashboard, _) = service().await;
        let now = Utc::now();

        seed_sale(&dashboard.db, "cash", 5_000, now - Duration::seconds(30)).await;
        seed_sale(&dashboard.db, "cash", 1_500, now - Duration::seconds(20)).await;
        seed_sale(&dashboard.db, "external_card", 7_000, now - Duration::seconds(10)).await;
        // Eight days old: outside today and outside the series window.
        seed_sale(&dashboard.db, "cash", 99_999, now - Duration::days(8)).await;

        let summary = dashboard.todays_summary().await.unwrap();

        assert_eq!(summary.total_collected_cents, 13_500);
        assert_eq!(summary.by_payment_method[&PaymentMethod::Cash], 6_500);
        assert_eq!(
            summary.by_payment_method[&PaymentMethod::ExternalCard],
            7_000
        );
    }

    #[tokio::test]
    async fn test_estimated_cash_with_open_shift() {
        let (dashboard, sessions) = service().await;

        let session = sessions.open_or_resume("cash-1").await.unwrap().unwrap();
        assert_eq!(session.opening_cents, 0);

        // Stamped after the open, so they land inside the shift window.
        seed_sale(&dashboard.db, "cash", 40_000, Utc::now()).await;
        seed_withdrawal(&dashboard.db, "cash-1", 15_000, Utc::now()).await;

        let summary = dashboard.todays_summary().await.unwrap();
        assert_eq!(summary.estimated_cash_cents, 25_000);
    }

    #[tokio::test]
    async fn test_estimated_cash_without_shift_uses_floating_balance() {
        let (dashboard, sessions) = service().await;

        // A closed shift that counted 300.00, then unattributed
        // movement afterwards.
        sessions.open_or_resume("cash-1").await.unwrap();
        seed_sale(&dashboard.db, "cash", 30_000, Utc::now()).await;
        sessions.close("cash-1", Some(30_000)).await.unwrap();

        seed_sale(&dashboard.db, "cash", 5_000, Utc::now()).await;
        seed_withdrawal(&dashboard.db, "cash-1", 2_000, Utc::now()).await;

        let summary = dashboard.todays_summary().await.unwrap();
        assert_eq!(summary.estimated_cash_cents, 33_000);
    }

    #[tokio::test]
    async fn test_series_is_zero_filled_and_ends_today() {
        let (dashboard, _) = service().await;
        let now = Utc::now();

        seed_sale(&dashboard.db, "cash", 2_000, now - Duration::days(2)).await;
        seed_sale(&dashboard.db, "external_card", 3_000, now).await;

        let summary = dashboard.todays_summary().await.unwrap();
        let series = &summary.last_seven_days;

        assert_eq!(series.len(), DASHBOARD_SERIES_DAYS as usize);
        assert_eq!(series.last().unwrap().date, now.date_naive());
        assert_eq!(series.last().unwrap().total_cents, 3_000);
        assert_eq!(series[series.len() - 3].total_cents, 2_000);
        // Untouched days are present as zeros, not gaps.
        assert_eq!(series[0].total_cents, 0);
    }
}
