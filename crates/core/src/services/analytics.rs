//! Complaint statistics for the admin dashboard, the analytics page and
//! student profiles.

use std::collections::BTreeMap;

use broto_common::AppResult;
use broto_db::entities::{Complaint, ComplaintCategory, ComplaintStatus};
use broto_db::repositories::ComplaintRepository;
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::Serialize;

use super::access::Viewer;

/// How many calendar months the trend chart covers, current month included.
pub const TREND_MONTHS: u32 = 6;

/// Counters on top of the admin dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardStats {
    pub total: usize,
    pub pending: usize,
    pub in_progress: usize,
    pub resolved: usize,
    pub by_category: BTreeMap<ComplaintCategory, usize>,
    pub avg_rating: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthCount {
    /// Label such as `Jan 2024`.
    pub month: String,
    pub complaints: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Analytics {
    pub total: usize,
    /// Mean whole days from filing to resolution.
    pub avg_resolution_days: f64,
    pub avg_rating: f64,
    pub by_category: BTreeMap<ComplaintCategory, usize>,
    pub by_status: BTreeMap<ComplaintStatus, usize>,
    /// Oldest month first.
    pub monthly: Vec<MonthCount>,
}

/// Numbers shown on a student's profile.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileStats {
    pub total: usize,
    pub resolved: usize,
    pub avg_rating: f64,
    pub joined: DateTime<Utc>,
}

#[allow(clippy::cast_precision_loss)]
fn mean(values: impl Iterator<Item = i64>) -> f64 {
    let (sum, n) = values.fold((0_i64, 0_usize), |(s, n), v| (s + v, n + 1));
    if n == 0 { 0.0 } else { sum as f64 / n as f64 }
}

/// Average over complaints that carry a rating; zero when none do.
#[must_use]
pub fn average_rating(complaints: &[Complaint]) -> f64 {
    mean(complaints.iter().filter_map(|c| c.rating).map(i64::from))
}

fn count_by<K: Ord>(complaints: &[Complaint], key: impl Fn(&Complaint) -> K) -> BTreeMap<K, usize> {
    let mut map = BTreeMap::new();
    for c in complaints {
        *map.entry(key(c)).or_insert(0) += 1;
    }
    map
}

fn count_status(complaints: &[Complaint], status: ComplaintStatus) -> usize {
    complaints.iter().filter(|c| c.status == status).count()
}

#[must_use]
pub fn dashboard_stats(complaints: &[Complaint]) -> DashboardStats {
    DashboardStats {
        total: complaints.len(),
        pending: count_status(complaints, ComplaintStatus::Pending),
        in_progress: count_status(complaints, ComplaintStatus::InProgress),
        resolved: count_status(complaints, ComplaintStatus::Resolved),
        by_category: count_by(complaints, |c| c.category),
        avg_rating: average_rating(complaints),
    }
}

/// First day of the month `back` months before the month containing `now`.
#[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
fn month_start(now: DateTime<Utc>, back: u32) -> Option<NaiveDate> {
    let index = now.year() * 12 + now.month0() as i32 - back as i32;
    NaiveDate::from_ymd_opt(index.div_euclid(12), index.rem_euclid(12) as u32 + 1, 1)
}

fn month_label(date: NaiveDate) -> String {
    date.format("%b %Y").to_string()
}

#[must_use]
pub fn analytics(complaints: &[Complaint], now: DateTime<Utc>) -> Analytics {
    let avg_resolution_days = mean(
        complaints
            .iter()
            .filter(|c| c.status == ComplaintStatus::Resolved)
            .map(|c| (c.updated_at - c.created_at).num_days()),
    );

    let mut monthly: Vec<MonthCount> = (0..TREND_MONTHS)
        .rev()
        .filter_map(|back| month_start(now, back))
        .map(|start| MonthCount {
            month: month_label(start),
            complaints: 0,
        })
        .collect();
    for c in complaints {
        let label = month_label(c.created_at.date_naive());
        if let Some(slot) = monthly.iter_mut().find(|m| m.month == label) {
            slot.complaints += 1;
        }
    }

    Analytics {
        total: complaints.len(),
        avg_resolution_days,
        avg_rating: average_rating(complaints),
        by_category: count_by(complaints, |c| c.category),
        by_status: count_by(complaints, |c| c.status),
        monthly,
    }
}

#[must_use]
pub fn profile_stats(complaints: &[Complaint], joined: DateTime<Utc>) -> ProfileStats {
    ProfileStats {
        total: complaints.len(),
        resolved: count_status(complaints, ComplaintStatus::Resolved),
        avg_rating: average_rating(complaints),
        joined,
    }
}

/// Analytics service for the admin pages.
#[derive(Clone)]
pub struct AnalyticsService {
    complaint_repo: ComplaintRepository,
}

impl AnalyticsService {
    /// Create a new analytics service.
    #[must_use]
    pub const fn new(complaint_repo: ComplaintRepository) -> Self {
        Self { complaint_repo }
    }

    pub async fn dashboard(&self, admin: &Viewer) -> AppResult<DashboardStats> {
        admin.ensure_admin()?;
        let complaints = self.complaint_repo.find_all(None).await?;
        Ok(dashboard_stats(&complaints))
    }

    pub async fn analytics(&self, admin: &Viewer) -> AppResult<Analytics> {
        admin.ensure_admin()?;
        let complaints = self.complaint_repo.find_all(None).await?;
        Ok(analytics(&complaints, Utc::now()))
    }
}
