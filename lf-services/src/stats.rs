//! Aggregations computed client-side over report lists.

use chrono::{Datelike, Months, NaiveDate};
use serde::Serialize;

use lf_models::{Report, ReportKind, ReportStatus};

/// Report counts per status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub reported: u64,
    pub verified: u64,
    pub matched: u64,
    pub returned: u64,
}

impl StatusCounts {
    pub fn add(&mut self, status: ReportStatus) {
        match status {
            ReportStatus::Reported => self.reported += 1,
            ReportStatus::Verified => self.verified += 1,
            ReportStatus::Matched => self.matched += 1,
            ReportStatus::Returned => self.returned += 1,
        }
    }

    pub fn get(&self, status: ReportStatus) -> u64 {
        match status {
            ReportStatus::Reported => self.reported,
            ReportStatus::Verified => self.verified,
            ReportStatus::Matched => self.matched,
            ReportStatus::Returned => self.returned,
        }
    }

    pub fn total(&self) -> u64 {
        self.reported + self.verified + self.matched + self.returned
    }
}

impl<'a> FromIterator<&'a Report> for StatusCounts {
    fn from_iter<I: IntoIterator<Item = &'a Report>>(iter: I) -> Self {
        let mut counts = Self::default();
        for report in iter {
            counts.add(report.status);
        }
        counts
    }
}

/// Counts per kind and per status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReportSummary {
    pub total: u64,
    pub lost: u64,
    pub found: u64,
    pub by_status: StatusCounts,
}

impl ReportSummary {
    pub fn from_reports(reports: &[Report]) -> Self {
        let lost = reports.iter().filter(|r| r.kind == ReportKind::Lost).count() as u64;
        Self {
            total: reports.len() as u64,
            lost,
            found: reports.len() as u64 - lost,
            by_status: reports.iter().collect(),
        }
    }
}

/// Report counts for one calendar month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyBucket {
    /// First day of the month.
    pub month: NaiveDate,
    /// Short month name ("Jan").
    pub name: String,
    pub lost: u64,
    pub found: u64,
    pub returned: u64,
}

/// First day of the month `months_back` months before `today`'s month.
pub fn month_start(today: NaiveDate, months_back: u32) -> NaiveDate {
    let first = today.with_day(1).unwrap_or(today);
    first.checked_sub_months(Months::new(months_back)).unwrap_or(first)
}

/// Empty buckets for the `months` calendar months ending with `today`'s,
/// oldest first.
pub fn empty_buckets(today: NaiveDate, months: u32) -> Vec<MonthlyBucket> {
    (0..months)
        .rev()
        .map(|back| {
            let month = month_start(today, back);
            MonthlyBucket {
                month,
                name: month.format("%b").to_string(),
                lost: 0,
                found: 0,
                returned: 0,
            }
        })
        .collect()
}

/// Bucket reports by the month of their item date. Reports outside the
/// window are ignored; returned reports count in both their kind and
/// `returned`.
pub fn monthly_buckets(today: NaiveDate, months: u32, reports: &[Report]) -> Vec<MonthlyBucket> {
    let mut buckets = empty_buckets(today, months);
    for report in reports {
        let Some(bucket) = buckets
            .iter_mut()
            .find(|b| {
                b.month.year() == report.date.year() && b.month.month() == report.date.month()
            })
        else {
            continue;
        };
        match report.kind {
            ReportKind::Lost => bucket.lost += 1,
            ReportKind::Found => bucket.found += 1,
        }
        if report.status == ReportStatus::Returned {
            bucket.returned += 1;
        }
    }
    buckets
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn report(kind: ReportKind, status: ReportStatus, date: &str) -> Report {
        Report {
            id: format!("{kind}-{date}"),
            kind,
            user_id: "u1".into(),
            name: "Item".into(),
            category: "other".into(),
            description: "Something somewhere".into(),
            location: "Hall".into(),
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            status,
            image_url: None,
            created_at: Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap(),
            reporter_name: None,
        }
    }

    #[test]
    fn test_month_start_crosses_year() {
        let today = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(month_start(today, 0), NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        assert_eq!(month_start(today, 5), NaiveDate::from_ymd_opt(2023, 9, 1).unwrap());
    }

    #[test]
    fn test_always_six_buckets_oldest_first() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let buckets = monthly_buckets(today, 6, &[]);
        assert_eq!(buckets.len(), 6);
        let names: Vec<&str> = buckets.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["Oct", "Nov", "Dec", "Jan", "Feb", "Mar"]);
    }

    #[test]
    fn test_bucketing_by_item_date() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let reports = vec![
            report(ReportKind::Lost, ReportStatus::Returned, "2024-03-02"),
            report(ReportKind::Found, ReportStatus::Reported, "2024-03-20"),
            report(ReportKind::Found, ReportStatus::Returned, "2023-12-31"),
            report(ReportKind::Lost, ReportStatus::Reported, "2023-01-01"),
        ];
        let buckets = monthly_buckets(today, 6, &reports);
        let march = buckets.last().unwrap();
        assert_eq!((march.lost, march.found, march.returned), (1, 1, 1));
        let december = &buckets[2];
        assert_eq!((december.lost, december.found, december.returned), (0, 1, 1));
        let total: u64 = buckets.iter().map(|b| b.lost + b.found).sum();
        assert_eq!(total, 3);
    }

    #[test]
    fn test_summary_counts() {
        let reports = vec![
            report(ReportKind::Lost, ReportStatus::Reported, "2024-03-02"),
            report(ReportKind::Lost, ReportStatus::Verified, "2024-03-02"),
            report(ReportKind::Found, ReportStatus::Verified, "2024-03-02"),
        ];
        let summary = ReportSummary::from_reports(&reports);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.lost, 2);
        assert_eq!(summary.found, 1);
        assert_eq!(summary.by_status.get(ReportStatus::Verified), 2);
        assert_eq!(summary.by_status.total(), 3);
    }
}
