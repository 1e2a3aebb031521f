//! Financial aggregation over payments and charges, plus a simple linear
//! trend projection.

use chrono::{Datelike, Months, NaiveDate};
use db::models::{
    charge::Charge,
    payment::{Payment, PaymentStatus},
    space::{Space, SpaceMember},
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use thiserror::Error;
use ts_rs::TS;
use uuid::Uuid;

use super::report::{self, MembersReport};

/// Below this much history the forecast reports insufficient data instead of
/// projecting.
pub const MIN_HISTORY_MONTHS: usize = 3;
pub const DEFAULT_FORECAST_HORIZON: u32 = 6;

#[derive(Debug, Error)]
pub enum FinanceError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("space not found")]
    SpaceNotFound,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
pub struct ReportPeriod {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

/// A pending payment whose due month is already behind us.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct OverduePayment {
    pub payment_id: Uuid,
    pub lease_id: Uuid,
    pub montant: i64,
    pub mois_concerne: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct FinancialMetrics {
    pub total_revenus: i64,
    pub total_charges: i64,
    pub benefice_net: i64,
    /// Net margin in percent; 0 when there is no revenue.
    pub marge: f64,
    pub en_retard: Vec<OverduePayment>,
}

/// Revenue and charges bucketed by calendar month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct MonthlyFinance {
    pub mois: NaiveDate,
    pub revenus: i64,
    pub charges: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct ForecastMonth {
    pub mois: NaiveDate,
    pub revenus: i64,
    pub charges: i64,
    pub benefice: i64,
    pub tresorerie_cumulee: i64,
    /// Confidence percentage, decreasing with horizon distance.
    pub confiance: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "statut", rename_all = "snake_case")]
pub enum Forecast {
    Insuffisant { mois_disponibles: usize },
    Projection { mois: Vec<ForecastMonth> },
}

/// Sum up revenue (succeeded payments), charges and overdue pending payments.
/// Pure and deterministic; `today` is passed in rather than read from a clock.
pub fn aggregate_metrics(
    payments: &[Payment],
    charges: &[Charge],
    today: NaiveDate,
) -> FinancialMetrics {
    let total_revenus: i64 = payments
        .iter()
        .filter(|p| p.statut == PaymentStatus::Reussi)
        .map(|p| p.montant)
        .sum();
    let total_charges: i64 = charges.iter().map(|c| c.montant).sum();
    let benefice_net = total_revenus - total_charges;

    let marge = if total_revenus == 0 {
        0.0
    } else {
        benefice_net as f64 / total_revenus as f64 * 100.0
    };

    let en_retard = payments
        .iter()
        .filter(|p| p.statut == PaymentStatus::EnAttente && p.mois_concerne < today)
        .map(|p| OverduePayment {
            payment_id: p.id,
            lease_id: p.lease_id,
            montant: p.montant,
            mois_concerne: p.mois_concerne,
        })
        .collect();

    FinancialMetrics {
        total_revenus,
        total_charges,
        benefice_net,
        marge,
        en_retard,
    }
}

/// Bucket succeeded payments and all charges by calendar month, sorted
/// ascending.
pub fn monthly_series(payments: &[Payment], charges: &[Charge]) -> Vec<MonthlyFinance> {
    use std::collections::BTreeMap;

    let mut buckets: BTreeMap<NaiveDate, (i64, i64)> = BTreeMap::new();
    for payment in payments.iter().filter(|p| p.statut == PaymentStatus::Reussi) {
        let entry = buckets.entry(month_start(payment.mois_concerne)).or_default();
        entry.0 += payment.montant;
    }
    for charge in charges {
        let entry = buckets.entry(month_start(charge.date_charge)).or_default();
        entry.1 += charge.montant;
    }

    buckets
        .into_iter()
        .map(|(mois, (revenus, charges))| MonthlyFinance {
            mois,
            revenus,
            charges,
        })
        .collect()
}

/// Project revenue and charges forward with a least-squares linear fit over
/// the history. Confidence shrinks the further out the month is.
pub fn forecast(history: &[MonthlyFinance], horizon_months: u32) -> Forecast {
    if history.len() < MIN_HISTORY_MONTHS {
        return Forecast::Insuffisant {
            mois_disponibles: history.len(),
        };
    }

    let revenus: Vec<f64> = history.iter().map(|m| m.revenus as f64).collect();
    let charges: Vec<f64> = history.iter().map(|m| m.charges as f64).collect();
    let (rev_slope, rev_intercept) = linear_fit(&revenus);
    let (chg_slope, chg_intercept) = linear_fit(&charges);

    let n = history.len() as f64;
    let last_month = history[history.len() - 1].mois;
    let mut mois = Vec::with_capacity(horizon_months as usize);
    let mut tresorerie = 0i64;

    for step in 1..=horizon_months {
        let x = n - 1.0 + step as f64;
        let revenus = (rev_slope * x + rev_intercept).round().max(0.0) as i64;
        let charges = (chg_slope * x + chg_intercept).round().max(0.0) as i64;
        let benefice = revenus - charges;
        tresorerie += benefice;

        mois.push(ForecastMonth {
            mois: add_months(last_month, step),
            revenus,
            charges,
            benefice,
            tresorerie_cumulee: tresorerie,
            confiance: confidence(step),
        });
    }

    Forecast::Projection { mois }
}

/// Least-squares fit of y over x = 0..len, returning (slope, intercept).
fn linear_fit(values: &[f64]) -> (f64, f64) {
    let n = values.len() as f64;
    let mean_x = (n - 1.0) / 2.0;
    let mean_y = values.iter().sum::<f64>() / n;

    let mut num = 0.0;
    let mut den = 0.0;
    for (i, y) in values.iter().enumerate() {
        let dx = i as f64 - mean_x;
        num += dx * (y - mean_y);
        den += dx * dx;
    }

    if den == 0.0 {
        return (0.0, mean_y);
    }
    let slope = num / den;
    (slope, mean_y - slope * mean_x)
}

fn confidence(step: u32) -> u8 {
    (90i64 - 10 * i64::from(step)).max(30) as u8
}

fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

fn add_months(date: NaiveDate, months: u32) -> NaiveDate {
    month_start(date)
        .checked_add_months(Months::new(months))
        .unwrap_or(date)
}

pub struct FinanceService;

impl FinanceService {
    /// Build the full financial report for a space as a static HTML document.
    pub async fn financial_report_html(
        pool: &SqlitePool,
        space_id: Uuid,
        period: &ReportPeriod,
        today: NaiveDate,
    ) -> Result<String, FinanceError> {
        let space = Space::find_by_id(pool, space_id)
            .await?
            .ok_or(FinanceError::SpaceNotFound)?;

        let payments =
            Payment::find_by_space_in_period(pool, space_id, period.from, period.to).await?;
        let charges =
            Charge::find_by_space_in_period(pool, space_id, period.from, period.to).await?;

        let metrics = aggregate_metrics(&payments, &charges, today);
        let series = monthly_series(&payments, &charges);
        let projection = forecast(&series, DEFAULT_FORECAST_HORIZON);

        Ok(report::render_financial_report(
            &space,
            period,
            &metrics,
            &series,
            &projection,
            &charges,
        ))
    }

    pub async fn members_report(
        pool: &SqlitePool,
        space_id: Uuid,
    ) -> Result<MembersReport, FinanceError> {
        let space = Space::find_by_id(pool, space_id)
            .await?
            .ok_or(FinanceError::SpaceNotFound)?;
        let members = SpaceMember::find_by_space_id(pool, space_id).await?;
        Ok(report::render_members_report(&space, &members))
    }
}
