//! Static HTML rendering for financial and member reports.
//!
//! Every user-controlled value goes through [`esc`] before it reaches the
//! document, including names, labels and file-derived strings.

use chrono::NaiveDate;
use db::models::{charge::Charge, space::{Space, SpaceMember}};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::finance::{FinancialMetrics, Forecast, MonthlyFinance, ReportPeriod};

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct MembersReport {
    pub success: bool,
    pub html: String,
}

/// HTML-escape a user-controlled value.
fn esc(value: &str) -> String {
    html_escape::encode_text(value).into_owned()
}

fn fcfa(montant: i64) -> String {
    format!("{montant} FCFA")
}

fn month_label(date: NaiveDate) -> String {
    date.format("%Y-%m").to_string()
}

fn period_label(period: &ReportPeriod) -> String {
    match (period.from, period.to) {
        (Some(from), Some(to)) => format!("du {} au {}", from, to),
        (Some(from), None) => format!("depuis le {from}"),
        (None, Some(to)) => format!("jusqu'au {to}"),
        (None, None) => "toutes périodes".to_string(),
    }
}

fn document(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"fr\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{title}</title>\n\
         <style>body{{font-family:sans-serif;margin:2rem}}table{{border-collapse:collapse}}\
         td,th{{border:1px solid #ccc;padding:4px 8px;text-align:left}}</style>\n\
         </head>\n<body>\n{body}</body>\n</html>\n"
    )
}

/// Render the full financial report: headline metrics, monthly series,
/// overdue payments, charges and the forecast.
pub fn render_financial_report(
    space: &Space,
    period: &ReportPeriod,
    metrics: &FinancialMetrics,
    series: &[MonthlyFinance],
    projection: &Forecast,
    charges: &[Charge],
) -> String {
    let mut body = String::new();

    body.push_str(&format!(
        "<h1>Rapport financier · {}</h1>\n<p>Période : {}</p>\n",
        esc(&space.nom),
        esc(&period_label(period)),
    ));

    body.push_str(&format!(
        "<h2>Synthèse</h2>\n<table>\n\
         <tr><th>Revenus</th><td>{}</td></tr>\n\
         <tr><th>Charges</th><td>{}</td></tr>\n\
         <tr><th>Bénéfice net</th><td>{}</td></tr>\n\
         <tr><th>Marge</th><td>{:.1}%</td></tr>\n</table>\n",
        fcfa(metrics.total_revenus),
        fcfa(metrics.total_charges),
        fcfa(metrics.benefice_net),
        metrics.marge,
    ));

    body.push_str("<h2>Évolution mensuelle</h2>\n");
    if series.is_empty() {
        body.push_str("<p>Aucun mouvement sur la période.</p>\n");
    } else {
        body.push_str(
            "<table>\n<tr><th>Mois</th><th>Revenus</th><th>Charges</th><th>Bénéfice</th></tr>\n",
        );
        for m in series {
            body.push_str(&format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
                month_label(m.mois),
                fcfa(m.revenus),
                fcfa(m.charges),
                fcfa(m.revenus - m.charges),
            ));
        }
        body.push_str("</table>\n");
    }

    body.push_str("<h2>Paiements en retard</h2>\n");
    if metrics.en_retard.is_empty() {
        body.push_str("<p>Aucun paiement en retard.</p>\n");
    } else {
        body.push_str("<table>\n<tr><th>Mois concerné</th><th>Montant</th></tr>\n");
        for late in &metrics.en_retard {
            body.push_str(&format!(
                "<tr><td>{}</td><td>{}</td></tr>\n",
                month_label(late.mois_concerne),
                fcfa(late.montant),
            ));
        }
        body.push_str("</table>\n");
    }

    body.push_str("<h2>Charges</h2>\n");
    if charges.is_empty() {
        body.push_str("<p>Aucune charge enregistrée.</p>\n");
    } else {
        body.push_str(
            "<table>\n<tr><th>Date</th><th>Libellé</th><th>Catégorie</th><th>Montant</th></tr>\n",
        );
        for c in charges {
            body.push_str(&format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
                c.date_charge,
                esc(&c.libelle),
                esc(&c.categorie),
                fcfa(c.montant),
            ));
        }
        body.push_str("</table>\n");
    }

    body.push_str("<h2>Prévision</h2>\n");
    match projection {
        Forecast::Insuffisant { mois_disponibles } => {
            body.push_str(&format!(
                "<p>Historique insuffisant pour une prévision ({mois_disponibles} mois disponibles, 3 requis).</p>\n"
            ));
        }
        Forecast::Projection { mois } => {
            body.push_str(
                "<table>\n<tr><th>Mois</th><th>Revenus</th><th>Charges</th>\
                 <th>Bénéfice</th><th>Trésorerie cumulée</th><th>Confiance</th></tr>\n",
            );
            for m in mois {
                body.push_str(&format!(
                    "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}%</td></tr>\n",
                    month_label(m.mois),
                    fcfa(m.revenus),
                    fcfa(m.charges),
                    fcfa(m.benefice),
                    fcfa(m.tresorerie_cumulee),
                    m.confiance,
                ));
            }
            body.push_str("</table>\n");
        }
    }

    document(&format!("Rapport financier · {}", esc(&space.nom)), &body)
}

pub fn render_members_report(space: &Space, members: &[SpaceMember]) -> MembersReport {
    let mut body = String::new();
    body.push_str(&format!("<h1>Membres · {}</h1>\n", esc(&space.nom)));

    if members.is_empty() {
        body.push_str("<p>Aucun membre dans cet espace.</p>\n");
    } else {
        body.push_str("<table>\n<tr><th>Utilisateur</th><th>Rôle</th><th>Depuis</th></tr>\n");
        for member in members {
            body.push_str(&format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td></tr>\n",
                member.user_id,
                esc(&member.role.to_string()),
                member.created_at.format("%Y-%m-%d"),
            ));
        }
        body.push_str("</table>\n");
    }

    MembersReport {
        success: true,
        html: document(&format!("Membres · {}", esc(&space.nom)), &body),
    }
}
