use std::collections::BTreeMap;

use serde::Serialize;

use crate::filter::{apply_predicates, Predicate};
use crate::models::{Lead, LeadStatus, Record, Sale};
use crate::store::{CrmData, Directory};

/// Bucket used for records with no value under the counted key
pub const NO_VALUE: &str = "none";

/// Count records per value of a category key
pub fn count_by<'a, R: Record + 'a>(
    records: impl IntoIterator<Item = &'a R>,
    key: &str,
) -> BTreeMap<String, u64> {
    let mut counts = BTreeMap::new();
    for record in records {
        let value = record.category(key).unwrap_or(NO_VALUE);
        *counts.entry(value.to_string()).or_insert(0) += 1;
    }
    counts
}

fn in_scope<'a, R: Record>(records: &'a [R], scope: Option<&Predicate>) -> Vec<&'a R> {
    match scope {
        Some(predicate) => apply_predicates(std::slice::from_ref(predicate), records),
        None => records.iter().collect(),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadStats {
    pub total: u64,
    pub unassigned: u64,
    pub converted: u64,
    /// converted / total, 0 when there are no leads
    pub conversion_rate: f64,
    pub by_status: BTreeMap<String, u64>,
    pub by_source: BTreeMap<String, u64>,
}

impl LeadStats {
    pub fn compute(leads: &[&Lead]) -> Self {
        let total = leads.len() as u64;
        let converted = leads
            .iter()
            .filter(|l| l.status == LeadStatus::Converted)
            .count() as u64;
        let conversion_rate = if total == 0 {
            0.0
        } else {
            converted as f64 / total as f64
        };

        Self {
            total,
            unassigned: leads.iter().filter(|l| l.is_unassigned()).count() as u64,
            converted,
            conversion_rate,
            by_status: count_by(leads.iter().copied(), "status"),
            by_source: count_by(leads.iter().copied(), "source"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentSales {
    pub agent_id: String,
    pub agent_name: String,
    pub count: u64,
    pub closed_count: u64,
    pub closed_amount: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesSummary {
    pub count: u64,
    pub closed_count: u64,
    pub closed_amount: f64,
    /// Highest closed amount first
    pub by_agent: Vec<AgentSales>,
}

impl SalesSummary {
    pub fn compute(sales: &[&Sale], directory: &Directory) -> Self {
        let mut summary = SalesSummary::default();
        let mut per_agent: BTreeMap<&str, AgentSales> = BTreeMap::new();

        for sale in sales {
            summary.count += 1;
            let agent_id = sale.agent_id.as_deref().unwrap_or(NO_VALUE);
            let agent = per_agent.entry(agent_id).or_insert_with(|| AgentSales {
                agent_id: agent_id.to_string(),
                agent_name: directory.display_name(agent_id).to_string(),
                ..AgentSales::default()
            });
            agent.count += 1;

            if sale.is_closed() {
                summary.closed_count += 1;
                summary.closed_amount += sale.amount;
                agent.closed_count += 1;
                agent.closed_amount += sale.amount;
            }
        }

        summary.by_agent = per_agent.into_values().collect();
        summary
            .by_agent
            .sort_by(|a, b| b.closed_amount.total_cmp(&a.closed_amount));
        summary
    }
}

/// Everything the dashboard screen shows
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub leads: LeadStats,
    pub prospects_by_status: BTreeMap<String, u64>,
    pub visits_by_status: BTreeMap<String, u64>,
    pub sales: SalesSummary,
}

impl DashboardSummary {
    /// Summarize `data`, restricted to records matching `scope` when given
    /// (the role scope from [`Directory::visible_assignees`]).
    pub fn compute(data: &CrmData, scope: Option<&Predicate>) -> Self {
        let directory = data.directory();
        let leads = in_scope(data.leads.records(), scope);
        let sales = in_scope(data.sales.records(), scope);

        Self {
            leads: LeadStats::compute(&leads),
            prospects_by_status: count_by(in_scope(data.prospects.records(), scope), "status"),
            visits_by_status: count_by(in_scope(data.visits.records(), scope), "status"),
            sales: SalesSummary::compute(&sales, &directory),
        }
    }
}
