//! Read and list queries
//!
//! Lists scan the relevant table, filter and order in memory, then cut the
//! requested page. The total count is taken after filtering and before
//! pagination.

use crate::engine::Engine;
use crate::error::{LedgerError, LedgerResult};
use crate::model::{Agreement, AgreementStatus, Asset, Payment, Renter};
use crate::repo::{decode_all, ledger_key, Repo};
use rentbook_storage::{Store, Table};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Default page size when the caller gives none
pub const DEFAULT_LIMIT: usize = 100;

/// Offset/limit pagination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub skip: usize,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    DEFAULT_LIMIT
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl ListParams {
    pub fn new(skip: usize, limit: usize) -> Self {
        Self { skip, limit }
    }

    /// Clamp the limit to `max`
    pub fn capped(self, max: usize) -> Self {
        Self {
            limit: self.limit.min(max),
            ..self
        }
    }
}

/// One page of results plus the total number of matches
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub count: usize,
}

impl<T> Page<T> {
    pub fn paginate(items: Vec<T>, params: ListParams) -> Self {
        let count = items.len();
        let data = items.into_iter().skip(params.skip).take(params.limit).collect();
        Self { data, count }
    }
}

/// Case-insensitive substring match; an absent or blank needle matches everything
pub(crate) fn matches(haystack: Option<&str>, needle: Option<&str>) -> bool {
    match needle.map(str::trim).filter(|n| !n.is_empty()) {
        None => true,
        Some(needle) => haystack
            .map(|h| h.to_lowercase().contains(&needle.to_lowercase()))
            .unwrap_or(false),
    }
}

/// Filters for agreement lists
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgreementFilter {
    /// Substring of the asset's plate number or label
    #[serde(default)]
    pub asset: Option<String>,
    /// Substring of the renter's full name
    #[serde(default)]
    pub renter: Option<String>,
    #[serde(default)]
    pub status: Option<AgreementStatus>,
}

/// An agreement enriched with display fields of its asset and renter
#[derive(Debug, Clone, Serialize)]
pub struct AgreementView<A> {
    #[serde(flatten)]
    pub agreement: Agreement<A>,
    pub asset_label: Option<String>,
    pub asset_number: Option<u64>,
    pub plate_number: Option<String>,
    pub renter_name: Option<String>,
}

impl<A: Asset> AgreementView<A> {
    fn build(agreement: Agreement<A>, asset: Option<&A>, renter: Option<&Renter>) -> Self {
        Self {
            asset_label: asset.map(|a| a.label()),
            asset_number: asset.and_then(|a| a.number()),
            plate_number: asset.and_then(|a| a.plate_number().map(str::to_string)),
            renter_name: renter.map(|r| r.full_name.clone()),
            agreement,
        }
    }

    fn matches(&self, filter: &AgreementFilter) -> bool {
        let asset_match = matches(self.plate_number.as_deref(), filter.asset.as_deref())
            || matches(self.asset_label.as_deref(), filter.asset.as_deref());
        asset_match
            && matches(self.renter_name.as_deref(), filter.renter.as_deref())
            && filter.status.map_or(true, |s| s == self.agreement.status)
    }
}

impl<S: Store> Engine<S> {
    /// Fetch one agreement
    pub fn get<A: Asset>(&self, id: Uuid) -> LedgerResult<Agreement<A>> {
        let kind = A::KIND;
        tracing::debug!(kind = %kind, agreement_id = %id, "Fetching agreement");
        self.store
            .transaction(|tx| Repo::new(tx).load(kind.agreement_table(), kind.agreement_noun(), id))
    }

    /// Fetch one agreement with its asset and renter display fields
    pub fn view<A: Asset>(&self, id: Uuid) -> LedgerResult<AgreementView<A>> {
        let kind = A::KIND;
        self.store.transaction(|tx| {
            let repo = Repo::new(tx);
            let agreement: Agreement<A> = repo.load(kind.agreement_table(), kind.agreement_noun(), id)?;
            let asset: Option<A> = repo.get(kind.asset_table(), agreement.asset_id)?;
            let renter: Option<Renter> = repo.get(Table::Renters, agreement.renter_id)?;
            Ok(AgreementView::build(agreement, asset.as_ref(), renter.as_ref()))
        })
    }

    /// List agreements, newest first
    ///
    /// The table scan only yields candidate ids. Each agreement is then
    /// re-read together with its asset and renter in one transaction, so a
    /// concurrent delete drops the row instead of leaving it half joined.
    pub fn list<A: Asset>(&self, filter: &AgreementFilter, params: ListParams) -> LedgerResult<Page<AgreementView<A>>> {
        let kind = A::KIND;
        let ids: Vec<Uuid> = decode_all::<Agreement<A>>(kind.agreement_table(), self.store.scan(kind.agreement_table())?)?
            .into_iter()
            .map(|a| a.id)
            .collect();

        let mut views = self.store.transaction(|tx| {
            let repo = Repo::new(tx);
            let mut assets: HashMap<Uuid, Option<A>> = HashMap::new();
            let mut renters: HashMap<Uuid, Option<Renter>> = HashMap::new();
            let mut views = Vec::with_capacity(ids.len());
            for id in &ids {
                let Some(agreement) = repo.get::<Agreement<A>>(kind.agreement_table(), *id)? else {
                    continue;
                };
                if !assets.contains_key(&agreement.asset_id) {
                    assets.insert(agreement.asset_id, repo.get(kind.asset_table(), agreement.asset_id)?);
                }
                if !renters.contains_key(&agreement.renter_id) {
                    renters.insert(agreement.renter_id, repo.get(Table::Renters, agreement.renter_id)?);
                }
                let asset = assets.get(&agreement.asset_id).and_then(Option::as_ref);
                let renter = renters.get(&agreement.renter_id).and_then(Option::as_ref);
                let view = AgreementView::build(agreement, asset, renter);
                if view.matches(filter) {
                    views.push(view);
                }
            }
            Ok::<_, LedgerError>(views)
        })?;
        views.sort_by(|a, b| b.agreement.create_time.cmp(&a.agreement.create_time));

        tracing::debug!(kind = %kind, matched = views.len(), "Listed agreements");
        Ok(Page::paginate(views, params))
    }

    /// Payments of one agreement, latest payment date first
    pub fn list_payments<A: Asset>(&self, id: Uuid, params: ListParams) -> LedgerResult<Page<Payment>> {
        let kind = A::KIND;
        let mut payments = self.store.transaction(|tx| {
            let repo = Repo::new(tx);
            if !repo.exists(kind.agreement_table(), id)? {
                return Err(LedgerError::not_found(kind.agreement_noun(), id));
            }
            repo.links(&ledger_key(id))?
                .into_iter()
                .map(|payment_id| repo.load::<Payment>(Table::Payments, "Payment", payment_id))
                .collect::<LedgerResult<Vec<_>>>()
        })?;
        payments.sort_by(|a, b| {
            b.payment_date
                .cmp(&a.payment_date)
                .then_with(|| b.create_time.cmp(&a.create_time))
        });
        Ok(Page::paginate(payments, params))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paginate() {
        let page = Page::paginate((0..10).collect::<Vec<_>>(), ListParams::new(3, 4));
        assert_eq!(page.data, vec![3, 4, 5, 6]);
        assert_eq!(page.count, 10);

        let page = Page::paginate((0..10).collect::<Vec<_>>(), ListParams::new(20, 4));
        assert!(page.data.is_empty());
        assert_eq!(page.count, 10);
    }

    #[test]
    fn test_list_params_defaults() {
        let params: ListParams = serde_json::from_str("{}").unwrap();
        assert_eq!(params, ListParams::default());
        assert_eq!(ListParams::new(0, 5000).capped(500).limit, 500);
    }

    #[test]
    fn test_matches() {
        assert!(matches(Some("T123456C"), Some("456c")));
        assert!(matches(None, None));
        assert!(matches(None, Some("  ")));
        assert!(!matches(None, Some("x")));
        assert!(!matches(Some("Maria"), Some("ana")));
    }
}
