//! The market view state machine.
//!
//! `MarketView` owns the listing, the selection, the display set, the time range
//! and the history series, and applies every trigger synchronously. It performs
//! no I/O: operations that need a fetch return a ticket or request describing it,
//! and the caller reports the outcome back with the same stamp.

use chrono::{DateTime, Utc};
use common::{
    models::{AssetSnapshot, HistorySample, HistorySeries, TimeRange},
    Error, FetchFailure, Result,
};
use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, info};

/// Generation stamp of an issued listing poll
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct PollTicket(u64);

/// Generation stamp of an issued history fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RequestToken(u64);

/// A history fetch to perform, stamped with the pair that was current when it was issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRequest {
    pub token: RequestToken,
    pub asset_id: String,
    pub range: TimeRange,
}

/// Read-only snapshot of the view state handed to presentation.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct ViewModel {
    pub snapshots: Vec<AssetSnapshot>,
    pub displayed_assets: Vec<AssetSnapshot>,
    pub selection: Option<String>,
    pub time_range: TimeRange,
    /// Present only when it belongs to the current selection and range
    pub history: Option<HistorySeries>,
    pub poll_error: Option<FetchFailure>,
    pub history_error: Option<FetchFailure>,
    pub is_polling: bool,
    pub is_history_loading: bool,
    /// Time the last successful listing was applied
    pub last_updated: Option<DateTime<Utc>>,
}

impl ViewModel {
    pub fn filtered_assets(&self, term: &str) -> Vec<AssetSnapshot> {
        filter_assets(&self.snapshots, term).into_iter().cloned().collect()
    }

    pub fn selected_asset(&self) -> Option<&AssetSnapshot> {
        let id = self.selection.as_deref()?;
        self.snapshots.iter().find(|asset| asset.id == id)
    }
}

/// Assets whose name or symbol contains `term`, ignoring case, in listing order.
pub fn filter_assets<'a>(snapshots: &'a [AssetSnapshot], term: &str) -> Vec<&'a AssetSnapshot> {
    snapshots.iter().filter(|asset| asset.matches(term)).collect()
}

#[derive(Debug)]
pub struct MarketView {
    display_count: usize,

    snapshots: Vec<AssetSnapshot>,
    last_updated: Option<DateTime<Utc>>,
    poll_error: Option<FetchFailure>,
    polls_issued: u64,
    last_poll_resolved: u64,

    selection: Option<String>,
    selection_initialized: bool,

    display_set: HashSet<String>,
    display_initialized: bool,

    range: TimeRange,
    history: Option<HistorySeries>,
    history_error: Option<FetchFailure>,
    history_issued: u64,
    history_pending: Option<RequestToken>,
}

impl MarketView {
    /// `display_count` is how many top-ranked assets the display set starts with.
    pub fn new(display_count: usize) -> Self {
        Self {
            display_count,
            snapshots: Vec::new(),
            last_updated: None,
            poll_error: None,
            polls_issued: 0,
            last_poll_resolved: 0,
            selection: None,
            selection_initialized: false,
            display_set: HashSet::new(),
            display_initialized: false,
            range: TimeRange::default(),
            history: None,
            history_error: None,
            history_issued: 0,
            history_pending: None,
        }
    }

    pub fn snapshots(&self) -> &[AssetSnapshot] {
        &self.snapshots
    }

    pub fn selection(&self) -> Option<&str> {
        self.selection.as_deref()
    }

    pub fn display_set(&self) -> &HashSet<String> {
        &self.display_set
    }

    pub fn time_range(&self) -> TimeRange {
        self.range
    }

    pub fn history(&self) -> Option<&HistorySeries> {
        self.history.as_ref()
    }

    pub fn is_polling(&self) -> bool {
        self.polls_issued > self.last_poll_resolved
    }

    pub fn is_history_loading(&self) -> bool {
        self.history_pending.is_some()
    }

    /// Stamp a new listing poll. Polls may overlap.
    pub fn begin_poll(&mut self) -> PollTicket {
        self.polls_issued += 1;
        PollTicket(self.polls_issued)
    }

    /// Apply the outcome of a listing poll.
    ///
    /// Returns the history fetch to issue when this poll performed the one-time
    /// selection of the top-ranked asset.
    pub fn apply_poll(
        &mut self,
        ticket: PollTicket,
        result: std::result::Result<Vec<AssetSnapshot>, FetchFailure>,
    ) -> Option<HistoryRequest> {
        if ticket.0 <= self.last_poll_resolved {
            debug!(
                "Discarding listing poll {} superseded by poll {}",
                ticket.0, self.last_poll_resolved
            );
            return None;
        }
        self.last_poll_resolved = ticket.0;

        let snapshots = match result {
            Ok(snapshots) => snapshots,
            Err(failure) => {
                self.poll_error = Some(failure);
                return None;
            }
        };

        self.poll_error = None;
        if snapshots.is_empty() {
            debug!("Listing poll {} returned no assets, keeping previous listing", ticket.0);
            return None;
        }

        self.snapshots = snapshots;
        self.last_updated = Some(Utc::now());

        if !self.display_initialized {
            self.display_set = self
                .snapshots
                .iter()
                .take(self.display_count)
                .map(|asset| asset.id.clone())
                .collect();
            self.display_initialized = true;
        }

        if self.selection_initialized {
            return None;
        }

        let first = self.snapshots[0].id.clone();
        info!("Selecting top-ranked asset {}", first);
        self.selection = Some(first.clone());
        self.selection_initialized = true;
        Some(self.issue_history(first))
    }

    /// User picks an asset from the current listing.
    pub fn select(&mut self, asset_id: &str) -> Result<HistoryRequest> {
        if !self.snapshots.iter().any(|asset| asset.id == asset_id) {
            return Err(Error::NotFound(format!(
                "Asset '{}' is not in the current listing",
                asset_id
            )));
        }

        self.selection = Some(asset_id.to_string());
        self.selection_initialized = true;
        Ok(self.issue_history(asset_id.to_string()))
    }

    /// User picks a time range. A history fetch is needed only when an asset is selected.
    pub fn set_range(&mut self, range: TimeRange) -> Option<HistoryRequest> {
        self.range = range;
        let asset_id = self.selection.clone()?;
        Some(self.issue_history(asset_id))
    }

    /// Flip membership of `asset_id` in the display set and return the new membership.
    pub fn toggle_display(&mut self, asset_id: &str) -> Result<bool> {
        if self.display_set.remove(asset_id) {
            return Ok(false);
        }

        if !self.snapshots.iter().any(|asset| asset.id == asset_id) {
            return Err(Error::NotFound(format!(
                "Asset '{}' is not in the current listing",
                asset_id
            )));
        }

        self.display_set.insert(asset_id.to_string());
        Ok(true)
    }

    /// Apply the outcome of a history fetch.
    ///
    /// The outcome is applied only when `request` is the newest issued fetch and its
    /// pair is still the current selection and range. Returns whether it was applied.
    pub fn apply_history(
        &mut self,
        request: &HistoryRequest,
        result: std::result::Result<Vec<HistorySample>, FetchFailure>,
    ) -> bool {
        if self.history_pending != Some(request.token)
            || !self.is_current(&request.asset_id, request.range)
        {
            debug!(
                "Discarding superseded history for {} ({})",
                request.asset_id, request.range
            );
            return false;
        }
        self.history_pending = None;

        match result {
            Ok(samples) => {
                self.history = Some(HistorySeries {
                    asset_id: request.asset_id.clone(),
                    range: request.range,
                    samples,
                });
                self.history_error = None;
            }
            Err(failure) => {
                self.history = None;
                self.history_error = Some(failure);
            }
        }
        true
    }

    /// Listing filtered to the display set, in listing order.
    pub fn displayed_assets(&self) -> Vec<&AssetSnapshot> {
        self.snapshots
            .iter()
            .filter(|asset| self.display_set.contains(&asset.id))
            .collect()
    }

    /// Asset picker search. Never changes the display set.
    pub fn filtered_assets(&self, term: &str) -> Vec<&AssetSnapshot> {
        filter_assets(&self.snapshots, term)
    }

    pub fn view_model(&self) -> ViewModel {
        let history = self
            .history
            .as_ref()
            .filter(|series| {
                self.selection
                    .as_deref()
                    .is_some_and(|id| series.is_for(id, self.range))
            })
            .cloned();

        ViewModel {
            snapshots: self.snapshots.clone(),
            displayed_assets: self.displayed_assets().into_iter().cloned().collect(),
            selection: self.selection.clone(),
            time_range: self.range,
            history,
            poll_error: self.poll_error.clone(),
            history_error: self.history_error.clone(),
            is_polling: self.is_polling(),
            is_history_loading: self.is_history_loading(),
            last_updated: self.last_updated,
        }
    }

    fn is_current(&self, asset_id: &str, range: TimeRange) -> bool {
        self.selection.as_deref() == Some(asset_id) && self.range == range
    }

    fn issue_history(&mut self, asset_id: String) -> HistoryRequest {
        self.history_issued += 1;
        let token = RequestToken(self.history_issued);
        self.history_pending = Some(token);
        self.history_error = None;

        HistoryRequest {
            token,
            asset_id,
            range: self.range,
        }
    }
}
