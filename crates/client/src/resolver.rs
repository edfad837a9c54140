//! Cascading location resolver.
//!
//! Connects a [`LocationCascade`] to the API and to the route's
//! [`OptionCache`]. Selection is synchronous and returns a ticket; the
//! lookup for that ticket is a `'static` future that borrows nothing from
//! the resolver, so several lookups may be in flight at once. Results go
//! back through [`LocationResolver::apply`], where the cascade's generation
//! guard drops anything a newer selection has superseded.

use std::future::Future;
use std::sync::Arc;

use repairhub_core::location::{
    CommitResult, FetchOutcome, FetchTicket, LocationCascade, OptionList,
};
use repairhub_core::option_cache::OptionCache;

use crate::api::RepairApi;

pub struct LocationResolver {
    api: Arc<dyn RepairApi>,
    cache: OptionCache,
    cascade: LocationCascade,
    /// Transient user-visible error from the most recent failed lookup.
    banner: Option<String>,
}

impl LocationResolver {
    pub fn new(api: Arc<dyn RepairApi>, cache: OptionCache) -> Self {
        Self {
            api,
            cache,
            cascade: LocationCascade::new(),
            banner: None,
        }
    }

    pub fn cascade(&self) -> &LocationCascade {
        &self.cascade
    }

    pub fn banner(&self) -> Option<&str> {
        self.banner.as_deref()
    }

    pub fn dismiss_banner(&mut self) {
        self.banner = None;
    }

    /// Load the route's cached options, if any, without touching the network.
    ///
    /// Returns `true` when a cached record was applied.
    pub fn rehydrate(&mut self) -> bool {
        match self.cache.load() {
            Some(snapshot) => {
                self.cascade = LocationCascade::from_snapshot(snapshot);
                tracing::debug!(
                    key = self.cache.key(),
                    countries = self.cascade.countries().len(),
                    states = self.cascade.states().len(),
                    cities = self.cascade.cities().len(),
                    "Rehydrated location options",
                );
                true
            }
            None => false,
        }
    }

    /// Tickets for every list the current selection needs but does not have.
    pub fn missing_tickets(&mut self) -> Vec<FetchTicket> {
        let mut tickets = Vec::new();
        if self.cascade.countries().is_empty() {
            tickets.push(self.cascade.request_countries());
        }
        if self.cascade.states().is_empty() {
            tickets.extend(self.cascade.request_states());
        }
        if self.cascade.cities().is_empty() {
            tickets.extend(self.cascade.request_cities());
        }
        tickets
    }

    /// Rehydrate from the cache, then fetch only what is still missing.
    pub async fn mount(&mut self) {
        self.rehydrate();
        self.load_missing().await;
    }

    /// Fetch every list the current selection needs but does not have.
    pub async fn load_missing(&mut self) {
        let fetches: Vec<_> = self
            .missing_tickets()
            .into_iter()
            .map(|ticket| self.fetch(ticket))
            .collect();
        for outcome in futures::future::join_all(fetches).await {
            self.apply(outcome);
        }
    }

    /// Select a country and persist the invalidated cascade.
    pub fn select_country(&mut self, id: &str) -> Option<FetchTicket> {
        let ticket = self.cascade.select_country(id);
        self.persist();
        ticket
    }

    /// Select a state and persist the invalidated cascade.
    pub fn select_state(&mut self, id: &str) -> Option<FetchTicket> {
        let ticket = self.cascade.select_state(id);
        self.persist();
        ticket
    }

    /// Perform the lookup for `ticket`. The returned future owns everything
    /// it needs and never fails; errors are carried in the outcome.
    pub fn fetch(&self, ticket: FetchTicket) -> impl Future<Output = FetchOutcome> + Send + 'static {
        let api = Arc::clone(&self.api);
        async move {
            let result = match (ticket.list, ticket.parent.as_deref()) {
                (OptionList::Countries, _) => api.list_countries().await,
                (OptionList::States, Some(country)) => api.list_states(country).await,
                (OptionList::Cities, Some(state)) => api.list_cities(state).await,
                (_, None) => Ok(Vec::new()),
            };

            let result = result.map_err(|e| {
                tracing::warn!(
                    list = ticket.list.as_str(),
                    parent = ticket.parent.as_deref().unwrap_or(""),
                    generation = ticket.generation,
                    error = %e,
                    "Location lookup failed",
                );
                format!("Could not load {}. Please try again.", ticket.list.as_str())
            });

            FetchOutcome { ticket, result }
        }
    }

    /// Commit a lookup result through the generation guard.
    pub fn apply(&mut self, outcome: FetchOutcome) -> CommitResult {
        let list = outcome.ticket.list;
        let generation = outcome.ticket.generation;
        let result = self.cascade.commit(outcome);

        match &result {
            CommitResult::Applied(count) => {
                tracing::debug!(list = list.as_str(), generation, count, "Location options loaded");
                self.persist();
            }
            CommitResult::Failed(message) => {
                self.banner = Some(message.clone());
                self.persist();
            }
            CommitResult::Stale => {
                tracing::debug!(list = list.as_str(), generation, "Discarded stale location response");
            }
        }
        result
    }

    /// Select a country and load its states.
    pub async fn change_country(&mut self, id: &str) -> Option<CommitResult> {
        let ticket = self.select_country(id)?;
        let outcome = self.fetch(ticket).await;
        Some(self.apply(outcome))
    }

    /// Select a state and load its cities.
    pub async fn change_state(&mut self, id: &str) -> Option<CommitResult> {
        let ticket = self.select_state(id)?;
        let outcome = self.fetch(ticket).await;
        Some(self.apply(outcome))
    }

    /// Forget the selections (after a successful submission) but keep the
    /// country list cached for the next job.
    pub fn reset_selection(&mut self) {
        let _ = self.cascade.select_country("");
        self.persist();
    }

    fn persist(&self) {
        if let Err(e) = self.cache.save(self.cascade.snapshot()) {
            tracing::warn!(key = self.cache.key(), error = %e, "Failed to persist location options");
        }
    }
}
