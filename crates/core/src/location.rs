//! Cascading country → state → city selection.
//!
//! [`LocationCascade`] holds the three dependent option lists and the two
//! upstream selections. Every selection change invalidates the lists below
//! it and bumps their generation counters, so a fetch issued for an older
//! selection can be recognised and dropped when it finally resolves.
//!
//! The cascade does no I/O. Callers take the [`FetchTicket`] a selection
//! returns, perform the lookup, and hand the result back through
//! [`LocationCascade::commit`].

use serde::{Deserialize, Serialize};

use crate::types::RegionId;

/// One entry in a country, state or city dropdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionOption {
    pub id: RegionId,
    pub name: String,
}

impl RegionOption {
    pub fn new(id: impl Into<RegionId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Which dependent list a fetch targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionList {
    Countries,
    States,
    Cities,
}

impl OptionList {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Countries => "countries",
            Self::States => "states",
            Self::Cities => "cities",
        }
    }
}

/// Identifies one outgoing lookup: the list it fills, the selection that
/// triggered it, and the list's generation at the time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub list: OptionList,
    /// Country id for state lookups, state id for city lookups.
    pub parent: Option<RegionId>,
    pub generation: u64,
}

/// A resolved lookup, successful or not.
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub ticket: FetchTicket,
    pub result: Result<Vec<RegionOption>, String>,
}

/// What [`LocationCascade::commit`] did with an outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitResult {
    /// The list was replaced with this many options.
    Applied(usize),
    /// The lookup failed; the list was left empty.
    Failed(String),
    /// A newer selection superseded the ticket; nothing changed.
    Stale,
}

/// The persisted shape of the cascade, one record per route.
///
/// `states` always belongs to `selected_country` and `cities` to
/// `selected_state`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationSnapshot {
    #[serde(default)]
    pub countries: Vec<RegionOption>,
    #[serde(default)]
    pub states: Vec<RegionOption>,
    #[serde(default)]
    pub cities: Vec<RegionOption>,
    #[serde(default)]
    pub selected_country: Option<RegionId>,
    #[serde(default)]
    pub selected_state: Option<RegionId>,
}

impl LocationSnapshot {
    /// Drop anything that violates the pairing invariant.
    ///
    /// A state list without a selected country, or a state selection or
    /// city list without a selected state, cannot be trusted.
    pub fn repaired(mut self) -> Self {
        if self.selected_country.is_none() {
            self.states.clear();
            self.selected_state = None;
        }
        if self.selected_state.is_none() {
            self.cities.clear();
        }
        self
    }
}

/// Dependent dropdown state with per-list generation guards.
#[derive(Debug, Clone, Default)]
pub struct LocationCascade {
    snapshot: LocationSnapshot,
    countries_generation: u64,
    states_generation: u64,
    cities_generation: u64,
}

impl LocationCascade {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from a cached record. Generations restart at zero; a ticket
    /// is only meaningful to the cascade that issued it.
    pub fn from_snapshot(snapshot: LocationSnapshot) -> Self {
        Self {
            snapshot: snapshot.repaired(),
            ..Self::default()
        }
    }

    pub fn snapshot(&self) -> &LocationSnapshot {
        &self.snapshot
    }

    pub fn countries(&self) -> &[RegionOption] {
        &self.snapshot.countries
    }

    pub fn states(&self) -> &[RegionOption] {
        &self.snapshot.states
    }

    pub fn cities(&self) -> &[RegionOption] {
        &self.snapshot.cities
    }

    pub fn selected_country(&self) -> Option<&str> {
        self.snapshot.selected_country.as_deref()
    }

    pub fn selected_state(&self) -> Option<&str> {
        self.snapshot.selected_state.as_deref()
    }

    pub fn generation(&self, list: OptionList) -> u64 {
        match list {
            OptionList::Countries => self.countries_generation,
            OptionList::States => self.states_generation,
            OptionList::Cities => self.cities_generation,
        }
    }

    /// Ticket for (re)loading the country list.
    pub fn request_countries(&mut self) -> FetchTicket {
        self.countries_generation += 1;
        FetchTicket {
            list: OptionList::Countries,
            parent: None,
            generation: self.countries_generation,
        }
    }

    /// Ticket for loading states of the current country, if one is selected.
    pub fn request_states(&mut self) -> Option<FetchTicket> {
        let parent = self.snapshot.selected_country.clone()?;
        self.states_generation += 1;
        Some(FetchTicket {
            list: OptionList::States,
            parent: Some(parent),
            generation: self.states_generation,
        })
    }

    /// Ticket for loading cities of the current state, if one is selected.
    pub fn request_cities(&mut self) -> Option<FetchTicket> {
        let parent = self.snapshot.selected_state.clone()?;
        self.cities_generation += 1;
        Some(FetchTicket {
            list: OptionList::Cities,
            parent: Some(parent),
            generation: self.cities_generation,
        })
    }

    /// Select a country. Clears the state selection and both dependent
    /// lists, and returns a ticket for the new state list unless `id` is
    /// empty.
    pub fn select_country(&mut self, id: &str) -> Option<FetchTicket> {
        let id = id.trim();
        self.snapshot.selected_country = (!id.is_empty()).then(|| id.to_string());
        self.snapshot.selected_state = None;
        self.snapshot.states.clear();
        self.snapshot.cities.clear();
        // Invalidate in-flight city lookups as well as state lookups.
        self.cities_generation += 1;
        if self.snapshot.selected_country.is_none() {
            self.states_generation += 1;
        }
        self.request_states()
    }

    /// Select a state. Clears the city list and returns a ticket for the new
    /// city list unless `id` is empty.
    pub fn select_state(&mut self, id: &str) -> Option<FetchTicket> {
        let id = id.trim();
        self.snapshot.selected_state = (!id.is_empty()).then(|| id.to_string());
        self.snapshot.cities.clear();
        if self.snapshot.selected_state.is_none() {
            self.cities_generation += 1;
        }
        self.request_cities()
    }

    /// Whether `ticket` still matches the current selection and generation.
    pub fn is_current(&self, ticket: &FetchTicket) -> bool {
        let expected_parent = match ticket.list {
            OptionList::Countries => None,
            OptionList::States => self.selected_country(),
            OptionList::Cities => self.selected_state(),
        };
        ticket.generation == self.generation(ticket.list)
            && ticket.parent.as_deref() == expected_parent
    }

    /// Apply a resolved lookup if its ticket is still current.
    pub fn commit(&mut self, outcome: FetchOutcome) -> CommitResult {
        if !self.is_current(&outcome.ticket) {
            return CommitResult::Stale;
        }

        let list = match outcome.ticket.list {
            OptionList::Countries => &mut self.snapshot.countries,
            OptionList::States => &mut self.snapshot.states,
            OptionList::Cities => &mut self.snapshot.cities,
        };

        match outcome.result {
            Ok(options) => {
                let count = options.len();
                *list = options;
                CommitResult::Applied(count)
            }
            Err(message) => {
                list.clear();
                CommitResult::Failed(message)
            }
        }
    }

    /// Look up a loaded option by id.
    pub fn find(&self, list: OptionList, id: &str) -> Option<&RegionOption> {
        let options = match list {
            OptionList::Countries => self.countries(),
            OptionList::States => self.states(),
            OptionList::Cities => self.cities(),
        };
        options.iter().find(|o| o.id == id)
    }
}
