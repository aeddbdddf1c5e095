//! Inputs supplied when a pipeline is created.

use crate::leads::{FilterSpec, Lead, LeadSet};
use serde::{Deserialize, Serialize};
use std::fmt;

/// What the scrape stage should collect from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapeTarget {
    /// Display name of the campaign (e.g. "Healthcare AI Prospects").
    pub name: String,
    /// Source labels or URLs to collect from.
    #[serde(default)]
    pub sources: Vec<String>,
}

impl ScrapeTarget {
    /// Creates a target with no sources.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sources: Vec::new(),
        }
    }

    /// Sets the sources.
    #[must_use]
    pub fn with_sources(mut self, sources: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.sources = sources.into_iter().map(Into::into).collect();
        self
    }
}

impl Default for ScrapeTarget {
    fn default() -> Self {
        Self::new("Healthcare AI Prospects").with_sources([
            "LinkedIn",
            "Company Websites",
            "Industry Directories",
        ])
    }
}

/// Connection state of a CRM destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    /// Accepting records.
    #[default]
    Connected,
    /// Not configured.
    Disconnected,
    /// A previous sync is still in flight.
    Syncing,
    /// Last sync attempt errored.
    Error,
}

impl ConnectionStatus {
    /// Returns true if the destination can accept records.
    #[must_use]
    pub fn accepts_records(self) -> bool {
        matches!(self, Self::Connected)
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connected => write!(f, "connected"),
            Self::Disconnected => write!(f, "disconnected"),
            Self::Syncing => write!(f, "syncing"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// A CRM the sync stage may push leads to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrmDestination {
    /// Stable id used as the key in per-destination counts (e.g. "salesforce").
    pub id: String,
    /// Display name.
    pub name: String,
    /// Connection state.
    #[serde(default)]
    pub status: ConnectionStatus,
}

impl CrmDestination {
    /// Creates a connected destination.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            status: ConnectionStatus::Connected,
        }
    }

    /// Sets the connection status.
    #[must_use]
    pub fn with_status(mut self, status: ConnectionStatus) -> Self {
        self.status = status;
        self
    }

    /// Returns true if the destination can accept records.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.status.accepts_records()
    }
}

/// Everything a pipeline needs besides its definition.
///
/// Each pipeline owns its inputs; the lead set is never shared between runs.
#[derive(Debug, Clone, Default)]
pub struct PipelineInputs {
    /// Scrape target.
    pub target: ScrapeTarget,
    /// Filter predicate set.
    pub filter: FilterSpec,
    /// CRM destinations for the sync stage.
    pub destinations: Vec<CrmDestination>,
    /// The working lead collection.
    pub leads: LeadSet,
}

impl PipelineInputs {
    /// Creates inputs with the default target and nothing else.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the scrape target.
    #[must_use]
    pub fn with_target(mut self, target: ScrapeTarget) -> Self {
        self.target = target;
        self
    }

    /// Sets the filter spec.
    #[must_use]
    pub fn with_filter(mut self, filter: FilterSpec) -> Self {
        self.filter = filter;
        self
    }

    /// Adds a CRM destination.
    #[must_use]
    pub fn with_destination(mut self, destination: CrmDestination) -> Self {
        self.destinations.push(destination);
        self
    }

    /// Replaces the CRM destinations.
    #[must_use]
    pub fn with_destinations(mut self, destinations: impl IntoIterator<Item = CrmDestination>) -> Self {
        self.destinations = destinations.into_iter().collect();
        self
    }

    /// Seeds the working lead collection.
    #[must_use]
    pub fn with_leads(mut self, leads: Vec<Lead>) -> Self {
        self.leads = LeadSet::from_leads(leads);
        self
    }

    /// Returns the destinations that can accept records.
    pub fn connected_destinations(&self) -> impl Iterator<Item = &CrmDestination> {
        self.destinations.iter().filter(|d| d.is_connected())
    }

    /// Returns a copy whose lead set is independent of this one.
    #[must_use]
    pub fn isolated(&self) -> Self {
        Self {
            target: self.target.clone(),
            filter: self.filter.clone(),
            destinations: self.destinations.clone(),
            leads: self.leads.deep_clone(),
        }
    }
}
