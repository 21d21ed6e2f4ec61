// src/enrich/resolver.rs

use crate::domain::{RawListing, SourceTag};
use crate::providers::ProviderError;
use scraper::Html;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// A source that can supply description text for a listing.
///
/// Sources are consulted in the order they are handed to
/// [`DescriptionResolver::new`]; adding a source means adding an entry to
/// that list.
pub trait DescriptionProvider: Send + Sync {
    fn tag(&self) -> SourceTag;

    /// `false` when the source needs a credential that was not supplied.
    /// Unconfigured sources are skipped without being called.
    fn is_configured(&self) -> bool {
        true
    }

    fn describe(&self, listing: &RawListing) -> Result<Option<String>, ProviderError>;
}

/// Description text and the source that produced it.
/// `source` is `SourceTag::None` exactly when `text` is empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedDescription {
    text: String,
    source: SourceTag,
}

impl ResolvedDescription {
    pub fn empty() -> Self {
        Self {
            text: String::new(),
            source: SourceTag::None,
        }
    }

    /// Returns `None` if `text` cleans down to nothing.
    pub fn found(text: &str, source: SourceTag) -> Option<Self> {
        let text = clean_description(text);
        if text.is_empty() || source == SourceTag::None {
            return None;
        }
        Some(Self { text, source })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn source(&self) -> SourceTag {
        self.source
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// The description already embedded in the primary search payload.
/// Never makes a network call.
pub struct EmbeddedDescription;

impl DescriptionProvider for EmbeddedDescription {
    fn tag(&self) -> SourceTag {
        SourceTag::Zillow
    }

    fn describe(&self, listing: &RawListing) -> Result<Option<String>, ProviderError> {
        Ok(listing.description.clone())
    }
}

/// Waterfall over description sources: the first non-empty answer wins and
/// later sources are not called.
pub struct DescriptionResolver {
    providers: Vec<Box<dyn DescriptionProvider>>,
}

impl DescriptionResolver {
    pub fn new(providers: Vec<Box<dyn DescriptionProvider>>) -> Self {
        Self { providers }
    }

    pub fn resolve(&self, listing: &RawListing) -> ResolvedDescription {
        let address = listing.address.full();

        for provider in &self.providers {
            let tag = provider.tag();

            if !provider.is_configured() {
                debug!(source = tag.as_str(), "description source not configured, skipping");
                continue;
            }

            match provider.describe(listing) {
                Ok(Some(text)) => {
                    if let Some(resolved) = ResolvedDescription::found(&text, tag) {
                        debug!(source = tag.as_str(), %address, "description resolved");
                        return resolved;
                    }
                }
                Ok(None) => {}
                Err(ProviderError::MissingCredential(name)) => {
                    debug!(source = tag.as_str(), credential = name, "credential missing, skipping");
                }
                Err(e) => {
                    warn!(source = tag.as_str(), %address, error = %e, "description lookup failed");
                }
            }
        }

        ResolvedDescription::empty()
    }
}

/// Strip markup and collapse whitespace. Remarks from listing sites often
/// carry `<br>` and entity escapes.
pub fn clean_description(raw: &str) -> String {
    let text = if raw.contains('<') || raw.contains('&') {
        let fragment = Html::parse_fragment(raw);
        fragment.root_element().text().collect::<Vec<_>>().join(" ")
    } else {
        raw.to_string()
    };

    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
