use std::collections::BTreeSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::backend::Backend;
use crate::error::FlagError;
use crate::feature::{FeatureName, FlagState, Gate, Thing, validate_percentage};

/// Actor id used for conditional checks made without a target
pub const ACTOR_IF_NO_TARGET: &str = "anonymous";

// Flipper scales percentages so fractional rollouts stay stable
const PERCENTAGE_SCALING_FACTOR: u32 = 1_000;

/// Anything a feature can be enabled for
///
/// Ids are namespaced as `"TypeName;id"` so they survive a round trip through
/// any backend. Renaming the type changes the id.
pub trait Actor {
    /// Namespace of the id, usually the type name
    fn flipper_type(&self) -> &str;

    /// Identifier unique within the namespace
    fn flipper_key(&self) -> String;

    fn flipper_id(&self) -> String {
        format!("{};{}", self.flipper_type(), self.flipper_key())
    }
}

/// Demo user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub name: String,
    pub id: u64,
}

impl Actor for User {
    fn flipper_type(&self) -> &str {
        "User"
    }

    fn flipper_key(&self) -> String {
        self.id.to_string()
    }
}

/// Demo group of users
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub name: String,
    pub id: u64,
}

impl Actor for Group {
    fn flipper_type(&self) -> &str {
        "Group"
    }

    fn flipper_key(&self) -> String {
        self.id.to_string()
    }
}

/// Detailed view of how a feature is enabled, for building frontends
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct FeatureState {
    pub key: FeatureName,
    pub state: FlagState,
    pub boolean: Option<bool>,
    pub actors: Vec<String>,
    pub groups: Vec<String>,
    pub percent_actors: Option<u8>,
    pub percent_time: Option<u8>,
}

/// Entry point for checking and changing feature flags
///
/// Setters silently ignore features that don't exist; create them first.
#[derive(Clone)]
pub struct Flippy {
    backend: Arc<dyn Backend>,
}

impl Flippy {
    pub fn new(backend: impl Backend + 'static) -> Self {
        Self {
            backend: Arc::new(backend),
        }
    }

    pub fn backend(&self) -> &dyn Backend {
        &*self.backend
    }

    /// Check whether a feature is enabled for `target`, or globally if `None`
    pub fn is_enabled(&self, feature: &str, target: Option<&dyn Actor>) -> bool {
        let Ok(f) = self.backend.get(feature) else {
            return false;
        };

        match f.state() {
            FlagState::On => return true,
            FlagState::Off => return false,
            FlagState::Conditional => {}
        }

        let actor = match target {
            Some(t) => t.flipper_id(),
            None => ACTOR_IF_NO_TARGET.to_string(),
        };

        f.actors.iter().any(|a| *a == actor)
            || f.groups.iter().any(|g| *g == actor)
            || f
                .percentage_of_actors
                .is_some_and(|p| actor_in_percentage(feature, &actor, p))
            || f
                .percentage_of_time
                .is_some_and(|p| rand::random_range(0.0..100.0) < f64::from(p))
    }

    /// Create a new feature flag; returns false if it already existed
    pub fn create(&self, feature: &str) -> bool {
        self.backend.add(feature)
    }

    pub fn get_all_feature_names(&self) -> BTreeSet<FeatureName> {
        self.backend.features()
    }

    pub fn feature_exists(&self, feature: &str) -> bool {
        self.backend.get(feature).is_ok()
    }

    /// Get a lot of detail about exactly how a feature is enabled
    ///
    /// Use [`Flippy::is_enabled`] for regular checks.
    pub fn get_feature_state(&self, feature: &str) -> Result<FeatureState, FlagError> {
        let f = self.backend.get(feature)?;
        Ok(FeatureState {
            key: f.key.clone(),
            state: f.state(),
            boolean: f.boolean,
            actors: f.actors,
            groups: f.groups,
            percent_actors: f.percentage_of_actors,
            percent_time: f.percentage_of_time,
        })
    }

    /// Turn a feature on for everyone
    pub fn enable(&self, feature: &str) -> Result<(), FlagError> {
        self.apply(true, feature, Gate::Boolean, Thing::None)
    }

    pub fn enable_actor(&self, feature: &str, target: &dyn Actor) -> Result<(), FlagError> {
        self.apply(true, feature, Gate::Actors, Thing::FlipperId(target.flipper_id()))
    }

    pub fn enable_group(&self, feature: &str, target: &dyn Actor) -> Result<(), FlagError> {
        self.apply(true, feature, Gate::Groups, Thing::FlipperId(target.flipper_id()))
    }

    /// Enable for a stable percentage of actors
    ///
    /// An actor enabled at some percentage stays enabled at every higher one.
    pub fn enable_percentage_of_actors(&self, feature: &str, percentage: i64) -> Result<(), FlagError> {
        let p = validate_percentage(percentage)?;
        self.apply(true, feature, Gate::PercentageOfActors, Thing::Percentage(p))
    }

    /// Enable for a percentage of all lookups
    pub fn enable_percentage_of_time(&self, feature: &str, percentage: i64) -> Result<(), FlagError> {
        let p = validate_percentage(percentage)?;
        self.apply(true, feature, Gate::PercentageOfTime, Thing::Percentage(p))
    }

    /// Turn off global enablement; targeted gates stay in place
    pub fn disable(&self, feature: &str) -> Result<(), FlagError> {
        self.apply(false, feature, Gate::Boolean, Thing::None)
    }

    pub fn disable_actor(&self, feature: &str, target: &dyn Actor) -> Result<(), FlagError> {
        self.apply(false, feature, Gate::Actors, Thing::FlipperId(target.flipper_id()))
    }

    pub fn disable_group(&self, feature: &str, target: &dyn Actor) -> Result<(), FlagError> {
        self.apply(false, feature, Gate::Groups, Thing::FlipperId(target.flipper_id()))
    }

    pub fn disable_percentage_of_actors(&self, feature: &str) -> Result<(), FlagError> {
        self.apply(false, feature, Gate::PercentageOfActors, Thing::None)
    }

    pub fn disable_percentage_of_time(&self, feature: &str) -> Result<(), FlagError> {
        self.apply(false, feature, Gate::PercentageOfTime, Thing::None)
    }

    /// Reset every gate so the feature is off for everyone
    pub fn clear(&self, feature: &str) -> bool {
        self.backend.clear(feature)
    }

    /// Delete the feature entirely
    pub fn destroy(&self, feature: &str) -> bool {
        self.backend.remove(feature)
    }

    fn apply(&self, enable: bool, feature: &str, gate: Gate, thing: Thing) -> Result<(), FlagError> {
        let result = if enable {
            self.backend.enable(feature, gate, thing)
        } else {
            self.backend.disable(feature, gate, thing)
        };

        match result {
            Ok(changed) => {
                tracing::debug!(
                    "{} {} gate on {} (changed: {})",
                    if enable { "Enabled" } else { "Disabled" },
                    gate.key(),
                    feature,
                    changed
                );
                Ok(())
            }
            Err(FlagError::FeatureNotFound(_)) => Ok(()),
            Err(e) => Err(e),
        }
    }
}

fn actor_in_percentage(feature: &str, actor: &str, percentage: u8) -> bool {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(feature.as_bytes());
    hasher.update(actor.as_bytes());
    hasher.finalize() % (100 * PERCENTAGE_SCALING_FACTOR)
        < u32::from(percentage) * PERCENTAGE_SCALING_FACTOR
}
