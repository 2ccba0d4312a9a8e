use std::collections::{BTreeMap, BTreeSet};
use std::sync::{PoisonError, RwLock};

use crate::error::FlagError;
use crate::feature::{ApiFeature, Feature, FeatureName, Gate, Thing};

/// Storage contract for feature flags, following the Flipper adapter protocol
///
/// Mutating calls return `true` when state actually changed.
pub trait Backend: Send + Sync {
    /// Get the set of known features
    fn features(&self) -> BTreeSet<FeatureName>;

    /// Add a feature to the set of known features
    fn add(&self, feature: &str) -> bool;

    /// Add a fully hydrated feature, such as one loaded from a snapshot
    fn add_feature(&self, feature: Feature) -> bool;

    /// Remove a feature from the set of known features
    fn remove(&self, feature: &str) -> bool;

    /// Clear all gate values for a feature
    fn clear(&self, feature: &str) -> bool;

    /// Get all gate values for a feature
    fn get(&self, feature: &str) -> Result<Feature, FlagError>;

    /// Enable a gate for a thing
    fn enable(&self, feature: &str, gate: Gate, thing: Thing) -> Result<bool, FlagError>;

    /// Disable a gate for a thing
    fn disable(&self, feature: &str, gate: Gate, thing: Thing) -> Result<bool, FlagError>;

    /// Get all gate values for several features at once
    fn get_multi(&self, features: &[&str]) -> Result<Vec<Feature>, FlagError> {
        features.iter().map(|name| self.get(name)).collect()
    }

    /// Get all gate values for all features at once
    fn get_all(&self) -> Vec<Feature> {
        self.features()
            .iter()
            .filter_map(|name| self.get(name).ok())
            .collect()
    }

    /// Produce a compact JSON object mapping feature names to their API form
    fn to_json(&self) -> Result<String, FlagError> {
        let features: BTreeMap<FeatureName, ApiFeature> = self
            .get_all()
            .into_iter()
            .map(|f| (f.key.clone(), f.to_api()))
            .collect();
        Ok(serde_json::to_string(&features)?)
    }

    /// Clear current state and replace it with `new_state`, a snapshot in the
    /// format written by [`Backend::to_json`]
    fn load_json(&self, new_state: &str) -> Result<(), FlagError>;
}

/// A memory-only backend
#[derive(Debug, Default)]
pub struct MemoryBackend {
    features: RwLock<BTreeMap<FeatureName, Feature>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_feature<T>(
        &self,
        feature: &str,
        f: impl FnOnce(&mut Feature) -> Result<T, FlagError>,
    ) -> Result<T, FlagError> {
        let mut features = self.features.write().unwrap_or_else(PoisonError::into_inner);
        let entry = features
            .get_mut(feature)
            .ok_or_else(|| FlagError::FeatureNotFound(feature.to_string()))?;
        f(entry)
    }
}

fn flipper_id(thing: &Thing) -> Option<&str> {
    match thing {
        Thing::FlipperId(id) if !id.is_empty() => Some(id.as_str()),
        _ => None,
    }
}

fn percentage(thing: &Thing) -> Result<u8, FlagError> {
    match thing {
        Thing::Percentage(p) if *p <= 100 => Ok(*p),
        Thing::Percentage(p) => Err(FlagError::PercentageInvalid(i64::from(*p))),
        _ => Err(FlagError::PercentageInvalid(-1)),
    }
}

impl Backend for MemoryBackend {
    fn features(&self) -> BTreeSet<FeatureName> {
        self.features
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }

    fn add(&self, feature: &str) -> bool {
        self.add_feature(Feature::new(feature))
    }

    fn add_feature(&self, feature: Feature) -> bool {
        let mut features = self.features.write().unwrap_or_else(PoisonError::into_inner);
        if features.contains_key(&feature.key) {
            return false;
        }
        tracing::debug!("Added feature: {}", feature.key);
        features.insert(feature.key.clone(), feature);
        true
    }

    fn remove(&self, feature: &str) -> bool {
        self.features
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(feature)
            .is_some()
    }

    fn clear(&self, feature: &str) -> bool {
        self.with_feature(feature, |f| {
            *f = Feature::new(feature);
            Ok(())
        })
        .is_ok()
    }

    fn get(&self, feature: &str) -> Result<Feature, FlagError> {
        self.features
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(feature)
            .cloned()
            .ok_or_else(|| FlagError::FeatureNotFound(feature.to_string()))
    }

    fn enable(&self, feature: &str, gate: Gate, thing: Thing) -> Result<bool, FlagError> {
        self.with_feature(feature, |f| match gate {
            Gate::Boolean => {
                f.boolean = Some(true);
                Ok(true)
            }
            Gate::Actors | Gate::Groups => {
                let values = if gate == Gate::Actors {
                    &mut f.actors
                } else {
                    &mut f.groups
                };
                match flipper_id(&thing) {
                    Some(id) if !values.iter().any(|v| v == id) => {
                        values.push(id.to_string());
                        Ok(true)
                    }
                    _ => Ok(false),
                }
            }
            Gate::PercentageOfActors => {
                f.percentage_of_actors = Some(percentage(&thing)?);
                Ok(true)
            }
            Gate::PercentageOfTime => {
                f.percentage_of_time = Some(percentage(&thing)?);
                Ok(true)
            }
            Gate::Expression => Err(FlagError::ExpressionUnsupported),
        })
    }

    fn disable(&self, feature: &str, gate: Gate, thing: Thing) -> Result<bool, FlagError> {
        self.with_feature(feature, |f| match gate {
            Gate::Boolean => {
                f.boolean = Some(false);
                Ok(true)
            }
            Gate::Actors | Gate::Groups => {
                let values = if gate == Gate::Actors {
                    &mut f.actors
                } else {
                    &mut f.groups
                };
                match flipper_id(&thing).and_then(|id| values.iter().position(|v| v == id)) {
                    Some(index) => {
                        values.remove(index);
                        Ok(true)
                    }
                    None => Ok(false),
                }
            }
            Gate::PercentageOfActors => {
                f.percentage_of_actors = None;
                Ok(true)
            }
            Gate::PercentageOfTime => {
                f.percentage_of_time = None;
                Ok(true)
            }
            Gate::Expression => Err(FlagError::ExpressionUnsupported),
        })
    }

    fn load_json(&self, new_state: &str) -> Result<(), FlagError> {
        let parsed: BTreeMap<FeatureName, ApiFeature> = serde_json::from_str(new_state)?;

        let mut loaded = BTreeMap::new();
        for (name, api) in parsed {
            let mut feature = Feature::from_api(api)?;
            feature.key = name.clone();
            loaded.insert(name, feature);
        }

        let mut features = self.features.write().unwrap_or_else(PoisonError::into_inner);
        *features = loaded;
        tracing::info!("Loaded {} features from JSON", features.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::FlagState;

    fn backend_with(name: &str) -> MemoryBackend {
        let backend = MemoryBackend::new();
        assert!(backend.add(name));
        backend
    }

    #[test]
    fn test_add_is_idempotent() {
        let backend = backend_with("search");
        assert!(!backend.add("search"));
        assert_eq!(backend.features().len(), 1);
    }

    #[test]
    fn test_get_missing_feature() {
        let backend = MemoryBackend::new();
        assert!(matches!(
            backend.get("nope"),
            Err(FlagError::FeatureNotFound(name)) if name == "nope"
        ));
    }

    #[test]
    fn test_remove() {
        let backend = backend_with("search");
        assert!(backend.remove("search"));
        assert!(!backend.remove("search"));
        assert!(backend.features().is_empty());
    }

    #[test]
    fn test_enable_and_disable_boolean() {
        let backend = backend_with("search");

        assert!(backend.enable("search", Gate::Boolean, Thing::None).unwrap());
        assert_eq!(backend.get("search").unwrap().state(), FlagState::On);

        assert!(backend.disable("search", Gate::Boolean, Thing::None).unwrap());
        assert_eq!(backend.get("search").unwrap().boolean, Some(false));
        assert_eq!(backend.get("search").unwrap().state(), FlagState::Off);
    }

    #[test]
    fn test_actors_are_deduplicated() {
        let backend = backend_with("search");
        let actor = || Thing::FlipperId("User;1".to_string());

        assert!(backend.enable("search", Gate::Actors, actor()).unwrap());
        assert!(!backend.enable("search", Gate::Actors, actor()).unwrap());
        assert_eq!(backend.get("search").unwrap().actors, vec!["User;1"]);

        assert!(backend.disable("search", Gate::Actors, actor()).unwrap());
        assert!(!backend.disable("search", Gate::Actors, actor()).unwrap());
        assert!(backend.get("search").unwrap().actors.is_empty());
    }

    #[test]
    fn test_groups_ignore_empty_ids() {
        let backend = backend_with("search");
        let empty = Thing::FlipperId(String::new());

        assert!(!backend.enable("search", Gate::Groups, empty).unwrap());
        assert!(!backend.enable("search", Gate::Groups, Thing::None).unwrap());
        assert!(backend.get("search").unwrap().groups.is_empty());
    }

    #[test]
    fn test_percentage_gates() {
        let backend = backend_with("search");

        backend
            .enable("search", Gate::PercentageOfActors, Thing::Percentage(40))
            .unwrap();
        backend
            .enable("search", Gate::PercentageOfTime, Thing::Percentage(5))
            .unwrap();
        let feature = backend.get("search").unwrap();
        assert_eq!(feature.percentage_of_actors, Some(40));
        assert_eq!(feature.percentage_of_time, Some(5));

        backend
            .disable("search", Gate::PercentageOfActors, Thing::None)
            .unwrap();
        assert_eq!(backend.get("search").unwrap().percentage_of_actors, None);

        let err = backend
            .enable("search", Gate::PercentageOfTime, Thing::Percentage(101))
            .unwrap_err();
        assert!(matches!(err, FlagError::PercentageInvalid(101)));
    }

    #[test]
    fn test_expression_gate_unsupported() {
        let backend = backend_with("search");
        assert!(matches!(
            backend.enable("search", Gate::Expression, Thing::None),
            Err(FlagError::ExpressionUnsupported)
        ));
    }

    #[test]
    fn test_enable_unknown_feature() {
        let backend = MemoryBackend::new();
        assert!(matches!(
            backend.enable("ghost", Gate::Boolean, Thing::None),
            Err(FlagError::FeatureNotFound(_))
        ));
    }

    #[test]
    fn test_clear_resets_gates() {
        let backend = backend_with("search");
        backend.enable("search", Gate::Boolean, Thing::None).unwrap();
        backend
            .enable("search", Gate::Actors, Thing::FlipperId("User;1".to_string()))
            .unwrap();

        assert!(backend.clear("search"));
        assert_eq!(backend.get("search").unwrap(), Feature::new("search"));
        assert!(!backend.clear("ghost"));
    }

    #[test]
    fn test_get_multi_fails_on_missing() {
        let backend = backend_with("search");
        backend.add("checkout");

        assert_eq!(backend.get_multi(&["search", "checkout"]).unwrap().len(), 2);
        assert!(backend.get_multi(&["search", "ghost"]).is_err());
    }

    #[test]
    fn test_json_snapshot_restores_state() {
        let source = backend_with("search");
        source.add("checkout");
        source
            .enable("search", Gate::Groups, Thing::FlipperId("Group;15".to_string()))
            .unwrap();
        source
            .enable("checkout", Gate::PercentageOfActors, Thing::Percentage(20))
            .unwrap();

        let snapshot = source.to_json().unwrap();
        assert!(!snapshot.contains(' '));

        let target = backend_with("stale");
        target.load_json(&snapshot).unwrap();

        assert_eq!(target.features(), source.features());
        assert_eq!(target.get("search").unwrap(), source.get("search").unwrap());
        assert_eq!(
            target.get("checkout").unwrap().percentage_of_actors,
            Some(20)
        );
    }

    #[test]
    fn test_load_json_rejects_garbage() {
        let backend = backend_with("search");
        assert!(matches!(backend.load_json("{not json"), Err(FlagError::Json(_))));
        assert!(backend.get("search").is_ok());
    }
}
