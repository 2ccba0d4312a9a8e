use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::FlagError;

/// Name of a feature flag
pub type FeatureName = String;

/// Gate kinds understood by the Flipper adapter protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Gate {
    Boolean,
    Actors,
    Groups,
    PercentageOfActors,
    PercentageOfTime,
    Expression,
}

impl Gate {
    /// Gate key as used in URLs and API payloads
    pub fn key(self) -> &'static str {
        match self {
            Gate::Boolean => "boolean",
            Gate::Actors => "actors",
            Gate::Groups => "groups",
            Gate::PercentageOfActors => "percentage_of_actors",
            Gate::PercentageOfTime => "percentage_of_time",
            Gate::Expression => "expression",
        }
    }

    /// Gate display name, which differs from the key for actors and groups
    pub fn name(self) -> &'static str {
        match self {
            Gate::Actors => "actor",
            Gate::Groups => "group",
            other => other.key(),
        }
    }

    pub fn from_key(key: &str) -> Result<Self, FlagError> {
        match key {
            "boolean" => Ok(Gate::Boolean),
            "actors" => Ok(Gate::Actors),
            "groups" => Ok(Gate::Groups),
            "percentage_of_actors" => Ok(Gate::PercentageOfActors),
            "percentage_of_time" => Ok(Gate::PercentageOfTime),
            "expression" => Ok(Gate::Expression),
            other => Err(FlagError::UnknownGate(other.to_string())),
        }
    }
}

/// Summary of how a feature is turned on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum FlagState {
    On,
    Conditional,
    Off,
}

/// Thing a gate operation applies to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Thing {
    None,
    FlipperId(String),
    Percentage(u8),
}

/// A feature flag and the values of all of its gates
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Feature {
    pub key: FeatureName,
    pub boolean: Option<bool>,
    pub actors: Vec<String>,
    pub groups: Vec<String>,
    pub percentage_of_actors: Option<u8>,
    pub percentage_of_time: Option<u8>,
    pub expression: Option<JsonValue>,
}

impl Feature {
    pub fn new(key: impl Into<FeatureName>) -> Self {
        Self {
            key: key.into(),
            ..Default::default()
        }
    }

    pub fn state(&self) -> FlagState {
        if self.boolean == Some(true) {
            return FlagState::On;
        }
        if self.actors.is_empty()
            && self.groups.is_empty()
            && self.percentage_of_actors.is_none()
            && self.percentage_of_time.is_none()
            && self.expression.is_none()
        {
            return FlagState::Off;
        }
        FlagState::Conditional
    }

    /// Convert into the Flipper API representation
    pub fn to_api(&self) -> ApiFeature {
        let percentage = |value: Option<u8>| match value {
            Some(p) => JsonValue::String(p.to_string()),
            None => JsonValue::Null,
        };
        let gate = |gate: Gate, value: JsonValue| ApiGate {
            key: gate.key().to_string(),
            name: Some(gate.name().to_string()),
            value,
        };

        ApiFeature {
            key: self.key.clone(),
            state: Some(self.state()),
            gates: vec![
                gate(
                    Gate::Boolean,
                    self.boolean.map(JsonValue::Bool).unwrap_or(JsonValue::Null),
                ),
                gate(Gate::Actors, JsonValue::from(self.actors.clone())),
                gate(Gate::Groups, JsonValue::from(self.groups.clone())),
                gate(Gate::PercentageOfActors, percentage(self.percentage_of_actors)),
                gate(Gate::PercentageOfTime, percentage(self.percentage_of_time)),
                gate(
                    Gate::Expression,
                    self.expression.clone().unwrap_or(JsonValue::Null),
                ),
            ],
        }
    }

    /// Hydrate a feature from the Flipper API representation
    pub fn from_api(api: ApiFeature) -> Result<Self, FlagError> {
        let mut feature = Feature::new(api.key);

        for gate in api.gates {
            match Gate::from_key(&gate.key)? {
                Gate::Boolean => feature.boolean = gate.value.as_bool(),
                Gate::Actors => feature.actors = string_list(&gate.value),
                Gate::Groups => feature.groups = string_list(&gate.value),
                Gate::PercentageOfActors => {
                    feature.percentage_of_actors = parse_percentage(&gate.value)?
                }
                Gate::PercentageOfTime => {
                    feature.percentage_of_time = parse_percentage(&gate.value)?
                }
                Gate::Expression => {
                    feature.expression = match gate.value {
                        JsonValue::Null => None,
                        value => Some(value),
                    }
                }
            }
        }

        Ok(feature)
    }
}

fn string_list(value: &JsonValue) -> Vec<String> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

// Flipper sends percentages as strings, but accept bare numbers too
fn parse_percentage(value: &JsonValue) -> Result<Option<u8>, FlagError> {
    let raw = match value {
        JsonValue::Null => return Ok(None),
        JsonValue::String(s) => s.trim().parse::<i64>().ok(),
        JsonValue::Number(n) => n.as_i64(),
        _ => None,
    };

    match raw {
        Some(p) if (0..=100).contains(&p) => Ok(Some(p as u8)),
        Some(p) => Err(FlagError::PercentageInvalid(p)),
        None => Err(FlagError::PercentageInvalid(-1)),
    }
}

/// Check that a percentage is within 0..=100
pub fn validate_percentage(percentage: i64) -> Result<u8, FlagError> {
    if (0..=100).contains(&percentage) {
        Ok(percentage as u8)
    } else {
        Err(FlagError::PercentageInvalid(percentage))
    }
}

/// Feature as exchanged with Flipper-compatible APIs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ApiFeature {
    pub key: FeatureName,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<FlagState>,
    pub gates: Vec<ApiGate>,
}

/// Single gate inside an [`ApiFeature`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ApiGate {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[schema(value_type = Object)]
    pub value: JsonValue,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_feature_is_off() {
        let feature = Feature::new("background_red");
        assert_eq!(feature.state(), FlagState::Off);
    }

    #[test]
    fn test_boolean_gate_wins() {
        let mut feature = Feature::new("background_red");
        feature.actors.push("User;1".to_string());
        assert_eq!(feature.state(), FlagState::Conditional);

        feature.boolean = Some(true);
        assert_eq!(feature.state(), FlagState::On);

        feature.boolean = Some(false);
        assert_eq!(feature.state(), FlagState::Conditional);
    }

    #[test]
    fn test_to_api_shape() {
        let mut feature = Feature::new("background_red");
        feature.groups.push("Group;15".to_string());
        feature.percentage_of_actors = Some(30);

        let value = serde_json::to_value(feature.to_api()).unwrap();

        assert_eq!(value["key"], "background_red");
        assert_eq!(value["state"], "conditional");
        assert_eq!(value["gates"][0], json!({"key": "boolean", "name": "boolean", "value": null}));
        assert_eq!(value["gates"][1]["name"], "actor");
        assert_eq!(value["gates"][2]["value"], json!(["Group;15"]));
        assert_eq!(value["gates"][3]["value"], "30");
        assert_eq!(value["gates"][4]["value"], JsonValue::Null);
    }

    #[test]
    fn test_from_api_flipper_payload() {
        let api: ApiFeature = serde_json::from_value(json!({
            "key": "search",
            "gates": [
                {"key": "boolean", "value": null},
                {"key": "actors", "value": ["User;1", "User;2"]},
                {"key": "groups", "value": []},
                {"key": "percentage_of_actors", "value": "25"},
                {"key": "percentage_of_time", "value": 5},
                {"key": "expression", "value": null}
            ]
        }))
        .unwrap();

        let feature = Feature::from_api(api).unwrap();

        assert_eq!(feature.key, "search");
        assert_eq!(feature.boolean, None);
        assert_eq!(feature.actors, vec!["User;1", "User;2"]);
        assert_eq!(feature.percentage_of_actors, Some(25));
        assert_eq!(feature.percentage_of_time, Some(5));
        assert_eq!(feature.state(), FlagState::Conditional);
    }

    #[test]
    fn test_from_api_rejects_unknown_gate() {
        let api = ApiFeature {
            key: "search".to_string(),
            state: None,
            gates: vec![ApiGate {
                key: "moon_phase".to_string(),
                name: None,
                value: JsonValue::Null,
            }],
        };

        let err = Feature::from_api(api).unwrap_err();
        assert!(err.to_string().contains("moon_phase"));
    }

    #[test]
    fn test_from_api_rejects_out_of_range_percentage() {
        let api = ApiFeature {
            key: "search".to_string(),
            state: None,
            gates: vec![ApiGate {
                key: "percentage_of_time".to_string(),
                name: None,
                value: json!("150"),
            }],
        };

        assert!(matches!(
            Feature::from_api(api),
            Err(FlagError::PercentageInvalid(150))
        ));
    }

    #[test]
    fn test_validate_percentage_bounds() {
        assert_eq!(validate_percentage(0).unwrap(), 0);
        assert_eq!(validate_percentage(100).unwrap(), 100);
        assert!(validate_percentage(-10).is_err());
        assert!(validate_percentage(101).is_err());
    }
}
