use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::flippy::FeatureState;

/// Response type for the index page
#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct IndexResponse {
    pub feature_exists: bool,
    pub feature_state: Option<FeatureState>,
}

/// Response type for the setup page
#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct SetupResponse {
    pub feature: String,
    pub created: bool,
}

/// Response type for the app page: feature name mapped to whether it is on
/// for the demo user or the demo group
#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct AppResponse(pub BTreeMap<String, bool>);
