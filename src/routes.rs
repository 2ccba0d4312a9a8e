// Route path constants - single source of truth for all API paths

pub const HEALTH: &str = "/health";
pub const INDEX: &str = "/";
pub const SETUP: &str = "/setup";
pub const APP: &str = "/app";
pub const FEATURES: &str = "/features";
pub const CONTROL_PREFIX: &str = "/control/";
pub const CONTROL: &str = "/control/{command}";
pub const SWAGGER_UI: &str = "/swagger-ui";
pub const OPENAPI_JSON: &str = "/api-docs/openapi.json";
