use crate::error::{ApiError, ErrorResponse};
use crate::flippy::Flippy;
use crate::routes;
use crate::state::AppState;
use axum::{extract::Path, extract::State, http::StatusCode};

const PERCENT_STEP: i64 = 10;

/// Actions the control endpoint understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    Clear,
    BoolOn,
    BoolOff,
    AddUser,
    RemoveUser,
    AddGroup,
    RemoveGroup,
    PercentLess,
    PercentMore,
    TimeLess,
    TimeMore,
}

impl ControlCommand {
    pub fn parse(command: &str) -> Option<Self> {
        match command {
            "clear" => Some(ControlCommand::Clear),
            "bool-on" => Some(ControlCommand::BoolOn),
            "bool-off" => Some(ControlCommand::BoolOff),
            "add-user" => Some(ControlCommand::AddUser),
            "remove-user" => Some(ControlCommand::RemoveUser),
            "add-group" => Some(ControlCommand::AddGroup),
            "remove-group" => Some(ControlCommand::RemoveGroup),
            "percent-less" => Some(ControlCommand::PercentLess),
            "percent-more" => Some(ControlCommand::PercentMore),
            "time-less" => Some(ControlCommand::TimeLess),
            "time-more" => Some(ControlCommand::TimeMore),
            _ => None,
        }
    }
}

// Unset and zero both count as "no rollout yet"
fn step_down(current: Option<u8>) -> Option<i64> {
    match current {
        Some(p) if p > 0 => Some((i64::from(p) - PERCENT_STEP).max(0)),
        _ => None,
    }
}

fn step_up(current: Option<u8>) -> Option<i64> {
    match current {
        None | Some(0) => Some(PERCENT_STEP),
        Some(p) if p < 100 => Some((i64::from(p) + PERCENT_STEP).min(100)),
        Some(_) => None,
    }
}

fn apply(state: &AppState, command: ControlCommand) -> Result<(), ApiError> {
    let flippy: &Flippy = &state.flippy;
    let feature = state.feature();

    match command {
        ControlCommand::Clear => {
            flippy.clear(feature);
        }
        ControlCommand::BoolOn => flippy.enable(feature)?,
        ControlCommand::BoolOff => flippy.disable(feature)?,
        ControlCommand::AddUser => flippy.enable_actor(feature, &*state.user)?,
        ControlCommand::RemoveUser => flippy.disable_actor(feature, &*state.user)?,
        ControlCommand::AddGroup => flippy.enable_group(feature, &*state.group)?,
        ControlCommand::RemoveGroup => flippy.disable_group(feature, &*state.group)?,
        ControlCommand::PercentLess | ControlCommand::PercentMore => {
            let current = flippy.get_feature_state(feature)?.percent_actors;
            let next = if command == ControlCommand::PercentLess {
                step_down(current)
            } else {
                step_up(current)
            };
            if let Some(p) = next {
                flippy.enable_percentage_of_actors(feature, p)?;
            }
        }
        ControlCommand::TimeLess | ControlCommand::TimeMore => {
            let current = flippy.get_feature_state(feature)?.percent_time;
            let next = if command == ControlCommand::TimeLess {
                step_down(current)
            } else {
                step_up(current)
            };
            if let Some(p) = next {
                flippy.enable_percentage_of_time(feature, p)?;
            }
        }
    }

    Ok(())
}

/// POST /control/{command} handler - Change the demo feature
///
/// Deliberately unauthenticated. Never expose this on a public network.
#[utoipa::path(
    post,
    path = routes::CONTROL,
    params(
        ("command" = String, Path, description = "Control action, e.g. bool-on or percent-more")
    ),
    responses(
        (status = 201, description = "Command applied"),
        (status = 404, description = "Unknown command or demo feature missing", body = ErrorResponse),
        (status = 405, description = "Method other than POST")
    ),
    tag = "control"
)]
pub async fn control_handler(
    State(state): State<AppState>,
    Path(command): Path<String>,
) -> Result<StatusCode, ApiError> {
    let parsed = ControlCommand::parse(&command)
        .ok_or_else(|| ApiError::UnknownCommand(command.clone()))?;

    apply(&state, parsed)?;

    tracing::info!("Applied control command {} to {}", command, state.feature());
    Ok(StatusCode::CREATED)
}
