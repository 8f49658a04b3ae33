//! Subscription handlers.

use axum::extract::{Path, State};
use axum::Extension;
use vidtube_core::toggle::{toggle_subscription, ToggleOutcome};
use vidtube_core::views::channels::{
    channel_subscribers, subscribed_channels, ChannelSubscriber, SubscribedChannel,
};

use super::parse_id;
use crate::error::ApiResult;
use crate::middleware::session::CurrentIdentity;
use crate::response::ApiResponse;
use crate::AppState;

/// `POST /api/v1/subscriptions/c/{channelId}` — subscribe or unsubscribe.
pub async fn toggle(
    State(state): State<AppState>,
    Extension(CurrentIdentity(claims)): Extension<CurrentIdentity>,
    Path(channel_id): Path<String>,
) -> ApiResult<ApiResponse<ToggleOutcome>> {
    let channel_id = parse_id(&channel_id, "channel")?;
    let outcome = toggle_subscription(&state.pool, claims.sub, channel_id).await?;
    let message = if outcome.active {
        "Subscribed"
    } else {
        "Unsubscribed"
    };
    Ok(ApiResponse::ok(outcome, message))
}

/// `GET /api/v1/subscriptions/c/{channelId}` — subscribers of a channel,
/// with whether the channel subscribes back to each of them.
pub async fn subscribers(
    State(state): State<AppState>,
    Path(channel_id): Path<String>,
) -> ApiResult<ApiResponse<Vec<ChannelSubscriber>>> {
    let channel_id = parse_id(&channel_id, "channel")?;
    let subs = channel_subscribers(&state.pool, channel_id).await?;
    Ok(ApiResponse::ok(subs, "Subscribers fetched successfully"))
}

/// `GET /api/v1/subscriptions/u/{subscriberId}` — the channels an
/// identity subscribes to, each with its latest published video.
pub async fn channels(
    State(state): State<AppState>,
    Path(subscriber_id): Path<String>,
) -> ApiResult<ApiResponse<Vec<SubscribedChannel>>> {
    let subscriber_id = parse_id(&subscriber_id, "subscriber")?;
    let channels = subscribed_channels(&state.pool, subscriber_id).await?;
    Ok(ApiResponse::ok(
        channels,
        "Subscribed channels fetched successfully",
    ))
}
