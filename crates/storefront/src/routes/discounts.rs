//! Discount route handlers, including the live countdown stream.

use std::convert::Infallible;
use std::pin::pin;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
};
use chrono::Utc;
use futures::{Stream, StreamExt};
use serde::Serialize;
use tracing::instrument;

use marketfront_core::format::format_date_time;
use marketfront_core::{Countdown, DiscountId, TimeRemaining};

use super::call_context;
use crate::api::CallContext;
use crate::api::types::{Discount, DiscountKind};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{OptionalAuth, RequestId};
use crate::models::PageContext;
use crate::services::DiscountService;
use crate::services::countdown::{TICK_PERIOD, ticker};
use crate::state::AppState;

/// Discount display data.
#[derive(Clone)]
pub struct DiscountView {
    pub id: DiscountId,
    pub title: String,
    pub description: Option<String>,
    pub code: Option<String>,
    /// e.g. `20% off` or `$ 5.00 off`.
    pub value_label: String,
    pub ends_label: Option<String>,
    /// Countdown text at render time; the page script keeps it live.
    pub remaining: Option<String>,
}

impl DiscountView {
    #[must_use]
    pub fn new(discount: &Discount, state: &AppState) -> Self {
        let value_label = match discount.kind {
            DiscountKind::Percentage => format!("{}% off", discount.value.normalize()),
            DiscountKind::FixedAmount => format!("{} off", state.format_price(discount.value)),
        };

        Self {
            id: discount.id,
            title: discount.title.clone(),
            description: discount.description.clone(),
            code: discount.code.clone(),
            value_label,
            ends_label: discount
                .ends_at
                .map(|at| format!("Ends {}", format_date_time(at))),
            remaining: discount
                .countdown()
                .map(|c| c.remaining_at(Utc::now()).to_string()),
        }
    }
}

/// Discounts page template.
#[derive(Template, WebTemplate)]
#[template(path = "discounts/index.html")]
pub struct DiscountsTemplate {
    pub page: PageContext,
    pub discounts: Vec<DiscountView>,
}

/// Display active discounts.
#[instrument(skip_all)]
pub async fn index(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    request_id: RequestId,
    page: PageContext,
) -> Result<DiscountsTemplate> {
    let ctx = call_context(user.as_ref(), &request_id);
    let discounts = DiscountService::new(state.backend())
        .list_active(ctx)
        .await?;

    Ok(DiscountsTemplate {
        page,
        discounts: discounts
            .iter()
            .map(|d| DiscountView::new(d, &state))
            .collect(),
    })
}

/// One countdown tick as sent to the browser.
#[derive(Debug, Serialize)]
struct TickPayload {
    display: String,
    total_seconds: u64,
}

impl From<TimeRemaining> for TickPayload {
    fn from(remaining: TimeRemaining) -> Self {
        Self {
            display: remaining.to_string(),
            total_seconds: remaining.total_seconds(),
        }
    }
}

/// Countdown events for one discount.
///
/// `tick` events carry the remaining time every second; a single `expired`
/// event ends the stream.
pub fn countdown_events(countdown: Countdown) -> impl Stream<Item = std::result::Result<Event, Infallible>> {
    async_stream::stream! {
        let mut ticks = pin!(ticker(countdown, TICK_PERIOD));
        while let Some(remaining) = ticks.next().await {
            if remaining.is_zero() {
                yield Ok(Event::default().event("expired").data("0"));
            } else {
                let payload = TickPayload::from(remaining);
                let data = serde_json::to_string(&payload).unwrap_or_default();
                yield Ok(Event::default().event("tick").data(data));
            }
        }
    }
}

/// Stream a discount's countdown as server-sent events.
#[instrument(skip(state, request_id))]
pub async fn countdown(
    State(state): State<AppState>,
    request_id: RequestId,
    Path(id): Path<i64>,
) -> Result<Sse<impl Stream<Item = std::result::Result<Event, Infallible>>>> {
    let ctx = CallContext::new(None, Some(request_id.as_str()));
    let discount = DiscountService::new(state.backend())
        .get(ctx, DiscountId::new(id))
        .await?;

    let countdown = discount
        .countdown()
        .ok_or_else(|| AppError::NotFound(format!("countdown for discount {id}")))?;

    Ok(Sse::new(countdown_events(countdown)).keep_alive(KeepAlive::default()))
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;

    use super::*;

    #[tokio::test]
    async fn test_expired_discount_sends_single_expired_event() {
        let countdown = Countdown::new(Utc::now() - TimeDelta::seconds(1));
        let events: Vec<_> = countdown_events(countdown).collect().await;
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_tick_payload() {
        let payload = TickPayload::from(TimeRemaining::from_seconds(3_725));
        assert_eq!(payload.display, "01:02:05");
        assert_eq!(payload.total_seconds, 3_725);
    }
}
