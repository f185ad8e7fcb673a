//! Loyalty points and reward redemption.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    response::Redirect,
};
use tower_sessions::Session;
use tracing::instrument;

use marketfront_core::RewardId;

use super::call_context;
use crate::api::types::Reward;
use crate::error::Result;
use crate::filters;
use crate::middleware::{RequestId, RequireAuth};
use crate::models::{Flash, PageContext};
use crate::services::RewardService;
use crate::state::AppState;

/// Reward display data.
#[derive(Clone)]
pub struct RewardView {
    pub id: RewardId,
    pub name: String,
    pub description: Option<String>,
    pub points_cost: i64,
    pub affordable: bool,
}

impl RewardView {
    fn new(reward: &Reward, balance: i64) -> Self {
        Self {
            id: reward.id,
            name: reward.name.clone(),
            description: reward.description.clone(),
            points_cost: reward.points_cost,
            affordable: reward.points_cost <= balance,
        }
    }
}

/// Rewards page template.
#[derive(Template, WebTemplate)]
#[template(path = "rewards/index.html")]
pub struct RewardsTemplate {
    pub page: PageContext,
    pub points: i64,
    pub rewards: Vec<RewardView>,
}

/// Display the customer's points and the rewards catalog.
#[instrument(skip_all)]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    request_id: RequestId,
    page: PageContext,
) -> Result<RewardsTemplate> {
    let ctx = call_context(Some(&user), &request_id);
    let summary = RewardService::new(state.backend()).summary(ctx).await?;

    Ok(RewardsTemplate {
        page,
        points: summary.points,
        rewards: summary
            .rewards
            .iter()
            .map(|r| RewardView::new(r, summary.points))
            .collect(),
    })
}

/// Redeem a reward and return to the rewards page.
#[instrument(skip(state, user, request_id, session))]
pub async fn redeem(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    request_id: RequestId,
    session: Session,
    Path(id): Path<i64>,
) -> Result<Redirect> {
    let ctx = call_context(Some(&user), &request_id);

    let flash = match RewardService::new(state.backend())
        .redeem(ctx, RewardId::new(id))
        .await
    {
        Ok(redemption) => Flash::success(redemption_message(
            redemption.code.as_deref(),
            redemption.remaining_points,
        )),
        Err(e) if e.is_unauthorized() => return Err(e.into()),
        Err(e) => {
            tracing::info!(error = %e, "Reward redemption rejected");
            Flash::error(e.user_message())
        }
    };
    flash.push(&session).await;

    Ok(Redirect::to("/rewards"))
}

fn redemption_message(code: Option<&str>, remaining: i64) -> String {
    match code {
        Some(code) => format!("Reward redeemed. Your code is {code}. {remaining} points left."),
        None => format!("Reward redeemed. {remaining} points left."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_affordable_flag() {
        let reward = Reward {
            id: RewardId::new(1),
            name: "Free coffee".to_string(),
            description: None,
            points_cost: 100,
        };
        assert!(RewardView::new(&reward, 100).affordable);
        assert!(!RewardView::new(&reward, 99).affordable);
    }

    #[test]
    fn test_redemption_message() {
        assert_eq!(
            redemption_message(Some("FREE-42"), 50),
            "Reward redeemed. Your code is FREE-42. 50 points left."
        );
        assert_eq!(redemption_message(None, 0), "Reward redeemed. 0 points left.");
    }
}
