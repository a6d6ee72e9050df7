// src/agents/fallback.rs

use super::agent_trait::{Decision, MarketContext, Mover};
use super::config::{
    AGGRESSIVE_SELL_COIN, BUY_SIZE_BASE, BUY_SIZE_SPREAD, MAX_POSITION_FRACTION, MIN_BUY_SHARES,
    MIN_CASH_FOR_BUY, SELL_SIZE_BASE, SELL_SIZE_SPREAD, STOP_LOSS_PCT, TAKE_PROFIT_PCT,
};
use super::personality::Personality;
use crate::types::TradeAction;
use rand::seq::SliceRandom;
use rand::{Rng, RngCore};

/// The local rule-based trader used whenever no provider answers.
///
/// One uniform draw picks the branch: below the buy chance it buys (if there
/// are gainers and enough cash), below buy + sell chance it considers selling
/// a random holding, otherwise it holds.
pub fn decide(personality: &Personality, context: &MarketContext, rng: &mut dyn RngCore) -> Decision {
    let roll: f64 = rng.gen_range(0.0..1.0);
    let buy_chance = personality.buy_chance();
    let sell_chance = personality.sell_chance();

    if roll < buy_chance && !context.top_gainers.is_empty() && context.cash > MIN_CASH_FOR_BUY {
        if let Some(target) = pick_buy_target(personality, context, rng) {
            return buy(personality, context, target, rng);
        }
    }

    if roll < buy_chance + sell_chance && !context.holdings.is_empty() {
        if let Some(decision) = consider_sell(personality, context, rng) {
            return decision;
        }
    }

    Decision::hold(
        format!("Scanning the tape as a {} trader. Nothing stands out.", personality.label()),
        "No compelling opportunity this month; holding current positions.",
    )
}

fn pick_buy_target<'a>(
    personality: &Personality,
    context: &'a MarketContext,
    rng: &mut dyn RngCore,
) -> Option<&'a Mover> {
    if personality.technical {
        context.top_gainers.first()
    } else if personality.conservative {
        // buy the dip
        context
            .top_losers
            .choose(rng)
            .or_else(|| context.top_gainers.choose(rng))
    } else {
        context.top_gainers.choose(rng)
    }
}

fn buy(personality: &Personality, context: &MarketContext, target: &Mover, rng: &mut dyn RngCore) -> Decision {
    let max_affordable = (MAX_POSITION_FRACTION * context.cash / target.price).floor();
    let sized = (max_affordable * (BUY_SIZE_BASE + rng.gen_range(0.0..BUY_SIZE_SPREAD))).floor() as u64;
    let shares = sized.max(MIN_BUY_SHARES);

    let why = if personality.technical {
        format!("{} leads the tape at {:+.2}%; riding the momentum.", target.ticker, target.change_percent)
    } else if personality.conservative && target.change_percent < 0.0 {
        format!("{} is down {:.2}%; picking up a quality name on the dip.", target.ticker, target.change_percent.abs())
    } else {
        format!("{} is moving {:+.2}%; taking a position.", target.ticker, target.change_percent)
    };

    Decision {
        thinking_text: format!(
            "Cash at ${:.0}. {} trades at ${:.2}; sizing {} shares.",
            context.cash, target.ticker, target.price, shares
        ),
        action: TradeAction::buy(&target.ticker, shares).to_string(),
        reasoning_text: why,
    }
}

fn consider_sell(personality: &Personality, context: &MarketContext, rng: &mut dyn RngCore) -> Option<Decision> {
    let holding = context.holdings.choose(rng)?;
    let profit = holding.profit_percent();

    let should_sell = profit > TAKE_PROFIT_PCT
        || profit < STOP_LOSS_PCT
        || (personality.aggressive && rng.gen_bool(AGGRESSIVE_SELL_COIN));
    if !should_sell {
        return None;
    }

    let shares = (holding.shares as f64 * (SELL_SIZE_BASE + rng.gen_range(0.0..SELL_SIZE_SPREAD))).floor() as u64;
    if shares == 0 {
        return None;
    }

    let why = if profit > TAKE_PROFIT_PCT {
        format!("Locking in a {:.1}% gain on {}.", profit, holding.ticker)
    } else if profit < STOP_LOSS_PCT {
        format!("Cutting {} at a {:.1}% loss before it gets worse.", holding.ticker, profit.abs())
    } else {
        format!("Rotating out of {} to free up capital.", holding.ticker)
    };

    Some(Decision {
        thinking_text: format!(
            "Reviewing {}: {} shares at ${:.2} avg, now ${:.2}.",
            holding.ticker, holding.shares, holding.avg_cost, holding.price
        ),
        action: TradeAction::sell(&holding.ticker, shares).to_string(),
        reasoning_text: why,
    })
}
