//! Deterministic per-topic templates turning a [`TopicFact`] into a crisp
//! human-readable answer.
//!
//! Formatting is pure: no lookups, no side effects, so each template is
//! independently testable. Truncation rules are fixed — roadmap shows at
//! most 4 milestones with at most 3 goals each, use cases at most 5
//! entries, allocation tables are never truncated.

use std::fmt::Write;

use super::facts::TopicFact;

/// Maximum roadmap milestones rendered.
const MAX_MILESTONES: usize = 4;
/// Maximum goals rendered per milestone.
const MAX_GOALS_PER_MILESTONE: usize = 3;
/// Maximum use-case entries rendered.
const MAX_USE_CASES: usize = 5;

/// Render a whole number with comma grouping ("1,000,000,000").
pub fn group_thousands(value: f64) -> String {
    let negative = value < 0.0;
    let rounded = value.abs().round() as u128;
    let digits = rounded.to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if negative {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

/// Render a topic fact through its deterministic template.
///
/// Returns `None` when the variant carries no template; the router must
/// then fall through to the generation tiers. Every current variant has
/// one, so `None` marks the extension point rather than a live branch.
pub fn format_fact(fact: &TopicFact) -> Option<String> {
    match fact {
        TopicFact::Identity(identity) => Some(format!(
            "**{}** ({}) is an {}. It addresses complexity and misinformation in crypto \
             by combining AI with blockchain. The token fuels the AI + Blockchain ecosystem \
             designed to make crypto safer, simpler, and more accessible.",
            identity.token_name, identity.symbol, identity.category
        )),

        TopicFact::Tokenomics(tokenomics) => {
            let mut text = String::from("**Tokenomics Overview:**\n");
            if let Some(supply) = &tokenomics.total_supply {
                let _ = writeln!(text, "- **Total Supply:** {} CGPT", supply.display_grouped());
                if let Some(supply_type) = &tokenomics.supply_type {
                    let _ = writeln!(text, "- **Type:** {}\n", supply_type);
                }
            }

            if !tokenomics.allocation.is_empty() {
                text.push_str("**Token Allocation Breakdown:**\n");
                for item in &tokenomics.allocation {
                    let _ = writeln!(
                        text,
                        "- **{}** ({}%): {} tokens",
                        item.category,
                        item.percentage,
                        item.tokens.display_grouped()
                    );
                    if let Some(vesting) = &item.vesting {
                        let _ = writeln!(text, "  *Vesting: {}*", vesting);
                    }
                }
            }

            Some(text.trim().to_string())
        }

        TopicFact::Roadmap(roadmap) => {
            let mut text = String::from("**Roadmap Overview:**\n");
            if let Some(description) = roadmap
                .overview
                .as_ref()
                .and_then(|o| o.description.as_deref())
            {
                let _ = writeln!(text, "{}\n", description);
            }

            if !roadmap.milestones.is_empty() {
                text.push_str("**Key Milestones:**\n");
                for milestone in roadmap.milestones.iter().take(MAX_MILESTONES) {
                    let quarter = milestone.quarter.as_deref().unwrap_or("");
                    let year = milestone
                        .year
                        .map(|y| y.to_string())
                        .unwrap_or_default();
                    let _ = writeln!(text, "- **{} {}** - {}", quarter, year, milestone.title);
                    for goal in milestone.goals.iter().take(MAX_GOALS_PER_MILESTONE) {
                        let _ = writeln!(text, "  • {}", goal.name);
                    }
                }
            }

            Some(text.trim().to_string())
        }

        TopicFact::Fundraising(fundraising) => {
            let mut text = String::from("**Fundraising Structure:**\n");
            if let Some(goal) = fundraising
                .overview
                .as_ref()
                .and_then(|o| o.strategic_goal.as_deref())
            {
                let _ = writeln!(text, "{}\n", goal);
            }

            if !fundraising.rounds.is_empty() {
                text.push_str("**Funding Rounds:**\n");
                for round in &fundraising.rounds {
                    let price = round
                        .price_usd
                        .map(|p| format!("${}", p))
                        .unwrap_or_else(|| "N/A".to_string());
                    let tokens = round
                        .tokens_allocated
                        .map(group_thousands)
                        .unwrap_or_else(|| "N/A".to_string());
                    let target = round
                        .target_raise_usd
                        .map(|t| format!("${}", group_thousands(t)))
                        .unwrap_or_else(|| "N/A".to_string());
                    let _ = writeln!(text, "- **{}**", round.name);
                    let _ = writeln!(
                        text,
                        "  Price: {} | Tokens: {} | Target: {}",
                        price, tokens, target
                    );
                    if let Some(vesting) = &round.vesting {
                        let _ = writeln!(
                            text,
                            "  Vesting: {}% TGE, {}% monthly",
                            vesting.tge_unlock_percentage, vesting.monthly_unlock_percentage
                        );
                    }
                }
            }

            Some(text.trim().to_string())
        }

        TopicFact::Usecases(usecases) => {
            let mut text = String::from("**CrypGPT Use Cases:**\n");
            if let Some(description) = usecases
                .overview
                .as_ref()
                .and_then(|o| o.description.as_deref())
            {
                let _ = writeln!(text, "{}\n", description);
            }

            for usecase in usecases.use_cases.iter().take(MAX_USE_CASES) {
                let _ = writeln!(text, "- **{}** ({})", usecase.name, usecase.category);
                let _ = writeln!(text, "  {}", usecase.description);
                if let Some(benefit) = &usecase.primary_benefit {
                    let _ = writeln!(text, "  💡 Benefit: {}", benefit);
                }
            }

            Some(text.trim().to_string())
        }
    }
}
