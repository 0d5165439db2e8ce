//! Deterministic fallback generator
//!
//! Builds an answer from locally computed data only. Template selection is
//! driven by the question type, then by concepts and topics. Total: every
//! input produces non-empty text and nothing here can fail.

use crate::classifier::{ClassificationBundle, Concept, QuestionType, Topic};
use crate::rules::Recommendation;

use super::context::{FinancialContext, NOT_PROVIDED};
use super::AdviceContext;

const LISTED_ITEMS: usize = 3;

/// Plain-language explanation of a product
fn explain_concept(concept: Concept) -> &'static str {
    match concept {
        Concept::MutualFund => "A mutual fund pools money from many investors and a professional manager invests it in stocks, bonds or both. You own units whose value moves with the portfolio.",
        Concept::FixedDeposit => "A fixed deposit (FD) locks a lump sum with a bank for a set term at a guaranteed interest rate. Breaking it early usually costs a penalty.",
        Concept::Sip => "A SIP (systematic investment plan) invests a fixed amount into a mutual fund at regular intervals, which averages out your purchase price over time.",
        Concept::Stock => "A stock is a share of ownership in a company. Prices can rise or fall sharply, and returns come from price growth and dividends.",
        Concept::Bond => "A bond is a loan to a government or company that pays regular interest and returns the principal at maturity.",
        Concept::Etf => "An ETF or index fund tracks a market index at low cost and trades like a stock, giving broad diversification in one purchase.",
        Concept::Ppf => "The PPF (Public Provident Fund) is a long-term, government-backed savings scheme with tax benefits and a 15-year lock-in.",
        Concept::Gold => "Gold is often held as a hedge against inflation and currency risk. It pays no income, so returns come only from price changes.",
        Concept::Insurance => "Insurance transfers a financial risk to an insurer in exchange for a premium. Term life and health cover are the usual starting points.",
        Concept::Crypto => "Cryptocurrencies are digital assets secured by cryptography. They are highly volatile and largely unregulated, so size any position carefully.",
    }
}

/// Risk, liquidity and typical use of a product
fn concept_profile(concept: Concept) -> (&'static str, &'static str, &'static str) {
    match concept {
        Concept::MutualFund => ("moderate to high", "high (a few days)", "long-term growth with diversification"),
        Concept::FixedDeposit => ("low", "low until maturity", "capital protection and predictable returns"),
        Concept::Sip => ("moderate to high", "high (a few days)", "disciplined monthly investing"),
        Concept::Stock => ("high", "high (market hours)", "long-term growth if you can stomach volatility"),
        Concept::Bond => ("low to moderate", "moderate", "steady income"),
        Concept::Etf => ("moderate", "high (market hours)", "low-cost, broad market exposure"),
        Concept::Ppf => ("very low", "very low (15-year lock-in)", "tax-efficient long-term savings"),
        Concept::Gold => ("moderate", "moderate to high", "diversification and inflation hedging"),
        Concept::Insurance => ("not an investment", "n/a", "protecting against large losses"),
        Concept::Crypto => ("very high", "high", "small speculative allocations only"),
    }
}

fn explain_topic(topic: Topic) -> &'static str {
    match topic {
        Topic::Investment => "Investing puts money to work so it can grow faster than inflation. Diversify across asset types and match risk to how long you can leave the money invested.",
        Topic::Savings => "Saving means setting money aside before spending it. An emergency fund of three to six months of expenses comes first, then savings for specific goals.",
        Topic::Debt => "Debt costs you interest every month. Paying down the highest-rate balances first saves the most money.",
        Topic::Risk => "Risk is the chance that an investment loses value. Higher expected returns usually come with bigger swings.",
        Topic::Planning => "Financial planning means setting goals, estimating what they cost and working backwards to a monthly amount.",
        Topic::Income => "Income is what funds everything else. Track take-home pay so your budget uses real numbers.",
        Topic::Spending => "Tracking spending by category shows where money actually goes, which is the first step to changing it.",
        Topic::General => "Good personal finance rests on a few habits: spend less than you earn, keep an emergency fund, avoid high-interest debt and invest the rest for the long term.",
    }
}

/// Build a fallback answer. Never fails; never returns empty text.
///
/// `top_categories` caps how many spending categories the summary lists.
pub fn generate(
    question: &str,
    ctx: &AdviceContext<'_>,
    classification: &ClassificationBundle,
    top_categories: usize,
) -> String {
    let fc = FinancialContext::build(ctx, top_categories);

    let text = match classification.question_type {
        QuestionType::Educational => educational(classification),
        QuestionType::Comparative => comparative(classification),
        QuestionType::Advisory => advisory(ctx, &fc, classification),
        QuestionType::Calculative => calculative(ctx, &fc),
        QuestionType::Planning => planning(ctx, &fc),
        QuestionType::General => general(ctx, &fc, question),
    };

    if text.trim().is_empty() {
        return general(ctx, &fc, question);
    }
    text
}

fn educational(classification: &ClassificationBundle) -> String {
    let mut parts: Vec<String> = classification
        .concepts
        .iter()
        .map(|c| format!("**{}**: {}", c.label(), explain_concept(*c)))
        .collect();

    if parts.is_empty() {
        parts = classification
            .topics
            .iter()
            .map(|t| explain_topic(*t).to_string())
            .collect();
    }

    parts.push("Ask me how this applies to your own spending and I can use your numbers.".to_string());
    parts.join("\n\n")
}

fn comparative(classification: &ClassificationBundle) -> String {
    let concepts: Vec<Concept> = classification.concepts.iter().copied().collect();

    if concepts.len() < 2 {
        let mut text = String::from(
            "When comparing options, look at three things: how much risk you take, how quickly you can get your money back, and what the option is best suited for.",
        );
        if let Some(concept) = concepts.first() {
            text.push_str(&format!(
                "\n\n**{}**: {}",
                concept.label(),
                explain_concept(*concept)
            ));
        }
        return text;
    }

    let names: Vec<&str> = concepts.iter().map(|c| c.label()).collect();
    let mut lines = vec![format!("Here is how {} compare:", join_and(&names))];
    for concept in &concepts {
        let (risk, liquidity, best_for) = concept_profile(*concept);
        lines.push(format!(
            "\n**{}**\n- Risk: {}\n- Liquidity: {}\n- Best for: {}",
            concept.label(),
            risk,
            liquidity,
            best_for
        ));
    }
    lines.push(
        "\nThe right choice depends on your time horizon and how much volatility you can accept."
            .to_string(),
    );
    lines.join("\n")
}

fn advisory(
    ctx: &AdviceContext<'_>,
    fc: &FinancialContext,
    classification: &ClassificationBundle,
) -> String {
    if classification.has_topic(Topic::Spending) || classification.has_topic(Topic::Savings) {
        return savings_strategy(ctx, fc);
    }
    if classification.has_topic(Topic::Investment) {
        return investment_strategy(ctx, fc, classification);
    }
    if classification.has_topic(Topic::Debt) {
        return debt_strategy(ctx, fc);
    }

    let mut text = String::from("Here is what stands out in your finances right now:");
    text.push_str(&summary_lines(ctx, fc));
    text.push_str(&recommendation_lines(&ctx.rules.recommendations));
    text
}

fn savings_strategy(ctx: &AdviceContext<'_>, fc: &FinancialContext) -> String {
    let snapshot = ctx.snapshot;
    let mut text = format!(
        "You've spent {} in total across {} transactions.",
        ctx.money(snapshot.total_spent),
        snapshot.transaction_count
    );

    match snapshot.largest_category() {
        Some((category, amount)) => {
            let share = if snapshot.total_spent > 0.0 {
                amount / snapshot.total_spent * 100.0
            } else {
                0.0
            };
            text.push_str(&format!(
                " Your largest category is {} at {} ({:.0}% of spending).",
                category.label(),
                ctx.money(amount),
                share
            ));
            text.push_str("\n\nA practical savings plan:");
            text.push_str(&format!(
                "\n1. Set a monthly cap for {} about 10-15% below what you spend now; that alone frees roughly {}.",
                category.label().to_lowercase(),
                ctx.money(amount * 0.1)
            ));
        }
        None => {
            text.push_str(" There is no spending recorded yet, so start by logging a few weeks of purchases.");
            text.push_str("\n\nA practical savings plan:");
            text.push_str("\n1. Record every purchase for a month to see your real pattern.");
        }
    }

    text.push_str("\n2. Review subscriptions and recurring bills and cancel what you no longer use.");
    match fc.monthly_surplus {
        Some(surplus) if surplus > 0.0 => text.push_str(&format!(
            "\n3. Automate a transfer of at least {} to savings on payday (20% of your monthly surplus of {}).",
            ctx.money(surplus * 0.2),
            ctx.money(surplus)
        )),
        Some(_) => text.push_str(
            "\n3. Your expenses currently meet or exceed your income; trimming the largest category is the first priority.",
        ),
        None => text.push_str(&format!(
            "\n3. Automate a fixed transfer to savings on payday (income: {}; add it to your profile for a tailored amount).",
            NOT_PROVIDED
        )),
    }

    text.push_str(&recommendation_lines(&ctx.rules.recommendations));
    text
}

fn investment_strategy(
    ctx: &AdviceContext<'_>,
    fc: &FinancialContext,
    classification: &ClassificationBundle,
) -> String {
    let mut text = match fc.monthly_surplus {
        Some(surplus) if surplus > 0.0 => format!(
            "You have a monthly surplus of about {}, which you could put to work.",
            ctx.money(surplus)
        ),
        Some(_) => "Your spending currently uses all of your income, so build a surplus before investing.".to_string(),
        None => format!(
            "Your monthly surplus is {} because there is no income on file.",
            NOT_PROVIDED
        ),
    };

    match fc.emergency_months() {
        Some(months) if months < 3.0 => text.push_str(&format!(
            " Your savings cover {:.1} months of expenses, so build an emergency fund of three to six months before taking market risk.",
            months
        )),
        Some(months) => text.push_str(&format!(
            " With {:.1} months of expenses saved, your safety net is in place.",
            months
        )),
        None => {}
    }

    text.push_str("\n\nA simple approach: start a monthly SIP into a diversified index fund, keep short-term money in low-risk deposits, and increase contributions as your income grows.");

    for concept in &classification.concepts {
        text.push_str(&format!("\n\n**{}**: {}", concept.label(), explain_concept(*concept)));
    }
    text
}

fn debt_strategy(ctx: &AdviceContext<'_>, fc: &FinancialContext) -> String {
    let mut text = String::from(
        "To get debt under control:\n1. List every balance with its interest rate.\n2. Pay the minimum on all of them, then put every extra amount on the highest-rate debt first.\n3. Avoid adding new balances while you pay down.",
    );
    match fc.monthly_surplus {
        Some(surplus) if surplus > 0.0 => text.push_str(&format!(
            "\n\nYour monthly surplus of about {} is what you can direct at the highest-rate balance.",
            ctx.money(surplus)
        )),
        _ => text.push_str(&format!(
            "\n\nYour monthly surplus is {}; freeing even a small amount each month speeds things up.",
            fc.monthly_surplus
                .map(|s| ctx.money(s))
                .unwrap_or_else(|| NOT_PROVIDED.to_string())
        )),
    }
    text
}

fn calculative(ctx: &AdviceContext<'_>, fc: &FinancialContext) -> String {
    let snapshot = ctx.snapshot;
    let tf = &snapshot.timeframes;
    let mut text = String::from("Here are your numbers:");
    text.push_str(&format!("\n- Total spent: {}", ctx.money(snapshot.total_spent)));
    text.push_str(&format!(
        "\n- Last 7 / 30 / 90 days: {} / {} / {}",
        ctx.money(tf.last_7_days),
        ctx.money(tf.last_30_days),
        ctx.money(tf.last_90_days)
    ));
    text.push_str(&format!(
        "\n- Average per day / week / month: {} / {} / {}",
        ctx.money(snapshot.averages.daily),
        ctx.money(snapshot.averages.weekly),
        ctx.money(snapshot.averages.monthly)
    ));
    text.push_str(&format!(
        "\n- Monthly income: {}",
        fc.monthly_income
            .map(|i| ctx.money(i))
            .unwrap_or_else(|| NOT_PROVIDED.to_string())
    ));
    text.push_str(&format!(
        "\n- Monthly surplus: {}",
        fc.monthly_surplus
            .map(|s| ctx.money(s))
            .unwrap_or_else(|| NOT_PROVIDED.to_string())
    ));
    if let Some(latest) = snapshot.latest_change() {
        match latest.change_percent {
            Some(change) => text.push_str(&format!(
                "\n- Change in {} vs the month before: {:+.1}%",
                latest.month, change
            )),
            None => text.push_str(&format!(
                "\n- Change in {} vs the month before: not available",
                latest.month
            )),
        }
    }
    text
}

fn planning(ctx: &AdviceContext<'_>, fc: &FinancialContext) -> String {
    let mut text = if fc.goals.is_empty() {
        "You haven't set any goals yet. Start by naming one goal, its cost and a target date.".to_string()
    } else {
        format!("Your goals: {}.", fc.goals.join(", "))
    };

    match fc.monthly_surplus {
        Some(surplus) if surplus > 0.0 => {
            text.push_str(&format!(
                "\n\nWith a monthly surplus of about {}, you could set aside {} per month for your first goal and keep the rest for savings.",
                ctx.money(surplus),
                ctx.money(surplus * 0.5)
            ));
        }
        Some(_) => text.push_str(
            "\n\nRight now your expenses match or exceed your income, so the first step is creating a surplus.",
        ),
        None => text.push_str(&format!(
            "\n\nMonthly surplus: {}. Add your income to plan contributions.",
            NOT_PROVIDED
        )),
    }

    match fc.emergency_months() {
        Some(months) => text.push_str(&format!(
            "\nYour savings cover {:.1} months of expenses; aim for at least six before long-term goals.",
            months
        )),
        None => text.push_str(&format!(
            "\nEmergency fund coverage: {} (needs savings and spending data).",
            NOT_PROVIDED
        )),
    }

    text.push_str(&recommendation_lines(&ctx.rules.recommendations));
    text
}

fn general(ctx: &AdviceContext<'_>, fc: &FinancialContext, question: &str) -> String {
    let mut text = String::from("I can still help based on your data.");
    if question.trim().is_empty() {
        text.push_str(" Ask me anything about your spending, savings or goals.");
    }
    text.push_str(&summary_lines(ctx, fc));

    let alerts: Vec<String> = ctx
        .rules
        .alerts
        .iter()
        .take(LISTED_ITEMS)
        .map(|a| format!("\n- {}", a.message))
        .collect();
    if !alerts.is_empty() {
        text.push_str("\n\nThings to watch:");
        text.push_str(&alerts.concat());
    }

    text.push_str(&recommendation_lines(&ctx.rules.recommendations));
    text
}

fn summary_lines(ctx: &AdviceContext<'_>, fc: &FinancialContext) -> String {
    let mut text = format!(
        "\n\n- Financial health score: {}/100 ({} risk)",
        fc.health_score, fc.risk
    );
    text.push_str(&format!(
        "\n- Total spent: {}",
        ctx.money(ctx.snapshot.total_spent)
    ));
    if !fc.top_categories.is_empty() {
        let categories: Vec<String> = fc
            .top_categories
            .iter()
            .map(|(category, amount)| format!("{} ({})", category.label(), ctx.money(*amount)))
            .collect();
        text.push_str(&format!("\n- Top categories: {}", categories.join(", ")));
    }
    text
}

fn recommendation_lines(recommendations: &[Recommendation]) -> String {
    if recommendations.is_empty() {
        return String::new();
    }
    let mut text = String::from("\n\nSuggested next steps:");
    for rec in recommendations.iter().take(LISTED_ITEMS) {
        text.push_str(&format!("\n- {}: {}", rec.action, rec.detail));
    }
    text
}

fn join_and(items: &[&str]) -> String {
    match items {
        [] => String::new(),
        [only] => only.to_string(),
        [first, second] => format!("{} and {}", first, second),
        [rest @ .., last] => format!("{}, and {}", rest.join(", "), last),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::AnalysisSnapshot;
    use crate::classifier::classify;
    use crate::models::{Category, UserProfile};
    use crate::rules::{Priority, RuleOutput};
    use std::collections::BTreeMap;

    fn snapshot() -> AnalysisSnapshot {
        let mut breakdown = BTreeMap::new();
        breakdown.insert(Category::Food, 500.0);
        breakdown.insert(Category::Transport, 300.0);
        AnalysisSnapshot {
            total_spent: 800.0,
            transaction_count: 2,
            category_breakdown: breakdown,
            currency: "$".to_string(),
            ..Default::default()
        }
    }

    fn answer(question: &str, snap: &AnalysisSnapshot, profile: &UserProfile) -> String {
        let rules = crate::rules::apply_rules(snap, profile, None);
        let ctx = AdviceContext::new(snap, &rules, profile);
        generate(question, &ctx, &classify(question), 3)
    }

    #[test]
    fn test_spending_question_uses_savings_template() {
        let text = answer(
            "How can I reduce my spending?",
            &snapshot(),
            &UserProfile::default(),
        );
        assert!(text.contains("$800.00"));
        assert!(text.contains("Food at $500.00"));
        assert!(text.contains("savings plan"));
        assert!(text.contains("not provided"));
    }

    #[test]
    fn test_comparative_lists_both_concepts() {
        let text = answer(
            "What is the difference between mutual fund and FD?",
            &snapshot(),
            &UserProfile::default(),
        );
        assert!(text.contains("Mutual Fund"));
        assert!(text.contains("Fixed Deposit (FD)"));
        assert!(text.contains("Liquidity"));
        // No personal figures in a general comparison
        assert!(!text.contains("$800.00"));
    }

    #[test]
    fn test_educational_concept() {
        let text = answer("What is a SIP?", &snapshot(), &UserProfile::default());
        assert!(text.contains("systematic investment plan"));
    }

    #[test]
    fn test_planning_with_income_and_goals() {
        let profile = UserProfile {
            income: Some(120_000.0),
            savings: Some(6_000.0),
            goals: vec!["Wedding".to_string()],
            ..Default::default()
        };
        let mut snap = snapshot();
        snap.averages.monthly = 4_000.0;
        let text = answer("Help me plan for my wedding", &snap, &profile);
        assert!(text.contains("Your goals: Wedding."));
        // surplus 10000 - 4000
        assert!(text.contains("$6,000.00"));
        assert!(text.contains("1.5 months"));
    }

    #[test]
    fn test_general_with_empty_data() {
        let snap = AnalysisSnapshot::default();
        let text = answer("hello", &snap, &UserProfile::default());
        assert!(text.starts_with("I can still help based on your data."));
        assert!(text.contains("Set up budgets"));
    }

    #[test]
    fn test_fallback_totality() {
        let questions = [
            "",
            "   ",
            "?",
            "What is the difference between gold and crypto and bonds?",
            "Calculate how much I spent",
            "Should I invest in stocks?",
            "How do I pay off my credit card debt?",
            "Tell me about insurance",
            "Compare",
        ];
        let profiles = [
            UserProfile::default(),
            UserProfile {
                income: Some(10_000.0),
                savings: Some(0.0),
                goals: vec!["Trip".to_string()],
                ..Default::default()
            },
        ];
        for profile in &profiles {
            for snap in [AnalysisSnapshot::default(), snapshot()] {
                for q in questions {
                    let text = answer(q, &snap, profile);
                    assert!(!text.trim().is_empty(), "empty fallback for {:?}", q);
                    assert!(!text.contains("NaN"), "NaN in fallback for {:?}", q);
                    assert!(!text.contains("$inf"), "inf in fallback for {:?}", q);
                }
            }
        }
    }

    #[test]
    fn test_recommendations_listed() {
        let snap = snapshot();
        let profile = UserProfile::default();
        let rules = RuleOutput {
            recommendations: vec![Recommendation::new(
                Priority::High,
                "Cut takeout",
                "Cook twice more per week.",
            )],
            ..Default::default()
        };
        let ctx = AdviceContext::new(&snap, &rules, &profile);
        let text = generate("hi", &ctx, &classify("hi"), 3);
        assert!(text.contains("- Cut takeout: Cook twice more per week."));
    }

    #[test]
    fn test_summary_lists_configured_category_count() {
        let snap = snapshot();
        let profile = UserProfile::default();
        let rules = RuleOutput::default();
        let ctx = AdviceContext::new(&snap, &rules, &profile);

        let text = generate("hi", &ctx, &classify("hi"), 3);
        assert!(text.contains("- Top categories: Food ($500.00), Transport ($300.00)"));

        let text = generate("hi", &ctx, &classify("hi"), 1);
        assert!(text.contains("- Top categories: Food ($500.00)"));
        assert!(!text.contains("Transport"));

        let text = generate("hi", &ctx, &classify("hi"), 0);
        assert!(!text.contains("Top categories"));
    }

    #[test]
    fn test_join_and() {
        assert_eq!(join_and(&["A"]), "A");
        assert_eq!(join_and(&["A", "B"]), "A and B");
        assert_eq!(join_and(&["A", "B", "C"]), "A, B, and C");
    }
}
