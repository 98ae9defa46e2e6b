// Prompt constants for company research.

use crate::company_research::types::CompanyResearchRequest;
use crate::llm_client::fill_template;

/// Instructions sent with every research request.
pub const COMPANY_RESEARCH_SYSTEM: &str = "You are a diligent equity and career analyst. \
    You assess companies for a job seeker using only well-known public information and the \
    hints provided. Say 'unknown' instead of guessing, and use null for numbers you cannot \
    support.";

/// Research prompt template. Replace `{today}` and `{request}` before sending.
pub const COMPANY_RESEARCH_PROMPT_TEMPLATE: &str = r#"Goal: Research the company below for a candidate considering a role there. Today is {today}.

Input (JSON):
{request}

Output, in this order:
1. A markdown report with sections for Summary, Leadership, Snapshot, Financials, Traction, AI, Security & Compliance, Capital Structure, Compensation & Equity, Distribution, Team & Culture, Risks, Role Fit and Evidence.
2. After the report, one JSON object (no prose after it) with exactly these keys:
company, stage,
summary {what, momentum, ai, leadership, verdict},
leadership {founder_market_fit, track_record, org_stability, board_governance, ai_ownership},
snapshot {products[], icp[], pricing_model, geo, headcount_trend},
financials {profitability, cash_runway_months|null, burn_trend, customer_concentration},
traction {nrr|null, grr|null, acv_bands[], logos[]},
ai {in_product, internal_use, stack, evals, safety_privacy},
security_compliance {certs[], dpa, residency, retention},
capital_structure {investors[], board, prefs, option_pool_remaining_pct|null, secondaries},
comp_equity {salary_signals, equity_scenarios {bear|null, base|null, bull|null}, assumptions},
distribution {channels[], partnerships[], moat, sales_motion},
team_culture {manager_signal, attrition_signal, rto_policy},
risks [{risk, likelihood, impact}],
role_fit {impact_12mo, initiatives[], red_flags[]},
evidence_table [{dimension, evidence, date, source}],
confidence {leadership, financials, ai, overall} as numbers between 0 and 1."#;

/// Builds the research prompt. `today` fills in for a request without a date.
pub fn build_company_research_prompt(request: &CompanyResearchRequest, today: &str) -> String {
    let today = request.today.as_deref().unwrap_or(today);
    // Infallible: the request holds only strings and string lists.
    let request_json = serde_json::to_string_pretty(request).unwrap_or_default();
    fill_template(
        COMPANY_RESEARCH_PROMPT_TEMPLATE,
        &[("{today}", today), ("{request}", request_json.as_str())],
    )
}
