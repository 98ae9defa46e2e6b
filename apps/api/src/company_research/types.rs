//! Request and report types for company research.

use serde::{Deserialize, Serialize};

/// Body of `POST /api/company-research`. Only `company` is required; every
/// other field is an optional hint forwarded to the model.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompanyResearchRequest {
    #[serde(default)]
    pub company: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role_function: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_mode: Option<String>,
    /// `YYYY-MM-DD`; the server's date when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub today: Option<String>,
    #[serde(default)]
    pub role_details: RoleDetails,
    #[serde(default)]
    pub company_hints: CompanyHints,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoleDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jd_text: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompanyHints {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub products: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub competitors: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execs: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub urls: Option<HintUrls>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HintUrls {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub careers: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blog: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub press: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docs: Option<String>,
}

/// Machine-readable half of a research report. Every section is required;
/// numeric estimates the model cannot support are `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyResearchJson {
    pub company: String,
    pub stage: String,
    pub summary: Summary,
    pub leadership: Leadership,
    pub snapshot: Snapshot,
    pub financials: Financials,
    pub traction: Traction,
    pub ai: AiPosture,
    pub security_compliance: SecurityCompliance,
    pub capital_structure: CapitalStructure,
    pub comp_equity: CompEquity,
    pub distribution: Distribution,
    pub team_culture: TeamCulture,
    pub risks: Vec<Risk>,
    pub role_fit: RoleFit,
    pub evidence_table: Vec<Evidence>,
    pub confidence: Confidence,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub what: String,
    pub momentum: String,
    pub ai: String,
    pub leadership: String,
    pub verdict: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Leadership {
    pub founder_market_fit: String,
    pub track_record: String,
    pub org_stability: String,
    pub board_governance: String,
    pub ai_ownership: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub products: Vec<String>,
    pub icp: Vec<String>,
    pub pricing_model: String,
    pub geo: String,
    pub headcount_trend: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Financials {
    pub profitability: String,
    pub cash_runway_months: Option<f64>,
    pub burn_trend: String,
    pub customer_concentration: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Traction {
    pub nrr: Option<f64>,
    pub grr: Option<f64>,
    pub acv_bands: Vec<String>,
    pub logos: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiPosture {
    pub in_product: String,
    pub internal_use: String,
    pub stack: String,
    pub evals: String,
    pub safety_privacy: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityCompliance {
    pub certs: Vec<String>,
    pub dpa: String,
    pub residency: String,
    pub retention: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapitalStructure {
    pub investors: Vec<String>,
    pub board: String,
    pub prefs: String,
    pub option_pool_remaining_pct: Option<f64>,
    pub secondaries: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompEquity {
    pub salary_signals: String,
    pub equity_scenarios: EquityScenarios,
    pub assumptions: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityScenarios {
    pub bear: Option<f64>,
    pub base: Option<f64>,
    pub bull: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Distribution {
    pub channels: Vec<String>,
    pub partnerships: Vec<String>,
    pub moat: String,
    pub sales_motion: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamCulture {
    pub manager_signal: String,
    pub attrition_signal: String,
    pub rto_policy: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Risk {
    pub risk: String,
    pub likelihood: String,
    pub impact: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleFit {
    pub impact_12mo: String,
    pub initiatives: Vec<String>,
    pub red_flags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    pub dimension: String,
    pub evidence: String,
    pub date: String,
    pub source: String,
}

/// Self-reported confidence per area, each in `0.0..=1.0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Confidence {
    pub leadership: f64,
    pub financials: f64,
    pub ai: f64,
    pub overall: f64,
}

impl Confidence {
    /// Name of the first score outside `0.0..=1.0`, if any.
    pub fn out_of_range(&self) -> Option<&'static str> {
        [
            ("leadership", self.leadership),
            ("financials", self.financials),
            ("ai", self.ai),
            ("overall", self.overall),
        ]
        .into_iter()
        .find(|(_, score)| !(0.0..=1.0).contains(score))
        .map(|(name, _)| name)
    }
}

/// Response body: the prose report and its validated JSON.
#[derive(Debug, Clone, Serialize)]
pub struct CompanyResearchResponse {
    pub markdown: String,
    pub json: CompanyResearchJson,
}
