//! Tool dispatch against the pricing-rules REST API.
//!
//! Execution is split into a pure planning step (`ToolKind::plan` maps an
//! argument bag onto one HTTP request) and a thin sending step
//! (`PricingApiClient::send`). Every outcome, including unknown tool names
//! and transport failures, is normalized into a `ToolOutcome` envelope so
//! the completion loop can hand it back to the model as data. Nothing in
//! this module raises past its boundary.

use async_trait::async_trait;
use reqwest::{Client, Method};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{info, warn};

use analyst_core::config::PricingApiConfig;

/// Tenant routing header attached to every pricing-API request.
pub const TENANT_HEADER: &str = "X-Bungee-Tenant";

const BASE_PATH: &str = "/api/v1/pricing-rules";

/// Uniform result envelope for every tool execution. This is what flows
/// back into the transcript; the model must be able to reason about
/// failures in-band.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolOutcome {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ToolOutcome {
    pub fn ok(data: Value) -> Self {
        Self { success: true, data: Some(data), error: None }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self { success: false, data: None, error: Some(error.into()) }
    }
}

/// Executes one named tool call. The completion loop depends on this seam
/// so tests can substitute a scripted executor.
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    async fn execute(&self, tool_name: &str, args: &Value) -> ToolOutcome;
}

/// The finite dispatch table: one variant per catalog entry. Adding a tool
/// means adding a variant here and a descriptor in `catalog`; the
/// completeness tests below fail until both sides agree.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToolKind {
    ListScenarios,
    GetScenario,
    CreateScenario,
    ListPanels,
    GetPanel,
    CreatePanel,
    UpdatePanel,
    DeletePanel,
    ListPanelRules,
    CreateCpiRule,
    CreateMarginRule,
    CreateStepRule,
    CreatePriceRule,
    CreateCostChangeRule,
    DeleteRule,
}

/// One planned HTTP exchange: fixed verb and path per tool, args mapped to
/// query parameters for reads and a JSON body for writes.
#[derive(Clone, Debug, PartialEq)]
pub struct RequestPlan {
    pub method: Method,
    pub path: String,
    pub query: Vec<(&'static str, String)>,
    pub body: Option<Value>,
}

impl ToolKind {
    pub const ALL: [ToolKind; 15] = [
        Self::ListScenarios,
        Self::GetScenario,
        Self::CreateScenario,
        Self::ListPanels,
        Self::GetPanel,
        Self::CreatePanel,
        Self::UpdatePanel,
        Self::DeletePanel,
        Self::ListPanelRules,
        Self::CreateCpiRule,
        Self::CreateMarginRule,
        Self::CreateStepRule,
        Self::CreatePriceRule,
        Self::CreateCostChangeRule,
        Self::DeleteRule,
    ];

    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "list_scenarios" => Some(Self::ListScenarios),
            "get_scenario" => Some(Self::GetScenario),
            "create_scenario" => Some(Self::CreateScenario),
            "list_panels" => Some(Self::ListPanels),
            "get_panel" => Some(Self::GetPanel),
            "create_panel" => Some(Self::CreatePanel),
            "update_panel" => Some(Self::UpdatePanel),
            "delete_panel" => Some(Self::DeletePanel),
            "list_panel_rules" => Some(Self::ListPanelRules),
            "create_cpi_rule" => Some(Self::CreateCpiRule),
            "create_margin_rule" => Some(Self::CreateMarginRule),
            "create_step_rule" => Some(Self::CreateStepRule),
            "create_price_rule" => Some(Self::CreatePriceRule),
            "create_cost_change_rule" => Some(Self::CreateCostChangeRule),
            "delete_rule" => Some(Self::DeleteRule),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::ListScenarios => "list_scenarios",
            Self::GetScenario => "get_scenario",
            Self::CreateScenario => "create_scenario",
            Self::ListPanels => "list_panels",
            Self::GetPanel => "get_panel",
            Self::CreatePanel => "create_panel",
            Self::UpdatePanel => "update_panel",
            Self::DeletePanel => "delete_panel",
            Self::ListPanelRules => "list_panel_rules",
            Self::CreateCpiRule => "create_cpi_rule",
            Self::CreateMarginRule => "create_margin_rule",
            Self::CreateStepRule => "create_step_rule",
            Self::CreatePriceRule => "create_price_rule",
            Self::CreateCostChangeRule => "create_cost_change_rule",
            Self::DeleteRule => "delete_rule",
        }
    }

    /// Deterministically map an argument bag onto one HTTP request. Args
    /// are structurally unvalidated on purpose: schema adherence is the
    /// model's job and final rejection is the API's.
    pub fn plan(&self, args: &Value) -> RequestPlan {
        match self {
            Self::ListScenarios => RequestPlan {
                method: Method::GET,
                path: format!("{BASE_PATH}/scenario"),
                query: query_from(args, &["active", "approved", "scenario_type", "page", "size"]),
                body: None,
            },
            Self::GetScenario => RequestPlan {
                method: Method::GET,
                path: format!("{BASE_PATH}/scenario/{}", path_segment(args, "scenario_id")),
                query: Vec::new(),
                body: None,
            },
            Self::CreateScenario => RequestPlan {
                method: Method::POST,
                path: format!("{BASE_PATH}/scenario"),
                query: Vec::new(),
                body: Some(args.clone()),
            },
            Self::ListPanels => RequestPlan {
                method: Method::GET,
                path: format!("{BASE_PATH}/panel"),
                query: query_from(
                    args,
                    &[
                        "scenario",
                        "panel_name",
                        "valid",
                        "department",
                        "category",
                        "sub_category",
                        "sub_sub_category",
                        "major_department",
                        "product_group",
                        "product_source",
                        "zone",
                        "zone_group",
                        "location_hierarchy_id",
                        "market_group",
                        "market_source",
                        "price_type",
                        "rule_type",
                        "rule_sub_type",
                        "page",
                        "size",
                        "sort",
                    ],
                ),
                body: None,
            },
            Self::GetPanel => RequestPlan {
                method: Method::GET,
                path: format!("{BASE_PATH}/panel/{}", path_segment(args, "panel_id")),
                query: Vec::new(),
                body: None,
            },
            Self::CreatePanel => RequestPlan {
                method: Method::POST,
                path: format!("{BASE_PATH}/panel"),
                query: Vec::new(),
                body: Some(args.clone()),
            },
            Self::UpdatePanel => RequestPlan {
                method: Method::PATCH,
                path: format!("{BASE_PATH}/panel/{}", path_segment(args, "panel_id")),
                query: Vec::new(),
                // panel_id travels in the path, not the body.
                body: Some(body_without(args, "panel_id")),
            },
            // Soft delete only. There is deliberately no way to express the
            // hard-delete variant of the upstream endpoint here.
            Self::DeletePanel => RequestPlan {
                method: Method::DELETE,
                path: format!("{BASE_PATH}/panel/{}", path_segment(args, "panel_id")),
                query: Vec::new(),
                body: None,
            },
            Self::ListPanelRules => RequestPlan {
                method: Method::GET,
                path: format!("{BASE_PATH}/panel/{}/rules", path_segment(args, "panel_id")),
                query: query_from(args, &["page", "size", "order_by", "sort_order"]),
                body: None,
            },
            Self::CreateCpiRule => rule_creation_plan("cpi", args),
            Self::CreateMarginRule => rule_creation_plan("margin", args),
            Self::CreateStepRule => rule_creation_plan("step", args),
            Self::CreatePriceRule => rule_creation_plan("price", args),
            Self::CreateCostChangeRule => rule_creation_plan("cost-change", args),
            // Soft delete only; rule_type rides along for upstream validation.
            Self::DeleteRule => RequestPlan {
                method: Method::DELETE,
                path: format!("{BASE_PATH}/rule/{}", path_segment(args, "rule_id")),
                query: query_from(args, &["rule_type"]),
                body: None,
            },
        }
    }
}

fn rule_creation_plan(rule_path: &str, args: &Value) -> RequestPlan {
    RequestPlan {
        method: Method::POST,
        path: format!("{BASE_PATH}/rule/{rule_path}"),
        query: Vec::new(),
        body: Some(args.clone()),
    }
}

/// Collect the listed keys from the argument bag as query parameters.
/// Booleans are lowercased to `true`/`false`; numbers and strings are
/// rendered verbatim.
fn query_from(args: &Value, keys: &[&'static str]) -> Vec<(&'static str, String)> {
    let mut query = Vec::new();
    for key in keys {
        if let Some(value) = args.get(key) {
            if value.is_null() {
                continue;
            }
            query.push((*key, query_value(value)));
        }
    }
    query
}

fn query_value(value: &Value) -> String {
    match value {
        Value::Bool(flag) => flag.to_string(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Render an identifier argument for path interpolation. A missing or
/// non-scalar id yields an empty segment; the upstream API rejects the
/// malformed path and the rejection comes back as an envelope.
fn path_segment(args: &Value, key: &str) -> String {
    match args.get(key) {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Number(number)) => number.to_string(),
        _ => String::new(),
    }
}

fn body_without(args: &Value, key: &str) -> Value {
    match args.as_object() {
        Some(object) => {
            let filtered: Map<String, Value> =
                object.iter().filter(|(k, _)| k.as_str() != key).map(|(k, v)| (k.clone(), v.clone())).collect();
            Value::Object(filtered)
        }
        None => args.clone(),
    }
}

/// Live executor over the configured pricing-rules API.
pub struct PricingApiClient {
    http: Client,
    base_url: String,
    tenant: String,
}

impl PricingApiClient {
    pub fn new(config: &PricingApiConfig) -> Result<Self, reqwest::Error> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            tenant: config.tenant.clone(),
        })
    }

    async fn send(&self, plan: RequestPlan) -> ToolOutcome {
        let url = format!("{}{}", self.base_url, plan.path);
        let mut request =
            self.http.request(plan.method.clone(), &url).header(TENANT_HEADER, &self.tenant);

        if !plan.query.is_empty() {
            request = request.query(&plan.query);
        }
        if let Some(body) = &plan.body {
            request = request.json(body);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(error) => {
                warn!(url = %url, error = %error, "pricing API transport failure");
                return ToolOutcome::failure(error.to_string());
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(url = %url, status = status.as_u16(), "pricing API returned an error status");
            return ToolOutcome::failure(format!(
                "API returned status {}: {body}",
                status.as_u16()
            ));
        }

        match response.json::<Value>().await {
            Ok(data) => ToolOutcome::ok(data),
            Err(error) => ToolOutcome::failure(error.to_string()),
        }
    }
}

#[async_trait]
impl ToolExecutor for PricingApiClient {
    async fn execute(&self, tool_name: &str, args: &Value) -> ToolOutcome {
        let Some(kind) = ToolKind::parse(tool_name) else {
            return ToolOutcome::failure(format!("Unknown tool: {tool_name}"));
        };

        info!(tool = tool_name, "executing tool call");
        self.send(kind.plan(args)).await
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use reqwest::Method;
    use serde_json::{json, Value};

    use analyst_core::config::PricingApiConfig;

    use super::{PricingApiClient, RequestPlan, ToolExecutor, ToolKind, ToolOutcome};
    use crate::catalog;

    fn unreachable_client() -> PricingApiClient {
        // Never actually dialed in these tests.
        PricingApiClient::new(&PricingApiConfig {
            base_url: "http://localhost:1".to_string(),
            tenant: "test-tenant".to_string(),
            timeout_secs: 1,
        })
        .expect("client builds")
    }

    #[test]
    fn every_catalog_name_has_a_dispatch_arm() {
        for tool in catalog::all_tools() {
            assert!(
                ToolKind::parse(tool.name).is_some(),
                "catalog tool `{}` has no executor dispatch",
                tool.name
            );
        }
    }

    #[test]
    fn every_dispatch_arm_is_advertised_in_the_catalog() {
        let advertised: BTreeSet<&str> =
            catalog::all_tools().iter().map(|tool| tool.name).collect();
        for kind in ToolKind::ALL {
            assert!(
                advertised.contains(kind.name()),
                "executor arm `{}` is missing from the catalog",
                kind.name()
            );
        }
    }

    #[test]
    fn kind_names_round_trip_through_parse() {
        for kind in ToolKind::ALL {
            assert_eq!(ToolKind::parse(kind.name()), Some(kind));
        }
        assert_eq!(ToolKind::parse("drop_all_tables"), None);
    }

    #[test]
    fn list_scenarios_maps_filters_to_query_parameters() {
        let plan = ToolKind::ListScenarios
            .plan(&json!({"active": true, "scenario_type": "promotional", "page": 2}));

        assert_eq!(plan.method, Method::GET);
        assert_eq!(plan.path, "/api/v1/pricing-rules/scenario");
        assert!(plan.body.is_none());
        assert!(plan.query.contains(&("active", "true".to_string())));
        assert!(plan.query.contains(&("scenario_type", "promotional".to_string())));
        assert!(plan.query.contains(&("page", "2".to_string())));
        // Absent filters stay absent.
        assert!(!plan.query.iter().any(|(key, _)| *key == "approved"));
    }

    #[test]
    fn booleans_are_lowercased_in_queries() {
        let plan = ToolKind::ListPanels.plan(&json!({"scenario": "Summer Sale", "valid": false}));
        assert!(plan.query.contains(&("valid", "false".to_string())));
        assert!(plan.query.contains(&("scenario", "Summer Sale".to_string())));
    }

    #[test]
    fn get_scenario_interpolates_the_id_into_the_path() {
        let plan = ToolKind::GetScenario.plan(&json!({"scenario_id": 42}));
        assert_eq!(plan.method, Method::GET);
        assert_eq!(plan.path, "/api/v1/pricing-rules/scenario/42");
    }

    #[test]
    fn create_scenario_sends_all_args_as_body() {
        let args = json!({"name": "Q3 Baseline", "active": true});
        let plan = ToolKind::CreateScenario.plan(&args);
        assert_eq!(plan.method, Method::POST);
        assert_eq!(plan.body, Some(args));
        assert!(plan.query.is_empty());
    }

    #[test]
    fn update_panel_strips_the_id_from_the_body() {
        let plan = ToolKind::UpdatePanel.plan(&json!({
            "panel_id": 3760,
            "scenario_id": 7,
            "panel_name": "Renamed",
        }));

        assert_eq!(plan.method, Method::PATCH);
        assert_eq!(plan.path, "/api/v1/pricing-rules/panel/3760");
        let body = plan.body.expect("body present");
        assert!(body.get("panel_id").is_none());
        assert_eq!(body["scenario_id"], 7);
        assert_eq!(body["panel_name"], "Renamed");
    }

    #[test]
    fn delete_panel_always_plans_the_soft_delete_path() {
        // Planning is deterministic: repeated calls produce the identical
        // soft-delete request, and no argument can select a hard delete.
        let args = json!({"panel_id": 11, "hard_delete": true});
        let first = ToolKind::DeletePanel.plan(&args);
        let second = ToolKind::DeletePanel.plan(&args);

        assert_eq!(first, second);
        assert_eq!(first.method, Method::DELETE);
        assert_eq!(first.path, "/api/v1/pricing-rules/panel/11");
        assert!(first.body.is_none());
        assert!(
            !first.query.iter().any(|(key, _)| *key == "hard_delete"),
            "hard_delete must never reach the wire"
        );
    }

    #[test]
    fn delete_rule_carries_rule_type_as_query() {
        let plan = ToolKind::DeleteRule.plan(&json!({"rule_id": 9, "rule_type": "margin"}));
        assert_eq!(plan.method, Method::DELETE);
        assert_eq!(plan.path, "/api/v1/pricing-rules/rule/9");
        assert_eq!(plan.query, vec![("rule_type", "margin".to_string())]);
    }

    #[test]
    fn list_panel_rules_combines_path_id_and_paging_query() {
        let plan =
            ToolKind::ListPanelRules.plan(&json!({"panel_id": 5, "size": 25, "sort_order": 1}));
        assert_eq!(plan.path, "/api/v1/pricing-rules/panel/5/rules");
        assert!(plan.query.contains(&("size", "25".to_string())));
        assert!(plan.query.contains(&("sort_order", "1".to_string())));
    }

    #[test]
    fn rule_creation_tools_post_to_their_fixed_paths() {
        let cases = [
            (ToolKind::CreateCpiRule, "/api/v1/pricing-rules/rule/cpi"),
            (ToolKind::CreateMarginRule, "/api/v1/pricing-rules/rule/margin"),
            (ToolKind::CreateStepRule, "/api/v1/pricing-rules/rule/step"),
            (ToolKind::CreatePriceRule, "/api/v1/pricing-rules/rule/price"),
            (ToolKind::CreateCostChangeRule, "/api/v1/pricing-rules/rule/cost-change"),
        ];

        let args = json!({"panel_id": 3, "rules": [{"rule_desc": "test"}]});
        for (kind, expected_path) in cases {
            let plan = kind.plan(&args);
            assert_eq!(plan.method, Method::POST, "{}", kind.name());
            assert_eq!(plan.path, expected_path, "{}", kind.name());
            assert_eq!(plan.body.as_ref(), Some(&args), "{}", kind.name());
        }
    }

    #[test]
    fn missing_id_degrades_to_an_empty_segment() {
        let plan = ToolKind::GetPanel.plan(&json!({}));
        assert_eq!(plan.path, "/api/v1/pricing-rules/panel/");
    }

    #[tokio::test]
    async fn unknown_tool_returns_a_failure_envelope_without_dialing() {
        let client = unreachable_client();
        let outcome = client.execute("definitely_not_a_tool", &json!({})).await;

        assert_eq!(
            outcome,
            ToolOutcome::failure("Unknown tool: definitely_not_a_tool".to_string())
        );
    }

    #[test]
    fn envelopes_serialize_without_null_fields() {
        let ok = serde_json::to_value(ToolOutcome::ok(json!({"total": 3}))).expect("serialize");
        assert_eq!(ok, json!({"success": true, "data": {"total": 3}}));

        let failed: Value =
            serde_json::to_value(ToolOutcome::failure("API returned status 400: bad panel"))
                .expect("serialize");
        assert_eq!(
            failed,
            json!({"success": false, "error": "API returned status 400: bad panel"})
        );
    }

    #[test]
    fn plan_shape_is_stable_for_equality_checks() {
        let plan = RequestPlan {
            method: Method::GET,
            path: "/api/v1/pricing-rules/scenario".to_string(),
            query: vec![("active", "true".to_string())],
            body: None,
        };
        assert_eq!(plan, ToolKind::ListScenarios.plan(&json!({"active": true})));
    }
}
