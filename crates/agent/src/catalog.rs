//! The static tool catalog advertised to the completion service.
//!
//! Fixed at process start, never mutated. Every name here has a matching
//! dispatch arm in `executor::ToolKind` and vice versa; that bidirectional
//! completeness is pinned by tests in `executor`.

use std::sync::OnceLock;

use serde_json::{json, Map, Value};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PropertyType {
    String,
    Integer,
    Number,
    Boolean,
    Array,
}

impl PropertyType {
    fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Array => "array",
        }
    }
}

/// One named parameter in a tool's schema. Array parameters carry the
/// schema of their object items.
#[derive(Clone, Debug)]
pub struct Property {
    pub name: &'static str,
    pub kind: PropertyType,
    pub description: &'static str,
    pub items: Option<ObjectSchema>,
}

impl Property {
    fn typed(name: &'static str, kind: PropertyType, description: &'static str) -> Self {
        Self { name, kind, description, items: None }
    }

    fn string(name: &'static str, description: &'static str) -> Self {
        Self::typed(name, PropertyType::String, description)
    }

    fn integer(name: &'static str, description: &'static str) -> Self {
        Self::typed(name, PropertyType::Integer, description)
    }

    fn number(name: &'static str, description: &'static str) -> Self {
        Self::typed(name, PropertyType::Number, description)
    }

    fn boolean(name: &'static str, description: &'static str) -> Self {
        Self::typed(name, PropertyType::Boolean, description)
    }

    fn array_of(name: &'static str, description: &'static str, items: ObjectSchema) -> Self {
        Self { name, kind: PropertyType::Array, description, items: Some(items) }
    }

    fn to_json(&self) -> Value {
        let mut value = Map::new();
        value.insert("type".to_string(), json!(self.kind.as_str()));
        value.insert("description".to_string(), json!(self.description));
        if let Some(items) = &self.items {
            value.insert("items".to_string(), items.to_json());
        }
        Value::Object(value)
    }
}

/// An object schema: named properties plus the subset that is required.
#[derive(Clone, Debug)]
pub struct ObjectSchema {
    pub properties: Vec<Property>,
    pub required: &'static [&'static str],
}

impl ObjectSchema {
    fn new(properties: Vec<Property>, required: &'static [&'static str]) -> Self {
        Self { properties, required }
    }

    fn to_json(&self) -> Value {
        let mut properties = Map::new();
        for property in &self.properties {
            properties.insert(property.name.to_string(), property.to_json());
        }

        let mut value = Map::new();
        value.insert("type".to_string(), json!("object"));
        value.insert("properties".to_string(), Value::Object(properties));
        if !self.required.is_empty() {
            value.insert("required".to_string(), json!(self.required));
        }
        Value::Object(value)
    }
}

#[derive(Clone, Debug)]
pub struct ToolDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub parameters: ObjectSchema,
}

impl ToolDescriptor {
    /// The `function_declarations` entry shape the LLM service expects.
    pub fn declaration(&self) -> Value {
        json!({
            "name": self.name,
            "description": self.description,
            "parameters": self.parameters.to_json(),
        })
    }
}

/// The `tools` payload sent with every completion request.
pub fn tools_payload(tools: &[ToolDescriptor]) -> Value {
    let declarations: Vec<Value> = tools.iter().map(ToolDescriptor::declaration).collect();
    json!([{ "function_declarations": declarations }])
}

pub fn all_tools() -> &'static [ToolDescriptor] {
    static CATALOG: OnceLock<Vec<ToolDescriptor>> = OnceLock::new();
    CATALOG.get_or_init(build_catalog)
}

fn build_catalog() -> Vec<ToolDescriptor> {
    let mut tools = scenario_tools();
    tools.extend(panel_tools());
    tools.extend(rule_tools());
    tools
}

fn scenario_tools() -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor {
            name: "list_scenarios",
            description: "Retrieves a list of pricing scenarios. Use this when user asks about existing scenarios, wants to see all scenarios, or filter scenarios by criteria. The response contains 'items' (array of scenarios), 'page_size' (items per page), and 'total' (total count across all pages). Always check if total > items.length to inform users about more results.",
            parameters: ObjectSchema::new(
                vec![
                    Property::boolean("active", "Filter by active status. True for active scenarios, false for inactive."),
                    Property::boolean("approved", "Filter by approval status. True for approved scenarios."),
                    Property::string("scenario_type", "Filter by scenario type (e.g., 'promotional', 'baseline')."),
                    Property::integer("page", "Page number for pagination (default: 1)."),
                    Property::integer("size", "Number of items per page (default: 50)."),
                ],
                &[],
            ),
        },
        ToolDescriptor {
            name: "get_scenario",
            description: "Retrieves detailed information about a specific scenario by its ID. Use this when user asks about a particular scenario or wants details of a specific scenario.",
            parameters: ObjectSchema::new(
                vec![Property::integer(
                    "scenario_id",
                    "The unique identifier of the scenario to retrieve.",
                )],
                &["scenario_id"],
            ),
        },
        ToolDescriptor {
            name: "create_scenario",
            description: "Creates a new pricing scenario. Use this when user wants to create a new scenario. The 'name' field is mandatory. Ask user for confirmation before creating.",
            parameters: ObjectSchema::new(
                vec![
                    Property::string("name", "The name of the scenario (required)."),
                    Property::string("description", "Detailed description of the scenario's purpose."),
                    Property::boolean("active", "Whether the scenario is active (default: true)."),
                    Property::boolean("base_scenario", "Flag indicating if this is a baseline scenario."),
                    Property::string("start_date", "Start date in ISO 8601 format (e.g., '2024-09-01T00:00:00Z')."),
                    Property::string("end_date", "End date in ISO 8601 format (e.g., '2024-11-30T23:59:59Z')."),
                    Property::boolean("target_margin", "Whether this scenario targets specific margin goals."),
                    Property::string("scenario_type", "Type of scenario (e.g., 'promotional', 'baseline')."),
                    Property::boolean("approved", "Approval status of the scenario."),
                    Property::integer("cluster_group_id", "Reference to cluster group ID if applicable."),
                ],
                &["name"],
            ),
        },
    ]
}

fn panel_tools() -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor {
            name: "list_panels",
            description: "Retrieves a list of pricing panels for a specific scenario with filtering options. Use this when user asks about panels in a scenario. IMPORTANT: Only scenario is required. Filters help narrow results but are optional. The API requires at least one product filter (major_department is highest priority, then department, category, sub_category, sub_sub_category OR product_group) and at least one location filter (zone_group is highest priority, then zone OR market_group). If user doesn't specify filters, ask them to provide at least major_department and zone_group to get results. Available major_departments: Enterprise, FRESH, GAS STATION, GROCERY, HARDLINES, HEALTH AND BEAUTY, HOUSEHOLD ESSENTIALS, SOFTLINES. Available zone_groups: Enterprise, Alcohol, C-store, Produce, Standard, Tobacco.",
            parameters: ObjectSchema::new(
                vec![
                    Property::string("scenario", "Scenario name to filter panels (required)."),
                    Property::string("panel_name", "Filter by panel name (partial match)."),
                    Property::boolean("valid", "Filter by validation status."),
                    Property::string("major_department", "Major department name (HIGHEST PRIORITY in product hierarchy). Options: Enterprise, FRESH, GAS STATION, GROCERY, HARDLINES, HEALTH AND BEAUTY, HOUSEHOLD ESSENTIALS, SOFTLINES."),
                    Property::string("department", "Department name for product hierarchy filter (lower priority than major_department)."),
                    Property::string("category", "Category name for product hierarchy filter (lower priority than department)."),
                    Property::string("sub_category", "Sub-category name for product hierarchy filter (lower priority than category)."),
                    Property::string("sub_sub_category", "Sub-sub-category name for product hierarchy filter (lower priority than sub_category)."),
                    Property::string("product_group", "Product group name filter (alternative to hierarchy filters)."),
                    Property::string("product_source", "Product group source type (required if using product_group)."),
                    Property::string("zone_group", "Zone group name (HIGHEST PRIORITY in location hierarchy). Options: Enterprise, Alcohol, C-store, Produce, Standard, Tobacco."),
                    Property::string("zone", "Zone name for location hierarchy filter (lower priority than zone_group)."),
                    Property::integer("location_hierarchy_id", "Location hierarchy ID (1 for default)."),
                    Property::string("market_group", "Market/location group name (alternative to hierarchy filters)."),
                    Property::string("market_source", "Market group source type (required if using market_group)."),
                    Property::string("price_type", "Price type name filter."),
                    Property::string("rule_type", "Rule type name filter."),
                    Property::string("rule_sub_type", "Rule sub-type name filter."),
                    Property::integer("page", "Page number for pagination (default: 1)."),
                    Property::integer("size", "Number of items per page (default: 10)."),
                    Property::string("sort", "Sorting format: 'field:direction' (e.g., 'Priority:asc')."),
                ],
                &["scenario"],
            ),
        },
        ToolDescriptor {
            name: "get_panel",
            description: "Retrieves detailed information about a specific panel by its ID. Use this when user asks about a particular panel. Don't ask user for panel ID - first list panels to find it.",
            parameters: ObjectSchema::new(
                vec![Property::integer(
                    "panel_id",
                    "The unique identifier of the panel to retrieve.",
                )],
                &["panel_id"],
            ),
        },
        ToolDescriptor {
            name: "create_panel",
            description: "Creates a new pricing panel. IMPORTANT: Before creating, MUST verify the scenario exists using get_scenario. If scenario doesn't exist, ask user to create it first. Requires user confirmation before creation. At least one product filter (product_node OR product_group) and one location filter (location_node OR location_group) are required.",
            parameters: ObjectSchema::new(
                vec![
                    Property::integer("scenario_id", "Scenario ID this panel belongs to (required). MUST validate this scenario exists first."),
                    Property::string("panel_name", "Name of the panel (required)."),
                    Property::integer("priority", "Priority order - lower value = higher priority (required)."),
                    Property::string("product_node", "Product hierarchy node name (department, category, etc.). Use this OR product_group."),
                    Property::string("product_group", "Product group name. Use this OR product_node. Requires product_source if used."),
                    Property::string("product_source", "Product group source type (required if using product_group)."),
                    Property::string("location_node", "Location hierarchy node name (zone, zone group, etc.). Use this OR location_group."),
                    Property::string("location_group", "Location/market group name. Use this OR location_node. Requires market_source if used."),
                    Property::string("market_source", "Market group source type (required if using location_group)."),
                    Property::string("comment", "Description or notes about the panel."),
                    Property::boolean("hard_rule_flag", "Whether panel contains hard rules (default: false)."),
                ],
                &["scenario_id", "panel_name", "priority"],
            ),
        },
        ToolDescriptor {
            name: "update_panel",
            description: "Updates an existing panel's name, priority, or comment. IMPORTANT: Only panel_name, priority, and comment can be modified. Product/location dimensions cannot be changed. Requires user confirmation before updating.",
            parameters: ObjectSchema::new(
                vec![
                    Property::integer("panel_id", "The unique identifier of the panel to update (required)."),
                    Property::integer("scenario_id", "Scenario ID for verification (required)."),
                    Property::string("product_node", "Product hierarchy node for verification (if panel uses it)."),
                    Property::string("product_group_name", "Product group name for verification (if panel uses it)."),
                    Property::string("product_source", "Product source for verification."),
                    Property::string("location_node", "Location hierarchy node for verification (if panel uses it)."),
                    Property::string("location_group_name", "Location group name for verification (if panel uses it)."),
                    Property::string("market_source", "Market source for verification."),
                    Property::string("panel_name", "Updated panel name (optional - only include if updating)."),
                    Property::integer("priority", "Updated priority value (optional - only include if updating)."),
                    Property::string("comment", "Updated comment/description (optional - only include if updating)."),
                ],
                &["panel_id", "scenario_id"],
            ),
        },
        ToolDescriptor {
            name: "delete_panel",
            description: "Soft deletes a pricing panel (panel is marked as deleted but preserved). IMPORTANT: This is always a soft delete. Requires user confirmation before deletion.",
            parameters: ObjectSchema::new(
                vec![Property::integer(
                    "panel_id",
                    "The unique identifier of the panel to delete (required).",
                )],
                &["panel_id"],
            ),
        },
        ToolDescriptor {
            name: "list_panel_rules",
            description: "Retrieves all pricing rules associated with a specific panel. Use this when user asks about rules within a panel.",
            parameters: ObjectSchema::new(
                vec![
                    Property::integer("panel_id", "The unique identifier of the panel (required)."),
                    Property::integer("page", "Page number for pagination (default: 1)."),
                    Property::integer("size", "Number of items per page (default: 10)."),
                    Property::string("order_by", "Field to sort by (default: 'HardRuleRank'). Options: HardRuleRank, RuleId, Active, PriceTypeId, RuleTypeId, Valid."),
                    Property::integer("sort_order", "Sort direction: 0 = ASC, 1 = DESC (default: 0)."),
                ],
                &["panel_id"],
            ),
        },
    ]
}

fn rule_tools() -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor {
            name: "create_cpi_rule",
            description: "Creates one or more CPI (Competitive Price Index) rules for a panel. IMPORTANT: Must validate panel exists before creating. CPI rules can be created on both hard and soft panels. Can create multiple CPI rules in a single request. Requires user confirmation.",
            parameters: ObjectSchema::new(
                vec![
                    Property::integer("panel_id", "Panel ID to attach rules to (required). Must validate this panel exists first."),
                    Property::array_of(
                        "rules",
                        "Array of CPI rule objects. Can create multiple rules in one request.",
                        ObjectSchema::new(
                            vec![
                                Property::string("competitor", "Competitor name (required). Must be valid in the system."),
                                Property::string("rule_desc", "Rule description (required, max 150 chars)."),
                                Property::integer("days_until_alert", "Days until price alert (required, >= 0)."),
                                Property::boolean("intel_rule", "Whether this is an intelligent rule (default: false)."),
                                Property::number("weight", "Rule weight (required for soft rule panels)."),
                                Property::integer("rank", "Priority rank (required for hard rule panels)."),
                                Property::number("target_cpi", "Target competitive price index."),
                                Property::number("min_cpi", "Minimum CPI boundary (must be <= target_cpi)."),
                                Property::number("max_cpi", "Maximum CPI boundary (must be >= target_cpi)."),
                                Property::number("min_add", "Minimum additive amount (must be <= max_add)."),
                                Property::number("max_add", "Maximum additive amount (must be >= min_add)."),
                                Property::string("price_type", "Type of price to match: 'regular', 'promotional', or 'blended'."),
                                Property::string("snap_price_point", "Price rounding direction: 'up' or 'down'."),
                                Property::integer("half_life_period", "Half-life decay period (required if intel_rule=true, >= 0)."),
                                Property::string("half_life_unit", "Half-life unit: 'day', 'days', 'week', or 'weeks' (required if intel_rule=true)."),
                                Property::integer("modal_index", "Modal pricing index (default: 0)."),
                            ],
                            &["competitor", "rule_desc", "days_until_alert"],
                        ),
                    ),
                ],
                &["panel_id", "rules"],
            ),
        },
        ToolDescriptor {
            name: "create_margin_rule",
            description: "Creates a margin-based pricing rule for a panel. IMPORTANT: Must validate panel exists AND is a hard rule panel (not soft). Only ONE margin rule per request. Requires user confirmation.",
            parameters: ObjectSchema::new(
                vec![
                    Property::integer("panel_id", "Panel ID to attach rule to (required). Must validate panel exists and is a hard rule panel."),
                    Property::array_of(
                        "rules",
                        "Array with exactly ONE margin rule object.",
                        ObjectSchema::new(
                            vec![
                                Property::string("rule_desc", "Rule description (required, max 150 chars)."),
                                Property::number("target_margin", "Target profit margin 0-1 (e.g., 0.30 = 30%)."),
                                Property::number("min_margin", "Minimum margin boundary 0-1 (must be <= target_margin)."),
                                Property::number("max_margin", "Maximum margin boundary 0-1 (must be >= target_margin)."),
                                Property::number("min_add", "Minimum additive price adjustment (must be <= max_add)."),
                                Property::number("max_add", "Maximum additive price adjustment (must be >= min_add)."),
                                Property::string("snap_price_point", "Price rounding direction: 'up' or 'down'."),
                            ],
                            &["rule_desc"],
                        ),
                    ),
                ],
                &["panel_id", "rules"],
            ),
        },
        ToolDescriptor {
            name: "create_step_rule",
            description: "Creates a step-based pricing rule for a panel. IMPORTANT: Must validate panel exists AND is a hard rule panel (not soft). Only ONE step rule per request. Requires user confirmation.",
            parameters: ObjectSchema::new(
                vec![
                    Property::integer("panel_id", "Panel ID to attach rule to (required). Must validate panel exists and is a hard rule panel."),
                    Property::array_of(
                        "rules",
                        "Array with exactly ONE step rule object.",
                        ObjectSchema::new(
                            vec![
                                Property::string("rule_desc", "Rule description (required, max 150 chars)."),
                                Property::number("max_factor", "Maximum multiplicative factor (0-999999.999999)."),
                                Property::number("min_factor", "Minimum multiplicative factor (0-999999.999999, must be <= max_factor)."),
                                Property::number("add_min", "Minimum additive amount (0-999999.999999, must be <= add_max)."),
                                Property::number("add_max", "Maximum additive amount (0-999999.999999, must be >= add_min)."),
                            ],
                            &["rule_desc"],
                        ),
                    ),
                ],
                &["panel_id", "rules"],
            ),
        },
        ToolDescriptor {
            name: "create_price_rule",
            description: "Creates an absolute or variable-based price rule for a panel. IMPORTANT: Must validate panel exists AND is a hard rule panel (not soft). Only ONE price rule per request. Supports price variables like [EDLP], [MAP], [MaxProfit], etc. Requires user confirmation.",
            parameters: ObjectSchema::new(
                vec![
                    Property::integer("panel_id", "Panel ID to attach rule to (required). Must validate panel exists and is a hard rule panel."),
                    Property::array_of(
                        "rules",
                        "Array with exactly ONE price rule object.",
                        ObjectSchema::new(
                            vec![
                                Property::string("rule_desc", "Rule description (required, max 150 chars)."),
                                Property::string("target", "Target price - can be numeric (e.g., '19.99') or variable (e.g., '[EDLP]', '[MAP]', '[MaxProfit]')."),
                                Property::string("min_amount", "Minimum price boundary - can be numeric or variable (must be <= target if both numeric)."),
                                Property::string("max_amount", "Maximum price boundary - can be numeric or variable (must be >= target if both numeric)."),
                                Property::string("snap_price_point", "Price rounding direction: 'up' or 'down'."),
                            ],
                            &["rule_desc"],
                        ),
                    ),
                ],
                &["panel_id", "rules"],
            ),
        },
        ToolDescriptor {
            name: "create_cost_change_rule",
            description: "Creates a cost change-based pricing rule for a panel. IMPORTANT: Must validate panel exists AND is a hard rule panel (not soft). Only ONE cost change rule per request. Automatically adjusts prices when future costs change. Requires user confirmation.",
            parameters: ObjectSchema::new(
                vec![
                    Property::integer("panel_id", "Panel ID to attach rule to (required). Must validate panel exists and is a hard rule panel."),
                    Property::array_of(
                        "rules",
                        "Array with exactly ONE cost change rule object.",
                        ObjectSchema::new(
                            vec![
                                Property::string("rule_desc", "Rule description (required, max 150 chars)."),
                                Property::integer("future_window_days", "Days into future to check cost changes (required, 0-10000)."),
                                Property::number("cost_change_up", "Cost increase % threshold (0-100, e.g., 10 = 10%)."),
                                Property::number("cost_change_down", "Cost decrease % threshold (0-100, e.g., 5 = 5%)."),
                                Property::integer("margin_change_up", "Margin change for cost increases in basis points (0-10000, 100 bp = 1%)."),
                                Property::integer("margin_change_down", "Margin change for cost decreases in basis points (0-10000)."),
                            ],
                            &["rule_desc", "future_window_days"],
                        ),
                    ),
                ],
                &["panel_id", "rules"],
            ),
        },
        ToolDescriptor {
            name: "delete_rule",
            description: "Soft deletes a pricing rule (sets Active = 0 but preserves data). IMPORTANT: This is always a soft delete. Requires user confirmation and rule_type parameter for validation.",
            parameters: ObjectSchema::new(
                vec![
                    Property::integer("rule_id", "The unique identifier of the rule to delete (required)."),
                    Property::string("rule_type", "Type of rule being deleted: 'cpi', 'margin', 'step', 'price', or 'cost-change' (required for validation)."),
                ],
                &["rule_id", "rule_type"],
            ),
        },
    ]
}
