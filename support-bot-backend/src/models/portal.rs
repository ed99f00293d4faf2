use serde::{Deserialize, Serialize};

/// A branded support site of an account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Portal {
    pub id: i64,
    pub account_id: i64,
    pub name: String,
    pub main_portal: bool,
    pub product_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub account_id: i64,
    pub name: String,
}

/// Portal identity embedded in new/show responses
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductInfo {
    pub name: String,
    pub portal_id: i64,
    pub portal_logo: Option<String>,
}

/// One row of the bot listing: a portal (or product) and its bot, if any
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductSummary {
    pub name: String,
    pub portal_enabled: bool,
    pub portal_id: Option<i64>,
    pub portal_logo: Option<String>,
    pub bot_name: Option<String>,
    pub bot_id: Option<i64>,
}
