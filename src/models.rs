use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "AI Tools")]
    AiTools,
    #[serde(rename = "Developer Tools")]
    DeveloperTools,
    #[serde(rename = "SaaS Software")]
    SaasSoftware,
    #[serde(rename = "Productivity")]
    Productivity,
    #[serde(rename = "Marketing")]
    Marketing,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::AiTools,
        Category::DeveloperTools,
        Category::SaasSoftware,
        Category::Productivity,
        Category::Marketing,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Category::AiTools => "AI Tools",
            Category::DeveloperTools => "Developer Tools",
            Category::SaasSoftware => "SaaS Software",
            Category::Productivity => "Productivity",
            Category::Marketing => "Marketing",
        }
    }

    /// Accepts the display name or a short alias, case-insensitively.
    pub fn parse(s: &str) -> Option<Category> {
        match s.trim().to_lowercase().as_str() {
            "ai tools" | "ai" => Some(Category::AiTools),
            "developer tools" | "dev" | "developer" => Some(Category::DeveloperTools),
            "saas software" | "saas" => Some(Category::SaasSoftware),
            "productivity" => Some(Category::Productivity),
            "marketing" => Some(Category::Marketing),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OfferType {
    #[serde(rename = "Free Trial")]
    FreeTrial,
    #[serde(rename = "Free Months")]
    FreeMonths,
    #[serde(rename = "Promo Code")]
    PromoCode,
    #[serde(rename = "Lifetime Free")]
    LifetimeFree,
    #[serde(rename = "Student Offer")]
    StudentOffer,
}

impl OfferType {
    pub fn label(&self) -> &'static str {
        match self {
            OfferType::FreeTrial => "Free Trial",
            OfferType::FreeMonths => "Free Months",
            OfferType::PromoCode => "Promo Code",
            OfferType::LifetimeFree => "Lifetime Free",
            OfferType::StudentOffer => "Student Offer",
        }
    }

    pub fn parse(s: &str) -> Option<OfferType> {
        match s.trim().to_lowercase().as_str() {
            "free trial" | "trial" => Some(OfferType::FreeTrial),
            "free months" | "months" => Some(OfferType::FreeMonths),
            "promo code" | "promo" | "code" => Some(OfferType::PromoCode),
            "lifetime free" | "lifetime" => Some(OfferType::LifetimeFree),
            "student offer" | "student" => Some(OfferType::StudentOffer),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OfferStatus {
    Approved,
    Pending,
    Expired,
    Rejected,
}

impl OfferStatus {
    pub fn label(&self) -> &'static str {
        match self {
            OfferStatus::Approved => "Approved",
            OfferStatus::Pending => "Pending",
            OfferStatus::Expired => "Expired",
            OfferStatus::Rejected => "Rejected",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Offer {
    pub id: String,
    pub tool_name: String,
    pub category: Category,
    #[serde(rename = "type")]
    pub offer_type: OfferType,
    pub description: String,
    pub promo_code: Option<String>,
    pub expiry_date: Option<NaiveDate>, // advisory only, never enforced
    pub source_url: String,
    pub last_verified_date: NaiveDate,
    pub status: OfferStatus,
    #[serde(default)]
    pub is_trending: bool,
}

/// A supporting source cited by the search service for its generated claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    pub title: String,
    pub uri: String,
}

pub const DEFAULT_DESCRIPTION: &str = "No description available.";
pub const DEFAULT_SOURCE_URL: &str = "#";

/// One entry of the `offers` array parsed out of a discovery response.
///
/// Everything is optional and the enumerated fields stay raw strings: the
/// upstream emits whatever it likes, and an unknown category or type should
/// degrade to a default rather than sink the whole batch.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DiscoveredOffer {
    pub tool_name: Option<String>,
    pub category: Option<String>,
    #[serde(rename = "type")]
    pub offer_type: Option<String>,
    pub description: Option<String>,
    pub promo_code: Option<String>,
    pub source_url: Option<String>,
    pub expiry_date: Option<String>,
    pub last_verified_date: Option<String>,
}

impl DiscoveredOffer {
    /// Fills in every missing field and promotes the entry to a full record.
    pub fn into_offer(self, id: String, today: NaiveDate) -> Offer {
        Offer {
            id,
            tool_name: self.tool_name.unwrap_or_else(|| "Unknown Tool".to_string()),
            category: self
                .category
                .as_deref()
                .and_then(Category::parse)
                .unwrap_or(Category::SaasSoftware),
            offer_type: self
                .offer_type
                .as_deref()
                .and_then(OfferType::parse)
                .unwrap_or(OfferType::FreeTrial),
            description: self
                .description
                .filter(|d| !d.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string()),
            promo_code: self.promo_code.filter(|c| !c.trim().is_empty()),
            expiry_date: self.expiry_date.and_then(|d| d.parse().ok()),
            source_url: self
                .source_url
                .filter(|u| !u.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_SOURCE_URL.to_string()),
            last_verified_date: self
                .last_verified_date
                .and_then(|d| d.parse().ok())
                .unwrap_or(today),
            status: OfferStatus::Approved,
            is_trending: false,
        }
    }
}
