use chrono::NaiveDate;

use crate::models::{Category, DiscoveredOffer, Offer, OfferStatus, OfferType};

/// Working set of offers for one process run. Nothing is persisted: the
/// catalog starts from the seed list and dies with the process.
pub struct OfferStore {
    offers: Vec<Offer>,
    next_seq: u64,
}

/// Parameters of one catalog view.
#[derive(Debug, Clone)]
pub struct OfferFilter {
    /// Case-insensitive substring matched against tool name or description.
    pub text: String,
    /// `None` means all categories.
    pub category: Option<Category>,
    /// Only show offers verified within this many days. `None` disables it.
    pub recency_days: Option<i64>,
    /// Admin view: include Pending/Expired/Rejected offers.
    pub include_unapproved: bool,
}

impl Default for OfferFilter {
    fn default() -> Self {
        Self {
            text: String::new(),
            category: None,
            recency_days: Some(30),
            include_unapproved: false,
        }
    }
}

impl OfferStore {
    pub fn new() -> Self {
        Self {
            offers: Vec::new(),
            next_seq: 1,
        }
    }

    pub fn seeded(today: NaiveDate) -> Self {
        let mut store = Self::new();
        for offer in seed_offers(today) {
            store.next_seq += 1;
            store.offers.push(offer);
        }
        store
    }

    /// Hands out the next id in the sequence. Ids are opaque strings, unique
    /// for the lifetime of the store, and never reused.
    pub fn allocate_id(&mut self) -> String {
        let id = self.next_seq.to_string();
        self.next_seq += 1;
        id
    }

    pub fn add(&mut self, offer: Offer) {
        // Duplicates by tool name are allowed; the id is the only identity.
        self.offers.push(offer);
    }

    pub fn get(&self, id: &str) -> Option<&Offer> {
        self.offers.iter().find(|o| o.id == id)
    }

    pub fn all(&self) -> &[Offer] {
        &self.offers
    }

    pub fn len(&self) -> usize {
        self.offers.len()
    }

    /// Sets the status of the offer with the given id. Unknown ids are a
    /// silent no-op. Moving an offer to Approved also counts as a fresh
    /// verification, so the last-verified date is re-stamped.
    pub fn update_status(&mut self, id: &str, status: OfferStatus, today: NaiveDate) -> bool {
        match self.offers.iter_mut().find(|o| o.id == id) {
            Some(offer) => {
                offer.status = status;
                if status == OfferStatus::Approved {
                    offer.last_verified_date = today;
                }
                true
            }
            None => false,
        }
    }

    pub fn query(&self, filter: &OfferFilter, today: NaiveDate) -> Vec<&Offer> {
        filter_offers(&self.offers, filter, today)
    }

    /// Merges a discovery batch: every entry gets its missing fields
    /// defaulted, a fresh id, and Approved status. Returns how many offers
    /// were added. No deduplication against existing records.
    pub fn absorb_discovery(&mut self, found: Vec<DiscoveredOffer>, today: NaiveDate) -> usize {
        let count = found.len();
        for entry in found {
            let id = format!("ai-{}", self.allocate_id());
            let offer = entry.into_offer(id, today);
            self.offers.push(offer);
        }
        count
    }
}

/// Applies the filter and sorts most-recently-verified first. The sort is
/// stable: offers verified on the same day keep their insertion order.
pub fn filter_offers<'a>(
    offers: &'a [Offer],
    filter: &OfferFilter,
    today: NaiveDate,
) -> Vec<&'a Offer> {
    let needle = filter.text.to_lowercase();
    let mut matched: Vec<&Offer> = offers
        .iter()
        .filter(|offer| {
            let matches_text = needle.is_empty()
                || offer.tool_name.to_lowercase().contains(&needle)
                || offer.description.to_lowercase().contains(&needle);
            let matches_category = filter.category.is_none_or(|c| offer.category == c);
            let visible = filter.include_unapproved || offer.status == OfferStatus::Approved;
            let recent = filter
                .recency_days
                .is_none_or(|days| (today - offer.last_verified_date).num_days() <= days);
            matches_text && matches_category && visible && recent
        })
        .collect();

    matched.sort_by(|a, b| b.last_verified_date.cmp(&a.last_verified_date));
    matched
}

fn seed_offers(today: NaiveDate) -> Vec<Offer> {
    let days_ago = |n: i64| today - chrono::Duration::days(n);

    vec![
        Offer {
            id: "1".to_string(),
            tool_name: "Lovable".to_string(),
            category: Category::AiTools,
            offer_type: OfferType::FreeMonths,
            description: "Get 2 months free of the Pro subscription with code LOVABLE2FREE. \
                          Verified working for new projects."
                .to_string(),
            promo_code: Some("LOVABLE2FREE".to_string()),
            expiry_date: None,
            source_url: "https://lovable.dev".to_string(),
            last_verified_date: days_ago(1),
            status: OfferStatus::Approved,
            is_trending: true,
        },
        Offer {
            id: "2".to_string(),
            tool_name: "Supabase".to_string(),
            category: Category::DeveloperTools,
            offer_type: OfferType::LifetimeFree,
            description: "Generous free tier including database, auth, and storage. Updated \
                          limits for 2024."
                .to_string(),
            promo_code: None,
            expiry_date: None,
            source_url: "https://supabase.com/pricing".to_string(),
            last_verified_date: days_ago(12),
            status: OfferStatus::Approved,
            is_trending: false,
        },
        Offer {
            id: "3".to_string(),
            tool_name: "GitHub Copilot".to_string(),
            category: Category::AiTools,
            offer_type: OfferType::StudentOffer,
            description: "Free for verified students through the GitHub Student Developer Pack. \
                          Recently updated verification process."
                .to_string(),
            promo_code: None,
            expiry_date: None,
            source_url: "https://education.github.com/pack".to_string(),
            last_verified_date: days_ago(3),
            status: OfferStatus::Approved,
            is_trending: true,
        },
        Offer {
            id: "4".to_string(),
            tool_name: "Notion".to_string(),
            category: Category::Productivity,
            offer_type: OfferType::StudentOffer,
            description: "Personal Pro plan is free for students and educators. Valid for the \
                          2024/2025 academic year."
                .to_string(),
            promo_code: None,
            expiry_date: None,
            source_url: "https://www.notion.so/students".to_string(),
            last_verified_date: days_ago(45),
            status: OfferStatus::Approved,
            is_trending: false,
        },
        Offer {
            id: "5".to_string(),
            tool_name: "Cursor AI".to_string(),
            category: Category::AiTools,
            offer_type: OfferType::FreeTrial,
            description: "14-day Pro trial with code CURSOR_FRESH. Available for new users this \
                          month."
                .to_string(),
            promo_code: Some("CURSOR_FRESH".to_string()),
            expiry_date: None,
            source_url: "https://cursor.sh".to_string(),
            last_verified_date: days_ago(0),
            status: OfferStatus::Approved,
            is_trending: true,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn offer(id: &str, name: &str, category: Category, status: OfferStatus, verified: &str) -> Offer {
        Offer {
            id: id.to_string(),
            tool_name: name.to_string(),
            category,
            offer_type: OfferType::FreeTrial,
            description: format!("{} offer", name),
            promo_code: None,
            expiry_date: None,
            source_url: "https://example.com".to_string(),
            last_verified_date: day(verified),
            status,
            is_trending: false,
        }
    }

    #[test]
    fn test_recency_window_splits_catalog() {
        // Lovable verified yesterday, Supabase 40 days ago.
        let today = day("2026-08-06");
        let offers = vec![
            offer("1", "Lovable", Category::AiTools, OfferStatus::Approved, "2026-08-05"),
            offer("2", "Supabase", Category::DeveloperTools, OfferStatus::Approved, "2026-06-27"),
        ];

        let filter = OfferFilter::default();
        let view = filter_offers(&offers, &filter, today);
        assert_eq!(view.len(), 1);
        assert_eq!(view[0].id, "1");

        let filter = OfferFilter {
            recency_days: None,
            ..OfferFilter::default()
        };
        assert_eq!(filter_offers(&offers, &filter, today).len(), 2);
    }

    #[test]
    fn test_recency_window_boundary() {
        let today = day("2026-08-06");
        let offers = vec![
            offer("1", "Exactly", Category::AiTools, OfferStatus::Approved, "2026-07-07"),
            offer("2", "JustOver", Category::AiTools, OfferStatus::Approved, "2026-07-06"),
        ];

        // 30 days before 2026-08-06 is 2026-07-07: exactly 30 days is in,
        // 31 days is out.
        let view = filter_offers(&offers, &OfferFilter::default(), today);
        assert_eq!(view.len(), 1);
        assert_eq!(view[0].id, "1");
    }

    #[test]
    fn test_text_matches_name_or_description_case_insensitive() {
        let today = day("2026-08-06");
        let mut first = offer("1", "Lovable", Category::AiTools, OfferStatus::Approved, "2026-08-05");
        first.description = "Two months of Pro free.".to_string();
        let second = offer("2", "Cursor", Category::AiTools, OfferStatus::Approved, "2026-08-05");

        let filter = OfferFilter {
            text: "LOVABLE".to_string(),
            ..OfferFilter::default()
        };
        let binding = [first.clone(), second.clone()];
        let view = filter_offers(&binding, &filter, today);
        assert_eq!(view.len(), 1);
        assert_eq!(view[0].id, "1");

        // Description text matches too.
        let filter = OfferFilter {
            text: "pro free".to_string(),
            ..OfferFilter::default()
        };
        let binding = [first, second];
        let view = filter_offers(&binding, &filter, today);
        assert_eq!(view.len(), 1);
        assert_eq!(view[0].id, "1");
    }

    #[test]
    fn test_category_filter() {
        let today = day("2026-08-06");
        let offers = vec![
            offer("1", "Lovable", Category::AiTools, OfferStatus::Approved, "2026-08-05"),
            offer("2", "Supabase", Category::DeveloperTools, OfferStatus::Approved, "2026-08-05"),
        ];

        let filter = OfferFilter {
            category: Some(Category::DeveloperTools),
            ..OfferFilter::default()
        };
        let view = filter_offers(&offers, &filter, today);
        assert_eq!(view.len(), 1);
        assert_eq!(view[0].id, "2");
    }

    #[test]
    fn test_unapproved_hidden_unless_admin() {
        let today = day("2026-08-06");
        let offers = vec![
            offer("1", "Approved", Category::AiTools, OfferStatus::Approved, "2026-08-05"),
            offer("2", "Pending", Category::AiTools, OfferStatus::Pending, "2026-08-05"),
            offer("3", "Rejected", Category::AiTools, OfferStatus::Rejected, "2026-08-05"),
        ];

        let view = filter_offers(&offers, &OfferFilter::default(), today);
        assert!(view.iter().all(|o| o.status == OfferStatus::Approved));
        assert_eq!(view.len(), 1);

        let filter = OfferFilter {
            include_unapproved: true,
            ..OfferFilter::default()
        };
        assert_eq!(filter_offers(&offers, &filter, today).len(), 3);
    }

    #[test]
    fn test_sorted_descending_and_stable_on_ties() {
        let today = day("2026-08-06");
        let offers = vec![
            offer("a", "Older", Category::AiTools, OfferStatus::Approved, "2026-08-01"),
            offer("b", "TieFirst", Category::AiTools, OfferStatus::Approved, "2026-08-04"),
            offer("c", "TieSecond", Category::AiTools, OfferStatus::Approved, "2026-08-04"),
            offer("d", "Newest", Category::AiTools, OfferStatus::Approved, "2026-08-06"),
        ];

        let view = filter_offers(&offers, &OfferFilter::default(), today);
        let ids: Vec<&str> = view.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["d", "b", "c", "a"]);
    }

    #[test]
    fn test_update_status_approve_stamps_date() {
        let today = day("2026-08-06");
        let mut store = OfferStore::new();
        store.add(offer("1", "Tool", Category::AiTools, OfferStatus::Pending, "2026-07-01"));

        let touched = store.update_status("1", OfferStatus::Approved, today);
        assert!(touched);
        let updated = store.get("1").unwrap();
        assert_eq!(updated.status, OfferStatus::Approved);
        assert_eq!(updated.last_verified_date, today);
    }

    #[test]
    fn test_update_status_non_approve_keeps_date() {
        let today = day("2026-08-06");
        let mut store = OfferStore::new();
        store.add(offer("1", "Tool", Category::AiTools, OfferStatus::Pending, "2026-07-01"));

        store.update_status("1", OfferStatus::Rejected, today);
        let updated = store.get("1").unwrap();
        assert_eq!(updated.status, OfferStatus::Rejected);
        assert_eq!(updated.last_verified_date, day("2026-07-01"));
    }

    #[test]
    fn test_update_status_unknown_id_is_noop() {
        let today = day("2026-08-06");
        let mut store = OfferStore::new();
        store.add(offer("1", "Tool", Category::AiTools, OfferStatus::Pending, "2026-07-01"));

        let touched = store.update_status("999", OfferStatus::Approved, today);
        assert!(!touched);
        let unchanged = store.get("1").unwrap();
        assert_eq!(unchanged.status, OfferStatus::Pending);
        assert_eq!(unchanged.last_verified_date, day("2026-07-01"));
    }

    #[test]
    fn test_duplicates_are_allowed() {
        let today = day("2026-08-06");
        let mut store = OfferStore::new();
        store.add(offer("1", "Tool", Category::AiTools, OfferStatus::Approved, "2026-08-05"));
        store.add(offer("2", "Tool", Category::AiTools, OfferStatus::Approved, "2026-08-05"));

        assert_eq!(store.query(&OfferFilter::default(), today).len(), 2);
    }

    #[test]
    fn test_seeded_store_ids_and_counter() {
        let today = day("2026-08-06");
        let mut store = OfferStore::seeded(today);
        assert_eq!(store.len(), 5);
        assert!(store.get("1").is_some());
        assert!(store.get("5").is_some());
        // The counter continues past the seeds.
        assert_eq!(store.allocate_id(), "6");
        assert_eq!(store.allocate_id(), "7");
    }

    #[test]
    fn test_seeded_default_view_hides_stale_offers() {
        let today = day("2026-08-06");
        let store = OfferStore::seeded(today);
        // Notion was verified 45 days ago and falls outside the 30-day window.
        let view = store.query(&OfferFilter::default(), today);
        assert_eq!(view.len(), 4);
        assert!(view.iter().all(|o| o.tool_name != "Notion"));
        // Cursor AI was verified today and sorts first.
        assert_eq!(view[0].tool_name, "Cursor AI");
    }

    #[test]
    fn test_absorb_discovery_defaults_and_ids() {
        let today = day("2026-08-06");
        let mut store = OfferStore::seeded(today);

        let batch = vec![
            DiscoveredOffer {
                tool_name: Some("Foo".to_string()),
                source_url: Some("https://x".to_string()),
                ..Default::default()
            },
            DiscoveredOffer::default(),
        ];
        let added = store.absorb_discovery(batch, today);
        assert_eq!(added, 2);
        assert_eq!(store.len(), 7);

        let first = store.get("ai-6").unwrap();
        assert_eq!(first.tool_name, "Foo");
        assert_eq!(first.source_url, "https://x");
        assert_eq!(first.category, Category::SaasSoftware);
        assert_eq!(first.status, OfferStatus::Approved);
        assert!(store.get("ai-7").is_some());
    }
}
