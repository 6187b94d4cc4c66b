mod ai;
mod models;
mod store;
mod tui;

use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use ai::{discover_with_gemini, resolve_model};
use models::{Category, Offer, OfferStatus, OfferType};
use store::{OfferFilter, OfferStore};

#[derive(Parser)]
#[command(name = "scout")]
#[command(about = "Offer scouting - browse, filter, and discover promotional software deals")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Browse the catalog interactively
    Browse {
        /// Filter by category (ai, dev, saas, productivity, marketing)
        #[arg(short, long)]
        category: Option<String>,

        /// Show offers regardless of when they were last verified
        #[arg(long)]
        all_time: bool,

        /// Include pending/expired/rejected offers
        #[arg(short, long)]
        admin: bool,

        /// Model used for in-app discovery (flash, pro, or a gemini-* id)
        #[arg(short, long, default_value = "flash")]
        model: String,
    },

    /// List offers
    List {
        /// Free-text filter against tool name or description
        query: Option<String>,

        /// Filter by category (ai, dev, saas, productivity, marketing)
        #[arg(short, long)]
        category: Option<String>,

        /// Recency window in days; 0 disables the window
        #[arg(short, long, default_value = "30")]
        days: i64,

        /// Include pending/expired/rejected offers
        #[arg(short, long)]
        admin: bool,
    },

    /// Show offer details
    Show {
        /// Offer ID
        id: String,
    },

    /// Submit a new offer for review (starts Pending)
    Add {
        /// Tool name
        #[arg(long)]
        tool: String,

        /// Category (ai, dev, saas, productivity, marketing)
        #[arg(long)]
        category: String,

        /// Offer type (trial, months, promo, lifetime, student)
        #[arg(long = "type")]
        offer_type: String,

        /// Offer description
        #[arg(long)]
        description: String,

        /// Promo code, if the offer has one
        #[arg(long)]
        promo_code: Option<String>,

        /// Official source URL
        #[arg(long)]
        source_url: String,

        /// Expiry date (YYYY-MM-DD), advisory only
        #[arg(long)]
        expiry: Option<String>,
    },

    /// Approve an offer and stamp it as freshly verified
    Approve {
        /// Offer ID
        id: String,
    },

    /// Find offers with AI search and merge them into the catalog
    Discover {
        /// What to search for (tool name, category, anything)
        query: String,

        /// Model to use (flash, pro, or a gemini-* id)
        #[arg(short, long, default_value = "flash")]
        model: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let today = chrono::Local::now().date_naive();

    match cli.command {
        Commands::Browse {
            category,
            all_time,
            admin,
            model,
        } => {
            let model_id = resolve_model(&model)?;
            let filter = OfferFilter {
                text: String::new(),
                category: category.as_deref().map(parse_category).transpose()?,
                recency_days: if all_time { None } else { Some(30) },
                include_unapproved: admin,
            };
            let store = OfferStore::seeded(today);
            tui::run_browse(store, filter, model_id)?;
        }

        Commands::List {
            query,
            category,
            days,
            admin,
        } => {
            let filter = OfferFilter {
                text: query.unwrap_or_default(),
                category: category.as_deref().map(parse_category).transpose()?,
                recency_days: if days == 0 { None } else { Some(days) },
                include_unapproved: admin,
            };
            let store = OfferStore::seeded(today);
            print_offer_table(&store.query(&filter, today));
        }

        Commands::Show { id } => {
            let store = OfferStore::seeded(today);
            match store.get(&id) {
                Some(offer) => print_offer(offer),
                None => println!("Offer {} not found.", id),
            }
        }

        Commands::Add {
            tool,
            category,
            offer_type,
            description,
            promo_code,
            source_url,
            expiry,
        } => {
            let category = parse_category(&category)?;
            let offer_type = parse_offer_type(&offer_type)?;
            let expiry_date = expiry
                .map(|s| {
                    s.parse::<NaiveDate>()
                        .with_context(|| format!("Invalid expiry date '{}', expected YYYY-MM-DD", s))
                })
                .transpose()?;

            let mut store = OfferStore::seeded(today);
            let id = store.allocate_id();
            store.add(Offer {
                id: id.clone(),
                tool_name: tool.clone(),
                category,
                offer_type,
                description,
                promo_code,
                expiry_date,
                source_url,
                last_verified_date: today,
                status: OfferStatus::Pending,
                is_trending: false,
            });
            println!("Submitted '{}' for review (ID: {}, status: Pending)", tool, id);
        }

        Commands::Approve { id } => {
            let mut store = OfferStore::seeded(today);
            match store.get(&id).map(|o| o.tool_name.clone()) {
                Some(name) => {
                    store.update_status(&id, OfferStatus::Approved, today);
                    println!("Approved '{}' (verified {})", name, today);
                }
                None => println!("Offer {} not found.", id),
            }
        }

        Commands::Discover { query, model } => {
            let model_id = resolve_model(&model)?;
            let mut store = OfferStore::seeded(today);

            println!("Discovering offers for \"{}\"...", query);
            let discovery = discover_with_gemini(&model_id, &query, today);
            if let Some(cause) = &discovery.diagnostic {
                eprintln!("Warning: {}", cause);
            }
            let links = discovery.links;
            let added = store.absorb_discovery(discovery.offers, today);
            println!("Added {} offer(s).\n", added);

            print_offer_table(&store.query(&OfferFilter::default(), today));

            if !links.is_empty() {
                println!("\nSources:");
                for link in &links {
                    println!("  {} - {}", link.title, link.uri);
                }
            }
        }
    }

    Ok(())
}

fn parse_category(s: &str) -> Result<Category> {
    Category::parse(s).ok_or_else(|| {
        anyhow!(
            "Unknown category '{}'. Available: ai, dev, saas, productivity, marketing",
            s
        )
    })
}

fn parse_offer_type(s: &str) -> Result<OfferType> {
    OfferType::parse(s).ok_or_else(|| {
        anyhow!(
            "Unknown offer type '{}'. Available: trial, months, promo, lifetime, student",
            s
        )
    })
}

fn print_offer_table(offers: &[&Offer]) {
    if offers.is_empty() {
        println!("No offers found.");
        return;
    }

    println!(
        "{:<7} {:<9} {:<22} {:<16} {:<14} {:<12} {}",
        "ID", "STATUS", "TOOL", "CATEGORY", "TYPE", "VERIFIED", "CODE"
    );
    println!("{}", "-".repeat(92));
    for offer in offers {
        println!(
            "{:<7} {:<9} {:<22} {:<16} {:<14} {:<12} {}",
            offer.id,
            offer.status.label(),
            truncate(&offer.tool_name, 20),
            offer.category.label(),
            offer.offer_type.label(),
            offer.last_verified_date.to_string(),
            offer.promo_code.as_deref().unwrap_or("-")
        );
    }
}

fn print_offer(offer: &Offer) {
    println!("Offer {}", offer.id);
    println!("Tool: {}", offer.tool_name);
    println!("Category: {}", offer.category.label());
    println!("Type: {}", offer.offer_type.label());
    println!("Status: {}", offer.status.label());
    if let Some(code) = &offer.promo_code {
        println!("Code: {}", code);
    }
    if let Some(expiry) = offer.expiry_date {
        println!("Expires: {}", expiry);
    }
    println!("Verified: {}", offer.last_verified_date);
    println!("URL: {}", offer.source_url);
    if offer.is_trending {
        println!("Trending: yes");
    }
    println!("\n{}", offer.description);
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        s.to_string()
    } else {
        format!("{}...", &s[..max.saturating_sub(3)])
    }
}
