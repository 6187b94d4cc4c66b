use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::env;

use crate::models::{Citation, DiscoveredOffer};

// --- Provider trait ---

pub struct SearchResponse {
    /// Generated text, expected (not guaranteed) to embed an offers JSON object.
    pub text: String,
    /// Web sources the service consulted, independent of the text payload.
    pub citations: Vec<Citation>,
}

pub trait SearchProvider {
    fn search(&self, prompt: &str) -> Result<SearchResponse>;
    #[allow(dead_code)]
    fn model_name(&self) -> &str;
}

pub fn resolve_model(name: &str) -> Result<String> {
    match name {
        "flash" => Ok("gemini-3-flash-preview".to_string()),
        "pro" => Ok("gemini-3-pro-preview".to_string()),
        other if other.starts_with("gemini-") => Ok(other.to_string()),
        _ => Err(anyhow!(
            "Unknown model '{}'. Available: flash (default), pro, or a full gemini-* model id",
            name
        )),
    }
}

// --- Gemini provider ---

const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<RequestContent>,
    tools: Vec<Tool>,
}

#[derive(Debug, Serialize)]
struct RequestContent {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
struct Tool {
    google_search: GoogleSearch,
}

#[derive(Debug, Serialize)]
struct GoogleSearch {}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroundingMetadata {
    #[serde(default)]
    grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Debug, Deserialize)]
struct GroundingChunk {
    web: Option<WebSource>,
}

#[derive(Debug, Deserialize)]
struct WebSource {
    title: Option<String>,
    uri: Option<String>,
}

#[derive(Debug)]
pub struct GeminiProvider {
    api_key: String,
    model_id: String,
    client: reqwest::blocking::Client,
}

impl GeminiProvider {
    pub fn new(model_id: String) -> Result<Self> {
        let api_key = env::var("GEMINI_API_KEY").context(
            "GEMINI_API_KEY environment variable not set. Set it with: export GEMINI_API_KEY=your-key-here",
        )?;
        let client = reqwest::blocking::Client::new();
        Ok(Self { api_key, model_id, client })
    }
}

impl SearchProvider for GeminiProvider {
    fn search(&self, prompt: &str) -> Result<SearchResponse> {
        let request = GenerateRequest {
            contents: vec![RequestContent {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
            tools: vec![Tool {
                google_search: GoogleSearch {},
            }],
        };

        let url = format!("{}/{}:generateContent", GEMINI_API_URL, self.model_id);
        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .context("Failed to send request to Gemini API")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().unwrap_or_default();
            return Err(anyhow!(
                "Gemini API request failed with status {}: {}",
                status,
                error_text
            ));
        }

        let api_response: GenerateResponse = response
            .json()
            .context("Failed to parse Gemini API response")?;

        let candidate = api_response
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("No candidates in Gemini API response"))?;

        let text = candidate
            .content
            .map(|c| {
                c.parts
                    .into_iter()
                    .map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        let citations = candidate
            .grounding_metadata
            .map(|m| citations_from_chunks(m.grounding_chunks))
            .unwrap_or_default();

        Ok(SearchResponse { text, citations })
    }

    fn model_name(&self) -> &str {
        &self.model_id
    }
}

/// A chunk without a web sub-object, or with neither title nor uri, is
/// dropped. A missing title falls back to the uri so the link stays usable.
fn citations_from_chunks(chunks: Vec<GroundingChunk>) -> Vec<Citation> {
    chunks
        .into_iter()
        .filter_map(|chunk| {
            let web = chunk.web?;
            let title = web.title.unwrap_or_default();
            let uri = web.uri.unwrap_or_default();
            if title.is_empty() && uri.is_empty() {
                return None;
            }
            let title = if title.is_empty() { uri.clone() } else { title };
            Some(Citation { title, uri })
        })
        .collect()
}

// --- Discovery ---

/// Outcome of one discovery call. Always a value, never an error: a failed
/// call or an unparsable reply degrades to empty lists, with the cause kept
/// only as a diagnostic.
pub struct Discovery {
    pub offers: Vec<DiscoveredOffer>,
    pub links: Vec<Citation>,
    pub diagnostic: Option<String>,
}

impl Discovery {
    fn empty(diagnostic: String) -> Self {
        Self {
            offers: Vec::new(),
            links: Vec::new(),
            diagnostic: Some(diagnostic),
        }
    }
}

/// One discovery call against the Gemini provider. A missing or rejected API
/// key is a configuration error and degrades the same way a transport failure
/// does: empty result, diagnostic only.
pub fn discover_with_gemini(model_id: &str, query: &str, today: NaiveDate) -> Discovery {
    match GeminiProvider::new(model_id.to_string()) {
        Ok(provider) => discover_offers(&provider, query, today),
        Err(e) => Discovery::empty(format!("{:#}", e)),
    }
}

pub fn discover_offers(provider: &dyn SearchProvider, query: &str, today: NaiveDate) -> Discovery {
    let prompt = build_prompt(query, today);

    let response = match provider.search(&prompt) {
        Ok(response) => response,
        Err(e) => return Discovery::empty(format!("{:#}", e)),
    };

    match extract_offers(&response.text) {
        Some(offers) => Discovery {
            offers,
            links: response.citations,
            diagnostic: None,
        },
        None => Discovery {
            offers: Vec::new(),
            links: response.citations,
            diagnostic: Some("Response did not contain a parsable offers object".to_string()),
        },
    }
}

fn build_prompt(query: &str, today: NaiveDate) -> String {
    format!(
        "Search for ACTIVE, publicly available free offers, promo codes, or free trials for: {query}.\n\
         PRIORITIZE offers released or verified within the last 30 days.\n\
         Include official links and specify if it is a free trial, promo code, or student offer.\n\
         Only use public information.\n\
         Provide the result as a raw JSON object string with an \"offers\" array.\n\
         Use today's date ({today}) for the lastVerifiedDate of found offers.\n\
         Format: {{ \"offers\": [{{ \"toolName\": \"name\", \"category\": \"AI Tools\", \"type\": \"Free Trial\", \
         \"description\": \"desc\", \"promoCode\": \"optional\", \"sourceUrl\": \"url\", \
         \"expiryDate\": \"optional\", \"lastVerifiedDate\": \"{today}\" }}] }}"
    )
}

/// Best-effort extraction of the offers array from free text.
///
/// Takes the first `{` through the last `}` and parses that span as JSON.
/// This is a lossy fallback, not a parser: stray braces in surrounding prose
/// or multiple JSON-like blobs defeat it, in which case the call reports
/// nothing found.
fn extract_offers(text: &str) -> Option<Vec<DiscoveredOffer>> {
    let re = regex::Regex::new(r"\{[\s\S]*\}").ok()?;
    let blob = re.find(text)?.as_str();

    let value: serde_json::Value = serde_json::from_str(blob).ok()?;
    let entries = value.get("offers")?.as_array()?;

    Some(
        entries
            .iter()
            .filter_map(|entry| serde_json::from_value(entry.clone()).ok())
            .collect(),
    )
}
