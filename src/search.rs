//! Web search tool: Google Programmable Search with a DuckDuckGo
//! instant-answer fallback, normalized into one result shape.

use serde::Serialize;
use serde_json::Value;

use crate::core::config::Config;
use crate::core::errors::RagError;

#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

/// Web search for the research agent. Google Programmable Search is used
/// when credentials are configured and returned something; otherwise the
/// DuckDuckGo instant-answer API answers.
pub async fn web_search(config: &Config, query: &str) -> Result<Vec<SearchResult>, RagError> {
    let api_key = config.search_api_key.as_deref().unwrap_or("");
    let engine_id = config.search_engine_id.as_deref().unwrap_or("");

    if !api_key.is_empty() && !engine_id.is_empty() {
        if let Ok(mut results) = google_search(query, api_key, engine_id).await {
            if !results.is_empty() {
                results.truncate(config.max_search_results);
                return Ok(results);
            }
        }
    }

    let mut results = duckduckgo_search(query).await?;
    results.truncate(config.max_search_results);
    Ok(results)
}

/// Renders results as a numbered list for use inside a prompt.
pub fn format_results(results: &[SearchResult]) -> String {
    results
        .iter()
        .enumerate()
        .map(|(i, r)| format!("{}. {} ({})\n{}", i + 1, r.title, r.url, r.snippet))
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn field<'a>(value: &'a Value, key: &str) -> &'a str {
    value.get(key).and_then(|v| v.as_str()).unwrap_or("")
}

/// DuckDuckGo `Text` fields read "Title - description".
fn title_of(text: &str) -> String {
    text.split(" - ").next().unwrap_or(text).to_string()
}

async fn google_search(
    query: &str,
    api_key: &str,
    engine_id: &str,
) -> Result<Vec<SearchResult>, RagError> {
    let url = format!(
        "https://www.googleapis.com/customsearch/v1?key={}&cx={}&q={}",
        api_key,
        engine_id,
        urlencoding::encode(query)
    );

    let response = reqwest::Client::new()
        .get(url)
        .send()
        .await
        .map_err(RagError::tool)?;
    if !response.status().is_success() {
        return Err(RagError::Tool(format!(
            "Google search failed: {}",
            response.status()
        )));
    }
    let payload: Value = response.json().await.map_err(RagError::tool)?;

    let results = payload
        .get("items")
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|item| {
                    let title = field(item, "title");
                    let link = field(item, "link");
                    if title.is_empty() || link.is_empty() {
                        return None;
                    }
                    Some(SearchResult {
                        title: title.to_string(),
                        url: link.to_string(),
                        snippet: field(item, "snippet").to_string(),
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(results)
}

async fn duckduckgo_search(query: &str) -> Result<Vec<SearchResult>, RagError> {
    let url = format!(
        "https://api.duckduckgo.com/?q={}&format=json&no_redirect=1&no_html=1",
        urlencoding::encode(query)
    );

    let response = reqwest::Client::new()
        .get(url)
        .send()
        .await
        .map_err(RagError::tool)?;
    if !response.status().is_success() {
        return Err(RagError::Tool(format!(
            "DuckDuckGo search failed: {}",
            response.status()
        )));
    }
    let payload: Value = response.json().await.map_err(RagError::tool)?;

    let mut results = Vec::new();

    // The instant-answer abstract, when present, is the best hit.
    let abstract_text = field(&payload, "AbstractText");
    let abstract_url = field(&payload, "AbstractURL");
    if !abstract_text.is_empty() && !abstract_url.is_empty() {
        results.push(SearchResult {
            title: title_of(abstract_text),
            url: abstract_url.to_string(),
            snippet: abstract_text.to_string(),
        });
    }

    for key in ["Results", "RelatedTopics"] {
        if let Some(items) = payload.get(key).and_then(|v| v.as_array()) {
            extract_ddg_topics(items, &mut results);
        }
    }

    Ok(results)
}

fn extract_ddg_topics(items: &[Value], results: &mut Vec<SearchResult>) {
    for item in items {
        // Topic groups nest one level deeper.
        if let Some(topics) = item.get("Topics").and_then(|v| v.as_array()) {
            extract_ddg_topics(topics, results);
            continue;
        }

        let text = field(item, "Text");
        let url = field(item, "FirstURL");
        if text.is_empty() || url.is_empty() {
            continue;
        }
        results.push(SearchResult {
            title: title_of(text),
            url: url.to_string(),
            snippet: text.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn ddg_topics_are_extracted_recursively() {
        let items = vec![
            json!({ "Text": "Rust - a systems language", "FirstURL": "https://rust-lang.org" }),
            json!({
                "Topics": [
                    { "Text": "Cargo - the package manager", "FirstURL": "https://doc.rust-lang.org/cargo" }
                ]
            }),
            json!({ "Text": "", "FirstURL": "https://ignored.example" }),
        ];

        let mut results = Vec::new();
        extract_ddg_topics(&items, &mut results);

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].title, "Rust");
        assert_eq!(results[0].url, "https://rust-lang.org");
        assert_eq!(results[1].title, "Cargo");
        assert_eq!(results[1].snippet, "Cargo - the package manager");
    }

    #[test]
    fn formatted_results_are_numbered() {
        let results = vec![
            SearchResult {
                title: "First".to_string(),
                url: "https://a.example".to_string(),
                snippet: "alpha".to_string(),
            },
            SearchResult {
                title: "Second".to_string(),
                url: "https://b.example".to_string(),
                snippet: "beta".to_string(),
            },
        ];

        let formatted = format_results(&results);
        assert!(formatted.starts_with("1. First (https://a.example)\nalpha"));
        assert!(formatted.contains("\n\n2. Second (https://b.example)\nbeta"));
    }

    #[test]
    fn empty_results_format_to_empty_string() {
        assert_eq!(format_results(&[]), "");
    }
}
