//! Mock search providers for adapter testing

use serde_json::{json, Value};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// One wiremock server standing in for SearXNG, YouTube, GitHub and Qdrant
pub struct MockProviders {
    server: MockServer,
}

impl MockProviders {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    pub fn base_url(&self) -> String {
        self.server.uri()
    }

    pub fn server(&self) -> &MockServer {
        &self.server
    }

    // ------------------------------------------------------------------
    // SearXNG
    // ------------------------------------------------------------------

    pub async fn setup_searxng(&self, results: Value, expected_calls: u64) {
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("format", "json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "query": "test",
                "number_of_results": results.as_array().map(|r| r.len()).unwrap_or(0),
                "results": results,
                "suggestions": []
            })))
            .expect(expected_calls)
            .mount(&self.server)
            .await;
    }

    pub async fn setup_searxng_error(&self, status: u16) {
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(status).set_body_string("upstream engines failed"))
            .mount(&self.server)
            .await;
    }

    // ------------------------------------------------------------------
    // YouTube Data API
    // ------------------------------------------------------------------

    pub async fn setup_youtube_search(&self, video_ids: &[&str], expected_calls: u64) {
        let items: Vec<Value> = video_ids
            .iter()
            .map(|id| json!({"kind": "youtube#searchResult", "id": {"kind": "youtube#video", "videoId": id}}))
            .collect();
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("type", "video"))
            .and(query_param("order", "relevance"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "items": items })))
            .expect(expected_calls)
            .mount(&self.server)
            .await;
    }

    pub async fn setup_youtube_videos(&self, items: Value, expected_calls: u64) {
        Mock::given(method("GET"))
            .and(path("/videos"))
            .and(query_param("part", "snippet,contentDetails,statistics"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "items": items })))
            .expect(expected_calls)
            .mount(&self.server)
            .await;
    }

    // ------------------------------------------------------------------
    // GitHub REST
    // ------------------------------------------------------------------

    pub async fn setup_github_rate_limit(&self, remaining: u64, reset: i64, expected_calls: u64) {
        Mock::given(method("GET"))
            .and(path("/rate_limit"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "resources": {
                    "core": {"limit": 5000, "remaining": 4999, "reset": reset},
                    "search": {"limit": 30, "remaining": remaining, "reset": reset}
                }
            })))
            .expect(expected_calls)
            .mount(&self.server)
            .await;
    }

    pub async fn setup_github_repositories(&self, items: Value, expected_calls: u64) {
        Mock::given(method("GET"))
            .and(path("/search/repositories"))
            .and(query_param("sort", "stars"))
            .and(query_param("order", "desc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "total_count": items.as_array().map(|r| r.len()).unwrap_or(0),
                "items": items
            })))
            .expect(expected_calls)
            .mount(&self.server)
            .await;
    }

    pub async fn setup_github_code(&self, items: Value, expected_calls: u64) {
        Mock::given(method("GET"))
            .and(path("/search/code"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "total_count": items.as_array().map(|r| r.len()).unwrap_or(0),
                "items": items
            })))
            .expect(expected_calls)
            .mount(&self.server)
            .await;
    }

    // ------------------------------------------------------------------
    // Qdrant REST
    // ------------------------------------------------------------------

    pub async fn setup_qdrant_search(&self, collection: &str, points: Value, expected_calls: u64) {
        Mock::given(method("POST"))
            .and(path(format!("/collections/{}/points/search", collection)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "result": points,
                "status": "ok",
                "time": 0.001
            })))
            .expect(expected_calls)
            .mount(&self.server)
            .await;
    }
}

/// SearXNG result entry
pub fn searxng_result(url: &str, title: &str, content: &str) -> Value {
    json!({"url": url, "title": title, "content": content, "engine": "duckduckgo", "score": 1.0})
}

/// `videos.list` entry with every field present
pub fn youtube_video(id: &str, title: &str, channel: &str, duration: &str) -> Value {
    json!({
        "id": id,
        "snippet": {
            "title": title,
            "channelTitle": channel,
            "description": format!("About {}", title),
            "publishedAt": "2024-03-01T12:00:00Z"
        },
        "contentDetails": {"duration": duration},
        "statistics": {"viewCount": "1234"}
    })
}

pub fn github_repository(full_name: &str, description: &str, stars: u64) -> Value {
    json!({
        "full_name": full_name,
        "description": description,
        "stargazers_count": stars,
        "html_url": format!("https://github.com/{}", full_name)
    })
}

pub fn github_code_item(full_name: &str, file_path: &str) -> Value {
    json!({
        "name": file_path.rsplit('/').next().unwrap_or(file_path),
        "path": file_path,
        "html_url": format!("https://github.com/{}/blob/main/{}", full_name, file_path),
        "repository": {"full_name": full_name}
    })
}

pub fn qdrant_point(id: &str, score: f32, payload: Value) -> Value {
    json!({"id": id, "version": 1, "score": score, "payload": payload})
}
