use crate::error::{CoreError, Result};
use crate::models::{
    Favorite, FavoriteId, NewFavorite, NewSavedSearch, Property, PropertyId, SavedSearch,
    SavedSearchId,
};
use crate::store::records::{
    FavoriteRecord, NewFavoriteRecord, NewSavedSearchRecord, PropertyRecord, SavedSearchRecord,
};
use crate::store::traits::{FavoriteRepository, PropertyRepository, SavedSearchRepository};
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

const PROPERTIES: &str = "properties";
const FAVORITES: &str = "favorites";
const SAVED_SEARCHES: &str = "saved_searches";

/// JSON record API client backing all three repositories
pub struct RemoteStore {
    client: Client,
    base_url: Url,
}

impl RemoteStore {
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("housing-browse/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: Client, base_url: Url) -> Self {
        // `Url::join` replaces the last segment unless the path ends with '/'.
        let mut base_url = base_url;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        info!("Using remote store at {}", base_url);
        Self { client, base_url }
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| CoreError::Transport(format!("bad endpoint '{}': {}", path, e)))
    }

    async fn get(&self, url: Url) -> Result<Response> {
        debug!("GET {}", url);
        let response = self.client.get(url).send().await?;
        ensure_success(response)
    }

    async fn delete_at(&self, url: Url) -> Result<bool> {
        debug!("DELETE {}", url);
        let response = self.client.delete(url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        ensure_success(response)?;
        Ok(true)
    }

    /// Any record that fails validation fails the whole fetch, as it does
    /// for the in-memory catalog
    async fn fetch_properties(&self, url: Url) -> Result<Vec<Property>> {
        let records: Vec<PropertyRecord> = self.get(url).await?.json().await?;
        let properties = records
            .into_iter()
            .map(|record| {
                let id = record.id.clone();
                Property::try_from(record).inspect_err(|e| {
                    warn!("Rejected property record {:?}: {}", id, e);
                })
            })
            .collect::<Result<Vec<_>>>()?;

        debug!("Fetched {} property records", properties.len());
        Ok(properties)
    }
}

fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        warn!("Remote store returned status: {}", status);
        Err(CoreError::Transport(format!(
            "{} returned {}",
            response.url(),
            status
        )))
    }
}

#[async_trait]
impl PropertyRepository for RemoteStore {
    async fn get_all(&self) -> Result<Vec<Property>> {
        let url = self.endpoint(PROPERTIES)?;
        self.fetch_properties(url).await
    }

    async fn get_by_id(&self, id: &PropertyId) -> Result<Option<Property>> {
        let url = self.endpoint(&format!("{}/{}", PROPERTIES, id))?;
        debug!("GET {}", url);
        let response = self.client.get(url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let record: PropertyRecord = ensure_success(response)?.json().await?;
        Property::try_from(record).map(Some)
    }

    async fn search(&self, query: &str) -> Result<Vec<Property>> {
        let mut url = self.endpoint(PROPERTIES)?;
        url.query_pairs_mut().append_pair("search", query);
        self.fetch_properties(url).await
    }

    fn source_name(&self) -> &'static str {
        "remote"
    }
}

#[async_trait]
impl FavoriteRepository for RemoteStore {
    async fn get_all(&self) -> Result<Vec<Favorite>> {
        let records: Vec<FavoriteRecord> =
            self.get(self.endpoint(FAVORITES)?).await?.json().await?;
        Ok(records.into_iter().map(Favorite::from).collect())
    }

    async fn create(&self, favorite: NewFavorite) -> Result<Favorite> {
        let url = self.endpoint(FAVORITES)?;
        debug!("POST {}", url);
        let response = self
            .client
            .post(url)
            .json(&NewFavoriteRecord::from(&favorite))
            .send()
            .await?;
        let record: FavoriteRecord = ensure_success(response)?.json().await?;
        Ok(record.into())
    }

    async fn delete(&self, id: &FavoriteId) -> Result<bool> {
        let url = self.endpoint(&format!("{}/{}", FAVORITES, id))?;
        self.delete_at(url).await
    }
}

#[async_trait]
impl SavedSearchRepository for RemoteStore {
    async fn get_all(&self) -> Result<Vec<SavedSearch>> {
        let records: Vec<SavedSearchRecord> =
            self.get(self.endpoint(SAVED_SEARCHES)?).await?.json().await?;
        records.into_iter().map(SavedSearch::try_from).collect()
    }

    async fn create(&self, search: NewSavedSearch) -> Result<SavedSearch> {
        let url = self.endpoint(SAVED_SEARCHES)?;
        debug!("POST {}", url);
        let body = NewSavedSearchRecord::try_from(&search)?;
        let response = self.client.post(url).json(&body).send().await?;
        let record: SavedSearchRecord = ensure_success(response)?.json().await?;
        SavedSearch::try_from(record)
    }

    async fn delete(&self, id: &SavedSearchId) -> Result<bool> {
        let url = self.endpoint(&format!("{}/{}", SAVED_SEARCHES, id))?;
        self.delete_at(url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// (method, path, status, body)
    type Route = (&'static str, &'static str, u16, &'static str);

    /// Minimal HTTP/1.1 responder; unrouted requests get a 404
    async fn serve(routes: Vec<Route>) -> RemoteStore {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    return;
                };
                let routes = routes.clone();
                tokio::spawn(async move {
                    let mut head = Vec::new();
                    let mut buf = [0u8; 1024];
                    while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                        match socket.read(&mut buf).await {
                            Ok(0) | Err(_) => return,
                            Ok(n) => head.extend_from_slice(&buf[..n]),
                        }
                    }

                    let head = String::from_utf8_lossy(&head);
                    let mut request_line = head.lines().next().unwrap_or("").split(' ');
                    let method = request_line.next().unwrap_or("");
                    let path = request_line.next().unwrap_or("");
                    let (status, body) = routes
                        .iter()
                        .find(|(m, p, _, _)| *m == method && *p == path)
                        .map(|(_, _, status, body)| (*status, *body))
                        .unwrap_or((404, "{}"));

                    let response = format!(
                        "HTTP/1.1 {} Stub\r\nContent-Type: application/json\r\n\
                         Content-Length: {}\r\nConnection: close\r\n\r\n{}",
                        status,
                        body.len(),
                        body
                    );
                    let _ = socket.write_all(response.as_bytes()).await;
                    let _ = socket.shutdown().await;
                });
            }
        });

        let client = Client::builder().no_proxy().build().unwrap();
        let base_url = Url::parse(&format!("http://{}/v1", addr)).unwrap();
        RemoteStore::with_client(client, base_url)
    }

    const LOFT: &str = r#"{"Id": 1, "title": "Sunny Downtown Loft", "price": 250000,
        "address": "12 Congress Ave", "city": "Austin", "state": "TX", "zip_code": "78701",
        "property_type": "Loft", "bedrooms": 1, "bathrooms": 1, "square_feet": 850}"#;

    #[test]
    fn test_endpoints_keep_base_path() {
        let store = RemoteStore::new(
            Url::parse("https://api.example.com/v1").unwrap(),
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(
            store.endpoint("favorites/17").unwrap().as_str(),
            "https://api.example.com/v1/favorites/17"
        );
    }

    #[tokio::test]
    async fn test_delete_maps_not_found_to_false() {
        let store = serve(vec![("DELETE", "/v1/favorites/7", 200, "{}")]).await;
        assert!(FavoriteRepository::delete(&store, &FavoriteId::from(7)).await.unwrap());
        assert!(!FavoriteRepository::delete(&store, &FavoriteId::from(8)).await.unwrap());
        let missing = SavedSearchId::from(3);
        assert!(!SavedSearchRepository::delete(&store, &missing).await.unwrap());
    }

    #[tokio::test]
    async fn test_get_by_id_maps_not_found_to_none() {
        let store = serve(vec![("GET", "/v1/properties/1", 200, LOFT)]).await;
        let loft = store.get_by_id(&PropertyId::from(1)).await.unwrap().unwrap();
        assert_eq!(loft.title, "Sunny Downtown Loft");
        assert!(store.get_by_id(&PropertyId::from(2)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_server_errors_are_transport() {
        let store = serve(vec![
            ("GET", "/v1/properties", 500, r#"{"error": "boom"}"#),
            ("DELETE", "/v1/favorites/7", 503, "{}"),
            ("GET", "/v1/favorites", 200, "not json"),
        ])
        .await;

        assert!(matches!(
            PropertyRepository::get_all(&store).await,
            Err(CoreError::Transport(_))
        ));
        assert!(matches!(
            FavoriteRepository::delete(&store, &FavoriteId::from(7)).await,
            Err(CoreError::Transport(_))
        ));
        assert!(matches!(
            FavoriteRepository::get_all(&store).await,
            Err(CoreError::Transport(_))
        ));
    }

    #[tokio::test]
    async fn test_invalid_property_record_fails_fetch() {
        let catalog = r#"[
            {"Id": 1, "title": "Sunny Downtown Loft", "price": 250000, "property_type": "Loft"},
            {"Id": 2, "title": "Houseboat", "price": 90000, "property_type": "Boat"}
        ]"#;
        let store = serve(vec![("GET", "/v1/properties", 200, catalog)]).await;
        assert!(matches!(
            PropertyRepository::get_all(&store).await,
            Err(CoreError::Validation(_))
        ));
    }
}
