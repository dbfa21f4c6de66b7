//! GraphQL character source using type-safe cynic queries over reqwest.
//!
//! Requests race their [`CancelToken`]: once the token fires, the in-flight
//! HTTP future is dropped and [`RickdashError::Cancelled`] is returned.

use std::time::Duration;

use reqwest::Client;
use reqwest::header;
use tracing::debug;

use crate::cancel::CancelToken;
use crate::config::Config;
use crate::error::{GraphQlError, Result, RickdashError};
use crate::types::{Character, CharacterDetail, CharacterStatus, EpisodeRef, LocationRef};

use super::{CharacterFilter, Page, PageInfo, PageRequest, PageSource};

mod graphql {
    // Re-export cynic types we need
    pub use cynic::{GraphQlResponse, QueryBuilder};

    // The import MUST be named `schema` for cynic derives to work.
    use rickdash_schema::rickandmorty as schema;

    use serde::Deserialize;

    /// Error extensions attached to GraphQL errors
    #[derive(Debug, Clone, Deserialize, PartialEq)]
    pub struct ErrorExtensions {
        pub code: Option<String>,
    }

    // Query Variables

    /// Variables for fetching a page of characters
    #[derive(cynic::QueryVariables, Debug)]
    pub struct CharactersQueryVariables {
        pub page: Option<i32>,
        pub filter: Option<FilterCharacter>,
    }

    /// Variables for fetching a single character by ID
    #[derive(cynic::QueryVariables, Debug)]
    pub struct CharacterQueryVariables {
        pub id: cynic::Id,
    }

    // Filter Input Objects

    /// Character filter for server-side filtering
    #[derive(cynic::InputObject, Debug, Clone, Default)]
    pub struct FilterCharacter {
        pub name: Option<String>,
        pub status: Option<String>,
        pub gender: Option<String>,
    }

    // Query Fragments - Characters Query

    /// Query to fetch a page of characters
    #[derive(cynic::QueryFragment, Debug)]
    #[cynic(graphql_type = "Query", variables = "CharactersQueryVariables")]
    pub struct CharactersQuery {
        #[arguments(page: $page, filter: $filter)]
        pub characters: Option<Characters>,
    }

    #[derive(cynic::QueryFragment, Debug)]
    pub struct Characters {
        pub info: Option<Info>,
        pub results: Option<Vec<Option<Character>>>,
    }

    /// Pagination info
    #[derive(cynic::QueryFragment, Debug)]
    pub struct Info {
        pub count: Option<i32>,
        pub pages: Option<i32>,
        pub next: Option<i32>,
        pub prev: Option<i32>,
    }

    #[derive(cynic::QueryFragment, Debug)]
    pub struct Character {
        pub id: Option<cynic::Id>,
        pub name: Option<String>,
        pub status: Option<String>,
        pub species: Option<String>,
        pub gender: Option<String>,
        pub origin: Option<LocationSummary>,
        pub location: Option<LocationSummary>,
        pub image: Option<String>,
    }

    #[derive(cynic::QueryFragment, Debug)]
    #[cynic(graphql_type = "Location")]
    pub struct LocationSummary {
        pub id: Option<cynic::Id>,
        pub name: Option<String>,
    }

    // Query Fragments - Character Query

    /// Query to fetch one character with episodes
    #[derive(cynic::QueryFragment, Debug)]
    #[cynic(graphql_type = "Query", variables = "CharacterQueryVariables")]
    pub struct CharacterQuery {
        #[arguments(id: $id)]
        pub character: Option<CharacterDetail>,
    }

    #[derive(cynic::QueryFragment, Debug)]
    #[cynic(graphql_type = "Character")]
    pub struct CharacterDetail {
        pub id: Option<cynic::Id>,
        pub name: Option<String>,
        pub status: Option<String>,
        pub species: Option<String>,
        #[cynic(rename = "type")]
        pub kind: Option<String>,
        pub gender: Option<String>,
        pub origin: Option<LocationDetail>,
        pub location: Option<LocationDetail>,
        pub image: Option<String>,
        pub episode: Vec<Option<Episode>>,
        pub created: Option<String>,
    }

    #[derive(cynic::QueryFragment, Debug)]
    #[cynic(graphql_type = "Location")]
    pub struct LocationDetail {
        pub id: Option<cynic::Id>,
        pub name: Option<String>,
        pub dimension: Option<String>,
    }

    #[derive(cynic::QueryFragment, Debug)]
    pub struct Episode {
        pub id: Option<cynic::Id>,
        pub name: Option<String>,
        pub episode: Option<String>,
    }
}

use graphql::*;

/// Character source backed by the public GraphQL API.
#[derive(Debug, Clone)]
pub struct GraphQlSource {
    client: Client,
    endpoint: url::Url,
}

impl GraphQlSource {
    /// Create a source from configuration
    ///
    /// Configures the HTTP client with a 10s connect timeout and the
    /// configured total timeout.
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::with_timeout(&config.endpoint(), config.request_timeout())
    }

    /// Create a source for `endpoint` with a 30s total timeout
    pub fn new(endpoint: &str) -> Result<Self> {
        Self::with_timeout(endpoint, Duration::from_secs(30))
    }

    pub fn with_timeout(endpoint: &str, timeout: Duration) -> Result<Self> {
        let endpoint = url::Url::parse(endpoint)
            .map_err(|e| RickdashError::Config(format!("invalid endpoint '{endpoint}': {e}")))?;

        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10).min(timeout))
            .build()?;

        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &url::Url {
        &self.endpoint
    }

    /// Execute a GraphQL query and unwrap its data
    async fn execute<ResponseData, Vars>(
        &self,
        operation: cynic::Operation<ResponseData, Vars>,
    ) -> Result<ResponseData>
    where
        ResponseData: serde::de::DeserializeOwned + 'static,
        Vars: serde::Serialize,
    {
        let response = self
            .client
            .post(self.endpoint.clone())
            .header(
                header::CONTENT_TYPE,
                header::HeaderValue::from_static("application/json"),
            )
            .json(&operation)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok());
            return Err(RickdashError::Api {
                status: Some(status.as_u16()),
                retry_after,
                message: format!("HTTP {status}"),
            });
        }

        let result: GraphQlResponse<ResponseData, ErrorExtensions> = response.json().await?;

        // Handle GraphQL errors - preserve individual error details
        if let Some(errors) = result.errors
            && !errors.is_empty()
        {
            let structured_errors = errors
                .iter()
                .map(|e| GraphQlError {
                    message: e.message.clone(),
                    code: e.extensions.as_ref().and_then(|ext| ext.code.clone()),
                    path: e.path.as_ref().map(|p| {
                        p.iter()
                            .map(|segment| match segment {
                                cynic::GraphQlErrorPathSegment::Field(name) => name.clone(),
                                cynic::GraphQlErrorPathSegment::Index(idx) => idx.to_string(),
                            })
                            .collect::<Vec<_>>()
                            .join(".")
                    }),
                })
                .collect();

            return Err(RickdashError::GraphQlErrors {
                errors: structured_errors,
                partial_data: result.data.is_some(),
            });
        }

        result
            .data
            .ok_or_else(|| RickdashError::api("No data in GraphQL response"))
    }

    async fn fetch_characters(&self, request: &PageRequest) -> Result<Page<Character>> {
        let page = i32::try_from(request.page).map_err(|_| {
            RickdashError::Other(format!("page {} is out of range", request.page))
        })?;
        let operation = CharactersQuery::build(CharactersQueryVariables {
            page: Some(page),
            filter: request.filter.clone().map(FilterCharacter::from),
        });

        let response = self.execute(operation).await?;

        // The API answers an unmatched filter with a null connection.
        let Some(characters) = response.characters else {
            return Ok(Page::empty());
        };

        Ok(Page {
            info: characters.info.map(convert_info).unwrap_or_default(),
            results: characters
                .results
                .unwrap_or_default()
                .into_iter()
                .flatten()
                .map(convert_character)
                .collect(),
        })
    }

    /// Fetch one character with origin, location and episode details
    pub async fn fetch_character(&self, id: &str) -> Result<CharacterDetail> {
        let operation = CharacterQuery::build(CharacterQueryVariables {
            id: cynic::Id::new(id),
        });

        let response = self.execute(operation).await?;
        let detail = response
            .character
            .ok_or_else(|| RickdashError::NotFound(format!("character '{id}'")))?;

        Ok(convert_character_detail(detail))
    }
}

impl PageSource for GraphQlSource {
    type Item = Character;

    async fn fetch_page(&self, request: &PageRequest, token: &CancelToken) -> Result<Page<Character>> {
        debug!(page = request.page, filter = ?request.filter, "fetching characters");

        tokio::select! {
            biased;
            _ = token.cancelled() => Err(token.to_error()),
            result = self.fetch_characters(request) => result,
        }
    }
}

impl From<CharacterFilter> for FilterCharacter {
    fn from(filter: CharacterFilter) -> Self {
        FilterCharacter {
            name: filter.name,
            status: filter.status,
            gender: filter.gender,
        }
    }
}

fn to_page_number(value: Option<i32>) -> Option<u32> {
    value.and_then(|v| u32::try_from(v).ok())
}

fn convert_info(info: Info) -> PageInfo {
    PageInfo {
        count: to_page_number(info.count).unwrap_or(0),
        pages: to_page_number(info.pages).unwrap_or(0),
        next: to_page_number(info.next),
        prev: to_page_number(info.prev),
    }
}

fn convert_location(location: Option<LocationSummary>) -> LocationRef {
    location
        .map(|l| LocationRef {
            id: l.id.map(|id| id.into_inner()),
            name: l.name.unwrap_or_default(),
            dimension: None,
        })
        .unwrap_or_default()
}

fn convert_character(character: graphql::Character) -> Character {
    Character {
        id: character.id.map(|id| id.into_inner()).unwrap_or_default(),
        name: character.name.unwrap_or_default(),
        status: CharacterStatus::from_api(character.status.as_deref()),
        species: character.species.unwrap_or_default(),
        gender: character.gender.unwrap_or_default(),
        origin: convert_location(character.origin),
        location: convert_location(character.location),
        image: character.image.unwrap_or_default(),
    }
}

fn convert_location_detail(location: Option<LocationDetail>) -> LocationRef {
    location
        .map(|l| LocationRef {
            id: l.id.map(|id| id.into_inner()),
            name: l.name.unwrap_or_default(),
            dimension: l.dimension,
        })
        .unwrap_or_default()
}

fn convert_character_detail(detail: graphql::CharacterDetail) -> CharacterDetail {
    CharacterDetail {
        character: Character {
            id: detail.id.map(|id| id.into_inner()).unwrap_or_default(),
            name: detail.name.unwrap_or_default(),
            status: CharacterStatus::from_api(detail.status.as_deref()),
            species: detail.species.unwrap_or_default(),
            gender: detail.gender.unwrap_or_default(),
            origin: convert_location_detail(detail.origin),
            location: convert_location_detail(detail.location),
            image: detail.image.unwrap_or_default(),
        },
        kind: detail.kind.unwrap_or_default(),
        episodes: detail
            .episode
            .into_iter()
            .flatten()
            .map(|e| EpisodeRef {
                id: e.id.map(|id| id.into_inner()).unwrap_or_default(),
                name: e.name.unwrap_or_default(),
                code: e.episode.unwrap_or_default(),
            })
            .collect(),
        created: detail.created,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_info_maps_nulls() {
        let info = convert_info(Info {
            count: Some(826),
            pages: Some(42),
            next: Some(2),
            prev: None,
        });
        assert_eq!(
            info,
            PageInfo {
                count: 826,
                pages: 42,
                next: Some(2),
                prev: None,
            }
        );
    }

    #[test]
    fn test_convert_info_rejects_negative_pages() {
        let info = convert_info(Info {
            count: None,
            pages: Some(-1),
            next: Some(-3),
            prev: None,
        });
        assert_eq!(info.pages, 0);
        assert_eq!(info.next, None);
    }

    #[test]
    fn test_convert_character_fills_missing_fields() {
        let converted = convert_character(graphql::Character {
            id: Some(cynic::Id::new("1")),
            name: Some("Rick Sanchez".to_string()),
            status: Some("Alive".to_string()),
            species: None,
            gender: Some("Male".to_string()),
            origin: None,
            location: Some(LocationSummary {
                id: Some(cynic::Id::new("3")),
                name: Some("Citadel of Ricks".to_string()),
            }),
            image: None,
        });

        assert_eq!(converted.id, "1");
        assert_eq!(converted.status, CharacterStatus::Alive);
        assert_eq!(converted.species, "");
        assert_eq!(converted.origin, LocationRef::default());
        assert_eq!(converted.location.name, "Citadel of Ricks");
        assert_eq!(converted.location.id.as_deref(), Some("3"));
    }

    #[test]
    fn test_convert_detail_skips_null_episodes() {
        let detail = convert_character_detail(graphql::CharacterDetail {
            id: Some(cynic::Id::new("2")),
            name: Some("Morty Smith".to_string()),
            status: Some("Alive".to_string()),
            species: Some("Human".to_string()),
            kind: Some(String::new()),
            gender: Some("Male".to_string()),
            origin: Some(LocationDetail {
                id: None,
                name: Some("unknown".to_string()),
                dimension: None,
            }),
            location: Some(LocationDetail {
                id: Some(cynic::Id::new("20")),
                name: Some("Earth (Replacement Dimension)".to_string()),
                dimension: Some("Replacement Dimension".to_string()),
            }),
            image: None,
            episode: vec![
                Some(Episode {
                    id: Some(cynic::Id::new("1")),
                    name: Some("Pilot".to_string()),
                    episode: Some("S01E01".to_string()),
                }),
                None,
            ],
            created: Some("2017-11-04T18:50:21.651Z".to_string()),
        });

        assert_eq!(detail.character.name, "Morty Smith");
        assert_eq!(detail.episodes.len(), 1);
        assert_eq!(detail.episodes[0].code, "S01E01");
        assert_eq!(
            detail.character.location.dimension.as_deref(),
            Some("Replacement Dimension")
        );
    }

    #[test]
    fn test_filter_conversion() {
        let filter = CharacterFilter::build(Some("Rick"), Some("alive"), None).unwrap();
        let converted = FilterCharacter::from(filter);
        assert_eq!(converted.name.as_deref(), Some("Rick"));
        assert_eq!(converted.status.as_deref(), Some("alive"));
        assert_eq!(converted.gender, None);
    }

    #[test]
    fn test_invalid_endpoint_is_config_error() {
        let err = GraphQlSource::new("not a url").unwrap_err();
        assert!(matches!(err, RickdashError::Config(_)));
    }
}
