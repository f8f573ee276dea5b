//! HTTP contract for the books resource and the controller implementing it.

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{rejection::PathRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use folio_http::error::AppError;
use serde_json::json;

use super::models::{Book, BookId};
use super::service::{BookService, LookupError};

/// Outcomes of `GET /{book_id}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GetBookByIdResponse {
    /// 200 with the book as JSON
    Ok(Book),
    /// 404 with an empty body
    NotFound,
}

impl IntoResponse for GetBookByIdResponse {
    fn into_response(self) -> Response {
        match self {
            GetBookByIdResponse::Ok(book) => (StatusCode::OK, Json(book)).into_response(),
            GetBookByIdResponse::NotFound => StatusCode::NOT_FOUND.into_response(),
        }
    }
}

/// Operations the books HTTP surface exposes.
#[async_trait]
pub trait BooksApi: Send + Sync {
    async fn get_book_by_id(&self, book_id: BookId) -> Result<GetBookByIdResponse, LookupError>;
}

/// Serves the books contract from a lookup capability handed in at construction.
#[derive(Clone)]
pub struct BookController {
    service: Arc<dyn BookService>,
}

impl BookController {
    pub fn new(service: Arc<dyn BookService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl BooksApi for BookController {
    async fn get_book_by_id(&self, book_id: BookId) -> Result<GetBookByIdResponse, LookupError> {
        let response = match self.service.find_book_by_id(&book_id).await? {
            Some(book) => GetBookByIdResponse::Ok(book),
            None => GetBookByIdResponse::NotFound,
        };
        Ok(response)
    }
}

/// Routes for any implementation of [`BooksApi`], relative to the module mount point.
pub fn router<A>(api: A) -> Router
where
    A: BooksApi + Clone + 'static,
{
    Router::new()
        .route("/{book_id}", get(get_book_by_id::<A>))
        .with_state(api)
}

async fn get_book_by_id<A>(
    State(api): State<A>,
    book_id: Result<Path<String>, PathRejection>,
) -> Result<GetBookByIdResponse, AppError>
where
    A: BooksApi + Clone + 'static,
{
    let Path(book_id) = book_id.map_err(|rejection| {
        AppError::bad_request(
            vec![json!({"field": "book_id", "error": rejection.body_text()})],
            "invalid book identifier",
        )
    })?;
    let book_id = BookId::from(book_id);

    let response = api.get_book_by_id(book_id.clone()).await.map_err(|error| {
        tracing::error!(%book_id, %error, "book lookup failed");
        AppError::internal(error)
    })?;

    tracing::debug!(
        %book_id,
        found = matches!(response, GetBookByIdResponse::Ok(_)),
        "book lookup completed"
    );

    Ok(response)
}

/// OpenAPI fragment for the books module.
pub fn openapi() -> serde_json::Value {
    json!({
        "paths": {
            "/{book_id}": {
                "get": {
                    "summary": "Get a book by id",
                    "operationId": "getBookById",
                    "tags": ["Books"],
                    "parameters": [
                        {
                            "name": "book_id",
                            "in": "path",
                            "required": true,
                            "schema": { "type": "string" }
                        }
                    ],
                    "responses": {
                        "200": {
                            "description": "The book",
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/Book" }
                                }
                            }
                        },
                        "404": {
                            "description": "No book has this id"
                        },
                        "500": {
                            "description": "Internal server error",
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/ErrorResponse" }
                                }
                            }
                        }
                    }
                }
            }
        },
        "components": {
            "schemas": {
                "Book": {
                    "type": "object",
                    "properties": {
                        "id": {
                            "type": "string",
                            "description": "Unique identifier for the book"
                        },
                        "title": {
                            "type": "string",
                            "description": "Title of the book"
                        },
                        "author": {
                            "type": "string",
                            "description": "Author of the book"
                        }
                    },
                    "required": ["id", "title"]
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::books::service::InMemoryBookService;
    use axum::{body::Body, extract::Request};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tower::ServiceExt;
    use tracing_subscriber::{layer::Context, prelude::*, Layer};

    /// Counts error-level events seen on the current thread.
    struct ErrorEvents(Arc<AtomicUsize>);

    impl<S: tracing::Subscriber> Layer<S> for ErrorEvents {
        fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
            if *event.metadata().level() == tracing::Level::ERROR {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    /// Lookup double that counts calls and can be told to fail.
    struct ScriptedService {
        inner: InMemoryBookService,
        calls: AtomicUsize,
        fail: bool,
    }

    impl ScriptedService {
        fn with_books(books: Vec<Book>) -> Arc<Self> {
            Arc::new(Self {
                inner: InMemoryBookService::new(books).unwrap(),
                calls: AtomicUsize::new(0),
                fail: false,
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                inner: InMemoryBookService::default(),
                calls: AtomicUsize::new(0),
                fail: true,
            })
        }
    }

    #[async_trait]
    impl BookService for ScriptedService {
        async fn find_book_by_id(&self, book_id: &BookId) -> Result<Option<Book>, LookupError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(LookupError::Backend("connection reset".to_string()));
            }
            self.inner.find_book_by_id(book_id).await
        }
    }

    async fn call(service: Arc<ScriptedService>, uri: &str) -> (StatusCode, Vec<u8>) {
        let app = router(BookController::new(service));
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, body.to_vec())
    }

    #[tokio::test]
    async fn controller_maps_presence_and_absence() {
        let controller = BookController::new(ScriptedService::with_books(vec![Book::new(
            "b1", "Dune",
        )]));

        assert_eq!(
            controller.get_book_by_id(BookId::new("b1")).await.unwrap(),
            GetBookByIdResponse::Ok(Book::new("b1", "Dune"))
        );
        assert_eq!(
            controller
                .get_book_by_id(BookId::new("missing"))
                .await
                .unwrap(),
            GetBookByIdResponse::NotFound
        );
    }

    #[tokio::test]
    async fn found_book_is_served_as_json() {
        let service = ScriptedService::with_books(vec![Book::new("b1", "Dune")]);

        let (status, body) = call(service.clone(), "/b1").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, br#"{"id":"b1","title":"Dune"}"#);
        assert_eq!(service.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn missing_book_is_empty_not_found() {
        let service = ScriptedService::with_books(vec![Book::new("b1", "Dune")]);

        let (status, body) = call(service, "/missing").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn repeated_lookups_are_identical() {
        let service = ScriptedService::with_books(vec![
            Book::new("b1", "Dune").with_author("Frank Herbert"),
            Book::new("b2", "Emma"),
        ]);

        for uri in ["/b1", "/missing"] {
            let first = call(service.clone(), uri).await;
            let second = call(service.clone(), uri).await;
            assert_eq!(first, second);
        }

        assert_eq!(service.inner.len(), 2);
        assert_eq!(service.calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn percent_encoded_ids_are_decoded() {
        let service = ScriptedService::with_books(vec![Book::new("war and peace", "War and Peace")]);

        let (status, _) = call(service, "/war%20and%20peace").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn lookup_failure_is_internal_error() {
        let (status, body) = call(ScriptedService::failing(), "/b1").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"]["code"], "internal_error");
        assert!(json["error"]["trace_id"].is_string());
    }

    #[tokio::test]
    async fn lookup_failure_is_logged_once() {
        let errors = Arc::new(AtomicUsize::new(0));
        let _guard = tracing_subscriber::registry()
            .with(ErrorEvents(Arc::clone(&errors)))
            .set_default();

        let (status, _) = call(ScriptedService::failing(), "/b1").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(errors.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn openapi_fragment_declares_lookup_responses() {
        let spec = openapi();
        let responses = &spec["paths"]["/{book_id}"]["get"]["responses"];
        assert!(responses["200"].is_object());
        assert!(responses["404"].is_object());
        assert!(responses["500"].is_object());
        assert!(spec["components"]["schemas"]["Book"].is_object());
    }
}
