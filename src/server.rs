//! HTTP boundary for the generation pipeline.

use crate::{
    config::Config,
    error::{GenerationError, Result},
    gemini::{GeminiClient, GenerationService},
    models::{FileListResponse, GenerationRequest, GenerationResult, RegenerateImageRequest},
    pipeline::{GenerationMode, MangaGenerator},
    storage::{LocalFileStore, ReferenceKind, ReferenceStore},
};
use actix_web::{error::InternalError, web, App, HttpResponse, HttpServer, Responder};
use serde_json::json;
use std::io;
use std::sync::Arc;
use std::time::Duration;

const MAX_JSON_BYTES: usize = 4 * 1024 * 1024;

pub struct AppState {
    config: Config,
    http: reqwest::Client,
    store: Arc<LocalFileStore>,
    service: Option<Arc<dyn GenerationService>>,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.gemini.timeout_secs))
            .build()
            .map_err(|e| GenerationError::ConfigError(format!("HTTP client: {}", e)))?;
        let store = Arc::new(LocalFileStore::new(&config.storage));
        Ok(Self {
            config,
            http,
            store,
            service: None,
        })
    }

    /// Uses `service` for every call instead of a Gemini client.
    pub fn with_service(mut self, service: Arc<dyn GenerationService>) -> Self {
        self.service = Some(service);
        self
    }

    /// A fresh generator per call; a missing API key fails here.
    fn generator(&self) -> Result<MangaGenerator> {
        let service: Arc<dyn GenerationService> = match &self.service {
            Some(service) => service.clone(),
            None => Arc::new(GeminiClient::with_http(
                self.http.clone(),
                &self.config.gemini,
            )?),
        };
        Ok(
            MangaGenerator::new(service, self.store.clone(), self.store.clone())
                .with_image_size(self.config.gemini.image_size.clone()),
        )
    }

    async fn run(&self, mode: GenerationMode) -> GenerationResult {
        match self.generator() {
            Ok(generator) => generator.run(mode).await,
            Err(e) => {
                log::error!("❌ Cannot start {} generation: {}", mode.name(), e);
                GenerationResult::failure(&e)
            }
        }
    }
}

async fn root() -> impl Responder {
    HttpResponse::Ok().json(json!({
        "message": "4-Panel Manga Generator API",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn health() -> impl Responder {
    HttpResponse::Ok().json(json!({ "status": "healthy" }))
}

async fn list_files(state: &AppState, kind: ReferenceKind) -> HttpResponse {
    match state.store.list(kind).await {
        Ok(files) => HttpResponse::Ok().json(FileListResponse { files }),
        Err(e) => {
            log::error!("❌ Failed to list {} references: {}", kind, e);
            HttpResponse::InternalServerError().json(json!({ "detail": e.to_string() }))
        }
    }
}

async fn layout_files(state: web::Data<AppState>) -> impl Responder {
    list_files(&state, ReferenceKind::Layout).await
}

async fn character_files(state: web::Data<AppState>) -> impl Responder {
    list_files(&state, ReferenceKind::Character).await
}

async fn generate(
    state: web::Data<AppState>,
    body: web::Json<GenerationRequest>,
) -> impl Responder {
    let result = state.run(GenerationMode::Fresh(body.into_inner())).await;
    HttpResponse::Ok().json(result)
}

async fn retry(state: web::Data<AppState>, body: web::Json<GenerationRequest>) -> impl Responder {
    let result = state.run(GenerationMode::FullRetry(body.into_inner())).await;
    HttpResponse::Ok().json(result)
}

async fn regenerate_image(
    state: web::Data<AppState>,
    body: web::Json<RegenerateImageRequest>,
) -> impl Responder {
    let RegenerateImageRequest {
        thought_process,
        aspect_ratio,
    } = body.into_inner();
    let result = state
        .run(GenerationMode::ImageOnly {
            thought_process,
            aspect_ratio,
        })
        .await;
    HttpResponse::Ok().json(result)
}

/// Malformed bodies get the same failed-result shape as pipeline errors.
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(MAX_JSON_BYTES)
        .error_handler(|err, _req| {
            let failure = GenerationResult::failure(&GenerationError::ValidationError(format!(
                "Invalid request: {}",
                err
            )));
            InternalError::from_response(err, HttpResponse::BadRequest().json(failure)).into()
        })
}

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .route("/", web::get().to(root))
        .route("/health", web::get().to(health))
        .service(
            web::scope("/api")
                .route("/files/layout", web::get().to(layout_files))
                .route("/files/characters", web::get().to(character_files))
                .route("/generate", web::post().to(generate))
                .route("/retry", web::post().to(retry))
                .route("/regenerate-image", web::post().to(regenerate_image)),
        );
}

pub async fn run(config: Config) -> io::Result<()> {
    let bind = (config.server.host.clone(), config.server.port);
    let state = web::Data::new(
        AppState::new(config).map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?,
    );

    HttpServer::new(move || App::new().app_data(state.clone()).configure(routes))
        .bind(bind)?
        .run()
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::{GeminiConfig, StorageConfig},
        gemini::ChunkStream,
        models::{ImageGenerationConfig, RequestPart, StreamChunk},
    };
    use actix_web::{http::StatusCode, test};
    use async_trait::async_trait;
    use futures::stream;

    struct EchoService;

    #[async_trait]
    impl GenerationService for EchoService {
        async fn stream_generate(
            &self,
            parts: Vec<RequestPart>,
            _config: &ImageGenerationConfig,
        ) -> Result<ChunkStream> {
            let chunks: Vec<Result<StreamChunk>> = vec![
                Ok(StreamChunk::text(format!("{} parts", parts.len()))),
                Ok(StreamChunk::image("image/png", b"img".to_vec())),
            ];
            Ok(Box::pin(stream::iter(chunks)))
        }
    }

    fn config(root: &std::path::Path) -> Config {
        Config::new()
            .with_gemini(GeminiConfig::new())
            .with_storage(StorageConfig::new().with_root(root))
    }

    fn scenes_payload() -> serde_json::Value {
        json!({
            "scenes": [
                {"scene_description": "A"},
                {"scene_description": "B"},
                {"scene_description": "C"},
                {"scene_description": "D"}
            ]
        })
    }

    #[actix_web::test]
    async fn test_health() {
        let dir = tempfile::tempdir().unwrap();
        let state = web::Data::new(AppState::new(config(dir.path())).unwrap());
        let app = test::init_service(App::new().app_data(state).configure(routes)).await;

        let resp = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["status"], "healthy");
    }

    #[actix_web::test]
    async fn test_missing_api_key_is_reported_as_failed_result() {
        let dir = tempfile::tempdir().unwrap();
        let state = web::Data::new(AppState::new(config(dir.path())).unwrap());
        let app = test::init_service(App::new().app_data(state).configure(routes)).await;

        let req = test::TestRequest::post()
            .uri("/api/generate")
            .set_json(scenes_payload())
            .to_request();
        let body: GenerationResult = test::call_and_read_body_json(&app, req).await;
        assert!(!body.success);
        assert_eq!(body.error.as_deref(), Some("GEMINI_API_KEY is not configured"));
    }

    #[actix_web::test]
    async fn test_generate_and_regenerate() {
        let dir = tempfile::tempdir().unwrap();
        let state = web::Data::new(
            AppState::new(config(dir.path()))
                .unwrap()
                .with_service(Arc::new(EchoService)),
        );
        let app = test::init_service(App::new().app_data(state).configure(routes)).await;

        let req = test::TestRequest::post()
            .uri("/api/generate")
            .set_json(scenes_payload())
            .to_request();
        let generated: GenerationResult = test::call_and_read_body_json(&app, req).await;
        assert!(generated.success);
        assert_eq!(generated.thought_process, "1 parts");
        assert!(generated.image_url.is_some());

        let req = test::TestRequest::post()
            .uri("/api/regenerate-image")
            .set_json(json!({"thought_process": "redo", "aspect_ratio": "3:4"}))
            .to_request();
        let regenerated: GenerationResult = test::call_and_read_body_json(&app, req).await;
        assert!(regenerated.success);
        assert_ne!(regenerated.image_url, generated.image_url);
    }

    #[actix_web::test]
    async fn test_bad_payloads() {
        let dir = tempfile::tempdir().unwrap();
        let state = web::Data::new(
            AppState::new(config(dir.path()))
                .unwrap()
                .with_service(Arc::new(EchoService)),
        );
        let app = test::init_service(App::new().app_data(state).configure(routes)).await;

        let req = test::TestRequest::post()
            .uri("/api/retry")
            .set_json(json!({"scenes": [{"scene_description": "only one"}]}))
            .to_request();
        let body: GenerationResult = test::call_and_read_body_json(&app, req).await;
        assert!(!body.success);

        let req = test::TestRequest::post()
            .uri("/api/generate")
            .set_json(json!({"aspect_ratio": "7:3", "scenes": []}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_file_listing() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("char_refs")).unwrap();
        std::fs::write(dir.path().join("char_refs").join("alice.png"), b"x").unwrap();
        let state = web::Data::new(AppState::new(config(dir.path())).unwrap());
        let app = test::init_service(App::new().app_data(state).configure(routes)).await;

        let req = test::TestRequest::get().uri("/api/files/characters").to_request();
        let body: FileListResponse = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body.files, vec!["alice.png".to_string()]);

        let req = test::TestRequest::get().uri("/api/files/layout").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
