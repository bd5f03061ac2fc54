use std::path::Path as FsPath;
use std::sync::Arc;

use anyhow::Context;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use clap::Parser;
use mygene_client::{Citation, CitationSource, MyGeneClient};
use omics_core::{CohortGroups, ProteomeStore, QueryError, SignificanceSeries};
use serde_json::json;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

mod config;

use config::Config;

#[derive(Clone)]
struct ServerState {
    store: Arc<ProteomeStore>,
    citations: Arc<dyn CitationSource>,
}

/// Per-request failure rendered as `{"error": ...}`.
#[derive(Debug)]
struct ApiError(QueryError);

impl From<QueryError> for ApiError {
    fn from(err: QueryError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            QueryError::ColumnsMissing { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            QueryError::GeneNotFound { .. } => StatusCode::NOT_FOUND,
        };
        debug!(%status, error = %self.0, "request failed");
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::parse();

    // Tables are loaded once, before the listener exists.
    let workbook = config.workbook_spec();
    let layout = config.dataset_layout();
    info!(path = %workbook.path.display(), "loading workbook");
    let store = tokio::task::spawn_blocking(move || workbook_feed::load_store(&workbook, layout))
        .await
        .context("workbook loader task failed")?
        .context("cannot load dashboard data")?;

    let citations =
        MyGeneClient::new(config.mygene_config()).context("cannot build MyGene client")?;

    let state = ServerState {
        store: Arc::new(store),
        citations: Arc::new(citations),
    };
    let app = router(state, &config.static_dir);

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("bind {}", config.bind))?;
    info!(
        addr = %config.bind,
        static_dir = %config.static_dir.display(),
        "dashboard listening"
    );
    axum::serve(listener, app).await.context("server failed")?;
    Ok(())
}

fn router(state: ServerState, static_dir: &FsPath) -> Router {
    Router::new()
        .route("/api/volcano-data", get(volcano_handler))
        .route("/api/boxplot/:gene", get(boxplot_handler))
        .route("/api/papers/:gene", get(papers_handler))
        .fallback_service(ServeDir::new(static_dir))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn volcano_handler(
    State(state): State<ServerState>,
) -> Result<Json<SignificanceSeries>, ApiError> {
    Ok(Json(state.store.volcano()?))
}

async fn boxplot_handler(
    State(state): State<ServerState>,
    Path(gene): Path<String>,
) -> Result<Json<CohortGroups>, ApiError> {
    Ok(Json(state.store.boxplot(&gene)?))
}

/// Always succeeds; upstream trouble shows up as an empty list.
async fn papers_handler(
    State(state): State<ServerState>,
    Path(gene): Path<String>,
) -> Json<Vec<Citation>> {
    Json(state.citations.citations(&gene).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mygene_client::BoxFuture;
    use omics_core::{Cell, DatasetLayout, Table};
    use serde_json::Value;
    use tower::ServiceExt;

    struct FakeCitations;

    impl CitationSource for FakeCitations {
        fn citations<'a>(&'a self, symbol: &'a str) -> BoxFuture<'a, Vec<Citation>> {
            Box::pin(async move {
                if symbol == "TP53" {
                    vec![Citation::pubmed("11111", "p53 and ageing")]
                } else {
                    Vec::new()
                }
            })
        }
    }

    fn state_with(differential: Table) -> ServerState {
        let mut values = Table::new(vec![
            "EntrezGeneSymbol".into(),
            "Set002.YD_1".into(),
            "Set002.YD_2".into(),
            "Set002.OD_1".into(),
        ]);
        values.push_row(vec!["TP53".into(), "2.1".into(), "bad".into(), "3.4".into()]);
        ServerState {
            store: Arc::new(ProteomeStore::new(
                differential,
                values,
                DatasetLayout::default(),
            )),
            citations: Arc::new(FakeCitations),
        }
    }

    fn state() -> ServerState {
        let mut differential = Table::new(vec![
            "EntrezGeneSymbol".into(),
            "logFC".into(),
            "adj.P.Val".into(),
        ]);
        differential.push_row(vec!["TP53".into(), 1.2.into(), 0.001.into()]);
        differential.push_row(vec!["BRCA1".into(), (-0.5).into(), Cell::from("n/a")]);
        state_with(differential)
    }

    async fn body_json(resp: Response) -> Value {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn volcano_data_shape() {
        let resp = volcano_handler(State(state())).await.into_response();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        assert_eq!(body["genes"], json!(["TP53", "BRCA1"]));
        assert_eq!(body["x"], json!([1.2, -0.5]));
        assert_eq!(body["pvals"], json!([0.001, 1.0]));
        assert_eq!(body["y"][1], json!(0.0));
    }

    #[tokio::test]
    async fn volcano_missing_columns_is_client_error() {
        let differential = Table::new(vec!["logFC".into(), "adj.P.Val".into()]);
        let resp = volcano_handler(State(state_with(differential)))
            .await
            .into_response();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_json(resp).await;
        assert!(body["error"].as_str().unwrap().contains("gene symbol"));
    }

    #[tokio::test]
    async fn boxplot_for_known_gene() {
        let resp = boxplot_handler(State(state()), Path("TP53".to_string()))
            .await
            .into_response();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await, json!({"young": [2.1], "old": [3.4]}));
    }

    #[tokio::test]
    async fn boxplot_for_unknown_gene_is_404() {
        let resp = boxplot_handler(State(state()), Path("NOTAGENE".to_string()))
            .await
            .into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            body_json(resp).await,
            json!({"error": "gene not found: NOTAGENE"})
        );
    }

    #[tokio::test]
    async fn papers_never_error() {
        let resp = papers_handler(State(state()), Path("TP53".to_string()))
            .await
            .into_response();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            body_json(resp).await,
            json!([{"title": "p53 and ageing", "url": "https://pubmed.ncbi.nlm.nih.gov/11111/"}])
        );

        let resp = papers_handler(State(state()), Path("NOTAGENE".to_string()))
            .await
            .into_response();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await, json!([]));
    }

    async fn get_path(app: Router, uri: &str) -> Response {
        let request = axum::http::Request::get(uri)
            .body(axum::body::Body::empty())
            .unwrap();
        app.oneshot(request).await.unwrap().into_response()
    }

    #[tokio::test]
    async fn router_serves_static_index_and_api_routes() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<h1>proteome dashboard</h1>").unwrap();
        let app = router(state(), dir.path());

        let resp = get_path(app.clone(), "/").await;
        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&bytes[..], b"<h1>proteome dashboard</h1>");

        let resp = get_path(app.clone(), "/api/boxplot/TP53").await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await, json!({"young": [2.1], "old": [3.4]}));

        let resp = get_path(app.clone(), "/api/boxplot/NOTAGENE").await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            body_json(resp).await,
            json!({"error": "gene not found: NOTAGENE"})
        );

        let resp = get_path(app, "/js/missing.js").await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
