mod config;

use std::sync::RwLock;

use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::{get, put, web, App, HttpResponse, HttpServer, Responder};

use log::{info, warn};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Deserialize;

use config::ServerConfig;
use rs_bigram_core::io::{list_files, load_or_train, tokenize};
use rs_bigram_core::{BigramError, BigramModel, SharedModel};

/// Query parameters for the `/v1/generate` endpoint
#[derive(Deserialize)]
struct GenerateParams {
	max_length: Option<usize>,
	seed: Option<u64>
}

/// Query parameters for the `/v1/probability` endpoint
#[derive(Deserialize)]
struct ProbabilityParams {
	prev: String,
	curr: String
}

#[derive(Deserialize)]
struct ModelQuery {
	names: Option<String>
}

struct SharedData {
	model: SharedModel,
	/// Corpora merged into `model` by the last `/v1/load_models`.
	loaded_models: RwLock<Vec<String>>,
	config: ServerConfig
}

/// Maps a model error to an HTTP response.
///
/// - `InvalidArgument` → 400
/// - `Busy` → 503
/// - anything else → 500
fn error_response(e: BigramError) -> HttpResponse {
	match e {
		BigramError::InvalidArgument(_) => HttpResponse::BadRequest().body(e.to_string()),
		BigramError::Busy => HttpResponse::ServiceUnavailable().body(e.to_string()),
		_ => {
			warn!("request failed: {e}");
			HttpResponse::InternalServerError().body(e.to_string())
		}
	}
}

/// HTTP GET endpoint `/v1/generate`
///
/// Generates a sequence and returns its tokens joined by spaces.
/// A `seed` makes the response reproducible for an unchanged model.
/// `max_length` above the configured limit is refused.
#[get("/v1/generate")]
async fn get_generated(data: web::Data<SharedData>, query: web::Query<GenerateParams>) -> impl Responder {
	let max_length = query.max_length.unwrap_or(data.config.default_max_length);
	if max_length > data.config.max_length_limit {
		return HttpResponse::BadRequest()
			.body(format!("max_length must be at most {}", data.config.max_length_limit));
	}
	let mut rng = match query.seed {
		Some(seed) => StdRng::seed_from_u64(seed),
		None => StdRng::from_rng(&mut rand::rng()),
	};

	match data.model.generate(max_length, &mut rng) {
		Ok(tokens) => HttpResponse::Ok().body(tokens.join(" ")),
		Err(e) => error_response(e),
	}
}

#[get("/v1/probability")]
async fn get_probability(data: web::Data<SharedData>, query: web::Query<ProbabilityParams>) -> impl Responder {
	match data.model.bigram_probability(&query.prev, &query.curr) {
		Ok(p) => HttpResponse::Ok().body(p.to_string()),
		Err(e) => error_response(e),
	}
}

/// HTTP PUT endpoint `/v1/train`
///
/// The body is split on whitespace and trained as a single sequence.
#[put("/v1/train")]
async fn put_train(data: web::Data<SharedData>, body: String) -> impl Responder {
	let tokens = tokenize(&body);
	match data.model.train(&tokens) {
		Ok(()) => HttpResponse::Ok().body(format!("Trained on {} tokens", tokens.len())),
		Err(e) => error_response(e),
	}
}

#[get("/v1/stats")]
async fn get_stats(data: web::Data<SharedData>) -> impl Responder {
	match data.model.stats() {
		Ok(stats) => HttpResponse::Ok().json(stats),
		Err(e) => error_response(e),
	}
}

#[get("/v1/loaded_models")]
async fn get_loaded_models(data: web::Data<SharedData>) -> impl Responder {
	match data.loaded_models.read() {
		Ok(names) => HttpResponse::Ok().body(names.join("\n")),
		Err(_) => HttpResponse::InternalServerError().body("Model lock failed"),
	}
}

#[get("/v1/models")]
async fn get_models(data: web::Data<SharedData>) -> impl Responder {
	match list_files(&data.config.data_dir, "txt") {
		Ok(files) => {
			let names: Vec<&str> = files
				.iter()
				.filter_map(|file| file.strip_suffix(".txt"))
				.collect();
			HttpResponse::Ok().body(names.join("\n"))
		}
		Err(_) => HttpResponse::InternalServerError().body("Failed to list models")
	}
}

/// HTTP PUT endpoint `/v1/load_models?names=a,b`
///
/// Replaces the served model with the merge of the named corpora.
/// Corpora are trained (or loaded from their `.bin` cache) off the async workers.
#[put("/v1/load_models")]
async fn put_model(data: web::Data<SharedData>, query: web::Query<ModelQuery>) -> impl Responder {
	let query_names = match &query.names {
		Some(s) if !s.trim().is_empty() => s.trim(),
		_ => return HttpResponse::BadRequest().body("Missing or empty model name"),
	};

	let model_names: Vec<String> = query_names
		.split(',')
		.map(|s| s.trim())
		.filter(|s| !s.is_empty())
		.map(str::to_owned)
		.collect();

	if model_names.iter().any(|name| name.contains('/') || name.contains('\\') || name.contains("..")) {
		return HttpResponse::BadRequest().body("Model names cannot contain path separators");
	}

	let data_dir = data.config.data_dir.clone();
	let names = model_names.clone();
	let built = web::block(move || -> Result<BigramModel, BigramError> {
		let mut model = BigramModel::new();
		for name in &names {
			let partial_model = load_or_train(data_dir.join(format!("{name}.txt")))?;
			model.merge(&partial_model)?;
		}
		Ok(model)
	})
	.await;

	let model = match built {
		Ok(Ok(model)) => model,
		Ok(Err(e)) => return HttpResponse::InternalServerError().body(format!("Failed to load model: {e}")),
		Err(_) => return HttpResponse::InternalServerError().body("Model loading was interrupted"),
	};

	let mut loaded_models = match data.loaded_models.write() {
		Ok(names) => names,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};
	match data.model.replace(model) {
		Ok(_) => {
			info!("serving models: {}", model_names.join(", "));
			*loaded_models = model_names;
			HttpResponse::Ok().body("Models loaded successfully")
		}
		Err(e) => error_response(e),
	}
}

fn routes(cfg: &mut web::ServiceConfig) {
	cfg.service(get_generated)
		.service(get_probability)
		.service(put_train)
		.service(get_stats)
		.service(get_models)
		.service(get_loaded_models)
		.service(put_model);
}

/// Main entry point for the server.
///
/// Reads the configuration from the environment, starts with an empty model
/// and serves it behind a readers-writer lock.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

	let config = ServerConfig::from_env()
		.map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;
	info!("listening on {}:{}, corpora in {}", config.host, config.port, config.data_dir.display());

	let bind = (config.host.clone(), config.port);
	let shared_data = web::Data::new(SharedData {
		model: SharedModel::default(),
		loaded_models: RwLock::new(Vec::new()),
		config,
	});

	HttpServer::new(move || {
		App::new()
			.wrap(Logger::default())
			.wrap(Cors::permissive())
			.app_data(shared_data.clone())
			.configure(routes)
	})
		.bind(bind)?
		.run()
		.await
}

#[cfg(test)]
mod tests {
	use super::*;
	use actix_web::http::StatusCode;
	use actix_web::test;

	fn shared_data(data_dir: &std::path::Path) -> web::Data<SharedData> {
		web::Data::new(SharedData {
			model: SharedModel::default(),
			loaded_models: RwLock::new(Vec::new()),
			config: ServerConfig { data_dir: data_dir.to_path_buf(), ..ServerConfig::default() },
		})
	}

	#[actix_web::test]
	async fn train_then_query() {
		let dir = tempfile::tempdir().unwrap();
		let app = test::init_service(App::new().app_data(shared_data(dir.path())).configure(routes)).await;

		let req = test::TestRequest::put()
			.uri("/v1/train")
			.set_payload("the cat sat on the mat the cat ate food")
			.to_request();
		let body = test::call_and_read_body(&app, req).await;
		assert_eq!(body, "Trained on 10 tokens");

		let req = test::TestRequest::get().uri("/v1/probability?prev=the&curr=mat").to_request();
		let body = test::call_and_read_body(&app, req).await;
		let p: f64 = std::str::from_utf8(&body).unwrap().parse().unwrap();
		assert!((p - 1.0 / 3.0).abs() < 1e-12);

		let req = test::TestRequest::get().uri("/v1/probability?prev=zzz&curr=anything").to_request();
		assert_eq!(test::call_and_read_body(&app, req).await, "0");
	}

	#[actix_web::test]
	async fn seeded_generation_is_reproducible() {
		let dir = tempfile::tempdir().unwrap();
		let app = test::init_service(App::new().app_data(shared_data(dir.path())).configure(routes)).await;

		let req = test::TestRequest::put().uri("/v1/train").set_payload("a b a c a b").to_request();
		test::call_service(&app, req).await;

		let first = test::call_and_read_body(&app, test::TestRequest::get().uri("/v1/generate?seed=7").to_request()).await;
		let second = test::call_and_read_body(&app, test::TestRequest::get().uri("/v1/generate?seed=7").to_request()).await;
		assert_eq!(first, second);
		assert!(first.starts_with(b"a"));
	}

	#[actix_web::test]
	async fn zero_max_length_is_a_bad_request() {
		let dir = tempfile::tempdir().unwrap();
		let app = test::init_service(App::new().app_data(shared_data(dir.path())).configure(routes)).await;

		let req = test::TestRequest::get().uri("/v1/generate?max_length=0").to_request();
		let resp = test::call_service(&app, req).await;
		assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
	}

	#[actix_web::test]
	async fn untrained_model_generates_empty_text() {
		let dir = tempfile::tempdir().unwrap();
		let app = test::init_service(App::new().app_data(shared_data(dir.path())).configure(routes)).await;

		let req = test::TestRequest::get().uri("/v1/generate").to_request();
		assert_eq!(test::call_and_read_body(&app, req).await, "");
	}

	#[actix_web::test]
	async fn load_models_merges_corpora() {
		let dir = tempfile::tempdir().unwrap();
		std::fs::write(dir.path().join("first.txt"), "x y\n").unwrap();
		std::fs::write(dir.path().join("second.txt"), "x z\n").unwrap();
		let app = test::init_service(App::new().app_data(shared_data(dir.path())).configure(routes)).await;

		let req = test::TestRequest::get().uri("/v1/models").to_request();
		assert_eq!(test::call_and_read_body(&app, req).await, "first\nsecond");

		let req = test::TestRequest::put().uri("/v1/load_models?names=first,second").to_request();
		let resp = test::call_service(&app, req).await;
		assert_eq!(resp.status(), StatusCode::OK);

		let req = test::TestRequest::get().uri("/v1/probability?prev=x&curr=z").to_request();
		assert_eq!(test::call_and_read_body(&app, req).await, "0.5");

		let req = test::TestRequest::get().uri("/v1/stats").to_request();
		let stats: rs_bigram_core::ModelStats = test::call_and_read_body_json(&app, req).await;
		assert_eq!(stats.contexts, 4);
		assert_eq!(stats.observations, 6);

		let req = test::TestRequest::get().uri("/v1/loaded_models").to_request();
		assert_eq!(test::call_and_read_body(&app, req).await, "first\nsecond");
	}

	#[actix_web::test]
	async fn loaded_models_starts_empty() {
		let dir = tempfile::tempdir().unwrap();
		let app = test::init_service(App::new().app_data(shared_data(dir.path())).configure(routes)).await;

		let req = test::TestRequest::get().uri("/v1/loaded_models").to_request();
		assert_eq!(test::call_and_read_body(&app, req).await, "");
	}

	#[actix_web::test]
	async fn model_names_keep_inner_txt() {
		let dir = tempfile::tempdir().unwrap();
		std::fs::write(dir.path().join("my.txtdata.txt"), "a\n").unwrap();
		let app = test::init_service(App::new().app_data(shared_data(dir.path())).configure(routes)).await;

		let req = test::TestRequest::get().uri("/v1/models").to_request();
		assert_eq!(test::call_and_read_body(&app, req).await, "my.txtdata");
	}

	#[actix_web::test]
	async fn max_length_above_limit_is_a_bad_request() {
		let dir = tempfile::tempdir().unwrap();
		let app = test::init_service(App::new().app_data(shared_data(dir.path())).configure(routes)).await;

		let req = test::TestRequest::get().uri("/v1/generate?max_length=1001").to_request();
		assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

		let req = test::TestRequest::get().uri("/v1/generate?max_length=1000").to_request();
		assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
	}

	#[actix_web::test]
	async fn load_models_rejects_paths() {
		let dir = tempfile::tempdir().unwrap();
		let app = test::init_service(App::new().app_data(shared_data(dir.path())).configure(routes)).await;

		let req = test::TestRequest::put().uri("/v1/load_models?names=../secret").to_request();
		assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

		let req = test::TestRequest::put().uri("/v1/load_models").to_request();
		assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
	}
}
