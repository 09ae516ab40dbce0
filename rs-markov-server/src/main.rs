use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use actix_cors::Cors;
use actix_web::{get, put, web, App, HttpResponse, HttpServer, Responder};
use clap::Parser;
use log::{error, info};
use serde::{Deserialize, Serialize};

use rs_markov_core::io::{get_filename, list_files, normalize_folder};
use rs_markov_core::{Generator, ModelError, ModelResult, Policy, TableStats};

/// Extension of the corpus files served from the data directory.
const CORPUS_EXTENSION: &str = "txt";

/// Server configuration
#[derive(Parser, Debug, Clone)]
#[command(name = "rs-markov-server")]
#[command(about = "HTTP service generating words from a character-level Markov chain", long_about = None)]
struct Config {
	/// Address to bind
	#[arg(long, default_value = "127.0.0.1", env = "MARKOV_HOST")]
	host: String,

	/// Port to bind
	#[arg(long, default_value_t = 5000, env = "MARKOV_PORT")]
	port: u16,

	/// Directory holding the `.txt` corpora
	#[arg(long, default_value = "./data", env = "MARKOV_DATA_DIR")]
	data_dir: String,

	/// Context length used when `load_corpus` does not give one
	#[arg(long, default_value_t = 3, env = "MARKOV_CONTEXT_LENGTH")]
	context_length: usize,

	/// Stall limit used when `generate` does not give one, and the highest one accepted
	#[arg(long, default_value_t = 10_000, env = "MARKOV_STALL_LIMIT")]
	stall_limit: usize,

	/// Highest `length` accepted by `generate`
	#[arg(long, default_value_t = 256, env = "MARKOV_MAX_LENGTH")]
	max_length: usize,
}

/// Query parameters for the `/v1/generate` endpoint
#[derive(Deserialize)]
struct GenerateParams {
	start: Option<String>, // random start if missing
	length: Option<usize>,
	probability: Option<f64>,
	policy: Option<Policy>,
	seed: Option<u64>,
	stall_limit: Option<usize>,
}

#[derive(Deserialize)]
struct CorpusQuery {
	name: Option<String>,
	context_length: Option<usize>,
}

#[derive(Serialize)]
struct LoadedCorpus {
	name: String,
	stats: TableStats,
}

struct Corpus {
	name: String,
	generator: Generator,
}

struct SharedData {
	data_dir: PathBuf,
	default_context_length: usize,
	default_stall_limit: usize,
	max_length: usize,
	corpus: RwLock<Option<Arc<Corpus>>>,
}

/// Maps a core error to a response.
fn error_response(e: ModelError) -> HttpResponse {
	if e.is_validation() {
		HttpResponse::BadRequest().body(e.to_string())
	} else if e.is_not_found() {
		HttpResponse::NotFound().body(e.to_string())
	} else {
		error!("{e}");
		HttpResponse::InternalServerError().body(e.to_string())
	}
}

/// Resolves the requested `(length, stall_limit)` against the server bounds.
///
/// Every request runs with a stall guard: `stall_limit` must be in
/// `1..=default_stall_limit` and `length` must not exceed `max_length`.
fn generation_bounds(data: &SharedData, query: &GenerateParams) -> Result<(usize, usize), String> {
	let length = query.length.unwrap_or(8);
	if length > data.max_length {
		return Err(format!("length must be at most {}, got {length}", data.max_length));
	}
	let stall_limit = query.stall_limit.unwrap_or(data.default_stall_limit);
	if stall_limit == 0 || stall_limit > data.default_stall_limit {
		return Err(format!(
			"stall_limit must be between 1 and {}, got {stall_limit}",
			data.default_stall_limit
		));
	}
	Ok((length, stall_limit))
}

/// Returns the loaded corpus, the lock is released on return.
fn loaded_corpus(data: &SharedData) -> Result<Option<Arc<Corpus>>, HttpResponse> {
	match data.corpus.read() {
		Ok(corpus) => Ok(corpus.clone()),
		Err(_) => Err(HttpResponse::InternalServerError().body("Corpus lock failed")),
	}
}

/// HTTP GET endpoint `/v1/generate`
///
/// Generates a word from the loaded corpus based on query parameters.
/// Returns the generated word as the response body.
///
/// Generation runs on the blocking pool and never holds the corpus lock.
#[get("/v1/generate")]
async fn get_generated(data: web::Data<SharedData>, query: web::Query<GenerateParams>) -> impl Responder {
	let (length, stall_limit) = match generation_bounds(&data, &query) {
		Ok(bounds) => bounds,
		Err(message) => return HttpResponse::BadRequest().body(message),
	};
	let corpus = match loaded_corpus(&data) {
		Ok(Some(corpus)) => corpus,
		Ok(None) => return HttpResponse::NotFound().body("No corpus loaded"),
		Err(response) => return response,
	};

	let mut input = corpus.generator.make_generation_input();
	if let Some(start) = &query.start {
		if let Err(e) = input.set_start(start) {
			return error_response(e);
		}
	}
	if let Err(e) = input.set_probability(query.probability.unwrap_or(1.0)) {
		return error_response(e);
	}
	input.target_length = length;
	input.policy = query.policy.unwrap_or_default();
	input.seed = query.seed;
	input.stall_limit = Some(stall_limit);

	match web::block(move || corpus.generator.generate(&input)).await {
		Ok(Ok(word)) => HttpResponse::Ok().body(word),
		Ok(Err(e)) => error_response(e),
		Err(e) => {
			error!("generation task failed: {e}");
			HttpResponse::InternalServerError().body("Generation failed")
		}
	}
}

/// HTTP GET endpoint `/v1/corpora`
///
/// Lists the corpus names available in the data directory.
#[get("/v1/corpora")]
async fn get_corpora(data: web::Data<SharedData>) -> impl Responder {
	match list_files(&data.data_dir, CORPUS_EXTENSION) {
		Ok(files) => match files.iter().map(get_filename).collect::<ModelResult<Vec<_>>>() {
			Ok(names) => HttpResponse::Ok().body(names.join("\n")),
			Err(e) => error_response(e),
		},
		Err(e) => error_response(e),
	}
}

#[get("/v1/loaded_corpus")]
async fn get_loaded_corpus(data: web::Data<SharedData>) -> impl Responder {
	match loaded_corpus(&data) {
		Ok(Some(corpus)) => HttpResponse::Ok().json(LoadedCorpus {
			name: corpus.name.clone(),
			stats: corpus.generator.table().stats(),
		}),
		Ok(None) => HttpResponse::NotFound().body("No corpus loaded"),
		Err(response) => response,
	}
}

/// HTTP PUT endpoint `/v1/load_corpus`
///
/// Trains a new table from `<data_dir>/<name>.txt` and replaces the loaded one.
#[put("/v1/load_corpus")]
async fn put_corpus(data: web::Data<SharedData>, query: web::Query<CorpusQuery>) -> impl Responder {
	let name = match &query.name {
		Some(s) if !s.trim().is_empty() => s.trim().to_owned(),
		_ => return HttpResponse::BadRequest().body("Missing or empty corpus name"),
	};
	if name.contains(['/', '\\']) || name.starts_with('.') {
		return HttpResponse::BadRequest().body("Invalid corpus name");
	}

	let context_length = query.context_length.unwrap_or(data.default_context_length);
	let path = data.data_dir.join(format!("{name}.{CORPUS_EXTENSION}"));

	// Train outside the lock, readers keep the previous corpus meanwhile
	let generator = match Generator::from_file(&path, context_length) {
		Ok(generator) => generator,
		Err(e) => return error_response(e),
	};
	info!("trained {name} with context length {context_length}: {:?}", generator.table().stats());

	let mut corpus = match data.corpus.write() {
		Ok(corpus) => corpus,
		Err(_) => return HttpResponse::InternalServerError().body("Corpus lock failed"),
	};
	*corpus = Some(Arc::new(Corpus { name, generator }));

	HttpResponse::Ok().body("Corpus loaded successfully")
}

/// Registers every endpoint.
fn routes(cfg: &mut web::ServiceConfig) {
	cfg.service(get_generated)
		.service(get_corpora)
		.service(get_loaded_corpus)
		.service(put_corpus);
}

/// Main entry point for the server.
///
/// Starts with no corpus loaded; `PUT /v1/load_corpus` trains one.
/// The loaded corpus is shared by all workers behind an `RwLock`, generation
/// only takes the read side.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
	let config = Config::parse();
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

	let shared_data = web::Data::new(SharedData {
		data_dir: normalize_folder(&config.data_dir),
		default_context_length: config.context_length,
		default_stall_limit: config.stall_limit.max(1),
		max_length: config.max_length,
		corpus: RwLock::new(None),
	});
	info!("serving corpora from {} on {}:{}", shared_data.data_dir.display(), config.host, config.port);

	HttpServer::new(move || {
		App::new()
			.wrap(Cors::permissive())
			.app_data(shared_data.clone())
			.configure(routes)
	})
		.bind((config.host.as_str(), config.port))?
		.run()
		.await
}

#[cfg(test)]
mod tests {
	use super::*;
	use actix_web::http::StatusCode;
	use actix_web::test;
	use rs_markov_core::ContextTable;

	const CATS: &str = "the cat sat on the mat";

	fn shared_data(dir: &std::path::Path) -> web::Data<SharedData> {
		web::Data::new(SharedData {
			data_dir: dir.to_path_buf(),
			default_context_length: 2,
			default_stall_limit: 100,
			max_length: 64,
			corpus: RwLock::new(None),
		})
	}

	#[actix_web::test]
	async fn load_then_generate() {
		let dir = tempfile::tempdir().unwrap();
		std::fs::write(dir.path().join("cats.txt"), CATS).unwrap();
		let app = test::init_service(App::new().app_data(shared_data(dir.path())).configure(routes)).await;

		let req = test::TestRequest::get().uri("/v1/generate?start=th").to_request();
		assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

		let req = test::TestRequest::put().uri("/v1/load_corpus?name=cats").to_request();
		assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

		let req = test::TestRequest::get().uri("/v1/corpora").to_request();
		assert_eq!(test::call_and_read_body(&app, req).await, web::Bytes::from_static(b"cats"));

		let req = test::TestRequest::get()
			.uri("/v1/generate?start=th&length=3&policy=unrestricted")
			.to_request();
		assert_eq!(test::call_and_read_body(&app, req).await, web::Bytes::from_static(b"the c"));

		let req = test::TestRequest::get().uri("/v1/generate?start=t").to_request();
		assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

		let req = test::TestRequest::get().uri("/v1/generate?start=th&probability=2").to_request();
		assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
	}

	#[actix_web::test]
	async fn unknown_corpus_is_not_found() {
		let dir = tempfile::tempdir().unwrap();
		let app = test::init_service(App::new().app_data(shared_data(dir.path())).configure(routes)).await;

		let req = test::TestRequest::put().uri("/v1/load_corpus?name=missing").to_request();
		assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

		let req = test::TestRequest::put().uri("/v1/load_corpus?name=../etc").to_request();
		assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
	}

	#[actix_web::test]
	async fn loaded_corpus_reports_stats() {
		let dir = tempfile::tempdir().unwrap();
		std::fs::write(dir.path().join("cats.txt"), CATS).unwrap();
		let app = test::init_service(App::new().app_data(shared_data(dir.path())).configure(routes)).await;

		let req = test::TestRequest::get().uri("/v1/loaded_corpus").to_request();
		assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

		let req = test::TestRequest::put().uri("/v1/load_corpus?name=cats").to_request();
		assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

		let req = test::TestRequest::get().uri("/v1/loaded_corpus").to_request();
		let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
		assert_eq!(body["name"], "cats");
		assert_eq!(body["stats"]["context_length"], 2);
		assert_eq!(body["stats"]["contexts_per_order"], serde_json::json!([10, 14]));
		assert_eq!(body["stats"]["contexts"], 24);
		assert_eq!(body["stats"]["transitions"], 39);
		assert_eq!(body["stats"], serde_json::to_value(ContextTable::build(CATS, 2).stats()).unwrap());
	}

	#[actix_web::test]
	async fn generation_requests_are_bounded() {
		let dir = tempfile::tempdir().unwrap();
		std::fs::write(dir.path().join("cats.txt"), CATS).unwrap();
		let app = test::init_service(App::new().app_data(shared_data(dir.path())).configure(routes)).await;

		let req = test::TestRequest::put().uri("/v1/load_corpus?name=cats").to_request();
		assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

		for uri in [
			"/v1/generate?start=th&length=65",
			"/v1/generate?start=th&length=18446744073709551615",
			"/v1/generate?start=th&stall_limit=0",
			"/v1/generate?start=th&stall_limit=101",
		] {
			let req = test::TestRequest::get().uri(uri).to_request();
			assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST, "{uri}");
		}

		// "he" is only ever followed by a space, the stall guard ends the word
		let req = test::TestRequest::get()
			.uri("/v1/generate?start=he&length=64&policy=no_space")
			.to_request();
		assert_eq!(test::call_and_read_body(&app, req).await, web::Bytes::from_static(b"he"));

		// A near-zero probability still terminates at the maximum length
		let req = test::TestRequest::get()
			.uri("/v1/generate?start=th&length=64&probability=0.000001&policy=unrestricted&seed=7")
			.to_request();
		assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
	}
}
