use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::{fs, io, thread};

use log::{debug, info};

use crate::error::{BigramError, Result};
use crate::model::bigram_model::BigramModel;

/// Splits raw text into tokens on any whitespace.
pub fn tokenize(text: &str) -> Vec<&str> {
	text.split_whitespace().collect()
}

/// Reads a text file and returns all its lines as a `Vec<String>`.
///
/// - Reads the entire file into memory
/// - Splits on `\n` / `\r\n`
pub fn read_corpus<P: AsRef<Path>>(filename: P) -> io::Result<Vec<String>> {
	let mut contents = String::new();
	File::open(filename)?.read_to_string(&mut contents)?;
	Ok(contents.lines().map(str::to_owned).collect())
}

/// Builds a model from a text file, one training sequence per non-blank line.
///
/// Counts are additive, so the result equals training every line in order.
pub fn train_file<P: AsRef<Path>>(filename: P) -> Result<BigramModel> {
	let lines: Vec<String> = read_corpus(&filename)?
		.into_iter()
		.filter(|line| !line.trim().is_empty())
		.collect();
	info!("training on {} lines from {}", lines.len(), filename.as_ref().display());

	let model = train_in_parallel(&lines, |model, line| model.train(&tokenize(line)))?;
	debug!("merged model: {:?}", model.stats());
	Ok(model)
}

/// Applies `train_line` to every line on worker threads and merges the results.
///
/// # Behavior
/// - Splits lines into chunks (based on CPU cores * factor).
/// - Spawns one scoped thread per chunk to build a partial model.
/// - Joins every worker, then merges the partial models in chunk order.
///
/// # Errors
/// Returns `WorkerPanicked` if any worker panicked; no partial result is kept.
fn train_in_parallel<F>(lines: &[String], train_line: F) -> Result<BigramModel>
where
	F: Fn(&mut BigramModel, &str) + Sync,
{
	if lines.is_empty() {
		return Ok(BigramModel::new());
	}

	let chunks = num_cpus::get() * 8;
	let chunk_size = lines.len().div_ceil(chunks).max(1);
	let train_line = &train_line;

	let partial_models: Vec<thread::Result<BigramModel>> = thread::scope(|scope| {
		let handles: Vec<_> = lines
			.chunks(chunk_size)
			.map(|chunk| {
				scope.spawn(move || {
					let mut partial_model = BigramModel::new();
					for line in chunk {
						train_line(&mut partial_model, line);
					}
					partial_model
				})
			})
			.collect();
		handles.into_iter().map(|handle| handle.join()).collect()
	});

	let mut final_model = BigramModel::new();
	for partial_model in partial_models {
		let partial_model = partial_model.map_err(|_| BigramError::WorkerPanicked)?;
		final_model.merge(&partial_model)?;
	}
	Ok(final_model)
}

/// Serializes a model with `postcard`.
pub fn save<P: AsRef<Path>>(model: &BigramModel, path: P) -> Result<()> {
	let bytes = postcard::to_stdvec(model)?;
	fs::write(path, bytes)?;
	Ok(())
}

/// Deserializes a model written by [`save`].
///
/// # Errors
/// Returns `InvalidArgument` if the decoded counts break the model invariants.
pub fn load<P: AsRef<Path>>(path: P) -> Result<BigramModel> {
	let bytes = fs::read(path)?;
	let model: BigramModel = postcard::from_bytes(&bytes)?;
	model.validate()?;
	Ok(model)
}

/// Loads the `.bin` sibling of a corpus if it exists, otherwise trains
/// from the corpus and writes the `.bin` for the next time.
pub fn load_or_train<P: AsRef<Path>>(corpus_path: P) -> Result<BigramModel> {
	let binary_path = build_output_path(&corpus_path, "bin")?;
	if binary_path.exists() {
		debug!("loading cached model {}", binary_path.display());
		return load(binary_path);
	}

	let model = train_file(&corpus_path)?;
	save(&model, &binary_path)?;
	info!("cached model written to {}", binary_path.display());
	Ok(model)
}

/// Builds an output path based on an input path and a new extension.
///
/// Example:
/// `data/input.txt` + `"bin"` → `data/input.bin`
pub fn build_output_path<P: AsRef<Path>>(
	input_path: P,
	output_extension: &str,
) -> io::Result<PathBuf> {
	let input_path = input_path.as_ref();

	let parent = input_path.parent().unwrap_or_else(|| Path::new("."));
	let file_stem = input_path
		.file_stem()
		.ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "Input path has no filename"))?;

	let mut output = PathBuf::from(parent);
	output.push(file_stem);
	output.set_extension(output_extension);

	Ok(output)
}

/// Lists all files with a given extension in a directory.
///
/// Returns file names only (no paths), sorted.
pub fn list_files<P: AsRef<Path>>(dir: P, extension: &str) -> io::Result<Vec<String>> {
	let mut files = Vec::new();

	for entry in fs::read_dir(dir)? {
		let path = entry?.path();

		if path.is_file() && path.extension() == Some(std::ffi::OsStr::new(extension)) {
			if let Some(name) = path.file_name() {
				files.push(name.to_string_lossy().to_string());
			}
		}
	}

	files.sort();
	Ok(files)
}
