use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::env;

use crate::error::{ModelError, ModelResult};

/// Reads a corpus file and joins all its lines with a single space.
///
/// - Reads the entire file into memory
/// - `\n`, `\r\n` and lone `\r` all count as line separators
///
/// The result is the normalized text expected by [`crate::ContextTable::build`].
pub fn load_text<P: AsRef<Path>>(filename: P) -> ModelResult<String> {
	let path = filename.as_ref();
	let contents = fs::read_to_string(path).map_err(|source| ModelError::Io {
		path: path.to_path_buf(),
		source,
	})?;
	Ok(join_lines(&contents))
}

/// Collapses every line separator of `contents` into a single space.
pub fn join_lines(contents: &str) -> String {
	contents
		.replace("\r\n", "\n")
		.replace('\r', "\n")
		.split('\n')
		.collect::<Vec<_>>()
		.join(" ")
}

/// Extracts the base filename without extension.
///
/// Examples:
/// - `"./data/names.txt"` → `"names"`
/// - `"names.txt"` → `"names"`
pub fn get_filename<P: AsRef<Path>>(input_path: P) -> ModelResult<String> {
	let input_path = input_path.as_ref();
	let stem = input_path
		.file_stem()
		.ok_or_else(|| ModelError::InvalidPath(format!("{} has no filename", input_path.display())))?;

	Ok(stem.to_string_lossy().to_string())
}

/// Normalize a folder path.
///
/// - `"."` or `"./"` resolves to the current working directory
/// - Other paths are returned as-is (not canonicalized)
pub fn normalize_folder(input: &str) -> PathBuf {
	if input == "." || input == "./" {
		env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
	} else {
		PathBuf::from(input)
	}
}

/// Lists all files with a given extension in a directory.
///
/// Returns file names only (no paths), sorted.
pub fn list_files<P: AsRef<Path>>(dir: P, extension: &str) -> ModelResult<Vec<String>> {
	let dir = dir.as_ref();
	let to_error = |source| ModelError::Io { path: dir.to_path_buf(), source };

	if !dir.is_dir() {
		return Err(ModelError::InvalidPath(format!("expected a directory, got: {}", dir.display())));
	}

	let mut files = Vec::new();
	for entry in fs::read_dir(dir).map_err(to_error)? {
		let path = entry.map_err(to_error)?.path();

		if path.is_file() && path.extension() == Some(OsStr::new(extension)) {
			if let Some(name) = path.file_name() {
				files.push(name.to_string_lossy().to_string());
			}
		}
	}
	files.sort();

	Ok(files)
}
