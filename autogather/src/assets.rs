use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use ie::{Label, TemplateSet, Templates};

use crate::resource::Resource;

const RESOURCES_DIR: &str = "resources";
const IMAGE_EXTS: [&str; 5] = ["png", "jpg", "jpeg", "bmp", "webp"];

fn normalize_resources_dir(dir: PathBuf) -> PathBuf {
	// Accept either the app root (containing `resources/`) or the `resources/` folder itself.
	if dir.join(RESOURCES_DIR).is_dir() {
		dir.join(RESOURCES_DIR)
	} else {
		dir
	}
}

fn looks_like_resources_dir(dir: &Path) -> bool {
	Resource::ALL.iter().any(|r| dir.join(r.folder()).is_dir())
}

/// Resolve the template root in a way that works both:
/// - when running from the repo (`cargo run`), and
/// - when running a packaged binary (assets next to the executable).
///
/// An explicit `configured` path wins; otherwise `AUTOGATHER_ASSETS_DIR`, the
/// executable's directory and the working directory are searched in order.
pub fn resolve_resources_dir(configured: Option<&Path>) -> Result<PathBuf> {
	if let Some(dir) = configured {
		let dir = normalize_resources_dir(dir.to_path_buf());
		if !dir.is_dir() {
			bail!("assets directory {} does not exist", dir.display());
		}
		return Ok(dir);
	}

	let mut candidates: Vec<PathBuf> = Vec::new();
	if let Some(dir) = std::env::var_os("AUTOGATHER_ASSETS_DIR") {
		candidates.push(PathBuf::from(dir));
	}
	if let Ok(exe) = std::env::current_exe()
		&& let Some(dir) = exe.parent()
	{
		candidates.push(dir.to_path_buf());
	}
	if let Ok(cwd) = std::env::current_dir() {
		candidates.push(cwd);
	}
	#[cfg(debug_assertions)]
	candidates.push(PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(".."));

	let mut tried = Vec::new();
	for base in candidates {
		let dir = normalize_resources_dir(base);
		if looks_like_resources_dir(&dir) {
			return Ok(dir);
		}
		tried.push(dir);
	}

	bail!(
		"resource templates not found. Expected '{RESOURCES_DIR}/<resource>/{{focus,gathering,selector,resource}}/'.\n\nSearched in:\n{}\n\nFix: copy the '{RESOURCES_DIR}/' folder next to the executable (or set AUTOGATHER_ASSETS_DIR, or `assets_dir` in the config).",
		tried
			.into_iter()
			.map(|p| format!("  - {}", p.display()))
			.collect::<Vec<_>>()
			.join("\n")
	)
}

/// Case-insensitive lookup of a direct sub-directory.
fn find_subdir(dir: &Path, name: &str) -> Option<PathBuf> {
	let entries = std::fs::read_dir(dir).ok()?;
	entries
		.flatten()
		.map(|e| e.path())
		.filter(|p| p.is_dir())
		.find(|p| {
			p.file_name()
				.and_then(|n| n.to_str())
				.is_some_and(|n| n.eq_ignore_ascii_case(name))
		})
}

fn is_image(path: &Path) -> bool {
	path.extension()
		.and_then(|e| e.to_str())
		.is_some_and(|e| IMAGE_EXTS.iter().any(|x| e.eq_ignore_ascii_case(x)))
}

/// Load every image under `dir` into a set. Files are read in name order so
/// the tie-break order is stable across platforms.
pub fn load_set(label: Label, dir: &Path) -> Result<TemplateSet> {
	let mut paths = std::fs::read_dir(dir)
		.with_context(|| format!("read {:?}", dir))?
		.flatten()
		.map(|e| e.path())
		.filter(|p| p.is_file() && is_image(p))
		.collect::<Vec<_>>();
	paths.sort();

	let mut set = TemplateSet::new(label);
	for path in paths {
		let bytes = std::fs::read(&path).with_context(|| format!("read {:?}", path))?;
		set.push_encoded(&bytes).with_context(|| format!("load {:?}", path))?;
	}
	tracing::debug!(%label, dir = %dir.display(), templates = set.len(), "loaded templates");
	Ok(set)
}

/// Load all label sets of `resource` from `root/<folder>/<label dir>/`.
///
/// Missing label folders leave that set empty; [`Templates::validate`]
/// decides whether that is acceptable.
pub fn load_templates(root: &Path, resource: Resource) -> Result<Templates> {
	let dir = find_subdir(root, resource.folder())
		.with_context(|| format!("no folder for {} in {}", resource, root.display()))?;

	let mut templates = Templates::new();
	for label in Label::ALL {
		if let Some(sub) = find_subdir(&dir, label.dir_name()) {
			templates.insert(load_set(label, &sub)?);
		}
	}
	Ok(templates)
}

/// Catalog resources that have a template folder under `root`.
pub fn scan_resources(root: &Path) -> Vec<Resource> {
	Resource::ALL
		.into_iter()
		.filter(|r| find_subdir(root, r.folder()).is_some())
		.collect()
}
