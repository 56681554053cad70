//! Known harvestable resources.

use serde::{Deserialize, Serialize};

const DEFAULT_TOLERANCE: u32 = 150;

/// Maximum edit distance accepted by [`Resource::lookup`].
const FUZZY_THRESHOLD: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
	BaruRichOre,
	AndraEnigmite,
	BaruOre,
	#[serde(rename = "grey-top_flax")]
	GreyTopFlax,
	Limestone,
	LunaOre,
	LunaRichOre,
	MeadowMushroom,
	RichAzteOre,
	RichStokesiteOre,
	SweetBerry,
	ThinTwig,
	Wheat,
}

impl Resource {
	pub const ALL: [Resource; 13] = [
		Resource::BaruRichOre,
		Resource::AndraEnigmite,
		Resource::BaruOre,
		Resource::GreyTopFlax,
		Resource::Limestone,
		Resource::LunaOre,
		Resource::LunaRichOre,
		Resource::MeadowMushroom,
		Resource::RichAzteOre,
		Resource::RichStokesiteOre,
		Resource::SweetBerry,
		Resource::ThinTwig,
		Resource::Wheat,
	];

	/// Asset folder holding this resource's templates.
	pub const fn folder(self) -> &'static str {
		match self {
			Resource::BaruRichOre => "baru_rich_ore",
			Resource::AndraEnigmite => "andra_enigmite",
			Resource::BaruOre => "baru_ore",
			Resource::GreyTopFlax => "grey-top_flax",
			Resource::Limestone => "limestone",
			Resource::LunaOre => "luna_ore",
			Resource::LunaRichOre => "luna_rich_ore",
			Resource::MeadowMushroom => "meadow_mushroom",
			Resource::RichAzteOre => "rich_azte_ore",
			Resource::RichStokesiteOre => "rich_stokesite_ore",
			Resource::SweetBerry => "sweet_berry",
			Resource::ThinTwig => "thin_twig",
			Resource::Wheat => "wheat",
		}
	}

	/// `"grey-top_flax"` → `"Grey-top Flax"`.
	pub fn display_name(self) -> String {
		self.folder()
			.split('_')
			.map(|part| {
				let mut chars = part.chars();
				match chars.next() {
					Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
					None => String::new(),
				}
			})
			.collect::<Vec<_>>()
			.join(" ")
	}

	/// Lateral and forward navigator tolerance in pixels.
	pub const fn tolerance(self) -> (u32, u32) {
		match self {
			Resource::BaruRichOre => (200, 250),
			_ => (DEFAULT_TOLERANCE, DEFAULT_TOLERANCE),
		}
	}

	/// Whether this resource shows a "Focused" prompt row at all.
	pub const fn focus_needed(self) -> bool {
		!matches!(self, Resource::GreyTopFlax | Resource::Limestone)
	}

	/// Match a user supplied name against the catalog.
	///
	/// Case, spaces and dashes are ignored; otherwise the closest folder name
	/// within a small edit distance wins.
	pub fn lookup(name: &str) -> Option<Self> {
		let wanted = normalize(name);
		if let Some(r) = Self::ALL.into_iter().find(|r| normalize(r.folder()) == wanted) {
			return Some(r);
		}
		Self::ALL
			.into_iter()
			.map(|r| (r, levenshtein::levenshtein(&normalize(r.folder()), &wanted)))
			.filter(|&(_, d)| d <= FUZZY_THRESHOLD)
			.min_by_key(|&(_, d)| d)
			.map(|(r, _)| r)
	}
}

fn normalize(name: &str) -> String {
	name.trim()
		.chars()
		.map(|c| match c {
			' ' | '-' => '_',
			c => c.to_ascii_lowercase(),
		})
		.collect()
}

impl std::fmt::Display for Resource {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.folder())
	}
}

impl std::str::FromStr for Resource {
	type Err = anyhow::Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::lookup(s).ok_or_else(|| anyhow::anyhow!("unknown resource: {s}"))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn lookup_ignores_separators_and_case() {
		assert_eq!(Resource::lookup("Luna Ore"), Some(Resource::LunaOre));
		assert_eq!(Resource::lookup("luna-ore"), Some(Resource::LunaOre));
		assert_eq!(Resource::lookup("grey top flax"), Some(Resource::GreyTopFlax));
	}

	#[test]
	fn lookup_tolerates_typos() {
		assert_eq!(Resource::lookup("lunaore"), Some(Resource::LunaOre));
		assert_eq!(Resource::lookup("limestnoe"), Some(Resource::Limestone));
		assert_eq!(Resource::lookup("granite"), None);
	}

	#[test]
	fn catalog_properties() {
		assert_eq!(Resource::BaruRichOre.tolerance(), (200, 250));
		assert_eq!(Resource::Wheat.tolerance(), (150, 150));
		assert!(!Resource::Limestone.focus_needed());
		assert!(Resource::SweetBerry.focus_needed());
		assert_eq!(Resource::GreyTopFlax.display_name(), "Grey-top Flax");
		assert_eq!("thin_twig".parse::<Resource>().unwrap(), Resource::ThinTwig);
	}

	#[test]
	fn serde_uses_folder_names() {
		for r in Resource::ALL {
			let json = serde_json::to_string(&r).unwrap();
			assert_eq!(json, format!("\"{}\"", r.folder()));
		}
	}
}
