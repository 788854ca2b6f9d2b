//! Font registration for chart text.
//!
//! Text goes through plotters' pure-Rust glyph renderer, which only knows the
//! fonts registered with it. One TrueType file is registered as the
//! `sans-serif` family per process. Without one, charts are drawn unlabelled.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::OnceLock,
};

use log::{debug, warn};
use plotters::style::{FontStyle, register_font};

pub const FONT_FAMILY: &str = "sans-serif";

const SYSTEM_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu-sans-fonts/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation-sans/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

static REGISTERED: OnceLock<Option<PathBuf>> = OnceLock::new();

/// Registers the first loadable font, preferring `preferred`. Later calls
/// return the outcome of the first one.
pub fn install(preferred: Option<&Path>) -> Option<&'static Path> {
    REGISTERED
        .get_or_init(|| {
            let candidates = preferred
                .map(Path::to_path_buf)
                .into_iter()
                .chain(SYSTEM_FONTS.iter().map(PathBuf::from));
            for candidate in candidates {
                if try_register(&candidate) {
                    debug!("Registered chart font {candidate:?}");
                    return Some(candidate);
                }
            }
            warn!("No usable TrueType font found; charts will be drawn without text");
            None
        })
        .as_deref()
}

/// Whether chart text can be drawn.
pub fn labels_available() -> bool {
    install(None).is_some()
}

fn try_register(path: &Path) -> bool {
    let Ok(bytes) = fs::read(path) else {
        return false;
    };
    // plotters keeps registered font data for the life of the process.
    let bytes: &'static [u8] = Box::leak(bytes.into_boxed_slice());
    match register_font(FONT_FAMILY, FontStyle::Normal, bytes) {
        Ok(()) => true,
        Err(_) => {
            warn!("Ignoring unreadable font {path:?}");
            false
        }
    }
}
