use clap::Parser;

pub const HELP_KEYS: &str = "\
Key Bindings:
  Esc / q        : Quit
  Left / Right   : Previous / next image (wraps around)
  Ctrl + Arrows  : Pan
  + / -          : Zoom in / out (hold for continuous zoom)
  Scroll         : Pan
  Shift + Scroll : Zoom
  i              : Toggle info overlay
";

#[derive(Parser)]
#[command(
    name = "glance",
    about = "A directory-scoped image viewer",
    after_help = HELP_KEYS
)]
pub struct Cli {
    /// Image to open; its directory supplies the browsing list
    pub path: std::path::PathBuf,
}
