mod anim;
mod cache;
mod cli;
mod error;
mod files;
mod metadata;
mod sched;
mod ui;
mod view;

use clap::Parser;
use winit::event_loop::EventLoop;

use crate::cache::ImageCache;
use crate::cli::Cli;
use crate::metadata::ExifSource;
use crate::ui::App;
use crate::ui::state::ViewerState;

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let index = match files::scan(&cli.path) {
        Ok(index) => index,
        Err(e) => {
            log::error!("{}", e);
            std::process::exit(1);
        }
    };

    let cache = ImageCache::new(index.paths, Box::new(ExifSource));
    let state = ViewerState::new(cache, index.start);
    let mut app = App::new(state);

    let event_loop = EventLoop::new().expect("create event loop");
    event_loop.run_app(&mut app).expect("run event loop");
}
