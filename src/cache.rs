use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use image::AnimationDecoder;
use image::codecs::gif::GifDecoder;

use crate::error::ViewerError;
use crate::metadata::MetadataSource;

/// Neighbors kept decoded on each side of the current index.
pub const WINDOW_RADIUS: usize = 3;

// ---------------------------------------------------------------------------
// Decoded entries
// ---------------------------------------------------------------------------

/// One decoded image: every animation frame as an owned RGBA buffer
/// (`width * height * 4` bytes each), the per-frame delays, and the metadata
/// lines extracted once at decode time.
pub struct CacheEntry {
    pub frames: Vec<Vec<u8>>,
    /// Milliseconds; a value <= 0 means "use the default" at playback time.
    pub delays: Vec<i32>,
    pub metadata: Vec<String>,
    pub width: u32,
    pub height: u32,
    pub file_size: u64,
}

fn decode(path: &Path) -> Result<CacheEntry, ViewerError> {
    let file_size = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);
    let wrap = |source| ViewerError::Decode {
        path: path.to_path_buf(),
        source,
    };

    let is_gif = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("gif"));

    if is_gif {
        let file = File::open(path).map_err(|e| wrap(image::ImageError::IoError(e)))?;
        let decoder = GifDecoder::new(BufReader::new(file)).map_err(wrap)?;

        let mut frames = Vec::new();
        let mut delays = Vec::new();
        let (mut width, mut height) = (0, 0);
        for frame in decoder.into_frames() {
            let frame = frame.map_err(wrap)?;
            let (num, den) = frame.delay().numer_denom_ms();
            delays.push(if den == 0 { 0 } else { (num / den) as i32 });

            let buffer = frame.into_buffer();
            width = buffer.width();
            height = buffer.height();
            frames.push(buffer.into_raw());
        }
        if frames.is_empty() {
            return Err(wrap(image::ImageError::IoError(std::io::Error::other(
                "gif contains no frames",
            ))));
        }

        Ok(CacheEntry {
            frames,
            delays,
            metadata: Vec::new(),
            width,
            height,
            file_size,
        })
    } else {
        let rgba = image::open(path).map_err(wrap)?.to_rgba8();
        let (width, height) = rgba.dimensions();

        Ok(CacheEntry {
            frames: vec![rgba.into_raw()],
            delays: vec![0],
            metadata: Vec::new(),
            width,
            height,
            file_size,
        })
    }
}

// ---------------------------------------------------------------------------
// Sliding-window cache
// ---------------------------------------------------------------------------

/// Keeps the entries for `[current - WINDOW_RADIUS, current + WINDOW_RADIUS]`
/// decoded and nothing else. Navigation is sequential, so plain window
/// membership replaces any recency bookkeeping.
pub struct ImageCache {
    paths: Vec<PathBuf>,
    entries: HashMap<usize, CacheEntry>,
    current: usize,
    metadata: Box<dyn MetadataSource>,
}

impl ImageCache {
    pub fn new(paths: Vec<PathBuf>, metadata: Box<dyn MetadataSource>) -> Self {
        Self {
            paths,
            entries: HashMap::new(),
            current: 0,
            metadata,
        }
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn path(&self, index: usize) -> Option<&Path> {
        self.paths.get(index).map(PathBuf::as_path)
    }

    /// Move the window to `index`: evict everything outside it, decode the
    /// entry at `index`, then fill the absent neighbors in index order. The
    /// primary decode completes before this returns so the caller can render
    /// immediately; a failed decode leaves its index absent.
    pub fn load(&mut self, index: usize) {
        if index >= self.paths.len() {
            return;
        }
        self.current = index;

        let start = index.saturating_sub(WINDOW_RADIUS);
        let end = (index + WINDOW_RADIUS).min(self.paths.len() - 1);
        self.entries.retain(|&i, _| i >= start && i <= end);

        self.fill(index);
        for i in start..=end {
            if i != index {
                self.fill(i);
            }
        }
    }

    /// Non-owning lookup; references do not survive the next `load`.
    pub fn get(&self, index: usize) -> Option<&CacheEntry> {
        self.entries.get(&index)
    }

    fn fill(&mut self, index: usize) {
        if self.entries.contains_key(&index) {
            return;
        }
        let path = self.paths[index].clone();
        match decode(&path) {
            Ok(mut entry) => {
                entry.metadata = self.metadata.read(&path);
                log::debug!(
                    "decoded [{}] {} ({} frame{})",
                    index,
                    path.display(),
                    entry.frames.len(),
                    if entry.frames.len() == 1 { "" } else { "s" },
                );
                self.entries.insert(index, entry);
            }
            Err(e) => log::warn!("{}", e),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{NO_METADATA, NoMetadata};
    use image::codecs::gif::GifEncoder;
    use image::{Delay, Frame, Rgb, RgbImage, Rgba, RgbaImage};
    use std::fs;

    fn write_png(path: &Path) {
        RgbaImage::from_pixel(2, 2, Rgba([10, 20, 30, 255]))
            .save(path)
            .unwrap();
    }

    fn write_jpg(path: &Path) {
        RgbImage::from_pixel(2, 2, Rgb([40, 50, 60])).save(path).unwrap();
    }

    fn write_gif(path: &Path, delays_ms: &[u32]) {
        let file = fs::File::create(path).unwrap();
        let mut encoder = GifEncoder::new(file);
        for (i, &ms) in delays_ms.iter().enumerate() {
            let buffer = RgbaImage::from_pixel(2, 2, Rgba([i as u8 * 40, 0, 0, 255]));
            let frame = Frame::from_parts(buffer, 0, 0, Delay::from_numer_denom_ms(ms, 1));
            encoder.encode_frames([frame]).unwrap();
        }
    }

    fn numbered_cache(dir: &Path, count: usize) -> ImageCache {
        let mut paths = Vec::new();
        for i in 0..count {
            let path = dir.join(format!("img{i:02}.png"));
            write_png(&path);
            paths.push(path);
        }
        ImageCache::new(paths, Box::new(NoMetadata))
    }

    #[test]
    fn window_slides_and_evicts() {
        let tmp = tempfile::tempdir().unwrap();
        let mut cache = numbered_cache(tmp.path(), 9);

        cache.load(0);
        for i in 0..=3 {
            assert!(cache.get(i).is_some(), "index {i} should be cached");
        }
        assert!(cache.get(4).is_none());

        cache.load(8);
        for i in 0..5 {
            assert!(cache.get(i).is_none(), "index {i} should be evicted");
        }
        for i in 5..=8 {
            assert!(cache.get(i).is_some(), "index {i} should be cached");
        }
    }

    #[test]
    fn load_out_of_range_is_a_noop() {
        let tmp = tempfile::tempdir().unwrap();
        let mut cache = numbered_cache(tmp.path(), 2);

        cache.load(0);
        cache.load(7);
        assert_eq!(cache.current_index(), 0);
        assert!(cache.get(0).is_some());
    }

    #[test]
    fn mixed_directory_with_animated_gif() {
        let tmp = tempfile::tempdir().unwrap();
        write_jpg(&tmp.path().join("a.jpg"));
        write_gif(&tmp.path().join("b.gif"), &[50, 100, 150]);
        write_png(&tmp.path().join("c.png"));

        let index = crate::files::scan(&tmp.path().join("b.gif")).unwrap();
        assert_eq!(index.start, 1);

        let mut cache = ImageCache::new(index.paths, Box::new(NoMetadata));
        cache.load(1);

        for i in 0..3 {
            assert!(cache.get(i).is_some(), "index {i} should be cached");
        }

        let gif = cache.get(1).unwrap();
        assert_eq!(gif.frames.len(), 3);
        assert_eq!(gif.delays, [50, 100, 150]);
        assert_eq!((gif.width, gif.height), (2, 2));
        for frame in &gif.frames {
            assert_eq!(frame.len(), (gif.width * gif.height * 4) as usize);
        }

        let png = cache.get(2).unwrap();
        assert_eq!(png.frames.len(), 1);
        assert_eq!(png.delays, [0]);
        assert_eq!(png.metadata, [NO_METADATA.to_string()]);
    }

    #[test]
    fn corrupt_file_is_skipped_without_breaking_neighbors() {
        let tmp = tempfile::tempdir().unwrap();
        write_png(&tmp.path().join("a.png"));
        fs::write(tmp.path().join("b.png"), b"definitely not a png").unwrap();
        write_png(&tmp.path().join("c.png"));

        let index = crate::files::scan(&tmp.path().join("b.png")).unwrap();
        let mut cache = ImageCache::new(index.paths, Box::new(NoMetadata));

        cache.load(1);
        assert!(cache.get(1).is_none());
        assert!(cache.get(0).is_some());
        assert!(cache.get(2).is_some());

        // Navigating away and back must not panic or resurrect the entry.
        cache.load(0);
        cache.load(1);
        assert!(cache.get(1).is_none());
    }
}
