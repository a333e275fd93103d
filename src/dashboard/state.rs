//! Dashboard view state management

use image::RgbImage;
use std::path::{Path, PathBuf};

use crate::pipeline::RecognitionResult;

/// File extensions accepted for upload
pub const SUPPORTED_EXTENSIONS: [&str; 3] = ["png", "jpg", "bmp"];

/// Whether the path has one of the accepted image extensions (case-insensitive)
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            SUPPORTED_EXTENSIONS
                .iter()
                .any(|supported| supported.eq_ignore_ascii_case(ext))
        })
        .unwrap_or(false)
}

/// Convert pixels into an egui image without altering any channel values
pub fn to_color_image(image: &RgbImage) -> egui::ColorImage {
    let size = [image.width() as usize, image.height() as usize];
    egui::ColorImage::from_rgb(size, image.as_raw())
}

/// Lifecycle of the current upload
#[derive(Debug, Default)]
pub enum RequestState {
    /// Nothing uploaded yet
    #[default]
    Idle,
    /// Request handed to the OCR worker
    Processing { request_id: u64 },
    /// Recognition finished
    Displaying(RecognitionResult),
    /// The image could not be loaded or the engine failed
    Failed(String),
}

impl RequestState {
    pub fn is_processing(&self) -> bool {
        matches!(self, RequestState::Processing { .. })
    }
}

/// Severity of a notice window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Warning,
}

/// Message shown in a modal-style window until dismissed
#[derive(Debug, Clone)]
pub struct Notice {
    pub kind: NoticeKind,
    pub title: String,
    pub message: String,
}

impl Notice {
    pub fn info(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Info,
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn warning(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Warning,
            title: title.into(),
            message: message.into(),
        }
    }
}

/// All UI state of the main window
#[derive(Default)]
pub struct DashboardState {
    /// Contents of the path field
    pub path_input: String,
    /// Image currently shown on the left
    pub source_path: Option<PathBuf>,
    pub source_texture: Option<egui::TextureHandle>,
    pub crop_texture: Option<egui::TextureHandle>,
    pub request: RequestState,
    /// Monotonic id so stale worker replies can be ignored
    pub next_request_id: u64,
    /// Set once the current result has been written to the store
    pub saved: bool,
    pub notice: Option<Notice>,
}

impl DashboardState {
    /// Begin a new upload, clearing everything left from the previous one
    pub fn begin_request(&mut self, path: PathBuf) -> u64 {
        self.next_request_id += 1;
        let request_id = self.next_request_id;

        self.source_path = Some(path);
        self.source_texture = None;
        self.crop_texture = None;
        self.saved = false;
        self.request = RequestState::Processing { request_id };

        request_id
    }

    /// Whether a reply belongs to the request currently in flight
    pub fn is_current(&self, request_id: u64) -> bool {
        matches!(self.request, RequestState::Processing { request_id: current } if current == request_id)
    }

    /// Result that may be saved right now, if any
    pub fn savable_result(&self) -> Option<&RecognitionResult> {
        match &self.request {
            RequestState::Displaying(result) if !self.saved && result.savable_record().is_some() => {
                Some(result)
            }
            _ => None,
        }
    }

    pub fn can_save(&self) -> bool {
        self.savable_result().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn displayed(text: Option<&str>) -> RequestState {
        RequestState::Displaying(RecognitionResult {
            image_name: "boat.jpg".to_string(),
            text: text.map(str::to_string),
            ..Default::default()
        })
    }

    #[test]
    fn test_supported_extensions() {
        assert!(is_supported_image(Path::new("boat.png")));
        assert!(is_supported_image(Path::new("/tmp/boat.JPG")));
        assert!(is_supported_image(Path::new("dir/boat.bmp")));
    }

    #[test]
    fn test_unsupported_extensions() {
        assert!(!is_supported_image(Path::new("boat.gif")));
        assert!(!is_supported_image(Path::new("boat.jpeg")));
        assert!(!is_supported_image(Path::new("boat.tiff")));
        assert!(!is_supported_image(Path::new("boat")));
        assert!(!is_supported_image(Path::new("png")));
    }

    #[test]
    fn test_color_image_preserves_pixels() {
        let image = RgbImage::from_fn(7, 3, |x, y| Rgb([x as u8 * 30, y as u8 * 80, 200 - x as u8]));

        let color = to_color_image(&image);

        assert_eq!(color.size, [7, 3]);
        for (x, y, pixel) in image.enumerate_pixels() {
            let c = color[(x as usize, y as usize)];
            assert_eq!([c.r(), c.g(), c.b(), c.a()], [pixel[0], pixel[1], pixel[2], 255]);
        }
    }

    #[test]
    fn test_begin_request_resets_upload_state() {
        let mut state = DashboardState {
            saved: true,
            request: displayed(Some("浙岱渔01234")),
            ..Default::default()
        };

        let first = state.begin_request(PathBuf::from("a.png"));
        let second = state.begin_request(PathBuf::from("b.png"));

        assert_ne!(first, second);
        assert!(!state.saved);
        assert!(state.request.is_processing());
        assert!(state.is_current(second));
        assert!(!state.is_current(first));
    }

    #[test]
    fn test_save_enabled_only_with_unsaved_text() {
        let mut state = DashboardState {
            request: displayed(Some("浙岱渔01234")),
            ..Default::default()
        };
        assert!(state.can_save());

        state.saved = true;
        assert!(!state.can_save());

        state.saved = false;
        state.request = displayed(None);
        assert!(!state.can_save());

        state.request = RequestState::Failed("Could not load image".to_string());
        assert!(!state.can_save());
    }
}
