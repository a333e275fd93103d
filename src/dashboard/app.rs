//! Dashboard application entry point

use eframe::egui;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use crate::app::RecognitionWorker;
use crate::config::WindowSettings;
use crate::dashboard::state::{
    is_supported_image, to_color_image, DashboardState, Notice, NoticeKind, RequestState, SUPPORTED_EXTENSIONS,
};
use crate::dashboard::theme::{self, ThemeColors};
use crate::dashboard::views::source::LOAD_FAILED;
use crate::dashboard::views::{render_result_view, render_source_view, ResultAction};
use crate::pipeline::load_image;
use crate::storage::RecordStore;
use crate::vision::TextDetector;

const WINDOW_TITLE: &str = "Ship Plate Detection and Recognition System";

/// The main recognition window
pub struct DashboardApp {
    state: DashboardState,
    worker: RecognitionWorker,
    /// Record store, absent when disabled or when it failed to open
    store: Option<RecordStore>,
    window: WindowSettings,
    /// Whether theme has been applied
    theme_applied: bool,
}

impl DashboardApp {
    pub fn new(worker: RecognitionWorker, store: Option<RecordStore>, window: WindowSettings) -> Self {
        Self {
            state: DashboardState::default(),
            worker,
            store,
            window,
            theme_applied: false,
        }
    }

    /// Create eframe options for the fixed-size main window
    pub fn options(window: &WindowSettings) -> eframe::NativeOptions {
        eframe::NativeOptions {
            viewport: egui::ViewportBuilder::default()
                .with_inner_size([window.width, window.height])
                .with_resizable(false)
                .with_title(WINDOW_TITLE),
            ..Default::default()
        }
    }

    /// Start a new recognition request for `path`
    fn start_upload(&mut self, ctx: &egui::Context, path: PathBuf) {
        if !is_supported_image(&path) {
            self.state.notice = Some(Notice::warning(
                "Unsupported file",
                format!("{} is not a .png, .jpg or .bmp image", path.display()),
            ));
            return;
        }

        self.state.path_input = path.display().to_string();
        let request_id = self.state.begin_request(path.clone());
        info!("Upload {}: {:?}", request_id, path);

        let image = match load_image(&path) {
            Ok(image) => image,
            Err(e) => {
                warn!("{}", e);
                self.state.request = RequestState::Failed(LOAD_FAILED.to_string());
                return;
            }
        };

        self.state.source_texture = Some(ctx.load_texture(
            "source_image",
            to_color_image(&image),
            egui::TextureOptions::LINEAR,
        ));

        if let Err(e) = self.worker.submit(request_id, image_name(&path), image) {
            error!("{}", e);
            self.state.request = RequestState::Failed(e.to_string());
        }
    }

    /// Pick up finished recognitions from the worker
    fn poll_worker(&mut self, ctx: &egui::Context) {
        while let Some(reply) = self.worker.try_recv() {
            if !self.state.is_current(reply.request_id) {
                continue;
            }

            match reply.outcome {
                Ok(result) => {
                    self.state.crop_texture = result.cropped.as_ref().map(|cropped| {
                        ctx.load_texture("plate_crop", to_color_image(cropped), egui::TextureOptions::LINEAR)
                    });
                    self.state.request = RequestState::Displaying(result);
                }
                Err(e) => {
                    error!("Recognition failed: {}", e);
                    self.state.request = RequestState::Failed(e.to_string());
                }
            }
        }

        if self.state.request.is_processing() && !self.worker.is_running() {
            self.state.request = RequestState::Failed("Recognition worker has stopped".to_string());
        }
    }

    /// Append the current result to the record store
    fn save_current(&mut self) {
        let Some(store) = &self.store else {
            return;
        };
        let Some((image_name, text)) = self.state.savable_result().and_then(|r| r.savable_record()) else {
            return;
        };

        let notice = match store.append(image_name, text) {
            Ok(id) => {
                info!("Saved record {}: {} -> {}", id, image_name, text);
                Notice::info(
                    "Saved",
                    format!("Plate number '{}' of {} was saved to the database", text, image_name),
                )
            }
            Err(e) => {
                warn!("Failed to save record: {}", e);
                Notice::warning("Save failed", e.to_string())
            }
        };

        if notice.kind == NoticeKind::Info {
            self.state.saved = true;
        }
        self.state.notice = Some(notice);
    }

    /// Files dropped onto the window this frame
    fn dropped_path(ctx: &egui::Context) -> Option<PathBuf> {
        ctx.input(|i| i.raw.dropped_files.iter().find_map(|file| file.path.clone()))
    }

    fn render_notice(&mut self, ctx: &egui::Context) {
        let Some(notice) = &self.state.notice else {
            return;
        };

        let color = match notice.kind {
            NoticeKind::Info => ThemeColors::ACCENT_SUCCESS,
            NoticeKind::Warning => ThemeColors::ACCENT_WARNING,
        };

        let mut dismissed = false;
        egui::Window::new(notice.title.as_str())
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label(egui::RichText::new(&notice.message).color(color));
                ui.add_space(8.0);
                if ui.add(theme::action_button("OK", ThemeColors::ACCENT_PRIMARY)).clicked() {
                    dismissed = true;
                }
            });

        if dismissed {
            self.state.notice = None;
        }
    }
}

/// Ask the user for an image with the native file dialog
fn pick_image_file() -> Option<PathBuf> {
    rfd::FileDialog::new()
        .set_title("Select Image")
        .add_filter("Image Files", &SUPPORTED_EXTENSIONS)
        .pick_file()
}

fn image_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

impl eframe::App for DashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Apply theme once
        if !self.theme_applied {
            theme::apply_theme(ctx);
            if let Some(font_path) = &self.window.font_path {
                if let Err(e) = theme::install_font(ctx, font_path) {
                    warn!("Could not load font {:?}: {}", font_path, e);
                }
            }
            self.theme_applied = true;
        }

        self.poll_worker(ctx);

        if !self.state.request.is_processing() {
            if let Some(path) = Self::dropped_path(ctx) {
                self.start_upload(ctx, path);
            }
        }

        let store_available = self.store.is_some();
        let mut action = None;

        egui::SidePanel::right("result_panel")
            .resizable(false)
            .exact_width(self.window.result_panel_width)
            .frame(egui::Frame::none().fill(ThemeColors::BG_WINDOW).inner_margin(30.0))
            .show(ctx, |ui| {
                action = render_result_view(ui, &mut self.state, store_available);
            });

        egui::CentralPanel::default()
            .frame(egui::Frame::none().fill(ThemeColors::BG_WINDOW).inner_margin(30.0))
            .show(ctx, |ui| {
                render_source_view(ui, &self.state);
            });

        self.render_notice(ctx);

        match action {
            Some(ResultAction::Browse) => {
                if let Some(path) = pick_image_file() {
                    self.start_upload(ctx, path);
                }
            }
            Some(ResultAction::Upload(path)) => self.start_upload(ctx, path),
            Some(ResultAction::Save) => self.save_current(),
            Some(ResultAction::Exit) => ctx.send_viewport_cmd(egui::ViewportCommand::Close),
            None => {}
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        if let Some(store) = self.store.take() {
            match store.close() {
                Ok(()) => info!("Record store closed"),
                Err(e) => warn!("Failed to close record store: {}", e),
            }
        }
    }
}

/// Run the dashboard application
pub fn run_dashboard<D>(
    detector: D,
    store: Option<RecordStore>,
    window: WindowSettings,
) -> Result<(), eframe::Error>
where
    D: TextDetector + 'static,
{
    let options = DashboardApp::options(&window);
    eframe::run_native(
        WINDOW_TITLE,
        options,
        Box::new(move |cc| {
            let ctx = cc.egui_ctx.clone();
            let worker = RecognitionWorker::spawn(detector, move || ctx.request_repaint());
            Ok(Box::new(DashboardApp::new(worker, store, window)))
        }),
    )
}
