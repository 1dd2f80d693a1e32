#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use std::path::{Path, PathBuf};
use std::sync::mpsc;

use eframe::egui;

use exif_tagger::backup;
use exif_tagger::config::{ConfigFile, DEFAULT_CONFIG_PATH, History};
use exif_tagger::exif::{TagEntry, TagName, compose_user_comment};
use exif_tagger::logging;
use exif_tagger::pipeline::run_batch;

fn main() -> eframe::Result<()> {
    logging::init_file_logger(Path::new(logging::LOG_FILE), false);

    let viewport = egui::ViewportBuilder::default()
        .with_inner_size([720.0, 640.0])
        .with_min_inner_size([520.0, 420.0]);

    let options = eframe::NativeOptions {
        viewport,
        ..Default::default()
    };

    eframe::run_native(
        "EXIF Tagger",
        options,
        Box::new(|cc| Ok(Box::new(App::new(cc, PathBuf::from(DEFAULT_CONFIG_PATH))))),
    )
}

// ── Messages sent from the worker thread to the UI ──────────────────

enum BgMessage {
    /// One line of progress output.
    Line(String),
    /// The running job finished.
    Done,
}

// ── Main application state ──────────────────────────────────────────

struct App {
    config: ConfigFile,
    /// Editable `[EXIF]` entries, in config order.
    fields: Vec<TagEntry>,
    history: History,
    directory: Option<PathBuf>,
    log: Vec<String>,
    running: bool,
    rx: mpsc::Receiver<BgMessage>,
    tx: mpsc::Sender<BgMessage>,
}

impl App {
    fn new(_cc: &eframe::CreationContext<'_>, config_path: PathBuf) -> Self {
        Self::load(config_path)
    }

    fn load(config_path: PathBuf) -> Self {
        let (tx, rx) = mpsc::channel();
        let mut log = Vec::new();

        let config = match ConfigFile::load(&config_path) {
            Ok(config) => config,
            Err(e) => {
                log::error!("{e}");
                log.push(format!("Error: {e}"));
                ConfigFile::empty(&config_path)
            }
        };

        let fields = config.exif_entries().unwrap_or_else(|| {
            TagName::ALL
                .iter()
                .map(|tag| TagEntry::new(tag.key(), ""))
                .collect()
        });
        let history = config.history();

        Self {
            config,
            fields,
            history,
            directory: None,
            log,
            running: false,
            rx,
            tx,
        }
    }

    fn push_log(&mut self, line: impl Into<String>) {
        self.log.push(line.into());
    }

    fn field_value(&self, tag: TagName) -> &str {
        self.fields
            .iter()
            .find(|f| f.tag() == Some(tag))
            .map(|f| f.value.as_str())
            .unwrap_or("")
    }

    fn set_field_value(&mut self, tag: TagName, value: String) {
        match self.fields.iter_mut().find(|f| f.tag() == Some(tag)) {
            Some(field) => field.value = value,
            None => self.fields.push(TagEntry::new(tag.key(), value)),
        }
    }

    /// Regenerate the user comment from the current model and lens fields.
    fn update_user_comment(&mut self) {
        let composed = compose_user_comment(
            self.field_value(TagName::Model),
            self.field_value(TagName::LensModel),
        );
        if let Some(comment) = composed {
            self.set_field_value(TagName::UserComment, comment);
        }
    }

    fn select_directory(&mut self) {
        if let Some(dir) = rfd::FileDialog::new().pick_folder() {
            self.push_log(format!("Selected directory: {}", dir.display()));
            self.directory = Some(dir);
        }
    }

    /// The chosen directory, or a log line asking for one.
    fn require_directory(&mut self) -> Option<PathBuf> {
        if self.directory.is_none() {
            log::warn!("No directory selected");
            self.push_log("Please select a directory first.");
        }
        self.directory.clone()
    }

    /// Write the edited fields and history back to the config file.
    fn save_config(&mut self) -> bool {
        for field in &self.fields {
            self.config.set_exif_value(&field.key, &field.value);
        }
        let model = self.field_value(TagName::Model).to_string();
        let lens = self.field_value(TagName::LensModel).to_string();
        self.history.record(&model, &lens);
        self.config.set_history(&self.history);

        match self.config.save() {
            Ok(()) => {
                self.push_log(format!("Config saved to {}", self.config.path().display()));
                true
            }
            Err(e) => {
                log::error!("{e}");
                self.push_log(format!("Error: {e}"));
                false
            }
        }
    }

    fn start_processing(&mut self, ctx: &egui::Context) {
        if self.running {
            return;
        }
        let Some(dir) = self.require_directory() else {
            return;
        };
        if !self.save_config() {
            return;
        }

        self.running = true;
        let config_path = self.config.path().to_path_buf();
        let tx = self.tx.clone();
        let ctx = ctx.clone();

        std::thread::spawn(move || {
            let _ = run_batch(&dir, &config_path, &mut |line| {
                let _ = tx.send(BgMessage::Line(line.to_string()));
                ctx.request_repaint();
            });
            let _ = tx.send(BgMessage::Done);
            ctx.request_repaint();
        });
    }

    fn start_cleanup(&mut self, ctx: &egui::Context) {
        if self.running {
            return;
        }
        let Some(dir) = self.require_directory() else {
            return;
        };

        self.running = true;
        self.push_log(format!("Cleaning up backups in: {}", dir.display()));
        let tx = self.tx.clone();
        let ctx = ctx.clone();

        std::thread::spawn(move || {
            let line = match backup::cleanup_backups(&dir) {
                Ok(n) => format!("Removed {n} backup file(s)."),
                Err(e) => {
                    log::error!("Backup cleanup failed: {e:#}");
                    format!("Error: {e:#}")
                }
            };
            let _ = tx.send(BgMessage::Line(line));
            let _ = tx.send(BgMessage::Done);
            ctx.request_repaint();
        });
    }

    fn poll_messages(&mut self) {
        while let Ok(msg) = self.rx.try_recv() {
            match msg {
                BgMessage::Line(line) => self.log.push(line),
                BgMessage::Done => self.running = false,
            }
        }
    }
}

impl eframe::App for App {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_messages();

        if self.running {
            ctx.request_repaint();
        }

        // ── Bottom toolbar ──────────────────────────────────────────
        egui::TopBottomPanel::bottom("toolbar").show(ctx, |ui| {
            ui.add_space(4.0);
            ui.horizontal(|ui| {
                if ui
                    .add_enabled(!self.running, egui::Button::new("📁 Select Directory"))
                    .clicked()
                {
                    self.select_directory();
                }
                if ui
                    .add_enabled(!self.running, egui::Button::new("▶ Save & Start Processing"))
                    .clicked()
                {
                    self.start_processing(ctx);
                }
                if ui
                    .add_enabled(!self.running, egui::Button::new("🗑 Cleanup Backups"))
                    .clicked()
                {
                    self.start_cleanup(ctx);
                }
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if self.running {
                        ui.spinner();
                    }
                });
            });
            ui.add_space(4.0);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(egui::RichText::new("Directory:").strong());
                match &self.directory {
                    Some(dir) => ui.label(dir.display().to_string()),
                    None => ui.colored_label(egui::Color32::GRAY, "(none selected)"),
                };
            });
            ui.add_space(8.0);
            ui.heading("EXIF Tags");
            ui.add_space(4.0);

            self.show_fields(ui);

            ui.add_space(12.0);
            ui.separator();
            ui.heading("Log");
            egui::ScrollArea::vertical()
                .auto_shrink([false, false])
                .stick_to_bottom(true)
                .show(ui, |ui| {
                    for line in &self.log {
                        ui.label(egui::RichText::new(line).monospace());
                    }
                });
        });
    }
}

// ── Tag fields ──────────────────────────────────────────────────────

impl App {
    fn show_fields(&mut self, ui: &mut egui::Ui) {
        let mut comment_stale = false;
        let model_history = self.history.camera_models.clone();
        let lens_history = self.history.lens_models.clone();

        egui::Grid::new("exif_fields")
            .num_columns(3)
            .spacing([12.0, 6.0])
            .show(ui, |ui| {
                for (i, field) in self.fields.iter_mut().enumerate() {
                    ui.label(egui::RichText::new(title_case(&field.key)).strong());
                    let edited = ui
                        .add(egui::TextEdit::singleline(&mut field.value).desired_width(320.0))
                        .changed();

                    let history = match field.tag() {
                        Some(TagName::Model) => Some(&model_history),
                        Some(TagName::LensModel) => Some(&lens_history),
                        _ => None,
                    };
                    let mut picked = false;
                    if let Some(history) = history {
                        egui::ComboBox::from_id_salt(("history", i))
                            .selected_text("History")
                            .show_ui(ui, |ui| {
                                for value in history {
                                    if ui.selectable_label(false, value).clicked() {
                                        field.value = value.clone();
                                        picked = true;
                                    }
                                }
                            });
                        if edited || picked {
                            comment_stale = true;
                        }
                    } else {
                        ui.label("");
                    }
                    ui.end_row();
                }
            });

        if comment_stale {
            self.update_user_comment();
        }
    }
}

/// `lens_model` -> `Lens Model`, `artist` -> `Artist`.
fn title_case(key: &str) -> String {
    key.split(|c: char| c == '_' || c.is_whitespace())
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
