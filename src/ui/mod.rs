use crate::app::{ConverterApp, ToolStatus};
use crate::constants::{APP_NAME, APP_VERSION, REPAINT_INTERVAL_MS};
use crate::state::ConversionStatus;
use eframe::egui;

impl eframe::App for ConverterApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.update_status();

        let mut style = (*ctx.style()).clone();
        style.spacing.button_padding = egui::vec2(12.0, 8.0);
        style.spacing.item_spacing = egui::vec2(10.0, 10.0);
        style.visuals = egui::Visuals::dark();
        style.visuals.window_fill = egui::Color32::from_gray(20);
        style.visuals.panel_fill = egui::Color32::from_gray(25);
        style.visuals.extreme_bg_color = egui::Color32::from_gray(15);
        ctx.set_style(style);

        egui::TopBottomPanel::top("header")
            .frame(egui::Frame::none().fill(egui::Color32::from_gray(15)).inner_margin(15.0))
            .show(ctx, |ui| {
                self.show_header(ui);
            });

        egui::TopBottomPanel::bottom("controls")
            .frame(egui::Frame::none().fill(egui::Color32::from_gray(15)).inner_margin(15.0))
            .show(ctx, |ui| {
                self.show_main_controls(ui);
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                card(ui, "📁 Input File", |ui| self.show_input(ui));
                ui.add_space(15.0);
                card(ui, "🔍 Media Info", |ui| self.show_metadata(ui));
                ui.add_space(15.0);
                card(ui, "🎯 Presets", |ui| self.show_presets(ui));
                ui.add_space(15.0);
                card(ui, "🔄 Conversion", |ui| self.show_conversion(ui));
                ui.add_space(15.0);
                self.show_activity(ui);
            });
        });

        if self.is_busy() {
            ctx.request_repaint_after(std::time::Duration::from_millis(REPAINT_INTERVAL_MS));
        }
    }
}

fn card(ui: &mut egui::Ui, title: &str, add_contents: impl FnOnce(&mut egui::Ui)) {
    egui::Frame::none()
        .fill(egui::Color32::from_gray(30))
        .stroke(egui::Stroke::new(1.0, egui::Color32::from_gray(45)))
        .rounding(10.0)
        .inner_margin(20.0)
        .show(ui, |ui| {
            ui.set_width(ui.available_width());
            ui.vertical(|ui| {
                ui.heading(egui::RichText::new(title).color(egui::Color32::WHITE).size(18.0));
                ui.add_space(12.0);
                add_contents(ui);
            });
        });
}

fn banner(ui: &mut egui::Ui, fill: egui::Color32, text_color: egui::Color32, title: &str, body: &str) {
    egui::Frame::none()
        .fill(fill)
        .rounding(8.0)
        .inner_margin(12.0)
        .show(ui, |ui| {
            ui.label(egui::RichText::new(title).color(text_color).strong());
            ui.label(egui::RichText::new(body).color(text_color));
        });
}

impl ConverterApp {
    fn show_header(&mut self, ui: &mut egui::Ui) {
        ui.vertical_centered(|ui| {
            ui.heading(
                egui::RichText::new(format!("🎬 {}", APP_NAME))
                    .size(26.0)
                    .color(egui::Color32::WHITE)
                    .strong(),
            );

            let (text, color) = match &self.tool_status {
                ToolStatus::Checking => (
                    "Checking for FFmpeg...".to_string(),
                    egui::Color32::GRAY,
                ),
                ToolStatus::Available { version } => (
                    format!("v{} • FFmpeg {}", APP_VERSION, version),
                    egui::Color32::from_rgb(150, 150, 150),
                ),
                ToolStatus::Missing { error } => (error.clone(), egui::Color32::LIGHT_RED),
            };
            ui.label(egui::RichText::new(text).size(13.0).color(color));
        });
    }

    fn show_input(&mut self, ui: &mut egui::Ui) {
        let selection = self.service.selection();
        let label = selection
            .input_file
            .as_ref()
            .map(|path| path.display().to_string())
            .unwrap_or_else(|| "No file selected".to_string());
        let can_browse = !self.service.is_transcoding();

        ui.horizontal(|ui| {
            if ui
                .add_enabled(can_browse, egui::Button::new("📁 Browse"))
                .clicked()
            {
                self.browse_input();
            }
            ui.label(egui::RichText::new(label).monospace());
        });
    }

    fn show_metadata(&mut self, ui: &mut egui::Ui) {
        let selection = self.service.selection();

        if selection.status.is_fetching() {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label("Reading media info...");
            });
            return;
        }

        if let Some(error) = &selection.probe_error {
            banner(
                ui,
                egui::Color32::from_rgba_premultiplied(200, 120, 0, 40),
                egui::Color32::from_rgb(255, 190, 90),
                "⚠ Could not read media info",
                error,
            );
            ui.add_space(8.0);
        }

        match &selection.metadata {
            Some(metadata) => {
                egui::Grid::new("metadata")
                    .num_columns(2)
                    .spacing([20.0, 8.0])
                    .show(ui, |ui| {
                        ui.label(egui::RichText::new("Format:").strong());
                        ui.label(metadata.format_summary());
                        ui.end_row();

                        ui.label(egui::RichText::new("Duration:").strong());
                        ui.label(metadata.duration.as_deref().unwrap_or("Unknown"));
                        ui.end_row();

                        ui.label(egui::RichText::new("Video:").strong());
                        ui.label(metadata.video_summary.as_str());
                        ui.end_row();

                        ui.label(egui::RichText::new("Audio:").strong());
                        ui.label(metadata.audio_summary.as_deref().unwrap_or("No audio stream"));
                        ui.end_row();
                    });
            }
            None if selection.input_file.is_none() => {
                ui.label(
                    egui::RichText::new("Select a file to inspect its container and codecs")
                        .color(egui::Color32::GRAY),
                );
            }
            None => {}
        }
    }

    fn show_presets(&mut self, ui: &mut egui::Ui) {
        let selection = self.service.selection();

        if selection.presets.is_empty() {
            ui.label(
                egui::RichText::new("Presets appear once a file has been inspected")
                    .color(egui::Color32::GRAY),
            );
            return;
        }

        if selection.is_fallback {
            banner(
                ui,
                egui::Color32::from_rgba_premultiplied(0, 100, 200, 30),
                egui::Color32::LIGHT_BLUE,
                "💡 Showing every preset",
                "The container could not be matched, so some presets may not suit this file.",
            );
            ui.add_space(8.0);
        }

        let presets = selection.presets.clone();
        let selected = selection.selected_preset.map(|preset| preset.id);
        let enabled = !selection.status.is_converting();
        let mut chosen = None;

        ui.add_enabled_ui(enabled, |ui| {
            egui::Grid::new("presets")
                .num_columns(3)
                .spacing([15.0, 8.0])
                .show(ui, |ui| {
                    for preset in presets {
                        let text = format!("{}  (.{})", preset.name, preset.output_extension);
                        if ui
                            .selectable_label(selected == Some(preset.id), text)
                            .on_hover_text(preset.description)
                            .clicked()
                        {
                            chosen = Some(preset.id);
                        }
                        ui.label(
                            egui::RichText::new(preset.category.to_string())
                                .small()
                                .color(egui::Color32::LIGHT_BLUE),
                        );
                        ui.label(
                            egui::RichText::new(preset.description)
                                .small()
                                .color(egui::Color32::GRAY),
                        );
                        ui.end_row();
                    }
                });
        });

        if let Some(id) = chosen {
            self.select_preset(id);
        }
    }

    fn show_conversion(&mut self, ui: &mut egui::Ui) {
        let selection = self.service.selection();

        egui::Grid::new("conversion_summary")
            .num_columns(2)
            .spacing([20.0, 8.0])
            .show(ui, |ui| {
                ui.label(egui::RichText::new("Status:").strong());
                ui.label(selection.status.label());
                ui.end_row();

                ui.label(egui::RichText::new("Preset:").strong());
                ui.label(selection.selected_preset.map(|p| p.name).unwrap_or("None"));
                ui.end_row();

                ui.label(egui::RichText::new("Output:").strong());
                match &selection.output_file {
                    Some(path) => ui.label(egui::RichText::new(path.display().to_string()).monospace()),
                    None => ui.label(
                        egui::RichText::new("Chosen next to the input when conversion starts")
                            .color(egui::Color32::GRAY),
                    ),
                };
                ui.end_row();
            });

        ui.add_space(10.0);

        match &selection.status {
            ConversionStatus::Converting {
                start_time,
                progress,
            } => {
                let bar = match progress.percentage {
                    Some(percentage) => egui::ProgressBar::new(percentage / 100.0)
                        .text(format!("{:.1}%", percentage)),
                    None => egui::ProgressBar::new(0.0).animate(true),
                };
                ui.add(bar.desired_width(500.0));

                let mut details = vec![format!("Elapsed {}s", start_time.elapsed().as_secs())];
                if !progress.time_elapsed.is_empty() {
                    details.push(format!("Position {}", progress.time_elapsed));
                }
                if progress.speed > 0.0 {
                    details.push(format!("{:.2}x", progress.speed));
                }
                if progress.fps > 0.0 {
                    details.push(format!("{:.1} fps", progress.fps));
                }
                if !progress.size.is_empty() {
                    details.push(progress.size.clone());
                }
                ui.label(egui::RichText::new(details.join(" • ")).color(egui::Color32::LIGHT_GRAY));
            }
            ConversionStatus::Succeeded {
                output_path,
                duration,
            } => banner(
                ui,
                egui::Color32::from_rgba_premultiplied(50, 200, 50, 50),
                egui::Color32::LIGHT_GREEN,
                "✅ Conversion complete",
                &format!(
                    "Saved {} in {:.1}s",
                    output_path.display(),
                    duration.as_secs_f32()
                ),
            ),
            ConversionStatus::Failed { error } => banner(
                ui,
                egui::Color32::from_rgba_premultiplied(200, 50, 50, 50),
                egui::Color32::LIGHT_RED,
                "❌ Conversion failed",
                error,
            ),
            _ => {}
        }

        if !selection.log.is_empty() {
            ui.add_space(10.0);
            egui::CollapsingHeader::new("Log")
                .default_open(true)
                .show(ui, |ui| {
                    egui::ScrollArea::vertical()
                        .id_source("process_log")
                        .max_height(200.0)
                        .stick_to_bottom(true)
                        .show(ui, |ui| {
                            ui.label(egui::RichText::new(selection.log.as_str()).monospace().size(12.0));
                        });
                });
        }
    }

    fn show_activity(&mut self, ui: &mut egui::Ui) {
        if self.activity.is_empty() {
            return;
        }

        egui::CollapsingHeader::new("Activity")
            .default_open(false)
            .show(ui, |ui| {
                for line in &self.activity {
                    ui.label(egui::RichText::new(line.as_str()).small().color(egui::Color32::GRAY));
                }
            });
    }

    fn show_main_controls(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.add_space(10.0);

            let convert_button = egui::Button::new(egui::RichText::new("🚀 Convert").size(16.0))
                .min_size(egui::vec2(180.0, 45.0));
            if ui.add_enabled(self.service.can_convert(), convert_button).clicked() {
                self.start_conversion();
            }

            ui.add_space(20.0);

            let clear_button = egui::Button::new(egui::RichText::new("🗑 Clear").size(16.0))
                .min_size(egui::vec2(120.0, 45.0));
            if ui
                .add_enabled(!self.service.is_transcoding(), clear_button)
                .clicked()
            {
                self.clear();
            }

            if let Some(notice) = &self.notice {
                ui.add_space(20.0);
                ui.label(egui::RichText::new(notice.as_str()).color(egui::Color32::YELLOW));
            }
        });
    }
}
