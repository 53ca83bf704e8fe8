use std::fs;

use chrono::Datelike;
use crossbeam_channel::{Receiver, Sender};
use eframe::egui;
use egui::TextureHandle;
use shared::domain::{FieldName, TextField, CONFIRMATION_ROUTE, DEFAULT_AVATAR_PATH, FORM_ROUTE};
use ticket_core::{
    capture::{first_dropped, PICKER_EXTENSIONS, PICKER_FILTER_NAME, UPLOAD_HINT},
    decode_data_url, AvatarFile, AvatarSrc, FormController, PreviewRegistry, Settings,
    TicketView, UploadZoneEffect, UploadZoneState, UploadZoneTarget,
};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{UiError, UiErrorContext, UiEvent};
use crate::controller::orchestration::dispatch_backend_command;
use crate::ui::textures::{decode_preview_image, upload_texture, PreviewTextures};

const ACCENT: egui::Color32 = egui::Color32::from_rgb(0xF5, 0x74, 0x63);
const ERROR_TEXT: egui::Color32 = egui::Color32::from_rgb(0xF5, 0x74, 0x63);
const CARD_FILL: egui::Color32 = egui::Color32::from_rgb(0x1C, 0x17, 0x3C);
const ZONE_STROKE: egui::Color32 = egui::Color32::from_rgb(0x87, 0x84, 0xA4);
const ZONE_STROKE_ACTIVE: egui::Color32 = egui::Color32::from_rgb(0xD1, 0xD0, 0xD5);
const AVATAR_PREVIEW_SIZE: f32 = 64.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppViewState {
    Form,
    Confirmation,
}

impl AppViewState {
    pub fn from_route(path: &str) -> Option<Self> {
        match path {
            FORM_ROUTE => Some(Self::Form),
            CONFIRMATION_ROUTE => Some(Self::Confirmation),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
struct StatusBanner {
    message: String,
}

pub struct TicketApp {
    cmd_tx: Sender<BackendCommand>,
    ui_rx: Receiver<UiEvent>,
    settings: Settings,

    view_state: AppViewState,
    previews: PreviewRegistry,
    form: FormController,
    preview_textures: PreviewTextures,

    ticket: Option<TicketView>,
    ticket_avatar: Option<TextureHandle>,
    ticket_avatar_stale: bool,

    status: String,
    status_banner: Option<StatusBanner>,
    backend_available: bool,
    theme_applied: bool,
}

impl TicketApp {
    pub fn new(
        cmd_tx: Sender<BackendCommand>,
        ui_rx: Receiver<UiEvent>,
        settings: Settings,
        initial_view: AppViewState,
    ) -> Self {
        let previews = PreviewRegistry::new();
        let form = FormController::new(previews.clone())
            .with_avatar_required(settings.avatar_required);
        let mut app = Self {
            cmd_tx,
            ui_rx,
            settings,
            view_state: AppViewState::Form,
            previews,
            form,
            preview_textures: PreviewTextures::default(),
            ticket: None,
            ticket_avatar: None,
            ticket_avatar_stale: false,
            status: String::new(),
            status_banner: None,
            backend_available: true,
            theme_applied: false,
        };
        app.enter_view(initial_view);
        app
    }

    fn enter_view(&mut self, view: AppViewState) {
        self.view_state = view;
        if view == AppViewState::Confirmation {
            dispatch_backend_command(&self.cmd_tx, BackendCommand::LoadTicket, &mut self.status);
        }
    }

    fn navigate(&mut self, path: &str) {
        match AppViewState::from_route(path) {
            Some(view) => {
                tracing::info!(route = path, "navigating");
                self.enter_view(view);
            }
            None => tracing::warn!(route = path, "ignoring navigation to unknown route"),
        }
    }

    fn reset_form(&mut self) {
        // Dropping the old controller releases its preview handle.
        self.form = FormController::new(self.previews.clone())
            .with_avatar_required(self.settings.avatar_required);
    }

    fn process_ui_events(&mut self) {
        while let Ok(event) = self.ui_rx.try_recv() {
            match event {
                UiEvent::Info(message) => {
                    self.status = message;
                }
                UiEvent::Error(err) => self.show_error(err),
                UiEvent::Navigate(path) => self.navigate(&path),
                UiEvent::SubmissionFinished(result) => {
                    self.form.complete_submission(&result);
                    if result.is_ok() {
                        self.status = "Ticket generated".to_string();
                    }
                }
                UiEvent::TicketLoaded(view) => {
                    self.ticket = Some(view);
                    self.ticket_avatar = None;
                    self.ticket_avatar_stale = true;
                }
            }
        }
    }

    fn show_error(&mut self, err: UiError) {
        tracing::warn!(
            category = ?err.category(),
            context = ?err.context(),
            message = err.message(),
            "ui error"
        );
        if err.is_fatal() {
            self.backend_available = false;
        }
        self.status_banner = Some(StatusBanner {
            message: match err.context() {
                UiErrorContext::BackendStartup => {
                    format!("Ticket storage is unavailable: {}", err.message())
                }
                UiErrorContext::PickAvatar => {
                    format!("Could not use that file: {}", err.message())
                }
                _ => err.message().to_string(),
            },
        });
    }

    fn apply_theme_if_needed(&mut self, ctx: &egui::Context) {
        if self.theme_applied {
            return;
        }
        let mut style = (*ctx.style()).clone();
        style.visuals = egui::Visuals::dark();
        style.visuals.panel_fill = egui::Color32::from_rgb(0x0D, 0x08, 0x2D);
        style.visuals.selection.bg_fill = ACCENT;
        style.visuals.widgets.inactive.bg_stroke =
            egui::Stroke::new(1.0, style.visuals.widgets.noninteractive.bg_stroke.color);
        style.visuals.widgets.active.bg_stroke = egui::Stroke::new(1.2, ACCENT);
        style.spacing.item_spacing = egui::vec2(8.0, 6.0);
        style.spacing.button_padding = egui::vec2(10.0, 6.0);
        ctx.set_style(style);
        self.theme_applied = true;
    }

    fn show_status_banner(&mut self, ui: &mut egui::Ui) {
        if let Some(banner) = self.status_banner.clone() {
            egui::Frame::NONE
                .fill(egui::Color32::from_rgb(111, 53, 53))
                .stroke(egui::Stroke::new(1.0, egui::Color32::from_rgb(175, 96, 96)))
                .corner_radius(8.0)
                .inner_margin(egui::Margin::symmetric(10, 8))
                .show(ui, |ui| {
                    ui.horizontal_wrapped(|ui| {
                        ui.label(egui::RichText::new(&banner.message).color(egui::Color32::WHITE));
                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                            if ui.button("Dismiss").clicked() {
                                self.status_banner = None;
                            }
                        });
                    });
                });
            ui.add_space(8.0);
        }
    }

    // ---------- Form ----------

    fn collect_dropped_files(&mut self, ctx: &egui::Context) {
        let (hovering, dropped) = ctx.input(|i| {
            (
                !i.raw.hovered_files.is_empty(),
                i.raw.dropped_files.clone(),
            )
        });
        self.form.set_drag_hover(hovering);
        if dropped.is_empty() {
            return;
        }

        let file = first_dropped(dropped).and_then(|dropped| {
            match (dropped.path, dropped.bytes) {
                (Some(path), _) => match AvatarFile::from_path(&path) {
                    Ok(file) => Some(file.with_mime_type(dropped.mime)),
                    Err(err) => {
                        self.show_error(UiError::from_message(
                            UiErrorContext::PickAvatar,
                            err.to_string(),
                        ));
                        None
                    }
                },
                (None, Some(bytes)) => {
                    Some(AvatarFile::from_bytes(dropped.name, dropped.mime, bytes))
                }
                (None, None) => None,
            }
        });
        self.form.accept_drop(file);
    }

    fn open_avatar_picker(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter(PICKER_FILTER_NAME, &PICKER_EXTENSIONS)
            .pick_file()
        else {
            return;
        };
        match AvatarFile::from_path(&path) {
            Ok(file) => self.form.set_avatar(Some(file)),
            Err(err) => self.show_error(UiError::from_message(
                UiErrorContext::PickAvatar,
                err.to_string(),
            )),
        }
    }

    fn apply_zone_click(&mut self, target: UploadZoneTarget) {
        if self.form.handle_zone_click(target) == UploadZoneEffect::OpenPicker {
            self.open_avatar_picker();
        }
    }

    fn try_submit(&mut self) {
        if !self.backend_available {
            return;
        }
        // Rejections leave their messages under the fields.
        if let Ok(pending) = self.form.prepare_submission() {
            let queued = dispatch_backend_command(
                &self.cmd_tx,
                BackendCommand::Submit(pending),
                &mut self.status,
            );
            if !queued {
                self.form.complete_submission(&Err(ticket_core::SubmitError::Store(
                    anyhow::anyhow!("backend worker unavailable"),
                )));
            }
        }
    }

    fn show_field_error(&self, ui: &mut egui::Ui, field: FieldName) {
        let message = self.form.error(field);
        if !message.is_empty() {
            ui.label(egui::RichText::new(message).color(ERROR_TEXT).small());
        }
    }

    fn form_text_field(
        &mut self,
        ui: &mut egui::Ui,
        field: TextField,
        label: &str,
        hint: &str,
    ) -> egui::Response {
        ui.add_space(10.0);
        ui.label(egui::RichText::new(label).strong().size(16.0));
        let mut value = self.form.draft().text(field).to_string();
        let edit = egui::TextEdit::singleline(&mut value)
            .id_salt(field.as_str())
            .hint_text(
                egui::RichText::new(hint)
                    .color(ui.visuals().weak_text_color().gamma_multiply(0.85)),
            )
            .desired_width(f32::INFINITY);
        let response = ui.add_sized([ui.available_width(), 36.0], edit);
        if response.changed() {
            self.form.update_field(field, value);
        }
        self.show_field_error(ui, field.into());
        response
    }

    fn show_upload_zone(&mut self, ui: &mut egui::Ui) {
        ui.label(egui::RichText::new("Upload Avatar").strong().size(16.0));

        let zone_state = self.form.zone_state();
        let highlighted = self.form.is_drag_hovering();
        let stroke_color = if highlighted {
            ZONE_STROKE_ACTIVE
        } else {
            ZONE_STROKE
        };

        let mut clicked_target = None;
        let zone = egui::Frame::NONE
            .fill(egui::Color32::from_white_alpha(if highlighted { 24 } else { 12 }))
            .stroke(egui::Stroke::new(1.5, stroke_color))
            .corner_radius(12.0)
            .inner_margin(egui::Margin::symmetric(16, 18))
            .show(ui, |ui| {
                ui.set_width(ui.available_width());
                ui.vertical_centered(|ui| match zone_state {
                    UploadZoneState::Empty => {
                        ui.label(egui::RichText::new("⬆").size(28.0));
                        ui.label("Drag and drop or click to upload");
                    }
                    UploadZoneState::Previewing => {
                        self.show_avatar_preview(ui);
                        ui.add_space(8.0);
                        ui.horizontal(|ui| {
                            let buttons_width = 200.0;
                            ui.add_space(((ui.available_width() - buttons_width) / 2.0).max(0.0));
                            if ui.small_button("Remove image").clicked() {
                                clicked_target = Some(UploadZoneTarget::Remove);
                            }
                            if ui.small_button("Change").clicked() {
                                clicked_target = Some(UploadZoneTarget::Change);
                            }
                        });
                    }
                });
            });

        // Only the empty zone is clickable as a whole, so button clicks never
        // reach it.
        if zone_state == UploadZoneState::Empty {
            let response = zone
                .response
                .interact(egui::Sense::click())
                .on_hover_cursor(egui::CursorIcon::PointingHand);
            if response.clicked() {
                clicked_target = Some(UploadZoneTarget::Zone);
            }
        }

        if let Some(target) = clicked_target {
            self.apply_zone_click(target);
        }

        ui.horizontal(|ui| {
            ui.label(egui::RichText::new("ℹ").weak());
            ui.label(egui::RichText::new(UPLOAD_HINT).weak().small());
        });
        self.show_field_error(ui, FieldName::Avatar);
    }

    fn show_avatar_preview(&mut self, ui: &mut egui::Ui) {
        let Some(url) = self.form.preview_url().map(str::to_string) else {
            return;
        };
        let ctx = ui.ctx().clone();
        match self.preview_textures.texture_for(&ctx, &self.previews, &url) {
            Some(texture) => {
                ui.add(
                    egui::Image::new(egui::load::SizedTexture::from_handle(texture))
                        .fit_to_exact_size(egui::vec2(AVATAR_PREVIEW_SIZE, AVATAR_PREVIEW_SIZE))
                        .corner_radius(12.0),
                );
            }
            None => {
                let name = self
                    .form
                    .draft()
                    .avatar
                    .as_ref()
                    .map(|file| file.name().to_string())
                    .unwrap_or_default();
                ui.label(egui::RichText::new(name).italics());
            }
        }
    }

    fn show_form_screen(&mut self, ctx: &egui::Context) {
        self.collect_dropped_files(ctx);
        self.preview_textures.prune(&self.previews);

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                let avail = ui.available_size();
                let card_width = avail.x.clamp(360.0, 520.0);
                ui.add_space((avail.y * 0.04).clamp(12.0, 40.0));

                ui.vertical_centered(|ui| {
                    ui.set_width(card_width);
                    ui.heading(
                        egui::RichText::new(format!(
                            "Your Journey to {} {} Starts Here!",
                            self.settings.event.name,
                            self.settings.event.date.year()
                        ))
                        .strong()
                        .size(28.0),
                    );
                    ui.label(
                        egui::RichText::new(
                            "Secure your spot at next year's biggest coding conference.",
                        )
                        .weak(),
                    );
                    ui.add_space(16.0);
                    self.show_status_banner(ui);

                    ui.with_layout(egui::Layout::top_down(egui::Align::Min), |ui| {
                        self.show_upload_zone(ui);

                        let name = self.form_text_field(
                            ui,
                            TextField::FullName,
                            "Full Name",
                            "e.g. John Doe",
                        );
                        let email = self.form_text_field(
                            ui,
                            TextField::Email,
                            "Email Address",
                            "example@email.com",
                        );
                        let github = self.form_text_field(
                            ui,
                            TextField::GithubUsername,
                            "GitHub Username",
                            "@yourusername",
                        );

                        let enter_pressed = ctx.input(|i| i.key_pressed(egui::Key::Enter));
                        let field_focused =
                            name.lost_focus() || email.lost_focus() || github.lost_focus();
                        if enter_pressed && field_focused {
                            self.try_submit();
                        }

                        ui.add_space(16.0);
                        let busy = self.form.is_submitting();
                        let label = if busy {
                            "Generating…"
                        } else {
                            "Generate My Ticket"
                        };
                        let button = egui::Button::new(
                            egui::RichText::new(label)
                                .strong()
                                .size(18.0)
                                .color(egui::Color32::from_rgb(0x0D, 0x08, 0x2D)),
                        )
                        .fill(ACCENT)
                        .min_size(egui::vec2(ui.available_width(), 48.0));
                        if ui
                            .add_enabled(!busy && self.backend_available, button)
                            .clicked()
                        {
                            self.try_submit();
                        }

                        if let Some(status) = self.form.status() {
                            ui.label(egui::RichText::new(status).color(ERROR_TEXT));
                        }
                    });
                });
            });
        });
    }

    // ---------- Confirmation ----------

    fn refresh_ticket_avatar(&mut self, ctx: &egui::Context) {
        if !self.ticket_avatar_stale {
            return;
        }
        self.ticket_avatar_stale = false;
        let Some(ticket) = &self.ticket else {
            return;
        };

        let bytes = match &ticket.avatar {
            AvatarSrc::Embedded(url) => decode_data_url(url).map(|(_, bytes)| bytes),
            AvatarSrc::Default => {
                let path = self.settings.resolve_asset(DEFAULT_AVATAR_PATH);
                fs::read(&path)
                    .map_err(|err| {
                        tracing::debug!(
                            path = %path.display(),
                            error = %err,
                            "default avatar asset missing"
                        );
                    })
                    .ok()
            }
        };

        self.ticket_avatar = bytes
            .and_then(|bytes| decode_preview_image(&bytes).ok())
            .map(|image| upload_texture(ctx, "ticket-avatar", &image));
    }

    fn show_confirmation_screen(&mut self, ctx: &egui::Context) {
        self.refresh_ticket_avatar(ctx);

        egui::CentralPanel::default().show(ctx, |ui| {
            let avail = ui.available_size();
            let card_width = avail.x.clamp(360.0, 560.0);
            ui.add_space((avail.y * 0.06).clamp(12.0, 60.0));

            ui.vertical_centered(|ui| {
                ui.set_width(card_width);
                self.show_status_banner(ui);

                let Some(ticket) = self.ticket.clone() else {
                    ui.spinner();
                    return;
                };

                ui.heading(egui::RichText::new(ticket.headline()).strong().size(30.0));
                ui.add_space(8.0);
                ui.label(egui::RichText::new(ticket.email_notice()).size(16.0));
                ui.add_space(28.0);

                egui::Frame::NONE
                    .fill(CARD_FILL)
                    .stroke(egui::Stroke::new(1.0, ZONE_STROKE))
                    .corner_radius(14.0)
                    .inner_margin(egui::Margin::symmetric(20, 18))
                    .show(ui, |ui| {
                        ui.set_width(ui.available_width());
                        ui.with_layout(egui::Layout::top_down(egui::Align::Min), |ui| {
                            ui.horizontal(|ui| {
                                ui.vertical(|ui| {
                                    ui.label(
                                        egui::RichText::new(&ticket.event.name)
                                            .strong()
                                            .size(22.0),
                                    );
                                    ui.label(egui::RichText::new(ticket.event_line()).weak());
                                });
                                ui.with_layout(
                                    egui::Layout::right_to_left(egui::Align::Center),
                                    |ui| {
                                        ui.label(
                                            egui::RichText::new(&ticket.event.ticket_number)
                                                .weak()
                                                .size(20.0),
                                        );
                                    },
                                );
                            });
                            ui.add_space(24.0);
                            ui.horizontal(|ui| {
                                self.show_ticket_avatar(ui, &ticket);
                                ui.vertical(|ui| {
                                    ui.label(
                                        egui::RichText::new(ticket.name.full()).size(20.0),
                                    );
                                    ui.label(
                                        egui::RichText::new(&ticket.github_username).weak(),
                                    );
                                });
                            });
                        });
                    });

                ui.add_space(20.0);
                if ui.button("Start over").clicked() {
                    self.reset_form();
                    self.ticket = None;
                    self.ticket_avatar = None;
                    dispatch_backend_command(
                        &self.cmd_tx,
                        BackendCommand::ClearTicket,
                        &mut self.status,
                    );
                }
            });
        });
    }

    fn show_ticket_avatar(&self, ui: &mut egui::Ui, ticket: &TicketView) {
        let size = egui::vec2(AVATAR_PREVIEW_SIZE, AVATAR_PREVIEW_SIZE);
        if let Some(texture) = &self.ticket_avatar {
            ui.add(
                egui::Image::new(egui::load::SizedTexture::from_handle(texture))
                    .fit_to_exact_size(size)
                    .corner_radius(12.0),
            );
            return;
        }

        let (rect, _) = ui.allocate_exact_size(size, egui::Sense::hover());
        ui.painter().rect_filled(rect, 12.0, ACCENT.gamma_multiply(0.6));
        ui.painter().text(
            rect.center(),
            egui::Align2::CENTER_CENTER,
            initials(&ticket.name.first_name, &ticket.name.last_name),
            egui::FontId::proportional(24.0),
            egui::Color32::WHITE,
        );
    }
}

fn initials(first_name: &str, last_name: &str) -> String {
    [first_name, last_name]
        .iter()
        .filter_map(|part| part.chars().next())
        .flat_map(char::to_uppercase)
        .collect()
}

impl eframe::App for TicketApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_ui_events();
        self.apply_theme_if_needed(ctx);

        if !self.status.is_empty() {
            egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
                ui.label(egui::RichText::new(&self.status).weak().small());
            });
        }

        match self.view_state {
            AppViewState::Form => self.show_form_screen(ctx),
            AppViewState::Confirmation => self.show_confirmation_screen(ctx),
        }

        if self.form.is_submitting() || self.form.is_drag_hovering() {
            ctx.request_repaint_after(std::time::Duration::from_millis(16));
        } else {
            ctx.request_repaint_after(std::time::Duration::from_millis(100));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_known_routes_to_views() {
        assert_eq!(AppViewState::from_route("/"), Some(AppViewState::Form));
        assert_eq!(
            AppViewState::from_route("/success"),
            Some(AppViewState::Confirmation)
        );
        assert_eq!(AppViewState::from_route("/elsewhere"), None);
    }

    #[test]
    fn initials_tolerate_missing_surname() {
        assert_eq!(initials("ada", "lovelace"), "AL");
        assert_eq!(initials("Madonna", ""), "M");
        assert_eq!(initials("", ""), "");
    }
}
