use client_core::{form::LoadState, EmailStatus, ReservationForm, Settings};
use crossbeam_channel::{Receiver, Sender};
use eframe::egui;
use shared::domain::TransactionAction;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{classify_backend_failure, UiErrorCategory, UiEvent};
use crate::controller::orchestration::{dispatch_backend_command, dispatch_effect};

const ERROR_TEXT: egui::Color32 = egui::Color32::from_rgb(220, 90, 90);
const WARNING_TEXT: egui::Color32 = egui::Color32::from_rgb(214, 158, 46);

#[derive(Debug, Clone)]
pub struct StartupConfig {
    /// Item id or `/item/{id}` route; `None` renders the missing-id error.
    pub route: Option<String>,
    pub settings: Settings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StatusBannerSeverity {
    Error,
    Success,
}

#[derive(Debug, Clone)]
struct StatusBanner {
    severity: StatusBannerSeverity,
    message: String,
}

fn err_label(category: UiErrorCategory) -> &'static str {
    match category {
        UiErrorCategory::Transport => "Transport",
        UiErrorCategory::Validation => "Validation",
        UiErrorCategory::Unknown => "Unexpected",
    }
}

pub struct ReservationApp {
    cmd_tx: Sender<BackendCommand>,
    ui_rx: Receiver<UiEvent>,

    form: ReservationForm,
    server_url: String,

    status: String,
    /// Worker-level failures; form errors live in `form`.
    status_banner: Option<StatusBanner>,
}

impl ReservationApp {
    pub fn bootstrap(
        cmd_tx: Sender<BackendCommand>,
        ui_rx: Receiver<UiEvent>,
        startup: StartupConfig,
    ) -> Self {
        let mut form = ReservationForm::new(&startup.settings);
        let mut status = "Starting".to_string();
        let effect = form.mount(startup.route.as_deref());
        dispatch_effect(&cmd_tx, effect, &mut status);

        Self {
            cmd_tx,
            ui_rx,
            form,
            server_url: startup.settings.server_url,
            status,
            status_banner: None,
        }
    }

    fn process_ui_events(&mut self) {
        while let Ok(event) = self.ui_rx.try_recv() {
            match event {
                UiEvent::Info(message) => {
                    self.status = message;
                }
                UiEvent::Outcome(outcome) => {
                    let follow_up = self.form.apply(outcome);
                    dispatch_effect(&self.cmd_tx, follow_up, &mut self.status);
                }
                UiEvent::Error(err) => {
                    tracing::error!(context = ?err.context(), "{}", err.message());
                    self.status = format!("{} error: {}", err_label(err.category()), err.message());
                    self.status_banner = Some(StatusBanner {
                        severity: StatusBannerSeverity::Error,
                        message: classify_backend_failure(err.message()),
                    });
                }
            }
        }
    }

    fn show_banner(ui: &mut egui::Ui, banner: &StatusBanner) -> bool {
        let (fill, stroke) = match banner.severity {
            StatusBannerSeverity::Error => (
                egui::Color32::from_rgb(111, 53, 53),
                egui::Stroke::new(1.0, egui::Color32::from_rgb(175, 96, 96)),
            ),
            StatusBannerSeverity::Success => (
                egui::Color32::from_rgb(44, 92, 62),
                egui::Stroke::new(1.0, egui::Color32::from_rgb(90, 160, 110)),
            ),
        };

        let mut dismissed = false;
        egui::Frame::NONE
            .fill(fill)
            .stroke(stroke)
            .corner_radius(8.0)
            .inner_margin(egui::Margin::symmetric(10, 8))
            .show(ui, |ui| {
                ui.horizontal_wrapped(|ui| {
                    ui.label(egui::RichText::new(&banner.message).color(egui::Color32::WHITE));
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.button("Dismiss").clicked() {
                            dismissed = true;
                        }
                    });
                });
            });
        dismissed
    }

    fn show_banners(&mut self, ui: &mut egui::Ui) {
        if let Some(banner) = self.status_banner.clone() {
            if Self::show_banner(ui, &banner) {
                self.status_banner = None;
            }
        }
        if let Some(message) = self.form.error().map(str::to_string) {
            let banner = StatusBanner {
                severity: StatusBannerSeverity::Error,
                message,
            };
            if Self::show_banner(ui, &banner) {
                self.form.dismiss_error();
            }
        }
        if let Some(message) = self.form.notice().map(str::to_string) {
            let banner = StatusBanner {
                severity: StatusBannerSeverity::Success,
                message,
            };
            if Self::show_banner(ui, &banner) {
                self.form.dismiss_notice();
            }
        }
    }

    fn form_text_field(
        ui: &mut egui::Ui,
        id: &'static str,
        label: &str,
        hint: &str,
        value: &mut String,
        editable: bool,
    ) -> egui::Response {
        ui.label(egui::RichText::new(label).strong());
        let edit = egui::TextEdit::singleline(value)
            .id_salt(id)
            .hint_text(
                egui::RichText::new(hint)
                    .color(ui.visuals().weak_text_color().gamma_multiply(0.85)),
            )
            .interactive(editable)
            .desired_width(f32::INFINITY);
        ui.add_sized([ui.available_width(), 30.0], edit)
    }

    fn field_message(ui: &mut egui::Ui, color: egui::Color32, message: &str) {
        ui.label(egui::RichText::new(message).small().color(color));
    }

    fn show_email_section(&mut self, ui: &mut egui::Ui) {
        let mut email_buf = self.form.requester().email.clone();
        let response = Self::form_text_field(
            ui,
            "reservation_email",
            "Email",
            "you@example.org",
            &mut email_buf,
            true,
        );
        if response.changed() {
            self.form.set_email(&email_buf);
        }
        if response.lost_focus() {
            let effect = self.form.blur_email();
            dispatch_effect(&self.cmd_tx, effect, &mut self.status);
        }

        if let Some(notice) = self.form.email_notice() {
            Self::field_message(ui, WARNING_TEXT, notice);
        }
        if let Some(err) = self.form.email_error() {
            Self::field_message(ui, ERROR_TEXT, &err.to_string());
        }
        if self.form.email_status() == EmailStatus::Checking {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.weak("Checking email...");
            });
        }
    }

    fn show_requester_names(&mut self, ui: &mut egui::Ui) {
        let editable = self.form.names_editable();

        let mut first_name_buf = self.form.requester().first_name.clone();
        let response = Self::form_text_field(
            ui,
            "reservation_first_name",
            "First name",
            "",
            &mut first_name_buf,
            editable,
        );
        if response.changed() {
            self.form.set_first_name(&first_name_buf);
        }

        let mut last_name_buf = self.form.requester().last_name.clone();
        let response = Self::form_text_field(
            ui,
            "reservation_last_name",
            "Last name",
            "",
            &mut last_name_buf,
            editable,
        );
        if response.changed() {
            self.form.set_last_name(&last_name_buf);
        }

        if self.form.registration_visible() {
            let registering = self.form.is_registering();
            let label = if registering {
                "Processing..."
            } else {
                "Validate email address"
            };
            let button = egui::Button::new(egui::RichText::new(label).strong())
                .fill(egui::Color32::from_rgb(46, 125, 70))
                .min_size(egui::vec2(ui.available_width(), 34.0));
            if ui.add_enabled(!registering, button).clicked() {
                let effect = self.form.register();
                dispatch_effect(&self.cmd_tx, effect, &mut self.status);
            }
        }
    }

    fn show_item_section(&mut self, ui: &mut egui::Ui) {
        let (mut name, mut location, remaining) = match self.form.item() {
            Some(item) => (
                item.name.clone(),
                item.location.clone(),
                item.remaining_quantity,
            ),
            None => (String::new(), String::new(), 0),
        };
        Self::form_text_field(ui, "reservation_item", "Item", "", &mut name, false);
        Self::form_text_field(ui, "reservation_room", "Room", "", &mut location, false);

        ui.label(egui::RichText::new("Action").strong());
        let mut action = self.form.action();
        egui::ComboBox::from_id_salt("reservation_action")
            .selected_text(action.label())
            .width(ui.available_width())
            .show_ui(ui, |ui| {
                for candidate in TransactionAction::ALL {
                    ui.selectable_value(&mut action, candidate, candidate.label());
                }
            });
        if action != self.form.action() {
            self.form.set_action(action);
        }

        let mut quantity_buf = self.form.quantity_input().to_string();
        let response = Self::form_text_field(
            ui,
            "reservation_quantity",
            "Quantity",
            "1",
            &mut quantity_buf,
            true,
        );
        if response.changed() {
            self.form.set_quantity_input(&quantity_buf);
        }
        if let Some(err) = self.form.quantity_error() {
            Self::field_message(ui, ERROR_TEXT, &err.to_string());
        }
        ui.weak(format!("Remaining quantity: {remaining}"));
    }

    fn show_submit_row(&mut self, ui: &mut egui::Ui) {
        let label = if self.form.is_submitting() {
            "Processing..."
        } else {
            "Submit"
        };
        let button = egui::Button::new(egui::RichText::new(label).strong().size(16.0))
            .min_size(egui::vec2(ui.available_width(), 40.0));
        if ui.add_enabled(self.form.submit_enabled(), button).clicked() {
            let effect = self.form.submit();
            dispatch_effect(&self.cmd_tx, effect, &mut self.status);
        }
    }

    fn show_reservation_screen(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let avail = ui.available_size();
            let card_width = avail.x.clamp(380.0, 520.0);
            ui.add_space((avail.y * 0.04).clamp(8.0, 40.0));

            ui.vertical_centered(|ui| {
                ui.set_width(card_width);
                egui::Frame::NONE
                    .fill(ui.visuals().faint_bg_color)
                    .corner_radius(14.0)
                    .stroke(egui::Stroke::new(
                        1.0,
                        ui.visuals().widgets.noninteractive.bg_stroke.color,
                    ))
                    .inner_margin(egui::Margin::symmetric(20, 18))
                    .show(ui, |ui| {
                        ui.style_mut().spacing.item_spacing = egui::vec2(8.0, 6.0);
                        ui.heading("Item Reservation");
                        ui.add_space(6.0);

                        if let Some(message) = self.form.fatal_error() {
                            ui.colored_label(ERROR_TEXT, message);
                            return;
                        }
                        if self.form.load_state() == &LoadState::Loading {
                            ui.horizontal(|ui| {
                                ui.spinner();
                                ui.weak("Loading item...");
                            });
                            if let Some(banner) = self.status_banner.clone() {
                                if Self::show_banner(ui, &banner) {
                                    self.status_banner = None;
                                }
                            }
                            return;
                        }

                        self.show_banners(ui);
                        self.show_email_section(ui);
                        self.show_requester_names(ui);
                        ui.separator();
                        self.show_item_section(ui);
                        ui.add_space(8.0);
                        self.show_submit_row(ui);
                    });

                ui.add_space(8.0);
                ui.horizontal_wrapped(|ui| {
                    ui.small("Server:");
                    ui.small(egui::RichText::new(&self.server_url).weak());
                    ui.small("Status:");
                    ui.small(egui::RichText::new(&self.status).weak());
                });
            });
        });
    }
}

impl eframe::App for ReservationApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_ui_events();
        self.show_reservation_screen(ctx);
        ctx.request_repaint_after(std::time::Duration::from_millis(100));
    }
}

impl Drop for ReservationApp {
    fn drop(&mut self) {
        dispatch_backend_command(&self.cmd_tx, BackendCommand::Shutdown, &mut self.status);
    }
}

#[cfg(test)]
mod tests {
    use client_core::{FormEffect, FormOutcome};
    use crossbeam_channel::bounded;
    use shared::domain::{Item, ItemId};

    use super::*;

    fn startup(route: Option<&str>) -> StartupConfig {
        StartupConfig {
            route: route.map(str::to_string),
            settings: Settings::default(),
        }
    }

    #[test]
    fn bootstrap_queues_item_load_for_route() {
        let (cmd_tx, cmd_rx) = bounded(8);
        let (_ui_tx, ui_rx) = bounded(8);
        let app = ReservationApp::bootstrap(cmd_tx, ui_rx, startup(Some("/item/42")));

        match cmd_rx.try_recv() {
            Ok(BackendCommand::Perform(FormEffect::LoadItem(id))) => assert_eq!(id.as_str(), "42"),
            _ => panic!("expected a queued item load"),
        }
        assert_eq!(app.form.fatal_error(), None);
    }

    #[test]
    fn bootstrap_without_route_queues_nothing() {
        let (cmd_tx, cmd_rx) = bounded(8);
        let (_ui_tx, ui_rx) = bounded(8);
        let app = ReservationApp::bootstrap(cmd_tx, ui_rx, startup(None));

        assert!(cmd_rx.try_recv().is_err());
        assert_eq!(app.form.fatal_error(), Some("Item ID not found."));
    }

    #[test]
    fn outcomes_from_worker_update_form() {
        let (cmd_tx, _cmd_rx) = bounded(8);
        let (ui_tx, ui_rx) = bounded(8);
        let mut app = ReservationApp::bootstrap(cmd_tx, ui_rx, startup(Some("42")));

        let id = ItemId::parse("42").expect("id");
        ui_tx
            .try_send(UiEvent::Outcome(FormOutcome::ItemLoaded {
                id: id.clone(),
                result: Ok(Item {
                    id,
                    name: "Drill".into(),
                    location: "Lab A".into(),
                    remaining_quantity: 5,
                }),
            }))
            .expect("send");
        ui_tx
            .try_send(UiEvent::Info("Connected".into()))
            .expect("send");
        app.process_ui_events();

        assert_eq!(app.form.load_state(), &LoadState::Ready);
        assert_eq!(app.form.item().map(|item| item.name.as_str()), Some("Drill"));
        assert_eq!(app.status, "Connected");
    }
}
