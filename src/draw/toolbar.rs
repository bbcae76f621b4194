use crate::draw::messages::Command;
use crate::draw::model::{Color, Mode, MAX_LINE_WIDTH, MAX_OPACITY, MIN_LINE_WIDTH};
use crate::draw::status::{ControlPanelView, StatusBarView};
use eframe::egui::{self, Color32, RichText, Stroke};

pub const QUICK_COLORS: [Color; 12] = [
    Color::rgb(0xff, 0xff, 0xff).with_uppercase_hex(),
    Color::rgb(0x00, 0x00, 0x00),
    Color::rgb(0x1a, 0xbc, 0x9c),
    Color::rgb(0x2e, 0xcc, 0x71),
    Color::rgb(0x34, 0x98, 0xdb),
    Color::rgb(0x9b, 0x59, 0xb6),
    Color::rgb(0x34, 0x49, 0x5e),
    Color::rgb(0xf1, 0xc4, 0x0f),
    Color::rgb(0xe6, 0x7e, 0x22),
    Color::rgb(0xe7, 0x4c, 0x3c),
    Color::rgb(0xec, 0xf0, 0xf1),
    Color::rgb(0x95, 0xa5, 0xa6),
];

/// What the user asked for through the control panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolbarAction {
    /// Goes onto the command bus.
    Submit(Command),
    SetSeparate(bool),
}

/// Panel-local widget state that is not part of the engine.
#[derive(Debug, Clone, Default)]
pub struct ToolbarState {
    pub text_entry: String,
}

pub fn to_color32(color: Color) -> Color32 {
    Color32::from_rgb(color.r, color.g, color.b)
}

/// Quick color click: primary sets the stroke color, secondary the background.
pub fn quick_color_command(index: usize, secondary: bool) -> Option<Command> {
    let color = *QUICK_COLORS.get(index)?;
    Some(if secondary {
        Command::Background(color)
    } else {
        Command::Color(color)
    })
}

fn mode_label(mode: Mode) -> &'static str {
    match mode {
        Mode::Pen => "Pen",
        Mode::Eraser => "Eraser",
        Mode::Rectangle => "Rectangle",
        Mode::Ellipse => "Ellipse",
        Mode::Arrow => "Arrow",
        Mode::Text => "Text",
    }
}

/// Menu bar of the inline layout.
pub fn menu_bar_ui(ui: &mut egui::Ui, view: &ControlPanelView) -> Vec<ToolbarAction> {
    let mut actions = Vec::new();
    egui::menu::bar(ui, |ui| {
        ui.menu_button("Mode", |ui| {
            for mode in Mode::ALL {
                if ui
                    .selectable_label(view.active_mode == mode, mode_label(mode))
                    .clicked()
                {
                    actions.push(ToolbarAction::Submit(Command::Mode(mode)));
                    ui.close_menu();
                }
            }
        });
        ui.menu_button("Edit", |ui| {
            if ui.button("Undo  (Ctrl+Z)").clicked() {
                actions.push(ToolbarAction::Submit(Command::Undo));
                ui.close_menu();
            }
            if ui.button("Wipe  (Ctrl+W)").clicked() {
                actions.push(ToolbarAction::Submit(Command::Wipe));
                ui.close_menu();
            }
            let mut fill = view.fill_enabled;
            if ui.checkbox(&mut fill, "Fill shapes").changed() {
                actions.push(ToolbarAction::Submit(Command::Fill(fill)));
            }
        });
        ui.menu_button("Colors", |ui| {
            actions.extend(quick_colors_ui(ui));
        });
        ui.menu_button("View", |ui| {
            let mut separate = view.separate;
            if ui
                .checkbox(&mut separate, "Separate control window (on restart)")
                .changed()
            {
                actions.push(ToolbarAction::SetSeparate(separate));
            }
        });
    });
    actions
}

fn quick_colors_ui(ui: &mut egui::Ui) -> Vec<ToolbarAction> {
    let mut actions = Vec::new();
    ui.horizontal_wrapped(|ui| {
        for (index, color) in QUICK_COLORS.iter().enumerate() {
            let button = egui::Button::new("   ")
                .fill(to_color32(*color))
                .stroke(Stroke::new(1.0, Color32::DARK_GRAY));
            let response = ui.add(button).on_hover_text(format!(
                "{color}: click for stroke, right-click for background"
            ));
            let command = if response.clicked() {
                quick_color_command(index, false)
            } else if response.secondary_clicked() {
                quick_color_command(index, true)
            } else {
                None
            };
            actions.extend(command.map(ToolbarAction::Submit));
        }
    });
    actions
}

/// Full control panel: tools, colors, sliders and the text entry.
pub fn control_panel_ui(
    ui: &mut egui::Ui,
    view: &ControlPanelView,
    state: &mut ToolbarState,
) -> Vec<ToolbarAction> {
    let mut actions = Vec::new();
    let mut submit = |command| actions.push(ToolbarAction::Submit(command));

    ui.horizontal_wrapped(|ui| {
        for mode in Mode::ALL {
            if ui
                .selectable_label(view.active_mode == mode, mode_label(mode))
                .clicked()
            {
                submit(Command::Mode(mode));
            }
        }
    });
    ui.separator();

    ui.horizontal(|ui| {
        ui.label("Color");
        let mut stroke = view.color.to_rgb_array();
        if egui::color_picker::color_edit_button_srgb(ui, &mut stroke).changed() {
            submit(Command::Color(Color::from_rgb_array(stroke)));
        }
        ui.label("Background");
        let mut background = view.bg_color.to_rgb_array();
        if egui::color_picker::color_edit_button_srgb(ui, &mut background).changed() {
            submit(Command::Background(Color::from_rgb_array(background)));
        }
        let mut fill = view.fill_enabled;
        if ui.checkbox(&mut fill, "Fill").changed() {
            submit(Command::Fill(fill));
        }
    });

    let mut width = view.width;
    if ui
        .add(egui::Slider::new(&mut width, MIN_LINE_WIDTH..=MAX_LINE_WIDTH).text("width"))
        .changed()
    {
        submit(Command::Width(width));
    }
    let mut alpha = view.alpha;
    if ui
        .add(egui::Slider::new(&mut alpha, 0..=MAX_OPACITY).text("opacity"))
        .changed()
    {
        submit(Command::Alpha(alpha));
    }

    ui.horizontal(|ui| {
        ui.label("Text");
        let response = ui.text_edit_singleline(&mut state.text_entry);
        if response.changed() {
            submit(Command::Text(state.text_entry.clone()));
        }
        if !response.has_focus() && state.text_entry != view.text {
            state.text_entry.clone_from(&view.text);
        }
    });

    ui.horizontal(|ui| {
        if ui.button("Undo").clicked() {
            submit(Command::Undo);
        }
        if ui.button("Wipe").clicked() {
            submit(Command::Wipe);
        }
    });

    ui.separator();
    actions.extend(quick_colors_ui(ui));

    let mut separate = view.separate;
    if ui
        .checkbox(&mut separate, "Separate control window (on restart)")
        .changed()
    {
        actions.push(ToolbarAction::SetSeparate(separate));
    }
    actions
}

/// One sunken label per status field, with a swatch for colors.
pub fn status_bar_ui(ui: &mut egui::Ui, bar: &StatusBarView) {
    ui.horizontal(|ui| {
        for (_, label) in bar.labels() {
            egui::Frame::group(ui.style()).show(ui, |ui| {
                if let Some(swatch) = label.swatch {
                    let (rect, _) =
                        ui.allocate_exact_size(egui::vec2(12.0, 12.0), egui::Sense::hover());
                    ui.painter().rect_filled(rect, 2.0, to_color32(swatch));
                }
                ui.label(RichText::new(&label.text).monospace());
            });
        }
    });
}
