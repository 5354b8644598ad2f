// File: window.rs
// Location: /src/window.rs

use gtk4::prelude::*;
use gtk4::{gdk, glib};
use gdk_pixbuf::Pixbuf;
use libadwaita::{self as adw, prelude::*};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use adwaita_qr::config::{
    EcLevel, LogoShape, QrConfig, MAX_LOGO_SIZE, MAX_SIZE, MIN_LOGO_SIZE, MIN_SIZE, SIZE_STEP,
};
use adwaita_qr::export::EXPORT_FILE_NAME;
use adwaita_qr::payload::Payload;
use adwaita_qr::qr;
use adwaita_qr::session::{self, Frame, LogoOutcome, Session, RECOMPOSE_DELAY};

use crate::ui::icon_name;
use crate::ui::preset_dialog::{show_preset_dialog, PresetKind};

pub struct QrWindow {
    pub window: adw::ApplicationWindow,
}

/// Shared state behind every control: the session plus the widgets that
/// show its output.
#[derive(Clone)]
struct Preview {
    session: Rc<RefCell<Session>>,
    picture: gtk4::Picture,
    toast_overlay: adw::ToastOverlay,
    text_buffer: gtk4::TextBuffer,
    length_label: gtk4::Label,
    syncing_text: Rc<Cell<bool>>,
    last_warning: Rc<RefCell<Option<String>>>,
}

impl Preview {
    fn edit(&self, change: impl FnOnce(&mut QrConfig)) {
        let generation = self.session.borrow_mut().update(change);
        self.refresh_caption();
        self.schedule(generation);
    }

    fn refresh_caption(&self) {
        let caption = self.session.borrow().config().length_caption();
        self.length_label.set_text(&caption);
    }

    /// Rebuilds the preview once edits settle; superseded requests draw
    /// nothing.
    fn schedule(&self, generation: u64) {
        let preview = self.clone();
        glib::spawn_future_local(async move {
            match session::recompose_after(&*preview.session, generation, RECOMPOSE_DELAY).await {
                Some(Ok(frame)) => preview.show(&frame),
                Some(Err(e)) => {
                    log::error!("Failed to render QR code: {:#}", e);
                    preview.toast(&format!("Failed to generate QR code: {}", e));
                }
                None => {}
            }
        });
    }

    fn show(&self, frame: &Frame) {
        let image = &frame.image;
        let width = image.width() as i32;
        let height = image.height() as i32;

        let pixbuf = Pixbuf::from_bytes(
            &glib::Bytes::from(image.as_raw()),
            gdk_pixbuf::Colorspace::Rgb,
            true,
            8,
            width,
            height,
            width * 4,
        );
        let texture = gdk::Texture::for_pixbuf(&pixbuf);
        self.picture.set_paintable(Some(&texture));

        // Toast a logo warning once, not on every recomposite.
        let warning = frame.warning.as_ref().map(|w| w.to_string());
        self.picture.set_tooltip_text(warning.as_deref());
        let changed = *self.last_warning.borrow() != warning;
        if changed {
            if let Some(message) = &warning {
                self.toast(message);
            }
            self.last_warning.replace(warning);
        }
    }

    fn apply_payload(&self, payload: Payload) {
        let result = self.session.borrow_mut().apply_payload(&payload);
        match result {
            Ok(generation) => {
                let text = self.session.borrow().config().text.clone();
                self.syncing_text.set(true);
                self.text_buffer.set_text(&text);
                self.syncing_text.set(false);
                self.refresh_caption();
                self.schedule(generation);
            }
            Err(errors) => self.toast(&errors.to_string()),
        }
    }

    fn toast(&self, message: &str) {
        let toast = adw::Toast::new(message);
        self.toast_overlay.add_toast(toast);
    }
}

fn rgba_to_hex(rgba: &gdk::RGBA) -> String {
    let channel = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
    format!(
        "#{:02x}{:02x}{:02x}",
        channel(rgba.red()),
        channel(rgba.green()),
        channel(rgba.blue())
    )
}

fn hex_to_rgba(value: &str) -> Option<gdk::RGBA> {
    let color = qr::parse_color(value).ok()?;
    let [r, g, b, a] = color.0.map(|c| c as f32 / 255.0);
    Some(gdk::RGBA::new(r, g, b, a))
}

/// A picker button plus a hex text field kept in sync with it.
struct ColorControl {
    row: adw::ActionRow,
    button: gtk4::ColorDialogButton,
    entry: gtk4::Entry,
}

impl ColorControl {
    fn new(title: &str, initial: &str) -> Self {
        let button = gtk4::ColorDialogButton::new(Some(gtk4::ColorDialog::new()));
        if let Some(rgba) = hex_to_rgba(initial) {
            button.set_rgba(&rgba);
        }
        button.set_valign(gtk4::Align::Center);

        let entry = gtk4::Entry::builder()
            .text(initial)
            .width_chars(9)
            .valign(gtk4::Align::Center)
            .build();

        let row = adw::ActionRow::builder().title(title).build();
        row.add_suffix(&entry);
        row.add_suffix(&button);

        Self { row, button, entry }
    }

    /// Typed text goes to the config as is; unparsable values are drawn
    /// with the renderer's fallback color.
    fn bind(&self, preview: &Preview, apply: fn(&mut QrConfig, String)) {
        let syncing = Rc::new(Cell::new(false));

        let p = preview.clone();
        let entry = self.entry.clone();
        let guard = syncing.clone();
        self.button.connect_rgba_notify(move |button| {
            if guard.get() {
                return;
            }
            let color = rgba_to_hex(&button.rgba());
            guard.set(true);
            entry.set_text(&color);
            guard.set(false);
            p.edit(|c| apply(c, color));
        });

        let p = preview.clone();
        let button = self.button.clone();
        self.entry.connect_changed(move |entry| {
            if syncing.get() {
                return;
            }
            let text = entry.text().to_string();
            if let Some(rgba) = hex_to_rgba(&text) {
                syncing.set(true);
                button.set_rgba(&rgba);
                syncing.set(false);
            }
            p.edit(|c| apply(c, text));
        });
    }
}

impl QrWindow {
    pub fn new(app: &adw::Application) -> Self {
        Self::load_css();

        let session = Rc::new(RefCell::new(Session::new()));
        let defaults = session.borrow().config().clone();

        let toast_overlay = adw::ToastOverlay::new();

        // Preview
        let picture = gtk4::Picture::new();
        picture.set_content_fit(gtk4::ContentFit::Contain);
        picture.set_size_request(300, 300);
        picture.set_can_shrink(true);
        picture.add_css_class("qr-preview");

        let download_btn = gtk4::Button::builder()
            .label("Download PNG")
            .halign(gtk4::Align::Center)
            .css_classes(vec!["suggested-action".to_string(), "pill".to_string()])
            .build();

        // Presets
        let preset_box = gtk4::Box::new(gtk4::Orientation::Horizontal, 8);
        preset_box.set_halign(gtk4::Align::Center);
        let preset_buttons: Vec<(PresetKind, gtk4::Button)> = PresetKind::ALL
            .iter()
            .map(|&kind| {
                let button_content = adw::ButtonContent::builder()
                    .icon_name(kind.icon())
                    .label(kind.name())
                    .build();
                let button = gtk4::Button::builder()
                    .child(&button_content)
                    .css_classes(vec!["touch-target".to_string()])
                    .build();
                preset_box.append(&button);
                (kind, button)
            })
            .collect();

        // Content
        let content_group = adw::PreferencesGroup::builder()
            .title("Content")
            .description("Text or URL encoded in the QR code")
            .build();
        let text_view = gtk4::TextView::builder()
            .wrap_mode(gtk4::WrapMode::WordChar)
            .accepts_tab(false)
            .top_margin(8)
            .bottom_margin(8)
            .left_margin(8)
            .right_margin(8)
            .build();
        let text_buffer = text_view.buffer();
        text_buffer.set_text(&defaults.text);
        let text_scroll = gtk4::ScrolledWindow::builder()
            .hscrollbar_policy(gtk4::PolicyType::Never)
            .min_content_height(96)
            .child(&text_view)
            .build();
        let text_frame = gtk4::Frame::builder()
            .child(&text_scroll)
            .css_classes(vec!["card".to_string()])
            .build();
        let length_label = gtk4::Label::builder()
            .label(defaults.length_caption())
            .xalign(0.0)
            .margin_top(6)
            .css_classes(vec!["dim-label".to_string(), "caption".to_string()])
            .build();
        content_group.add(&text_frame);
        content_group.add(&length_label);

        // Appearance
        let appearance_group = adw::PreferencesGroup::builder()
            .title("Appearance")
            .build();

        let size_row = adw::SpinRow::with_range(MIN_SIZE as f64, MAX_SIZE as f64, SIZE_STEP as f64);
        size_row.set_title("Size (px)");
        size_row.set_value(defaults.size as f64);
        size_row.set_snap_to_ticks(true);

        let level_names: Vec<&str> = EcLevel::ALL.iter().map(|l| l.label()).collect();
        let level_model = gtk4::StringList::new(&level_names);
        let level_combo = adw::ComboRow::builder()
            .title("Error Correction")
            .model(&level_model)
            .selected(EcLevel::ALL.iter().position(|l| *l == defaults.level).unwrap_or(1) as u32)
            .build();

        let fg_control = ColorControl::new("Foreground Color", &defaults.fg_color);
        let bg_control = ColorControl::new("Background Color", &defaults.bg_color);

        appearance_group.add(&size_row);
        appearance_group.add(&level_combo);
        appearance_group.add(&fg_control.row);
        appearance_group.add(&bg_control.row);

        // Logo
        let logo_group = adw::PreferencesGroup::builder()
            .title("Logo")
            .build();

        let logo_row = adw::ActionRow::builder()
            .title("Logo Image")
            .subtitle("None")
            .build();
        let choose_btn = gtk4::Button::builder()
            .label("Choose…")
            .valign(gtk4::Align::Center)
            .build();
        let clear_btn = gtk4::Button::builder()
            .icon_name(icon_name("edit-clear-symbolic", &["edit-delete-symbolic"]))
            .valign(gtk4::Align::Center)
            .tooltip_text("Remove logo")
            .css_classes(vec!["flat".to_string()])
            .build();
        clear_btn.set_sensitive(false);
        logo_row.add_suffix(&choose_btn);
        logo_row.add_suffix(&clear_btn);

        let logo_size_row =
            adw::SpinRow::with_range(MIN_LOGO_SIZE as f64, MAX_LOGO_SIZE as f64, 1.0);
        logo_size_row.set_title("Logo Size (px)");
        logo_size_row.set_value(defaults.logo_size as f64);

        let opacity_row = adw::SpinRow::with_range(0.0, 1.0, 0.1);
        opacity_row.set_title("Logo Opacity");
        opacity_row.set_digits(1);
        opacity_row.set_value(defaults.logo_opacity as f64);

        let shape_names: Vec<&str> = LogoShape::ALL.iter().map(|s| s.label()).collect();
        let shape_model = gtk4::StringList::new(&shape_names);
        let shape_combo = adw::ComboRow::builder()
            .title("Logo Shape")
            .model(&shape_model)
            .selected(
                LogoShape::ALL
                    .iter()
                    .position(|s| *s == defaults.logo_shape)
                    .unwrap_or(2) as u32,
            )
            .build();

        logo_group.add(&logo_row);
        logo_group.add(&logo_size_row);
        logo_group.add(&opacity_row);
        logo_group.add(&shape_combo);

        let content = gtk4::Box::new(gtk4::Orientation::Vertical, 18);
        content.set_margin_top(18);
        content.set_margin_bottom(18);
        content.set_margin_start(12);
        content.set_margin_end(12);
        content.append(&picture);
        content.append(&download_btn);
        content.append(&preset_box);
        content.append(&content_group);
        content.append(&appearance_group);
        content.append(&logo_group);

        let clamp = adw::Clamp::builder()
            .maximum_size(560)
            .child(&content)
            .build();
        let scrolled = gtk4::ScrolledWindow::builder()
            .hscrollbar_policy(gtk4::PolicyType::Never)
            .child(&clamp)
            .build();
        toast_overlay.set_child(Some(&scrolled));

        let menu_button = gtk4::MenuButton::builder()
            .icon_name("open-menu-symbolic")
            .tooltip_text("Menu")
            .build();
        let menu = gio::Menu::new();
        menu.append(Some("About"), Some("app.about"));
        menu_button.set_menu_model(Some(&menu));

        let header = adw::HeaderBar::new();
        header.pack_end(&menu_button);

        let toolbar_view = adw::ToolbarView::new();
        toolbar_view.add_top_bar(&header);
        toolbar_view.set_content(Some(&toast_overlay));

        let window = adw::ApplicationWindow::builder()
            .application(app)
            .title("QR Code Generator")
            .default_width(560)
            .default_height(860)
            .content(&toolbar_view)
            .build();

        let preview = Preview {
            session: session.clone(),
            picture,
            toast_overlay,
            text_buffer: text_buffer.clone(),
            length_label,
            syncing_text: Rc::new(Cell::new(false)),
            last_warning: Rc::new(RefCell::new(None)),
        };

        // Controls
        let p = preview.clone();
        text_buffer.connect_changed(move |buffer| {
            if p.syncing_text.get() {
                return;
            }
            let (start, end) = buffer.bounds();
            let text = buffer.text(&start, &end, false).to_string();
            p.edit(|c| c.text = text);
        });

        let p = preview.clone();
        size_row.connect_value_notify(move |row| {
            let size = row.value().round() as u32;
            p.edit(|c| c.size = size);
        });

        let p = preview.clone();
        level_combo.connect_selected_notify(move |row| {
            let level = EcLevel::ALL
                .get(row.selected() as usize)
                .copied()
                .unwrap_or_default();
            p.edit(|c| c.level = level);
        });

        fg_control.bind(&preview, |c, color| c.fg_color = color);
        bg_control.bind(&preview, |c, color| c.bg_color = color);

        let p = preview.clone();
        logo_size_row.connect_value_notify(move |row| {
            let logo_size = row.value().round() as u32;
            p.edit(|c| c.logo_size = logo_size);
        });

        let p = preview.clone();
        opacity_row.connect_value_notify(move |row| {
            let opacity = row.value() as f32;
            p.edit(|c| c.logo_opacity = opacity);
        });

        let p = preview.clone();
        shape_combo.connect_selected_notify(move |row| {
            let shape = LogoShape::ALL
                .get(row.selected() as usize)
                .copied()
                .unwrap_or_default();
            p.edit(|c| c.logo_shape = shape);
        });

        for (kind, button) in preset_buttons {
            let p = preview.clone();
            let window_weak = window.downgrade();
            button.connect_clicked(move |_| {
                let Some(window) = window_weak.upgrade() else {
                    return;
                };
                let p = p.clone();
                show_preset_dialog(kind, &window, move |payload| p.apply_payload(payload));
            });
        }

        // Logo selection
        let p = preview.clone();
        let window_weak = window.downgrade();
        let logo_row_clone = logo_row.clone();
        let clear_btn_clone = clear_btn.clone();
        choose_btn.connect_clicked(move |_| {
            let Some(window) = window_weak.upgrade() else {
                return;
            };
            let p = p.clone();
            let logo_row = logo_row_clone.clone();
            let clear_btn = clear_btn_clone.clone();

            glib::spawn_future_local(async move {
                let filter = gtk4::FileFilter::new();
                filter.set_name(Some("Images"));
                filter.add_mime_type("image/png");
                filter.add_mime_type("image/jpeg");
                let filters = gio::ListStore::new::<gtk4::FileFilter>();
                filters.append(&filter);

                let dialog = gtk4::FileDialog::builder()
                    .title("Choose a Logo")
                    .modal(true)
                    .build();
                dialog.set_filters(Some(&filters));

                let path = match dialog.open_future(Some(&window)).await {
                    Ok(file) => file.path(),
                    Err(e) => {
                        log::debug!("Logo selection dismissed: {}", e);
                        return;
                    }
                };
                let Some(path) = path else {
                    p.toast("Only local files can be used as a logo");
                    return;
                };

                match session::load_logo_into(&*p.session, &path).await {
                    LogoOutcome::Applied => {
                        let name = path
                            .file_name()
                            .map(|n| n.to_string_lossy().to_string())
                            .unwrap_or_default();
                        logo_row.set_subtitle(&name);
                        clear_btn.set_sensitive(true);
                    }
                    LogoOutcome::Failed(e) => {
                        // The next frame carries the error as its warning.
                        log::debug!("Logo rejected: {}", e);
                        logo_row.set_subtitle("None");
                        clear_btn.set_sensitive(true);
                    }
                    LogoOutcome::Stale => return,
                }

                let generation = p.session.borrow().generation();
                p.schedule(generation);
            });
        });

        let p = preview.clone();
        clear_btn.connect_clicked(move |button| {
            let generation = p.session.borrow_mut().clear_logo();
            logo_row.set_subtitle("None");
            button.set_sensitive(false);
            p.schedule(generation);
        });

        // Download
        let p = preview.clone();
        let window_weak = window.downgrade();
        download_btn.connect_clicked(move |_| {
            let Some(window) = window_weak.upgrade() else {
                return;
            };
            let p = p.clone();

            glib::spawn_future_local(async move {
                let dialog = gtk4::FileDialog::builder()
                    .title("Save QR Code")
                    .initial_name(EXPORT_FILE_NAME)
                    .modal(true)
                    .build();

                let path = match dialog.save_future(Some(&window)).await {
                    Ok(file) => file.path(),
                    Err(e) => {
                        log::debug!("Save dismissed: {}", e);
                        return;
                    }
                };
                let Some(path) = path else {
                    p.toast("Choose a local folder to save the QR code");
                    return;
                };

                let result = p.session.borrow().export(&path);
                match result {
                    Ok(saved) => p.toast(&format!("Saved {}", saved.display())),
                    Err(e) => {
                        log::error!("Failed to save QR code: {:#}", e);
                        p.toast(&format!("Failed to save QR code: {}", e));
                    }
                }
            });
        });

        let about_action = gio::SimpleAction::new("about", None);
        let window_weak = window.downgrade();
        about_action.connect_activate(move |_, _| {
            if let Some(window) = window_weak.upgrade() {
                Self::show_about_dialog(&window);
            }
        });
        app.add_action(&about_action);

        preview.schedule(session.borrow().generation());

        Self { window }
    }

    fn show_about_dialog(window: &adw::ApplicationWindow) {
        let about = adw::AboutDialog::builder()
            .application_name("QR Code Generator")
            .application_icon("view-grid-symbolic")
            .developer_name("PlayRood")
            .version(env!("CARGO_PKG_VERSION"))
            .comments("Create QR codes for links, email, phone numbers and WiFi networks")
            .license_type(gtk4::License::Gpl30)
            .build();

        about.present(Some(window));
    }

    fn load_css() {
        let provider = gtk4::CssProvider::new();

        let css = r#"
.qr-preview {
    border-radius: 12px;
    background: @card_bg_color;
    padding: 12px;
}

button.touch-target {
    min-height: 44px;
    padding: 8px 14px;
}
"#;

        provider.load_from_data(css);

        if let Some(display) = gdk::Display::default() {
            gtk4::style_context_add_provider_for_display(
                &display,
                &provider,
                gtk4::STYLE_PROVIDER_PRIORITY_APPLICATION,
            );
        }
    }
}
