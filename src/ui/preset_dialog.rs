// File: preset_dialog.rs
// Location: /src/ui/preset_dialog.rs

use gtk4::prelude::*;
use libadwaita::{self as adw, prelude::*};

use adwaita_qr::forms::{self, ValidationErrors};
use adwaita_qr::payload::{
    EmailPayload, Payload, PhonePayload, WebsitePayload, WifiPayload, WifiSecurity,
};

use super::icon_name;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresetKind {
    Website,
    Email,
    Phone,
    Wifi,
}

impl PresetKind {
    pub const ALL: [PresetKind; 4] = [
        PresetKind::Website,
        PresetKind::Email,
        PresetKind::Phone,
        PresetKind::Wifi,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PresetKind::Website => "Website",
            PresetKind::Email => "Email",
            PresetKind::Phone => "Phone",
            PresetKind::Wifi => "WiFi",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            PresetKind::Website => icon_name("web-browser-symbolic", &["applications-internet"]),
            PresetKind::Email => icon_name("mail-unread-symbolic", &["mail-send-symbolic"]),
            PresetKind::Phone => icon_name("call-start-symbolic", &["phone-symbolic"]),
            PresetKind::Wifi => icon_name(
                "network-wireless-symbolic",
                &["network-wireless-signal-excellent-symbolic", "network-wireless"],
            ),
        }
    }
}

/// Reads the current widget values into a payload and shows per-field
/// errors next to the rows.
struct Form {
    errors: Vec<(&'static str, gtk4::Label)>,
    collect: Box<dyn Fn() -> Payload>,
}

impl Form {
    fn show_errors(&self, errors: &ValidationErrors) {
        for (field, label) in &self.errors {
            match errors.for_field(field) {
                Some(message) => {
                    label.set_text(message);
                    label.set_visible(true);
                }
                None => label.set_visible(false),
            }
        }
    }
}

pub fn show_preset_dialog<F>(kind: PresetKind, parent: &impl IsA<gtk4::Widget>, on_submit: F)
where
    F: Fn(Payload) + 'static,
{
    let dialog = adw::Dialog::builder()
        .title(format!("{} QR Code", kind.name()))
        .content_width(420)
        .build();

    let content = gtk4::Box::new(gtk4::Orientation::Vertical, 6);
    content.set_margin_top(12);
    content.set_margin_bottom(12);
    content.set_margin_start(12);
    content.set_margin_end(12);

    let form = match kind {
        PresetKind::Website => website_form(&content),
        PresetKind::Email => email_form(&content),
        PresetKind::Phone => phone_form(&content),
        PresetKind::Wifi => wifi_form(&content),
    };

    let buttons = gtk4::Box::new(gtk4::Orientation::Horizontal, 12);
    buttons.set_halign(gtk4::Align::End);
    buttons.set_margin_top(12);

    let cancel_btn = gtk4::Button::builder()
        .label("Cancel")
        .css_classes(vec!["flat".to_string()])
        .build();
    let dialog_close = dialog.clone();
    cancel_btn.connect_clicked(move |_| {
        dialog_close.close();
    });

    let submit_btn = gtk4::Button::builder()
        .label("Generate QR Code")
        .css_classes(vec!["suggested-action".to_string()])
        .build();
    let dialog_close = dialog.clone();
    submit_btn.connect_clicked(move |_| {
        let payload = (form.collect)();
        match forms::validate(&payload) {
            Ok(()) => {
                on_submit(payload);
                dialog_close.close();
            }
            Err(errors) => {
                log::debug!("{} form rejected: {}", kind.name(), errors);
                form.show_errors(&errors);
            }
        }
    });

    buttons.append(&cancel_btn);
    buttons.append(&submit_btn);
    content.append(&buttons);

    dialog.set_child(Some(&content));
    dialog.present(Some(parent));
}

fn boxed_rows(content: &gtk4::Box, rows: &[&gtk4::Widget]) {
    let list = gtk4::ListBox::new();
    list.set_selection_mode(gtk4::SelectionMode::None);
    list.add_css_class("boxed-list");
    for row in rows {
        list.append(*row);
    }
    content.append(&list);
}

/// Adds a row followed by its (initially hidden) error label.
fn field(content: &gtk4::Box, row: &impl IsA<gtk4::Widget>) -> gtk4::Label {
    boxed_rows(content, &[row.upcast_ref()]);

    let error = gtk4::Label::new(None);
    error.set_xalign(0.0);
    error.set_wrap(true);
    error.add_css_class("error");
    error.add_css_class("caption");
    error.set_visible(false);
    content.append(&error);
    error
}

fn optional(text: String) -> Option<String> {
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

fn website_form(content: &gtk4::Box) -> Form {
    let url = adw::EntryRow::builder().title("Website URL").build();
    url.set_input_purpose(gtk4::InputPurpose::Url);
    url.set_text("https://");

    let url_error = field(content, &url);

    Form {
        errors: vec![("url", url_error)],
        collect: Box::new(move || {
            Payload::Website(WebsitePayload {
                url: url.text().to_string(),
            })
        }),
    }
}

fn email_form(content: &gtk4::Box) -> Form {
    let email = adw::EntryRow::builder().title("Email Address").build();
    email.set_input_purpose(gtk4::InputPurpose::Email);
    let subject = adw::EntryRow::builder().title("Subject (optional)").build();
    let body = adw::EntryRow::builder().title("Message (optional)").build();

    let email_error = field(content, &email);
    boxed_rows(content, &[subject.upcast_ref(), body.upcast_ref()]);

    Form {
        errors: vec![("email", email_error)],
        collect: Box::new(move || {
            Payload::Email(EmailPayload {
                email: email.text().to_string(),
                subject: optional(subject.text().to_string()),
                body: optional(body.text().to_string()),
            })
        }),
    }
}

fn phone_form(content: &gtk4::Box) -> Form {
    let number = adw::EntryRow::builder().title("Phone Number").build();
    number.set_input_purpose(gtk4::InputPurpose::Phone);

    let number_error = field(content, &number);

    Form {
        errors: vec![("phoneNumber", number_error)],
        collect: Box::new(move || {
            Payload::Phone(PhonePayload {
                phone_number: number.text().to_string(),
            })
        }),
    }
}

fn wifi_form(content: &gtk4::Box) -> Form {
    let ssid = adw::EntryRow::builder()
        .title("Network Name (SSID)")
        .build();

    let names: Vec<&str> = WifiSecurity::ALL.iter().map(|s| s.display_name()).collect();
    let security_model = gtk4::StringList::new(&names);
    let security = adw::ComboRow::builder()
        .title("Security")
        .model(&security_model)
        .selected(0)
        .build();

    let password = adw::PasswordEntryRow::builder()
        .title("Password")
        .build();

    let hidden = adw::SwitchRow::builder()
        .title("Hidden Network")
        .subtitle("The network does not broadcast its name")
        .build();

    let ssid_error = field(content, &ssid);
    boxed_rows(content, &[security.upcast_ref()]);
    let password_error = field(content, &password);
    boxed_rows(content, &[hidden.upcast_ref()]);

    let selected_security = |row: &adw::ComboRow| {
        WifiSecurity::ALL
            .get(row.selected() as usize)
            .copied()
            .unwrap_or_default()
    };

    let password_clone = password.clone();
    let password_error_clone = password_error.clone();
    security.connect_selected_notify(move |row| {
        let needs_password = selected_security(row).requires_password();
        password_clone.set_visible(needs_password);
        if !needs_password {
            password_error_clone.set_visible(false);
        }
    });

    Form {
        errors: vec![("ssid", ssid_error), ("password", password_error)],
        collect: Box::new(move || {
            Payload::Wifi(WifiPayload {
                ssid: ssid.text().to_string(),
                password: password.text().to_string(),
                security: selected_security(&security),
                hidden: hidden.is_active(),
            })
        }),
    }
}
