// File: mod.rs
// Location: /src/ui/mod.rs

pub mod preset_dialog;

pub fn icon_name<'a>(primary: &'a str, fallbacks: &'a [&'a str]) -> &'a str {
    let Some(display) = gtk4::gdk::Display::default() else {
        return primary;
    };
    let theme = gtk4::IconTheme::for_display(&display);

    if theme.has_icon(primary) {
        return primary;
    }

    for &name in fallbacks {
        if theme.has_icon(name) {
            return name;
        }
    }

    primary
}
