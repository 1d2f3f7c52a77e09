//! Terminal style roles
//!
//! Each logical role (stage banner, file path, view rule, ...) maps to
//! one `colored::Color`. Painting only happens when the caller passes
//! `enabled = true`, so there is no global color state to manage.
//!
//! ```
//! use licaudit::core::styles::StyleRole;
//! assert_eq!(StyleRole::Path.paint("a/LICENSE", false), "a/LICENSE");
//! assert!(StyleRole::Banner.paint("Stage 1", true).starts_with("\x1b["));
//! ```

use colored::Color;

macro_rules! style {
    ( $( $variant:ident => $color:expr ),+ $(,)? ) => {
        #[derive(Copy, Clone, Debug, PartialEq, Eq)]
        pub enum StyleRole { $( $variant ),+ }

        impl StyleRole {
            pub fn color(self) -> Option<Color> {
                match self { $( StyleRole::$variant => $color ),+ }
            }
        }
    }
}

style! {
    // clap help roles
    Header      => Some(Color::Yellow),
    Literal     => Some(Color::Cyan),
    Placeholder => Some(Color::Green),
    Valid       => Some(Color::Green),
    Invalid     => Some(Color::Red),
    Error       => Some(Color::BrightRed),
    // report roles
    Banner      => Some(Color::BrightBlue),
    Path        => Some(Color::BrightGreen),
    Rule        => Some(Color::BrightBlack),
}

impl StyleRole {
    pub fn ansi_code(self) -> Option<String> {
        self.color().and_then(ansi_code_for)
    }

    pub fn paint(self, text: &str, enabled: bool) -> String {
        match self.ansi_code() {
            Some(code) if enabled => format!("\x1b[{}m{}\x1b[0m", code, text),
            _ => text.to_string(),
        }
    }

    /// Foreground spec for prettytable cells (`Fy`, `FG`, ...)
    pub fn to_prettytable_spec(self) -> Option<String> {
        let spec_char = match self.color()? {
            Color::Black => "k",
            Color::Red => "r",
            Color::Green => "g",
            Color::Yellow => "y",
            Color::Blue => "b",
            Color::Magenta => "m",
            Color::Cyan => "c",
            Color::White => "w",
            Color::BrightBlack => "K",
            Color::BrightRed => "R",
            Color::BrightGreen => "G",
            Color::BrightYellow => "Y",
            Color::BrightBlue => "B",
            Color::BrightMagenta => "M",
            Color::BrightCyan => "C",
            Color::BrightWhite => "W",
            _ => return None,
        };
        Some(format!("F{}", spec_char))
    }
}

fn ansi_code_for(color: Color) -> Option<String> {
    let code = match color {
        Color::Black => "30",
        Color::Red => "31",
        Color::Green => "32",
        Color::Yellow => "33",
        Color::Blue => "34",
        Color::Magenta => "35",
        Color::Cyan => "36",
        Color::White => "37",
        Color::BrightBlack => "90",
        Color::BrightRed => "91",
        Color::BrightGreen => "92",
        Color::BrightYellow => "93",
        Color::BrightBlue => "94",
        Color::BrightMagenta => "95",
        Color::BrightCyan => "96",
        Color::BrightWhite => "97",
        Color::TrueColor { r, g, b } => return Some(format!("38;2;{};{};{}", r, g, b)),
        _ => return None,
    };
    Some(code.to_string())
}

fn clap_ansi(color: Color) -> Option<clap::builder::styling::AnsiColor> {
    use clap::builder::styling::AnsiColor;
    Some(match color {
        Color::Black => AnsiColor::Black,
        Color::Red => AnsiColor::Red,
        Color::Green => AnsiColor::Green,
        Color::Yellow => AnsiColor::Yellow,
        Color::Blue => AnsiColor::Blue,
        Color::Magenta => AnsiColor::Magenta,
        Color::Cyan => AnsiColor::Cyan,
        Color::White => AnsiColor::White,
        Color::BrightBlack => AnsiColor::BrightBlack,
        Color::BrightRed => AnsiColor::BrightRed,
        Color::BrightGreen => AnsiColor::BrightGreen,
        Color::BrightYellow => AnsiColor::BrightYellow,
        Color::BrightBlue => AnsiColor::BrightBlue,
        Color::BrightMagenta => AnsiColor::BrightMagenta,
        Color::BrightCyan => AnsiColor::BrightCyan,
        Color::BrightWhite => AnsiColor::BrightWhite,
        _ => return None,
    })
}

/// clap help styles built from the help roles
pub fn palette_to_clap(enabled: bool) -> clap::builder::Styles {
    use clap::builder::styling::{Color as ClapColor, Style};
    if !enabled {
        return clap::builder::Styles::plain();
    }

    let style = |role: StyleRole, bold: bool| {
        let mut s = Style::new();
        if let Some(col) = role.color().and_then(clap_ansi) {
            s = s.fg_color(Some(ClapColor::Ansi(col)));
        }
        if bold {
            s = s.bold();
        }
        s
    };

    clap::builder::Styles::styled()
        .header(style(StyleRole::Header, true))
        .usage(style(StyleRole::Header, true))
        .literal(style(StyleRole::Literal, false))
        .placeholder(style(StyleRole::Placeholder, false))
        .valid(style(StyleRole::Valid, false))
        .invalid(style(StyleRole::Invalid, false))
        .error(style(StyleRole::Error, true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paint_respects_enabled_flag() {
        assert_eq!(StyleRole::Banner.paint("Stage 2", false), "Stage 2");
        assert_eq!(StyleRole::Banner.paint("Stage 2", true), "\x1b[94mStage 2\x1b[0m");
    }

    #[test]
    fn test_rule_role_is_dimmed() {
        assert_eq!(StyleRole::Rule.ansi_code().as_deref(), Some("90"));
        assert_eq!(StyleRole::Rule.paint(">>>", true), "\x1b[90m>>>\x1b[0m");
    }

    #[test]
    fn test_truecolor_code() {
        assert_eq!(
            ansi_code_for(Color::TrueColor { r: 255, g: 128, b: 64 }).as_deref(),
            Some("38;2;255;128;64")
        );
    }

    #[test]
    fn test_truecolor_has_no_table_or_help_color() {
        assert_eq!(clap_ansi(Color::TrueColor { r: 1, g: 2, b: 3 }), None);
        assert_eq!(clap_ansi(Color::Yellow), Some(clap::builder::styling::AnsiColor::Yellow));
    }

    #[test]
    fn test_prettytable_spec() {
        assert_eq!(StyleRole::Header.to_prettytable_spec().as_deref(), Some("Fy"));
        assert_eq!(StyleRole::Path.to_prettytable_spec().as_deref(), Some("FG"));
        assert_eq!(StyleRole::Rule.to_prettytable_spec().as_deref(), Some("FK"));
    }

    #[test]
    fn test_palette_to_clap_differs_when_enabled() {
        let plain = format!("{:?}", palette_to_clap(false));
        let styled = format!("{:?}", palette_to_clap(true));
        assert_ne!(plain, styled);
    }
}
